use crate::models::Candidate;

/// Suggestion list state: the current candidate set, the highlighted row
/// and whether the list is shown.
#[derive(Debug, Clone, Default)]
pub struct Dropdown {
    candidates: Vec<Candidate>,
    selected: Option<usize>,
    visible: bool,
}

impl Dropdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the candidate set. An empty set leaves the list hidden.
    pub fn show_results(&mut self, candidates: Vec<Candidate>) {
        self.candidates = candidates;
        self.selected = None;
        self.visible = !self.candidates.is_empty();
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.selected = None;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn candidate(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Move selection down (wraps).
    pub fn move_down(&mut self) {
        if !self.candidates.is_empty() {
            self.selected = Some(match self.selected {
                Some(i) => (i + 1) % self.candidates.len(),
                None => 0,
            });
        }
    }

    /// Move selection up (wraps).
    pub fn move_up(&mut self) {
        if !self.candidates.is_empty() {
            self.selected = Some(match self.selected {
                Some(0) | None => self.candidates.len() - 1,
                Some(i) => i - 1,
            });
        }
    }

    /// Pointer entered row `index`.
    pub fn hover(&mut self, index: usize) {
        if index < self.candidates.len() {
            self.selected = Some(index);
        }
    }
}
