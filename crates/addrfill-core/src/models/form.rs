use super::address::Address;

/// The five structured output fields of the host form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormFieldId {
    StreetNumber = 0,
    Route = 1,
    Locality = 2,
    AdministrativeArea = 3,
    PostalCode = 4,
}

impl FormFieldId {
    pub const ALL: [FormFieldId; 5] = [
        Self::StreetNumber,
        Self::Route,
        Self::Locality,
        Self::AdministrativeArea,
        Self::PostalCode,
    ];

    /// Stable element identifier, as used by the host form.
    pub fn element_id(self) -> &'static str {
        match self {
            Self::StreetNumber => "street_number",
            Self::Route => "route",
            Self::Locality => "locality",
            Self::AdministrativeArea => "administrative_area_level_1",
            Self::PostalCode => "postal_code",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::StreetNumber => "Street number",
            Self::Route => "Street",
            Self::Locality => "Suburb",
            Self::AdministrativeArea => "State",
            Self::PostalCode => "Postcode",
        }
    }

    /// Value this field takes from a structured address.
    pub fn extract(self, address: &Address) -> Option<&str> {
        match self {
            Self::StreetNumber => address.house_number(),
            Self::Route => address.road(),
            Self::Locality => address.locality(),
            Self::AdministrativeArea => address.state(),
            Self::PostalCode => address.postcode(),
        }
    }

    /// Position in [`Self::ALL`] and in the form.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Single-line text buffer with a byte-level cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    pub value: String,
    pub cursor: usize,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        let value = value.into();
        let cursor = value.len();
        Self { value, cursor }
    }

    /// Replace the whole content and park the cursor at the end.
    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.value.len();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn insert_char(&mut self, c: char) {
        self.value.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn delete_back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = self.value[..self.cursor]
            .char_indices()
            .last()
            .map(|(i, _)| i)
            .unwrap_or(0);
        self.value.remove(prev);
        self.cursor = prev;
        true
    }

    pub fn delete_word_back(&mut self) -> bool {
        let start = self.cursor;
        while self.value[..self.cursor].ends_with(' ') {
            self.delete_back();
        }
        while self.cursor > 0 && !self.value[..self.cursor].ends_with(' ') {
            self.delete_back();
        }
        self.cursor != start
    }

    pub fn move_left(&mut self) {
        if self.cursor > 0 {
            self.cursor = self.value[..self.cursor]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.value.len() {
            self.cursor = self.value[self.cursor..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor + i)
                .unwrap_or(self.value.len());
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.value.len();
    }

    /// Number of chars before the cursor, for terminal cursor placement.
    pub fn cursor_column(&self) -> usize {
        self.value[..self.cursor].chars().count()
    }
}

/// A host form field: text plus visibility and enablement.
#[derive(Debug, Clone)]
pub struct FormField {
    pub id: FormFieldId,
    pub input: TextInput,
    pub visible: bool,
    pub enabled: bool,
}

impl FormField {
    fn hidden(id: FormFieldId) -> Self {
        Self {
            id,
            input: TextInput::new(),
            visible: false,
            enabled: false,
        }
    }

    pub fn value(&self) -> &str {
        &self.input.value
    }
}

/// The structured address form the widget fills in.
#[derive(Debug, Clone)]
pub struct AddressForm {
    fields: [FormField; 5],
}

impl AddressForm {
    /// All fields start hidden and disabled until the first selection.
    pub fn new() -> Self {
        Self {
            fields: FormFieldId::ALL.map(FormField::hidden),
        }
    }

    pub fn field(&self, id: FormFieldId) -> &FormField {
        &self.fields[id.index()]
    }

    pub fn field_mut(&mut self, id: FormFieldId) -> &mut FormField {
        &mut self.fields[id.index()]
    }

    pub fn value(&self, id: FormFieldId) -> &str {
        self.field(id).value()
    }

    pub fn fields(&self) -> impl Iterator<Item = &FormField> {
        self.fields.iter()
    }

    /// Whether the fields have been revealed by a selection.
    pub fn is_revealed(&self) -> bool {
        self.fields.iter().all(|f| f.visible && f.enabled)
    }

    /// Show, enable and clear every field.
    pub fn reveal(&mut self) {
        for field in &mut self.fields {
            field.visible = true;
            field.enabled = true;
            field.input.clear();
        }
    }

    /// Copy address parts into the fields; missing parts leave the field empty.
    pub fn fill(&mut self, address: &Address) {
        for id in FormFieldId::ALL {
            let value = id.extract(address).unwrap_or_default();
            self.field_mut(id).input.set(value);
        }
    }

    /// `(element_id, value)` pairs in form order.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        self.fields
            .iter()
            .map(|f| (f.id.element_id(), f.value().to_string()))
            .collect()
    }
}

impl Default for AddressForm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_form_is_hidden_and_disabled() {
        let form = AddressForm::new();
        assert!(form.fields().all(|f| !f.visible && !f.enabled));
        assert!(!form.is_revealed());
    }

    #[test]
    fn fill_clears_missing_parts() {
        let mut form = AddressForm::new();
        form.reveal();
        form.field_mut(FormFieldId::AdministrativeArea).input.set("QLD");

        form.fill(&Address {
            house_number: Some("7".into()),
            road: Some("Bay Rd".into()),
            ..Address::default()
        });

        assert_eq!(form.value(FormFieldId::StreetNumber), "7");
        assert_eq!(form.value(FormFieldId::Route), "Bay Rd");
        assert_eq!(form.value(FormFieldId::AdministrativeArea), "");
        assert_eq!(form.value(FormFieldId::PostalCode), "");
    }

    #[test]
    fn element_ids_match_host_form() {
        let ids: Vec<_> = FormFieldId::ALL.iter().map(|f| f.element_id()).collect();
        assert_eq!(
            ids,
            [
                "street_number",
                "route",
                "locality",
                "administrative_area_level_1",
                "postal_code"
            ]
        );
        for (i, id) in FormFieldId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn text_input_handles_multibyte_chars() {
        let mut input = TextInput::new();
        for c in "Mönch".chars() {
            input.insert_char(c);
        }
        input.move_left();
        input.move_left();
        input.move_left();
        assert_eq!(input.cursor_column(), 2);
        input.delete_back();
        assert_eq!(input.value, "Mnch");
        input.end();
        assert_eq!(input.cursor, input.value.len());
    }

    #[test]
    fn delete_word_back_removes_last_word() {
        let mut input = TextInput::with_value("12 Main St");
        input.delete_word_back();
        assert_eq!(input.value, "12 Main ");
    }
}
