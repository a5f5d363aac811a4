use ratatui::style::Color;

pub struct NordTheme {
    // Polar Night
    pub nord0: Color, // #2E3440 - darkest background
    pub nord1: Color, // #3B4252 - secondary background, highlighted rows
    pub nord2: Color, // #4C566A - borders
    pub nord3: Color, // #616E88 - muted text, hints

    // Snow Storm
    pub nord4: Color, // #D8DEE9 - body text
    pub nord5: Color, // #E5E9F0 - bright text

    // Frost
    pub nord8: Color, // #88C0D0 - focused input
    pub nord9: Color, // #81A1C1 - frame border
    pub nord10: Color, // #5E81AC - selection background

    // Aurora
    pub nord12: Color, // #D08770 - warnings
    pub nord14: Color, // #A3BE8C - dropdown accent
}

impl Default for NordTheme {
    fn default() -> Self {
        Self {
            nord0: Color::Rgb(46, 52, 64),
            nord1: Color::Rgb(59, 66, 82),
            nord2: Color::Rgb(76, 86, 106),
            nord3: Color::Rgb(97, 110, 136),
            nord4: Color::Rgb(216, 222, 233),
            nord5: Color::Rgb(229, 233, 240),
            nord8: Color::Rgb(136, 192, 208),
            nord9: Color::Rgb(129, 161, 193),
            nord10: Color::Rgb(94, 129, 172),
            nord12: Color::Rgb(208, 135, 112),
            nord14: Color::Rgb(163, 190, 140),
        }
    }
}

impl NordTheme {
    // Semantic aliases
    pub fn bg(&self) -> Color {
        self.nord0
    }
    pub fn bg_secondary(&self) -> Color {
        self.nord1
    }
    pub fn border(&self) -> Color {
        self.nord2
    }
    pub fn muted(&self) -> Color {
        self.nord3
    }

    pub fn fg(&self) -> Color {
        self.nord4
    }
    pub fn fg_bright(&self) -> Color {
        self.nord5
    }

    pub fn frost_ice(&self) -> Color {
        self.nord8
    }
    pub fn frost_blue(&self) -> Color {
        self.nord9
    }
    pub fn frost_dark(&self) -> Color {
        self.nord10
    }

    pub fn orange(&self) -> Color {
        self.nord12
    }
    pub fn green(&self) -> Color {
        self.nord14
    }

    // Logic aliases
    pub fn active_input(&self) -> Color {
        self.frost_ice()
    }
    pub fn selection_bg(&self) -> Color {
        self.frost_dark()
    }
    pub fn warning(&self) -> Color {
        self.orange()
    }
}
