use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Button {
    pub const NAV_NEXT: Button = Button::E;
    pub const NAV_BACK: Button = Button::F;
    /// `A` through `D` pick answers.
    pub const ANSWER_COUNT: usize = 4;

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'A' => Some(Button::A),
            'B' => Some(Button::B),
            'C' => Some(Button::C),
            'D' => Some(Button::D),
            'E' => Some(Button::E),
            'F' => Some(Button::F),
            _ => None,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        [Button::A, Button::B, Button::C, Button::D, Button::E, Button::F]
            .get(index)
            .copied()
    }

    /// Position on the box, 0 for `A` through 5 for `F`.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Index of the answer slot for the four answer buttons.
    pub fn answer_index(self) -> Option<usize> {
        match self {
            Button::A | Button::B | Button::C | Button::D => Some(self.index()),
            Button::E | Button::F => None,
        }
    }
}

/// Parses one inbound line. Accepts `A`..`F` or `INPUT: <letter>` in any case.
pub fn parse_line(line: &str) -> Option<Button> {
    let normalized = line.trim().to_ascii_uppercase();
    let payload = match normalized.strip_prefix("INPUT:") {
        Some(rest) => rest.trim(),
        None => normalized.as_str(),
    };

    let mut chars = payload.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) => Button::from_letter(letter),
        _ => None,
    }
}

/// Feedback sent to the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Win,
    Lose,
    Finish,
    Good,
    Retry,
    Victory,
}

impl Command {
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Win => "WIN",
            Command::Lose => "LOSE",
            Command::Finish => "FINISH",
            Command::Good => "GOOD",
            Command::Retry => "RETRY",
            Command::Victory => "VICTORY",
        }
    }

    pub fn encode(self) -> Vec<u8> {
        format!("{}\n", self.as_str()).into_bytes()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepted_forms() {
        assert_eq!(parse_line("A"), Some(Button::A));
        assert_eq!(parse_line("  f \r"), Some(Button::F));
        assert_eq!(parse_line("INPUT: C"), Some(Button::C));
        assert_eq!(parse_line("input:d"), Some(Button::D));
        assert_eq!(parse_line("INPUT:   e  "), Some(Button::E));
    }

    #[test]
    fn test_parse_rejects_other_content() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("G"), None);
        assert_eq!(parse_line("AB"), None);
        assert_eq!(parse_line("INPUT: "), None);
        assert_eq!(parse_line("INPUT: AB"), None);
        assert_eq!(parse_line("READY"), None);
    }

    #[test]
    fn test_indices() {
        assert_eq!(Button::A.index(), 0);
        assert_eq!(Button::NAV_NEXT.index(), 4);
        assert_eq!(Button::NAV_BACK.index(), 5);
        assert_eq!(Button::from_index(3), Some(Button::D));
        assert_eq!(Button::from_index(6), None);
        assert_eq!(Button::E.answer_index(), None);
    }

    #[test]
    fn test_command_encoding() {
        assert_eq!(Command::Win.encode(), b"WIN\n".to_vec());
        assert_eq!(Command::Victory.to_string(), "VICTORY");
    }
}
