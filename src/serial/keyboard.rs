use super::protocol::Button;

/// Where keyboard focus sat when the key was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusTarget {
    #[default]
    Other,
    TextInput,
    ContentEditable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub focus: FocusTarget,
}

impl KeyEvent {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            focus: FocusTarget::Other,
        }
    }
}

/// Translates a key into the serial line it simulates, or `None` when the
/// key is unmapped or typed into an editable field.
pub fn key_to_line(event: &KeyEvent) -> Option<String> {
    if event.focus != FocusTarget::Other {
        return None;
    }

    let button = match event.key.as_str() {
        "Escape" => Button::NAV_BACK,
        key => {
            let mut chars = key.chars();
            let ch = match (chars.next(), chars.next()) {
                (Some(ch), None) => ch,
                _ => return None,
            };
            match ch {
                '1'..='6' => Button::from_index(ch as usize - '1' as usize)?,
                _ => Button::from_letter(ch)?,
            }
        }
    };

    let letter = (b'A' + button.index() as u8) as char;
    Some(letter.to_string())
}

/// Maps a line typed on a terminal. `esc` stands in for the Escape key.
pub fn terminal_line_to_key(line: &str) -> KeyEvent {
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case("esc") || trimmed == "\u{1b}" {
        KeyEvent::new("Escape")
    } else {
        KeyEvent::new(trimmed)
    }
}
