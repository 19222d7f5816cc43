use crate::domain::model::OperatorKind;

/// One keypad action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Digit(char),
    DecimalPoint,
    Operator(OperatorKind),
    Evaluate,
    Clear,
}

impl Key {
    /// Decodes a keyboard key name (`"7"`, `"+"`, `"Enter"`, `"Escape"`, ...).
    /// Unbound keys yield `None`.
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name {
            "Enter" | "=" => Some(Key::Evaluate),
            "Escape" | "c" | "C" => Some(Key::Clear),
            "." => Some(Key::DecimalPoint),
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_digit() => Some(Key::Digit(c)),
                    _ => OperatorKind::from_token(name).map(Key::Operator),
                }
            }
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        let mut buf = [0u8; 4];
        Self::from_key_name(c.encode_utf8(&mut buf))
    }
}
