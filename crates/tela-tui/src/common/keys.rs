//! Keyboard modifier helpers.

use crossterm::event::{KeyEvent, KeyModifiers};

/// Decoded modifier state of a key event.
///
/// Crossterm reports modifiers as a bitset; matching on this struct
/// keeps key dispatch tables readable.
#[derive(Debug, Clone, Copy)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl Modifiers {
    pub fn from_key(key: &KeyEvent) -> Self {
        Self {
            ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
            alt: key.modifiers.contains(KeyModifiers::ALT),
            shift: key.modifiers.contains(KeyModifiers::SHIFT),
        }
    }

    pub fn none(self) -> bool {
        !self.ctrl && !self.alt && !self.shift
    }

    pub fn only_ctrl(self) -> bool {
        self.ctrl && !self.alt && !self.shift
    }

    pub fn only_alt(self) -> bool {
        self.alt && !self.ctrl && !self.shift
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers};

    use super::*;

    #[test]
    fn test_modifier_predicates() {
        let plain = Modifiers::from_key(&KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE));
        assert!(plain.none());
        assert!(!plain.only_ctrl());

        let ctrl = Modifiers::from_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(ctrl.only_ctrl());
        assert!(!ctrl.none());

        let both = Modifiers::from_key(&KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL | KeyModifiers::ALT,
        ));
        assert!(!both.only_ctrl());
        assert!(!both.only_alt());
    }
}
