//! Key mapping for terminal input
//!
//! Converts crossterm key and mouse events into session actions.

use bitflags::bitflags;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::core::session::EditAction;

/// Lines moved per wheel notch
const WHEEL_STEP: usize = 3;

bitflags! {
    /// Modifier keys
    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
    }
}

impl From<KeyModifiers> for Modifiers {
    fn from(mods: KeyModifiers) -> Self {
        let mut result = Modifiers::empty();
        if mods.contains(KeyModifiers::SHIFT) {
            result |= Modifiers::SHIFT;
        }
        if mods.contains(KeyModifiers::CONTROL) {
            result |= Modifiers::CTRL;
        }
        if mods.contains(KeyModifiers::ALT) {
            result |= Modifiers::ALT;
        }
        result
    }
}

/// What an input event asks the session to do
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Submit,
    Edit(EditAction),
    /// Ctrl+L
    ClearScreen,
    ScrollUp(usize),
    ScrollDown(usize),
    /// Left click on a screen cell
    Click { col: u16, row: u16 },
}

/// Key mapper for converting input events to actions
pub struct KeyMapper;

impl KeyMapper {
    /// Map a crossterm KeyEvent to an action
    pub fn map(event: &KeyEvent) -> Option<Action> {
        let mods = Modifiers::from(event.modifiers);

        match event.code {
            KeyCode::Char(ch) => Self::map_char(ch, mods),
            KeyCode::Enter => Some(Action::Submit),
            KeyCode::Backspace => Some(Action::Edit(EditAction::Backspace)),
            KeyCode::Delete => Some(Action::Edit(EditAction::Delete)),
            KeyCode::Home => Some(Action::Edit(EditAction::Home)),
            KeyCode::End => Some(Action::Edit(EditAction::End)),
            KeyCode::Left => Some(Action::Edit(EditAction::Left)),
            KeyCode::Right => Some(Action::Edit(EditAction::Right)),
            KeyCode::Tab => Some(Action::Edit(EditAction::Insert("    ".to_string()))),
            KeyCode::PageUp => Some(Action::ScrollUp(Self::page_step(mods))),
            KeyCode::PageDown => Some(Action::ScrollDown(Self::page_step(mods))),
            _ => None,
        }
    }

    fn map_char(ch: char, mods: Modifiers) -> Option<Action> {
        if mods.contains(Modifiers::CTRL) {
            return match ch.to_ascii_lowercase() {
                'l' => Some(Action::ClearScreen),
                _ => None,
            };
        }
        if mods.contains(Modifiers::ALT) {
            return None;
        }
        Some(Action::Edit(EditAction::Insert(ch.to_string())))
    }

    /// Shift pages faster
    fn page_step(mods: Modifiers) -> usize {
        if mods.contains(Modifiers::SHIFT) {
            30
        } else {
            10
        }
    }

    /// Map a crossterm MouseEvent to an action
    pub fn map_mouse(event: &MouseEvent) -> Option<Action> {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => Some(Action::Click {
                col: event.column,
                row: event.row,
            }),
            MouseEventKind::ScrollUp => Some(Action::ScrollUp(WHEEL_STEP)),
            MouseEventKind::ScrollDown => Some(Action::ScrollDown(WHEEL_STEP)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn key(code: KeyCode, mods: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, mods)
    }

    #[test]
    fn test_printable_chars_insert() {
        let action = KeyMapper::map(&key(KeyCode::Char('a'), KeyModifiers::NONE));
        assert_eq!(action, Some(Action::Edit(EditAction::Insert("a".into()))));

        let action = KeyMapper::map(&key(KeyCode::Char('A'), KeyModifiers::SHIFT));
        assert_eq!(action, Some(Action::Edit(EditAction::Insert("A".into()))));
    }

    #[test]
    fn test_ctrl_l_clears() {
        let action = KeyMapper::map(&key(KeyCode::Char('l'), KeyModifiers::CONTROL));
        assert_eq!(action, Some(Action::ClearScreen));
        assert_eq!(
            KeyMapper::map(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            None
        );
    }

    #[test]
    fn test_editing_keys() {
        let cases = [
            (KeyCode::Enter, Action::Submit),
            (KeyCode::Backspace, Action::Edit(EditAction::Backspace)),
            (KeyCode::Delete, Action::Edit(EditAction::Delete)),
            (KeyCode::Home, Action::Edit(EditAction::Home)),
            (KeyCode::End, Action::Edit(EditAction::End)),
            (KeyCode::Left, Action::Edit(EditAction::Left)),
            (KeyCode::Right, Action::Edit(EditAction::Right)),
        ];
        for (code, expected) in cases {
            let mut event = key(code, KeyModifiers::NONE);
            event.kind = KeyEventKind::Press;
            assert_eq!(KeyMapper::map(&event), Some(expected));
        }
    }

    #[test]
    fn test_mouse() {
        let event = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 4,
            row: 2,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(
            KeyMapper::map_mouse(&event),
            Some(Action::Click { col: 4, row: 2 })
        );

        let event = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Right),
            ..event
        };
        assert_eq!(KeyMapper::map_mouse(&event), None);
    }
}
