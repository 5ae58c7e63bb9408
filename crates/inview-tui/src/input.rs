use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Input action that can be performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ScrollDown,
    ScrollUp,
    ScrollHalfPageDown,
    ScrollHalfPageUp,
    ScrollPageDown,
    ScrollPageUp,
    JumpToTop,
    JumpToBottom,
    ResetStats,
    None,
}

/// Handle a key event and return the corresponding action
pub fn handle_key_event(key: KeyEvent) -> Action {
    match (key.code, key.modifiers) {
        // Quit
        (KeyCode::Char('q'), KeyModifiers::NONE) => Action::Quit,
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Action::Quit,

        // Row scrolling
        (KeyCode::Char('j'), KeyModifiers::NONE) => Action::ScrollDown,
        (KeyCode::Char('k'), KeyModifiers::NONE) => Action::ScrollUp,
        (KeyCode::Down, KeyModifiers::NONE) => Action::ScrollDown,
        (KeyCode::Up, KeyModifiers::NONE) => Action::ScrollUp,

        // Page scrolling
        (KeyCode::Char('d'), KeyModifiers::NONE) => Action::ScrollHalfPageDown,
        (KeyCode::Char('u'), KeyModifiers::NONE) => Action::ScrollHalfPageUp,
        (KeyCode::Char(' '), KeyModifiers::NONE) => Action::ScrollPageDown,
        (KeyCode::PageDown, _) => Action::ScrollPageDown,
        (KeyCode::PageUp, _) => Action::ScrollPageUp,

        // Jump to top/bottom; some terminals report 'G' without SHIFT
        (KeyCode::Char('g'), KeyModifiers::NONE) => Action::JumpToTop,
        (KeyCode::Home, _) => Action::JumpToTop,
        (KeyCode::Char('G'), _) => Action::JumpToBottom,
        (KeyCode::End, _) => Action::JumpToBottom,

        (KeyCode::Char('r'), KeyModifiers::NONE) => Action::ResetStats,

        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Action {
        handle_key_event(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(press(KeyCode::Char('q'), KeyModifiers::NONE), Action::Quit);
        assert_eq!(press(KeyCode::Char('c'), KeyModifiers::CONTROL), Action::Quit);
        assert_eq!(press(KeyCode::Char('c'), KeyModifiers::NONE), Action::None);
    }

    #[test]
    fn test_scroll_keys() {
        assert_eq!(press(KeyCode::Char('j'), KeyModifiers::NONE), Action::ScrollDown);
        assert_eq!(press(KeyCode::Up, KeyModifiers::NONE), Action::ScrollUp);
        assert_eq!(press(KeyCode::Char(' '), KeyModifiers::NONE), Action::ScrollPageDown);
        assert_eq!(press(KeyCode::PageUp, KeyModifiers::NONE), Action::ScrollPageUp);
    }

    #[test]
    fn test_jump_keys() {
        assert_eq!(press(KeyCode::Char('g'), KeyModifiers::NONE), Action::JumpToTop);
        assert_eq!(press(KeyCode::Char('G'), KeyModifiers::SHIFT), Action::JumpToBottom);
        assert_eq!(press(KeyCode::Char('G'), KeyModifiers::NONE), Action::JumpToBottom);
    }
}
