//! Key bindings: WASD + Space, with arrow keys as aliases.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Command from a single key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveLeft,
    MoveRight,
    SoftDrop,
    RotateCw,
    HardDrop,
    /// Pause/resume toggle; "play again" on the game-over prompt.
    Pause,
    Restart,
    Quit,
}

/// Map a key event to a command. Letters are case-insensitive; unknown keys map to None.
pub fn key_to_command(key: KeyEvent) -> Option<Command> {
    let KeyEvent {
        code, modifiers, ..
    } = key;
    if modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(code, KeyCode::Char('c' | 'C')).then_some(Command::Quit);
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return None;
    }
    match code {
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'a' => Some(Command::MoveLeft),
            'd' => Some(Command::MoveRight),
            's' => Some(Command::SoftDrop),
            'w' => Some(Command::RotateCw),
            ' ' => Some(Command::HardDrop),
            'p' => Some(Command::Pause),
            'r' => Some(Command::Restart),
            'q' => Some(Command::Quit),
            _ => None,
        },
        KeyCode::Left => Some(Command::MoveLeft),
        KeyCode::Right => Some(Command::MoveRight),
        KeyCode::Down => Some(Command::SoftDrop),
        KeyCode::Up => Some(Command::RotateCw),
        KeyCode::Esc => Some(Command::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_wasd_and_space() {
        assert_eq!(key_to_command(key(KeyCode::Char('a'))), Some(Command::MoveLeft));
        assert_eq!(key_to_command(key(KeyCode::Char('d'))), Some(Command::MoveRight));
        assert_eq!(key_to_command(key(KeyCode::Char('s'))), Some(Command::SoftDrop));
        assert_eq!(key_to_command(key(KeyCode::Char('w'))), Some(Command::RotateCw));
        assert_eq!(key_to_command(key(KeyCode::Char(' '))), Some(Command::HardDrop));
        assert_eq!(key_to_command(key(KeyCode::Char('p'))), Some(Command::Pause));
        assert_eq!(key_to_command(key(KeyCode::Char('r'))), Some(Command::Restart));
        assert_eq!(key_to_command(key(KeyCode::Char('q'))), Some(Command::Quit));
    }

    #[test]
    fn test_uppercase_is_accepted() {
        let shifted = KeyEvent::new(KeyCode::Char('P'), KeyModifiers::SHIFT);
        assert_eq!(key_to_command(shifted), Some(Command::Pause));
        assert_eq!(key_to_command(key(KeyCode::Char('Q'))), Some(Command::Quit));
        assert_eq!(key_to_command(key(KeyCode::Char('W'))), Some(Command::RotateCw));
    }

    #[test]
    fn test_arrows_alias_wasd() {
        assert_eq!(key_to_command(key(KeyCode::Left)), Some(Command::MoveLeft));
        assert_eq!(key_to_command(key(KeyCode::Right)), Some(Command::MoveRight));
        assert_eq!(key_to_command(key(KeyCode::Down)), Some(Command::SoftDrop));
        assert_eq!(key_to_command(key(KeyCode::Up)), Some(Command::RotateCw));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        assert_eq!(key_to_command(key(KeyCode::Char('x'))), None);
        assert_eq!(key_to_command(key(KeyCode::Enter)), None);
        assert_eq!(key_to_command(key(KeyCode::Tab)), None);
    }

    #[test]
    fn test_modifiers() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(key_to_command(ctrl_c), Some(Command::Quit));
        let ctrl_a = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL);
        assert_eq!(key_to_command(ctrl_a), None);
        let alt_a = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::ALT);
        assert_eq!(key_to_command(alt_a), None);
    }
}
