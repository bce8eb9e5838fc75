//! Start screens shown before a game.

use crossterm::event::KeyCode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Choice {
    Start,
    Quit,
}

/// Two entries, moved between with the arrow keys and confirmed with Enter.
#[derive(Debug, Default)]
pub struct SelectMenu {
    selected: usize,
}

impl SelectMenu {
    pub const TITLE: &'static str = "Nao Game";
    pub const OPTIONS: [&'static str; 2] = ["Start Game", "Quit Game"];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn press(&mut self, key: KeyCode) -> Option<Choice> {
        match key {
            KeyCode::Up | KeyCode::Down => {
                self.selected = (self.selected + 1) % Self::OPTIONS.len();
                tracing::debug!(selected = Self::OPTIONS[self.selected], "menu moved");
                None
            }
            KeyCode::Enter => Some(if self.selected == 0 {
                Choice::Start
            } else {
                Choice::Quit
            }),
            _ => None,
        }
    }
}

/// Single-key title screen: S starts, Q quits.
#[derive(Debug, Default)]
pub struct KeyMenu;

impl KeyMenu {
    pub const TITLE: &'static str = "NAO Spiel - Drücke S zum Starten oder Q zum Beenden";
    pub const KEYS: &'static str = "[S] Start   [Q] Quit";

    pub fn press(&self, key: KeyCode) -> Option<Choice> {
        match key {
            KeyCode::Char('s') => Some(Choice::Start),
            KeyCode::Char('q') => Some(Choice::Quit),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_toggle_between_entries() {
        let mut menu = SelectMenu::new();
        assert_eq!(menu.press(KeyCode::Down), None);
        assert_eq!(menu.selected(), 1);
        assert_eq!(menu.press(KeyCode::Down), None);
        assert_eq!(menu.selected(), 0);
        menu.press(KeyCode::Up);
        assert_eq!(menu.press(KeyCode::Enter), Some(Choice::Quit));
    }

    #[test]
    fn enter_on_first_entry_starts() {
        let mut menu = SelectMenu::new();
        assert_eq!(menu.press(KeyCode::Char('x')), None);
        assert_eq!(menu.press(KeyCode::Enter), Some(Choice::Start));
    }

    #[test]
    fn key_menu() {
        let menu = KeyMenu;
        assert_eq!(menu.press(KeyCode::Char('s')), Some(Choice::Start));
        assert_eq!(menu.press(KeyCode::Char('q')), Some(Choice::Quit));
        assert_eq!(menu.press(KeyCode::Enter), None);
    }
}
