//! Keyboard polling.
//!
//! Terminals report key presses, not key state. When the terminal supports
//! release events a key is held from press to release; otherwise a press
//! (or auto-repeat) keeps it held for a short window.

use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::game::Input;

/// How long a press counts as held without a release event. Longer than
/// common auto-repeat delays, so a held key keeps moving until the repeats
/// start refreshing it.
pub const HOLD_WINDOW: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub struct Keyboard {
    held: HashMap<KeyCode, Instant>,
    release_events: bool,
    quit: bool,
}

impl Keyboard {
    pub fn new(release_events: bool) -> Self {
        Self {
            held: HashMap::new(),
            release_events,
            quit: false,
        }
    }

    /// Reads every pending terminal event and returns the keys newly pressed.
    pub fn poll(&mut self) -> io::Result<Vec<KeyCode>> {
        let mut pressed = Vec::new();
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key_event) = event::read()? {
                if let Some(code) = self.apply(key_event, Instant::now()) {
                    pressed.push(code);
                }
            }
        }
        self.expire(Instant::now());
        Ok(pressed)
    }

    /// Folds one key event into the held set; returns the key if it is a
    /// fresh press.
    pub fn apply(&mut self, key_event: KeyEvent, now: Instant) -> Option<KeyCode> {
        let code = normalize(key_event.code);
        if code == KeyCode::Esc
            || (code == KeyCode::Char('c') && key_event.modifiers.contains(KeyModifiers::CONTROL))
        {
            self.quit = true;
        }
        match key_event.kind {
            KeyEventKind::Press => {
                let fresh = self.held.insert(code, now).is_none();
                fresh.then_some(code)
            }
            KeyEventKind::Repeat => {
                self.held.insert(code, now);
                None
            }
            KeyEventKind::Release => {
                self.held.remove(&code);
                None
            }
        }
    }

    /// Forgets presses older than the hold window when no release events
    /// arrive.
    pub fn expire(&mut self, now: Instant) {
        if self.release_events {
            return;
        }
        self.held
            .retain(|_, pressed| now.duration_since(*pressed) < HOLD_WINDOW);
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.held.contains_key(&normalize(code))
    }

    /// Escape or Ctrl-C was pressed: the window-close of a terminal.
    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    pub fn game_input(&self) -> Input {
        Input {
            left: self.is_held(KeyCode::Left),
            right: self.is_held(KeyCode::Right),
            jump: self.is_held(KeyCode::Char(' ')),
        }
    }
}

fn normalize(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, kind)
    }

    #[test]
    fn press_and_release() {
        let mut kb = Keyboard::new(true);
        let t = Instant::now();
        assert_eq!(
            kb.apply(key(KeyCode::Left, KeyEventKind::Press), t),
            Some(KeyCode::Left)
        );
        kb.expire(t + Duration::from_secs(5));
        assert!(kb.game_input().left);

        kb.apply(key(KeyCode::Left, KeyEventKind::Release), t);
        assert!(!kb.game_input().left);
    }

    #[test]
    fn presses_expire_without_release_events() {
        let mut kb = Keyboard::new(false);
        let t = Instant::now();
        kb.apply(key(KeyCode::Char(' '), KeyEventKind::Press), t);
        kb.expire(t + Duration::from_millis(50));
        assert!(kb.game_input().jump);
        kb.expire(t + HOLD_WINDOW * 2);
        assert!(!kb.game_input().jump);
    }

    #[test]
    fn repeat_is_not_a_fresh_press() {
        let mut kb = Keyboard::new(false);
        let t = Instant::now();
        assert!(kb.apply(key(KeyCode::Char('S'), KeyEventKind::Press), t).is_some());
        assert!(kb
            .apply(key(KeyCode::Char('s'), KeyEventKind::Press), t)
            .is_none());
        assert!(kb
            .apply(key(KeyCode::Char('s'), KeyEventKind::Repeat), t)
            .is_none());
        assert!(kb.is_held(KeyCode::Char('s')));
    }

    #[test]
    fn ctrl_c_requests_quit() {
        let mut kb = Keyboard::new(true);
        kb.apply(
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Instant::now(),
        );
        assert!(kb.quit_requested());
    }
}
