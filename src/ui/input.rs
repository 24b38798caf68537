/// Keyboard input: drains crossterm key events into game actions.
///
/// Two modes:
///   - **text** (playing): printable keys edit the answer line,
///     Enter submits it, Ctrl/F-keys trigger actions
///   - **menu**: printable keys come through as `Action::Key`
///
/// Release events are ignored; only Press/Repeat count.

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Enter. In text mode carries the answer line (already cleared).
    Submit(String),
    Hint,
    Skip,
    /// F1..F4 → power-up template index 0..3
    PowerUp(usize),
    Up,
    Down,
    Back,
    Quit,
    /// A printable key outside text mode.
    Key(char),
}

/// Single-line answer editor.
#[derive(Debug, Default)]
pub struct LineEditor {
    text: String,
}

impl LineEditor {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn insert(&mut self, c: char) {
        self.text.push(c);
    }

    pub fn backspace(&mut self) {
        self.text.pop();
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }
}

pub struct InputState {
    pub line: LineEditor,
    pub text_mode: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            line: LineEditor::default(),
            text_mode: false,
        }
    }

    /// Switch modes. Leaving text mode discards the half-typed answer.
    pub fn set_text_mode(&mut self, on: bool) {
        if self.text_mode && !on {
            self.line.clear();
        }
        self.text_mode = on;
    }

    /// Read every pending terminal event without blocking.
    pub fn drain_events(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => {
                    if let Some(action) = self.translate(key) {
                        actions.push(action);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    log::warn!("terminal read failed: {e}");
                    break;
                }
            }
        }
        actions
    }

    pub fn translate(&mut self, key: KeyEvent) -> Option<Action> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char(c) if ctrl => match c.to_ascii_lowercase() {
                'c' => Some(Action::Quit),
                'h' => Some(Action::Hint),
                's' => Some(Action::Skip),
                _ => None,
            },
            KeyCode::Enter => {
                let text = if self.text_mode { self.line.take() } else { String::new() };
                Some(Action::Submit(text))
            }
            KeyCode::Esc => Some(Action::Back),
            KeyCode::Up => Some(Action::Up),
            KeyCode::Down => Some(Action::Down),
            KeyCode::F(n @ 1..=4) => Some(Action::PowerUp(n as usize - 1)),
            KeyCode::Backspace if self.text_mode => {
                self.line.backspace();
                None
            }
            KeyCode::Char(c) if self.text_mode => {
                self.line.insert(c);
                None
            }
            KeyCode::Char(c) => Some(Action::Key(c)),
            _ => None,
        }
    }
}
