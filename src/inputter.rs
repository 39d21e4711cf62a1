use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::trace;

/// Single line editor used to change a cell value in place.
/// The cursor counts characters, not bytes.
#[derive(Default)]
pub struct Inputter {
    chars: Vec<char>,
    cursor: usize,
    finished: bool,
    canceled: bool,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct InputResult {
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    pub cursor: usize,
}

impl Inputter {
    /// Start editing with `initial` as content, cursor at the end.
    pub fn start(&mut self, initial: &str) -> InputResult {
        self.chars = initial.chars().collect();
        self.cursor = self.chars.len();
        self.finished = false;
        self.canceled = false;
        self.get()
    }

    pub fn read(&mut self, key: KeyEvent) -> InputResult {
        match key.code {
            KeyCode::Enter => self.finished = true,
            KeyCode::Esc => {
                self.canceled = true;
                self.finished = true;
            }
            KeyCode::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                self.chars.remove(self.cursor);
            }
            KeyCode::Delete if self.cursor < self.chars.len() => {
                self.chars.remove(self.cursor);
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.chars.len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.chars.len(),
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.chars.drain(..self.cursor);
                self.cursor = 0;
            }
            KeyCode::Char(chr) => {
                self.chars.insert(self.cursor, chr);
                self.cursor += 1;
            }
            _ => {}
        }
        trace!("Input: {:?} => {:?}", key.code, self.get());
        self.get()
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            input: self.chars.iter().collect(),
            finished: self.finished,
            canceled: self.canceled,
            cursor: self.cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_inserts_at_cursor() {
        let mut input = Inputter::default();
        input.start("IT");
        input.read(key(KeyCode::Home));
        input.read(key(KeyCode::Char('x')));
        let res = input.read(key(KeyCode::Enter));
        assert_eq!(res.input, "xIT");
        assert!(res.finished);
        assert!(!res.canceled);
    }

    #[test]
    fn backspace_removes_before_cursor() {
        let mut input = Inputter::default();
        input.start("Zoë");
        input.read(key(KeyCode::Left));
        let res = input.read(key(KeyCode::Backspace));
        assert_eq!(res.input, "Zë");
        assert_eq!(res.cursor, 1);
    }

    #[test]
    fn escape_cancels() {
        let mut input = Inputter::default();
        input.start("Sales");
        let res = input.read(key(KeyCode::Esc));
        assert!(res.finished && res.canceled);
    }

    #[test]
    fn ctrl_u_clears_to_start() {
        let mut input = Inputter::default();
        input.start("002 Bob");
        let res = input.read(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(res.input, "");
        assert_eq!(res.cursor, 0);
    }
}
