use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

/// Single line text input used by the filter fields and the page prompt.
#[derive(Default)]
pub struct Inputter {
    current_input: String,
    cursor_pos: usize,
    finished: bool,
    canceled: bool,
}

#[derive(Default, Clone, Debug, PartialEq)]
pub struct InputResult {
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    pub cursor_pos: usize,
    /// The text differs from before the key was handled.
    pub changed: bool,
}

impl Inputter {
    pub fn read(&mut self, key: event::KeyEvent) -> InputResult {
        let before = self.current_input.clone();
        let mut result = match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => self.enter(),
            (KeyCode::Esc, _) => self.escape(),
            (KeyCode::Backspace, _) => self.backspace(),
            (KeyCode::Delete, _) => self.delete(),
            (KeyCode::Left, _) => self.left(),
            (KeyCode::Right, _) => self.right(),
            (KeyCode::Home, _) => self.home(),
            (KeyCode::End, _) => self.end(),
            (kc, km) => self.key(kc, km),
        };
        result.changed = result.input != before;
        result
    }

    /// Replace the text and put the cursor behind it.
    pub fn set(&mut self, s: &str) {
        self.current_input = s.to_string();
        self.cursor_pos = s.chars().count();
        self.finished = false;
        self.canceled = false;
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            canceled: self.canceled,
            finished: self.finished,
            input: self.current_input.clone(),
            cursor_pos: self.cursor_pos,
            changed: false,
        }
    }

    pub fn clear(&mut self) {
        self.canceled = false;
        self.finished = false;
        self.current_input.clear();
        self.cursor_pos = 0;
    }

    fn enter(&mut self) -> InputResult {
        self.finished = true;
        self.get()
    }

    fn escape(&mut self) -> InputResult {
        self.clear();
        self.canceled = true;
        self.finished = true;
        self.get()
    }

    fn backspace(&mut self) -> InputResult {
        if self.cursor_pos > 0 {
            self.cursor_pos -= 1;
            let at = self.byte_pos();
            self.current_input.remove(at);
        }
        self.get()
    }

    fn delete(&mut self) -> InputResult {
        if self.cursor_pos < self.current_input.chars().count() {
            let at = self.byte_pos();
            self.current_input.remove(at);
        }
        self.get()
    }

    fn left(&mut self) -> InputResult {
        self.cursor_pos = self.cursor_pos.saturating_sub(1);
        self.get()
    }

    fn right(&mut self) -> InputResult {
        if self.cursor_pos < self.current_input.chars().count() {
            self.cursor_pos += 1;
        }
        self.get()
    }

    fn home(&mut self) -> InputResult {
        self.cursor_pos = 0;
        self.get()
    }

    fn end(&mut self) -> InputResult {
        self.cursor_pos = self.current_input.chars().count();
        self.get()
    }

    fn key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> InputResult {
        if modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return self.get();
        }
        if let Some(chr) = code.as_char() {
            let at = self.byte_pos();
            self.current_input.insert(at, chr);
            self.cursor_pos += 1;
        }
        self.get()
    }

    fn byte_pos(&self) -> usize {
        self.current_input
            .char_indices()
            .nth(self.cursor_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}
