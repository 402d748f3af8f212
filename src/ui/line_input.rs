use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::style::Style;
use ratatui::text::{Line, Span};

use crate::ui::theme::ThemeColors;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputResult {
    Continue,
    Submit,
    Cancel,
}

/// Single-line text editor used for search boxes, guesses and word forms.
#[derive(Clone, Debug, Default)]
pub struct LineInput {
    text: String,
    /// Cursor position as a char index (0 = before first char).
    cursor: usize,
}

impl LineInput {
    pub fn new(text: &str) -> Self {
        let cursor = text.chars().count();
        Self {
            text: text.to_string(),
            cursor,
        }
    }

    pub fn value(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Insert pasted text at the cursor. Line breaks are dropped.
    pub fn insert_str(&mut self, pasted: &str) {
        for ch in pasted.chars().filter(|c| !c.is_control()) {
            let byte_offset = self.char_to_byte(self.cursor);
            self.text.insert(byte_offset, ch);
            self.cursor += 1;
        }
    }

    /// Returns (before_cursor, cursor_char, after_cursor) for styled rendering.
    /// When cursor is at end of text, cursor_char is None.
    pub fn render_parts(&self) -> (&str, Option<char>, &str) {
        let byte_offset = self.char_to_byte(self.cursor);
        match self.text[byte_offset..].chars().next() {
            Some(ch) => {
                let next_byte = byte_offset + ch.len_utf8();
                (&self.text[..byte_offset], Some(ch), &self.text[next_byte..])
            }
            None => (&self.text, None, ""),
        }
    }

    /// Styled line with a block cursor when `focused`.
    pub fn to_line(&self, colors: &ThemeColors, focused: bool) -> Line<'static> {
        let text_style = Style::default().fg(colors.fg());
        if !focused {
            return Line::from(Span::styled(self.text.clone(), text_style));
        }
        let (before, at, after) = self.render_parts();
        let cursor_style = Style::default().fg(colors.bg()).bg(colors.fg());
        Line::from(vec![
            Span::styled(before.to_string(), text_style),
            Span::styled(at.map_or_else(|| " ".to_string(), String::from), cursor_style),
            Span::styled(after.to_string(), text_style),
        ])
    }

    pub fn handle(&mut self, key: KeyEvent) -> InputResult {
        match key.code {
            KeyCode::Esc => return InputResult::Cancel,
            KeyCode::Enter => return InputResult::Submit,

            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Right => {
                let len = self.text.chars().count();
                if self.cursor < len {
                    self.cursor += 1;
                }
            }
            KeyCode::Home => {
                self.cursor = 0;
            }
            KeyCode::End => {
                self.cursor = self.text.chars().count();
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.remove_at_cursor();
                }
            }
            KeyCode::Delete => {
                self.remove_at_cursor();
            }
            KeyCode::Char('a') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.cursor = 0;
            }
            KeyCode::Char('e') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.cursor = self.text.chars().count();
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.clear();
            }
            KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.delete_word_back();
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                let byte_offset = self.char_to_byte(self.cursor);
                self.text.insert(byte_offset, ch);
                self.cursor += 1;
            }
            _ => {}
        }
        InputResult::Continue
    }

    fn remove_at_cursor(&mut self) {
        let byte_offset = self.char_to_byte(self.cursor);
        if let Some(ch) = self.text[byte_offset..].chars().next() {
            self.text
                .replace_range(byte_offset..byte_offset + ch.len_utf8(), "");
        }
    }

    /// Convert char index to byte offset.
    fn char_to_byte(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(b, _)| b)
            .unwrap_or(self.text.len())
    }

    /// Delete word before cursor (unix-word-rubout: skip whitespace, then non-whitespace).
    fn delete_word_back(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let chars: Vec<char> = self.text.chars().collect();
        let mut pos = self.cursor;

        while pos > 0 && chars[pos - 1].is_whitespace() {
            pos -= 1;
        }
        while pos > 0 && !chars[pos - 1].is_whitespace() {
            pos -= 1;
        }

        let start_byte = self.char_to_byte(pos);
        let end_byte = self.char_to_byte(self.cursor);
        self.text.replace_range(start_byte..end_byte, "");
        self.cursor = pos;
    }
}
