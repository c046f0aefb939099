use super::{App, Field};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

impl App {
    /// Handle one key press. Returns `true` when the app should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        // Leave-confirmation prompt swallows everything else.
        if self.confirm_exit {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => return Ok(true),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.confirm_exit = false;
                }
                _ => {}
            }
            return Ok(false);
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => return Ok(self.request_quit()),
                KeyCode::Char('r') => self.trigger_analyze(),
                KeyCode::Char('g') => self.trigger_suggest(),
                KeyCode::Char('l') if self.clear_actions => self.clear_form(),
                KeyCode::Char('x') if self.clear_actions => self.session.clear_results(),
                KeyCode::Char('y') if self.clear_actions => self.session.clear_suggestions(),
                _ => {}
            }
            return Ok(false);
        }

        match key.code {
            KeyCode::Esc => return Ok(self.request_quit()),
            KeyCode::Tab | KeyCode::Down => self.focus = self.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.focus = self.focus.prev(),
            KeyCode::Left if self.focus.is_strategy() => self.cycle_strategy(false),
            KeyCode::Right if self.focus.is_strategy() => self.cycle_strategy(true),
            KeyCode::Enter => match self.focus {
                Field::BulkJson => self.bulk_json.push('\n'),
                Field::SuggestStrategy => self.trigger_suggest(),
                _ => self.trigger_analyze(),
            },
            KeyCode::Backspace => {
                if let Some(text) = self.focused_text_mut() {
                    text.pop();
                }
            }
            KeyCode::Char(ch) => {
                if let Some(text) = self.focused_text_mut() {
                    text.push(ch);
                }
            }
            _ => {}
        }
        Ok(false)
    }
}
