use crate::chat::{ChatEngine, Message, Reply, Sender};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Conversation state
    pub engine: ChatEngine,
    pub messages: Vec<Message>,

    // Input state
    pub input: String,
    pub input_cursor: usize, // cursor position in input, in chars

    // Quick-reply chip selection (index into the latest bot message's chips)
    pub chip_selected: Option<usize>,

    // Pending bot reply, delivered after a simulated typing delay
    pub reply_task: Option<JoinHandle<Reply>>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Chat area geometry for scroll calculations (updated during render)
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
}

impl App {
    /// Open the chat panel. `offline` switches the opening message to the
    /// snapshot-fetch apology.
    pub fn new(engine: ChatEngine, offline: bool) -> Self {
        let opening = if offline {
            engine.offline_opening()
        } else {
            engine.opening()
        };
        let first = Message::bot(&opening);
        let chip_selected = if first.quick_replies.is_empty() {
            None
        } else {
            Some(0)
        };

        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            engine,
            messages: vec![first],
            input: String::new(),
            input_cursor: 0,
            chip_selected,
            reply_task: None,
            animation_frame: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
        }
    }

    pub fn is_typing(&self) -> bool {
        self.reply_task.is_some()
    }

    /// Submit user text: append the user turn immediately, then deliver
    /// the bot turn after a random 800-1500 ms typing delay. Input is
    /// cleared synchronously, which doubles as the double-submit guard.
    pub fn submit(&mut self, text: &str) {
        let text = text.trim().to_string();
        if text.is_empty() || self.is_typing() {
            return;
        }

        self.messages.push(Message::user(text.as_str()));
        self.input.clear();
        self.input_cursor = 0;
        self.chip_selected = None;

        let reply = self.engine.respond(&text);
        let delay_ms = self.engine.typing_delay_ms();

        self.reply_task = Some(tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
            reply
        }));

        self.scroll_to_bottom();
    }

    /// Poll the pending reply; called on every tick. Appends the bot turn
    /// once the typing delay has elapsed.
    pub async fn poll_reply(&mut self) {
        let finished = self
            .reply_task
            .as_ref()
            .map(|t| t.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(task) = self.reply_task.take() {
            if let Ok(reply) = task.await {
                self.chip_selected = if reply.quick_replies.is_empty() {
                    None
                } else {
                    Some(0)
                };
                self.messages.push(Message::bot(&reply));
                self.scroll_to_bottom();
            }
        }
    }

    /// Quick-reply chips of the latest bot message. Hidden while the bot
    /// is "typing" a new reply.
    pub fn quick_replies(&self) -> &[String] {
        if self.is_typing() {
            return &[];
        }
        match self.messages.last() {
            Some(msg) if msg.sender == Sender::Bot => &msg.quick_replies,
            _ => &[],
        }
    }

    pub fn chip_next(&mut self) {
        let len = self.quick_replies().len();
        if len > 0 {
            self.chip_selected = Some(self.chip_selected.map(|i| (i + 1) % len).unwrap_or(0));
        }
    }

    pub fn chip_prev(&mut self) {
        let len = self.quick_replies().len();
        if len > 0 {
            self.chip_selected = Some(
                self.chip_selected
                    .map(|i| (i + len - 1) % len)
                    .unwrap_or(len - 1),
            );
        }
    }

    /// Tapping a chip is equivalent to typing and submitting its text.
    pub fn activate_chip(&mut self) {
        if let Some(text) = self
            .chip_selected
            .and_then(|i| self.quick_replies().get(i).cloned())
        {
            self.submit(&text);
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_typing() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        let max = self.total_chat_lines().saturating_sub(self.chat_height);
        if self.chat_scroll < max {
            self.chat_scroll += 1;
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        let total = self.total_chat_lines();
        if total > self.chat_height {
            self.chat_scroll = total - self.chat_height;
        } else {
            self.chat_scroll = 0;
        }
    }

    /// Transcript height in rendered lines, accounting for wrapping.
    fn total_chat_lines(&self) -> u16 {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total: u16 = 0;
        for msg in &self.messages {
            total += 1; // Sender line ("You:" or "Nest:")
            for line in msg.text.lines() {
                // Use character count, not byte length, for UTF-8 safety
                let char_count = line.chars().count();
                if char_count == 0 {
                    total += 1;
                } else {
                    total += char_count.div_ceil(wrap_width) as u16;
                }
            }
            total += 1; // Blank line after message
        }

        if self.is_typing() {
            total += 2; // "Nest:" + typing indicator
        }

        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seller::SellerDirectory;

    fn app() -> App {
        App::new(ChatEngine::with_seed(SellerDirectory::new(), 1), false)
    }

    #[test]
    fn chat_lines_do_not_overcount_on_exact_wrap_multiples() {
        let mut app = app();
        app.chat_width = 10;
        app.messages.clear();
        app.messages.push(Message::user("aaaaaaaaaa")); // exactly one row

        // Sender line + one wrapped row + trailing blank.
        assert_eq!(app.total_chat_lines(), 3);

        app.messages.clear();
        app.messages.push(Message::user("aaaaaaaaaaa")); // spills onto a second row
        assert_eq!(app.total_chat_lines(), 4);
    }
}
