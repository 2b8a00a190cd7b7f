use std::sync::Arc;

use juris_core::{
    AnswerClient, ChatResponse, ClientError, Config, Conversation, Message, Mode,
};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Chat,
    Details,
    Input,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    // Conversation (transcript, awaiting flag, input buffer, mode)
    pub conversation: Conversation,
    pub query_cursor: usize, // cursor position in conversation.input, in chars
    pub query_task: Option<JoinHandle<Result<ChatResponse, ClientError>>>,

    // Chat pane
    pub chat_scroll: u16,
    pub chat_height: u16, // Inner height of chat area for scroll calculations
    pub chat_width: u16,  // Inner width of chat area for wrap calculations

    // Details pane (sources / comparison of one bot message)
    pub selected_detail: Option<usize>, // index into conversation.messages()
    pub detail_scroll: u16,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Mode picker state
    pub show_mode_picker: bool,
    pub mode_picker_state: ListState,

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub details_area: Option<Rect>,

    pub client: Arc<dyn AnswerClient>,
    pub api_url: String,
}

impl App {
    pub fn new(client: Arc<dyn AnswerClient>, api_url: String, mode: Mode) -> Self {
        let mut conversation = Conversation::with_greeting();
        conversation.set_mode(mode);

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: FocusPane::Input,

            conversation,
            query_cursor: 0,
            query_task: None,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            selected_detail: None,
            detail_scroll: 0,

            animation_frame: 0,

            show_mode_picker: false,
            mode_picker_state: ListState::default(),

            chat_area: None,
            details_area: None,

            client,
            api_url,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.conversation.is_awaiting()
    }

    /// Submit the input buffer and start the request in the background.
    pub fn send_query(&mut self) {
        let Some(dispatch) = self.conversation.submit_input() else {
            return;
        };

        self.query_cursor = 0;
        self.input_mode = InputMode::Normal;
        self.focus = FocusPane::Chat;

        // Scroll to bottom so "Thinking..." is visible
        self.scroll_chat_to_bottom();

        let client = Arc::clone(&self.client);
        self.query_task = Some(tokio::spawn(async move {
            client.send(&dispatch.query, dispatch.mode).await
        }));
    }

    /// Fold a finished request back into the conversation. Cheap no-op otherwise.
    pub async fn poll_query(&mut self) {
        let finished = self
            .query_task
            .as_ref()
            .is_some_and(|task| task.is_finished());
        if !finished {
            return;
        }

        let Some(task) = self.query_task.take() else {
            return;
        };
        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(e) => Err(ClientError::Task(e.to_string())),
        };
        self.conversation.complete(outcome);

        // Point the details pane at the fresh answer when it has anything to show
        let last_idx = self.conversation.len().saturating_sub(1);
        if self.conversation.last().is_some_and(Message::has_details) {
            self.selected_detail = Some(last_idx);
            self.detail_scroll = 0;
        }
        self.scroll_chat_to_bottom();
    }

    pub fn selected_message(&self) -> Option<&Message> {
        self.selected_detail
            .and_then(|idx| self.conversation.messages().get(idx))
    }

    pub fn select_next_detail(&mut self) {
        let start = self.selected_detail.map(|i| i + 1).unwrap_or(0);
        let next = self
            .conversation
            .messages()
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, msg)| msg.has_details())
            .map(|(i, _)| i);
        if next.is_some() {
            self.selected_detail = next;
            self.detail_scroll = 0;
        }
    }

    pub fn select_prev_detail(&mut self) {
        let end = self
            .selected_detail
            .unwrap_or(self.conversation.len());
        let prev = self.conversation.messages()[..end]
            .iter()
            .rposition(Message::has_details);
        if prev.is_some() {
            self.selected_detail = prev;
            self.detail_scroll = 0;
        }
    }

    // Chat scrolling
    pub fn scroll_chat_down(&mut self, lines: u16) {
        let max_scroll = self.chat_total_lines().saturating_sub(self.visible_chat_height());
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max_scroll);
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_chat_to_top(&mut self) {
        self.chat_scroll = 0;
    }

    pub fn scroll_chat_to_bottom(&mut self) {
        let total_lines = self.chat_total_lines();
        let visible_height = self.visible_chat_height();
        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }

    pub fn half_page(&self) -> u16 {
        (self.visible_chat_height() / 2).max(1)
    }

    pub fn scroll_details_down(&mut self, lines: u16) {
        self.detail_scroll = self.detail_scroll.saturating_add(lines);
    }

    pub fn scroll_details_up(&mut self, lines: u16) {
        self.detail_scroll = self.detail_scroll.saturating_sub(lines);
    }

    fn visible_chat_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        }
    }

    /// Estimated rendered height of the transcript, wrapping included.
    fn chat_total_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: usize = 0;

        for msg in self.conversation.messages() {
            total_lines += 1; // Role line ("You:" or "AI:")
            for line in chat_body(msg).lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                total_lines += (char_count / wrap_width) + 1;
            }
            total_lines += 1; // Blank line after message
        }

        if self.is_loading() {
            total_lines += 2; // "AI:" + "Thinking..."
        }

        // Paragraph scroll offsets are u16
        u16::try_from(total_lines).unwrap_or(u16::MAX)
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Mode picker methods
    pub fn open_mode_picker(&mut self) {
        let current = Mode::all()
            .iter()
            .position(|m| *m == self.conversation.mode());
        self.mode_picker_state.select(current.or(Some(0)));
        self.show_mode_picker = true;
    }

    pub fn mode_picker_nav_down(&mut self) {
        let len = Mode::all().len();
        let i = self.mode_picker_state.selected().unwrap_or(0);
        self.mode_picker_state.select(Some((i + 1).min(len - 1)));
    }

    pub fn mode_picker_nav_up(&mut self) {
        let i = self.mode_picker_state.selected().unwrap_or(0);
        self.mode_picker_state.select(Some(i.saturating_sub(1)));
    }

    /// Apply the highlighted mode and remember it as the default.
    pub fn select_mode(&mut self) {
        if let Some(mode) = self
            .mode_picker_state
            .selected()
            .and_then(|i| Mode::all().get(i).copied())
        {
            self.conversation.set_mode(mode);
            self.show_mode_picker = false;
            if let Err(e) = Config::save_default_mode(mode) {
                tracing::warn!(error = %e, "could not save default mode");
            }
        }
    }
}

/// Text shown under the role line of a message in the chat pane.
pub fn chat_body(msg: &Message) -> String {
    if let Some(comparison) = msg.comparison() {
        return format!(
            "Comparison ready: naive {:.2}s, advanced {:.2}s (see details pane)",
            comparison.naive.processing_time, comparison.advanced.processing_time
        );
    }

    let mut text = msg.content().unwrap_or_default().to_string();
    if let Some(sources) = msg.sources().filter(|s| !s.is_empty()) {
        let noun = if sources.len() == 1 { "source" } else { "sources" };
        text.push_str(&format!("\n[{} {}]", sources.len(), noun));
    }
    text
}
