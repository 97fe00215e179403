use std::collections::VecDeque;

use crate::constants::{CHAT_HISTORY_LIMIT, CHAT_MESSAGE_MAX_CHARS};
use crate::server_utils::sanitize_chat_message;
use crate::types::{ChatMessage, ChatScope};

#[derive(Clone, Copy, Debug)]
pub struct ChatLogOptions {
    pub max_history: usize,
    pub max_message_chars: usize,
}

impl Default for ChatLogOptions {
    fn default() -> Self {
        Self {
            max_history: CHAT_HISTORY_LIMIT,
            max_message_chars: CHAT_MESSAGE_MAX_CHARS,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PostChatInput {
    pub player_id: String,
    pub player_name: String,
    pub message: String,
    pub scope: ChatScope,
    pub zone_id: Option<String>,
    pub now_ms: u64,
}

#[derive(Clone, Debug)]
pub struct ChatLog {
    options: ChatLogOptions,
    messages: VecDeque<ChatMessage>,
    next_id: u64,
}

impl ChatLog {
    pub fn new(options: ChatLogOptions) -> Self {
        Self {
            options,
            messages: VecDeque::with_capacity(options.max_history),
            next_id: 1,
        }
    }

    /// Returns the stored record, or `None` when the text is empty after trimming.
    pub fn post(&mut self, input: PostChatInput) -> Option<ChatMessage> {
        let message = sanitize_chat_message(&input.message, self.options.max_message_chars)?;
        let record = ChatMessage {
            id: format!("chat_{}", self.next_id),
            player_id: input.player_id,
            player_name: input.player_name,
            message,
            timestamp: input.now_ms,
            scope: input.scope,
            zone_id: match input.scope {
                ChatScope::Zone => input.zone_id,
                ChatScope::Global => None,
            },
        };
        self.next_id += 1;

        while self.messages.len() >= self.options.max_history.max(1) {
            self.messages.pop_front();
        }
        self.messages.push_back(record.clone());
        Some(record)
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }
}
