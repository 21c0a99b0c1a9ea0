use log::warn;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, MessageId};

use crate::quiz::loader::LoadingIndicator;

/// Shows a temporary "loading" message in the chat while questions are fetched.
pub struct ChatLoadingIndicator {
    bot: Bot,
    chat_id: ChatId,
    message_id: Option<MessageId>,
}

impl ChatLoadingIndicator {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self {
            bot,
            chat_id,
            message_id: None,
        }
    }
}

impl LoadingIndicator for ChatLoadingIndicator {
    async fn set_visible(&mut self, visible: bool) {
        if visible {
            // Nice to have, nothing breaks if it fails
            let _ = self
                .bot
                .send_chat_action(self.chat_id, ChatAction::Typing)
                .await;
            match self.bot.send_message(self.chat_id, "Loading questions...").await {
                Ok(message) => self.message_id = Some(message.id),
                Err(err) => warn!("Could not show loading message in {}: {}", self.chat_id, err),
            }
        } else if let Some(message_id) = self.message_id.take() {
            if let Err(err) = self.bot.delete_message(self.chat_id, message_id).await {
                warn!("Could not remove loading message in {}: {}", self.chat_id, err);
            }
        }
    }
}
