//! Telegram side of the responder: update conversion and delivery via teloxide.

use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ReplyParameters};
use tracing::{debug, warn};

use crate::responder::message::{CallbackEvent, IncomingMessage, Keyboard, Outbound, Reply};

/// Domain view of a Telegram text message. `None` for messages without text.
pub fn incoming_message(msg: &Message) -> Option<IncomingMessage> {
    let text = msg.text()?;
    let user = msg.from.as_ref();
    let user_id = user.map(|u| u.id.0 as i64).unwrap_or(0);
    let username = user
        .and_then(|u| u.username.as_deref())
        .unwrap_or_else(|| user.map(|u| u.first_name.as_str()).unwrap_or("unknown"))
        .to_string();

    Some(IncomingMessage {
        message_id: msg.id.0 as i64,
        chat_id: msg.chat.id.0,
        user_id,
        username,
        text: text.to_string(),
    })
}

/// Domain view of an inline keyboard press.
pub fn callback_event(query: &CallbackQuery) -> CallbackEvent {
    CallbackEvent {
        callback_id: query.id.0.clone(),
        chat_id: query.message.as_ref().map(|m| m.chat().id.0),
        user_id: query.from.id.0 as i64,
        data: query.data.clone().unwrap_or_default(),
    }
}

pub fn inline_keyboard(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.iter().map(|row| {
        row.iter()
            .map(|button| InlineKeyboardButton::callback(button.label.clone(), button.data.clone()))
            .collect::<Vec<_>>()
    }))
}

/// Telegram API client.
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Perform every action in order. Failures are logged and skipped.
    pub async fn deliver(&self, actions: &[Outbound]) {
        for action in actions {
            let result = match action {
                Outbound::Send(reply) => self.send_reply(reply).await.map(|_| ()),
                Outbound::AnswerCallback { callback_id, text } => {
                    self.answer_callback(callback_id, text.as_deref()).await
                }
            };
            if let Err(e) = result {
                warn!("{}", e);
            }
        }
    }

    pub async fn send_reply(&self, reply: &Reply) -> Result<i64, String> {
        debug!("Sending to chat {}: {:?}", reply.chat_id, reply.text);
        let mut request = self.bot.send_message(ChatId(reply.chat_id), &reply.text);

        if let Some(msg_id) = reply.reply_to_message_id {
            let reply_params = ReplyParameters::new(MessageId(msg_id as i32));
            request = request.reply_parameters(reply_params);
        }

        if let Some(ref keyboard) = reply.keyboard {
            request = request.reply_markup(inline_keyboard(keyboard));
        }

        request
            .await
            .map(|msg| msg.id.0 as i64)
            .map_err(|e| format!("Failed to send: {e}"))
    }

    pub async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<(), String> {
        let mut request = self
            .bot
            .answer_callback_query(CallbackQueryId(callback_id.to_string()));

        if let Some(text) = text {
            request = request.text(text);
        }

        request
            .await
            .map(|_| ())
            .map_err(|e| format!("Failed to answer callback query: {e}"))
    }
}
