//! Inbound events and outbound actions, independent of the Telegram types.

/// A text message seen by the bot.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingMessage {
    pub message_id: i64,
    /// Chat ID where this message was sent (negative = group, positive = DM).
    pub chat_id: i64,
    pub user_id: i64,
    /// Username, or first name when the user has no username.
    pub username: String,
    pub text: String,
}

/// A press on one of the bot's inline keyboard buttons.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackEvent {
    pub callback_id: String,
    /// Chat of the message carrying the keyboard, if Telegram still has it.
    pub chat_id: Option<i64>,
    pub user_id: i64,
    pub data: String,
}

/// Anything the update feed hands to the responder.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Message(IncomingMessage),
    Callback(CallbackEvent),
}

/// A single inline keyboard button: label and callback data.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyboardButton {
    pub label: String,
    pub data: String,
}

/// Rows of inline keyboard buttons.
pub type Keyboard = Vec<Vec<KeyboardButton>>;

/// Text message to send.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub chat_id: i64,
    pub text: String,
    pub reply_to_message_id: Option<i64>,
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            reply_to_message_id: None,
            keyboard: None,
        }
    }

    pub fn replying_to(mut self, message_id: i64) -> Self {
        self.reply_to_message_id = Some(message_id);
        self
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// Something the bot does in response to an inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Send(Reply),
    AnswerCallback { callback_id: String, text: Option<String> },
}

impl Outbound {
    /// Text of a `Send` action.
    pub fn text(&self) -> Option<&str> {
        match self {
            Outbound::Send(reply) => Some(&reply.text),
            Outbound::AnswerCallback { .. } => None,
        }
    }
}
