//! The interface every pluggable command handler implements.

use async_trait::async_trait;
use std::fmt;

use crate::config::CommandConfig;
use crate::responder::commands::command_matches;
use crate::responder::database::DbError;
use crate::responder::horoscope_api::FetchError;
use crate::responder::message::{Inbound, IncomingMessage, Outbound, Reply};

#[derive(Debug)]
pub enum FeatureError {
    Db(DbError),
    Fetch(FetchError),
    /// The feature cannot run or has nothing to answer with.
    Unavailable(String),
}

impl fmt::Display for FeatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureError::Db(e) => write!(f, "{e}"),
            FeatureError::Fetch(e) => write!(f, "{e}"),
            FeatureError::Unavailable(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for FeatureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FeatureError::Db(e) => Some(e),
            FeatureError::Fetch(e) => Some(e),
            FeatureError::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for FeatureError {
    fn from(e: DbError) -> Self {
        FeatureError::Db(e)
    }
}

impl From<FetchError> for FeatureError {
    fn from(e: FetchError) -> Self {
        FeatureError::Fetch(e)
    }
}

/// A special command handler.
///
/// Features are looked up by `name()`, which matches the `name` of the
/// special command that routes to them.
#[async_trait]
pub trait Feature: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this feature wants to handle `inbound`. Messages reach a
    /// feature only after its special command matched; callbacks go to the
    /// first feature that claims them.
    fn triggers(&self, inbound: &Inbound) -> bool;

    /// Produce the bot's answer to `inbound`.
    async fn execute(&self, inbound: &Inbound) -> Result<Vec<Outbound>, FeatureError>;

    /// Sent instead of the answer when `execute` fails.
    fn fallback(&self) -> &'static str;
}

/// `triggers` for features that only answer messages matching their command.
pub fn message_triggers(command: &CommandConfig, inbound: &Inbound) -> bool {
    match inbound {
        Inbound::Message(m) => command_matches(command, &m.text),
        Inbound::Callback(_) => false,
    }
}

/// Reply to `message`, threaded when the command asks for it.
pub fn reply_for(command: &CommandConfig, message: &IncomingMessage, text: impl Into<String>) -> Reply {
    let reply = Reply::new(message.chat_id, text);
    if command.reply {
        reply.replying_to(message.message_id)
    } else {
        reply
    }
}
