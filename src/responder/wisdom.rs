//! Lines from the book corpus: a specific verse on request, otherwise a random one.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use crate::config::CommandConfig;
use crate::responder::database::Database;
use crate::responder::feature::{Feature, FeatureError, message_triggers, reply_for};
use crate::responder::message::{Inbound, Outbound};

pub struct Wisdom {
    command: CommandConfig,
    db: Arc<Database>,
}

impl Wisdom {
    pub fn new(command: CommandConfig, db: Arc<Database>) -> Result<Self, FeatureError> {
        if !db.ping() {
            return Err(FeatureError::Unavailable("no database connection".to_string()));
        }
        Ok(Self { command, db })
    }

    /// `"/wisdom gen. 1:1"` looks up that verse; anything else, or a verse that
    /// does not exist, gets a random formatted line.
    pub fn line_for(&self, text: &str) -> Result<String, FeatureError> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if let [_, chapter, verse, ..] = words.as_slice() {
            let chapter = chapter.to_lowercase().replace('.', "");
            match self.db.book_line(&chapter, verse) {
                Ok(Some(line)) => return Ok(line),
                Ok(None) => {}
                Err(e) => warn!("Lookup of {chapter} {verse} failed: {e}"),
            }
        }

        self.db
            .random_book_line()?
            .map(|line| line.format())
            .ok_or_else(|| FeatureError::Unavailable("book table is empty".to_string()))
    }
}

#[async_trait]
impl Feature for Wisdom {
    fn name(&self) -> &'static str {
        "wisdom"
    }

    fn triggers(&self, inbound: &Inbound) -> bool {
        message_triggers(&self.command, inbound)
    }

    async fn execute(&self, inbound: &Inbound) -> Result<Vec<Outbound>, FeatureError> {
        let Inbound::Message(message) = inbound else {
            return Ok(Vec::new());
        };
        let text = self.line_for(&message.text)?;
        Ok(vec![Outbound::Send(reply_for(&self.command, message, text))])
    }

    fn fallback(&self) -> &'static str {
        "No wisdom today."
    }
}
