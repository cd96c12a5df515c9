//! "decide": picks one of the options the user listed.
//!
//! `!decide pizza or kebab` answers `pizza` or `kebab`. Filler words are
//! never picked and preferred words count twice.

use async_trait::async_trait;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::config::{CommandConfig, DecideConfig};
use crate::responder::commands::strip_command_word;
use crate::responder::feature::{Feature, FeatureError, message_triggers, reply_for};
use crate::responder::message::{Inbound, Outbound};

pub struct Decide {
    command: CommandConfig,
    words: DecideConfig,
}

impl Decide {
    pub fn new(command: CommandConfig, words: DecideConfig) -> Self {
        Self { command, words }
    }
}

#[async_trait]
impl Feature for Decide {
    fn name(&self) -> &'static str {
        "decide"
    }

    fn triggers(&self, inbound: &Inbound) -> bool {
        message_triggers(&self.command, inbound)
    }

    async fn execute(&self, inbound: &Inbound) -> Result<Vec<Outbound>, FeatureError> {
        let Inbound::Message(message) = inbound else {
            return Ok(Vec::new());
        };
        let chosen = {
            let mut rng = rand::rng();
            choose(&message.text, &self.words, &mut rng)
        };
        Ok(chosen
            .map(|word| Outbound::Send(reply_for(&self.command, message, word)))
            .into_iter()
            .collect())
    }

    fn fallback(&self) -> &'static str {
        "Can't decide."
    }
}

/// Pick a word from `text` after its command word. `None` when fewer than
/// two options were given or every option was filtered out.
pub fn choose<R: Rng>(text: &str, words: &DecideConfig, rng: &mut R) -> Option<String> {
    let options: Vec<&str> = strip_command_word(text).split_whitespace().collect();
    if options.len() < 2 {
        return None;
    }
    let candidates = filter_words(&options, &words.skipped);
    let weighted = duplicate_words(&candidates, &words.preferred);
    weighted.choose(rng).map(|w| w.to_string())
}

/// `words` without the ones in `filter`, compared case-insensitively.
pub fn filter_words<'a, S: AsRef<str>>(words: &[&'a str], filter: &[S]) -> Vec<&'a str> {
    words
        .iter()
        .copied()
        .filter(|w| !contains_ignore_case(filter, w))
        .collect()
}

/// `words` with every word found in `preferred` appended once more.
pub fn duplicate_words<'a, S: AsRef<str>>(words: &[&'a str], preferred: &[S]) -> Vec<&'a str> {
    let mut out = words.to_vec();
    out.extend(words.iter().copied().filter(|w| contains_ignore_case(preferred, w)));
    out
}

fn contains_ignore_case<S: AsRef<str>>(list: &[S], word: &str) -> bool {
    let word = word.to_lowercase();
    list.iter().any(|entry| entry.as_ref().to_lowercase() == word)
}
