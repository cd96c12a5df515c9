//! Daily horoscopes, served from the database cache.
//!
//! A message naming a sign gets that sign's horoscope. A message without one
//! gets a keyboard of zodiac buttons; pressing a button sends the horoscope
//! to the chat the keyboard was in. Cache misses are fetched from the API and
//! stored on the way out.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::CommandConfig;
use crate::responder::commands::strip_command_word;
use crate::responder::database::Database;
use crate::responder::feature::{Feature, FeatureError, message_triggers, reply_for};
use crate::responder::horoscope_api::HoroscopeClient;
use crate::responder::message::{CallbackEvent, Inbound, IncomingMessage, Keyboard, KeyboardButton, Outbound, Reply};

const FAILED: &str = "Horoscope failed";
const TRY_A_BUTTON: &str = "Try a button";
const DELIVERED: &str = "Fortune delivered";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl Sign {
    pub const ALL: [Sign; 12] = [
        Sign::Aries,
        Sign::Taurus,
        Sign::Gemini,
        Sign::Cancer,
        Sign::Leo,
        Sign::Virgo,
        Sign::Libra,
        Sign::Scorpio,
        Sign::Sagittarius,
        Sign::Capricorn,
        Sign::Aquarius,
        Sign::Pisces,
    ];

    /// Lower-case English name, as used by the API and the cache.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sign::Aries => "aries",
            Sign::Taurus => "taurus",
            Sign::Gemini => "gemini",
            Sign::Cancer => "cancer",
            Sign::Leo => "leo",
            Sign::Virgo => "virgo",
            Sign::Libra => "libra",
            Sign::Scorpio => "scorpio",
            Sign::Sagittarius => "sagittarius",
            Sign::Capricorn => "capricorn",
            Sign::Aquarius => "aquarius",
            Sign::Pisces => "pisces",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Sign::Aries => "♈",
            Sign::Taurus => "♉",
            Sign::Gemini => "♊",
            Sign::Cancer => "♋",
            Sign::Leo => "♌",
            Sign::Virgo => "♍",
            Sign::Libra => "♎",
            Sign::Scorpio => "♏",
            Sign::Sagittarius => "♐",
            Sign::Capricorn => "♑",
            Sign::Aquarius => "♒",
            Sign::Pisces => "♓",
        }
    }

    /// The sign whose emoji is exactly `data`.
    pub fn from_emoji(data: &str) -> Option<Sign> {
        Sign::ALL.into_iter().find(|s| s.emoji() == data)
    }

    /// Finnish stems and English names that identify the sign in free text.
    fn keywords(&self) -> [&'static str; 2] {
        match self {
            Sign::Aries => ["oina", "aries"],
            Sign::Taurus => ["härk", "taurus"],
            Sign::Gemini => ["kaks", "gemini"],
            Sign::Cancer => ["rap", "cancer"],
            Sign::Leo => ["leij", "leo"],
            Sign::Virgo => ["neit", "virgo"],
            Sign::Libra => ["vaa", "libra"],
            Sign::Scorpio => ["skor", "scorpio"],
            Sign::Sagittarius => ["jous", "sagittarius"],
            Sign::Aquarius => ["vesi", "aquarius"],
            Sign::Capricorn => ["kaur", "capricorn"],
            Sign::Pisces => ["kal", "pisces"],
        }
    }
}

impl std::fmt::Display for Sign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order in which free text is searched for sign keywords.
const PARSE_ORDER: [Sign; 12] = [
    Sign::Aries,
    Sign::Taurus,
    Sign::Gemini,
    Sign::Cancer,
    Sign::Leo,
    Sign::Virgo,
    Sign::Libra,
    Sign::Scorpio,
    Sign::Sagittarius,
    Sign::Aquarius,
    Sign::Capricorn,
    Sign::Pisces,
];

/// Search `text` for a sign keyword, case-insensitively. Signs are tried in
/// `PARSE_ORDER` and the first hit wins.
pub fn parse_sign(text: &str) -> Option<Sign> {
    let text = text.to_lowercase();
    PARSE_ORDER
        .into_iter()
        .find(|sign| sign.keywords().iter().any(|k| text.contains(k)))
}

/// Horoscope as returned by the API and stored in the cache.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct HoroscopeData {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub sunsign: String,
    #[serde(rename = "horoscope", default)]
    pub text: String,
    #[serde(default)]
    pub meta: HoroscopeMeta,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct HoroscopeMeta {
    #[serde(default)]
    pub intensity: String,
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub mood: String,
}

pub fn format_reply(data: &HoroscopeData) -> String {
    format!(
        "The Angels transfer your horoscope:\n👼👼👼\n{}\n👼👼 👼 \n\nKeywords: {}\n\nMood: {}\n\nEnergy level of transfer: {}.",
        data.text, data.meta.keywords, data.meta.mood, data.meta.intensity
    )
}

/// Three rows of four zodiac buttons; each button's data is its emoji.
pub fn sign_keyboard() -> Keyboard {
    const ROWS: [[Sign; 4]; 3] = [
        [Sign::Aquarius, Sign::Pisces, Sign::Aries, Sign::Taurus],
        [Sign::Gemini, Sign::Cancer, Sign::Leo, Sign::Virgo],
        [Sign::Libra, Sign::Scorpio, Sign::Sagittarius, Sign::Capricorn],
    ];
    ROWS.iter()
        .map(|row| {
            row.iter()
                .map(|sign| KeyboardButton {
                    label: sign.emoji().to_string(),
                    data: sign.emoji().to_string(),
                })
                .collect()
        })
        .collect()
}

pub struct Horoscope {
    command: CommandConfig,
    db: Arc<Database>,
    client: Arc<HoroscopeClient>,
}

impl Horoscope {
    pub fn new(command: CommandConfig, db: Arc<Database>, client: Arc<HoroscopeClient>) -> Result<Self, FeatureError> {
        if !db.ping() {
            return Err(FeatureError::Unavailable("no database connection".to_string()));
        }
        Ok(Self { command, db, client })
    }

    /// Formatted horoscope for `sign`, from the cache or else the API.
    pub async fn resolve(&self, sign: Sign) -> Result<String, FeatureError> {
        if let Some(data) = self.db.horoscope(sign.as_str())? {
            return Ok(format_reply(&data));
        }

        info!("No cached horoscope for {sign}, fetching");
        let data = self.client.fetch(sign).await?;
        if let Err(e) = self.db.upsert_horoscope(&data) {
            warn!("Failed to cache horoscope for {sign}: {e}");
        }
        Ok(format_reply(&data))
    }

    async fn answer_message(&self, message: &IncomingMessage) -> Result<Vec<Outbound>, FeatureError> {
        let reply = match parse_sign(strip_command_word(&message.text)) {
            None => reply_for(&self.command, message, TRY_A_BUTTON).with_keyboard(sign_keyboard()),
            Some(sign) => reply_for(&self.command, message, self.resolve(sign).await?),
        };
        Ok(vec![Outbound::Send(reply)])
    }

    async fn answer_callback(&self, event: &CallbackEvent) -> Vec<Outbound> {
        let (Some(sign), Some(chat_id)) = (Sign::from_emoji(&event.data), event.chat_id) else {
            return vec![Outbound::AnswerCallback {
                callback_id: event.callback_id.clone(),
                text: None,
            }];
        };

        let text = match self.resolve(sign).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Horoscope for {sign} failed: {e}");
                FAILED.to_string()
            }
        };

        vec![
            Outbound::AnswerCallback {
                callback_id: event.callback_id.clone(),
                text: Some(DELIVERED.to_string()),
            },
            Outbound::Send(Reply::new(chat_id, text)),
        ]
    }
}

#[async_trait]
impl Feature for Horoscope {
    fn name(&self) -> &'static str {
        "horoscope"
    }

    fn triggers(&self, inbound: &Inbound) -> bool {
        match inbound {
            Inbound::Callback(event) => Sign::from_emoji(&event.data).is_some(),
            Inbound::Message(_) => message_triggers(&self.command, inbound),
        }
    }

    async fn execute(&self, inbound: &Inbound) -> Result<Vec<Outbound>, FeatureError> {
        match inbound {
            Inbound::Message(message) => self.answer_message(message).await,
            Inbound::Callback(event) => Ok(self.answer_callback(event).await),
        }
    }

    fn fallback(&self) -> &'static str {
        FAILED
    }
}
