//! Responder module - matches chat messages to commands and answers them.

pub mod commands;
pub mod database;
pub mod decide;
pub mod engine;
pub mod feature;
pub mod horoscope;
pub mod horoscope_api;
pub mod message;
pub mod pingpong;
pub mod refresh;
pub mod telegram;
pub mod wisdom;


pub use database::Database;
pub use engine::Responder;
pub use feature::{Feature, FeatureError};
pub use horoscope_api::HoroscopeClient;
pub use message::{CallbackEvent, Inbound, IncomingMessage, Outbound, Reply};
pub use telegram::TelegramClient;
