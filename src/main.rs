use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;

use jbot::config::Config;
use jbot::responder::telegram::{callback_event, incoming_message};
use jbot::responder::{refresh, Database, HoroscopeClient, Inbound, Responder, TelegramClient};

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Closing bot due to error: {e}");
            std::process::exit(1);
        }
    };

    let guard = init_logging(&config);
    info!("Starting jbot...");
    info!("Loaded config from {config_path}");

    if let Err(e) = run(config).await {
        error!("Closing bot due to error: {e}");
        drop(guard);
        std::process::exit(1);
    }
}

fn env_filter(debug: bool) -> tracing_subscriber::EnvFilter {
    let level = if debug { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into())
}

/// Stdout logging, plus a log file when `log_dir` is set. The returned guard
/// flushes the file writer on drop.
fn init_logging(config: &Config) -> Option<WorkerGuard> {
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_filter(env_filter(config.debug));

    let mut guard = None;
    let file_layer = config.log_dir.as_ref().and_then(|log_dir| {
        std::fs::create_dir_all(log_dir).ok();
        let log_file = match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join("jbot.log"))
        {
            Ok(file) => file,
            Err(e) => {
                eprintln!("Failed to open log file in {}: {e}", log_dir.display());
                return None;
            }
        };
        let (non_blocking, file_guard) = tracing_appender::non_blocking(log_file);
        guard = Some(file_guard);
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(env_filter(config.debug)),
        )
    });

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .init();

    guard
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let bot = Bot::new(&config.api_key);

    let me = bot.get_me().await.map_err(|e| {
        format!("API key authentication failed, double check that the key is valid: {e}")
    })?;
    info!("Telegram bot authenticated for @{}", me.username());

    let database = match Database::open(&config.database_url) {
        Ok(db) => {
            info!("connected to database");
            Some(Arc::new(db))
        }
        Err(e) => {
            warn!("no database connection: {e}");
            None
        }
    };

    let client = Arc::new(HoroscopeClient::new(&config.horoscope_api_url)?);
    let responder = Arc::new(Responder::from_config(&config, database.clone(), client.clone()));

    if responder.is_running("horoscope")
        && let Some(db) = database
    {
        refresh::spawn(db, client, &config.horoscope_refresh_cron)?;
    }

    let telegram = Arc::new(TelegramClient::new(bot.clone()));

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![responder, telegram])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_message(
    msg: Message,
    responder: Arc<Responder>,
    telegram: Arc<TelegramClient>,
) -> ResponseResult<()> {
    let Some(incoming) = incoming_message(&msg) else {
        return Ok(());
    };

    let text_preview: String = incoming.text.chars().take(100).collect();
    info!("[{}] {}", incoming.username, text_preview);

    let actions = responder.handle(&Inbound::Message(incoming)).await;
    telegram.deliver(&actions).await;
    Ok(())
}

async fn handle_callback(
    query: CallbackQuery,
    responder: Arc<Responder>,
    telegram: Arc<TelegramClient>,
) -> ResponseResult<()> {
    let event = callback_event(&query);
    info!("Callback {:?} from user {}", event.data, event.user_id);

    let actions = responder.handle(&Inbound::Callback(event)).await;
    telegram.deliver(&actions).await;
    Ok(())
}
