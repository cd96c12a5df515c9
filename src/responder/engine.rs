//! Dispatch: from an inbound event to the actions the bot takes.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{CommandConfig, CommandKind, Config};
use crate::responder::commands::{find_command, passes_probability};
use crate::responder::database::Database;
use crate::responder::decide::Decide;
use crate::responder::feature::{Feature, FeatureError, reply_for};
use crate::responder::horoscope::Horoscope;
use crate::responder::horoscope_api::HoroscopeClient;
use crate::responder::message::{CallbackEvent, Inbound, IncomingMessage, Outbound, Reply};
use crate::responder::pingpong;
use crate::responder::wisdom::Wisdom;

/// Names of the built-in special features.
pub const FEATURE_NAMES: [&str; 3] = ["decide", "horoscope", "wisdom"];

pub struct Responder {
    commands: Vec<CommandConfig>,
    features: Vec<Box<dyn Feature>>,
}

impl Responder {
    pub fn new(commands: Vec<CommandConfig>, features: Vec<Box<dyn Feature>>) -> Self {
        Self { commands, features }
    }

    /// Build every feature the config has a special command for. Features that
    /// cannot start are logged and left out.
    pub fn from_config(config: &Config, db: Option<Arc<Database>>, client: Arc<HoroscopeClient>) -> Self {
        let mut features: Vec<Box<dyn Feature>> = Vec::new();

        for name in FEATURE_NAMES {
            let Some(command) = config.special(name) else {
                info!("not running {name}: no special command configured");
                continue;
            };
            let built = build_feature(name, command.clone(), config, db.clone(), client.clone());
            match built {
                Ok(feature) => {
                    info!("running {name}");
                    features.push(feature);
                }
                Err(e) => warn!("not running {name}: {e}"),
            }
        }

        for command in &config.commands {
            if command.kind == CommandKind::Special && !FEATURE_NAMES.contains(&command.name.as_str()) {
                warn!("special command '{}' has no feature of that name", command.name);
            }
        }

        Self::new(config.commands.clone(), features)
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.feature(name).is_some()
    }

    fn feature(&self, name: &str) -> Option<&dyn Feature> {
        self.features.iter().find(|f| f.name() == name).map(|f| f.as_ref())
    }

    /// Everything the bot should do in response to `inbound`. Failures are
    /// logged and turned into fallback replies.
    pub async fn handle(&self, inbound: &Inbound) -> Vec<Outbound> {
        match inbound {
            Inbound::Message(message) => self.handle_message(inbound, message).await,
            Inbound::Callback(event) => self.handle_callback(inbound, event).await,
        }
    }

    async fn handle_message(&self, inbound: &Inbound, message: &IncomingMessage) -> Vec<Outbound> {
        let Some(command) = find_command(&self.commands, &message.text) else {
            return Vec::new();
        };

        let fires = {
            let mut rng = rand::rng();
            passes_probability(command.probability, &mut rng)
        };
        if !fires {
            debug!("'{}' matched but stayed quiet", command.name);
            return Vec::new();
        }

        match command.kind {
            CommandKind::Message => {
                let reply = {
                    let mut rng = rand::rng();
                    pingpong::respond(command, message, &mut rng)
                };
                reply.into_iter().collect()
            }
            CommandKind::Special => {
                let Some(feature) = self.feature(&command.name) else {
                    debug!("'{}' matched but its feature is not running", command.name);
                    return Vec::new();
                };
                if !feature.triggers(inbound) {
                    debug!("{} declined {:?}", feature.name(), message.text);
                    return Vec::new();
                }
                info!("{} triggered by {} ({})", feature.name(), message.username, message.user_id);
                match feature.execute(inbound).await {
                    Ok(actions) => actions,
                    Err(e) => {
                        warn!("{} failed: {e}", feature.name());
                        vec![Outbound::Send(reply_for(command, message, feature.fallback()))]
                    }
                }
            }
        }
    }

    async fn handle_callback(&self, inbound: &Inbound, event: &CallbackEvent) -> Vec<Outbound> {
        let acknowledge = || Outbound::AnswerCallback {
            callback_id: event.callback_id.clone(),
            text: None,
        };

        let Some(feature) = self.features.iter().find(|f| f.triggers(inbound)) else {
            debug!("Unclaimed callback data {:?}", event.data);
            return vec![acknowledge()];
        };

        match feature.execute(inbound).await {
            Ok(actions) => actions,
            Err(e) => {
                warn!("{} callback failed: {e}", feature.name());
                let mut actions = vec![acknowledge()];
                if let Some(chat_id) = event.chat_id {
                    actions.push(Outbound::Send(Reply::new(chat_id, feature.fallback())));
                }
                actions
            }
        }
    }
}

fn build_feature(
    name: &str,
    command: CommandConfig,
    config: &Config,
    db: Option<Arc<Database>>,
    client: Arc<HoroscopeClient>,
) -> Result<Box<dyn Feature>, FeatureError> {
    let no_db = || FeatureError::Unavailable("no database connection".to_string());
    let feature: Box<dyn Feature> = match name {
        "decide" => Box::new(Decide::new(command, config.decide.clone())),
        "horoscope" => Box::new(Horoscope::new(command, db.ok_or_else(no_db)?, client)?),
        "wisdom" => Box::new(Wisdom::new(command, db.ok_or_else(no_db)?)?),
        other => return Err(FeatureError::Unavailable(format!("unknown feature {other}"))),
    };
    Ok(feature)
}
