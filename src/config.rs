use cron::Schedule;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_HOROSCOPE_API_URL: &str =
    "http://theastrologer-api.herokuapp.com/api/horoscope/{sign}/today";

/// Daily at 04:00, local time. The cron crate uses 7 fields: sec min hour day month dow year.
pub const DEFAULT_REFRESH_CRON: &str = "0 0 4 * * * *";

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => write!(
                f,
                "failed to open '{}': {} (check that the working directory has this file)",
                path.display(),
                source
            ),
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::Validation(_) => None,
        }
    }
}

/// How a command is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    /// Answered from the command's own reply pool.
    Message,
    /// Routed to the feature with the same name.
    Special,
}

/// One configured command: its triggers and how it answers.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CommandKind,
    pub aliases: Vec<String>,
    /// Prefix mode when true, substring mode otherwise.
    #[serde(default = "default_true")]
    pub prefix: bool,
    /// Thread the answer to the triggering message.
    #[serde(default)]
    pub reply: bool,
    #[serde(default)]
    pub replies: Vec<String>,
    #[serde(default = "default_probability")]
    pub probability: f64,
}

fn default_true() -> bool {
    true
}

fn default_probability() -> f64 {
    1.0
}

/// Word lists steering the decide feature.
#[derive(Debug, Clone, Deserialize)]
pub struct DecideConfig {
    /// Filler words that are never picked.
    #[serde(default = "default_skipped")]
    pub skipped: Vec<String>,
    /// Words that count twice when picking.
    #[serde(default = "default_preferred")]
    pub preferred: Vec<String>,
}

impl Default for DecideConfig {
    fn default() -> Self {
        Self {
            skipped: default_skipped(),
            preferred: default_preferred(),
        }
    }
}

fn default_skipped() -> Vec<String> {
    ["or", "vai", "tai", "vaiko"].map(String::from).to_vec()
}

fn default_preferred() -> Vec<String> {
    ["kalja", "beer", "olut", "bisse", "kaljaa"].map(String::from).to_vec()
}

#[derive(Deserialize)]
struct ConfigFile {
    #[serde(default)]
    apikey: String,
    #[serde(default)]
    databaseurl: String,
    #[serde(default)]
    debug: bool,
    /// Directory for the log file. Logs go to stdout only when unset.
    log_dir: Option<String>,
    horoscope_api_url: Option<String>,
    horoscope_refresh_cron: Option<String>,
    #[serde(default)]
    commands: Vec<CommandConfig>,
    #[serde(default)]
    decide: DecideConfig,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Path the config was loaded from.
    pub config_path: PathBuf,
    pub api_key: String,
    pub database_url: String,
    pub debug: bool,
    pub log_dir: Option<PathBuf>,
    /// Horoscope endpoint with a `{sign}` placeholder.
    pub horoscope_api_url: String,
    pub horoscope_refresh_cron: String,
    pub commands: Vec<CommandConfig>,
    pub decide: DecideConfig,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::ReadFile { path: config_path.clone(), source: e })?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path: config_path.clone(), source: e })?;

        if file.apikey.is_empty() {
            return Err(ConfigError::Validation(format!(
                "could not find apikey in {}",
                config_path.display()
            )));
        }
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = file.apikey.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(
                "apikey appears invalid (expected format: 123456789:ABCdefGHI...)".into(),
            ));
        }
        if file.databaseurl.is_empty() {
            return Err(ConfigError::Validation(format!(
                "could not find databaseurl in {}",
                config_path.display()
            )));
        }
        if file.commands.is_empty() {
            return Err(ConfigError::Validation("commands must contain at least one command".into()));
        }
        for command in &file.commands {
            validate_command(command)?;
        }

        let horoscope_api_url = file
            .horoscope_api_url
            .unwrap_or_else(|| DEFAULT_HOROSCOPE_API_URL.to_string());
        if !horoscope_api_url.contains("{sign}") {
            return Err(ConfigError::Validation(
                "horoscope_api_url must contain a {sign} placeholder".into(),
            ));
        }

        let horoscope_refresh_cron = file
            .horoscope_refresh_cron
            .unwrap_or_else(|| DEFAULT_REFRESH_CRON.to_string());
        if let Err(e) = Schedule::from_str(&horoscope_refresh_cron) {
            return Err(ConfigError::Validation(format!(
                "invalid horoscope_refresh_cron '{}': {}",
                horoscope_refresh_cron, e
            )));
        }

        Ok(Self {
            config_path,
            api_key: file.apikey,
            database_url: file.databaseurl,
            debug: file.debug,
            log_dir: file.log_dir.map(PathBuf::from),
            horoscope_api_url,
            horoscope_refresh_cron,
            commands: file.commands,
            decide: file.decide,
        })
    }

    /// The special command configured under `name`, if any.
    pub fn special(&self, name: &str) -> Option<&CommandConfig> {
        self.commands
            .iter()
            .find(|c| c.kind == CommandKind::Special && c.name == name)
    }
}

fn validate_command(command: &CommandConfig) -> Result<(), ConfigError> {
    if command.name.is_empty() {
        return Err(ConfigError::Validation("every command needs a name".into()));
    }
    if command.aliases.is_empty() {
        return Err(ConfigError::Validation(format!(
            "command '{}' has no aliases",
            command.name
        )));
    }
    if command.aliases.iter().any(|a| a.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "command '{}' has an empty alias",
            command.name
        )));
    }
    if command.kind == CommandKind::Message && command.replies.is_empty() {
        return Err(ConfigError::Validation(format!(
            "message command '{}' has no replies",
            command.name
        )));
    }
    if !(0.0..=1.0).contains(&command.probability) {
        return Err(ConfigError::Validation(format!(
            "command '{}' has probability {} outside 0.0-1.0",
            command.name, command.probability
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn assert_err<T>(result: Result<T, ConfigError>) -> ConfigError {
        match result {
            Ok(_) => panic!("expected error, got Ok"),
            Err(e) => e,
        }
    }

    const MINIMAL: &str = r#"{
        "apikey": "123456789:TestKey",
        "databaseurl": "jbot.db",
        "commands": [
            {"name": "start", "type": "message", "aliases": ["/start", "/begin"], "replies": ["hello"]},
            {"name": "wisdom", "type": "special", "aliases": ["/wisdom"]}
        ]
    }"#;

    #[test]
    fn test_valid_config() {
        let file = write_config(MINIMAL);
        let config = Config::load(file.path()).expect("should load valid config");
        assert_eq!(config.api_key, "123456789:TestKey");
        assert_eq!(config.database_url, "jbot.db");
        assert_eq!(config.commands.len(), 2);
        assert!(!config.debug);
        assert!(config.log_dir.is_none());
        assert_eq!(config.horoscope_api_url, DEFAULT_HOROSCOPE_API_URL);
        assert_eq!(config.horoscope_refresh_cron, DEFAULT_REFRESH_CRON);
    }

    #[test]
    fn test_command_defaults() {
        let file = write_config(MINIMAL);
        let config = Config::load(file.path()).unwrap();
        let start = &config.commands[0];
        assert_eq!(start.kind, CommandKind::Message);
        assert!(start.prefix);
        assert!(!start.reply);
        assert_eq!(start.probability, 1.0);
        assert_eq!(config.commands[1].kind, CommandKind::Special);
        assert!(config.commands[1].replies.is_empty());
    }

    #[test]
    fn test_decide_defaults() {
        let file = write_config(MINIMAL);
        let config = Config::load(file.path()).unwrap();
        assert!(config.decide.skipped.contains(&"vai".to_string()));
        assert!(config.decide.preferred.contains(&"beer".to_string()));
    }

    #[test]
    fn test_extra_options_are_ignored() {
        let file = write_config(r#"{
            "apikey": "123456789:TestKey",
            "databaseurl": "jbot.db",
            "something_else": {"nested": [1, 2, 3]},
            "commands": [{"name": "wisdom", "type": "special", "aliases": ["/wisdom"]}]
        }"#);
        let config = Config::load(file.path()).expect("unknown keys should be ignored");
        assert_eq!(config.api_key, "123456789:TestKey");
    }

    #[test]
    fn test_special_lookup() {
        let file = write_config(MINIMAL);
        let config = Config::load(file.path()).unwrap();
        assert!(config.special("wisdom").is_some());
        assert!(config.special("start").is_none());
        assert!(config.special("horoscope").is_none());
    }

    #[test]
    fn test_missing_apikey() {
        let file = write_config(r#"{"databaseurl": "jbot.db", "commands": []}"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("apikey"));
    }

    #[test]
    fn test_invalid_token_format() {
        let file = write_config(r#"{
            "apikey": "notanumber:ABCdef",
            "databaseurl": "jbot.db",
            "commands": [{"name": "wisdom", "type": "special", "aliases": ["/wisdom"]}]
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(err.to_string().contains("invalid"));
    }

    #[test]
    fn test_missing_databaseurl() {
        let file = write_config(r#"{
            "apikey": "123456789:TestKey",
            "commands": [{"name": "wisdom", "type": "special", "aliases": ["/wisdom"]}]
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(err.to_string().contains("databaseurl"));
    }

    #[test]
    fn test_empty_commands() {
        let file = write_config(r#"{"apikey": "123456789:TestKey", "databaseurl": "x", "commands": []}"#);
        let err = assert_err(Config::load(file.path()));
        assert!(err.to_string().contains("commands"));
    }

    #[test]
    fn test_message_command_without_replies() {
        let file = write_config(r#"{
            "apikey": "123456789:TestKey",
            "databaseurl": "jbot.db",
            "commands": [{"name": "hi", "type": "message", "aliases": ["hi"]}]
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(err.to_string().contains("no replies"));
    }

    #[test]
    fn test_empty_alias() {
        let file = write_config(r#"{
            "apikey": "123456789:TestKey",
            "databaseurl": "jbot.db",
            "commands": [{"name": "hi", "type": "message", "aliases": ["hi", ""], "replies": ["yo"]}]
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(err.to_string().contains("empty alias"));
    }

    #[test]
    fn test_probability_out_of_range() {
        let file = write_config(r#"{
            "apikey": "123456789:TestKey",
            "databaseurl": "jbot.db",
            "commands": [{"name": "hi", "type": "message", "aliases": ["hi"], "replies": ["yo"], "probability": 1.5}]
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(err.to_string().contains("probability"));
    }

    #[test]
    fn test_unknown_command_type() {
        let file = write_config(r#"{
            "apikey": "123456789:TestKey",
            "databaseurl": "jbot.db",
            "commands": [{"name": "hi", "type": "shout", "aliases": ["hi"]}]
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::ParseJson { .. }));
    }

    #[test]
    fn test_invalid_cron() {
        let file = write_config(r#"{
            "apikey": "123456789:TestKey",
            "databaseurl": "jbot.db",
            "horoscope_refresh_cron": "every morning",
            "commands": [{"name": "horoscope", "type": "special", "aliases": ["!horoscope"]}]
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(err.to_string().contains("horoscope_refresh_cron"));
    }

    #[test]
    fn test_api_url_without_placeholder() {
        let file = write_config(r#"{
            "apikey": "123456789:TestKey",
            "databaseurl": "jbot.db",
            "horoscope_api_url": "http://example.com/today",
            "commands": [{"name": "horoscope", "type": "special", "aliases": ["!horoscope"]}]
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(err.to_string().contains("{sign}"));
    }

    #[test]
    fn test_file_not_found() {
        let err = assert_err(Config::load("/nonexistent/path/config.json"));
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_invalid_json() {
        let file = write_config("{ invalid json }");
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::ParseJson { .. }));
    }
}
