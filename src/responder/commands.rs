//! Command lookup: alias matching, priorities and reply gating.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::config::{CommandConfig, CommandKind};

/// Placeholder in reply templates, replaced with the sender's name.
const NAME_PLACEHOLDER: &str = "{name}";

/// Case-insensitive alias test. Prefix mode requires the alias at the start
/// of the text, substring mode anywhere in it.
pub fn alias_matches(text: &str, alias: &str, prefix: bool) -> bool {
    let text = text.to_lowercase();
    let alias = alias.to_lowercase();
    if prefix {
        text.starts_with(&alias)
    } else {
        text.contains(&alias)
    }
}

/// True when `text` starts with any of `prefixes`, ignoring case.
/// An empty prefix matches everything.
pub fn has_any_prefix<S: AsRef<str>>(text: &str, prefixes: &[S]) -> bool {
    prefixes.iter().any(|p| alias_matches(text, p.as_ref(), true))
}

/// True when any alias of `command` matches `text` in the command's mode.
pub fn command_matches(command: &CommandConfig, text: &str) -> bool {
    if command.prefix {
        return has_any_prefix(text, &command.aliases);
    }
    command.aliases.iter().any(|alias| alias_matches(text, alias, false))
}

/// Find the command `text` triggers.
///
/// Special commands outrank message commands; within a kind the first
/// configured match wins.
pub fn find_command<'a>(commands: &'a [CommandConfig], text: &str) -> Option<&'a CommandConfig> {
    [CommandKind::Special, CommandKind::Message]
        .into_iter()
        .find_map(|kind| {
            commands
                .iter()
                .filter(|c| c.kind == kind)
                .find(|c| command_matches(c, text))
        })
}

/// Roll against a firing probability. 1.0 and above always fires, 0.0 and
/// below never does.
pub fn passes_probability<R: Rng>(probability: f64, rng: &mut R) -> bool {
    if probability >= 1.0 {
        return true;
    }
    if probability <= 0.0 {
        return false;
    }
    rng.random::<f64>() < probability
}

/// Uniformly pick one reply from the pool. `None` for an empty pool.
pub fn pick_reply<'a, R: Rng>(pool: &'a [String], rng: &mut R) -> Option<&'a str> {
    pool.choose(rng).map(String::as_str)
}

pub fn render_template(template: &str, name: &str) -> String {
    template.replace(NAME_PLACEHOLDER, name)
}

/// Text after the leading command word, or empty when there is none.
pub fn strip_command_word(text: &str) -> &str {
    let trimmed = text.trim_start();
    match trimmed.find(char::is_whitespace) {
        Some(idx) => trimmed[idx..].trim_start(),
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn command(name: &str, kind: CommandKind, aliases: &[&str], prefix: bool) -> CommandConfig {
        CommandConfig {
            name: name.to_string(),
            kind,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            prefix,
            reply: false,
            replies: vec![format!("{name} reply")],
            probability: 1.0,
        }
    }

    fn sample_commands() -> Vec<CommandConfig> {
        vec![
            command("start", CommandKind::Message, &["/start", "/begin"], true),
            command("wisdom", CommandKind::Special, &["/wisdom", "/wisewords"], true),
            command("horoscope", CommandKind::Special, &["!horoscope"], true),
        ]
    }

    #[test]
    fn test_has_any_prefix() {
        let texts = ["cats and dogs", "Cats And Dogs", "CATS AND DOGS", "dogs and CATS", "and", ""];
        let prefixes: [&[&str]; 7] = [
            &["cats"],
            &["and"],
            &["dogs"],
            &["cats", "and", "dogs"],
            &["dogs", "and", "cats"],
            &["mice", "swans", "elephants"],
            &[""],
        ];
        let expected = [
            [true, false, false, true, true, false, true],
            [true, false, false, true, true, false, true],
            [true, false, false, true, true, false, true],
            [false, false, true, true, true, false, true],
            [false, true, false, true, true, false, true],
            [false, false, false, false, false, false, true],
        ];

        for (i, text) in texts.iter().enumerate() {
            for (j, p) in prefixes.iter().enumerate() {
                assert_eq!(
                    has_any_prefix(text, p),
                    expected[i][j],
                    "has_any_prefix({text:?}, {p:?})"
                );
            }
        }
    }

    #[test]
    fn test_alias_modes() {
        assert!(alias_matches("Hello there", "hello", true));
        assert!(!alias_matches("well hello there", "hello", true));
        assert!(alias_matches("well HELLO there", "hello", false));
        assert!(alias_matches("well hello there", "HeLLo", false));
        assert!(!alias_matches("goodbye", "hello", false));
    }

    #[test]
    fn test_alias_matching_non_ascii() {
        assert!(alias_matches("HÄRKÄ", "härkä", true));
        assert!(alias_matches("onko kaljaa", "KALJAA", false));
    }

    #[test]
    fn test_find_command() {
        let commands = sample_commands();
        let cases = [
            ("/start the bot please", Some("start")),
            ("/begin", Some("start")),
            ("/wisdom for me please", Some("wisdom")),
            ("/wisewords", Some("wisdom")),
            ("!horoscope", Some("horoscope")),
            ("!horoscope aries", Some("horoscope")),
            ("Lorem Ipsum", None),
            ("please /begin", None),
            ("/start /wisewords !horoscope", Some("start")),
            ("/START", Some("start")),
        ];

        for (text, expected) in cases {
            let found = find_command(&commands, text).map(|c| c.name.as_str());
            assert_eq!(found, expected, "message {text:?}");
        }
    }

    #[test]
    fn test_special_outranks_message() {
        let commands = vec![
            command("greet", CommandKind::Message, &["hei"], false),
            command("decide", CommandKind::Special, &["hei"], true),
        ];
        let found = find_command(&commands, "hei vai moi").unwrap();
        assert_eq!(found.name, "decide");

        let found = find_command(&commands, "no hei").unwrap();
        assert_eq!(found.name, "greet");
    }

    #[test]
    fn test_first_configured_wins_within_kind() {
        let commands = vec![
            command("one", CommandKind::Message, &["beer"], false),
            command("two", CommandKind::Message, &["beer"], false),
        ];
        assert_eq!(find_command(&commands, "cold beer").unwrap().name, "one");
    }

    #[test]
    fn test_probability_edges() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            assert!(passes_probability(1.0, &mut rng));
            assert!(!passes_probability(0.0, &mut rng));
        }
    }

    #[test]
    fn test_probability_rate() {
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 20_000;
        for probability in [0.1, 0.25, 0.5, 0.9] {
            let fired = (0..trials)
                .filter(|_| passes_probability(probability, &mut rng))
                .count();
            let rate = fired as f64 / trials as f64;
            assert!(
                (rate - probability).abs() < 0.02,
                "probability {probability} fired at {rate}"
            );
        }
    }

    #[test]
    fn test_pick_reply_stays_in_pool() {
        let mut rng = StdRng::seed_from_u64(1);
        let pool: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            let picked = pick_reply(&pool, &mut rng).unwrap();
            assert!(pool.iter().any(|p| p == picked));
            seen.insert(picked.to_string());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_pick_reply_empty_pool() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(pick_reply(&[], &mut rng).is_none());
    }

    #[test]
    fn test_render_template() {
        assert_eq!(render_template("hello {name}!", "Alice"), "hello Alice!");
        assert_eq!(render_template("no placeholder", "Alice"), "no placeholder");
    }

    #[test]
    fn test_strip_command_word() {
        assert_eq!(strip_command_word("/wisdom gen 1:1"), "gen 1:1");
        assert_eq!(strip_command_word("  !decide   a b"), "a b");
        assert_eq!(strip_command_word("/wisdom"), "");
        assert_eq!(strip_command_word(""), "");
    }
}
