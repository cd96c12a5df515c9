//! Static replies for message commands.

use rand::Rng;

use crate::config::CommandConfig;
use crate::responder::commands::{pick_reply, render_template};
use crate::responder::feature::reply_for;
use crate::responder::message::{IncomingMessage, Outbound};

/// A random templated line from the command's reply pool.
pub fn respond<R: Rng>(command: &CommandConfig, message: &IncomingMessage, rng: &mut R) -> Option<Outbound> {
    let template = pick_reply(&command.replies, rng)?;
    let text = render_template(template, &message.username);
    Some(Outbound::Send(reply_for(command, message, text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CommandKind;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn greet(reply: bool, replies: &[&str]) -> CommandConfig {
        CommandConfig {
            name: "greet".to_string(),
            kind: CommandKind::Message,
            aliases: vec!["hello".to_string()],
            prefix: false,
            reply,
            replies: replies.iter().map(|r| r.to_string()).collect(),
            probability: 1.0,
        }
    }

    fn message(text: &str) -> IncomingMessage {
        IncomingMessage {
            message_id: 10,
            chat_id: -100,
            user_id: 5,
            username: "Alice".to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_templated_reply() {
        let mut rng = StdRng::seed_from_u64(3);
        let out = respond(&greet(false, &["hi {name}"]), &message("hello bot"), &mut rng).unwrap();
        match out {
            Outbound::Send(reply) => {
                assert_eq!(reply.text, "hi Alice");
                assert_eq!(reply.chat_id, -100);
                assert_eq!(reply.reply_to_message_id, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_threaded_reply() {
        let mut rng = StdRng::seed_from_u64(3);
        let out = respond(&greet(true, &["yo"]), &message("hello"), &mut rng).unwrap();
        match out {
            Outbound::Send(reply) => assert_eq!(reply.reply_to_message_id, Some(10)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_empty_pool_sends_nothing() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(respond(&greet(false, &[]), &message("hello"), &mut rng).is_none());
    }
}
