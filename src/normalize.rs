use std::collections::HashSet;

use teloxide::types::Update;
use tracing::debug;

use crate::platform::update::{inbound_event, InboundEvent};

/// A command extracted from an update. `chat_id == 0` with an empty
/// command means there is nothing to answer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Command {
    pub chat_id: i64,
    pub command: String,
    pub arguments: String,
}

impl Command {
    pub fn noop() -> Self {
        Self::default()
    }

    pub fn is_noop(&self) -> bool {
        self.command.is_empty()
    }

    fn new(chat_id: i64, command: &str, arguments: &str) -> Self {
        Self {
            chat_id,
            command: command.to_string(),
            arguments: arguments.to_string(),
        }
    }
}

/// Turns an update into `(chat, command, arguments)`.
///
/// `mention` is the bot's "@username". Commands may carry it as a suffix
/// (`/status@my_bot`); channel posts are only answered when they do.
/// Being added to a group by anyone always yields `start`.
pub fn normalize(update: &Update, mention: &str, own_ids: &HashSet<i64>) -> Command {
    let (chat_id, text, force_mention) = match inbound_event(update) {
        InboundEvent::Message(message) => {
            if let Some(members) = message.new_chat_members() {
                debug!("we got new members");
                if members.iter().any(|member| own_ids.contains(&(member.id.0 as i64))) {
                    debug!("we were added to group");
                    return Command::new(message.chat.id.0, "start", "");
                }
            }
            (message.chat.id.0, message.text().unwrap_or_default(), false)
        }
        InboundEvent::ChannelPost(message) => {
            debug!("we got channel post");
            (message.chat.id.0, message.text().unwrap_or_default(), true)
        }
        InboundEvent::CallbackQuery(query) => {
            debug!("we got callback query");
            let sender = query.from.id.0 as i64;
            (sender, query.data.as_deref().unwrap_or_default(), false)
        }
        InboundEvent::Unsupported => (0, "", false),
    };

    let text = text.trim_start_matches([' ', '/']);
    if text.is_empty() {
        debug!("we got nothing");
        return Command::noop();
    }

    let (command, arguments) = text.split_once(' ').unwrap_or((text, ""));
    let command = match command.strip_suffix(mention) {
        Some(stripped) => stripped,
        None if force_mention => {
            debug!("we were not mentioned");
            return Command::noop();
        }
        None => command,
    };

    Command::new(chat_id, command, arguments.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::update::tests::{callback, channel_post, direct, joined, parse};
    use serde_json::json;

    const MENTION: &str = "@maint_bot";

    fn own_ids() -> HashSet<i64> {
        HashSet::from([111, 222])
    }

    fn run(update: &Update) -> Command {
        normalize(update, MENTION, &own_ids())
    }

    #[test]
    fn test_direct_command_with_arguments() {
        assert_eq!(
            run(&direct(42, "/cmd arg1 arg2")),
            Command::new(42, "cmd", "arg1 arg2")
        );
    }

    #[test]
    fn test_direct_command_without_arguments() {
        assert_eq!(run(&direct(42, "/status")), Command::new(42, "status", ""));
    }

    #[test]
    fn test_direct_command_mention_is_stripped() {
        assert_eq!(
            run(&direct(-100, "/status@maint_bot now ")),
            Command::new(-100, "status", "now")
        );
    }

    #[test]
    fn test_leading_spaces_and_slashes_trimmed() {
        assert_eq!(
            run(&direct(42, "  //help   me  please ")),
            Command::new(42, "help", "me  please")
        );
    }

    #[test]
    fn test_plain_text_becomes_command() {
        assert_eq!(run(&direct(42, "hello")), Command::new(42, "hello", ""));
    }

    #[test]
    fn test_empty_text_is_noop() {
        assert!(run(&direct(42, "")).is_noop());
        assert!(run(&direct(42, " / /")).is_noop());
        assert_eq!(run(&direct(42, "  ")), Command::noop());
    }

    #[test]
    fn test_message_without_text_is_noop() {
        let update = parse(json!({
            "update_id": 5,
            "message": {
                "message_id": 5,
                "date": 1700000000,
                "chat": {"id": 42, "type": "private", "first_name": "Ann"},
                "photo": [{
                    "file_id": "AgAD",
                    "file_unique_id": "AQAD",
                    "width": 90,
                    "height": 90
                }]
            }
        }));
        assert_eq!(run(&update), Command::noop());
    }

    #[test]
    fn test_added_to_group_yields_start() {
        assert_eq!(
            run(&joined(-500, &[9, 222])),
            Command::new(-500, "start", "")
        );
        assert_eq!(run(&joined(-501, &[111])), Command::new(-501, "start", ""));
    }

    #[test]
    fn test_other_members_joining_is_noop() {
        assert!(run(&joined(-500, &[9, 10])).is_noop());
    }

    #[test]
    fn test_channel_post_requires_mention() {
        assert_eq!(run(&channel_post(-1001, "hello")), Command::noop());
        assert_eq!(run(&channel_post(-1001, "/status")), Command::noop());
        assert_eq!(
            run(&channel_post(-1001, "/status@other_bot")),
            Command::noop()
        );
    }

    #[test]
    fn test_channel_post_with_mention() {
        assert_eq!(
            run(&channel_post(-1001, "/status@maint_bot all")),
            Command::new(-1001, "status", "all")
        );
    }

    #[test]
    fn test_callback_uses_sender_as_chat() {
        assert_eq!(
            run(&callback("cb-1", 7, Some("retry"))),
            Command::new(7, "retry", "")
        );
    }

    #[test]
    fn test_callback_without_data_is_noop() {
        assert!(run(&callback("cb-1", 7, None)).is_noop());
    }

    #[test]
    fn test_unsupported_update_is_noop() {
        let update = parse(json!({
            "update_id": 6,
            "edited_channel_post": {
                "message_id": 6,
                "date": 1700000000,
                "edit_date": 1700000100,
                "chat": {"id": -1001, "type": "channel", "title": "News"},
                "text": "/status@maint_bot"
            }
        }));
        assert_eq!(run(&update), Command::noop());
    }

    #[test]
    fn test_command_case_is_preserved() {
        assert_eq!(run(&direct(42, "/Status")), Command::new(42, "Status", ""));
    }

    #[test]
    fn test_normalize_is_repeatable() {
        let updates = [
            direct(42, "/cmd a b"),
            channel_post(-1, "x@maint_bot"),
            callback("cb-1", 7, Some("retry")),
            joined(-5, &[111]),
        ];
        for update in &updates {
            assert_eq!(run(update), run(update));
        }
    }
}
