//! The kinds of Telegram update the router acts on.
//! https://core.telegram.org/bots/api#update

use teloxide::types::{CallbackQuery, Message, Update, UpdateKind};

#[derive(Debug, Clone, Copy)]
pub enum InboundEvent<'a> {
    Message(&'a Message),
    ChannelPost(&'a Message),
    CallbackQuery(&'a CallbackQuery),
    Unsupported,
}

pub fn inbound_event(update: &Update) -> InboundEvent<'_> {
    match &update.kind {
        UpdateKind::Message(message) => InboundEvent::Message(message),
        UpdateKind::ChannelPost(message) => InboundEvent::ChannelPost(message),
        UpdateKind::CallbackQuery(query) => InboundEvent::CallbackQuery(query),
        _ => InboundEvent::Unsupported,
    }
}

/// Id to acknowledge when the update is an inline button press.
pub fn callback_query_id(update: &Update) -> Option<&str> {
    match &update.kind {
        UpdateKind::CallbackQuery(query) => Some(query.id.0.as_str()),
        _ => None,
    }
}
