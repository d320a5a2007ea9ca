//! Terminal rendering of messages

use std::collections::HashMap;

use flowdock_api_contract::{Message, User};

/// Event types that carry no conversation and are hidden from stream output
pub const NOISE_EVENTS: &[&str] = &[
    "user-edit",
    "file",
    "activity.user",
    "mail",
    "zendesk",
    "twitter",
    "tag-change",
];

/// Users by id, assembled once for rendering message authors
#[derive(Debug, Default, Clone)]
pub struct UserDirectory {
    users: HashMap<i64, User>,
}

impl UserDirectory {
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: users
                .into_iter()
                .filter_map(|user| user.id.map(|id| (id, user)))
                .collect(),
        }
    }

    pub fn nick(&self, id: Option<i64>) -> &str {
        id.and_then(|id| self.users.get(&id))
            .and_then(|user| user.nick.as_deref())
            .unwrap_or("unknown")
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// One line for a chat message, or `None` for noise events.
pub fn chat_line(message: &Message, room: &str, users: &UserDirectory) -> Option<String> {
    let event = message.event.as_deref().unwrap_or("");
    if NOISE_EVENTS.contains(&event) {
        return None;
    }

    Some(format!(
        "MSG: {} {} {} {} {}",
        room,
        id_text(message.id),
        users.nick(message.user),
        event,
        content_text(message)
    ))
}

/// One line summarising a search hit.
pub fn search_line(message: &Message) -> String {
    let sent = message
        .sent
        .map(|t| t.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "MSG: {} {} {} [{}]",
        sent,
        id_text(message.id),
        message.event.as_deref().unwrap_or("-"),
        message.tags.join(" ")
    )
}

/// Rendered content, or the decode error in angle brackets.
pub fn content_text(message: &Message) -> String {
    match message.content() {
        Ok(content) => content.to_string(),
        Err(e) => format!("<{e}>"),
    }
}

pub fn id_text(id: Option<i64>) -> String {
    id.map_or_else(|| "-".to_string(), |id| id.to_string())
}
