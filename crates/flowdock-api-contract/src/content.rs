//! Message content resolution
//!
//! A message's payload is interpreted according to its event tag. The variant
//! is picked once from the tag; a payload that does not fit the picked variant
//! is an error, never a silent fallback to [`Content::Opaque`].

use std::fmt;

use serde::Deserialize;

use crate::error::ContentError;
use crate::types::Message;

/// Event tag for plain chat messages
pub const EVENT_MESSAGE: &str = "message";
/// Event tag for threaded comments
pub const EVENT_COMMENT: &str = "comment";
/// Event tag for version-control notifications
pub const EVENT_VCS: &str = "vcs";

/// Decoded payload of a [`Message`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    PlainText(String),
    Comment(CommentContent),
    VersionControl(VcsContent),
    /// Payload of an event type without a dedicated variant, verbatim
    Opaque(String),
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Content::PlainText(text) => f.write_str(text),
            Content::Comment(comment) => write!(f, "{comment}"),
            Content::VersionControl(vcs) => write!(f, "{vcs}"),
            Content::Opaque(raw) => f.write_str(raw),
        }
    }
}

/// Content of a `comment` event
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommentContent {
    /// Title of the commented item
    #[serde(default)]
    pub title: Option<String>,
    pub text: String,
}

impl fmt::Display for CommentContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VcsUrl {
    #[serde(default)]
    pub url: Option<String>,
}

impl VcsUrl {
    fn of(link: &Option<VcsUrl>) -> Option<&str> {
        link.as_ref().and_then(|l| l.url.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VcsPusher {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VcsSender {
    #[serde(default)]
    pub login: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VcsRepository {
    #[serde(default)]
    pub name: Option<String>,
}

/// Content of a `vcs` event (GitHub style push, pull request or issue hook)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VcsContent {
    #[serde(default)]
    pub issue: Option<VcsUrl>,
    #[serde(default)]
    pub pull_request: Option<VcsUrl>,
    #[serde(default)]
    pub pusher: Option<VcsPusher>,
    #[serde(default)]
    pub sender: Option<VcsSender>,
    #[serde(default)]
    pub repository: Option<VcsRepository>,
    /// Action verb, e.g. `push` or `pull_request`
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default, rename = "compare")]
    pub compare_url: Option<String>,
}

impl VcsContent {
    pub fn repository_name(&self) -> &str {
        self.repository
            .as_ref()
            .and_then(|r| r.name.as_deref())
            .unwrap_or_default()
    }

    pub fn action(&self) -> &str {
        self.event.as_deref().unwrap_or_default()
    }

    /// Pusher name, else sender login, else `"Unknown"`.
    pub fn actor(&self) -> &str {
        self.pusher
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .or_else(|| self.sender.as_ref().and_then(|s| s.login.as_deref()))
            .unwrap_or("Unknown")
    }

    /// Compare URL, else pull request URL, else issue URL.
    pub fn link(&self) -> Option<&str> {
        self.compare_url
            .as_deref()
            .or_else(|| VcsUrl::of(&self.pull_request))
            .or_else(|| VcsUrl::of(&self.issue))
    }
}

impl fmt::Display for VcsContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} by {} {}",
            self.repository_name(),
            self.action(),
            self.actor(),
            self.link().unwrap_or_default()
        )
    }
}

impl Message {
    /// Decode the payload according to the event tag.
    ///
    /// A missing payload is treated as JSON `null`, which only the opaque
    /// variant accepts.
    pub fn content(&self) -> Result<Content, ContentError> {
        let event = self.event.as_deref().unwrap_or_default();
        let raw = self.content.as_ref().map_or("null", |c| c.get());

        let decode_error = |source| ContentError {
            event: event.to_string(),
            source,
        };

        match event {
            EVENT_MESSAGE => serde_json::from_str(raw)
                .map(Content::PlainText)
                .map_err(decode_error),
            EVENT_COMMENT => serde_json::from_str(raw)
                .map(Content::Comment)
                .map_err(decode_error),
            EVENT_VCS => serde_json::from_str(raw)
                .map(Content::VersionControl)
                .map_err(decode_error),
            _ => Ok(Content::Opaque(raw.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawContent;

    fn message(event: &str, content: &str) -> Message {
        Message {
            event: Some(event.to_string()),
            content: Some(RawContent::from_json(content).unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_plain_message_content() {
        let msg = message("message", r#""Howdy-Doo @Jackie #awesome""#);
        let content = msg.content().unwrap();

        assert_eq!(
            content,
            Content::PlainText("Howdy-Doo @Jackie #awesome".to_string())
        );
        assert_eq!(content.to_string(), "Howdy-Doo @Jackie #awesome");
    }

    #[test]
    fn test_comment_content() {
        let msg = message(
            "comment",
            r#"{"title":"Title of parent","text":"This is a comment"}"#,
        );
        let content = msg.content().unwrap();

        match &content {
            Content::Comment(comment) => {
                assert_eq!(comment.title.as_deref(), Some("Title of parent"));
                assert_eq!(comment.text, "This is a comment");
            }
            other => panic!("expected comment, got {other:?}"),
        }
        assert_eq!(content.to_string(), "This is a comment");
    }

    #[test]
    fn test_vcs_content_prefers_pusher_and_compare() {
        let msg = message(
            "vcs",
            r#"{
                "event": "push",
                "repository": {"name": "go-flowdock"},
                "pusher": {"name": "wm"},
                "sender": {"login": "wmernagh"},
                "compare": "https://github.com/wm/go-flowdock/compare/a...b",
                "pull_request": {"url": "https://github.com/wm/go-flowdock/pull/1"}
            }"#,
        );

        assert_eq!(
            msg.content().unwrap().to_string(),
            "go-flowdock: push by wm https://github.com/wm/go-flowdock/compare/a...b"
        );
    }

    #[test]
    fn test_vcs_content_fallbacks() {
        let msg = message(
            "vcs",
            r#"{
                "event": "issues",
                "repository": {"name": "api"},
                "sender": {"login": "octocat"},
                "issue": {"url": "https://github.com/acme/api/issues/9"}
            }"#,
        );
        let Content::VersionControl(vcs) = msg.content().unwrap() else {
            panic!("expected vcs content");
        };
        assert_eq!(vcs.actor(), "octocat");
        assert_eq!(vcs.link(), Some("https://github.com/acme/api/issues/9"));

        let anonymous = message("vcs", r#"{"event":"push","repository":{"name":"api"}}"#);
        let Content::VersionControl(vcs) = anonymous.content().unwrap() else {
            panic!("expected vcs content");
        };
        assert_eq!(vcs.actor(), "Unknown");
        assert_eq!(vcs.link(), None);
    }

    #[test]
    fn test_unknown_event_is_opaque_and_verbatim() {
        for raw in [r#"{"subject": "Build #87",  "x":[1,2]}"#, r#""just text""#, "42"] {
            let msg = message("mail", raw);
            let content = msg.content().unwrap();
            assert_eq!(content, Content::Opaque(raw.to_string()));
            assert_eq!(content.to_string(), raw);
        }
    }

    #[test]
    fn test_malformed_payload_is_error_not_opaque() {
        let msg = message("comment", r#""not an object""#);
        let err = msg.content().unwrap_err();
        assert_eq!(err.event, "comment");

        let msg = message("comment", r#"{"title":"no text"}"#);
        assert!(msg.content().is_err());

        let msg = message("message", r#"{"text":"object"}"#);
        assert!(msg.content().is_err());
    }

    #[test]
    fn test_missing_payload() {
        let msg = Message {
            event: Some("message".to_string()),
            ..Default::default()
        };
        assert!(msg.content().is_err());

        let msg = Message {
            event: Some("activity.user".to_string()),
            ..Default::default()
        };
        assert_eq!(msg.content().unwrap().to_string(), "null");
    }
}
