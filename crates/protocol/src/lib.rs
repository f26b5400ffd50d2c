//! Gateway WebSocket/RPC protocol definitions.
//!
//! All communication uses JSON frames over WebSocket.
//!
//! Frame types:
//! - `RequestFrame`  : client → gateway RPC call
//! - `ResponseFrame` : gateway → client RPC result
//! - `EventFrame`    : gateway → client server-push
//!
//! The payload types in this crate double as the client's domain model:
//! guilds, channels, messages and attachments are deserialized straight
//! from event and response payloads.

use {
    serde::{Deserialize, Serialize},
    std::fmt,
};

// ── Constants ────────────────────────────────────────────────────────────────

pub const HANDSHAKE_TIMEOUT_MS: u64 = 10_000; // 10s
pub const RPC_TIMEOUT_MS: u64 = 10_000; // 10s
pub const DEFAULT_MESSAGES_LIMIT: u32 = 50;

/// Prefix that marks a bot token. Bot sessions receive guilds incrementally.
pub const BOT_TOKEN_PREFIX: &str = "Bot ";

/// Server-push event names.
pub mod events {
    pub const READY: &str = "ready";
    pub const GUILD_CREATE: &str = "guild.create";
    pub const GUILD_DELETE: &str = "guild.delete";
    pub const MESSAGE_CREATE: &str = "message.create";
}

/// RPC method names.
pub mod methods {
    pub const IDENTIFY: &str = "identify";
    pub const CHANNELS_LIST: &str = "channels.list";
    pub const MESSAGES_LIST: &str = "messages.list";
    pub const MESSAGES_SEND: &str = "messages.send";
    pub const MESSAGES_DELETE: &str = "messages.delete";
}

/// Channel permission bits as computed by the service for the session user.
pub mod permissions {
    pub const SEND_MESSAGES: u64 = 1 << 11;
    pub const MANAGE_MESSAGES: u64 = 1 << 13;
}

// ── Identifiers ──────────────────────────────────────────────────────────────

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

snowflake!(
    /// Guild (server) identifier.
    GuildId
);
snowflake!(
    /// Channel identifier.
    ChannelId
);
snowflake!(
    /// Message identifier. Service-assigned, increasing within a channel.
    MessageId
);
snowflake!(UserId);

// ── Error shape ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorShape {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorShape {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }
}

// ── Frames ───────────────────────────────────────────────────────────────────

/// Client → gateway RPC request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestFrame {
    pub r#type: String, // always "req"
    pub id: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl RequestFrame {
    pub fn new(id: impl Into<String>, method: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            r#type: "req".into(),
            id: id.into(),
            method: method.into(),
            params: Some(params),
        }
    }
}

/// Gateway → client RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseFrame {
    pub r#type: String, // always "res"
    pub id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorShape>,
}

impl ResponseFrame {
    pub fn ok(id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            r#type: "res".into(),
            id: id.into(),
            ok: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn err(id: impl Into<String>, error: ErrorShape) -> Self {
        Self {
            r#type: "res".into(),
            id: id.into(),
            ok: false,
            payload: None,
            error: Some(error),
        }
    }
}

/// Gateway → client server-push event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventFrame {
    pub r#type: String, // always "event"
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

impl EventFrame {
    /// A server-push frame as the gateway emits it.
    pub fn new(event: impl Into<String>, payload: serde_json::Value, seq: u64) -> Self {
        Self {
            r#type: "event".into(),
            event: event.into(),
            payload: Some(payload),
            seq: Some(seq),
        }
    }
}

// ── Identify handshake ───────────────────────────────────────────────────────

/// Client properties reported during identify.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
}

/// Parameters of the initial `identify` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyParams {
    pub token: String,
    pub properties: IdentifyProperties,
    // The official client never asks for compressed frames.
    pub compress: bool,
}

/// Payload of a successful `identify` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyOk {
    pub user: User,
    pub session_id: String,
}

// ── Domain payloads ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,
}

impl User {
    /// `name#1234` for legacy accounts, plain `name` otherwise.
    pub fn tag(&self) -> String {
        match self.discriminator.as_deref() {
            Some(d) if !d.is_empty() && d != "0" => format!("{}#{d}", self.username),
            _ => self.username.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub id: GuildId,
    pub name: String,
}

/// A user-defined grouping of guilds. `id == None` (or `0`) marks the
/// implicit folder of ungrouped guilds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildFolder {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<u32>,
    pub guild_ids: Vec<GuildId>,
}

impl GuildFolder {
    pub fn is_ungrouped(&self) -> bool {
        matches!(self.id, None | Some(0))
    }
}

/// `ready` event payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyPayload {
    pub user: User,
    #[serde(default)]
    pub guilds: Vec<Guild>,
    #[serde(default)]
    pub guild_folders: Vec<GuildFolder>,
}

/// `guild.delete` event payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildDeletePayload {
    pub id: GuildId,
    #[serde(default)]
    pub unavailable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: ChannelId,
    pub guild_id: GuildId,
    pub name: String,
    /// Effective permission bits of the session user in this channel.
    #[serde(default)]
    pub permissions: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub url: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author: User,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Message this one replies to. Only the id is kept; the referenced
    /// message may be outside the loaded window or deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_message_id: Option<MessageId>,
}

// ── Request params ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsListParams {
    pub guild_id: GuildId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesListParams {
    pub channel_id: ChannelId,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesSendParams {
    pub channel_id: ChannelId,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<MessageId>,
    pub mention_replied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesDeleteParams {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_payload_parses_folders() {
        let payload = serde_json::json!({
            "user": {"id": 1, "username": "me"},
            "guilds": [{"id": 10, "name": "Rust"}, {"id": 11, "name": "Go"}],
            "guildFolders": [
                {"id": 0, "guildIds": [10]},
                {"id": 7, "name": "Work", "color": 3066993, "guildIds": [11]}
            ]
        });
        let ready: ReadyPayload = serde_json::from_value(payload).unwrap();
        assert_eq!(ready.guilds.len(), 2);
        assert!(ready.guild_folders[0].is_ungrouped());
        assert!(!ready.guild_folders[1].is_ungrouped());
        assert_eq!(ready.guild_folders[1].guild_ids, vec![GuildId(11)]);
    }

    #[test]
    fn message_without_optional_fields() {
        let payload = serde_json::json!({
            "id": 5,
            "channelId": 2,
            "author": {"id": 1, "username": "ann", "discriminator": "0042"}
        });
        let msg: Message = serde_json::from_value(payload).unwrap();
        assert!(msg.attachments.is_empty());
        assert!(msg.referenced_message_id.is_none());
        assert_eq!(msg.author.tag(), "ann#0042");
    }

    #[test]
    fn user_tag_drops_zero_discriminator() {
        let user = User {
            id: UserId(1),
            username: "bob".into(),
            discriminator: Some("0".into()),
        };
        assert_eq!(user.tag(), "bob");
    }

    #[test]
    fn send_params_skip_missing_reference() {
        let params = MessagesSendParams {
            channel_id: ChannelId(3),
            content: "hi".into(),
            reference: None,
            mention_replied: false,
        };
        let value = serde_json::to_value(&params).unwrap();
        assert!(value.get("reference").is_none());
        assert_eq!(value["channelId"], 3);
    }

    #[test]
    fn event_frame_round_trip_shape() {
        let frame = EventFrame::new(events::GUILD_DELETE, serde_json::json!({"id": 4}), 9);
        let text = serde_json::to_string(&frame).unwrap();
        let parsed: EventFrame = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.r#type, "event");
        assert_eq!(parsed.seq, Some(9));
    }
}
