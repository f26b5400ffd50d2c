//! Applies gateway push events to the app state.

mod guild;
mod message;

use {
    crate::state::AppState,
    murmur_protocol::{Guild, GuildDeletePayload, Message, ReadyPayload, events},
    serde_json::Value,
    tracing::debug,
};

/// How the account's guild list reaches the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncVariant {
    /// User accounts: `ready` carries every guild, grouped into folders.
    FullSnapshot,
    /// Bot accounts: each guild arrives as its own `guild.create`.
    Incremental,
}

impl SyncVariant {
    pub fn for_account(is_bot: bool) -> Self {
        if is_bot {
            Self::Incremental
        } else {
            Self::FullSnapshot
        }
    }
}

/// A decoded push event.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    Ready(Box<ReadyPayload>),
    GuildCreate(Guild),
    GuildDelete(GuildDeletePayload),
    MessageCreate(Box<Message>),
}

impl GatewayEvent {
    /// Decode `payload` for the event called `name`. Unknown names yield
    /// `Ok(None)`.
    pub fn parse(name: &str, payload: Value) -> Result<Option<Self>, serde_json::Error> {
        let event = match name {
            events::READY => Self::Ready(serde_json::from_value(payload)?),
            events::GUILD_CREATE => Self::GuildCreate(serde_json::from_value(payload)?),
            events::GUILD_DELETE => Self::GuildDelete(serde_json::from_value(payload)?),
            events::MESSAGE_CREATE => Self::MessageCreate(serde_json::from_value(payload)?),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GatewaySynchronizer {
    variant: SyncVariant,
}

impl GatewaySynchronizer {
    pub fn new(variant: SyncVariant) -> Self {
        Self { variant }
    }

    /// Route a raw event to its handler. Malformed payloads drop just this
    /// event.
    pub fn handle_event(&self, state: &mut AppState, name: &str, payload: Value) {
        match GatewayEvent::parse(name, payload) {
            Ok(Some(event)) => self.apply(state, event),
            Ok(None) => debug!(event = name, "unhandled event"),
            Err(e) => debug!(event = name, error = %e, "dropping malformed event"),
        }
    }

    pub fn apply(&self, state: &mut AppState, event: GatewayEvent) {
        match event {
            GatewayEvent::Ready(ready) => guild::apply_ready(state, self.variant, *ready),
            GatewayEvent::GuildCreate(g) => guild::apply_guild_create(state, &g),
            GatewayEvent::GuildDelete(d) => guild::apply_guild_delete(state, &d),
            GatewayEvent::MessageCreate(m) => message::apply_message_create(state, *m),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn unknown_event_is_not_an_error() {
        assert!(matches!(GatewayEvent::parse("typing.start", json!({})), Ok(None)));
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(GatewayEvent::parse(events::GUILD_CREATE, json!({"id": "x"})).is_err());
    }

    #[test]
    fn malformed_event_does_not_block_later_ones() {
        let sync = GatewaySynchronizer::new(SyncVariant::Incremental);
        let mut state = AppState::new("green");

        sync.handle_event(&mut state, events::GUILD_CREATE, json!({"name": 1}));
        sync.handle_event(&mut state, events::GUILD_CREATE, json!({"id": 4, "name": "ok"}));

        assert_eq!(state.tree.roots().len(), 1);
    }

    #[test]
    fn variant_follows_account_kind() {
        assert_eq!(SyncVariant::for_account(true), SyncVariant::Incremental);
        assert_eq!(SyncVariant::for_account(false), SyncVariant::FullSnapshot);
    }
}
