use {
    crate::state::AppState,
    murmur_protocol::Message,
    tracing::trace,
};

/// Live message: shown only if it belongs to the open channel.
pub(super) fn apply_message_create(state: &mut AppState, message: Message) {
    let (channel, id) = (message.channel_id, message.id);
    if !state.insert_message(message) {
        trace!(%channel, message = %id, "message not for the open channel");
    }
}
