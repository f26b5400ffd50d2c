use {
    crate::{
        actions::ActionMenu,
        navigation::{NavigationState, Transition},
        tree::TreeModel,
        view::{MessageView, RenderSurface, format_message},
    },
    murmur_protocol::{Channel, ChannelId, GuildId, Message, MessageId, User},
};

/// Which panel has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Guilds,
    Channels,
    Messages,
    Input,
}

/// Reply target picked from the action menu, consumed by the next send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReply {
    pub message_id: MessageId,
    pub author: String,
    /// Ping the replied-to author.
    pub mention: bool,
}

impl PendingReply {
    pub fn title(&self) -> String {
        if self.mention {
            format!("[@] Replying to {}", self.author)
        } else {
            format!("Replying to {}", self.author)
        }
    }
}

/// Everything the app loop owns and the UI draws from.
#[derive(Debug)]
pub struct AppState {
    pub focus: Panel,
    pub tree: TreeModel,
    pub navigation: NavigationState,
    pub view: MessageView,
    /// Cursor into the visible guild tree nodes.
    pub guild_cursor: usize,
    pub channel_cursor: usize,
    /// Guild whose channels the channel panel lists.
    pub selected_guild: Option<GuildId>,
    pub pending_reply: Option<PendingReply>,
    pub action_menu: Option<ActionMenu>,
    /// Session user, known once identified.
    pub user: Option<User>,
    pub notice: Option<String>,
    pub dirty: bool,
}

impl AppState {
    pub fn new(emote_color: impl Into<String>) -> Self {
        Self {
            focus: Panel::Guilds,
            tree: TreeModel::new(),
            navigation: NavigationState::default(),
            view: MessageView::new(emote_color),
            guild_cursor: 0,
            channel_cursor: 0,
            selected_guild: None,
            pending_reply: None,
            action_menu: None,
            user: None,
            notice: None,
            dirty: true,
        }
    }

    /// Switch the messages panel to `channel`. The selection is cleared
    /// before anything else happens to the new buffer.
    pub fn open_channel(&mut self, channel: Channel) {
        self.navigation.clear(&mut self.view);
        self.tree.set_open_channel(channel);
        self.view.clear();
        self.pending_reply = None;
        self.action_menu = None;
        self.dirty = true;
    }

    /// Merge a fetched page into the open channel's buffer.
    pub fn load_messages(&mut self, channel: ChannelId, messages: Vec<Message>) -> bool {
        if !self.tree.merge_messages(channel, messages) {
            return false;
        }
        self.navigation.clear(&mut self.view);
        if let Some(menu) = &self.action_menu
            && self.tree.message(menu.message_id).is_none()
        {
            self.action_menu = None;
        }
        self.view.rebuild(self.tree.messages());
        self.view.scroll_to_end();
        self.dirty = true;
        true
    }

    /// Add a live message to the open channel. Returns `false` if it was
    /// for another channel or already loaded.
    pub fn insert_message(&mut self, message: Message) -> bool {
        let Some(index) = self.tree.insert_message(message) else {
            return false;
        };
        self.navigation.on_insert(index);

        if index == 0 {
            let message = &self.tree.messages()[0];
            let text = format_message(message, self.tree.messages(), self.view.emote_color());
            self.view.append_region(message.id, text);
        } else {
            self.view.rebuild(self.tree.messages());
        }

        if self.view.highlighted().is_none() {
            self.view.scroll_to_end();
        }
        self.dirty = true;
        true
    }

    pub fn remove_message(&mut self, id: MessageId) -> bool {
        let Some((index, _)) = self.tree.remove_message(id) else {
            return false;
        };
        self.navigation.on_remove(index, &mut self.view);
        self.view.rebuild(self.tree.messages());
        self.dirty = true;
        true
    }

    pub fn navigate(&mut self, transition: Transition) -> Option<usize> {
        self.dirty = true;
        self.navigation
            .apply(transition, self.tree.messages(), &mut self.view)
    }

    /// Select the parent of message `id`, independent of the current
    /// selection.
    pub fn select_reply_of(&mut self, id: MessageId) -> Option<usize> {
        let origin = self.tree.position(id)?;
        self.dirty = true;
        self.navigation
            .select_reply_of(origin, self.tree.messages(), &mut self.view)
    }

    pub fn selected_message(&self) -> Option<&Message> {
        self.navigation.selected_message(self.tree.messages())
    }

    /// Drop the selection, the reply target and any open menu.
    pub fn cancel(&mut self) {
        self.navigate(Transition::Clear);
        self.pending_reply = None;
        self.action_menu = None;
        self.dirty = true;
    }

    pub fn notify(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
        self.dirty = true;
    }

    /// Keep the tree and channel cursors inside their lists.
    pub fn clamp_cursors(&mut self) {
        let nodes = self.tree.visible_nodes().len();
        self.guild_cursor = self.guild_cursor.min(nodes.saturating_sub(1));

        if let Some(guild) = self.selected_guild
            && !self.tree.contains_guild(guild)
        {
            self.selected_guild = None;
        }
        let channels = self
            .selected_guild
            .map(|g| self.tree.channels(g).len())
            .unwrap_or_default();
        self.channel_cursor = self.channel_cursor.min(channels.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::tree::tests::{channel, message},
    };

    fn loaded() -> AppState {
        let mut state = AppState::new("green");
        state.open_channel(channel(5, 1, 0));
        state.load_messages(ChannelId(5), vec![message(20, 5, 1), message(10, 5, 1)]);
        state
    }

    #[test]
    fn switching_channel_resets_selection() {
        let mut state = loaded();
        state.navigate(Transition::First);
        assert!(state.selected_message().is_some());

        state.open_channel(channel(6, 1, 0));
        assert_eq!(state.navigation.selected(state.tree.messages()), None);
        assert_eq!(state.view.highlighted(), None);

        // Even once the new buffer is as long as the old one.
        state.load_messages(ChannelId(6), vec![message(2, 6, 1), message(1, 6, 1)]);
        assert_eq!(state.selected_message(), None);
    }

    #[test]
    fn live_message_appends_and_follows_latest() {
        let mut state = loaded();
        assert!(state.insert_message(message(30, 5, 1)));

        let ids: Vec<u64> = state.view.regions().iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![10, 20, 30]);
        assert_eq!(state.view.anchor(), crate::view::ScrollAnchor::Latest);
    }

    #[test]
    fn live_message_keeps_highlight_and_selection() {
        let mut state = loaded();
        state.navigate(Transition::Last);
        assert_eq!(state.selected_message().map(|m| m.id.0), Some(20));

        state.insert_message(message(30, 5, 1));
        assert_eq!(state.selected_message().map(|m| m.id.0), Some(20));
        assert_eq!(state.view.highlighted(), Some(MessageId(20)));
        assert_eq!(state.view.anchor(), crate::view::ScrollAnchor::Highlight);
    }

    #[test]
    fn late_message_lands_in_order() {
        let mut state = loaded();
        state.insert_message(message(15, 5, 1));
        let ids: Vec<u64> = state.view.regions().iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![10, 15, 20]);
    }

    #[test]
    fn initial_fetch_keeps_message_that_arrived_first() {
        let mut state = AppState::new("green");
        state.open_channel(channel(5, 1, 0));
        assert!(state.insert_message(message(100, 5, 1)));

        assert!(state.load_messages(ChannelId(5), vec![message(99, 5, 1), message(98, 5, 1)]));

        let buffer: Vec<u64> = state.tree.messages().iter().map(|m| m.id.0).collect();
        assert_eq!(buffer, vec![100, 99, 98]);
        let regions: Vec<u64> = state.view.regions().iter().map(|r| r.id.0).collect();
        assert_eq!(regions, vec![98, 99, 100]);
    }

    #[test]
    fn other_channel_is_ignored() {
        let mut state = loaded();
        assert!(!state.insert_message(message(30, 6, 1)));
        assert_eq!(state.tree.messages().len(), 2);
    }

    #[test]
    fn cancel_clears_reply_and_selection() {
        let mut state = loaded();
        state.navigate(Transition::Last);
        state.pending_reply = Some(PendingReply {
            message_id: MessageId(20),
            author: "user1".into(),
            mention: false,
        });

        state.cancel();
        assert!(state.pending_reply.is_none());
        assert_eq!(state.view.highlighted(), None);
    }

    #[test]
    fn reply_titles() {
        let mut reply = PendingReply {
            message_id: MessageId(1),
            author: "ann".into(),
            mention: false,
        };
        assert_eq!(reply.title(), "Replying to ann");
        reply.mention = true;
        assert_eq!(reply.title(), "[@] Replying to ann");
    }
}
