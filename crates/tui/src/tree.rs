//! Client-side model of the account: the guild tree, per-guild channel lists
//! and the message buffer of the open channel.

use {
    crate::remote::{Capability, PermissionEvaluator},
    murmur_protocol::{Channel, ChannelId, Guild, GuildFolder, GuildId, Message, MessageId},
    std::collections::HashMap,
};

/// Folder color used when the account did not pick one.
pub const DEFAULT_FOLDER_COLOR: u32 = 0xED4245;

/// Folder label used when the account did not name the folder.
pub const DEFAULT_FOLDER_NAME: &str = "Folder";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Folder {
        id: u64,
        name: String,
        color: u32,
    },
    Guild {
        id: GuildId,
        name: String,
    },
}

/// One entry of the guild tree. Folders hold guilds; guilds are leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub kind: NodeKind,
    pub children: Vec<TreeNode>,
    pub expanded: bool,
}

impl TreeNode {
    pub fn guild(guild: &Guild) -> Self {
        Self {
            kind: NodeKind::Guild {
                id: guild.id,
                name: guild.name.clone(),
            },
            children: Vec::new(),
            expanded: false,
        }
    }

    pub fn folder(folder: &GuildFolder) -> Self {
        Self {
            kind: NodeKind::Folder {
                id: folder.id.unwrap_or_default(),
                name: folder
                    .name
                    .clone()
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| DEFAULT_FOLDER_NAME.into()),
                color: folder.color.unwrap_or(DEFAULT_FOLDER_COLOR),
            },
            children: Vec::new(),
            expanded: false,
        }
    }

    pub fn guild_id(&self) -> Option<GuildId> {
        match self.kind {
            NodeKind::Guild { id, .. } => Some(id),
            NodeKind::Folder { .. } => None,
        }
    }

    pub fn label(&self) -> &str {
        match &self.kind {
            NodeKind::Folder { name, .. } | NodeKind::Guild { name, .. } => name,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder { .. })
    }

    fn contains_guild(&self, id: GuildId) -> bool {
        self.guild_id() == Some(id) || self.children.iter().any(|c| c.contains_guild(id))
    }
}

/// A node as laid out on screen: depth-first, skipping collapsed children.
#[derive(Debug, Clone, Copy)]
pub struct VisibleNode<'a> {
    pub depth: usize,
    pub node: &'a TreeNode,
}

#[derive(Debug, Default)]
pub struct TreeModel {
    roots: Vec<TreeNode>,
    channels: HashMap<GuildId, Vec<Channel>>,
    open_channel: Option<Channel>,
    /// Loaded messages of the open channel, newest first.
    messages: Vec<Message>,
}

impl TreeModel {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Guild tree ───────────────────────────────────────────────────────────

    #[cfg(test)]
    pub(crate) fn roots(&self) -> &[TreeNode] {
        &self.roots
    }

    /// Swap in a fully built tree. Channel lists of guilds that are no
    /// longer present are dropped.
    pub fn replace_roots(&mut self, roots: Vec<TreeNode>) {
        self.roots = roots;
        let roots = &self.roots;
        self.channels
            .retain(|id, _| roots.iter().any(|n| n.contains_guild(*id)));
    }

    pub fn contains_guild(&self, id: GuildId) -> bool {
        self.roots.iter().any(|n| n.contains_guild(id))
    }

    /// Append a guild at the top level. Returns `false` if the guild is
    /// already somewhere in the tree.
    pub fn insert_guild(&mut self, guild: &Guild) -> bool {
        if self.contains_guild(guild.id) {
            return false;
        }
        self.roots.push(TreeNode::guild(guild));
        true
    }

    /// Detach the guild's node wherever it sits. Returns `false` if the guild
    /// was not in the tree.
    pub fn remove_guild(&mut self, id: GuildId) -> bool {
        fn detach(nodes: &mut Vec<TreeNode>, id: GuildId) -> bool {
            if let Some(pos) = nodes.iter().position(|n| n.guild_id() == Some(id)) {
                nodes.remove(pos);
                return true;
            }
            nodes.iter_mut().any(|n| detach(&mut n.children, id))
        }

        let removed = detach(&mut self.roots, id);
        if removed {
            self.channels.remove(&id);
        }
        removed
    }

    pub fn visible_nodes(&self) -> Vec<VisibleNode<'_>> {
        fn walk<'a>(nodes: &'a [TreeNode], depth: usize, out: &mut Vec<VisibleNode<'a>>) {
            for node in nodes {
                out.push(VisibleNode { depth, node });
                if node.expanded {
                    walk(&node.children, depth + 1, out);
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.roots, 0, &mut out);
        out
    }

    /// Flip the expansion of the `index`-th visible node. Returns the node's
    /// new expansion state, or `None` if the index is out of range.
    pub fn toggle_expanded(&mut self, index: usize) -> Option<bool> {
        fn walk(nodes: &mut [TreeNode], remaining: &mut usize) -> Option<bool> {
            for node in nodes {
                if *remaining == 0 {
                    node.expanded = !node.expanded;
                    return Some(node.expanded);
                }
                *remaining -= 1;
                if node.expanded
                    && let Some(state) = walk(&mut node.children, remaining)
                {
                    return Some(state);
                }
            }
            None
        }

        let mut remaining = index;
        walk(&mut self.roots, &mut remaining)
    }

    // ── Channels ─────────────────────────────────────────────────────────────

    pub fn set_channels(&mut self, guild: GuildId, channels: Vec<Channel>) {
        self.channels.insert(guild, channels);
    }

    pub fn channels(&self, guild: GuildId) -> &[Channel] {
        self.channels.get(&guild).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn channel(&self, id: ChannelId) -> Option<&Channel> {
        if let Some(open) = &self.open_channel
            && open.id == id
        {
            return Some(open);
        }
        self.channels.values().flatten().find(|c| c.id == id)
    }

    // ── Message buffer ───────────────────────────────────────────────────────

    pub fn open_channel(&self) -> Option<&Channel> {
        self.open_channel.as_ref()
    }

    pub fn open_channel_id(&self) -> Option<ChannelId> {
        self.open_channel.as_ref().map(|c| c.id)
    }

    /// Make `channel` the open channel with an empty buffer. Navigation must
    /// be reset alongside; see `AppState::open_channel`.
    pub(crate) fn set_open_channel(&mut self, channel: Channel) {
        self.open_channel = Some(channel);
        self.messages.clear();
    }

    /// Loaded messages, newest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn position(&self, id: MessageId) -> Option<usize> {
        self.messages.iter().position(|m| m.id == id)
    }

    /// Merge a fetched page into the buffer. Messages already loaded, such
    /// as live ones that arrived while the fetch was in flight, are kept.
    /// Ignored unless `channel` is still the open channel.
    pub fn merge_messages(&mut self, channel: ChannelId, messages: Vec<Message>) -> bool {
        if self.open_channel_id() != Some(channel) {
            return false;
        }
        self.messages
            .extend(messages.into_iter().filter(|m| m.channel_id == channel));
        self.messages.sort_by(|a, b| b.id.cmp(&a.id));
        self.messages.dedup_by_key(|m| m.id);
        true
    }

    /// Insert a message at its ordered position. Returns the index it landed
    /// at, or `None` if it belongs to another channel or is already loaded.
    pub fn insert_message(&mut self, message: Message) -> Option<usize> {
        if self.open_channel_id() != Some(message.channel_id) {
            return None;
        }
        match self.messages.binary_search_by(|m| message.id.cmp(&m.id)) {
            Ok(_) => None,
            Err(index) => {
                self.messages.insert(index, message);
                Some(index)
            },
        }
    }

    pub fn remove_message(&mut self, id: MessageId) -> Option<(usize, Message)> {
        let index = self.position(id)?;
        Some((index, self.messages.remove(index)))
    }
}

impl PermissionEvaluator for TreeModel {
    fn has_capability(&self, channel: ChannelId, capability: Capability) -> bool {
        self.channel(channel)
            .is_some_and(|c| c.permissions & capability.bit() != 0)
    }
}
