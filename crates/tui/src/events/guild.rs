use {
    super::SyncVariant,
    crate::{state::AppState, tree::TreeNode},
    murmur_protocol::{Guild, GuildDeletePayload, GuildId, ReadyPayload},
    std::collections::{HashMap, HashSet},
    tracing::{debug, info},
};

pub(super) fn apply_ready(state: &mut AppState, variant: SyncVariant, ready: ReadyPayload) {
    info!(user = %ready.user.tag(), guilds = ready.guilds.len(), ?variant, "ready");
    state.user = Some(ready.user.clone());
    state.dirty = true;

    if variant == SyncVariant::Incremental {
        return;
    }

    match build_snapshot(&ready) {
        Some(roots) => {
            state.tree.replace_roots(roots);
            state.clamp_cursors();
        },
        None => debug!("ready references unknown guilds, dropping snapshot"),
    }
}

/// Build the full tree from a `ready` payload, or `None` if a folder names a
/// guild the payload does not carry. Guilds no folder mentions go last, in
/// payload order.
fn build_snapshot(ready: &ReadyPayload) -> Option<Vec<TreeNode>> {
    let by_id: HashMap<GuildId, &Guild> = ready.guilds.iter().map(|g| (g.id, g)).collect();

    if ready.guild_folders.is_empty() {
        return Some(ready.guilds.iter().map(TreeNode::guild).collect());
    }

    let mut placed = HashSet::new();
    let mut roots = Vec::new();

    for folder in &ready.guild_folders {
        let mut members = Vec::with_capacity(folder.guild_ids.len());
        for id in &folder.guild_ids {
            let guild = by_id.get(id)?;
            if placed.insert(*id) {
                members.push(TreeNode::guild(guild));
            }
        }

        if folder.is_ungrouped() {
            roots.extend(members);
        } else {
            let mut node = TreeNode::folder(folder);
            node.children = members;
            roots.push(node);
        }
    }

    roots.extend(
        ready
            .guilds
            .iter()
            .filter(|g| !placed.contains(&g.id))
            .map(TreeNode::guild),
    );
    Some(roots)
}

pub(super) fn apply_guild_create(state: &mut AppState, guild: &Guild) {
    if state.tree.insert_guild(guild) {
        debug!(guild = %guild.id, name = %guild.name, "guild available");
        state.dirty = true;
    }
}

pub(super) fn apply_guild_delete(state: &mut AppState, payload: &GuildDeletePayload) {
    if state.tree.remove_guild(payload.id) {
        debug!(guild = %payload.id, unavailable = payload.unavailable, "guild removed");
        state.clamp_cursors();
        state.dirty = true;
    }
}
