use {
    super::{panel_block, theme::{Theme, rgb}},
    crate::{
        state::{AppState, Panel},
        tree::NodeKind,
    },
    ratatui::{
        Frame,
        layout::Rect,
        text::{Line, Span},
        widgets::{List, ListItem, ListState},
    },
};

/// Render the guild tree: folders with their color and an expand marker,
/// guilds indented under their folder.
pub fn draw(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let focused = state.focus == Panel::Guilds;
    let nodes = state.tree.visible_nodes();

    let items: Vec<ListItem<'_>> = nodes
        .iter()
        .map(|visible| {
            let indent = "  ".repeat(visible.depth);
            let line = match &visible.node.kind {
                NodeKind::Folder { name, color, .. } => {
                    let marker = if visible.node.expanded { "▾" } else { "▸" };
                    Line::from(vec![
                        Span::raw(indent),
                        Span::styled(format!("{marker} {name}"), theme.guild.fg(rgb(*color))),
                    ])
                },
                NodeKind::Guild { id, .. } => {
                    let style = if state.selected_guild == Some(*id) {
                        theme.guild_selected
                    } else {
                        theme.guild
                    };
                    Line::from(vec![
                        Span::raw(indent),
                        Span::styled(visible.node.label().to_owned(), style),
                    ])
                },
            };
            ListItem::new(line)
        })
        .collect();

    let mut list_state = ListState::default();
    if focused && !nodes.is_empty() {
        list_state.select(Some(state.guild_cursor));
    }

    let list = List::new(items)
        .block(panel_block(" Guilds ", focused, theme))
        .highlight_style(theme.cursor);
    frame.render_stateful_widget(list, area, &mut list_state);
}
