use {
    super::{panel_block, theme::Theme},
    crate::state::{AppState, Panel},
    ratatui::{
        Frame,
        layout::Rect,
        widgets::{List, ListItem, ListState},
    },
};

/// Render the channels of the selected guild.
pub fn draw(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let focused = state.focus == Panel::Channels;
    let channels = state
        .selected_guild
        .map(|guild| state.tree.channels(guild))
        .unwrap_or_default();
    let open = state.tree.open_channel_id();

    let items: Vec<ListItem<'_>> = channels
        .iter()
        .map(|channel| {
            let style = if open == Some(channel.id) {
                theme.channel_open
            } else {
                theme.channel
            };
            ListItem::new(format!("#{}", channel.name)).style(style)
        })
        .collect();

    let mut list_state = ListState::default();
    if focused && !channels.is_empty() {
        list_state.select(Some(state.channel_cursor));
    }

    let list = List::new(items)
        .block(panel_block(" Channels ", focused, theme))
        .highlight_style(theme.cursor);
    frame.render_stateful_widget(list, area, &mut list_state);
}
