use {
    super::{centered_rect, theme::Theme},
    crate::actions::ActionMenu,
    ratatui::{
        Frame,
        layout::Rect,
        text::{Line, Span},
        widgets::{Block, Borders, Clear, List, ListItem, ListState},
    },
};

pub const TITLE: &str = " Press the Escape key to close ";

/// Modal listing the actions available for the selected message.
pub fn draw(frame: &mut Frame, area: Rect, menu: &ActionMenu, theme: &Theme) {
    let popup = centered_rect(40, 50, area);

    let items: Vec<ListItem<'_>> = menu
        .actions
        .iter()
        .map(|action| {
            ListItem::new(Line::from(vec![
                Span::styled(format!(" {}  ", action.shortcut()), theme.menu_shortcut),
                Span::raw(action.label()),
            ]))
        })
        .collect();

    let mut list_state = ListState::default();
    list_state.select(Some(menu.cursor));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_focused)
        .style(theme.base)
        .title(TITLE);
    let list = List::new(items).block(block).highlight_style(theme.cursor);

    frame.render_widget(Clear, popup);
    frame.render_stateful_widget(list, popup, &mut list_state);
}
