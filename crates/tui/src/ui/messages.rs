use {
    super::{panel_block, styled, theme::Theme},
    crate::{
        state::{AppState, Panel},
        view::RenderSurface,
    },
    ratatui::{
        Frame,
        layout::Rect,
        text::Line,
        widgets::Paragraph,
    },
};

/// Render the open channel's regions, oldest at the top. Lines are not
/// wrapped so that scroll offsets count rows exactly.
pub fn draw(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let focused = state.focus == Panel::Messages;
    let title = match state.tree.open_channel() {
        Some(channel) => format!(" #{} ", channel.name),
        None => " Messages ".to_owned(),
    };
    let block = panel_block(&title, focused, theme);
    let inner = block.inner(area);

    let highlighted = state.view.highlighted();
    let mut lines: Vec<Line<'static>> = Vec::new();
    for region in state.view.regions() {
        let region_lines = styled::to_lines(&region.text, theme.base);
        if highlighted == Some(region.id) {
            lines.extend(region_lines.into_iter().map(|line| line.style(theme.highlight)));
        } else {
            lines.extend(region_lines);
        }
        lines.push(Line::default());
    }

    let top = state.view.scroll_top(usize::from(inner.height));
    let top = u16::try_from(top).unwrap_or(u16::MAX);
    let paragraph = Paragraph::new(lines).block(block).scroll((top, 0));
    frame.render_widget(paragraph, area);
}
