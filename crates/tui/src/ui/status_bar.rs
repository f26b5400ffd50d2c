use {
    super::theme::Theme,
    crate::state::{AppState, Panel},
    ratatui::{
        Frame,
        layout::{Constraint, Layout, Rect},
        text::{Line, Span},
        widgets::Paragraph,
    },
};

/// Connection status for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionDisplay {
    Disconnected,
    Connecting,
    Connected,
}

/// Render the status bar at the bottom of the screen.
pub fn draw(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    connection: &ConnectionDisplay,
    plugins: usize,
    theme: &Theme,
) {
    let layout = Layout::horizontal([
        Constraint::Length(15), // connection
        Constraint::Min(1),     // status info
    ])
    .split(area);

    let (conn_text, conn_style) = match connection {
        ConnectionDisplay::Disconnected => (" Disconnected ", theme.status_disconnected),
        ConnectionDisplay::Connecting => (" Connecting... ", theme.status_connecting),
        ConnectionDisplay::Connected => (" Connected ", theme.status_connected),
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(conn_text, conn_style))),
        layout[0],
    );

    let mut parts: Vec<Span<'_>> = Vec::new();

    if let Some(user) = &state.user {
        parts.push(Span::raw(format!(" {} ", user.tag())));
    }

    if let Some(channel) = state.tree.open_channel() {
        parts.push(Span::raw(format!("| #{} ", channel.name)));
    }

    let focus = match state.focus {
        Panel::Guilds => "guilds",
        Panel::Channels => "channels",
        Panel::Messages => "messages",
        Panel::Input => "input",
    };
    parts.push(Span::raw(format!("| {focus} ")));

    if plugins > 0 {
        parts.push(Span::raw(format!("| {plugins} plugin(s) ")));
    }

    if let Some(notice) = &state.notice {
        parts.push(Span::styled(format!("| {notice} "), theme.notice));
    }

    frame.render_widget(Paragraph::new(Line::from(parts)), layout[1]);
}
