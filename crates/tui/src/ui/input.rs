use {
    super::theme::Theme,
    crate::state::{AppState, Panel},
    ratatui::{
        Frame,
        layout::Rect,
        style::{Modifier, Style},
        widgets::{Block, Borders},
    },
    tui_textarea::TextArea,
};

/// Render the message composer. The title names the reply target when one
/// is pending.
pub fn draw(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    textarea: &mut TextArea<'_>,
    theme: &Theme,
) {
    let focused = state.focus == Panel::Input;

    let (title, title_style) = match (&state.pending_reply, state.tree.open_channel()) {
        (Some(reply), _) => (format!(" {} ", reply.title()), theme.reply_title),
        (None, Some(channel)) => (format!(" Message #{} ", channel.name), Style::default()),
        (None, None) => (" Message ".to_owned(), Style::default()),
    };

    let mut block = Block::default()
        .title(title)
        .title_style(title_style)
        .border_style(if focused { theme.border_focused } else { theme.border });
    if theme.borders {
        block = block.borders(Borders::ALL);
    }

    textarea.set_cursor_line_style(Style::default());
    textarea.set_cursor_style(if focused {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    });
    textarea.set_style(theme.base);
    textarea.set_placeholder_style(theme.placeholder);
    textarea.set_block(block);

    frame.render_widget(&*textarea, area);
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        ratatui::{Terminal, backend::TestBackend, style::Color},
    };

    #[test]
    fn placeholder_uses_theme_style() {
        let state = AppState::new("green");
        let theme = Theme {
            placeholder: Style::default().fg(Color::Magenta),
            ..Theme::default()
        };
        let mut textarea = TextArea::default();
        textarea.set_placeholder_text("Type a message...");

        let mut terminal = Terminal::new(TestBackend::new(40, 3)).unwrap();
        terminal
            .draw(|frame| draw(frame, frame.area(), &state, &mut textarea, &theme))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let start = (0..39)
            .find(|&x| buffer[(x, 1)].symbol() == "T" && buffer[(x + 1, 1)].symbol() == "y")
            .unwrap();
        assert_eq!(buffer[(start, 1)].fg, Color::Magenta);
    }
}
