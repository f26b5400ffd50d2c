pub mod action_menu;
pub mod channels;
pub mod guilds;
pub mod input;
pub mod messages;
pub mod status_bar;
pub mod styled;
pub mod theme;

use {
    crate::state::AppState,
    ratatui::{
        Frame,
        layout::{Constraint, Layout, Rect},
        widgets::{Block, Borders},
    },
    status_bar::ConnectionDisplay,
    theme::Theme,
    tui_textarea::TextArea,
};

/// Draw the entire UI.
pub fn draw(
    frame: &mut Frame,
    state: &AppState,
    connection: &ConnectionDisplay,
    plugins: usize,
    textarea: &mut TextArea<'_>,
    theme: &Theme,
) {
    let area = frame.area();
    frame.render_widget(Block::default().style(theme.base), area);

    // Vertical: panels + status bar
    let vertical = Layout::vertical([Constraint::Min(4), Constraint::Length(1)]).split(area);

    let horizontal = Layout::horizontal([
        Constraint::Length(28), // guilds + channels
        Constraint::Min(30),    // messages + input
    ])
    .split(vertical[0]);

    let left = Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(horizontal[0]);
    let right = Layout::vertical([Constraint::Min(3), Constraint::Length(3)]).split(horizontal[1]);

    guilds::draw(frame, left[0], state, theme);
    channels::draw(frame, left[1], state, theme);
    messages::draw(frame, right[0], state, theme);
    input::draw(frame, right[1], state, textarea, theme);
    status_bar::draw(frame, vertical[1], state, connection, plugins, theme);

    if let Some(menu) = &state.action_menu {
        action_menu::draw(frame, area, menu, theme);
    }
}

/// Bordered block for a panel, highlighted when it has focus.
fn panel_block(title: &str, focused: bool, theme: &Theme) -> Block<'static> {
    let block = Block::default()
        .title(title.to_owned())
        .border_style(if focused {
            theme.border_focused
        } else {
            theme.border
        });
    if theme.borders {
        block.borders(Borders::ALL)
    } else {
        block
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .split(area);

    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            actions::{ActionMenu, MessageAction},
            navigation::Transition,
            state::{Panel, PendingReply},
            tree::{
                TreeNode,
                tests::{channel, guild, message},
            },
        },
        murmur_protocol::{ChannelId, GuildFolder, GuildId, MessageId, User, UserId},
        ratatui::{Terminal, backend::TestBackend},
    };

    fn render_to_text(state: &AppState, connection: &ConnectionDisplay) -> String {
        let backend = TestBackend::new(100, 24);
        let mut terminal = match Terminal::new(backend) {
            Ok(t) => t,
            Err(error) => panic!("failed to create test terminal: {error}"),
        };
        let mut textarea = TextArea::default();
        let theme = Theme::default();

        if let Err(error) = terminal.draw(|frame| {
            draw(frame, state, connection, 2, &mut textarea, &theme);
        }) {
            panic!("failed to draw test frame: {error}");
        }

        let buffer = terminal.backend().buffer();
        let area = buffer.area;
        let mut text = String::new();

        for y in 0..area.height {
            for x in 0..area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }

        text
    }

    fn populated() -> AppState {
        let mut state = AppState::new("green");
        let mut folder = TreeNode::folder(&GuildFolder {
            id: Some(7),
            name: Some("Work".into()),
            color: None,
            guild_ids: vec![GuildId(2)],
        });
        folder.children.push(TreeNode::guild(&guild(2, "Office")));
        folder.expanded = true;
        state
            .tree
            .replace_roots(vec![TreeNode::guild(&guild(1, "Rustaceans")), folder]);

        state.tree.set_channels(GuildId(1), vec![channel(5, 1, 0)]);
        state.selected_guild = Some(GuildId(1));
        state.open_channel(channel(5, 1, 0));
        state.load_messages(ChannelId(5), vec![message(20, 5, 2), message(10, 5, 1)]);
        state.user = Some(User {
            id: UserId(1),
            username: "me".into(),
            discriminator: None,
        });
        state
    }

    #[test]
    fn empty_state_shows_panels() {
        let state = AppState::new("green");
        let text = render_to_text(&state, &ConnectionDisplay::Connecting);

        assert!(text.contains("Guilds"));
        assert!(text.contains("Channels"));
        assert!(text.contains("Messages"));
        assert!(text.contains("Connecting..."));
    }

    #[test]
    fn populated_state_shows_tree_channels_and_messages() {
        let state = populated();
        let text = render_to_text(&state, &ConnectionDisplay::Connected);

        assert!(text.contains("Rustaceans"));
        assert!(text.contains("▾ Work"));
        assert!(text.contains("  Office"));
        assert!(text.contains("#chan-5"));
        assert!(text.contains("user1 message 10"));
        assert!(text.contains("user2 message 20"));
        assert!(text.contains("Message #chan-5"));
        assert!(text.contains("me"));
        assert!(text.contains("2 plugin(s)"));
    }

    #[test]
    fn oldest_message_is_drawn_first() {
        let state = populated();
        let text = render_to_text(&state, &ConnectionDisplay::Connected);

        let older = text.find("message 10");
        let newer = text.find("message 20");
        assert!(older.is_some() && newer.is_some());
        assert!(older < newer);
    }

    #[test]
    fn style_tokens_are_not_drawn() {
        let mut state = populated();
        let mut msg = message(30, 5, 3);
        msg.content = "**loud** and [[bracketed]".into();
        state.insert_message(msg);

        let text = render_to_text(&state, &ConnectionDisplay::Connected);
        assert!(text.contains("user3 loud and [[bracketed]"));
        assert!(!text.contains("[::b]"));
    }

    #[test]
    fn pending_reply_titles_the_input() {
        let mut state = populated();
        state.focus = Panel::Input;
        state.pending_reply = Some(PendingReply {
            message_id: MessageId(20),
            author: "user2".into(),
            mention: true,
        });

        let text = render_to_text(&state, &ConnectionDisplay::Connected);
        assert!(text.contains("[@] Replying to user2"));
    }

    #[test]
    fn action_menu_overlays() {
        let mut state = populated();
        state.navigate(Transition::First);
        state.action_menu = Some(ActionMenu::new(MessageId(20), vec![
            MessageAction::Reply,
            MessageAction::CopyId,
        ]));

        let text = render_to_text(&state, &ConnectionDisplay::Connected);
        assert!(text.contains("Press the Escape key to close"));
        assert!(text.contains("r  Reply"));
        assert!(text.contains("i  Copy ID"));
    }
}
