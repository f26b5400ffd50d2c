use {
    crate::{
        Error,
        actions::{ActionDispatcher, ActionMenu, build_actions},
        connection::ConnectionEvent,
        desktop::Desktop,
        editor,
        events::{GatewaySynchronizer, SyncVariant},
        keys::{Action, Keymap, key_name},
        navigation::Transition,
        remote::RemoteClient,
        rpc::RpcClient,
        state::{AppState, Panel},
        ui::{self, status_bar::ConnectionDisplay, theme::Theme},
    },
    crossterm::event::{
        Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent,
        MouseEventKind,
    },
    futures::StreamExt,
    murmur_config::MurmurConfig,
    murmur_protocol::{
        Channel, ChannelId, EventFrame, GuildId, Message, MessagesSendParams, ResponseFrame,
    },
    ratatui::DefaultTerminal,
    std::{path::PathBuf, sync::Arc},
    tokio::{sync::mpsc, task::JoinHandle},
    tracing::{debug, info, warn},
    tui_textarea::TextArea,
};

/// Events that drive the application state machine.
#[derive(Debug)]
pub enum AppEvent {
    /// Terminal key press.
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// Terminal resize or focus-regained; forces a full redraw.
    Redraw,
    /// Connection lifecycle event.
    Connection(ConnectionEvent),
    ChannelsLoaded {
        guild: GuildId,
        channels: Vec<Channel>,
    },
    MessagesLoaded {
        channel: ChannelId,
        messages: Vec<Message>,
    },
    /// The service refused a delete that was already applied locally.
    DeleteFailed {
        channel: ChannelId,
    },
    /// One-line message for the status bar.
    Notice(String),
}

/// Paths and counts the app needs beyond the config file.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub plugins: usize,
    pub cache_dir: PathBuf,
    /// Command line of the external editor.
    pub editor: String,
}

/// Top-level application.
pub struct App {
    state: AppState,
    keymap: Keymap,
    theme: Theme,
    synchronizer: GatewaySynchronizer,
    remote: Arc<dyn RemoteClient>,
    desktop: Arc<dyn Desktop>,
    dispatcher: ActionDispatcher,
    events: mpsc::UnboundedSender<AppEvent>,
    textarea: TextArea<'static>,
    connection_display: ConnectionDisplay,
    messages_limit: u32,
    mouse: bool,
    context: AppContext,
    editor_requested: bool,
    should_quit: bool,
}

impl App {
    pub fn new(
        config: &MurmurConfig,
        context: AppContext,
        remote: Arc<dyn RemoteClient>,
        desktop: Arc<dyn Desktop>,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let variant = SyncVariant::for_account(config.gateway.is_bot());
        info!(?variant, plugins = context.plugins, "starting murmur");

        let dispatcher = ActionDispatcher::new(
            Arc::clone(&remote),
            Arc::clone(&desktop),
            events.clone(),
            config.attachment_downloads_dir(),
            context.cache_dir.clone(),
        );

        Self {
            state: AppState::new(config.theme.emote_color.clone()),
            keymap: Keymap::from_config(&config.keys),
            theme: Theme::from_config(&config.theme),
            synchronizer: GatewaySynchronizer::new(variant),
            remote,
            desktop,
            dispatcher,
            events,
            textarea: new_composer(),
            connection_display: ConnectionDisplay::Connecting,
            messages_limit: config.messages_limit,
            mouse: config.mouse,
            context,
            editor_requested: false,
            should_quit: false,
        }
    }

    /// Main event loop: reads terminal events, dispatches, and re-renders.
    pub async fn run(
        mut self,
        mut terminal: DefaultTerminal,
        mut event_rx: mpsc::UnboundedReceiver<AppEvent>,
        connection_rx: mpsc::UnboundedReceiver<ConnectionEvent>,
        rpc: Arc<RpcClient>,
    ) -> Result<(), Error> {
        spawn_connection_forwarder(connection_rx, rpc, self.events.clone());
        let mut reader = spawn_terminal_reader(self.events.clone());

        while !self.should_quit {
            if self.state.dirty {
                terminal.draw(|frame| {
                    ui::draw(
                        frame,
                        &self.state,
                        &self.connection_display,
                        self.context.plugins,
                        &mut self.textarea,
                        &self.theme,
                    );
                })?;
                self.state.dirty = false;
            }

            let Some(event) = event_rx.recv().await else {
                break;
            };
            self.handle_event(event);

            if self.editor_requested {
                // The reader would steal keystrokes from the editor.
                reader.abort();
                self.compose_in_editor(&mut terminal).await?;
                reader = spawn_terminal_reader(self.events.clone());
            }
        }

        reader.abort();
        Ok(())
    }

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Mouse(mouse) => self.handle_mouse(mouse),
            AppEvent::Redraw => {
                self.state.dirty = true;
            },
            AppEvent::Connection(event) => self.handle_connection_event(event),
            AppEvent::ChannelsLoaded { guild, channels } => {
                debug!(%guild, count = channels.len(), "channels loaded");
                self.state.tree.set_channels(guild, channels);
                self.state.clamp_cursors();
                self.state.dirty = true;
            },
            AppEvent::MessagesLoaded { channel, messages } => {
                if !self.state.load_messages(channel, messages) {
                    debug!(%channel, "discarding messages for a channel no longer open");
                }
            },
            AppEvent::DeleteFailed { channel } => {
                self.state.notify("Delete failed");
                if self.state.tree.open_channel_id() == Some(channel) {
                    self.fetch_messages(channel);
                }
            },
            AppEvent::Notice(notice) => self.state.notify(notice),
        }
    }

    fn handle_connection_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Connected(identified) => {
                info!(user = %identified.user.tag(), "identified");
                self.connection_display = ConnectionDisplay::Connected;
                self.state.user = Some(identified.user);
                self.state.notice = None;
            },
            ConnectionEvent::Disconnected => {
                self.connection_display = ConnectionDisplay::Disconnected;
            },
            ConnectionEvent::Error(msg) => {
                self.connection_display = ConnectionDisplay::Disconnected;
                self.state.notify(format!("Connection error: {msg}"));
            },
            ConnectionEvent::Frame(text) => self.handle_frame(&text),
        }
        self.state.dirty = true;
    }

    fn handle_frame(&mut self, text: &str) {
        match serde_json::from_str::<EventFrame>(text) {
            Ok(frame) if frame.r#type == "event" => {
                let payload = frame.payload.unwrap_or(serde_json::Value::Null);
                self.synchronizer
                    .handle_event(&mut self.state, &frame.event, payload);
                self.state.clamp_cursors();
            },
            Ok(frame) => debug!(kind = %frame.r#type, "ignoring frame"),
            Err(e) => debug!(error = %e, "ignoring unparseable frame"),
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let transition = match mouse.kind {
            MouseEventKind::ScrollUp => Transition::Previous,
            MouseEventKind::ScrollDown => Transition::Next,
            _ => return,
        };
        if self.state.action_menu.is_none() && self.state.tree.open_channel().is_some() {
            self.state.navigate(transition);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        let name = key_name(&key);

        if self.keymap.matches(Action::Quit, &name) {
            self.should_quit = true;
            return;
        }

        if self.state.action_menu.is_some() {
            self.handle_menu_key(key, &name);
            return;
        }

        let focus = self.keymap.resolve(&name, &[
            Action::FocusGuildsTree,
            Action::FocusChannelsTree,
            Action::FocusMessagesPanel,
            Action::FocusMessageInput,
        ]);
        if let Some(action) = focus {
            self.state.focus = match action {
                Action::FocusGuildsTree => Panel::Guilds,
                Action::FocusChannelsTree => Panel::Channels,
                Action::FocusMessagesPanel => Panel::Messages,
                _ => Panel::Input,
            };
            self.state.dirty = true;
            return;
        }

        match self.state.focus {
            Panel::Guilds => self.handle_guilds_key(key, &name),
            Panel::Channels => self.handle_channels_key(key, &name),
            Panel::Messages => self.handle_messages_key(&name),
            Panel::Input => self.handle_input_key(key, &name),
        }
        self.state.dirty = true;
    }

    fn handle_menu_key(&mut self, key: KeyEvent, name: &str) {
        let Some(menu) = self.state.action_menu.as_mut() else {
            return;
        };
        self.state.dirty = true;

        if self.keymap.matches(Action::Cancel, name) {
            self.state.action_menu = None;
            return;
        }

        let chosen = match key.code {
            KeyCode::Up => {
                menu.move_up();
                None
            },
            KeyCode::Down => {
                menu.move_down();
                None
            },
            KeyCode::Enter => menu.current(),
            KeyCode::Char(c) => menu.by_shortcut(c),
            _ => None,
        };

        if let Some(action) = chosen {
            let message_id = menu.message_id;
            self.state.action_menu = None;
            self.dispatcher.dispatch(action, message_id, &mut self.state);
        }
    }

    /// Cursor movement shared by the guild and channel lists.
    fn list_step(&self, name: &str, cursor: usize, len: usize) -> Option<usize> {
        let last = len.checked_sub(1)?;
        let action = self.keymap.resolve(name, &[
            Action::SelectPreviousMessage,
            Action::SelectNextMessage,
            Action::SelectFirstMessage,
            Action::SelectLastMessage,
        ])?;
        Some(match action {
            Action::SelectPreviousMessage => cursor.saturating_sub(1),
            Action::SelectNextMessage => (cursor + 1).min(last),
            Action::SelectFirstMessage => 0,
            _ => last,
        })
    }

    fn handle_guilds_key(&mut self, key: KeyEvent, name: &str) {
        let len = self.state.tree.visible_nodes().len();
        if let Some(cursor) = self.list_step(name, self.state.guild_cursor, len) {
            self.state.guild_cursor = cursor;
            return;
        }
        if !matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
            return;
        }

        let cursor = self.state.guild_cursor;
        let Some((is_folder, guild)) = self
            .state
            .tree
            .visible_nodes()
            .get(cursor)
            .map(|v| (v.node.is_folder(), v.node.guild_id()))
        else {
            return;
        };

        if is_folder {
            self.state.tree.toggle_expanded(cursor);
            self.state.clamp_cursors();
        } else if let Some(guild) = guild {
            self.select_guild(guild);
        }
    }

    fn select_guild(&mut self, guild: GuildId) {
        self.state.selected_guild = Some(guild);
        self.state.channel_cursor = 0;
        self.state.focus = Panel::Channels;

        if !self.state.tree.channels(guild).is_empty() {
            return;
        }
        let remote = Arc::clone(&self.remote);
        let events = self.events.clone();
        tokio::spawn(async move {
            match remote.fetch_channels(guild).await {
                Ok(channels) => {
                    let _ = events.send(AppEvent::ChannelsLoaded { guild, channels });
                },
                Err(e) => {
                    warn!(%guild, error = %e, "failed to fetch channels");
                    let _ = events.send(AppEvent::Notice(format!("Failed to load channels: {e}")));
                },
            }
        });
    }

    fn handle_channels_key(&mut self, key: KeyEvent, name: &str) {
        let Some(guild) = self.state.selected_guild else {
            return;
        };
        let len = self.state.tree.channels(guild).len();
        if let Some(cursor) = self.list_step(name, self.state.channel_cursor, len) {
            self.state.channel_cursor = cursor;
            return;
        }
        if key.code != KeyCode::Enter {
            return;
        }

        let Some(channel) = self
            .state
            .tree
            .channels(guild)
            .get(self.state.channel_cursor)
            .cloned()
        else {
            return;
        };
        let id = channel.id;
        self.state.open_channel(channel);
        self.state.focus = Panel::Input;
        self.fetch_messages(id);
    }

    fn fetch_messages(&self, channel: ChannelId) {
        let remote = Arc::clone(&self.remote);
        let events = self.events.clone();
        let limit = self.messages_limit;
        tokio::spawn(async move {
            match remote.fetch_messages(channel, limit).await {
                Ok(messages) => {
                    let _ = events.send(AppEvent::MessagesLoaded { channel, messages });
                },
                Err(e) => {
                    warn!(%channel, error = %e, "failed to fetch messages");
                    let _ = events.send(AppEvent::Notice(format!("Failed to load messages: {e}")));
                },
            }
        });
    }

    fn handle_messages_key(&mut self, name: &str) {
        let Some(action) = self.keymap.resolve(name, &[
            Action::SelectPreviousMessage,
            Action::SelectNextMessage,
            Action::SelectFirstMessage,
            Action::SelectLastMessage,
            Action::OpenMessageActions,
            Action::SelectReply,
            Action::Cancel,
        ]) else {
            return;
        };

        match action {
            Action::SelectPreviousMessage => {
                self.state.navigate(Transition::Previous);
            },
            Action::SelectNextMessage => {
                self.state.navigate(Transition::Next);
            },
            Action::SelectFirstMessage => {
                self.state.navigate(Transition::First);
            },
            Action::SelectLastMessage => {
                self.state.navigate(Transition::Last);
            },
            Action::SelectReply => {
                self.state.navigate(Transition::ReplyOf);
            },
            Action::OpenMessageActions => self.open_action_menu(),
            _ => self.state.cancel(),
        }
    }

    fn open_action_menu(&mut self) {
        let Some(message) = self.state.selected_message() else {
            return;
        };
        let id = message.id;
        let me = self.state.user.as_ref().map(|u| u.id);
        let actions = build_actions(message, &self.state.tree, me);
        if !actions.is_empty() {
            self.state.action_menu = Some(ActionMenu::new(id, actions));
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent, name: &str) {
        if self.keymap.matches(Action::Cancel, name) {
            self.state.cancel();
            self.textarea = new_composer();
            return;
        }
        if self.keymap.matches(Action::OpenExternalEditor, name) {
            self.editor_requested = true;
            return;
        }

        match key.code {
            KeyCode::Enter
                if key
                    .modifiers
                    .intersects(KeyModifiers::ALT | KeyModifiers::SHIFT) =>
            {
                self.textarea.insert_newline();
            },
            KeyCode::Enter => self.send_message(),
            KeyCode::Char('v') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                match self.desktop.paste() {
                    Ok(text) => {
                        self.textarea.insert_str(text);
                    },
                    Err(e) => warn!(error = %e, "failed to read clipboard"),
                }
            },
            _ => {
                self.textarea.input(key);
            },
        }
    }

    fn send_message(&mut self) {
        let text = self.textarea.lines().join("\n");
        let content = text.trim();
        if content.is_empty() {
            return;
        }
        let Some(channel) = self.state.tree.open_channel_id() else {
            self.state.notify("Open a channel first");
            return;
        };

        let reply = self.state.pending_reply.take();
        let params = MessagesSendParams {
            channel_id: channel,
            content: content.to_owned(),
            reference: reply.as_ref().map(|r| r.message_id),
            mention_replied: reply.is_some_and(|r| r.mention),
        };
        self.textarea = new_composer();
        self.state.navigation.clear(&mut self.state.view);

        let remote = Arc::clone(&self.remote);
        let events = self.events.clone();
        tokio::spawn(async move {
            if let Err(e) = remote.send_message(params).await {
                warn!(%channel, error = %e, "failed to send message");
                let _ = events.send(AppEvent::Notice(format!("Failed to send: {e}")));
            }
        });
    }

    /// Hand the terminal to the external editor and load what it wrote.
    async fn compose_in_editor(&mut self, terminal: &mut DefaultTerminal) -> Result<(), Error> {
        self.editor_requested = false;
        let initial = self.textarea.lines().join("\n");

        set_mouse_capture(false);
        ratatui::restore();
        let edited = editor::edit(&self.context.editor, &initial).await;
        *terminal = ratatui::init();
        set_mouse_capture(self.mouse);
        terminal.clear()?;

        match edited {
            Ok(Some(text)) => {
                self.textarea = new_composer();
                self.textarea.insert_str(text);
            },
            Ok(None) => {},
            Err(e) => {
                warn!(editor = %self.context.editor, error = %e, "failed to run editor");
                self.state.notify(format!("Editor failed: {e}"));
            },
        }
        self.state.dirty = true;
        Ok(())
    }
}

fn new_composer() -> TextArea<'static> {
    let mut textarea = TextArea::default();
    textarea.set_placeholder_text("Type a message...");
    textarea
}

/// Toggle terminal mouse reporting. Failures only cost scroll-wheel support.
pub(crate) fn set_mouse_capture(enabled: bool) {
    let result = if enabled {
        crossterm::execute!(std::io::stdout(), crossterm::event::EnableMouseCapture)
    } else {
        crossterm::execute!(std::io::stdout(), crossterm::event::DisableMouseCapture)
    };
    if let Err(e) = result {
        debug!(error = %e, "failed to toggle mouse capture");
    }
}

fn spawn_terminal_reader(tx: mpsc::UnboundedSender<AppEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = EventStream::new();
        while let Some(Ok(event)) = reader.next().await {
            let app_event = match event {
                Event::Key(key) => AppEvent::Key(key),
                Event::Mouse(mouse) => AppEvent::Mouse(mouse),
                Event::Resize(..) | Event::FocusGained => AppEvent::Redraw,
                _ => continue,
            };
            if tx.send(app_event).is_err() {
                break;
            }
        }
    })
}

/// Resolve RPC responses off the app loop so pending calls complete while
/// it is busy; everything else goes on to the app.
fn spawn_connection_forwarder(
    mut connection_rx: mpsc::UnboundedReceiver<ConnectionEvent>,
    rpc: Arc<RpcClient>,
    tx: mpsc::UnboundedSender<AppEvent>,
) {
    tokio::spawn(async move {
        while let Some(event) = connection_rx.recv().await {
            match event {
                ConnectionEvent::Frame(text) => {
                    if let Ok(response) = serde_json::from_str::<ResponseFrame>(&text)
                        && response.r#type == "res"
                    {
                        rpc.resolve_response(response).await;
                        continue;
                    }
                    if tx
                        .send(AppEvent::Connection(ConnectionEvent::Frame(text)))
                        .is_err()
                    {
                        break;
                    }
                },
                ConnectionEvent::Disconnected => {
                    rpc.fail_pending().await;
                    if tx
                        .send(AppEvent::Connection(ConnectionEvent::Disconnected))
                        .is_err()
                    {
                        break;
                    }
                },
                other => {
                    if tx.send(AppEvent::Connection(other)).is_err() {
                        break;
                    }
                },
            }
        }
    });
}
