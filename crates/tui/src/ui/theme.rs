use {
    murmur_config::ThemeConfig,
    ratatui::style::{Color, Modifier, Style},
    std::str::FromStr,
    tracing::warn,
};

/// Color theme for the TUI.
pub struct Theme {
    pub base: Style,
    pub borders: bool,
    pub border: Style,
    pub border_focused: Style,
    pub guild: Style,
    pub guild_selected: Style,
    pub channel: Style,
    pub channel_open: Style,
    pub cursor: Style,
    pub highlight: Style,
    pub reply_title: Style,
    pub placeholder: Style,
    pub notice: Style,
    pub menu_shortcut: Style,
    pub status_connected: Style,
    pub status_connecting: Style,
    pub status_disconnected: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            base: Style::default(),
            borders: true,
            border: Style::default().fg(Color::DarkGray),
            border_focused: Style::default().fg(Color::Cyan),
            guild: Style::default().fg(Color::White),
            guild_selected: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            channel: Style::default().fg(Color::Gray),
            channel_open: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            cursor: Style::default().add_modifier(Modifier::REVERSED),
            highlight: Style::default().bg(Color::Rgb(40, 44, 60)),
            reply_title: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            placeholder: Style::default().fg(Color::DarkGray),
            notice: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::DIM),
            menu_shortcut: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            status_connected: Style::default().bg(Color::Green).fg(Color::Black),
            status_connecting: Style::default().bg(Color::Yellow).fg(Color::Black),
            status_disconnected: Style::default().bg(Color::DarkGray).fg(Color::White),
        }
    }
}

impl Theme {
    pub fn from_config(config: &ThemeConfig) -> Self {
        let mut theme = Self {
            borders: config.borders,
            ..Self::default()
        };
        if let Some(bg) = config.background.as_deref().and_then(parse_color) {
            theme.base = theme.base.bg(bg);
        }
        if let Some(fg) = config.foreground.as_deref().and_then(parse_color) {
            theme.base = theme.base.fg(fg);
        }
        theme
    }
}

/// Parse a color name, `#rrggbb`, or palette index.
pub fn parse_color(value: &str) -> Option<Color> {
    match Color::from_str(value) {
        Ok(color) => Some(color),
        Err(_) => {
            warn!(value, "ignoring unknown color");
            None
        },
    }
}

/// `0xRRGGBB` as used for guild folder colors.
pub fn rgb(value: u32) -> Color {
    let [_, r, g, b] = value.to_be_bytes();
    Color::Rgb(r, g, b)
}
