//! Retained contents of the messages panel.
//!
//! Each loaded message becomes one tagged region of display-token text
//! (see [`crate::markup`]). The panel draws regions oldest first, so the
//! newest message sits at the bottom.

use {
    crate::markup,
    murmur_protocol::{Message, MessageId},
    std::cell::Cell,
};

/// What the message list needs from whatever displays it.
pub trait RenderSurface {
    /// Mark the region tagged `id` as the highlighted one, replacing any
    /// previous highlight.
    fn highlight_region(&mut self, id: MessageId);

    fn clear_highlights(&mut self);

    fn highlighted(&self) -> Option<MessageId>;

    /// Keep the highlighted region in view from now on.
    fn scroll_to_highlight(&mut self);

    /// Follow the newest message from now on.
    fn scroll_to_end(&mut self);

    /// Add a region below every existing one.
    fn append_region(&mut self, id: MessageId, text: String);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub id: MessageId,
    pub text: String,
}

impl Region {
    /// Rows the region takes, including the blank spacer below it.
    pub fn height(&self) -> usize {
        self.text.lines().count().max(1) + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAnchor {
    Latest,
    Highlight,
}

#[derive(Debug)]
pub struct MessageView {
    regions: Vec<Region>,
    highlighted: Option<MessageId>,
    anchor: ScrollAnchor,
    emote_color: String,
    /// First visible row of the previous frame.
    top: Cell<usize>,
}

impl MessageView {
    pub fn new(emote_color: impl Into<String>) -> Self {
        Self {
            regions: Vec::new(),
            highlighted: None,
            anchor: ScrollAnchor::Latest,
            emote_color: emote_color.into(),
            top: Cell::new(0),
        }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    #[cfg(test)]
    pub(crate) fn anchor(&self) -> ScrollAnchor {
        self.anchor
    }

    pub fn emote_color(&self) -> &str {
        &self.emote_color
    }

    /// Remove every region and highlight.
    pub fn clear(&mut self) {
        self.regions.clear();
        self.highlighted = None;
        self.anchor = ScrollAnchor::Latest;
        self.top.set(0);
    }

    /// Re-render every region from a newest-first buffer. The highlight
    /// survives if its message is still loaded.
    pub fn rebuild(&mut self, buffer: &[Message]) {
        self.regions = buffer
            .iter()
            .rev()
            .map(|m| Region {
                id: m.id,
                text: format_message(m, buffer, &self.emote_color),
            })
            .collect();
        if let Some(id) = self.highlighted
            && !self.regions.iter().any(|r| r.id == id)
        {
            self.highlighted = None;
        }
    }

    /// First row to draw for a viewport `height` rows tall.
    ///
    /// Following the newest message pins the bottom. Following the highlight
    /// moves the viewport by the least amount that shows the highlighted
    /// region, starting from where the previous frame was.
    pub fn scroll_top(&self, height: usize) -> usize {
        let total: usize = self.regions.iter().map(Region::height).sum();
        let max_top = total.saturating_sub(height);

        let top = match (self.anchor, self.highlighted_span()) {
            (ScrollAnchor::Highlight, Some((start, end))) => {
                let mut top = self.top.get().min(max_top);
                if start < top || end - start > height {
                    top = start;
                } else if end > top + height {
                    top = end - height;
                }
                top.min(max_top)
            },
            _ => max_top,
        };
        self.top.set(top);
        top
    }

    /// Rows `[start, end)` of the highlighted region, spacer excluded.
    fn highlighted_span(&self) -> Option<(usize, usize)> {
        let id = self.highlighted?;
        let mut row = 0;
        for region in &self.regions {
            let height = region.height();
            if region.id == id {
                return Some((row, row + height - 1));
            }
            row += height;
        }
        None
    }
}

impl RenderSurface for MessageView {
    fn highlight_region(&mut self, id: MessageId) {
        self.highlighted = Some(id);
    }

    fn clear_highlights(&mut self) {
        self.highlighted = None;
    }

    fn highlighted(&self) -> Option<MessageId> {
        self.highlighted
    }

    fn scroll_to_highlight(&mut self) {
        self.anchor = ScrollAnchor::Highlight;
    }

    fn scroll_to_end(&mut self) {
        self.anchor = ScrollAnchor::Latest;
    }

    fn append_region(&mut self, id: MessageId, text: String) {
        self.regions.push(Region { id, text });
    }
}

/// Double every `[` so user text cannot open a display token.
pub fn escape(text: &str) -> String {
    text.replace('[', "[[")
}

/// Display-token text of one message region: an optional reply line, the
/// author, the translated content, and one line per attachment.
pub fn format_message(message: &Message, buffer: &[Message], emote_color: &str) -> String {
    let mut out = String::new();

    if let Some(reference) = message.referenced_message_id {
        let quoted = buffer
            .iter()
            .find(|m| m.id == reference)
            .map(|m| {
                let first_line = m.content.lines().next().unwrap_or_default();
                format!("{} {}", escape(&m.author.tag()), escape(first_line))
            })
            .unwrap_or_else(|| "original message not loaded".into());
        out.push_str(&format!("[::d]╭ {quoted}[::D]\n"));
    }

    out.push_str(&format!("[::b]{}[::B]", escape(&message.author.tag())));

    let content = markup::translate(&escape(&message.content), emote_color);
    let mut lines = content.lines();
    if let Some(first) = lines.next() {
        out.push(' ');
        out.push_str(first);
    }
    for line in lines {
        out.push('\n');
        out.push_str(line);
    }

    for attachment in &message.attachments {
        out.push_str(&format!(
            "\n[::u]{}[::U] {}",
            escape(&attachment.filename),
            escape(&attachment.url)
        ));
    }

    out
}
