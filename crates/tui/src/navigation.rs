//! Message selection within the open channel.
//!
//! The buffer is newest first, so index 0 is the most recent message and
//! the one shown at the bottom of the panel. "Previous" walks towards older
//! messages (up the screen), "next" towards newer ones. Both wrap around
//! at the ends of the buffer.
//!
//! Every transition re-reads the buffer it is given. A selection index that
//! no longer fits the buffer behaves as no selection.

use {
    crate::view::RenderSurface,
    murmur_protocol::Message,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Previous,
    Next,
    First,
    Last,
    /// Jump to the message the selected one replies to.
    ReplyOf,
    Clear,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NavigationState {
    selected: Option<usize>,
}

impl NavigationState {
    /// The selected buffer index, if it still points into `buffer`.
    pub fn selected(&self, buffer: &[Message]) -> Option<usize> {
        self.selected.filter(|&i| i < buffer.len())
    }

    pub fn selected_message<'a>(&self, buffer: &'a [Message]) -> Option<&'a Message> {
        self.selected(buffer).map(|i| &buffer[i])
    }

    /// Apply `transition` and return the new selection.
    ///
    /// A transition with no valid target leaves the state and the surface
    /// untouched, except that a stale index is dropped.
    pub fn apply(
        &mut self,
        transition: Transition,
        buffer: &[Message],
        surface: &mut dyn RenderSurface,
    ) -> Option<usize> {
        let current = self.selected(buffer);
        if current.is_none() && self.selected.is_some() {
            self.clear(surface);
        }

        let target = match transition {
            Transition::Clear => {
                self.clear(surface);
                return None;
            },
            _ if buffer.is_empty() => None,
            Transition::Previous => match current {
                Some(i) if i + 1 < buffer.len() => Some(i + 1),
                _ => Some(0),
            },
            Transition::Next => match current {
                None => Some(0),
                Some(0) => Some(buffer.len() - 1),
                Some(i) => Some(i - 1),
            },
            Transition::First => Some(buffer.len() - 1),
            Transition::Last => Some(0),
            Transition::ReplyOf => current.and_then(|i| reply_target(buffer, i)),
        };

        if let Some(index) = target {
            self.land(index, buffer, surface);
        }
        self.selected(buffer)
    }

    /// Select the message that `buffer[origin]` replies to, whatever is
    /// selected now. Leaves the selection alone if the parent is not loaded.
    pub fn select_reply_of(
        &mut self,
        origin: usize,
        buffer: &[Message],
        surface: &mut dyn RenderSurface,
    ) -> Option<usize> {
        if let Some(index) = reply_target(buffer, origin) {
            self.land(index, buffer, surface);
        }
        self.selected(buffer)
    }

    fn land(&mut self, index: usize, buffer: &[Message], surface: &mut dyn RenderSurface) {
        self.selected = Some(index);
        surface.highlight_region(buffer[index].id);
        surface.scroll_to_highlight();
    }

    pub fn clear(&mut self, surface: &mut dyn RenderSurface) {
        self.selected = None;
        surface.clear_highlights();
    }

    /// Keep the same message selected after an insert at `index`.
    pub fn on_insert(&mut self, index: usize) {
        if let Some(selected) = self.selected.as_mut()
            && *selected >= index
        {
            *selected += 1;
        }
    }

    /// Keep the same message selected after the message at `index` was
    /// removed. Removing the selected message itself clears the selection.
    pub fn on_remove(&mut self, index: usize, surface: &mut dyn RenderSurface) {
        match self.selected {
            Some(selected) if selected == index => self.clear(surface),
            Some(selected) if selected > index => self.selected = Some(selected - 1),
            _ => {},
        }
    }
}

fn reply_target(buffer: &[Message], origin: usize) -> Option<usize> {
    let parent = buffer.get(origin)?.referenced_message_id?;
    buffer.iter().position(|m| m.id == parent)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{tree::tests::message, view::MessageView},
        murmur_protocol::MessageId,
    };

    /// Newest-first buffer with ids `n..=1`.
    fn buffer(n: u64) -> Vec<Message> {
        (1..=n).rev().map(|id| message(id, 1, 1)).collect()
    }

    #[test]
    fn previous_from_nothing_selects_newest() {
        let buffer = buffer(3);
        let mut view = MessageView::new("green");
        let mut nav = NavigationState::default();

        assert_eq!(nav.apply(Transition::Previous, &buffer, &mut view), Some(0));
        assert_eq!(view.highlighted(), Some(MessageId(3)));
    }

    #[test]
    fn previous_wraps_from_oldest_to_newest() {
        let buffer = buffer(3);
        let mut view = MessageView::new("green");
        let mut nav = NavigationState::default();

        nav.apply(Transition::Previous, &buffer, &mut view);
        nav.apply(Transition::Previous, &buffer, &mut view);
        assert_eq!(nav.apply(Transition::Previous, &buffer, &mut view), Some(2));
        assert_eq!(view.highlighted(), Some(MessageId(1)));
        assert_eq!(nav.apply(Transition::Previous, &buffer, &mut view), Some(0));
        assert_eq!(view.highlighted(), Some(MessageId(3)));
    }

    #[test]
    fn previous_cycles_with_period_n() {
        let buffer = buffer(5);
        let mut view = MessageView::new("green");
        let mut nav = NavigationState::default();

        assert_eq!(nav.apply(Transition::Previous, &buffer, &mut view), Some(0));
        for _ in 0..buffer.len() - 1 {
            assert_ne!(nav.apply(Transition::Previous, &buffer, &mut view), Some(0));
        }
        assert_eq!(nav.apply(Transition::Previous, &buffer, &mut view), Some(0));
    }

    #[test]
    fn next_wraps_from_newest_to_oldest() {
        let buffer = buffer(3);
        let mut view = MessageView::new("green");
        let mut nav = NavigationState::default();

        nav.apply(Transition::Last, &buffer, &mut view);
        assert_eq!(nav.apply(Transition::Next, &buffer, &mut view), Some(2));
        assert_eq!(view.highlighted(), Some(MessageId(1)));
        assert_eq!(nav.apply(Transition::Next, &buffer, &mut view), Some(1));
    }

    #[test]
    fn next_from_nothing_selects_newest() {
        let buffer = buffer(2);
        let mut view = MessageView::new("green");
        let mut nav = NavigationState::default();

        assert_eq!(nav.apply(Transition::Next, &buffer, &mut view), Some(0));
    }

    #[test]
    fn first_and_last() {
        let buffer = buffer(4);
        let mut view = MessageView::new("green");
        let mut nav = NavigationState::default();

        assert_eq!(nav.apply(Transition::First, &buffer, &mut view), Some(3));
        assert_eq!(view.highlighted(), Some(MessageId(1)));
        assert_eq!(nav.apply(Transition::Last, &buffer, &mut view), Some(0));
        assert_eq!(view.highlighted(), Some(MessageId(4)));
    }

    #[test]
    fn empty_buffer_never_selects() {
        let mut view = MessageView::new("green");
        let mut nav = NavigationState::default();

        for t in [
            Transition::Previous,
            Transition::Next,
            Transition::First,
            Transition::Last,
            Transition::ReplyOf,
        ] {
            assert_eq!(nav.apply(t, &[], &mut view), None);
        }
        assert_eq!(view.highlighted(), None);
    }

    #[test]
    fn reply_of_jumps_to_parent_when_loaded() {
        let mut buffer = buffer(3);
        buffer[0].referenced_message_id = Some(MessageId(1));
        let mut view = MessageView::new("green");
        let mut nav = NavigationState::default();

        nav.apply(Transition::Last, &buffer, &mut view);
        assert_eq!(nav.apply(Transition::ReplyOf, &buffer, &mut view), Some(2));
        assert_eq!(view.highlighted(), Some(MessageId(1)));
    }

    #[test]
    fn reply_of_missing_parent_keeps_selection() {
        let mut buffer = buffer(3);
        buffer[0].referenced_message_id = Some(MessageId(99));
        let mut view = MessageView::new("green");
        let mut nav = NavigationState::default();

        nav.apply(Transition::Last, &buffer, &mut view);
        assert_eq!(nav.apply(Transition::ReplyOf, &buffer, &mut view), Some(0));
        assert_eq!(view.highlighted(), Some(MessageId(3)));
    }

    #[test]
    fn select_reply_of_ignores_current_selection() {
        let mut buffer = buffer(4);
        buffer[0].referenced_message_id = Some(MessageId(2));
        let mut view = MessageView::new("green");
        let mut nav = NavigationState::default();

        nav.apply(Transition::Previous, &buffer, &mut view);
        nav.apply(Transition::Previous, &buffer, &mut view);
        assert_eq!(nav.select_reply_of(0, &buffer, &mut view), Some(2));
        assert_eq!(view.highlighted(), Some(MessageId(2)));

        // No reference: selection stays where it was.
        assert_eq!(nav.select_reply_of(3, &buffer, &mut view), Some(2));
        assert_eq!(nav.select_reply_of(9, &buffer, &mut view), Some(2));
    }

    #[test]
    fn reply_of_without_selection_does_nothing() {
        let buffer = buffer(2);
        let mut view = MessageView::new("green");
        let mut nav = NavigationState::default();
        assert_eq!(nav.apply(Transition::ReplyOf, &buffer, &mut view), None);
    }

    #[test]
    fn clear_removes_highlight() {
        let buffer = buffer(2);
        let mut view = MessageView::new("green");
        let mut nav = NavigationState::default();

        nav.apply(Transition::Last, &buffer, &mut view);
        assert_eq!(nav.apply(Transition::Clear, &buffer, &mut view), None);
        assert_eq!(view.highlighted(), None);
    }

    #[test]
    fn stale_index_is_treated_as_unselected() {
        let long = buffer(5);
        let short = buffer(2);
        let mut view = MessageView::new("green");
        let mut nav = NavigationState::default();

        nav.apply(Transition::First, &long, &mut view);
        assert_eq!(nav.selected(&short), None);
        assert_eq!(nav.apply(Transition::Previous, &short, &mut view), Some(0));
    }

    #[test]
    fn insert_and_remove_keep_the_same_message() {
        let mut view = MessageView::new("green");
        let mut nav = NavigationState::default();
        let buffer = buffer(4);
        nav.apply(Transition::Previous, &buffer, &mut view);
        nav.apply(Transition::Previous, &buffer, &mut view);
        assert_eq!(nav.selected(&buffer), Some(1));

        nav.on_insert(0);
        assert_eq!(nav.selected, Some(2));
        nav.on_insert(3);
        assert_eq!(nav.selected, Some(2));

        nav.on_remove(0, &mut view);
        assert_eq!(nav.selected, Some(1));
        nav.on_remove(1, &mut view);
        assert_eq!(nav.selected, None);
        assert_eq!(view.highlighted(), None);
    }
}
