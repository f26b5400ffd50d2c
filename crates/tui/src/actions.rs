//! Per-message action menu and its execution.

use {
    crate::{
        app::AppEvent,
        attachments,
        desktop::Desktop,
        remote::{Capability, PermissionEvaluator, RemoteClient},
        state::{AppState, Panel, PendingReply},
    },
    murmur_protocol::{Message, MessageId, UserId},
    regex::Regex,
    std::{path::PathBuf, sync::{Arc, LazyLock}},
    tokio::sync::mpsc,
    tracing::{debug, warn},
};

static LINK: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"https?://\S+").ok());

/// URLs found in message content, in order of appearance.
pub fn links(content: &str) -> Vec<&str> {
    LINK.as_ref()
        .map(|re| re.find_iter(content).map(|m| m.as_str()).collect())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageAction {
    Reply,
    MentionReply,
    Delete,
    SelectReply,
    OpenLink,
    DownloadAttachment,
    OpenAttachment,
    CopyContent,
    CopyId,
}

impl MessageAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Reply => "Reply",
            Self::MentionReply => "Mention Reply",
            Self::Delete => "Delete",
            Self::SelectReply => "Select Reply",
            Self::OpenLink => "Open Link",
            Self::DownloadAttachment => "Download Attachment",
            Self::OpenAttachment => "Open Attachment",
            Self::CopyContent => "Copy Content",
            Self::CopyId => "Copy ID",
        }
    }

    pub fn shortcut(self) -> char {
        match self {
            Self::Reply => 'r',
            Self::MentionReply => 'R',
            Self::Delete => 'd',
            Self::SelectReply => 'm',
            Self::OpenLink => 'l',
            Self::DownloadAttachment => 'D',
            Self::OpenAttachment => 'o',
            Self::CopyContent => 'c',
            Self::CopyId => 'i',
        }
    }
}

/// Actions available on `message`, in menu order.
pub fn build_actions(
    message: &Message,
    permissions: &dyn PermissionEvaluator,
    me: Option<UserId>,
) -> Vec<MessageAction> {
    let mut actions = Vec::new();
    let channel = message.channel_id;

    if permissions.has_capability(channel, Capability::SendMessages) {
        actions.push(MessageAction::Reply);
        actions.push(MessageAction::MentionReply);
    }
    if permissions.has_capability(channel, Capability::ManageMessages)
        || me == Some(message.author.id)
    {
        actions.push(MessageAction::Delete);
    }
    if message.referenced_message_id.is_some() {
        actions.push(MessageAction::SelectReply);
    }
    if !links(&message.content).is_empty() {
        actions.push(MessageAction::OpenLink);
    }
    if !message.attachments.is_empty() {
        actions.push(MessageAction::DownloadAttachment);
        actions.push(MessageAction::OpenAttachment);
    }
    actions.push(MessageAction::CopyContent);
    actions.push(MessageAction::CopyId);
    actions
}

/// The open action menu, bound to the message it was opened on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionMenu {
    pub message_id: MessageId,
    pub actions: Vec<MessageAction>,
    pub cursor: usize,
}

impl ActionMenu {
    pub fn new(message_id: MessageId, actions: Vec<MessageAction>) -> Self {
        Self {
            message_id,
            actions,
            cursor: 0,
        }
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.actions.len() {
            self.cursor += 1;
        }
    }

    pub fn current(&self) -> Option<MessageAction> {
        self.actions.get(self.cursor).copied()
    }

    pub fn by_shortcut(&self, c: char) -> Option<MessageAction> {
        self.actions.iter().copied().find(|a| a.shortcut() == c)
    }
}

/// Runs menu actions. Local effects apply immediately to the state; remote
/// and disk work runs on spawned tasks that report back as [`AppEvent`]s.
pub struct ActionDispatcher {
    remote: Arc<dyn RemoteClient>,
    desktop: Arc<dyn Desktop>,
    events: mpsc::UnboundedSender<AppEvent>,
    downloads_dir: PathBuf,
    cache_dir: PathBuf,
}

impl ActionDispatcher {
    pub fn new(
        remote: Arc<dyn RemoteClient>,
        desktop: Arc<dyn Desktop>,
        events: mpsc::UnboundedSender<AppEvent>,
        downloads_dir: PathBuf,
        cache_dir: PathBuf,
    ) -> Self {
        Self {
            remote,
            desktop,
            events,
            downloads_dir,
            cache_dir,
        }
    }

    pub fn dispatch(&self, action: MessageAction, message_id: MessageId, state: &mut AppState) {
        let Some(message) = state.tree.message(message_id).cloned() else {
            debug!(%message_id, "action target no longer loaded");
            return;
        };
        debug!(action = action.label(), %message_id, "dispatching message action");

        match action {
            MessageAction::Reply | MessageAction::MentionReply => {
                state.pending_reply = Some(PendingReply {
                    message_id,
                    author: message.author.tag(),
                    mention: action == MessageAction::MentionReply,
                });
                state.focus = Panel::Input;
            },
            MessageAction::Delete => self.delete(&message, state),
            MessageAction::SelectReply => {
                state.select_reply_of(message_id);
            },
            MessageAction::OpenLink => {
                for link in links(&message.content) {
                    if let Err(e) = self.desktop.open(link) {
                        warn!(link, error = %e, "failed to open link");
                    }
                }
            },
            MessageAction::DownloadAttachment => {
                let remote = Arc::clone(&self.remote);
                let events = self.events.clone();
                let dir = self.downloads_dir.clone();
                tokio::spawn(async move {
                    match attachments::save_all(remote.as_ref(), &message.attachments, &dir).await {
                        Ok(saved) => {
                            let _ = events.send(AppEvent::Notice(format!(
                                "Saved {} attachment(s) to {}",
                                saved.len(),
                                dir.display()
                            )));
                        },
                        Err(e) => warn!(error = %e, "failed to download attachments"),
                    }
                });
            },
            MessageAction::OpenAttachment => {
                let remote = Arc::clone(&self.remote);
                let desktop = Arc::clone(&self.desktop);
                let dir = self.cache_dir.clone();
                tokio::spawn(async move {
                    if let Err(e) = attachments::open_all(
                        remote.as_ref(),
                        desktop.as_ref(),
                        &message.attachments,
                        &dir,
                    )
                    .await
                    {
                        warn!(error = %e, "failed to open attachments");
                    }
                });
            },
            MessageAction::CopyContent => self.copy(&message.content),
            MessageAction::CopyId => self.copy(&message.id.to_string()),
        }
        state.dirty = true;
    }

    /// Drop the message locally, then ask the service to delete it. A
    /// refused delete is reported back so the channel can be refetched.
    fn delete(&self, message: &Message, state: &mut AppState) {
        let channel = message.channel_id;
        let id = message.id;
        state.remove_message(id);

        let remote = Arc::clone(&self.remote);
        let events = self.events.clone();
        tokio::spawn(async move {
            if let Err(e) = remote.delete_message(channel, id).await {
                warn!(%channel, message = %id, error = %e, "failed to delete message");
                let _ = events.send(AppEvent::DeleteFailed { channel });
            }
        });
    }

    fn copy(&self, text: &str) {
        if let Err(e) = self.desktop.copy(text) {
            warn!(error = %e, "failed to copy to clipboard");
        }
    }
}
