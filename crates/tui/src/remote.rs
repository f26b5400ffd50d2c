//! Seams between the UI and the chat service.

use {
    crate::{Error, rpc::RpcClient},
    async_trait::async_trait,
    bytes::Bytes,
    murmur_protocol::{
        Channel, ChannelId, ChannelsListParams, GuildId, Message, MessageId, MessagesDeleteParams,
        MessagesListParams, MessagesSendParams, methods, permissions,
    },
    std::sync::Arc,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    SendMessages,
    ManageMessages,
}

impl Capability {
    pub fn bit(self) -> u64 {
        match self {
            Self::SendMessages => permissions::SEND_MESSAGES,
            Self::ManageMessages => permissions::MANAGE_MESSAGES,
        }
    }
}

/// Answers whether the session user may do something in a channel.
pub trait PermissionEvaluator {
    fn has_capability(&self, channel: ChannelId, capability: Capability) -> bool;
}

/// Requests the UI makes against the chat service.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn fetch_channels(&self, guild: GuildId) -> Result<Vec<Channel>, Error>;

    async fn fetch_messages(&self, channel: ChannelId, limit: u32) -> Result<Vec<Message>, Error>;

    async fn send_message(&self, params: MessagesSendParams) -> Result<(), Error>;

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<(), Error>;

    /// Download the bytes behind an attachment URL.
    async fn fetch_bytes(&self, url: &str) -> Result<Bytes, Error>;
}

/// [`RemoteClient`] over the gateway RPC connection, with plain HTTPS for
/// attachment downloads.
pub struct GatewayClient {
    rpc: Arc<RpcClient>,
    http: reqwest::Client,
}

impl GatewayClient {
    pub fn new(rpc: Arc<RpcClient>, user_agent: &str) -> Result<Self, Error> {
        let http = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self { rpc, http })
    }
}

#[async_trait]
impl RemoteClient for GatewayClient {
    async fn fetch_channels(&self, guild: GuildId) -> Result<Vec<Channel>, Error> {
        self.rpc
            .request(methods::CHANNELS_LIST, &ChannelsListParams { guild_id: guild })
            .await
    }

    async fn fetch_messages(&self, channel: ChannelId, limit: u32) -> Result<Vec<Message>, Error> {
        self.rpc
            .request(methods::MESSAGES_LIST, &MessagesListParams {
                channel_id: channel,
                limit,
            })
            .await
    }

    async fn send_message(&self, params: MessagesSendParams) -> Result<(), Error> {
        self.rpc.call(methods::MESSAGES_SEND, &params).await?;
        Ok(())
    }

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<(), Error> {
        self.rpc
            .call(methods::MESSAGES_DELETE, &MessagesDeleteParams {
                channel_id: channel,
                message_id: message,
            })
            .await?;
        Ok(())
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Bytes, Error> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?)
    }
}
