/// Platform-neutral view of an inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub content: String,
    pub author_id: u64,
    pub author_is_bot: bool,
    pub channel_id: u64,
    /// Set when a webhook (such as the game's log feed) posted the message
    pub webhook_id: Option<u64>,
}
