//! Decides what to do with an inbound message before anything touches the ledger.

use crate::channels::types::InboundMessage;
use crate::commands::{self, Command};

/// Which bot-authored messages are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotFilter {
    /// Only this bot's own messages
    OwnMessages,
    /// Every bot message that didn't come through a webhook
    AllBots,
}

impl std::str::FromStr for BotFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "self" | "own" => Ok(BotFilter::OwnMessages),
            "all" | "all_bots" => Ok(BotFilter::AllBots),
            other => Err(format!("Unknown bot filter: {}", other)),
        }
    }
}

/// Where `!reset` and `!summary` are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandScope {
    AnyChannel,
    LogChannel,
}

impl std::str::FromStr for CommandScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "any" => Ok(CommandScope::AnyChannel),
            "log" => Ok(CommandScope::LogChannel),
            other => Err(format!("Unknown command scope: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingPolicy {
    pub log_channel_id: u64,
    pub bot_filter: BotFilter,
    pub command_scope: CommandScope,
    pub summary_command: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Ignore(&'static str),
    Reset,
    Summary,
    Extract,
}

/// Route a message. `bot_user_id` is unknown until the gateway reports ready.
pub fn route(msg: &InboundMessage, policy: &RoutingPolicy, bot_user_id: Option<u64>) -> Route {
    if bot_user_id == Some(msg.author_id) {
        return Route::Ignore("own message");
    }
    if policy.bot_filter == BotFilter::AllBots && msg.author_is_bot && msg.webhook_id.is_none() {
        return Route::Ignore("bot author");
    }

    let in_log_channel = msg.channel_id == policy.log_channel_id;

    if let Some(command) = commands::parse(&msg.content) {
        if policy.command_scope == CommandScope::LogChannel && !in_log_channel {
            return Route::Ignore("command outside log channel");
        }
        return match command {
            Command::Reset => Route::Reset,
            Command::Summary if policy.summary_command => Route::Summary,
            Command::Summary => Route::Ignore("summary command disabled"),
        };
    }

    if !in_log_channel {
        return Route::Ignore("not the log channel");
    }
    if msg.content.trim().is_empty() {
        return Route::Ignore("empty content");
    }

    Route::Extract
}
