use crate::channels::router::{self, Route, RoutingPolicy};
use crate::channels::types::InboundMessage;
use crate::commands::RESET_ACK;
use crate::config::Config;
use crate::extractor::Extractor;
use crate::writer::LedgerWriter;
use once_cell::sync::OnceCell;
use serenity::all::{
    ChannelId, Client, Context, EventHandler, GatewayIntents, Http, Message, Ready,
};
use std::sync::Arc;

struct LedgerHandler {
    policy: RoutingPolicy,
    update_channel: ChannelId,
    push_updates: bool,
    extractor: Extractor,
    writer: LedgerWriter,
    /// Filled in by `ready`
    bot_user_id: OnceCell<u64>,
}

impl LedgerHandler {
    async fn publish(&self, http: &Arc<Http>, text: &str) {
        if let Err(e) = self.update_channel.say(http, text).await {
            log::error!("Discord: Failed to publish to {}: {}", self.update_channel, e);
        }
    }

    async fn handle_extract(&self, http: &Arc<Http>, msg: &InboundMessage) {
        let Some(extraction) = self.extractor.extract(&msg.content) else {
            log::debug!("Discord: Nothing to record in message from {}", msg.author_id);
            return;
        };

        match self.writer.accrue(extraction).await {
            Ok(update) if self.push_updates => self.publish(http, &update).await,
            Ok(_) => {}
            Err(e) => log::error!("Discord: Ledger update failed: {}", e),
        }
    }
}

#[serenity::async_trait]
impl EventHandler for LedgerHandler {
    async fn message(&self, ctx: Context, msg: Message) {
        let inbound = InboundMessage {
            content: msg.content.clone(),
            author_id: msg.author.id.get(),
            author_is_bot: msg.author.bot,
            channel_id: msg.channel_id.get(),
            webhook_id: msg.webhook_id.map(|id| id.get()),
        };

        match router::route(&inbound, &self.policy, self.bot_user_id.get().copied()) {
            Route::Ignore(reason) => {
                log::debug!("Discord: Ignoring message {} ({})", msg.id, reason);
            }
            Route::Reset => {
                log::info!("Discord: Reset requested by {} in {}", msg.author.name, msg.channel_id);
                match self.writer.reset().await {
                    Ok(()) => self.publish(&ctx.http, RESET_ACK).await,
                    Err(e) => log::error!("Discord: Reset failed: {}", e),
                }
            }
            Route::Summary => {
                log::info!("Discord: Summary requested by {}", msg.author.name);
                match self.writer.summary().await {
                    Ok(summary) => self.publish(&ctx.http, &summary).await,
                    Err(e) => log::error!("Discord: Summary failed: {}", e),
                }
            }
            Route::Extract => self.handle_extract(&ctx.http, &inbound).await,
        }
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        let _ = self.bot_user_id.set(ready.user.id.get());
        log::info!("Discord: Bot connected as {}", ready.user.name);
    }
}

/// Run the ledger bot until the gateway stops or Ctrl-C is received.
pub async fn start_ledger_listener(
    config: &Config,
    extractor: Extractor,
    writer: LedgerWriter,
) -> Result<(), String> {
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let handler = LedgerHandler {
        policy: config.routing,
        update_channel: ChannelId::new(config.update_channel_id),
        push_updates: config.push_updates,
        extractor,
        writer,
        bot_user_id: OnceCell::new(),
    };

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| format!("Failed to create Discord client: {}", e))?;

    log::info!(
        "Discord: Watching channel {}, publishing to {}",
        config.routing.log_channel_id,
        config.update_channel_id
    );

    let shard_manager = client.shard_manager.clone();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            log::info!("Discord: Received shutdown signal");
            shard_manager.shutdown_all().await;
        }
        result = client.start() => {
            if let Err(e) = result {
                let error = format!("Discord client error: {}", e);
                log::error!("{}", error);
                return Err(error);
            }
            log::info!("Discord: Listener stopped");
        }
    }

    Ok(())
}
