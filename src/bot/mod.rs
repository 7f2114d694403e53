//! Bot layer - Discord-specific interface
//!
//! This module connects the autoresponder core to Discord: it classifies
//! gateway messages, delivers replies through [`gateway::DiscordGateway`] and
//! owns the Poise framework setup.

/// Discord command implementations
pub mod commands;
/// Outbound message delivery
pub mod gateway;
/// Discord event handlers
pub mod handlers;

use crate::{
    core::{
        context::AppContext, responder::Responder, scheduler::ActivationScheduler,
        store::ConfigStore,
    },
    errors::{Error, Result},
};
use gateway::DiscordGateway;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Shared data available to all bot commands and event handlers.
pub struct BotData {
    /// Routes every inbound message
    pub responder: Responder,
    /// Discord user id whose messages count as the operator's own
    pub operator_id: u64,
}

impl BotData {
    /// Creates a new `BotData` instance.
    #[must_use]
    pub const fn new(responder: Responder, operator_id: u64) -> Self {
        Self {
            responder,
            operator_id,
        }
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {}", ctx.command().name, error);
            if let Err(e) = ctx.say(format!("An error occurred: {error}")).await {
                error!("Failed to send error message: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Connects to Discord and runs until the client stops.
#[instrument(skip(token, store, scheduler))]
pub async fn run_bot(
    token: String,
    operator_id: u64,
    store: ConfigStore,
    scheduler: Arc<ActivationScheduler>,
) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![commands::ping()],
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::event_handler(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                let gateway = Arc::new(DiscordGateway::new(Arc::clone(&ctx.http)));
                let context = AppContext::new(store, scheduler, gateway);
                Ok(BotData::new(Responder::new(context), operator_id))
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {}", e))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {}", e))?;
    Ok(())
}
