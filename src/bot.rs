//! The bot event loop
//!
//! Loads the stores, connects to Telegram, and long-polls for updates.
//! Each update is classified into an [`Event`] and handed to the router;
//! one event is processed fully (including store flushes) before the
//! next. This is the catch-all error boundary: a failed handler logs the
//! error, sends a generic apology, and the event is considered consumed
//! either way — there is no redelivery.

use anyhow::{bail, Context, Result};
use tracing::{error, info, warn};

use crate::catalog::ContentCatalog;
use crate::config::Config;
use crate::feedback::FeedbackSink;
use crate::router::{BotContext, Event, Router};
use crate::store::UserStore;
use crate::telegram::{ChatTransport, TelegramClient, TelegramUpdate};

/// Run the bot until interrupted.
pub async fn run(config: Config) -> Result<()> {
    if !config.telegram.is_configured() {
        bail!("Telegram bot token is not configured. Set MENTOR_BOT_TOKEN or run `mentor-bot config --set-token <token>`.");
    }

    let catalog = ContentCatalog::load(&config.storage.catalog_path)?;
    if let Err(e) = catalog.validate() {
        warn!("Catalog has inconsistencies: {:#}", e);
    }
    let mut users = UserStore::load(&config.storage.users_path)?;
    let feedback = FeedbackSink::new(&config.storage.feedback_path);

    let client = TelegramClient::new(config.telegram.clone())?;
    let me = client
        .get_me()
        .await
        .context("Could not reach the Telegram API")?;
    info!(
        bot = me.username.as_deref().unwrap_or(&me.first_name),
        "Connected to Telegram, polling for updates"
    );

    let mut router = Router::new();
    let mut offset: Option<i64> = None;

    loop {
        let updates = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                return Ok(());
            }
            result = client.get_updates(offset, config.polling.timeout_secs, config.polling.limit) => {
                match result {
                    Ok(updates) => updates,
                    Err(e) => {
                        warn!("Polling failed, backing off: {:#}", e);
                        tokio::time::sleep(std::time::Duration::from_secs(3)).await;
                        continue;
                    }
                }
            }
        };

        for update in updates {
            offset = Some(update.update_id + 1);
            let Some(event) = classify(update) else {
                continue;
            };

            let user_id = event.user_id().to_string();
            let callback_id = event.callback_id().map(String::from);

            let mut ctx = BotContext {
                catalog: &catalog,
                users: &mut users,
                feedback: &feedback,
                telegram: client.config(),
            };

            if let Err(e) = router.handle(&client, &mut ctx, event).await {
                error!(%user_id, "Event handling failed: {:#}", e);
                let _ = client
                    .send_message(&user_id, "Something went wrong. Please try again.", None)
                    .await;
                if let Some(id) = callback_id {
                    let _ = client.answer_callback(&id, None).await;
                }
            }
        }
    }
}

/// Turn a raw Telegram update into a routable event. Updates with no
/// text or no callback payload are dropped.
fn classify(update: TelegramUpdate) -> Option<Event> {
    if let Some(callback) = update.callback_query {
        let token = callback.data?;
        let message = callback.message?;
        return Some(Event::Callback {
            callback_id: callback.id,
            user_id: message.chat.id.to_string(),
            message_id: message.message_id,
            token,
        });
    }

    let message = update.message?;
    let text = message.text?;
    let user_id = message.chat.id.to_string();
    let username = message
        .chat
        .username
        .clone()
        .or_else(|| message.from.as_ref().and_then(|f| f.username.clone()));

    if let Some(rest) = text.strip_prefix("/start") {
        if rest.is_empty() || rest.starts_with(' ') {
            let referral = rest.split_whitespace().next().map(String::from);
            return Some(Event::Start {
                user_id,
                username,
                referral,
            });
        }
    }

    Some(Event::Text {
        user_id,
        username,
        text,
    })
}
