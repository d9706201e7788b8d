//! Event routing
//!
//! Classifies each inbound event (a `/start` command, a plain-text
//! message, or an inline-keyboard callback) and dispatches it to the
//! matching handler. Stores are passed in explicitly through
//! [`BotContext`]; the router itself only owns the per-user feedback
//! continuation flags.
//!
//! The feedback continuation is single-shot: requesting feedback arms it,
//! and exactly the next plain-text message from that user is consumed as
//! the submission. Any error escaping `handle` is dealt with at the event
//! boundary in `bot.rs`.

use std::collections::HashSet;

use anyhow::Result;
use tracing::{debug, warn};

use crate::catalog::ContentCatalog;
use crate::feedback::FeedbackSink;
use crate::menu;
use crate::progress;
use crate::store::UserStore;
use crate::telegram::{ChatTransport, TelegramConfig};
use crate::token::Action;

/// An inbound event, already stripped of transport framing.
#[derive(Debug, Clone)]
pub enum Event {
    /// `/start [referralToken]`
    Start {
        user_id: String,
        username: Option<String>,
        referral: Option<String>,
    },
    /// A plain-text message that is not a command.
    Text {
        user_id: String,
        username: Option<String>,
        text: String,
    },
    /// An inline-keyboard selection.
    Callback {
        callback_id: String,
        user_id: String,
        message_id: i64,
        token: String,
    },
}

impl Event {
    /// The user this event belongs to.
    pub fn user_id(&self) -> &str {
        match self {
            Event::Start { user_id, .. }
            | Event::Text { user_id, .. }
            | Event::Callback { user_id, .. } => user_id,
        }
    }

    /// The callback query id, for events that need acknowledging.
    pub fn callback_id(&self) -> Option<&str> {
        match self {
            Event::Callback { callback_id, .. } => Some(callback_id),
            _ => None,
        }
    }
}

/// Shared stores and settings, constructed at startup and passed by
/// reference into every handler.
pub struct BotContext<'a> {
    pub catalog: &'a ContentCatalog,
    pub users: &'a mut UserStore,
    pub feedback: &'a FeedbackSink,
    pub telegram: &'a TelegramConfig,
}

/// The event dispatcher.
#[derive(Debug, Default)]
pub struct Router {
    /// Users whose next plain-text message is a feedback submission.
    pending_feedback: HashSet<String>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one event fully, including all store flushes.
    pub async fn handle(
        &mut self,
        transport: &dyn ChatTransport,
        ctx: &mut BotContext<'_>,
        event: Event,
    ) -> Result<()> {
        match event {
            Event::Start {
                user_id,
                username,
                referral,
            } => {
                self.handle_start(transport, ctx, &user_id, username.as_deref(), referral.as_deref())
                    .await
            }
            Event::Text {
                user_id,
                username,
                text,
            } => {
                self.handle_text(transport, ctx, &user_id, username.as_deref(), &text)
                    .await
            }
            Event::Callback {
                callback_id,
                user_id,
                message_id,
                token,
            } => {
                self.handle_callback(transport, ctx, &callback_id, &user_id, message_id, &token)
                    .await
            }
        }
    }

    async fn handle_start(
        &mut self,
        transport: &dyn ChatTransport,
        ctx: &mut BotContext<'_>,
        user_id: &str,
        username: Option<&str>,
        referral: Option<&str>,
    ) -> Result<()> {
        let display_name = username
            .map(String::from)
            .unwrap_or_else(|| format!("User_{}", user_id));

        let registration = progress::register(ctx.users, user_id, &display_name, referral)?;
        if registration.is_new {
            debug!(user_id, referral_credited = registration.referral_credited, "First contact");
        }

        if let Some(photo_path) = &ctx.telegram.welcome_photo {
            match std::fs::read(photo_path) {
                Ok(photo) => transport.send_photo(user_id, photo, "Welcome!").await?,
                Err(e) => debug!("Welcome photo unavailable, skipping: {}", e),
            }
        }

        transport
            .send_message(user_id, "Choose an action:", Some(&menu::main_menu()))
            .await
    }

    async fn handle_text(
        &mut self,
        transport: &dyn ChatTransport,
        ctx: &mut BotContext<'_>,
        user_id: &str,
        username: Option<&str>,
        text: &str,
    ) -> Result<()> {
        if !self.pending_feedback.remove(user_id) {
            // Not armed: plain text outside the feedback flow is ignored.
            debug!(user_id, "Ignoring unsolicited text message");
            return Ok(());
        }

        let sender = match username {
            Some(name) => format!("@{}", name),
            None => format!("user:{}", user_id),
        };
        ctx.feedback.submit(&sender, text)?;

        transport
            .send_message(
                user_id,
                "Thanks for your feedback!",
                Some(&menu::thank_you_menu()),
            )
            .await
    }

    async fn handle_callback(
        &mut self,
        transport: &dyn ChatTransport,
        ctx: &mut BotContext<'_>,
        callback_id: &str,
        user_id: &str,
        message_id: i64,
        token: &str,
    ) -> Result<()> {
        let action = Action::parse(token);
        debug!(user_id, token, ?action, "Callback received");

        match action {
            Action::MainMenu => {
                transport
                    .edit_message(user_id, message_id, "Choose an action:", Some(&menu::main_menu()))
                    .await?;
            }
            Action::Materials => {
                let keyboard = menu::materials_menu(ctx.catalog, ctx.users.level_of(user_id));
                transport
                    .edit_message(user_id, message_id, "Available materials:", Some(&keyboard))
                    .await?;
            }
            Action::Topic(prefix) => {
                let topic = ctx.catalog.resolve_topic(&prefix).to_string();
                let keyboard = menu::subtopics_menu(ctx.catalog, &topic);
                let text = format!("Choose a subtopic in: {}", topic);
                transport
                    .edit_message(user_id, message_id, &text, Some(&keyboard))
                    .await?;
            }
            Action::Subtopic { topic, subtopic } => {
                let topic = ctx.catalog.resolve_topic(&topic).to_string();
                let subtopic = ctx.catalog.resolve_subtopic(&topic, &subtopic).to_string();
                match ctx.catalog.body(&topic, &subtopic) {
                    Ok(body) => {
                        let back = menu::InlineKeyboard::new()
                            .button("« Back", &Action::Topic(topic.clone()));
                        transport.send_message(user_id, body, Some(&back)).await?;
                    }
                    // Stale or mangled token: degrade by sending nothing.
                    Err(e) => warn!(user_id, %topic, %subtopic, "Subtopic lookup failed: {}", e),
                }
            }
            Action::Training => {
                let user = ctx.users.get(user_id).cloned().unwrap_or_default();
                let keyboard = menu::training_menu(ctx.catalog, &user);
                transport
                    .send_message(user_id, "Choose a lesson:", Some(&keyboard))
                    .await?;
            }
            Action::Lesson(name) => match ctx.catalog.lesson(&name) {
                Ok(lesson) => {
                    let keyboard = menu::quiz_menu(&name, lesson);
                    transport
                        .send_message(user_id, &lesson.text, Some(&keyboard))
                        .await?;
                }
                Err(e) => warn!(user_id, lesson = %name, "Lesson lookup failed: {}", e),
            },
            Action::Answer { lesson, answer } => {
                let correct =
                    progress::check_answer(ctx.catalog, ctx.users, user_id, &lesson, &answer)?;
                let text = if correct {
                    "✅ Correct!"
                } else {
                    "❌ Not quite. Try again."
                };
                transport
                    .send_message(user_id, text, Some(&menu::retry_menu()))
                    .await?;
            }
            Action::Feedback => {
                transport
                    .send_message(user_id, "Send your feedback as a message:", None)
                    .await?;
                self.pending_feedback.insert(user_id.to_string());
            }
            Action::About => {
                let about = ctx.catalog.about();
                let text = if about.is_empty() {
                    "No information available."
                } else {
                    about
                };
                transport.send_message(user_id, text, None).await?;
            }
            Action::Referral => {
                let referral_name = ctx
                    .users
                    .get(user_id)
                    .map(|u| u.referral_name.clone())
                    .unwrap_or_else(|| format!("User_{}", user_id));
                let link = format!(
                    "https://t.me/{}?start={}",
                    ctx.telegram.bot_username, referral_name
                );
                let text = format!("Your referral link: {}", link);
                transport.send_message(user_id, &text, None).await?;
            }
            Action::Unknown(kind) => {
                debug!(user_id, %kind, "Unrecognized callback action");
                transport
                    .answer_callback(callback_id, Some("Command not recognized"))
                    .await?;
                return Ok(());
            }
        }

        transport.answer_callback(callback_id, None).await
    }
}
