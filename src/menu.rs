//! Menu construction
//!
//! Pure functions from (catalog, user progress) to an inline keyboard.
//! Every button carries an encoded action token that the router parses
//! back into an `Action`. Nothing here touches storage or the transport.

use serde_json::{json, Value};

use crate::catalog::{ContentCatalog, Lesson};
use crate::store::UserRecord;
use crate::token::{truncate, Action, TOPIC_PREFIX_LEN};

/// One selectable option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub text: String,
    pub callback_data: String,
}

/// An inline keyboard, one button per row (matching the bot's single-column
/// menu layout).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
    rows: Vec<Vec<Button>>,
}

impl InlineKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a full-width button for an action.
    pub fn button(mut self, text: impl Into<String>, action: &Action) -> Self {
        self.rows.push(vec![Button {
            text: text.into(),
            callback_data: action.encode(),
        }]);
        self
    }

    /// All buttons in display order.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }

    /// Serialize to the Telegram `reply_markup` JSON shape.
    pub fn to_value(&self) -> Value {
        let rows: Vec<Value> = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|b| json!({ "text": b.text, "callback_data": b.callback_data }))
                    .collect()
            })
            .collect();
        json!({ "inline_keyboard": rows })
    }
}

/// The five fixed main-menu actions.
pub fn main_menu() -> InlineKeyboard {
    InlineKeyboard::new()
        .button("📚 Training", &Action::Training)
        .button("📂 Materials", &Action::Materials)
        .button("📝 Feedback", &Action::Feedback)
        .button("ℹ️ About", &Action::About)
        .button("👥 Referral program", &Action::Referral)
}

/// Topics visible to the user's level, plus a back action.
pub fn materials_menu(catalog: &ContentCatalog, level: u32) -> InlineKeyboard {
    let mut keyboard = InlineKeyboard::new();
    for topic in catalog.topics_for_level(level) {
        keyboard = keyboard.button(
            truncate(topic, TOPIC_PREFIX_LEN),
            &Action::Topic(topic.to_string()),
        );
    }
    keyboard.button("« Back", &Action::MainMenu)
}

/// All subtopics of one topic, plus a back action to the materials menu.
pub fn subtopics_menu(catalog: &ContentCatalog, topic: &str) -> InlineKeyboard {
    let mut keyboard = InlineKeyboard::new();
    for subtopic in catalog.subtopics(topic) {
        keyboard = keyboard.button(
            truncate(subtopic, TOPIC_PREFIX_LEN),
            &Action::Subtopic {
                topic: topic.to_string(),
                subtopic: subtopic.to_string(),
            },
        );
    }
    keyboard.button("« Back", &Action::Materials)
}

/// Lessons unlocked at the user's level, annotated with a completion
/// marker, plus a back action.
pub fn training_menu(catalog: &ContentCatalog, user: &UserRecord) -> InlineKeyboard {
    let mut keyboard = InlineKeyboard::new();
    for lesson in catalog.lessons_for_level(user.level) {
        let marker = if user.has_completed(lesson) { "✅" } else { "❌" };
        keyboard = keyboard.button(
            format!("{} {}", marker, lesson),
            &Action::Lesson(lesson.to_string()),
        );
    }
    keyboard.button("« Back", &Action::MainMenu)
}

/// One button per candidate answer for a lesson.
pub fn quiz_menu(lesson_name: &str, lesson: &Lesson) -> InlineKeyboard {
    let mut keyboard = InlineKeyboard::new();
    for answer in &lesson.answers {
        keyboard = keyboard.button(
            answer.clone(),
            &Action::Answer {
                lesson: lesson_name.to_string(),
                answer: answer.clone(),
            },
        );
    }
    keyboard
}

/// Shown after a quiz answer, right or wrong.
pub fn retry_menu() -> InlineKeyboard {
    InlineKeyboard::new()
        .button("Try another lesson", &Action::Training)
        .button("« Menu", &Action::MainMenu)
}

/// Shown after feedback has been recorded.
pub fn thank_you_menu() -> InlineKeyboard {
    InlineKeyboard::new()
        .button("Send another comment", &Action::Feedback)
        .button("« Back to menu", &Action::MainMenu)
}
