//! Action tokens carried in inline-keyboard callback payloads
//!
//! Tokens are plain strings joined with `_`: the first segment names the
//! action kind, the rest are arguments. Topic and subtopic names are
//! truncated before embedding (callback payloads are length-limited) and
//! resolved back via prefix search in the catalog.
//!
//! Parsing splits only as many times as the kind takes arguments, so
//! answer text containing `_` survives intact. A lesson name containing
//! `_` still mis-parses in `answer_...` tokens; that ambiguity is inherited
//! from the token shape and kept for compatibility.

/// Segment separator inside a token.
pub const DELIMITER: char = '_';

/// Maximum characters of a topic name embedded in a `mat_` token.
pub const TOPIC_PREFIX_LEN: usize = 20;

/// Maximum characters of each name embedded in a `sub_` token.
pub const SUB_PREFIX_LEN: usize = 15;

/// A decoded menu action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Show the main menu.
    MainMenu,
    /// Show the materials (topics) menu.
    Materials,
    /// Show the training (lessons) menu.
    Training,
    /// Ask the user for free-text feedback.
    Feedback,
    /// Show the "about" text.
    About,
    /// Send the user their referral link.
    Referral,
    /// A topic was selected; the payload is a (possibly truncated) name.
    Topic(String),
    /// A subtopic was selected; both names may be truncated.
    Subtopic { topic: String, subtopic: String },
    /// A lesson was selected, by full name.
    Lesson(String),
    /// A quiz answer was submitted.
    Answer { lesson: String, answer: String },
    /// Unrecognized action kind; answered with "command not recognized".
    Unknown(String),
}

impl Action {
    /// Decode a callback token.
    pub fn parse(token: &str) -> Action {
        let kind = token.split(DELIMITER).next().unwrap_or(token);
        match kind {
            "menu" => Action::MainMenu,
            "materials" => Action::Materials,
            "training" => Action::Training,
            "feedback" => Action::Feedback,
            "about" => Action::About,
            "referral" => Action::Referral,
            "mat" => match token.splitn(2, DELIMITER).nth(1) {
                Some(topic) => Action::Topic(topic.to_string()),
                None => Action::Unknown(token.to_string()),
            },
            "sub" => {
                let mut parts = token.splitn(3, DELIMITER).skip(1);
                match (parts.next(), parts.next()) {
                    (Some(topic), Some(subtopic)) => Action::Subtopic {
                        topic: topic.to_string(),
                        subtopic: subtopic.to_string(),
                    },
                    _ => Action::Unknown(token.to_string()),
                }
            }
            "lesson" => match token.splitn(2, DELIMITER).nth(1) {
                Some(lesson) => Action::Lesson(lesson.to_string()),
                None => Action::Unknown(token.to_string()),
            },
            "answer" => {
                let mut parts = token.splitn(3, DELIMITER).skip(1);
                match (parts.next(), parts.next()) {
                    (Some(lesson), Some(answer)) => Action::Answer {
                        lesson: lesson.to_string(),
                        answer: answer.to_string(),
                    },
                    _ => Action::Unknown(token.to_string()),
                }
            }
            other => Action::Unknown(other.to_string()),
        }
    }

    /// Encode this action as a callback token, truncating embedded topic
    /// and subtopic names.
    pub fn encode(&self) -> String {
        match self {
            Action::MainMenu => "menu".to_string(),
            Action::Materials => "materials".to_string(),
            Action::Training => "training".to_string(),
            Action::Feedback => "feedback".to_string(),
            Action::About => "about".to_string(),
            Action::Referral => "referral".to_string(),
            Action::Topic(topic) => format!("mat_{}", truncate(topic, TOPIC_PREFIX_LEN)),
            Action::Subtopic { topic, subtopic } => format!(
                "sub_{}_{}",
                truncate(topic, SUB_PREFIX_LEN),
                truncate(subtopic, SUB_PREFIX_LEN)
            ),
            Action::Lesson(lesson) => format!("lesson_{}", lesson),
            Action::Answer { lesson, answer } => format!("answer_{}_{}", lesson, answer),
            Action::Unknown(token) => token.clone(),
        }
    }
}

/// Truncate a string to at most `max` characters, on a char boundary.
pub fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
