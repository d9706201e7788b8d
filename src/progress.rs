//! Progress rules: registration, referral credit, answer checking
//!
//! The only way a level ever changes is referral credit at registration
//! time, capped at [`crate::store::MAX_REFERRAL_LEVEL`]. Nothing lowers a
//! level.

use tracing::debug;

use crate::catalog::ContentCatalog;
use crate::error::Result;
use crate::store::UserStore;

/// Outcome of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    /// True when a new record was created (first contact).
    pub is_new: bool,
    /// True when a referrer was found and credited.
    pub referral_credited: bool,
}

/// Register a user on first contact. Existing users are a no-op: their
/// record is never recreated and a referral token supplied on a repeat
/// `/start` is ignored.
pub fn register(
    users: &mut UserStore,
    user_id: &str,
    display_name: &str,
    referral: Option<&str>,
) -> Result<Registration> {
    let is_new = users.get_or_create(user_id, display_name)?;
    let mut referral_credited = false;
    if is_new {
        if let Some(token) = referral {
            referral_credited = users.apply_referral(token, user_id)?;
        }
    }
    Ok(Registration {
        is_new,
        referral_credited,
    })
}

/// Check a submitted quiz answer by exact string equality. A correct
/// answer records the completion (idempotently); a wrong one changes
/// nothing. Returns whether the answer was correct.
pub fn check_answer(
    catalog: &ContentCatalog,
    users: &mut UserStore,
    user_id: &str,
    lesson_name: &str,
    answer: &str,
) -> Result<bool> {
    let lesson = catalog.lesson(lesson_name)?;
    if answer != lesson.correct_answer {
        debug!(user_id, lesson_name, "Incorrect answer");
        return Ok(false);
    }
    users.record_completion(user_id, lesson_name)?;
    Ok(true)
}
