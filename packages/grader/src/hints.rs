use std::collections::BTreeSet;

use common::Hint;
use serde::Serialize;

/// Hints whose attempt threshold has been reached, in disclosure order.
pub fn available_hints(hints: &[Hint], attempts: u32) -> Vec<Hint> {
    let mut available: Vec<Hint> = hints
        .iter()
        .filter(|h| h.is_unlocked(attempts))
        .cloned()
        .collect();
    available.sort_by_key(|h| h.order);
    available
}

/// Mark a hint as revealed. Returns `false` if it was already revealed.
///
/// Revealed ids are never removed.
pub fn reveal(used_hints: &mut BTreeSet<String>, hint_id: &str) -> bool {
    used_hints.insert(hint_id.to_string())
}

/// Disclosure state of one hint for a given submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HintStatus {
    pub id: String,
    pub order: i32,
    pub unlocked: bool,
    pub revealed: bool,
    /// Runs still needed before the hint unlocks.
    pub attempts_remaining: u32,
    /// Present only once revealed.
    pub content: Option<String>,
}

/// Status of every hint, in disclosure order.
pub fn hint_status(hints: &[Hint], attempts: u32, used_hints: &BTreeSet<String>) -> Vec<HintStatus> {
    let mut statuses: Vec<HintStatus> = hints
        .iter()
        .map(|h| {
            let revealed = used_hints.contains(&h.id);
            HintStatus {
                id: h.id.clone(),
                order: h.order,
                unlocked: h.is_unlocked(attempts),
                revealed,
                attempts_remaining: h.reveal_after_attempts.saturating_sub(attempts),
                content: revealed.then(|| h.content.clone()),
            }
        })
        .collect();
    statuses.sort_by_key(|s| s.order);
    statuses
}
