use chrono::Utc;
use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Appended to any text cut by [`truncate_chars`].
pub const TRUNCATION_MARKER: &str = "...";

/// Cut `text` to at most `budget` characters, appending [`TRUNCATION_MARKER`] when cut.
///
/// Counts Unicode scalar values so multi-byte characters are never split.
pub fn truncate_chars(text: &str, budget: usize) -> Cow<'_, str> {
    match text.char_indices().nth(budget) {
        Some((byte_idx, _)) => Cow::Owned(format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER)),
        None => Cow::Borrowed(text),
    }
}

/// Identifier for one workflow execution: `<prefix>-<millis>-<pid>-<seq>`.
pub fn new_run_id(prefix: &str) -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    let ts = Utc::now().timestamp_millis();
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let pid = std::process::id();
    format!("{}-{}-{}-{}", prefix, ts, pid, seq)
}

pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
