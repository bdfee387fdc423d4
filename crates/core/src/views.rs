//! Filtered and ordered views over a collection.

use crate::models::{GameRecord, GameStatus};

/// Sort newest first by `created_at`. Stable, so equal timestamps keep their order.
pub fn sort_newest_first(records: &mut [GameRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Records with the given status, in input order.
pub fn filter_by_status(records: &[GameRecord], status: GameStatus) -> Vec<GameRecord> {
    records
        .iter()
        .filter(|record| record.status == status)
        .cloned()
        .collect()
}

/// Records currently being played.
pub fn currently_playing(records: &[GameRecord]) -> Vec<GameRecord> {
    filter_by_status(records, GameStatus::Playing)
}

/// The `limit` most recently added records.
pub fn recently_added(records: &[GameRecord], limit: usize) -> Vec<GameRecord> {
    let mut sorted = records.to_vec();
    sort_newest_first(&mut sorted);
    sorted.truncate(limit);
    sorted
}

/// Case-insensitive substring search over title, platform and notes.
pub fn search_titles(records: &[GameRecord], query: &str) -> Vec<GameRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|record| {
            record.title.to_lowercase().contains(&needle)
                || record.platform.to_lowercase().contains(&needle)
                || record.notes.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}
