//! Aggregate statistics over a collection.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{GameRecord, GameStatus};

/// Totals derived from a set of records.
///
/// Every field is order-independent: permuting the input never changes the result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    /// Number of records.
    pub total_games: usize,
    /// Sum of `hours_played`.
    pub total_hours: u64,
    /// Records with status [`GameStatus::Completed`].
    pub completed_count: usize,
    /// Record count per status; statuses with no records are absent.
    pub by_status: BTreeMap<GameStatus, usize>,
    /// Record count per platform label.
    pub by_platform: BTreeMap<String, usize>,
    /// Records with a non-zero rating.
    pub rated_count: usize,
    /// Mean rating over rated records only.
    pub average_rating: Option<f64>,
    /// Most frequent chosen platform, alphabetically first on ties.
    pub favorite_platform: Option<String>,
}

/// Aggregate `records`. Pure; touches no storage.
pub fn stats(records: &[GameRecord]) -> CollectionStats {
    let mut summary = CollectionStats {
        total_games: records.len(),
        ..CollectionStats::default()
    };
    let mut rating_sum: u64 = 0;

    for record in records {
        summary.total_hours += u64::from(record.hours_played);
        *summary.by_status.entry(record.status).or_insert(0) += 1;
        *summary
            .by_platform
            .entry(record.platform.clone())
            .or_insert(0) += 1;
        if record.is_rated() {
            summary.rated_count += 1;
            rating_sum += u64::from(record.rating);
        }
    }

    summary.completed_count = summary
        .by_status
        .get(&GameStatus::Completed)
        .copied()
        .unwrap_or(0);
    if summary.rated_count > 0 {
        summary.average_rating = Some(rating_sum as f64 / summary.rated_count as f64);
    }
    summary.favorite_platform = records
        .iter()
        .filter(|record| record.has_platform())
        .fold(BTreeMap::<&str, usize>::new(), |mut counts, record| {
            *counts.entry(record.platform.as_str()).or_insert(0) += 1;
            counts
        })
        .into_iter()
        // BTreeMap iterates alphabetically; keep the first of equal counts.
        .fold(None::<(&str, usize)>, |best, (platform, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((platform, count)),
        })
        .map(|(platform, _)| platform.to_string());

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewGame;
    use crate::seed::seed_records;
    use chrono::Utc;

    fn game(title: &str, hours: u32, status: GameStatus, platform: Option<&str>) -> GameRecord {
        NewGame {
            title: title.into(),
            hours_played: Some(hours),
            status: Some(status),
            platform: platform.map(str::to_string),
            ..NewGame::default()
        }
        .into_record(title.to_lowercase(), Utc::now())
    }

    #[test]
    fn empty_collection() {
        let summary = stats(&[]);
        assert_eq!(summary.total_games, 0);
        assert_eq!(summary.total_hours, 0);
        assert_eq!(summary.completed_count, 0);
        assert!(summary.by_status.is_empty());
        assert_eq!(summary.average_rating, None);
        assert_eq!(summary.favorite_platform, None);

        let encoded = serde_json::to_value(&summary).unwrap();
        assert_eq!(encoded["byStatus"], serde_json::json!({}));
    }

    #[test]
    fn sums_hours_and_counts_statuses() {
        let records = vec![
            game("Celeste", 10, GameStatus::Completed, Some("PC")),
            game("Outer Wilds", 0, GameStatus::Planned, None),
            game("Zelda", 85, GameStatus::Playing, Some("Switch")),
        ];
        let summary = stats(&records);
        assert_eq!(summary.total_games, 3);
        assert_eq!(summary.total_hours, 95);
        assert_eq!(summary.completed_count, 1);
        assert_eq!(summary.by_status.get(&GameStatus::Planned), Some(&1));
        assert_eq!(summary.by_status.get(&GameStatus::Paused), None);
        assert_eq!(summary.by_platform.get("unspecified"), Some(&1));
        assert_eq!(summary.favorite_platform.as_deref(), Some("PC"));
    }

    #[test]
    fn order_independent() {
        let records = seed_records();
        let expected = stats(&records);

        let mut reversed = records.clone();
        reversed.reverse();
        assert_eq!(stats(&reversed), expected);

        let mut rotated = records;
        rotated.rotate_left(2);
        assert_eq!(stats(&rotated), expected);
    }

    #[test]
    fn seed_statistics() {
        let summary = stats(&seed_records());
        assert_eq!(summary.total_hours, 320);
        assert_eq!(summary.completed_count, 2);
        assert_eq!(summary.rated_count, 5);
        assert_eq!(summary.average_rating, Some(4.8));
        // PC and Switch both have two entries.
        assert_eq!(summary.favorite_platform.as_deref(), Some("PC"));
    }
}
