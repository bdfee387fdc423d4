//! Example collection written on first launch.

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;

use crate::models::{GameRecord, GameStatus};

struct SeedGame {
    id: &'static str,
    title: &'static str,
    platform: &'static str,
    status: GameStatus,
    hours: u32,
    rating: u8,
    cover: &'static str,
    notes: &'static str,
    added: (i32, u32, u32),
}

const SEED: [SeedGame; 6] = [
    SeedGame {
        id: "1",
        title: "The Legend of Zelda: Breath of the Wild",
        platform: "Switch",
        status: GameStatus::Playing,
        hours: 85,
        rating: 5,
        cover: "https://images.igdb.com/igdb/image/upload/t_cover_big/co49w5.jpg",
        notes: "Open world done right.",
        added: (2026, 1, 15),
    },
    SeedGame {
        id: "2",
        title: "Elden Ring",
        platform: "PC",
        status: GameStatus::Completed,
        hours: 120,
        rating: 5,
        cover: "https://images.igdb.com/igdb/image/upload/t_cover_big/co5x8d.jpg",
        notes: "Hard and rewarding.",
        added: (2026, 1, 20),
    },
    SeedGame {
        id: "3",
        title: "God of War: Ragnarok",
        platform: "PS5",
        status: GameStatus::Paused,
        hours: 30,
        rating: 4,
        cover: "https://images.igdb.com/igdb/image/upload/t_cover_big/co5r1o.jpg",
        notes: "Great story, stopped halfway.",
        added: (2026, 1, 25),
    },
    SeedGame {
        id: "4",
        title: "Hollow Knight",
        platform: "PC",
        status: GameStatus::Playing,
        hours: 45,
        rating: 5,
        cover: "https://images.igdb.com/igdb/image/upload/t_cover_big/co1r7y.jpg",
        notes: "A near perfect metroidvania.",
        added: (2026, 2, 1),
    },
    SeedGame {
        id: "5",
        title: "Super Mario Odyssey",
        platform: "Switch",
        status: GameStatus::Completed,
        hours: 40,
        rating: 5,
        cover: "https://images.igdb.com/igdb/image/upload/t_cover_big/co2g4y.jpg",
        notes: "Fun from start to finish.",
        added: (2026, 2, 5),
    },
    SeedGame {
        id: "6",
        title: "Red Dead Redemption 2",
        platform: "Multi",
        status: GameStatus::Planned,
        hours: 0,
        rating: 0,
        cover: "https://images.igdb.com/igdb/image/upload/t_cover_big/co2cms.jpg",
        notes: "Need to start this one.",
        added: (2026, 2, 10),
    },
];

static SEED_RECORDS: Lazy<Vec<GameRecord>> = Lazy::new(|| {
    let mut records: Vec<GameRecord> = SEED
        .iter()
        .map(|game| GameRecord {
            id: game.id.to_string(),
            title: game.title.to_string(),
            platform: game.platform.to_string(),
            status: game.status,
            hours_played: game.hours,
            rating: game.rating,
            cover_image_uri: Some(game.cover.to_string()),
            notes: game.notes.to_string(),
            created_at: seed_date(game.added),
            updated_at: None,
        })
        .collect();
    crate::views::sort_newest_first(&mut records);
    records
});

/// The fixed first-run collection, newest first.
pub fn seed_records() -> Vec<GameRecord> {
    SEED_RECORDS.clone()
}

fn seed_date((year, month, day): (i32, u32, u32)) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn seed_is_sorted_and_unique() {
        let records = seed_records();
        assert_eq!(records.len(), 6);
        assert_eq!(records[0].title, "Red Dead Redemption 2");
        assert!(records
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
        let ids: HashSet<_> = records.iter().map(|record| record.id.as_str()).collect();
        assert_eq!(ids.len(), records.len());
    }
}
