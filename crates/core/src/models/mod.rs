//! Shared domain models.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::StoreError;

/// Platform label stored when the user did not pick one.
pub const UNSPECIFIED_PLATFORM: &str = "unspecified";

/// Labels older builds wrote in place of a platform.
const LEGACY_UNSPECIFIED_PLATFORMS: [&str; 2] = ["Não informada", "Não informado"];

/// Highest accepted rating; `0` means "unrated".
pub const MAX_RATING: u8 = 5;

/// Play status of a tracked game.
///
/// Older mobile builds stored localized free-text labels; those are still
/// accepted when reading so existing collections keep their status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Currently being played.
    #[serde(alias = "Jogando")]
    Playing,
    /// Finished.
    #[serde(alias = "Completo", alias = "Finalizado")]
    Completed,
    /// Put on hold.
    #[serde(alias = "Pausado")]
    Paused,
    /// Not started yet.
    #[serde(alias = "Planejado", alias = "backlog", alias = "wishlist")]
    Planned,
    /// Given up on.
    #[serde(alias = "Abandonado", alias = "dropped")]
    Abandoned,
    /// No status chosen.
    #[default]
    #[serde(alias = "Não informado", alias = "")]
    Unspecified,
}

impl GameStatus {
    /// Every status in display order.
    pub const ALL: [GameStatus; 6] = [
        GameStatus::Playing,
        GameStatus::Completed,
        GameStatus::Paused,
        GameStatus::Planned,
        GameStatus::Abandoned,
        GameStatus::Unspecified,
    ];

    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            GameStatus::Playing => "Playing",
            GameStatus::Completed => "Completed",
            GameStatus::Paused => "Paused",
            GameStatus::Planned => "Planned",
            GameStatus::Abandoned => "Abandoned",
            GameStatus::Unspecified => "Unspecified",
        }
    }

    /// The status following this one in [`GameStatus::ALL`], wrapping around.
    pub fn cycle_next(&self) -> GameStatus {
        let idx = Self::ALL
            .iter()
            .position(|status| status == self)
            .unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a cover image reference points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverSource {
    /// `http://` or `https://` URL.
    Remote,
    /// File on the device (`file://`, `content://` or an absolute path).
    Local,
    /// Inline `data:image/...` payload.
    Inline,
    /// Anything else; kept verbatim.
    Unknown,
}

impl CoverSource {
    /// Classify a cover reference by its scheme. Reachability is never checked.
    pub fn classify(uri: &str) -> Self {
        let lower = uri.trim().to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            CoverSource::Remote
        } else if lower.starts_with("file://")
            || lower.starts_with("content://")
            || lower.starts_with('/')
        {
            CoverSource::Local
        } else if lower.starts_with("data:image/") {
            CoverSource::Inline
        } else {
            CoverSource::Unknown
        }
    }
}

/// A single tracked game as persisted in the collection blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    /// Unique, immutable identifier derived from the creation timestamp.
    pub id: String,
    /// Display title, never empty.
    pub title: String,
    /// Free-form platform label.
    #[serde(default = "default_platform", deserialize_with = "deserialize_platform")]
    pub platform: String,
    /// Play status.
    #[serde(default)]
    pub status: GameStatus,
    /// Hours played so far.
    #[serde(default, alias = "hours")]
    pub hours_played: u32,
    /// Rating in `0..=5`, `0` meaning unrated.
    #[serde(default)]
    pub rating: u8,
    /// Remote URL or device-local reference to the cover art.
    #[serde(
        default,
        alias = "imageUri",
        alias = "coverUrl",
        skip_serializing_if = "Option::is_none"
    )]
    pub cover_image_uri: Option<String>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: String,
    /// Creation time; the default sort key.
    pub created_at: DateTime<Utc>,
    /// Time of the last partial update, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_platform() -> String {
    UNSPECIFIED_PLATFORM.to_string()
}

/// Null, blank and legacy "none chosen" labels all read as unspecified.
fn deserialize_platform<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw.as_deref().map(str::trim) {
        None | Some("") => default_platform(),
        Some(label) if LEGACY_UNSPECIFIED_PLATFORMS.contains(&label) => default_platform(),
        Some(label) => label.to_string(),
    })
}

impl GameRecord {
    /// Classification of the cover reference, if one is set.
    pub fn cover_source(&self) -> Option<CoverSource> {
        self.cover_image_uri.as_deref().map(CoverSource::classify)
    }

    /// Whether the user picked a platform.
    pub fn has_platform(&self) -> bool {
        self.platform != UNSPECIFIED_PLATFORM
    }

    /// Whether the record carries a rating.
    pub fn is_rated(&self) -> bool {
        self.rating > 0
    }
}

/// Input to [`CollectionStore::add`](crate::store::CollectionStore::add).
///
/// Everything except the title is optional and falls back to the record defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewGame {
    /// Title; must be non-empty after trimming.
    pub title: String,
    /// Platform label.
    pub platform: Option<String>,
    /// Play status.
    pub status: Option<GameStatus>,
    /// Hours played.
    pub hours_played: Option<u32>,
    /// Rating in `0..=5`.
    pub rating: Option<u8>,
    /// Cover image reference.
    pub cover_image_uri: Option<String>,
    /// Notes.
    pub notes: Option<String>,
}

impl NewGame {
    /// Input with only a title set.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Reject input that would produce an invalid record.
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_title(&self.title)?;
        if let Some(rating) = self.rating {
            validate_rating(rating)?;
        }
        Ok(())
    }

    /// Build the record, applying defaults for every absent field.
    pub fn into_record(self, id: String, created_at: DateTime<Utc>) -> GameRecord {
        GameRecord {
            id,
            title: self.title.trim().to_string(),
            platform: non_blank(self.platform).unwrap_or_else(default_platform),
            status: self.status.unwrap_or_default(),
            hours_played: self.hours_played.unwrap_or(0),
            rating: self.rating.unwrap_or(0),
            cover_image_uri: non_blank(self.cover_image_uri),
            notes: self.notes.unwrap_or_default(),
            created_at,
            updated_at: None,
        }
    }
}

/// Partial update for [`CollectionStore::update`](crate::store::CollectionStore::update).
///
/// `None` leaves a field untouched. `cover_image_uri: Some(None)` clears the cover.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamePatch {
    /// New title.
    pub title: Option<String>,
    /// New platform label; blank resets it to unspecified.
    pub platform: Option<String>,
    /// New status.
    pub status: Option<GameStatus>,
    /// New hours played.
    pub hours_played: Option<u32>,
    /// New rating.
    pub rating: Option<u8>,
    /// New cover, or `Some(None)` to remove it.
    pub cover_image_uri: Option<Option<String>>,
    /// New notes.
    pub notes: Option<String>,
}

impl GamePatch {
    /// True when the patch would not change anything.
    pub fn is_empty(&self) -> bool {
        *self == GamePatch::default()
    }

    /// Reject patches that would make the record invalid.
    pub fn validate(&self) -> Result<(), StoreError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(rating) = self.rating {
            validate_rating(rating)?;
        }
        Ok(())
    }

    /// Merge the patch into `record`, leaving absent fields untouched.
    pub fn apply(self, record: &mut GameRecord, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            record.title = title.trim().to_string();
        }
        if let Some(platform) = self.platform {
            record.platform = non_blank(Some(platform)).unwrap_or_else(default_platform);
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(hours) = self.hours_played {
            record.hours_played = hours;
        }
        if let Some(rating) = self.rating {
            record.rating = rating;
        }
        if let Some(cover) = self.cover_image_uri {
            record.cover_image_uri = non_blank(cover);
        }
        if let Some(notes) = self.notes {
            record.notes = notes;
        }
        record.updated_at = Some(now);
    }
}

fn validate_title(title: &str) -> Result<(), StoreError> {
    if title.trim().is_empty() {
        return Err(StoreError::Validation("title must not be empty".to_string()));
    }
    Ok(())
}

fn validate_rating(rating: u8) -> Result<(), StoreError> {
    if rating > MAX_RATING {
        return Err(StoreError::Validation(format!(
            "rating {rating} is outside 0..={MAX_RATING}"
        )));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
