use gamevault_core::{
    catalog::CatalogCandidate,
    models::{GamePatch, GameRecord, GameStatus, NewGame, MAX_RATING},
};

const MAX_FIELD_LEN: usize = 120;
const MAX_HOURS_DIGITS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Platform,
    Status,
    Hours,
    Rating,
    Cover,
    Notes,
}

impl FormField {
    pub const ALL: [FormField; 7] = [
        FormField::Title,
        FormField::Platform,
        FormField::Status,
        FormField::Hours,
        FormField::Rating,
        FormField::Cover,
        FormField::Notes,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Title => "Title",
            FormField::Platform => "Platform",
            FormField::Status => "Status",
            FormField::Hours => "Hours",
            FormField::Rating => "Rating",
            FormField::Cover => "Cover",
            FormField::Notes => "Notes",
        }
    }
}

/// Add/edit form state. `editing` holds the id of the record being changed.
#[derive(Debug, Clone, Default)]
pub struct GameForm {
    pub editing: Option<String>,
    pub title: String,
    pub platform: String,
    pub status: GameStatus,
    pub hours: String,
    pub rating: u8,
    pub cover: String,
    pub notes: String,
    pub focus: usize,
    pub error: Option<String>,
}

impl GameForm {
    pub fn from_record(record: &GameRecord) -> Self {
        Self {
            editing: Some(record.id.clone()),
            title: record.title.clone(),
            platform: if record.has_platform() {
                record.platform.clone()
            } else {
                String::new()
            },
            status: record.status,
            hours: record.hours_played.to_string(),
            rating: record.rating,
            cover: record.cover_image_uri.clone().unwrap_or_default(),
            notes: record.notes.clone(),
            ..Self::default()
        }
    }

    pub fn from_candidate(candidate: &CatalogCandidate) -> Self {
        let input = candidate.to_new_game();
        Self {
            title: input.title,
            cover: input.cover_image_uri.unwrap_or_default(),
            ..Self::default()
        }
    }

    pub fn is_edit(&self) -> bool {
        self.editing.is_some()
    }

    pub fn focused(&self) -> FormField {
        FormField::ALL[self.focus.min(FormField::ALL.len() - 1)]
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % FormField::ALL.len();
    }

    pub fn prev_field(&mut self) {
        self.focus = (self.focus + FormField::ALL.len() - 1) % FormField::ALL.len();
    }

    pub fn insert(&mut self, ch: char) {
        self.error = None;
        match self.focused() {
            FormField::Status => {
                if ch == ' ' {
                    self.cycle(1);
                }
            }
            FormField::Rating => {
                if let Some(value) = ch.to_digit(10) {
                    if value <= u32::from(MAX_RATING) {
                        self.rating = value as u8;
                    }
                }
            }
            FormField::Hours => {
                if ch.is_ascii_digit() && self.hours.len() < MAX_HOURS_DIGITS {
                    self.hours.push(ch);
                }
            }
            _ => {
                if let Some(text) = self.text_mut() {
                    if !ch.is_control() && text.chars().count() < MAX_FIELD_LEN {
                        text.push(ch);
                    }
                }
            }
        }
    }

    pub fn backspace(&mut self) {
        self.error = None;
        if self.focused() == FormField::Rating {
            self.rating = 0;
        } else if let Some(text) = self.text_mut() {
            text.pop();
        }
    }

    /// Step the status or rating field.
    pub fn cycle(&mut self, delta: isize) {
        match self.focused() {
            FormField::Status => {
                let len = GameStatus::ALL.len() as isize;
                let idx = GameStatus::ALL
                    .iter()
                    .position(|status| *status == self.status)
                    .unwrap_or(0) as isize;
                self.status = GameStatus::ALL[(idx + delta).rem_euclid(len) as usize];
            }
            FormField::Rating => {
                let next = (self.rating as isize + delta).clamp(0, MAX_RATING as isize);
                self.rating = next as u8;
            }
            _ => {}
        }
    }

    pub fn display_value(&self, field: FormField) -> String {
        match field {
            FormField::Title => self.title.clone(),
            FormField::Platform => self.platform.clone(),
            FormField::Status => format!("◀ {} ▶", self.status.label()),
            FormField::Hours => self.hours.clone(),
            FormField::Rating => rating_stars(self.rating),
            FormField::Cover => self.cover.clone(),
            FormField::Notes => self.notes.clone(),
        }
    }

    pub fn to_new_game(&self) -> Result<NewGame, String> {
        Ok(NewGame {
            title: self.title.clone(),
            platform: non_blank(&self.platform),
            status: Some(self.status),
            hours_played: self.hours_value()?,
            rating: Some(self.rating),
            cover_image_uri: non_blank(&self.cover),
            notes: Some(self.notes.trim().to_string()),
        })
    }

    pub fn to_patch(&self) -> Result<GamePatch, String> {
        Ok(GamePatch {
            title: Some(self.title.clone()),
            platform: Some(self.platform.clone()),
            status: Some(self.status),
            hours_played: Some(self.hours_value()?.unwrap_or(0)),
            rating: Some(self.rating),
            cover_image_uri: Some(non_blank(&self.cover)),
            notes: Some(self.notes.trim().to_string()),
        })
    }

    fn hours_value(&self) -> Result<Option<u32>, String> {
        let hours = self.hours.trim();
        if hours.is_empty() {
            return Ok(None);
        }
        hours
            .parse::<u32>()
            .map(Some)
            .map_err(|_| format!("Hours must be a whole number, got {hours:?}"))
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.focused() {
            FormField::Title => Some(&mut self.title),
            FormField::Platform => Some(&mut self.platform),
            FormField::Hours => Some(&mut self.hours),
            FormField::Cover => Some(&mut self.cover),
            FormField::Notes => Some(&mut self.notes),
            FormField::Status | FormField::Rating => None,
        }
    }
}

pub fn rating_stars(rating: u8) -> String {
    if rating == 0 {
        return "unrated".to_string();
    }
    let filled = rating.min(MAX_RATING) as usize;
    format!(
        "{}{}",
        "★".repeat(filled),
        "☆".repeat(MAX_RATING as usize - filled)
    )
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn focus(form: &mut GameForm, field: FormField) {
        form.focus = FormField::ALL
            .iter()
            .position(|candidate| *candidate == field)
            .unwrap();
    }

    #[test]
    fn hours_accept_digits_only() {
        let mut form = GameForm::default();
        focus(&mut form, FormField::Hours);
        for ch in "4x2".chars() {
            form.insert(ch);
        }
        assert_eq!(form.hours, "42");
        assert_eq!(form.to_new_game().unwrap().hours_played, Some(42));
    }

    #[test]
    fn rating_and_status_cycle_within_bounds() {
        let mut form = GameForm::default();
        focus(&mut form, FormField::Rating);
        form.cycle(-1);
        assert_eq!(form.rating, 0);
        form.insert('7');
        assert_eq!(form.rating, 0);
        form.insert('4');
        form.cycle(3);
        assert_eq!(form.rating, MAX_RATING);

        focus(&mut form, FormField::Status);
        form.cycle(-1);
        assert_eq!(form.status, GameStatus::Abandoned);
        form.insert(' ');
        assert_eq!(form.status, GameStatus::Unspecified);
    }

    #[test]
    fn candidate_prefills_title_and_cover() {
        let candidate = CatalogCandidate {
            identifier: 620,
            display_name: "Portal 2".into(),
            cover_image_uri: "https://cdn/620.jpg".into(),
        };
        let input = GameForm::from_candidate(&candidate).to_new_game().unwrap();
        assert_eq!(input.title, "Portal 2");
        assert_eq!(input.cover_image_uri.as_deref(), Some("https://cdn/620.jpg"));
        assert_eq!(input.platform, None);
    }

    #[test]
    fn editing_unchanged_record_is_a_no_op() {
        let mut record = NewGame {
            title: "Hades".into(),
            platform: Some("PC".into()),
            hours_played: Some(30),
            rating: Some(4),
            notes: Some("one more run".into()),
            ..NewGame::default()
        }
        .into_record("9".into(), Utc::now());
        let original = record.clone();

        let form = GameForm::from_record(&record);
        assert!(form.is_edit());
        form.to_patch().unwrap().apply(&mut record, Utc::now());
        assert_eq!(record.title, original.title);
        assert_eq!(record.platform, original.platform);
        assert_eq!(record.hours_played, original.hours_played);
        assert_eq!(record.rating, original.rating);
        assert_eq!(record.cover_image_uri, None);
        assert_eq!(record.notes, original.notes);
    }

    #[test]
    fn stars_render_rating() {
        assert_eq!(rating_stars(0), "unrated");
        assert_eq!(rating_stars(3), "★★★☆☆");
    }
}
