//! Pending changes to a list entry.
//!
//! Changes are collected with [`ListEntryChangesBuilder`] and checked once,
//! when the builder is finished.

use crate::query::{FieldSet, Filter, MediaListStatus, QueryError};
use chrono::NaiveDate;
use thiserror::Error;

/// Highest score on the 100 point scale
pub const MAX_SCORE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChangesError {
    #[error("no changes given")]
    Empty,

    #[error("score {0} is outside 0..=100")]
    ScoreOutOfRange(u32),

    #[error("completion date {completed} is before start date {started}")]
    CompletedBeforeStarted {
        started: NaiveDate,
        completed: NaiveDate,
    },
}

/// Validated set of list-entry updates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListEntryChanges {
    status: Option<MediaListStatus>,
    score_raw: Option<u32>,
    progress: Option<u32>,
    progress_volumes: Option<u32>,
    repeat: Option<u32>,
    notes: Option<String>,
    started_at: Option<NaiveDate>,
    completed_at: Option<NaiveDate>,
}

impl ListEntryChanges {
    pub fn builder() -> ListEntryChangesBuilder {
        ListEntryChangesBuilder::default()
    }

    pub fn status(&self) -> Option<MediaListStatus> {
        self.status
    }

    /// Score on the 100 point scale, whatever format the user displays
    pub fn score_raw(&self) -> Option<u32> {
        self.score_raw
    }

    pub fn progress(&self) -> Option<u32> {
        self.progress
    }
}

impl Filter for ListEntryChanges {
    fn fields(&self) -> Result<FieldSet, QueryError> {
        let mut fields = FieldSet::new();
        fields
            .push("status", "status", self.status.as_ref())?
            .push("score_raw", "scoreRaw", self.score_raw.as_ref())?
            .push("progress", "progress", self.progress.as_ref())?
            .push("progress_volumes", "progressVolumes", self.progress_volumes.as_ref())?
            .push("repeat", "repeat", self.repeat.as_ref())?
            .push("notes", "notes", self.notes.as_ref())?
            .push("started_at", "startedAt", self.started_at.as_ref())?
            .push("completed_at", "completedAt", self.completed_at.as_ref())?;
        Ok(fields)
    }
}

/// Builder for [`ListEntryChanges`]
#[derive(Debug, Clone, Default)]
pub struct ListEntryChangesBuilder {
    changes: ListEntryChanges,
}

impl ListEntryChangesBuilder {
    pub fn status(mut self, status: MediaListStatus) -> Self {
        self.changes.status = Some(status);
        self
    }

    /// Score on the 100 point scale
    pub fn score_raw(mut self, score: u32) -> Self {
        self.changes.score_raw = Some(score);
        self
    }

    pub fn progress(mut self, progress: u32) -> Self {
        self.changes.progress = Some(progress);
        self
    }

    pub fn progress_volumes(mut self, volumes: u32) -> Self {
        self.changes.progress_volumes = Some(volumes);
        self
    }

    pub fn repeat(mut self, repeat: u32) -> Self {
        self.changes.repeat = Some(repeat);
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.changes.notes = Some(notes.into());
        self
    }

    pub fn started_at(mut self, date: NaiveDate) -> Self {
        self.changes.started_at = Some(date);
        self
    }

    pub fn completed_at(mut self, date: NaiveDate) -> Self {
        self.changes.completed_at = Some(date);
        self
    }

    pub fn build(self) -> Result<ListEntryChanges, ChangesError> {
        let changes = self.changes;

        if changes == ListEntryChanges::default() {
            return Err(ChangesError::Empty);
        }

        if let Some(score) = changes.score_raw {
            if score > MAX_SCORE {
                return Err(ChangesError::ScoreOutOfRange(score));
            }
        }

        if let (Some(started), Some(completed)) = (changes.started_at, changes.completed_at) {
            if completed < started {
                return Err(ChangesError::CompletedBeforeStarted { started, completed });
            }
        }

        Ok(changes)
    }
}

/// Changes plus the media they apply to, as mutation variables
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntryUpdate<'a> {
    pub media_id: i32,
    pub changes: &'a ListEntryChanges,
}

impl Filter for ListEntryUpdate<'_> {
    fn fields(&self) -> Result<FieldSet, QueryError> {
        let mut fields = self.changes.fields()?;
        fields.push("media_id", "mediaId", Some(&self.media_id))?;
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::template::SAVE_LIST_ENTRY;
    use crate::query::{build, BuildOptions};
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_build_valid_changes() {
        let changes = ListEntryChanges::builder()
            .status(MediaListStatus::Completed)
            .score_raw(87)
            .progress(26)
            .build()
            .unwrap();

        assert_eq!(changes.status(), Some(MediaListStatus::Completed));
        assert_eq!(changes.score_raw(), Some(87));
        assert_eq!(changes.progress(), Some(26));
    }

    #[test]
    fn test_empty_changes_rejected() {
        assert_eq!(ListEntryChanges::builder().build(), Err(ChangesError::Empty));
    }

    #[test]
    fn test_score_range() {
        assert_eq!(
            ListEntryChanges::builder().score_raw(101).build(),
            Err(ChangesError::ScoreOutOfRange(101))
        );
        assert!(ListEntryChanges::builder().score_raw(100).build().is_ok());
        assert!(ListEntryChanges::builder().score_raw(0).build().is_ok());
    }

    #[test]
    fn test_score_bound_as_raw_int() {
        let changes = ListEntryChanges::builder().score_raw(75).build().unwrap();
        let update = ListEntryUpdate {
            media_id: 5,
            changes: &changes,
        };

        let built = build(&SAVE_LIST_ENTRY, &update, None, BuildOptions::default()).unwrap();
        assert_eq!(built.declarations, "$scoreRaw : Int, $mediaId : Int");
        assert!(built.query.contains("SaveMediaListEntry(scoreRaw : $scoreRaw, mediaId : $mediaId)"));
        assert_eq!(built.variables["scoreRaw"], json!(75));
    }

    #[test]
    fn test_dates_ordered() {
        let result = ListEntryChanges::builder()
            .started_at(date(2024, 5, 1))
            .completed_at(date(2024, 4, 1))
            .build();
        assert!(matches!(result, Err(ChangesError::CompletedBeforeStarted { .. })));
    }

    #[test]
    fn test_mutation_variables() {
        let changes = ListEntryChanges::builder()
            .status(MediaListStatus::Current)
            .progress(3)
            .started_at(date(2024, 1, 15))
            .build()
            .unwrap();
        let update = ListEntryUpdate {
            media_id: 21,
            changes: &changes,
        };

        let built = build(&SAVE_LIST_ENTRY, &update, None, BuildOptions::default()).unwrap();
        assert_eq!(
            built.declarations,
            "$status : MediaListStatus, $progress : Int, $startedAt : FuzzyDateInput, $mediaId : Int"
        );
        assert!(built.query.starts_with("mutation ($status : MediaListStatus"));
        assert!(built
            .query
            .contains("SaveMediaListEntry(status : $status, progress : $progress, startedAt : $startedAt, mediaId : $mediaId)"));
        assert_eq!(
            serde_json::Value::Object(built.variables),
            json!({
                "status": "CURRENT",
                "progress": 3,
                "startedAt": { "year": 2024, "month": 1, "day": 15 },
                "mediaId": 21
            })
        );
    }
}
