use chrono::{NaiveDateTime, Timelike};

use crate::session::{clamp_rating, Catalog, Session};

/// A single edit to a draft
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Remark(String),
    Location(String),
    Props(String),
    Mood(String),
    WatchedMovie(bool),
    Climax(bool),
    Rating(f32),
}

/// Details for the session currently being timed. Edits return a new value,
/// so the previous draft stays intact for whoever is holding it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionDraft {
    pub remark: String,
    pub location: String,
    pub props: String,
    pub mood: String,
    pub watched_movie: bool,
    pub climax: bool,
    pub rating: f32,
}

impl SessionDraft {
    #[must_use]
    pub fn with(&self, update: FieldUpdate) -> Self {
        let mut next = self.clone();
        match update {
            FieldUpdate::Remark(v) => next.remark = v,
            FieldUpdate::Location(v) => next.location = v,
            FieldUpdate::Props(v) => next.props = v,
            FieldUpdate::Mood(v) => next.mood = v,
            FieldUpdate::WatchedMovie(v) => next.watched_movie = v,
            FieldUpdate::Climax(v) => next.climax = v,
            FieldUpdate::Rating(v) => next.rating = clamp_rating(v),
        }
        next
    }

    /// Turn the draft into a finished session. Consumes the draft; start the
    /// next run from `SessionDraft::default()`.
    pub fn materialize(self, catalog: &Catalog, timestamp: NaiveDateTime, duration_secs: u64) -> Session {
        Session {
            timestamp: timestamp.with_nanosecond(0).unwrap_or(timestamp),
            duration: duration_secs,
            remark: self.remark,
            location: self.location,
            props: catalog.props.resolve(&self.props).to_string(),
            mood: catalog.moods.resolve(&self.mood).to_string(),
            watched_movie: self.watched_movie,
            climax: self.climax,
            rating: clamp_rating(self.rating),
        }
    }
}
