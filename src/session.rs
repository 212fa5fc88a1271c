use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_RATING: f32 = 5.0;

/// One finished, timed session as stored in the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub timestamp: NaiveDateTime,
    pub duration: u64,
    #[serde(default)]
    pub remark: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub props: String,
    #[serde(default)]
    pub mood: String,
    #[serde(default)]
    pub watched_movie: bool,
    #[serde(default)]
    pub climax: bool,
    #[serde(default)]
    pub rating: f32,
}

impl Session {
    /// Bring a record read from disk back inside its invariants.
    pub fn normalized(mut self, catalog: &Catalog) -> Self {
        self.props = catalog.props.resolve(&self.props).to_string();
        self.mood = catalog.moods.resolve(&self.mood).to_string();
        self.rating = clamp_rating(self.rating);
        self
    }
}

pub fn clamp_rating(rating: f32) -> f32 {
    if rating.is_nan() {
        0.0
    } else {
        rating.clamp(0.0, MAX_RATING)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("a category set needs at least one label")]
pub struct EmptyCategorySet;

/// Closed, ordered set of labels. The first entry is the fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CategorySet(Vec<String>);

impl TryFrom<Vec<String>> for CategorySet {
    type Error = EmptyCategorySet;

    fn try_from(labels: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(labels).ok_or(EmptyCategorySet)
    }
}

impl From<CategorySet> for Vec<String> {
    fn from(set: CategorySet) -> Self {
        set.0
    }
}

impl CategorySet {
    /// Returns `None` for an empty list, which would leave no fallback.
    pub fn new<I, S>(labels: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            None
        } else {
            Some(Self(labels))
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.0
    }

    pub fn default_label(&self) -> &str {
        &self.0[0]
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|l| l == label)
    }

    pub fn resolve<'a>(&'a self, label: &str) -> &'a str {
        self.0
            .iter()
            .find(|l| *l == label)
            .map(String::as_str)
            .unwrap_or_else(|| self.default_label())
    }
}

/// The label sets a session's `props` and `mood` must come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub props: CategorySet,
    pub moods: CategorySet,
}

impl Catalog {
    /// Replace empty sets with the built-in ones.
    pub fn or_defaults(props: Vec<String>, moods: Vec<String>) -> Self {
        let fallback = Self::default();
        Self {
            props: CategorySet::new(props).unwrap_or(fallback.props),
            moods: CategorySet::new(moods).unwrap_or(fallback.moods),
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            props: CategorySet(
                ["Hand", "Cup", "Doll"].map(String::from).to_vec(),
            ),
            moods: CategorySet(
                ["Calm", "Happy", "Excited", "Tired", "Last time!"]
                    .map(String::from)
                    .to_vec(),
            ),
        }
    }
}
