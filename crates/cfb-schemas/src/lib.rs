//! cfb-schemas
//!
//! Shared record and event shapes for the tracker. No IO, no normalization:
//! other crates build and consume these types.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which record class a pass operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Recruits,
    Portal,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Recruits, Category::Portal];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Recruits => "recruits",
            Category::Portal => "portal",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recruits" | "recruit" => Some(Category::Recruits),
            "portal" | "transfers" => Some(Category::Portal),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transfer direction relative to the tracked team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Incoming => "incoming",
            Direction::Outgoing => "outgoing",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "incoming" => Some(Direction::Incoming),
            "outgoing" => Some(Direction::Outgoing),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Canonical record
// ---------------------------------------------------------------------------

/// Category-specific fields of a [`CanonicalRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordDetails {
    Recruit {
        hometown: Option<String>,
        stars: Option<u8>,
        rating: Option<f64>,
    },
    Portal {
        direction: Direction,
        source_school: Option<String>,
    },
}

impl RecordDetails {
    pub fn category(&self) -> Category {
        match self {
            RecordDetails::Recruit { .. } => Category::Recruits,
            RecordDetails::Portal { .. } => Category::Portal,
        }
    }
}

/// One player in one category, independent of provider format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// 16 lowercase hex chars derived from the player's name. Stored as `entry_id`.
    pub id: String,
    pub name: String,
    /// Lowercase position abbreviation (`qb`, `edge`, ...).
    pub position: String,
    pub status: Option<String>,
    pub player_url: Option<String>,
    /// Sorted, comma-joined provider tags (`"247,on3"`).
    pub source: String,
    /// Set by the reconciler when the persisted form changes.
    pub updated_at: Option<DateTime<Utc>>,
    pub details: RecordDetails,
}

impl CanonicalRecord {
    pub fn category(&self) -> Category {
        self.details.category()
    }

    /// Provider tags that contributed to this record.
    pub fn source_tags(&self) -> BTreeSet<String> {
        split_sources(&self.source)
    }

    pub fn has_source(&self, tag: &str) -> bool {
        self.source.split(',').any(|t| t.trim() == tag)
    }
}

/// Parse a comma-joined source string into a tag set (blank entries dropped).
pub fn split_sources(source: &str) -> BTreeSet<String> {
    source
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join a tag set back into the canonical sorted form.
pub fn join_sources(tags: &BTreeSet<String>) -> String {
    tags.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}

// ---------------------------------------------------------------------------
// Raw provider records
// ---------------------------------------------------------------------------

/// A recruiting prospect exactly as a provider reported it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecruit {
    pub name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub hometown: Option<String>,
    #[serde(default)]
    pub stars: Option<u8>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub player_url: Option<String>,
}

/// A transfer-portal entry exactly as a provider reported it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPortal {
    pub name: String,
    #[serde(default)]
    pub position: String,
    pub direction: Direction,
    #[serde(default)]
    pub source_school: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub player_url: Option<String>,
}

/// Provider output, one variant per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawRecord {
    Recruit(RawRecruit),
    Portal(RawPortal),
}

/// Boundary validation failures for a [`RawRecord`].
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecordError {
    StarsOutOfRange { name: String, stars: u8 },
    RatingNotFinite { name: String },
    WrongCategory { expected: Category, got: Category },
}

impl fmt::Display for RawRecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawRecordError::StarsOutOfRange { name, stars } => {
                write!(f, "record '{name}': stars must be 0..=5, got {stars}")
            }
            RawRecordError::RatingNotFinite { name } => {
                write!(f, "record '{name}': rating is not a finite number")
            }
            RawRecordError::WrongCategory { expected, got } => {
                write!(f, "expected a {expected} record, got {got}")
            }
        }
    }
}

impl std::error::Error for RawRecordError {}

impl RawRecord {
    pub fn category(&self) -> Category {
        match self {
            RawRecord::Recruit(_) => Category::Recruits,
            RawRecord::Portal(_) => Category::Portal,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            RawRecord::Recruit(r) => &r.name,
            RawRecord::Portal(p) => &p.name,
        }
    }

    /// Validate once at the provider boundary. An empty name is accepted: it
    /// derives a degenerate but deterministic id.
    pub fn validate(&self, expected: Category) -> Result<(), RawRecordError> {
        if self.category() != expected {
            return Err(RawRecordError::WrongCategory {
                expected,
                got: self.category(),
            });
        }
        if let RawRecord::Recruit(r) = self {
            if let Some(stars) = r.stars {
                if stars > 5 {
                    return Err(RawRecordError::StarsOutOfRange {
                        name: r.name.clone(),
                        stars,
                    });
                }
            }
            if let Some(rating) = r.rating {
                if !rating.is_finite() {
                    return Err(RawRecordError::RatingNotFinite {
                        name: r.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Change notifications produced by a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum PlayerEvent {
    NewPlayer {
        category: Category,
        record: CanonicalRecord,
    },
    StatusChange {
        category: Category,
        record: CanonicalRecord,
        old_status: Option<String>,
        new_status: Option<String>,
    },
    PlayerRemoved {
        category: Category,
        record: CanonicalRecord,
    },
}

impl PlayerEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            PlayerEvent::NewPlayer { .. } => "new_player",
            PlayerEvent::StatusChange { .. } => "status_change",
            PlayerEvent::PlayerRemoved { .. } => "player_removed",
        }
    }

    pub fn category(&self) -> Category {
        match self {
            PlayerEvent::NewPlayer { category, .. }
            | PlayerEvent::StatusChange { category, .. }
            | PlayerEvent::PlayerRemoved { category, .. } => *category,
        }
    }

    pub fn record(&self) -> &CanonicalRecord {
        match self {
            PlayerEvent::NewPlayer { record, .. }
            | PlayerEvent::StatusChange { record, .. }
            | PlayerEvent::PlayerRemoved { record, .. } => record,
        }
    }
}
