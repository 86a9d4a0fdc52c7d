//! crates/studybank_core/src/domain.rs
//!
//! Defines the records the client caches and the payloads it sends.
//! Wire-shape quirks (bare-string images, naive timestamps, loose rotation
//! values) are normalized here, at deserialization, so nothing deeper in the
//! crate ever branches on the shape of a response.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Server-assigned identifier for every record.
pub type Id = i64;

//=========================================================================================
// Session Records
//=========================================================================================

/// The authenticated user's profile, as returned by `/auth/me` and `/auth/login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub auth_provider: Option<String>,
}

/// Body of a successful login (or registration) response.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

//=========================================================================================
// Images
//=========================================================================================

/// Clockwise rotation of a stored image. Only right angles are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Maps any whole number of degrees onto a right angle, if it is one.
    pub fn from_degrees(degrees: i64) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    pub fn clockwise(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }

    pub fn counter_clockwise(self) -> Self {
        self.clockwise().clockwise().clockwise()
    }

    pub fn is_zero(self) -> bool {
        self == Rotation::Deg0
    }

    // Missing, null, non-numeric or off-axis values all read as no rotation.
    fn from_loose(value: &serde_json::Value) -> Self {
        let degrees = match value {
            serde_json::Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        degrees.and_then(Self::from_degrees).unwrap_or_default()
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.degrees())
    }
}

impl FromStr for Rotation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .ok()
            .and_then(Self::from_degrees)
            .ok_or_else(|| format!("'{}' is not one of 0, 90, 180, 270", s))
    }
}

impl Serialize for Rotation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.degrees())
    }
}

impl<'de> Deserialize<'de> for Rotation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Self::from_loose(&value))
    }
}

/// A stored image attached to an item or question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireImage")]
pub struct ImageDescriptor {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
    pub rotation: Rotation,
}

impl ImageDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            public_id: None,
            rotation: Rotation::Deg0,
        }
    }

    pub fn with_public_id(mut self, public_id: impl Into<String>) -> Self {
        self.public_id = Some(public_id.into());
        self
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }
}

/// Older records store images as bare URL strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireImage {
    Bare(String),
    Descriptor {
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        public_id: Option<String>,
        #[serde(default)]
        rotation: Rotation,
    },
}

impl From<WireImage> for ImageDescriptor {
    fn from(wire: WireImage) -> Self {
        match wire {
            WireImage::Bare(url) => ImageDescriptor::new(url),
            WireImage::Descriptor {
                url,
                public_id,
                rotation,
            } => ImageDescriptor {
                url: url.unwrap_or_default(),
                public_id: public_id.filter(|id| !id.is_empty()),
                rotation,
            },
        }
    }
}

//=========================================================================================
// Items, Questions and Collections
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    #[default]
    Unanswered,
    Answered,
    Mastered,
    NeedReview,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Unanswered => "UNANSWERED",
            ItemStatus::Answered => "ANSWERED",
            ItemStatus::Mastered => "MASTERED",
            ItemStatus::NeedReview => "NEED_REVIEW",
        }
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UNANSWERED" => Ok(ItemStatus::Unanswered),
            "ANSWERED" => Ok(ItemStatus::Answered),
            "MASTERED" => Ok(ItemStatus::Mastered),
            "NEED_REVIEW" => Ok(ItemStatus::NeedReview),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

fn default_difficulty() -> u8 {
    3
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Id,
    pub name: String,
}

/// A question-bank entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Id,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub collection_id: Option<Id>,
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub images: Vec<ImageDescriptor>,
    #[serde(default)]
    pub content_text: Option<String>,
    #[serde(default)]
    pub author_id: Option<Id>,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub success_rate: Option<f64>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub needs_review: bool,
}

/// Legacy question record; same lifecycle as an item, fewer fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: Id,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub images: Vec<ImageDescriptor>,
    #[serde(default)]
    pub content_text: Option<String>,
    #[serde(default)]
    pub author_id: Option<Id>,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: Id,
    pub name: String,
    #[serde(rename = "type", default = "default_collection_kind")]
    pub kind: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_collection_kind() -> String {
    "SUBJECT".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: Id,
    pub item_id: Id,
    pub user_id: Id,
    #[serde(default)]
    pub content: Option<String>,
    pub is_correct: bool,
    #[serde(default)]
    pub duration_seconds: u32,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

//=========================================================================================
// Resource Trait
//=========================================================================================

/// A record type served by a paginated REST collection.
pub trait Resource: Clone + DeserializeOwned + Send + Sync + 'static {
    /// Collection path relative to the API base, e.g. `/items`.
    const PATH: &'static str;
    /// Field of the list response holding the page of records.
    const LIST_FIELD: &'static str;
    /// Human name used in fallback error messages.
    const NAME: &'static str;

    fn id(&self) -> Id;
}

impl Resource for Item {
    const PATH: &'static str = "/items";
    const LIST_FIELD: &'static str = "items";
    const NAME: &'static str = "item";

    fn id(&self) -> Id {
        self.id
    }
}

impl Resource for Question {
    const PATH: &'static str = "/questions";
    const LIST_FIELD: &'static str = "questions";
    const NAME: &'static str = "question";

    fn id(&self) -> Id {
        self.id
    }
}

/// Pagination snapshot from the last successful list fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
            total: 0,
            pages: 0,
        }
    }
}

//=========================================================================================
// Payloads and Small Responses
//=========================================================================================

/// Body for creating an item or a question.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<Id>,
    pub difficulty: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_text: Option<String>,
    pub images: Vec<ImageDescriptor>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Partial update; absent fields are left alone by the server.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RotateRequest {
    pub image_index: usize,
    pub rotation: Rotation,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RotateResponse {
    pub rotation: Rotation,
    pub image_index: usize,
    #[serde(default, with = "timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAnswer {
    pub is_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub duration_seconds: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerReceipt {
    #[serde(default)]
    pub message: Option<String>,
    pub answer: Answer,
    pub item_status: ItemStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCollection {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// `Some(true)` moves the collection to the trash.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedAsset {
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub answered: u64,
    #[serde(default)]
    pub mastered: u64,
}

/// Dashboard statistics from `/analytics/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub total_questions: u64,
    #[serde(default)]
    pub answered_questions: u64,
    #[serde(default)]
    pub mastered_questions: u64,
    #[serde(default)]
    pub need_review_questions: u64,
    #[serde(default)]
    pub by_subject: BTreeMap<String, SubjectStats>,
    #[serde(default)]
    pub by_difficulty: BTreeMap<String, u64>,
}

//=========================================================================================
// Timestamp Serde Helpers
//=========================================================================================

/// Timestamps arrive as RFC 3339, as naive ISO-8601 (read as UTC), or as
/// RFC 2822 from older endpoints.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};
    use tracing::warn;

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
            .or_else(|| {
                DateTime::parse_from_rfc2822(raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .ok()
            })
    }

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => serializer.serialize_none(),
        }
    }

    /// Unparseable values become `None` rather than failing the record.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return Ok(None),
        };
        let parsed = parse(&raw);
        if parsed.is_none() {
            warn!("Ignoring unparseable timestamp '{}'", raw);
        }
        Ok(parsed)
    }
}
