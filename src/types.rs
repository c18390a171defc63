//! Core types shared across the journal engine

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classified trade result.
///
/// Single source of truth for outcome semantics: raw outcome labels from the
/// journal source are free-form strings and go through [`classify_outcome`]
/// exactly once, at normalization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Lose,
    Breakeven,
    Unknown,
}

/// Classify a raw outcome label.
///
/// Matches case-insensitive substrings: "win" wins over "los", which wins
/// over "break"/"be". Anything else is `Unknown`.
pub fn classify_outcome(raw: &str) -> Outcome {
    let lower = raw.to_lowercase();
    if lower.contains("win") {
        Outcome::Win
    } else if lower.contains("los") {
        Outcome::Lose
    } else if lower.contains("break") || lower.contains("be") {
        Outcome::Breakeven
    } else {
        Outcome::Unknown
    }
}

/// Trade quality grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl FromStr for Grade {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A+" => Ok(Grade::APlus),
            "A" => Ok(Grade::A),
            "B" => Ok(Grade::B),
            "C" => Ok(Grade::C),
            "D" => Ok(Grade::D),
            "F" => Ok(Grade::F),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        write!(f, "{}", label)
    }
}

/// Canonical trade entity
///
/// Produced by the normalizer from a raw journal record. Every field except
/// `id` may be missing in the source; a trade without a parseable `date` is
/// excluded from statistics downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    /// Trade date; the sort and bucketing key for all statistics
    pub date: Option<NaiveDate>,
    pub pair: Option<String>,
    pub direction: Option<String>,
    pub outcome: Outcome,
    /// Result expressed as a multiple of initial risk
    pub r_multiple: Option<Decimal>,
    pub grade: Option<Grade>,
    pub session: Option<String>,
    pub timeframe: Option<String>,
    /// Free-text review, may be empty
    pub comment: String,
    /// Ordered setup tags
    pub confluences: Vec<String>,
    /// Chart screenshot URLs
    pub images: Vec<String>,
}

impl Trade {
    /// Empty trade carrying only an id; the normalizer fills in what it finds
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            date: None,
            pair: None,
            direction: None,
            outcome: Outcome::Unknown,
            r_multiple: None,
            grade: None,
            session: None,
            timeframe: None,
            comment: String::new(),
            confluences: Vec::new(),
            images: Vec::new(),
        }
    }
}

/// Declared kind of a raw source field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Date,
    Number,
    Select,
    MultiSelect,
    Text,
    Title,
    Files,
}

/// File entry in a file-list field; either URL may be absent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAttachment {
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub external_url: Option<String>,
}

impl FileAttachment {
    /// Resolved URL: hosted file first, external link second
    pub fn url(&self) -> Option<&str> {
        self.file_url
            .as_deref()
            .or(self.external_url.as_deref())
            .filter(|u| !u.is_empty())
    }
}

/// Kind-tagged payload of a raw source field
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// ISO date string, possibly with a time suffix
    Date(String),
    Number(Decimal),
    Select(String),
    MultiSelect(Vec<String>),
    /// Rich text runs, joined in order
    Text(Vec<String>),
    Title(Vec<String>),
    Files(Vec<FileAttachment>),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Date(_) => FieldKind::Date,
            FieldValue::Number(_) => FieldKind::Number,
            FieldValue::Select(_) => FieldKind::Select,
            FieldValue::MultiSelect(_) => FieldKind::MultiSelect,
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Title(_) => FieldKind::Title,
            FieldValue::Files(_) => FieldKind::Files,
        }
    }
}

/// Named field of a raw record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawField {
    pub name: String,
    #[serde(flatten)]
    pub value: FieldValue,
}

/// One raw journal record as delivered by the gateway.
///
/// Field names and shapes are user-customizable at the source; only the
/// normalizer's mapping table knows how to interpret them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: String,
    pub fields: Vec<RawField>,
}
