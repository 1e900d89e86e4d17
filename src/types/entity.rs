//! Wire representations of the searchable entities.

use std::{fmt, str::FromStr};

use serde::{de::DeserializeOwned, Deserialize, Serialize, Serializer};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    /// Display text of the author (their username).
    pub author: String,
    #[serde(rename = "type", default)]
    pub kind: ArticleType,
    pub content: String,
}

/// Stored as a two-letter code, rendered as its display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum ArticleType {
    #[default]
    Unspecified,
    Tutorial,
    Research,
    Review,
}

impl ArticleType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unspecified => "UN",
            Self::Tutorial => "TU",
            Self::Research => "RS",
            Self::Review => "RW",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Unspecified => "Unspecified",
            Self::Tutorial => "Tutorial",
            Self::Research => "Research",
            Self::Review => "Review",
        }
    }
}

impl FromStr for ArticleType {
    type Err = String;

    /// Accepts either the code or the display name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Unspecified, Self::Tutorial, Self::Research, Self::Review]
            .into_iter()
            .find(|kind| {
                kind.code().eq_ignore_ascii_case(s) || kind.display_name().eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| format!("unknown article type {:?}", s))
    }
}

impl TryFrom<String> for ArticleType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ArticleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl Serialize for ArticleType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.display_name())
    }
}

/// Normalizes a raw index document into the wire representation of `T`, dropping any
/// fields the representation does not carry.
pub fn serialize_document<T>(document: Value) -> Result<Value, serde_json::Error>
where
    T: DeserializeOwned + Serialize,
{
    serde_json::to_value(serde_json::from_value::<T>(document)?)
}
