//!
//! src/types.rs  Andrew Belles  Oct 19th, 2026
//!
//! Domain types shared by the resolver, storage and http layers
//!

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::CatalogError;

/// Storage assigned identifier of a song
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongId(pub i64);

impl std::fmt::Display for SongId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub group: String,
    pub song: String,
    #[serde(rename = "releaseDate", with = "release_date")]
    pub release_date: NaiveDate,
    pub text: String,
    pub link: String
}

/// Song fields without identity, used for inserts and full record updates.
/// An `id` present in a request body is ignored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSong {
    pub group: String,
    pub song: String,
    #[serde(rename = "releaseDate", with = "release_date")]
    pub release_date: NaiveDate,
    pub text: String,
    pub link: String
}

impl NewSong {
    pub fn from_detail(key: &SongKey, detail: SongDetail) -> Self {
        Self {
            group: key.group.clone(),
            song: key.title.clone(),
            release_date: detail.release_date,
            text: detail.text,
            link: detail.link
        }
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        SongKey::new(&self.group, &self.song).map(|_| ())
    }

    pub fn with_id(self, id: SongId) -> Song {
        Song {
            id,
            group: self.group,
            song: self.song,
            release_date: self.release_date,
            text: self.text,
            link: self.link
        }
    }
}

/// Enrichment payload returned by the external provider, never stored as is
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SongDetail {
    #[serde(rename = "releaseDate", with = "release_date")]
    pub release_date: NaiveDate,
    pub text: String,
    pub link: String
}

/// Validated (group, title) lookup key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SongKey {
    group: String,
    title: String
}

impl SongKey {
    pub fn new(group: &str, title: &str) -> Result<Self, CatalogError> {
        if group.trim().is_empty() || title.trim().is_empty() {
            return Err(CatalogError::Validation(
                "both group and song are required".to_string()
            ));
        }
        Ok( Self { group: group.to_string(), title: title.to_string() } )
    }

    pub fn group(&self) -> &str { &self.group }
    pub fn title(&self) -> &str { &self.title }
}

impl std::fmt::Display for SongKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.group, self.title)
    }
}

///
/// Release dates arrive as `YYYY-MM-DD`, `DD.MM.YYYY` or a full rfc 3339
/// timestamp. They always leave as `YYYY-MM-DD`
///
pub mod release_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d";

    pub fn parse(s: &str) -> Option<NaiveDate> {
        let s = s.trim();
        NaiveDate::parse_from_str(s, FORMAT)
            .or_else(|_| NaiveDate::parse_from_str(s, "%d.%m.%Y"))
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|t| t.date_naive()))
    }

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(
            format!("unrecognized release date: {raw}")
        ))
    }
}
