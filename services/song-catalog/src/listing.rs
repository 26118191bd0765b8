//!
//! src/listing.rs  Andrew Belles  Oct 19th, 2026
//!
//! Turns listing query parameters into an ordering and an offset/limit
//! window over the songs table
//!

use serde::Deserialize;

use crate::persistent::SongOrder;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Query string of GET /songs, every value kept raw so bad numbers
/// can fall back to defaults instead of failing the request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub group: Option<String>,
    pub song: Option<String>,
    #[serde(rename = "releaseDate")]
    pub release_date: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListPlan {
    pub order: SongOrder,
    pub offset: u32,
    pub limit: u32
}

fn supplied(v: &Option<String>) -> bool {
    v.as_deref().is_some_and(|s| !s.is_empty())
}

fn parse_num(raw: Option<&str>, name: &str) -> Option<i64> {
    let raw = raw?;
    match raw.trim().parse::<i64>() {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!(param = name, value = raw, error = %e, "listing.param.default");
            None
        }
    }
}

impl ListQuery {
    /// Only one ordering field is honored: group, then song, then releaseDate
    pub fn order(&self) -> SongOrder {
        if supplied(&self.group) {
            SongOrder::Group
        } else if supplied(&self.song) {
            SongOrder::Song
        } else if supplied(&self.release_date) {
            SongOrder::ReleaseDate
        } else {
            SongOrder::Id
        }
    }

    pub fn plan(&self) -> ListPlan {
        let page = match parse_num(self.page.as_deref(), "page") {
            Some(p) if p >= 1 => p.min(u32::MAX as i64) as u32,
            _ => DEFAULT_PAGE
        };
        let limit = match parse_num(self.limit.as_deref(), "limit") {
            Some(l) if (1..=MAX_LIMIT as i64).contains(&l) => l as u32,
            _ => DEFAULT_LIMIT
        };

        ListPlan {
            order: self.order(),
            offset: (page - 1).saturating_mul(limit),
            limit
        }
    }
}
