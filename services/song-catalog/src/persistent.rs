//!
//! src/persistent.rs  Andrew Belles  Oct 19th, 2026
//!
//! Defines module for persisting songs to an sqlite database.
//! The pool is built once in main and handed to every consumer
//! through the SongStore trait
//!

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{sqlite::SqliteConnectOptions, sqlite::SqlitePoolOptions, sqlite::SqliteRow};
use sqlx::{Pool, Row, Sqlite};

use crate::config::PersistenceConfig;
use crate::errors::CatalogError;
use crate::types::{release_date, NewSong, Song, SongId};

///
/// Column used to order a listing. Ties are broken by id
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SongOrder {
    #[default]
    Id,
    Group,
    Song,
    ReleaseDate
}

impl SongOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SongOrder::Id          => "id ASC",
            SongOrder::Group       => "group_name ASC, id ASC",
            SongOrder::Song        => "song ASC, id ASC",
            SongOrder::ReleaseDate => "release_date ASC, id ASC"
        }
    }
}

///
/// Storage operations the catalog needs
///
#[async_trait]
pub trait SongStore: Send + Sync {
    async fn find_by_group_and_title(&self, group: &str, title: &str) ->
        Result<Option<Song>, CatalogError>;

    /// Inserts a song unless its (group, song) is already taken. None when
    /// another writer got there first
    async fn try_insert(&self, song: &NewSong) -> Result<Option<Song>, CatalogError>;

    /// Inserts a song, or returns the row already holding its (group, song)
    async fn insert(&self, song: &NewSong) -> Result<Song, CatalogError> {
        if let Some(stored) = self.try_insert(song).await? {
            return Ok(stored);
        }
        self.find_by_group_and_title(&song.group, &song.song)
            .await?
            .ok_or_else(|| CatalogError::Db(
                "conflicting row vanished during insert".to_string()
            ))
    }

    async fn find_by_id(&self, id: SongId) -> Result<Option<Song>, CatalogError>;

    /// Replaces every field of an existing song. None if the id is unknown
    async fn update(&self, id: SongId, song: &NewSong) ->
        Result<Option<Song>, CatalogError>;

    /// False if there was nothing to delete
    async fn delete_by_id(&self, id: SongId) -> Result<bool, CatalogError>;

    async fn list(&self, order: SongOrder, offset: u32, limit: u32) ->
        Result<Vec<Song>, CatalogError>;
}

pub struct Persistent {
    pool: Pool<Sqlite>
}

impl Persistent {

    async fn ensure_schema(pool: &Pool<Sqlite>) -> Result<(), CatalogError> {
        // ensure that schema exists
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS songs (
              id            INTEGER PRIMARY KEY AUTOINCREMENT,
              group_name    TEXT NOT NULL,
              song          TEXT NOT NULL,
              release_date  TEXT NOT NULL,
              text          TEXT NOT NULL,
              link          TEXT NOT NULL,
              created_at    INTEGER NOT NULL,
              updated_at    INTEGER NOT NULL
            );
            "
        ).execute(pool).await?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_songs_key ON songs(group_name, song);"
        ).execute(pool).await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_songs_release ON songs(release_date);"
        ).execute(pool).await?;

        Ok(())
    }

    pub async fn init(cfg: &PersistenceConfig) -> Result<Self, CatalogError> {
        let database_url = cfg.db_url.as_str();
        let is_memory = database_url == "sqlite::memory:";

        let mut opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true);

        // WAL is file-only; don't set it for in-memory
        if !is_memory {
            Self::ensure_parent_dir(database_url)?;
            opts = opts.journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                       .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        }

        let mut pool_opts = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(if is_memory {1} else {cfg.max_connections});

        // an in-memory database dies with its only connection
        if is_memory {
            pool_opts = pool_opts.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_opts.connect_with(opts).await?;

        // Always create schema right away
        Self::ensure_schema(&pool).await?;

        tracing::info!(db = database_url, "persistence.ready");
        Ok(Self { pool })
    }

    /// Fresh private database, one per call
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self, CatalogError> {
        Self::init(&PersistenceConfig {
            db_url: "sqlite::memory:".to_string(),
            max_connections: 1
        }).await
    }

    /// sqlite creates the file but not the directories leading to it
    fn ensure_parent_dir(database_url: &str) -> Result<(), CatalogError> {
        let path = database_url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:");
        let path = path.split('?').next().unwrap_or_default();

        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| CatalogError::Db(
                    format!("create dir {}: {e}", parent.display())
                ))?;
            }
        }
        Ok(())
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    fn song_from_row(r: &SqliteRow) -> Result<Song, CatalogError> {
        let raw_date: String = r.try_get("release_date")?;
        let release_date = release_date::parse(&raw_date)
            .ok_or_else(|| CatalogError::Parse(
                format!("bad release_date in DB: {raw_date}")
            ))?;

        Ok(Song {
            id: SongId(r.try_get("id")?),
            group: r.try_get("group_name")?,
            song: r.try_get("song")?,
            release_date,
            text: r.try_get("text")?,
            link: r.try_get("link")?
        })
    }

    fn date_text(song: &NewSong) -> String {
        song.release_date.format(release_date::FORMAT).to_string()
    }
}

#[async_trait]
impl SongStore for Persistent {
    async fn find_by_group_and_title(&self, group: &str, title: &str) ->
        Result<Option<Song>, CatalogError> {
        let row = sqlx::query(
            r"
            SELECT id, group_name, song, release_date, text, link
              FROM songs
             WHERE group_name = ?1 AND song = ?2
             LIMIT 1;
            "
        )
        .bind(group)
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::song_from_row).transpose()
    }

    async fn try_insert(&self, song: &NewSong) -> Result<Option<Song>, CatalogError> {
        let now = Self::now();
        let inserted: Option<i64> = sqlx::query_scalar(
            r"
            INSERT INTO songs (
                group_name, song, release_date, text, link, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT(group_name, song) DO NOTHING
            RETURNING id;
            "
        )
        .bind(&song.group)
        .bind(&song.song)
        .bind(Self::date_text(song))
        .bind(&song.text)
        .bind(&song.link)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        if inserted.is_none() {
            tracing::debug!(group = %song.group, song = %song.song, "persistence.insert.conflict");
        }
        Ok(inserted.map(|id| song.clone().with_id(SongId(id))))
    }

    async fn find_by_id(&self, id: SongId) -> Result<Option<Song>, CatalogError> {
        let row = sqlx::query(
            r"
            SELECT id, group_name, song, release_date, text, link
              FROM songs
             WHERE id = ?1;
            "
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::song_from_row).transpose()
    }

    async fn update(&self, id: SongId, song: &NewSong) ->
        Result<Option<Song>, CatalogError> {
        let updated = sqlx::query(
            r"
            UPDATE songs
               SET group_name = ?1,
                   song = ?2,
                   release_date = ?3,
                   text = ?4,
                   link = ?5,
                   updated_at = ?6
             WHERE id = ?7;
            "
        )
        .bind(&song.group)
        .bind(&song.song)
        .bind(Self::date_text(song))
        .bind(&song.text)
        .bind(&song.link)
        .bind(Self::now())
        .bind(id.0)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Ok(None);
        }
        Ok(Some(song.clone().with_id(id)))
    }

    async fn delete_by_id(&self, id: SongId) -> Result<bool, CatalogError> {
        let deleted = sqlx::query("DELETE FROM songs WHERE id = ?1;")
            .bind(id.0)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn list(&self, order: SongOrder, offset: u32, limit: u32) ->
        Result<Vec<Song>, CatalogError> {
        // order comes from a closed enum, never from caller text
        let sql = format!(
            r"
            SELECT id, group_name, song, release_date, text, link
              FROM songs
             ORDER BY {}
             LIMIT ?1 OFFSET ?2;
            ",
            order.as_sql()
        );

        let rows = sqlx::query(&sql)
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::song_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use super::*;

    fn new_song(group: &str, title: &str, date: (i32, u32, u32)) -> NewSong {
        NewSong {
            group: group.to_string(),
            song: title.to_string(),
            release_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            text: "first\n\nsecond".to_string(),
            link: format!("https://example.com/{title}")
        }
    }

    #[tokio::test]
    async fn insert_then_find() -> Result<(), CatalogError> {
        let db = Persistent::in_memory().await?;
        let stored = db.insert(&new_song("Muse", "Starlight", (2006, 6, 16))).await?;

        let by_key = db.find_by_group_and_title("Muse", "Starlight").await?;
        assert_eq!(by_key.as_ref(), Some(&stored));
        assert_eq!(db.find_by_id(stored.id).await?, Some(stored));

        // lookup is exact and case sensitive
        assert!(db.find_by_group_and_title("muse", "Starlight").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_insert_returns_existing_row() -> Result<(), CatalogError> {
        let db = Persistent::in_memory().await?;
        let first = db.insert(&new_song("Muse", "Starlight", (2006, 6, 16))).await?;
        let mut again = new_song("Muse", "Starlight", (1999, 1, 1));
        again.text = "other".to_string();

        assert_eq!(db.try_insert(&again).await?, None);
        let second = db.insert(&again).await?;
        assert_eq!(first, second);
        assert_eq!(db.list(SongOrder::Id, 0, 10).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_rows() -> Result<(), CatalogError> {
        let db = Persistent::in_memory().await?;
        let stored = db.insert(&new_song("Muse", "Starlight", (2006, 6, 16))).await?;

        let mut changed = new_song("Muse", "Starlight", (2006, 7, 3));
        changed.link = "https://example.com/new".to_string();
        let updated = db.update(stored.id, &changed).await?;
        assert_eq!(updated, Some(changed.clone().with_id(stored.id)));
        assert_eq!(db.find_by_id(stored.id).await?, updated);

        assert_eq!(db.update(SongId(999), &changed).await?, None);
        assert!(db.delete_by_id(stored.id).await?);
        assert!(!db.delete_by_id(stored.id).await?);
        assert!(db.find_by_id(stored.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn update_into_existing_key_fails() -> Result<(), CatalogError> {
        let db = Persistent::in_memory().await?;
        db.insert(&new_song("Muse", "Starlight", (2006, 6, 16))).await?;
        let other = db.insert(&new_song("Muse", "Uprising", (2009, 9, 7))).await?;

        let clash = db.update(other.id, &new_song("Muse", "Starlight", (2009, 9, 7))).await;
        assert!(matches!(clash, Err(CatalogError::Db(_))));
        Ok(())
    }

    #[tokio::test]
    async fn list_orders_and_pages() -> Result<(), CatalogError> {
        let db = Persistent::in_memory().await?;
        db.insert(&new_song("Radiohead", "Creep", (1992, 9, 21))).await?;
        db.insert(&new_song("Muse", "Starlight", (2006, 6, 16))).await?;
        db.insert(&new_song("Blur", "Song 2", (1997, 4, 7))).await?;

        let by_group: Vec<String> = db.list(SongOrder::Group, 0, 10).await?
            .into_iter().map(|s| s.group).collect();
        assert_eq!(by_group, ["Blur", "Muse", "Radiohead"]);

        let by_date: Vec<String> = db.list(SongOrder::ReleaseDate, 1, 1).await?
            .into_iter().map(|s| s.song).collect();
        assert_eq!(by_date, ["Song 2"]);

        assert!(db.list(SongOrder::Song, 3, 10).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn ordering_ties_fall_back_to_id() -> Result<(), CatalogError> {
        let db = Persistent::in_memory().await?;
        let a = db.insert(&new_song("Muse", "Uprising", (2009, 9, 7))).await?;
        let b = db.insert(&new_song("Muse", "Hysteria", (2003, 12, 1))).await?;
        let c = db.insert(&new_song("Muse", "Starlight", (2006, 6, 16))).await?;

        let ids: Vec<SongId> = db.list(SongOrder::Group, 0, 10).await?
            .into_iter().map(|s| s.id).collect();
        assert_eq!(ids, [a.id, b.id, c.id]);
        Ok(())
    }

    #[tokio::test]
    async fn file_database_survives_reopen() -> Result<(), CatalogError> {
        let dir = tempfile::tempdir()?;
        let cfg = PersistenceConfig {
            db_url: format!("sqlite:{}", dir.path().join("songs.db").display()),
            max_connections: 2
        };

        let stored = {
            let db = Persistent::init(&cfg).await?;
            db.insert(&new_song("Muse", "Starlight", (2006, 6, 16))).await?
        };

        let reopened = Persistent::init(&cfg).await?;
        assert_eq!(reopened.find_by_id(stored.id).await?, Some(stored));
        Ok(())
    }
}
