//!
//! src/api.rs  Andrew Belles  Oct 19th, 2026
//!
//! Http routes of the catalog. Handlers only decode parameters, call into
//! the resolver / store / paginators and encode the result as json
//!

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::docs::{self, OPENAPI_PATH};
use crate::errors::CatalogError;
use crate::listing::ListQuery;
use crate::lyrics::{self, LyricsPage, VerseWindow};
use crate::persistent::SongStore;
use crate::resolver::{Resolved, Resolver};
use crate::types::{NewSong, Song, SongId, SongKey};

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
    pub store: Arc<dyn SongStore>
}

#[derive(Debug, Default, Deserialize)]
pub struct SongQuery {
    pub group: Option<String>,
    pub song: Option<String>
}

#[derive(Debug, Default, Deserialize)]
pub struct LyricsQuery {
    pub page: Option<String>,
    pub limit: Option<String>
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/songs", get(list_songs).post(add_song))
        .route("/songs/:id", put(update_song).delete(delete_song))
        .route("/songs/:id/lyrics", get(song_lyrics))
        .route("/docs", get(docs::swagger_ui))
        .route(OPENAPI_PATH, get(docs::openapi_json))
        .with_state(state)
}

/// Serves until `shutdown` is cancelled, letting in-flight requests finish
pub async fn serve(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: CancellationToken
) -> Result<(), CatalogError> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}

/// Non-numeric ids cannot name a stored song
fn parse_id(raw: &str) -> Result<SongId, CatalogError> {
    raw.trim().parse::<i64>()
        .map(SongId)
        .map_err(|_| CatalogError::NotFound(format!("song id {raw}")))
}

/// POST /songs?group=..&song=..
async fn add_song(
    State(state): State<AppState>,
    query: Option<Query<SongQuery>>
) -> Result<Json<Song>, CatalogError> {
    let Query(q) = query.unwrap_or_default();
    let key = SongKey::new(
        q.group.as_deref().unwrap_or_default(),
        q.song.as_deref().unwrap_or_default()
    )?;

    let song = match state.resolver.resolve(&key).await? {
        Resolved::Created(song) => {
            info!(id = %song.id, key = %key, "song.added");
            song
        }
        Resolved::Found(song) => song
    };
    Ok(Json(song))
}

/// GET /songs?group=&song=&releaseDate=&page=&limit=
async fn list_songs(
    State(state): State<AppState>,
    query: Option<Query<ListQuery>>
) -> Result<Json<Vec<Song>>, CatalogError> {
    let Query(q) = query.unwrap_or_default();
    let plan = q.plan();

    let songs = state.store.list(plan.order, plan.offset, plan.limit).await?;
    info!(order = ?plan.order, offset = plan.offset, limit = plan.limit,
        count = songs.len(), "song.list");
    Ok(Json(songs))
}

/// GET /songs/:id/lyrics?page=&limit=
async fn song_lyrics(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Option<Query<LyricsQuery>>
) -> Result<Json<LyricsPage>, CatalogError> {
    let id = parse_id(&id)?;
    let song = state.store.find_by_id(id).await?
        .ok_or_else(|| CatalogError::NotFound(format!("song with id {id}")))?;

    let Query(q) = query.unwrap_or_default();
    let window = VerseWindow::parse(q.page.as_deref(), q.limit.as_deref());
    let page = lyrics::paginate(&song, window);

    info!(id = %id, page = window.page, limit = window.limit, total = page.total,
        "song.lyrics");
    Ok(Json(page))
}

/// PUT /songs/:id with a full song as body
async fn update_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<NewSong>, JsonRejection>
) -> Result<Json<Song>, CatalogError> {
    let id = parse_id(&id)?;
    if state.store.find_by_id(id).await?.is_none() {
        return Err(CatalogError::NotFound(format!("song with id {id}")));
    }

    let Json(song) = body.map_err(|e| CatalogError::Validation(e.body_text()))?;
    song.validate()?;

    let updated = state.store.update(id, &song).await?
        .ok_or_else(|| CatalogError::NotFound(format!("song with id {id}")))?;

    info!(id = %id, "song.updated");
    Ok(Json(updated))
}

/// DELETE /songs/:id
async fn delete_song(
    State(state): State<AppState>,
    Path(id): Path<String>
) -> Result<(StatusCode, String), CatalogError> {
    let id = parse_id(&id)?;
    if !state.store.delete_by_id(id).await? {
        return Err(CatalogError::NotFound(format!("song with id {id}")));
    }

    info!(id = %id, "song.deleted");
    Ok((StatusCode::OK, format!("id #{id}: deleted")))
}
