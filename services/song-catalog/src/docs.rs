//!
//! src/docs.rs  Andrew Belles  Oct 19th, 2026
//!
//! OpenAPI 3 description of the catalog routes and the swagger page that
//! renders it
//!

use axum::response::Html;
use axum::Json;
use serde_json::{json, Value};

pub const OPENAPI_PATH: &str = "/docs/openapi.json";

/// GET /docs
pub async fn swagger_ui() -> Html<String> {
    let html = format!(r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Song Catalog API</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5.9.0/swagger-ui.css" />
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5.9.0/swagger-ui-bundle.js"></script>
    <script>
        window.onload = function() {{
            SwaggerUIBundle({{ url: '{OPENAPI_PATH}', dom_id: '#swagger-ui', deepLinking: true }});
        }};
    </script>
</body>
</html>
"#);
    Html(html)
}

/// GET /docs/openapi.json
pub async fn openapi_json() -> Json<Value> {
    Json(openapi_document())
}

fn text(description: &str) -> Value {
    json!({
        "description": description,
        "content": { "text/plain": { "schema": { "type": "string" } } }
    })
}

fn query_param(name: &str, kind: &str, required: bool, description: &str) -> Value {
    json!({
        "name": name, "in": "query", "required": required,
        "description": description, "schema": { "type": kind }
    })
}

fn id_param() -> Value {
    json!({
        "name": "id", "in": "path", "required": true,
        "description": "Song id", "schema": { "type": "integer", "format": "int64" }
    })
}

pub fn openapi_document() -> Value {
    let song_ref = json!({ "$ref": "#/components/schemas/Song" });

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Song Catalog API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Song metadata and lyrics, enriched from an external provider on first request"
        },
        "paths": {
            "/songs": {
                "post": {
                    "summary": "Add or get song information",
                    "parameters": [
                        query_param("group", "string", true, "Group name"),
                        query_param("song", "string", true, "Song title")
                    ],
                    "responses": {
                        "200": {
                            "description": "Song found or added",
                            "content": { "application/json": { "schema": song_ref } }
                        },
                        "400": text("Missing group or song"),
                        "404": text("Song unknown to the catalog and the provider"),
                        "406": text("Provider failed or the new song could not be stored")
                    }
                },
                "get": {
                    "summary": "List songs, ordered and paged",
                    "parameters": [
                        query_param("group", "string", false, "Order by group name"),
                        query_param("song", "string", false, "Order by song title"),
                        query_param("releaseDate", "string", false, "Order by release date"),
                        query_param("page", "integer", false, "Page number (default 1)"),
                        query_param("limit", "integer", false, "Songs per page (default 10, max 100)")
                    ],
                    "responses": {
                        "200": {
                            "description": "Songs of the requested page",
                            "content": { "application/json": {
                                "schema": { "type": "array", "items": song_ref }
                            } }
                        },
                        "500": text("Storage failure")
                    }
                }
            },
            "/songs/{id}/lyrics": {
                "get": {
                    "summary": "Song text paged by verse",
                    "parameters": [
                        id_param(),
                        query_param("page", "integer", false, "Page number (default 1)"),
                        query_param("limit", "integer", false, "Verses per page (default 1)")
                    ],
                    "responses": {
                        "200": {
                            "description": "Verses of the requested page",
                            "content": { "application/json": {
                                "schema": { "$ref": "#/components/schemas/LyricsPage" }
                            } }
                        },
                        "404": text("No song with this id")
                    }
                }
            },
            "/songs/{id}": {
                "put": {
                    "summary": "Replace a song",
                    "parameters": [ id_param() ],
                    "requestBody": {
                        "required": true,
                        "content": { "application/json": { "schema": song_ref } }
                    },
                    "responses": {
                        "200": {
                            "description": "Updated song",
                            "content": { "application/json": { "schema": song_ref } }
                        },
                        "400": text("Invalid song body"),
                        "404": text("No song with this id"),
                        "500": text("Song could not be saved")
                    }
                },
                "delete": {
                    "summary": "Delete a song",
                    "parameters": [ id_param() ],
                    "responses": {
                        "200": text("Song deleted"),
                        "404": text("No song with this id")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Song": {
                    "type": "object",
                    "required": ["group", "song", "releaseDate", "text", "link"],
                    "properties": {
                        "id": { "type": "integer", "format": "int64", "readOnly": true },
                        "group": { "type": "string" },
                        "song": { "type": "string" },
                        "releaseDate": { "type": "string", "format": "date" },
                        "text": { "type": "string" },
                        "link": { "type": "string" }
                    }
                },
                "LyricsPage": {
                    "type": "object",
                    "properties": {
                        "ID": { "type": "integer", "format": "int64" },
                        "song": { "type": "string" },
                        "group": { "type": "string" },
                        "verse": { "type": "array", "items": { "type": "string" } },
                        "total": { "type": "integer" }
                    }
                }
            }
        }
    })
}
