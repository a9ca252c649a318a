use super::{ApiError, MediaServerApi};
/// Plex Media Server API implementation
use crate::models::{
    Connection, Library, LibraryKind, MediaFormat, MediaItem, MediaKind, MediaPart, MediaStream,
    Server, StreamKind,
};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

const CLIENT_PRODUCT: &str = "Plexling";
const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");
const CLIENT_DEVICE: &str = "Desktop";
const CLIENT_PLATFORM: &str = "Rust";

/// Plex API response types
#[derive(Debug, Deserialize)]
struct IdentityResponse {
    #[serde(rename = "machineIdentifier")]
    machine_identifier: String,
    version: Option<String>,
    #[serde(rename = "friendlyName")]
    friendly_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServerRootResponse {
    #[serde(rename = "friendlyName")]
    friendly_name: Option<String>,
    version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ContainerResponse {
    #[serde(rename = "MediaContainer", default)]
    container: MediaContainer,
}

#[derive(Debug, Default, Deserialize)]
struct MediaContainer {
    #[serde(rename = "Directory", default)]
    directories: Vec<DirectoryEntry>,
    #[serde(rename = "Metadata", default)]
    metadata: Vec<MetadataEntry>,
}

#[derive(Debug, Deserialize)]
struct DirectoryEntry {
    key: String,
    title: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    thumb: Option<String>,
    art: Option<String>,
    #[serde(rename = "totalSize")]
    total_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct MetadataEntry {
    #[serde(rename = "ratingKey")]
    rating_key: String,
    title: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    thumb: Option<String>,
    art: Option<String>,
    summary: Option<String>,
    year: Option<u32>,
    duration: Option<u64>,
    #[serde(rename = "viewOffset")]
    view_offset: Option<u64>,
    #[serde(rename = "lastViewedAt")]
    last_viewed_at: Option<i64>,
    rating: Option<f32>,
    #[serde(rename = "grandparentTitle")]
    grandparent_title: Option<String>,
    #[serde(rename = "parentTitle")]
    parent_title: Option<String>,
    #[serde(rename = "parentIndex")]
    parent_index: Option<u32>,
    index: Option<u32>,
    #[serde(rename = "Media", default)]
    media: Vec<MediaEntry>,
}

#[derive(Debug, Deserialize)]
struct MediaEntry {
    id: u64,
    duration: Option<u64>,
    bitrate: Option<u64>,
    width: Option<u32>,
    height: Option<u32>,
    #[serde(rename = "aspectRatio")]
    aspect_ratio: Option<f64>,
    #[serde(rename = "audioChannels")]
    audio_channels: Option<u32>,
    #[serde(rename = "audioCodec")]
    audio_codec: Option<String>,
    #[serde(rename = "videoCodec")]
    video_codec: Option<String>,
    #[serde(rename = "videoResolution")]
    video_resolution: Option<String>,
    container: Option<String>,
    #[serde(rename = "videoFrameRate")]
    video_frame_rate: Option<String>,
    #[serde(rename = "Part", default)]
    parts: Vec<PartEntry>,
}

#[derive(Debug, Deserialize)]
struct PartEntry {
    id: u64,
    key: String,
    duration: Option<u64>,
    file: Option<String>,
    size: Option<u64>,
    container: Option<String>,
    #[serde(rename = "Stream", default)]
    streams: Vec<StreamEntry>,
}

#[derive(Debug, Deserialize)]
struct StreamEntry {
    id: u64,
    #[serde(rename = "streamType")]
    stream_type: u32,
    codec: Option<String>,
    index: Option<u32>,
    bitrate: Option<u64>,
    language: Option<String>,
    #[serde(rename = "languageCode")]
    language_code: Option<String>,
    title: Option<String>,
    selected: Option<bool>,
}

impl DirectoryEntry {
    fn into_library(self, base_url: &str) -> Library {
        Library {
            id: self.key,
            title: self.title,
            kind: self
                .kind
                .as_deref()
                .map(LibraryKind::from_wire)
                .unwrap_or(LibraryKind::Unknown),
            thumb: self.thumb.map(|thumb| format!("{base_url}{thumb}")),
            art: self.art.map(|art| format!("{base_url}{art}")),
            count: self.total_size.unwrap_or(0),
        }
    }
}

impl MetadataEntry {
    fn into_media_item(self, base_url: &str) -> MediaItem {
        MediaItem {
            id: self.rating_key,
            title: self.title,
            kind: self
                .kind
                .as_deref()
                .map(MediaKind::from_wire)
                .unwrap_or(MediaKind::Unknown),
            thumb: self.thumb.map(|thumb| format!("{base_url}{thumb}")),
            art: self.art.map(|art| format!("{base_url}{art}")),
            summary: self.summary,
            year: self.year,
            duration_ms: self.duration.unwrap_or(0),
            view_offset_ms: self.view_offset,
            last_viewed_at: self
                .last_viewed_at
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
            rating: self.rating,
            grandparent_title: self.grandparent_title,
            parent_title: self.parent_title,
            parent_index: self.parent_index,
            index: self.index,
            media: self.media.into_iter().map(MediaEntry::into_format).collect(),
        }
    }
}

impl MediaEntry {
    fn into_format(self) -> MediaFormat {
        MediaFormat {
            id: self.id,
            duration_ms: self.duration,
            bitrate: self.bitrate,
            width: self.width,
            height: self.height,
            aspect_ratio: self.aspect_ratio,
            audio_channels: self.audio_channels,
            audio_codec: self.audio_codec,
            video_codec: self.video_codec,
            video_resolution: self.video_resolution,
            container: self.container,
            video_frame_rate: self.video_frame_rate,
            parts: self.parts.into_iter().map(PartEntry::into_part).collect(),
        }
    }
}

impl PartEntry {
    fn into_part(self) -> MediaPart {
        MediaPart {
            id: self.id,
            key: self.key,
            duration_ms: self.duration,
            file: self.file,
            size: self.size,
            container: self.container,
            streams: self
                .streams
                .into_iter()
                .map(StreamEntry::into_stream)
                .collect(),
        }
    }
}

impl StreamEntry {
    fn into_stream(self) -> MediaStream {
        MediaStream {
            id: self.id,
            kind: StreamKind::from_wire(self.stream_type),
            codec: self.codec,
            index: self.index,
            bitrate: self.bitrate,
            language: self.language,
            language_code: self.language_code,
            title: self.title,
            selected: self.selected == Some(true),
        }
    }
}

fn server_from_identity(payload: IdentityResponse, base_url: &str) -> Result<Server, ApiError> {
    let parsed = Url::parse(base_url)
        .map_err(|e| ApiError::Malformed(format!("invalid server url {base_url}: {e}")))?;
    let address = parsed.host_str().unwrap_or_default().to_string();
    let port = parsed.port_or_known_default().unwrap_or(32400);
    let uri = base_url.trim_end_matches('/').to_string();

    Ok(Server {
        id: payload.machine_identifier,
        name: payload.friendly_name.unwrap_or_else(|| uri.clone()),
        address: address.clone(),
        port,
        version: payload.version.unwrap_or_else(|| "Unknown".to_string()),
        access_token: None,
        local: true,
        connections: vec![Connection {
            protocol: parsed.scheme().to_string(),
            address,
            port,
            uri,
            local: true,
        }],
    })
}

/// Direct-play URL for a media item: the first format's first part,
/// with the server's access token appended as a query parameter. No
/// bitrate negotiation, no fallback to alternate connections.
pub fn stream_url(server: &Server, item: &MediaItem) -> Option<String> {
    let part = item.media.first()?.parts.first()?;
    let token = server.access_token.as_deref().unwrap_or_default();
    Some(format!(
        "{}{}?X-Plex-Token={}",
        server.base_url(),
        part.key,
        token
    ))
}

/// HTTP client for a Plex-style media server.
///
/// Stateless with respect to servers: every request takes the target
/// server as an argument, so one instance serves discovery probes and
/// the selected connection alike.
pub struct PlexApi {
    client: Client,
    client_id: String,
}

impl PlexApi {
    pub fn new() -> Self {
        Self::with_client_id(Uuid::new_v4().to_string())
    }

    /// Use a fixed client identifier (normally persisted per install so
    /// the server sees one device across sessions)
    pub fn with_client_id(client_id: String) -> Self {
        Self {
            client: Client::new(),
            client_id,
        }
    }

    /// Client-identification headers sent with every request; the access
    /// token rides along as a header when the server carries one.
    fn build_headers(&self, token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&self.client_id) {
            headers.insert("X-Plex-Client-Identifier", value);
        }
        headers.insert("X-Plex-Product", HeaderValue::from_static(CLIENT_PRODUCT));
        headers.insert("X-Plex-Version", HeaderValue::from_static(CLIENT_VERSION));
        headers.insert("X-Plex-Device", HeaderValue::from_static(CLIENT_DEVICE));
        headers.insert("X-Plex-Platform", HeaderValue::from_static(CLIENT_PLATFORM));
        if let Some(token) = token {
            if let Ok(value) = HeaderValue::from_str(token) {
                headers.insert("X-Plex-Token", value);
            }
        }
        headers
    }

    /// Fetch a MediaContainer envelope from `path` relative to the server base
    async fn get_container(
        &self,
        server: &Server,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<MediaContainer, ApiError> {
        let url = format!("{}{}", server.base_url(), path);
        let response = self
            .client
            .get(&url)
            .headers(self.build_headers(server.access_token.as_deref()))
            .query(query)
            .send()
            .await
            .map_err(ApiError::Transport)?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }

        let envelope: ContainerResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Malformed(e.to_string()))?;
        Ok(envelope.container)
    }

    /// Probe `base_url` for a server identity. Used by discovery, so the
    /// timeout is short and per-request.
    pub async fn identity(&self, base_url: &str, timeout: Duration) -> Result<Server, ApiError> {
        let url = format!("{}/identity", base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .headers(self.build_headers(None))
            .timeout(timeout)
            .send()
            .await
            .map_err(ApiError::Transport)?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }

        let payload: IdentityResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Malformed(e.to_string()))?;
        server_from_identity(payload, base_url)
    }

    /// Refresh the server's friendly name and version from its root
    /// endpoint. Failures leave the input unchanged; this is a cosmetic
    /// backfill, not a connectivity check.
    pub async fn server_details(&self, server: &Server) -> Server {
        let url = server.base_url();
        let response = match self
            .client
            .get(&url)
            .headers(self.build_headers(server.access_token.as_deref()))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("failed to fetch details for {}: {e}", server.name);
                return server.clone();
            }
        };

        if !response.status().is_success() {
            tracing::warn!(
                "server {} answered HTTP {} on details fetch",
                server.name,
                response.status()
            );
            return server.clone();
        }

        match response.json::<ServerRootResponse>().await {
            Ok(payload) => {
                let mut updated = server.clone();
                if let Some(name) = payload.friendly_name {
                    updated.name = name;
                }
                if let Some(version) = payload.version {
                    updated.version = version;
                }
                updated
            }
            Err(e) => {
                tracing::warn!("malformed details payload from {}: {e}", server.name);
                server.clone()
            }
        }
    }
}

impl Default for PlexApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaServerApi for PlexApi {
    async fn libraries(&self, server: &Server) -> Result<Vec<Library>, ApiError> {
        let base_url = server.base_url();
        let container = self.get_container(server, "/library/sections", &[]).await?;
        Ok(container
            .directories
            .into_iter()
            .map(|dir| dir.into_library(&base_url))
            .collect())
    }

    async fn recently_added(
        &self,
        server: &Server,
        limit: usize,
    ) -> Result<Vec<MediaItem>, ApiError> {
        let base_url = server.base_url();
        let container = self
            .get_container(
                server,
                "/library/recentlyAdded",
                &[("limit", limit.to_string())],
            )
            .await?;
        Ok(container
            .metadata
            .into_iter()
            .map(|item| item.into_media_item(&base_url))
            .collect())
    }

    async fn library_content(
        &self,
        server: &Server,
        library_id: &str,
    ) -> Result<Vec<MediaItem>, ApiError> {
        let base_url = server.base_url();
        let container = self
            .get_container(server, &format!("/library/sections/{library_id}/all"), &[])
            .await?;
        Ok(container
            .metadata
            .into_iter()
            .map(|item| item.into_media_item(&base_url))
            .collect())
    }

    async fn media_details(
        &self,
        server: &Server,
        media_id: &str,
    ) -> Result<MediaItem, ApiError> {
        let base_url = server.base_url();
        let container = self
            .get_container(server, &format!("/library/metadata/{media_id}"), &[])
            .await
            .map_err(|e| match e {
                ApiError::Status(status) if status == StatusCode::NOT_FOUND => ApiError::NotFound,
                other => other,
            })?;
        container
            .metadata
            .into_iter()
            .next()
            .map(|item| item.into_media_item(&base_url))
            .ok_or(ApiError::NotFound)
    }
}
