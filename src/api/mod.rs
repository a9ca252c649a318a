pub mod plex;
/// Server API boundary: the trait the catalog store and playback session
/// are written against, plus the error taxonomy shared by every request.
pub use plex::{stream_url, PlexApi};

use crate::models::{Library, MediaItem, Server};
use async_trait::async_trait;
use thiserror::Error;

/// Error type for server API operations
#[derive(Debug, Error)]
pub enum ApiError {
    /// Timeout, connection refused, DNS failure
    #[error("transport error: {0}")]
    Transport(reqwest::Error),

    /// The server answered with a non-success status
    #[error("server returned HTTP {0}")]
    Status(reqwest::StatusCode),

    /// The response body did not have the expected shape
    #[error("unexpected response shape: {0}")]
    Malformed(String),

    /// The requested entity does not exist on the server
    #[error("not found")]
    NotFound,
}

/// Core trait a media server backend must implement.
///
/// All methods are plain fetches against the given server; they carry no
/// client-side state, so the same instance serves any number of servers.
#[async_trait]
pub trait MediaServerApi: Send + Sync {
    /// List the server's library sections
    async fn libraries(&self, server: &Server) -> Result<Vec<Library>, ApiError>;

    /// Most recently added items across all libraries
    async fn recently_added(
        &self,
        server: &Server,
        limit: usize,
    ) -> Result<Vec<MediaItem>, ApiError>;

    /// Full contents of one library section
    async fn library_content(
        &self,
        server: &Server,
        library_id: &str,
    ) -> Result<Vec<MediaItem>, ApiError>;

    /// Detail record for a single item; `ApiError::NotFound` when the
    /// server has no such item
    async fn media_details(&self, server: &Server, media_id: &str)
        -> Result<MediaItem, ApiError>;
}
