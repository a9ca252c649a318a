//! Plexling - client for Plex-style home media servers
#![recursion_limit = "256"]

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod discovery;
pub mod models;
pub mod playback;

pub use api::{stream_url, ApiError, MediaServerApi, PlexApi};
pub use cache::CatalogSnapshot;
pub use catalog::Catalog;
pub use config::Config;
pub use discovery::{manual_server, ProbeDiscovery, ServerDiscovery};
pub use models::{
    Connection, Library, LibraryKind, MediaFormat, MediaItem, MediaKind, MediaPart, MediaStream,
    Server, StreamKind,
};
pub use playback::{PlaybackSession, SessionState, SurfaceEvent};
