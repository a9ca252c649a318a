/// Domain model shared by the catalog store and the playback session
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reachable endpoint of a media server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub protocol: String,
    pub address: String,
    pub port: u16,
    pub uri: String,
    pub local: bool,
}

/// A remote media catalog/streaming endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub id: String,
    pub name: String,
    pub address: String,
    pub port: u16,
    pub version: String,
    pub access_token: Option<String>,
    pub local: bool,
    pub connections: Vec<Connection>,
}

impl Server {
    /// Base URI used for all API requests: the first connection endpoint,
    /// falling back to the address/port pair when no endpoint is recorded.
    pub fn base_url(&self) -> String {
        match self.connections.first() {
            Some(conn) => conn.uri.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.address, self.port),
        }
    }
}

/// Content kind of a library section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryKind {
    Movie,
    Show,
    Music,
    Photo,
    Unknown,
}

impl LibraryKind {
    /// Map the server's section type string; unrecognized kinds degrade
    /// to `Unknown` instead of failing the whole listing.
    pub fn from_wire(kind: &str) -> Self {
        match kind {
            "movie" => Self::Movie,
            "show" => Self::Show,
            "music" | "artist" => Self::Music,
            "photo" => Self::Photo,
            _ => Self::Unknown,
        }
    }
}

/// A named collection of media items of one kind, owned by a server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Library {
    pub id: String,
    pub title: String,
    pub kind: LibraryKind,
    pub thumb: Option<String>,
    pub art: Option<String>,
    pub count: u64,
}

/// Content kind of a playable/browsable item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Episode,
    Track,
    Photo,
    Unknown,
}

impl MediaKind {
    pub fn from_wire(kind: &str) -> Self {
        match kind {
            "movie" => Self::Movie,
            "episode" => Self::Episode,
            "track" => Self::Track,
            "photo" => Self::Photo,
            _ => Self::Unknown,
        }
    }
}

/// A playable/browsable unit (movie, episode, track, photo)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: String,
    pub title: String,
    pub kind: MediaKind,
    pub thumb: Option<String>,
    pub art: Option<String>,
    pub summary: Option<String>,
    pub year: Option<u32>,
    /// Total runtime in milliseconds
    pub duration_ms: u64,
    /// Last playback offset in milliseconds, when the item was partially watched
    pub view_offset_ms: Option<u64>,
    pub last_viewed_at: Option<DateTime<Utc>>,
    pub rating: Option<f32>,
    /// Show title for episodes
    pub grandparent_title: Option<String>,
    /// Season title for episodes
    pub parent_title: Option<String>,
    /// Season number
    pub parent_index: Option<u32>,
    /// Episode number
    pub index: Option<u32>,
    /// Encoding variants, in server order
    pub media: Vec<MediaFormat>,
}

/// One encoding variant of a media item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFormat {
    pub id: u64,
    pub duration_ms: Option<u64>,
    pub bitrate: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub aspect_ratio: Option<f64>,
    pub audio_channels: Option<u32>,
    pub audio_codec: Option<String>,
    pub video_codec: Option<String>,
    pub video_resolution: Option<String>,
    pub container: Option<String>,
    pub video_frame_rate: Option<String>,
    pub parts: Vec<MediaPart>,
}

/// One playable file segment of an encoding variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaPart {
    pub id: u64,
    /// Server-relative path to the raw byte stream
    pub key: String,
    pub duration_ms: Option<u64>,
    pub file: Option<String>,
    pub size: Option<u64>,
    pub container: Option<String>,
    pub streams: Vec<MediaStream>,
}

/// Track kind within a media part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
    Other,
}

impl StreamKind {
    pub fn from_wire(stream_type: u32) -> Self {
        match stream_type {
            1 => Self::Video,
            2 => Self::Audio,
            3 => Self::Subtitle,
            _ => Self::Other,
        }
    }
}

/// A single video/audio/subtitle track within a part.
///
/// The `selected` flag is advisory: the server marks at most its default
/// track per kind, and uniqueness is not enforced on this side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaStream {
    pub id: u64,
    pub kind: StreamKind,
    pub codec: Option<String>,
    pub index: Option<u32>,
    pub bitrate: Option<u64>,
    pub language: Option<String>,
    pub language_code: Option<String>,
    pub title: Option<String>,
    pub selected: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_kind_maps_wire_values() {
        assert_eq!(LibraryKind::from_wire("movie"), LibraryKind::Movie);
        assert_eq!(LibraryKind::from_wire("show"), LibraryKind::Show);
        assert_eq!(LibraryKind::from_wire("music"), LibraryKind::Music);
        assert_eq!(LibraryKind::from_wire("artist"), LibraryKind::Music);
        assert_eq!(LibraryKind::from_wire("photo"), LibraryKind::Photo);
        assert_eq!(LibraryKind::from_wire("homevideo"), LibraryKind::Unknown);
    }

    #[test]
    fn stream_kind_maps_numeric_types() {
        assert_eq!(StreamKind::from_wire(1), StreamKind::Video);
        assert_eq!(StreamKind::from_wire(2), StreamKind::Audio);
        assert_eq!(StreamKind::from_wire(3), StreamKind::Subtitle);
        assert_eq!(StreamKind::from_wire(99), StreamKind::Other);
    }

    #[test]
    fn base_url_prefers_first_connection() {
        let server = Server {
            id: "abc".into(),
            name: "Den".into(),
            address: "192.168.1.50".into(),
            port: 32400,
            version: "1.40".into(),
            access_token: None,
            local: true,
            connections: vec![
                Connection {
                    protocol: "http".into(),
                    address: "192.168.1.50".into(),
                    port: 32400,
                    uri: "http://192.168.1.50:32400/".into(),
                    local: true,
                },
                Connection {
                    protocol: "https".into(),
                    address: "example.com".into(),
                    port: 443,
                    uri: "https://example.com".into(),
                    local: false,
                },
            ],
        };
        assert_eq!(server.base_url(), "http://192.168.1.50:32400");
    }

    #[test]
    fn base_url_falls_back_to_address_and_port() {
        let server = Server {
            id: "abc".into(),
            name: "Den".into(),
            address: "10.0.0.2".into(),
            port: 32400,
            version: "1.40".into(),
            access_token: None,
            local: true,
            connections: Vec::new(),
        };
        assert_eq!(server.base_url(), "http://10.0.0.2:32400");
    }
}
