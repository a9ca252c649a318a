//! Integration tests exercising the API client, discovery and catalog
//! against a mock media server.

use plexling::{
    ApiError, Catalog, Connection, LibraryKind, MediaKind, MediaServerApi, PlexApi,
    ProbeDiscovery, Server, ServerDiscovery,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn server_for(uri: &str, token: Option<&str>) -> Server {
    Server {
        id: "machine-1".to_string(),
        name: "Den".to_string(),
        address: "127.0.0.1".to_string(),
        port: 32400,
        version: "1.40".to_string(),
        access_token: token.map(str::to_string),
        local: true,
        connections: vec![Connection {
            protocol: "http".to_string(),
            address: "127.0.0.1".to_string(),
            port: 32400,
            uri: uri.to_string(),
            local: true,
        }],
    }
}

fn identity_json() -> serde_json::Value {
    json!({
        "machineIdentifier": "abc123",
        "version": "1.40.1",
        "friendlyName": "Den"
    })
}

fn sections_json() -> serde_json::Value {
    json!({
        "MediaContainer": {
            "Directory": [
                {"key": "1", "title": "Movies", "type": "movie", "thumb": "/sections/1/thumb", "totalSize": 120},
                {"key": "2", "title": "TV Shows", "type": "show", "totalSize": 34},
                {"key": "3", "title": "Concerts", "type": "homevideo"}
            ]
        }
    })
}

fn metadata_json(rating_key: &str) -> serde_json::Value {
    json!({
        "MediaContainer": {
            "Metadata": [{
                "ratingKey": rating_key,
                "title": "Some Movie",
                "type": "movie",
                "year": 2010,
                "duration": 7_200_000,
                "Media": [{
                    "id": 1,
                    "videoCodec": "h264",
                    "Part": [{"id": 5, "key": "/library/parts/5"}]
                }]
            }]
        }
    })
}

#[tokio::test]
async fn discovery_keeps_only_answering_candidates() {
    let alive = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/identity"))
        .respond_with(ResponseTemplate::new(200).set_body_json(identity_json()))
        .mount(&alive)
        .await;

    let broken = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/identity"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&broken)
        .await;

    let slow = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/identity"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(identity_json())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&slow)
        .await;

    let discovery = ProbeDiscovery::new(Arc::new(PlexApi::new()))
        .with_candidates(vec![
            alive.uri(),
            broken.uri(),
            slow.uri(),
            // Nothing listens here at all
            "http://127.0.0.1:9".to_string(),
        ])
        .with_timeout(Duration::from_millis(500));

    let servers = discovery.discover().await;
    assert_eq!(servers.len(), 1);
    assert_eq!(servers[0].id, "abc123");
    assert_eq!(servers[0].name, "Den");
    assert_eq!(servers[0].version, "1.40.1");
    assert_eq!(servers[0].connections[0].uri, alive.uri());
}

#[tokio::test]
async fn libraries_are_fetched_and_mapped() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/library/sections"))
        .and(header("X-Plex-Token", "ABC"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sections_json()))
        .mount(&mock_server)
        .await;

    let api = PlexApi::new();
    let server = server_for(&mock_server.uri(), Some("ABC"));
    let libraries = api.libraries(&server).await.unwrap();

    assert_eq!(libraries.len(), 3);
    assert_eq!(libraries[0].id, "1");
    assert_eq!(libraries[0].kind, LibraryKind::Movie);
    assert_eq!(
        libraries[0].thumb.as_deref(),
        Some(format!("{}/sections/1/thumb", mock_server.uri()).as_str())
    );
    assert_eq!(libraries[0].count, 120);
    assert_eq!(libraries[1].kind, LibraryKind::Show);
    assert_eq!(libraries[1].count, 34);
    // Unrecognized section types degrade instead of failing the listing
    assert_eq!(libraries[2].kind, LibraryKind::Unknown);
    assert_eq!(libraries[2].count, 0);
}

#[tokio::test]
async fn recently_added_passes_limit() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/library/recentlyAdded"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(metadata_json("42")))
        .mount(&mock_server)
        .await;

    let api = PlexApi::new();
    let server = server_for(&mock_server.uri(), None);
    let items = api.recently_added(&server, 5).await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "42");
    assert_eq!(items[0].kind, MediaKind::Movie);
    assert_eq!(items[0].duration_ms, 7_200_000);
}

#[tokio::test]
async fn empty_library_yields_empty_list_not_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/library/sections/999/all"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"MediaContainer": {"Metadata": []}})),
        )
        .mount(&mock_server)
        .await;

    let api = PlexApi::new();
    let server = server_for(&mock_server.uri(), None);
    let items = api.library_content(&server, "999").await.unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn media_details_distinguishes_not_found() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/library/metadata/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(metadata_json("1")))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/library/metadata/2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let api = PlexApi::new();
    let server = server_for(&mock_server.uri(), None);

    let found = api.media_details(&server, "1").await.unwrap();
    assert_eq!(found.id, "1");
    assert_eq!(found.media[0].parts[0].key, "/library/parts/5");

    let missing = api.media_details(&server, "2").await;
    assert!(matches!(missing, Err(ApiError::NotFound)));
}

#[tokio::test]
async fn catalog_degrades_on_server_errors() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let server = server_for(&mock_server.uri(), None);
    let catalog = Catalog::new(Arc::new(PlexApi::new()));

    assert!(catalog.refresh_libraries(&server).await.is_empty());
    assert!(catalog.refresh_recent(&server, 20).await.is_empty());
    assert!(catalog.fetch_library_content(&server, "1").await.is_empty());
    assert!(catalog.fetch_media_details(&server, "1").await.is_none());
}

#[tokio::test]
async fn catalog_end_to_end_browse_flow() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/library/sections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sections_json()))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/library/sections/1/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(metadata_json("7")))
        .mount(&mock_server)
        .await;

    let server = server_for(&mock_server.uri(), Some("ABC"));
    let catalog = Catalog::new(Arc::new(PlexApi::new()));

    catalog.select_server(server.clone()).await;
    let libraries = catalog.refresh_libraries(&server).await;
    assert_eq!(libraries.len(), 3);

    let items = catalog.fetch_library_content(&server, &libraries[0].id).await;
    assert_eq!(items.len(), 1);

    let url = plexling::stream_url(&server, &items[0]).unwrap();
    assert_eq!(
        url,
        format!("{}/library/parts/5?X-Plex-Token=ABC", mock_server.uri())
    );

    catalog.clear().await;
    assert!(catalog.selected_server().await.is_none());
    assert!(catalog.libraries().await.is_empty());
}

#[tokio::test]
async fn server_details_backfills_name_and_version() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"friendlyName": "Upstairs", "version": "1.41.0"})),
        )
        .mount(&mock_server)
        .await;

    let api = PlexApi::new();
    let mut server = server_for(&mock_server.uri(), None);
    server.name = "Manual Server".to_string();
    server.version = "Unknown".to_string();

    let refreshed = api.server_details(&server).await;
    assert_eq!(refreshed.name, "Upstairs");
    assert_eq!(refreshed.version, "1.41.0");
}

#[tokio::test]
async fn server_details_keeps_input_on_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let api = PlexApi::new();
    let server = server_for(&mock_server.uri(), None);
    let refreshed = api.server_details(&server).await;
    assert_eq!(refreshed, server);
}
