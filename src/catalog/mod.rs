/// Catalog/session store: single source of truth for server connectivity
/// and content inventory.
use crate::api::{ApiError, MediaServerApi};
use crate::cache::CatalogSnapshot;
use crate::discovery::ServerDiscovery;
use crate::models::{Library, MediaItem, Server};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct CatalogState {
    servers: Vec<Server>,
    selected: Option<Server>,
    libraries: Vec<Library>,
    recent: Vec<MediaItem>,
    popular: Vec<MediaItem>,
    // Monotonic generations: a refresh commits only if its generation is
    // still current when the fetch completes, so a slow stale response
    // never overwrites newer state.
    servers_gen: u64,
    libraries_gen: u64,
    recent_gen: u64,
    popular_gen: u64,
}

/// Explicitly-owned store over an injected server API. Shared access is
/// the caller's concern; internally a mutex is held only across state
/// reads and writes, never across a network await.
pub struct Catalog {
    api: Arc<dyn MediaServerApi>,
    state: Mutex<CatalogState>,
}

impl Catalog {
    pub fn new(api: Arc<dyn MediaServerApi>) -> Self {
        Self {
            api,
            state: Mutex::new(CatalogState::default()),
        }
    }

    /// Run a discovery sweep and replace the known server list
    pub async fn discover(&self, discovery: &dyn ServerDiscovery) -> Vec<Server> {
        let gen = {
            let mut state = self.state.lock().await;
            state.servers_gen += 1;
            state.servers_gen
        };

        let found = discovery.discover().await;

        let mut state = self.state.lock().await;
        if state.servers_gen != gen {
            tracing::debug!("discarding stale discovery result");
            return state.servers.clone();
        }
        tracing::info!("discovered {} server(s)", found.len());
        state.servers = found;
        state.servers.clone()
    }

    /// Register a manually-entered server alongside discovered ones
    pub async fn add_server(&self, server: Server) {
        let mut state = self.state.lock().await;
        state.servers.push(server);
    }

    /// Make `server` the active connection target. Exclusive: replaces
    /// any previous selection. Dependent data is not fetched here.
    pub async fn select_server(&self, server: Server) {
        let mut state = self.state.lock().await;
        state.selected = Some(server);
    }

    pub async fn selected_server(&self) -> Option<Server> {
        self.state.lock().await.selected.clone()
    }

    pub async fn servers(&self) -> Vec<Server> {
        self.state.lock().await.servers.clone()
    }

    pub async fn libraries(&self) -> Vec<Library> {
        self.state.lock().await.libraries.clone()
    }

    pub async fn recent_media(&self) -> Vec<MediaItem> {
        self.state.lock().await.recent.clone()
    }

    pub async fn popular_media(&self) -> Vec<MediaItem> {
        self.state.lock().await.popular.clone()
    }

    /// Fetch and wholesale-replace the library list. Transport failure
    /// degrades to an empty list; the error never reaches the caller.
    pub async fn refresh_libraries(&self, server: &Server) -> Vec<Library> {
        let gen = {
            let mut state = self.state.lock().await;
            state.libraries_gen += 1;
            state.libraries_gen
        };

        let fetched = match self.api.libraries(server).await {
            Ok(libraries) => libraries,
            Err(e) => {
                tracing::warn!("failed to refresh libraries: {e}");
                Vec::new()
            }
        };

        let mut state = self.state.lock().await;
        if state.libraries_gen != gen {
            tracing::debug!("discarding stale library refresh");
            return state.libraries.clone();
        }
        state.libraries = fetched;
        state.libraries.clone()
    }

    /// Replace the recently-added list; same degrade-to-empty contract
    pub async fn refresh_recent(&self, server: &Server, limit: usize) -> Vec<MediaItem> {
        let gen = {
            let mut state = self.state.lock().await;
            state.recent_gen += 1;
            state.recent_gen
        };

        let fetched = match self.api.recently_added(server, limit).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("failed to refresh recent media: {e}");
                Vec::new()
            }
        };

        let mut state = self.state.lock().await;
        if state.recent_gen != gen {
            tracing::debug!("discarding stale recent-media refresh");
            return state.recent.clone();
        }
        state.recent = fetched;
        state.recent.clone()
    }

    /// Replace the popular list. Fed from the same recently-added feed;
    /// there is no dedicated popularity endpoint on this wire surface.
    pub async fn refresh_popular(&self, server: &Server, limit: usize) -> Vec<MediaItem> {
        let gen = {
            let mut state = self.state.lock().await;
            state.popular_gen += 1;
            state.popular_gen
        };

        let fetched = match self.api.recently_added(server, limit).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("failed to refresh popular media: {e}");
                Vec::new()
            }
        };

        let mut state = self.state.lock().await;
        if state.popular_gen != gen {
            tracing::debug!("discarding stale popular-media refresh");
            return state.popular.clone();
        }
        state.popular = fetched;
        state.popular.clone()
    }

    /// Full contents of one library. Pass-through: the result is not
    /// stored. An unknown library id yields an empty list, not an error.
    pub async fn fetch_library_content(&self, server: &Server, library_id: &str) -> Vec<MediaItem> {
        match self.api.library_content(server, library_id).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("failed to fetch library {library_id}: {e}");
                Vec::new()
            }
        }
    }

    /// Detail record for one item; absent on not-found and on transport
    /// failure, distinguished only in the log.
    pub async fn fetch_media_details(&self, server: &Server, media_id: &str) -> Option<MediaItem> {
        match self.api.media_details(server, media_id).await {
            Ok(item) => Some(item),
            Err(ApiError::NotFound) => {
                tracing::debug!("media {media_id} not found");
                None
            }
            Err(e) => {
                tracing::warn!("failed to fetch media {media_id}: {e}");
                None
            }
        }
    }

    /// Copy of the content lists for the offline snapshot cache
    pub async fn snapshot(&self) -> CatalogSnapshot {
        let state = self.state.lock().await;
        CatalogSnapshot {
            libraries: state.libraries.clone(),
            recent: state.recent.clone(),
            popular: state.popular.clone(),
        }
    }

    /// Seed the content lists from a cached snapshot, e.g. before the
    /// first refresh lands. Counts as a commit: any in-flight refresh
    /// started earlier is invalidated.
    pub async fn restore(&self, snapshot: CatalogSnapshot) {
        let mut state = self.state.lock().await;
        state.libraries = snapshot.libraries;
        state.recent = snapshot.recent;
        state.popular = snapshot.popular;
        state.libraries_gen += 1;
        state.recent_gen += 1;
        state.popular_gen += 1;
    }

    /// Drop the selection and all derived content. Never partial: one
    /// lock window clears everything and invalidates in-flight refreshes.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.selected = None;
        state.libraries.clear();
        state.recent.clear();
        state.popular.clear();
        state.servers_gen += 1;
        state.libraries_gen += 1;
        state.recent_gen += 1;
        state.popular_gen += 1;
    }
}
