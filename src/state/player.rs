// src/state/player.rs
use crate::data::Graph;
use crate::data::episode_store::EpisodeStore;
use crate::data::podcast_store::PodcastStore;
use crate::player::EpisodePlayer;
use crate::podcast::{Episode, EpisodeUri, Podcast};
use crate::state::observe::Scope;
use log::warn;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerUiState {
    pub title: String,
    pub sub_title: String,
    pub duration: Option<Duration>,
    pub podcast_name: String,
    pub author: String,
    pub summary: String,
    pub podcast_image_url: String,
}

impl PlayerUiState {
    /// Shown when the route carries no episode, and when a lookup comes back
    /// empty.
    pub fn nothing_to_play() -> Self {
        Self {
            title: String::new(),
            sub_title: String::new(),
            duration: Some(Duration::ZERO),
            podcast_name: "Nothing to play".to_string(),
            author: String::new(),
            summary: String::new(),
            podcast_image_url: String::new(),
        }
    }

    fn for_episode(episode: &Episode, podcast: &Podcast) -> Self {
        Self {
            title: episode.title().to_string(),
            sub_title: podcast.title().to_string(),
            duration: episode.duration(),
            podcast_name: podcast.title().to_string(),
            author: episode.author().or(podcast.author()).unwrap_or_default().to_string(),
            summary: episode.summary().unwrap_or_default().to_string(),
            podcast_image_url: podcast.image_url().unwrap_or_default().to_string(),
        }
    }
}

/// State holder for the player screen. Resolves the navigation argument once
/// at construction: episode by URI, then that episode's podcast by URI. The
/// channel stays `None` until the lookups land.
pub struct PlayerViewModel {
    scope: Scope,
    episode_player: Arc<EpisodePlayer>,
    ui_state: Arc<watch::Sender<Option<PlayerUiState>>>,
}

impl PlayerViewModel {
    pub fn new(graph: &Graph, episode_uri: Option<EpisodeUri>) -> Self {
        let scope = Scope::new();
        let (ui_state, _) = watch::channel(None);
        let ui_state = Arc::new(ui_state);

        let episode_store = Arc::clone(&graph.episode_store);
        let podcast_store = Arc::clone(&graph.podcast_store);
        let publish = Arc::clone(&ui_state);
        scope.spawn(async move {
            let state = match episode_uri {
                Some(uri) => resolve(&episode_store, &podcast_store, &uri).await,
                None => PlayerUiState::nothing_to_play(),
            };
            publish.send_replace(Some(state));
        });

        Self { scope, episode_player: Arc::clone(&graph.episode_player), ui_state }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<PlayerUiState>> {
        self.ui_state.subscribe()
    }

    // ===== intent handlers

    pub fn on_toggle_play(&self) {
        let player = Arc::clone(&self.episode_player);
        self.scope.spawn(async move {
            player.toggle_play().await;
        });
    }

    pub fn on_next_episode(&self) {
        let player = Arc::clone(&self.episode_player);
        self.scope.spawn(async move {
            player.next_episode().await;
        });
    }
}

async fn resolve(
    episode_store: &EpisodeStore,
    podcast_store: &PodcastStore,
    uri: &EpisodeUri,
) -> PlayerUiState {
    let Some(episode) = episode_store.episode_by_uri(uri).await else {
        warn!("player: no episode for uri '{uri}'");
        return PlayerUiState::nothing_to_play();
    };
    let Some(podcast) = podcast_store.podcast_by_uri(episode.podcast_uri()).await else {
        warn!("player: no podcast for uri '{}'", episode.podcast_uri());
        return PlayerUiState::nothing_to_play();
    };
    PlayerUiState::for_episode(&episode, &podcast)
}
