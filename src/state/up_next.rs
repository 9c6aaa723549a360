// src/state/up_next.rs
use crate::data::Graph;
use crate::player::EpisodePlayer;
use crate::podcast::PlayerEpisode;
use crate::state::observe::{self, Scope, StateChannel, signal};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpNextViewState {
    pub current: Option<PlayerEpisode>,
    pub queue: Vec<PlayerEpisode>,
    pub playing: bool,
}

/// State holder for the up-next screen, projecting the player's queue.
pub struct UpNextViewModel {
    scope: Scope,
    episode_player: Arc<EpisodePlayer>,
    ui_state: StateChannel<UpNextViewState>,
}

impl UpNextViewModel {
    pub fn new(graph: &Graph) -> Self {
        let scope = Scope::new();
        let playback_rx = graph.episode_player.state();

        let inputs = vec![signal(playback_rx.clone())];
        let ui_state =
            observe::combine(&scope, UpNextViewState::default(), inputs, move || {
                let playback = playback_rx.borrow().clone();
                UpNextViewState {
                    current: playback.current,
                    queue: playback.queue,
                    playing: playback.playing,
                }
            });

        Self { scope, episode_player: Arc::clone(&graph.episode_player), ui_state }
    }

    pub fn subscribe(&self) -> watch::Receiver<UpNextViewState> {
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

    pub fn on_clear_queue(&self) {
        let player = Arc::clone(&self.episode_player);
        self.scope.spawn(async move {
            player.clear_queue().await;
        });
    }
}
