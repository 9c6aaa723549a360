// src/player.rs
//
// Playback collaborator. This crate owns the queue and transport state only;
// audio decoding and output sit behind the platform media session, outside
// this repository.
use crate::podcast::PlayerEpisode;
use log::info;
use tokio::sync::watch;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackState {
    pub current: Option<PlayerEpisode>,
    pub queue: Vec<PlayerEpisode>,
    pub playing: bool,
}

pub struct EpisodePlayer {
    state: watch::Sender<PlaybackState>,
}

impl EpisodePlayer {
    pub fn new() -> Self {
        let (state, _) = watch::channel(PlaybackState::default());
        Self { state }
    }

    pub fn state(&self) -> watch::Receiver<PlaybackState> {
        self.state.subscribe()
    }

    /// Appends to the queue, dropping duplicates of an episode already
    /// queued or playing.
    pub async fn add_to_queue(&self, episode: PlayerEpisode) {
        self.state.send_if_modified(|state| {
            let already_current =
                state.current.as_ref().is_some_and(|current| current.uri == episode.uri);
            let already_queued = state.queue.iter().any(|queued| queued.uri == episode.uri);
            if already_current || already_queued {
                return false;
            }
            info!("player: queued '{}'", episode.title);
            state.queue.push(episode);
            true
        });
    }

    /// Starts the given episode immediately, keeping the queue as is.
    pub async fn play_episode(&self, episode: PlayerEpisode) {
        info!("player: playing '{}'", episode.title);
        self.state.send_modify(|state| {
            state.queue.retain(|queued| queued.uri != episode.uri);
            state.current = Some(episode);
            state.playing = true;
        });
    }

    /// Replaces current playback with the list: first episode plays, the
    /// rest become the queue.
    pub async fn play_episodes(&self, episodes: Vec<PlayerEpisode>) {
        let mut episodes = episodes.into_iter();
        let Some(first) = episodes.next() else {
            return;
        };
        info!("player: playing '{}' with queued followers", first.title);
        self.state.send_modify(|state| {
            state.current = Some(first);
            state.queue = episodes.collect();
            state.playing = true;
        });
    }

    pub async fn play(&self) {
        self.state.send_if_modified(|state| {
            if state.playing {
                return false;
            }
            if state.current.is_none() {
                let Some(next) = first_queued(state) else {
                    return false;
                };
                state.current = Some(next);
            }
            state.playing = true;
            true
        });
    }

    pub async fn pause(&self) {
        self.state.send_if_modified(|state| {
            if !state.playing {
                return false;
            }
            state.playing = false;
            true
        });
    }

    pub async fn toggle_play(&self) {
        if self.state.borrow().playing {
            self.pause().await;
        } else {
            self.play().await;
        }
    }

    /// Advances to the next queued episode; at the end of the queue playback
    /// stops with no current episode.
    pub async fn next_episode(&self) {
        self.state.send_modify(|state| {
            match first_queued(state) {
                Some(next) => {
                    info!("player: advancing to '{}'", next.title);
                    state.current = Some(next);
                }
                None => {
                    info!("player: queue drained, stopping");
                    state.current = None;
                    state.playing = false;
                }
            }
        });
    }

    pub async fn clear_queue(&self) {
        self.state.send_if_modified(|state| {
            if state.queue.is_empty() {
                return false;
            }
            state.queue.clear();
            true
        });
    }
}

fn first_queued(state: &mut PlaybackState) -> Option<PlayerEpisode> {
    if state.queue.is_empty() {
        None
    } else {
        Some(state.queue.remove(0))
    }
}

impl Default for EpisodePlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::podcast::EpisodeUri;

    fn episode(uri: &str) -> PlayerEpisode {
        PlayerEpisode {
            uri: EpisodeUri::new(uri),
            title: format!("Episode {uri}"),
            podcast_name: "Feed".to_string(),
            author: String::new(),
            summary: String::new(),
            duration: None,
            podcast_image_url: String::new(),
        }
    }

    #[tokio::test]
    async fn test_queue_preserves_order_and_dedupes() {
        let player = EpisodePlayer::new();
        player.add_to_queue(episode("e1")).await;
        player.add_to_queue(episode("e2")).await;
        player.add_to_queue(episode("e1")).await;

        let state = player.state().borrow().clone();
        let uris: Vec<&str> = state.queue.iter().map(|e| e.uri.as_str()).collect();
        assert_eq!(uris, vec!["e1", "e2"]);
    }

    #[tokio::test]
    async fn test_play_pops_queue_when_nothing_is_current() {
        let player = EpisodePlayer::new();
        player.add_to_queue(episode("e1")).await;
        player.add_to_queue(episode("e2")).await;
        player.play().await;

        let state = player.state().borrow().clone();
        assert!(state.playing);
        assert_eq!(state.current.as_ref().unwrap().uri.as_str(), "e1");
        assert_eq!(state.queue.len(), 1);
    }

    #[tokio::test]
    async fn test_next_episode_advances_then_stops_at_queue_end() {
        let player = EpisodePlayer::new();
        player.play_episodes(vec![episode("e1"), episode("e2")]).await;

        player.next_episode().await;
        let state = player.state().borrow().clone();
        assert_eq!(state.current.as_ref().unwrap().uri.as_str(), "e2");
        assert!(state.queue.is_empty());
        assert!(state.playing);

        player.next_episode().await;
        let state = player.state().borrow().clone();
        assert!(state.current.is_none());
        assert!(!state.playing);
    }

    #[tokio::test]
    async fn test_toggle_play_flips_transport() {
        let player = EpisodePlayer::new();
        player.play_episode(episode("e1")).await;
        assert!(player.state().borrow().playing);

        player.toggle_play().await;
        assert!(!player.state().borrow().playing);
        player.toggle_play().await;
        assert!(player.state().borrow().playing);
    }

    #[tokio::test]
    async fn test_state_channel_notifies_on_queue_change() {
        let player = EpisodePlayer::new();
        let mut state_rx = player.state();
        state_rx.borrow_and_update();

        player.add_to_queue(episode("e1")).await;
        state_rx.changed().await.unwrap();
        assert_eq!(state_rx.borrow_and_update().queue.len(), 1);
    }
}
