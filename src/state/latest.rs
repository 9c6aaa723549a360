// src/state/latest.rs
use crate::data::Graph;
use crate::player::EpisodePlayer;
use crate::podcast::{EpisodeToPodcast, PlayerEpisode};
use crate::state::observe::{self, Scope, StateChannel, signal};
use rand::seq::SliceRandom;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatestEpisodeViewState {
    pub library_episodes: Vec<EpisodeToPodcast>,
}

/// State holder for the latest-episodes screen: one input channel, the
/// newest episode of every followed podcast.
pub struct LatestEpisodeViewModel {
    scope: Scope,
    episode_player: Arc<EpisodePlayer>,
    ui_state: StateChannel<LatestEpisodeViewState>,
}

impl LatestEpisodeViewModel {
    pub fn new(graph: &Graph) -> Self {
        let scope = Scope::new();
        let latest_rx = graph.latest_followed_episodes_use_case.invoke(&scope.handle());

        let inputs = vec![signal(latest_rx.clone())];
        let ui_state = observe::combine(
            &scope,
            LatestEpisodeViewState::default(),
            inputs,
            move || LatestEpisodeViewState { library_episodes: latest_rx.borrow().clone() },
        );

        Self { scope, episode_player: Arc::clone(&graph.episode_player), ui_state }
    }

    pub fn subscribe(&self) -> watch::Receiver<LatestEpisodeViewState> {
        self.ui_state.subscribe()
    }

    // ===== intent handlers

    /// Plays the list as given: first episode starts, the rest queue up.
    pub fn on_play_episodes(&self, episodes: &[EpisodeToPodcast]) {
        let list: Vec<PlayerEpisode> = episodes.iter().map(PlayerEpisode::from).collect();
        let player = Arc::clone(&self.episode_player);
        self.scope.spawn(async move {
            player.play_episodes(list).await;
        });
    }

    pub fn on_shuffle_episodes(&self, episodes: &[EpisodeToPodcast]) {
        let mut list: Vec<PlayerEpisode> = episodes.iter().map(PlayerEpisode::from).collect();
        list.shuffle(&mut rand::thread_rng());
        let player = Arc::clone(&self.episode_player);
        self.scope.spawn(async move {
            player.play_episodes(list).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::repository::{FakeSource, FeedSnapshot};
    use crate::podcast::{Episode, EpisodeUri, Podcast, PodcastUri};
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeSet;
    use std::time::Duration;
    use tokio::time::timeout;

    fn snapshot(uri: &str, title: &str, day: u32) -> FeedSnapshot {
        let podcast_uri = PodcastUri::new(uri);
        FeedSnapshot {
            podcast: Podcast::new(podcast_uri.clone(), title.to_string(), None, None, None, vec![]),
            episodes: vec![Episode::new(
                EpisodeUri::new(&format!("{uri}#latest")),
                podcast_uri,
                format!("{title} latest"),
                None,
                None,
                Utc.with_ymd_and_hms(2024, 5, day, 8, 0, 0).unwrap(),
                None,
            )],
            followed: true,
        }
    }

    async fn settled_state(view_model: &LatestEpisodeViewModel) -> LatestEpisodeViewState {
        let mut state_rx = view_model.subscribe();
        timeout(Duration::from_secs(2), async {
            loop {
                {
                    let state = state_rx.borrow_and_update();
                    if state.library_episodes.len() == 2 {
                        return state.clone();
                    }
                }
                state_rx.changed().await.expect("latest state channel closed");
            }
        })
        .await
        .expect("timed out waiting for latest episodes")
    }

    fn test_graph() -> Graph {
        Graph::new(Arc::new(FakeSource::with_snapshots(vec![
            snapshot("http://a.example/feed", "Alpha", 2),
            snapshot("http://b.example/feed", "Beta", 8),
        ])))
    }

    #[tokio::test]
    async fn test_state_lists_latest_followed_episodes_newest_first() {
        let graph = test_graph();
        graph.podcast_repository.update_podcasts(false).await.unwrap();

        let view_model = LatestEpisodeViewModel::new(&graph);
        let state = settled_state(&view_model).await;
        assert_eq!(state.library_episodes[0].episode.title(), "Beta latest");
        assert_eq!(state.library_episodes[1].episode.title(), "Alpha latest");
    }

    #[tokio::test]
    async fn test_play_episodes_fills_player_in_order() {
        let graph = test_graph();
        graph.podcast_repository.update_podcasts(false).await.unwrap();
        let view_model = LatestEpisodeViewModel::new(&graph);
        let state = settled_state(&view_model).await;

        view_model.on_play_episodes(&state.library_episodes);

        let mut player_rx = graph.episode_player.state();
        let playback = timeout(Duration::from_secs(2), async {
            loop {
                {
                    let playback = player_rx.borrow_and_update();
                    if playback.current.is_some() {
                        return playback.clone();
                    }
                }
                player_rx.changed().await.unwrap();
            }
        })
        .await
        .expect("play intent never reached the player");

        assert!(playback.playing);
        assert_eq!(playback.current.unwrap().title, "Beta latest");
        assert_eq!(playback.queue.len(), 1);
        assert_eq!(playback.queue[0].title, "Alpha latest");
    }

    #[tokio::test]
    async fn test_shuffle_keeps_the_same_episode_set() {
        let graph = test_graph();
        graph.podcast_repository.update_podcasts(false).await.unwrap();
        let view_model = LatestEpisodeViewModel::new(&graph);
        let state = settled_state(&view_model).await;

        view_model.on_shuffle_episodes(&state.library_episodes);

        let mut player_rx = graph.episode_player.state();
        let playback = timeout(Duration::from_secs(2), async {
            loop {
                {
                    let playback = player_rx.borrow_and_update();
                    if playback.current.is_some() {
                        return playback.clone();
                    }
                }
                player_rx.changed().await.unwrap();
            }
        })
        .await
        .expect("shuffle intent never reached the player");

        let mut titles: BTreeSet<String> =
            playback.queue.iter().map(|episode| episode.title.clone()).collect();
        titles.insert(playback.current.unwrap().title);
        assert_eq!(
            titles,
            BTreeSet::from(["Alpha latest".to_string(), "Beta latest".to_string()])
        );
    }
}
