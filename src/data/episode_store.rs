// src/data/episode_store.rs
use crate::podcast::{Episode, EpisodeUri, PodcastUri};
use crate::state::observe::{self, Scope};
use log::debug;
use std::collections::BTreeMap;
use tokio::sync::watch;

#[derive(Debug, Clone, Default)]
pub struct EpisodeTable {
    episodes: BTreeMap<EpisodeUri, Episode>,
}

impl EpisodeTable {
    pub fn get(&self, uri: &EpisodeUri) -> Option<&Episode> {
        self.episodes.get(uri)
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Episode> {
        self.episodes.values()
    }

    /// Episodes of one podcast, newest first.
    pub fn in_podcast(&self, podcast_uri: &PodcastUri, limit: usize) -> Vec<Episode> {
        let mut episodes: Vec<Episode> = self
            .episodes
            .values()
            .filter(|episode| episode.podcast_uri() == podcast_uri)
            .cloned()
            .collect();
        episodes.sort_by(|a, b| b.published().cmp(&a.published()));
        episodes.truncate(limit);
        episodes
    }
}

/// Observable episode collaborator, same shape as the podcast store: one
/// watch-held table, derived query channels, sync-path upserts.
pub struct EpisodeStore {
    table: watch::Sender<EpisodeTable>,
    scope: Scope,
}

impl EpisodeStore {
    pub fn new() -> Self {
        let (table, _) = watch::channel(EpisodeTable::default());
        Self { table, scope: Scope::new() }
    }

    // ===== read channels

    pub fn episodes(&self) -> watch::Receiver<EpisodeTable> {
        self.table.subscribe()
    }

    pub fn episode_with_uri(&self, uri: &EpisodeUri) -> watch::Receiver<Option<Episode>> {
        let uri = uri.clone();
        observe::map(&self.scope.handle(), self.table.subscribe(), move |table| {
            table.get(&uri).cloned()
        })
    }

    pub fn episodes_in_podcast(
        &self,
        podcast_uri: &PodcastUri,
        limit: usize,
    ) -> watch::Receiver<Vec<Episode>> {
        let podcast_uri = podcast_uri.clone();
        observe::map(&self.scope.handle(), self.table.subscribe(), move |table| {
            table.in_podcast(&podcast_uri, limit)
        })
    }

    /// Current episode for a URI, one-shot.
    pub async fn episode_by_uri(&self, uri: &EpisodeUri) -> Option<Episode> {
        self.table.borrow().get(uri).cloned()
    }

    // ===== mutations

    pub fn upsert_episodes(&self, episodes: Vec<Episode>) {
        if episodes.is_empty() {
            return;
        }
        debug!("episode store: upserting {} episodes", episodes.len());
        self.table.send_modify(|table| {
            for episode in episodes {
                table.episodes.insert(episode.uri().clone(), episode);
            }
        });
    }
}

impl Default for EpisodeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn episode(uri: &str, podcast: &str, day: u32) -> Episode {
        Episode::new(
            EpisodeUri::new(uri),
            PodcastUri::new(podcast),
            format!("Episode {uri}"),
            None,
            None,
            Utc.with_ymd_and_hms(2024, 5, day, 8, 0, 0).unwrap(),
            None,
        )
    }

    #[tokio::test]
    async fn test_episodes_in_podcast_newest_first_with_limit() {
        let store = EpisodeStore::new();
        store.upsert_episodes(vec![
            episode("e1", "http://a.example/feed", 1),
            episode("e2", "http://a.example/feed", 9),
            episode("e3", "http://a.example/feed", 5),
            episode("x1", "http://other.example/feed", 28),
        ]);

        let uri = PodcastUri::new("http://a.example/feed");
        let in_podcast = store.episodes_in_podcast(&uri, 2);
        let snapshot = in_podcast.borrow().clone();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].uri().as_str(), "e2");
        assert_eq!(snapshot[1].uri().as_str(), "e3");
    }

    #[tokio::test]
    async fn test_episode_with_uri_tracks_upserts() {
        let store = EpisodeStore::new();
        let uri = EpisodeUri::new("e1");
        let mut by_uri = store.episode_with_uri(&uri);
        assert!(by_uri.borrow_and_update().is_none());

        store.upsert_episodes(vec![episode("e1", "http://a.example/feed", 3)]);
        by_uri.changed().await.unwrap();
        assert_eq!(by_uri.borrow_and_update().as_ref().unwrap().title(), "Episode e1");
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_episode() {
        let store = EpisodeStore::new();
        store.upsert_episodes(vec![episode("e1", "http://a.example/feed", 3)]);
        let mut updated = episode("e1", "http://a.example/feed", 4);
        updated = Episode::new(
            updated.uri().clone(),
            updated.podcast_uri().clone(),
            "Renamed".to_string(),
            None,
            None,
            updated.published(),
            None,
        );
        store.upsert_episodes(vec![updated]);

        let table = store.episodes().borrow().clone();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&EpisodeUri::new("e1")).unwrap().title(), "Renamed");
    }
}
