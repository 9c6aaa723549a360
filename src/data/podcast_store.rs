// src/data/podcast_store.rs
use crate::podcast::{Podcast, PodcastUri, PodcastWithExtraInfo};
use crate::state::observe::{self, Scope};
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::watch;

/// Everything the store knows about the podcast library, held behind one
/// watch channel so every reader observes a consistent snapshot.
#[derive(Debug, Clone, Default)]
pub struct PodcastDirectory {
    podcasts: BTreeMap<PodcastUri, Podcast>,
    followed: BTreeSet<PodcastUri>,
    last_episode_dates: BTreeMap<PodcastUri, DateTime<Utc>>,
}

impl PodcastDirectory {
    pub fn get(&self, uri: &PodcastUri) -> Option<&Podcast> {
        self.podcasts.get(uri)
    }

    pub fn is_followed(&self, uri: &PodcastUri) -> bool {
        self.followed.contains(uri)
    }

    pub fn len(&self) -> usize {
        self.podcasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.podcasts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Podcast> {
        self.podcasts.values()
    }

    pub fn with_extra_info(&self, podcast: &Podcast) -> PodcastWithExtraInfo {
        PodcastWithExtraInfo {
            podcast: podcast.clone(),
            last_episode_date: self.last_episode_dates.get(podcast.uri()).copied(),
            is_followed: self.followed.contains(podcast.uri()),
        }
    }

    fn followed_sorted_by_last_episode(&self, limit: usize) -> Vec<PodcastWithExtraInfo> {
        let mut followed: Vec<PodcastWithExtraInfo> = self
            .followed
            .iter()
            .filter_map(|uri| self.podcasts.get(uri))
            .map(|podcast| self.with_extra_info(podcast))
            .collect();
        // Newest episode first, ties by title so the order is stable.
        followed.sort_by(|a, b| {
            b.last_episode_date
                .cmp(&a.last_episode_date)
                .then_with(|| a.podcast.title().cmp(b.podcast.title()))
        });
        followed.truncate(limit);
        followed
    }
}

/// Observable podcast collaborator: reads are watch channels, mutations go
/// through the async operations below and surface back out via the channel.
pub struct PodcastStore {
    directory: watch::Sender<PodcastDirectory>,
    scope: Scope,
}

impl PodcastStore {
    pub fn new() -> Self {
        let (directory, _) = watch::channel(PodcastDirectory::default());
        Self { directory, scope: Scope::new() }
    }

    // ===== read channels

    pub fn podcasts(&self) -> watch::Receiver<PodcastDirectory> {
        self.directory.subscribe()
    }

    pub fn podcast_with_uri(&self, uri: &PodcastUri) -> watch::Receiver<Option<Podcast>> {
        let uri = uri.clone();
        observe::map(&self.scope.handle(), self.directory.subscribe(), move |dir| {
            dir.get(&uri).cloned()
        })
    }

    pub fn followed_podcasts_sorted_by_last_episode(
        &self,
        limit: usize,
    ) -> watch::Receiver<Vec<PodcastWithExtraInfo>> {
        observe::map(&self.scope.handle(), self.directory.subscribe(), move |dir| {
            dir.followed_sorted_by_last_episode(limit)
        })
    }

    /// Current podcast for a URI, one-shot.
    pub async fn podcast_by_uri(&self, uri: &PodcastUri) -> Option<Podcast> {
        self.directory.borrow().get(uri).cloned()
    }

    // ===== mutations

    pub async fn follow_podcast(&self, uri: &PodcastUri) {
        debug!("podcast store: follow {uri}");
        self.directory.send_if_modified(|dir| {
            dir.podcasts.contains_key(uri) && dir.followed.insert(uri.clone())
        });
    }

    pub async fn unfollow_podcast(&self, uri: &PodcastUri) {
        debug!("podcast store: unfollow {uri}");
        self.directory.send_if_modified(|dir| dir.followed.remove(uri));
    }

    pub async fn toggle_podcast_followed(&self, uri: &PodcastUri) {
        debug!("podcast store: toggle follow {uri}");
        self.directory.send_if_modified(|dir| {
            if dir.followed.remove(uri) {
                true
            } else {
                dir.podcasts.contains_key(uri) && dir.followed.insert(uri.clone())
            }
        });
    }

    /// Sync path: merges refreshed podcasts into the directory. `followed`
    /// marks feeds the library was seeded with; it never unfollows.
    pub fn upsert_podcasts(
        &self,
        entries: Vec<(Podcast, Option<DateTime<Utc>>, bool)>,
    ) {
        if entries.is_empty() {
            return;
        }
        self.directory.send_modify(|dir| {
            for (podcast, last_episode_date, followed) in entries {
                if let Some(date) = last_episode_date {
                    dir.last_episode_dates.insert(podcast.uri().clone(), date);
                }
                if followed {
                    dir.followed.insert(podcast.uri().clone());
                }
                dir.podcasts.insert(podcast.uri().clone(), podcast);
            }
        });
    }
}

impl Default for PodcastStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn podcast(uri: &str, title: &str) -> Podcast {
        Podcast::new(PodcastUri::new(uri), title.to_string(), None, None, None, vec![])
    }

    fn date(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_toggle_follow_surfaces_through_query_channel() {
        let store = PodcastStore::new();
        store.upsert_podcasts(vec![(podcast("http://a.example/feed", "A"), Some(date(1)), false)]);

        let mut followed = store.followed_podcasts_sorted_by_last_episode(10);
        assert!(followed.borrow_and_update().is_empty());

        let uri = PodcastUri::new("http://a.example/feed");
        store.toggle_podcast_followed(&uri).await;
        followed.changed().await.unwrap();
        assert_eq!(followed.borrow_and_update().len(), 1);

        store.toggle_podcast_followed(&uri).await;
        followed.changed().await.unwrap();
        assert!(followed.borrow_and_update().is_empty());
    }

    #[tokio::test]
    async fn test_follow_unknown_podcast_is_ignored() {
        let store = PodcastStore::new();
        store.follow_podcast(&PodcastUri::new("http://nowhere.example/feed")).await;
        assert!(store.podcasts().borrow().followed.is_empty());
    }

    #[tokio::test]
    async fn test_followed_sorted_newest_episode_first() {
        let store = PodcastStore::new();
        store.upsert_podcasts(vec![
            (podcast("http://a.example/feed", "Older"), Some(date(1)), true),
            (podcast("http://b.example/feed", "Newest"), Some(date(9)), true),
            (podcast("http://c.example/feed", "Middle"), Some(date(5)), true),
        ]);

        let followed = store.followed_podcasts_sorted_by_last_episode(2);
        let snapshot = followed.borrow().clone();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].podcast.title(), "Newest");
        assert_eq!(snapshot[1].podcast.title(), "Middle");
        assert!(snapshot.iter().all(|info| info.is_followed));
    }

    #[tokio::test]
    async fn test_podcast_with_uri_tracks_updates() {
        let store = PodcastStore::new();
        let uri = PodcastUri::new("http://a.example/feed");
        let mut by_uri = store.podcast_with_uri(&uri);
        assert!(by_uri.borrow_and_update().is_none());

        store.upsert_podcasts(vec![(podcast("http://a.example/feed", "A"), None, false)]);
        by_uri.changed().await.unwrap();
        assert_eq!(by_uri.borrow_and_update().as_ref().unwrap().title(), "A");
    }
}
