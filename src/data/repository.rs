// src/data/repository.rs
use crate::data::episode_store::EpisodeStore;
use crate::data::podcast_store::PodcastStore;
use crate::errors::DataError;
use crate::podcast::{Episode, Podcast};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use url::Url;

/// One refreshed feed: the podcast plus its current episode list. `followed`
/// marks feeds the library ships pre-followed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSnapshot {
    pub podcast: Podcast,
    pub episodes: Vec<Episode>,
    #[serde(default)]
    pub followed: bool,
}

/// Where refreshed snapshots come from. The network fetch/parse machinery
/// behind this seam belongs to the companion sync module, not this crate.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn load(&self) -> Result<Vec<FeedSnapshot>, DataError>;
}

// ===== Bundled library source

/// Reads the snapshot list from a JSON library file.
pub struct BundledSource {
    path: PathBuf,
}

impl BundledSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl FeedSource for BundledSource {
    async fn load(&self) -> Result<Vec<FeedSnapshot>, DataError> {
        info!("bundled source: loading library from {}", self.path.display());
        let raw = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&raw)?)
    }
}

// ===== Fake source for testing

/// Serves canned snapshots; a gate can hold the load open so tests can
/// observe in-flight refresh state.
pub struct FakeSource {
    pub snapshots: Vec<FeedSnapshot>,
    pub fail: bool,
    pub gate: tokio::sync::Mutex<Option<tokio::sync::oneshot::Receiver<()>>>,
}

impl FakeSource {
    pub fn with_snapshots(snapshots: Vec<FeedSnapshot>) -> Self {
        Self { snapshots, fail: false, gate: tokio::sync::Mutex::new(None) }
    }

    pub fn failing() -> Self {
        Self { snapshots: Vec::new(), fail: true, gate: tokio::sync::Mutex::new(None) }
    }

    pub fn gated(snapshots: Vec<FeedSnapshot>) -> (Self, tokio::sync::oneshot::Sender<()>) {
        let (release, wait) = tokio::sync::oneshot::channel();
        let source = Self {
            snapshots,
            fail: false,
            gate: tokio::sync::Mutex::new(Some(wait)),
        };
        (source, release)
    }
}

#[async_trait]
impl FeedSource for FakeSource {
    async fn load(&self) -> Result<Vec<FeedSnapshot>, DataError> {
        if let Some(wait) = self.gate.lock().await.take() {
            let _ = wait.await;
        }
        if self.fail {
            return Err(DataError::SourceFailed("fake source failure".to_string()));
        }
        Ok(self.snapshots.clone())
    }
}

// ===== Repository

/// Sync collaborator: pulls snapshots from the source and merges them into
/// both stores. Without `force` a second update is a no-op once the library
/// has been synced.
pub struct PodcastsRepository {
    source: Arc<dyn FeedSource>,
    podcast_store: Arc<PodcastStore>,
    episode_store: Arc<EpisodeStore>,
    synced: AtomicBool,
}

impl PodcastsRepository {
    pub fn new(
        source: Arc<dyn FeedSource>,
        podcast_store: Arc<PodcastStore>,
        episode_store: Arc<EpisodeStore>,
    ) -> Self {
        Self { source, podcast_store, episode_store, synced: AtomicBool::new(false) }
    }

    pub async fn update_podcasts(&self, force: bool) -> Result<(), DataError> {
        if self.synced.load(Ordering::SeqCst) && !force {
            info!("repository: library already synced, skipping update");
            return Ok(());
        }

        let snapshots = self.source.load().await?;
        info!("repository: merging {} feed snapshots", snapshots.len());

        let mut podcasts: Vec<(Podcast, Option<DateTime<Utc>>, bool)> = Vec::new();
        let mut episodes: Vec<Episode> = Vec::new();
        for snapshot in snapshots {
            if let Err(parse_err) = Url::parse(snapshot.podcast.uri().as_str()) {
                warn!(
                    "repository: skipping feed with invalid URI '{}': {}",
                    snapshot.podcast.uri(),
                    parse_err
                );
                continue;
            }
            let last_episode_date =
                snapshot.episodes.iter().map(|episode| episode.published()).max();
            podcasts.push((snapshot.podcast, last_episode_date, snapshot.followed));
            episodes.extend(snapshot.episodes);
        }

        self.podcast_store.upsert_podcasts(podcasts);
        self.episode_store.upsert_episodes(episodes);
        self.synced.store(true, Ordering::SeqCst);
        Ok(())
    }
}
