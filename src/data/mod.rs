// src/data/mod.rs
pub mod domain;
pub mod episode_store;
pub mod podcast_store;
pub mod repository;

use crate::data::domain::{
    FilterableCategoriesUseCase, GetLatestFollowedEpisodesUseCase, PodcastCategoryFilterUseCase,
};
use crate::data::episode_store::EpisodeStore;
use crate::data::podcast_store::PodcastStore;
use crate::data::repository::{FeedSource, PodcastsRepository};
use crate::player::EpisodePlayer;
use std::sync::Arc;

/// Wiring for the data and playback collaborators. Built once in `main` and
/// handed to every screen's view model by reference.
pub struct Graph {
    pub podcast_store: Arc<PodcastStore>,
    pub episode_store: Arc<EpisodeStore>,
    pub podcast_repository: Arc<PodcastsRepository>,
    pub episode_player: Arc<EpisodePlayer>,
    pub filterable_categories_use_case: Arc<FilterableCategoriesUseCase>,
    pub podcast_category_filter_use_case: Arc<PodcastCategoryFilterUseCase>,
    pub latest_followed_episodes_use_case: Arc<GetLatestFollowedEpisodesUseCase>,
}

impl Graph {
    pub fn new(source: Arc<dyn FeedSource>) -> Self {
        let podcast_store = Arc::new(PodcastStore::new());
        let episode_store = Arc::new(EpisodeStore::new());
        let podcast_repository = Arc::new(PodcastsRepository::new(
            source,
            Arc::clone(&podcast_store),
            Arc::clone(&episode_store),
        ));
        let filterable_categories_use_case =
            Arc::new(FilterableCategoriesUseCase::new(Arc::clone(&podcast_store)));
        let podcast_category_filter_use_case = Arc::new(PodcastCategoryFilterUseCase::new(
            Arc::clone(&podcast_store),
            Arc::clone(&episode_store),
        ));
        let latest_followed_episodes_use_case = Arc::new(GetLatestFollowedEpisodesUseCase::new(
            Arc::clone(&podcast_store),
            Arc::clone(&episode_store),
        ));

        Self {
            podcast_store,
            episode_store,
            podcast_repository,
            episode_player: Arc::new(EpisodePlayer::new()),
            filterable_categories_use_case,
            podcast_category_filter_use_case,
            latest_followed_episodes_use_case,
        }
    }
}
