// src/data/domain.rs
//
// Derived queries over the two stores. Each use case returns an observable
// channel recomputed whenever either store changes; the caller decides which
// scope the derivation task lives in.
use crate::data::episode_store::{EpisodeStore, EpisodeTable};
use crate::data::podcast_store::{PodcastDirectory, PodcastStore};
use crate::podcast::{CategoryInfo, EpisodeToPodcast, PodcastWithExtraInfo};
use crate::state::observe::{self, ScopeHandle};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;

const CATEGORY_EPISODE_LIMIT: usize = 20;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterableCategoriesModel {
    pub categories: Vec<CategoryInfo>,
    pub selected: Option<CategoryInfo>,
}

impl FilterableCategoriesModel {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PodcastCategoryFilterResult {
    pub top_podcasts: Vec<PodcastWithExtraInfo>,
    pub episodes: Vec<EpisodeToPodcast>,
}

/// Joins both store channels through one pure computation.
fn derive_from_stores<T, F>(
    scope: &ScopeHandle,
    mut podcasts: watch::Receiver<PodcastDirectory>,
    mut episodes: watch::Receiver<EpisodeTable>,
    compute: F,
) -> watch::Receiver<T>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(&PodcastDirectory, &EpisodeTable) -> T + Send + 'static,
{
    let (tx, rx) = watch::channel(compute(&podcasts.borrow(), &episodes.borrow()));
    scope.spawn(async move {
        loop {
            let alive = tokio::select! {
                _ = tx.closed() => return,
                res = podcasts.changed() => res.is_ok(),
                res = episodes.changed() => res.is_ok(),
            };
            if !alive {
                return;
            }
            let next = compute(&podcasts.borrow_and_update(), &episodes.borrow_and_update());
            tx.send_replace(next);
        }
    });
    rx
}

/// Categories that can filter the discover list, sorted by how many podcasts
/// carry them. A missing selection defaults to the first category.
pub struct FilterableCategoriesUseCase {
    podcast_store: Arc<PodcastStore>,
}

impl FilterableCategoriesUseCase {
    pub fn new(podcast_store: Arc<PodcastStore>) -> Self {
        Self { podcast_store }
    }

    pub fn invoke(
        &self,
        scope: &ScopeHandle,
        selected: Option<CategoryInfo>,
    ) -> watch::Receiver<FilterableCategoriesModel> {
        observe::map(scope, self.podcast_store.podcasts(), move |dir| {
            let categories = categories_by_podcast_count(dir);
            let selected = selected
                .clone()
                .filter(|category| categories.contains(category))
                .or_else(|| categories.first().cloned());
            FilterableCategoriesModel { categories, selected }
        })
    }
}

/// Discover-tab filter: podcasts in the selected category plus their most
/// recent episodes.
pub struct PodcastCategoryFilterUseCase {
    podcast_store: Arc<PodcastStore>,
    episode_store: Arc<EpisodeStore>,
}

impl PodcastCategoryFilterUseCase {
    pub fn new(podcast_store: Arc<PodcastStore>, episode_store: Arc<EpisodeStore>) -> Self {
        Self { podcast_store, episode_store }
    }

    pub fn invoke(
        &self,
        scope: &ScopeHandle,
        selected: Option<CategoryInfo>,
    ) -> watch::Receiver<PodcastCategoryFilterResult> {
        derive_from_stores(
            scope,
            self.podcast_store.podcasts(),
            self.episode_store.episodes(),
            move |dir, table| {
                let Some(category) = selected.as_ref() else {
                    return PodcastCategoryFilterResult::default();
                };

                let mut top_podcasts: Vec<PodcastWithExtraInfo> = dir
                    .iter()
                    .filter(|podcast| podcast.categories().contains(category))
                    .map(|podcast| dir.with_extra_info(podcast))
                    .collect();
                top_podcasts.sort_by(|a, b| {
                    b.last_episode_date
                        .cmp(&a.last_episode_date)
                        .then_with(|| a.podcast.title().cmp(b.podcast.title()))
                });

                let mut episodes: Vec<EpisodeToPodcast> = top_podcasts
                    .iter()
                    .flat_map(|info| {
                        table
                            .in_podcast(info.podcast.uri(), CATEGORY_EPISODE_LIMIT)
                            .into_iter()
                            .map(|episode| EpisodeToPodcast {
                                episode,
                                podcast: info.podcast.clone(),
                            })
                    })
                    .collect();
                episodes.sort_by(|a, b| b.episode.published().cmp(&a.episode.published()));
                episodes.truncate(CATEGORY_EPISODE_LIMIT);

                PodcastCategoryFilterResult { top_podcasts, episodes }
            },
        )
    }
}

/// The newest episode of every followed podcast, newest first.
pub struct GetLatestFollowedEpisodesUseCase {
    podcast_store: Arc<PodcastStore>,
    episode_store: Arc<EpisodeStore>,
}

impl GetLatestFollowedEpisodesUseCase {
    pub fn new(podcast_store: Arc<PodcastStore>, episode_store: Arc<EpisodeStore>) -> Self {
        Self { podcast_store, episode_store }
    }

    pub fn invoke(&self, scope: &ScopeHandle) -> watch::Receiver<Vec<EpisodeToPodcast>> {
        derive_from_stores(
            scope,
            self.podcast_store.podcasts(),
            self.episode_store.episodes(),
            |dir, table| {
                let mut latest: Vec<EpisodeToPodcast> = dir
                    .iter()
                    .filter(|podcast| dir.is_followed(podcast.uri()))
                    .filter_map(|podcast| {
                        table
                            .in_podcast(podcast.uri(), 1)
                            .into_iter()
                            .next()
                            .map(|episode| EpisodeToPodcast {
                                episode,
                                podcast: podcast.clone(),
                            })
                    })
                    .collect();
                latest.sort_by(|a, b| b.episode.published().cmp(&a.episode.published()));
                latest
            },
        )
    }
}

fn categories_by_podcast_count(dir: &PodcastDirectory) -> Vec<CategoryInfo> {
    let mut counts: BTreeMap<CategoryInfo, usize> = BTreeMap::new();
    for podcast in dir.iter() {
        for category in podcast.categories() {
            *counts.entry(category.clone()).or_default() += 1;
        }
    }
    let mut categories: Vec<(CategoryInfo, usize)> = counts.into_iter().collect();
    categories.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    categories.into_iter().map(|(category, _)| category).collect()
}
