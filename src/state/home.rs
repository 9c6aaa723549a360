// src/state/home.rs
use crate::data::Graph;
use crate::data::domain::{FilterableCategoriesModel, PodcastCategoryFilterResult};
use crate::data::podcast_store::PodcastStore;
use crate::data::repository::PodcastsRepository;
use crate::player::EpisodePlayer;
use crate::podcast::{CategoryInfo, EpisodeToPodcast, Podcast, PodcastUri, PodcastWithExtraInfo};
use crate::state::observe::{self, Scope, StateChannel, signal};
use log::warn;
use std::sync::Arc;
use tokio::sync::watch;

const FEATURED_PODCAST_LIMIT: usize = 10;
const LIBRARY_EPISODE_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HomeCategory {
    Library,
    #[default]
    Discover,
}

impl HomeCategory {
    pub fn entries() -> Vec<HomeCategory> {
        vec![HomeCategory::Library, HomeCategory::Discover]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomeViewState {
    pub featured_podcasts: Vec<PodcastWithExtraInfo>,
    pub refreshing: bool,
    pub selected_home_category: HomeCategory,
    pub home_categories: Vec<HomeCategory>,
    pub filterable_categories: FilterableCategoriesModel,
    pub podcast_category_filter_result: PodcastCategoryFilterResult,
    pub library_episodes: Vec<EpisodeToPodcast>,
    pub error_message: Option<String>,
}

/// State holder for the home screen. Combines the latest value from each of
/// the collaborator channels and the locally owned selection signals into one
/// view-state record; all state changes flow back in through those channels.
pub struct HomeViewModel {
    scope: Scope,
    podcast_store: Arc<PodcastStore>,
    podcast_repository: Arc<PodcastsRepository>,
    episode_player: Arc<EpisodePlayer>,
    selected_library_podcast: Arc<watch::Sender<Option<Podcast>>>,
    selected_home_category: Arc<watch::Sender<HomeCategory>>,
    refreshing: Arc<watch::Sender<bool>>,
    ui_state: StateChannel<HomeViewState>,
}

impl HomeViewModel {
    pub fn new(graph: &Graph) -> Self {
        let scope = Scope::new();
        let handle = scope.handle();

        // Locally owned selection signals, treated as inputs like any
        // collaborator channel.
        let (selected_library_podcast, selected_library_podcast_rx) =
            watch::channel(None::<Podcast>);
        // The category list never changes at runtime; the dropped sender
        // leaves the receiver pinned to its value.
        let (_, home_categories_rx) = watch::channel(HomeCategory::entries());
        let (selected_home_category, selected_home_category_rx) =
            watch::channel(HomeCategory::default());
        let (selected_category, selected_category_rx) = watch::channel(None::<CategoryInfo>);
        let (refreshing, refreshing_rx) = watch::channel(false);
        let selected_library_podcast = Arc::new(selected_library_podcast);
        let selected_home_category = Arc::new(selected_home_category);
        let selected_category = Arc::new(selected_category);
        let refreshing = Arc::new(refreshing);

        let featured_rx = graph
            .podcast_store
            .followed_podcasts_sorted_by_last_episode(FEATURED_PODCAST_LIMIT);

        let filterable_rx = {
            let use_case = Arc::clone(&graph.filterable_categories_use_case);
            let query_scope = handle.clone();
            observe::switch(&handle, selected_category_rx.clone(), move |selected| {
                use_case.invoke(&query_scope, selected.clone())
            })
        };

        let category_filter_rx = {
            let use_case = Arc::clone(&graph.podcast_category_filter_use_case);
            let query_scope = handle.clone();
            observe::switch(&handle, selected_category_rx, move |selected| {
                use_case.invoke(&query_scope, selected.clone())
            })
        };

        let library_episodes_rx = {
            let episode_store = Arc::clone(&graph.episode_store);
            observe::switch(
                &handle,
                selected_library_podcast_rx.clone(),
                move |selected: &Option<Podcast>| match selected {
                    Some(podcast) => {
                        episode_store.episodes_in_podcast(podcast.uri(), LIBRARY_EPISODE_LIMIT)
                    }
                    None => empty_episode_query(),
                },
            )
        };

        let inputs = vec![
            signal(home_categories_rx.clone()),
            signal(selected_home_category_rx.clone()),
            signal(featured_rx.clone()),
            signal(refreshing_rx.clone()),
            signal(filterable_rx.clone()),
            signal(category_filter_rx.clone()),
            signal(library_episodes_rx.clone()),
        ];

        let selected_category_writer = Arc::clone(&selected_category);
        let selected_library_read = selected_library_podcast_rx;
        let compute = move || {
            let filterable = filterable_rx.borrow().clone();
            // Persist the filter's resolved selection so the query channels
            // re-key; the equality gate settles the loop after one pass.
            selected_category_writer.send_if_modified(|current| {
                if *current != filterable.selected {
                    *current = filterable.selected.clone();
                    true
                } else {
                    false
                }
            });

            let selected_library = selected_library_read.borrow().clone();
            let library_episodes = match &selected_library {
                Some(podcast) => library_episodes_rx
                    .borrow()
                    .iter()
                    .map(|episode| EpisodeToPodcast {
                        episode: episode.clone(),
                        podcast: podcast.clone(),
                    })
                    .collect(),
                None => Vec::new(),
            };

            HomeViewState {
                featured_podcasts: featured_rx.borrow().clone(),
                refreshing: *refreshing_rx.borrow(),
                selected_home_category: *selected_home_category_rx.borrow(),
                home_categories: home_categories_rx.borrow().clone(),
                filterable_categories: filterable,
                podcast_category_filter_result: category_filter_rx.borrow().clone(),
                library_episodes,
                error_message: None,
            }
        };

        let ui_state = observe::combine(&scope, HomeViewState::default(), inputs, compute);

        let view_model = Self {
            scope,
            podcast_store: Arc::clone(&graph.podcast_store),
            podcast_repository: Arc::clone(&graph.podcast_repository),
            episode_player: Arc::clone(&graph.episode_player),
            selected_library_podcast,
            selected_home_category,
            refreshing,
            ui_state,
        };
        view_model.refresh(false);
        view_model
    }

    pub fn subscribe(&self) -> watch::Receiver<HomeViewState> {
        self.ui_state.subscribe()
    }

    /// One-time construction refresh. The busy flag clears whether the
    /// update succeeded or not; a failure only reaches the log.
    fn refresh(&self, force: bool) {
        let repository = Arc::clone(&self.podcast_repository);
        let refreshing = Arc::clone(&self.refreshing);
        self.scope.spawn(async move {
            refreshing.send_replace(true);
            if let Err(refresh_err) = repository.update_podcasts(force).await {
                warn!("home: podcast refresh failed: {refresh_err}");
            }
            refreshing.send_replace(false);
        });
    }

    // ===== intent handlers

    pub fn on_home_category_selected(&self, category: HomeCategory) {
        self.selected_home_category.send_replace(category);
    }

    pub fn on_library_podcast_selected(&self, podcast: Option<Podcast>) {
        self.selected_library_podcast.send_replace(podcast);
    }

    pub fn on_podcast_unfollowed(&self, podcast_uri: PodcastUri) {
        let store = Arc::clone(&self.podcast_store);
        self.scope.spawn(async move {
            store.unfollow_podcast(&podcast_uri).await;
        });
    }

    pub fn on_toggle_podcast_followed(&self, podcast_uri: PodcastUri) {
        let store = Arc::clone(&self.podcast_store);
        self.scope.spawn(async move {
            store.toggle_podcast_followed(&podcast_uri).await;
        });
    }

    pub fn on_queue_episode(&self, pair: &EpisodeToPodcast) {
        let player = Arc::clone(&self.episode_player);
        let episode: crate::podcast::PlayerEpisode = pair.into();
        self.scope.spawn(async move {
            player.add_to_queue(episode).await;
        });
    }
}

/// Query stand-in while no library podcast is selected: an already-closed
/// channel holding an empty list.
fn empty_episode_query() -> watch::Receiver<Vec<crate::podcast::Episode>> {
    let (tx, rx) = watch::channel(Vec::new());
    drop(tx);
    rx
}
