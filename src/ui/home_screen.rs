// src/ui/home_screen.rs
use crate::data::Graph;
use crate::state::home::{HomeCategory, HomeViewModel, HomeViewState};
use crate::ui::navigation::NavController;
use crate::widgets::chip_list::chip;
use crossterm::event::KeyCode;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListState, Paragraph},
};
use tokio::sync::watch;

/// One selectable row of the home list. Rebuilt from the view-state snapshot
/// so key handling and rendering always agree on what is where.
enum HomeRow {
    LatestEpisodes,
    UpNext,
    LibraryPodcast(usize),
    DiscoverPodcast(usize),
    Episode(usize),
}

pub struct HomeScreen {
    view_model: HomeViewModel,
    state_rx: watch::Receiver<HomeViewState>,
    cursor: usize,
    list_state: ListState,
}

impl HomeScreen {
    pub fn new(graph: &Graph) -> Self {
        let view_model = HomeViewModel::new(graph);
        let state_rx = view_model.subscribe();
        Self { view_model, state_rx, cursor: 0, list_state: ListState::default() }
    }

    fn rows(state: &HomeViewState) -> Vec<HomeRow> {
        let mut rows = vec![HomeRow::LatestEpisodes, HomeRow::UpNext];
        match state.selected_home_category {
            HomeCategory::Library => {
                for index in 0..state.featured_podcasts.len() {
                    rows.push(HomeRow::LibraryPodcast(index));
                }
                for index in 0..state.library_episodes.len() {
                    rows.push(HomeRow::Episode(index));
                }
            }
            HomeCategory::Discover => {
                for index in 0..state.podcast_category_filter_result.top_podcasts.len() {
                    rows.push(HomeRow::DiscoverPodcast(index));
                }
            }
        }
        rows
    }

    pub fn on_key(&mut self, key: KeyCode, nav: &mut NavController) {
        let state = self.state_rx.borrow().clone();
        let rows = Self::rows(&state);
        if rows.is_empty() {
            return;
        }
        self.cursor = self.cursor.min(rows.len() - 1);

        match key {
            KeyCode::Down => self.cursor = (self.cursor + 1) % rows.len(),
            KeyCode::Up => self.cursor = (self.cursor + rows.len() - 1) % rows.len(),
            KeyCode::Tab => {
                let next = match state.selected_home_category {
                    HomeCategory::Library => HomeCategory::Discover,
                    HomeCategory::Discover => HomeCategory::Library,
                };
                self.view_model.on_home_category_selected(next);
                self.cursor = 0;
            }
            KeyCode::Char('u') => {
                if let Some(HomeRow::LibraryPodcast(index)) = rows.get(self.cursor) {
                    if let Some(info) = state.featured_podcasts.get(*index) {
                        self.view_model.on_podcast_unfollowed(info.podcast.uri().clone());
                    }
                }
            }
            KeyCode::Enter => match rows.get(self.cursor) {
                Some(HomeRow::LatestEpisodes) => nav.navigate_to_latest_episodes(),
                Some(HomeRow::UpNext) => nav.navigate_to_up_next(),
                Some(HomeRow::LibraryPodcast(index)) => {
                    let podcast =
                        state.featured_podcasts.get(*index).map(|info| info.podcast.clone());
                    self.view_model.on_library_podcast_selected(podcast);
                }
                Some(HomeRow::DiscoverPodcast(index)) => {
                    if let Some(info) = state.podcast_category_filter_result.top_podcasts.get(*index)
                    {
                        self.view_model.on_toggle_podcast_followed(info.podcast.uri().clone());
                    }
                }
                Some(HomeRow::Episode(index)) => {
                    if let Some(pair) = state.library_episodes.get(*index) {
                        self.view_model.on_queue_episode(pair);
                    }
                }
                None => {}
            },
            KeyCode::Char(' ') => nav.navigate_to_player(None),
            _ => {}
        }
    }

    pub fn render(&mut self, f: &mut Frame) {
        let state = self.state_rx.borrow().clone();
        let rows = Self::rows(&state);
        self.cursor = self.cursor.min(rows.len().saturating_sub(1));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
            .split(f.size());

        // === Header: category tabs and refresh indicator ===
        let tabs: Vec<Span> = state
            .home_categories
            .iter()
            .flat_map(|category| {
                let label = match category {
                    HomeCategory::Library => " Library ",
                    HomeCategory::Discover => " Discover ",
                };
                let style = if *category == state.selected_home_category {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                [Span::styled(label.to_string(), style), Span::raw("|")]
            })
            .collect();
        let header_title = if state.refreshing { "Podcasts (refreshing…)" } else { "Podcasts" };
        let header = Paragraph::new(Line::from(tabs)).block(
            Block::default()
                .title(header_title)
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Green)),
        );
        f.render_widget(header, chunks[0]);

        // === Content list ===
        let width = chunks[1].width;
        let items: Vec<_> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let selected = i == self.cursor;
                match row {
                    HomeRow::LatestEpisodes => chip("Latest Episodes", None, width, selected),
                    HomeRow::UpNext => chip("Up Next", None, width, selected),
                    HomeRow::LibraryPodcast(index) => {
                        let info = &state.featured_podcasts[*index];
                        let last = info
                            .last_episode_date
                            .map(|date| date.format("%Y-%m-%d").to_string());
                        chip(info.podcast.title(), last.as_deref(), width, selected)
                    }
                    HomeRow::DiscoverPodcast(index) => {
                        let info = &state.podcast_category_filter_result.top_podcasts[*index];
                        let follow_marker =
                            if info.is_followed { "followed" } else { "not followed" };
                        chip(info.podcast.title(), Some(follow_marker), width, selected)
                    }
                    HomeRow::Episode(index) => {
                        let pair = &state.library_episodes[*index];
                        chip(
                            pair.episode.title(),
                            Some(pair.podcast.title()),
                            width,
                            selected,
                        )
                    }
                }
            })
            .collect();

        let category_line = state
            .filterable_categories
            .selected
            .as_ref()
            .map(|category| format!("Discover: {category}"))
            .unwrap_or_else(|| "Discover".to_string());
        let list_title = match state.selected_home_category {
            HomeCategory::Library => "Library".to_string(),
            HomeCategory::Discover => category_line,
        };
        self.list_state.select(Some(self.cursor));
        let list = List::new(items).block(
            Block::default()
                .title(list_title)
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::White)),
        );
        f.render_stateful_widget(list, chunks[1], &mut self.list_state);

        // === Hint bar ===
        let hints =
            "[↑/↓] Move | [Enter] Open/Follow | [Tab] Library/Discover | [u] Unfollow | [Space] Player | [Q] Quit";
        let hint_widget = Paragraph::new(hints)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(ratatui::layout::Alignment::Center);
        f.render_widget(hint_widget, chunks[2]);
    }
}
