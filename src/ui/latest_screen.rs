// src/ui/latest_screen.rs
use crate::data::Graph;
use crate::state::latest::{LatestEpisodeViewModel, LatestEpisodeViewState};
use crate::ui::navigation::NavController;
use crate::widgets::chip_list::chip;
use crossterm::event::KeyCode;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, List, ListState, Paragraph},
};
use tokio::sync::watch;

pub struct LatestEpisodesScreen {
    view_model: LatestEpisodeViewModel,
    state_rx: watch::Receiver<LatestEpisodeViewState>,
    cursor: usize,
    list_state: ListState,
}

impl LatestEpisodesScreen {
    pub fn new(graph: &Graph) -> Self {
        let view_model = LatestEpisodeViewModel::new(graph);
        let state_rx = view_model.subscribe();
        Self { view_model, state_rx, cursor: 0, list_state: ListState::default() }
    }

    pub fn on_key(&mut self, key: KeyCode, nav: &mut NavController) {
        let state = self.state_rx.borrow().clone();
        let episodes = &state.library_episodes;

        match key {
            KeyCode::Down if !episodes.is_empty() => {
                self.cursor = (self.cursor + 1) % episodes.len();
            }
            KeyCode::Up if !episodes.is_empty() => {
                self.cursor = (self.cursor + episodes.len() - 1) % episodes.len();
            }
            // Play everything in listed order and open the player on the
            // first episode.
            KeyCode::Char('p') if !episodes.is_empty() => {
                self.view_model.on_play_episodes(episodes);
                nav.navigate_to_player(Some(episodes[0].episode.uri().clone()));
            }
            // Shuffled playback; the played order is unknown here, so the
            // player opens without an episode argument.
            KeyCode::Char('s') if !episodes.is_empty() => {
                self.view_model.on_shuffle_episodes(episodes);
                nav.navigate_to_player(None);
            }
            KeyCode::Enter => {
                if let Some(pair) = episodes.get(self.cursor.min(episodes.len().saturating_sub(1)))
                {
                    self.view_model.on_play_episodes(std::slice::from_ref(pair));
                    nav.navigate_to_player(Some(pair.episode.uri().clone()));
                }
            }
            _ => {}
        }
    }

    pub fn render(&mut self, f: &mut Frame) {
        let state = self.state_rx.borrow().clone();
        let episodes = &state.library_episodes;
        self.cursor = self.cursor.min(episodes.len().saturating_sub(1));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(f.size());

        let width = chunks[0].width;
        let items: Vec<_> = if episodes.is_empty() {
            vec![chip("No episodes yet — follow some podcasts", None, width, false)]
        } else {
            episodes
                .iter()
                .enumerate()
                .map(|(i, pair)| {
                    let secondary =
                        pair.episode.author().unwrap_or_else(|| pair.podcast.title());
                    chip(pair.episode.title(), Some(secondary), width, i == self.cursor)
                })
                .collect()
        };

        self.list_state.select(Some(self.cursor));
        let list = List::new(items).block(
            Block::default()
                .title("Latest Episodes")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::White)),
        );
        f.render_stateful_widget(list, chunks[0], &mut self.list_state);

        let hints = "[↑/↓] Move | [Enter] Play | [p] Play All | [s] Shuffle | [Esc] Back";
        let hint_widget = Paragraph::new(hints)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(ratatui::layout::Alignment::Center);
        f.render_widget(hint_widget, chunks[1]);
    }
}
