// src/ui/player_screen.rs
use crate::data::Graph;
use crate::podcast::EpisodeUri;
use crate::state::player::{PlayerUiState, PlayerViewModel};
use crate::ui::format_summary;
use crate::ui::navigation::NavController;
use crate::widgets::scrollable_paragraph::ScrollableParagraphState;
use crossterm::event::KeyCode;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::time::Duration;
use tokio::sync::watch;

pub struct PlayerScreen {
    view_model: PlayerViewModel,
    state_rx: watch::Receiver<Option<PlayerUiState>>,
    summary: ScrollableParagraphState,
}

impl PlayerScreen {
    pub fn new(graph: &Graph, episode_uri: Option<EpisodeUri>) -> Self {
        let view_model = PlayerViewModel::new(graph, episode_uri);
        let state_rx = view_model.subscribe();
        Self { view_model, state_rx, summary: ScrollableParagraphState::default() }
    }

    pub fn on_key(&mut self, key: KeyCode, nav: &mut NavController) {
        match key {
            KeyCode::Char(' ') => self.view_model.on_toggle_play(),
            KeyCode::Char('n') => self.view_model.on_next_episode(),
            KeyCode::Char('v') => nav.navigate_to_volume(),
            KeyCode::Down => self.summary.scroll_down(1),
            KeyCode::Up => self.summary.scroll_up(1),
            KeyCode::PageDown => self.summary.scroll_down(5),
            KeyCode::PageUp => self.summary.scroll_up(5),
            _ => {}
        }
    }

    pub fn render(&mut self, f: &mut Frame) {
        let state = self.state_rx.borrow().clone();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(0), Constraint::Length(1)])
            .split(f.size());

        // === Now playing card ===
        let card_lines = match &state {
            None => vec![Line::from("Loading…")],
            Some(state) => vec![
                Line::from(Span::styled(
                    state.title.clone(),
                    Style::default().fg(Color::LightGreen).add_modifier(Modifier::BOLD),
                )),
                Line::from(state.podcast_name.clone()),
                Line::from(Span::styled(
                    state.author.clone(),
                    Style::default().fg(Color::DarkGray),
                )),
                Line::from(format!("Duration: {}", fmt_duration(state.duration))),
            ],
        };
        let card = Paragraph::new(card_lines).wrap(Wrap { trim: true }).block(
            Block::default()
                .title("Player")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Green)),
        );
        f.render_widget(card, chunks[0]);

        // === Summary panel ===
        let summary_block = Block::default()
            .title("About this episode")
            .borders(Borders::ALL)
            .style(Style::default().fg(Color::White));
        let inner = summary_block.inner(chunks[1]);
        let summary_text = match &state {
            Some(state) if !state.summary.is_empty() => format_summary(Some(&state.summary)),
            Some(_) => "No episode notes.".to_string(),
            None => String::new(),
        };
        self.summary.set_content(summary_text);
        self.summary.set_dimensions(inner.width, inner.height);
        let summary_widget = Paragraph::new(self.summary.content.clone())
            .wrap(Wrap { trim: true })
            .block(summary_block)
            .scroll((self.summary.scroll_offset_vertical, 0));
        f.render_widget(summary_widget, chunks[1]);

        // === Hint bar ===
        let hints = "[Space] Play/Pause | [n] Next | [v] Volume | [↑/↓] Notes | [Esc] Back";
        let hint_widget = Paragraph::new(hints)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(ratatui::layout::Alignment::Center);
        f.render_widget(hint_widget, chunks[2]);
    }
}

fn fmt_duration(duration: Option<Duration>) -> String {
    match duration {
        None => "--:--".to_string(),
        Some(duration) => {
            let total = duration.as_secs();
            let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
            if hours > 0 {
                format!("{hours}:{minutes:02}:{seconds:02}")
            } else {
                format!("{minutes}:{seconds:02}")
            }
        }
    }
}
