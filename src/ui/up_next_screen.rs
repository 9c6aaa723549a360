// src/ui/up_next_screen.rs
use crate::data::Graph;
use crate::state::up_next::{UpNextViewModel, UpNextViewState};
use crate::widgets::chip_list::chip;
use crossterm::event::KeyCode;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, List, Paragraph, Wrap},
};
use tokio::sync::watch;

pub struct UpNextScreen {
    view_model: UpNextViewModel,
    state_rx: watch::Receiver<UpNextViewState>,
}

impl UpNextScreen {
    pub fn new(graph: &Graph) -> Self {
        let view_model = UpNextViewModel::new(graph);
        let state_rx = view_model.subscribe();
        Self { view_model, state_rx }
    }

    pub fn on_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char(' ') => self.view_model.on_toggle_play(),
            KeyCode::Char('n') => self.view_model.on_next_episode(),
            KeyCode::Char('c') => self.view_model.on_clear_queue(),
            _ => {}
        }
    }

    pub fn render(&mut self, f: &mut Frame) {
        let state = self.state_rx.borrow().clone();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
            .split(f.size());

        // === Now playing strip ===
        let (title, text) = match &state.current {
            Some(episode) => {
                let marker = if state.playing { "▶" } else { "⏸" };
                (
                    "Now Playing".to_string(),
                    format!("{marker} {} - {}", episode.podcast_name, episode.title),
                )
            }
            None => ("Not Playing".to_string(), " ".to_string()),
        };
        let now_playing = Paragraph::new(text).wrap(Wrap { trim: true }).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Green)),
        );
        f.render_widget(now_playing, chunks[0]);

        // === Queue ===
        let width = chunks[1].width;
        let items: Vec<_> = if state.queue.is_empty() {
            vec![chip("Queue is empty", None, width, false)]
        } else {
            state
                .queue
                .iter()
                .map(|episode| {
                    chip(&episode.title, Some(&episode.podcast_name), width, false)
                })
                .collect()
        };
        let list = List::new(items).block(
            Block::default()
                .title("Up Next")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::White)),
        );
        f.render_widget(list, chunks[1]);

        // === Hint bar ===
        let hints = "[Space] Play/Pause | [n] Next | [c] Clear Queue | [Esc] Back";
        let hint_widget = Paragraph::new(hints)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(ratatui::layout::Alignment::Center);
        f.render_widget(hint_widget, chunks[2]);
    }
}
