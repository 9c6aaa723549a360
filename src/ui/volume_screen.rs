// src/ui/volume_screen.rs
use crate::state::volume::{VolumeState, VolumeViewModel};
use crossterm::event::KeyCode;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Gauge, Paragraph},
};
use tokio::sync::watch;

pub struct VolumeScreen {
    view_model: VolumeViewModel,
    state_rx: watch::Receiver<VolumeState>,
}

impl VolumeScreen {
    pub fn new() -> Self {
        let view_model = VolumeViewModel::new();
        let state_rx = view_model.subscribe();
        Self { view_model, state_rx }
    }

    pub fn on_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Up | KeyCode::Char('+') => self.view_model.on_volume_up(),
            KeyCode::Down | KeyCode::Char('-') => self.view_model.on_volume_down(),
            _ => {}
        }
    }

    pub fn render(&mut self, f: &mut Frame) {
        let state = *self.state_rx.borrow();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
            .split(f.size());

        let percent = if state.max == 0 {
            0
        } else {
            (u16::from(state.current) * 100 / u16::from(state.max)).min(100)
        };
        let gauge = Gauge::default()
            .block(
                Block::default()
                    .title("Volume")
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Green)),
            )
            .gauge_style(Style::default().fg(Color::LightGreen))
            .percent(percent);
        f.render_widget(gauge, chunks[0]);

        let hints = "[↑/+] Louder | [↓/-] Quieter | [Esc] Back";
        let hint_widget = Paragraph::new(hints)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(ratatui::layout::Alignment::Center);
        f.render_widget(hint_widget, chunks[2]);
    }
}

impl Default for VolumeScreen {
    fn default() -> Self {
        Self::new()
    }
}
