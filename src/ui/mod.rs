// src/ui/mod.rs
pub mod home_screen;
pub mod latest_screen;
pub mod navigation;
pub mod player_screen;
pub mod up_next_screen;
pub mod volume_screen;

use crate::data::Graph;
use crate::podcast::EpisodeUri;
use crate::ui::home_screen::HomeScreen;
use crate::ui::latest_screen::LatestEpisodesScreen;
use crate::ui::navigation::{NavController, Route};
use crate::ui::player_screen::PlayerScreen;
use crate::ui::up_next_screen::UpNextScreen;
use crate::ui::volume_screen::VolumeScreen;
use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, warn};
use ratatui::{Frame, Terminal, backend::Backend};
use std::io;
use std::time::Duration;

/// Renders an episode summary for the notes panel. Feed summaries are often
/// HTML; anything that looks like markup goes through html2text first.
pub fn format_summary(summary: Option<&str>) -> String {
    const DEFAULT_TEXT_WIDTH: usize = 80;
    match summary {
        Some(text) => {
            if text.contains('<') && text.contains('>') && text.contains("</") {
                match html2text::from_read(text.as_bytes(), DEFAULT_TEXT_WIDTH) {
                    Ok(rendered) => rendered
                        .lines()
                        .map(|line| line.trim_end())
                        .filter(|line| !line.is_empty())
                        .collect::<Vec<&str>>()
                        .join("\n"),
                    Err(render_err) => {
                        warn!("failed to render HTML summary: {render_err}");
                        text.to_string()
                    }
                }
            } else {
                text.to_string()
            }
        }
        None => "No episode notes.".to_string(),
    }
    .trim()
    .to_string()
}

/// Top-level composition: owns the route stack and one screen instance per
/// active route. Pushing a route constructs its screen (and with it the
/// screen's view model and scope); leaving the route drops the screen, which
/// tears the scope down.
pub struct Shell {
    graph: Graph,
    nav: NavController,
    pub should_quit: bool,
    home: HomeScreen,
    latest: Option<LatestEpisodesScreen>,
    player: Option<(Option<EpisodeUri>, PlayerScreen)>,
    up_next: Option<UpNextScreen>,
    volume: Option<VolumeScreen>,
}

impl Shell {
    pub fn new(graph: Graph) -> Self {
        let home = HomeScreen::new(&graph);
        Self {
            graph,
            nav: NavController::new(),
            should_quit: false,
            home,
            latest: None,
            player: None,
            up_next: None,
            volume: None,
        }
    }

    pub fn on_key(&mut self, key: KeyCode) {
        if key == KeyCode::Char('q') {
            self.should_quit = true;
            return;
        }
        if matches!(key, KeyCode::Esc | KeyCode::Backspace) {
            self.nav.pop();
            self.sync_screens();
            return;
        }

        match self.nav.current().clone() {
            Route::Home => self.home.on_key(key, &mut self.nav),
            Route::LatestEpisodes => {
                if let Some(screen) = self.latest.as_mut() {
                    screen.on_key(key, &mut self.nav);
                }
            }
            Route::Player { .. } => {
                if let Some((_, screen)) = self.player.as_mut() {
                    screen.on_key(key, &mut self.nav);
                }
            }
            Route::UpNext => {
                if let Some(screen) = self.up_next.as_mut() {
                    screen.on_key(key);
                }
            }
            Route::Volume => {
                if let Some(screen) = self.volume.as_mut() {
                    screen.on_key(key);
                }
            }
        }
        self.sync_screens();
    }

    pub fn render(&mut self, f: &mut Frame) {
        match self.nav.current().clone() {
            Route::Home => self.home.render(f),
            Route::LatestEpisodes => {
                if let Some(screen) = self.latest.as_mut() {
                    screen.render(f);
                }
            }
            Route::Player { .. } => {
                if let Some((_, screen)) = self.player.as_mut() {
                    screen.render(f);
                }
            }
            Route::UpNext => {
                if let Some(screen) = self.up_next.as_mut() {
                    screen.render(f);
                }
            }
            Route::Volume => {
                if let Some(screen) = self.volume.as_mut() {
                    screen.render(f);
                }
            }
        }
    }

    /// Brings screen instances in line with the route stack: the current
    /// route gets a screen, routes that left the stack lose theirs.
    fn sync_screens(&mut self) {
        match self.nav.current().clone() {
            Route::Home => {}
            Route::LatestEpisodes => {
                if self.latest.is_none() {
                    self.latest = Some(LatestEpisodesScreen::new(&self.graph));
                }
            }
            Route::Player { episode_uri } => {
                let stale = self
                    .player
                    .as_ref()
                    .is_none_or(|(current_uri, _)| *current_uri != episode_uri);
                if stale {
                    self.player = Some((
                        episode_uri.clone(),
                        PlayerScreen::new(&self.graph, episode_uri),
                    ));
                }
            }
            Route::UpNext => {
                if self.up_next.is_none() {
                    self.up_next = Some(UpNextScreen::new(&self.graph));
                }
            }
            Route::Volume => {
                if self.volume.is_none() {
                    self.volume = Some(VolumeScreen::new());
                }
            }
        }

        let routes = self.nav.routes();
        if !routes.iter().any(|route| matches!(route, Route::LatestEpisodes)) {
            self.latest = None;
        }
        if !routes.iter().any(|route| matches!(route, Route::Player { .. })) {
            self.player = None;
        }
        if !routes.iter().any(|route| matches!(route, Route::UpNext)) {
            self.up_next = None;
        }
        if !routes.iter().any(|route| matches!(route, Route::Volume)) {
            self.volume = None;
        }
    }
}

pub async fn start_ui(graph: Graph) -> Result<()> {
    // Set up the terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut shell = Shell::new(graph);
    let res = run_app_loop(&mut terminal, &mut shell).await;

    // Restore the terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(loop_err) = &res {
        error!("UI loop failed: {loop_err}");
    }
    res
}

pub async fn run_app_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    shell: &mut Shell,
) -> Result<()> {
    while !shell.should_quit {
        terminal.draw(|f| shell.render(f))?;

        // Poll with timeout so view-state updates repaint within a frame
        // even without input.
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind != KeyEventKind::Release {
                    shell.on_key(key_event.code);
                }
            }
        }
        tokio::task::yield_now().await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::repository::FakeSource;
    use std::sync::Arc;

    fn test_shell() -> Shell {
        Shell::new(Graph::new(Arc::new(FakeSource::with_snapshots(vec![]))))
    }

    #[tokio::test]
    async fn test_screens_follow_the_route_stack() {
        let mut shell = test_shell();
        assert_eq!(shell.nav.current(), &Route::Home);

        // First home row is the latest-episodes chip.
        shell.on_key(KeyCode::Enter);
        assert_eq!(shell.nav.current(), &Route::LatestEpisodes);
        assert!(shell.latest.is_some());

        shell.on_key(KeyCode::Esc);
        assert_eq!(shell.nav.current(), &Route::Home);
        assert!(shell.latest.is_none(), "dismissed screens are torn down");
    }

    #[tokio::test]
    async fn test_player_screen_rebuilds_for_a_different_episode() {
        let mut shell = test_shell();
        shell.nav.navigate_to_player(Some(EpisodeUri::new("ep1")));
        shell.sync_screens();
        assert!(shell.player.as_ref().is_some_and(|(uri, _)| uri.as_ref().is_some()));

        shell.nav.navigate_to_player(None);
        shell.sync_screens();
        assert!(shell.player.as_ref().is_some_and(|(uri, _)| uri.is_none()));
    }

    #[tokio::test]
    async fn test_quit_key_stops_the_loop() {
        let mut shell = test_shell();
        shell.on_key(KeyCode::Char('q'));
        assert!(shell.should_quit);
    }

    #[test]
    fn test_format_summary_strips_html() {
        let formatted = format_summary(Some("<p>Hello <b>world</b></p>"));
        assert!(formatted.contains("Hello"));
        assert!(!formatted.contains('<'));
        assert_eq!(format_summary(None), "No episode notes.");
    }
}
