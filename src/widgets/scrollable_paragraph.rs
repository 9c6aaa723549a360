// src/widgets/scrollable_paragraph.rs

/// Scroll state for a long text panel (episode summaries). Content changes
/// reset the offset; scrolling is clamped against the last known panel size
/// so the view cannot run past the end of the text.
#[derive(Debug, Default, Clone)]
pub struct ScrollableParagraphState {
    pub content: String,
    pub scroll_offset_vertical: u16,
    panel_width: u16,
    panel_height: u16,
}

impl ScrollableParagraphState {
    pub fn new(content: String) -> Self {
        Self { content, scroll_offset_vertical: 0, panel_width: 0, panel_height: 0 }
    }

    pub fn set_content(&mut self, content: String) {
        if self.content != content {
            self.content = content;
            self.scroll_offset_vertical = 0;
        }
    }

    /// Called by the layout pass before drawing, with the panel's inner area.
    pub fn set_dimensions(&mut self, width: u16, height: u16) {
        self.panel_width = width;
        self.panel_height = height;
        self.scroll_offset_vertical = self.scroll_offset_vertical.min(self.max_scroll());
    }

    pub fn scroll_up(&mut self, amount: u16) {
        self.scroll_offset_vertical = self.scroll_offset_vertical.saturating_sub(amount);
    }

    pub fn scroll_down(&mut self, amount: u16) {
        self.scroll_offset_vertical =
            self.scroll_offset_vertical.saturating_add(amount).min(self.max_scroll());
    }

    fn max_scroll(&self) -> u16 {
        let lines = self.wrapped_line_count();
        lines.saturating_sub(self.panel_height as usize) as u16
    }

    // Estimate of how many lines the paragraph wraps to at the panel width.
    fn wrapped_line_count(&self) -> usize {
        if self.panel_width == 0 {
            return self.content.lines().count();
        }
        let width = self.panel_width as usize;
        self.content
            .lines()
            .map(|line| {
                let chars = line.chars().count();
                if chars == 0 { 1 } else { chars.div_ceil(width) }
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_content_resets_scroll() {
        let mut state = ScrollableParagraphState::new("a\nb\nc\nd\ne".to_string());
        state.set_dimensions(20, 2);
        state.scroll_down(2);
        assert_eq!(state.scroll_offset_vertical, 2);

        state.set_content("other".to_string());
        assert_eq!(state.scroll_offset_vertical, 0);
        // Same content leaves the offset alone.
        state.scroll_down(0);
        state.set_content("other".to_string());
        assert_eq!(state.scroll_offset_vertical, 0);
    }

    #[test]
    fn test_scroll_clamps_to_content_height() {
        let mut state = ScrollableParagraphState::new("a\nb\nc\nd\ne\nf".to_string());
        state.set_dimensions(20, 4);
        state.scroll_down(100);
        assert_eq!(state.scroll_offset_vertical, 2);

        state.scroll_up(100);
        assert_eq!(state.scroll_offset_vertical, 0);
    }

    #[test]
    fn test_wrapped_lines_count_against_panel_width() {
        let mut state = ScrollableParagraphState::new("x".repeat(25));
        state.set_dimensions(10, 1);
        state.scroll_down(100);
        // 25 chars wrap to 3 lines in a 10-wide panel.
        assert_eq!(state.scroll_offset_vertical, 2);
    }
}
