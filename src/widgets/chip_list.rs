// src/widgets/chip_list.rs
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::ListItem;
use unicode_width::UnicodeWidthChar;

/// Truncates a label to the given display width, ellipsis included. Width is
/// measured in terminal columns, not chars, so wide glyphs count double.
pub fn truncate_label(label: &str, max_width: usize) -> String {
    let total: usize = label.chars().map(|ch| ch.width().unwrap_or(0)).sum();
    if total <= max_width {
        return label.to_string();
    }
    let mut width = 0usize;
    let mut truncated = String::new();
    for ch in label.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width.saturating_sub(1) {
            break;
        }
        width += ch_width;
        truncated.push(ch);
    }
    truncated.push('…');
    truncated
}

/// Chip-style list row: a primary label with an optional dimmed secondary
/// line, matching the watch UI's two-line media chips.
pub fn chip<'a>(
    label: &str,
    secondary: Option<&str>,
    width: u16,
    selected: bool,
) -> ListItem<'a> {
    let max_width = width.saturating_sub(4) as usize;
    let label_style = if selected {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };

    let mut lines = vec![Line::from(Span::styled(truncate_label(label, max_width), label_style))];
    if let Some(secondary) = secondary {
        lines.push(Line::from(Span::styled(
            format!("  {}", truncate_label(secondary, max_width)),
            Style::default().fg(Color::DarkGray),
        )));
    }
    ListItem::new(lines)
}
