use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use inview_core::ScrollDirection;

use crate::app::{App, SectionKind};

const GAUGE_WIDTH: usize = 10;

pub struct NavBarWidget;

impl NavBarWidget {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = &app.theme;
        let state = app.nav_state();

        // Solid bar once the page is scrolled past the threshold
        let bg = if state.past_threshold { theme.nav_solid } else { theme.bg0 };
        let base = Style::default().fg(theme.grey1).bg(bg);

        let mut spans = vec![Span::styled(
            " inview ",
            Style::default().fg(theme.heading).bg(bg).add_modifier(Modifier::BOLD),
        )];
        let mut left = String::from(" inview ");

        // Links collapse to the current section in the compact style
        let current = app.current_section();
        for kind in SectionKind::ALL {
            if state.past_threshold && kind != current {
                continue;
            }
            let label = format!(" {} ", kind.title());
            let style = if kind == current {
                Style::default().fg(theme.accent).bg(bg).add_modifier(Modifier::BOLD)
            } else {
                base
            };
            left.push_str(&label);
            spans.push(Span::styled(label, style));
        }

        let arrow = match state.direction {
            ScrollDirection::Down => "↓",
            ScrollDirection::Up => "↑",
        };
        let percent = (state.progress * 100.0).round();
        let right = format!(" {} {} {:>3}% ", arrow, gauge(state.progress), percent);

        spans.push(Span::styled(super::padding(area.width, &left, &right), base));
        spans.push(Span::styled(right, Style::default().fg(theme.fg1).bg(bg)));

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

/// Text progress bar for a 0..=1 value
fn gauge(progress: f64) -> String {
    let filled =
        ((progress.clamp(0.0, 1.0) * GAUGE_WIDTH as f64).round() as usize).min(GAUGE_WIDTH);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(GAUGE_WIDTH - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauge() {
        assert_eq!(gauge(0.0), "[----------]");
        assert_eq!(gauge(0.5), "[#####-----]");
        assert_eq!(gauge(1.0), "[##########]");
        assert_eq!(gauge(3.0), "[##########]");
    }
}
