use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::App;

pub struct StatusBarWidget;

impl StatusBarWidget {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = &app.theme;

        let built = [app.features.is_activated(), app.pricing.is_activated()]
            .iter()
            .filter(|built| **built)
            .count();

        let status_text = if let Some(msg) = &app.status_message {
            format!(" {}", msg)
        } else {
            format!(
                " Row {}/{} | {} | Built: {}/2 | Marks: {}",
                app.offset(),
                app.document_rows().saturating_sub(app.viewport_rows()),
                app.current_section().title(),
                built,
                app.page.marks().len(),
            )
        };

        let help_hint = " q:quit j/k:row d/u:half g/G:ends r:reset ";
        let padding = super::padding(area.width, &status_text, help_hint);

        let line = Line::from(vec![
            Span::styled(status_text, Style::default().fg(theme.fg0).bg(theme.bg2)),
            Span::styled(padding, Style::default().bg(theme.bg2)),
            Span::styled(help_hint, Style::default().fg(theme.grey1).bg(theme.bg2)),
        ]);

        frame.render_widget(Paragraph::new(line), area);
    }
}
