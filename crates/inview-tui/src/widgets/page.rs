use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, Reveal, Section, SectionKind};
use crate::content;
use crate::theme::Theme;

/// Renders the slice of the page that falls inside the viewport
pub struct PageWidget;

impl PageWidget {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let offset = app.offset() as i32;
        let bottom = area.height as i32;

        for (index, section) in app.sections.iter().enumerate() {
            let top = section.top as i32 - offset;
            let end = top + section.height as i32;
            if end <= 0 || top >= bottom {
                continue;
            }

            let visible_top = top.max(0);
            let visible_end = end.min(bottom);
            let rect = Rect::new(
                area.x,
                area.y + visible_top as u16,
                area.width,
                (visible_end - visible_top) as u16,
            );

            let bg = if index % 2 == 0 { app.theme.bg0 } else { app.theme.bg1 };
            let paragraph = Paragraph::new(section_lines(app, section))
                .style(Style::default().fg(app.theme.fg0).bg(bg))
                .scroll(((visible_top - top) as u16, 0));
            frame.render_widget(paragraph, rect);
        }
    }
}

fn section_lines(app: &App, section: &Section) -> Vec<Line<'static>> {
    let theme = &app.theme;
    let mut lines = vec![Line::from(""), heading(theme, section.kind)];

    match section.kind {
        SectionKind::Hero => {
            lines.push(Line::from(Span::styled(
                format!("  {}", content::TAGLINE),
                Style::default().fg(theme.fg1).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(""));
            lines.extend(content::HERO_LINES.iter().map(|text| Line::from(format!("  {}", text))));
            lines.push(Line::from(""));
            lines.push(muted(theme, "  j/k to scroll, q to quit"));
        }
        SectionKind::Stats => {
            for stat in &app.stats {
                let marker = if stat.counter.is_animating() { " ..." } else { "" };
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("  {:>10}{:<2}", format_count(stat.counter.count()), stat.suffix),
                        Style::default().fg(theme.counter).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(format!(" {}", stat.label)),
                    Span::styled(marker.to_string(), Style::default().fg(theme.grey0)),
                ]));
                lines.push(Line::from(""));
            }
        }
        SectionKind::Features => match app.features.content() {
            Some(features) => {
                for feature in features {
                    lines.push(Line::from(vec![
                        Span::styled("  * ", Style::default().fg(theme.green)),
                        Span::styled(
                            feature.title.clone(),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                    ]));
                    lines.push(Line::from(format!("    {}", feature.body)));
                }
            }
            None => lines.push(placeholder(
                theme,
                "  Features load when this section comes into view",
            )),
        },
        SectionKind::Testimonials => {
            let body: Vec<Line<'static>> = content::TESTIMONIALS
                .iter()
                .flat_map(|(author, quote)| {
                    [
                        Line::from(Span::styled(
                            format!("  \"{}\"", quote),
                            Style::default().fg(theme.fg1),
                        )),
                        Line::from(Span::styled(
                            format!("      {}", author),
                            Style::default().fg(theme.purple),
                        )),
                    ]
                })
                .collect();
            lines.extend(revealed(&app.testimonials, body));
        }
        SectionKind::Pricing => match app.pricing.content() {
            Some(plans) => {
                for plan in plans {
                    lines.push(Line::from(vec![
                        Span::styled(
                            format!("  {:<8}", plan.name),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(
                            format!("{:>5}/mo", plan.price),
                            Style::default().fg(theme.yellow),
                        ),
                    ]));
                    lines.push(Line::from(Span::styled(
                        format!("    {}", plan.perks.join(", ")),
                        Style::default().fg(theme.grey1),
                    )));
                    lines.push(Line::from(""));
                }
            }
            None => lines.push(placeholder(
                theme,
                "  Pricing loads when this section comes into view",
            )),
        },
        SectionKind::Faq => {
            let body: Vec<Line<'static>> = content::FAQ
                .iter()
                .flat_map(|(question, answer)| {
                    [
                        Line::from(Span::styled(
                            format!("  Q: {}", question),
                            Style::default().fg(theme.blue),
                        )),
                        Line::from(format!("  A: {}", answer)),
                        Line::from(""),
                    ]
                })
                .collect();
            lines.extend(revealed(&app.faq, body));
        }
        SectionKind::Footer => {
            lines.push(muted(theme, "  inview, a viewport-driven activation runtime"));
        }
    }

    lines
}

fn heading(theme: &Theme, kind: SectionKind) -> Line<'static> {
    Line::from(Span::styled(
        format!("  {}", kind.title()),
        Style::default().fg(theme.heading).add_modifier(Modifier::BOLD),
    ))
}

fn muted(theme: &Theme, text: &str) -> Line<'static> {
    Line::from(Span::styled(text.to_string(), Style::default().fg(theme.grey1)))
}

fn placeholder(theme: &Theme, text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(theme.placeholder).add_modifier(Modifier::ITALIC),
    ))
}

/// Keep the revealed share of `body`
fn revealed(reveal: &Reveal, body: Vec<Line<'static>>) -> Vec<Line<'static>> {
    let shown = (body.len() as f64 * reveal.fraction()).ceil() as usize;
    body.into_iter().take(shown).collect()
}

/// Format a counter value with thousands separators
fn format_count(value: f64) -> String {
    let digits = (value.max(0.0).floor() as u64).to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
