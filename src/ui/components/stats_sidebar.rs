use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::session::stats::{SessionStats, format_time};
use crate::ui::theme::Theme;

/// Session stats plus the recent-times column.
pub struct StatsSidebar<'a> {
    pub stats: SessionStats,
    pub recent: Vec<f64>,
    pub theme: &'a Theme,
}

impl<'a> StatsSidebar<'a> {
    pub fn new(stats: SessionStats, recent: Vec<f64>, theme: &'a Theme) -> Self {
        Self {
            stats,
            recent,
            theme,
        }
    }
}

fn stat_line<'a>(label: &'a str, value: Option<f64>, theme: &'a Theme) -> Line<'a> {
    let colors = &theme.colors;
    let text = match value {
        Some(v) => format_time(v),
        None => "--".to_string(),
    };
    Line::from(vec![
        Span::styled(format!("{label:<6}"), Style::default().fg(colors.text_dim())),
        Span::styled(text, Style::default().fg(colors.fg())),
    ])
}

impl Widget for StatsSidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Session ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines = vec![
            Line::from(vec![
                Span::styled("Solves", Style::default().fg(colors.text_dim())),
                Span::styled(
                    format!(" {}", self.stats.count),
                    Style::default()
                        .fg(colors.accent())
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            stat_line("Best", self.stats.best, self.theme),
            stat_line("Mean", self.stats.mean, self.theme),
            stat_line("Ao5", self.stats.ao5, self.theme),
            stat_line("Ao12", self.stats.ao12, self.theme),
            Line::from(""),
        ];

        if !self.recent.is_empty() {
            lines.push(Line::from(Span::styled(
                "Recent",
                Style::default().fg(colors.text_dim()),
            )));
            for (i, time) in self.recent.iter().enumerate() {
                let style = if i == 0 {
                    Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(colors.fg())
                };
                lines.push(Line::from(Span::styled(format_time(*time), style)));
            }
        }

        Paragraph::new(lines).render(inner, buf);
    }
}
