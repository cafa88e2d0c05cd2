use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::app::TimerPhase;
use crate::ui::theme::Theme;

/// The main timer view: scramble on top, the clock in the middle, the
/// gesture status underneath.
pub struct TimerPanel<'a> {
    pub scramble: &'a str,
    pub clock_text: &'a str,
    pub status_text: &'a str,
    pub phase: TimerPhase,
    pub generating: bool,
    pub theme: &'a Theme,
}

impl<'a> TimerPanel<'a> {
    pub fn new(
        scramble: &'a str,
        clock_text: &'a str,
        status_text: &'a str,
        phase: TimerPhase,
        generating: bool,
        theme: &'a Theme,
    ) -> Self {
        Self {
            scramble,
            clock_text,
            status_text,
            phase,
            generating,
            theme,
        }
    }

    fn clock_color(&self) -> ratatui::style::Color {
        let colors = &self.theme.colors;
        match self.phase {
            TimerPhase::Holding { .. } => colors.timer_holding(),
            TimerPhase::Armed => colors.timer_armed(),
            TimerPhase::Running { .. } => colors.timer_running(),
            TimerPhase::Finished { .. } => colors.success(),
            TimerPhase::Idle => colors.timer_idle(),
        }
    }
}

impl Widget for TimerPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(3),
                Constraint::Length(2),
            ])
            .split(inner);

        let scramble_text = if self.generating {
            "Generating scrambles…".to_string()
        } else {
            self.scramble.to_string()
        };
        let scramble_style = if self.generating {
            Style::default().fg(colors.text_dim())
        } else {
            Style::default().fg(colors.fg())
        };
        let scramble = Paragraph::new(scramble_text)
            .style(scramble_style)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        scramble.render(layout[0], buf);

        // Vertically center the clock within its band.
        let clock_area = layout[1];
        let pad = clock_area.height.saturating_sub(1) / 2;
        let clock_lines: Vec<Line> = (0..pad)
            .map(|_| Line::from(""))
            .chain(std::iter::once(Line::from(Span::styled(
                self.clock_text,
                Style::default()
                    .fg(self.clock_color())
                    .add_modifier(Modifier::BOLD),
            ))))
            .collect();
        Paragraph::new(clock_lines)
            .alignment(Alignment::Center)
            .render(clock_area, buf);

        let status = Paragraph::new(Line::from(Span::styled(
            self.status_text,
            Style::default().fg(colors.text_dim()),
        )))
        .alignment(Alignment::Center);
        status.render(layout[2], buf);
    }
}
