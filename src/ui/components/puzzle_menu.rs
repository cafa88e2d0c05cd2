use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::scramble::{PuzzleKind, ScrambleSpec};
use crate::ui::theme::Theme;

/// Sectioned puzzle selector: WCA events first, then trainer drills.
/// `selected` indexes into `specs`; the list scrolls to keep it visible.
pub struct PuzzleMenu<'a> {
    specs: &'a [ScrambleSpec],
    selected: usize,
    theme: &'a Theme,
}

enum Row<'a> {
    Header(&'static str),
    Puzzle(usize, &'a ScrambleSpec),
}

impl<'a> PuzzleMenu<'a> {
    pub fn new(specs: &'a [ScrambleSpec], selected: usize, theme: &'a Theme) -> Self {
        Self {
            specs,
            selected,
            theme,
        }
    }

    fn rows(&self) -> Vec<Row<'a>> {
        let mut rows = Vec::with_capacity(self.specs.len() + 2);
        let mut last_kind: Option<PuzzleKind> = None;
        for (i, spec) in self.specs.iter().enumerate() {
            if last_kind != Some(spec.kind()) {
                rows.push(Row::Header(match spec.kind() {
                    PuzzleKind::Wca => "WCA Events",
                    PuzzleKind::Trainer => "Trainer Drills",
                }));
                last_kind = Some(spec.kind());
            }
            rows.push(Row::Puzzle(i, spec));
        }
        rows
    }
}

impl Widget for PuzzleMenu<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Select Puzzle ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let rows = self.rows();
        let visible = inner.height as usize;
        if visible == 0 {
            return;
        }

        let selected_row = rows
            .iter()
            .position(|r| matches!(r, Row::Puzzle(i, _) if *i == self.selected))
            .unwrap_or(0);
        let offset = selected_row.saturating_sub(visible.saturating_sub(1) / 2);
        let offset = offset.min(rows.len().saturating_sub(visible));

        let lines: Vec<Line> = rows
            .iter()
            .skip(offset)
            .take(visible)
            .map(|row| match row {
                Row::Header(title) => Line::from(Span::styled(
                    format!(" {title}"),
                    Style::default()
                        .fg(colors.accent())
                        .add_modifier(Modifier::BOLD),
                )),
                Row::Puzzle(i, spec) => {
                    let is_selected = *i == self.selected;
                    let indicator = if is_selected { ">" } else { " " };
                    let style = if is_selected {
                        Style::default()
                            .fg(colors.accent())
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(colors.fg())
                    };
                    Line::from(Span::styled(
                        format!("  {indicator} {}", spec.id()),
                        style,
                    ))
                }
            })
            .collect();

        Paragraph::new(lines).render(inner, buf);
    }
}
