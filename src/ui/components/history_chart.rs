use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::symbols;
use ratatui::widgets::{Axis, Block, Chart, Dataset, GraphType, Widget};

use crate::ui::theme::Theme;

/// Solve history chart: solve index on x, elapsed seconds on y.
pub struct HistoryChart<'a> {
    title: String,
    data: Vec<(f64, f64)>,
    theme: &'a Theme,
}

impl<'a> HistoryChart<'a> {
    pub fn new(puzzle: &str, times: &[f64], theme: &'a Theme) -> Self {
        let data = times
            .iter()
            .enumerate()
            .map(|(i, t)| ((i + 1) as f64, *t))
            .collect();
        Self {
            title: format!(" {puzzle} Solve History "),
            data,
            theme,
        }
    }
}

impl Widget for HistoryChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        if self.data.is_empty() {
            let block = Block::bordered()
                .title(self.title)
                .border_style(Style::default().fg(colors.border()));
            block.render(area, buf);
            return;
        }

        let max_x = self.data.last().map(|(x, _)| *x).unwrap_or(1.0);
        let max_y = self
            .data
            .iter()
            .map(|(_, y)| *y)
            .fold(0.0f64, f64::max)
            .max(1.0);

        let dataset = Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(colors.accent()))
            .data(&self.data);

        let chart = Chart::new(vec![dataset])
            .block(
                Block::bordered()
                    .title(self.title.clone())
                    .border_style(Style::default().fg(colors.border())),
            )
            .x_axis(
                Axis::default()
                    .title("Solve #")
                    .style(Style::default().fg(colors.text_dim()))
                    .bounds([0.0, max_x]),
            )
            .y_axis(
                Axis::default()
                    .title("Seconds")
                    .style(Style::default().fg(colors.text_dim()))
                    .bounds([0.0, max_y * 1.1]),
            );

        chart.render(area, buf);
    }
}
