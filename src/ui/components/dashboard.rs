use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Cell, Paragraph, Row, Table, Widget};

use crate::session::result::QuizResult;
use crate::ui::theme::Theme;

/// End-of-quiz summary: score over the whole pool and one row per answer.
pub struct Dashboard<'a> {
    pub result: &'a QuizResult,
    pub best_percent: Option<f64>,
    pub theme: &'a Theme,
}

impl<'a> Dashboard<'a> {
    pub fn new(result: &'a QuizResult, best_percent: Option<f64>, theme: &'a Theme) -> Self {
        Self {
            result,
            best_percent,
            theme,
        }
    }
}

impl Widget for Dashboard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Training Complete ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(inner);

        let mut title_spans = vec![Span::styled(
            self.result.mode.label(),
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        )];
        if self.result.partial {
            title_spans.push(Span::styled(
                "  (stopped early)",
                Style::default().fg(colors.text_dim()),
            ));
        }
        Paragraph::new(Line::from(title_spans))
            .alignment(Alignment::Center)
            .render(layout[0], buf);

        let percent = self.result.percent();
        let score_color = if percent >= 90.0 {
            colors.success()
        } else if percent >= 60.0 {
            colors.warning()
        } else {
            colors.error()
        };
        let mut score_spans = vec![
            Span::styled("  Score: ", Style::default().fg(colors.fg())),
            Span::styled(
                format!("{}/{}", self.result.correct, self.result.total),
                Style::default().fg(score_color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  ({percent:.0}%)"), Style::default().fg(colors.text_dim())),
        ];
        if let Some(best) = self.best_percent {
            score_spans.push(Span::styled(
                format!("  best {best:.0}%"),
                Style::default().fg(colors.text_dim()),
            ));
        }
        Paragraph::new(Line::from(score_spans)).render(layout[1], buf);

        let header = Row::new(["Kanji", "Your answer", "Expected", ""]).style(
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        );
        let rows = self.result.records.iter().map(|r| {
            let (mark, color) = if r.is_valid {
                ("\u{2713}", colors.text_correct())
            } else {
                ("\u{2717}", colors.text_incorrect())
            };
            Row::new([
                Cell::from(r.kanji.clone().unwrap_or_else(|| r.kana.clone())),
                Cell::from(r.guess.clone()).style(Style::default().fg(color)),
                Cell::from(r.expected.clone().unwrap_or_default()),
                Cell::from(mark).style(Style::default().fg(color)),
            ])
            .style(Style::default().fg(colors.fg()))
        });
        let table = Table::new(
            rows,
            [
                Constraint::Percentage(25),
                Constraint::Percentage(35),
                Constraint::Percentage(35),
                Constraint::Length(2),
            ],
        )
        .header(header);
        Widget::render(table, layout[2], buf);

        Paragraph::new(Line::from(vec![
            Span::styled("  [r] Retry  ", Style::default().fg(colors.accent())),
            Span::styled("[t] New training  ", Style::default().fg(colors.accent())),
            Span::styled("[q/Esc] Menu", Style::default().fg(colors.accent())),
        ]))
        .render(layout[3], buf);
    }
}
