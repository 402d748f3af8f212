use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::session::quiz::{GuessRecord, QuizSession};
use crate::ui::line_input::LineInput;
use crate::ui::theme::Theme;

/// Current prompt, the guess being typed and feedback on the previous answer.
pub struct QuizCard<'a> {
    quiz: &'a QuizSession,
    input: &'a LineInput,
    notice: Option<&'a str>,
    theme: &'a Theme,
}

impl<'a> QuizCard<'a> {
    pub fn new(quiz: &'a QuizSession, input: &'a LineInput, theme: &'a Theme) -> Self {
        Self {
            quiz,
            input,
            notice: None,
            theme,
        }
    }

    pub fn with_notice(mut self, notice: Option<&'a str>) -> Self {
        self.notice = notice;
        self
    }

    fn feedback(&self, last: &GuessRecord) -> Line<'static> {
        let colors = &self.theme.colors;
        let expected = last
            .word
            .field(self.quiz.mode().answer_field())
            .unwrap_or("")
            .to_string();
        if last.is_valid {
            Line::from(Span::styled(
                format!("\u{2713} {expected}"),
                Style::default().fg(colors.text_correct()),
            ))
        } else {
            Line::from(vec![
                Span::styled(
                    format!("\u{2717} {}", last.guess),
                    Style::default().fg(colors.text_incorrect()),
                ),
                Span::styled("  expected ", Style::default().fg(colors.text_dim())),
                Span::styled(expected, Style::default().fg(colors.fg())),
            ])
        }
    }
}

impl Widget for QuizCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(" {} ", self.quiz.mode().label()))
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(inner);

        let prompt = self.quiz.prompt().unwrap_or("");
        let prompt_lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                prompt.to_string(),
                Style::default()
                    .fg(colors.prompt())
                    .add_modifier(Modifier::BOLD),
            )),
        ];
        Paragraph::new(prompt_lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(layout[0], buf);

        let input_line = self.input.to_line(colors, true);
        Paragraph::new(input_line)
            .block(
                Block::bordered()
                    .title(" Answer ")
                    .border_style(Style::default().fg(colors.border())),
            )
            .render(layout[1], buf);

        let mut feedback = Vec::new();
        if let Some(last) = self.quiz.records().last() {
            feedback.push(self.feedback(last));
        }
        if let Some(notice) = self.notice {
            feedback.push(Line::from(Span::styled(
                notice.to_string(),
                Style::default().fg(colors.warning()),
            )));
        }
        Paragraph::new(feedback)
            .alignment(Alignment::Center)
            .render(layout[2], buf);

        Paragraph::new(Line::from(Span::styled(
            "  [Enter] Submit  [Esc] Stop",
            Style::default().fg(colors.accent()),
        )))
        .render(layout[3], buf);
    }
}
