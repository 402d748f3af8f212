use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::ui::theme::Theme;

pub struct MenuItem {
    pub key: String,
    pub label: String,
    pub description: String,
}

impl MenuItem {
    fn new(key: &str, label: &str, description: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            description: description.to_string(),
        }
    }
}

pub struct Menu<'a> {
    pub items: Vec<MenuItem>,
    pub selected: usize,
    pub subtitle: String,
    pub theme: &'a Theme,
}

impl<'a> Menu<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self {
            items: vec![
                MenuItem::new("1", "Words", "Browse, search and edit your vocabulary"),
                MenuItem::new("2", "Lists", "Create, rename and delete word lists"),
                MenuItem::new("3", "Training", "Quiz yourself on the words of some lists"),
                MenuItem::new("q", "Quit", "Leave kotoba"),
            ],
            selected: 0,
            subtitle: String::new(),
            theme,
        }
    }

    pub fn with_selected(mut self, selected: usize) -> Self {
        self.selected = selected.min(self.items.len() - 1);
        self
    }

    pub fn with_subtitle(mut self, subtitle: String) -> Self {
        self.subtitle = subtitle;
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl Widget for &Menu<'_> {
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
                Constraint::Length(5),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        let title_lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "kotoba",
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Terminal Vocabulary Trainer",
                Style::default().fg(colors.fg()),
            )),
            Line::from(Span::styled(
                self.subtitle.as_str(),
                Style::default().fg(colors.text_dim()),
            )),
        ];

        let title = Paragraph::new(title_lines).alignment(Alignment::Center);
        title.render(layout[0], buf);

        let menu_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                self.items
                    .iter()
                    .map(|_| Constraint::Length(3))
                    .collect::<Vec<_>>(),
            )
            .split(layout[2]);

        for (i, item) in self.items.iter().enumerate() {
            let is_selected = i == self.selected;
            let indicator = if is_selected { ">" } else { " " };

            let label_text = format!(" {indicator} [{key}] {label}", key = item.key, label = item.label);
            let desc_text = format!("     {}", item.description);

            let lines = vec![
                Line::from(Span::styled(
                    label_text,
                    Style::default()
                        .fg(if is_selected {
                            colors.accent()
                        } else {
                            colors.fg()
                        })
                        .add_modifier(if is_selected {
                            Modifier::BOLD
                        } else {
                            Modifier::empty()
                        }),
                )),
                Line::from(Span::styled(desc_text, Style::default().fg(colors.text_dim()))),
            ];

            if let Some(row) = menu_layout.get(i) {
                Paragraph::new(lines).render(*row, buf);
            }
        }
    }
}
