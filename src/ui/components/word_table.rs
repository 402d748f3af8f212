use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Cell, Row, StatefulWidget, Table, TableState, Widget};

use crate::ui::theme::Theme;
use crate::vocab::{Word, WordList};

pub struct WordTable<'a> {
    words: &'a [&'a Word],
    lists: &'a [WordList],
    selected: Option<usize>,
    title: String,
    theme: &'a Theme,
}

impl<'a> WordTable<'a> {
    pub fn new(words: &'a [&'a Word], lists: &'a [WordList], theme: &'a Theme) -> Self {
        Self {
            words,
            lists,
            selected: None,
            title: format!(" Words ({}) ", words.len()),
            theme,
        }
    }

    pub fn with_selected(mut self, selected: Option<usize>) -> Self {
        self.selected = selected.filter(|&i| i < self.words.len());
        self
    }

    /// Names of the lists `word` belongs to; unknown ids are skipped.
    fn list_names(&self, word: &Word) -> String {
        let Some(ids) = word.lists.as_ref() else {
            return String::new();
        };
        ids.iter()
            .filter_map(|id| self.lists.iter().find(|l| &l.id == id))
            .map(|l| l.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Widget for WordTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(self.title.as_str())
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));

        let header = Row::new(["Kanji", "Kana", "Translation", "Secondary", "Lists"]).style(
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        );

        let rows = self.words.iter().map(|w| {
            Row::new([
                Cell::from(w.kanji.clone().unwrap_or_default()),
                Cell::from(w.kana.clone()),
                Cell::from(w.traduction.clone()),
                Cell::from(w.secondary_traduction.clone().unwrap_or_default()),
                Cell::from(self.list_names(w)).style(Style::default().fg(colors.text_dim())),
            ])
            .style(Style::default().fg(colors.fg()))
        });

        let table = Table::new(
            rows,
            [
                Constraint::Percentage(15),
                Constraint::Percentage(20),
                Constraint::Percentage(25),
                Constraint::Percentage(20),
                Constraint::Percentage(20),
            ],
        )
        .header(header)
        .block(block)
        .row_highlight_style(
            Style::default()
                .bg(colors.selection_bg())
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

        let mut state = TableState::default().with_selected(self.selected);
        StatefulWidget::render(table, area, buf, &mut state);
    }
}
