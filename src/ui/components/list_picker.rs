use std::collections::BTreeSet;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::store::vocabulary::count_members;
use crate::ui::theme::Theme;
use crate::vocab::{ListId, Word, WordList};

/// Word lists with a checkbox for each selected id and the member count.
pub struct ListPicker<'a> {
    lists: &'a [WordList],
    words: &'a [Word],
    checked: Option<&'a BTreeSet<ListId>>,
    cursor: Option<usize>,
    title: &'a str,
    focused: bool,
    theme: &'a Theme,
}

impl<'a> ListPicker<'a> {
    pub fn new(lists: &'a [WordList], words: &'a [Word], theme: &'a Theme) -> Self {
        Self {
            lists,
            words,
            checked: None,
            cursor: None,
            title: " Lists ",
            focused: false,
            theme,
        }
    }

    /// Show a checkbox column driven by `checked`.
    pub fn checkable(mut self, checked: &'a BTreeSet<ListId>) -> Self {
        self.checked = Some(checked);
        self
    }

    pub fn with_cursor(mut self, cursor: Option<usize>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn with_title(mut self, title: &'a str) -> Self {
        self.title = title;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn line(&self, index: usize, list: &WordList) -> Line<'a> {
        let colors = &self.theme.colors;
        let at_cursor = self.focused && self.cursor == Some(index);
        let mut spans = Vec::new();

        spans.push(Span::styled(
            if at_cursor { "> " } else { "  " },
            Style::default().fg(colors.accent()),
        ));
        if let Some(checked) = self.checked {
            let mark = if checked.contains(&list.id) { "[x] " } else { "[ ] " };
            spans.push(Span::styled(mark, Style::default().fg(colors.accent())));
        }
        let name_style = if at_cursor {
            Style::default()
                .fg(colors.accent())
                .bg(colors.selection_bg())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors.fg())
        };
        spans.push(Span::styled(list.name.clone(), name_style));
        spans.push(Span::styled(
            format!("  ({})", count_members(self.words, &list.id)),
            Style::default().fg(colors.text_dim()),
        ));
        Line::from(spans)
    }
}

impl Widget for ListPicker<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let border = if self.focused {
            colors.border_focused()
        } else {
            colors.border()
        };
        let block = Block::bordered()
            .title(self.title)
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        if self.lists.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                "  No lists yet",
                Style::default().fg(colors.text_dim()),
            )))
            .render(inner, buf);
            return;
        }

        // Keep the cursor row visible.
        let height = inner.height as usize;
        let offset = match self.cursor {
            Some(c) if height > 0 && c >= height => c + 1 - height,
            _ => 0,
        };
        let lines: Vec<Line> = self
            .lists
            .iter()
            .enumerate()
            .skip(offset)
            .take(height)
            .map(|(i, list)| self.line(i, list))
            .collect();
        Paragraph::new(lines).render(inner, buf);
    }
}
