use std::collections::BTreeSet;
use std::sync::mpsc;

use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use tracing::{info, warn};

use crate::config::Config;
use crate::engine::filter::WordFilter;
use crate::engine::pool::build_pool;
use crate::error::{QuizError, StoreError};
use crate::session::TrainingMode;
use crate::session::quiz::QuizSession;
use crate::session::result::QuizResult;
use crate::store::json_store::JsonStore;
use crate::store::schema::TrainingHistoryData;
use crate::store::vocabulary::{NewWord, Vocabulary};
use crate::ui::line_input::LineInput;
use crate::ui::theme::Theme;
use crate::vocab::{ListId, Word, WordId, WordList, WordPatch};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Menu,
    Words,
    Lists,
    TrainingSetup,
    Quiz,
    QuizResult,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WordsFocus {
    Table,
    Lists,
}

pub const FORM_LABELS: [&str; 4] = ["Kana", "Kanji", "Translation", "Secondary translation"];

/// Fields of the word popup, in `FORM_LABELS` order, followed by the list
/// checkboxes. `editing` is `None` when the popup creates a word.
#[derive(Clone, Debug, Default)]
pub struct WordForm {
    pub editing: Option<WordId>,
    pub fields: [LineInput; 4],
    pub lists: BTreeSet<ListId>,
    pub list_cursor: usize,
    /// Index into `fields`, or `fields.len()` for the list checkboxes.
    pub focus: usize,
}

impl WordForm {
    pub fn new(lists: BTreeSet<ListId>) -> Self {
        Self {
            lists,
            ..Self::default()
        }
    }

    /// Prefilled with `word` and its current lists.
    pub fn for_word(word: &Word) -> Self {
        Self {
            editing: Some(word.id.clone()),
            fields: [
                LineInput::new(&word.kana),
                LineInput::new(word.kanji.as_deref().unwrap_or("")),
                LineInput::new(&word.traduction),
                LineInput::new(word.secondary_traduction.as_deref().unwrap_or("")),
            ],
            lists: word.lists.iter().flatten().cloned().collect(),
            list_cursor: 0,
            focus: 0,
        }
    }

    pub fn on_lists(&self) -> bool {
        self.focus == self.fields.len()
    }

    /// The text field with focus, `None` while the list checkboxes have it.
    pub fn focused_input(&mut self) -> Option<&mut LineInput> {
        self.fields.get_mut(self.focus)
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % (self.fields.len() + 1);
    }

    pub fn prev_field(&mut self) {
        self.focus = (self.focus + self.fields.len()) % (self.fields.len() + 1);
    }

    pub fn toggle_list(&mut self, list_id: &str) {
        if !self.lists.remove(list_id) {
            self.lists.insert(list_id.to_string());
        }
    }

    fn value(&self, i: usize) -> String {
        self.fields[i].value().trim().to_string()
    }

    fn optional(&self, i: usize) -> Option<String> {
        Some(self.value(i)).filter(|v| !v.is_empty())
    }

    fn has_required(&self) -> bool {
        !self.value(0).is_empty() && !self.value(2).is_empty()
    }

    /// `None` until kana and translation are filled in.
    pub fn to_new_word(&self) -> Option<NewWord> {
        if !self.has_required() {
            return None;
        }
        Some(NewWord {
            kana: self.value(0),
            kanji: self.optional(1),
            traduction: self.value(2),
            secondary_traduction: self.optional(3),
            lists: (!self.lists.is_empty()).then(|| self.lists.iter().cloned().collect()),
        })
    }

    /// Every field of the form. Blank optional fields and an empty selection
    /// clear the stored values.
    pub fn to_patch(&self) -> Option<WordPatch> {
        if !self.has_required() {
            return None;
        }
        Some(WordPatch {
            kana: Some(self.value(0)),
            kanji: Some(self.optional(1)),
            traduction: Some(self.value(2)),
            secondary_traduction: Some(self.optional(3)),
            lists: Some(self.lists.iter().cloned().collect()),
        })
    }
}

/// Keyboard-capturing overlay on top of the current screen.
#[derive(Clone, Debug)]
pub enum Modal {
    Search(LineInput),
    Word(WordForm),
    /// `list` is `None` when creating a new list.
    ListName {
        list: Option<ListId>,
        input: LineInput,
    },
    ConfirmDeleteWord(WordId),
    ConfirmDeleteList(ListId),
}

enum Snapshot {
    Words(Vec<Word>),
    Lists(Vec<WordList>),
}

pub struct App {
    pub screen: AppScreen,
    pub theme: &'static Theme,
    pub config: Config,
    pub vocab: Vocabulary<JsonStore>,
    pub words: Vec<Word>,
    pub lists: Vec<WordList>,
    snapshots: mpsc::Receiver<Snapshot>,
    pub menu_selected: usize,
    pub filter: WordFilter,
    pub words_focus: WordsFocus,
    pub word_cursor: usize,
    pub filter_cursor: usize,
    pub list_cursor: usize,
    pub training_lists: BTreeSet<ListId>,
    pub training_cursor: usize,
    pub training_mode: TrainingMode,
    pub quiz: Option<QuizSession>,
    pub guess: LineInput,
    pub quiz_notice: Option<String>,
    pub last_result: Option<QuizResult>,
    pub history: TrainingHistoryData,
    pub modal: Option<Modal>,
    pub status: Option<String>,
    pub should_quit: bool,
    rng: SmallRng,
}

impl App {
    pub fn new(config: Config, mut store: JsonStore, theme: &'static Theme) -> Result<Self> {
        if store.check_interrupted_import()? {
            warn!("settled leftover backups from an interrupted import");
        }
        let history = store.load_history();
        let mut vocab = Vocabulary::new(store, &config.user_id);

        let (tx, snapshots) = mpsc::channel();
        let words_tx = tx.clone();
        vocab.subscribe_words(move |words| {
            let _ = words_tx.send(Snapshot::Words(words));
        })?;
        vocab.subscribe_lists(move |lists| {
            let _ = tx.send(Snapshot::Lists(lists));
        })?;

        let mut app = Self {
            screen: AppScreen::Menu,
            theme,
            training_mode: config.default_mode,
            config,
            vocab,
            words: Vec::new(),
            lists: Vec::new(),
            snapshots,
            menu_selected: 0,
            filter: WordFilter::default(),
            words_focus: WordsFocus::Table,
            word_cursor: 0,
            filter_cursor: 0,
            list_cursor: 0,
            training_lists: BTreeSet::new(),
            training_cursor: 0,
            quiz: None,
            guess: LineInput::default(),
            quiz_notice: None,
            last_result: None,
            history,
            modal: None,
            status: None,
            should_quit: false,
            rng: SmallRng::from_entropy(),
        };
        app.sync();
        info!(
            user = app.vocab.uid(),
            words = app.words.len(),
            lists = app.lists.len(),
            "app ready"
        );
        Ok(app)
    }

    /// Apply pending change notifications from the store. Returns true when
    /// a snapshot was replaced.
    pub fn sync(&mut self) -> bool {
        let mut changed = false;
        while let Ok(snapshot) = self.snapshots.try_recv() {
            match snapshot {
                Snapshot::Words(words) => self.words = words,
                Snapshot::Lists(lists) => self.lists = lists,
            }
            changed = true;
        }
        if changed {
            self.clamp_selection();
        }
        changed
    }

    fn clamp_selection(&mut self) {
        let known: BTreeSet<&ListId> = self.lists.iter().map(|l| &l.id).collect();
        self.filter.lists.retain(|id| known.contains(id));
        self.training_lists.retain(|id| known.contains(id));

        let last_list = self.lists.len().saturating_sub(1);
        if let Some(Modal::Word(form)) = &mut self.modal {
            form.lists.retain(|id| known.contains(id));
            form.list_cursor = form.list_cursor.min(last_list);
        }
        self.filter_cursor = self.filter_cursor.min(last_list);
        self.list_cursor = self.list_cursor.min(last_list);
        self.training_cursor = self.training_cursor.min(last_list);
        self.word_cursor = self
            .word_cursor
            .min(self.visible_words().len().saturating_sub(1));
    }

    /// Log a failed store operation and show it in the status line.
    fn report<T>(&mut self, result: Result<T, StoreError>, action: &str) -> Option<T> {
        match result {
            Ok(value) => {
                self.sync();
                Some(value)
            }
            Err(e) => {
                warn!(action, error = %e, "store operation failed");
                self.status = Some(format!("Could not {action}: {e}"));
                None
            }
        }
    }

    pub fn visible_words(&self) -> Vec<&Word> {
        self.filter.apply(&self.words)
    }

    pub fn selected_word(&self) -> Option<&Word> {
        self.visible_words().get(self.word_cursor).copied()
    }

    // Navigation

    pub fn go_to_menu(&mut self) {
        self.screen = AppScreen::Menu;
        self.modal = None;
        self.quiz = None;
        self.quiz_notice = None;
        self.status = None;
    }

    pub fn go_to_words(&mut self) {
        self.screen = AppScreen::Words;
        self.words_focus = WordsFocus::Table;
        self.status = None;
    }

    pub fn go_to_lists(&mut self) {
        self.screen = AppScreen::Lists;
        self.status = None;
    }

    pub fn go_to_training(&mut self) {
        self.screen = AppScreen::TrainingSetup;
        self.quiz = None;
        self.status = None;
    }

    pub fn open_menu_item(&mut self) {
        match self.menu_selected {
            0 => self.go_to_words(),
            1 => self.go_to_lists(),
            2 => self.go_to_training(),
            _ => self.should_quit = true,
        }
    }

    // Words screen

    pub fn toggle_filter_list(&mut self) {
        if let Some(list) = self.lists.get(self.filter_cursor) {
            let id = list.id.clone();
            self.filter.toggle_list(&id);
            self.word_cursor = 0;
        }
    }

    pub fn begin_search(&mut self) {
        self.modal = Some(Modal::Search(LineInput::new(&self.filter.text)));
    }

    pub fn set_search_text(&mut self, text: &str) {
        if self.filter.text != text {
            self.filter.text = text.to_string();
            self.word_cursor = 0;
        }
    }

    pub fn clear_filter(&mut self) {
        self.filter = WordFilter::default();
        self.word_cursor = 0;
    }

    /// The new word starts out in the lists currently filtered on.
    pub fn begin_add_word(&mut self) {
        self.modal = Some(Modal::Word(WordForm::new(self.filter.lists.clone())));
    }

    pub fn begin_edit_word(&mut self) {
        if let Some(word) = self.selected_word() {
            self.modal = Some(Modal::Word(WordForm::for_word(word)));
        }
    }

    /// Store the word in the popup. The popup stays open when a required
    /// field is missing.
    pub fn submit_word_form(&mut self) {
        let Some(Modal::Word(form)) = &self.modal else {
            return;
        };
        match form.editing.clone() {
            None => {
                let Some(draft) = form.to_new_word() else {
                    self.status = Some("Kana and translation are required".to_string());
                    return;
                };
                self.modal = None;
                let added = self.vocab.add_word(draft);
                if let Some(word) = self.report(added, "add the word") {
                    self.status = Some(format!("Added {}", word.headword()));
                }
            }
            Some(id) => {
                let Some(patch) = form.to_patch() else {
                    self.status = Some("Kana and translation are required".to_string());
                    return;
                };
                self.modal = None;
                let updated = self.vocab.update_word(&id, &patch);
                if self.report(updated, "save the word").is_some() {
                    self.status = Some("Word saved".to_string());
                }
            }
        }
    }

    pub fn request_delete_word(&mut self) {
        if let Some(word) = self.selected_word() {
            self.modal = Some(Modal::ConfirmDeleteWord(word.id.clone()));
        }
    }

    // Lists screen

    pub fn begin_new_list(&mut self) {
        self.modal = Some(Modal::ListName {
            list: None,
            input: LineInput::default(),
        });
    }

    pub fn begin_rename_list(&mut self) {
        if let Some(list) = self.lists.get(self.list_cursor) {
            self.modal = Some(Modal::ListName {
                list: Some(list.id.clone()),
                input: LineInput::new(&list.name),
            });
        }
    }

    pub fn submit_list_name(&mut self) {
        let Some(Modal::ListName { list, input }) = self.modal.take() else {
            return;
        };
        let name = input.value().trim().to_string();
        if name.is_empty() {
            self.status = Some("A list needs a name".to_string());
            self.modal = Some(Modal::ListName { list, input });
            return;
        }
        match list {
            Some(id) => {
                let renamed = self.vocab.rename_list(&id, &name);
                self.report(renamed, "rename the list");
            }
            None => {
                let added = self.vocab.add_list(&name);
                if self.report(added, "create the list").is_some() {
                    self.list_cursor = self.lists.len().saturating_sub(1);
                }
            }
        }
    }

    pub fn request_delete_list(&mut self) {
        if let Some(list) = self.lists.get(self.list_cursor) {
            self.modal = Some(Modal::ConfirmDeleteList(list.id.clone()));
        }
    }

    pub fn confirm_delete(&mut self) {
        match self.modal.take() {
            Some(Modal::ConfirmDeleteWord(id)) => {
                let removed = self.vocab.remove_word(&id);
                if self.report(removed, "delete the word").is_some() {
                    self.status = Some("Word deleted".to_string());
                }
            }
            Some(Modal::ConfirmDeleteList(id)) => {
                let removed = self.vocab.remove_list(&id);
                if let Some(detached) = self.report(removed, "delete the list") {
                    self.status = Some(format!(
                        "List deleted, {detached} word(s) detached"
                    ));
                }
            }
            other => self.modal = other,
        }
    }

    pub fn cancel_modal(&mut self) {
        self.modal = None;
    }

    // Training

    pub fn toggle_training_list(&mut self) {
        if let Some(list) = self.lists.get(self.training_cursor) {
            let id = list.id.clone();
            if !self.training_lists.remove(&id) {
                self.training_lists.insert(id);
            }
        }
    }

    pub fn cycle_mode(&mut self, forward: bool) {
        self.training_mode = if forward {
            self.training_mode.next()
        } else {
            self.training_mode.prev()
        };
    }

    /// Words that a training on the picked lists would ask, before the size cap.
    pub fn training_candidates(&self) -> usize {
        WordFilter::new(self.training_lists.iter().cloned(), "")
            .apply(&self.words)
            .len()
    }

    pub fn start_training(&mut self) {
        let pool = build_pool(
            &self.words,
            &self.training_lists,
            self.config.pool_options(),
            &mut self.rng,
        );
        self.start_quiz_with(pool);
    }

    /// Same words again, reshuffled when shuffling is on.
    pub fn retry_quiz(&mut self) {
        let Some(quiz) = &self.quiz else {
            return;
        };
        let mut pool = quiz.pool().to_vec();
        if self.config.shuffle_pool {
            pool.shuffle(&mut self.rng);
        }
        self.start_quiz_with(pool);
    }

    fn start_quiz_with(&mut self, pool: Vec<Word>) {
        let size = pool.len();
        let quiz = QuizSession::new(pool, self.training_mode).and_then(|mut quiz| {
            quiz.start()?;
            Ok(quiz)
        });
        match quiz {
            Ok(quiz) => {
                info!(mode = %self.training_mode, pool = size, "training started");
                self.quiz = Some(quiz);
                self.guess.clear();
                self.quiz_notice = None;
                self.status = None;
                self.screen = AppScreen::Quiz;
            }
            Err(QuizError::EmptyPool) => {
                self.quiz = None;
                self.screen = AppScreen::TrainingSetup;
                self.status = Some("No words in the selected lists".to_string());
            }
            Err(e) => {
                warn!(error = %e, "could not start training");
                self.status = Some(e.to_string());
            }
        }
    }

    pub fn submit_guess(&mut self) {
        if self.guess.is_blank() {
            self.quiz_notice = Some("Type an answer first".to_string());
            return;
        }
        let Some(quiz) = self.quiz.as_mut() else {
            return;
        };
        if let Err(e) = quiz.submit_guess(self.guess.value()) {
            warn!(error = %e, "guess rejected");
            return;
        }
        self.guess.clear();
        self.quiz_notice = None;
        if quiz.is_finished() {
            self.finish_quiz();
        }
    }

    /// Leave the quiz. Answers given so far are kept as a partial result.
    pub fn stop_quiz(&mut self) {
        let answered = self.quiz.as_ref().is_some_and(|q| !q.records().is_empty());
        if answered {
            self.finish_quiz();
        } else {
            self.go_to_training();
        }
    }

    fn finish_quiz(&mut self) {
        let Some(quiz) = &self.quiz else {
            return;
        };
        let result = QuizResult::from_quiz(quiz);
        info!(
            correct = result.correct,
            total = result.total,
            partial = result.partial,
            "training finished"
        );
        self.history.sessions.push(result.clone());
        if let Err(e) = self.vocab.repo().save_history(&self.history) {
            warn!(error = %e, "could not save training history");
            self.status = Some("Training history could not be saved".to_string());
        }
        self.last_result = Some(result);
        self.screen = AppScreen::QuizResult;
    }

    /// Route pasted text to whichever input currently has focus.
    pub fn paste(&mut self, text: &str) {
        if let Some(Modal::Search(input)) = &mut self.modal {
            input.insert_str(text);
            let value = input.value().to_string();
            self.set_search_text(&value);
            return;
        }
        match &mut self.modal {
            Some(Modal::Word(form)) => {
                if let Some(input) = form.focused_input() {
                    input.insert_str(text);
                }
            }
            Some(Modal::ListName { input, .. }) => input.insert_str(text),
            None if self.screen == AppScreen::Quiz => self.guess.insert_str(text),
            _ => {}
        }
    }
}

/// Move `cursor` one step within `0..len`, stopping at the ends.
pub fn step(cursor: usize, len: usize, down: bool) -> usize {
    if len == 0 {
        0
    } else if down {
        (cursor + 1).min(len - 1)
    } else {
        cursor.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::session::quiz::QuizState;

    fn make_app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        let theme: &'static Theme = Box::leak(Box::new(Theme::default()));
        let app = App::new(Config::default(), store, theme).unwrap();
        (dir, app)
    }

    fn add_word(app: &mut App, kana: &str, kanji: &str, traduction: &str) {
        app.begin_add_word();
        if let Some(Modal::Word(form)) = &mut app.modal {
            form.fields[0] = LineInput::new(kana);
            form.fields[1] = LineInput::new(kanji);
            form.fields[2] = LineInput::new(traduction);
        }
        app.submit_word_form();
    }

    fn add_list(app: &mut App, name: &str) -> ListId {
        app.begin_new_list();
        if let Some(Modal::ListName { input, .. }) = &mut app.modal {
            input.insert_str(name);
        }
        app.submit_list_name();
        app.lists.last().unwrap().id.clone()
    }

    fn type_guess(app: &mut App, text: &str) {
        app.guess = LineInput::new(text);
        app.submit_guess();
    }

    #[test]
    fn test_snapshots_follow_mutations() {
        let (_dir, mut app) = make_app();
        assert!(app.words.is_empty());
        add_word(&mut app, "みず", "水", "water");
        assert_eq!(app.words.len(), 1);
        assert_eq!(app.status.as_deref(), Some("Added 水"));
        assert!(app.modal.is_none());
    }

    #[test]
    fn test_word_form_requires_kana_and_translation() {
        let (_dir, mut app) = make_app();
        add_word(&mut app, "みず", "", "  ");
        assert!(app.words.is_empty());
        assert!(matches!(app.modal, Some(Modal::Word(_))));
    }

    #[test]
    fn test_new_word_joins_filtered_lists() {
        let (_dir, mut app) = make_app();
        let food = add_list(&mut app, "Food");
        app.filter.toggle_list(&food);
        add_word(&mut app, "みず", "水", "water");
        assert!(app.words[0].in_list(&food));
        assert_eq!(app.visible_words().len(), 1);
    }

    #[test]
    fn test_edit_word_changes_fields_and_lists() {
        let (_dir, mut app) = make_app();
        let food = add_list(&mut app, "Food");
        let drinks = add_list(&mut app, "Drinks");
        app.filter.toggle_list(&food);
        add_word(&mut app, "みず", "水", "water");
        app.clear_filter();

        app.word_cursor = 0;
        app.begin_edit_word();
        let Some(Modal::Word(form)) = &mut app.modal else {
            panic!("edit popup not open");
        };
        assert_eq!(form.fields[1].value(), "水");
        assert!(form.lists.contains(&food));
        form.fields[1].clear();
        form.fields[3] = LineInput::new("aqua");
        form.toggle_list(&food);
        form.toggle_list(&drinks);
        app.submit_word_form();

        assert!(app.modal.is_none());
        assert_eq!(app.status.as_deref(), Some("Word saved"));
        let word = &app.words[0];
        assert!(word.kanji.is_none());
        assert_eq!(word.secondary_traduction.as_deref(), Some("aqua"));
        assert_eq!(word.lists, Some(vec![drinks.clone()]));
    }

    #[test]
    fn test_edit_word_keeps_popup_when_required_field_blank() {
        let (_dir, mut app) = make_app();
        add_word(&mut app, "みず", "水", "water");
        app.begin_edit_word();
        if let Some(Modal::Word(form)) = &mut app.modal {
            form.fields[2].clear();
        }
        app.submit_word_form();
        assert!(matches!(app.modal, Some(Modal::Word(_))));
        assert_eq!(app.words[0].traduction, "water");
    }

    #[test]
    fn test_word_form_focus_cycles_through_lists() {
        let mut form = WordForm::default();
        form.prev_field();
        assert!(form.on_lists());
        assert!(form.focused_input().is_none());
        form.next_field();
        assert_eq!(form.focus, 0);
        assert!(form.focused_input().is_some());
    }

    #[test]
    fn test_deleted_list_leaves_open_word_form() {
        let (_dir, mut app) = make_app();
        let food = add_list(&mut app, "Food");
        add_word(&mut app, "みず", "水", "water");
        app.begin_edit_word();
        if let Some(Modal::Word(form)) = &mut app.modal {
            form.toggle_list(&food);
        }
        let removed = app.vocab.remove_list(&food);
        app.report(removed, "delete the list");
        let Some(Modal::Word(form)) = &app.modal else {
            panic!("edit popup closed");
        };
        assert!(form.lists.is_empty());
    }

    #[test]
    fn test_search_and_delete_selected_word() {
        let (_dir, mut app) = make_app();
        add_word(&mut app, "みず", "水", "water");
        add_word(&mut app, "ひ", "火", "fire");

        app.set_search_text("Fire");
        assert_eq!(app.visible_words().len(), 1);
        app.request_delete_word();
        app.confirm_delete();
        assert_eq!(app.words.len(), 1);
        assert_eq!(app.words[0].kana, "みず");
        assert!(app.visible_words().is_empty());
    }

    #[test]
    fn test_delete_list_detaches_and_clears_selection() {
        let (_dir, mut app) = make_app();
        let food = add_list(&mut app, "Food");
        app.filter.toggle_list(&food);
        add_word(&mut app, "みず", "水", "water");

        app.list_cursor = 0;
        app.request_delete_list();
        app.confirm_delete();
        assert!(app.lists.is_empty());
        assert!(app.filter.lists.is_empty());
        assert_eq!(app.words.len(), 1);
        assert!(!app.words[0].in_list(&food));
        assert_eq!(
            app.status.as_deref(),
            Some("List deleted, 1 word(s) detached")
        );
    }

    #[test]
    fn test_rename_list_keeps_blank_name_open() {
        let (_dir, mut app) = make_app();
        add_list(&mut app, "Food");
        app.begin_rename_list();
        if let Some(Modal::ListName { input, .. }) = &mut app.modal {
            input.clear();
        }
        app.submit_list_name();
        assert!(app.modal.is_some());
        assert_eq!(app.lists[0].name, "Food");
    }

    #[test]
    fn test_empty_pool_stays_on_setup() {
        let (_dir, mut app) = make_app();
        app.go_to_training();
        app.start_training();
        assert_eq!(app.screen, AppScreen::TrainingSetup);
        assert!(app.quiz.is_none());
        assert_eq!(app.status.as_deref(), Some("No words in the selected lists"));
    }

    #[test]
    fn test_training_round_saves_history() {
        let (dir, mut app) = make_app();
        add_word(&mut app, "みず", "水", "water");
        add_word(&mut app, "ひ", "火", "fire");
        app.training_mode = TrainingMode::KanjiToKana;
        app.start_training();
        assert_eq!(app.screen, AppScreen::Quiz);

        type_guess(&mut app, "   ");
        assert_eq!(app.quiz_notice.as_deref(), Some("Type an answer first"));
        assert_eq!(app.quiz.as_ref().unwrap().records().len(), 0);

        type_guess(&mut app, "みず");
        assert_eq!(
            app.quiz.as_ref().unwrap().state(),
            QuizState::InProgress { index: 1 }
        );
        type_guess(&mut app, "か");
        assert_eq!(app.screen, AppScreen::QuizResult);

        let result = app.last_result.as_ref().unwrap();
        assert_eq!((result.correct, result.total), (1, 2));
        assert!(!result.partial);

        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        assert_eq!(store.load_history().sessions.len(), 1);
    }

    #[test]
    fn test_stop_early_gives_partial_result_and_retry_restarts() {
        let (_dir, mut app) = make_app();
        add_word(&mut app, "みず", "水", "water");
        add_word(&mut app, "ひ", "火", "fire");
        app.training_mode = TrainingMode::TraductionToKana;
        app.start_training();
        type_guess(&mut app, "みず");
        app.stop_quiz();

        assert_eq!(app.screen, AppScreen::QuizResult);
        let result = app.last_result.as_ref().unwrap();
        assert!(result.partial);
        assert_eq!(result.total, 2);

        app.retry_quiz();
        assert_eq!(app.screen, AppScreen::Quiz);
        let quiz = app.quiz.as_ref().unwrap();
        assert!(quiz.records().is_empty());
        assert_eq!(quiz.pool().len(), 2);
    }

    #[test]
    fn test_stop_before_answering_returns_to_setup() {
        let (_dir, mut app) = make_app();
        add_word(&mut app, "みず", "水", "water");
        app.start_training();
        app.stop_quiz();
        assert_eq!(app.screen, AppScreen::TrainingSetup);
        assert!(app.history.sessions.is_empty());
    }

    #[test]
    fn test_training_lists_narrow_the_pool() {
        let (_dir, mut app) = make_app();
        let food = add_list(&mut app, "Food");
        add_word(&mut app, "やま", "山", "mountain");
        app.filter.toggle_list(&food);
        add_word(&mut app, "みず", "水", "water");

        assert_eq!(app.training_candidates(), 2);
        app.training_cursor = 0;
        app.toggle_training_list();
        assert_eq!(app.training_candidates(), 1);
        app.start_training();
        assert_eq!(app.quiz.as_ref().unwrap().pool()[0].kana, "みず");
    }

    #[test]
    fn test_paste_goes_to_guess() {
        let (_dir, mut app) = make_app();
        add_word(&mut app, "みず", "水", "water");
        app.start_training();
        app.paste("みず");
        assert_eq!(app.guess.value(), "みず");
    }

    #[test]
    fn test_step_bounds() {
        assert_eq!(step(0, 0, true), 0);
        assert_eq!(step(2, 3, true), 2);
        assert_eq!(step(0, 3, false), 0);
        assert_eq!(step(1, 3, true), 2);
    }
}
