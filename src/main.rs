mod app;
mod config;
mod engine;
mod error;
mod event;
mod session;
mod store;
mod ui;
mod vocab;

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Wrap};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use app::{App, AppScreen, FORM_LABELS, Modal, WordsFocus, step};
use config::Config;
use engine::filter::WordFilter;
use event::{AppEvent, EventHandler};
use store::json_store::JsonStore;
use store::schema::ExportData;
use store::vocabulary::{NewWord, Vocabulary, count_members};
use ui::components::dashboard::Dashboard;
use ui::components::list_picker::ListPicker;
use ui::components::menu::Menu;
use ui::components::progress_bar::ProgressBar;
use ui::components::quiz_card::QuizCard;
use ui::components::word_table::WordTable;
use ui::layout::{AppLayout, centered_rect, pack_hint_lines};
use ui::line_input::InputResult;
use ui::theme::Theme;
use vocab::{Word, WordList, WordPatch};

#[derive(Parser)]
#[command(name = "kotoba", version, about = "Terminal vocabulary trainer with word lists and quizzes")]
struct Cli {
    #[arg(short, long, global = true, help = "Config file (default: <config dir>/kotoba/config.toml)")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Directory holding tree.json and the training history")]
    data_dir: Option<PathBuf>,

    #[arg(short, long, global = true, help = "User whose words and lists are used")]
    user: Option<String>,

    #[arg(short, long, global = true, help = "Theme name")]
    theme: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print words, filtered by list membership and exact text
    Words {
        #[arg(short, long = "list", value_name = "LIST_ID", help = "Only words in every given list")]
        lists: Vec<String>,
        #[arg(short, long, help = "Exact kana, kanji or translation")]
        search: Option<String>,
    },
    /// Print lists with their word counts
    Lists,
    AddWord {
        #[arg(long)]
        kana: String,
        #[arg(long)]
        traduction: String,
        #[arg(long)]
        kanji: Option<String>,
        #[arg(long)]
        secondary: Option<String>,
        #[arg(long = "list", value_name = "LIST_ID")]
        lists: Vec<String>,
    },
    /// Change the given fields of a word
    EditWord {
        id: String,
        #[command(flatten)]
        edits: WordEdits,
    },
    RemoveWord {
        id: String,
    },
    AddList {
        name: String,
    },
    RenameList {
        id: String,
        name: String,
    },
    /// Delete a list and detach it from its words
    RemoveList {
        id: String,
    },
    /// Write words, lists, history and config to a JSON file
    Export {
        file: PathBuf,
    },
    /// Replace all data with the contents of an export file
    Import {
        file: PathBuf,
        #[arg(long, help = "Also replace the config file (data dir is kept)")]
        with_config: bool,
    },
}

/// Field changes for `edit-word`. Omitted options leave the field as it is.
#[derive(Args, Debug)]
struct WordEdits {
    #[arg(long)]
    kana: Option<String>,
    #[arg(long)]
    traduction: Option<String>,
    #[arg(long, conflicts_with = "no_kanji")]
    kanji: Option<String>,
    #[arg(long, help = "Remove the kanji")]
    no_kanji: bool,
    #[arg(long, conflicts_with = "no_secondary")]
    secondary: Option<String>,
    #[arg(long, help = "Remove the secondary translation")]
    no_secondary: bool,
    #[arg(
        long = "list",
        value_name = "LIST_ID",
        conflicts_with = "clear_lists",
        help = "Replaces the word's lists"
    )]
    lists: Vec<String>,
    #[arg(long, help = "Take the word out of every list")]
    clear_lists: bool,
}

impl WordEdits {
    fn into_patch(self) -> WordPatch {
        let clearable = |value: Option<String>, clear: bool| {
            if clear { Some(None) } else { value.map(Some) }
        };
        WordPatch {
            kana: self.kana,
            kanji: clearable(self.kanji, self.no_kanji),
            traduction: self.traduction,
            secondary_traduction: clearable(self.secondary, self.no_secondary),
            lists: if self.clear_lists {
                Some(Vec::new())
            } else {
                (!self.lists.is_empty()).then_some(self.lists)
            },
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, config_path) = load_config(&cli)?;

    match cli.command {
        None => run_tui(config),
        Some(command) => {
            init_logging(&config, None)?;
            run_command(command, config, &config_path)
        }
    }
}

/// Config file contents with command-line overrides applied, and the path
/// the file was read from.
fn load_config(cli: &Cli) -> Result<(Config, PathBuf)> {
    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let mut config = Config::load_from(&config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.to_string_lossy().to_string();
    }
    if let Some(user) = &cli.user {
        config.user_id = user.clone();
    }
    if let Some(theme) = &cli.theme {
        config.theme = theme.clone();
    }
    config.validate()?;
    Ok((config, config_path))
}

/// Log to `file` when given (the terminal UI owns stdout), stderr otherwise.
fn init_logging(config: &Config, file: Option<fs::File>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match file {
        Some(file) => builder
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .try_init(),
        None => builder.with_writer(io::stderr).try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("installing log subscriber: {e}"))
}

fn open_vocabulary(config: &Config) -> Result<Vocabulary<JsonStore>> {
    let mut store = JsonStore::with_base_dir(config.data_dir())?;
    store.check_interrupted_import()?;
    Ok(Vocabulary::new(store, &config.user_id))
}

fn run_command(command: Command, config: Config, config_path: &std::path::Path) -> Result<()> {
    let mut vocab = open_vocabulary(&config)?;

    match command {
        Command::Words { lists, search } => {
            let words = vocab.words()?;
            let all_lists = vocab.lists()?;
            let filter = WordFilter::new(lists, search.as_deref().unwrap_or(""));
            for word in filter.apply(&words) {
                println!("{}", describe_word(word, &all_lists));
            }
        }
        Command::Lists => {
            let words = vocab.words()?;
            for list in vocab.lists()? {
                println!(
                    "{}\t{}\t{} word(s)",
                    list.id,
                    list.name,
                    count_members(&words, &list.id)
                );
            }
        }
        Command::AddWord {
            kana,
            traduction,
            kanji,
            secondary,
            lists,
        } => {
            if kana.trim().is_empty() || traduction.trim().is_empty() {
                bail!("kana and traduction must not be blank");
            }
            let word = vocab.add_word(NewWord {
                kana,
                kanji,
                traduction,
                secondary_traduction: secondary,
                lists: (!lists.is_empty()).then_some(lists),
            })?;
            println!("{}", word.id);
        }
        Command::EditWord { id, edits } => {
            let patch = edits.into_patch();
            if patch.is_empty() {
                bail!("nothing to change, pass at least one field");
            }
            vocab.update_word(&id, &patch)?;
        }
        Command::RemoveWord { id } => vocab.remove_word(&id)?,
        Command::AddList { name } => {
            if name.trim().is_empty() {
                bail!("list name must not be blank");
            }
            let list = vocab.add_list(name.trim())?;
            println!("{}", list.id);
        }
        Command::RenameList { id, name } => {
            if name.trim().is_empty() {
                bail!("list name must not be blank");
            }
            vocab.rename_list(&id, name.trim())?;
        }
        Command::RemoveList { id } => {
            let detached = vocab.remove_list(&id)?;
            println!("{detached} word(s) detached");
        }
        Command::Export { file } => {
            let data = vocab.repo().export_all(&config);
            let json = serde_json::to_string_pretty(&data)?;
            fs::write(&file, json).with_context(|| format!("writing {}", file.display()))?;
            info!(file = %file.display(), "exported");
        }
        Command::Import { file, with_config } => {
            let content =
                fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
            let data: ExportData = serde_json::from_str(&content)
                .with_context(|| format!("{} is not a kotoba export", file.display()))?;
            vocab.repo_mut().import_all(&data)?;
            if with_config {
                let mut imported = data.config.clone();
                imported.data_dir = config.data_dir.clone();
                imported.validate()?;
                imported.save_to(config_path)?;
            }
            info!(file = %file.display(), "imported");
        }
    }
    Ok(())
}

fn describe_word(word: &Word, lists: &[WordList]) -> String {
    let mut line = format!(
        "{}\t{}\t{}\t{}",
        word.id,
        word.kanji.as_deref().unwrap_or("-"),
        word.kana,
        word.traduction
    );
    if let Some(secondary) = &word.secondary_traduction {
        line.push_str(&format!(" / {secondary}"));
    }
    if let Some(ids) = &word.lists {
        let names: Vec<&str> = ids
            .iter()
            .filter_map(|id| lists.iter().find(|l| &l.id == id))
            .map(|l| l.name.as_str())
            .collect();
        if !names.is_empty() {
            line.push_str(&format!("\t[{}]", names.join(", ")));
        }
    }
    line
}

fn run_tui(config: Config) -> Result<()> {
    let data_dir = config.data_dir();
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data directory {}", data_dir.display()))?;
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join("kotoba.log"))?;
    init_logging(&config, Some(log_file))?;

    let theme = Theme::load(&config.theme).unwrap_or_else(|| {
        warn!(
            theme = %config.theme,
            available = ?Theme::available_themes(),
            "unknown theme, using the default"
        );
        Theme::default()
    });
    let theme: &'static Theme = Box::leak(Box::new(theme));
    let store = JsonStore::with_base_dir(data_dir)?;
    let mut app = App::new(config, store, theme)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(250));

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableBracketedPaste, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        app.sync();
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Paste(text) => app.paste(&text),
            AppEvent::Tick | AppEvent::Resize(_, _) => {}
        }

        if app.should_quit {
            info!("quit");
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    if app.modal.is_some() {
        handle_modal_key(app, key);
        return;
    }

    match app.screen {
        AppScreen::Menu => handle_menu_key(app, key),
        AppScreen::Words => handle_words_key(app, key),
        AppScreen::Lists => handle_lists_key(app, key),
        AppScreen::TrainingSetup => handle_training_key(app, key),
        AppScreen::Quiz => handle_quiz_key(app, key),
        AppScreen::QuizResult => handle_result_key(app, key),
    }
}

const MENU_ITEMS: usize = 4;

fn handle_menu_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('1') => app.go_to_words(),
        KeyCode::Char('2') => app.go_to_lists(),
        KeyCode::Char('3') => app.go_to_training(),
        KeyCode::Up | KeyCode::Char('k') => {
            app.menu_selected = (app.menu_selected + MENU_ITEMS - 1) % MENU_ITEMS;
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.menu_selected = (app.menu_selected + 1) % MENU_ITEMS;
        }
        KeyCode::Enter => app.open_menu_item(),
        _ => {}
    }
}

fn handle_words_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.go_to_menu(),
        KeyCode::Tab | KeyCode::BackTab => {
            app.words_focus = match app.words_focus {
                WordsFocus::Table => WordsFocus::Lists,
                WordsFocus::Lists => WordsFocus::Table,
            };
        }
        KeyCode::Char('/') => app.begin_search(),
        KeyCode::Char('a') => app.begin_add_word(),
        KeyCode::Char('c') => app.clear_filter(),
        _ => match app.words_focus {
            WordsFocus::Table => match key.code {
                KeyCode::Down | KeyCode::Char('j') => {
                    app.word_cursor = step(app.word_cursor, app.visible_words().len(), true);
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    app.word_cursor = step(app.word_cursor, app.visible_words().len(), false);
                }
                KeyCode::Char('e') | KeyCode::Enter => app.begin_edit_word(),
                KeyCode::Char('d') | KeyCode::Delete => app.request_delete_word(),
                _ => {}
            },
            WordsFocus::Lists => match key.code {
                KeyCode::Down | KeyCode::Char('j') => {
                    app.filter_cursor = step(app.filter_cursor, app.lists.len(), true);
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    app.filter_cursor = step(app.filter_cursor, app.lists.len(), false);
                }
                KeyCode::Char(' ') | KeyCode::Enter => app.toggle_filter_list(),
                _ => {}
            },
        },
    }
}

fn handle_lists_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.go_to_menu(),
        KeyCode::Down | KeyCode::Char('j') => {
            app.list_cursor = step(app.list_cursor, app.lists.len(), true);
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.list_cursor = step(app.list_cursor, app.lists.len(), false);
        }
        KeyCode::Char('a') | KeyCode::Char('n') => app.begin_new_list(),
        KeyCode::Char('r') => app.begin_rename_list(),
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete_list(),
        KeyCode::Enter => {
            if let Some(list) = app.lists.get(app.list_cursor) {
                app.filter = WordFilter::new([list.id.clone()], "");
                app.word_cursor = 0;
                app.go_to_words();
            }
        }
        _ => {}
    }
}

fn handle_training_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.go_to_menu(),
        KeyCode::Down | KeyCode::Char('j') => {
            app.training_cursor = step(app.training_cursor, app.lists.len(), true);
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.training_cursor = step(app.training_cursor, app.lists.len(), false);
        }
        KeyCode::Char(' ') => app.toggle_training_list(),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('m') => app.cycle_mode(true),
        KeyCode::Left | KeyCode::Char('h') => app.cycle_mode(false),
        KeyCode::Enter | KeyCode::Char('s') => app.start_training(),
        _ => {}
    }
}

fn handle_quiz_key(app: &mut App, key: KeyEvent) {
    match app.guess.handle(key) {
        InputResult::Submit => app.submit_guess(),
        InputResult::Cancel => app.stop_quiz(),
        InputResult::Continue => {}
    }
}

fn handle_result_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('r') => app.retry_quiz(),
        KeyCode::Char('t') => app.go_to_training(),
        KeyCode::Char('q') | KeyCode::Esc => app.go_to_menu(),
        _ => {}
    }
}

fn handle_modal_key(app: &mut App, key: KeyEvent) {
    let Some(modal) = app.modal.as_mut() else {
        return;
    };
    match modal {
        Modal::Search(input) => {
            let result = input.handle(key);
            let text = input.value().to_string();
            match result {
                InputResult::Continue => app.set_search_text(&text),
                InputResult::Submit => app.cancel_modal(),
                InputResult::Cancel => {
                    app.set_search_text("");
                    app.cancel_modal();
                }
            }
        }
        Modal::Word(form) => match key.code {
            KeyCode::Tab => form.next_field(),
            KeyCode::BackTab => form.prev_field(),
            KeyCode::Enter => app.submit_word_form(),
            KeyCode::Esc => app.cancel_modal(),
            _ if form.on_lists() => match key.code {
                KeyCode::Down | KeyCode::Char('j') => {
                    form.list_cursor = step(form.list_cursor, app.lists.len(), true);
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    form.list_cursor = step(form.list_cursor, app.lists.len(), false);
                }
                KeyCode::Char(' ') => {
                    if let Some(list) = app.lists.get(form.list_cursor) {
                        form.toggle_list(&list.id);
                    }
                }
                _ => {}
            },
            KeyCode::Down => form.next_field(),
            KeyCode::Up => form.prev_field(),
            _ => {
                if let Some(input) = form.focused_input() {
                    input.handle(key);
                }
            }
        },
        Modal::ListName { input, .. } => match input.handle(key) {
            InputResult::Submit => app.submit_list_name(),
            InputResult::Cancel => app.cancel_modal(),
            InputResult::Continue => {}
        },
        Modal::ConfirmDeleteWord(_) | Modal::ConfirmDeleteList(_) => match key.code {
            KeyCode::Char('y') => app.confirm_delete(),
            KeyCode::Char('n') | KeyCode::Esc => app.cancel_modal(),
            _ => {}
        },
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    match app.screen {
        AppScreen::Menu => render_menu(frame, app),
        AppScreen::Words => render_words(frame, app),
        AppScreen::Lists => render_lists(frame, app),
        AppScreen::TrainingSetup => render_training_setup(frame, app),
        AppScreen::Quiz => render_quiz(frame, app),
        AppScreen::QuizResult => render_result(frame, app),
    }

    if let Some(modal) = &app.modal {
        render_modal(frame, app, modal);
    }
}

fn render_header(frame: &mut ratatui::Frame, app: &App, area: Rect, title: &str) {
    let colors = &app.theme.colors;
    let info = format!(
        " {title} | {} | {} words | {} lists",
        app.vocab.uid(),
        app.words.len(),
        app.lists.len()
    );
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " kotoba ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            info,
            Style::default().fg(colors.text_dim()).bg(colors.header_bg()),
        ),
    ]))
    .block(Block::default().style(Style::default().bg(colors.header_bg())));
    frame.render_widget(header, area);
}

/// Status message when there is one, otherwise the key hints.
fn render_footer(frame: &mut ratatui::Frame, app: &App, area: Rect, hints: &[&str]) {
    let colors = &app.theme.colors;
    let lines: Vec<Line> = match &app.status {
        Some(status) => vec![Line::from(Span::styled(
            format!("  {status}"),
            Style::default().fg(colors.warning()),
        ))],
        None => pack_hint_lines(hints, area.width as usize)
            .into_iter()
            .map(|l| Line::from(Span::styled(l, Style::default().fg(colors.text_dim()))))
            .collect(),
    };
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_menu(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(frame, app, layout[0], "Menu");

    let subtitle = match app.history.last() {
        Some(last) => format!(
            "last training {}/{} ({})",
            last.correct,
            last.total,
            last.mode.label()
        ),
        None => String::new(),
    };
    let menu = Menu::new(app.theme)
        .with_selected(app.menu_selected)
        .with_subtitle(subtitle);
    let menu_area = centered_rect(50, 80, layout[1]);
    frame.render_widget(&menu, menu_area);

    render_footer(frame, app, layout[2], &["[1-3] Open", "[j/k] Move", "[q] Quit"]);
}

fn render_words(frame: &mut ratatui::Frame, app: &App) {
    let colors = &app.theme.colors;
    let app_layout = AppLayout::new(frame.area());

    render_header(frame, app, app_layout.header, "Words");

    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(app_layout.main);

    let (search_line, searching) = match &app.modal {
        Some(Modal::Search(input)) => (input.to_line(colors, true), true),
        _ if app.filter.text.is_empty() => (
            Line::from(Span::styled(
                "press / to search",
                Style::default().fg(colors.text_dim()),
            )),
            false,
        ),
        _ => (
            Line::from(Span::styled(
                app.filter.text.clone(),
                Style::default().fg(colors.fg()),
            )),
            false,
        ),
    };
    let search = Paragraph::new(search_line).block(
        Block::bordered()
            .title(" Search ")
            .border_style(Style::default().fg(if searching {
                colors.border_focused()
            } else {
                colors.border()
            })),
    );
    frame.render_widget(search, main[0]);

    let visible = app.visible_words();
    let picker_focused = app.words_focus == WordsFocus::Lists;
    let picker = ListPicker::new(&app.lists, &app.words, app.theme)
        .checkable(&app.filter.lists)
        .with_cursor(Some(app.filter_cursor))
        .with_title(" Filter by lists ")
        .focused(picker_focused);

    match app_layout.sidebar {
        Some(sidebar) => {
            let table = WordTable::new(&visible, &app.lists, app.theme)
                .with_selected((!picker_focused).then_some(app.word_cursor));
            frame.render_widget(table, main[1]);
            frame.render_widget(picker, sidebar);
        }
        None if picker_focused => frame.render_widget(picker, main[1]),
        None => {
            let table = WordTable::new(&visible, &app.lists, app.theme)
                .with_selected(Some(app.word_cursor));
            frame.render_widget(table, main[1]);
        }
    }

    render_footer(
        frame,
        app,
        app_layout.footer,
        &[
            "[/] Search",
            "[Tab] Lists/words",
            "[Space] Toggle list",
            "[a] Add",
            "[e] Edit",
            "[d] Delete",
            "[c] Clear filter",
            "[Esc] Menu",
        ],
    );
}

fn render_lists(frame: &mut ratatui::Frame, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(2),
        ])
        .split(frame.area());

    render_header(frame, app, layout[0], "Lists");

    let picker = ListPicker::new(&app.lists, &app.words, app.theme)
        .with_cursor(Some(app.list_cursor))
        .focused(true);
    frame.render_widget(picker, centered_rect(60, 90, layout[1]));

    render_footer(
        frame,
        app,
        layout[2],
        &[
            "[a] New",
            "[r] Rename",
            "[d] Delete",
            "[Enter] Show words",
            "[Esc] Menu",
        ],
    );
}

fn render_training_setup(frame: &mut ratatui::Frame, app: &App) {
    let colors = &app.theme.colors;
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(4),
            Constraint::Min(3),
            Constraint::Length(2),
        ])
        .split(frame.area());

    render_header(frame, app, layout[0], "Training");

    let candidates = app.training_candidates();
    let asked = match app.config.pool_size {
        0 => candidates,
        cap => candidates.min(cap),
    };
    let scope = if app.training_lists.is_empty() {
        "all words".to_string()
    } else {
        format!("words in all {} picked list(s)", app.training_lists.len())
    };
    let summary = vec![
        Line::from(vec![
            Span::styled("  Mode: ", Style::default().fg(colors.fg())),
            Span::styled(
                format!("\u{2039} {} \u{203a}", app.training_mode.label()),
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(
            format!("  {asked} question(s) from {scope}"),
            Style::default().fg(colors.text_dim()),
        )),
    ];
    frame.render_widget(
        Paragraph::new(summary).block(
            Block::bordered().border_style(Style::default().fg(colors.border())),
        ),
        layout[1],
    );

    let picker = ListPicker::new(&app.lists, &app.words, app.theme)
        .checkable(&app.training_lists)
        .with_cursor(Some(app.training_cursor))
        .with_title(" Train on lists ")
        .focused(true);
    frame.render_widget(picker, layout[2]);

    render_footer(
        frame,
        app,
        layout[3],
        &[
            "[Space] Pick list",
            "[\u{2190}/\u{2192}] Mode",
            "[Enter] Start",
            "[Esc] Menu",
        ],
    );
}

fn render_quiz(frame: &mut ratatui::Frame, app: &App) {
    let Some(quiz) = &app.quiz else {
        return;
    };
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(8),
        ])
        .split(frame.area());

    let title = match quiz.progress() {
        Some((current, total)) => format!("Question {current} of {total}"),
        None => "Training".to_string(),
    };
    render_header(frame, app, layout[0], &title);

    let bar = ProgressBar::new("Progress", quiz.records().len(), quiz.pool().len(), app.theme);
    frame.render_widget(bar, layout[1]);

    let card = QuizCard::new(quiz, &app.guess, app.theme).with_notice(app.quiz_notice.as_deref());
    frame.render_widget(card, layout[2]);
}

fn render_result(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();

    if let Some(result) = &app.last_result {
        let centered = centered_rect(70, 80, area);
        let dashboard = Dashboard::new(result, app.history.best_percent(), app.theme);
        frame.render_widget(dashboard, centered);
    }
}

fn render_modal(frame: &mut ratatui::Frame, app: &App, modal: &Modal) {
    let colors = &app.theme.colors;
    let area = frame.area();

    let (title, lines): (&str, Vec<Line>) = match modal {
        // drawn inline by the words screen
        Modal::Search(_) => return,
        Modal::Word(form) => {
            let mut lines = Vec::new();
            for (i, (label, input)) in FORM_LABELS.iter().zip(form.fields.iter()).enumerate() {
                let focused = i == form.focus;
                let label_style = if focused {
                    Style::default()
                        .fg(colors.accent())
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(colors.text_dim())
                };
                lines.push(Line::from(Span::styled(format!(" {label}"), label_style)));
                let mut field = input.to_line(colors, focused);
                field.spans.insert(0, Span::raw("   "));
                lines.push(field);
            }
            let lists_focused = form.on_lists();
            lines.push(Line::from(Span::styled(
                " Lists",
                if lists_focused {
                    Style::default()
                        .fg(colors.accent())
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(colors.text_dim())
                },
            )));
            if app.lists.is_empty() {
                lines.push(Line::from(Span::styled(
                    "   no lists yet",
                    Style::default().fg(colors.text_dim()),
                )));
            }
            for (i, list) in app.lists.iter().enumerate() {
                let mark = if form.lists.contains(&list.id) { "x" } else { " " };
                let style = if lists_focused && i == form.list_cursor {
                    Style::default().fg(colors.fg()).bg(colors.selection_bg())
                } else {
                    Style::default().fg(colors.fg())
                };
                lines.push(Line::from(Span::styled(
                    format!("   [{mark}] {}", list.name),
                    style,
                )));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                " [Tab] Next field  [Space] Toggle list  [Enter] Save  [Esc] Cancel",
                Style::default().fg(colors.accent()),
            )));
            let title = if form.editing.is_some() {
                " Edit word "
            } else {
                " Add word "
            };
            (title, lines)
        }
        Modal::ListName { list, input } => {
            let title = if list.is_some() {
                " Rename list "
            } else {
                " New list "
            };
            let mut field = input.to_line(colors, true);
            field.spans.insert(0, Span::raw(" "));
            (
                title,
                vec![
                    Line::from(""),
                    field,
                    Line::from(""),
                    Line::from(Span::styled(
                        " [Enter] Save  [Esc] Cancel",
                        Style::default().fg(colors.accent()),
                    )),
                ],
            )
        }
        Modal::ConfirmDeleteWord(id) => {
            let name = app
                .words
                .iter()
                .find(|w| &w.id == id)
                .map_or(id.as_str(), |w| w.headword());
            (
                " Delete word ",
                vec![
                    Line::from(""),
                    Line::from(format!(" Delete \"{name}\"?")),
                    Line::from(""),
                    Line::from(Span::styled(
                        " [y] Yes  [n] No",
                        Style::default().fg(colors.accent()),
                    )),
                ],
            )
        }
        Modal::ConfirmDeleteList(id) => {
            let name = app
                .lists
                .iter()
                .find(|l| &l.id == id)
                .map_or(id.as_str(), |l| l.name.as_str());
            let members = count_members(&app.words, id);
            (
                " Delete list ",
                vec![
                    Line::from(""),
                    Line::from(format!(" Delete list \"{name}\"?")),
                    Line::from(Span::styled(
                        format!(" {members} word(s) will leave the list, none are deleted."),
                        Style::default().fg(colors.text_dim()),
                    )),
                    Line::from(""),
                    Line::from(Span::styled(
                        " [y] Yes  [n] No",
                        Style::default().fg(colors.accent()),
                    )),
                ],
            )
        }
    };

    let popup = match modal {
        Modal::Word(_) => centered_rect(60, 80, area),
        _ => centered_rect(50, 40, area),
    };
    frame.render_widget(Clear, popup);
    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(colors.fg()).bg(colors.bg()))
        .block(
            Block::bordered()
                .title(title)
                .border_style(Style::default().fg(colors.border_focused())),
        );
    frame.render_widget(paragraph, popup);
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn parse(dir: &TempDir, args: &[&str]) -> Cli {
        let config = dir.path().join("config.toml");
        let mut argv = vec!["kotoba", "--config", config.to_str().unwrap()];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn edits(cli: Cli) -> WordEdits {
        match cli.command {
            Some(Command::EditWord { edits, .. }) => edits,
            _ => panic!("not an edit-word command"),
        }
    }

    #[test]
    fn test_user_flag_overrides_config() {
        let dir = TempDir::new().unwrap();
        let cli = parse(&dir, &["--user", "alice", "lists"]);
        let (config, path) = load_config(&cli).unwrap();
        assert_eq!(config.user_id, "alice");
        assert_eq!(path, dir.path().join("config.toml"));
    }

    #[test]
    fn test_user_flag_with_dot_is_an_error() {
        let dir = TempDir::new().unwrap();
        let cli = parse(&dir, &["--user", "a.b", "remove-list", "1"]);
        let err = load_config(&cli).unwrap_err();
        assert!(err.to_string().contains("invalid user id"));
    }

    #[test]
    fn test_edit_word_flags_clear_fields() {
        let dir = TempDir::new().unwrap();
        let cli = parse(
            &dir,
            &["edit-word", "1", "--no-kanji", "--no-secondary", "--clear-lists"],
        );
        let patch = edits(cli).into_patch();
        assert_eq!(patch.kanji, Some(None));
        assert_eq!(patch.secondary_traduction, Some(None));
        assert_eq!(patch.lists, Some(vec![]));
        assert!(patch.kana.is_none());
    }

    #[test]
    fn test_edit_word_flags_set_fields() {
        let dir = TempDir::new().unwrap();
        let cli = parse(&dir, &["edit-word", "1", "--kanji", "水", "--list", "a", "--list", "b"]);
        let patch = edits(cli).into_patch();
        assert_eq!(patch.kanji, Some(Some("水".to_string())));
        assert!(patch.secondary_traduction.is_none());
        assert_eq!(patch.lists, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_edit_word_without_flags_is_empty() {
        let dir = TempDir::new().unwrap();
        let cli = parse(&dir, &["edit-word", "1"]);
        assert!(edits(cli).into_patch().is_empty());
    }

    #[test]
    fn test_clearing_and_setting_the_same_field_conflict() {
        let result = Cli::try_parse_from(["kotoba", "edit-word", "1", "--kanji", "水", "--no-kanji"]);
        assert!(result.is_err());
        let result = Cli::try_parse_from(["kotoba", "edit-word", "1", "--list", "a", "--clear-lists"]);
        assert!(result.is_err());
    }
}
