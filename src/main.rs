pub mod app_dirs;
pub mod dataset;
pub mod results;
pub mod runner;
pub mod runtime;
pub mod store;
pub mod ui;
pub mod util;

use crate::{
    app_dirs::AppDirs,
    dataset::{Preferences, SentenceSet, TaskSet},
    results::ResultWriter,
    runner::{RunSummary, TaskRunner},
    runtime::{AppEvent, CrosstermEventSource, EventPump, FixedTicker},
    store::FileStore,
};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

const TICK_RATE_MS: u64 = 100;

/// terminal runner for true/false sentence-judgment experiments
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Presents sentences one at a time and records timed true/false judgments. Task sets and sentence datasets are plain JSON files; every finished run is exported as a JSON document."
)]
pub struct Cli {
    /// task set to preselect, matched by id or name
    #[clap(short = 't', long)]
    task: Option<String>,

    /// directory holding sentence sets, task sets, and preferences
    #[clap(long)]
    data_dir: Option<PathBuf>,

    /// directory for result documents (default: <data-dir>/results)
    #[clap(long)]
    results_dir: Option<PathBuf>,

    /// list available task sets and sentence sets, then exit
    #[clap(long)]
    list: bool,

    /// replace stored sentence sets with the given JSON file, then exit
    #[clap(long, value_name = "FILE")]
    import_sentences: Option<PathBuf>,

    /// replace stored task sets with the given JSON file, then exit
    #[clap(long, value_name = "FILE")]
    import_tasks: Option<PathBuf>,

    /// write the stored sentence sets to the given JSON file, then exit
    #[clap(long, value_name = "FILE")]
    export_sentences: Option<PathBuf>,

    /// write the stored task sets to the given JSON file, then exit
    #[clap(long, value_name = "FILE")]
    export_tasks: Option<PathBuf>,

    /// also write each run's responses as CSV next to the JSON document
    #[clap(long)]
    csv: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Setup,
    Running,
    Finished,
}

#[derive(Debug)]
pub struct App {
    pub store: FileStore,
    pub results: ResultWriter,
    pub sentence_sets: Vec<SentenceSet>,
    pub task_sets: Vec<TaskSet>,
    pub preferences: Preferences,
    pub runner: TaskRunner,
    pub state: AppState,
    pub selected: usize,
    pub active_task: Option<TaskSet>,
    pub summary: Option<RunSummary>,
    pub last_saved: Option<PathBuf>,
    pub status: Option<String>,
    pub export_csv: bool,
}

impl App {
    pub fn new(cli: &Cli, store: FileStore, results: ResultWriter) -> Self {
        let sentence_sets = store.load_sentence_sets();
        let task_sets = store.load_task_sets();
        let preferences = store.load_preferences();

        let selected = cli
            .task
            .as_deref()
            .and_then(|wanted| {
                task_sets
                    .iter()
                    .position(|t| t.id == wanted || t.name == wanted)
            })
            .or_else(|| {
                preferences
                    .active_task_set_id
                    .as_deref()
                    .and_then(|id| task_sets.iter().position(|t| t.id == id))
            })
            .unwrap_or(0);

        Self {
            store,
            results,
            sentence_sets,
            task_sets,
            preferences,
            runner: TaskRunner::new(),
            state: AppState::Setup,
            selected,
            active_task: None,
            summary: None,
            last_saved: None,
            status: None,
            export_csv: cli.csv,
        }
    }

    pub fn selected_task(&self) -> Option<&TaskSet> {
        self.task_sets.get(self.selected)
    }

    pub fn dataset_for(&self, task: &TaskSet) -> Option<&SentenceSet> {
        self.sentence_sets
            .iter()
            .find(|set| set.id == task.sentence_set_id)
    }

    fn start_selected(&mut self) {
        let Some(task) = self.selected_task().cloned() else {
            self.status = Some("タスクセットがまだ存在しません。".into());
            return;
        };
        let Some(dataset) = self.dataset_for(&task).cloned() else {
            self.status = Some("参照先の文データセットが見つかりません。".into());
            return;
        };

        match self.runner.start(&task, &dataset, &self.preferences) {
            Ok(()) => {
                self.preferences.active_task_set_id = Some(task.id.clone());
                let _ = self.store.save_preferences(&self.preferences);
                self.active_task = Some(task);
                self.summary = None;
                self.last_saved = None;
                self.status = None;
                self.state = AppState::Running;
            }
            Err(err) => {
                self.status = Some(err.to_string());
            }
        }
    }

    fn abort_run(&mut self) {
        self.runner.reset();
        self.active_task = None;
        self.status = None;
        self.state = AppState::Setup;
    }

    fn finish_run(&mut self) {
        let Some(payload) = self.runner.take_result() else {
            return;
        };
        self.summary = Some(RunSummary::from_payload(&payload));

        match self.results.save(&payload) {
            Ok(json_path) => {
                if self.export_csv {
                    if let Err(err) = self.results.save_responses_csv(&payload, &json_path) {
                        self.status = Some(format!("CSV の書き出しに失敗しました: {err}"));
                    }
                }
                self.last_saved = Some(json_path);
            }
            Err(err) => {
                self.status = Some(format!("結果の保存に失敗しました: {err}"));
            }
        }

        self.state = AppState::Finished;
    }

    fn restart_same_task(&mut self) {
        self.runner.reset();
        self.start_selected();
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let data_dir = cli
        .data_dir
        .clone()
        .or_else(AppDirs::data_dir)
        .unwrap_or_else(|| PathBuf::from("shingi-data"));
    let results_dir = cli
        .results_dir
        .clone()
        .or_else(|| {
            if cli.data_dir.is_some() {
                None
            } else {
                AppDirs::results_dir()
            }
        })
        .unwrap_or_else(|| data_dir.join("results"));

    let store = FileStore::new(data_dir);
    if run_headless(&cli, &store)? {
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&cli, store, ResultWriter::new(results_dir));
    start_tui(&mut terminal, &mut app)?;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}

/// Handles the non-interactive flags. Returns true when the invocation is
/// complete without entering the TUI.
fn run_headless(cli: &Cli, store: &FileStore) -> Result<bool, Box<dyn Error>> {
    let mut handled = false;

    if let Some(path) = &cli.import_sentences {
        let sets = store.import_sentence_sets(path)?;
        println!("imported {} sentence set(s) from {}", sets.len(), path.display());
        handled = true;
    }
    if let Some(path) = &cli.import_tasks {
        let sets = store.import_task_sets(path)?;
        println!("imported {} task set(s) from {}", sets.len(), path.display());
        handled = true;
    }
    if let Some(path) = &cli.export_sentences {
        store.export_sentence_sets(path)?;
        println!("wrote sentence sets to {}", path.display());
        handled = true;
    }
    if let Some(path) = &cli.export_tasks {
        store.export_task_sets(path)?;
        println!("wrote task sets to {}", path.display());
        handled = true;
    }
    if cli.list {
        for set in store.load_sentence_sets() {
            println!("sentence-set  {}  {} ({} sentences)", set.id, set.name, set.sentences.len());
        }
        for task in store.load_task_sets() {
            let limit = if task.enable_time_limit {
                format!("{}s", task.duration_sec)
            } else {
                "no limit".to_string()
            };
            println!(
                "task-set      {}  {} [dataset: {}, {}]",
                task.id, task.name, task.sentence_set_id, limit
            );
        }
        handled = true;
    }

    Ok(handled)
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let pump = EventPump::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        match pump.step() {
            AppEvent::Tick => {
                if app.state == AppState::Running {
                    app.runner.on_tick();
                }
            }
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if !handle_key(app, key) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Returns false when the app should exit.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return false;
    }

    match app.state {
        AppState::Setup => match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return false,
            KeyCode::Up => {
                if app.selected > 0 {
                    app.selected -= 1;
                }
            }
            KeyCode::Down => {
                if app.selected + 1 < app.task_sets.len() {
                    app.selected += 1;
                }
            }
            KeyCode::Enter => app.start_selected(),
            _ => {}
        },
        AppState::Running => match key.code {
            KeyCode::Esc => app.abort_run(),
            KeyCode::Char(c) => {
                if app.runner.handle_key(c) && !app.runner.is_running() {
                    app.finish_run();
                }
            }
            _ => {}
        },
        AppState::Finished => match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return false,
            KeyCode::Char('r') => app.restart_same_task(),
            KeyCode::Char('n') | KeyCode::Enter => {
                app.runner.reset();
                app.state = AppState::Setup;
            }
            _ => {}
        },
    }

    true
}
