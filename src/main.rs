use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::{info, warn};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    sync::Arc,
    time::Instant,
};

use tango::{
    app::App,
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore, Overrides, Settings},
    leaderboard::{LeaderboardStore, SqliteLeaderboard, LEADERBOARD_SIZE},
    logging,
    runtime::{CrosstermEventSource, EventSource, FixedTicker, JobMode, Jobs, Runner, Ticker},
    session::Session,
    words::{EmbeddedWordSource, FileWordSource, WordList, WordSource},
};

/// timed word-typing game with combo scoring and a shared leaderboard
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Retype English words against a 60 second countdown. Consecutive words build a combo that multiplies your score; submit the final score to the leaderboard."
)]
pub struct Cli {
    /// embedded word list to play with
    #[clap(short = 'l', long, value_enum)]
    list: Option<WordList>,

    /// JSON word list on disk ({"words": [{"english", "japanese"}]})
    #[clap(short = 'w', long)]
    words: Option<PathBuf>,

    /// leaderboard database path
    #[clap(long)]
    db: Option<PathBuf>,

    /// seed for word selection
    #[clap(long)]
    seed: Option<u64>,

    /// hide the japanese translation under each word
    #[clap(long)]
    no_translation: bool,

    /// print the leaderboard and exit
    #[clap(long)]
    top: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            word_list: self.list,
            words_path: self.words.clone(),
            db_path: self.db.clone(),
            hide_translation: self.no_translation,
            seed: self.seed,
        }
    }
}

fn open_store(settings: &Settings) -> Option<Arc<dyn LeaderboardStore>> {
    let path = settings.db_path.as_ref()?;
    match SqliteLeaderboard::open(path) {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            warn!("leaderboard unavailable at {}: {e}", path.display());
            None
        }
    }
}

fn word_source(settings: &Settings) -> Box<dyn WordSource> {
    match &settings.words_path {
        Some(path) => Box::new(FileWordSource::new(path)),
        None => Box::new(EmbeddedWordSource::new(settings.word_list)),
    }
}

fn print_top(store: Option<Arc<dyn LeaderboardStore>>) -> Result<(), Box<dyn Error>> {
    let store = store.ok_or("leaderboard database could not be opened")?;
    let entries = store.top_n(LEADERBOARD_SIZE)?;

    if entries.is_empty() {
        println!("no scores yet");
    }
    for (idx, entry) in entries.iter().enumerate() {
        println!("{:>2}. {:<16} {:>6}", idx + 1, entry.name, entry.score);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    logging::init(AppDirs::log_path().as_deref());

    let config = FileConfigStore::new().load();
    let settings = Settings::resolve(&config, cli.overrides());
    info!("starting with {settings:?}");

    let store = open_store(&settings);

    if cli.top {
        return print_top(store);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());
    let jobs = Jobs::new(runner.sender(), store, JobMode::Threaded);
    let session = match settings.seed {
        Some(seed) => Session::with_seed(seed),
        None => Session::new(),
    };
    let mut app = App::new(session, jobs, settings.show_translation);
    app.boot(word_source(&settings));

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        let event = runner.step();
        let dirty = app.handle(event, Instant::now());

        if app.should_quit() {
            break;
        }
        if dirty {
            terminal.draw(|f| f.render_widget(&*app, f.area()))?;
        }
    }

    info!("quitting");
    Ok(())
}
