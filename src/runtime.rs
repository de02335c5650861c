use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};
use log::{debug, warn};

use crate::error::{StoreError, WordSourceError};
use crate::leaderboard::{LeaderboardEntry, LeaderboardStore, LEADERBOARD_SIZE};
use crate::session::{RefreshTicket, SubmitTicket};
use crate::words::{WordPair, WordSource};

/// Runner tick interval
pub const TICK_RATE_MS: u64 = 100;

/// Unified event type consumed by the app
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    /// The terminal reader stopped; nothing more will arrive from the user
    InputClosed,
    WordsLoaded(Result<Vec<WordPair>, WordSourceError>),
    LeaderboardLoaded {
        ticket: RefreshTicket,
        result: Result<Vec<LeaderboardEntry>, StoreError>,
    },
    ScoreSubmitted {
        ticket: SubmitTicket,
        result: Result<String, StoreError>,
    },
}

/// Source of terminal and background events
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;

    /// Handle for posting background results into the same stream
    fn sender(&self) -> Sender<AppEvent>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let key_tx = tx.clone();

        std::thread::spawn(move || forward_terminal_events(event::read, key_tx));

        Self { tx, rx }
    }
}

/// Forwards terminal events until the reader fails or the receiver is
/// gone. A read failure is reported as `InputClosed`.
fn forward_terminal_events<R>(mut read: R, tx: Sender<AppEvent>)
where
    R: FnMut() -> io::Result<CtEvent>,
{
    loop {
        let ev = match read() {
            Ok(CtEvent::Key(key)) => AppEvent::Key(key),
            Ok(CtEvent::Resize(_, _)) => AppEvent::Resize,
            Ok(_) => continue,
            Err(e) => {
                warn!("terminal input closed: {e}");
                let _ = tx.send(AppEvent::InputClosed);
                return;
            }
        };
        if tx.send(ev).is_err() {
            return;
        }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<AppEvent> {
        self.tx.clone()
    }
}

/// Channel-backed event source for tests
pub struct TestEventSource {
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn channel() -> (Sender<AppEvent>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx.clone(), Self { tx, rx })
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<AppEvent> {
        self.tx.clone()
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedTicker {
    fn default() -> Self {
        Self::new(Duration::from_millis(TICK_RATE_MS))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> AppEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => AppEvent::Tick,
            Err(RecvTimeoutError::Disconnected) => AppEvent::InputClosed,
        }
    }

    pub fn sender(&self) -> Sender<AppEvent> {
        self.event_source.sender()
    }
}

/// Whether background work runs on its own thread or right away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobMode {
    Threaded,
    Inline,
}

/// Runs word loads and store calls off the UI thread, posting results
/// back as events.
#[derive(Clone)]
pub struct Jobs {
    tx: Sender<AppEvent>,
    store: Option<Arc<dyn LeaderboardStore>>,
    mode: JobMode,
}

impl Jobs {
    pub fn new(
        tx: Sender<AppEvent>,
        store: Option<Arc<dyn LeaderboardStore>>,
        mode: JobMode,
    ) -> Self {
        Self { tx, store, mode }
    }

    fn run<F>(&self, job: F)
    where
        F: FnOnce() -> AppEvent + Send + 'static,
    {
        match self.mode {
            JobMode::Inline => {
                let _ = self.tx.send(job());
            }
            JobMode::Threaded => {
                let tx = self.tx.clone();
                std::thread::spawn(move || {
                    if tx.send(job()).is_err() {
                        debug!("event loop gone, dropping job result");
                    }
                });
            }
        }
    }

    pub fn load_words(&self, source: Box<dyn WordSource>) {
        self.run(move || AppEvent::WordsLoaded(source.fetch()));
    }

    pub fn fetch_leaderboard(&self, ticket: RefreshTicket) {
        let store = self.store.clone();
        self.run(move || AppEvent::LeaderboardLoaded {
            ticket,
            result: match store {
                Some(store) => store.top_n(LEADERBOARD_SIZE),
                None => Err(StoreError::Unavailable("no leaderboard store".into())),
            },
        });
    }

    pub fn submit_score(&self, ticket: SubmitTicket) {
        let store = self.store.clone();
        self.run(move || {
            let result = match store {
                Some(store) => store.append(ticket.record()),
                None => Err(StoreError::Unavailable("no leaderboard store".into())),
            };
            AppEvent::ScoreSubmitted { ticket, result }
        });
    }
}
