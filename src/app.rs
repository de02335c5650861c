use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::debug;
use std::time::Instant;

use crate::error::SubmitError;
use crate::runtime::{AppEvent, Jobs};
use crate::session::{KeystrokeOutcome, Phase, Session};
use crate::timer::SecondClock;
use crate::words::WordSource;

/// Longest name the submit form accepts
pub const MAX_NAME_LEN: usize = 24;

/// Binds the session to terminal keys and background results
pub struct App {
    pub session: Session,
    pub show_translation: bool,
    /// Last message for the player, e.g. a failed submit
    pub status: Option<String>,
    clock: SecondClock,
    jobs: Jobs,
    words_loading: bool,
    quit: bool,
}

impl App {
    pub fn new(session: Session, jobs: Jobs, show_translation: bool) -> Self {
        Self {
            session,
            show_translation,
            status: None,
            clock: SecondClock::new(),
            jobs,
            words_loading: false,
            quit: false,
        }
    }

    /// Kicks off the word load and the first leaderboard fetch.
    pub fn boot(&mut self, source: Box<dyn WordSource>) {
        self.words_loading = true;
        self.jobs.load_words(source);
        self.refresh_leaderboard();
    }

    pub fn words_loading(&self) -> bool {
        self.words_loading
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Applies one event. Returns true when the screen should be redrawn.
    pub fn handle(&mut self, event: AppEvent, now: Instant) -> bool {
        let mut dirty = self.advance(now);

        match event {
            AppEvent::Tick => {}
            AppEvent::Resize => dirty = true,
            AppEvent::InputClosed => self.quit = true,
            AppEvent::Key(key) => {
                self.on_key(key, now);
                dirty = true;
            }
            AppEvent::WordsLoaded(result) => {
                self.words_loading = false;
                match result {
                    Ok(words) => {
                        self.session.load_word_pool(words);
                    }
                    Err(e) => self.session.fail_word_pool(&e),
                }
                dirty = true;
            }
            AppEvent::LeaderboardLoaded { ticket, result } => {
                dirty |= self.session.apply_leaderboard(ticket, result);
            }
            AppEvent::ScoreSubmitted { ticket, result } => {
                match self.session.finish_score_submit(ticket, result) {
                    Ok(_) => {
                        self.status = None;
                        self.refresh_leaderboard();
                    }
                    // the record still landed, so the ranking may have changed
                    Err(SubmitError::Stale { stored: true }) => self.refresh_leaderboard(),
                    Err(SubmitError::Stale { stored: false }) => {}
                    Err(e) => self.status = Some(e.to_string()),
                }
                dirty = true;
            }
        }

        dirty
    }

    /// Moves the countdown and the error flash forward to `now`.
    fn advance(&mut self, now: Instant) -> bool {
        let mut dirty = false;

        for _ in 0..self.clock.due(now) {
            dirty = true;
            if self.session.tick() {
                self.clock.stop();
                break;
            }
        }
        dirty |= self.session.expire_error(now);
        dirty
    }

    fn on_key(&mut self, key: KeyEvent, now: Instant) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => {
                self.quit = true;
                return;
            }
            KeyCode::Char('c') if ctrl => {
                self.quit = true;
                return;
            }
            _ => {}
        }

        match self.session.phase() {
            Phase::Idle => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                    self.start_round(now);
                }
            }
            Phase::Active => match key.code {
                KeyCode::Char(c) if !ctrl => {
                    let mut typed = self.session.input().to_string();
                    typed.push(c);
                    if let KeystrokeOutcome::Completed { points } =
                        self.session.apply_keystroke_at(&typed, now)
                    {
                        debug!("+{points}");
                    }
                }
                KeyCode::Backspace => {
                    let mut typed = self.session.input().to_string();
                    if typed.pop().is_some() {
                        self.session.apply_keystroke_at(&typed, now);
                    }
                }
                _ => {}
            },
            Phase::Finished => match key.code {
                KeyCode::Char('n') if ctrl => self.start_round(now),
                KeyCode::Right => self.start_round(now),
                KeyCode::Enter => {
                    if self.session.score_submitted() {
                        self.start_round(now);
                    } else {
                        self.submit();
                    }
                }
                KeyCode::Backspace => self.session.pop_name_char(),
                KeyCode::Char(c) if !ctrl && !c.is_control() => {
                    if self.session.player_name().chars().count() < MAX_NAME_LEN {
                        self.session.push_name_char(c);
                    }
                }
                _ => {}
            },
        }
    }

    fn start_round(&mut self, now: Instant) {
        if self.session.start() {
            self.clock.start(now);
            self.status = None;
        }
    }

    fn submit(&mut self) {
        let name = self.session.player_name().to_string();
        match self.session.begin_score_submit(&name) {
            Ok(ticket) => {
                self.status = None;
                self.jobs.submit_score(ticket);
            }
            Err(e) => {
                debug!("submit refused: {e}");
                self.status = Some(e.to_string());
            }
        }
    }

    fn refresh_leaderboard(&mut self) {
        let ticket = self.session.begin_leaderboard_refresh();
        self.jobs.fetch_leaderboard(ticket);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::{LeaderboardStore, MemoryLeaderboard};
    use crate::runtime::{FixedTicker, JobMode, Runner, TestEventSource};
    use crate::session::ROUND_SECS;
    use crate::words::{EmbeddedWordSource, WordList};
    use std::sync::Arc;
    use std::time::Duration;

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn setup() -> (App, Runner<TestEventSource, FixedTicker>, Arc<MemoryLeaderboard>) {
        let (_tx, es) = TestEventSource::channel();
        let runner = Runner::new(es, FixedTicker::new(Duration::from_millis(1)));
        let store = Arc::new(MemoryLeaderboard::new());
        let shared: Arc<dyn LeaderboardStore> = store.clone();
        let jobs = Jobs::new(runner.sender(), Some(shared), JobMode::Inline);
        let app = App::new(Session::with_seed(5), jobs, true);
        (app, runner, store)
    }

    fn drain(app: &mut App, runner: &Runner<TestEventSource, FixedTicker>, now: Instant) {
        loop {
            match runner.step() {
                AppEvent::Tick => break,
                ev => {
                    app.handle(ev, now);
                }
            }
        }
    }

    fn type_word(app: &mut App, now: Instant) {
        let word = app.session.current_word().english.clone();
        for c in word.chars() {
            app.handle(key(KeyCode::Char(c)), now);
        }
    }

    #[test]
    fn boot_loads_words_and_leaderboard() {
        let (mut app, runner, _store) = setup();
        let now = Instant::now();
        app.boot(Box::new(EmbeddedWordSource::new(WordList::Basic)));
        assert!(app.words_loading());

        drain(&mut app, &runner, now);
        assert!(!app.words_loading());
        assert!(app.session.can_start());
    }

    #[test]
    fn idle_ignores_start_until_words_arrive() {
        let (mut app, _runner, _store) = setup();
        app.handle(key(KeyCode::Enter), Instant::now());
        assert_eq!(app.session.phase(), Phase::Idle);
    }

    #[test]
    fn full_round_through_keys() {
        let (mut app, runner, store) = setup();
        let t0 = Instant::now();
        app.boot(Box::new(EmbeddedWordSource::new(WordList::Basic)));
        drain(&mut app, &runner, t0);

        app.handle(key(KeyCode::Enter), t0);
        assert_eq!(app.session.phase(), Phase::Active);

        type_word(&mut app, t0);
        type_word(&mut app, t0);
        assert_eq!(app.session.score(), 30);
        assert_eq!(app.session.combo(), 2);

        // the wall clock, not the tick count, drives the countdown
        app.handle(AppEvent::Tick, t0 + Duration::from_millis(2500));
        assert_eq!(app.session.time_remaining(), ROUND_SECS - 2);
        app.handle(
            AppEvent::Tick,
            t0 + Duration::from_secs(u64::from(ROUND_SECS) + 5),
        );
        assert_eq!(app.session.phase(), Phase::Finished);
        assert_eq!(app.session.time_remaining(), 0);

        for c in "Alice".chars() {
            app.handle(key(KeyCode::Char(c)), t0);
        }
        app.handle(key(KeyCode::Enter), t0);
        drain(&mut app, &runner, t0);

        assert!(app.session.score_submitted());
        assert_eq!(store.len(), 1);
        assert_eq!(app.session.leaderboard()[0].name, "Alice");
        assert_eq!(app.session.leaderboard()[0].score, 30);

        app.handle(key(KeyCode::Enter), t0);
        assert_eq!(app.session.phase(), Phase::Active);
        assert_eq!(app.session.score(), 0);
    }

    #[test]
    fn empty_name_sets_status() {
        let (mut app, runner, store) = setup();
        let t0 = Instant::now();
        app.boot(Box::new(EmbeddedWordSource::new(WordList::Basic)));
        drain(&mut app, &runner, t0);
        app.handle(key(KeyCode::Enter), t0);
        app.handle(AppEvent::Tick, t0 + Duration::from_secs(61));

        app.handle(key(KeyCode::Enter), t0 + Duration::from_secs(61));
        assert!(app.status.is_some());
        assert!(store.top_n(10).unwrap().is_empty());
    }

    #[test]
    fn backspace_shrinks_input() {
        let (mut app, runner, _store) = setup();
        let t0 = Instant::now();
        app.boot(Box::new(EmbeddedWordSource::new(WordList::Basic)));
        drain(&mut app, &runner, t0);
        app.handle(key(KeyCode::Enter), t0);

        let first = app.session.current_word().english.chars().next().unwrap();
        app.handle(key(KeyCode::Char(first)), t0);
        assert_eq!(app.session.input().chars().count(), 1);
        app.handle(key(KeyCode::Backspace), t0);
        assert_eq!(app.session.input(), "");
    }

    #[test]
    fn error_flash_expires_on_tick() {
        let (mut app, runner, _store) = setup();
        let t0 = Instant::now();
        app.boot(Box::new(EmbeddedWordSource::new(WordList::Basic)));
        drain(&mut app, &runner, t0);
        app.handle(key(KeyCode::Enter), t0);

        app.handle(key(KeyCode::Char('#')), t0);
        assert!(app.session.error_flag());
        assert!(app.handle(AppEvent::Tick, t0 + Duration::from_millis(600)));
        assert!(!app.session.error_flag());
    }

    #[test]
    fn closed_input_quits() {
        let (mut app, _runner, _store) = setup();
        app.handle(AppEvent::InputClosed, Instant::now());
        assert!(app.should_quit());
    }

    #[test]
    fn stale_submit_still_refreshes_ranking() {
        let (mut app, runner, store) = setup();
        let t0 = Instant::now();
        app.boot(Box::new(EmbeddedWordSource::new(WordList::Basic)));
        drain(&mut app, &runner, t0);
        app.handle(key(KeyCode::Enter), t0);
        app.handle(AppEvent::Tick, t0 + Duration::from_secs(61));

        app.handle(key(KeyCode::Char('Z')), t0);
        app.handle(key(KeyCode::Enter), t0);
        // restart before the queued submit result is handled
        app.handle(key(KeyCode::Right), t0);
        drain(&mut app, &runner, t0);

        assert!(!app.session.score_submitted());
        assert!(app.status.is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(app.session.leaderboard().len(), 1);
        assert_eq!(app.session.leaderboard()[0].name, "Z");
    }

    #[test]
    fn escape_quits() {
        let (mut app, _runner, _store) = setup();
        app.handle(key(KeyCode::Esc), Instant::now());
        assert!(app.should_quit());
    }
}
