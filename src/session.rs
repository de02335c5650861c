use chrono::Local;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::Instant;

use crate::error::{StoreError, SubmitError, WordSourceError};
use crate::leaderboard::{LeaderboardEntry, LeaderboardStore, ScoreRecord, LEADERBOARD_SIZE};
use crate::timer::ErrorFlash;
use crate::words::WordPair;

/// Length of a round in seconds
pub const ROUND_SECS: u32 = 60;

/// Base points for a completed word, multiplied by `combo + 1`
pub const POINTS_PER_WORD: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Active,
    Finished,
}

/// Display state of a single character of the current word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharState {
    Correct,
    Incorrect,
    Pending,
}

/// What a keystroke did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeystrokeOutcome {
    /// No round in progress
    Ignored,
    /// Not a prefix of the current word; combo dropped
    Rejected,
    /// Valid prefix, buffer updated
    Partial,
    /// Word finished; a new one was drawn
    Completed { points: u32 },
}

/// A score submission accepted by the session, waiting on the store.
#[derive(Debug, Clone)]
pub struct SubmitTicket {
    generation: u64,
    record: ScoreRecord,
}

impl SubmitTicket {
    pub fn record(&self) -> &ScoreRecord {
        &self.record
    }
}

/// Identifies one leaderboard refresh; later tickets win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

/// One game session: timer, current word, combo and score, plus the
/// cached leaderboard view.
#[derive(Debug)]
pub struct Session {
    word_pool: Vec<WordPair>,
    current_word: WordPair,
    input: String,
    score: u32,
    combo: u32,
    time_remaining: u32,
    phase: Phase,
    error_flash: ErrorFlash,
    player_name: String,
    score_submitted: bool,
    submit_pending: bool,
    generation: u64,
    leaderboard: Vec<LeaderboardEntry>,
    refresh_issued: u64,
    refresh_applied: u64,
    rng: StdRng,
}

impl Session {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic word draws, for tests and `--seed`
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            word_pool: Vec::new(),
            current_word: WordPair::default(),
            input: String::new(),
            score: 0,
            combo: 0,
            time_remaining: ROUND_SECS,
            phase: Phase::Idle,
            error_flash: ErrorFlash::default(),
            player_name: String::new(),
            score_submitted: false,
            submit_pending: false,
            generation: 0,
            leaderboard: Vec::new(),
            refresh_issued: 0,
            refresh_applied: 0,
            rng,
        }
    }

    pub fn word_pool(&self) -> &[WordPair] {
        &self.word_pool
    }

    pub fn current_word(&self) -> &WordPair {
        &self.current_word
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn error_flag(&self) -> bool {
        self.error_flash.is_raised()
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn score_submitted(&self) -> bool {
        self.score_submitted
    }

    pub fn submit_pending(&self) -> bool {
        self.submit_pending
    }

    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.leaderboard
    }

    pub fn can_start(&self) -> bool {
        !self.word_pool.is_empty()
    }

    /// Installs the word pool. The pool is fixed once loaded; later loads
    /// are ignored.
    pub fn load_word_pool(&mut self, pairs: Vec<WordPair>) -> bool {
        if !self.word_pool.is_empty() {
            warn!("word pool already loaded, ignoring {} words", pairs.len());
            return false;
        }
        let pairs: Vec<WordPair> = pairs
            .into_iter()
            .filter(|p| !p.english.is_empty())
            .collect();
        info!("loaded {} words", pairs.len());
        self.word_pool = pairs;
        self.can_start()
    }

    /// The word source could not be reached; the pool stays empty.
    pub fn fail_word_pool(&mut self, err: &WordSourceError) {
        warn!("word list unavailable: {err}");
    }

    /// Begins a new round. Does nothing while the pool is empty.
    pub fn start(&mut self) -> bool {
        if self.word_pool.is_empty() {
            debug!("start ignored: no words loaded");
            return false;
        }

        self.generation += 1;
        self.score = 0;
        self.combo = 0;
        self.time_remaining = ROUND_SECS;
        self.input.clear();
        self.player_name.clear();
        self.score_submitted = false;
        self.submit_pending = false;
        self.error_flash.clear();
        self.phase = Phase::Active;
        self.draw_word();

        info!("round {} started", self.generation);
        true
    }

    /// One second has elapsed. Returns true when this tick ended the round.
    pub fn tick(&mut self) -> bool {
        if self.phase != Phase::Active {
            return false;
        }

        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining == 0 {
            self.phase = Phase::Finished;
            self.error_flash.clear();
            info!(
                "round {} finished with score {}",
                self.generation, self.score
            );
            return true;
        }
        false
    }

    pub fn apply_keystroke(&mut self, typed: &str) -> KeystrokeOutcome {
        self.apply_keystroke_at(typed, Instant::now())
    }

    /// Validates `typed`, the full would-be contents of the input buffer.
    pub fn apply_keystroke_at(&mut self, typed: &str, now: Instant) -> KeystrokeOutcome {
        if self.phase != Phase::Active {
            return KeystrokeOutcome::Ignored;
        }

        let word: Vec<char> = self.current_word.english.chars().collect();
        let typed_len = typed.chars().count();
        let is_prefix = typed_len <= word.len()
            && typed.chars().zip(&word).all(|(t, &w)| same_letter(t, w));

        if !is_prefix {
            self.error_flash.raise(now);
            self.combo = 0;
            debug!("rejected {:?} for {:?}", typed, self.current_word.english);
            return KeystrokeOutcome::Rejected;
        }

        if typed_len == word.len() {
            let points = POINTS_PER_WORD * (self.combo + 1);
            self.score += points;
            self.combo += 1;
            self.input.clear();
            debug!(
                "completed {:?} for {} points (combo {})",
                self.current_word.english, points, self.combo
            );
            self.draw_word();
            return KeystrokeOutcome::Completed { points };
        }

        self.input = typed.to_string();
        KeystrokeOutcome::Partial
    }

    /// Drops the error flag once its 500ms window has passed.
    pub fn expire_error(&mut self, now: Instant) -> bool {
        self.error_flash.expire(now)
    }

    pub fn char_state(&self, index: usize) -> CharState {
        match self.input.chars().nth(index) {
            None => CharState::Pending,
            Some(typed) => match self.current_word.english.chars().nth(index) {
                Some(expected) if same_letter(typed, expected) => CharState::Correct,
                _ => CharState::Incorrect,
            },
        }
    }

    /// Every character of the current word with its display state.
    pub fn char_states(&self) -> Vec<(char, CharState)> {
        self.current_word
            .english
            .chars()
            .enumerate()
            .map(|(idx, c)| (c, self.char_state(idx)))
            .collect()
    }

    fn name_editable(&self) -> bool {
        self.phase == Phase::Finished && !self.score_submitted && !self.submit_pending
    }

    pub fn set_player_name(&mut self, name: &str) {
        if self.name_editable() {
            self.player_name = name.to_string();
        }
    }

    pub fn push_name_char(&mut self, c: char) {
        if self.name_editable() {
            self.player_name.push(c);
        }
    }

    pub fn pop_name_char(&mut self) {
        if self.name_editable() {
            self.player_name.pop();
        }
    }

    /// Validates a submission and hands back the record to write.
    pub fn begin_score_submit(&mut self, name: &str) -> Result<SubmitTicket, SubmitError> {
        if self.phase != Phase::Finished {
            return Err(SubmitError::NotFinished);
        }
        if self.score_submitted {
            return Err(SubmitError::AlreadySubmitted);
        }
        if self.submit_pending {
            return Err(SubmitError::InFlight);
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(SubmitError::EmptyName);
        }

        self.player_name = name.to_string();
        self.submit_pending = true;

        Ok(SubmitTicket {
            generation: self.generation,
            record: ScoreRecord {
                name: self.player_name.clone(),
                score: self.score,
                timestamp: Local::now(),
            },
        })
    }

    /// Applies the store's answer to an earlier `begin_score_submit`.
    pub fn finish_score_submit(
        &mut self,
        ticket: SubmitTicket,
        result: Result<String, StoreError>,
    ) -> Result<String, SubmitError> {
        if ticket.generation != self.generation {
            debug!(
                "dropping submit result from round {} (now {})",
                ticket.generation, self.generation
            );
            return Err(SubmitError::Stale {
                stored: result.is_ok(),
            });
        }

        self.submit_pending = false;
        match result {
            Ok(id) => {
                self.score_submitted = true;
                info!(
                    "submitted score {} for {} as {}",
                    ticket.record.score, ticket.record.name, id
                );
                Ok(id)
            }
            Err(err) => {
                warn!("failed to submit score: {err}");
                Err(SubmitError::Store(err))
            }
        }
    }

    /// Writes the score through `store` and refreshes the leaderboard.
    pub fn request_score_submit(
        &mut self,
        name: &str,
        store: &dyn LeaderboardStore,
    ) -> Result<(), SubmitError> {
        let ticket = self.begin_score_submit(name)?;
        let result = store.append(ticket.record());
        self.finish_score_submit(ticket, result)?;
        self.refresh_leaderboard(store);
        Ok(())
    }

    pub fn begin_leaderboard_refresh(&mut self) -> RefreshTicket {
        self.refresh_issued += 1;
        RefreshTicket(self.refresh_issued)
    }

    /// Replaces the cached leaderboard unless a newer refresh already
    /// landed. Fetch failures keep the stale list.
    pub fn apply_leaderboard(
        &mut self,
        ticket: RefreshTicket,
        result: Result<Vec<LeaderboardEntry>, StoreError>,
    ) -> bool {
        if ticket.0 <= self.refresh_applied {
            debug!("dropping leaderboard refresh {}", ticket.0);
            return false;
        }

        match result {
            Ok(mut entries) => {
                entries.truncate(LEADERBOARD_SIZE);
                self.refresh_applied = ticket.0;
                self.leaderboard = entries;
                true
            }
            Err(err) => {
                warn!("failed to fetch leaderboard: {err}");
                false
            }
        }
    }

    pub fn refresh_leaderboard(&mut self, store: &dyn LeaderboardStore) -> bool {
        let ticket = self.begin_leaderboard_refresh();
        let result = store.top_n(LEADERBOARD_SIZE);
        self.apply_leaderboard(ticket, result)
    }

    fn draw_word(&mut self) {
        if let Some(word) = self.word_pool.choose(&mut self.rng) {
            self.current_word = word.clone();
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Case-insensitive comparison of a single typed character.
fn same_letter(typed: char, expected: char) -> bool {
    Iterator::eq(typed.to_lowercase(), expected.to_lowercase())
}
