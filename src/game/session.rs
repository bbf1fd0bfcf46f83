//! Pure Simon game state machine.
//!
//! Owns the colour sequence, the player's position within it, the current
//! phase and the best score ever reached. Deliberately free of DOM and timer
//! types: the browser shell in [`super`] injects a [`Display`], a
//! [`ScoreStore`] and a [`ColorSource`] and drives the timed steps, so the
//! whole machine can be exercised natively in tests with mocks.
//!
//! Timing is expressed as constants here; the shell owns the actual
//! scheduling. Every deferred step carries the epoch it was scheduled under
//! and is rejected if a start/restart happened in between, so a stale
//! callback can never mutate a later game.

/// Tile highlight duration during a flash.
pub const FLASH_MS: i32 = 300;
/// Gap between successive playback steps.
pub const GAP_MS: i32 = 600;
/// Pause before the first flash of a playback run.
pub const LEAD_IN_MS: i32 = 500;
/// Pause after a completed round before the next colour is appended.
pub const NEXT_ROUND_MS: i32 = 800;
/// Pause after a wrong click before the sequence replays.
pub const RETRY_MS: i32 = 1000;

/// Storage key holding the best level ever reached (decimal string).
pub const HIGH_SCORE_KEY: &str = "memory_game_highscore";

/// The four tile colours.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
}

impl Color {
    pub const ALL: [Color; 4] = [Color::Red, Color::Green, Color::Blue, Color::Yellow];

    pub fn from_index(idx: usize) -> Color {
        Self::ALL[idx % Self::ALL.len()]
    }

    /// Lower-case name, used for element ids.
    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Yellow => "yellow",
        }
    }
}

/// Where the controller currently is in the start -> playback -> input loop.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    /// No game in progress.
    Idle,
    /// The sequence is being replayed; clicks are ignored.
    Playback,
    /// The player must reproduce the sequence.
    AwaitingInput,
    /// Wrong click: waiting out the penalty before the replay.
    Penalty,
    /// Round finished (or game just started): waiting for the next round.
    Advancing,
}

/// Source of the next sequence colour. Injectable so tests can script
/// deterministic sequences.
pub trait ColorSource {
    fn next_color(&mut self) -> Color;
}

/// One-way updates to whatever renders the game. All calls are immediate
/// and synchronous; un-highlighting after a flash is the caller's job.
pub trait Display {
    fn set_tile_active(&mut self, color: Color, active: bool);
    fn set_level(&mut self, level: u32);
    fn set_high_score(&mut self, value: u32);
    fn set_status(&mut self, message: &str);
}

/// Durable string-keyed store for the high score.
pub trait ScoreStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// Result of one timed playback step.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlaybackStep {
    /// Flash this tile, then schedule the next step after [`GAP_MS`].
    Flash(Color),
    /// Whole sequence shown; the session now awaits input.
    Finished,
    /// A restart happened in the meantime; drop the chain.
    Aborted,
}

/// What a tile click amounted to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ClickOutcome {
    /// Not in the input phase; nothing happened.
    Ignored,
    /// Correct colour, sequence not yet fully reproduced.
    Progress,
    /// Correct colour completed the sequence; schedule the next round
    /// after [`NEXT_ROUND_MS`].
    RoundComplete,
    /// Wrong colour; schedule a replay after [`RETRY_MS`].
    Mismatch,
}

/// A single game session plus the best score carried across sessions.
pub struct Session {
    sequence: Vec<Color>,
    user_index: usize,
    phase: Phase,
    high_score: u32,
    epoch: u64,
}

impl Session {
    pub fn new() -> Self {
        Self {
            sequence: Vec::new(),
            user_index: 0,
            phase: Phase::Idle,
            high_score: 0,
            epoch: 0,
        }
    }

    /// Current level; always equal to the sequence length.
    pub fn level(&self) -> u32 {
        self.sequence.len() as u32
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Liveness token captured by deferred steps.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn sequence(&self) -> &[Color] {
        &self.sequence
    }

    pub fn user_index(&self) -> usize {
        self.user_index
    }

    /// Reads the persisted best score, defaulting to 0 on a missing or
    /// non-numeric value, and pushes it to the display.
    pub fn load_high_score(&mut self, store: &dyn ScoreStore, display: &mut dyn Display) {
        self.high_score = store
            .get(HIGH_SCORE_KEY)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);
        display.set_high_score(self.high_score);
    }

    /// Begins a new game. Returns false (and does nothing) if a game is
    /// already in progress. On success the session is in `Advancing`; the
    /// caller follows up with [`advance_round`](Self::advance_round) to
    /// generate the first colour.
    pub fn start(&mut self, display: &mut dyn Display) -> bool {
        if self.phase != Phase::Idle {
            return false;
        }
        self.epoch += 1;
        self.sequence.clear();
        self.user_index = 0;
        self.phase = Phase::Advancing;
        display.set_level(0);
        display.set_status("Watch the pattern...");
        true
    }

    /// Unconditionally aborts the game and returns to `Idle`. Bumping the
    /// epoch turns every in-flight deferred step into a no-op.
    pub fn restart(&mut self, display: &mut dyn Display) {
        self.epoch += 1;
        self.sequence.clear();
        self.user_index = 0;
        self.phase = Phase::Idle;
        display.set_level(0);
        display.set_status("Game reset. Press Start to Play");
    }

    /// Appends one random colour and enters playback. Persists and displays
    /// a new high score before playback begins. Returns true if the round
    /// started, i.e. the epoch was live and the session was `Advancing`;
    /// the caller then schedules [`playback_step`](Self::playback_step) 0
    /// after [`LEAD_IN_MS`].
    pub fn advance_round(
        &mut self,
        epoch: u64,
        colors: &mut dyn ColorSource,
        display: &mut dyn Display,
        store: &mut dyn ScoreStore,
    ) -> bool {
        if epoch != self.epoch || self.phase != Phase::Advancing {
            return false;
        }
        self.sequence.push(colors.next_color());
        let level = self.level();
        display.set_level(level);
        if level > self.high_score {
            self.high_score = level;
            store.set(HIGH_SCORE_KEY, &level.to_string());
            display.set_high_score(level);
        }
        self.begin_playback(display);
        true
    }

    /// One step of the playback chain. Steps past the end of the sequence
    /// hand control to the player.
    pub fn playback_step(
        &mut self,
        index: usize,
        epoch: u64,
        display: &mut dyn Display,
    ) -> PlaybackStep {
        if epoch != self.epoch || self.phase != Phase::Playback {
            return PlaybackStep::Aborted;
        }
        match self.sequence.get(index) {
            Some(&color) => PlaybackStep::Flash(color),
            None => {
                self.phase = Phase::AwaitingInput;
                display.set_status("Your turn! Repeat the pattern.");
                PlaybackStep::Finished
            }
        }
    }

    /// Replays the current sequence after a penalty wait. Level, sequence
    /// and high score are untouched; only `user_index` resets.
    pub fn replay(&mut self, epoch: u64, display: &mut dyn Display) -> bool {
        if epoch != self.epoch || self.phase != Phase::Penalty {
            return false;
        }
        self.begin_playback(display);
        true
    }

    /// Validates a tile click against the expected colour. Clicks outside
    /// `AwaitingInput` (idle, playback, penalty or advancing waits) are
    /// ignored.
    pub fn handle_click(&mut self, color: Color, display: &mut dyn Display) -> ClickOutcome {
        if self.phase != Phase::AwaitingInput {
            return ClickOutcome::Ignored;
        }
        if self.sequence.get(self.user_index) == Some(&color) {
            self.user_index += 1;
            if self.user_index == self.sequence.len() {
                self.phase = Phase::Advancing;
                display.set_status("Nice! Get ready for the next level...");
                ClickOutcome::RoundComplete
            } else {
                display.set_status(&format!(
                    "Good so far... ({}/{})",
                    self.user_index,
                    self.sequence.len()
                ));
                ClickOutcome::Progress
            }
        } else {
            self.phase = Phase::Penalty;
            display.set_status("Oops! That was wrong. Watch the pattern and try again.");
            ClickOutcome::Mismatch
        }
    }

    fn begin_playback(&mut self, display: &mut dyn Display) {
        self.phase = Phase::Playback;
        self.user_index = 0;
        display.set_status("Watch the pattern...");
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
