/// Turn clock of one session.
///
/// While playing, wall-clock time accumulates into a fractional turn; whole
/// turns are consumed and the remainder is kept as interpolation progress.
#[derive(Debug, Clone, PartialEq)]
pub struct Playback {
    turn: usize,
    turn_count: usize,
    fraction: f64,
    playing: bool,
    ms_per_turn: f64,
}

impl Playback {
    /// Starts playing at turn 0.
    pub fn new(turn_count: usize, ms_per_turn: f64) -> Self {
        Self {
            turn: 0,
            turn_count: turn_count.max(1),
            fraction: 0.0,
            playing: true,
            ms_per_turn: ms_per_turn.max(1.0),
        }
    }

    pub fn turn(&self) -> usize {
        self.turn
    }

    pub fn turn_count(&self) -> usize {
        self.turn_count
    }

    /// Interpolation progress toward the next turn, in `[0, 1)`.
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn last_turn(&self) -> usize {
        self.turn_count - 1
    }

    /// Advances by `elapsed_ms`; returns true when the turn changed.
    ///
    /// Reaching the last turn pauses and drops the fraction.
    pub fn advance(&mut self, elapsed_ms: f64) -> bool {
        if !self.playing {
            return false;
        }

        self.fraction += elapsed_ms.max(0.0) / self.ms_per_turn;
        let whole = self.fraction.floor();
        self.fraction -= whole;

        let before = self.turn;
        self.turn = (self.turn + whole as usize).min(self.last_turn());

        if self.turn == self.last_turn() {
            self.playing = false;
            self.fraction = 0.0;
        }

        self.turn != before
    }

    pub fn toggle(&mut self) {
        self.playing = !self.playing;
    }

    /// Jumps to `turn` (clamped), whether playing or not.
    pub fn set_turn(&mut self, turn: usize) -> usize {
        self.turn = turn.min(self.last_turn());
        self.turn
    }

    /// Moves `delta` turns, clamped at both ends.
    pub fn step(&mut self, delta: isize) -> usize {
        self.set_turn(self.turn.saturating_add_signed(delta))
    }

    /// Records one more available turn. A session parked on the previous
    /// last turn resumes playing.
    pub fn push_turn(&mut self) {
        if self.turn == self.last_turn() {
            self.playing = true;
        }
        self.turn_count += 1;
    }

    pub fn set_ms_per_turn(&mut self, ms: f64) {
        self.ms_per_turn = ms.max(1.0);
    }
}
