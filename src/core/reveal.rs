//! Text reveal controller: typewriter with a hover scramble.
//!
//! Lifecycle of one `run()`:
//!
//! ```text
//! Idle → Typing → Complete → WaitingRestart → Typing → …
//!          │          │            │
//!          └──────────┴────────────┴─ hover → Paused(ScrambleIn) → Paused(Holding)
//!                                      leave → Paused(ScrambleOut) → Typing (same spot)
//! ```
//!
//! All timing is virtual: the controller owns a [`TimerQueue`] and only
//! moves when [`RevealController::tick`] (or the frame scheduler) advances
//! its clock.  Every timer is stamped with the current generation; `run()`
//! and `stop()` bump it, so nothing from an earlier run can fire afterwards.

use super::scheduler::{FrameDriven, FrameTick, TimerQueue, DEFAULT_FRAME_MS};
use super::scramble::{ScrambleState, SeedSequence, DEFAULT_DISSOLVE_FRAMES, DEFAULT_RESOLVE_FRAMES};
use super::sink::{InteractionSource, ListenerId, RenderSink, TextSlot};

// ───────────────────────────────────────── tokens ────────────

/// One unit of typed text.  Every token is typed one character per step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(Vec<char>),
    Space,
    Newline,
    /// The first blank line: title above, body below.
    BodyBreak,
}

impl Token {
    /// Length in characters.
    pub fn len(&self) -> usize {
        match self {
            Token::Word(chars) => chars.len(),
            Token::Space | Token::Newline => 1,
            Token::BodyBreak => 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn char_at(&self, i: usize) -> char {
        match self {
            Token::Word(chars) => chars[i],
            Token::Space => ' ',
            Token::Newline | Token::BodyBreak => '\n',
        }
    }

    fn push_prefix(&self, n: usize, out: &mut String) {
        for i in 0..n.min(self.len()) {
            out.push(self.char_at(i));
        }
    }
}

fn push_segment(tokens: &mut Vec<Token>, segment: &str) {
    for (line_no, line) in segment.lines().enumerate() {
        if line_no > 0 {
            tokens.push(Token::Newline);
        }
        for (word_no, word) in line.split_whitespace().enumerate() {
            if word_no > 0 {
                tokens.push(Token::Space);
            }
            tokens.push(Token::Word(word.chars().collect()));
        }
    }
}

/// Split text into words, single spaces and newline markers.  The first
/// blank line becomes a [`Token::BodyBreak`]; runs of spaces collapse.
/// CRLF line endings are read as LF.
pub fn tokenize(text: &str) -> Vec<Token> {
    let text = text.replace("\r\n", "\n");
    let text = text.trim();
    let mut tokens = Vec::new();
    match text.find("\n\n") {
        Some(split) => {
            push_segment(&mut tokens, text[..split].trim_end());
            let body = text[split + 2..].trim();
            if !body.is_empty() {
                tokens.push(Token::BodyBreak);
                push_segment(&mut tokens, body);
            }
        }
        None => push_segment(&mut tokens, text),
    }
    tokens
}

// ───────────────────────────────────────── phases ────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseStage {
    /// Typed prefix is scrambling into the full text.
    ScrambleIn,
    /// Full text on screen until the pointer leaves.
    Holding,
    /// Full text is scrambling back to the typed prefix.
    ScrambleOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevealPhase {
    #[default]
    Idle,
    Typing,
    Complete,
    WaitingRestart,
    Paused(PauseStage),
}

// ───────────────────────────────────────── config ────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealConfig {
    pub slot: TextSlot,
    /// Whole text types out in this long (before the per-char floor).
    pub typing_duration_ms: f64,
    pub min_char_delay_ms: f64,
    pub restart_delay_ms: f64,
    pub dissolve_frames: u32,
    pub resolve_frames: u32,
    pub frame_ms: f64,
    pub seed: u64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            slot: TextSlot::STORYLINE,
            typing_duration_ms: 4000.0,
            min_char_delay_ms: 18.0,
            restart_delay_ms: 60_000.0,
            dissolve_frames: DEFAULT_DISSOLVE_FRAMES,
            resolve_frames: DEFAULT_RESOLVE_FRAMES,
            frame_ms: DEFAULT_FRAME_MS,
            seed: 0x5EED,
        }
    }
}

impl RevealConfig {
    /// Replace non-finite / non-positive durations with defaults.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        let pick = |value: f64, fallback: f64, name: &str| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                tracing::warn!(name, value, fallback, "reveal setting out of range, using default");
                fallback
            }
        };
        Self {
            slot: self.slot,
            typing_duration_ms: pick(self.typing_duration_ms, d.typing_duration_ms, "typing_duration_ms"),
            min_char_delay_ms: pick(self.min_char_delay_ms, d.min_char_delay_ms, "min_char_delay_ms"),
            restart_delay_ms: pick(self.restart_delay_ms, d.restart_delay_ms, "restart_delay_ms"),
            dissolve_frames: self.dissolve_frames.max(1),
            resolve_frames: self.resolve_frames.max(1),
            frame_ms: pick(self.frame_ms, d.frame_ms, "frame_ms"),
            seed: self.seed,
        }
    }

    /// Per-character delay for a text of `total_chars` characters.
    pub fn char_delay_ms(&self, total_chars: usize) -> f64 {
        if total_chars == 0 {
            return self.min_char_delay_ms;
        }
        (self.typing_duration_ms / total_chars as f64).max(self.min_char_delay_ms)
    }
}

// ───────────────────────────────────────── state ─────────────

/// Typing cursor over the tokens of one `run()`.
#[derive(Debug, Clone)]
pub struct RevealState {
    tokens: Vec<Token>,
    word_index: usize,
    char_index: usize,
    full_text: String,
    char_delay_ms: f64,
    steps: usize,
    separator_shown: bool,
}

impl RevealState {
    fn new(tokens: Vec<Token>, config: &RevealConfig) -> Self {
        let mut full_text = String::new();
        for t in &tokens {
            t.push_prefix(t.len(), &mut full_text);
        }
        let total = full_text.chars().count();
        Self {
            tokens,
            word_index: 0,
            char_index: 0,
            char_delay_ms: config.char_delay_ms(total),
            full_text,
            steps: 0,
            separator_shown: false,
        }
    }

    fn rewind(&mut self) {
        self.word_index = 0;
        self.char_index = 0;
        self.steps = 0;
        self.separator_shown = false;
    }

    pub fn is_complete(&self) -> bool {
        self.word_index >= self.tokens.len()
    }

    /// Reconstruct what has been typed from the cursor.
    pub fn typed_so_far(&self) -> String {
        let mut out = String::new();
        for t in &self.tokens[..self.word_index.min(self.tokens.len())] {
            t.push_prefix(t.len(), &mut out);
        }
        if let Some(t) = self.tokens.get(self.word_index) {
            t.push_prefix(self.char_index, &mut out);
        }
        out
    }

    /// Reveal one character.  Returns it, plus whether the title/body break
    /// was just finished.
    fn advance(&mut self) -> Option<(char, bool)> {
        let token = self.tokens.get(self.word_index)?;
        let c = token.char_at(self.char_index);
        let finished_break = self.char_index + 1 >= token.len() && *token == Token::BodyBreak;
        self.char_index += 1;
        if self.char_index >= token.len() {
            self.word_index += 1;
            self.char_index = 0;
        }
        self.steps += 1;
        Some((c, finished_break))
    }
}

/// Read-only view for tests and introspection.
#[derive(Debug, Clone, PartialEq)]
pub struct RevealSnapshot {
    pub phase: RevealPhase,
    pub word_index: usize,
    pub char_index: usize,
    pub token_count: usize,
    pub steps: usize,
    pub typed_so_far: String,
    pub full_text: String,
    pub display: String,
    pub char_delay_ms: f64,
    pub paused: bool,
    pub generation: u64,
    pub now_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RevealTimer {
    TypeChar,
    ScrambleFrame,
    Restart,
}

// ───────────────────────────────────────── controller ────────

/// One storyline reveal.  Exclusively owns its state and timers.
#[derive(Debug)]
pub struct RevealController {
    config: RevealConfig,
    phase: RevealPhase,
    state: Option<RevealState>,
    timers: TimerQueue<RevealTimer>,
    now_ms: f64,
    display: String,
    scramble: Option<ScrambleState>,
    seeds: SeedSequence,
    listener: Option<ListenerId>,
}

impl RevealController {
    pub fn new(config: RevealConfig) -> Self {
        let config = config.sanitized();
        Self {
            seeds: SeedSequence::new(config.seed),
            config,
            phase: RevealPhase::Idle,
            state: None,
            timers: TimerQueue::new(),
            now_ms: 0.0,
            display: String::new(),
            scramble: None,
            listener: None,
        }
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.timers.generation()
    }

    /// Start typing `text` from scratch, cancelling whatever was running.
    /// A missing sink only cancels; empty / missing text clears the output
    /// and types nothing.
    pub fn run(&mut self, sink: Option<&mut dyn RenderSink>, text: Option<&str>) {
        self.stop();
        let Some(sink) = sink else {
            return;
        };
        self.display.clear();
        sink.set_text(self.config.slot, "");
        sink.set_separator_visible(self.config.slot, false);

        let tokens = tokenize(text.unwrap_or(""));
        if tokens.is_empty() {
            tracing::debug!(generation = self.generation(), "reveal run with empty text");
            return;
        }
        let state = RevealState::new(tokens, &self.config);
        tracing::debug!(
            generation = self.generation(),
            chars = state.full_text.chars().count(),
            char_delay_ms = state.char_delay_ms,
            "reveal run"
        );
        self.state = Some(state);
        self.begin_typing();
    }

    /// Hard cancel.  No timer scheduled before this call will ever fire.
    pub fn stop(&mut self) {
        let generation = self.timers.bump_generation();
        if self.phase != RevealPhase::Idle {
            tracing::debug!(generation, "reveal stopped");
        }
        self.phase = RevealPhase::Idle;
        self.state = None;
        self.scramble = None;
    }

    /// Bind hover events of this controller's slot.  Attaches at most once.
    pub fn setup_hover_reveal(&mut self, source: &mut dyn InteractionSource) {
        if self.listener.is_none() {
            self.listener = Some(source.attach_hover(self.config.slot));
        }
    }

    /// Detach the hover binding made by [`Self::setup_hover_reveal`].
    pub fn teardown(&mut self, source: &mut dyn InteractionSource) {
        if let Some(id) = self.listener.take() {
            source.detach(id);
        }
    }

    pub fn snapshot(&self) -> RevealSnapshot {
        let (word_index, char_index, token_count, steps, typed, full, delay) = match &self.state {
            Some(s) => (
                s.word_index,
                s.char_index,
                s.tokens.len(),
                s.steps,
                s.typed_so_far(),
                s.full_text.clone(),
                s.char_delay_ms,
            ),
            None => (0, 0, 0, 0, String::new(), String::new(), 0.0),
        };
        RevealSnapshot {
            phase: self.phase,
            word_index,
            char_index,
            token_count,
            steps,
            typed_so_far: typed,
            full_text: full,
            display: self.display.clone(),
            char_delay_ms: delay,
            paused: matches!(self.phase, RevealPhase::Paused(_)),
            generation: self.generation(),
            now_ms: self.now_ms,
        }
    }

    // ── hover / tap ────────────────────────────────────────────

    /// Pointer entered the text: scramble the typed prefix into the full text
    /// and hold it.
    pub fn pointer_enter(&mut self) {
        match self.phase {
            RevealPhase::Typing
            | RevealPhase::Complete
            | RevealPhase::WaitingRestart
            | RevealPhase::Paused(PauseStage::ScrambleOut) => {
                let Some(full) = self.state.as_ref().map(|s| s.full_text.clone()) else {
                    return;
                };
                tracing::debug!(from = ?self.phase, "reveal paused");
                self.start_scramble(full, PauseStage::ScrambleIn);
            }
            RevealPhase::Idle
            | RevealPhase::Paused(PauseStage::ScrambleIn)
            | RevealPhase::Paused(PauseStage::Holding) => {}
        }
    }

    /// Pointer left: scramble back to the typed prefix, then resume typing.
    pub fn pointer_leave(&mut self) {
        match self.phase {
            RevealPhase::Paused(PauseStage::ScrambleIn) | RevealPhase::Paused(PauseStage::Holding) => {
                let Some(typed) = self.state.as_ref().map(RevealState::typed_so_far) else {
                    return;
                };
                tracing::debug!("reveal resuming");
                self.start_scramble(typed, PauseStage::ScrambleOut);
            }
            _ => {}
        }
    }

    /// Touch has no hover: a tap toggles the pause.
    pub fn tap(&mut self) {
        match self.phase {
            RevealPhase::Paused(PauseStage::ScrambleIn) | RevealPhase::Paused(PauseStage::Holding) => {
                self.pointer_leave()
            }
            _ => self.pointer_enter(),
        }
    }

    // ── clock ──────────────────────────────────────────────────

    /// Advance the virtual clock by `delta_ms`, firing every due timer in
    /// order.
    pub fn tick(&mut self, delta_ms: f64, sink: &mut dyn RenderSink) {
        if !delta_ms.is_finite() || delta_ms < 0.0 {
            return;
        }
        self.advance_to(self.now_ms + delta_ms, sink);
    }

    /// Advance the virtual clock to `now_ms` (ignored if in the past).
    pub fn advance_to(&mut self, now_ms: f64, sink: &mut dyn RenderSink) {
        if !now_ms.is_finite() || now_ms < self.now_ms {
            return;
        }
        if self.phase == RevealPhase::Complete {
            self.phase = RevealPhase::WaitingRestart;
        }
        while let Some((due, timer)) = self.timers.pop_due(now_ms) {
            self.now_ms = due.max(self.now_ms);
            self.fire(timer, due, sink);
        }
        self.now_ms = now_ms;
    }

    // ── internals ──────────────────────────────────────────────

    fn begin_typing(&mut self) {
        let Some(state) = self.state.as_ref() else {
            return;
        };
        self.phase = RevealPhase::Typing;
        self.timers
            .schedule(self.now_ms + state.char_delay_ms, RevealTimer::TypeChar);
    }

    fn start_scramble(&mut self, target: String, stage: PauseStage) {
        // Drops the pending type/restart/frame timer of the previous stage.
        self.timers.bump_generation();
        let seed = self.seeds.next_seed();
        self.scramble = Some(ScrambleState::new(
            self.display.clone(),
            target,
            seed,
            self.config.dissolve_frames,
            self.config.resolve_frames,
        ));
        self.phase = RevealPhase::Paused(stage);
        self.timers.schedule(self.now_ms, RevealTimer::ScrambleFrame);
    }

    fn complete(&mut self, at_ms: f64) {
        self.phase = RevealPhase::Complete;
        self.timers
            .schedule(at_ms + self.config.restart_delay_ms, RevealTimer::Restart);
        tracing::debug!(at_ms, "reveal complete");
    }

    fn fire(&mut self, timer: RevealTimer, due: f64, sink: &mut dyn RenderSink) {
        let slot = self.config.slot;
        match timer {
            RevealTimer::TypeChar => {
                if self.phase != RevealPhase::Typing {
                    return;
                }
                let Some(state) = self.state.as_mut() else {
                    return;
                };
                let Some((c, finished_break)) = state.advance() else {
                    self.complete(due);
                    return;
                };
                if finished_break && !state.separator_shown {
                    state.separator_shown = true;
                    sink.set_separator_visible(slot, true);
                }
                self.display.push(c);
                sink.set_text(slot, &self.display);
                let (done, delay) = (state.is_complete(), state.char_delay_ms);
                if done {
                    self.complete(due);
                } else {
                    self.timers.schedule(due + delay, RevealTimer::TypeChar);
                }
            }
            RevealTimer::ScrambleFrame => {
                let Some(scramble) = self.scramble.as_mut() else {
                    return;
                };
                if let Some(text) = scramble.step() {
                    self.display = text;
                    sink.set_text(slot, &self.display);
                }
                if !scramble.is_done() {
                    self.timers
                        .schedule(due + self.config.frame_ms, RevealTimer::ScrambleFrame);
                    return;
                }
                self.scramble = None;
                match self.phase {
                    RevealPhase::Paused(PauseStage::ScrambleIn) => {
                        self.phase = RevealPhase::Paused(PauseStage::Holding);
                    }
                    RevealPhase::Paused(PauseStage::ScrambleOut) => self.resume(due),
                    _ => {}
                }
            }
            RevealTimer::Restart => {
                if !matches!(self.phase, RevealPhase::Complete | RevealPhase::WaitingRestart) {
                    return;
                }
                let Some(state) = self.state.as_mut() else {
                    return;
                };
                state.rewind();
                self.display.clear();
                sink.set_text(slot, "");
                sink.set_separator_visible(slot, false);
                tracing::debug!(generation = self.generation(), "reveal restarting");
                self.phase = RevealPhase::Idle;
                self.begin_typing();
            }
        }
    }

    /// Pick typing back up where the cursor was frozen.
    fn resume(&mut self, at_ms: f64) {
        let Some(state) = self.state.as_ref() else {
            self.phase = RevealPhase::Idle;
            return;
        };
        if state.is_complete() {
            self.complete(at_ms);
        } else {
            self.phase = RevealPhase::Typing;
            self.timers
                .schedule(at_ms + state.char_delay_ms, RevealTimer::TypeChar);
        }
    }
}

impl FrameDriven for RevealController {
    fn on_frame(&mut self, tick: FrameTick, sink: &mut dyn RenderSink) {
        self.advance_to(tick.now_ms, sink);
    }
}
