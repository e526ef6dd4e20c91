//! Scramble cipher: deterministic pseudo-random character morphing.
//!
//! [`scramble`] is a pure function of its inputs: the substitute character
//! at a position depends only on `(seed, position, frame)`, so replaying a
//! transition with the same seed reproduces it exactly.

use super::scheduler::{FrameDriven, FrameTick, DEFAULT_FRAME_MS};
use super::sink::{RenderSink, TextSlot};

/// Substitution alphabet.
pub const CHARSET: &[u8; 48] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()-+";

const POSITION_PRIME: u64 = 7919;
const FRAME_PRIME: u64 = 997;

/// Default phase lengths for the hover transitions.
pub const DEFAULT_DISSOLVE_FRAMES: u32 = 15;
pub const DEFAULT_RESOLVE_FRAMES: u32 = 25;

/// Which half of a transition is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScramblePhase {
    /// Phase 0: the source text breaks up into noise.
    Dissolve,
    /// Phase 1: noise settles into the target text, left to right.
    Resolve,
}

fn mix(seed: u32, position: usize, frame: u32) -> u64 {
    u64::from(seed)
        .wrapping_add((position as u64).wrapping_mul(POSITION_PRIME))
        .wrapping_add(u64::from(frame).wrapping_mul(FRAME_PRIME))
}

/// Substitute character for `position` at `frame`.
pub fn char_at(seed: u32, position: usize, frame: u32) -> char {
    CHARSET[(mix(seed, position, frame) % CHARSET.len() as u64) as usize] as char
}

/// Per-position threshold in `[0, 1)` used to decide substitution.
fn threshold(seed: u32, position: usize, frame: u32) -> f64 {
    (mix(seed, position, frame) % 1000) as f64 / 1000.0
}

/// One frame of a transition from `current` toward `target`.
///
/// `progress` is clamped to `[0, 1]`.  Newlines pass through untouched so
/// multi-line text keeps its shape while scrambling.
pub fn scramble(
    current: &str,
    target: &str,
    phase: ScramblePhase,
    progress: f64,
    frame: u32,
    seed: u32,
) -> String {
    let progress = if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    };
    let mut out = String::with_capacity(current.len().max(target.len()));

    match phase {
        ScramblePhase::Dissolve => {
            let mut len = 0;
            for (i, c) in current.chars().enumerate() {
                len = i + 1;
                if c == '\n' {
                    out.push(c);
                } else if progress < 0.5 {
                    if threshold(seed, i, frame) < progress * 2.0 {
                        out.push(char_at(seed, i, frame));
                    } else {
                        out.push(c);
                    }
                } else {
                    out.push(char_at(seed, i, frame));
                }
            }
            if progress > 0.0 {
                for (i, t) in target.chars().enumerate().skip(len) {
                    out.push(if t == '\n' { t } else { char_at(seed, i, frame) });
                }
            }
        }
        ScramblePhase::Resolve => {
            let len = target.chars().count();
            for (i, t) in target.chars().enumerate() {
                if t == '\n' {
                    out.push(t);
                    continue;
                }
                let p = i as f64 / len as f64 + progress * 0.8;
                if p < 0.2 {
                    out.push(char_at(seed, i, frame));
                } else if p < 0.6 {
                    let reveal = (p - 0.2) / 0.4;
                    if threshold(seed, i, frame) < reveal {
                        out.push(t);
                    } else {
                        out.push(char_at(seed, i, frame));
                    }
                } else {
                    out.push(t);
                }
            }
        }
    }
    out
}

// ───────────────────────────────────────── seeds ─────────────

/// Deterministic seed stream (splitmix64), so a controller constructed with
/// the same base seed scrambles identically on every run.
#[derive(Debug, Clone)]
pub struct SeedSequence(u64);

impl SeedSequence {
    pub fn new(base: u64) -> Self {
        Self(base)
    }

    /// Next seed in `0..1_000_000`.
    pub fn next_seed(&mut self) -> u32 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        (z % 1_000_000) as u32
    }
}

// ───────────────────────────────────────── runner ────────────

/// Frame-stepped transition: `dissolve_frames` of phase 0, then
/// `resolve_frames` of phase 1, ending on the target text exactly.
#[derive(Debug, Clone)]
pub struct ScrambleState {
    seed: u32,
    phase: ScramblePhase,
    frame: u32,
    dissolve_frames: u32,
    resolve_frames: u32,
    from: String,
    target: String,
    done: bool,
}

impl ScrambleState {
    pub fn new(
        from: impl Into<String>,
        target: impl Into<String>,
        seed: u32,
        dissolve_frames: u32,
        resolve_frames: u32,
    ) -> Self {
        Self {
            seed,
            phase: ScramblePhase::Dissolve,
            frame: 0,
            dissolve_frames: dissolve_frames.max(1),
            resolve_frames: resolve_frames.max(1),
            from: from.into(),
            target: target.into(),
            done: false,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Produce the next frame, or `None` once the target has been emitted.
    pub fn step(&mut self) -> Option<String> {
        if self.done {
            return None;
        }
        match self.phase {
            ScramblePhase::Dissolve => {
                let progress = f64::from(self.frame) / f64::from(self.dissolve_frames);
                let text = scramble(
                    &self.from,
                    &self.target,
                    ScramblePhase::Dissolve,
                    progress,
                    self.frame,
                    self.seed,
                );
                self.frame += 1;
                if self.frame >= self.dissolve_frames {
                    self.phase = ScramblePhase::Resolve;
                    self.frame = 0;
                    self.from = text.clone();
                }
                Some(text)
            }
            ScramblePhase::Resolve => {
                self.frame += 1;
                let progress = f64::from(self.frame) / f64::from(self.resolve_frames);
                let text = scramble(
                    &self.from,
                    &self.target,
                    ScramblePhase::Resolve,
                    progress,
                    self.dissolve_frames + self.frame,
                    self.seed,
                );
                if self.frame >= self.resolve_frames {
                    self.done = true;
                }
                Some(text)
            }
        }
    }
}

// ───────────────────────────────────────── title label ───────

/// Self-timed label that scrambles to each new value it is given, one frame
/// per `frame_ms` at most.  Retargeting mid-flight starts from whatever is
/// on screen.
#[derive(Debug, Clone)]
pub struct TitleScrambler {
    slot: TextSlot,
    display: String,
    run: Option<ScrambleState>,
    dissolve_frames: u32,
    resolve_frames: u32,
    frame_ms: f64,
    last_frame_ms: Option<f64>,
    seeds: SeedSequence,
    dirty: bool,
}

impl TitleScrambler {
    /// Shorter than the storyline scramble; headers change often.
    pub const DISSOLVE_FRAMES: u32 = 12;
    pub const RESOLVE_FRAMES: u32 = 18;

    pub fn new(slot: TextSlot, initial: &str, seed: u64) -> Self {
        Self {
            slot,
            display: initial.to_string(),
            run: None,
            dissolve_frames: Self::DISSOLVE_FRAMES,
            resolve_frames: Self::RESOLVE_FRAMES,
            frame_ms: DEFAULT_FRAME_MS,
            last_frame_ms: None,
            seeds: SeedSequence::new(seed),
            dirty: true,
        }
    }

    pub fn with_frames(mut self, dissolve: u32, resolve: u32) -> Self {
        self.dissolve_frames = dissolve.max(1);
        self.resolve_frames = resolve.max(1);
        self
    }

    pub fn is_animating(&self) -> bool {
        self.run.is_some()
    }

    /// Begin morphing toward `target`.  Same target as the one already
    /// shown or in flight is a no-op.
    pub fn set_target(&mut self, target: &str) {
        let current_target = self
            .run
            .as_ref()
            .map(|r| r.target())
            .unwrap_or(self.display.as_str());
        if current_target == target {
            return;
        }
        let seed = self.seeds.next_seed();
        self.run = Some(ScrambleState::new(
            self.display.clone(),
            target,
            seed,
            self.dissolve_frames,
            self.resolve_frames,
        ));
        self.last_frame_ms = None;
    }

    /// Step the transition if at least `frame_ms` passed since the last
    /// step.  Returns `true` when the displayed text changed.
    pub fn advance(&mut self, now_ms: f64) -> bool {
        let Some(run) = self.run.as_mut() else {
            return false;
        };
        if let Some(last) = self.last_frame_ms {
            if now_ms - last < self.frame_ms {
                return false;
            }
        }
        self.last_frame_ms = Some(now_ms);
        match run.step() {
            Some(text) => {
                self.display = text;
                if run.is_done() {
                    self.run = None;
                }
                true
            }
            None => {
                self.run = None;
                false
            }
        }
    }
}

impl FrameDriven for TitleScrambler {
    fn on_frame(&mut self, tick: FrameTick, sink: &mut dyn RenderSink) {
        if self.advance(tick.now_ms) || self.dirty {
            self.dirty = false;
            sink.set_text(self.slot, &self.display);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sink::RecordingSink;

    #[test]
    fn charset_has_48_symbols() {
        assert_eq!(CHARSET.len(), 48);
    }

    #[test]
    fn char_at_matches_formula() {
        let seed = 1234;
        let expected = CHARSET[((1234 + 3 * 7919 + 5 * 997) % 48) as usize] as char;
        assert_eq!(char_at(seed, 3, 5), expected);
    }

    #[test]
    fn scramble_is_deterministic() {
        let a = scramble("PORTFOLIO", "CONTACT US", ScramblePhase::Dissolve, 0.4, 7, 99);
        let b = scramble("PORTFOLIO", "CONTACT US", ScramblePhase::Dissolve, 0.4, 7, 99);
        assert_eq!(a, b);
        let c = scramble("PORTFOLIO", "CONTACT US", ScramblePhase::Resolve, 0.3, 20, 99);
        let d = scramble("PORTFOLIO", "CONTACT US", ScramblePhase::Resolve, 0.3, 20, 99);
        assert_eq!(c, d);
    }

    #[test]
    fn dissolve_at_zero_is_source() {
        for seed in [0, 1, 424_242, 999_999] {
            assert_eq!(
                scramble("HELLO", "HELLO WORLD", ScramblePhase::Dissolve, 0.0, 0, seed),
                "HELLO"
            );
        }
    }

    #[test]
    fn resolve_at_one_is_target() {
        for seed in [0, 7, 31_337] {
            assert_eq!(
                scramble("XYZ", "HELLO WORLD", ScramblePhase::Resolve, 1.0, 40, seed),
                "HELLO WORLD"
            );
        }
    }

    #[test]
    fn dissolve_past_half_is_all_noise_and_target_length() {
        let out = scramble("AB", "ABCDEF", ScramblePhase::Dissolve, 0.75, 3, 5);
        assert_eq!(out.chars().count(), 6);
        for (i, c) in out.chars().enumerate() {
            assert_eq!(c, char_at(5, i, 3));
        }
    }

    #[test]
    fn newlines_survive_scrambling() {
        let out = scramble("AB\nCD", "AB\nCD", ScramblePhase::Dissolve, 0.9, 2, 11);
        assert_eq!(out.chars().nth(2), Some('\n'));
        let out = scramble("", "AB\nCD", ScramblePhase::Resolve, 0.0, 2, 11);
        assert_eq!(out.chars().nth(2), Some('\n'));
    }

    #[test]
    fn runner_emits_all_frames_and_lands_on_target() {
        let mut s = ScrambleState::new("TYPED", "TYPED SO FAR", 77, 15, 25);
        let mut frames = Vec::new();
        while let Some(text) = s.step() {
            frames.push(text);
        }
        assert_eq!(frames.len(), 15 + 25);
        assert_eq!(frames.first().map(String::as_str), Some("TYPED"));
        assert_eq!(frames.last().map(String::as_str), Some("TYPED SO FAR"));
        assert!(s.is_done());
        assert_eq!(s.step(), None);
    }

    #[test]
    fn seed_sequence_is_reproducible() {
        let mut a = SeedSequence::new(42);
        let mut b = SeedSequence::new(42);
        for _ in 0..16 {
            let s = a.next_seed();
            assert!(s < 1_000_000);
            assert_eq!(s, b.next_seed());
        }
    }

    #[test]
    fn title_scrambler_gates_frames_and_settles() {
        let mut t = TitleScrambler::new(TextSlot::HEADER, "ONE", 3).with_frames(2, 3);
        let mut sink = RecordingSink::new();
        t.set_target("TWO");
        assert!(t.is_animating());
        assert!(t.advance(0.0));
        // Too soon for the next frame.
        assert!(!t.advance(5.0));
        let mut now = 0.0;
        while t.is_animating() {
            now += 16.0;
            t.on_frame(
                FrameTick {
                    now_ms: now,
                    delta_ms: 16.0,
                    frame: 0,
                },
                &mut sink,
            );
        }
        assert_eq!(sink.text(TextSlot::HEADER), "TWO");
    }

    #[test]
    fn title_scrambler_ignores_same_target() {
        let mut t = TitleScrambler::new(TextSlot::HEADER, "SAME", 1);
        t.set_target("SAME");
        assert!(!t.is_animating());
    }
}
