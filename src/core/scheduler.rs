//! Virtual clock, frame gate and generation-tagged timers.
//!
//! Nothing here reads the wall clock.  The host measures elapsed time and
//! feeds it to [`FrameScheduler::advance`]; tests feed fixed deltas instead,
//! which makes every animation in the crate reproducible frame for frame.

use super::sink::RenderSink;

/// Default frame budget (~60 fps).
pub const DEFAULT_FRAME_MS: f64 = 16.0;

/// One frame handed to [`FrameDriven`] participants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Virtual time at this frame.
    pub now_ms: f64,
    /// Time since the previous frame (at least one budget).
    pub delta_ms: f64,
    /// Monotonic frame counter, starting at 1.
    pub frame: u64,
}

/// Anything the scheduler can drive once per frame.
pub trait FrameDriven {
    fn on_frame(&mut self, tick: FrameTick, sink: &mut dyn RenderSink);
}

// ───────────────────────────────────────── frame gate ────────

/// Single continuous loop, throttled to a manual frame budget.
///
/// Host callbacks arriving sooner than one budget after the last frame only
/// move the clock; a late callback yields exactly one frame (no catch-up
/// bursts).
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    budget_ms: f64,
    now_ms: f64,
    last_frame_ms: f64,
    frames: u64,
}

impl FrameScheduler {
    pub fn new(budget_ms: f64) -> Self {
        let budget_ms = if budget_ms.is_finite() && budget_ms > 0.0 {
            budget_ms
        } else {
            tracing::warn!(budget_ms, "invalid frame budget, using default");
            DEFAULT_FRAME_MS
        };
        Self {
            budget_ms,
            now_ms: 0.0,
            last_frame_ms: 0.0,
            frames: 0,
        }
    }

    pub fn budget_ms(&self) -> f64 {
        self.budget_ms
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Move the virtual clock forward.  Returns a tick when a frame is due.
    pub fn advance(&mut self, delta_ms: f64) -> Option<FrameTick> {
        if !delta_ms.is_finite() || delta_ms <= 0.0 {
            return None;
        }
        self.now_ms += delta_ms;
        let since = self.now_ms - self.last_frame_ms;
        // Tolerate float noise from accumulating e.g. 8.0 + 8.0.
        if since + 1e-9 < self.budget_ms {
            return None;
        }
        self.last_frame_ms = self.now_ms;
        self.frames += 1;
        Some(FrameTick {
            now_ms: self.now_ms,
            delta_ms: since,
            frame: self.frames,
        })
    }

    /// Advance and, if a frame is due, run every participant in order.
    pub fn drive(
        &mut self,
        delta_ms: f64,
        participants: &mut [&mut dyn FrameDriven],
        sink: &mut dyn RenderSink,
    ) -> Option<FrameTick> {
        let tick = self.advance(delta_ms)?;
        for p in participants.iter_mut() {
            p.on_frame(tick, sink);
        }
        Some(tick)
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_MS)
    }
}

// ───────────────────────────────────────── timers ────────────

#[derive(Debug)]
struct Timer<T> {
    due_ms: f64,
    seq: u64,
    generation: u64,
    payload: T,
}

/// Virtual timer queue owned by one controller.
///
/// Every timer is stamped with the generation current at scheduling time.
/// [`TimerQueue::bump_generation`] drops everything pending, and anything
/// that somehow carries an older stamp is discarded on pop, so a cancelled
/// sequence can never fire again.
#[derive(Debug)]
pub struct TimerQueue<T> {
    timers: Vec<Timer<T>>,
    next_seq: u64,
    generation: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            timers: Vec::new(),
            next_seq: 0,
            generation: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Invalidate every pending timer.  Returns the new generation.
    pub fn bump_generation(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.timers.clear();
        self.generation
    }

    pub fn schedule(&mut self, due_ms: f64, payload: T) {
        self.next_seq += 1;
        self.timers.push(Timer {
            due_ms,
            seq: self.next_seq,
            generation: self.generation,
            payload,
        });
    }

    /// Pop the earliest timer due at or before `now_ms` (FIFO among equal
    /// due times).  Returns its due time with the payload.
    pub fn pop_due(&mut self, now_ms: f64) -> Option<(f64, T)> {
        loop {
            let idx = self
                .timers
                .iter()
                .enumerate()
                .filter(|(_, t)| t.due_ms <= now_ms)
                .min_by(|(_, a), (_, b)| {
                    a.due_ms
                        .total_cmp(&b.due_ms)
                        .then_with(|| a.seq.cmp(&b.seq))
                })
                .map(|(i, _)| i)?;
            let timer = self.timers.swap_remove(idx);
            if timer.generation != self.generation {
                continue;
            }
            return Some((timer.due_ms, timer.payload));
        }
    }

    pub fn next_due(&self) -> Option<f64> {
        self.timers
            .iter()
            .map(|t| t.due_ms)
            .min_by(|a, b| a.total_cmp(b))
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sink::RecordingSink;

    #[test]
    fn early_callbacks_only_move_the_clock() {
        let mut s = FrameScheduler::new(16.0);
        assert!(s.advance(5.0).is_none());
        assert!(s.advance(5.0).is_none());
        let tick = s.advance(6.0).expect("frame due after 16ms");
        assert_eq!(tick.frame, 1);
        assert_eq!(tick.now_ms, 16.0);
        assert!(s.advance(15.0).is_none());
    }

    #[test]
    fn late_callback_yields_one_frame() {
        let mut s = FrameScheduler::new(16.0);
        let tick = s.advance(100.0).unwrap();
        assert_eq!(tick.frame, 1);
        assert_eq!(tick.delta_ms, 100.0);
        assert_eq!(s.frames(), 1);
    }

    #[test]
    fn bad_budget_and_deltas_are_ignored() {
        let mut s = FrameScheduler::new(f64::NAN);
        assert_eq!(s.budget_ms(), DEFAULT_FRAME_MS);
        assert!(s.advance(f64::INFINITY).is_none());
        assert!(s.advance(-3.0).is_none());
        assert_eq!(s.now_ms(), 0.0);
    }

    struct Counter(u32);
    impl FrameDriven for Counter {
        fn on_frame(&mut self, _tick: FrameTick, _sink: &mut dyn RenderSink) {
            self.0 += 1;
        }
    }

    #[test]
    fn drive_runs_every_participant_per_frame() {
        let mut s = FrameScheduler::default();
        let mut a = Counter(0);
        let mut b = Counter(0);
        let mut sink = RecordingSink::new();
        for _ in 0..10 {
            s.drive(8.0, &mut [&mut a, &mut b], &mut sink);
        }
        assert_eq!(a.0, 5);
        assert_eq!(b.0, 5);
    }

    #[test]
    fn timers_pop_in_due_then_fifo_order() {
        let mut q = TimerQueue::new();
        q.schedule(30.0, "c");
        q.schedule(10.0, "a");
        q.schedule(10.0, "b");
        assert_eq!(q.pop_due(5.0), None);
        assert_eq!(q.pop_due(50.0), Some((10.0, "a")));
        assert_eq!(q.pop_due(50.0), Some((10.0, "b")));
        assert_eq!(q.pop_due(50.0), Some((30.0, "c")));
        assert!(q.is_empty());
    }

    #[test]
    fn bump_generation_cancels_pending() {
        let mut q = TimerQueue::new();
        q.schedule(1.0, 1);
        q.schedule(2.0, 2);
        let gen = q.bump_generation();
        assert_eq!(gen, 1);
        assert_eq!(q.pop_due(100.0), None);
        q.schedule(3.0, 3);
        assert_eq!(q.next_due(), Some(3.0));
        assert_eq!(q.pop_due(100.0), Some((3.0, 3)));
    }
}
