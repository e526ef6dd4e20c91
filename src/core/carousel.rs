//! Infinite-wrap 3D carousel positioner.
//!
//! Cards sit on a ring of N depth slots.  A continuous scroll position is
//! mapped onto the ring with a modular wrap, so scrolling never runs out of
//! cards.  One card may be *active* (hovered / previewed): it pops upward and
//! every card in front of it is pushed back out of the way.
//!
//! The controller only computes numbers; a [`RenderSink`] applies them.

use super::input::{InputConfig, InputNormalizer};
use super::scheduler::{FrameDriven, FrameTick};
use super::sink::{CardTransform, RenderSink};

// ───────────────────────────────────────── data ──────────────

/// Payload for one card, supplied by the data provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardData {
    pub id: String,
    pub thumbnail: String,
}

impl CardData {
    pub fn new(id: impl Into<String>, thumbnail: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            thumbnail: thumbnail.into(),
        }
    }
}

/// Parse a card list: one card per line, `<id> <thumbnail>`, split on the
/// first whitespace.  Blank lines and `#` comments are skipped; a line with
/// no thumbnail uses its id.
pub fn parse_cards(contents: &str) -> Vec<CardData> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| match line.split_once(char::is_whitespace) {
            Some((id, thumbnail)) => CardData::new(id, thumbnail.trim()),
            None => CardData::new(line, line),
        })
        .collect()
}

/// Desktop pointer (hover + click) or touch (tap-to-preview, tap-to-open).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Desktop,
    Touch,
}

/// Navigation intents returned to the hosting page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardIntent {
    Activate(usize),
    Open(usize),
    Clear,
}

// ───────────────────────────────────────── config ────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarouselConfig {
    pub width: f64,
    pub height: f64,
    /// Depth distance between neighbouring slots, px.
    pub spacing: f64,
    /// Front face of the box.  `None` centres the ring: `(N + 1) × spacing / 2`.
    pub box_half_length: Option<f64>,
    pub repel_distance: f64,
    pub repel_duration_sec: f64,
    /// Active-card lift as a fraction of its height.
    pub pop_ratio: f64,
    pub wheel_sensitivity: f64,
    pub touch_sensitivity: f64,
    pub gesture_threshold_px: f64,
    /// Smoothing factor while a drag is in flight.
    pub drag_smoothing: f64,
    /// Smoothing factor otherwise.
    pub drift_smoothing: f64,
    pub settle_epsilon: f64,
    /// Fractional window after a wrap crossing in which the card that
    /// wrapped stays hidden.  `0` disables masking.
    pub mask_band: f64,
    pub mode: InputMode,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            width: 220.0,
            height: 140.0,
            spacing: 50.0,
            box_half_length: None,
            repel_distance: 40.0,
            repel_duration_sec: 0.3,
            pop_ratio: 0.3,
            wheel_sensitivity: 0.01,
            touch_sensitivity: 0.02,
            gesture_threshold_px: 5.0,
            drag_smoothing: 0.25,
            drift_smoothing: 0.1,
            settle_epsilon: 0.001,
            mask_band: 0.08,
            mode: InputMode::Desktop,
        }
    }
}

fn positive_or(value: f64, fallback: f64, name: &str) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        tracing::warn!(name, value, fallback, "carousel setting out of range, using default");
        fallback
    }
}

fn non_negative_or(value: f64, fallback: f64, name: &str) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        tracing::warn!(name, value, fallback, "carousel setting out of range, using default");
        fallback
    }
}

fn factor_or(value: f64, fallback: f64, name: &str) -> f64 {
    if value.is_finite() && value > 0.0 {
        value.min(1.0)
    } else {
        tracing::warn!(name, value, fallback, "smoothing factor out of range, using default");
        fallback
    }
}

impl CarouselConfig {
    /// Replace non-finite / out-of-range values with defaults.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        Self {
            width: positive_or(self.width, d.width, "width"),
            height: positive_or(self.height, d.height, "height"),
            spacing: positive_or(self.spacing, d.spacing, "spacing"),
            box_half_length: self.box_half_length.filter(|v| {
                let ok = v.is_finite();
                if !ok {
                    tracing::warn!(value = v, "box_half_length not finite, centring ring");
                }
                ok
            }),
            repel_distance: non_negative_or(self.repel_distance, d.repel_distance, "repel_distance"),
            repel_duration_sec: non_negative_or(
                self.repel_duration_sec,
                d.repel_duration_sec,
                "repel_duration_sec",
            ),
            pop_ratio: non_negative_or(self.pop_ratio, d.pop_ratio, "pop_ratio"),
            wheel_sensitivity: positive_or(
                self.wheel_sensitivity,
                d.wheel_sensitivity,
                "wheel_sensitivity",
            ),
            touch_sensitivity: positive_or(
                self.touch_sensitivity,
                d.touch_sensitivity,
                "touch_sensitivity",
            ),
            gesture_threshold_px: non_negative_or(
                self.gesture_threshold_px,
                d.gesture_threshold_px,
                "gesture_threshold_px",
            ),
            drag_smoothing: factor_or(self.drag_smoothing, d.drag_smoothing, "drag_smoothing"),
            drift_smoothing: factor_or(self.drift_smoothing, d.drift_smoothing, "drift_smoothing"),
            settle_epsilon: positive_or(self.settle_epsilon, d.settle_epsilon, "settle_epsilon"),
            mask_band: non_negative_or(self.mask_band, d.mask_band, "mask_band").min(0.5),
            mode: self.mode,
        }
    }

    fn input(&self) -> InputConfig {
        InputConfig {
            wheel_sensitivity: self.wheel_sensitivity,
            touch_sensitivity: self.touch_sensitivity,
            gesture_threshold_px: self.gesture_threshold_px,
        }
    }
}

// ───────────────────────────────────────── wrap math ─────────

/// Slot of card `index` on the ring for `scroll`, always in `[0, count)`.
/// `count` of zero yields `0`.
pub fn wrapped_position(index: usize, scroll: f64, count: usize) -> f64 {
    if count == 0 || !scroll.is_finite() {
        return 0.0;
    }
    let n = count as f64;
    let virtual_pos = (index as f64 - scroll) % n;
    let wrapped = if virtual_pos < 0.0 {
        virtual_pos + n
    } else {
        virtual_pos
    };
    // A tiny negative remainder plus N rounds to exactly N.
    if wrapped >= n {
        0.0
    } else {
        wrapped
    }
}

/// Depth offset for a ring slot.
pub fn slot_offset(wrapped: f64, spacing: f64, box_half_length: f64) -> f64 {
    box_half_length - (wrapped + 1.0) * spacing
}

// ───────────────────────────────────────── scroll state ──────

/// Continuous scroll position easing toward a target.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollState {
    pub position: f64,
    /// Position before the last smoothing step.
    pub previous: f64,
    pub target: f64,
    pub count: usize,
    pub spacing: f64,
    pub box_half_length: f64,
    /// Sign of the last smoothing step (-1, 0, 1).
    pub direction: f64,
    pub settling: bool,
}

impl ScrollState {
    fn new(count: usize, spacing: f64, box_half_length: Option<f64>) -> Self {
        Self {
            position: 0.0,
            previous: 0.0,
            target: 0.0,
            count,
            spacing,
            box_half_length: box_half_length
                .unwrap_or_else(|| default_box_half_length(count, spacing)),
            direction: 0.0,
            settling: false,
        }
    }

    /// One smoothing step with factor `k`.  Snaps once within `epsilon`.
    pub fn step(&mut self, k: f64, epsilon: f64) {
        let diff = self.target - self.position;
        self.previous = self.position;
        if diff.abs() < epsilon {
            self.position = self.target;
            self.direction = 0.0;
            self.settling = false;
            return;
        }
        self.position += diff * k;
        self.direction = diff.signum();
        self.settling = true;
    }

    pub fn distance(&self) -> f64 {
        (self.target - self.position).abs()
    }
}

fn default_box_half_length(count: usize, spacing: f64) -> f64 {
    (count as f64 + 1.0) * spacing / 2.0
}

// ───────────────────────────────────────── controller ────────

/// One mounted carousel.  Created by [`CarouselController::mount`],
/// torn down by [`CarouselController::destroy`].
pub struct CarouselController {
    config: CarouselConfig,
    cards: Vec<CardData>,
    scroll: ScrollState,
    input: InputNormalizer,
    active: Option<usize>,
    /// Card under the pointer when the current press started.
    pressed: Option<usize>,
    transforms: Vec<CardTransform>,
    generation: u64,
    /// Host-supplied "another overlay owns the pointer" check.
    interaction_guard: Option<Box<dyn Fn() -> bool>>,
}

impl std::fmt::Debug for CarouselController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarouselController")
            .field("cards", &self.cards.len())
            .field("scroll", &self.scroll)
            .field("active", &self.active)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl CarouselController {
    /// Build a carousel for `cards` and render its initial layout.
    pub fn mount(sink: &mut dyn RenderSink, cards: Vec<CardData>, config: CarouselConfig) -> Self {
        let config = config.sanitized();
        let scroll = ScrollState::new(cards.len(), config.spacing, config.box_half_length);
        tracing::debug!(cards = cards.len(), mode = ?config.mode, "carousel mounted");
        let mut this = Self {
            config,
            cards,
            scroll,
            input: InputNormalizer::new(config.input()),
            active: None,
            pressed: None,
            transforms: Vec::new(),
            generation: 0,
            interaction_guard: None,
        };
        this.render(sink);
        this
    }

    /// Replace the card payloads.  Scroll position is kept; an active card
    /// that no longer exists is cleared.
    pub fn update_data(&mut self, sink: &mut dyn RenderSink, cards: Vec<CardData>) {
        self.generation = self.generation.wrapping_add(1);
        self.cards = cards;
        self.scroll.count = self.cards.len();
        self.scroll.box_half_length = self
            .config
            .box_half_length
            .unwrap_or_else(|| default_box_half_length(self.cards.len(), self.config.spacing));
        if self.active.is_some_and(|i| i >= self.cards.len()) {
            self.active = None;
        }
        self.pressed = None;
        tracing::debug!(cards = self.cards.len(), generation = self.generation, "carousel data updated");
        sink.clear_cards();
        self.render(sink);
    }

    /// Tear down: clear everything this carousel put in the sink.  Consuming
    /// `self` guarantees no further frame can touch the state.
    pub fn destroy(self, sink: &mut dyn RenderSink) {
        tracing::debug!(generation = self.generation, "carousel destroyed");
        sink.clear_cards();
    }

    /// Install the predicate that blocks activation while it returns `true`.
    pub fn set_interaction_guard(&mut self, guard: impl Fn() -> bool + 'static) {
        self.interaction_guard = Some(Box::new(guard));
    }

    pub fn set_mode(&mut self, mode: InputMode) {
        self.config.mode = mode;
    }

    // ── accessors ──────────────────────────────────────────────

    pub fn config(&self) -> &CarouselConfig {
        &self.config
    }

    pub fn cards(&self) -> &[CardData] {
        &self.cards
    }

    pub fn scroll(&self) -> &ScrollState {
        &self.scroll
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn transforms(&self) -> &[CardTransform] {
        &self.transforms
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// `true` while the position is still easing toward the target.
    pub fn is_settling(&self) -> bool {
        self.scroll.distance() >= self.config.settle_epsilon || self.scroll.settling
    }

    /// The card slot currently closest to the front face.
    pub fn front_card(&self) -> Option<usize> {
        let n = self.cards.len();
        if n == 0 {
            return None;
        }
        (0..n).min_by(|&a, &b| {
            wrapped_position(a, self.scroll.position, n)
                .total_cmp(&wrapped_position(b, self.scroll.position, n))
        })
    }

    // ── positioning ────────────────────────────────────────────

    /// Nudge the target position by `delta` cards.
    pub fn set_target(&mut self, delta: f64) {
        if delta.is_finite() {
            self.scroll.target += delta;
        }
    }

    /// Step the target by whole cards and snap it to the card grid.
    pub fn step(&mut self, cards: i32) {
        self.scroll.target = self.scroll.target.round() + f64::from(cards);
    }

    /// Base offset of card `index` at the current position (no repel).
    pub fn base_offset(&self, index: usize) -> f64 {
        let wrapped = wrapped_position(index, self.scroll.position, self.cards.len());
        slot_offset(wrapped, self.scroll.spacing, self.scroll.box_half_length)
    }

    /// One animation frame: ease toward the target and re-render.
    pub fn tick(&mut self, sink: &mut dyn RenderSink) {
        let k = if self.input.is_dragging() {
            self.config.drag_smoothing
        } else {
            self.config.drift_smoothing
        };
        self.scroll.step(k, self.config.settle_epsilon);
        self.render(sink);
    }

    /// The card to hide this frame, if any: one whose slot crossed the ring
    /// edge since the previous frame, or one still inside the band next to
    /// the edge it landed on.  When several qualify, the one nearest its
    /// landing edge wins.
    fn masked_card(&self) -> Option<usize> {
        let band = self.config.mask_band;
        let count = self.cards.len();
        let direction = self.scroll.direction;
        if band <= 0.0 || count < 2 || direction == 0.0 {
            return None;
        }
        let n = count as f64;
        let (previous, position) = (self.scroll.previous, self.scroll.position);
        (0..count)
            .filter_map(|i| {
                let x = i as f64;
                // Tested on the unwrapped coordinate; one step may span the ring.
                let crossed = ((x - previous) / n).floor() != ((x - position) / n).floor();
                let wrapped = wrapped_position(i, position, count);
                // Moving forward, slots shrink and a wrapped card re-enters at N.
                let gap = if direction > 0.0 { n - wrapped } else { wrapped };
                (crossed || gap < band).then_some((i, gap))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Recompute every card's transform from scratch and push it to the sink.
    fn render(&mut self, sink: &mut dyn RenderSink) {
        let base: Vec<f64> = (0..self.cards.len()).map(|i| self.base_offset(i)).collect();
        let active_offset = self.active.and_then(|a| base.get(a)).copied();

        let masked_card = self.masked_card();

        self.transforms.clear();
        for (i, &offset) in base.iter().enumerate() {
            let masked = masked_card == Some(i);
            let is_active = self.active == Some(i);
            let mut t = CardTransform {
                offset,
                lift: 0.0,
                visible: !masked,
                interactive: !masked,
                active: is_active,
                transition_sec: self.config.repel_duration_sec,
            };
            if let Some(active_offset) = active_offset {
                if is_active {
                    t.lift = self.config.height * self.config.pop_ratio;
                } else if offset > active_offset {
                    t.offset = offset - self.config.repel_distance;
                }
            }
            self.transforms.push(t);
        }
        for (i, t) in self.transforms.iter().enumerate() {
            sink.set_card_transform(i, t);
        }
    }

    // ── activation ─────────────────────────────────────────────

    fn guarded(&self) -> bool {
        self.interaction_guard.as_ref().is_some_and(|g| g())
    }

    fn is_interactive(&self, index: usize) -> bool {
        self.transforms.get(index).is_some_and(|t| t.interactive)
    }

    /// Set (or clear) the single active card and re-render.
    pub fn activate(&mut self, sink: &mut dyn RenderSink, index: Option<usize>) -> Option<CardIntent> {
        let index = index.filter(|&i| i < self.cards.len());
        if index == self.active {
            return None;
        }
        if index.is_some() && self.guarded() {
            return None;
        }
        self.active = index;
        self.render(sink);
        Some(match index {
            Some(i) => CardIntent::Activate(i),
            None => CardIntent::Clear,
        })
    }

    /// Pointer is over `hit` (desktop hover).  Ignored in touch mode.
    pub fn hover(&mut self, sink: &mut dyn RenderSink, hit: Option<usize>) -> Option<CardIntent> {
        if self.config.mode != InputMode::Desktop || self.input.is_gesture() {
            return None;
        }
        match hit {
            Some(i) if self.is_interactive(i) => self.activate(sink, Some(i)),
            Some(_) => None,
            None => self.activate(sink, None),
        }
    }

    /// Pointer left the carousel entirely.
    pub fn leave(&mut self, sink: &mut dyn RenderSink) -> Option<CardIntent> {
        if self.config.mode != InputMode::Desktop {
            return None;
        }
        self.activate(sink, None)
    }

    // ── wheel / drag ───────────────────────────────────────────

    pub fn wheel(&mut self, delta_y: f64) {
        let delta = self.input.wheel(delta_y);
        self.set_target(delta);
    }

    /// Press at `(x, y)` px; `hit` is the card under the pointer, if any.
    pub fn pointer_down(&mut self, x: f64, y: f64, hit: Option<usize>) {
        self.input.begin(x, y);
        self.pressed = hit.filter(|&i| self.is_interactive(i));
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        let delta = self.input.move_to(x, y);
        self.set_target(delta);
    }

    /// Release.  Resolves the click/tap against the press target; any drag
    /// past the gesture threshold swallows the tap.
    pub fn pointer_up(&mut self, sink: &mut dyn RenderSink, hit: Option<usize>) -> Option<CardIntent> {
        let release = self.input.end();
        let pressed = self.pressed.take();
        if release.was_gesture {
            return None;
        }
        let hit = hit.filter(|&i| self.is_interactive(i));
        match self.config.mode {
            InputMode::Desktop => match (pressed, hit) {
                (Some(p), Some(h)) if p == h && !self.guarded() => Some(CardIntent::Open(h)),
                _ => None,
            },
            InputMode::Touch => match hit {
                Some(h) if pressed == Some(h) => {
                    if self.active == Some(h) {
                        if self.guarded() {
                            None
                        } else {
                            Some(CardIntent::Open(h))
                        }
                    } else {
                        self.activate(sink, Some(h))
                    }
                }
                Some(_) => None,
                None => self.tap_outside(sink),
            },
        }
    }

    /// A tap that landed on no card: clear without navigating.
    pub fn tap_outside(&mut self, sink: &mut dyn RenderSink) -> Option<CardIntent> {
        self.activate(sink, None)
    }
}

impl FrameDriven for CarouselController {
    fn on_frame(&mut self, _tick: FrameTick, sink: &mut dyn RenderSink) {
        if self.is_settling() {
            self.tick(sink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sink::RecordingSink;
    use proptest::prelude::*;

    fn cards(n: usize) -> Vec<CardData> {
        (0..n)
            .map(|i| CardData::new(format!("card-{i}"), format!("thumb-{i}.jpg")))
            .collect()
    }

    fn five_card_config() -> CarouselConfig {
        CarouselConfig {
            spacing: 50.0,
            box_half_length: Some(150.0),
            ..CarouselConfig::default()
        }
    }

    #[test]
    fn card_list_splits_on_first_whitespace() {
        let cards = parse_cards(
            "# reel\n\
             intro   thumbs/intro.jpg\n\
             \n\
             finale thumbs/final cut.jpg\n\
             bare\n",
        );
        assert_eq!(
            cards,
            vec![
                CardData::new("intro", "thumbs/intro.jpg"),
                CardData::new("finale", "thumbs/final cut.jpg"),
                CardData::new("bare", "bare"),
            ]
        );
    }

    #[test]
    fn scenario_offsets_at_zero_and_one() {
        let mut sink = RecordingSink::new();
        let mut c = CarouselController::mount(&mut sink, cards(5), five_card_config());
        assert_eq!(c.base_offset(0), 100.0);
        assert_eq!(sink.card(0).unwrap().offset, 100.0);
        c.scroll.position = 1.0;
        assert_eq!(c.base_offset(0), -100.0);
    }

    #[test]
    fn default_box_half_length_centres_ring() {
        let mut sink = RecordingSink::new();
        let c = CarouselController::mount(
            &mut sink,
            cards(5),
            CarouselConfig {
                spacing: 50.0,
                ..CarouselConfig::default()
            },
        );
        assert_eq!(c.scroll().box_half_length, 150.0);
    }

    #[test]
    fn wrapping_card_is_masked_on_the_crossing_frame() {
        let mut sink = RecordingSink::new();
        let mut c = CarouselController::mount(&mut sink, cards(5), five_card_config());
        assert_eq!(c.transforms()[0].offset, 100.0);
        c.set_target(1.0);
        c.tick(&mut sink);
        // Card 0 left the front slot and reappears at the back: hidden.
        let t = c.transforms()[0];
        assert!(!t.visible && !t.interactive);
        assert!(!sink.card(0).unwrap().visible);
        for t in &c.transforms()[1..] {
            assert!(t.visible);
        }
        c.tick(&mut sink);
        assert!(c.transforms()[0].visible);

        while c.is_settling() {
            c.tick(&mut sink);
        }
        assert!(c.transforms().iter().all(|t| t.visible));
        assert_eq!(c.transforms()[0].offset, -100.0);
    }

    #[test]
    fn wrapped_card_stays_hidden_inside_band() {
        let mut sink = RecordingSink::new();
        let mut c = CarouselController::mount(&mut sink, cards(5), five_card_config());
        c.scroll.position = 0.97;
        c.scroll.previous = 0.97;
        c.scroll.target = 1.5;
        c.tick(&mut sink);
        assert!(c.scroll().position > 1.0);
        assert!(!c.transforms()[1].visible);
        // Next frame: no jump, but still within the band at the back edge.
        c.tick(&mut sink);
        assert!(wrapped_position(1, c.scroll().position, 5) > 5.0 - c.config().mask_band);
        assert!(!c.transforms()[1].visible);
        c.tick(&mut sink);
        assert!(c.transforms()[1].visible);
        // The card arriving at the front is never hidden.
        assert!(c.transforms()[2].visible);
    }

    #[test]
    fn backward_motion_masks_card_landing_at_front() {
        let mut sink = RecordingSink::new();
        let mut c = CarouselController::mount(&mut sink, cards(5), five_card_config());
        c.scroll.position = 0.03;
        c.scroll.previous = 0.03;
        c.scroll.target = -1.0;
        c.tick(&mut sink);
        let wrapped = wrapped_position(0, c.scroll().position, 5);
        assert!(wrapped < c.config().mask_band);
        assert!(!c.transforms()[0].visible);
        assert_eq!(
            c.transforms().iter().filter(|t| !t.visible).count(),
            1
        );
    }

    #[test]
    fn step_longer_than_half_the_ring_hides_one_wrapped_card() {
        let mut sink = RecordingSink::new();
        let mut c = CarouselController::mount(&mut sink, cards(5), five_card_config());
        for _ in 0..30 {
            c.wheel(-100.0);
        }
        c.tick(&mut sink);
        assert!((c.scroll().position - 3.0).abs() < 1e-9);
        // Cards 0, 1 and 2 crossed the edge; card 2 landed nearest to it.
        let hidden: Vec<usize> = (0..5).filter(|&i| !c.transforms()[i].visible).collect();
        assert_eq!(hidden, vec![2]);
        assert!(c.transforms()[3].visible && c.transforms()[4].visible);
    }

    #[test]
    fn mask_band_zero_disables_masking() {
        let mut sink = RecordingSink::new();
        let mut c = CarouselController::mount(
            &mut sink,
            cards(5),
            CarouselConfig {
                mask_band: 0.0,
                ..five_card_config()
            },
        );
        c.set_target(3.0);
        for _ in 0..200 {
            c.tick(&mut sink);
            assert!(c.transforms().iter().all(|t| t.visible));
        }
    }

    #[test]
    fn hover_then_leave_restores_offsets_exactly() {
        let mut sink = RecordingSink::new();
        let mut c = CarouselController::mount(&mut sink, cards(6), CarouselConfig::default());
        c.scroll.position = 0.37;
        c.tick(&mut sink);
        let before: Vec<f64> = c.transforms().iter().map(|t| t.offset).collect();

        assert_eq!(c.hover(&mut sink, Some(2)), Some(CardIntent::Activate(2)));
        let during = c.transforms().to_vec();
        let active_offset = before[2];
        for (i, t) in during.iter().enumerate() {
            if i == 2 {
                assert_eq!(t.offset, before[i]);
                assert_eq!(t.lift, c.config().height * 0.3);
            } else if before[i] > active_offset {
                assert_eq!(t.offset, before[i] - 40.0);
            } else {
                assert_eq!(t.offset, before[i]);
            }
            assert_eq!(t.transition_sec, 0.3);
        }

        assert_eq!(c.leave(&mut sink), Some(CardIntent::Clear));
        let after: Vec<f64> = c.transforms().iter().map(|t| t.offset).collect();
        assert_eq!(before, after);
        assert!(c.transforms().iter().all(|t| t.lift == 0.0 && !t.active));
    }

    #[test]
    fn at_most_one_card_is_active() {
        let mut sink = RecordingSink::new();
        let mut c = CarouselController::mount(&mut sink, cards(4), CarouselConfig::default());
        c.hover(&mut sink, Some(1));
        c.hover(&mut sink, Some(3));
        let active: Vec<_> = c.transforms().iter().filter(|t| t.active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(c.active(), Some(3));
    }

    #[test]
    fn desktop_click_opens_and_drag_suppresses() {
        let mut sink = RecordingSink::new();
        let mut c = CarouselController::mount(&mut sink, cards(4), CarouselConfig::default());
        c.pointer_down(10.0, 10.0, Some(1));
        assert_eq!(c.pointer_up(&mut sink, Some(1)), Some(CardIntent::Open(1)));

        c.pointer_down(10.0, 10.0, Some(1));
        c.pointer_move(10.0, 40.0);
        assert_eq!(c.pointer_up(&mut sink, Some(1)), None);
        assert!(c.scroll().target > 0.0);
    }

    #[test]
    fn touch_tap_previews_then_opens() {
        let mut sink = RecordingSink::new();
        let mut c = CarouselController::mount(
            &mut sink,
            cards(4),
            CarouselConfig {
                mode: InputMode::Touch,
                ..CarouselConfig::default()
            },
        );
        // Hover has no meaning on touch.
        assert_eq!(c.hover(&mut sink, Some(0)), None);

        c.pointer_down(0.0, 0.0, Some(2));
        assert_eq!(c.pointer_up(&mut sink, Some(2)), Some(CardIntent::Activate(2)));
        c.pointer_down(0.0, 0.0, Some(2));
        assert_eq!(c.pointer_up(&mut sink, Some(2)), Some(CardIntent::Open(2)));

        // Tap on another card moves the preview.
        c.pointer_down(0.0, 0.0, Some(1));
        assert_eq!(c.pointer_up(&mut sink, Some(1)), Some(CardIntent::Activate(1)));

        // Tap elsewhere clears without opening.
        c.pointer_down(0.0, 0.0, None);
        assert_eq!(c.pointer_up(&mut sink, None), Some(CardIntent::Clear));
        assert_eq!(c.active(), None);
    }

    #[test]
    fn touch_drag_swallows_second_tap() {
        let mut sink = RecordingSink::new();
        let mut c = CarouselController::mount(
            &mut sink,
            cards(4),
            CarouselConfig {
                mode: InputMode::Touch,
                ..CarouselConfig::default()
            },
        );
        c.pointer_down(0.0, 0.0, Some(2));
        c.pointer_up(&mut sink, Some(2));
        c.pointer_down(0.0, 0.0, Some(2));
        c.pointer_move(20.0, 0.0);
        assert_eq!(c.pointer_up(&mut sink, Some(2)), None);
        assert_eq!(c.active(), Some(2));
    }

    #[test]
    fn guard_blocks_activation_and_open() {
        use std::cell::Cell;
        use std::rc::Rc;

        let overlay = Rc::new(Cell::new(true));
        let mut sink = RecordingSink::new();
        let mut c = CarouselController::mount(&mut sink, cards(3), CarouselConfig::default());
        let flag = Rc::clone(&overlay);
        c.set_interaction_guard(move || flag.get());

        assert_eq!(c.hover(&mut sink, Some(1)), None);
        c.pointer_down(0.0, 0.0, Some(1));
        assert_eq!(c.pointer_up(&mut sink, Some(1)), None);

        overlay.set(false);
        assert_eq!(c.hover(&mut sink, Some(1)), Some(CardIntent::Activate(1)));
    }

    #[test]
    fn wheel_and_step_move_target() {
        let mut sink = RecordingSink::new();
        let mut c = CarouselController::mount(&mut sink, cards(3), CarouselConfig::default());
        c.wheel(-100.0);
        assert_eq!(c.scroll().target, 1.0);
        c.set_target(0.4);
        c.step(1);
        assert_eq!(c.scroll().target, 2.0);
        c.step(-3);
        assert_eq!(c.scroll().target, -1.0);
    }

    #[test]
    fn update_data_clears_stale_active() {
        let mut sink = RecordingSink::new();
        let mut c = CarouselController::mount(&mut sink, cards(5), CarouselConfig::default());
        c.hover(&mut sink, Some(4));
        c.update_data(&mut sink, cards(3));
        assert_eq!(c.active(), None);
        assert_eq!(c.transforms().len(), 3);
        assert_eq!(sink.cards.len(), 3);
        assert_eq!(c.generation(), 1);
    }

    #[test]
    fn empty_carousel_renders_nothing() {
        let mut sink = RecordingSink::new();
        let mut c = CarouselController::mount(&mut sink, Vec::new(), CarouselConfig::default());
        c.set_target(2.0);
        c.tick(&mut sink);
        assert!(c.transforms().is_empty());
        assert_eq!(c.front_card(), None);
        assert_eq!(c.hover(&mut sink, Some(0)), None);
    }

    #[test]
    fn destroy_clears_sink() {
        let mut sink = RecordingSink::new();
        let c = CarouselController::mount(&mut sink, cards(3), CarouselConfig::default());
        assert_eq!(sink.cards.len(), 3);
        c.destroy(&mut sink);
        assert!(sink.cards.is_empty());
    }

    #[test]
    fn non_finite_config_falls_back() {
        let cfg = CarouselConfig {
            width: f64::NAN,
            height: -1.0,
            spacing: f64::INFINITY,
            wheel_sensitivity: f64::NAN,
            drag_smoothing: 3.0,
            ..CarouselConfig::default()
        }
        .sanitized();
        let d = CarouselConfig::default();
        assert_eq!(cfg.width, d.width);
        assert_eq!(cfg.height, d.height);
        assert_eq!(cfg.spacing, d.spacing);
        assert_eq!(cfg.wheel_sensitivity, d.wheel_sensitivity);
        assert_eq!(cfg.drag_smoothing, 1.0);
    }

    #[test]
    fn front_card_follows_position() {
        let mut sink = RecordingSink::new();
        let mut c = CarouselController::mount(&mut sink, cards(4), CarouselConfig::default());
        assert_eq!(c.front_card(), Some(0));
        c.scroll.position = 2.0;
        assert_eq!(c.front_card(), Some(2));
    }

    proptest! {
        #[test]
        fn wrapped_position_stays_in_range(
            n in 1usize..64,
            index in 0usize..64,
            scroll in -1.0e6f64..1.0e6,
        ) {
            let w = wrapped_position(index % n, scroll, n);
            prop_assert!((0.0..n as f64).contains(&w));
        }

        #[test]
        fn one_card_jumps_per_unit_crossing(n in 2usize..32, k in -50i32..50) {
            let before = f64::from(k) + 0.5 - 1e-3;
            let after = f64::from(k) + 0.5 + 1e-3;
            // Crossing the integer k + 1 from just below.
            let below = f64::from(k + 1) - 1e-6;
            let above = f64::from(k + 1) + 1e-6;
            let jumps = (0..n)
                .filter(|&i| {
                    (wrapped_position(i, below, n) - wrapped_position(i, above, n)).abs() > 1.0
                })
                .count();
            prop_assert_eq!(jumps, 1);
            // Away from integers nothing jumps.
            let jumps = (0..n)
                .filter(|&i| {
                    (wrapped_position(i, before, n) - wrapped_position(i, after, n)).abs() > 1.0
                })
                .count();
            prop_assert_eq!(jumps, 0);
        }

        #[test]
        fn at_most_one_card_is_hidden_per_frame(
            n in 2usize..16,
            notches in -80i32..80,
            ticks in 1usize..40,
        ) {
            let mut sink = RecordingSink::new();
            let mut c = CarouselController::mount(&mut sink, cards(n), five_card_config());
            c.wheel(f64::from(notches) * 100.0);
            for _ in 0..ticks {
                let previous = c.scroll().position;
                c.tick(&mut sink);
                let position = c.scroll().position;
                let hidden: Vec<usize> =
                    (0..n).filter(|&i| !c.transforms()[i].visible).collect();
                prop_assert!(hidden.len() <= 1);
                if let Some(&i) = hidden.first() {
                    let x = i as f64;
                    let len = n as f64;
                    let crossed = ((x - previous) / len).floor() != ((x - position) / len).floor();
                    let wrapped = wrapped_position(i, position, n);
                    let near_edge = wrapped < c.config().mask_band
                        || wrapped > len - c.config().mask_band;
                    prop_assert!(crossed || near_edge);
                }
            }
        }

        #[test]
        fn smoothing_converges_without_overshoot(
            start in -100.0f64..100.0,
            target in -100.0f64..100.0,
            k in 0.01f64..1.0,
        ) {
            let mut s = ScrollState::new(5, 50.0, None);
            s.position = start;
            s.target = target;
            let mut last = s.distance();
            let mut ticks = 0;
            loop {
                s.step(k, 1e-3);
                let d = s.distance();
                prop_assert!(d <= last + 1e-12);
                if target >= start {
                    prop_assert!(s.position <= target + 1e-9);
                } else {
                    prop_assert!(s.position >= target - 1e-9);
                }
                last = d;
                ticks += 1;
                prop_assert!(ticks < 10_000);
                if !s.settling {
                    break;
                }
            }
            prop_assert_eq!(s.position, target);
        }
    }
}
