//! Render-sink abstraction shared by the carousel and the text reveal.
//!
//! The engine never touches a terminal directly.  Everything it
//! wants to show goes through [`RenderSink`], which keeps the positioning and
//! reveal math testable with a plain in-memory recorder.

use std::collections::HashMap;

// ───────────────────────────────────────── transforms ────────

/// Resolved placement of one card for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardTransform {
    /// Depth offset in px.  Larger = further forward in stacking order.
    pub offset: f64,
    /// Upward pop displacement in px (non-zero only for the active card).
    pub lift: f64,
    /// `false` while the card is masked around a wrap crossing.
    pub visible: bool,
    /// `false` while masked; hit-testing must skip the card.
    pub interactive: bool,
    /// Whether this card is the (single) active card.
    pub active: bool,
    /// Transition the sink should use when applying repel/pop changes.
    pub transition_sec: f64,
}

/// Identifies a text node in the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextSlot(pub u16);

impl TextSlot {
    /// The storyline panel under the carousel.
    pub const STORYLINE: TextSlot = TextSlot(0);
    /// The header label above the carousel.
    pub const HEADER: TextSlot = TextSlot(1);
}

// ───────────────────────────────────────── sink trait ────────

/// Consumer of per-card transforms and per-frame text.
pub trait RenderSink {
    fn set_card_transform(&mut self, index: usize, transform: &CardTransform);

    /// Remove every card the sink is currently showing.
    fn clear_cards(&mut self);

    fn set_text(&mut self, slot: TextSlot, text: &str);

    /// Show or hide the title/body separator of a text node.  Sinks without
    /// a separator concept may ignore this.
    fn set_separator_visible(&mut self, _slot: TextSlot, _visible: bool) {}
}

// ───────────────────────────────────────── interaction ───────

/// Opaque handle returned when a listener is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Something that can route pointer/touch enter-leave-tap events for a text
/// node back to its owner.
pub trait InteractionSource {
    fn attach_hover(&mut self, slot: TextSlot) -> ListenerId;
    fn detach(&mut self, id: ListenerId);
}

// ───────────────────────────────────────── recorder ──────────

/// In-memory sink.  Keeps the latest state per card/slot plus a running
/// count of text writes.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub cards: HashMap<usize, CardTransform>,
    pub texts: HashMap<TextSlot, String>,
    pub separators: HashMap<TextSlot, bool>,
    pub text_writes: usize,
    pub clears: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self, slot: TextSlot) -> &str {
        self.texts.get(&slot).map(String::as_str).unwrap_or("")
    }

    pub fn separator(&self, slot: TextSlot) -> bool {
        self.separators.get(&slot).copied().unwrap_or(false)
    }

    pub fn card(&self, index: usize) -> Option<&CardTransform> {
        self.cards.get(&index)
    }
}

impl RenderSink for RecordingSink {
    fn set_card_transform(&mut self, index: usize, transform: &CardTransform) {
        self.cards.insert(index, *transform);
    }

    fn clear_cards(&mut self) {
        self.cards.clear();
        self.clears += 1;
    }

    fn set_text(&mut self, slot: TextSlot, text: &str) {
        self.texts.insert(slot, text.to_string());
        self.text_writes += 1;
    }

    fn set_separator_visible(&mut self, slot: TextSlot, visible: bool) {
        self.separators.insert(slot, visible);
    }
}

/// Interaction source that simply hands out ids and tracks what is attached.
#[derive(Debug, Default)]
pub struct HoverRegistry {
    next_id: u64,
    attached: HashMap<ListenerId, TextSlot>,
}

impl HoverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Is any listener attached for `slot`?
    pub fn is_attached(&self, slot: TextSlot) -> bool {
        self.attached.values().any(|s| *s == slot)
    }

    pub fn listener_count(&self) -> usize {
        self.attached.len()
    }
}

impl InteractionSource for HoverRegistry {
    fn attach_hover(&mut self, slot: TextSlot) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.attached.insert(id, slot);
        id
    }

    fn detach(&mut self, id: ListenerId) {
        self.attached.remove(&id);
    }
}
