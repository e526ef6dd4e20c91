//! Central application state.
//!
//! All mutable state lives here so that the rest of the app can be pure
//! functions over `&AppState` (rendering) or `&mut AppState` (event handling).

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use ratatui::layout::Rect;

use crate::config::AppConfig;
use crate::core::{
    carousel::{parse_cards, CardData, CardIntent, CarouselController, InputMode},
    reveal::{RevealController, RevealPhase},
    scheduler::{FrameDriven, FrameScheduler, FrameTick},
    scramble::TitleScrambler,
    sink::{HoverRegistry, RecordingSink, TextSlot},
};

/// Shown in the header while no card is in front.
pub const HEADER_FALLBACK: &str = "card-reel";

const HEADER_SEED: u64 = 0xC0FFEE;

/// Which view / overlay is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    #[default]
    Stage,
    Help,
}

/// Startup options that are not part of the persisted config.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub storyline: Option<String>,
    pub mode: InputMode,
    pub frame_ms: Option<f64>,
    pub mask: bool,
    /// Card list the reel was loaded from, re-read on reload.
    pub cards_file: Option<PathBuf>,
}

/// Top-level application state.
pub struct AppState {
    pub config: AppConfig,
    /// Everything the engine emitted; the UI draws from here.
    pub sink: RecordingSink,
    /// Hover routes the host is allowed to deliver.
    pub hover: HoverRegistry,
    pub scheduler: FrameScheduler,
    pub carousel: CarouselController,
    pub reveal: RevealController,
    pub header: TitleScrambler,
    /// Text the storyline types (restarted with the same text).
    pub storyline: Option<String>,
    pub cards_file: Option<PathBuf>,
    /// Last known terminal size, for hit-testing between draws.
    pub terminal_area: Rect,
    pub active_view: ActiveView,
    /// Read by the carousel's interaction guard.
    overlay_open: Rc<Cell<bool>>,
    pub help_selected: usize,
    /// Waiting for a key to bind to the selected help row.
    pub awaiting_rebind: bool,
    pub pointer_over_stage: bool,
    pub pointer_over_text: bool,
    /// A left-button press started on the stage.
    pub dragging: bool,
    pub status_message: Option<String>,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(config: AppConfig, cards: Vec<CardData>, options: LaunchOptions) -> Self {
        let mut sink = RecordingSink::new();
        let mut carousel_config = config.tunables.carousel_config(options.mode);
        if !options.mask {
            carousel_config.mask_band = 0.0;
        }
        let mut carousel = CarouselController::mount(&mut sink, cards, carousel_config);

        let overlay_open = Rc::new(Cell::new(false));
        let guard = Rc::clone(&overlay_open);
        carousel.set_interaction_guard(move || guard.get());

        let mut hover = HoverRegistry::new();
        let mut reveal = RevealController::new(config.tunables.reveal_config());
        reveal.setup_hover_reveal(&mut hover);
        reveal.run(Some(&mut sink), options.storyline.as_deref());

        let scheduler = FrameScheduler::new(options.frame_ms.unwrap_or(config.tunables.frame_ms));
        let header = TitleScrambler::new(TextSlot::HEADER, HEADER_FALLBACK, HEADER_SEED);

        let mut state = Self {
            config,
            sink,
            hover,
            scheduler,
            carousel,
            reveal,
            header,
            storyline: options.storyline,
            cards_file: options.cards_file,
            terminal_area: Rect::default(),
            active_view: ActiveView::Stage,
            overlay_open,
            help_selected: 0,
            awaiting_rebind: false,
            pointer_over_stage: false,
            pointer_over_text: false,
            dragging: false,
            status_message: None,
            should_quit: false,
        };
        let label = state.header_label();
        state.header.set_target(&label);
        state
    }

    /// Header shows the active card, else the card in front.
    pub fn header_label(&self) -> String {
        self.carousel
            .active()
            .or_else(|| self.carousel.front_card())
            .and_then(|i| self.carousel.cards().get(i))
            .map(|c| c.id.clone())
            .unwrap_or_else(|| HEADER_FALLBACK.to_string())
    }

    /// Feed elapsed wall time to the frame scheduler.
    pub fn advance_clock(&mut self, delta_ms: f64) -> Option<FrameTick> {
        let label = self.header_label();
        self.header.set_target(&label);
        let mut participants: [&mut dyn FrameDriven; 3] =
            [&mut self.carousel, &mut self.reveal, &mut self.header];
        self.scheduler
            .drive(delta_ms, &mut participants, &mut self.sink)
    }

    /// Caret is shown while characters are still being typed.
    pub fn is_typing(&self) -> bool {
        self.reveal.phase() == RevealPhase::Typing
    }

    pub fn set_view(&mut self, view: ActiveView) {
        self.active_view = view;
        self.overlay_open.set(view != ActiveView::Stage);
        self.awaiting_rebind = false;
        if view != ActiveView::Stage {
            let intent = self.carousel.activate(&mut self.sink, None);
            self.apply_intent(intent);
        }
    }

    pub fn toggle_mode(&mut self) {
        let mode = match self.carousel.config().mode {
            InputMode::Desktop => InputMode::Touch,
            InputMode::Touch => InputMode::Desktop,
        };
        self.carousel.set_mode(mode);
        let intent = self.carousel.activate(&mut self.sink, None);
        self.apply_intent(intent);
        if self.pointer_over_text {
            self.reveal.pointer_leave();
            self.pointer_over_text = false;
        }
        tracing::debug!(?mode, "input mode changed");
        self.status_message = Some(format!("Input mode: {mode:?}"));
    }

    pub fn restart_text(&mut self) {
        self.reveal.run(Some(&mut self.sink), self.storyline.as_deref());
        self.pointer_over_text = false;
    }

    /// Re-read the card file and swap the payloads in place.  Returns the
    /// new card count.
    pub fn reload_cards(&mut self) -> Result<usize> {
        let Some(path) = &self.cards_file else {
            bail!("no card file to reload");
        };
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading cards from {}", path.display()))?;
        let cards = parse_cards(&contents);
        let count = cards.len();
        self.carousel.update_data(&mut self.sink, cards);
        tracing::debug!(
            path = %path.display(),
            cards = count,
            generation = self.carousel.generation(),
            "cards reloaded"
        );
        Ok(count)
    }

    /// React to what the carousel asked the host to do.
    pub fn apply_intent(&mut self, intent: Option<CardIntent>) {
        match intent {
            Some(CardIntent::Open(index)) => self.open_card(index),
            Some(CardIntent::Activate(index)) => tracing::debug!(index, "card activated"),
            Some(CardIntent::Clear) => tracing::debug!("active card cleared"),
            None => {}
        }
    }

    pub fn open_card(&mut self, index: usize) {
        if self.overlay_open.get() {
            return;
        }
        if let Some(card) = self.carousel.cards().get(index) {
            tracing::info!(id = %card.id, thumbnail = %card.thumbnail, "card opened");
            self.status_message = Some(format!("Opened {} ({})", card.id, card.thumbnail));
        }
    }

    /// Detach listeners and clear everything the engine drew.
    pub fn teardown(mut self) {
        self.reveal.teardown(&mut self.hover);
        self.reveal.stop();
        self.carousel.destroy(&mut self.sink);
        tracing::debug!(
            frames = self.scheduler.frames(),
            listeners = self.hover.listener_count(),
            "torn down"
        );
    }
}
