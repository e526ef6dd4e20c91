//! An infinite-wrap card carousel with a typewriter storyline, in the terminal.
//!
//! Run the binary to browse the cards: wheel or drag to scroll, hover to
//! preview, click to open.  Hovering the storyline pauses it and scrambles
//! the full text into view.

mod app;
mod config;
mod core;
mod ui;

use std::io::{self, stderr, Stderr};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    text::Span,
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use tokio::time::MissedTickBehavior;

use crate::app::{
    event::{spawn_event_reader, AppEvent},
    handler,
    state::{ActiveView, AppState, LaunchOptions},
};
use crate::core::carousel::{parse_cards, CardData, InputMode};
use crate::core::sink::TextSlot;
use crate::ui::{
    layout::AppLayout,
    popup::HelpPopup,
    stage::{CarouselWidget, StageGeometry},
    storyline::StorylineWidget,
    theme::Theme,
};

const DEFAULT_STORYLINE: &str = "\
Every frame tells a story.

Scroll through the reel, hover a card to lift it out of the stack,
and click to open it. The ring never ends: the last card wraps
quietly back behind the first.";

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), about = "Infinite-wrap card carousel with a typewriter storyline")]
struct Cli {
    /// Storyline text.  A blank line separates the title from the body.
    #[arg(long, conflicts_with = "text_file")]
    text: Option<String>,

    /// Read the storyline from a file.
    #[arg(long, value_name = "PATH")]
    text_file: Option<PathBuf>,

    /// Number of demo cards when no card file is given.
    #[arg(long, default_value_t = 7)]
    cards: usize,

    /// Card list, one per line: `<id> <thumbnail>`.  `#` starts a comment.
    #[arg(long, value_name = "PATH")]
    cards_file: Option<PathBuf>,

    /// Start in touch mode (tap to preview, tap again to open).
    #[arg(long)]
    touch: bool,

    /// Frame budget in milliseconds (overrides the config file).
    #[arg(long, value_name = "MS")]
    frame_ms: Option<f64>,

    /// Do not hide the card that wraps around the ring.
    #[arg(long)]
    no_mask: bool,
}

// ───────────────────────────────────────── inputs ────────────

fn demo_cards(count: usize) -> Vec<CardData> {
    (1..=count)
        .map(|i| CardData::new(format!("card-{i:02}"), format!("thumbnails/card-{i:02}.jpg")))
        .collect()
}

fn load_cards(cli: &Cli) -> Result<Vec<CardData>> {
    match &cli.cards_file {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading cards from {}", path.display()))?;
            let cards = parse_cards(&contents);
            tracing::debug!(path = %path.display(), cards = cards.len(), "cards loaded");
            Ok(cards)
        }
        None => Ok(demo_cards(cli.cards)),
    }
}

fn load_storyline(cli: &Cli) -> Result<String> {
    if let Some(text) = &cli.text {
        return Ok(text.clone());
    }
    match &cli.text_file {
        Some(path) => read_text(path),
        None => Ok(DEFAULT_STORYLINE.to_string()),
    }
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading storyline from {}", path.display()))
}

// ───────────────────────────────────────── drawing ───────────

fn draw(frame: &mut Frame, state: &AppState) {
    let layout = AppLayout::from_area(frame.area());

    let header = Paragraph::new(Span::styled(
        format!(" {}", state.sink.text(TextSlot::HEADER)),
        Theme::header_style(),
    ));
    frame.render_widget(header, layout.header_area);

    let stage_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Theme::border_style());
    let stage = CarouselWidget::new(
        state.carousel.cards(),
        &state.sink,
        StageGeometry::from_carousel(&state.carousel),
    )
    .block(stage_block);
    frame.render_widget(stage, layout.stage_area);

    let storyline_block = Block::default()
        .title(" storyline ")
        .title_style(Theme::title_style())
        .borders(Borders::ALL)
        .border_style(Theme::border_style());
    let storyline = StorylineWidget::new(state.sink.text(TextSlot::STORYLINE))
        .separator(state.sink.separator(TextSlot::STORYLINE))
        .caret(state.is_typing())
        .block(storyline_block);
    frame.render_widget(storyline, layout.storyline_area);

    let hint = state.config.status_bar_hint();
    let status_text = match state.active_view {
        ActiveView::Stage => state.status_message.as_deref().unwrap_or(&hint),
        ActiveView::Help => "",
    };
    let status = Paragraph::new(status_text).style(Theme::status_bar_style());
    frame.render_widget(status, layout.status_area);

    if state.active_view == ActiveView::Help {
        frame.render_widget(
            HelpPopup {
                config: &state.config,
                selected: state.help_selected,
                awaiting_rebind: state.awaiting_rebind,
                mode: state.carousel.config().mode,
            },
            frame.area(),
        );
    }
}

// ───────────────────────────────────────── event loop ────────

async fn run(terminal: &mut Terminal<CrosstermBackend<Stderr>>, state: &mut AppState) -> Result<()> {
    let mut events = spawn_event_reader(Duration::from_millis(50));
    let mut frames = tokio::time::interval(Duration::from_secs_f64(state.scheduler.budget_ms() / 1000.0));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_frame = Instant::now();

    loop {
        terminal.draw(|frame| {
            state.terminal_area = frame.area();
            draw(frame, state);
        })?;

        tokio::select! {
            biased;

            Some(event) = events.recv() => {
                match event {
                    AppEvent::Key(k) => handler::handle_key(state, k),
                    AppEvent::Mouse(m) => handler::handle_mouse(state, m),
                    AppEvent::FocusLost => handler::handle_focus_lost(state),
                    AppEvent::Resize(_, _) => {}
                }
            }

            _ = frames.tick() => {
                let now = Instant::now();
                let elapsed = now.duration_since(last_frame);
                last_frame = now;
                state.advance_clock(elapsed.as_secs_f64() * 1000.0);
            }
        }

        if state.should_quit {
            return Ok(());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Silent unless RUST_LOG is set.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr) // never pollute stdout
        .init();

    let cli = Cli::parse();

    let cards = load_cards(&cli)?;
    let storyline = load_storyline(&cli)?;
    let user_config = config::AppConfig::load();
    let mut state = AppState::new(
        user_config,
        cards,
        LaunchOptions {
            storyline: Some(storyline),
            mode: if cli.touch { InputMode::Touch } else { InputMode::Desktop },
            frame_ms: cli.frame_ms,
            mask: !cli.no_mask,
            cards_file: cli.cards_file.clone(),
        },
    );

    // ── terminal setup ────────────────────────────────────────
    enable_raw_mode()?;
    execute!(stderr(), EnterAlternateScreen, EnableMouseCapture, EnableFocusChange)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stderr()))?;

    let result = run(&mut terminal, &mut state).await;

    // ── teardown ──────────────────────────────────────────────
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableFocusChange
    )?;
    terminal.show_cursor()?;
    state.teardown();

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_cards_are_numbered() {
        let cards = demo_cards(3);
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[2].id, "card-03");
        assert!(demo_cards(0).is_empty());
    }

    #[test]
    fn cli_flags_parse() {
        let cli = Cli::parse_from(["card-reel", "--touch", "--cards", "3", "--frame-ms", "20", "--no-mask"]);
        assert!(cli.touch && cli.no_mask);
        assert_eq!(cli.cards, 3);
        assert_eq!(cli.frame_ms, Some(20.0));
        assert_eq!(load_storyline(&cli).unwrap(), DEFAULT_STORYLINE);
        assert!(Cli::try_parse_from(["card-reel", "--text", "a", "--text-file", "b"]).is_err());
    }
}
