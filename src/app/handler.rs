//! Input handling: maps key/mouse events to engine calls.

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::config::{Action, KeyBind};
use crate::core::carousel::InputMode;
use crate::core::sink::TextSlot;
use crate::ui::layout::{point_in_rect, AppLayout};
use crate::ui::popup::help_item_count;
use crate::ui::stage::{self, StageGeometry};

use super::state::{ActiveView, AppState};

/// Wheel delta reported per scroll notch, in px.
const WHEEL_NOTCH_PX: f64 = 100.0;

/// Process a key event, dispatching based on the active view.
pub fn handle_key(state: &mut AppState, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    // Ctrl+c always quits, regardless of view.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return;
    }

    match state.active_view {
        ActiveView::Stage => handle_stage_key(state, key),
        ActiveView::Help if state.awaiting_rebind => handle_rebind_key(state, key),
        ActiveView::Help => handle_help_key(state, key),
    }
}

// ── Stage (configurable bindings) ───────────────────────────────

fn handle_stage_key(state: &mut AppState, key: KeyEvent) {
    let Some(action) = state.config.match_key(key) else {
        if key.code == KeyCode::Esc {
            let intent = state.carousel.activate(&mut state.sink, None);
            state.apply_intent(intent);
            state.status_message = None;
        }
        return;
    };

    match action {
        Action::NextCard => state.carousel.step(1),
        Action::PrevCard => state.carousel.step(-1),
        Action::OpenCard => {
            if let Some(index) = state.carousel.active().or_else(|| state.carousel.front_card()) {
                state.open_card(index);
            }
        }
        Action::ToggleTouch => state.toggle_mode(),
        Action::RestartText => state.restart_text(),
        Action::ReloadCards => {
            let message = match state.reload_cards() {
                Ok(count) => format!("Reloaded {count} cards"),
                Err(err) => {
                    tracing::warn!(%err, "card reload failed");
                    format!("Reload failed: {err:#}")
                }
            };
            state.status_message = Some(message);
        }
        Action::Help => {
            state.help_selected = 0;
            state.set_view(ActiveView::Help);
        }
        Action::Quit => state.should_quit = true,
    }
}

// ── Help overlay (hardcoded navigation, interactive rebinding) ──

fn handle_help_key(state: &mut AppState, key: KeyEvent) {
    let item_count = help_item_count();

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            state.set_view(ActiveView::Stage);
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.help_selected = state.help_selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if state.help_selected + 1 < item_count {
                state.help_selected += 1;
            }
        }
        KeyCode::Enter => {
            if state.help_selected < Action::ALL.len() {
                state.awaiting_rebind = true;
            } else {
                state.config.reset_defaults();
                save_config(state);
                state.status_message = Some("Bindings reset to defaults".into());
            }
        }
        KeyCode::Delete | KeyCode::Backspace => {
            if let Some(&action) = Action::ALL.get(state.help_selected) {
                state.config.bindings.insert(action, Vec::new());
                save_config(state);
            }
        }
        _ => {}
    }
}

/// Capture the next key press as a new binding.
fn handle_rebind_key(state: &mut AppState, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        state.awaiting_rebind = false;
        return;
    }
    let Some(&action) = Action::ALL.get(state.help_selected) else {
        state.awaiting_rebind = false;
        return;
    };
    state.config.add_binding(action, KeyBind::from_key_event(key));
    save_config(state);
    state.awaiting_rebind = false;
}

fn save_config(state: &mut AppState) {
    if let Err(err) = state.config.save() {
        tracing::warn!(%err, "could not save config");
        state.status_message = Some(format!("Config not saved: {err}"));
    }
}

// ── Mouse ───────────────────────────────────────────────────────

/// Process a mouse event.
pub fn handle_mouse(state: &mut AppState, mouse: MouseEvent) {
    if state.active_view != ActiveView::Stage {
        return;
    }

    let layout = AppLayout::from_area(state.terminal_area);
    let (col, row) = (mouse.column, mouse.row);
    let in_stage = point_in_rect(layout.cards_area, col, row);
    let in_text = point_in_rect(layout.storyline_area, col, row);
    let geom = StageGeometry::from_carousel(&state.carousel);
    let hit = if in_stage {
        stage::hit_test(layout.cards_area, &geom, &state.sink, col, row)
    } else {
        None
    };
    let touch = state.carousel.config().mode == InputMode::Touch;

    match mouse.kind {
        MouseEventKind::Moved => {
            if !touch {
                update_text_hover(state, in_text);
            }
            if in_stage {
                let intent = state.carousel.hover(&mut state.sink, hit);
                state.apply_intent(intent);
            } else if state.pointer_over_stage {
                let intent = state.carousel.leave(&mut state.sink);
                state.apply_intent(intent);
            }
            state.pointer_over_stage = in_stage;
        }
        MouseEventKind::Down(MouseButton::Left) => {
            if in_stage {
                let (x, y) = stage::cell_to_px(layout.cards_area, col, row);
                state.carousel.pointer_down(x, y, hit);
                state.dragging = true;
            } else if touch && in_text && state.hover.is_attached(TextSlot::STORYLINE) {
                state.reveal.tap();
            } else if touch {
                let intent = state.carousel.tap_outside(&mut state.sink);
                state.apply_intent(intent);
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            if state.dragging {
                let (x, y) = stage::cell_to_px(layout.cards_area, col, row);
                state.carousel.pointer_move(x, y);
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            if state.dragging {
                state.dragging = false;
                let intent = state.carousel.pointer_up(&mut state.sink, hit);
                state.apply_intent(intent);
            }
        }
        MouseEventKind::ScrollUp if in_stage => state.carousel.wheel(-WHEEL_NOTCH_PX),
        MouseEventKind::ScrollDown if in_stage => state.carousel.wheel(WHEEL_NOTCH_PX),
        _ => {}
    }
}

/// Route enter/leave of the storyline panel to the reveal controller.
fn update_text_hover(state: &mut AppState, over: bool) {
    if !state.hover.is_attached(TextSlot::STORYLINE) || over == state.pointer_over_text {
        return;
    }
    state.pointer_over_text = over;
    if over {
        state.reveal.pointer_enter();
    } else {
        state.reveal.pointer_leave();
    }
}

/// The terminal lost focus: treat it as the pointer leaving everything.
pub fn handle_focus_lost(state: &mut AppState) {
    update_text_hover(state, false);
    if state.pointer_over_stage {
        state.pointer_over_stage = false;
        let intent = state.carousel.leave(&mut state.sink);
        state.apply_intent(intent);
    }
}
