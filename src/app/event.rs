//! Terminal event abstraction.
//!
//! Wraps crossterm events into a simpler enum and runs a background task that
//! forwards them over a channel so the main loop stays non-blocking.  Frame
//! timing is not driven from here; the main loop owns a separate interval.

use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, MouseEvent};
use tokio::sync::mpsc;

/// High-level events consumed by the application.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    /// The terminal lost focus; any hover in progress has ended.
    FocusLost,
}

/// Spawns a background task that polls the terminal for events and sends them
/// through the returned channel.  `poll_rate` bounds how long a dropped
/// receiver can go unnoticed.
pub fn spawn_event_reader(poll_rate: Duration) -> mpsc::UnboundedReceiver<AppEvent> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            if !event::poll(poll_rate).unwrap_or(false) {
                if tx.is_closed() {
                    break;
                }
                continue;
            }
            let Ok(ev) = event::read() else {
                continue;
            };
            let app_event = match ev {
                CtEvent::Key(k) => AppEvent::Key(k),
                CtEvent::Mouse(m) => AppEvent::Mouse(m),
                CtEvent::Resize(w, h) => AppEvent::Resize(w, h),
                CtEvent::FocusLost => AppEvent::FocusLost,
                _ => continue,
            };
            if tx.send(app_event).is_err() {
                break; // receiver dropped
            }
        }
    });

    rx
}
