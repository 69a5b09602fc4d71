//! Event bus for dentsim.
//!
//! Everything the main loop reacts to arrives as an [`AppEvent`] on one tokio
//! unbounded channel: terminal input, the render and logic cadences, and
//! results posted by the API worker.

use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind, MouseEvent};
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use crate::api::types::ApiResponse;

/// Logic tick cadence. The countdown carries sub-second remainders, so this
/// only bounds how late the display can lag the real clock.
pub const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Render cadence, roughly 30 frames per second.
pub const RENDER_INTERVAL: Duration = Duration::from_millis(33);

#[derive(Debug)]
#[non_exhaustive]
pub enum AppEvent {
    /// Key press. Release and repeat events never reach the channel.
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// New terminal size as (columns, rows).
    Resize(u16, u16),
    /// Advances the encounter countdown and expires notifications.
    Tick,
    /// Draw one frame.
    Render,
    /// Outcome of a backend call made by the API worker.
    ApiResult(Box<ApiResponse>),
    Quit,
}

/// Both ends of the event channel. `tx` is cloned into producers; the main
/// loop owns `rx`.
pub struct EventHandler {
    pub tx: mpsc::UnboundedSender<AppEvent>,
    pub rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a crossterm event onto the bus. Focus and paste events are dropped.
fn translate(event: Event) -> Option<AppEvent> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
        Event::Mouse(mouse) => Some(AppEvent::Mouse(mouse)),
        Event::Resize(w, h) => Some(AppEvent::Resize(w, h)),
        _ => None,
    }
}

/// Spawns the producer task for input, ticks and renders.
///
/// The task ends once the receiver is gone, detected on the next tick send.
/// A stalled runtime skips missed ticks instead of replaying them in a burst;
/// the countdown still sees the true elapsed time through `Instant`s.
pub fn spawn_event_task(tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut ticks = interval(TICK_INTERVAL);
        let mut renders = interval(RENDER_INTERVAL);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        renders.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut reader = EventStream::new();

        loop {
            let next_input = reader.next().fuse();
            tokio::select! {
                _ = ticks.tick() => {
                    if tx.send(AppEvent::Tick).is_err() {
                        break;
                    }
                }
                _ = renders.tick() => {
                    let _ = tx.send(AppEvent::Render);
                }
                input = next_input => match input {
                    Some(Ok(event)) => {
                        if let Some(app_event) = translate(event) {
                            let _ = tx.send(app_event);
                        }
                    }
                    Some(Err(e)) => tracing::warn!(error = %e, "terminal input error"),
                    // Input stream closed: nothing more will arrive.
                    None => {
                        let _ = tx.send(AppEvent::Quit);
                        break;
                    }
                },
            }
        }
    });
}
