use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};

pub enum AppEvent {
    Key(KeyEvent),
    /// Bracketed paste, typically text committed by an input method.
    Paste(String),
    Tick,
    Resize(#[allow(dead_code)] u16, #[allow(dead_code)] u16),
}

/// Reads terminal events on a background thread and forwards them over a
/// channel. Only key presses are forwarded.
pub struct EventHandler {
    rx: mpsc::Receiver<AppEvent>,
    _tx: mpsc::Sender<AppEvent>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let _tx = tx.clone();

        thread::spawn(move || {
            loop {
                let forwarded = if event::poll(tick_rate).unwrap_or(false) {
                    match event::read() {
                        Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                            Some(AppEvent::Key(key))
                        }
                        Ok(Event::Paste(text)) => Some(AppEvent::Paste(text)),
                        Ok(Event::Resize(w, h)) => Some(AppEvent::Resize(w, h)),
                        _ => None,
                    }
                } else {
                    Some(AppEvent::Tick)
                };

                if let Some(ev) = forwarded
                    && tx.send(ev).is_err()
                {
                    return;
                }
            }
        });

        Self { rx, _tx }
    }

    pub fn next(&self) -> anyhow::Result<AppEvent> {
        Ok(self.rx.recv()?)
    }
}
