use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use super::overlay_state::OverlayState;
use super::overlay_view;
use crate::training::status_feed::StatusUpdate;

/// Status overlay settings.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub enabled: bool,
    /// Unread updates held before new ones are dropped.
    pub queue_capacity: usize,
    pub refresh_ms: u64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        OverlayConfig {
            enabled: true,
            queue_capacity: 64,
            refresh_ms: 100,
        }
    }
}

/// Running overlay thread.
pub struct OverlayHandle {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl OverlayHandle {
    /// Start the overlay on its own thread, taking over the terminal.
    pub fn spawn(rx: Receiver<StatusUpdate>, refresh: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = stop.clone();
        let thread = std::thread::spawn(move || {
            if let Err(e) = run_overlay(rx, &stop_clone, refresh) {
                tracing::warn!(error = %e, "status overlay stopped");
            }
        });
        OverlayHandle { stop, thread }
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Signal the thread to stop and wait for it.
    pub fn shutdown(self) {
        self.stop.store(true, Ordering::Relaxed);
        let _ = self.thread.join();
    }
}

/// Drain everything currently queued. Returns false once the producer is gone.
fn drain(rx: &Receiver<StatusUpdate>, state: &mut OverlayState) -> bool {
    loop {
        match rx.try_recv() {
            Ok(update) => state.apply(update),
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Disconnected) => return false,
        }
    }
}

fn run_overlay(rx: Receiver<StatusUpdate>, stop: &AtomicBool, refresh: Duration) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = OverlayState::new();
    let res = (|| -> io::Result<()> {
        while !stop.load(Ordering::Relaxed) {
            let connected = drain(&rx, &mut state);
            terminal.draw(|f| overlay_view::render(f, &state))?;
            if !connected {
                break;
            }
            if event::poll(refresh)? {
                if let Event::Key(key) = event::read()? {
                    if matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q')) {
                        break;
                    }
                }
            }
        }
        Ok(())
    })();

    // Terminal cleanup always runs, even on error
    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();

    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::status_feed::status_channel;

    #[test]
    fn test_drain_applies_all_pending() {
        let (tx, rx) = status_channel(4);
        for r in [10.0, 20.0, 30.0] {
            tx.send(StatusUpdate {
                wins: 0,
                losses: 0,
                last_reward: r,
                max_reward: 0.0,
            });
        }
        let mut state = OverlayState::new();
        assert!(drain(&rx, &mut state));
        assert_eq!(state.updates_seen, 3);
        assert_eq!(state.latest.unwrap().last_reward, 30.0);
    }

    #[test]
    fn test_drain_reports_disconnect() {
        let (tx, rx) = status_channel(4);
        drop(tx);
        let mut state = OverlayState::new();
        assert!(!drain(&rx, &mut state));
    }
}
