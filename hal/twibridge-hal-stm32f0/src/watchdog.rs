//! Frame deadline shared between tasks
//!
//! The bridge task arms and feeds the deadline while a frame is open; the
//! watchdog task polls it and stops petting the hardware watchdog once it
//! has passed.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Duration, Instant};
use twibridge_hal::FrameWatchdog;

#[derive(Clone, Copy)]
struct State {
    window: Duration,
    expires: Option<Instant>,
}

/// Deadline on the gap between bytes of an open frame
pub struct FrameDeadline {
    state: Mutex<CriticalSectionRawMutex, Cell<State>>,
}

impl FrameDeadline {
    /// Create a disarmed deadline with the given window
    pub const fn new(window: Duration) -> Self {
        Self {
            state: Mutex::new(Cell::new(State {
                window,
                expires: None,
            })),
        }
    }

    /// Change the window; takes effect on the next arm or feed
    pub fn set_window(&self, window: Duration) {
        self.update(|state| state.window = window);
    }

    /// Start the deadline
    pub fn arm(&self) {
        self.update(|state| state.expires = Some(Instant::now() + state.window));
    }

    /// Push an armed deadline out by one window
    pub fn feed(&self) {
        self.update(|state| {
            if state.expires.is_some() {
                state.expires = Some(Instant::now() + state.window);
            }
        });
    }

    /// Cancel the deadline
    pub fn disarm(&self) {
        self.update(|state| state.expires = None);
    }

    /// Check whether an armed deadline has passed
    pub fn is_expired(&self) -> bool {
        self.state
            .lock(|cell| matches!(cell.get().expires, Some(at) if Instant::now() > at))
    }

    fn update(&self, f: impl FnOnce(&mut State)) {
        self.state.lock(|cell| {
            let mut state = cell.get();
            f(&mut state);
            cell.set(state);
        });
    }
}

impl FrameWatchdog for &FrameDeadline {
    fn arm(&mut self) {
        FrameDeadline::arm(*self);
    }

    fn feed(&mut self) {
        FrameDeadline::feed(*self);
    }

    fn disarm(&mut self) {
        FrameDeadline::disarm(*self);
    }
}
