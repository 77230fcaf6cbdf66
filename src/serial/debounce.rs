use std::time::{Duration, Instant};

use super::protocol::Button;

pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Holds a press as the active button for a fixed window. Presses arriving
/// while a button is active are dropped, not queued.
#[derive(Debug)]
pub struct ButtonDebouncer {
    window: Duration,
    active: Option<(Button, Instant)>,
}

impl Default for ButtonDebouncer {
    fn default() -> Self {
        Self::new(DEBOUNCE_WINDOW)
    }
}

impl ButtonDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            active: None,
        }
    }

    pub fn accept(&mut self, button: Button, now: Instant) -> Option<Button> {
        if self.active(now).is_some() {
            return None;
        }
        self.active = Some((button, now));
        Some(button)
    }

    pub fn active(&mut self, now: Instant) -> Option<Button> {
        match self.active {
            Some((button, since)) if now.duration_since(since) < self.window => Some(button),
            Some(_) => {
                self.active = None;
                None
            }
            None => None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}
