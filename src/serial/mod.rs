//! FunBox button box input.
//!
//! The device speaks newline-delimited ASCII. Inbound lines carry a button
//! letter (`A`..`F` or `INPUT: <letter>`), outbound lines carry feedback
//! commands such as `WIN` or `RETRY`.

pub mod adapter;
pub mod debounce;
pub mod framer;
pub mod keyboard;
pub mod protocol;

use thiserror::Error;

pub use adapter::{FunBox, FunBoxHandle};
pub use debounce::ButtonDebouncer;
pub use framer::LineFramer;
pub use keyboard::{FocusTarget, KeyEvent};
pub use protocol::{Button, Command};

#[derive(Debug, Error)]
pub enum SerialError {
    #[error("device i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("device is disconnected")]
    Disconnected,
}
