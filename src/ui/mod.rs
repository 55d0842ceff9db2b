//! Terminal status overlay: live win/loss and reward counters fed from the
//! environment through a bounded queue.

mod overlay;
pub mod overlay_state;
pub mod overlay_view;

pub use overlay::{OverlayConfig, OverlayHandle};
