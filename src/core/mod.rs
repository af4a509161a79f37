//! Core functionality of the headphone link
//! The bluetooth module keeps the link alive; the rainbow module drives it.

pub mod bluetooth;
pub mod indicator;
pub mod rainbow;

// Re-export commonly used types
pub use bluetooth::LinkManager;
pub use indicator::{Indicator, LogIndicator};
pub use rainbow::{ControlLoop, RainbowCycle};
