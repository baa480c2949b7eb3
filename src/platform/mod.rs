//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Keyboard input (shared, testable natively)
//! - Session resource lifetime (listeners, timers, frame loop; WASM only)

pub mod input;
#[cfg(target_arch = "wasm32")]
pub mod session;

pub use input::{Key, KeyState};
#[cfg(target_arch = "wasm32")]
pub use session::{EventListener, FrameLoop, IntervalTimer, LoopControl, SessionScope};
