//! Time subsystem.
//!
//! - `FrameClock`: one per window, ticked once per presented frame
//! - `FpsCounter`: unclamped frame deltas and a once-per-second fps log line

mod fps;
mod frame_clock;

pub use fps::FpsCounter;
pub use frame_clock::{FrameClock, FrameTime};
