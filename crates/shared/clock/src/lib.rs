//! Rideline Clocks
//!
//! Implementations of the `Clock` port:
//! - `SystemClock` for production
//! - `FixedClock` for deterministic tests

mod fixed;
mod system;

pub use fixed::FixedClock;
pub use system::SystemClock;
