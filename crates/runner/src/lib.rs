//! Rideline Runner - Service Composition Root
//!
//! Wires the whole dispatch service together:
//!
//! - **Bootstrap**: builds the store, registry, router, engine and gateway
//!   against one shared clock
//! - **Sweeper**: the periodic expiry + re-dispatch task
//! - **Sessions**: helpers to open channel-backed client sessions
//!
//! ## Architecture
//!
//! ```text
//!   rider / driver clients
//!            │ frames
//!            ▼
//! ┌───────────────────────┐
//! │    Socket Gateway     │──────────┐
//! └───────────┬───────────┘          │ register / deliver
//!             │ requests             ▼
//! ┌───────────▼───────────┐  ┌───────────────────────┐
//! │    Dispatch Engine    │─▶│  Notification Router  │
//! └───────────┬───────────┘  └───────────────────────┘
//!             │ guarded transitions
//! ┌───────────▼───────────┐  ┌───────────────────────┐
//! │      Ride Store       │  │    Driver Registry    │
//! └───────────────────────┘  └───────────────────────┘
//! ```

pub mod bootstrap;

// Re-export main types
pub use bootstrap::{AppConfig, DispatchApp, Session};
