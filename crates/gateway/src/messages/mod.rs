//! Wire messages
//!
//! Client and server frames are kept separate from the domain types: the
//! domain never learns what the transport encodes.

mod client;
mod server;

pub use client::{ClientMessage, ClientRole};
pub use server::OutboundMessage;
