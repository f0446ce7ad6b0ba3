//! Session gateway between client connections and rooms.
//!
//! The wire protocol is JSON over a text-framed transport. Inbound frames
//! carry an `action` tag and outbound frames a `type` tag. The transport
//! itself lives in the server binary; everything here is transport-agnostic.

pub mod errors;
pub mod messages;
pub mod session;

pub use errors::{GatewayError, GatewayResult};
pub use messages::{ClientMessage, ServerMessage};
pub use session::Session;
