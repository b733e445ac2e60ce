//! Five-phase extraction protocol.
//!
//! Inventory, per-abac extraction, test and validate, compile, finalize.
//! Any phase may be aborted; abort is final.

pub mod compile;
pub mod machine;
pub mod message;
pub mod state;

pub use compile::{compile_model, identify_data_gaps};
pub use machine::{start_inventory, transition, ProtocolHandler, Transition};
pub use message::{Envelope, InboundMessage, OutboundMessage};
pub use state::{Phase, ProtocolState};
