//! Application Layer - Port definitions.
//!
//! The streaming coordinator and the REST adapters talk to the engine and to
//! each other exclusively through the traits defined here; nothing is looked
//! up from ambient state.

/// Port interfaces consumed and implemented across the adapter.
pub mod ports;
