//! Ledger module containing movement management, aggregation and the orchestrator

pub mod aggregate;
pub mod balance;
pub mod core;
pub mod movement;

pub use aggregate::*;
pub use balance::*;
pub use self::core::*;
pub use movement::*;
