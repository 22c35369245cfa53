//! Pairline server library.
//!
//! Presence tracking and one-to-one message routing over WebSocket, plus
//! the HTTP History Service and a minimal authentication collaborator.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
