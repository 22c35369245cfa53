//! Utilities shared by the Pairline server and client.

pub mod logger;
pub mod time;
