//! Port traits: the seams where collaborators plug into the engine.

pub mod config_port;
pub mod data_port;
