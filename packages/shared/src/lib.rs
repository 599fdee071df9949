//! Utilities shared by the Agora binaries and libraries.

pub mod logger;
pub mod time;
