//! Infrastructure layer: the WebSocket connection adapter and the DTOs
//! exposed over HTTP.

pub mod connection;
pub mod dto;
