//! HTTP surface of the broadcaster: routes, the access gate and the server
//! runner.

mod error;
mod handler;
mod middleware;
mod server;
mod signal;
pub mod state;

pub use error::{GateError, ServerError};
pub use middleware::auth::{AUTH_COOKIE, LOGIN_PATH, read_auth_cookie};
pub use server::{Server, ServerConfig, router};
