#![forbid(unsafe_code)]

mod connection;
pub mod handler;
pub mod server;

pub use connection::Connection;
pub use handler::handle_connection;
pub use server::{ServerConfig, run};
