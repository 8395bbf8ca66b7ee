//! The hand-rolled HTTP front end: request parsing (A), header writing
//! (B), per-route responders (C), and the listen/accept/dispatch loop
//! (H, I). A byte-exact wire protocol is easier to guarantee by writing
//! the status line and headers directly than by going through a generic
//! router framework, so this layer talks to `tokio::net::TcpStream`
//! rather than an HTTP server crate.

pub mod request;
pub mod responders;
pub mod response;
pub mod server;

pub use server::serve;
