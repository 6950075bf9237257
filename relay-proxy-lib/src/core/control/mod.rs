pub mod protocol;
pub mod server;

pub use protocol::{Command, Response, Snapshot};
pub use server::run_control_server;
