pub mod config;
pub mod notify;
pub mod session;

pub use config::*;
pub use notify::*;
pub use session::*;
