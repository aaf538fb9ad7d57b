pub mod detail;
pub mod error;
pub mod filter;
pub mod geotag;
pub mod protocol;

pub use detail::*;
pub use error::*;
pub use filter::*;
pub use geotag::*;
pub use protocol::*;
