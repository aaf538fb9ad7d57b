pub mod record;
pub mod store;
pub mod thumbs;

pub use record::*;
pub use store::*;
pub use thumbs::*;
