pub mod backend;
pub mod cluster;
pub mod layer;

pub use backend::*;
pub use cluster::*;
pub use layer::*;
