pub mod common;
pub mod descriptor;
pub mod node;
pub mod snapshot;

pub use common::*;
pub use descriptor::*;
pub use node::*;
pub use snapshot::*;
