mod node;
mod snapshot;

pub use node::*;
pub use snapshot::*;
