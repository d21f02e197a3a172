mod builder;
mod lock;
mod mutex;
mod policy;

pub use builder::*;
pub use lock::*;
pub(crate) use mutex::*;
pub use policy::*;
