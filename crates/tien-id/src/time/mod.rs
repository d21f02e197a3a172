mod cached;
mod clock;
mod interface;
mod system;

pub use cached::*;
pub use clock::*;
pub use interface::*;
pub use system::*;
