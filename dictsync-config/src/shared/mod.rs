mod base;
mod connection;
mod pool;
mod sync;
mod syncer;

pub use base::*;
pub use connection::*;
pub use pool::*;
pub use sync::*;
pub use syncer::*;
