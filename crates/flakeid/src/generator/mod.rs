mod config;
mod counter;
mod interface;
mod lock;
mod mutex;
mod status;
mod ticked;
mod ticker;
#[cfg(test)]
mod tests;

pub use config::*;
pub use counter::*;
pub use interface::*;
pub use lock::*;
pub(crate) use mutex::*;
pub use status::*;
pub use ticked::*;
pub use ticker::*;
