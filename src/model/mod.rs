pub mod task;
pub mod tag;
pub mod recurring;
pub mod state;
pub mod config;

pub use task::*;
pub use tag::*;
pub use recurring::*;
pub use state::*;
pub use config::*;
