pub mod config_io;
pub mod migrate;
pub mod store;
