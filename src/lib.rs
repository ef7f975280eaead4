pub mod config;
pub mod context;
pub mod convert;
pub mod database;
pub mod global;
pub mod logging;
pub mod media;
pub mod notify;
pub mod recorder;
pub mod registry;
pub mod session;
pub mod signal;
pub mod store;

#[cfg(test)]
mod tests;
