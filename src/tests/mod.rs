mod config;
mod global;
mod listener;
mod media;
mod registry;
