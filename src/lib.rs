//! Rice leaf disease classification service library

pub mod config;
pub mod engine;
pub mod service;
pub mod storage;
pub mod api;
pub mod utils;

#[cfg(test)]
mod test_utils;

pub use config::Config;
