//! API module - REST handlers and HTML pages

pub mod dto;
pub mod pages;
pub mod rest;

pub use rest::{create_rest_router, AppState};
