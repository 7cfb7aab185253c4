pub mod api;
pub mod carousel;
pub mod config;
pub mod error;
pub mod forms;
pub mod images;
pub mod keywords;
pub mod outcome;
pub mod session;
pub mod text_sanitize;
pub mod ui;
pub mod validation;
pub mod views;

pub use error::{Error, Result};
