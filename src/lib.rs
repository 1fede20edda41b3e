//! CropCare: upload a cocoa crop photo, get a (placeholder) disease diagnosis page.

pub mod config;
pub mod error;
pub mod flash;
pub mod model;
pub mod pages;
pub mod result;
pub mod routes;
pub mod upload;

pub use config::Config;
pub use routes::{router, AppState};
