//! Infrastructure layer: persistence, image hosting, configuration.

pub mod config;
pub mod db;
pub mod images;
pub mod store;
