//! nekomimi-link library
//! Keeps a BLE link to YOWU Selkirk 3G headphones alive and cycles their colour.

// Module declarations
pub mod config;
pub mod core;
pub mod logging;
pub mod state;
pub mod utils;
