mod exports;
pub use exports::*;

pub mod error;
pub mod io;
pub mod utils;
pub mod image;
pub mod spectrum;
pub mod detector;
pub mod material;
pub mod scene;
pub mod lbuffer;
pub mod attenuation;
pub mod filter;
pub mod engine;
pub mod config;
