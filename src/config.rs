pub mod simulation;

pub use simulation::{Config, read_config_file};
