pub mod raw;
pub mod tagged;
