pub mod base;
pub mod memory;
