pub mod base;
pub mod fetcher;
pub mod postgres;
