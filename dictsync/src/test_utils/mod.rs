//! Test doubles for the sync source and the dictionary sink, and a throwaway Postgres database.

pub mod database;
pub mod sink;
pub mod source;
