//! Persistent local state.

pub mod db;

pub use db::{DbError, LibraryDb, LibraryRecord, NewLibrary};
