//! Use cases orchestrating domain entities through port interfaces.

pub mod account_registry;

pub use account_registry::AccountRegistry;
