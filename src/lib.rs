pub mod config;
pub mod draft;
pub mod error;
pub mod events;
pub mod session;
pub mod shutdown;
pub mod startup;
pub mod store;
