pub mod handle;
pub mod store;
