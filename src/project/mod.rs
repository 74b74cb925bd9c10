pub mod store;

pub use store::ProjectStore;
