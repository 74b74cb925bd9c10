pub mod controller;

pub use controller::DocumentController;
