pub mod collaborators;
#[allow(clippy::module_inception)]
pub mod engine;
pub mod lease;
pub mod state;
