// Application layer: user and card use cases over the repository.
// Clients (the CLI, importers) go through CardService only.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
