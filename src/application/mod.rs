// Application layer - use cases on top of the repository.
// Every client (CLI, export, tests) goes through `PaymentService`.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;
