//! Application layer: services and use cases
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod diagnostics;
pub mod error;
pub mod error_ext;
pub mod grid;
pub mod services;

pub use diagnostics::{Diagnostic, Severity};
pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::{IoResultExt, JsonResultExt};
pub use grid::{ColumnDef, DefaultColumnDef, GridView};
