//! The persistent catalog of files observed to contain the magic word.
//!
//! [`ports::CatalogRepository`] is the only seam the discovery workers talk
//! to. Adapters live next to it: [`memory::InMemoryCatalog`] for tests and
//! database-less runs, [`postgres::PostgresCatalog`] for production.

pub mod memory;
pub mod model;
pub mod ports;

#[cfg(feature = "database")]
#[cfg_attr(docsrs, doc(cfg(feature = "database")))]
pub mod postgres;

pub use memory::InMemoryCatalog;
pub use model::{FileRecord, FileStatus};
pub use ports::CatalogRepository;

#[cfg(feature = "database")]
pub use postgres::PostgresCatalog;
