//! Converts Jupyter nbformat v4 notebooks into `cellorder-core` event
//! sequences.
//!
//! The importer builds up a [`cellorder_core::Tables`] incrementally,
//! applying each event it produces before deciding the next one, so the
//! event sequence it returns is exactly the one a live client would have
//! generated cell by cell.

pub mod error;
pub mod importer;
pub mod nbformat;

pub use error::{ImportError, Result};
pub use importer::import;
pub use nbformat::Notebook;
