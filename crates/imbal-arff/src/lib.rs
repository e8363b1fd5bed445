//! Attribute-relation file parsing and the labeled dataset model for imbal.

mod domain;
mod error;
mod reader;

pub use domain::{Attribute, AttributeKind, Dataset, MISSING, is_missing};
pub use error::IoError;
pub use reader::ArffReader;
