//! Product-classification pages: text canonicalisation, field extraction and
//! the fetch-then-extract service.

pub mod extract;
pub mod field;
pub mod model;
pub mod normalize;
pub mod premarket;
pub mod queries;
pub mod service;

#[cfg(test)]
mod tests;

pub use extract::{DeviceExtractor, ExtractError};
pub use field::{Field, NOT_AVAILABLE};
pub use model::DeviceRecord;
pub use normalize::normalize;
pub use service::{ClassificationError, Classifier, validate_product_code};
