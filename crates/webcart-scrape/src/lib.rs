pub mod adapter;
pub mod cache;
pub mod dom;
pub mod error;
pub mod extract;
pub mod retry;
pub mod transform;
pub mod validate;
pub mod variations;

pub use adapter::{ExtractedProduct, SiteAdapter};
pub use cache::AdapterCache;
pub use error::ScrapeError;
pub use transform::normalize_product;
pub use validate::validate_product;
