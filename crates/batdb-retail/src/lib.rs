//! Retailer product sources: the product-catalog API client and the
//! product-page scraper, plus the shared rate-limit/retry plumbing.

pub mod amazon;
pub mod error;
pub mod justbats;
pub mod rate_limit;
pub mod types;

pub use amazon::{AmazonClient, AmazonClientConfig, SearchTerm};
pub use error::RetailError;
pub use justbats::{parse_product_page, JustBatsClient, JustBatsClientConfig, ProductPage, SizeOption};
pub use rate_limit::RequestGate;
