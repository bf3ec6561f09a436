pub mod cache;
pub mod client;
pub mod queries;

pub use cache::RequestCache;
pub use client::create_client;
pub use queries::*;
