/// Response caching layer
///
/// Only whole rendered pages are cached, for a fixed TTL and without
/// invalidation on writes.
pub mod page_cache;

pub use page_cache::{CachedPage, PageCache};
