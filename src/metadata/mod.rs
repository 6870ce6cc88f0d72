//! Translation of human-readable tracker names into instance-specific IDs.
//!
//! The [`MetadataResolver`] owns the round trip to the tracker and the
//! [`CacheStore`](crate::cache::CacheStore); callers get a
//! [`MetadataCache`](crate::cache::MetadataCache) value back and thread it
//! through subsequent lookups.

pub mod normalize;
mod resolver;
pub mod transition;

pub use normalize::{classify_custom_field, normalize_activity_name, normalize_status_name};
pub use resolver::{build_cache, MetadataResolver};
pub use transition::{prepare_status_change, StatusChange, StatusChangeRequest};
