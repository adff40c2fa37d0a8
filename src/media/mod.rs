//! Media and metadata: attribution records, the meta page, and the
//! copyright merger

pub mod copyrights;
pub mod merge;
pub mod meta;

pub use copyrights::{fetch_copyrights, parse_copyrights};
pub use merge::{merge_copyrights, MediaResolver, NullResolver};
pub use meta::{fetch_meta_page, parse_meta_page};
