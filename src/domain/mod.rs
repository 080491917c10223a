pub mod catalog_entry;

pub use catalog_entry::{parse_manifest, to_manifest, CatalogEntry};
