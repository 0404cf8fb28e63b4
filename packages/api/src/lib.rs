//! The recall API's resource contract, expressed against the `recallwire`
//! engine.
//!
//! # Contents
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`entities`] | Field declarations for recall, product, remedy, manufacturer and subscription |
//! | [`register_all`] | Declare every entity type on a [`recallwire::SchemaRegistry`] |
//! | [`ListQuery`] | Paging, sorting and equality filters for collection endpoints |

pub mod entities;
pub mod query;

pub use entities::{register_all, registry, MANUFACTURER, PRODUCT, RECALL, REMEDY, SUBSCRIPTION};
pub use query::{ListQuery, SortKey};
