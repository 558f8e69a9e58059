//! Storefront domain: value objects, aggregates, events and the repository
//! seams the managers in [`crate::services`] are built on.

pub mod aggregates;
pub mod events;
pub mod repositories;
pub mod value_objects;
