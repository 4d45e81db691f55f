//! pedia-core — shared API types for the Pedia multi-cluster resource index.
//!
//! Holds the object model stored by `pedia-store`, the well-known search
//! label keys, the label/field selector grammar, the client-side
//! [`ListOptionsBuilder`] that encodes list queries into selectors, and the
//! `pedia.toml` configuration.

pub mod builder;
pub mod config;
pub mod constants;
pub mod selector;
pub mod types;

pub use builder::ListOptionsBuilder;
pub use config::{OwnerScope, PediaConfig};
pub use selector::{Operator, Requirement, Selector, SelectorError};
pub use types::*;
