//! pedia-store — in-memory multi-cluster resource index.
//!
//! Stands in for a multi-cluster resource database in tests. Records live in
//! an append-only table addressed by [`Slot`]; secondary indices map each
//! cluster and each namespace to an ascending slot list, and List queries
//! are answered by merge-joining those lists and running the candidates
//! through a fixed filter pipeline.
//!
//! # Architecture
//!
//! ```text
//! ListOptions ─► ListQuery ─► intersect (cluster × namespace)
//!                              ─► names ─► owner uid ─► labels ─► fields ─► owner chain
//!                              ─► order ─► paginate ─► decode
//! ```
//!
//! Payloads are opaque bytes produced by an injected [`Codec`]. Deleted
//! records are tombstoned in place, so slots are never reused and every
//! index list stays sorted.
//!
//! [`ResourceStorage`] is `Clone` + `Send` + `Sync` (one coarse `RwLock`
//! around the table) and [`StorageFactory`] routes objects to the storage
//! registered for their kind.

pub mod codec;
pub mod error;
pub mod factory;
pub mod filter;
pub mod intersect;
pub mod owner;
pub mod paginate;
pub mod query;
pub mod record;
pub mod store;
pub mod table;

pub use codec::{Codec, CodecError, JsonCodec};
pub use error::{StoreError, StoreResult};
pub use factory::StorageFactory;
pub use query::{ListQuery, OrderBy, OrderColumn};
pub use record::{ResourceRecord, Slot};
pub use store::{ListPage, ResourceStorage, StorageConfig};
pub use table::Database;
