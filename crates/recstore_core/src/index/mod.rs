//! Secondary indexes over store positions.
//!
//! An index maps a field value to the manifest positions of the records
//! holding it. Indexes are maintained by the store on every add, remove,
//! field write and compaction; callers query them through
//! [`Store::get_index_records`](crate::Store::get_index_records).
//!
//! # Index Types
//!
//! - [`HashIndex`]: O(1) equality lookup
//! - [`BTreeIndex`]: Ordered traversal, per-key counts and range queries
//!
//! Both implement [`Index`]; a store holds either behind [`FieldIndex`].

mod btree;
mod field;
mod hash;
mod traits;

pub use btree::BTreeIndex;
pub use field::{FieldIndex, IndexStats};
pub use hash::HashIndex;
pub use traits::{Index, IndexKey, IndexKind, IndexSpec, Position};
pub(crate) use traits::{remap_positions, remove_position};
