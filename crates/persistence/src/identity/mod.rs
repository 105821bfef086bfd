//! Central identities of practitioners and patients.
//!
//! Identity records live only in the central database. Tenant databases
//! reference them through `central_*_id` pointers on their mirror rows, and
//! the aggregator decorates tenant rows by resolving those pointers here.
//!
//! Personal fields are searchable by exact match only, through a
//! [`BlindIndexer`]:
//!
//! ```
//! use caregrid_persistence::identity::{BlindIndexer, IdentityField};
//!
//! let indexer = BlindIndexer::new("index-key").unwrap();
//! assert_eq!(
//!     indexer.index(IdentityField::Email, "Ada@Example.com "),
//!     indexer.index(IdentityField::Email, "ada@example.com"),
//! );
//! ```

mod blind_index;
mod model;
mod resolver;

pub use blind_index::BlindIndexer;
pub use model::{CentralIdentity, IdentityField};
pub use resolver::{CentralIdentityResolver, IdentityCache};
