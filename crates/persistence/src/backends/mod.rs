//! Database backend implementations.
//!
//! Each backend is gated behind a feature flag.
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | SQLite | `sqlite` | Central database plus one database file per tenant |

#[cfg(feature = "sqlite")]
pub mod sqlite;
