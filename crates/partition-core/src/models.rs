//! Domain models for the partition service.
//!
//! Every entity carries the same base record: a global identifier, the
//! owning tenant, creation/update timestamps and an optional logical
//! delete timestamp.

pub mod access;
pub mod page;
pub mod partition;
pub mod partition_role;
pub mod state;
pub mod tenant;
