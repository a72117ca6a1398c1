//! Shared data model for the table partitioning core: partition keys,
//! tagged key values, and the catalog metadata records exchanged with
//! storage backends.
#![deny(rust_2018_idioms)]
#![warn(
    missing_debug_implementations,
    clippy::explicit_iter_loop,
    clippy::use_self,
    clippy::clone_on_ref_ptr
)]

pub mod keys;
pub mod partition_metadata;
pub mod values;
