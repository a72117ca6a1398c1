//! Horizontal partitioning of a logical table into physically separate
//! child tables.
//!
//! A [`PartitionFactory`] owns the partitioning keys of one parent table.
//! [`create`](factory::PartitionFactory::create) derives the boundary CHECK
//! constraint for a set of key values and creates the child table plus its
//! catalog row in one transaction; [`find_for`](factory::PartitionFactory::find_for)
//! routes a key-value lookup to the partition whose boundary contains it.
//!
//! The storage system is abstracted behind the traits in [`backend`];
//! [`mem`] provides a complete in-memory implementation used by the tests.
#![deny(rust_2018_idioms)]
#![warn(
    missing_debug_implementations,
    clippy::explicit_iter_loop,
    clippy::use_self,
    clippy::clone_on_ref_ptr
)]

pub mod backend;
pub mod boundary;
pub mod ddl;
pub mod factory;
pub mod mem;
pub mod router;

pub use factory::{Partition, PartitionFactory, PartitionOptions};
