//! VoidPool slot recycler (spec §4.B).

pub mod voidpool;

pub use voidpool::VoidPool;
