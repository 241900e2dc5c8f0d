//! Access Crate - Role-Based Access Control
//!
//! A pure permission engine: a static matrix of
//! {resource x action -> allowed roles} with region and ownership
//! predicates layered on top. No IO, no async, no store access;
//! every decision is a total function over its inputs.

pub mod engine;
pub mod matrix;
pub mod region;
pub mod resource;
pub mod role;

pub use engine::{AccessTarget, DenyReason, Subject, can, check};
pub use region::{RegionId, RegionScope};
pub use resource::{Action, Resource};
pub use role::Role;
