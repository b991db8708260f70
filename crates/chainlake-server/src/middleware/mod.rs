//! Request-path middleware for the serving surface.

mod admission;

pub use admission::{rcu_for_method, split_full_method, AdmissionLayer};
