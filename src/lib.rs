#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
//! The Acorn clause-learning satisfiability core.
//!
//! The crate implements a conflict-driven clause-learning (CDCL) engine together with a
//! channelling layer that ties Boolean literals to finite-domain variables, so that unit
//! propagation and nogood learning can run inside a domain-based backtracking search.

pub mod acorn_asserts;
pub mod basic_types;
pub mod containers;
pub mod engine;
pub mod parsers;
