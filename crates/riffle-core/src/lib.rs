#![forbid(unsafe_code)]
//! riffle-core: schemas, scalar values, row sources, configs, errors, and
//! stable hashing for the riffle join engine.
//!
//! Everything here is pure data plus narrow collaborator traits (cluster
//! membership, statistics catalog). No data movement or execution logic;
//! that lives in `riffle-exchange` and `riffle-exec`.

pub mod cancel;
pub mod catalog;
pub mod cluster;
pub mod config;
pub mod error;
pub mod hash;
pub mod prelude;
pub mod relation;
pub mod schema;
pub mod types;
