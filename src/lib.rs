//! pageforge - runtime-declared record types with a generic CRUD surface
//!
//! A page is a named record type declared at runtime: a description plus an
//! ordered list of typed, validated fields. Each page owns one physical
//! collection. Records are validated against the current field list, and
//! page edits (rename, delete) carry the physical collection along.

pub mod cli;
pub mod data;
pub mod errors;
pub mod http_server;
pub mod model;
pub mod observability;
pub mod schema;
pub mod storage;
