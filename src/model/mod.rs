//! Runtime model compilation
//!
//! A page's field list becomes a typed-but-open handle over its physical
//! collection. Handles are built per request and never shared.

mod compiler;

pub use compiler::{Column, ModelCompiler, ModelHandle, PhysicalType};
