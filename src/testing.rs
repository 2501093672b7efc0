//! Testing utilities: graph fixtures, a fluent builder, invariant
//! assertions, and debug printers, so integration tests don't hand-roll a
//! `SymbolOrganizer` per scenario.
//!
//! # Quick Start
//!
//! ```
//! use arenac::backend::HostBackend;
//! use arenac::testing::linear_chain_3;
//! use std::sync::Arc;
//!
//! let organizer = linear_chain_3();
//! let output = arenac::compile(&organizer, Arc::new(HostBackend), arenac::CompileOptions::default()).unwrap();
//! assert!(!output.arena.vt_tensor.is_empty());
//! ```

pub mod assertions;
pub mod builders;
pub mod debug;
pub mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use debug::*;
pub use fixtures::*;
