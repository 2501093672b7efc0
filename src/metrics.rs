//! Compile-time counters for a single [`crate::compile`] call.
//!
//! Trimmed from the teacher's generic, pluggable `MetricsCollector` down to
//! a fixed set of fields: a compile run has a small, known shape (seven
//! fixed stages), so there is nothing for a caller to register beyond what
//! `compile()` itself already counts.

use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::Write;

/// Counters accumulated while running [`crate::compile`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct CompileMetrics {
    pub tensors_total: usize,
    pub tensors_computable: usize,
    pub tensors_const: usize,
    pub inplace_folds: usize,
    pub buffers_opened: usize,
    pub bytes_allocated: u64,
    pub execs_materialized: usize,
    pub zero_init_nodes: usize,
}

impl CompileMetrics {
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Print the counters to stdout in a human-readable format.
    pub fn print(&self) {
        println!("========== compile() metrics ==========");
        println!("tensors:     {} ({} computable, {} const)", self.tensors_total, self.tensors_computable, self.tensors_const);
        println!("inplace folds: {}", self.inplace_folds);
        println!("buffers:     {} ({} bytes)", self.buffers_opened, self.bytes_allocated);
        println!("exec nodes:  {} ({} zero-init)", self.execs_materialized, self.zero_init_nodes);
        println!("=========================================");
    }

    /// # Errors
    /// Propagates the file-write or JSON-serialization error.
    pub fn save_to_file(&self, path: &str) -> anyhow::Result<()> {
        let mut file = File::create(path)?;
        let formatted = serde_json::to_string_pretty(&self.to_json())?;
        file.write_all(formatted.as_bytes())?;
        Ok(())
    }
}
