//! Confirms the `tracing::debug!` spans inside `compile()` actually reach a
//! real subscriber rather than just compiling against the no-op default.

use arenac::backend::HostBackend;
use arenac::testing::linear_chain_3;
use arenac::{compile, CompileOptions};
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

fn init_subscriber() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("arenac=debug"))
            .with_test_writer()
            .try_init()
            .ok();
    });
}

#[test]
fn compile_emits_debug_spans_through_a_real_subscriber() {
    init_subscriber();
    let organizer = linear_chain_3();
    let output = compile(&organizer, Arc::new(HostBackend), CompileOptions::default()).expect("compile");
    assert!(!output.packing.buffer_sizes.is_empty());
}
