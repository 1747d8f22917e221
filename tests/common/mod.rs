//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use mock_helpers::RecordingHost;
use plugin_channels::channels::PluginChannels;
use std::sync::Arc;

/// Registry wired to a fresh recording host, auto sync disabled
pub fn registry_with_host() -> (PluginChannels, Arc<RecordingHost>) {
    let host = Arc::new(RecordingHost::new());
    let mut registry = PluginChannels::new();
    registry.set_auto_synchronize(false);
    registry.set_plugin_host(Some(host.clone()));
    (registry, host)
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}
