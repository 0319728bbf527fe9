// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Elbow Authors

use log::info;

/// Trait for systems that can display progress of long running operations.
///
/// The long running operation should take in `&dyn ProgressCallback`
/// and call the `begin` and `update` methods to report progress.
///
/// The `begin` method should be called once at the beginning of the operation.
pub trait ProgressCallback: Send + Sync {
    /// Called when the operation starts
    fn begin(&self, total_steps: u64);
    /// Called before each step.
    ///
    /// `fraction` is the completed share of the whole operation, in `[0, 1]`.
    fn update(&self, fraction: f64, message: &str);
}

#[derive(Default)]
pub struct NoopProgressCallback {}

impl ProgressCallback for NoopProgressCallback {
    fn begin(&self, _total_steps: u64) {}

    fn update(&self, _fraction: f64, _message: &str) {}
}

/// Reports progress through the `log` facade.
#[derive(Default)]
pub struct LogProgressCallback {}

impl ProgressCallback for LogProgressCallback {
    fn begin(&self, total_steps: u64) {
        info!("Starting {} clustering runs", total_steps);
    }

    fn update(&self, fraction: f64, message: &str) {
        info!("[{:>5.1}%] {}", fraction * 100.0, message);
    }
}
