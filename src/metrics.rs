//! Metric helpers for `framestream`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. With the `metrics` feature
//! disabled the helpers compile to no-ops.

use crate::cumulation::AppendPolicy;

/// Name of the counter tracking frames dispatched downstream.
pub const FRAMES_DECODED: &str = "framestream_frames_decoded_total";
/// Name of the counter tracking decode failures, labelled by `type`.
pub const DECODE_ERRORS: &str = "framestream_decode_errors_total";
/// Name of the counter tracking cumulation buffer allocations, labelled by
/// `policy`.
pub const CUMULATION_ALLOCATIONS: &str = "framestream_cumulation_allocations_total";

/// Record `count` frames dispatched downstream.
#[cfg(feature = "metrics")]
pub fn inc_frames(count: usize) {
    if count > 0 {
        metrics::counter!(FRAMES_DECODED).increment(u64::try_from(count).unwrap_or(u64::MAX));
    }
}

/// Record `count` frames dispatched downstream.
#[cfg(not(feature = "metrics"))]
pub fn inc_frames(_count: usize) {}

/// Record a decode failure of the given category.
#[cfg(feature = "metrics")]
pub fn inc_decode_errors(error_type: &'static str) {
    metrics::counter!(DECODE_ERRORS, "type" => error_type).increment(1);
}

/// Record a decode failure of the given category.
#[cfg(not(feature = "metrics"))]
pub fn inc_decode_errors(_error_type: &'static str) {}

/// Record a cumulation buffer allocation.
#[cfg(feature = "metrics")]
pub fn inc_cumulation_allocations(policy: AppendPolicy) {
    metrics::counter!(CUMULATION_ALLOCATIONS, "policy" => policy.as_str()).increment(1);
}

/// Record a cumulation buffer allocation.
#[cfg(not(feature = "metrics"))]
pub fn inc_cumulation_allocations(_policy: AppendPolicy) {}
