// SPDX-License-Identifier: MPL-2.0

use std::time::Duration;

/// Tunables for [`crate::MpegReader`]'s buffering and backpressure behaviour.
///
/// Modeled on `symphonia_core::io::MediaSourceStreamOptions`: a small,
/// `Default`-constructed options struct rather than a builder.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Initial size, in bytes, of the window buffer. Must be a power of two.
    pub initial_window_capacity: usize,
    /// Hard ceiling, in bytes, on the window buffer for forward-only sources.
    /// Seekable sources may exceed this for a single oversized read, then
    /// return to it. Must be a power of two and >= `initial_window_capacity`.
    pub forward_only_capacity: usize,
    /// Total outstanding `save_buffer` bytes across the catalog above which
    /// `read_to_end` pauses on a forward-only source until the consumer
    /// drains frames via `next_frame`.
    pub read_to_end_backpressure_bytes: u64,
    /// Poll interval used while `read_to_end` is paused on backpressure.
    pub read_to_end_poll_interval: Duration,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            initial_window_capacity: 8 * 1024,
            forward_only_capacity: 16 * 1024,
            read_to_end_backpressure_bytes: 40_000,
            read_to_end_poll_interval: Duration::from_millis(500),
        }
    }
}
