// SPDX-License-Identifier: MPL-2.0

//! Buffered, random-access I/O over a possibly forward-only source.

mod source;
mod window;

pub use source::{ForwardOnly, Source};
pub use window::WindowBuffer;
