// SPDX-License-Identifier: MIT OR Apache-2.0
//! Image capabilities shared by effects and terminal image sources.

use crate::error::Result;
use crate::native::{DeviceContext, ImageHandle};
use std::fmt;

/// Anything that can produce a native image for a device context
pub trait ImageSource: Send + Sync {
    /// Resolve this source against `context` into a native image
    fn resolve(&self, context: &dyn DeviceContext) -> Result<ImageHandle>;
}

/// Object that can be stored in an effect input slot.
///
/// Being accepted as an input does not imply the object can be resolved:
/// [`as_image_source`](Self::as_image_source) is checked when the effect
/// wires its inputs, and an input returning `None` fails that resolve.
pub trait EffectInput: Send + Sync {
    /// The image resolution capability of this input, if it has one
    fn as_image_source(&self) -> Option<&dyn ImageSource> {
        None
    }
}

/// An image created outside the graph (an uploaded bitmap, a render target).
///
/// Resolves to the same handle on every device context.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct StaticImage {
    handle: ImageHandle,
}

impl StaticImage {
    /// Wrap an existing native image
    pub fn new(handle: ImageHandle) -> Self {
        Self { handle }
    }

    /// The wrapped handle
    pub fn handle(&self) -> ImageHandle {
        self.handle
    }
}

impl fmt::Debug for StaticImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StaticImage({:?})", self.handle)
    }
}

impl ImageSource for StaticImage {
    fn resolve(&self, _context: &dyn DeviceContext) -> Result<ImageHandle> {
        Ok(self.handle)
    }
}

impl EffectInput for StaticImage {
    fn as_image_source(&self) -> Option<&dyn ImageSource> {
        Some(self)
    }
}
