// SPDX-License-Identifier: MIT OR Apache-2.0
//! Effect graph nodes for device-backed image processing.
//!
//! An [`Effect`] is one stage of an image pipeline. It owns:
//! - a [`PropertyStore`] of typed parameter values
//! - an [`InputStore`] of upstream images (other effects or terminal sources)
//! - a native resource created lazily on the device it is resolved against
//!
//! ## Architecture
//!
//! ```text
//!   caller ──► Effect::resolve(ctx)
//!                 │
//!                 ├─ device identity changed? ──► drop resource, recreate
//!                 ├─ properties dirty?        ──► marshal::push_all
//!                 ├─ inputs dirty?            ──► resolve each input, wire it in
//!                 ▼
//!             ImageHandle
//! ```
//!
//! The native side is abstracted by the traits in [`native`]. The
//! [`software`] module provides a headless implementation that records every
//! native call, used by tests and the demo binary.

pub mod effect;
pub mod error;
pub mod image;
pub mod marshal;
pub mod native;
pub mod registry;
pub mod slots;
pub mod software;
pub mod value;

pub use effect::Effect;
pub use error::{EffectError, NativeError, Result, Slot};
pub use image::{EffectInput, ImageSource, StaticImage};
pub use native::{Device, DeviceContext, DeviceIdentity, EffectId, ImageHandle, NativeEffect, NativeValue};
pub use registry::{EffectDescriptor, EffectRegistry};
pub use slots::{InputStore, PropertyStore, SlotVector};
pub use value::{PropertyType, PropertyValue};
