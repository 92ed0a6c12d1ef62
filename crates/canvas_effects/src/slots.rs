// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared, dirty-tracked slot containers for effect properties and inputs.
//!
//! A [`SlotVector`] is a cheap cloneable handle: every clone refers to the
//! same slots, so a container handed out by
//! [`Effect::properties`](crate::Effect::properties) stays live and
//! mutations through it are seen by the effect on its next resolve.
//!
//! Each mutation sets the changed flag. Only the resolve path clears it, and
//! a failed push leaves it set.

use crate::error::{EffectError, Result};
use crate::image::EffectInput;
use crate::value::PropertyValue;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Container of effect property values
pub type PropertyStore = SlotVector<PropertyValue>;

/// Container of effect inputs
pub type InputStore = SlotVector<Arc<dyn EffectInput>>;

// `items.len()` never exceeds `u32::MAX`.
struct Slots<T> {
    items: Vec<Option<T>>,
    fixed_size: bool,
    changed: bool,
}

/// Ordered container of optional values with a changed flag
pub struct SlotVector<T> {
    inner: Arc<Mutex<Slots<T>>>,
}

/// Slot count as a `u32`, refusing lengths a slot index cannot address
fn slot_count(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| EffectError::OutOfRange {
        index: u32::MAX,
        len: u32::MAX,
    })
}

impl<T> Clone for SlotVector<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone> SlotVector<T> {
    /// Create a container with `len` empty slots
    pub fn new(len: u32, fixed_size: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Slots {
                items: vec![None; len as usize],
                fixed_size,
                changed: false,
            })),
        }
    }

    /// Number of slots
    pub fn len(&self) -> u32 {
        self.inner.lock().items.len() as u32
    }

    /// Whether there are no slots
    pub fn is_empty(&self) -> bool {
        self.inner.lock().items.is_empty()
    }

    /// Whether the slot count is fixed
    pub fn is_fixed_size(&self) -> bool {
        self.inner.lock().fixed_size
    }

    /// Get the value at `index`; `Ok(None)` for an empty slot
    pub fn get(&self, index: u32) -> Result<Option<T>> {
        let slots = self.inner.lock();
        let len = slots.items.len() as u32;
        slots
            .items
            .get(index as usize)
            .cloned()
            .ok_or(EffectError::OutOfRange { index, len })
    }

    /// Overwrite the slot at `index`
    pub fn set(&self, index: u32, value: Option<T>) -> Result<()> {
        let mut slots = self.inner.lock();
        let len = slots.items.len() as u32;
        let slot = slots
            .items
            .get_mut(index as usize)
            .ok_or(EffectError::OutOfRange { index, len })?;
        *slot = value;
        slots.changed = true;
        Ok(())
    }

    /// Append a slot at the end
    pub fn append(&self, value: Option<T>) -> Result<()> {
        let mut slots = self.inner.lock();
        let len = slots.items.len() as u32;
        if slots.fixed_size {
            return Err(EffectError::OutOfRange { index: len, len });
        }
        slot_count(slots.items.len() + 1)?;
        slots.items.push(value);
        slots.changed = true;
        Ok(())
    }

    /// Insert a slot before `index`; `index == len` appends
    pub fn insert(&self, index: u32, value: Option<T>) -> Result<()> {
        let mut slots = self.inner.lock();
        let len = slots.items.len() as u32;
        if slots.fixed_size || index > len {
            return Err(EffectError::OutOfRange { index, len });
        }
        slot_count(slots.items.len() + 1)?;
        slots.items.insert(index as usize, value);
        slots.changed = true;
        Ok(())
    }

    /// Remove the slot at `index`, shifting later slots down
    pub fn remove(&self, index: u32) -> Result<Option<T>> {
        let mut slots = self.inner.lock();
        let len = slots.items.len() as u32;
        if slots.fixed_size || index >= len {
            return Err(EffectError::OutOfRange { index, len });
        }
        let removed = slots.items.remove(index as usize);
        slots.changed = true;
        Ok(removed)
    }

    /// Remove the last slot
    pub fn remove_last(&self) -> Result<Option<T>> {
        let len = self.len();
        match len.checked_sub(1) {
            Some(last) => self.remove(last),
            None => Err(EffectError::OutOfRange { index: 0, len }),
        }
    }

    /// Remove every slot; a fixed-size container keeps its length and
    /// empties each slot instead
    pub fn clear(&self) {
        let mut slots = self.inner.lock();
        if slots.fixed_size {
            slots.items.iter_mut().for_each(|slot| *slot = None);
        } else {
            slots.items.clear();
        }
        slots.changed = true;
    }

    /// Replace all slots; a fixed-size container only accepts the same length
    pub fn replace_all(&self, values: Vec<Option<T>>) -> Result<()> {
        let mut slots = self.inner.lock();
        let len = slots.items.len() as u32;
        let new_len = slot_count(values.len())?;
        if slots.fixed_size && new_len != len {
            return Err(EffectError::OutOfRange { index: new_len, len });
        }
        slots.items = values;
        slots.changed = true;
        Ok(())
    }

    /// Copy of the current slots
    pub fn snapshot(&self) -> Vec<Option<T>> {
        self.inner.lock().items.clone()
    }

    /// Copy of the current slots, clearing the changed flag in the same step.
    ///
    /// Mutations made after this call set the flag again, so they are not
    /// lost if the copy is pushed while the store stays unlocked.
    pub(crate) fn take_snapshot(&self) -> Vec<Option<T>> {
        let mut slots = self.inner.lock();
        slots.changed = false;
        slots.items.clone()
    }

    /// Run `f` over the slots without copying them
    pub(crate) fn with_slots<R>(&self, f: impl FnOnce(&[Option<T>]) -> R) -> R {
        f(&self.inner.lock().items)
    }

    /// Run `f` over the slots and clear the changed flag if it succeeds,
    /// without releasing the lock in between
    pub(crate) fn flush<E>(&self, f: impl FnOnce(&[Option<T>]) -> Result<(), E>) -> Result<(), E> {
        let mut slots = self.inner.lock();
        f(&slots.items)?;
        slots.changed = false;
        Ok(())
    }

    /// Whether anything changed since the flag was last cleared
    pub fn is_changed(&self) -> bool {
        self.inner.lock().changed
    }

    /// Set or clear the changed flag
    pub fn set_changed(&self, changed: bool) {
        self.inner.lock().changed = changed;
    }

    /// Whether two handles refer to the same container
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> fmt::Debug for SlotVector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.inner.lock();
        f.debug_struct("SlotVector")
            .field("len", &slots.items.len())
            .field("occupied", &slots.items.iter().filter(|s| s.is_some()).count())
            .field("fixed_size", &slots.fixed_size)
            .field("changed", &slots.changed)
            .finish()
    }
}
