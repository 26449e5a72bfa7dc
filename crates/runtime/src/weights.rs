// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Reference-counted weight storage for engines that share weights between
//! sibling runtimes.
//!
//! An adapter that supports shared cloning keeps its loaded weights in a
//! [`SharedWeights`] and hands a clone of the handle to each sibling. The
//! bytes are freed when the last runtime holding them drops, regardless of
//! the order in which siblings are dropped.

use std::fmt;
use std::sync::{Arc, Weak};

struct WeightsInner {
    label: String,
    bytes: Box<[u8]>,
}

impl Drop for WeightsInner {
    fn drop(&mut self) {
        tracing::debug!(
            "releasing weights '{}' ({} bytes)",
            self.label,
            self.bytes.len()
        );
    }
}

/// Immutable weight bytes shared by every runtime cloned from one source.
#[derive(Clone)]
pub struct SharedWeights {
    inner: Arc<WeightsInner>,
}

impl SharedWeights {
    /// Takes ownership of `bytes` under a descriptive label.
    pub fn new(label: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            inner: Arc::new(WeightsInner {
                label: label.into(),
                bytes: bytes.into_boxed_slice(),
            }),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.inner.bytes
    }

    pub fn len(&self) -> usize {
        self.inner.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.bytes.is_empty()
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Number of live handles (one per runtime holding these weights).
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Returns `true` if both handles point at the same storage.
    pub fn ptr_eq(a: &SharedWeights, b: &SharedWeights) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// A handle that does not keep the weights alive.
    pub fn downgrade(&self) -> WeakWeights {
        WeakWeights(Arc::downgrade(&self.inner))
    }
}

impl fmt::Debug for SharedWeights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedWeights")
            .field("label", &self.inner.label)
            .field("size_bytes", &self.inner.bytes.len())
            .field("holders", &self.holders())
            .finish()
    }
}

/// Non-owning observer of [`SharedWeights`].
#[derive(Clone)]
pub struct WeakWeights(Weak<WeightsInner>);

impl WeakWeights {
    /// Returns `true` once every owning handle has dropped.
    pub fn is_released(&self) -> bool {
        self.0.strong_count() == 0
    }

    pub fn upgrade(&self) -> Option<SharedWeights> {
        self.0.upgrade().map(|inner| SharedWeights { inner })
    }
}

impl fmt::Debug for WeakWeights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakWeights")
            .field("released", &self.is_released())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holders_track_clones() {
        let w = SharedWeights::new("model", vec![1, 2, 3]);
        assert_eq!(w.holders(), 1);
        let sibling = w.clone();
        assert_eq!(w.holders(), 2);
        assert!(SharedWeights::ptr_eq(&w, &sibling));
        drop(sibling);
        assert_eq!(w.holders(), 1);
    }

    #[test]
    fn test_released_after_last_holder_in_any_order() {
        let w = SharedWeights::new("model", vec![0; 16]);
        let a = w.clone();
        let b = w.clone();
        let weak = w.downgrade();

        drop(w);
        assert!(!weak.is_released());
        drop(b);
        assert!(!weak.is_released());
        assert_eq!(a.as_bytes().len(), 16);
        drop(a);
        assert!(weak.is_released());
        assert!(weak.upgrade().is_none());
    }
}
