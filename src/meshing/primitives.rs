use log::{debug, warn};

use crate::common::MAX_PRIMITIVES;
use crate::data::Primitive;

/// The primitives of the current frame, replaced wholesale by `upload`
///
/// Laid out as the shader's `array<Primitive, MAX_PRIMITIVES>` uniform.
#[derive(Debug, Clone)]
pub struct PrimitiveBuffer {
    primitives: [Primitive; MAX_PRIMITIVES],
    count: usize,
    /// supplied count of the last truncated upload, 0 after an upload that fit
    truncated_from: usize,
}

impl Default for PrimitiveBuffer {
    fn default() -> Self {
        PrimitiveBuffer {
            primitives: [Primitive::default(); MAX_PRIMITIVES],
            count: 0,
            truncated_from: 0,
        }
    }
}

impl PrimitiveBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the first `MAX_PRIMITIVES` primitives, the rest are dropped
    ///
    /// Warns once each time the supplied count changes, not on every frame.
    pub fn upload(&mut self, primitives: &[Primitive]) {
        self.note_truncation(primitives.len());
        self.count = primitives.len().min(MAX_PRIMITIVES);
        self.primitives[..self.count].copy_from_slice(&primitives[..self.count]);
        self.primitives[self.count..].fill(Primitive::default());
    }

    /// Returns whether a warning was logged
    fn note_truncation(&mut self, supplied: usize) -> bool {
        if supplied <= MAX_PRIMITIVES {
            self.truncated_from = 0;
            return false;
        }
        if supplied == self.truncated_from {
            debug!("{supplied} primitives supplied, {MAX_PRIMITIVES} meshed");
            return false;
        }
        self.truncated_from = supplied;
        warn!("{supplied} primitives supplied, only the first {MAX_PRIMITIVES} are meshed");
        true
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn active(&self) -> &[Primitive] {
        &self.primitives[..self.count]
    }

    /// The whole fixed size array, unused entries zeroed
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.primitives)
    }
}
