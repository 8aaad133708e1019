//! Pre-allocated storage for the adapter's own buffers.
//!
//! Besides precision conversion (see
//! [`ConversionBuffers`](crate::conversion_buffers::ConversionBuffers)) the
//! adapter needs a few buffers of its own while driving a component:
//!
//! - a silent channel for replicas whose input channel does not exist
//! - per-frame value arrays for per-sample port shapes
//! - one render target per output channel for a polyphonic voice, summed
//!   into the real outputs after each voice
//!
//! # Real-Time Safety
//!
//! - Everything is sized in [`ProcessBufferStorage::allocate`], between ticks
//! - Per-tick operations only fill and read existing storage

use crate::sample::Sample;

/// Adapter-owned scratch storage.
///
/// Fields are public so the adapter can borrow them independently.
#[derive(Debug, Clone)]
pub struct ProcessBufferStorage<S: Sample> {
    /// Silence, `max_frames` long.
    pub zeros: Vec<S>,
    /// Values of the sample input ports for the current frame.
    pub frame_inputs: Vec<S>,
    /// Values of the sample output ports for the current frame.
    pub frame_outputs: Vec<S>,
    /// Render target of one voice: [channel][frames]. Empty unless the
    /// component is polyphonic.
    pub voice_outputs: Vec<Vec<S>>,
    max_frames: usize,
}

impl<S: Sample> ProcessBufferStorage<S> {
    /// Create empty storage (no capacity reserved).
    pub fn new() -> Self {
        Self {
            zeros: Vec::new(),
            frame_inputs: Vec::new(),
            frame_outputs: Vec::new(),
            voice_outputs: Vec::new(),
            max_frames: 0,
        }
    }

    /// Allocate for a layout.
    ///
    /// # Arguments
    ///
    /// * `max_frames` - Maximum frames per tick
    /// * `sample_inputs` - Number of per-frame input values
    /// * `sample_outputs` - Number of per-frame output values
    /// * `voice_channels` - Output channels rendered per voice (0 when not polyphonic)
    pub fn allocate(max_frames: usize, sample_inputs: usize, sample_outputs: usize, voice_channels: usize) -> Self {
        Self {
            zeros: vec![S::ZERO; max_frames],
            frame_inputs: vec![S::ZERO; sample_inputs],
            frame_outputs: vec![S::ZERO; sample_outputs],
            voice_outputs: vec![vec![S::ZERO; max_frames]; voice_channels],
            max_frames,
        }
    }

    /// Silence for `frames` frames.
    #[inline]
    pub fn zeros(&self, frames: usize) -> &[S] {
        &self.zeros[..frames.min(self.max_frames)]
    }

    /// Zero the per-frame arrays.
    #[inline]
    pub fn clear_frame(&mut self) {
        self.frame_inputs.fill(S::ZERO);
        self.frame_outputs.fill(S::ZERO);
    }

    /// Zero the first `frames` frames of every voice channel.
    pub fn clear_voice(&mut self, frames: usize) {
        let frames = frames.min(self.max_frames);
        for channel in &mut self.voice_outputs {
            channel[..frames].fill(S::ZERO);
        }
    }

    #[inline]
    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    /// Whether voice render targets exist.
    #[inline]
    pub fn has_voice_outputs(&self) -> bool {
        !self.voice_outputs.is_empty()
    }
}

impl<S: Sample> Default for ProcessBufferStorage<S> {
    fn default() -> Self {
        Self::new()
    }
}
