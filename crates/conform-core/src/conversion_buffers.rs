//! Pre-allocated scratch buffers for precision conversion.
//!
//! When a component computes in a different precision than the host, or
//! when the host offers fewer input channels than were negotiated, the
//! adapter stages audio through [`ConversionBuffers`]: host inputs are
//! converted (and missing channels zeroed) into scratch storage, the
//! component renders into scratch outputs, and the result is converted back
//! into the host's arrays.
//!
//! # Real-Time Safety
//!
//! - Buffers are allocated in [`ConversionBuffers::ensure_layout`], which the
//!   adapter only calls between ticks
//! - Layout is kept as long as channel counts and frame capacity are unchanged
//! - Loading and storing never allocate

use crate::buffer::{Channels, ChannelsMut};
use crate::sample::Sample;

/// Convert elementwise from one precision to another.
///
/// Copies `min(src.len(), dst.len())` samples. No clipping is applied.
#[inline]
pub fn convert_into<A: Sample, B: Sample>(src: &[A], dst: &mut [B]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d = s.convert();
    }
}

/// Scratch input and output channels in the component's precision.
///
/// Fields are public for direct iteration in the adapter.
#[derive(Debug, Clone)]
pub struct ConversionBuffers<S: Sample> {
    /// Input scratch: [channel][frames]
    pub input: Vec<Vec<S>>,
    /// Output scratch: [channel][frames]
    pub output: Vec<Vec<S>>,
    max_frames: usize,
}

impl<S: Sample> ConversionBuffers<S> {
    /// Empty buffers; call [`ensure_layout`](Self::ensure_layout) before use.
    pub fn new() -> Self {
        Self {
            input: Vec::new(),
            output: Vec::new(),
            max_frames: 0,
        }
    }

    /// Buffers for the given channel counts and frame capacity.
    pub fn allocate(input_channels: usize, output_channels: usize, max_frames: usize) -> Self {
        Self {
            input: vec![vec![S::ZERO; max_frames]; input_channels],
            output: vec![vec![S::ZERO; max_frames]; output_channels],
            max_frames,
        }
    }

    /// Make sure the layout matches. Returns `true` if it had to reallocate.
    pub fn ensure_layout(&mut self, input_channels: usize, output_channels: usize, max_frames: usize) -> bool {
        if self.input.len() == input_channels
            && self.output.len() == output_channels
            && self.max_frames >= max_frames
        {
            return false;
        }
        *self = Self::allocate(input_channels, output_channels, max_frames.max(self.max_frames));
        true
    }

    #[inline]
    pub fn input_channel_count(&self) -> usize {
        self.input.len()
    }

    #[inline]
    pub fn output_channel_count(&self) -> usize {
        self.output.len()
    }

    #[inline]
    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    /// Convert host inputs into scratch; scratch channels without a host
    /// channel are zeroed.
    pub fn load_inputs<H: Sample>(&mut self, host: &[&[H]], frames: usize) {
        let frames = frames.min(self.max_frames);
        for (i, scratch) in self.input.iter_mut().enumerate() {
            let scratch = &mut scratch[..frames];
            match host.get(i) {
                Some(channel) => {
                    let n = channel.len().min(frames);
                    convert_into(&channel[..n], &mut scratch[..n]);
                    scratch[n..].fill(S::ZERO);
                }
                None => scratch.fill(S::ZERO),
            }
        }
    }

    /// Convert scratch outputs back into host channels.
    pub fn store_outputs<H: Sample>(&self, host: &mut [&mut [H]], frames: usize) {
        let frames = frames.min(self.max_frames);
        for (scratch, channel) in self.output.iter().zip(host.iter_mut()) {
            let n = channel.len().min(frames);
            convert_into(&scratch[..n], &mut channel[..n]);
        }
    }

    /// Zero the first `frames` samples of every output channel.
    pub fn clear_outputs(&mut self, frames: usize) {
        let frames = frames.min(self.max_frames);
        for channel in &mut self.output {
            channel[..frames].fill(S::ZERO);
        }
    }

    /// Input and output views for one tick.
    pub fn views(&mut self, frames: usize) -> (Channels<'_, S>, ChannelsMut<'_, '_, S>) {
        (
            Channels::from_owned(&self.input, frames),
            ChannelsMut::from_owned(&mut self.output, frames),
        )
    }
}

impl<S: Sample> Default for ConversionBuffers<S> {
    fn default() -> Self {
        Self::new()
    }
}
