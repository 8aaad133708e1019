//! Preparation values handed to the adapter and to each instance.
//!
//! The host prepares an [`Adapter`](crate::Adapter) with a [`ProcessSetup`]
//! whose channel counts may be [`ChannelCount::Undefined`]. After
//! negotiation every instance receives a copy with defined counts and its
//! own sub-instance and voice index.
//!
//! # Example
//!
//! ```ignore
//! fn prepare(&mut self, setup: &ProcessSetup) {
//!     let len = (setup.sample_rate * 2.0) as usize;
//!     self.delay_line = vec![0.0; len];
//! }
//! ```

use crate::channels::ChannelCount;

/// Values fixed between two preparations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSetup {
    pub input_channels: ChannelCount,
    pub output_channels: ChannelCount,
    /// Largest frame count the host will ask for in one tick.
    pub max_frames: usize,
    pub sample_rate: f64,
    /// Host-assigned identifier of the adapter.
    pub instance: u64,
    /// Index of this replica among all replicas of the adapter.
    pub subinstance: usize,
    /// Voice this replica belongs to (0 for non-polyphonic components).
    pub voice: usize,
}

impl ProcessSetup {
    pub const fn new(sample_rate: f64, max_frames: usize) -> Self {
        Self {
            input_channels: ChannelCount::Undefined,
            output_channels: ChannelCount::Undefined,
            max_frames,
            sample_rate,
            instance: 0,
            subinstance: 0,
            voice: 0,
        }
    }

    pub const fn with_channels(mut self, inputs: ChannelCount, outputs: ChannelCount) -> Self {
        self.input_channels = inputs;
        self.output_channels = outputs;
        self
    }

    pub const fn with_instance(mut self, instance: u64) -> Self {
        self.instance = instance;
        self
    }

    /// Copy addressed to one replica.
    pub(crate) const fn for_replica(mut self, subinstance: usize, voice: usize) -> Self {
        self.subinstance = subinstance;
        self.voice = voice;
        self
    }
}
