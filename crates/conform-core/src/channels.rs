//! Channel accounting and negotiation.
//!
//! Before any buffer is touched the adapter needs to know how many channels
//! a component consumes and produces. Each direction is resolved
//! independently, first applicable source wins:
//!
//! 1. explicit channel metadata on the shape
//! 2. the sum of fixed bus widths (undefined if any bus is dynamic)
//! 3. mono channel ports plus the current size of dynamic channel collections
//! 4. [`ChannelCount::Undefined`], leaving the count to the host
//!
//! [`negotiate`] then combines the declared count with what the host offers.

use serde::{Deserialize, Serialize};

use crate::component::Component;
use crate::predicates::{is_audio_bus, is_audio_channel, is_dynamic_audio};
use crate::shape::{BusChannels, ComponentShape, Direction, FieldKind};

/// A channel count that may be left open.
///
/// `Undefined` is distinct from `Defined(0)`: a component with no audio
/// output declares zero, a component that adapts to the host declares
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelCount {
    Defined(usize),
    Undefined,
}

impl ChannelCount {
    #[inline]
    pub const fn is_defined(&self) -> bool {
        matches!(self, Self::Defined(_))
    }

    #[inline]
    pub const fn get(&self) -> Option<usize> {
        match self {
            Self::Defined(n) => Some(*n),
            Self::Undefined => None,
        }
    }

    #[inline]
    pub const fn unwrap_or(&self, fallback: usize) -> usize {
        match self {
            Self::Defined(n) => *n,
            Self::Undefined => fallback,
        }
    }
}

impl From<Option<usize>> for ChannelCount {
    fn from(count: Option<usize>) -> Self {
        count.map_or(Self::Undefined, Self::Defined)
    }
}

/// Which accounting rule produced a declared count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelSource {
    Metadata,
    Buses,
    MonoChannels,
    Undefined,
}

/// Resolved channel counts for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct ChannelNegotiation {
    pub inputs: usize,
    pub outputs: usize,
}

impl ChannelNegotiation {
    pub const fn new(inputs: usize, outputs: usize) -> Self {
        Self { inputs, outputs }
    }
}

/// Channel count a shape declares for one direction.
///
/// `dynamic_sizes` holds the current sizes of the direction's dynamic channel
/// collections in declaration order; missing entries count as empty.
pub fn declared_channels<C: Component>(
    shape: &ComponentShape<C>,
    direction: Direction,
    dynamic_sizes: &[usize],
) -> (ChannelCount, ChannelSource) {
    let metadata = match direction {
        Direction::Inputs => shape.channels.inputs,
        Direction::Outputs => shape.channels.outputs,
        Direction::Messages => return (ChannelCount::Defined(0), ChannelSource::Metadata),
    };
    if let Some(count) = metadata {
        return (ChannelCount::Defined(count), ChannelSource::Metadata);
    }

    let fields = shape.fields(direction);

    let mut buses = fields.iter().filter(|f| is_audio_bus(f)).peekable();
    if buses.peek().is_some() {
        let mut total = 0;
        for bus in buses {
            match bus.kind {
                FieldKind::AudioBus(BusChannels::Fixed(n)) => total += n,
                _ => return (ChannelCount::Undefined, ChannelSource::Undefined),
            }
        }
        return (ChannelCount::Defined(total), ChannelSource::Buses);
    }

    let mono = fields.iter().filter(|f| is_audio_channel(f)).count();
    let collections = fields.iter().filter(|f| is_dynamic_audio(f)).count();
    if mono + collections > 0 {
        let dynamic: usize = dynamic_sizes.iter().take(collections).sum();
        return (ChannelCount::Defined(mono + dynamic), ChannelSource::MonoChannels);
    }

    (ChannelCount::Undefined, ChannelSource::Undefined)
}

/// Combine a declared count with the host's offer.
///
/// A declared count always wins. Otherwise the host decides, and when the
/// host has no opinion either `fallback` is used.
pub fn negotiate(declared: ChannelCount, host: ChannelCount, fallback: usize) -> usize {
    match (declared, host) {
        (ChannelCount::Defined(n), _) => n,
        (ChannelCount::Undefined, ChannelCount::Defined(n)) => n,
        (ChannelCount::Undefined, ChannelCount::Undefined) => fallback,
    }
}
