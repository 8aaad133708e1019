//! Partitioning of flat host channel lists into bus ranges.
//!
//! Hosts deliver audio as one flat list of channels per direction. The
//! component may expect mono channel ports, dynamic channel collections or
//! buses of several widths. A [`BusLayout`] is computed between ticks from
//! the shape, the selected strategy and the negotiated counts, and tells the
//! adapter which host channels back which declared field.

use std::ops::Range;

use serde::Serialize;

use crate::channels::ChannelNegotiation;
use crate::component::Component;
use crate::dispatch::Strategy;
use crate::enumerate::FieldIndexMap;
use crate::predicates::{is_audio_bus, is_audio_channel, is_dynamic_audio};
use crate::shape::{BusChannels, ComponentShape, Direction, FieldDescriptor, FieldKind};
use crate::types::{MAX_BUSES, MAX_CHANNELS};

/// What a slot of the layout backs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BusRole {
    /// All channels, for argument-based and per-sample strategies.
    Main,
    /// A static mono channel port.
    Channel,
    /// A dynamic collection of mono channels.
    DynamicChannels,
    /// An audio bus field.
    Bus,
}

/// One contiguous range of host channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CachedBusInfo {
    pub role: BusRole,
    /// Index among fields of the same role.
    pub index: usize,
    /// First host channel.
    pub start: usize,
    pub channel_count: usize,
}

impl CachedBusInfo {
    pub const fn new(role: BusRole, index: usize, start: usize, channel_count: usize) -> Self {
        Self {
            role,
            index,
            start,
            channel_count,
        }
    }

    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.channel_count
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.channel_count
    }
}

/// Host channel ranges for every audio field, per direction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BusLayout {
    pub inputs: Vec<CachedBusInfo>,
    pub outputs: Vec<CachedBusInfo>,
}

impl BusLayout {
    pub fn new(inputs: Vec<CachedBusInfo>, outputs: Vec<CachedBusInfo>) -> Self {
        Self { inputs, outputs }
    }

    /// One main range per direction covering the negotiated channels.
    pub fn main(negotiation: ChannelNegotiation) -> Self {
        Self::new(
            vec![CachedBusInfo::new(BusRole::Main, 0, 0, negotiation.inputs)],
            vec![CachedBusInfo::new(BusRole::Main, 0, 0, negotiation.outputs)],
        )
    }

    /// Layout for a resolved strategy.
    ///
    /// `dynamic_inputs`/`dynamic_outputs` are the current sizes of each
    /// direction's dynamic channel collections in declaration order.
    pub fn for_strategy<C: Component>(
        shape: &ComponentShape<C>,
        strategy: Strategy,
        negotiation: ChannelNegotiation,
        dynamic_inputs: &[usize],
        dynamic_outputs: &[usize],
    ) -> Self {
        match strategy {
            Strategy::PerChannelPort => Self::new(
                mono_slots(shape.fields(Direction::Inputs), dynamic_inputs),
                mono_slots(shape.fields(Direction::Outputs), dynamic_outputs),
            ),
            Strategy::PerBusPort => Self::new(
                bus_slots(shape.fields(Direction::Inputs), negotiation.inputs),
                bus_slots(shape.fields(Direction::Outputs), negotiation.outputs),
            ),
            _ => Self::main(negotiation),
        }
    }

    /// Slot backing the `index`-th input field of `role`.
    pub fn input(&self, role: BusRole, index: usize) -> Option<&CachedBusInfo> {
        self.inputs.iter().find(|b| b.role == role && b.index == index)
    }

    /// Slot backing the `index`-th output field of `role`.
    pub fn output(&self, role: BusRole, index: usize) -> Option<&CachedBusInfo> {
        self.outputs.iter().find(|b| b.role == role && b.index == index)
    }

    /// Host input channels this layout reads.
    pub fn total_input_channels(&self) -> usize {
        self.inputs.iter().map(CachedBusInfo::end).max().unwrap_or(0)
    }

    /// Host output channels this layout writes.
    pub fn total_output_channels(&self) -> usize {
        self.outputs.iter().map(CachedBusInfo::end).max().unwrap_or(0)
    }

    /// Whether a host offering `available` output channels can back every
    /// output slot.
    pub fn fits_outputs(&self, available: usize) -> bool {
        self.total_output_channels() <= available
    }

    /// Check the layout against [`MAX_BUSES`] and [`MAX_CHANNELS`].
    ///
    /// Returns `Ok(())` if valid, or `Err` with a descriptive message.
    pub fn validate(&self) -> Result<(), String> {
        for (direction, slots) in [("input", &self.inputs), ("output", &self.outputs)] {
            if slots.len() > MAX_BUSES {
                return Err(format!(
                    "{} {} slots, but MAX_BUSES is {}",
                    slots.len(),
                    direction,
                    MAX_BUSES
                ));
            }
            let total = slots.iter().map(CachedBusInfo::end).max().unwrap_or(0);
            if total > MAX_CHANNELS {
                return Err(format!(
                    "{} {} channels, but MAX_CHANNELS is {}",
                    total, direction, MAX_CHANNELS
                ));
            }
        }
        Ok(())
    }
}

/// Static channel ports and dynamic collections, one after another in
/// declaration order.
fn mono_slots(fields: &[FieldDescriptor], dynamic_sizes: &[usize]) -> Vec<CachedBusInfo> {
    let channels = FieldIndexMap::new(fields, is_audio_channel);
    let collections = FieldIndexMap::new(fields, is_dynamic_audio);

    let mut slots = Vec::with_capacity(channels.len() + collections.len());
    let mut start = 0;
    for field in 0..fields.len() {
        if let Some(index) = channels.index_of(field) {
            slots.push(CachedBusInfo::new(BusRole::Channel, index, start, 1));
            start += 1;
        } else if let Some(index) = collections.index_of(field) {
            let count = dynamic_sizes.get(index).copied().unwrap_or(0);
            slots.push(CachedBusInfo::new(BusRole::DynamicChannels, index, start, count));
            start += count;
        }
    }
    slots
}

/// Buses in declaration order. Fixed buses take their width; the first
/// dynamic bus takes what is left of `total`, later ones get nothing.
fn bus_slots(fields: &[FieldDescriptor], total: usize) -> Vec<CachedBusInfo> {
    let fixed: usize = fields
        .iter()
        .map(|f| match f.kind {
            FieldKind::AudioBus(BusChannels::Fixed(n)) => n,
            _ => 0,
        })
        .sum();
    let mut remainder = total.saturating_sub(fixed);

    let mut slots = Vec::new();
    let mut start = 0;
    for (index, field) in fields.iter().filter(|f| is_audio_bus(f)).enumerate() {
        let count = match field.kind {
            FieldKind::AudioBus(BusChannels::Fixed(n)) => n,
            _ => std::mem::take(&mut remainder),
        };
        slots.push(CachedBusInfo::new(BusRole::Bus, index, start, count));
        start += count;
    }
    slots
}
