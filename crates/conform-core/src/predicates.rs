//! Capability predicates over component shapes.
//!
//! Every predicate is a pure, total function of the declaration. Field-level
//! predicates take a [`FieldDescriptor`] and are what the
//! [enumerator](crate::enumerate) filters with; shape-level predicates take
//! a whole [`ComponentShape`] and feed dispatch resolution.

use crate::component::Component;
use crate::shape::{BusChannels, ComponentShape, DynamicKind, EntryKind, FieldDescriptor, FieldKind};

// =============================================================================
// Field-level
// =============================================================================

/// A single control value, sample-accurate or not.
pub fn is_control(field: &FieldDescriptor) -> bool {
    matches!(field.kind, FieldKind::Control(_))
}

pub fn is_sample_accurate(field: &FieldDescriptor) -> bool {
    matches!(field.kind, FieldKind::Control(spec) if spec.sample_accurate)
}

pub fn is_audio_sample(field: &FieldDescriptor) -> bool {
    matches!(field.kind, FieldKind::AudioSample)
}

pub fn is_audio_channel(field: &FieldDescriptor) -> bool {
    matches!(field.kind, FieldKind::AudioChannel)
}

pub fn is_audio_bus(field: &FieldDescriptor) -> bool {
    matches!(field.kind, FieldKind::AudioBus(_))
}

pub fn is_fixed_bus(field: &FieldDescriptor) -> bool {
    matches!(field.kind, FieldKind::AudioBus(BusChannels::Fixed(_)))
}

pub fn is_dynamic_bus(field: &FieldDescriptor) -> bool {
    matches!(field.kind, FieldKind::AudioBus(BusChannels::Dynamic))
}

pub fn is_midi(field: &FieldDescriptor) -> bool {
    matches!(field.kind, FieldKind::Midi)
}

pub fn is_callback(field: &FieldDescriptor) -> bool {
    matches!(field.kind, FieldKind::Callback)
}

/// Any resizable collection.
pub fn is_dynamic_ports(field: &FieldDescriptor) -> bool {
    matches!(field.kind, FieldKind::Dynamic(_))
}

/// A resizable collection of mono audio channels.
pub fn is_dynamic_audio(field: &FieldDescriptor) -> bool {
    matches!(field.kind, FieldKind::Dynamic(DynamicKind::AudioChannels))
}

/// A resizable collection of controls.
pub fn is_dynamic_controls(field: &FieldDescriptor) -> bool {
    matches!(field.kind, FieldKind::Dynamic(DynamicKind::Controls(_)))
}

pub fn is_message(field: &FieldDescriptor) -> bool {
    matches!(field.kind, FieldKind::Message { .. })
}

/// Mono channel shaped: a static channel port or a dynamic channel collection.
pub fn is_mono_channel(field: &FieldDescriptor) -> bool {
    is_audio_channel(field) || is_dynamic_audio(field)
}

/// Carries audio in any form.
pub fn is_audio(field: &FieldDescriptor) -> bool {
    is_audio_sample(field) || is_mono_channel(field) || is_audio_bus(field)
}

// =============================================================================
// Shape-level
// =============================================================================

fn any_field<C: Component>(shape: &ComponentShape<C>, predicate: fn(&FieldDescriptor) -> bool) -> bool {
    shape.inputs.iter().chain(&shape.outputs).any(predicate)
}

fn has_entry<C: Component>(shape: &ComponentShape<C>, kind: EntryKind) -> bool {
    shape.entries.iter().any(|e| e.kind() == kind)
}

pub fn has_sample_arg<C: Component>(shape: &ComponentShape<C>) -> bool {
    has_entry(shape, EntryKind::SampleArg)
}

pub fn has_channel_arg<C: Component>(shape: &ComponentShape<C>) -> bool {
    has_entry(shape, EntryKind::ChannelArg)
}

pub fn has_bus_arg<C: Component>(shape: &ComponentShape<C>) -> bool {
    has_entry(shape, EntryKind::BusArg)
}

pub fn has_port_entry<C: Component>(shape: &ComponentShape<C>) -> bool {
    has_entry(shape, EntryKind::Ports)
}

pub fn has_audio_sample_ports<C: Component>(shape: &ComponentShape<C>) -> bool {
    any_field(shape, is_audio_sample)
}

/// Static channel ports or dynamic channel collections.
pub fn has_audio_channel_ports<C: Component>(shape: &ComponentShape<C>) -> bool {
    any_field(shape, is_mono_channel)
}

pub fn has_audio_bus_ports<C: Component>(shape: &ComponentShape<C>) -> bool {
    any_field(shape, is_audio_bus)
}

pub fn has_audio_ports<C: Component>(shape: &ComponentShape<C>) -> bool {
    any_field(shape, is_audio)
}

pub fn has_dynamic_ports<C: Component>(shape: &ComponentShape<C>) -> bool {
    any_field(shape, is_dynamic_ports)
}

pub fn has_sample_accurate_inputs<C: Component>(shape: &ComponentShape<C>) -> bool {
    shape.inputs.iter().any(is_sample_accurate)
}

pub fn has_explicit_channels<C: Component>(shape: &ComponentShape<C>) -> bool {
    shape.channels.inputs.is_some() || shape.channels.outputs.is_some()
}

pub fn is_polyphonic<C: Component>(shape: &ComponentShape<C>) -> bool {
    shape.polyphonic
}

// =============================================================================
// Dispatch shapes, in priority order
// =============================================================================

pub fn is_per_sample_arg<C: Component>(shape: &ComponentShape<C>) -> bool {
    has_sample_arg(shape)
}

pub fn is_per_sample_port<C: Component>(shape: &ComponentShape<C>) -> bool {
    has_port_entry(shape) && has_audio_sample_ports(shape)
}

pub fn is_per_channel_arg<C: Component>(shape: &ComponentShape<C>) -> bool {
    has_channel_arg(shape)
}

pub fn is_per_channel_port<C: Component>(shape: &ComponentShape<C>) -> bool {
    has_port_entry(shape) && has_audio_channel_ports(shape)
}

pub fn is_per_bus_arg<C: Component>(shape: &ComponentShape<C>) -> bool {
    has_bus_arg(shape)
}

/// Bus ports, or a port entry with no audio at all (zero buses).
pub fn is_per_bus_port<C: Component>(shape: &ComponentShape<C>) -> bool {
    has_port_entry(shape) && (has_audio_bus_ports(shape) || !has_audio_ports(shape))
}
