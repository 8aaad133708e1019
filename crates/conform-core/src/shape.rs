//! Declarative component shapes.
//!
//! A [`ComponentShape`] is the structural description of a component type:
//! its ordered input, output and message fields, explicit channel metadata,
//! whether it is polyphonic, and the entry point(s) it exposes. Shapes are
//! built by [`Component::shape`](crate::Component::shape) without an
//! instance and never change for the lifetime of the type.
//!
//! # Example
//!
//! ```ignore
//! fn shape() -> ComponentShape<Self> {
//!     ComponentShape::new("gain")
//!         .input(FieldDescriptor::control("gain", ControlSpec::new(1.0, 0.0, 2.0)))
//!         .entry(Entry::ChannelArg(Self::run))
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::buffer::{Channels, ChannelsMut};
use crate::component::Component;
use crate::ports::{AudioPorts, Ports};
use crate::tick::Tick;

// =============================================================================
// Field kinds
// =============================================================================

/// Range and initial value of a control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlSpec {
    /// Value before the host sends anything. `None` means the control has no
    /// known value until its first event.
    pub init: Option<f64>,
    pub min: f64,
    pub max: f64,
    /// Changes are delivered with frame offsets instead of once per tick.
    pub sample_accurate: bool,
}

impl ControlSpec {
    pub const fn new(init: f64, min: f64, max: f64) -> Self {
        Self {
            init: Some(init),
            min,
            max,
            sample_accurate: false,
        }
    }

    /// A control with no initial value.
    pub const fn uninitialized(min: f64, max: f64) -> Self {
        Self {
            init: None,
            min,
            max,
            sample_accurate: false,
        }
    }

    pub const fn sample_accurate(mut self) -> Self {
        self.sample_accurate = true;
        self
    }

    /// Declared initial value, or the range minimum when there is none.
    pub fn default_value(&self) -> f64 {
        self.init.unwrap_or(self.min)
    }
}

/// Channel count of an audio bus field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusChannels {
    Fixed(usize),
    /// Takes whatever the host provides.
    Dynamic,
}

/// Element type of a dynamic collection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicKind {
    Controls(ControlSpec),
    /// Mono audio channels.
    AudioChannels,
}

/// What a field is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Control(ControlSpec),
    /// One sample per frame.
    AudioSample,
    /// One mono channel buffer.
    AudioChannel,
    AudioBus(BusChannels),
    Midi,
    Callback,
    Dynamic(DynamicKind),
    Message { arity: usize },
}

/// One declared field of a component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }

    pub const fn control(name: &'static str, spec: ControlSpec) -> Self {
        Self::new(name, FieldKind::Control(spec))
    }

    pub const fn sample(name: &'static str) -> Self {
        Self::new(name, FieldKind::AudioSample)
    }

    pub const fn channel(name: &'static str) -> Self {
        Self::new(name, FieldKind::AudioChannel)
    }

    pub const fn bus(name: &'static str, channels: usize) -> Self {
        Self::new(name, FieldKind::AudioBus(BusChannels::Fixed(channels)))
    }

    pub const fn dynamic_bus(name: &'static str) -> Self {
        Self::new(name, FieldKind::AudioBus(BusChannels::Dynamic))
    }

    pub const fn midi(name: &'static str) -> Self {
        Self::new(name, FieldKind::Midi)
    }

    pub const fn callback(name: &'static str) -> Self {
        Self::new(name, FieldKind::Callback)
    }

    pub const fn dynamic_controls(name: &'static str, spec: ControlSpec) -> Self {
        Self::new(name, FieldKind::Dynamic(DynamicKind::Controls(spec)))
    }

    pub const fn dynamic_channels(name: &'static str) -> Self {
        Self::new(name, FieldKind::Dynamic(DynamicKind::AudioChannels))
    }

    pub const fn message(name: &'static str, arity: usize) -> Self {
        Self::new(name, FieldKind::Message { arity })
    }
}

/// Which field list of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Inputs,
    Outputs,
    Messages,
}

/// Explicit channel counts declared by the component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelMetadata {
    pub inputs: Option<usize>,
    pub outputs: Option<usize>,
}

// =============================================================================
// Entry points
// =============================================================================

/// `fn(&mut C, input, &mut Ports) -> output`, once per frame and channel.
pub type SampleArgFn<C> =
    fn(&mut C, <C as Component>::Sample, &mut Ports) -> <C as Component>::Sample;

/// `fn(&mut C, input, output, &mut Ports, &Tick)`, once per channel.
pub type ChannelArgFn<C> = fn(
    &mut C,
    &[<C as Component>::Sample],
    &mut [<C as Component>::Sample],
    &mut Ports,
    &Tick,
);

/// `fn(&mut C, inputs, outputs, &mut Ports, &Tick)`, all channels at once.
pub type BusArgFn<C> = fn(
    &mut C,
    &Channels<'_, <C as Component>::Sample>,
    &mut ChannelsMut<'_, '_, <C as Component>::Sample>,
    &mut Ports,
    &Tick,
);

/// `fn(&mut C, &mut Ports, audio, &Tick)`; audio lives in declared port fields.
pub type PortFn<C> =
    fn(&mut C, &mut Ports, &mut AudioPorts<'_, '_, <C as Component>::Sample>, &Tick);

/// An entry point a component exposes.
pub enum Entry<C: Component> {
    SampleArg(SampleArgFn<C>),
    ChannelArg(ChannelArgFn<C>),
    BusArg(BusArgFn<C>),
    Ports(PortFn<C>),
}

impl<C: Component> Entry<C> {
    pub fn kind(&self) -> EntryKind {
        match self {
            Self::SampleArg(_) => EntryKind::SampleArg,
            Self::ChannelArg(_) => EntryKind::ChannelArg,
            Self::BusArg(_) => EntryKind::BusArg,
            Self::Ports(_) => EntryKind::Ports,
        }
    }
}

impl<C: Component> Clone for Entry<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: Component> Copy for Entry<C> {}

impl<C: Component> fmt::Debug for Entry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entry::{:?}", self.kind())
    }
}

/// Argument signature of an entry point, without the function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    SampleArg,
    ChannelArg,
    BusArg,
    Ports,
}

// =============================================================================
// ComponentShape
// =============================================================================

/// Structural description of a component type.
pub struct ComponentShape<C: Component> {
    /// Display name, used in logs, errors and reports.
    pub name: &'static str,
    pub inputs: Vec<FieldDescriptor>,
    pub outputs: Vec<FieldDescriptor>,
    pub messages: Vec<FieldDescriptor>,
    pub entries: Vec<Entry<C>>,
    pub channels: ChannelMetadata,
    pub polyphonic: bool,
}

impl<C: Component> ComponentShape<C> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inputs: Vec::new(),
            outputs: Vec::new(),
            messages: Vec::new(),
            entries: Vec::new(),
            channels: ChannelMetadata::default(),
            polyphonic: false,
        }
    }

    pub fn input(mut self, field: FieldDescriptor) -> Self {
        self.inputs.push(field);
        self
    }

    pub fn output(mut self, field: FieldDescriptor) -> Self {
        self.outputs.push(field);
        self
    }

    pub fn message(mut self, field: FieldDescriptor) -> Self {
        self.messages.push(field);
        self
    }

    pub fn entry(mut self, entry: Entry<C>) -> Self {
        self.entries.push(entry);
        self
    }

    /// Declare the same explicit channel count for inputs and outputs.
    pub fn channels(mut self, count: usize) -> Self {
        self.channels = ChannelMetadata {
            inputs: Some(count),
            outputs: Some(count),
        };
        self
    }

    pub fn input_channels(mut self, count: usize) -> Self {
        self.channels.inputs = Some(count);
        self
    }

    pub fn output_channels(mut self, count: usize) -> Self {
        self.channels.outputs = Some(count);
        self
    }

    pub fn polyphonic(mut self) -> Self {
        self.polyphonic = true;
        self
    }

    /// The field list for a direction.
    pub fn fields(&self, direction: Direction) -> &[FieldDescriptor] {
        match direction {
            Direction::Inputs => &self.inputs,
            Direction::Outputs => &self.outputs,
            Direction::Messages => &self.messages,
        }
    }

    /// Entry points of one kind, in declaration order.
    pub fn entries_of(&self, kind: EntryKind) -> impl Iterator<Item = &Entry<C>> + '_ {
        self.entries.iter().filter(move |e| e.kind() == kind)
    }

    /// Check descriptors for things no strategy can bind.
    pub fn validate(&self) -> Result<(), crate::ShapeError> {
        let invalid = |field: &'static str, reason: String| crate::ShapeError::InvalidField {
            component: self.name,
            field,
            reason,
        };

        for direction in [Direction::Inputs, Direction::Outputs, Direction::Messages] {
            let fields = self.fields(direction);
            for (i, field) in fields.iter().enumerate() {
                if field.name.is_empty() {
                    return Err(invalid("", format!("{direction:?} field {i} has no name")));
                }
                if fields[..i].iter().any(|f| f.name == field.name) {
                    return Err(invalid(field.name, format!("duplicate name in {direction:?}")));
                }
                let is_message = matches!(field.kind, FieldKind::Message { .. });
                if is_message != (direction == Direction::Messages) {
                    return Err(invalid(
                        field.name,
                        "messages must be declared as messages and only there".into(),
                    ));
                }
                match field.kind {
                    FieldKind::Control(spec)
                    | FieldKind::Dynamic(DynamicKind::Controls(spec)) => {
                        if !(spec.min <= spec.max) {
                            return Err(invalid(
                                field.name,
                                format!("range [{}, {}] is empty", spec.min, spec.max),
                            ));
                        }
                    }
                    FieldKind::AudioBus(BusChannels::Fixed(0)) => {
                        return Err(invalid(field.name, "fixed bus with zero channels".into()));
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

impl<C: Component> Clone for ComponentShape<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            messages: self.messages.clone(),
            entries: self.entries.clone(),
            channels: self.channels,
            polyphonic: self.polyphonic,
        }
    }
}

impl<C: Component> fmt::Debug for ComponentShape<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentShape")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("messages", &self.messages)
            .field("entries", &self.entries)
            .field("channels", &self.channels)
            .field("polyphonic", &self.polyphonic)
            .finish()
    }
}
