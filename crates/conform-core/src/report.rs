//! Introspection snapshot of a live adapter.

use serde::Serialize;

use crate::channels::{declared_channels, ChannelCount, ChannelNegotiation};
use crate::component::Component;
use crate::dispatch::Dispatch;
use crate::enumerate::{FieldIndexMap, FieldPredicate};
use crate::ports::Ports;
use crate::predicates::{
    is_audio_bus, is_audio_channel, is_audio_sample, is_callback, is_control, is_dynamic_ports, is_message,
    is_midi,
};
use crate::shape::{ComponentShape, Direction, FieldDescriptor, FieldKind};

/// One declared field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldReport {
    pub direction: Direction,
    /// Position in declaration order.
    pub position: usize,
    pub name: &'static str,
    pub kind: FieldKind,
    /// Match index among fields of the same family (the `k` used to address
    /// it through [`Ports`] or `AudioPorts`).
    pub index: Option<usize>,
    /// Current size, for dynamic collections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub len: Option<usize>,
}

/// What the shape declares, before the host is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeclaredChannels {
    pub inputs: ChannelCount,
    pub outputs: ChannelCount,
}

/// Snapshot returned by [`Adapter::report`](crate::Adapter::report).
///
/// Hosts poll this after a tick to pick up dynamic resizes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeReport {
    pub component: &'static str,
    pub dispatch: Dispatch,
    pub fields: Vec<FieldReport>,
    pub declared: DeclaredChannels,
    /// Counts the buffers are allocated for; `None` before `prepare`.
    pub channels: Option<ChannelNegotiation>,
    pub instances: usize,
}

impl ShapeReport {
    pub(crate) fn new<C: Component>(
        shape: &ComponentShape<C>,
        dispatch: Dispatch,
        ports: &Ports,
        channels: Option<ChannelNegotiation>,
        instances: usize,
    ) -> Self {
        let mut fields = Vec::new();
        for direction in [Direction::Inputs, Direction::Outputs, Direction::Messages] {
            describe(shape.fields(direction), direction, ports, &mut fields);
        }

        let declared = |direction| declared_channels(shape, direction, ports.dynamic_audio_sizes(direction)).0;
        Self {
            component: shape.name,
            dispatch,
            fields,
            declared: DeclaredChannels {
                inputs: declared(Direction::Inputs),
                outputs: declared(Direction::Outputs),
            },
            channels,
            instances,
        }
    }

    /// Fields of one direction, in declaration order.
    pub fn fields(&self, direction: Direction) -> impl Iterator<Item = &FieldReport> + '_ {
        self.fields.iter().filter(move |f| f.direction == direction)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn family(kind: &FieldKind) -> FieldPredicate {
    match kind {
        FieldKind::Control(_) => is_control,
        FieldKind::AudioSample => is_audio_sample,
        FieldKind::AudioChannel => is_audio_channel,
        FieldKind::AudioBus(_) => is_audio_bus,
        FieldKind::Midi => is_midi,
        FieldKind::Callback => is_callback,
        FieldKind::Dynamic(_) => is_dynamic_ports,
        FieldKind::Message { .. } => is_message,
    }
}

fn describe(fields: &[FieldDescriptor], direction: Direction, ports: &Ports, out: &mut Vec<FieldReport>) {
    for (position, field) in fields.iter().enumerate() {
        let index = FieldIndexMap::new(fields, family(&field.kind)).index_of(position);
        let len = match (field.kind, index) {
            (FieldKind::Dynamic(_), Some(k)) => ports.dynamic_len(direction, k),
            _ => None,
        };
        out.push(FieldReport {
            direction,
            position,
            name: field.name,
            kind: field.kind,
            index,
            len,
        });
    }
}
