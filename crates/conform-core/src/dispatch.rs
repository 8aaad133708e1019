//! Dispatch strategy selection.
//!
//! The catalog is closed: six ways to call a component, checked in priority
//! order (argument-based before port-based, per-sample before per-channel
//! before per-bus), each optionally replicated per voice. [`resolve`] picks
//! exactly one for a shape or rejects it.

use serde::{Deserialize, Serialize};

use crate::component::Component;
use crate::error::ShapeError;
use crate::predicates::{
    has_audio_bus_ports, has_audio_channel_ports, has_audio_sample_ports, is_audio_sample,
    is_per_bus_arg, is_per_bus_port, is_per_channel_arg, is_per_channel_port, is_per_sample_arg,
    is_per_sample_port,
};
use crate::shape::{ComponentShape, EntryKind};

/// One way of calling a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    PerSampleArg,
    PerSamplePort,
    PerChannelArg,
    PerChannelPort,
    PerBusArg,
    PerBusPort,
}

impl Strategy {
    /// The catalog in priority order.
    pub const ALL: [Strategy; 6] = [
        Strategy::PerSampleArg,
        Strategy::PerSamplePort,
        Strategy::PerChannelArg,
        Strategy::PerChannelPort,
        Strategy::PerBusArg,
        Strategy::PerBusPort,
    ];

    /// Whether `shape` has this strategy's shape.
    pub fn matches<C: Component>(self, shape: &ComponentShape<C>) -> bool {
        match self {
            Self::PerSampleArg => is_per_sample_arg(shape),
            Self::PerSamplePort => is_per_sample_port(shape),
            Self::PerChannelArg => is_per_channel_arg(shape),
            Self::PerChannelPort => is_per_channel_port(shape),
            Self::PerBusArg => is_per_bus_arg(shape),
            Self::PerBusPort => is_per_bus_port(shape),
        }
    }

    /// Entry point kind this strategy calls.
    pub const fn entry_kind(self) -> EntryKind {
        match self {
            Self::PerSampleArg => EntryKind::SampleArg,
            Self::PerChannelArg => EntryKind::ChannelArg,
            Self::PerBusArg => EntryKind::BusArg,
            Self::PerSamplePort | Self::PerChannelPort | Self::PerBusPort => EntryKind::Ports,
        }
    }

    pub const fn is_argument_based(self) -> bool {
        matches!(self, Self::PerSampleArg | Self::PerChannelArg | Self::PerBusArg)
    }

    /// Called once per frame rather than once per block.
    pub const fn is_per_sample(self) -> bool {
        matches!(self, Self::PerSampleArg | Self::PerSamplePort)
    }

    /// Whether one instance is created per channel for `shape`.
    ///
    /// Argument-based per-sample and per-channel shapes are mono by
    /// construction; a per-sample port shape is mono when it has at most one
    /// sample input and one sample output.
    pub fn replicates_per_channel<C: Component>(self, shape: &ComponentShape<C>) -> bool {
        match self {
            Self::PerSampleArg | Self::PerChannelArg => true,
            Self::PerSamplePort => {
                shape.inputs.iter().filter(|f| is_audio_sample(f)).count() <= 1
                    && shape.outputs.iter().filter(|f| is_audio_sample(f)).count() <= 1
            }
            _ => false,
        }
    }
}

/// The resolved way to drive a component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "voices", content = "strategy", rename_all = "snake_case")]
pub enum Dispatch {
    Mono(Strategy),
    /// The strategy replicated per voice, outputs summed.
    Polyphonic(Strategy),
}

impl Dispatch {
    pub const fn strategy(self) -> Strategy {
        match self {
            Self::Mono(s) | Self::Polyphonic(s) => s,
        }
    }

    pub const fn is_polyphonic(self) -> bool {
        matches!(self, Self::Polyphonic(_))
    }
}

/// Strategies whose shape `shape` has, in priority order.
pub fn candidates<C: Component>(shape: &ComponentShape<C>) -> Vec<Strategy> {
    Strategy::ALL.into_iter().filter(|s| s.matches(shape)).collect()
}

/// Select the single strategy for a shape.
///
/// Fails when nothing matches, or when the winning priority level is
/// ambiguous: several entry points of the winning kind, or a port entry
/// whose audio fields mix sample, channel and bus ports.
pub fn resolve<C: Component>(shape: &ComponentShape<C>) -> Result<Dispatch, ShapeError> {
    let Some(winner) = Strategy::ALL.into_iter().find(|s| s.matches(shape)) else {
        return Err(ShapeError::NoMatchingStrategy {
            component: shape.name,
        });
    };

    if shape.entries_of(winner.entry_kind()).count() > 1 {
        return Err(ShapeError::AmbiguousStrategy {
            component: shape.name,
            candidates: vec![winner],
            reason: "several entry points with the same signature",
        });
    }

    if !winner.is_argument_based() {
        let audio_kinds = [
            (Strategy::PerSamplePort, has_audio_sample_ports(shape)),
            (Strategy::PerChannelPort, has_audio_channel_ports(shape)),
            (Strategy::PerBusPort, has_audio_bus_ports(shape)),
        ];
        let mixed: Vec<Strategy> = audio_kinds
            .into_iter()
            .filter(|(_, present)| *present)
            .map(|(s, _)| s)
            .collect();
        if mixed.len() > 1 {
            return Err(ShapeError::AmbiguousStrategy {
                component: shape.name,
                candidates: mixed,
                reason: "audio ports mix sample, channel and bus kinds",
            });
        }
    }

    Ok(if shape.polyphonic {
        Dispatch::Polyphonic(winner)
    } else {
        Dispatch::Mono(winner)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::tests::Probe;
    use crate::shape::{ControlSpec, Entry, FieldDescriptor};

    #[test]
    fn test_priority_argument_before_ports() {
        let shape = ComponentShape::<Probe>::new("both")
            .input(FieldDescriptor::channel("in"))
            .output(FieldDescriptor::channel("out"))
            .entry(Entry::Ports(Probe::ports))
            .entry(Entry::BusArg(Probe::bus));
        assert_eq!(resolve(&shape), Ok(Dispatch::Mono(Strategy::PerBusArg)));
        assert_eq!(
            candidates(&shape),
            vec![Strategy::PerChannelPort, Strategy::PerBusArg]
        );
    }

    #[test]
    fn test_priority_sample_before_channel() {
        let shape = ComponentShape::<Probe>::new("args")
            .entry(Entry::ChannelArg(Probe::run))
            .entry(Entry::SampleArg(Probe::sample));
        assert_eq!(resolve(&shape), Ok(Dispatch::Mono(Strategy::PerSampleArg)));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let first = resolve(&Probe::shape());
        for _ in 0..10 {
            assert_eq!(resolve(&Probe::shape()), first);
        }
        assert_eq!(first, Ok(Dispatch::Mono(Strategy::PerChannelArg)));
    }

    #[test]
    fn test_zero_matches_rejected() {
        let shape = ComponentShape::<Probe>::new("inert")
            .input(FieldDescriptor::control("x", ControlSpec::new(0.0, 0.0, 1.0)));
        assert_eq!(
            resolve(&shape),
            Err(ShapeError::NoMatchingStrategy { component: "inert" })
        );
    }

    #[test]
    fn test_duplicate_signatures_rejected() {
        let shape = ComponentShape::<Probe>::new("twice")
            .entry(Entry::ChannelArg(Probe::run))
            .entry(Entry::ChannelArg(Probe::run));
        assert!(matches!(
            resolve(&shape),
            Err(ShapeError::AmbiguousStrategy { ref candidates, .. }) if candidates == &[Strategy::PerChannelArg]
        ));
    }

    #[test]
    fn test_mixed_audio_ports_rejected() {
        let shape = ComponentShape::<Probe>::new("mixed")
            .input(FieldDescriptor::sample("s"))
            .output(FieldDescriptor::bus("main", 2))
            .entry(Entry::Ports(Probe::ports));
        assert_eq!(
            resolve(&shape),
            Err(ShapeError::AmbiguousStrategy {
                component: "mixed",
                candidates: vec![Strategy::PerSamplePort, Strategy::PerBusPort],
                reason: "audio ports mix sample, channel and bus kinds",
            })
        );
    }

    #[test]
    fn test_event_only_port_shape_is_per_bus() {
        let shape = ComponentShape::<Probe>::new("midi")
            .input(FieldDescriptor::midi("in"))
            .entry(Entry::Ports(Probe::ports));
        assert_eq!(resolve(&shape), Ok(Dispatch::Mono(Strategy::PerBusPort)));
    }

    #[test]
    fn test_polyphonic_variant() {
        let shape = ComponentShape::<Probe>::new("voice")
            .entry(Entry::ChannelArg(Probe::run))
            .polyphonic();
        let dispatch = resolve(&shape);
        assert_eq!(dispatch, Ok(Dispatch::Polyphonic(Strategy::PerChannelArg)));
        assert!(dispatch.map(Dispatch::is_polyphonic).unwrap_or(false));
    }

    #[test]
    fn test_replication() {
        let mono = ComponentShape::<Probe>::new("mono")
            .input(FieldDescriptor::sample("in"))
            .output(FieldDescriptor::sample("out"))
            .entry(Entry::Ports(Probe::ports));
        assert!(Strategy::PerSamplePort.replicates_per_channel(&mono));

        let stereo = mono.clone().output(FieldDescriptor::sample("right"));
        assert!(!Strategy::PerSamplePort.replicates_per_channel(&stereo));
        assert!(Strategy::PerChannelArg.replicates_per_channel(&stereo));
        assert!(!Strategy::PerBusPort.replicates_per_channel(&stereo));
    }
}
