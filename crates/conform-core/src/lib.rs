//! # conform-core
//!
//! Shape resolution and dispatch for processing components.
//!
//! A component declares its structure once ([`ComponentShape`]): which
//! controls, audio ports, MIDI ports, callbacks and messages it has, how many
//! channels it wants and which entry point the host should call. The engine
//! resolves that description to exactly one [`Strategy`] per component type
//! and an [`Adapter`] then drives the component from a generic host loop,
//! doing the marshalling the strategy needs:
//!
//! ```text
//! host block (f32 or f64, flat channels, events)
//!        ↓
//! channel negotiation → reallocation / skip
//!        ↓
//! precision conversion, bus partitioning, event delivery
//!        ↓
//! the component's entry point (per sample, per channel or per bus)
//! ```
//!
//! Nothing here talks to a plugin API or an audio device; host bindings sit
//! on top of [`Adapter`].

pub mod adapter;
pub mod buffer;
pub mod buffer_storage;
pub mod bus_config;
pub mod channels;
pub mod component;
pub mod config;
pub mod conversion_buffers;
pub mod dispatch;
pub mod dynamic_ports;
pub mod enumerate;
pub mod error;
pub mod events;
pub mod ports;
pub mod predicates;
pub mod registry;
pub mod report;
pub mod sample;
pub mod setup;
pub mod shape;
pub mod tick;
pub mod types;

// Driver
pub use adapter::{Adapter, HostBlock, SkipReason, TickOutcome};
pub use registry::{Registry, Resolution};
pub use report::{DeclaredChannels, FieldReport, ShapeReport};

// Component declaration
pub use component::Component;
pub use shape::{
    BusChannels, ChannelMetadata, ComponentShape, ControlSpec, Direction, DynamicKind, Entry, EntryKind,
    FieldDescriptor, FieldKind,
};

// Resolution
pub use dispatch::{candidates, resolve, Dispatch, Strategy};
pub use enumerate::{FieldIndexMap, FieldMatch, FieldPredicate};

// Channels and buffers
pub use buffer::{Channels, ChannelsMut};
pub use bus_config::{BusLayout, BusRole, CachedBusInfo};
pub use channels::{declared_channels, negotiate, ChannelCount, ChannelNegotiation, ChannelSource};
pub use sample::{Sample, SampleFormat};

// Ports and events
pub use dynamic_ports::{DynamicChannels, DynamicPorts, Resize};
pub use events::{MergePolicy, MergedRow, MergedTimeline, SampleAccurate, TimedEvent};
pub use ports::{AudioPorts, MessageCall, Ports};
pub use types::{ControlEvent, MidiEvent, MidiMessage, MAX_BUSES, MAX_CHANNELS};

// Tick and setup
pub use config::EngineConfig;
pub use setup::ProcessSetup;
pub use tick::{Position, Tick};

// Errors
pub use error::{ConfigError, EngineError, EngineResult, ShapeError};
