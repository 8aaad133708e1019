//! # Conform
//!
//! Drive arbitrarily shaped processing components from a generic host loop.
//!
//! A component describes itself through [`Component::shape`](prelude::Component::shape);
//! conform picks the one way to call it and handles channel negotiation,
//! precision conversion, sample-accurate events and dynamic ports.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use conform::prelude::*;
//!
//! struct Gain;
//!
//! impl Component for Gain {
//!     type Sample = f32;
//!
//!     fn shape() -> ComponentShape<Self> {
//!         ComponentShape::new("gain")
//!             .input(FieldDescriptor::control("gain", ControlSpec::new(1.0, 0.0, 2.0)))
//!             .entry(Entry::ChannelArg(Gain::run))
//!     }
//!
//!     fn create() -> Self { Gain }
//! }
//!
//! impl Gain {
//!     fn run(&mut self, input: &[f32], output: &mut [f32], ports: &mut Ports, _: &Tick) {
//!         let gain = ports.control(0).unwrap_or(1.0) as f32;
//!         for (o, i) in output.iter_mut().zip(input) {
//!             *o = i * gain;
//!         }
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! let mut adapter = Adapter::<Gain>::new(&mut registry, EngineConfig::new())?;
//! adapter.prepare(ProcessSetup::new(48_000.0, 512));
//! ```

// Re-export the engine
pub use conform_core as core;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use conform::prelude::*;
/// ```
pub mod prelude {
    pub use conform_core::{
        // Declaring components
        BusChannels, Component, ComponentShape, ControlSpec, Direction, Entry, FieldDescriptor,
        // Driving them
        Adapter, EngineConfig, HostBlock, ProcessSetup, Registry, SkipReason, TickOutcome,
        // Inside an entry point
        AudioPorts, Channels, ChannelsMut, Ports, Sample, Tick,
        // Events
        ControlEvent, MergePolicy, MidiEvent, MidiMessage, TimedEvent,
        // Channel counts
        ChannelCount, ChannelNegotiation,
        // Errors
        EngineError, EngineResult, ShapeError,
    };
}
