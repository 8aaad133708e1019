//! Gain - the simplest conform component.
//!
//! One linear gain control and a per-channel entry point taking plain
//! slices. The adapter creates one `Gain` per host channel, so the
//! component never sees more than one channel at a time.

use conform::prelude::*;

// =============================================================================
// Gain Component
// =============================================================================

/// Multiplies every sample by the `gain` control.
#[derive(Debug, Default)]
pub struct Gain;

impl Gain {
    /// Linear gain; unity by default.
    pub const GAIN: ControlSpec = ControlSpec::new(1.0, 0.0, 2.0);

    fn run(&mut self, input: &[f32], output: &mut [f32], ports: &mut Ports, _tick: &Tick) {
        let gain = ports.control(0).unwrap_or(1.0) as f32;
        for (i, o) in input.iter().zip(output.iter_mut()) {
            *o = *i * gain;
        }
    }
}

impl Component for Gain {
    type Sample = f32;

    fn shape() -> ComponentShape<Self> {
        ComponentShape::new("gain")
            .input(FieldDescriptor::control("gain", Self::GAIN))
            .entry(Entry::ChannelArg(Gain::run))
    }

    fn create() -> Self {
        Gain
    }
}
