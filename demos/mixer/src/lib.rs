//! Mixer - a port-based component with a resizable input collection.
//!
//! The mixer sums however many mono inputs it currently has into one output,
//! scaled by a sample-accurate `level`. The host changes the input count by
//! sending `set_inputs`; the mixer forwards the request to its dynamic ports
//! and the adapter reallocates before the next tick. A peak meter per input
//! and an overall peak callback are reported back to the host.

use conform::core::MAX_CHANNELS;
use conform::prelude::*;

/// Message index of `set_inputs(count)`.
pub const SET_INPUTS: usize = 0;

// =============================================================================
// Mixer Component
// =============================================================================

#[derive(Debug, Default)]
pub struct Mixer;

impl Mixer {
    pub const LEVEL: ControlSpec = ControlSpec::new(1.0, 0.0, 1.0).sample_accurate();
    pub const METER: ControlSpec = ControlSpec::new(0.0, 0.0, 1.0);

    fn run(&mut self, ports: &mut Ports, audio: &mut AudioPorts<'_, '_, f32>, _tick: &Tick) {
        let requested = ports
            .messages()
            .iter()
            .rev()
            .find(|m| m.message == SET_INPUTS)
            .and_then(|m| m.args.first().copied());
        if let Some(count) = requested {
            let count = count.clamp(0.0, MAX_CHANNELS as f64) as usize;
            ports.request_resize(Direction::Inputs, 0, count);
            ports.request_resize(Direction::Outputs, 0, count);
        }

        let inputs = audio.dynamic_in(0);

        if let Some(meters) = ports.dynamic_controls_mut(Direction::Outputs, 0) {
            for (meter, channel) in meters.iter_mut().zip(inputs.iter()) {
                *meter = peak(channel) as f64;
            }
        }

        let level = ports.sample_accurate(0);
        let mut loudest = 0.0f32;
        if let Some(out) = audio.channel_out(0) {
            for (i, o) in out.iter_mut().enumerate() {
                let sum: f32 = inputs.iter().filter_map(|c| c.get(i)).sum();
                let gain = level.and_then(|l| l.value_at(i)).unwrap_or(1.0) as f32;
                *o = sum * gain;
                loudest = loudest.max(o.abs());
            }
        }
        ports.emit(0, loudest as f64);
    }
}

fn peak(channel: &[f32]) -> f32 {
    channel.iter().fold(0.0, |acc, x| acc.max(x.abs()))
}

impl Component for Mixer {
    type Sample = f32;

    fn shape() -> ComponentShape<Self> {
        ComponentShape::new("mixer")
            .input(FieldDescriptor::dynamic_channels("inputs"))
            .input(FieldDescriptor::control("level", Self::LEVEL))
            .output(FieldDescriptor::channel("out"))
            .output(FieldDescriptor::dynamic_controls("meters", Self::METER))
            .output(FieldDescriptor::callback("peak"))
            .message(FieldDescriptor::message("set_inputs", 1))
            .entry(Entry::Ports(Mixer::run))
    }

    fn create() -> Self {
        Mixer
    }
}
