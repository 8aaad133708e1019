//! The per-tick driver.
//!
//! An [`Adapter`] owns every instance of one component type plus all the
//! state needed to call it from a generic host loop: port state, the bus
//! layout, conversion scratch and the adapter's own buffers. Each
//! [`process`](Adapter::process) call
//!
//! 1. negotiates channel counts against what the host offers,
//! 2. reallocates between ticks and skips the tick if the layout changed,
//!    keeping the skipped tick's host events,
//! 3. delivers host events to the ports,
//! 4. calls the resolved entry point the way its strategy requires,
//! 5. closes the tick, applying queued port resizes.
//!
//! # Example
//!
//! ```ignore
//! let mut registry = Registry::new();
//! let mut adapter = Adapter::<Gain>::new(&mut registry, EngineConfig::new())?;
//! adapter.prepare(ProcessSetup::new(48_000.0, 512));
//!
//! let outcome = adapter.process(&Tick::new(frames), HostBlock::new(&inputs, &mut outputs));
//! ```

use crate::buffer::{Channels, ChannelsMut};
use crate::buffer_storage::ProcessBufferStorage;
use crate::bus_config::BusLayout;
use crate::channels::{declared_channels, negotiate, ChannelCount, ChannelNegotiation};
use crate::component::Component;
use crate::config::EngineConfig;
use crate::conversion_buffers::ConversionBuffers;
use crate::dispatch::{Dispatch, Strategy};
use crate::enumerate::count;
use crate::error::{EngineError, EngineResult, ShapeError};
use crate::events::TimedEvent;
use crate::ports::{AppliedResize, AudioPorts, Ports};
use crate::predicates::is_audio_sample;
use crate::registry::Registry;
use crate::report::ShapeReport;
use crate::sample::{cast_inputs, cast_outputs, same_format, Sample};
use crate::setup::ProcessSetup;
use crate::shape::{ComponentShape, Direction, Entry, PortFn};
use crate::tick::Tick;
use crate::types::{ControlEvent, MidiEvent};

// =============================================================================
// Host-facing types
// =============================================================================

/// Buffers and events the host supplies for one tick.
pub struct HostBlock<'h, 'b, H: Sample> {
    pub inputs: &'h [&'h [H]],
    pub outputs: &'h mut [&'b mut [H]],
    pub events: &'h [ControlEvent],
    pub midi: &'h [MidiEvent],
}

impl<'h, 'b, H: Sample> HostBlock<'h, 'b, H> {
    pub fn new(inputs: &'h [&'h [H]], outputs: &'h mut [&'b mut [H]]) -> Self {
        Self {
            inputs,
            outputs,
            events: &[],
            midi: &[],
        }
    }

    pub fn with_events(mut self, events: &'h [ControlEvent]) -> Self {
        self.events = events;
        self
    }

    pub fn with_midi(mut self, midi: &'h [MidiEvent]) -> Self {
        self.midi = midi;
        self
    }
}

/// Why a tick was not processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Channel counts or block size changed; buffers were reallocated and
    /// the next tick is processed normally.
    Reallocated {
        requested: ChannelNegotiation,
        frames: usize,
    },
    /// The host offers fewer output channels than the layout writes.
    OutputUnavailable { required: usize, available: usize },
    /// The layout exceeds the engine's channel or bus limits.
    InvalidLayout,
}

/// Result of one [`Adapter::process`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Processed,
    /// Nothing was written to the host's buffers.
    Skipped(SkipReason),
}

impl TickOutcome {
    #[inline]
    pub fn is_processed(&self) -> bool {
        matches!(self, Self::Processed)
    }
}

// =============================================================================
// Adapter
// =============================================================================

/// Drives every instance of one component type.
pub struct Adapter<C: Component> {
    shape: ComponentShape<C>,
    entry: Entry<C>,
    dispatch: Dispatch,
    config: EngineConfig,
    setup: ProcessSetup,
    /// Setup the surviving instances were last prepared with.
    prepared: Option<ProcessSetup>,
    instances: Vec<C>,
    /// Instances per voice.
    replicas: usize,
    ports: Ports,
    conversion: ConversionBuffers<C::Sample>,
    storage: ProcessBufferStorage<C::Sample>,
    layout: BusLayout,
    layout_valid: bool,
    allocated: Option<ChannelNegotiation>,
    host_inputs: ChannelCount,
    host_outputs: ChannelCount,
    max_frames: usize,
}

impl<C: Component> Adapter<C> {
    /// Resolve `C` through `registry` and build an unprepared adapter.
    pub fn new(registry: &mut Registry, config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let resolution = registry.register::<C>()?;
        let shape = C::shape();
        let entry = shape
            .entries_of(resolution.dispatch.strategy().entry_kind())
            .next()
            .copied()
            .ok_or(EngineError::Shape(ShapeError::NoMatchingStrategy {
                component: shape.name,
            }))?;
        let ports = Ports::new(&shape, config.merge_policy);

        Ok(Self {
            entry,
            dispatch: resolution.dispatch,
            setup: ProcessSetup::new(config.sample_rate, config.max_frames),
            prepared: None,
            instances: Vec::new(),
            replicas: 0,
            ports,
            conversion: ConversionBuffers::new(),
            storage: ProcessBufferStorage::new(),
            layout: BusLayout::default(),
            layout_valid: true,
            allocated: None,
            host_inputs: ChannelCount::Undefined,
            host_outputs: ChannelCount::Undefined,
            max_frames: config.max_frames,
            config,
            shape,
        })
    }

    /// Allocate for `setup` and prepare every instance.
    ///
    /// Channel counts left undefined in `setup` are negotiated from the
    /// shape, falling back to [`EngineConfig::default_channels`].
    pub fn prepare(&mut self, setup: ProcessSetup) {
        self.setup = setup;
        self.host_inputs = setup.input_channels;
        self.host_outputs = setup.output_channels;
        self.max_frames = setup.max_frames.max(1);
        let negotiation = self.negotiate(self.host_inputs, self.host_outputs);
        self.reallocate(negotiation, true);
    }

    /// Run one tick.
    ///
    /// Never fails: a tick that cannot be served is skipped without touching
    /// the host's buffers, and the reason is returned.
    pub fn process<H: Sample>(&mut self, tick: &Tick, block: HostBlock<'_, '_, H>) -> TickOutcome {
        let host_inputs = ChannelCount::Defined(block.inputs.len());
        let host_outputs = ChannelCount::Defined(block.outputs.len());
        let requested = self.negotiate(host_inputs, host_outputs);

        if self.allocated != Some(requested) || tick.frames > self.max_frames {
            log::debug!(
                "{}: skipping tick, reallocating from {:?} to {:?} ({} frames)",
                self.shape.name,
                self.allocated,
                requested,
                tick.frames
            );
            self.host_inputs = host_inputs;
            self.host_outputs = host_outputs;
            self.max_frames = self.max_frames.max(tick.frames);
            self.ports.absorb_skipped(block.events, block.midi);
            self.reallocate(requested, false);
            return TickOutcome::Skipped(SkipReason::Reallocated {
                requested,
                frames: tick.frames,
            });
        }

        if !self.layout_valid {
            return TickOutcome::Skipped(SkipReason::InvalidLayout);
        }

        let required = self.layout.total_output_channels();
        if !self.layout.fits_outputs(block.outputs.len()) {
            log::warn!(
                "{}: host offers {} output channels, layout needs {}; skipping tick",
                self.shape.name,
                block.outputs.len(),
                required
            );
            return TickOutcome::Skipped(SkipReason::OutputUnavailable {
                required,
                available: block.outputs.len(),
            });
        }

        self.ports.begin_tick(block.events, block.midi);
        self.render(tick, requested, block.inputs, block.outputs);
        let resizes = self.ports.end_tick();
        if !resizes.is_empty() {
            self.apply_resizes(&resizes);
        }
        TickOutcome::Processed
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn dispatch(&self) -> Dispatch {
        self.dispatch
    }

    pub fn shape(&self) -> &ComponentShape<C> {
        &self.shape
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Channel counts the buffers are currently allocated for.
    pub fn negotiation(&self) -> Option<ChannelNegotiation> {
        self.allocated
    }

    pub fn layout(&self) -> &BusLayout {
        &self.layout
    }

    pub fn ports(&self) -> &Ports {
        &self.ports
    }

    pub fn ports_mut(&mut self) -> &mut Ports {
        &mut self.ports
    }

    /// All replicas, voice-major.
    pub fn instances(&self) -> &[C] {
        &self.instances
    }

    pub fn instances_mut(&mut self) -> &mut [C] {
        &mut self.instances
    }

    /// Changes the component wrote to its `index`-th sample-accurate output
    /// during the last tick.
    pub fn output_events(&self, index: usize) -> impl Iterator<Item = TimedEvent<f64>> + '_ {
        self.ports.output_events(index)
    }

    /// Queue a call of the component's `index`-th message for the next tick.
    pub fn send_message(&mut self, index: usize, args: &[f64]) -> bool {
        self.ports.queue_message(index, args)
    }

    /// Current introspection snapshot.
    pub fn report(&self) -> ShapeReport {
        ShapeReport::new(
            &self.shape,
            self.dispatch,
            &self.ports,
            self.allocated,
            self.instances.len(),
        )
    }

    // -------------------------------------------------------------------------
    // Between ticks
    // -------------------------------------------------------------------------

    fn negotiate(&self, host_inputs: ChannelCount, host_outputs: ChannelCount) -> ChannelNegotiation {
        let (inputs, _) = declared_channels(
            &self.shape,
            Direction::Inputs,
            self.ports.dynamic_audio_sizes(Direction::Inputs),
        );
        let (outputs, _) = declared_channels(
            &self.shape,
            Direction::Outputs,
            self.ports.dynamic_audio_sizes(Direction::Outputs),
        );
        let fallback = self.config.default_channels;
        ChannelNegotiation::new(
            negotiate(inputs, host_inputs, fallback),
            negotiate(outputs, host_outputs, fallback),
        )
    }

    /// Rebuild layout and buffers for `negotiation`. Every instance that
    /// survives is prepared again whenever the setup it saw changes, or
    /// unconditionally when `force` is set.
    fn reallocate(&mut self, negotiation: ChannelNegotiation, force: bool) {
        let strategy = self.dispatch.strategy();
        let replicas = if strategy.replicates_per_channel(&self.shape) {
            negotiation.outputs
        } else {
            1
        };
        let voices = if self.dispatch.is_polyphonic() {
            self.config.voices
        } else {
            1
        };

        self.layout = BusLayout::for_strategy(
            &self.shape,
            strategy,
            negotiation,
            self.ports.dynamic_audio_sizes(Direction::Inputs),
            self.ports.dynamic_audio_sizes(Direction::Outputs),
        );
        self.layout_valid = match self.layout.validate() {
            Ok(()) => true,
            Err(msg) => {
                log::error!("{}: {}", self.shape.name, msg);
                false
            }
        };

        let input_channels = negotiation.inputs.max(self.layout.total_input_channels());
        let output_channels = negotiation.outputs.max(self.layout.total_output_channels());
        self.conversion
            .ensure_layout(input_channels, output_channels, self.max_frames);
        self.storage = ProcessBufferStorage::allocate(
            self.max_frames,
            count(&self.shape.inputs, is_audio_sample),
            count(&self.shape.outputs, is_audio_sample),
            if self.dispatch.is_polyphonic() {
                output_channels
            } else {
                0
            },
        );

        let total = replicas * voices;
        let setup = ProcessSetup {
            input_channels: ChannelCount::Defined(negotiation.inputs),
            output_channels: ChannelCount::Defined(negotiation.outputs),
            max_frames: self.max_frames,
            ..self.setup
        };
        let refresh = force || self.prepared != Some(setup);
        let existing = self.instances.len().min(total);
        self.instances.truncate(total);
        for i in 0..total {
            let replica = setup.for_replica(i, i / replicas.max(1));
            if i >= existing {
                let mut instance = C::create();
                instance.prepare(&replica);
                self.instances.push(instance);
            } else if refresh {
                self.instances[i].prepare(&replica);
            }
        }
        self.prepared = Some(setup);

        log::debug!(
            "{}: allocated {:?} with {} instance(s) ({} per voice)",
            self.shape.name,
            negotiation,
            total,
            replicas
        );
        self.replicas = replicas;
        self.allocated = Some(negotiation);
    }

    fn apply_resizes(&mut self, resizes: &[AppliedResize]) {
        for r in resizes {
            log::debug!(
                "{}: {:?} dynamic port {} resized {} -> {}",
                self.shape.name,
                r.direction,
                r.index,
                r.resize.from,
                r.resize.to
            );
        }
        if resizes.iter().any(|r| r.audio) {
            let negotiation = self.negotiate(self.host_inputs, self.host_outputs);
            self.reallocate(negotiation, false);
        }
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    fn render<H: Sample>(
        &mut self,
        tick: &Tick,
        negotiation: ChannelNegotiation,
        host_inputs: &[&[H]],
        host_outputs: &mut [&mut [H]],
    ) {
        let frames = tick.frames;
        let Self {
            shape,
            entry,
            dispatch,
            instances,
            replicas,
            ports,
            conversion,
            storage,
            layout,
            ..
        } = self;

        // Inputs pass straight through only when the precision matches and
        // the host has every channel the layout reads.
        let direct_inputs = if host_inputs.len() >= conversion.input_channel_count() {
            cast_inputs::<H, C::Sample>(host_inputs)
        } else {
            None
        };
        if direct_inputs.is_none() {
            conversion.load_inputs(host_inputs, frames);
        }
        // Negotiated outputs start silent on both paths.
        let written = conversion.output_channel_count();
        if same_format::<H, C::Sample>() {
            for channel in host_outputs.iter_mut().take(written) {
                let n = frames.min(channel.len());
                channel[..n].fill(H::ZERO);
            }
        } else {
            conversion.clear_outputs(frames);
        }
        let inputs = match direct_inputs {
            Some(channels) => Channels::from_host(channels, frames),
            None => Channels::from_owned(&conversion.input, frames),
        };

        storage.clear_frame();
        let polyphonic = dispatch.is_polyphonic();
        let mut pass = Pass {
            entry: *entry,
            strategy: dispatch.strategy(),
            replicated: dispatch.strategy().replicates_per_channel(shape),
            negotiation,
            ports,
            zeros: &storage.zeros,
            frame_inputs: &mut storage.frame_inputs,
            frame_outputs: &mut storage.frame_outputs,
            layout: &*layout,
            tick,
        };
        let voice_outputs = &mut storage.voice_outputs;

        match cast_outputs::<H, C::Sample>(host_outputs) {
            Some(channels) => {
                let mut outputs = ChannelsMut::from_host(channels, frames);
                render_voices(&mut pass, instances, *replicas, polyphonic, voice_outputs, &inputs, &mut outputs);
            }
            None => {
                {
                    let mut outputs = ChannelsMut::from_owned(&mut conversion.output, frames);
                    render_voices(&mut pass, instances, *replicas, polyphonic, voice_outputs, &inputs, &mut outputs);
                }
                conversion.store_outputs(host_outputs, frames);
            }
        }
    }
}

/// Run every voice (or the single mono set of instances) into `outputs`.
fn render_voices<C: Component>(
    pass: &mut Pass<'_, C>,
    instances: &mut [C],
    replicas: usize,
    polyphonic: bool,
    voice_outputs: &mut [Vec<C::Sample>],
    inputs: &Channels<'_, C::Sample>,
    outputs: &mut ChannelsMut<'_, '_, C::Sample>,
) {
    if !polyphonic {
        pass.run(instances, inputs, outputs);
        return;
    }

    let frames = pass.tick.frames;
    outputs
        .slice_mut(0..pass.negotiation.outputs)
        .fill(<C::Sample as Sample>::ZERO);
    if replicas == 0 {
        return;
    }
    for voice in instances.chunks_mut(replicas) {
        for channel in voice_outputs.iter_mut() {
            let n = frames.min(channel.len());
            channel[..n].fill(<C::Sample as Sample>::ZERO);
        }
        {
            let mut target = ChannelsMut::from_owned(voice_outputs, frames);
            pass.run(voice, inputs, &mut target);
        }
        outputs.accumulate(voice_outputs);
    }
}

/// Borrowed state for calling one set of instances.
struct Pass<'r, C: Component> {
    entry: Entry<C>,
    strategy: Strategy,
    replicated: bool,
    negotiation: ChannelNegotiation,
    ports: &'r mut Ports,
    zeros: &'r [C::Sample],
    frame_inputs: &'r mut [C::Sample],
    frame_outputs: &'r mut [C::Sample],
    layout: &'r BusLayout,
    tick: &'r Tick,
}

impl<C: Component> Pass<'_, C> {
    fn run(
        &mut self,
        instances: &mut [C],
        inputs: &Channels<'_, C::Sample>,
        outputs: &mut ChannelsMut<'_, '_, C::Sample>,
    ) {
        let frames = self.tick.frames;
        let zeros = self.zeros;
        let zeros = &zeros[..frames.min(zeros.len())];

        match self.entry {
            Entry::SampleArg(f) => {
                for (c, instance) in instances.iter_mut().enumerate() {
                    let input = inputs.channel(c).unwrap_or(zeros);
                    let Some(output) = outputs.channel_mut(c) else {
                        continue;
                    };
                    for (i, (x, y)) in input.iter().zip(output.iter_mut()).enumerate() {
                        self.ports.seek_frame(i);
                        *y = f(instance, *x, self.ports);
                    }
                }
            }
            Entry::ChannelArg(f) => {
                for (c, instance) in instances.iter_mut().enumerate() {
                    let input = inputs.channel(c).unwrap_or(zeros);
                    let Some(output) = outputs.channel_mut(c) else {
                        continue;
                    };
                    let n = input.len().min(output.len());
                    f(instance, &input[..n], &mut output[..n], self.ports, self.tick);
                }
            }
            Entry::BusArg(f) => {
                if let Some(instance) = instances.first_mut() {
                    let ins = inputs.slice(0..self.negotiation.inputs);
                    let mut outs = outputs.slice_mut(0..self.negotiation.outputs);
                    f(instance, &ins, &mut outs, self.ports, self.tick);
                }
            }
            Entry::Ports(f) if self.strategy == Strategy::PerSamplePort => {
                self.run_sample_ports(f, instances, inputs, outputs);
            }
            Entry::Ports(f) => {
                if let Some(instance) = instances.first_mut() {
                    let mut audio = AudioPorts::mapped(*inputs, outputs.reborrow(), self.layout);
                    f(instance, self.ports, &mut audio, self.tick);
                }
            }
        }
    }

    fn run_sample_ports(
        &mut self,
        f: PortFn<C>,
        instances: &mut [C],
        inputs: &Channels<'_, C::Sample>,
        outputs: &mut ChannelsMut<'_, '_, C::Sample>,
    ) {
        let frames = self.tick.frames;
        let zero = <C::Sample as Sample>::ZERO;

        if self.replicated {
            let zeros = self.zeros;
            let zeros = &zeros[..frames.min(zeros.len())];
            for (c, instance) in instances.iter_mut().enumerate() {
                let input = inputs.channel(c).unwrap_or(zeros);
                let Some(output) = outputs.channel_mut(c) else {
                    continue;
                };
                for (i, y) in output.iter_mut().enumerate() {
                    self.ports.seek_frame(i);
                    if let Some(x) = self.frame_inputs.first_mut() {
                        *x = input.get(i).copied().unwrap_or(zero);
                    }
                    let mut audio = AudioPorts::samples(self.frame_inputs, self.frame_outputs);
                    f(instance, self.ports, &mut audio, self.tick);
                    *y = self.frame_outputs.first().copied().unwrap_or(zero);
                }
            }
            return;
        }

        let Some(instance) = instances.first_mut() else {
            return;
        };
        for i in 0..frames {
            self.ports.seek_frame(i);
            for (k, x) in self.frame_inputs.iter_mut().enumerate() {
                *x = inputs.channel(k).and_then(|c| c.get(i)).copied().unwrap_or(zero);
            }
            let mut audio = AudioPorts::samples(self.frame_inputs, self.frame_outputs);
            f(instance, self.ports, &mut audio, self.tick);
            for (k, y) in self.frame_outputs.iter().enumerate() {
                if let Some(o) = outputs.channel_mut(k).and_then(|c| c.get_mut(i)) {
                    *o = *y;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{ControlSpec, FieldDescriptor};

    fn registry() -> Registry {
        Registry::new()
    }

    fn stereo(frames: usize) -> ProcessSetup {
        ProcessSetup::new(48_000.0, frames).with_channels(ChannelCount::Defined(2), ChannelCount::Defined(2))
    }

    fn mono(frames: usize) -> ProcessSetup {
        ProcessSetup::new(48_000.0, frames).with_channels(ChannelCount::Defined(1), ChannelCount::Defined(1))
    }

    // -------------------------------------------------------------------------
    // Fixtures
    // -------------------------------------------------------------------------

    struct Passthrough;

    impl Component for Passthrough {
        type Sample = f32;

        fn shape() -> ComponentShape<Self> {
            ComponentShape::new("passthrough").entry(Entry::ChannelArg(Passthrough::run))
        }

        fn create() -> Self {
            Passthrough
        }
    }

    impl Passthrough {
        fn run(&mut self, input: &[f32], output: &mut [f32], _: &mut Ports, _: &Tick) {
            output.copy_from_slice(input);
        }
    }

    struct Gain;

    impl Component for Gain {
        type Sample = f32;

        fn shape() -> ComponentShape<Self> {
            ComponentShape::new("gain")
                .input(FieldDescriptor::control("gain", ControlSpec::new(1.0, 0.0, 2.0)))
                .entry(Entry::ChannelArg(Gain::run))
        }

        fn create() -> Self {
            Gain
        }
    }

    impl Gain {
        fn run(&mut self, input: &[f32], output: &mut [f32], ports: &mut Ports, _: &Tick) {
            let gain = ports.control(0).unwrap_or(1.0) as f32;
            for (o, i) in output.iter_mut().zip(input) {
                *o = i * gain;
            }
        }
    }

    struct Ramp;

    impl Component for Ramp {
        type Sample = f32;

        fn shape() -> ComponentShape<Self> {
            ComponentShape::new("ramp")
                .input(FieldDescriptor::control("level", ControlSpec::new(1.0, 0.0, 1.0).sample_accurate()))
                .entry(Entry::SampleArg(Ramp::tick))
        }

        fn create() -> Self {
            Ramp
        }
    }

    impl Ramp {
        fn tick(&mut self, x: f32, ports: &mut Ports) -> f32 {
            x * ports.control(0).unwrap_or(1.0) as f32
        }
    }

    struct Voice {
        level: f32,
    }

    impl Component for Voice {
        type Sample = f32;

        fn shape() -> ComponentShape<Self> {
            ComponentShape::new("voice").polyphonic().entry(Entry::ChannelArg(Voice::run))
        }

        fn create() -> Self {
            Voice { level: 0.0 }
        }

        fn prepare(&mut self, setup: &ProcessSetup) {
            self.level = (setup.voice + 1) as f32;
        }
    }

    impl Voice {
        fn run(&mut self, _: &[f32], output: &mut [f32], _: &mut Ports, _: &Tick) {
            output.fill(self.level);
        }
    }

    struct Swap;

    impl Component for Swap {
        type Sample = f32;

        fn shape() -> ComponentShape<Self> {
            ComponentShape::new("swap")
                .input(FieldDescriptor::bus("main", 2))
                .output(FieldDescriptor::bus("left", 1))
                .output(FieldDescriptor::bus("right", 1))
                .entry(Entry::Ports(Swap::run))
        }

        fn create() -> Self {
            Swap
        }
    }

    impl Swap {
        fn run(&mut self, _: &mut Ports, audio: &mut AudioPorts<'_, '_, f32>, _: &Tick) {
            let main = audio.bus_in(0);
            for (bus, source) in [(0, 1), (1, 0)] {
                let mut out = audio.bus_out(bus);
                if let (Some(o), Some(i)) = (out.channel_mut(0), main.channel(source)) {
                    o.copy_from_slice(i);
                }
            }
        }
    }

    struct Sum;

    impl Component for Sum {
        type Sample = f64;

        fn shape() -> ComponentShape<Self> {
            ComponentShape::new("sum")
                .input(FieldDescriptor::sample("a"))
                .input(FieldDescriptor::sample("b"))
                .output(FieldDescriptor::sample("sum"))
                .entry(Entry::Ports(Sum::run))
        }

        fn create() -> Self {
            Sum
        }
    }

    impl Sum {
        fn run(&mut self, _: &mut Ports, audio: &mut AudioPorts<'_, '_, f64>, _: &Tick) {
            let sum = audio.sample_in(0) + audio.sample_in(1);
            audio.set_sample_out(0, sum);
        }
    }

    struct Mix;

    impl Component for Mix {
        type Sample = f32;

        fn shape() -> ComponentShape<Self> {
            ComponentShape::new("mix")
                .input(FieldDescriptor::dynamic_channels("ins"))
                .output(FieldDescriptor::channel("out"))
                .message(FieldDescriptor::message("reset", 0))
                .entry(Entry::Ports(Mix::run))
        }

        fn create() -> Self {
            Mix
        }
    }

    impl Mix {
        fn run(&mut self, _: &mut Ports, audio: &mut AudioPorts<'_, '_, f32>, _: &Tick) {
            let ins = audio.dynamic_in(0);
            if let Some(out) = audio.channel_out(0) {
                out.fill(0.0);
                for channel in ins.iter() {
                    for (o, i) in out.iter_mut().zip(channel) {
                        *o += i;
                    }
                }
            }
        }
    }

    struct Wide;

    impl Component for Wide {
        type Sample = f32;

        fn shape() -> ComponentShape<Self> {
            ComponentShape::new("wide").channels(2).entry(Entry::BusArg(Wide::run))
        }

        fn create() -> Self {
            Wide
        }
    }

    impl Wide {
        fn run(
            &mut self,
            inputs: &Channels<'_, f32>,
            outputs: &mut ChannelsMut<'_, '_, f32>,
            _: &mut Ports,
            _: &Tick,
        ) {
            outputs.copy_from(inputs);
        }
    }

    /// Remembers what it was prepared for and counts calls outside it.
    /// Never writes its outputs.
    struct Recorder {
        prepares: usize,
        max_frames: usize,
        outputs: ChannelCount,
        violations: usize,
    }

    impl Component for Recorder {
        type Sample = f32;

        fn shape() -> ComponentShape<Self> {
            ComponentShape::new("recorder").entry(Entry::BusArg(Recorder::run))
        }

        fn create() -> Self {
            Recorder {
                prepares: 0,
                max_frames: 0,
                outputs: ChannelCount::Undefined,
                violations: 0,
            }
        }

        fn prepare(&mut self, setup: &ProcessSetup) {
            self.prepares += 1;
            self.max_frames = setup.max_frames;
            self.outputs = setup.output_channels;
        }
    }

    impl Recorder {
        fn run(
            &mut self,
            _: &Channels<'_, f32>,
            outputs: &mut ChannelsMut<'_, '_, f32>,
            _: &mut Ports,
            tick: &Tick,
        ) {
            if tick.frames > self.max_frames || self.outputs != ChannelCount::Defined(outputs.len()) {
                self.violations += 1;
            }
        }
    }

    // -------------------------------------------------------------------------
    // Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_identity_stereo() {
        let mut adapter = Adapter::<Passthrough>::new(&mut registry(), EngineConfig::new()).unwrap();
        adapter.prepare(stereo(64));
        assert_eq!(adapter.dispatch(), Dispatch::Mono(Strategy::PerChannelArg));
        assert_eq!(adapter.instances().len(), 2);

        let left = [0.1f32, 0.2, 0.3, 0.4];
        let right = [-1.0f32, 0.5, 0.25, 0.0];
        let inputs: [&[f32]; 2] = [&left, &right];
        let mut out_l = [0.0f32; 4];
        let mut out_r = [0.0f32; 4];
        let mut outputs: [&mut [f32]; 2] = [&mut out_l, &mut out_r];

        let outcome = adapter.process(&Tick::new(4), HostBlock::new(&inputs, &mut outputs));
        assert_eq!(outcome, TickOutcome::Processed);
        assert_eq!(out_l, left);
        assert_eq!(out_r, right);
    }

    #[test]
    fn test_channel_change_skips_one_tick() {
        let mut adapter = Adapter::<Passthrough>::new(&mut registry(), EngineConfig::new()).unwrap();
        adapter.prepare(stereo(64));

        let a = [1.0f32; 4];
        let b = [2.0f32; 4];
        let inputs: [&[f32]; 2] = [&a, &b];
        let mut o0 = [9.0f32; 4];
        let mut o1 = [9.0f32; 4];
        let mut o2 = [9.0f32; 4];

        {
            let mut outputs: [&mut [f32]; 3] = [&mut o0, &mut o1, &mut o2];
            let outcome = adapter.process(&Tick::new(4), HostBlock::new(&inputs, &mut outputs));
            assert_eq!(
                outcome,
                TickOutcome::Skipped(SkipReason::Reallocated {
                    requested: ChannelNegotiation::new(2, 3),
                    frames: 4,
                })
            );
        }
        assert_eq!(o0, [9.0; 4]);
        assert_eq!(o2, [9.0; 4]);
        assert_eq!(adapter.negotiation(), Some(ChannelNegotiation::new(2, 3)));
        assert_eq!(adapter.instances().len(), 3);

        let mut outputs: [&mut [f32]; 3] = [&mut o0, &mut o1, &mut o2];
        let outcome = adapter.process(&Tick::new(4), HostBlock::new(&inputs, &mut outputs));
        assert!(outcome.is_processed());
        assert_eq!(o0, a);
        assert_eq!(o1, b);
        assert_eq!(o2, [0.0; 4]);
    }

    #[test]
    fn test_reallocation_prepares_surviving_instances() {
        let mut adapter = Adapter::<Recorder>::new(&mut registry(), EngineConfig::new()).unwrap();
        adapter.prepare(stereo(4));
        assert_eq!(adapter.dispatch(), Dispatch::Mono(Strategy::PerBusArg));
        assert_eq!(adapter.instances()[0].prepares, 1);

        let input = [0.5f32; 8];
        let inputs: [&[f32]; 3] = [&input, &input, &input];
        let mut o0 = [0.0f32; 8];
        let mut o1 = [0.0f32; 8];
        let mut o2 = [0.0f32; 8];
        let mut outputs: [&mut [f32]; 3] = [&mut o0, &mut o1, &mut o2];

        let outcome = adapter.process(&Tick::new(8), HostBlock::new(&inputs, &mut outputs));
        assert_eq!(
            outcome,
            TickOutcome::Skipped(SkipReason::Reallocated {
                requested: ChannelNegotiation::new(3, 3),
                frames: 8,
            })
        );
        assert!(adapter
            .process(&Tick::new(8), HostBlock::new(&inputs, &mut outputs))
            .is_processed());

        let recorder = &adapter.instances()[0];
        assert_eq!(recorder.prepares, 2);
        assert_eq!(recorder.max_frames, 8);
        assert_eq!(recorder.outputs, ChannelCount::Defined(3));
        assert_eq!(recorder.violations, 0);
    }

    #[test]
    fn test_unchanged_setup_does_not_prepare_again() {
        let mut adapter = Adapter::<Recorder>::new(&mut registry(), EngineConfig::new()).unwrap();
        adapter.prepare(stereo(4));

        let input = [0.0f32; 4];
        let inputs: [&[f32]; 2] = [&input, &input];
        let mut l = [0.0f32; 4];
        let mut r = [0.0f32; 4];
        for _ in 0..3 {
            let mut outputs: [&mut [f32]; 2] = [&mut l, &mut r];
            assert!(adapter
                .process(&Tick::new(4), HostBlock::new(&inputs, &mut outputs))
                .is_processed());
        }
        assert_eq!(adapter.instances()[0].prepares, 1);
    }

    #[test]
    fn test_events_on_skipped_tick_are_kept() {
        let mut adapter = Adapter::<Gain>::new(&mut registry(), EngineConfig::new()).unwrap();
        adapter.prepare(mono(16));

        let input = [1.0f32; 4];
        let inputs: [&[f32]; 2] = [&input, &input];
        let mut l = [0.0f32; 4];
        let mut r = [0.0f32; 4];
        let events = [ControlEvent::new(0, 0, 0.5)];
        {
            let mut outputs: [&mut [f32]; 2] = [&mut l, &mut r];
            let block = HostBlock::new(&inputs, &mut outputs).with_events(&events);
            assert!(!adapter.process(&Tick::new(4), block).is_processed());
        }
        assert_eq!(adapter.ports().control(0), Some(0.5));

        let mut outputs: [&mut [f32]; 2] = [&mut l, &mut r];
        assert!(adapter
            .process(&Tick::new(4), HostBlock::new(&inputs, &mut outputs))
            .is_processed());
        assert_eq!(l, [0.5; 4]);
        assert_eq!(r, [0.5; 4]);
    }

    #[test]
    fn test_sample_accurate_change_on_skipped_tick_commits() {
        let mut adapter = Adapter::<Ramp>::new(&mut registry(), EngineConfig::new()).unwrap();
        adapter.prepare(mono(2));

        let input = [1.0f32; 4];
        let inputs: [&[f32]; 1] = [&input];
        let mut out = [9.0f32; 4];
        let events = [ControlEvent::new(0, 3, 0.25), ControlEvent::new(0, 1, 0.0)];
        {
            let mut outputs: [&mut [f32]; 1] = [&mut out];
            let block = HostBlock::new(&inputs, &mut outputs).with_events(&events);
            assert!(!adapter.process(&Tick::new(4), block).is_processed());
        }
        assert_eq!(out, [9.0; 4]);

        let mut outputs: [&mut [f32]; 1] = [&mut out];
        assert!(adapter
            .process(&Tick::new(4), HostBlock::new(&inputs, &mut outputs))
            .is_processed());
        assert_eq!(out, [0.25; 4]);
    }

    #[test]
    fn test_unwritten_outputs_are_silent_at_either_precision() {
        let mut adapter = Adapter::<Recorder>::new(&mut registry(), EngineConfig::new()).unwrap();
        adapter.prepare(stereo(4));

        let input = [1.0f32; 4];
        let inputs: [&[f32]; 2] = [&input, &input];
        let mut l = [9.0f32; 4];
        let mut r = [9.0f32; 4];
        let mut outputs: [&mut [f32]; 2] = [&mut l, &mut r];
        assert!(adapter
            .process(&Tick::new(4), HostBlock::new(&inputs, &mut outputs))
            .is_processed());
        assert_eq!(l, [0.0; 4]);
        assert_eq!(r, [0.0; 4]);

        let input = [1.0f64; 4];
        let inputs: [&[f64]; 2] = [&input, &input];
        let mut l = [9.0f64; 4];
        let mut r = [9.0f64; 4];
        let mut outputs: [&mut [f64]; 2] = [&mut l, &mut r];
        assert!(adapter
            .process(&Tick::new(4), HostBlock::new(&inputs, &mut outputs))
            .is_processed());
        assert_eq!(l, [0.0; 4]);
        assert_eq!(r, [0.0; 4]);
    }

    #[test]
    fn test_oversized_block_skips() {
        let mut adapter = Adapter::<Passthrough>::new(&mut registry(), EngineConfig::new()).unwrap();
        adapter.prepare(mono(2));

        let input = [1.0f32; 8];
        let inputs: [&[f32]; 1] = [&input];
        let mut out = [0.0f32; 8];
        let mut outputs: [&mut [f32]; 1] = [&mut out];
        let outcome = adapter.process(&Tick::new(8), HostBlock::new(&inputs, &mut outputs));
        assert!(matches!(
            outcome,
            TickOutcome::Skipped(SkipReason::Reallocated { frames: 8, .. })
        ));
        let outcome = adapter.process(&Tick::new(8), HostBlock::new(&inputs, &mut outputs));
        assert!(outcome.is_processed());
        assert_eq!(out, input);
    }

    #[test]
    fn test_gain_event() {
        let mut adapter = Adapter::<Gain>::new(&mut registry(), EngineConfig::new()).unwrap();
        adapter.prepare(mono(16));

        let input = [1.0f32, 2.0, 3.0, 4.0];
        let inputs: [&[f32]; 1] = [&input];
        let mut out = [0.0f32; 4];
        let mut outputs: [&mut [f32]; 1] = [&mut out];
        let events = [ControlEvent::new(0, 0, 0.5)];
        let block = HostBlock::new(&inputs, &mut outputs).with_events(&events);

        assert!(adapter.process(&Tick::new(4), block).is_processed());
        assert_eq!(out, [0.5, 1.0, 1.5, 2.0]);
        assert_eq!(adapter.ports().control(0), Some(0.5));
    }

    #[test]
    fn test_sample_accurate_per_sample() {
        let mut adapter = Adapter::<Ramp>::new(&mut registry(), EngineConfig::new()).unwrap();
        adapter.prepare(mono(16));

        let input = [1.0f32; 4];
        let inputs: [&[f32]; 1] = [&input];
        let mut out = [0.0f32; 4];
        let mut outputs: [&mut [f32]; 1] = [&mut out];
        let events = [ControlEvent::new(0, 2, 0.0)];
        let block = HostBlock::new(&inputs, &mut outputs).with_events(&events);

        assert!(adapter.process(&Tick::new(4), block).is_processed());
        assert_eq!(out, [1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_f64_host_f32_component() {
        let mut adapter = Adapter::<Passthrough>::new(&mut registry(), EngineConfig::new()).unwrap();
        adapter.prepare(mono(16));

        let input = [0.25f64, -0.5, 1.0];
        let inputs: [&[f64]; 1] = [&input];
        let mut out = [0.0f64; 3];
        let mut outputs: [&mut [f64]; 1] = [&mut out];

        assert!(adapter
            .process(&Tick::new(3), HostBlock::new(&inputs, &mut outputs))
            .is_processed());
        assert_eq!(out, input);
    }

    #[test]
    fn test_polyphonic_voices_sum() {
        let config = EngineConfig::new().with_voices(3);
        let mut adapter = Adapter::<Voice>::new(&mut registry(), config).unwrap();
        adapter.prepare(mono(16));
        assert_eq!(adapter.dispatch(), Dispatch::Polyphonic(Strategy::PerChannelArg));
        assert_eq!(adapter.instances().len(), 3);

        let input = [0.0f32; 4];
        let inputs: [&[f32]; 1] = [&input];
        let mut out = [9.0f32; 4];
        let mut outputs: [&mut [f32]; 1] = [&mut out];

        assert!(adapter
            .process(&Tick::new(4), HostBlock::new(&inputs, &mut outputs))
            .is_processed());
        assert_eq!(out, [6.0; 4]);
    }

    #[test]
    fn test_buses_partition_host_channels() {
        let mut adapter = Adapter::<Swap>::new(&mut registry(), EngineConfig::new()).unwrap();
        adapter.prepare(stereo(16));
        assert_eq!(adapter.dispatch(), Dispatch::Mono(Strategy::PerBusPort));

        let l = [1.0f32, 1.0];
        let r = [2.0f32, 2.0];
        let inputs: [&[f32]; 2] = [&l, &r];
        let mut out_l = [0.0f32; 2];
        let mut out_r = [0.0f32; 2];
        let mut outputs: [&mut [f32]; 2] = [&mut out_l, &mut out_r];

        assert!(adapter
            .process(&Tick::new(2), HostBlock::new(&inputs, &mut outputs))
            .is_processed());
        assert_eq!(out_l, r);
        assert_eq!(out_r, l);
    }

    #[test]
    fn test_sample_ports_map_to_host_channels() {
        let mut adapter = Adapter::<Sum>::new(&mut registry(), EngineConfig::new()).unwrap();
        adapter.prepare(
            ProcessSetup::new(48_000.0, 16).with_channels(ChannelCount::Defined(2), ChannelCount::Defined(1)),
        );
        assert_eq!(adapter.dispatch(), Dispatch::Mono(Strategy::PerSamplePort));
        assert_eq!(adapter.instances().len(), 1);

        let a = [1.0f64, 2.0, 3.0];
        let b = [10.0f64, 20.0, 30.0];
        let inputs: [&[f64]; 2] = [&a, &b];
        let mut out = [0.0f64; 3];
        let mut outputs: [&mut [f64]; 1] = [&mut out];

        assert!(adapter
            .process(&Tick::new(3), HostBlock::new(&inputs, &mut outputs))
            .is_processed());
        assert_eq!(out, [11.0, 22.0, 33.0]);
    }

    #[test]
    fn test_dynamic_resize_reallocates_without_skip() {
        let mut adapter = Adapter::<Mix>::new(&mut registry(), EngineConfig::new()).unwrap();
        adapter.prepare(mono(16));
        assert_eq!(adapter.dispatch(), Dispatch::Mono(Strategy::PerChannelPort));
        assert_eq!(adapter.negotiation(), Some(ChannelNegotiation::new(0, 1)));

        adapter.ports_mut().request_resize(Direction::Inputs, 0, 2);

        let a = [1.0f32, 2.0];
        let b = [3.0f32, 4.0];
        let inputs: [&[f32]; 2] = [&a, &b];
        let mut out = [9.0f32; 2];

        {
            let mut outputs: [&mut [f32]; 1] = [&mut out];
            assert!(adapter
                .process(&Tick::new(2), HostBlock::new(&inputs, &mut outputs))
                .is_processed());
        }
        assert_eq!(out, [0.0, 0.0]);
        assert_eq!(adapter.ports().dynamic_len(Direction::Inputs, 0), Some(2));
        assert_eq!(adapter.negotiation(), Some(ChannelNegotiation::new(2, 1)));

        let mut outputs: [&mut [f32]; 1] = [&mut out];
        assert!(adapter
            .process(&Tick::new(2), HostBlock::new(&inputs, &mut outputs))
            .is_processed());
        assert_eq!(out, [4.0, 6.0]);
    }

    #[test]
    fn test_missing_host_outputs_skip() {
        let mut adapter = Adapter::<Wide>::new(&mut registry(), EngineConfig::new()).unwrap();
        adapter.prepare(mono(16));
        assert_eq!(adapter.negotiation(), Some(ChannelNegotiation::new(2, 2)));

        let input = [1.0f32; 2];
        let inputs: [&[f32]; 2] = [&input, &input];
        let mut out = [9.0f32; 2];
        let mut outputs: [&mut [f32]; 1] = [&mut out];

        let outcome = adapter.process(&Tick::new(2), HostBlock::new(&inputs, &mut outputs));
        assert_eq!(
            outcome,
            TickOutcome::Skipped(SkipReason::OutputUnavailable {
                required: 2,
                available: 1,
            })
        );
        assert_eq!(out, [9.0; 2]);
    }

    #[test]
    fn test_messages_delivered_once() {
        let mut adapter = Adapter::<Mix>::new(&mut registry(), EngineConfig::new()).unwrap();
        adapter.prepare(mono(16));
        assert!(adapter.send_message(0, &[]));
        assert!(!adapter.send_message(0, &[1.0]));
        assert!(!adapter.send_message(1, &[]));
        assert_eq!(adapter.ports().messages().len(), 1);

        let inputs: [&[f32]; 0] = [];
        let mut out = [0.0f32; 2];
        let mut outputs: [&mut [f32]; 1] = [&mut out];
        assert!(adapter
            .process(&Tick::new(2), HostBlock::new(&inputs, &mut outputs))
            .is_processed());
        assert!(adapter.ports().messages().is_empty());
    }

    #[test]
    fn test_unresolvable_component_fails() {
        struct Nothing;

        impl Component for Nothing {
            type Sample = f32;

            fn shape() -> ComponentShape<Self> {
                ComponentShape::new("nothing")
            }

            fn create() -> Self {
                Nothing
            }
        }

        let err = Adapter::<Nothing>::new(&mut registry(), EngineConfig::new()).err();
        assert!(matches!(
            err,
            Some(EngineError::Shape(ShapeError::NoMatchingStrategy { component: "nothing" }))
        ));
    }

    #[test]
    fn test_invalid_config_fails() {
        let config = EngineConfig::new().with_max_frames(0);
        let err = Adapter::<Passthrough>::new(&mut registry(), config).err();
        assert!(matches!(err, Some(EngineError::Config(_))));
    }
}
