//! Port state owned by the adapter and lent to components each tick.
//!
//! [`Ports`] is an arena holding one state slot per declared input and
//! output field. Components and hosts address slots by match index (the
//! `k`-th control, the `k`-th MIDI input, ...), computed once from the shape
//! by the [enumerator](crate::enumerate). Every access is bounds-checked and
//! returns `None` (or does nothing) for an index the shape does not have.
//!
//! [`AudioPorts`] is the audio half for port-based entry points: it maps
//! declared sample, channel and bus fields onto the tick's channel views.

use crate::buffer::{Channels, ChannelsMut};
use crate::bus_config::{BusLayout, BusRole};
use crate::component::Component;
use crate::dynamic_ports::{DynamicChannels, DynamicPorts, Resize};
use crate::enumerate::{FieldIndexMap, FieldPredicate};
use crate::events::{merge, merge_filled, MergePolicy, MergedTimeline, SampleAccurate, TimedEvent};
use crate::predicates::{
    is_callback, is_control, is_dynamic_audio, is_dynamic_controls, is_dynamic_ports, is_midi,
    is_sample_accurate,
};
use crate::sample::Sample;
use crate::shape::{ComponentShape, ControlSpec, Direction, DynamicKind, FieldDescriptor, FieldKind};
use crate::types::{ControlEvent, MidiEvent, MidiMessage};

// =============================================================================
// Slots
// =============================================================================

#[derive(Debug, Clone)]
struct AccurateControl {
    spec: ControlSpec,
    timeline: SampleAccurate<f64>,
    current: f64,
}

impl AccurateControl {
    fn new(spec: ControlSpec) -> Self {
        Self {
            spec,
            timeline: SampleAccurate::new(spec.init),
            current: spec.default_value(),
        }
    }

    fn seek(&mut self, frame: usize) {
        self.current = self.timeline.value_at(frame).unwrap_or(self.spec.default_value());
    }
}

#[derive(Debug, Clone)]
enum Slot {
    /// Audio lives in [`AudioPorts`].
    Audio,
    Control(f64),
    Accurate(AccurateControl),
    Midi(Vec<MidiMessage>),
    Callback(Vec<f64>),
    DynamicControls(DynamicPorts<f64>),
    DynamicChannels(DynamicChannels),
}

impl Slot {
    fn for_field(field: &FieldDescriptor) -> Self {
        match field.kind {
            FieldKind::Control(spec) if spec.sample_accurate => Self::Accurate(AccurateControl::new(spec)),
            FieldKind::Control(spec) => Self::Control(spec.default_value()),
            FieldKind::Midi => Self::Midi(Vec::new()),
            FieldKind::Callback => Self::Callback(Vec::new()),
            FieldKind::Dynamic(DynamicKind::Controls(_)) => Self::DynamicControls(DynamicPorts::new()),
            FieldKind::Dynamic(DynamicKind::AudioChannels) => Self::DynamicChannels(DynamicChannels::new()),
            FieldKind::AudioSample
            | FieldKind::AudioChannel
            | FieldKind::AudioBus(_)
            | FieldKind::Message { .. } => Self::Audio,
        }
    }
}

/// Match-index maps for one direction.
#[derive(Debug, Clone)]
struct Side {
    slots: Vec<Slot>,
    controls: FieldIndexMap,
    accurate: FieldIndexMap,
    midi: FieldIndexMap,
    callbacks: FieldIndexMap,
    dynamic: FieldIndexMap,
    dynamic_controls: FieldIndexMap,
    dynamic_audio: FieldIndexMap,
    /// Current sizes of the dynamic channel collections, kept in sync on resize.
    audio_sizes: Vec<usize>,
}

impl Side {
    fn new(fields: &[FieldDescriptor]) -> Self {
        let map = |p: FieldPredicate| FieldIndexMap::new(fields, p);
        let dynamic_audio = map(is_dynamic_audio);
        Self {
            slots: fields.iter().map(Slot::for_field).collect(),
            controls: map(is_control),
            accurate: map(is_sample_accurate),
            midi: map(is_midi),
            callbacks: map(is_callback),
            dynamic: map(is_dynamic_ports),
            dynamic_controls: map(is_dynamic_controls),
            audio_sizes: vec![0; dynamic_audio.len()],
            dynamic_audio,
        }
    }

    fn slot(&self, map: &FieldIndexMap, index: usize) -> Option<&Slot> {
        self.slots.get(map.field_of(index)?)
    }

    fn slot_mut(&mut self, which: fn(&Side) -> &FieldIndexMap, index: usize) -> Option<&mut Slot> {
        let field = which(self).field_of(index)?;
        self.slots.get_mut(field)
    }

    fn refresh_audio_sizes(&mut self) {
        for (i, &field) in self.dynamic_audio.fields().iter().enumerate() {
            if let Some(Slot::DynamicChannels(c)) = self.slots.get(field) {
                self.audio_sizes[i] = c.len();
            }
        }
    }
}

/// A message call queued by the host for the next tick.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageCall {
    /// Index among the component's messages.
    pub message: usize,
    pub args: Vec<f64>,
}

/// A dynamic collection that changed size between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedResize {
    pub direction: Direction,
    /// Index among the direction's dynamic collections.
    pub index: usize,
    pub resize: Resize,
    /// Whether the collection carries audio channels.
    pub audio: bool,
}

// =============================================================================
// Ports
// =============================================================================

/// Non-audio port state of a component.
#[derive(Debug, Clone)]
pub struct Ports {
    inputs: Side,
    outputs: Side,
    arities: Vec<usize>,
    messages: Vec<MessageCall>,
    /// MIDI that arrived on a skipped tick, delivered on the next one.
    carried_midi: Vec<MidiEvent>,
    merge_policy: MergePolicy,
}

impl Ports {
    pub fn new<C: Component>(shape: &ComponentShape<C>, merge_policy: MergePolicy) -> Self {
        Self {
            inputs: Side::new(&shape.inputs),
            outputs: Side::new(&shape.outputs),
            arities: shape
                .messages
                .iter()
                .map(|m| match m.kind {
                    FieldKind::Message { arity } => arity,
                    _ => 0,
                })
                .collect(),
            messages: Vec::new(),
            carried_midi: Vec::new(),
            merge_policy,
        }
    }

    fn side(&self, direction: Direction) -> Option<&Side> {
        match direction {
            Direction::Inputs => Some(&self.inputs),
            Direction::Outputs => Some(&self.outputs),
            Direction::Messages => None,
        }
    }

    fn side_mut(&mut self, direction: Direction) -> Option<&mut Side> {
        match direction {
            Direction::Inputs => Some(&mut self.inputs),
            Direction::Outputs => Some(&mut self.outputs),
            Direction::Messages => None,
        }
    }

    // -------------------------------------------------------------------------
    // Controls
    // -------------------------------------------------------------------------

    /// Current value of the `index`-th control input.
    ///
    /// For a sample-accurate control this is the value at the frame being
    /// processed by per-sample strategies, or the tick-start value otherwise.
    pub fn control(&self, index: usize) -> Option<f64> {
        match self.inputs.slot(&self.inputs.controls, index)? {
            Slot::Control(v) => Some(*v),
            Slot::Accurate(a) => Some(a.current),
            _ => None,
        }
    }

    /// Set the `index`-th control input outside the tick.
    ///
    /// A sample-accurate control takes `value` as its running value.
    pub fn set_control(&mut self, index: usize, value: f64) {
        match self.inputs.slot_mut(|s| &s.controls, index) {
            Some(Slot::Control(v)) => *v = value,
            Some(Slot::Accurate(a)) => {
                a.timeline.value = Some(value);
                a.current = value;
            }
            _ => {}
        }
    }

    /// The `index`-th sample-accurate input.
    pub fn sample_accurate(&self, index: usize) -> Option<&SampleAccurate<f64>> {
        match self.inputs.slot(&self.inputs.accurate, index)? {
            Slot::Accurate(a) => Some(&a.timeline),
            _ => None,
        }
    }

    /// Merge sample-accurate inputs (by index among sample-accurate inputs)
    /// into one timeline, following the configured [`MergePolicy`].
    ///
    /// Unknown indices are ignored.
    pub fn merged(&self, indices: &[usize]) -> MergedTimeline<f64> {
        let controls: Vec<&AccurateControl> = indices
            .iter()
            .filter_map(|&i| match self.inputs.slot(&self.inputs.accurate, i) {
                Some(Slot::Accurate(a)) => Some(a),
                _ => None,
            })
            .collect();
        let timelines: Vec<&SampleAccurate<f64>> = controls.iter().map(|a| &a.timeline).collect();
        match self.merge_policy {
            MergePolicy::SkipUntilKnown => merge(&timelines),
            MergePolicy::FillInitial => {
                let initial: Vec<f64> = controls.iter().map(|a| a.spec.default_value()).collect();
                merge_filled(&timelines, &initial)
            }
        }
    }

    /// Value of the `index`-th control output.
    pub fn output(&self, index: usize) -> Option<f64> {
        match self.outputs.slot(&self.outputs.controls, index)? {
            Slot::Control(v) => Some(*v),
            Slot::Accurate(a) => a.timeline.last().or(a.timeline.value),
            _ => None,
        }
    }

    /// Set the `index`-th control output. On a sample-accurate output this
    /// records a change at frame 0.
    pub fn set_output(&mut self, index: usize, value: f64) {
        self.push_output(index, 0, value);
    }

    /// Record a change of the `index`-th control output at `offset`.
    /// A plain output just takes the value.
    pub fn push_output(&mut self, index: usize, offset: usize, value: f64) {
        match self.outputs.slot_mut(|s| &s.controls, index) {
            Some(Slot::Control(v)) => *v = value,
            Some(Slot::Accurate(a)) => a.timeline.insert(offset, value),
            _ => {}
        }
    }

    /// Changes written to the `index`-th sample-accurate output this tick.
    pub fn output_events(&self, index: usize) -> impl Iterator<Item = TimedEvent<f64>> + '_ {
        let timeline = match self.outputs.slot(&self.outputs.accurate, index) {
            Some(Slot::Accurate(a)) => Some(&a.timeline),
            _ => None,
        };
        timeline.into_iter().flat_map(|t| t.events())
    }

    // -------------------------------------------------------------------------
    // MIDI, callbacks, messages
    // -------------------------------------------------------------------------

    /// Messages received on the `index`-th MIDI input this tick.
    pub fn midi_in(&self, index: usize) -> &[MidiMessage] {
        match self.inputs.slot(&self.inputs.midi, index) {
            Some(Slot::Midi(m)) => m,
            _ => &[],
        }
    }

    /// Send a message on the `index`-th MIDI output.
    pub fn send_midi(&mut self, index: usize, message: MidiMessage) {
        if let Some(Slot::Midi(m)) = self.outputs.slot_mut(|s| &s.midi, index) {
            m.push(message);
        }
    }

    /// Messages sent on the `index`-th MIDI output this tick.
    pub fn midi_out(&self, index: usize) -> &[MidiMessage] {
        match self.outputs.slot(&self.outputs.midi, index) {
            Some(Slot::Midi(m)) => m,
            _ => &[],
        }
    }

    /// Invoke the `index`-th callback output.
    pub fn emit(&mut self, index: usize, value: f64) {
        if let Some(Slot::Callback(c)) = self.outputs.slot_mut(|s| &s.callbacks, index) {
            c.push(value);
        }
    }

    /// Invocations of the `index`-th callback output this tick.
    pub fn callbacks(&self, index: usize) -> &[f64] {
        match self.outputs.slot(&self.outputs.callbacks, index) {
            Some(Slot::Callback(c)) => c,
            _ => &[],
        }
    }

    /// Queue a message call for the next tick. Returns `false` if the
    /// message does not exist or `args` has the wrong length.
    pub fn queue_message(&mut self, message: usize, args: &[f64]) -> bool {
        match self.arities.get(message) {
            Some(&arity) if arity == args.len() => {
                self.messages.push(MessageCall {
                    message,
                    args: args.to_vec(),
                });
                true
            }
            _ => false,
        }
    }

    /// Message calls delivered this tick, in the order they were queued.
    pub fn messages(&self) -> &[MessageCall] {
        &self.messages
    }

    // -------------------------------------------------------------------------
    // Dynamic collections
    // -------------------------------------------------------------------------

    /// The `index`-th dynamic control collection of a direction.
    pub fn dynamic_controls(&self, direction: Direction, index: usize) -> Option<&DynamicPorts<f64>> {
        let side = self.side(direction)?;
        match side.slot(&side.dynamic_controls, index)? {
            Slot::DynamicControls(c) => Some(c),
            _ => None,
        }
    }

    pub fn dynamic_controls_mut(&mut self, direction: Direction, index: usize) -> Option<&mut DynamicPorts<f64>> {
        match self.side_mut(direction)?.slot_mut(|s| &s.dynamic_controls, index)? {
            Slot::DynamicControls(c) => Some(c),
            _ => None,
        }
    }

    /// Current length of the `index`-th dynamic collection of a direction.
    pub fn dynamic_len(&self, direction: Direction, index: usize) -> Option<usize> {
        let side = self.side(direction)?;
        match side.slot(&side.dynamic, index)? {
            Slot::DynamicControls(c) => Some(c.len()),
            Slot::DynamicChannels(c) => Some(c.len()),
            _ => None,
        }
    }

    /// Ask for the `index`-th dynamic collection of a direction to hold
    /// `count` entries. Takes effect between ticks.
    pub fn request_resize(&mut self, direction: Direction, index: usize, count: usize) {
        let Some(side) = self.side_mut(direction) else {
            return;
        };
        match side.slot_mut(|s| &s.dynamic, index) {
            Some(Slot::DynamicControls(c)) => c.request_resize(count),
            Some(Slot::DynamicChannels(c)) => c.request_resize(count),
            _ => {}
        }
    }

    /// Sizes of a direction's dynamic channel collections, in declaration order.
    pub fn dynamic_audio_sizes(&self, direction: Direction) -> &[usize] {
        match self.side(direction) {
            Some(side) => &side.audio_sizes,
            None => &[],
        }
    }

    // -------------------------------------------------------------------------
    // Tick boundaries
    // -------------------------------------------------------------------------

    /// Prepare for a tick: clear per-tick outputs and deliver host events.
    pub(crate) fn begin_tick(&mut self, events: &[ControlEvent], midi: &[MidiEvent]) {
        for slot in &mut self.outputs.slots {
            match slot {
                Slot::Accurate(a) => a.timeline.commit(),
                Slot::Midi(m) => m.clear(),
                Slot::Callback(c) => c.clear(),
                _ => {}
            }
        }
        for slot in &mut self.inputs.slots {
            match slot {
                Slot::Accurate(a) => {
                    a.timeline.values.clear();
                    a.seek(0);
                }
                Slot::Midi(m) => m.clear(),
                _ => {}
            }
        }

        for event in events {
            match self.inputs.slot_mut(|s| &s.controls, event.control) {
                Some(Slot::Control(v)) => *v = event.value,
                Some(Slot::Accurate(a)) => a.timeline.insert(event.offset, event.value),
                _ => {}
            }
        }
        let carried = std::mem::take(&mut self.carried_midi);
        for event in carried.iter().chain(midi) {
            if let Some(Slot::Midi(m)) = self.inputs.slot_mut(|s| &s.midi, event.port) {
                m.push(event.message);
            }
        }
        self.carried_midi = carried;
        self.carried_midi.clear();
    }

    /// Take host events for a tick that will not be processed.
    ///
    /// Control events become running values right away, the last change by
    /// offset winning for sample-accurate inputs. MIDI waits for the next
    /// [`begin_tick`](Self::begin_tick) and lands at its first frame.
    pub(crate) fn absorb_skipped(&mut self, events: &[ControlEvent], midi: &[MidiEvent]) {
        for event in events {
            match self.inputs.slot_mut(|s| &s.controls, event.control) {
                Some(Slot::Control(v)) => *v = event.value,
                Some(Slot::Accurate(a)) => a.timeline.insert(event.offset, event.value),
                _ => {}
            }
        }
        for slot in &mut self.inputs.slots {
            if let Slot::Accurate(a) = slot {
                a.timeline.commit();
                a.current = a.timeline.value.unwrap_or(a.spec.default_value());
            }
        }
        self.carried_midi.extend(midi.iter().map(|e| {
            MidiEvent::new(e.port, MidiMessage::new(0, e.message.bytes))
        }));
    }

    /// Move sample-accurate inputs to their value at `frame`.
    pub(crate) fn seek_frame(&mut self, frame: usize) {
        for &field in self.inputs.accurate.fields() {
            if let Some(Slot::Accurate(a)) = self.inputs.slots.get_mut(field) {
                a.seek(frame);
            }
        }
    }

    /// Close a tick: fold input changes into running values, drop delivered
    /// messages and apply queued resizes.
    pub(crate) fn end_tick(&mut self) -> Vec<AppliedResize> {
        self.messages.clear();
        for slot in &mut self.inputs.slots {
            if let Slot::Accurate(a) = slot {
                a.timeline.commit();
                a.current = a.timeline.value.unwrap_or(a.spec.default_value());
            }
        }

        let mut applied = Vec::new();
        for (direction, side) in [
            (Direction::Inputs, &mut self.inputs),
            (Direction::Outputs, &mut self.outputs),
        ] {
            for index in 0..side.dynamic.len() {
                let Some(field) = side.dynamic.field_of(index) else {
                    continue;
                };
                let change = match side.slots.get_mut(field) {
                    Some(Slot::DynamicControls(c)) => c.apply_pending().map(|r| (r, false)),
                    Some(Slot::DynamicChannels(c)) => c.apply_pending().map(|r| (r, true)),
                    _ => None,
                };
                if let Some((resize, audio)) = change {
                    applied.push(AppliedResize {
                        direction,
                        index,
                        resize,
                        audio,
                    });
                }
            }
            side.refresh_audio_sizes();
        }
        applied
    }
}

// =============================================================================
// AudioPorts
// =============================================================================

enum Binding<'p, 'b, S> {
    Samples {
        inputs: &'p [S],
        outputs: &'p mut [S],
    },
    Mapped {
        inputs: Channels<'p, S>,
        outputs: ChannelsMut<'p, 'b, S>,
        layout: &'p BusLayout,
    },
}

/// Audio fields of a port-based component for one call.
///
/// Per-sample shapes see one value per declared sample port; per-channel
/// and per-bus shapes see the host channels their fields are bound to.
/// Fields that are not bound read as silence and ignore writes.
pub struct AudioPorts<'p, 'b, S: Sample> {
    binding: Binding<'p, 'b, S>,
}

impl<'p, 'b, S: Sample> AudioPorts<'p, 'b, S> {
    pub(crate) fn samples(inputs: &'p [S], outputs: &'p mut [S]) -> Self {
        Self {
            binding: Binding::Samples { inputs, outputs },
        }
    }

    pub(crate) fn mapped(inputs: Channels<'p, S>, outputs: ChannelsMut<'p, 'b, S>, layout: &'p BusLayout) -> Self {
        Self {
            binding: Binding::Mapped {
                inputs,
                outputs,
                layout,
            },
        }
    }

    /// Frames covered by this call (1 for per-sample shapes).
    pub fn frames(&self) -> usize {
        match &self.binding {
            Binding::Samples { .. } => 1,
            Binding::Mapped { inputs, .. } => inputs.frames(),
        }
    }

    /// Value of the `index`-th sample input.
    pub fn sample_in(&self, index: usize) -> S {
        match &self.binding {
            Binding::Samples { inputs, .. } => inputs.get(index).copied().unwrap_or(S::ZERO),
            Binding::Mapped { .. } => S::ZERO,
        }
    }

    /// Write the `index`-th sample output.
    pub fn set_sample_out(&mut self, index: usize, value: S) {
        if let Binding::Samples { outputs, .. } = &mut self.binding {
            if let Some(o) = outputs.get_mut(index) {
                *o = value;
            }
        }
    }

    /// The `index`-th static channel input.
    pub fn channel_in(&self, index: usize) -> &[S] {
        match &self.binding {
            Binding::Mapped { inputs, layout, .. } => layout
                .input(BusRole::Channel, index)
                .and_then(|b| inputs.channel(b.start))
                .unwrap_or(&[]),
            Binding::Samples { .. } => &[],
        }
    }

    /// The `index`-th static channel output.
    pub fn channel_out(&mut self, index: usize) -> Option<&mut [S]> {
        match &mut self.binding {
            Binding::Mapped { outputs, layout, .. } => {
                let start = layout.output(BusRole::Channel, index)?.start;
                outputs.channel_mut(start)
            }
            Binding::Samples { .. } => None,
        }
    }

    /// Channels of the `index`-th dynamic channel input collection.
    pub fn dynamic_in(&self, index: usize) -> Channels<'p, S> {
        self.input_range(BusRole::DynamicChannels, index)
    }

    /// Channels of the `index`-th dynamic channel output collection.
    pub fn dynamic_out(&mut self, index: usize) -> ChannelsMut<'_, 'b, S> {
        self.output_range(BusRole::DynamicChannels, index)
    }

    /// Channels of the `index`-th input bus.
    pub fn bus_in(&self, index: usize) -> Channels<'p, S> {
        self.input_range(BusRole::Bus, index)
    }

    /// Channels of the `index`-th output bus.
    pub fn bus_out(&mut self, index: usize) -> ChannelsMut<'_, 'b, S> {
        self.output_range(BusRole::Bus, index)
    }

    /// Every bound input channel.
    pub fn inputs(&self) -> Channels<'p, S> {
        match &self.binding {
            Binding::Mapped { inputs, .. } => *inputs,
            Binding::Samples { .. } => Channels::empty(1),
        }
    }

    /// Every bound output channel.
    pub fn outputs(&mut self) -> ChannelsMut<'_, 'b, S> {
        match &mut self.binding {
            Binding::Mapped { outputs, .. } => outputs.reborrow(),
            Binding::Samples { .. } => ChannelsMut::empty(1),
        }
    }

    fn input_range(&self, role: BusRole, index: usize) -> Channels<'p, S> {
        match &self.binding {
            Binding::Mapped { inputs, layout, .. } => match layout.input(role, index) {
                Some(b) => inputs.slice(b.range()),
                None => Channels::empty(inputs.frames()),
            },
            Binding::Samples { .. } => Channels::empty(1),
        }
    }

    fn output_range(&mut self, role: BusRole, index: usize) -> ChannelsMut<'_, 'b, S> {
        match &mut self.binding {
            Binding::Mapped { outputs, layout, .. } => match layout.output(role, index) {
                Some(b) => outputs.slice_mut(b.range()),
                None => ChannelsMut::empty(outputs.frames()),
            },
            Binding::Samples { .. } => ChannelsMut::empty(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::ChannelNegotiation;
    use crate::dispatch::Strategy;
    use crate::shape::tests::Probe;
    use crate::shape::Entry;

    fn shape() -> ComponentShape<Probe> {
        ComponentShape::<Probe>::new("ports")
            .input(FieldDescriptor::control("gain", ControlSpec::new(1.0, 0.0, 2.0)))
            .input(FieldDescriptor::control("freq", ControlSpec::new(100.0, 20.0, 20_000.0).sample_accurate()))
            .input(FieldDescriptor::control("q", ControlSpec::uninitialized(0.1, 10.0).sample_accurate()))
            .input(FieldDescriptor::midi("notes"))
            .input(FieldDescriptor::dynamic_channels("ins"))
            .output(FieldDescriptor::control("level", ControlSpec::new(0.0, 0.0, 1.0).sample_accurate()))
            .output(FieldDescriptor::midi("out"))
            .output(FieldDescriptor::callback("peak"))
            .output(FieldDescriptor::channel("mix"))
            .message(FieldDescriptor::message("reset", 0))
            .message(FieldDescriptor::message("seed", 1))
            .entry(Entry::Ports(Probe::ports))
    }

    #[test]
    fn test_controls_by_match_index() {
        let ports = Ports::new(&shape(), MergePolicy::default());
        assert_eq!(ports.control(0), Some(1.0));
        assert_eq!(ports.control(1), Some(100.0));
        assert_eq!(ports.control(2), Some(0.1));
        assert_eq!(ports.control(3), None);
        assert_eq!(ports.sample_accurate(1).map(|t| t.value), Some(None));
    }

    #[test]
    fn test_events_route_by_kind() {
        let mut ports = Ports::new(&shape(), MergePolicy::default());
        let events = [
            ControlEvent::new(0, 3, 0.5),
            ControlEvent::new(0, 7, 0.75),
            ControlEvent::new(1, 4, 440.0),
        ];
        let midi = [MidiEvent::new(0, MidiMessage::new(2, [0x90, 60, 100]))];
        ports.begin_tick(&events, &midi);

        assert_eq!(ports.control(0), Some(0.75));
        assert_eq!(ports.control(1), Some(100.0));
        assert_eq!(ports.sample_accurate(0).map(|t| t.values.len()), Some(1));
        assert_eq!(ports.midi_in(0).len(), 1);

        ports.seek_frame(5);
        assert_eq!(ports.control(1), Some(440.0));

        ports.end_tick();
        assert_eq!(ports.control(1), Some(440.0));
        assert_eq!(ports.sample_accurate(0).map(|t| t.has_changes()), Some(false));
    }

    #[test]
    fn test_merged_follows_policy() {
        let events = [ControlEvent::new(1, 0, 200.0), ControlEvent::new(2, 5, 2.0)];

        let mut skip = Ports::new(&shape(), MergePolicy::SkipUntilKnown);
        skip.begin_tick(&events, &[]);
        assert_eq!(skip.merged(&[0, 1]).offsets().collect::<Vec<_>>(), vec![5]);

        let mut fill = Ports::new(&shape(), MergePolicy::FillInitial);
        fill.begin_tick(&events, &[]);
        let merged = fill.merged(&[0, 1]);
        assert_eq!(merged.offsets().collect::<Vec<_>>(), vec![0, 5]);
        assert_eq!(merged.rows()[0].values, vec![200.0, 0.1]);
    }

    #[test]
    fn test_outputs_cleared_each_tick() {
        let mut ports = Ports::new(&shape(), MergePolicy::default());
        ports.begin_tick(&[], &[]);
        ports.push_output(0, 2, 0.5);
        ports.push_output(0, 6, 0.25);
        ports.send_midi(0, MidiMessage::new(0, [0x80, 60, 0]));
        ports.emit(0, 0.9);
        assert_eq!(ports.output_events(0).count(), 2);
        assert_eq!(ports.midi_out(0).len(), 1);
        assert_eq!(ports.callbacks(0), &[0.9]);
        ports.end_tick();

        ports.begin_tick(&[], &[]);
        assert_eq!(ports.output_events(0).count(), 0);
        assert!(ports.midi_out(0).is_empty());
        assert!(ports.callbacks(0).is_empty());
        assert_eq!(ports.output(0), Some(0.25));
    }

    #[test]
    fn test_skipped_events_fold_into_running_values() {
        let mut ports = Ports::new(&shape(), MergePolicy::default());
        let events = [
            ControlEvent::new(0, 0, 0.5),
            ControlEvent::new(1, 6, 880.0),
            ControlEvent::new(1, 2, 220.0),
        ];
        let midi = [MidiEvent::new(0, MidiMessage::new(9, [0x90, 64, 90]))];
        ports.absorb_skipped(&events, &midi);

        assert_eq!(ports.control(0), Some(0.5));
        assert_eq!(ports.control(1), Some(880.0));
        assert_eq!(ports.sample_accurate(0).map(|t| t.value), Some(Some(880.0)));
        assert_eq!(ports.sample_accurate(0).map(|t| t.has_changes()), Some(false));
        assert!(ports.midi_in(0).is_empty());

        ports.begin_tick(&[], &[MidiEvent::new(0, MidiMessage::new(1, [0x80, 64, 0]))]);
        assert_eq!(ports.control(1), Some(880.0));
        assert_eq!(
            ports.midi_in(0),
            &[MidiMessage::new(0, [0x90, 64, 90]), MidiMessage::new(1, [0x80, 64, 0])]
        );
        ports.end_tick();

        ports.begin_tick(&[], &[]);
        assert!(ports.midi_in(0).is_empty());
    }

    #[test]
    fn test_messages_checked_and_cleared() {
        let mut ports = Ports::new(&shape(), MergePolicy::default());
        assert!(ports.queue_message(0, &[]));
        assert!(ports.queue_message(1, &[42.0]));
        assert!(!ports.queue_message(1, &[]));
        assert!(!ports.queue_message(2, &[]));
        assert_eq!(ports.messages().len(), 2);
        ports.end_tick();
        assert!(ports.messages().is_empty());
    }

    #[test]
    fn test_resize_applies_between_ticks() {
        let mut ports = Ports::new(&shape(), MergePolicy::default());
        ports.request_resize(Direction::Inputs, 0, 3);
        assert_eq!(ports.dynamic_len(Direction::Inputs, 0), Some(0));
        assert_eq!(ports.dynamic_audio_sizes(Direction::Inputs), &[0]);

        let applied = ports.end_tick();
        assert_eq!(applied.len(), 1);
        assert!(applied[0].audio);
        assert_eq!(applied[0].resize, Resize { from: 0, to: 3 });
        assert_eq!(ports.dynamic_len(Direction::Inputs, 0), Some(3));
        assert_eq!(ports.dynamic_audio_sizes(Direction::Inputs), &[3]);
        assert_eq!(ports.dynamic_len(Direction::Outputs, 0), None);
    }

    #[test]
    fn test_audio_ports_mapping() {
        let shape = shape();
        let layout = BusLayout::for_strategy(
            &shape,
            Strategy::PerChannelPort,
            ChannelNegotiation::new(2, 1),
            &[2],
            &[],
        );
        let inputs = vec![vec![1.0f32; 4], vec![2.0; 4]];
        let mut outputs = vec![vec![0.0f32; 4]];
        let mut audio = AudioPorts::mapped(
            Channels::from_owned(&inputs, 4),
            ChannelsMut::from_owned(&mut outputs, 4),
            &layout,
        );
        assert_eq!(audio.dynamic_in(0).len(), 2);
        assert!(audio.channel_in(0).is_empty());
        if let Some(out) = audio.channel_out(0) {
            out.fill(3.0);
        }
        assert!(audio.channel_out(1).is_none());
        assert_eq!(audio.sample_in(0), 0.0);
        drop(audio);
        assert_eq!(outputs[0], vec![3.0; 4]);
    }

    #[test]
    fn test_audio_ports_samples() {
        let inputs = [0.5f64, 0.25];
        let mut outputs = [0.0f64; 1];
        let mut audio = AudioPorts::<f64>::samples(&inputs, &mut outputs);
        assert_eq!(audio.sample_in(1), 0.25);
        assert_eq!(audio.sample_in(2), 0.0);
        audio.set_sample_out(0, 1.5);
        audio.set_sample_out(4, 9.0);
        assert!(audio.bus_in(0).is_empty());
        assert_eq!(outputs, [1.5]);
    }
}
