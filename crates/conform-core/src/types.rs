//! Common types shared by the host-facing side of the engine.

use serde::{Deserialize, Serialize};

// =============================================================================
// Buffer Limits
// =============================================================================
//
// Upper bounds checked when a bus layout is computed. A layout beyond these
// is logged and the component is not invoked; nothing panics on the tick path.
// =============================================================================

/// Maximum number of channels a single bus or direction may carry.
pub const MAX_CHANNELS: usize = 64;

/// Maximum number of audio buses per direction.
pub const MAX_BUSES: usize = 32;

// =============================================================================
// Host Events
// =============================================================================

/// A timed control change delivered by the host.
///
/// `control` is the index of the target among the component's control inputs
/// (see [`is_control`](crate::predicates::is_control)). Offsets are trusted;
/// only those below the tick's frame count are visited by per-sample walks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlEvent {
    pub control: usize,
    pub offset: usize,
    pub value: f64,
}

impl ControlEvent {
    pub const fn new(control: usize, offset: usize, value: f64) -> Self {
        Self {
            control,
            offset,
            value,
        }
    }
}

/// A short MIDI message at a frame offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiMessage {
    pub offset: usize,
    pub bytes: [u8; 3],
}

impl MidiMessage {
    pub const fn new(offset: usize, bytes: [u8; 3]) -> Self {
        Self { offset, bytes }
    }

    /// Status nibble (message type without channel).
    #[inline]
    pub const fn status(&self) -> u8 {
        self.bytes[0] & 0xF0
    }

    /// MIDI channel (0-15).
    #[inline]
    pub const fn channel(&self) -> u8 {
        self.bytes[0] & 0x0F
    }
}

/// A MIDI message addressed to one of the component's MIDI inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiEvent {
    pub port: usize,
    pub message: MidiMessage,
}

impl MidiEvent {
    pub const fn new(port: usize, message: MidiMessage) -> Self {
        Self { port, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midi_status_and_channel() {
        let msg = MidiMessage::new(3, [0x93, 60, 100]);
        assert_eq!(msg.status(), 0x90);
        assert_eq!(msg.channel(), 3);
        assert_eq!(msg.offset, 3);
    }
}
