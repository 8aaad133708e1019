//! Per-tick processing context.
//!
//! A [`Tick`] is what the host hands the adapter for every block: how many
//! frames to render and, when the host knows it, where the block sits on the
//! timeline.
//!
//! # Example
//!
//! ```ignore
//! fn process(&mut self, input: &[f32], output: &mut [f32], ports: &mut Ports, tick: &Tick) {
//!     let tempo = tick.position.and_then(|p| p.tempo).unwrap_or(120.0);
//!     // ...
//! }
//! ```

/// Host timeline information. Every field is optional because hosts vary in
/// what they report.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    /// Absolute position of the first frame, in samples.
    pub frame: Option<i64>,
    /// Musical position of the first frame, in quarter notes.
    pub beats: Option<f64>,
    /// Tempo in BPM.
    pub tempo: Option<f64>,
    /// Time signature as (numerator, denominator).
    pub time_signature: Option<(u32, u32)>,
    /// Whether the transport is running.
    pub is_playing: bool,
}

impl Position {
    pub const fn new() -> Self {
        Self {
            frame: None,
            beats: None,
            tempo: None,
            time_signature: None,
            is_playing: false,
        }
    }

    pub const fn with_frame(mut self, frame: i64) -> Self {
        self.frame = Some(frame);
        self
    }

    pub const fn with_beats(mut self, beats: f64) -> Self {
        self.beats = Some(beats);
        self
    }

    pub const fn with_tempo(mut self, tempo: f64) -> Self {
        self.tempo = Some(tempo);
        self
    }

    pub const fn with_time_signature(mut self, numerator: u32, denominator: u32) -> Self {
        self.time_signature = Some((numerator, denominator));
        self
    }

    pub const fn playing(mut self) -> Self {
        self.is_playing = true;
        self
    }

    /// Length of one beat in samples, if the tempo is known.
    pub fn samples_per_beat(&self, sample_rate: f64) -> Option<f64> {
        self.tempo
            .filter(|t| *t > 0.0)
            .map(|t| sample_rate * 60.0 / t)
    }
}

/// One processing block.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tick {
    /// Frames to render in this block.
    pub frames: usize,
    /// Timeline position, when the host provides one.
    pub position: Option<Position>,
}

impl Tick {
    pub const fn new(frames: usize) -> Self {
        Self {
            frames,
            position: None,
        }
    }

    pub const fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Whether `offset` falls inside this block.
    #[inline]
    pub const fn contains(&self, offset: usize) -> bool {
        offset < self.frames
    }
}
