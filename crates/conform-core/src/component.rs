//! The trait user components implement.

use crate::sample::Sample;
use crate::setup::ProcessSetup;
use crate::shape::ComponentShape;

/// A processing component the adapter can drive.
///
/// The component describes itself through [`shape`](Component::shape); the
/// adapter resolves that description once per type and then calls the
/// declared entry point every tick. Components never see host buffers or
/// host precision directly.
///
/// # Example
///
/// ```ignore
/// struct Gain;
///
/// impl Component for Gain {
///     type Sample = f32;
///
///     fn shape() -> ComponentShape<Self> {
///         ComponentShape::new("gain")
///             .input(FieldDescriptor::control("gain", ControlSpec::new(1.0, 0.0, 2.0)))
///             .entry(Entry::ChannelArg(Gain::run))
///     }
///
///     fn create() -> Self {
///         Gain
///     }
/// }
/// ```
pub trait Component: Send + Sized + 'static {
    /// Precision the component computes in.
    type Sample: Sample;

    /// Structural description of this component type.
    fn shape() -> ComponentShape<Self>;

    /// Create a fresh instance. Called for every channel and voice replica.
    fn create() -> Self;

    /// Prepare an instance for processing.
    ///
    /// Called before the first tick of every instance, and again whenever the
    /// host prepares the adapter. The default does nothing.
    fn prepare(&mut self, _setup: &ProcessSetup) {}
}
