//! Sample type abstraction for f32/f64 processing.
//!
//! Components declare the precision they compute in through
//! [`Component::Sample`](crate::Component::Sample); hosts hand the adapter
//! buffers in their own precision. Everything in between is generic over
//! [`Sample`] and monomorphizes to plain float code.

use std::any::TypeId;
use std::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Serialize};

/// Numeric precision of a sample type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleFormat {
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
}

/// Trait for audio sample types (f32, f64).
///
/// Only the operations the adapter needs on its own paths: conversion,
/// silence and accumulation for summed voices.
pub trait Sample:
    Copy
    + Default
    + Send
    + Sync
    + PartialEq
    + PartialOrd
    + std::fmt::Debug
    + 'static
    + Add<Output = Self>
    + AddAssign
    + Sub<Output = Self>
    + Mul<Output = Self>
{
    /// Zero value (0.0).
    const ZERO: Self;

    /// Unit value (1.0).
    const ONE: Self;

    /// Precision tag of this type.
    const FORMAT: SampleFormat;

    /// Convert from f32.
    fn from_f32(value: f32) -> Self;

    /// Convert to f32.
    fn to_f32(self) -> f32;

    /// Convert from f64.
    fn from_f64(value: f64) -> Self;

    /// Convert to f64.
    fn to_f64(self) -> f64;

    /// Convert into another sample type. Lossy only by the target's rounding.
    #[inline(always)]
    fn convert<T: Sample>(self) -> T {
        T::from_f64(self.to_f64())
    }
}

impl Sample for f32 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const FORMAT: SampleFormat = SampleFormat::F32;

    #[inline(always)]
    fn from_f32(value: f32) -> Self {
        value
    }

    #[inline(always)]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    #[inline(always)]
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Sample for f64 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const FORMAT: SampleFormat = SampleFormat::F64;

    #[inline(always)]
    fn from_f32(value: f32) -> Self {
        value as f64
    }

    #[inline(always)]
    fn to_f32(self) -> f32 {
        self as f32
    }

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        value
    }

    #[inline(always)]
    fn to_f64(self) -> f64 {
        self
    }
}

/// Whether two sample types are the same type, so buffers can be shared
/// without conversion.
#[inline]
pub fn same_format<A: Sample, B: Sample>() -> bool {
    TypeId::of::<A>() == TypeId::of::<B>()
}

/// Reinterpret host input channels as component channels when the types match.
pub(crate) fn cast_inputs<'a, H: Sample, S: Sample>(channels: &'a [&'a [H]]) -> Option<&'a [&'a [S]]> {
    if !same_format::<H, S>() {
        return None;
    }
    let ptr = channels as *const [&'a [H]] as *const [&'a [S]];
    // SAFETY: H and S are the same type (checked through TypeId above), so the
    // layout and lifetime of the slice are unchanged.
    Some(unsafe { &*ptr })
}

/// Reinterpret host output channels as component channels when the types match.
pub(crate) fn cast_outputs<'a, 'b, H: Sample, S: Sample>(
    channels: &'a mut [&'b mut [H]],
) -> Option<&'a mut [&'b mut [S]]> {
    if !same_format::<H, S>() {
        return None;
    }
    let ptr = channels as *mut [&'b mut [H]] as *mut [&'b mut [S]];
    // SAFETY: H and S are the same type (checked through TypeId above); the
    // exclusive borrow is carried over unchanged.
    Some(unsafe { &mut *ptr })
}
