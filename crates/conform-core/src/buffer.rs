//! Channel views handed to components.
//!
//! [`Channels`] and [`ChannelsMut`] present either host channel arrays (when
//! host and component precision match) or the adapter's scratch storage as
//! the same thing: an indexable list of channel slices, each truncated to the
//! tick's frame count. Components never learn which one they got.

use std::ops::Range;
use std::slice;

use crate::sample::Sample;

fn clamp_range(range: Range<usize>, len: usize) -> Range<usize> {
    let end = range.end.min(len);
    range.start.min(end)..end
}

// =============================================================================
// Channels
// =============================================================================

#[derive(Debug)]
enum Source<'a, S> {
    Host(&'a [&'a [S]]),
    Owned(&'a [Vec<S>]),
}

impl<S> Clone for Source<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Source<'_, S> {}

/// Read-only view of input channels.
#[derive(Debug)]
pub struct Channels<'a, S> {
    source: Source<'a, S>,
    frames: usize,
}

impl<S> Clone for Channels<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Channels<'_, S> {}

impl<'a, S: Sample> Channels<'a, S> {
    /// View over host channel arrays.
    pub fn from_host(channels: &'a [&'a [S]], frames: usize) -> Self {
        Self {
            source: Source::Host(channels),
            frames,
        }
    }

    /// View over owned buffers.
    pub fn from_owned(channels: &'a [Vec<S>], frames: usize) -> Self {
        Self {
            source: Source::Owned(channels),
            frames,
        }
    }

    /// A view with no channels.
    pub fn empty(frames: usize) -> Self {
        Self::from_owned(&[], frames)
    }

    /// Number of channels.
    #[inline]
    pub fn len(&self) -> usize {
        match self.source {
            Source::Host(c) => c.len(),
            Source::Owned(c) => c.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frames in this tick.
    #[inline]
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// One channel, truncated to the tick's frame count.
    #[inline]
    pub fn channel(&self, index: usize) -> Option<&'a [S]> {
        let channel: &'a [S] = match self.source {
            Source::Host(c) => c.get(index)?,
            Source::Owned(c) => c.get(index)?.as_slice(),
        };
        Some(&channel[..self.frames.min(channel.len())])
    }

    /// Iterate over all channels.
    pub fn iter(&self) -> impl Iterator<Item = &'a [S]> + '_ {
        (0..self.len()).filter_map(move |i| self.channel(i))
    }

    /// Sub-view over a range of channels. Out-of-range parts are dropped.
    pub fn slice(&self, range: Range<usize>) -> Channels<'a, S> {
        let range = clamp_range(range, self.len());
        let source = match self.source {
            Source::Host(c) => Source::Host(&c[range]),
            Source::Owned(c) => Source::Owned(&c[range]),
        };
        Channels {
            source,
            frames: self.frames,
        }
    }
}

// =============================================================================
// ChannelsMut
// =============================================================================

#[derive(Debug)]
enum SourceMut<'a, 'b, S> {
    Host(&'a mut [&'b mut [S]]),
    Owned(&'a mut [Vec<S>]),
}

/// Writable view of output channels.
#[derive(Debug)]
pub struct ChannelsMut<'a, 'b, S> {
    source: SourceMut<'a, 'b, S>,
    frames: usize,
}

impl<'a, 'b, S: Sample> ChannelsMut<'a, 'b, S> {
    /// View over host channel arrays.
    pub fn from_host(channels: &'a mut [&'b mut [S]], frames: usize) -> Self {
        Self {
            source: SourceMut::Host(channels),
            frames,
        }
    }

    /// View over owned buffers.
    pub fn from_owned(channels: &'a mut [Vec<S>], frames: usize) -> Self {
        Self {
            source: SourceMut::Owned(channels),
            frames,
        }
    }

    /// A view with no channels.
    pub fn empty(frames: usize) -> Self {
        Self::from_owned(&mut [], frames)
    }

    #[inline]
    pub fn len(&self) -> usize {
        match &self.source {
            SourceMut::Host(c) => c.len(),
            SourceMut::Owned(c) => c.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// One channel, truncated to the tick's frame count.
    #[inline]
    pub fn channel(&self, index: usize) -> Option<&[S]> {
        let channel: &[S] = match &self.source {
            SourceMut::Host(c) => c.get(index)?,
            SourceMut::Owned(c) => c.get(index)?,
        };
        Some(&channel[..self.frames.min(channel.len())])
    }

    /// One channel for writing, truncated to the tick's frame count.
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> Option<&mut [S]> {
        let frames = self.frames;
        let channel: &mut [S] = match &mut self.source {
            SourceMut::Host(c) => c.get_mut(index)?,
            SourceMut::Owned(c) => c.get_mut(index)?,
        };
        let n = frames.min(channel.len());
        Some(&mut channel[..n])
    }

    /// Iterate over all channels for writing.
    pub fn iter_mut(&mut self) -> IterMut<'_, 'b, S> {
        let inner = match &mut self.source {
            SourceMut::Host(c) => IterMutInner::Host(c.iter_mut()),
            SourceMut::Owned(c) => IterMutInner::Owned(c.iter_mut()),
        };
        IterMut {
            inner,
            frames: self.frames,
        }
    }

    /// Reborrow a range of channels. Out-of-range parts are dropped.
    pub fn slice_mut(&mut self, range: Range<usize>) -> ChannelsMut<'_, 'b, S> {
        let range = clamp_range(range, self.len());
        let source = match &mut self.source {
            SourceMut::Host(c) => SourceMut::Host(&mut c[range]),
            SourceMut::Owned(c) => SourceMut::Owned(&mut c[range]),
        };
        ChannelsMut {
            source,
            frames: self.frames,
        }
    }

    /// Reborrow every channel.
    pub fn reborrow(&mut self) -> ChannelsMut<'_, 'b, S> {
        let len = self.len();
        self.slice_mut(0..len)
    }

    /// Split into channels `[0, mid)` and `[mid, len)`.
    pub fn split_at(self, mid: usize) -> (ChannelsMut<'a, 'b, S>, ChannelsMut<'a, 'b, S>) {
        let frames = self.frames;
        let (left, right) = match self.source {
            SourceMut::Host(c) => {
                let mid = mid.min(c.len());
                let (l, r) = c.split_at_mut(mid);
                (SourceMut::Host(l), SourceMut::Host(r))
            }
            SourceMut::Owned(c) => {
                let mid = mid.min(c.len());
                let (l, r) = c.split_at_mut(mid);
                (SourceMut::Owned(l), SourceMut::Owned(r))
            }
        };
        (
            ChannelsMut {
                source: left,
                frames,
            },
            ChannelsMut {
                source: right,
                frames,
            },
        )
    }

    /// Write `value` to every frame of every channel.
    pub fn fill(&mut self, value: S) {
        for channel in self.iter_mut() {
            channel.fill(value);
        }
    }

    /// Copy channel-by-channel from `source`; extra channels are left alone.
    pub fn copy_from(&mut self, source: &Channels<'_, S>) {
        for (i, out) in self.iter_mut().enumerate() {
            if let Some(input) = source.channel(i) {
                let n = out.len().min(input.len());
                out[..n].copy_from_slice(&input[..n]);
            }
        }
    }

    /// Add channel-by-channel from owned buffers.
    pub fn accumulate(&mut self, source: &[Vec<S>]) {
        for (out, input) in self.iter_mut().zip(source) {
            for (o, i) in out.iter_mut().zip(input) {
                *o += *i;
            }
        }
    }
}

enum IterMutInner<'c, 'b, S> {
    Host(slice::IterMut<'c, &'b mut [S]>),
    Owned(slice::IterMut<'c, Vec<S>>),
}

/// Iterator over writable channels, see [`ChannelsMut::iter_mut`].
pub struct IterMut<'c, 'b, S> {
    inner: IterMutInner<'c, 'b, S>,
    frames: usize,
}

impl<'c, 'b, S> Iterator for IterMut<'c, 'b, S> {
    type Item = &'c mut [S];

    fn next(&mut self) -> Option<Self::Item> {
        let channel: &'c mut [S] = match &mut self.inner {
            IterMutInner::Host(it) => &mut **it.next()?,
            IterMutInner::Owned(it) => it.next()?.as_mut_slice(),
        };
        let n = self.frames.min(channel.len());
        Some(&mut channel[..n])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_views_truncate_to_frames() {
        let a = [1.0f32, 2.0, 3.0, 4.0];
        let host: [&[f32]; 1] = [&a];
        let view = Channels::from_host(&host, 2);
        assert_eq!(view.channel(0), Some(&[1.0f32, 2.0][..]));
        assert_eq!(view.channel(1), None);

        let owned = vec![vec![0.5f64; 8]];
        let view = Channels::from_owned(&owned, 3);
        assert_eq!(view.channel(0).map(|c| c.len()), Some(3));
    }

    #[test]
    fn test_slice_clamps() {
        let owned = vec![vec![1.0f32; 2], vec![2.0; 2], vec![3.0; 2]];
        let view = Channels::from_owned(&owned, 2);
        let tail = view.slice(1..10);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail.channel(0), Some(&[2.0f32, 2.0][..]));
        assert!(view.slice(5..7).is_empty());
    }

    #[test]
    fn test_split_and_fill() {
        let mut a = [0.0f32; 3];
        let mut b = [0.0f32; 3];
        let mut host: [&mut [f32]; 2] = [&mut a, &mut b];
        let view = ChannelsMut::from_host(&mut host, 2);
        let (mut left, mut right) = view.split_at(1);
        left.fill(1.0);
        right.fill(2.0);
        assert_eq!(a, [1.0, 1.0, 0.0]);
        assert_eq!(b, [2.0, 2.0, 0.0]);
    }

    #[test]
    fn test_copy_and_accumulate() {
        let input = vec![vec![1.0f64, 2.0], vec![3.0, 4.0]];
        let mut output = vec![vec![0.0f64; 2]; 2];
        let mut view = ChannelsMut::from_owned(&mut output, 2);
        view.copy_from(&Channels::from_owned(&input, 2));
        view.accumulate(&input);
        assert_eq!(output, vec![vec![2.0, 4.0], vec![6.0, 8.0]]);
    }

    #[test]
    fn test_slice_mut_writes_through() {
        let mut output = vec![vec![0.0f32; 2]; 3];
        let mut view = ChannelsMut::from_owned(&mut output, 2);
        {
            let mut middle = view.slice_mut(1..2);
            assert_eq!(middle.len(), 1);
            if let Some(ch) = middle.channel_mut(0) {
                ch[1] = 9.0;
            }
        }
        assert_eq!(view.channel(1), Some(&[0.0f32, 9.0][..]));
        assert_eq!(view.reborrow().len(), 3);
    }
}
