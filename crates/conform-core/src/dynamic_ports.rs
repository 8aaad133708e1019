//! Resizable homogeneous port collections.
//!
//! A component may own collections whose length it chooses at runtime, such
//! as a mixer's inputs. Resizing keeps the overlap of the old and new
//! contents, default-constructs new entries and drops removed ones. Requests
//! made while a tick is running are queued and applied between ticks.

/// A resize that was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resize {
    pub from: usize,
    pub to: usize,
}

/// Ordered, resizable collection of ports.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DynamicPorts<T> {
    ports: Vec<T>,
    pending: Option<usize>,
}

/// A dynamic collection of mono audio channels; only the count matters.
pub type DynamicChannels = DynamicPorts<()>;

impl<T: Default> DynamicPorts<T> {
    /// An empty collection.
    pub fn new() -> Self {
        Self {
            ports: Vec::new(),
            pending: None,
        }
    }

    pub fn from_vec(ports: Vec<T>) -> Self {
        Self { ports, pending: None }
    }

    /// Resize to exactly `count` entries now.
    ///
    /// Entries `[0, min(old, count))` are kept.
    pub fn resize(&mut self, count: usize) -> Resize {
        let from = self.ports.len();
        self.ports.resize_with(count, T::default);
        Resize { from, to: count }
    }

    /// Ask for a resize at the next tick boundary. The latest request wins.
    pub fn request_resize(&mut self, count: usize) {
        self.pending = Some(count);
    }

    /// Size requested but not applied yet.
    pub fn pending(&self) -> Option<usize> {
        self.pending
    }

    /// Apply a queued request, if any. Returns the resize when the length
    /// actually changed.
    pub fn apply_pending(&mut self) -> Option<Resize> {
        let count = self.pending.take()?;
        if count == self.ports.len() {
            return None;
        }
        Some(self.resize(count))
    }
}

impl<T> DynamicPorts<T> {
    #[inline]
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.ports.get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.ports.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.ports.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.ports.iter_mut()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.ports
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_preserves_overlap() {
        let mut ports = DynamicPorts::from_vec(vec![10, 20, 30]);
        assert_eq!(ports.resize(5), Resize { from: 3, to: 5 });
        assert_eq!(ports.as_slice(), &[10, 20, 30, 0, 0]);
        ports.resize(1);
        assert_eq!(ports.as_slice(), &[10]);
        ports.resize(0);
        assert!(ports.is_empty());
    }

    #[test]
    fn test_requests_wait_for_apply() {
        let mut ports: DynamicPorts<f64> = DynamicPorts::new();
        ports.request_resize(2);
        ports.request_resize(3);
        assert_eq!(ports.len(), 0);
        assert_eq!(ports.pending(), Some(3));

        assert_eq!(ports.apply_pending(), Some(Resize { from: 0, to: 3 }));
        assert_eq!(ports.len(), 3);
        assert_eq!(ports.apply_pending(), None);

        ports.request_resize(3);
        assert_eq!(ports.apply_pending(), None);
        assert_eq!(ports.pending(), None);
    }

    #[test]
    fn test_channel_collections_count_only() {
        let mut chans = DynamicChannels::new();
        chans.resize(4);
        assert_eq!(chans.len(), 4);
        assert!(chans.get(3).is_some());
        assert!(chans.get(4).is_none());
    }
}
