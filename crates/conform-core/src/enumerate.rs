//! Ordered enumeration of fields matching a predicate.
//!
//! Every part of the engine that needs "all controls" or "all audio buses"
//! asks this module. A match carries two indices: its position in full
//! declaration order and its position among the matches. The second is what
//! hosts and components address ports by, and it depends only on the
//! matching fields, never on unrelated ones declared around them.

use crate::shape::FieldDescriptor;

/// Field-level predicate.
pub type FieldPredicate = fn(&FieldDescriptor) -> bool;

/// A field that matched a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldMatch {
    /// Position in declaration order.
    pub field: usize,
    /// Position among the fields matching the same predicate.
    pub index: usize,
}

/// Matching fields in declaration order, with their descriptors.
pub fn matches(
    fields: &[FieldDescriptor],
    predicate: FieldPredicate,
) -> impl Iterator<Item = (FieldMatch, &FieldDescriptor)> + '_ {
    fields
        .iter()
        .enumerate()
        .filter(move |(_, f)| predicate(f))
        .enumerate()
        .map(|(index, (field, descriptor))| (FieldMatch { field, index }, descriptor))
}

/// Matching fields in declaration order.
pub fn enumerate(fields: &[FieldDescriptor], predicate: FieldPredicate) -> Vec<FieldMatch> {
    matches(fields, predicate).map(|(m, _)| m).collect()
}

/// Number of matching fields.
pub fn count(fields: &[FieldDescriptor], predicate: FieldPredicate) -> usize {
    fields.iter().filter(|f| predicate(f)).count()
}

/// Two-way mapping between declaration indices and match indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldIndexMap {
    to_index: Vec<Option<usize>>,
    to_field: Vec<usize>,
}

impl FieldIndexMap {
    pub fn new(fields: &[FieldDescriptor], predicate: FieldPredicate) -> Self {
        let mut to_index = vec![None; fields.len()];
        let mut to_field = Vec::new();
        for (m, _) in matches(fields, predicate) {
            to_index[m.field] = Some(m.index);
            to_field.push(m.field);
        }
        Self { to_index, to_field }
    }

    /// Match index of the field declared at `field`, if it matches.
    #[inline]
    pub fn index_of(&self, field: usize) -> Option<usize> {
        self.to_index.get(field).copied().flatten()
    }

    /// Declaration index of the `index`-th match.
    #[inline]
    pub fn field_of(&self, index: usize) -> Option<usize> {
        self.to_field.get(index).copied()
    }

    /// Number of matches.
    #[inline]
    pub fn len(&self) -> usize {
        self.to_field.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.to_field.is_empty()
    }

    /// Declaration indices of all matches, in order.
    pub fn fields(&self) -> &[usize] {
        &self.to_field
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicates::{is_audio_bus, is_control, is_midi};
    use crate::shape::ControlSpec;

    fn fields() -> Vec<FieldDescriptor> {
        let spec = ControlSpec::new(0.0, 0.0, 1.0);
        vec![
            FieldDescriptor::control("a", spec),
            FieldDescriptor::bus("main", 2),
            FieldDescriptor::control("b", spec),
            FieldDescriptor::midi("notes"),
            FieldDescriptor::control("c", spec),
        ]
    }

    #[test]
    fn test_enumerate_in_declaration_order() {
        let found = enumerate(&fields(), is_control);
        assert_eq!(
            found,
            vec![
                FieldMatch { field: 0, index: 0 },
                FieldMatch { field: 2, index: 1 },
                FieldMatch { field: 4, index: 2 },
            ]
        );
        assert_eq!(count(&fields(), is_audio_bus), 1);
    }

    #[test]
    fn test_indices_ignore_unrelated_fields() {
        let mut reordered = fields();
        // Moving the non-control fields around leaves control indices alone.
        reordered.swap(1, 3);
        reordered.insert(0, FieldDescriptor::callback("cb"));
        let names: Vec<_> = matches(&reordered, is_control)
            .map(|(m, f)| (m.index, f.name))
            .collect();
        assert_eq!(names, vec![(0, "a"), (1, "b"), (2, "c")]);
    }

    #[test]
    fn test_index_map_both_ways() {
        let map = FieldIndexMap::new(&fields(), is_control);
        assert_eq!(map.len(), 3);
        assert_eq!(map.index_of(2), Some(1));
        assert_eq!(map.index_of(1), None);
        assert_eq!(map.index_of(99), None);
        assert_eq!(map.field_of(2), Some(4));
        assert_eq!(map.field_of(3), None);

        let midi = FieldIndexMap::new(&fields(), is_midi);
        assert_eq!(midi.fields(), &[3]);
        assert!(FieldIndexMap::new(&[], is_midi).is_empty());
    }
}
