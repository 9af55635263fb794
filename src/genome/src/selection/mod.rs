/// Immutable boolean mask over the rows (variants) or columns (samples) of a
/// [`GenotypeMatrix`](crate::GenotypeMatrix), with a cached count of selected entries.
///
/// Selections only ever narrow: every derived selection is a subset of its parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    mask : Vec<bool>,
    count: usize,
}

impl Selection {
    /// Select every entry of a domain of size `len`.
    #[must_use]
    pub fn all(len: usize) -> Self {
        Self { mask: vec![true; len], count: len }
    }

    /// Select nothing out of a domain of size `len`.
    #[must_use]
    pub fn none(len: usize) -> Self {
        Self { mask: vec![false; len], count: 0 }
    }

    #[must_use]
    pub fn from_mask(mask: Vec<bool>) -> Self {
        let count = mask.iter().filter(|selected| **selected).count();
        Self { mask, count }
    }

    /// Size of the underlying domain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mask.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of selected entries.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.mask.get(index).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    /// Indices of the selected entries, in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.mask.iter().enumerate().filter_map(|(i, selected)| selected.then_some(i))
    }

    /// Keep the currently selected entries for which `keep` returns `true`.
    #[must_use]
    pub fn narrow<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(usize) -> bool
    {
        let mask = self.mask.iter().enumerate()
            .map(|(i, selected)| *selected && keep(i))
            .collect();
        Self::from_mask(mask)
    }

    /// Entries selected in both `self` and `other`.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        self.narrow(|i| other.contains(i))
    }

    #[must_use]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.len() == other.len() && self.indices().all(|i| other.contains(i))
    }

    /// Entries selected in `self` but not in `narrowed`.
    pub fn dropped<'a>(&'a self, narrowed: &'a Self) -> impl Iterator<Item = usize> + 'a {
        self.indices().filter(move |i| !narrowed.contains(*i))
    }
}

impl FromIterator<bool> for Selection {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        Self::from_mask(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts() {
        let selection = Selection::from_mask(vec![true, false, true, true]);
        assert_eq!(selection.len(), 4);
        assert_eq!(selection.count(), 3);
        assert_eq!(selection.indices().collect::<Vec<_>>(), vec![0, 2, 3]);
        assert!(!selection.contains(1));
        assert!(!selection.contains(42));
    }

    #[test]
    fn narrow_never_enlarges() {
        let parent = Selection::from_mask(vec![true, false, true, false, true]);
        let child  = parent.narrow(|i| i != 2);
        assert_eq!(child.indices().collect::<Vec<_>>(), vec![0, 4]);
        assert!(child.is_subset_of(&parent));

        let everything = parent.narrow(|_| true);
        assert_eq!(everything, parent);
        assert_eq!(parent.dropped(&child).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn intersect() {
        let a: Selection = [true, true, false, true].into_iter().collect();
        let b: Selection = [false, true, true, true].into_iter().collect();
        assert_eq!(a.intersect(&b).indices().collect::<Vec<_>>(), vec![1, 3]);
        assert!(Selection::none(4).is_subset_of(&a));
        assert!(!Selection::all(4).is_subset_of(&a));
        assert!(!Selection::all(3).is_subset_of(&Selection::all(4)));
    }

    #[test]
    fn empty() {
        assert!(Selection::none(3).is_empty());
        assert!(Selection::all(0).is_empty());
        assert_eq!(Selection::all(3).count(), 3);
    }
}
