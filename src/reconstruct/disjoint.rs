use std::collections::{BTreeMap, BTreeSet};

/// Disjoint sets with explicit member lists
///
/// `add(a, b)` both creates groups and merges them: `add(a, a)` makes a
/// singleton, `add(a, b)` puts `a` and `b` in the same group. When two
/// groups meet, the smaller one moves into the larger one and the larger
/// group's leader stays.
#[derive(Debug, Clone)]
pub struct DisjointSet<K: Ord + Clone> {
    leader: BTreeMap<K, K>,
    groups: BTreeMap<K, BTreeSet<K>>,
}

impl<K: Ord + Clone> Default for DisjointSet<K> {
    fn default() -> Self {
        Self {
            leader: BTreeMap::new(),
            groups: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone> DisjointSet<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, a: K, b: K) {
        let leader_a = self.leader.get(&a).cloned();
        let leader_b = self.leader.get(&b).cloned();

        match (leader_a, leader_b) {
            (None, None) => {
                self.groups.insert(a.clone(), BTreeSet::from([a.clone(), b.clone()]));
                self.leader.insert(b, a.clone());
                self.leader.insert(a.clone(), a);
            }
            (None, Some(_)) => self.add(b, a),
            (Some(leader_a), None) => {
                if let Some(group) = self.groups.get_mut(&leader_a) {
                    group.insert(b.clone());
                }
                self.leader.insert(b, leader_a);
            }
            (Some(leader_a), Some(leader_b)) => {
                if leader_a == leader_b {
                    return;
                }
                let size_a = self.groups.get(&leader_a).map_or(0, BTreeSet::len);
                let size_b = self.groups.get(&leader_b).map_or(0, BTreeSet::len);
                let (keep, absorb) = if size_a < size_b {
                    (leader_b, leader_a)
                } else {
                    (leader_a, leader_b)
                };
                let moved = self.groups.remove(&absorb).unwrap_or_default();
                for member in &moved {
                    self.leader.insert(member.clone(), keep.clone());
                }
                self.groups.entry(keep).or_default().extend(moved);
            }
        }
    }

    /// The group containing `member`
    pub fn get(&self, member: &K) -> Option<&BTreeSet<K>> {
        self.leader.get(member).and_then(|leader| self.groups.get(leader))
    }

    /// Every group, keyed by its leader
    pub fn groups(&self) -> impl Iterator<Item = (&K, &BTreeSet<K>)> {
        self.groups.iter()
    }

    pub fn leaders(&self) -> impl Iterator<Item = &K> {
        self.groups.keys()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_one_element() {
        let mut ds = DisjointSet::new();
        ds.add(1, 1);
        assert_eq!(ds.get(&1), Some(&BTreeSet::from([1])));
    }

    #[test]
    fn test_add_several_disjoint_elements() {
        let mut ds = DisjointSet::new();
        ds.add(1, 1);
        ds.add(2, 2);
        assert_eq!(ds.get(&1), Some(&BTreeSet::from([1])));
        assert_eq!(ds.get(&2), Some(&BTreeSet::from([2])));
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn test_add_several_joint_elements() {
        let mut ds = DisjointSet::new();
        ds.add(1, 1);
        ds.add(2, 1);
        assert_eq!(ds.get(&1), Some(&BTreeSet::from([1, 2])));
        assert_eq!(ds.get(&2), Some(&BTreeSet::from([1, 2])));
        assert_eq!(ds.leaders().collect::<Vec<_>>(), vec![&1]);
    }

    #[test]
    fn test_smaller_group_moves_into_larger() {
        let mut ds = DisjointSet::new();
        ds.add("a", "b");
        ds.add("a", "c");
        ds.add("x", "x");
        ds.add("x", "a");
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.leaders().collect::<Vec<_>>(), vec![&"a"]);
        assert_eq!(ds.get(&"x").unwrap().len(), 4);
    }

    #[test]
    fn test_merging_same_group_is_noop() {
        let mut ds = DisjointSet::new();
        ds.add(1, 2);
        ds.add(2, 1);
        assert_eq!(ds.len(), 1);
        assert!(ds.get(&3).is_none());
    }
}
