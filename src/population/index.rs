//! Ranked index over population members.
//!
//! A treap ordered by [`FitnessKey`] with randomised heap priorities. Each
//! node also carries an age stamp, and every subtree caches its size and its
//! oldest stamp, so the following are all expected `O(log n)`:
//!
//! - insert / remove by key, remove by rank
//! - rank of a key, key at a rank
//! - oldest member among the `m` lowest ranks
//!
//! One structure therefore serves as the keyed map, the sorted rank view and
//! the eviction queue at once.

use super::key::FitnessKey;
use std::cmp::Ordering;

type Link<V> = Option<Box<Node<V>>>;

struct Node<V> {
    key: FitnessKey,
    value: V,
    age: u64,
    priority: u64,
    size: usize,
    oldest: (u64, FitnessKey),
    left: Link<V>,
    right: Link<V>,
}

impl<V> Node<V> {
    fn boxed(key: FitnessKey, value: V, age: u64, priority: u64) -> Box<Self> {
        Box::new(Self {
            key,
            value,
            age,
            priority,
            size: 1,
            oldest: (age, key),
            left: None,
            right: None,
        })
    }

    fn update(&mut self) {
        self.size = 1 + size(&self.left) + size(&self.right);
        let mut oldest = (self.age, self.key);
        for child in [&self.left, &self.right].into_iter().flatten() {
            if child.oldest.0 < oldest.0 {
                oldest = child.oldest;
            }
        }
        self.oldest = oldest;
    }
}

fn size<V>(link: &Link<V>) -> usize {
    link.as_ref().map_or(0, |n| n.size)
}

/// Splits into keys `< key` and keys `>= key`.
fn split<V>(link: Link<V>, key: FitnessKey) -> (Link<V>, Link<V>) {
    match link {
        None => (None, None),
        Some(mut node) => {
            if node.key < key {
                let (l, r) = split(node.right.take(), key);
                node.right = l;
                node.update();
                (Some(node), r)
            } else {
                let (l, r) = split(node.left.take(), key);
                node.left = r;
                node.update();
                (l, Some(node))
            }
        }
    }
}

/// Splits into the `rank` lowest entries and the rest.
fn split_rank<V>(link: Link<V>, rank: usize) -> (Link<V>, Link<V>) {
    match link {
        None => (None, None),
        Some(mut node) => {
            let left_size = size(&node.left);
            if rank <= left_size {
                let (l, r) = split_rank(node.left.take(), rank);
                node.left = r;
                node.update();
                (l, Some(node))
            } else {
                let (l, r) = split_rank(node.right.take(), rank - left_size - 1);
                node.right = l;
                node.update();
                (Some(node), r)
            }
        }
    }
}

/// Joins two treaps where every key of `a` is below every key of `b`.
fn merge<V>(a: Link<V>, b: Link<V>) -> Link<V> {
    match (a, b) {
        (None, b) => b,
        (a, None) => a,
        (Some(mut a), Some(mut b)) => {
            if a.priority > b.priority {
                a.right = merge(a.right.take(), Some(b));
                a.update();
                Some(a)
            } else {
                b.left = merge(Some(a), b.left.take());
                b.update();
                Some(b)
            }
        }
    }
}

fn oldest_in_prefix<V>(link: &Link<V>, limit: usize) -> Option<(u64, FitnessKey)> {
    let node = link.as_deref()?;
    if limit == 0 {
        return None;
    }
    if limit >= node.size {
        return Some(node.oldest);
    }
    let left_size = size(&node.left);
    if limit <= left_size {
        return oldest_in_prefix(&node.left, limit);
    }
    let mut best = (node.age, node.key);
    if let Some(left) = node.left.as_deref() {
        if left.oldest.0 < best.0 {
            best = left.oldest;
        }
    }
    if let Some(right) = oldest_in_prefix(&node.right, limit - left_size - 1) {
        if right.0 < best.0 {
            best = right;
        }
    }
    Some(best)
}

fn restamp<V>(link: &mut Link<V>, key: FitnessKey, age: u64) -> bool {
    let Some(node) = link.as_deref_mut() else {
        return false;
    };
    let hit = match key.cmp(&node.key) {
        Ordering::Less => restamp(&mut node.left, key, age),
        Ordering::Greater => restamp(&mut node.right, key, age),
        Ordering::Equal => {
            node.age = age;
            true
        }
    };
    if hit {
        node.update();
    }
    hit
}

fn visit_mut<V, F: FnMut(FitnessKey, &mut V)>(link: &mut Link<V>, f: &mut F) {
    if let Some(node) = link.as_deref_mut() {
        visit_mut(&mut node.left, f);
        f(node.key, &mut node.value);
        visit_mut(&mut node.right, f);
    }
}

fn drain_into<V>(link: Link<V>, out: &mut Vec<(FitnessKey, u64, V)>) {
    if let Some(node) = link {
        let Node {
            key,
            value,
            age,
            left,
            right,
            ..
        } = *node;
        drain_into(left, out);
        out.push((key, age, value));
        drain_into(right, out);
    }
}

struct Summary {
    size: usize,
    oldest: (u64, FitnessKey),
}

fn check_node<V>(
    link: &Link<V>,
    lower: Option<FitnessKey>,
    upper: Option<FitnessKey>,
    parent_priority: u64,
) -> Result<Option<Summary>, String> {
    let Some(node) = link.as_deref() else {
        return Ok(None);
    };
    if lower.is_some_and(|lo| node.key <= lo) || upper.is_some_and(|hi| node.key >= hi) {
        return Err(format!("key {} is out of order", node.key));
    }
    if node.priority > parent_priority {
        return Err(format!("key {} violates the heap order", node.key));
    }
    let left = check_node(&node.left, lower, Some(node.key), node.priority)?;
    let right = check_node(&node.right, Some(node.key), upper, node.priority)?;

    let mut expected = Summary {
        size: 1,
        oldest: (node.age, node.key),
    };
    for child in [left, right].into_iter().flatten() {
        expected.size += child.size;
        if child.oldest.0 < expected.oldest.0 {
            expected.oldest = child.oldest;
        }
    }
    if expected.size != node.size {
        return Err(format!(
            "key {} caches size {} but has {}",
            node.key, node.size, expected.size
        ));
    }
    if expected.oldest.0 != node.oldest.0 || expected.oldest.1 != node.oldest.1 {
        return Err(format!("key {} caches a stale oldest stamp", node.key));
    }
    Ok(Some(expected))
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Key-ordered, rank-addressable, age-stamped member store.
pub(crate) struct RankIndex<V> {
    root: Link<V>,
    clock: u64,
    priority_state: u64,
}

impl<V> Default for RankIndex<V> {
    fn default() -> Self {
        Self {
            root: None,
            clock: 0,
            priority_state: 0x5EED,
        }
    }
}

impl<V> RankIndex<V> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        size(&self.root)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub(crate) fn clear(&mut self) {
        self.root = None;
        self.clock = 0;
    }

    fn tick(&mut self) -> u64 {
        let now = self.clock;
        self.clock += 1;
        now
    }

    pub(crate) fn contains(&self, key: FitnessKey) -> bool {
        self.get(key).is_some()
    }

    pub(crate) fn get(&self, key: FitnessKey) -> Option<&V> {
        self.node(key).map(|n| &n.value)
    }

    fn node(&self, key: FitnessKey) -> Option<&Node<V>> {
        let mut cur = self.root.as_deref();
        while let Some(node) = cur {
            match key.cmp(&node.key) {
                Ordering::Less => cur = node.left.as_deref(),
                Ordering::Greater => cur = node.right.as_deref(),
                Ordering::Equal => return Some(node),
            }
        }
        None
    }

    /// Inserts with a fresh age stamp. Hands the value back if the key is
    /// already present.
    pub(crate) fn insert(&mut self, key: FitnessKey, value: V) -> Result<(), V> {
        if self.contains(key) {
            return Err(value);
        }
        let age = self.tick();
        let priority = splitmix64(&mut self.priority_state);
        let (left, right) = split(self.root.take(), key);
        self.root = merge(merge(left, Some(Node::boxed(key, value, age, priority))), right);
        Ok(())
    }

    pub(crate) fn remove(&mut self, key: FitnessKey) -> Option<V> {
        let (left, rest) = split(self.root.take(), key);
        let (mid, right) = split_rank(rest, 1);
        match mid {
            Some(node) if node.key == key => {
                self.root = merge(left, right);
                Some(node.value)
            }
            mid => {
                self.root = merge(merge(left, mid), right);
                None
            }
        }
    }

    pub(crate) fn remove_rank(&mut self, rank: usize) -> Option<(FitnessKey, V)> {
        if rank >= self.len() {
            return None;
        }
        let (left, rest) = split_rank(self.root.take(), rank);
        let (mid, right) = split_rank(rest, 1);
        self.root = merge(left, right);
        mid.map(|node| (node.key, node.value))
    }

    /// Entry at `rank`, counting from 0 at the lowest key.
    pub(crate) fn by_rank(&self, rank: usize) -> Option<(FitnessKey, &V)> {
        let mut cur = self.root.as_deref();
        let mut rank = rank;
        while let Some(node) = cur {
            let left_size = size(&node.left);
            match rank.cmp(&left_size) {
                Ordering::Less => cur = node.left.as_deref(),
                Ordering::Equal => return Some((node.key, &node.value)),
                Ordering::Greater => {
                    rank -= left_size + 1;
                    cur = node.right.as_deref();
                }
            }
        }
        None
    }

    pub(crate) fn rank_of(&self, key: FitnessKey) -> Option<usize> {
        let mut cur = self.root.as_deref();
        let mut below = 0;
        while let Some(node) = cur {
            match key.cmp(&node.key) {
                Ordering::Less => cur = node.left.as_deref(),
                Ordering::Equal => return Some(below + size(&node.left)),
                Ordering::Greater => {
                    below += size(&node.left) + 1;
                    cur = node.right.as_deref();
                }
            }
        }
        None
    }

    pub(crate) fn min_key(&self) -> Option<FitnessKey> {
        self.by_rank(0).map(|(k, _)| k)
    }

    pub(crate) fn max_key(&self) -> Option<FitnessKey> {
        self.len()
            .checked_sub(1)
            .and_then(|r| self.by_rank(r))
            .map(|(k, _)| k)
    }

    /// Key with the smallest age stamp among the `limit` lowest ranks.
    pub(crate) fn oldest_below(&self, limit: usize) -> Option<FitnessKey> {
        oldest_in_prefix(&self.root, limit).map(|(_, key)| key)
    }

    /// Gives `key` a fresh age stamp, moving it to the back of the age order.
    pub(crate) fn restamp(&mut self, key: FitnessKey) -> bool {
        let age = self.tick();
        restamp(&mut self.root, key, age)
    }

    pub(crate) fn for_each_mut<F: FnMut(FitnessKey, &mut V)>(&mut self, mut f: F) {
        visit_mut(&mut self.root, &mut f);
    }

    /// In-order iteration, lowest key first.
    pub(crate) fn iter(&self) -> Iter<'_, V> {
        let mut iter = Iter { stack: Vec::new() };
        iter.descend(self.root.as_deref());
        iter
    }

    /// Rebuilds the tree from its own entries, keeping the first of any
    /// duplicated key and every age stamp. Returns the number of entries
    /// dropped.
    pub(crate) fn rebuild(&mut self) -> usize {
        let mut entries = Vec::with_capacity(self.len());
        drain_into(self.root.take(), &mut entries);
        let before = entries.len();
        entries.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        entries.dedup_by(|later, earlier| later.0 == earlier.0);
        let dropped = before - entries.len();
        for (key, age, value) in entries {
            let priority = splitmix64(&mut self.priority_state);
            // ascending keys, so appending at the right edge keeps order
            self.root = merge(self.root.take(), Some(Node::boxed(key, value, age, priority)));
        }
        dropped
    }

    /// Verifies ordering, heap priorities and cached subtree summaries.
    pub(crate) fn check(&self) -> Result<(), String> {
        check_node(&self.root, None, None, u64::MAX).map(|_| ())
    }

    /// Points the root's cached oldest entry at `key` without touching the
    /// tree, leaving the summary stale.
    #[cfg(test)]
    pub(crate) fn corrupt_oldest_summary(&mut self, key: FitnessKey) {
        if let Some(root) = self.root.as_deref_mut() {
            root.oldest = (0, key);
        }
    }
}

/// Ascending iterator yielding `(key, age stamp, value)`.
pub(crate) struct Iter<'a, V> {
    stack: Vec<&'a Node<V>>,
}

impl<'a, V> Iter<'a, V> {
    fn descend(&mut self, mut cur: Option<&'a Node<V>>) {
        while let Some(node) = cur {
            self.stack.push(node);
            cur = node.left.as_deref();
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (FitnessKey, u64, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.descend(node.right.as_deref());
        Some((node.key, node.age, &node.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(v: f64) -> FitnessKey {
        FitnessKey::new(v).unwrap()
    }

    fn keys<V>(index: &RankIndex<V>) -> Vec<f64> {
        index.iter().map(|(k, _, _)| k.value()).collect()
    }

    fn filled(values: &[f64]) -> RankIndex<usize> {
        let mut index = RankIndex::new();
        for (i, &v) in values.iter().enumerate() {
            index.insert(key(v), i).unwrap();
        }
        index
    }

    #[test]
    fn test_insert_keeps_sorted() {
        let index = filled(&[5.0, 1.0, 3.0, -2.0, 4.0]);
        assert_eq!(keys(&index), vec![-2.0, 1.0, 3.0, 4.0, 5.0]);
        assert_eq!(index.len(), 5);
        index.check().unwrap();
    }

    #[test]
    fn test_duplicate_returned() {
        let mut index = filled(&[1.0, 2.0]);
        assert_eq!(index.insert(key(2.0), 99), Err(99));
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(key(2.0)), Some(&1));
    }

    #[test]
    fn test_rank_queries() {
        let index = filled(&[10.0, 30.0, 20.0, 40.0]);
        assert_eq!(index.rank_of(key(10.0)), Some(0));
        assert_eq!(index.rank_of(key(40.0)), Some(3));
        assert_eq!(index.rank_of(key(25.0)), None);
        assert_eq!(index.by_rank(2).map(|(k, v)| (k.value(), *v)), Some((30.0, 1)));
        assert!(index.by_rank(4).is_none());
        assert_eq!(index.min_key().map(FitnessKey::value), Some(10.0));
        assert_eq!(index.max_key().map(FitnessKey::value), Some(40.0));
    }

    #[test]
    fn test_remove() {
        let mut index = filled(&[1.0, 2.0, 3.0]);
        assert_eq!(index.remove(key(2.0)), Some(1));
        assert_eq!(index.remove(key(2.0)), None);
        assert_eq!(keys(&index), vec![1.0, 3.0]);
        assert_eq!(index.remove_rank(0).map(|(k, v)| (k.value(), v)), Some((1.0, 0)));
        assert!(index.remove_rank(1).is_none());
        index.check().unwrap();
    }

    #[test]
    fn test_oldest_below_respects_rank_limit() {
        // insertion order: 50, 10, 40, 20, 30
        let index = filled(&[50.0, 10.0, 40.0, 20.0, 30.0]);
        assert_eq!(index.oldest_below(5).map(FitnessKey::value), Some(50.0));
        // lowest three ranks are 10, 20, 30; 10 is the oldest of them
        assert_eq!(index.oldest_below(3).map(FitnessKey::value), Some(10.0));
        assert_eq!(index.oldest_below(0), None);
    }

    #[test]
    fn test_restamp_moves_to_back() {
        let mut index = filled(&[1.0, 2.0, 3.0]);
        assert!(index.restamp(key(1.0)));
        assert_eq!(index.oldest_below(3).map(FitnessKey::value), Some(2.0));
        assert!(!index.restamp(key(9.0)));
        index.check().unwrap();
    }

    #[test]
    fn test_rebuild_preserves_entries() {
        let mut index = filled(&[3.0, 1.0, 2.0]);
        index.restamp(key(3.0));
        let ages: Vec<u64> = index.iter().map(|(_, a, _)| a).collect();
        assert_eq!(index.rebuild(), 0);
        assert_eq!(keys(&index), vec![1.0, 2.0, 3.0]);
        assert_eq!(index.iter().map(|(_, a, _)| a).collect::<Vec<_>>(), ages);
        index.check().unwrap();
    }

    #[test]
    fn test_for_each_mut_visits_in_order() {
        let mut index = filled(&[2.0, 1.0]);
        let mut seen = Vec::new();
        index.for_each_mut(|k, v| {
            seen.push(k.value());
            *v += 10;
        });
        assert_eq!(seen, vec![1.0, 2.0]);
        assert_eq!(index.get(key(2.0)), Some(&10));
    }

    #[test]
    fn test_large_sequence_stays_consistent() {
        let mut index = RankIndex::new();
        let mut state = 7u64;
        for i in 0..2000 {
            let v = (splitmix64(&mut state) % 10_000) as f64;
            let _ = index.insert(key(v), i);
            if i % 3 == 0 {
                let r = index.len() / 2;
                index.remove_rank(r);
            }
        }
        index.check().unwrap();
        let sorted = keys(&index);
        assert!(sorted.windows(2).all(|w| w[0] < w[1]));
    }
}
