//! Approximate tag matching for module dispatch.
//!
//! A [`TagMatcher`] maps ids to tags and answers "which ids have the tags
//! closest to this one?". The reference implementation, [`MatchBin`],
//! scores every entry with a [`Metric`] and lets a [`Selector`] pick the
//! winners, so both the notion of distance and the ranking policy can be
//! swapped independently.

use std::collections::HashMap;

use sgp_common::Tag;
use tracing::debug;

use crate::module::Module;

/// Distance between two tags, normalized into `[0, 1]`.
pub trait Metric<T> {
    fn distance(&self, a: &T, b: &T) -> f64;
}

/// Fraction of differing bits.
#[derive(Debug, Clone, Copy, Default)]
pub struct HammingMetric;

impl<T: Tag> Metric<T> for HammingMetric {
    fn distance(&self, a: &T, b: &T) -> f64 {
        let width = a.width().max(1);
        f64::from(a.hamming(b)) / width as f64
    }
}

/// Picks at most `n` ids out of scored candidates.
pub trait Selector {
    /// `scored` holds `(id, distance)` in insertion order.
    fn select(&self, scored: Vec<(usize, f64)>, n: usize) -> Vec<usize>;
}

/// Best `n` candidates whose distance does not exceed `threshold`, closest
/// first. Equal distances keep insertion order.
#[derive(Debug, Clone, Copy)]
pub struct RankedSelector {
    pub threshold: f64,
}

impl RankedSelector {
    /// Threshold ratio 24/16: every normalized distance passes.
    pub const DEFAULT_THRESHOLD: f64 = 24.0 / 16.0;

    /// Selector keeping candidates at distance `threshold` or closer.
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Default for RankedSelector {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}

impl Selector for RankedSelector {
    fn select(&self, mut scored: Vec<(usize, f64)>, n: usize) -> Vec<usize> {
        scored.retain(|&(_, d)| d <= self.threshold);
        // Stable sort: ties stay in insertion order.
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.into_iter().take(n).map(|(id, _)| id).collect()
    }
}

/// An index from ids to tags supporting ranked approximate lookup.
pub trait TagMatcher<T> {
    /// Add (or replace) the entry for `id`.
    fn insert(&mut self, id: usize, tag: T);

    /// Remove every entry.
    fn clear(&mut self);

    /// Up to `n` ids, best match first.
    fn find_matches(&self, tag: &T, n: usize) -> Vec<usize>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reference matcher: exhaustive scoring plus a pluggable selector.
#[derive(Debug, Clone)]
pub struct MatchBin<T, M = HammingMetric, S = RankedSelector> {
    /// Entries in insertion order.
    entries: Vec<(usize, T)>,
    /// Id to slot in `entries`.
    slots: HashMap<usize, usize>,
    metric: M,
    selector: S,
}

/// Hamming distance with a ranked selector.
pub type DefaultMatchBin<T> = MatchBin<T, HammingMetric, RankedSelector>;

impl<T, M, S> MatchBin<T, M, S> {
    /// An empty bin scoring with `metric` and ranking with `selector`.
    pub fn new(metric: M, selector: S) -> Self {
        Self {
            entries: Vec::new(),
            slots: HashMap::new(),
            metric,
            selector,
        }
    }
}

impl<T, M: Default, S: Default> Default for MatchBin<T, M, S> {
    fn default() -> Self {
        Self::new(M::default(), S::default())
    }
}

impl<T, M: Metric<T>, S: Selector> TagMatcher<T> for MatchBin<T, M, S> {
    fn insert(&mut self, id: usize, tag: T) {
        match self.slots.get(&id) {
            Some(&slot) => self.entries[slot].1 = tag,
            None => {
                self.slots.insert(id, self.entries.len());
                self.entries.push((id, tag));
            }
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.slots.clear();
    }

    fn find_matches(&self, tag: &T, n: usize) -> Vec<usize> {
        if n == 0 {
            return Vec::new();
        }
        let scored = self
            .entries
            .iter()
            .map(|(id, entry)| (*id, self.metric.distance(tag, entry)))
            .collect();
        self.selector.select(scored, n)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// A matcher kept in sync with a module table by a dirty flag.
///
/// Mutations of the module table only mark the cache dirty; the next query
/// rebuilds it. All reads go through [`MatchCache::find_matches`], which
/// cannot observe a stale index.
#[derive(Debug, Clone)]
pub(crate) struct MatchCache<B> {
    matcher: B,
    dirty: bool,
}

impl<B> MatchCache<B> {
    /// Wrap `matcher`. The cache starts dirty.
    pub(crate) fn new(matcher: B) -> Self {
        Self {
            matcher,
            dirty: true,
        }
    }

    /// Force a rebuild on the next query.
    pub(crate) fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Whether the next query will rebuild.
    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Rebuild from `modules` if dirty.
    pub(crate) fn ensure_fresh<T: Clone>(&mut self, modules: &[Module<T>])
    where
        B: TagMatcher<T>,
    {
        if !self.is_dirty() {
            return;
        }
        self.matcher.clear();
        for module in modules {
            self.matcher.insert(module.id, module.tag.clone());
        }
        self.dirty = false;
        debug!(modules = modules.len(), "rebuilt tag matcher");
    }

    /// Up to `n` module ids for `tag`, best first, rebuilding from `modules` if dirty.
    pub(crate) fn find_matches<T: Clone>(&mut self, modules: &[Module<T>], tag: &T, n: usize) -> Vec<usize>
    where
        B: TagMatcher<T>,
    {
        self.ensure_fresh(modules);
        self.matcher.find_matches(tag, n)
    }
}
