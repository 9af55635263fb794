use std::{cmp::Ordering, fmt::{self, Display, Formatter}};

use genome::{RelatednessPair, Selection};
use located_error::prelude::*;
use log::{debug, info, trace, warn};

use crate::graph::{RelatednessGraph, SampleId, SampleNode};

mod error;
pub use error::RelatednessError;

/// How related samples are pruned from the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Retain exactly one representative per connected component.
    #[default]
    Component,
    /// Visit samples by order of preference, and retain a sample if none of its already-retained
    /// neighbours is related to it (maximal independent set).
    Greedy,
}

/// Which sample is preferred when choosing whom to retain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetentionPolicy {
    /// Highest call rate first. Ties are broken by the lowest identifier.
    #[default]
    CallRate,
    /// Lowest identifier (lexicographic) first.
    Identifier,
    /// Leftmost VCF column first.
    ColumnOrder,
}

impl RetentionPolicy {
    /// `Ordering::Less` if `a` is preferred over `b`.
    #[must_use]
    pub fn compare(&self, a: &SampleNode, b: &SampleNode) -> Ordering {
        match self {
            Self::CallRate    => b.call_rate.total_cmp(&a.call_rate).then_with(|| a.label.cmp(&b.label)),
            Self::Identifier  => a.label.cmp(&b.label),
            Self::ColumnOrder => a.column.cmp(&b.column),
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Component => write!(f, "component"),
            Self::Greedy    => write!(f, "greedy"),
        }
    }
}

impl Display for RetentionPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::CallRate    => write!(f, "call-rate"),
            Self::Identifier  => write!(f, "identifier"),
            Self::ColumnOrder => write!(f, "column-order"),
        }
    }
}

/// A sample removed because of its relatedness with a retained one.
#[derive(Debug, Clone, PartialEq)]
pub struct Exclusion {
    pub sample     : String,
    pub column     : usize,
    /// Retained sample that caused the removal.
    pub kept       : String,
    /// Strongest coefficient over all the edges of the removed sample.
    pub coefficient: f64,
}

impl Display for Exclusion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} (related to {}, max coefficient: {:.4})", self.sample, self.kept, self.coefficient)
    }
}

#[derive(Debug, Clone)]
pub struct RelatednessOutcome {
    pub retained: Selection,
    /// Removed samples, in VCF column order.
    pub excluded: Vec<Exclusion>,
    /// Pairs naming a sample absent from the current selection.
    pub ignored_pairs: usize,
    /// Number of pairs related above threshold.
    pub edges: usize,
}

/// Removes duplicate and related samples.
#[derive(Debug, Clone, Copy)]
pub struct RelatednessFilter {
    threshold: f64,
    strategy : Strategy,
    policy   : RetentionPolicy,
}

impl RelatednessFilter {
    /// - `threshold`: pairs with a coefficient strictly greater than this value are considered related.
    pub fn new(threshold: f64, strategy: Strategy, policy: RetentionPolicy) -> Result<Self> {
        if !threshold.is_finite() {
            return Err(RelatednessError::InvalidThreshold(threshold)).loc("While configuring relatedness filter")
        }
        Ok(Self { threshold, strategy, policy })
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Compute the subset of `selection` to retain.
    /// # Arguments:
    /// - `samples`   : sample identifiers, in VCF column order.
    /// - `selection` : currently selected samples.
    /// - `call_rates`: call rate of every sample (same order as `samples`).
    /// - `pairs`     : relatedness pairs. Pairs naming an unknown or unselected sample are ignored.
    pub fn apply<'a, I>(&self, samples: &[String], selection: &Selection, call_rates: &[f64], pairs: I) -> Result<RelatednessOutcome>
    where
        I: IntoIterator<Item = &'a RelatednessPair>
    {
        if call_rates.len() != samples.len() {
            return Err(RelatednessError::CallRateLength { expected: samples.len(), found: call_rates.len() })
                .loc("While applying relatedness filter")
        }

        let (graph, ignored_pairs) = self.build_graph(samples, selection, call_rates, pairs);
        if ignored_pairs > 0 {
            warn!("Ignored {ignored_pairs} relatedness pairs naming samples that are absent from the genotype matrix or already excluded");
        }
        debug!("Relatedness graph: {} samples, {} pairs above threshold {}", graph.n_nodes(), graph.n_edges(), self.threshold);

        let removed = match self.strategy {
            Strategy::Component => self.by_component(&graph),
            Strategy::Greedy    => self.greedy(&graph),
        };

        let mut excluded: Vec<Exclusion> = removed.into_iter()
            .filter_map(|(dropped, kept)| {
                let (dropped, kept) = (graph.get(dropped)?, graph.get(kept)?);
                Some(Exclusion {
                    sample     : dropped.label.clone(),
                    column     : dropped.column,
                    kept       : kept.label.clone(),
                    coefficient: dropped.strongest_edge().unwrap_or(f64::NAN),
                })
            })
            .collect();
        excluded.sort_by_key(|exclusion| exclusion.column);
        for exclusion in &excluded {
            trace!("Excluding {exclusion}");
        }

        let retained = selection.narrow(|column| excluded.binary_search_by_key(&column, |e| e.column).is_err());
        info!("Relatedness filter retained {} out of {} samples", retained.count(), selection.count());
        Ok(RelatednessOutcome { retained, excluded, ignored_pairs, edges: graph.n_edges() })
    }

    fn build_graph<'a, I>(&self, samples: &[String], selection: &Selection, call_rates: &[f64], pairs: I) -> (RelatednessGraph, usize)
    where
        I: IntoIterator<Item = &'a RelatednessPair>
    {
        let mut graph = RelatednessGraph::new();
        for column in selection.indices() {
            if let (Some(label), Some(call_rate)) = (samples.get(column), call_rates.get(column)) {
                graph.add_sample(label, column, *call_rate);
            }
        }

        let mut ignored = 0;
        for pair in pairs {
            let (a, b) = pair.ids();
            let (Some(a), Some(b)) = (graph.id(a), graph.id(b)) else {
                trace!("Ignoring relatedness pair {pair}");
                ignored += 1;
                continue
            };
            if pair.coefficient() > self.threshold {
                graph.add_edge(a, b, pair.coefficient());
            }
        }
        (graph, ignored)
    }

    /// Return `(dropped, kept)` pairs: one representative is kept per connected component.
    fn by_component(&self, graph: &RelatednessGraph) -> Vec<(SampleId, SampleId)> {
        let mut removed = Vec::new();
        for component in graph.components() {
            let nodes: Vec<&SampleNode> = component.iter().filter_map(|id| graph.get(*id)).collect();
            let Some(kept) = nodes.iter().copied().min_by(|a, b| self.policy.compare(a, b)) else {
                continue
            };
            removed.extend(nodes.iter().filter(|node| node.id != kept.id).map(|node| (node.id, kept.id)));
        }
        removed
    }

    /// Return `(dropped, kept)` pairs: samples are visited by order of preference, and dropped
    /// if related to an already retained sample (the first, strongest one is reported).
    fn greedy(&self, graph: &RelatednessGraph) -> Vec<(SampleId, SampleId)> {
        let mut nodes: Vec<&SampleNode> = graph.nodes().collect();
        nodes.sort_by(|a, b| self.policy.compare(a, b));

        let mut kept: Vec<SampleId> = Vec::with_capacity(nodes.len());
        let mut removed = Vec::new();
        for node in nodes {
            let blocker = node.neighbours()
                .filter(|(neighbour, _)| kept.contains(neighbour))
                .min_by(|(_, a), (_, b)| b.total_cmp(a));
            match blocker {
                Some((neighbour, _)) => removed.push((node.id, *neighbour)),
                None                 => kept.push(node.id),
            }
        }
        removed
    }
}
