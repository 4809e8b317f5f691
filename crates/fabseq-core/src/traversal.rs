//! Connector-graph traversal.
//!
//! Iterative depth-first walk with an explicit work stack. Each stack frame
//! carries the part to enter and the connector it was entered through (none
//! for seeds). A part is marked visited when it is popped, so duplicates on
//! the stack are harmless and every reachable traversable part is recorded
//! exactly once.
//!
//! Straight runs are followed before branches: when a straight fabrication
//! part with more than two connectors (a tee or tap) is entered through a
//! known connector, the connector farthest from the entry point is taken as
//! the "opposite" end and the part joined to it is pushed last, so it is
//! popped next.
//!
//! Connector sets and pairings are iterated in [`ConnectorId`] order, which
//! makes the visit order (and with it the numbering) independent of the
//! order the model hands them out in.

use crate::signature::{signature_of, GeometrySignature};
use ahash::{AHashMap, AHashSet};
use fabseq_model::{ConnectorId, ModelError, ModelGraph, PartKind, PartRef};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum TraversalError {
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// A part reached by the traversal, with its signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub part: PartRef,
    pub signature: GeometrySignature,
}

impl VisitRecord {
    pub fn is_sentinel(&self) -> bool {
        self.signature.is_sentinel()
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    part: PartRef,
    origin: Option<ConnectorId>,
}

/// Per-run traversal state.
///
/// Holds the visited set, the classification of every part looked at so far,
/// and the opposite connector chosen for each straight tee. Reusing a context
/// across [`traverse_with`] calls continues the same run: parts already
/// visited are not reported again.
#[derive(Debug, Default)]
pub struct TraversalContext {
    visited: AHashSet<PartRef>,
    kinds: AHashMap<PartRef, Option<PartKind>>,
    opposite: AHashMap<PartRef, Option<ConnectorId>>,
}

impl TraversalContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visited(&self, part: PartRef) -> bool {
        self.visited.contains(&part)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Opposite connector chosen for `part`, if the part was expanded as a
    /// straight tee.
    pub fn opposite_of(&self, part: PartRef) -> Option<ConnectorId> {
        self.opposite.get(&part).copied().flatten()
    }

    /// Classify `part` once; later calls are served from the cache.
    fn kind<G: ModelGraph>(
        &mut self,
        graph: &G,
        part: PartRef,
    ) -> Result<Option<&PartKind>, TraversalError> {
        if !self.kinds.contains_key(&part) {
            let kind = graph.kind_of(part)?;
            self.kinds.insert(part, kind);
        }
        Ok(self.kinds.get(&part).and_then(Option::as_ref))
    }

    fn opposite_connector<G: ModelGraph>(
        &mut self,
        graph: &G,
        part: PartRef,
        origin: ConnectorId,
        connectors: &[ConnectorId],
    ) -> Option<ConnectorId> {
        *self
            .opposite
            .entry(part)
            .or_insert_with(|| find_opposite_connector(graph, origin, connectors))
    }
}

/// Walk the connector graph from `seeds` with a fresh context.
///
/// Seeds are entered in the given order. Seeds that do not resolve are
/// skipped; an empty seed list yields an empty result.
pub fn traverse<G: ModelGraph>(
    graph: &G,
    seeds: &[PartRef],
) -> Result<Vec<VisitRecord>, TraversalError> {
    let mut ctx = TraversalContext::new();
    traverse_with(&mut ctx, graph, seeds)
}

/// Walk the connector graph from `seeds`, recording into `ctx`.
///
/// Returns the records produced by this call, in visit order. A geometry
/// read failure on any classified part aborts the walk.
pub fn traverse_with<G: ModelGraph>(
    ctx: &mut TraversalContext,
    graph: &G,
    seeds: &[PartRef],
) -> Result<Vec<VisitRecord>, TraversalError> {
    let mut records = Vec::new();
    let mut stack: Vec<Frame> = seeds
        .iter()
        .rev()
        .map(|&part| Frame { part, origin: None })
        .collect();

    while let Some(Frame { part, origin }) = stack.pop() {
        if !ctx.visited.insert(part) {
            continue;
        }

        let Some(kind) = ctx.kind(graph, part)?.cloned() else {
            tracing::debug!(part = %part, "part does not resolve, skipping");
            continue;
        };
        let Some(signature) = signature_of(&kind) else {
            continue;
        };
        tracing::trace!(part = %part, signature = %signature, "visited");
        records.push(VisitRecord { part, signature });

        let mut connectors = graph.connectors_of(part);
        connectors.sort();

        let continuation = match origin {
            Some(origin) if kind.is_straight_fabrication() && connectors.len() > 2 => ctx
                .opposite_connector(graph, part, origin, &connectors)
                .and_then(|opposite| {
                    continuation_through(graph, part, opposite).map(|next| (next, opposite))
                }),
            _ => None,
        };
        if let Some((next, opposite)) = continuation {
            tracing::debug!(
                part = %part,
                opposite = %opposite,
                next = %next,
                "continuing straight run"
            );
        }

        let mut branches = Vec::new();
        for &connector in &connectors {
            let mut paired = graph.paired_connectors(connector);
            paired.sort();
            for joined in paired {
                let neighbor = graph.owner_of(joined);
                if ctx.is_visited(neighbor) {
                    continue;
                }
                if continuation.is_some_and(|(next, _)| next == neighbor) {
                    continue;
                }
                if ctx
                    .kind(graph, neighbor)?
                    .is_some_and(PartKind::is_traversable)
                {
                    branches.push(Frame {
                        part: neighbor,
                        origin: Some(joined),
                    });
                }
            }
        }

        // Reversed so the lowest connector is popped first.
        stack.extend(branches.into_iter().rev());
        if let Some((next, opposite)) = continuation {
            stack.push(Frame {
                part: next,
                origin: Some(opposite),
            });
        }
    }

    tracing::debug!(
        seeds = seeds.len(),
        records = records.len(),
        visited = ctx.visited_count(),
        "traversal finished"
    );
    Ok(records)
}

/// Among `connectors` other than `origin`, the one whose origin is farthest
/// from `origin`'s. Ties keep the first in slice order.
///
/// `None` when `origin` has no spatial position or no other connector does.
pub fn find_opposite_connector<G: ModelGraph>(
    graph: &G,
    origin: ConnectorId,
    connectors: &[ConnectorId],
) -> Option<ConnectorId> {
    let from = graph.origin_of(origin)?;
    let mut best: Option<(ConnectorId, f64)> = None;
    for &candidate in connectors {
        if candidate == origin {
            continue;
        }
        let Some(at) = graph.origin_of(candidate) else {
            continue;
        };
        let distance = from.distance_to(&at);
        let farther = match best {
            None => true,
            Some((_, max)) => distance > max,
        };
        if farther {
            best = Some((candidate, distance));
        }
    }
    best.map(|(connector, _)| connector)
}

/// First part other than `part` joined to `opposite`.
fn continuation_through<G: ModelGraph>(
    graph: &G,
    part: PartRef,
    opposite: ConnectorId,
) -> Option<PartRef> {
    let mut paired = graph.paired_connectors(opposite);
    paired.sort();
    paired
        .into_iter()
        .map(|c| graph.owner_of(c))
        .find(|&owner| owner != part)
}
