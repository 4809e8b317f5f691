//! End-to-end numbering run: seeds → traversal → numbering → write-back.
//!
//! The run does not open or commit anything on the model. Callers that
//! want the traversal and the write-back as separate units call
//! [`collect_network`], [`NumberAssigner`] and [`write_labels`] themselves.

use crate::config::NumberingConfig;
use crate::error::FabseqError;
use crate::numbering::{write_labels, NumberAssigner, NumberingReport};
use crate::traversal::{traverse, VisitRecord};
use fabseq_model::{ModelGraph, ParameterWriter, PartKind, PartRef};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Every part reached, accessories included, in visit order.
    pub visited: Vec<VisitRecord>,
    pub report: NumberingReport,
}

/// Keep only candidates that are fabrication parts, the only valid picks.
pub fn select_seeds<G: ModelGraph>(
    graph: &G,
    candidates: &[PartRef],
) -> Result<Vec<PartRef>, FabseqError> {
    let mut seeds = Vec::with_capacity(candidates.len());
    for &part in candidates {
        match graph.kind_of(part)? {
            Some(PartKind::Fabrication(_)) => seeds.push(part),
            Some(_) => tracing::warn!(part = %part, "seed is not a fabrication part, ignoring"),
            None => tracing::warn!(part = %part, "seed does not resolve, ignoring"),
        }
    }
    Ok(seeds)
}

/// Traverse from `seeds`; an empty result is reported as
/// [`FabseqError::EmptySelection`].
pub fn collect_network<G: ModelGraph>(
    graph: &G,
    seeds: &[PartRef],
) -> Result<Vec<VisitRecord>, FabseqError> {
    let records = traverse(graph, seeds)?;
    if records.is_empty() {
        return Err(FabseqError::EmptySelection);
    }
    Ok(records)
}

/// Validate `config`, walk the network reachable from `seeds`, and label it.
pub fn run_numbering<M>(
    model: &mut M,
    seeds: &[PartRef],
    config: &NumberingConfig,
) -> Result<RunSummary, FabseqError>
where
    M: ModelGraph + ParameterWriter,
{
    config.validate()?;

    let seeds = select_seeds(&*model, seeds)?;
    if seeds.is_empty() {
        return Err(FabseqError::EmptySelection);
    }
    let visited = collect_network(&*model, &seeds)?;

    let mut assigner = NumberAssigner::new(config);
    let assignments = assigner.assign(&visited)?;
    let report = write_labels(model, assignments, config);

    tracing::info!(
        branch = %config.branch,
        visited = visited.len(),
        processed = report.processed,
        skipped = report.skipped.len(),
        distinct = report.distinct_signatures,
        "numbering run finished"
    );

    Ok(RunSummary { visited, report })
}
