//! Sequence-number assignment and label write-back.
//!
//! Records are numbered in visit order. The first record with a given
//! signature takes the next free number; later records with the same
//! signature reuse it. Sentinel (accessory) records are never numbered.

use crate::config::NumberingConfig;
use crate::error::FabseqError;
use crate::padding::format_number;
use crate::signature::GeometrySignature;
use crate::traversal::VisitRecord;
use ahash::{AHashMap, AHashSet};
use fabseq_model::{ParameterWriter, PartRef, SkipReason, WriteOutcome};
use serde::Serialize;

/// Signature → number map plus the formatting parameters of one run.
#[derive(Debug, Clone)]
pub struct NumberingState {
    assigned: AHashMap<GeometrySignature, u64>,
    /// `None` once `u64::MAX` has been handed out.
    next: Option<u64>,
    branch: String,
    width: usize,
    embed_signature: bool,
}

impl NumberingState {
    pub fn new(config: &NumberingConfig) -> Self {
        Self {
            assigned: AHashMap::new(),
            next: Some(config.start.value),
            branch: config.branch.clone(),
            width: config.start.padding_width(),
            embed_signature: config.embed_signature_in_label,
        }
    }

    /// Number for `signature`, assigning the next free one on first sight.
    /// `Ok(None)` for the sentinel.
    pub fn number_for(
        &mut self,
        signature: &GeometrySignature,
    ) -> Result<Option<u64>, FabseqError> {
        if signature.is_sentinel() {
            return Ok(None);
        }
        if let Some(&number) = self.assigned.get(signature) {
            return Ok(Some(number));
        }
        let Some(number) = self.next else {
            return Err(FabseqError::NumbersExhausted(signature.clone()));
        };
        self.next = number.checked_add(1);
        self.assigned.insert(signature.clone(), number);
        Ok(Some(number))
    }

    pub fn label(&self, number: u64, signature: &GeometrySignature) -> String {
        let number = format_number(number, self.width);
        if self.embed_signature {
            format!("{}{}---{}", self.branch, number, signature)
        } else {
            format!("{}{}", self.branch, number)
        }
    }

    pub fn distinct_signatures(&self) -> usize {
        self.assigned.len()
    }

    /// Number the next new signature would get, `None` when exhausted.
    pub fn next_number(&self) -> Option<u64> {
        self.next
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Assigned numbers, ordered by number.
    pub fn mapping(&self) -> Vec<(GeometrySignature, u64)> {
        let mut pairs: Vec<_> = self
            .assigned
            .iter()
            .map(|(sig, &n)| (sig.clone(), n))
            .collect();
        pairs.sort_by_key(|(_, n)| *n);
        pairs
    }
}

/// Label computed for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelAssignment {
    pub part: PartRef,
    pub number: u64,
    pub label: String,
    pub signature: GeometrySignature,
}

#[derive(Debug, Clone)]
pub struct NumberAssigner {
    state: NumberingState,
}

impl NumberAssigner {
    pub fn new(config: &NumberingConfig) -> Self {
        Self {
            state: NumberingState::new(config),
        }
    }

    /// Label every non-sentinel record, in order.
    ///
    /// Fails with [`FabseqError::NumbersExhausted`] when a new signature
    /// appears after `u64::MAX` was assigned; nothing is returned then.
    pub fn assign(
        &mut self,
        records: &[VisitRecord],
    ) -> Result<Vec<LabelAssignment>, FabseqError> {
        let mut assignments = Vec::with_capacity(records.len());
        for record in records {
            let Some(number) = self.state.number_for(&record.signature)? else {
                continue;
            };
            assignments.push(LabelAssignment {
                part: record.part,
                number,
                label: self.state.label(number, &record.signature),
                signature: record.signature.clone(),
            });
        }
        Ok(assignments)
    }

    pub fn state(&self) -> &NumberingState {
        &self.state
    }

    pub fn into_state(self) -> NumberingState {
        self.state
    }
}

/// A write that was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedWrite {
    pub part: PartRef,
    pub attribute: String,
    pub reason: SkipReason,
}

/// Outcome of writing labels back.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NumberingReport {
    /// Records whose label was written.
    pub processed: usize,
    pub skipped: Vec<SkippedWrite>,
    pub distinct_signatures: usize,
    pub assignments: Vec<LabelAssignment>,
}

impl NumberingReport {
    /// Records with at least one write not applied.
    pub fn skipped_parts(&self) -> usize {
        let mut parts: Vec<PartRef> = self.skipped.iter().map(|s| s.part).collect();
        parts.sort();
        parts.dedup();
        parts.len()
    }

    fn skip(&mut self, part: PartRef, attribute: &str, reason: SkipReason) {
        tracing::warn!(part = %part, attribute, reason = %reason, "attribute not written");
        self.skipped.push(SkippedWrite {
            part,
            attribute: attribute.to_string(),
            reason,
        });
    }
}

/// Write each label to the number attribute and its signature to the trace
/// attribute. Writes that cannot be applied are collected in the report; a
/// part that no longer resolves is not tried a second time.
pub fn write_labels<W: ParameterWriter>(
    writer: &mut W,
    assignments: Vec<LabelAssignment>,
    config: &NumberingConfig,
) -> NumberingReport {
    let distinct: AHashSet<u64> = assignments.iter().map(|a| a.number).collect();
    let mut report = NumberingReport {
        distinct_signatures: distinct.len(),
        ..NumberingReport::default()
    };

    for assignment in &assignments {
        match writer.write_attribute(assignment.part, &config.number_attribute, &assignment.label)
        {
            WriteOutcome::Written => report.processed += 1,
            WriteOutcome::Skipped(reason) => {
                report.skip(assignment.part, &config.number_attribute, reason);
                if reason == SkipReason::UnresolvedPart {
                    continue;
                }
            }
        }

        if let WriteOutcome::Skipped(reason) = writer.write_attribute(
            assignment.part,
            &config.trace_attribute,
            assignment.signature.as_str(),
        ) {
            report.skip(assignment.part, &config.trace_attribute, reason);
        }
    }

    report.assignments = assignments;
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::padding::StartNumber;
    use crate::signature::NOT_FABRICATION_PART;
    use fabseq_model::{GeometryRecord, SnapshotModel};

    fn record(part: u64, signature: &str) -> VisitRecord {
        VisitRecord {
            part: PartRef(part),
            signature: signature.into(),
        }
    }

    fn labels(assignments: &[LabelAssignment]) -> Vec<(u64, &str)> {
        assignments
            .iter()
            .map(|a| (a.part.0, a.label.as_str()))
            .collect()
    }

    #[test]
    fn test_numbers_follow_first_sight() {
        let config = NumberingConfig::new("P-", StartNumber::parse("7").unwrap());
        let mut assigner = NumberAssigner::new(&config);

        let records = vec![
            record(1, "10x10_2.345_None_True_"),
            record(2, NOT_FABRICATION_PART),
            record(3, "10x10_1_None_True_"),
            record(4, "10x10_2.345_None_True_"),
        ];
        let assignments = assigner.assign(&records).unwrap();

        assert_eq!(labels(&assignments), vec![(1, "P-7"), (3, "P-8"), (4, "P-7")]);
        assert_eq!(assigner.state().distinct_signatures(), 2);
        assert_eq!(assigner.state().next_number(), Some(9));
    }

    #[test]
    fn test_padding_applies_to_labels() {
        let config = NumberingConfig::new("D", StartNumber::parse("008").unwrap());
        let mut assigner = NumberAssigner::new(&config);
        let records: Vec<_> = (0..4).map(|i| record(i, &format!("sig{i}"))).collect();

        let assignments = assigner.assign(&records).unwrap();
        assert_eq!(
            labels(&assignments),
            vec![(0, "D08"), (1, "D09"), (2, "D10"), (3, "D11")]
        );
    }

    #[test]
    fn test_single_leading_zero_does_not_pad() {
        let config = NumberingConfig::new("P-", StartNumber::parse("05").unwrap());
        let mut assigner = NumberAssigner::new(&config);
        let assignments = assigner.assign(&[record(1, "a")]).unwrap();
        assert_eq!(assignments[0].label, "P-5");
    }

    #[test]
    fn test_embedded_signature_label() {
        let config = NumberingConfig::new("P-", StartNumber::parse("1").unwrap())
            .with_embedded_signature(true);
        let mut assigner = NumberAssigner::new(&config);
        let assignments = assigner.assign(&[record(1, "10x10_2_None_True_")]).unwrap();
        assert_eq!(assignments[0].label, "P-1---10x10_2_None_True_");
    }

    #[test]
    fn test_only_sentinels_assign_nothing() {
        let config = NumberingConfig::new("P-", StartNumber::from_value(1));
        let mut assigner = NumberAssigner::new(&config);
        let assignments = assigner.assign(&[
            record(1, NOT_FABRICATION_PART),
            record(2, NOT_FABRICATION_PART),
        ])
        .unwrap();
        assert!(assignments.is_empty());
        assert_eq!(assigner.state().distinct_signatures(), 0);
        assert!(assigner.state().mapping().is_empty());
    }

    #[test]
    fn test_last_number_is_usable_once() {
        let start = StartNumber::parse("18446744073709551615").unwrap();
        let config = NumberingConfig::new("P-", start);
        config.validate().unwrap();
        let mut assigner = NumberAssigner::new(&config);

        let assignments = assigner
            .assign(&[record(1, "a"), record(2, NOT_FABRICATION_PART), record(3, "a")])
            .unwrap();
        assert_eq!(
            labels(&assignments),
            vec![(1, "P-18446744073709551615"), (3, "P-18446744073709551615")]
        );
        assert_eq!(assigner.state().next_number(), None);
    }

    #[test]
    fn test_exhausted_numbers_are_an_error() {
        let config = NumberingConfig::new("P-", StartNumber::from_value(u64::MAX - 1));
        let mut assigner = NumberAssigner::new(&config);

        let err = assigner
            .assign(&[record(1, "a"), record(2, "b"), record(3, "a"), record(4, "c")])
            .unwrap_err();
        assert!(
            matches!(&err, FabseqError::NumbersExhausted(sig) if sig.as_str() == "c"),
            "{err}"
        );
        assert_eq!(assigner.state().distinct_signatures(), 2);
    }

    #[test]
    fn test_write_back_counts_skips() {
        let mut model = SnapshotModel::builder()
            .fabrication(1, GeometryRecord::straight("10x10", 1.0, "None"))
            .fabrication(2, GeometryRecord::straight("10x10", 2.0, "None"))
            .fabrication(3, GeometryRecord::straight("10x10", 3.0, "None"))
            .parameter(1, "Item Number", "")
            .parameter(1, "Comments", "")
            .read_only_parameter(2, "Item Number", "fixed")
            .parameter(2, "Comments", "")
            .build()
            .unwrap();
        let config = NumberingConfig::new("P-", StartNumber::from_value(1));
        let mut assigner = NumberAssigner::new(&config);
        let assignments = assigner.assign(&[
            record(1, "a"),
            record(2, "b"),
            record(3, "c"),
            record(99, "a"),
        ])
        .unwrap();

        let report = write_labels(&mut model, assignments, &config);

        assert_eq!(report.processed, 1);
        assert_eq!(report.distinct_signatures, 3);
        assert_eq!(report.assignments.len(), 4);
        assert_eq!(report.skipped_parts(), 3);
        assert_eq!(
            report
                .skipped
                .iter()
                .map(|s| (s.part.0, s.attribute.as_str(), s.reason))
                .collect::<Vec<_>>(),
            vec![
                (2, "Item Number", SkipReason::ReadOnlyAttribute),
                (3, "Item Number", SkipReason::MissingAttribute),
                (3, "Comments", SkipReason::MissingAttribute),
                (99, "Item Number", SkipReason::UnresolvedPart),
            ]
        );

        assert_eq!(model.parameter(PartRef(1), "Item Number"), Some("P-1"));
        assert_eq!(model.parameter(PartRef(1), "Comments"), Some("a"));
        assert_eq!(model.parameter(PartRef(2), "Item Number"), Some("fixed"));
        assert_eq!(model.parameter(PartRef(2), "Comments"), Some("b"));
    }
}
