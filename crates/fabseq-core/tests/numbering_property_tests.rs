use fabseq_core::{
    padding_width, NumberAssigner, NumberingConfig, StartNumber, VisitRecord,
    NOT_FABRICATION_PART,
};
use fabseq_model::PartRef;
use proptest::prelude::*;
use std::collections::HashMap;

fn records_strategy() -> impl Strategy<Value = Vec<VisitRecord>> {
    // Index 0 stands for the accessory sentinel.
    prop::collection::vec(0usize..6, 0..40).prop_map(|picks| {
        picks
            .into_iter()
            .enumerate()
            .map(|(i, pick)| VisitRecord {
                part: PartRef(i as u64),
                signature: if pick == 0 {
                    NOT_FABRICATION_PART.into()
                } else {
                    format!("{pick}0x{pick}0_1.5_None_True_").into()
                },
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn equal_signatures_share_numbers_in_first_seen_order(
        records in records_strategy(),
        start in 1u64..500,
    ) {
        let config = NumberingConfig::new("B", StartNumber::from_value(start));
        let mut assigner = NumberAssigner::new(&config);
        let assignments = assigner.assign(&records).unwrap();

        let numbered: Vec<&VisitRecord> = records.iter().filter(|r| !r.is_sentinel()).collect();
        prop_assert_eq!(assignments.len(), numbered.len());

        let mut expected: HashMap<&str, u64> = HashMap::new();
        let mut next = start;
        for (record, assignment) in numbered.iter().zip(&assignments) {
            prop_assert_eq!(record.part, assignment.part);
            let number = *expected.entry(record.signature.as_str()).or_insert_with(|| {
                next += 1;
                next - 1
            });
            prop_assert_eq!(assignment.number, number);
            prop_assert_eq!(&assignment.label, &format!("B{number}"));
        }
        prop_assert_eq!(assigner.state().distinct_signatures(), expected.len());
        prop_assert_eq!(assigner.state().next_number(), Some(start + expected.len() as u64));
    }

    #[test]
    fn width_is_bounded_by_leading_zeros(zeros in 0usize..6, value in 1u64..100_000) {
        let raw = format!("{}{}", "0".repeat(zeros), value);
        let width = padding_width(value, &raw);
        prop_assert!(width >= 1);
        prop_assert!(width <= zeros.max(2));
        if zeros == 0 {
            prop_assert_eq!(width, 1);
        }
    }
}
