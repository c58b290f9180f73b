use proptest::prelude::*;
use starschema::dataset::{Column, ColumnType, Dataset, Value};
use starschema::model::DimensionSpec;
use starschema::normalize::normalize;

fn wide(rows: &[(Option<u8>, u8, i64)]) -> Dataset {
    Dataset::from_rows(
        vec![
            Column::new("VENDOR", ColumnType::Text),
            Column::new("STATE_ABBR", ColumnType::Text),
            Column::new("WRTN_PREM_AMT", ColumnType::Integer),
        ],
        rows.iter()
            .map(|(vendor, state, premium)| {
                vec![
                    vendor.map(|v| format!("V{v}")).into(),
                    format!("S{state}").into(),
                    Value::Int(*premium),
                ]
            })
            .collect(),
    )
    .unwrap()
}

fn specs() -> Vec<DimensionSpec> {
    vec![
        DimensionSpec::new("vendor", &["VENDOR"]),
        DimensionSpec::new("state", &["STATE_ABBR"]),
    ]
}

proptest! {
    #[test]
    fn keys_are_dense_and_rows_preserved(
        rows in prop::collection::vec((prop::option::of(0u8..4), 0u8..6, any::<i64>()), 0..40),
    ) {
        let wide = wide(&rows);
        let schema = normalize(&wide, &specs()).unwrap();

        prop_assert_eq!(schema.fact.len(), wide.len());
        prop_assert_eq!(
            schema.fact.column_values("WRTN_PREM_AMT").unwrap(),
            wide.column_values("WRTN_PREM_AMT").unwrap()
        );

        for dim in &schema.dimensions {
            let ids: Vec<_> = dim.data.column_values("id").unwrap();
            let expected: Vec<Value> = (1..=dim.data.len() as i64).map(Value::Int).collect();
            prop_assert_eq!(ids, expected.iter().collect::<Vec<_>>());
        }
    }

    #[test]
    fn foreign_keys_resolve_to_source_values(
        rows in prop::collection::vec((prop::option::of(0u8..4), 0u8..6, any::<i64>()), 1..40),
    ) {
        let wide = wide(&rows);
        let schema = normalize(&wide, &specs()).unwrap();

        for (table, source, fk) in [("vendor", "VENDOR", "VENDOR_ID"), ("state", "STATE_ABBR", "STATE_ID")] {
            let dim = &schema.dimension(table).unwrap().data;
            for row in 0..wide.len() {
                let key = schema.fact.value(row, fk).and_then(Value::as_i64).unwrap();
                let dim_row = (key - 1) as usize;
                prop_assert_eq!(dim.value(dim_row, source), wide.value(row, source));
            }
        }
    }

    #[test]
    fn dimension_rows_are_distinct(
        rows in prop::collection::vec((prop::option::of(0u8..4), 0u8..6, any::<i64>()), 0..40),
    ) {
        let schema = normalize(&wide(&rows), &specs()).unwrap();
        for dim in &schema.dimensions {
            let mut seen = std::collections::HashSet::new();
            for row in dim.data.rows() {
                prop_assert!(seen.insert(&row[1..]), "duplicate identity in {}", dim.name);
            }
        }
    }
}
