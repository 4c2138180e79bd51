use proptest::prelude::*;
use tabsynth_core::{load_artifact, save_artifact, ArtifactKind, Column, DataFrame, Error, Value};
use tabsynth_transforms::{
    ColumnSpec, DatasetMetadata, MetaTransformer, MetaTransformerConfig, MissingnessStrategy,
    TransformerKind,
};
use tempfile::TempDir;

fn admissions() -> DataFrame {
    DataFrame::from_columns(vec![
        Column::int64("age", vec![Some(64), None, Some(45), Some(80), Some(45)]),
        Column::boolean("smoker", vec![Some(true), Some(false), None, Some(false), Some(true)]),
        Column::string(
            "ward",
            vec![
                Some("icu".into()),
                Some("general".into()),
                Some("icu".into()),
                None,
                Some("maternity".into()),
            ],
        ),
        Column::timestamp(
            "admitted",
            vec![
                Some(1_672_531_200_000),
                Some(1_675_209_600_500),
                None,
                Some(1_680_307_200_000),
                Some(1_690_000_000_999),
            ],
        ),
        Column::string("notes", vec![Some("a".into()), None, None, Some("b".into()), None]),
    ])
    .unwrap()
}

fn metadata() -> DatasetMetadata {
    DatasetMetadata::new(vec![
        ColumnSpec::new("age").with_missingness(MissingnessStrategy::Augment),
        ColumnSpec::new("admitted").with_missingness(MissingnessStrategy::Augment),
        ColumnSpec::new("notes").with_transformer(TransformerKind::Null),
    ])
}

fn allow_null() -> MetaTransformerConfig {
    MetaTransformerConfig {
        allow_null_transformers: true,
    }
}

#[test]
fn test_reloaded_metatransformer_reverts_identically() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("admissions_metatransformer.pkl");
    let typed = admissions();

    let meta = MetaTransformer::fit(&typed, &metadata(), allow_null()).unwrap();
    let transformed = meta.apply(&typed).unwrap();
    save_artifact(&path, ArtifactKind::MetaTransformer, &meta).unwrap();

    let reloaded: MetaTransformer = load_artifact(&path, ArtifactKind::MetaTransformer).unwrap();
    assert_eq!(reloaded, meta);
    assert_eq!(reloaded.schema().field_by_name("ward").unwrap().name(), "ward");

    let reverted = reloaded.revert(&transformed).unwrap();
    assert_eq!(reverted, typed);
}

#[test]
fn test_metatransformer_is_not_loadable_as_other_kinds() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("admissions_metatransformer.pkl");
    let meta = MetaTransformer::fit(&admissions(), &metadata(), allow_null()).unwrap();
    save_artifact(&path, ArtifactKind::MetaTransformer, &meta).unwrap();

    let err = load_artifact::<MetaTransformer>(&path, ArtifactKind::TypedData).unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }));
}

#[test]
fn test_transformed_layout() {
    let meta = MetaTransformer::fit(&admissions(), &metadata(), allow_null()).unwrap();
    assert_eq!(
        meta.transformed_columns(),
        vec![
            "age",
            "age_missing",
            "smoker_0",
            "smoker_1",
            "ward_0",
            "ward_1",
            "ward_2",
            "admitted",
            "admitted_missing",
            "notes",
        ]
    );

    let transformed = meta.apply(&admissions()).unwrap();
    assert_eq!(
        transformed.column_by_name("admitted_missing").unwrap().values()[2],
        Some(Value::Boolean(true))
    );
}

#[test]
fn test_values_near_the_float_limit_round_trip() {
    let typed = DataFrame::from_columns(vec![
        Column::float64("x", vec![Some(1e308), Some(1e308), Some(1e308)]),
        Column::float64("y", vec![Some(f64::MAX), None, Some(-f64::MAX)]),
    ])
    .unwrap();
    let meta =
        MetaTransformer::fit(&typed, &DatasetMetadata::default(), MetaTransformerConfig::default())
            .unwrap();

    let reverted = meta.revert(&meta.apply(&typed).unwrap()).unwrap();
    assert_eq!(reverted, typed);
}

fn typed_frame() -> impl Strategy<Value = DataFrame> {
    (1usize..40).prop_flat_map(|rows| {
        (
            prop::collection::vec(prop::option::of(-10_000i64..10_000), rows),
            prop::collection::vec(prop::option::of(-1.0e3f64..1.0e3), rows),
            prop::collection::vec(
                prop::option::of(prop::sample::select(vec!["a", "b", "c"])),
                rows,
            ),
        )
            .prop_map(|(ints, floats, labels)| {
                DataFrame::from_columns(vec![
                    Column::int64("count", ints),
                    Column::float64("score", floats),
                    Column::string(
                        "label",
                        labels.into_iter().map(|l| l.map(str::to_string)).collect(),
                    ),
                ])
                .unwrap()
            })
    })
}

proptest! {
    #[test]
    fn prop_apply_then_revert_restores_typed_data(
        typed in typed_frame(),
        augment in any::<bool>()
    ) {
        let strategy = if augment {
            MissingnessStrategy::Augment
        } else {
            MissingnessStrategy::None
        };
        let metadata = DatasetMetadata::new(
            ["count", "score", "label"]
                .iter()
                .map(|name| ColumnSpec::new(name).with_missingness(strategy))
                .collect(),
        );

        // an all-null label column has no categories and passes through unchanged
        let meta = MetaTransformer::fit(&typed, &metadata, allow_null()).unwrap();
        let reverted = meta.revert(&meta.apply(&typed).unwrap()).unwrap();

        prop_assert_eq!(reverted.schema(), typed.schema());
        for name in ["count", "label"] {
            prop_assert_eq!(
                reverted.column_by_name(name).unwrap(),
                typed.column_by_name(name).unwrap()
            );
        }

        let before = typed.column_by_name("score").unwrap().to_f64().unwrap();
        let after = reverted.column_by_name("score").unwrap().to_f64().unwrap();
        for (a, b) in before.into_iter().zip(after) {
            match (a, b) {
                (Some(a), Some(b)) => prop_assert!((a - b).abs() <= 1e-9 * a.abs().max(1.0e3)),
                (None, None) => {}
                _ => prop_assert!(false, "null pattern changed"),
            }
        }
    }
}
