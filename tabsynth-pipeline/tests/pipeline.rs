use std::fs;
use std::path::PathBuf;

use tabsynth_core::{
    load_artifact, save_artifact, ArtifactKind, Column, DataFrame, DataType, Error as CoreError,
};
use tabsynth_pipeline::stages::{EvaluationInputs, ModelInputs, ModelRun};
use tabsynth_pipeline::{
    ArtifactName, DatasetMetadata, EvaluationBundle, InputSource, MetaTransformer, Pipeline,
    PipelineConfig, Plot, SyntheticDatasets, TrainedModel,
};
use tempfile::TempDir;

const PATIENTS: &str = "\
,age,sex,smoker,admitted
0,34,F,true,2023-01-04
1,71,M,false,2023-02-11
2,,F,,2023-03-19
3,58,M,true,
4,45,F,false,2023-05-30
";

const PATIENTS_METADATA: &str = "\
columns:
  - name: age
    missingness: augment
  - name: admitted
    dtype: timestamp
    datetime_format: \"%Y-%m-%d\"
    missingness: augment
";

struct Workspace {
    root: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let data = root.path().join("data");
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join("patients.csv"), PATIENTS).unwrap();
        fs::write(data.join("patients_metadata.yaml"), PATIENTS_METADATA).unwrap();
        Self { root }
    }

    fn config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::for_dataset("patients");
        config.experiment_name = Some("baseline".into());
        config.experiments_dir = self.root.path().join("experiments");
        config.dataloader.data_dir = self.root.path().join("data");
        config.dataloader.index_col = true;
        config
    }

    fn experiment_dir(&self) -> PathBuf {
        self.root.path().join("experiments").join("baseline")
    }
}

fn echo_model(inputs: &ModelInputs) -> Result<ModelRun, String> {
    Ok(ModelRun {
        model: TrainedModel::new("echo", vec![0xAB]).with_metadata("epsilon", "inf"),
        samples: vec![("seed_0".into(), inputs.prepared.clone())],
    })
}

fn row_counts(inputs: &EvaluationInputs) -> Result<EvaluationBundle, String> {
    let mut bundle = EvaluationBundle::new();
    for dataset in inputs.synthetic.iter() {
        #[allow(clippy::cast_precision_loss)]
        let ratio = dataset.data.row_count() as f64 / inputs.typed.row_count() as f64;
        bundle.record(&dataset.label, "row_ratio", ratio);
    }
    Ok(bundle)
}

#[test]
fn test_full_chain_in_process() {
    let workspace = Workspace::new();
    let mut pipeline = Pipeline::new(workspace.config()).unwrap();

    let loaded = pipeline.run_dataloader().unwrap();
    assert_eq!(loaded.typed, workspace.experiment_dir().join("patients_typed.pkl"));

    let typed = pipeline
        .handover()
        .frame(ArtifactName::Typed)
        .cloned()
        .unwrap();
    assert_eq!(typed.column_names(), vec!["age", "sex", "smoker", "admitted"]);
    assert_eq!(
        typed.schema().field_by_name("admitted").unwrap().data_type(),
        DataType::Timestamp
    );

    let modelled = pipeline.run_model(echo_model).unwrap();
    assert_eq!(modelled.model, workspace.experiment_dir().join("patients_model.pt"));

    let evaluations = pipeline.run_evaluation(row_counts).unwrap();
    let plots = pipeline
        .run_plotting(|inputs| {
            assert_eq!(inputs.source, InputSource::Handover);
            Ok::<_, String>(vec![Plot::new("_fidelity", b"png".to_vec())])
        })
        .unwrap();

    let synthetic: SyntheticDatasets = load_artifact(
        &workspace.experiment_dir().join("patients_synthetic_datasets.pkl"),
        ArtifactKind::SyntheticDatasets,
    )
    .unwrap();
    assert_eq!(synthetic.get("seed_0"), Some(&typed));

    let bundle: EvaluationBundle =
        load_artifact(&evaluations, ArtifactKind::EvaluationBundle).unwrap();
    assert_eq!(bundle.get("seed_0", "row_ratio"), Some(1.0));
    assert_eq!(plots, vec![workspace.experiment_dir().join("patients_fidelity.png")]);

    for name in [
        "patients_transformed.pkl",
        "patients_metatransformer.pkl",
        "patients_metadata.yaml",
        "patients_evaluations.pkl",
    ] {
        assert!(workspace.experiment_dir().join(name).exists(), "{name} was not written");
    }
}

#[test]
fn test_stage_by_stage_from_disk() {
    let workspace = Workspace::new();
    Pipeline::new(workspace.config()).unwrap().run_dataloader().unwrap();

    let mut model = Pipeline::new(workspace.config()).unwrap();
    model
        .run_model(|inputs| {
            assert_eq!(inputs.source, InputSource::Disk);
            assert_eq!(inputs.dataset, "patients");
            echo_model(inputs)
        })
        .unwrap();

    let mut evaluation = Pipeline::new(workspace.config()).unwrap();
    evaluation
        .run_evaluation(|inputs| {
            assert_eq!(inputs.source, InputSource::Disk);
            assert_eq!(inputs.synthetic.get("seed_0"), Some(&inputs.typed));
            row_counts(inputs)
        })
        .unwrap();

    let mut plotting = Pipeline::new(workspace.config()).unwrap();
    plotting
        .run_plotting(|inputs| {
            assert_eq!(inputs.source, InputSource::Disk);
            assert_eq!(inputs.evaluations.get("seed_0", "row_ratio"), Some(1.0));
            Ok::<_, String>(Vec::new())
        })
        .unwrap();
}

#[test]
fn test_handover_takes_precedence_over_disk() {
    let workspace = Workspace::new();
    let mut pipeline = Pipeline::new(workspace.config()).unwrap();
    pipeline.run_dataloader().unwrap();
    pipeline.run_model(echo_model).unwrap();

    let decoy = DataFrame::from_columns(vec![Column::int64("age", vec![Some(1)])]).unwrap();
    save_artifact(
        &workspace.experiment_dir().join("patients_typed.pkl"),
        ArtifactKind::TypedData,
        &decoy,
    )
    .unwrap();

    pipeline
        .run_evaluation(|inputs| {
            assert_eq!(inputs.source, InputSource::Handover);
            assert_eq!(inputs.typed.row_count(), 5);
            row_counts(inputs)
        })
        .unwrap();
}

#[test]
fn test_missing_inputs_name_every_file() {
    let workspace = Workspace::new();
    let mut pipeline = Pipeline::new(workspace.config()).unwrap();

    let err = pipeline.run_evaluation(row_counts).unwrap_err();
    match err.as_core() {
        Some(CoreError::MissingArtifact { files }) => {
            let names: Vec<_> = files.iter().filter_map(|f| f.file_name()?.to_str()).collect();
            assert_eq!(names, vec!["patients_typed.pkl", "patients_synthetic_datasets.pkl"]);
        }
        other => panic!("expected missing artifacts, got {other:?}"),
    }
}

#[test]
fn test_missing_raw_data() {
    let workspace = Workspace::new();
    fs::remove_file(workspace.root.path().join("data/patients.csv")).unwrap();

    let err = Pipeline::new(workspace.config()).unwrap().run_dataloader().unwrap_err();
    assert!(err.to_string().contains("patients.csv"));
}

#[test]
fn test_unassignable_column_is_named() {
    let workspace = Workspace::new();
    let metadata = format!("{PATIENTS_METADATA}  - name: sex\n    kind: other\n");
    fs::write(workspace.root.path().join("data/patients_metadata.yaml"), metadata).unwrap();

    let err = Pipeline::new(workspace.config()).unwrap().run_dataloader().unwrap_err();
    match err.as_core() {
        Some(CoreError::UnassignableColumn { column, .. }) => assert_eq!(column, "sex"),
        other => panic!("expected an unassignable column, got {other:?}"),
    }
    assert!(!workspace.experiment_dir().join("patients_typed.pkl").exists());
}

#[test]
fn test_written_metadata_is_completed() {
    let workspace = Workspace::new();
    Pipeline::new(workspace.config()).unwrap().run_dataloader().unwrap();

    let yaml =
        fs::read_to_string(workspace.experiment_dir().join("patients_metadata.yaml")).unwrap();
    let written: DatasetMetadata = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(written.columns.len(), 4);
    assert_eq!(written.get("smoker").unwrap().dtype, Some(DataType::Boolean));

    let meta: MetaTransformer = load_artifact(
        &workspace.experiment_dir().join("patients_metatransformer.pkl"),
        ArtifactKind::MetaTransformer,
    )
    .unwrap();
    assert_eq!(meta.metadata(), &written);
}

#[test]
fn test_declared_metadata_is_written_as_is() {
    let workspace = Workspace::new();
    let mut config = workspace.config();
    config.dataloader.write_declared_metadata = true;
    Pipeline::new(config).unwrap().run_dataloader().unwrap();

    let yaml =
        fs::read_to_string(workspace.experiment_dir().join("patients_metadata.yaml")).unwrap();
    let written: DatasetMetadata = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(written.columns.len(), 2);
    assert!(written.get("smoker").is_none());
}
