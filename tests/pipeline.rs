use compound_map::{
    io, CompoundRecord, CompoundTable, DescriptorSchema, Error, Pipeline, Stage, TriageConfig,
    DEFAULT_DESCRIPTORS,
};
use rand::prelude::*;

/// `n` compounds over the 13 default descriptors, drawn around a few centers.
fn compounds(n: usize, seed: u64) -> Vec<CompoundRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let centers: Vec<Vec<f32>> = (0..5)
        .map(|_| (0..13).map(|_| rng.random_range(-5.0f32..5.0)).collect())
        .collect();
    (0..n)
        .map(|i| {
            let c = &centers[i % centers.len()];
            let values = c.iter().map(|&v| v + rng.random_range(-0.5f32..0.5)).collect();
            CompoundRecord::new(format!("CHEMBL{i}"), format!("C{}O", "C".repeat(i % 7)), values)
        })
        .collect()
}

fn table(records: &[CompoundRecord]) -> CompoundTable {
    let schema = DescriptorSchema::new(DEFAULT_DESCRIPTORS).unwrap();
    CompoundTable::from_records("molecule_chembl_id", "smiles", &schema, records).unwrap()
}

fn config() -> TriageConfig {
    TriageConfig::default().with_n_epochs(200)
}

#[test]
fn two_hundred_compounds_twelve_clusters() {
    let result = Pipeline::new(config())
        .unwrap()
        .run(table(&compounds(200, 1)))
        .unwrap();

    let full = result.full_table().unwrap();
    assert_eq!(full.len(), 200);
    assert_eq!(full.columns().len(), 2 + 13 + 3);
    assert_eq!(&full.columns()[15..], &["embedX", "embedY", "cluster"]);

    let exemplars = result.exemplar_table().unwrap();
    assert!(exemplars.len() <= 12);
    assert_eq!(exemplars.len(), result.summary().cluster_sizes.iter().filter(|&&s| s > 0).count());

    let mut ids: Vec<&str> = exemplars.rows().iter().map(|r| r[17].as_str()).collect();
    let before = ids.len();
    ids.dedup();
    assert_eq!(ids.len(), before, "duplicate cluster ids in exemplar table");

    // Original columns pass through untouched, in order.
    for (i, row) in full.rows().iter().enumerate() {
        assert_eq!(&row[..15], result.input().rows()[i].as_slice());
    }
}

#[test]
fn repeated_runs_are_identical() {
    let records = compounds(60, 2);
    let pipeline = Pipeline::new(config().with_n_clusters(4).with_n_epochs(100)).unwrap();
    let a = pipeline.run(table(&records)).unwrap();
    let b = pipeline.run(table(&records)).unwrap();
    assert_eq!(a.embedding(), b.embedding());
    assert_eq!(a.labels(), b.labels());
    assert_eq!(a.exemplars(), b.exemplars());
}

#[test]
fn five_compounds_twelve_clusters_is_insufficient() {
    let err = Pipeline::new(config())
        .unwrap()
        .run(table(&compounds(5, 3)))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InsufficientSamples {
            stage: Stage::Partition,
            required: 12,
            n_items: 5
        }
    ));
}

#[test]
fn identical_compounds_give_one_exemplar() {
    let proto = compounds(1, 4).remove(0);
    let records: Vec<CompoundRecord> = (0..30)
        .map(|i| CompoundRecord::new(format!("ID{i}"), "CCN", proto.descriptors.clone()))
        .collect();
    let result = Pipeline::new(config()).unwrap().run(table(&records)).unwrap();
    assert_eq!(result.exemplar_table().unwrap().len(), 1);
    assert_eq!(result.full_table().unwrap().len(), 30);
}

#[test]
fn csv_files_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("admet_filtered.csv");
    let full = dir.path().join("admet_umap_clusters.csv");
    let medoids = dir.path().join("cluster_medoids.csv");

    let src = table(&compounds(40, 5));
    std::fs::write(&input, io::table_to_csv(&src).unwrap()).unwrap();

    let pipeline = Pipeline::new(config().with_n_clusters(5).with_n_epochs(100)).unwrap();
    let result = pipeline.run(io::read_table_path(&input).unwrap()).unwrap();
    io::write_outputs(&result, &full, &medoids).unwrap();

    let full_back = io::read_table_path(&full).unwrap();
    let medoids_back = io::read_table_path(&medoids).unwrap();
    assert_eq!(full_back.len(), 40);
    assert_eq!(medoids_back.len(), result.exemplars().len());
    assert_eq!(full_back.columns().last().map(String::as_str), Some("cluster"));
}

#[test]
fn failed_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let full = dir.path().join("full.csv");
    let medoids = dir.path().join("medoids.csv");

    let src = table(&compounds(20, 6));
    let mut rows = src.rows().to_vec();
    rows[3][4] = String::new();
    let bad = CompoundTable::new(src.columns().to_vec(), rows).unwrap();

    let err = Pipeline::new(config())
        .unwrap()
        .run(bad)
        .and_then(|result| io::write_outputs(&result, &full, &medoids))
        .unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Input));
    assert!(!full.exists());
    assert!(!medoids.exists());
}
