//! Triage map of a small synthetic compound set.

use compound_map::{CompoundRecord, CompoundTable, DescriptorSchema, Pipeline, TriageConfig};

fn main() {
    tracing_subscriber::fmt::init();

    // Three chemotypes over four descriptors.
    let schema = DescriptorSchema::new(["MW", "logP", "TPSA", "nRot"]).unwrap();
    let families = [
        ("CCO", [46.0f32, -0.3, 20.2, 0.0]),
        ("c1ccccc1", [78.1, 2.1, 0.0, 0.0]),
        ("CC(=O)Nc1ccc(O)cc1", [151.2, 0.5, 49.3, 1.0]),
    ];
    let records: Vec<CompoundRecord> = (0..30)
        .map(|i| {
            let (smiles, base) = families[i % families.len()];
            let jitter = (i as f32 * 0.37).sin();
            let values = base.iter().map(|v| v + jitter).collect();
            CompoundRecord::new(format!("CMPD-{i:03}"), smiles, values)
        })
        .collect();
    let table = CompoundTable::from_records("id", "smiles", &schema, &records).unwrap();

    let config = TriageConfig::default()
        .with_descriptors(["MW", "logP", "TPSA", "nRot"])
        .with_n_clusters(3)
        .with_n_neighbors(5);
    let result = Pipeline::new(config).unwrap().run(table).unwrap();

    println!("=== Embedded compounds ===");
    for row in result.rows() {
        println!(
            "  {:8} ({:6.2}, {:6.2}) => cluster {}{}",
            row.fields[0],
            row.coord[0],
            row.coord[1],
            row.cluster,
            if row.is_exemplar { "  [exemplar]" } else { "" }
        );
    }

    println!("\n=== Exemplars ===");
    for row in result.exemplar_rows() {
        println!("  cluster {}: {} {}", row.cluster, row.fields[0], row.fields[1]);
    }
}
