use compound_map::cluster::{select_exemplars, Clustering, Kmeans};
use compound_map::{FeatureMatrix, StandardScaler};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_labels_index_a_centroid(
        data in prop::collection::vec(prop::collection::vec(-10.0f32..10.0, 2), 1..20),
        k in 1usize..5
    ) {
        prop_assume!(k <= data.len());
        let fit = Kmeans::new(k).with_seed(42).fit(&data).unwrap();

        prop_assert_eq!(fit.labels.len(), data.len());
        prop_assert_eq!(fit.centroids.len(), k);
        prop_assert!(fit.labels.iter().all(|&l| l < k));
        prop_assert_eq!(fit.cluster_sizes().iter().sum::<usize>(), data.len());
        prop_assert_eq!(Kmeans::new(k).with_seed(42).fit_predict(&data).unwrap(), fit.labels);
    }

    #[test]
    fn prop_kmeans_seeded_runs_agree(
        data in prop::collection::vec(prop::collection::vec(-10.0f32..10.0, 2), 5..30),
        seed in any::<u64>()
    ) {
        let a = Kmeans::new(4).with_seed(seed).fit(&data).unwrap();
        let b = Kmeans::new(4).with_seed(seed).fit(&data).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_one_exemplar_per_nonempty_cluster(
        data in prop::collection::vec(prop::collection::vec(-10.0f32..10.0, 2), 3..40),
        k in 1usize..4
    ) {
        let fit = Kmeans::new(k).with_seed(7).fit(&data).unwrap();
        let exemplars = select_exemplars(&data, &fit.labels, &fit.centroids).unwrap();

        prop_assert_eq!(exemplars.len(), fit.n_nonempty());
        prop_assert!(exemplars.len() <= k);
        for pair in exemplars.windows(2) {
            prop_assert!(pair[0].cluster < pair[1].cluster);
        }
        for ex in &exemplars {
            prop_assert_eq!(fit.labels[ex.row], ex.cluster);
            // No member is strictly closer to the centroid.
            let c = &fit.centroids[ex.cluster];
            let d = |p: &Vec<f32>| {
                let (dx, dy) = (p[0] - c[0], p[1] - c[1]);
                dx * dx + dy * dy
            };
            let best = d(&data[ex.row]);
            for (row, p) in data.iter().enumerate() {
                if fit.labels[row] == ex.cluster {
                    prop_assert!(d(p) >= best);
                    if d(p) == best {
                        prop_assert!(row >= ex.row);
                    }
                }
            }
        }
    }

    #[test]
    fn prop_standardized_columns_are_centered(
        rows in prop::collection::vec(
            prop::collection::vec((-1000i32..1000).prop_map(|v| v as f32), 3),
            2..50
        )
    ) {
        let m = FeatureMatrix::new(rows).unwrap();
        let (scaler, z) = StandardScaler::fit_transform(&m).unwrap();
        for j in 0..3 {
            let col: Vec<f64> = z.rows().iter().map(|r| f64::from(r[j])).collect();
            prop_assert!(col.iter().all(|v| v.is_finite()));
            let n = col.len() as f64;
            let mean = col.iter().sum::<f64>() / n;
            prop_assert!(mean.abs() < 1e-3, "column {} mean {}", j, mean);
            if scaler.std[j] == 0.0 {
                prop_assert!(col.iter().all(|&v| v == 0.0));
            }
        }
    }
}
