//! Hard c-Means, Fuzzy c-Means with a noise cluster, and DBSCAN on a simple 2D dataset.

use edmoal::algebra::RealSpace;
use edmoal::cluster::{seeding, NoiseDistance};
use edmoal::data::IndexedDataSet;
use edmoal::{
    Dbscan, FuzzyCMeans, FuzzyClustering, HardCMeans, NoiseClustering, PrototypeClustering, NOISE,
    UNASSIGNED,
};

fn main() -> edmoal::Result<()> {
    // Three well-separated clusters in 2D, plus one outlier.
    let data: IndexedDataSet<Vec<f64>> = vec![
        // Cluster A (near origin)
        vec![0.0, 0.0],
        vec![0.1, 0.2],
        vec![0.2, 0.1],
        vec![-0.1, 0.1],
        // Cluster B (near (5, 5))
        vec![5.0, 5.0],
        vec![5.1, 4.9],
        vec![4.9, 5.1],
        vec![5.2, 5.2],
        // Cluster C (near (10, 0))
        vec![10.0, 0.0],
        vec![10.1, 0.1],
        vec![9.9, -0.1],
        vec![10.2, 0.2],
        // Outlier
        vec![5.0, 30.0],
    ]
    .into_iter()
    .collect();
    let space = RealSpace::new(2);
    let seeds = seeding::kmeanspp_positions(&data, &space, 3, Some(42))?;

    // --- Hard c-Means (k=3) ---
    let mut hcm = HardCMeans::new(&data, space)?;
    hcm.initialize_with_positions(&seeds)?;
    let steps = hcm.apply(100)?;
    let labels = hcm.crisp_assignments()?;
    println!("=== Hard c-Means (k=3, {steps} iterations) ===");
    for (obj, label) in data.iter().zip(&labels) {
        println!("  point {:2} ({:5.1}, {:5.1}) => cluster {}", obj.id(), obj.x[0], obj.x[1], label);
    }

    // --- Fuzzy c-Means with noise (m=2, delta=3) ---
    let mut fcm = FuzzyCMeans::new(&data, space)?
        .with_fuzzifier(2.0)?
        .with_noise(NoiseDistance::new(3.0)?);
    fcm.initialize_with_prototypes(hcm.prototypes()?)?;
    let steps = fcm.apply(100)?;
    let memberships = fcm.fuzzy_assignments()?;
    let noise = fcm.noise_memberships()?;
    let labels = fcm.crisp_assignments()?;
    println!("\n=== Fuzzy c-Means (m=2, noise distance 3, {steps} iterations) ===");
    for (obj, ((u, nu), label)) in data.iter().zip(memberships.iter().zip(&noise).zip(&labels)) {
        let tag = if *label == UNASSIGNED {
            "NOISE".to_string()
        } else {
            format!("cluster {}", label)
        };
        let u: Vec<String> = u.iter().map(|v| format!("{v:.2}")).collect();
        println!(
            "  point {:2} ({:5.1}, {:5.1}) => [{}] noise {:.2} => {}",
            obj.id(),
            obj.x[0],
            obj.x[1],
            u.join(", "),
            nu,
            tag
        );
    }

    // --- DBSCAN (eps=1.0, min_pts=2) ---
    let labels = Dbscan::new(1.0, 2).fit_predict(&data, space)?;
    println!("\n=== DBSCAN (eps=1.0, min_pts=2) ===");
    for (obj, label) in data.iter().zip(&labels) {
        let tag = if *label == NOISE {
            "NOISE".to_string()
        } else {
            format!("cluster {}", label)
        };
        println!("  point {:2} ({:5.1}, {:5.1}) => {}", obj.id(), obj.x[0], obj.x[1], tag);
    }

    Ok(())
}
