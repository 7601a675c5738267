use std::error::Error;

use mvlearn::traits::Fit;
use mvlearn_datasets::generate::{nonnegative_low_rank, sparse_corruption};
use mvlearn_mcr::{DecompositionResults, Mcr, Simplicity};
use mvlearn_rpca::Godec;
use ndarray::{Array2, ArrayView1, Axis};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    // 64 channels, 400 pixels, three non-negative sources
    let mut rng = Xoshiro256Plus::seed_from_u64(7);
    let sources = nonnegative_low_rank((64, 400), 3, &mut rng);
    let spikes = sparse_corruption(sources.data.dim(), 0.01, 50., &mut rng)?;
    let observed = sources.data.mapv(|x| 100. * x) + spikes.mapv(f64::abs);

    let godec = Godec::params(3).random_state(7).fit(&observed)?;
    let loadings = godec.v() * godec.s();
    let results =
        DecompositionResults::from_matrices(godec.low_rank().t().to_owned(), godec.u(), &loadings)
            .with_output_dimension(3);

    for simplicity in &[Simplicity::Spatial, Simplicity::Spectral] {
        let mcr = Mcr::params().simplicity(*simplicity).fit(&results)?;

        println!(
            "{:>8} simplicity: {} iterations ({}), similarity to the sources {:.3?}",
            simplicity.to_string(),
            mcr.n_iter(),
            mcr.stop_reason(),
            best_matches(mcr.factors(), &sources.w)
        );
    }

    Ok(())
}

/// Cosine similarity of every resolved factor with its closest source
fn best_matches(factors: &Array2<f64>, sources: &Array2<f64>) -> Vec<f64> {
    let cosine = |a: ArrayView1<f64>, b: ArrayView1<f64>| {
        a.dot(&b) / (a.dot(&a).sqrt() * b.dot(&b).sqrt()).max(f64::EPSILON)
    };

    factors
        .axis_iter(Axis(1))
        .map(|factor| {
            sources
                .axis_iter(Axis(1))
                .map(|source| cosine(factor, source))
                .fold(0., f64::max)
        })
        .collect()
}
