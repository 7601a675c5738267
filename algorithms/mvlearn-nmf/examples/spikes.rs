use mvlearn::{metrics::Decomposition, traits::Fit};
use mvlearn_datasets::generate::{nonnegative_low_rank, sparse_corruption};
use mvlearn_nmf::{NmfError, Ornmf, OrnmfMethod};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

fn main() -> Result<(), NmfError> {
    env_logger::init();

    let mut rng = Xoshiro256Plus::seed_from_u64(101);
    let problem = nonnegative_low_rank((128, 500), 3, &mut rng);
    let clean = problem.data.mapv(|x| 100. * x);
    let spikes = sparse_corruption(clean.dim(), 0.02, 50., &mut rng)?;
    let corrupted = &clean + &spikes;

    for method in &[
        OrnmfMethod::Pgd,
        OrnmfMethod::RobustPgd,
        OrnmfMethod::MomentumSgd,
    ] {
        let ornmf = Ornmf::params(3)
            .method(*method)
            .random_state(42)
            .fit(&corrupted)?;
        let (h, _) = ornmf.project(&corrupted)?;

        println!(
            "{:>12}: streamed difference {:.3}, projected difference {:.3}",
            method.to_string(),
            ornmf.reconstruct().normalized_difference(&clean)?,
            ornmf.w().dot(&h).normalized_difference(&clean)?
        );
    }

    Ok(())
}
