use mvlearn::{error::Result, metrics::Decomposition, traits::Fit};
use mvlearn_datasets::generate::low_rank_sparse;
use mvlearn_rpca::{Godec, Orpca, OrpcaMethod, RpcaError};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

fn main() -> std::result::Result<(), RpcaError> {
    env_logger::init();

    // a rank 3 signal with 1% of the entries hit by outliers
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let problem = low_rank_sparse((256, 500), 3, 0.01, 10., 0.01, &mut rng)?;

    let godec = Godec::params(3).random_state(42).fit(&problem.observed)?;
    report("GoDec", godec.u(), &problem.basis)?;
    println!(
        "  converged: {} after {} iterations",
        godec.converged(),
        godec.n_iter()
    );

    for method in ["CF", "BCD", "SGD", "MomentumSGD"].iter() {
        let orpca = Orpca::params(3)
            .method(method.parse::<OrpcaMethod>()?)
            .random_state(42)
            .fit(&problem.observed)?;
        report(&format!("ORPCA {}", method), orpca.u(), &problem.basis)?;
    }

    Ok(())
}

fn report(name: &str, u: &ndarray::Array2<f64>, basis: &ndarray::Array2<f64>) -> Result<()> {
    println!(
        "{:>18}: expressed variance {:.2e}",
        name,
        u.expressed_variance(basis)?
    );
    Ok(())
}
