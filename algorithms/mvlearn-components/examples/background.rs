use mvlearn_components::{ComponentsError, EstimationWindow, PowerLaw, UniformAxis};
use ndarray::{Array1, Array2, Axis};

/// Subtract a power-law background fitted in front of a Gaussian edge, for a stack of spectra
fn main() -> Result<(), ComponentsError> {
    env_logger::init();

    let axis = UniformAxis::new(200., 0.5, 800)?;
    let energies = axis.values();
    let edge = energies.mapv(|x| 4. * (-(x - 450.0_f64) * (x - 450.) / 200.).exp());

    let mut spectra = Array2::zeros((axis.size(), 4));
    for (j, mut spectrum) in spectra.axis_iter_mut(Axis(1)).enumerate() {
        let truth = PowerLaw::new(2e6 * (j + 1) as f64, 2.5 + 0.25 * j as f64);
        spectrum.assign(&(truth.function(&energies) + &edge));
    }

    let window = EstimationWindow::continuous(250., 380.);
    let estimate = match PowerLaw::estimate(&axis, &spectra, window)? {
        Some(estimate) => estimate,
        None => {
            println!("the background could not be estimated");
            return Ok(());
        }
    };

    for (j, spectrum) in spectra.axis_iter(Axis(1)).enumerate() {
        let background = PowerLaw::new(estimate.a[j], estimate.r[j]).function(&energies);
        let residual: Array1<f64> = &spectrum - &background;
        println!(
            "spectrum {}: r = {:.3}, A = {:.3e}, edge area {:.2} (true {:.2})",
            j,
            estimate.r[j],
            estimate.a[j],
            axis.integrate(&residual),
            axis.integrate(&edge)
        );
    }

    Ok(())
}
