use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use sct_core::{ColumnSource, CovarianceType, Error, Result};
use sct_inference::{INTERCEPT, ModelOptions, fit_models, model_a, model_b};

/// Balanced institution × month panel: 24 months, 12 before and 12 after release.
struct Panel {
    index_std: Vec<f64>,
    after_release: Vec<f64>,
    is_high_earning: Vec<f64>,
    is_in_city: Vec<f64>,
    month_of_year: Vec<usize>,
    institution: Vec<usize>,
}

impl ColumnSource for Panel {
    fn n_rows(&self) -> usize {
        self.index_std.len()
    }

    fn numeric(&self, name: &str) -> Result<Vec<f64>> {
        match name {
            "index_std" => Ok(self.index_std.clone()),
            "after_release" => Ok(self.after_release.clone()),
            "is_high_earning" => Ok(self.is_high_earning.clone()),
            "is_in_city" => Ok(self.is_in_city.clone()),
            _ => Err(Error::Validation(format!("no numeric column {name}"))),
        }
    }

    fn categorical(&self, name: &str) -> Result<Vec<usize>> {
        match name {
            "month_of_year" => Ok(self.month_of_year.clone()),
            "institution" => Ok(self.institution.clone()),
            _ => Err(Error::Validation(format!("no categorical column {name}"))),
        }
    }
}

fn panel(seed: u64, n_inst: usize) -> Panel {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 0.5).unwrap();
    let month_effect = [0.3, 0.1, -0.2, 0.0, 0.4, -0.1, -0.3, 0.2, 0.0, 0.1, -0.4, 0.25];

    let mut p = Panel {
        index_std: Vec::new(),
        after_release: Vec::new(),
        is_high_earning: Vec::new(),
        is_in_city: Vec::new(),
        month_of_year: Vec::new(),
        institution: Vec::new(),
    };
    for inst in 0..n_inst {
        let high = if rng.gen_bool(0.3) { 1.0 } else { 0.0 };
        let city = if rng.gen_bool(0.5) { 1.0 } else { 0.0 };
        for t in 0..24usize {
            // t = 0 is October of the year before the release
            let moy = (9 + t) % 12;
            let after = if t >= 12 { 1.0 } else { 0.0 };
            let y = 0.1 * after + 0.2 * high - 0.3 * after * high
                + 0.15 * city
                + month_effect[moy]
                + noise.sample(&mut rng);
            p.index_std.push(y);
            p.after_release.push(after);
            p.is_high_earning.push(high);
            p.is_in_city.push(city);
            p.month_of_year.push(moy);
            p.institution.push(inst);
        }
    }
    p
}

#[test]
fn interaction_recovered_and_stable_across_models() {
    let data = panel(7, 300);
    let opts = ModelOptions::default();
    let set = fit_models(&data, &opts).unwrap();
    let inter = opts.interaction();

    let a = set.a.coefficient(&inter).unwrap();
    let b = set.b.coefficient(&inter).unwrap();
    let c = set.c.coefficient(&inter).unwrap();

    assert!((a.estimate + 0.3).abs() < 4.0 * a.std_error, "A: {} ± {}", a.estimate, a.std_error);

    // city and month effects are balanced across the design cells
    assert_abs_diff_eq!(a.estimate, c.estimate, epsilon = 1e-6);
    assert_abs_diff_eq!(a.estimate, b.estimate, epsilon = 1e-6);

    assert!(set.a.coefficient(INTERCEPT).is_some());
    assert!(set.b.coefficient(INTERCEPT).is_none());
    assert_eq!(set.b.absorbed, vec!["month_of_year".to_string()]);
    assert_eq!(set.b.df_absorbed, 12);
    assert_eq!(set.b.df_resid, data.n_rows() - 3 - 12);
    assert_eq!(set.a.df_resid, data.n_rows() - 4);
    assert!(set.c.coefficient("is_in_city").is_some());
    assert_eq!(set.formulas.len(), 3);
}

#[test]
fn wald_statistic_from_two_coefficients() {
    let data = panel(11, 150);
    let opts = ModelOptions::default();
    let set = fit_models(&data, &opts).unwrap();
    let a = &set.a;

    let i = a.index_of("after_release").unwrap();
    let j = a.index_of(&opts.interaction()).unwrap();
    let est = a.coefficients[i].estimate + a.coefficients[j].estimate;
    let var = a.covariance_at(i, i).unwrap()
        + a.covariance_at(j, j).unwrap()
        + 2.0 * a.covariance_at(i, j).unwrap();

    assert_eq!(set.wald.df_num, 1);
    assert_eq!(set.wald.df_denom, a.df_resid);
    assert_abs_diff_eq!(set.wald.estimate[0], est, epsilon = 1e-12);
    assert_abs_diff_eq!(set.wald.f_stat, est * est / var, epsilon = 1e-9);
    assert!((0.0..=1.0).contains(&set.wald.p_value));
}

#[test]
fn covariance_choice_changes_only_standard_errors() {
    let data = panel(3, 80);
    let hc0 = ModelOptions { covariance: CovarianceType::HC0, ..Default::default() };
    let hc3 = ModelOptions { covariance: CovarianceType::HC3, ..Default::default() };
    let f0 = model_a(&data, &hc0).unwrap();
    let f3 = model_a(&data, &hc3).unwrap();
    for (c0, c3) in f0.coefficients.iter().zip(&f3.coefficients) {
        assert_abs_diff_eq!(c0.estimate, c3.estimate, epsilon = 1e-12);
        assert!(c3.std_error > c0.std_error);
    }
    assert_eq!(f3.covariance_type, CovarianceType::HC3);
}

#[test]
fn two_way_absorption_needs_hc0_or_hc1() {
    let data = panel(5, 40);
    let two_way = ModelOptions {
        absorb: vec!["month_of_year".into(), "institution".into()],
        ..Default::default()
    };
    assert!(matches!(model_b(&data, &two_way), Err(Error::NotImplemented(_))));

    // is_high_earning is constant within institution
    let hc1 = ModelOptions { covariance: CovarianceType::HC1, ..two_way };
    assert!(matches!(model_b(&data, &hc1), Err(Error::Computation(_))));
}
