//! Derivative-free minimisation with the Nelder–Mead simplex method.
//!
//! Uses the standard coefficients (reflection 1, expansion 2, contraction
//! 0.5, shrink 0.5). The starting simplex perturbs each nonzero coordinate
//! of `x0` by 5% and sets each zero coordinate to 0.00025. Iteration stops
//! once both the simplex diameter and the spread of objective values fall
//! below their tolerances, or the budget is exhausted.

const NONZERO_DELTA: f64 = 0.05;
const ZERO_DELTA: f64 = 0.00025;

const RHO: f64 = 1.0;
const CHI: f64 = 2.0;
const PSI: f64 = 0.5;
const SIGMA: f64 = 0.5;

/// Tuning for [`nelder_mead`].
#[derive(Debug, Clone, Copy)]
pub struct NelderMeadOptions {
    /// Absolute tolerance on the simplex vertices.
    pub xtol: f64,
    /// Absolute tolerance on the objective values across the simplex.
    pub ftol: f64,
    /// Iteration budget. `None` means 200 × dimension.
    pub max_iterations: Option<usize>,
    /// Function-evaluation budget. `None` means 200 × dimension.
    pub max_evaluations: Option<usize>,
}

impl Default for NelderMeadOptions {
    fn default() -> Self {
        Self {
            xtol: 1e-4,
            ftol: 1e-4,
            max_iterations: None,
            max_evaluations: None,
        }
    }
}

/// Result of a minimisation.
#[derive(Debug, Clone)]
pub struct Minimum {
    /// Best vertex found.
    pub x: Vec<f64>,
    /// Objective value at `x`.
    pub value: f64,
    /// Iterations performed.
    pub iterations: usize,
    /// Objective evaluations performed.
    pub evaluations: usize,
    /// Whether the tolerances were met before the budget ran out.
    pub converged: bool,
}

/// Minimise `f` starting from `x0`.
///
/// Non-finite objective values are allowed (they simply rank last), so
/// callers can return `f64::INFINITY` for infeasible points.
pub fn nelder_mead<F>(mut f: F, x0: &[f64], options: &NelderMeadOptions) -> Minimum
where
    F: FnMut(&[f64]) -> f64,
{
    let n = x0.len();
    let max_iterations = options.max_iterations.unwrap_or(200 * n.max(1));
    let max_evaluations = options.max_evaluations.unwrap_or(200 * n.max(1));

    let mut evaluations = 0usize;
    let mut eval = |x: &[f64], evaluations: &mut usize| {
        *evaluations += 1;
        let v = f(x);
        if v.is_nan() {
            f64::INFINITY
        } else {
            v
        }
    };

    let mut sim: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    sim.push(x0.to_vec());
    for k in 0..n {
        let mut y = x0.to_vec();
        y[k] = if y[k] != 0.0 {
            (1.0 + NONZERO_DELTA) * y[k]
        } else {
            ZERO_DELTA
        };
        sim.push(y);
    }
    let mut fsim: Vec<f64> = sim.iter().map(|x| eval(x, &mut evaluations)).collect();
    sort_simplex(&mut sim, &mut fsim);

    let mut iterations = 1usize;
    let mut converged = false;

    while evaluations < max_evaluations && iterations < max_iterations {
        if within_tolerance(&sim, &fsim, options) {
            converged = true;
            break;
        }

        let xbar = centroid(&sim[..n], n);
        let worst = sim[n].clone();

        let xr = affine(&xbar, &worst, 1.0 + RHO, -RHO);
        let fxr = eval(&xr, &mut evaluations);

        if fxr < fsim[0] {
            let xe = affine(&xbar, &worst, 1.0 + RHO * CHI, -RHO * CHI);
            let fxe = eval(&xe, &mut evaluations);
            if fxe < fxr {
                sim[n] = xe;
                fsim[n] = fxe;
            } else {
                sim[n] = xr;
                fsim[n] = fxr;
            }
        } else if n == 0 || fxr < fsim[n - 1] {
            sim[n] = xr;
            fsim[n] = fxr;
        } else {
            let mut shrink = false;
            if fxr < fsim[n] {
                let xc = affine(&xbar, &worst, 1.0 + PSI * RHO, -PSI * RHO);
                let fxc = eval(&xc, &mut evaluations);
                if fxc <= fxr {
                    sim[n] = xc;
                    fsim[n] = fxc;
                } else {
                    shrink = true;
                }
            } else {
                let xcc = affine(&xbar, &worst, 1.0 - PSI, PSI);
                let fxcc = eval(&xcc, &mut evaluations);
                if fxcc < fsim[n] {
                    sim[n] = xcc;
                    fsim[n] = fxcc;
                } else {
                    shrink = true;
                }
            }

            if shrink {
                let best = sim[0].clone();
                for j in 1..=n {
                    sim[j] = affine(&best, &sim[j], 1.0 - SIGMA, SIGMA);
                    fsim[j] = eval(&sim[j], &mut evaluations);
                }
            }
        }

        iterations += 1;
        sort_simplex(&mut sim, &mut fsim);
    }

    if !converged {
        converged = within_tolerance(&sim, &fsim, options);
    }

    Minimum {
        x: sim.swap_remove(0),
        value: fsim[0],
        iterations,
        evaluations,
        converged,
    }
}

/// `a * p + b * q`, elementwise.
fn affine(p: &[f64], q: &[f64], a: f64, b: f64) -> Vec<f64> {
    p.iter().zip(q).map(|(pi, qi)| a * pi + b * qi).collect()
}

fn centroid(points: &[Vec<f64>], n: usize) -> Vec<f64> {
    let mut c = vec![0.0; n];
    for p in points {
        for (ci, pi) in c.iter_mut().zip(p) {
            *ci += pi;
        }
    }
    let count = points.len().max(1) as f64;
    c.iter_mut().for_each(|ci| *ci /= count);
    c
}

fn sort_simplex(sim: &mut Vec<Vec<f64>>, fsim: &mut Vec<f64>) {
    let mut order: Vec<usize> = (0..fsim.len()).collect();
    // Stable sort keeps the older vertex first on ties.
    order.sort_by(|&a, &b| fsim[a].total_cmp(&fsim[b]));
    *sim = order.iter().map(|&i| sim[i].clone()).collect();
    *fsim = order.iter().map(|&i| fsim[i]).collect();
}

fn within_tolerance(sim: &[Vec<f64>], fsim: &[f64], options: &NelderMeadOptions) -> bool {
    if !fsim[0].is_finite() {
        return false;
    }
    let best = &sim[0];
    let x_spread = sim[1..]
        .iter()
        .flat_map(|v| v.iter().zip(best).map(|(a, b)| (a - b).abs()))
        .fold(0.0_f64, f64::max);
    let f_spread = fsim[1..]
        .iter()
        .map(|f| (fsim[0] - f).abs())
        .fold(0.0_f64, f64::max);
    x_spread <= options.xtol && f_spread <= options.ftol
}
