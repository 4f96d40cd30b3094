//! Bounded Nelder-Mead simplex search
//!
//! Derivative-free minimizer used to estimate smoothing coefficients and
//! initial states. Bounds are enforced by projecting every trial point onto
//! the box before it is evaluated.

/// Search settings
#[derive(Debug, Clone, Copy)]
pub struct NelderMeadConfig {
    /// Maximum number of simplex iterations
    pub max_iter: usize,
    /// Relative tolerance on the spread of objective values across the simplex
    pub ftol: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        NelderMeadConfig {
            max_iter: 20_000,
            ftol: 1e-10,
        }
    }
}

/// Outcome of a search
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    pub optimal_point: Vec<f64>,
    pub optimal_value: f64,
    pub iterations: usize,
    pub converged: bool,
}

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;
/// Keeps the relative spread test meaningful when the minimum is zero
const TINY: f64 = 1e-20;

/// Minimize `objective` starting from `start`
///
/// `bounds` holds one `(lower, upper)` pair per coordinate; use infinite
/// limits for unconstrained coordinates. Non-finite objective values are
/// treated as `+inf`.
pub fn nelder_mead<F>(
    objective: F,
    start: &[f64],
    bounds: &[(f64, f64)],
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let dim = start.len();
    let project = |x: &mut Vec<f64>| {
        for (xi, &(lo, hi)) in x.iter_mut().zip(bounds) {
            *xi = xi.clamp(lo, hi);
        }
    };
    let evaluate = |x: &[f64]| {
        let v = objective(x);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    };

    if dim == 0 {
        return NelderMeadResult {
            optimal_point: Vec::new(),
            optimal_value: evaluate(start),
            iterations: 0,
            converged: true,
        };
    }

    // Initial simplex: start plus one perturbed vertex per coordinate
    let mut x0 = start.to_vec();
    project(&mut x0);
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(dim + 1);
    simplex.push(x0.clone());
    for i in 0..dim {
        let mut vertex = x0.clone();
        let step = if x0[i].abs() > 1e-8 {
            0.05 * x0[i].abs()
        } else {
            0.00025
        };
        let (lo, hi) = bounds[i];
        vertex[i] = if x0[i] + step <= hi {
            x0[i] + step
        } else {
            x0[i] - step
        };
        vertex[i] = vertex[i].clamp(lo, hi);
        simplex.push(vertex);
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| evaluate(v.as_slice())).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        // Order vertices best to worst
        let mut order: Vec<usize> = (0..=dim).collect();
        order.sort_by(|&a, &b| {
            values[a]
                .partial_cmp(&values[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        simplex = order.iter().map(|&i| simplex[i].clone()).collect();
        values = order.iter().map(|&i| values[i]).collect();

        let best = values[0];
        let worst = values[dim];
        if best.is_finite()
            && 2.0 * (worst - best).abs() <= config.ftol * (best.abs() + worst.abs()) + TINY
        {
            converged = true;
            break;
        }

        iterations += 1;

        // Centroid of all but the worst vertex
        let mut centroid = vec![0.0; dim];
        for vertex in &simplex[..dim] {
            for (c, v) in centroid.iter_mut().zip(vertex) {
                *c += v / dim as f64;
            }
        }

        let along = |coef: f64| -> Vec<f64> {
            let mut point: Vec<f64> = centroid
                .iter()
                .zip(&simplex[dim])
                .map(|(c, w)| c + coef * (c - w))
                .collect();
            project(&mut point);
            point
        };

        let reflected = along(REFLECTION);
        let f_reflected = evaluate(reflected.as_slice());

        if f_reflected < values[0] {
            let expanded = along(EXPANSION);
            let f_expanded = evaluate(expanded.as_slice());
            if f_expanded < f_reflected {
                simplex[dim] = expanded;
                values[dim] = f_expanded;
            } else {
                simplex[dim] = reflected;
                values[dim] = f_reflected;
            }
            continue;
        }

        if f_reflected < values[dim - 1] {
            simplex[dim] = reflected;
            values[dim] = f_reflected;
            continue;
        }

        // Contract towards the better of the reflected and worst points
        let (contracted, f_contracted) = if f_reflected < values[dim] {
            let point = along(CONTRACTION * REFLECTION);
            let f = evaluate(point.as_slice());
            (point, f)
        } else {
            let point = along(-CONTRACTION);
            let f = evaluate(point.as_slice());
            (point, f)
        };

        if f_contracted < values[dim].min(f_reflected) {
            simplex[dim] = contracted;
            values[dim] = f_contracted;
            continue;
        }

        // Shrink everything towards the best vertex
        let best_vertex = simplex[0].clone();
        for i in 1..=dim {
            let mut point: Vec<f64> = best_vertex
                .iter()
                .zip(&simplex[i])
                .map(|(b, v)| b + SHRINK * (v - b))
                .collect();
            project(&mut point);
            values[i] = evaluate(point.as_slice());
            simplex[i] = point;
        }
    }

    // Report the best vertex even when the budget ran out
    let best_idx = (0..=dim)
        .min_by(|&a, &b| {
            values[a]
                .partial_cmp(&values[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(0);

    NelderMeadResult {
        optimal_point: simplex[best_idx].clone(),
        optimal_value: values[best_idx],
        iterations,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNBOUNDED: (f64, f64) = (f64::NEG_INFINITY, f64::INFINITY);

    #[test]
    fn test_quadratic_bowl() {
        let result = nelder_mead(
            |p| (p[0] - 3.0).powi(2) + 2.0 * (p[1] + 1.0).powi(2),
            &[0.0, 0.0],
            &[UNBOUNDED, UNBOUNDED],
            NelderMeadConfig::default(),
        );
        assert!(result.converged);
        assert!((result.optimal_point[0] - 3.0).abs() < 1e-5);
        assert!((result.optimal_point[1] + 1.0).abs() < 1e-5);
        assert!(result.optimal_value < 1e-9);
    }

    #[test]
    fn test_rosenbrock() {
        let result = nelder_mead(
            |p| 100.0 * (p[1] - p[0] * p[0]).powi(2) + (1.0 - p[0]).powi(2),
            &[-1.2, 1.0],
            &[UNBOUNDED, UNBOUNDED],
            NelderMeadConfig::default(),
        );
        assert!(result.converged);
        assert!((result.optimal_point[0] - 1.0).abs() < 1e-3);
        assert!((result.optimal_point[1] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_bounds_are_respected() {
        // unconstrained minimum at 2.0, box stops at 1.0
        let result = nelder_mead(
            |p| (p[0] - 2.0).powi(2),
            &[0.3],
            &[(0.0, 1.0)],
            NelderMeadConfig::default(),
        );
        assert!(result.converged);
        assert!(result.optimal_point[0] <= 1.0);
        assert!((result.optimal_point[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_iteration_budget_reports_non_convergence() {
        let config = NelderMeadConfig {
            max_iter: 3,
            ..NelderMeadConfig::default()
        };
        let result = nelder_mead(
            |p| 100.0 * (p[1] - p[0] * p[0]).powi(2) + (1.0 - p[0]).powi(2),
            &[-1.2, 1.0],
            &[UNBOUNDED, UNBOUNDED],
            config,
        );
        assert!(!result.converged);
        assert_eq!(result.iterations, 3);
        assert!(result.optimal_value.is_finite());
    }
}
