//! Fit of the low-dimensional similarity curve `1 / (1 + a * d^(2b))`.
//!
//! The target curve is 1 inside `min_dist` and decays as `exp(-(d - min_dist) / spread)`
//! beyond it. `a` and `b` are found by Levenberg-Marquardt least squares over 300 samples
//! of `d` in `[0, 3 * spread]`.

const N_SAMPLES: usize = 300;
const MAX_ITER: usize = 500;

/// Fit `(a, b)` for the given `spread` and `min_dist`.
///
/// Callers guarantee `spread > 0` and `0 <= min_dist <= spread`.
pub(crate) fn find_ab_params(spread: f32, min_dist: f32) -> (f32, f32) {
    let spread = f64::from(spread);
    let min_dist = f64::from(min_dist);

    let xs: Vec<f64> = (0..N_SAMPLES)
        .map(|i| 3.0 * spread * i as f64 / (N_SAMPLES - 1) as f64)
        .collect();
    let ys: Vec<f64> = xs
        .iter()
        .map(|&x| {
            if x < min_dist {
                1.0
            } else {
                (-(x - min_dist) / spread).exp()
            }
        })
        .collect();

    let (mut a, mut b) = (1.0f64, 1.0f64);
    let mut lambda = 1e-3;
    let mut state = normal_equations(&xs, &ys, a, b);

    for _ in 0..MAX_ITER {
        let Some((da, db)) = state.step(lambda) else {
            break;
        };
        let (na, nb) = (a + da, b + db);
        if na > 0.0 && nb > 0.0 {
            let next = normal_equations(&xs, &ys, na, nb);
            if next.cost < state.cost {
                let done = da.abs() < 1e-10 * (1.0 + a.abs()) && db.abs() < 1e-10 * (1.0 + b.abs());
                a = na;
                b = nb;
                state = next;
                lambda = (lambda / 10.0).max(1e-12);
                if done {
                    break;
                }
                continue;
            }
        }
        lambda *= 10.0;
        if lambda > 1e12 {
            break;
        }
    }

    (a as f32, b as f32)
}

struct NormalEquations {
    cost: f64,
    jtj: [[f64; 2]; 2],
    jtr: [f64; 2],
}

impl NormalEquations {
    /// Solve `(JᵀJ + λ diag(JᵀJ)) δ = -Jᵀr`.
    fn step(&self, lambda: f64) -> Option<(f64, f64)> {
        let m00 = self.jtj[0][0] * (1.0 + lambda);
        let m11 = self.jtj[1][1] * (1.0 + lambda);
        let m01 = self.jtj[0][1];
        let det = m00 * m11 - m01 * m01;
        if det.abs() < f64::MIN_POSITIVE || !det.is_finite() {
            return None;
        }
        let da = (-self.jtr[0] * m11 + self.jtr[1] * m01) / det;
        let db = (-self.jtr[1] * m00 + self.jtr[0] * m01) / det;
        Some((da, db))
    }
}

fn normal_equations(xs: &[f64], ys: &[f64], a: f64, b: f64) -> NormalEquations {
    let mut cost = 0.0;
    let mut jtj = [[0.0; 2]; 2];
    let mut jtr = [0.0; 2];

    for (&x, &y) in xs.iter().zip(ys) {
        // d/db of x^(2b) is x^(2b) * 2 ln x, which tends to 0 at x = 0.
        let (u, ln_x) = if x > 0.0 {
            (x.powf(2.0 * b), x.ln())
        } else {
            (0.0, 0.0)
        };
        let den = 1.0 + a * u;
        let r = 1.0 / den - y;
        let ja = -u / (den * den);
        let jb = -a * u * 2.0 * ln_x / (den * den);

        cost += r * r;
        jtj[0][0] += ja * ja;
        jtj[0][1] += ja * jb;
        jtj[1][1] += jb * jb;
        jtr[0] += ja * r;
        jtr[1] += jb * r;
    }
    jtj[1][0] = jtj[0][1];

    NormalEquations { cost, jtj, jtr }
}
