//! Rank-revealing Householder QR
//!
//! Columns are processed strictly left to right. A column whose norm,
//! after projecting out every column accepted before it, falls below
//! `tolerance` times its original norm is set aside as aliased and takes no
//! part in the factorization. The accepted columns keep their original
//! order, so every aliased column is a linear combination of accepted
//! columns to its left.
//!
//! Triangular solves against R go through faer.

use faer::linalg::triangular_solve::solve_upper_triangular_in_place;
use faer::{Mat, Par};
use ndarray::{Array1, Array2, ArrayView1, ArrayViewMut1, s};

/// Default relative tolerance for declaring a column aliased
pub const DEFAULT_RANK_TOLERANCE: f64 = 1e-7;

/// Householder QR of the linearly independent columns of a matrix
#[derive(Debug, Clone, PartialEq)]
pub struct HouseholderQr {
    nrows: usize,
    ncols: usize,
    /// Upper triangular factor of the accepted columns (rank × rank)
    r: Array2<f64>,
    /// Householder vectors; reflector k acts on rows k..
    reflectors: Vec<Array1<f64>>,
    taus: Vec<f64>,
    accepted: Vec<usize>,
    aliased: Vec<usize>,
    /// Original norms of the accepted columns
    scales: Vec<f64>,
}

impl HouseholderQr {
    /// Factorize `x`, setting aside columns that depend on earlier ones
    pub fn decompose(x: &Array2<f64>, tolerance: f64) -> Self {
        let (n, p) = x.dim();
        let mut work = x.to_owned();
        let original_norms: Vec<f64> = (0..p).map(|j| norm(x.column(j))).collect();

        let mut reflectors = Vec::new();
        let mut taus = Vec::new();
        let mut accepted = Vec::new();
        let mut aliased = Vec::new();

        for j in 0..p {
            let k = accepted.len();
            if k == n {
                aliased.push(j);
                continue;
            }

            let remaining = norm(work.slice(s![k.., j]));
            if original_norms[j] == 0.0 || remaining <= tolerance * original_norms[j] {
                aliased.push(j);
                continue;
            }

            // v = x - beta * e1 with beta = -sign(x0) * |x|
            let mut v = work.slice(s![k.., j]).to_owned();
            let beta = if v[0] >= 0.0 { -remaining } else { remaining };
            v[0] -= beta;
            let tau = 2.0 / v.dot(&v);

            for jj in j..p {
                reflect(&v, tau, work.slice_mut(s![k.., jj]));
            }

            reflectors.push(v);
            taus.push(tau);
            accepted.push(j);
        }

        let rank = accepted.len();
        let mut r = Array2::zeros((rank, rank));
        for (b, &col) in accepted.iter().enumerate() {
            for a in 0..=b {
                r[(a, b)] = work[(a, col)];
            }
        }

        let scales = accepted.iter().map(|&j| original_norms[j]).collect();

        Self {
            nrows: n,
            ncols: p,
            r,
            reflectors,
            taus,
            accepted,
            aliased,
            scales,
        }
    }

    /// Numerical rank
    pub fn rank(&self) -> usize {
        self.accepted.len()
    }

    /// Number of rows of the factorized matrix
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns of the factorized matrix
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Original indices of the independent columns, in order
    pub fn accepted(&self) -> &[usize] {
        &self.accepted
    }

    /// Original indices of the columns set aside as dependent, in order
    pub fn aliased(&self) -> &[usize] {
        &self.aliased
    }

    /// Upper triangular factor of the accepted columns
    pub fn r(&self) -> &Array2<f64> {
        &self.r
    }

    /// Compute Qᵗy
    pub fn qty(&self, y: &Array1<f64>) -> Array1<f64> {
        let mut out = y.clone();
        for (k, (v, &tau)) in self.reflectors.iter().zip(&self.taus).enumerate() {
            reflect(v, tau, out.slice_mut(s![k..]));
        }
        out
    }

    /// Compute Qz
    pub fn qy(&self, z: &Array1<f64>) -> Array1<f64> {
        let mut out = z.clone();
        for (k, (v, &tau)) in self.reflectors.iter().zip(&self.taus).enumerate().rev() {
            reflect(v, tau, out.slice_mut(s![k..]));
        }
        out
    }

    /// Least squares coefficients of the accepted columns
    pub fn solve(&self, y: &Array1<f64>) -> Array1<f64> {
        let rank = self.rank();
        let effects = self.qty(y);
        let mut rhs = Mat::from_fn(rank, 1, |i, _| effects[i]);
        solve_upper_triangular_in_place(self.r_faer().as_ref(), rhs.as_mut(), Par::Seq);
        Array1::from_shape_fn(rank, |i| rhs[(i, 0)])
    }

    /// Residuals of the least squares fit of `y`
    pub fn residuals(&self, y: &Array1<f64>) -> Array1<f64> {
        let mut effects = self.qty(y);
        effects.slice_mut(s![..self.rank()]).fill(0.0);
        self.qy(&effects)
    }

    /// Inverse of the triangular factor
    pub fn r_inverse(&self) -> Array2<f64> {
        let rank = self.rank();
        let mut inv = Mat::<f64>::identity(rank, rank);
        solve_upper_triangular_in_place(self.r_faer().as_ref(), inv.as_mut(), Par::Seq);
        Array2::from_shape_fn((rank, rank), |(i, j)| inv[(i, j)])
    }

    /// (XᵗX)⁻¹ restricted to the accepted columns, as R⁻¹R⁻ᵗ
    pub fn unscaled_covariance(&self) -> Array2<f64> {
        let r_inv = self.r_inverse();
        r_inv.dot(&r_inv.t())
    }

    /// Ratio of the largest to the smallest diagonal entry of R, after
    /// scaling every accepted column to unit norm.
    ///
    /// A lower bound on the 2-norm condition number of the equilibrated
    /// columns, so it does not depend on the units of a predictor.
    pub fn condition_estimate(&self) -> f64 {
        let (min, max) = self
            .r
            .diag()
            .iter()
            .zip(&self.scales)
            .fold((f64::INFINITY, 0.0_f64), |(lo, hi), (&d, &scale)| {
                let d = d.abs() / scale;
                (lo.min(d), hi.max(d))
            });
        if self.scales.is_empty() { 1.0 } else { max / min }
    }

    fn r_faer(&self) -> Mat<f64> {
        let rank = self.rank();
        Mat::from_fn(rank, rank, |i, j| self.r[(i, j)])
    }
}

/// Apply I - tau·v·vᵗ in place
fn reflect(v: &Array1<f64>, tau: f64, mut target: ArrayViewMut1<'_, f64>) {
    let scale = tau * v.dot(&target);
    target.scaled_add(-scale, v);
}

fn norm(v: ArrayView1<'_, f64>) -> f64 {
    v.dot(&v).sqrt()
}
