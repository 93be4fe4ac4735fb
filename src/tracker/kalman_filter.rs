//! Constant-velocity Kalman filter over (center x, center y, size).

use ndarray::{Array1, Array2};

const NDIM: usize = 3;

#[derive(Debug, Clone)]
pub struct KalmanFilter {
    motion_mat: Array2<f64>,
    update_mat: Array2<f64>,
    std_weight_position: f64,
    std_weight_velocity: f64,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl KalmanFilter {
    pub fn new() -> Self {
        let mut motion_mat = Array2::eye(2 * NDIM);
        for i in 0..NDIM {
            motion_mat[[i, NDIM + i]] = 1.0;
        }

        let mut update_mat = Array2::zeros((NDIM, 2 * NDIM));
        for i in 0..NDIM {
            update_mat[[i, i]] = 1.0;
        }

        Self {
            motion_mat,
            update_mat,
            std_weight_position: 1.0 / 20.0,
            std_weight_velocity: 1.0 / 160.0,
        }
    }

    /// Noise scale; a zero-size measurement must not collapse the covariance.
    fn scale(size: f64) -> f64 {
        size.abs().max(1.0)
    }

    pub fn initiate(&self, measurement: [f64; NDIM]) -> (Array1<f64>, Array2<f64>) {
        let mut mean = Array1::zeros(2 * NDIM);
        for i in 0..NDIM {
            mean[i] = measurement[i];
        }

        let s = Self::scale(measurement[2]);
        let pos = 2.0 * self.std_weight_position * s;
        let vel = 10.0 * self.std_weight_velocity * s;
        let std = [pos, pos, pos, vel, vel, vel];

        let mut cov = Array2::zeros((2 * NDIM, 2 * NDIM));
        for i in 0..2 * NDIM {
            cov[[i, i]] = std[i] * std[i];
        }

        (mean, cov)
    }

    pub fn predict(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
    ) -> (Array1<f64>, Array2<f64>) {
        let s = Self::scale(mean[2]);
        let pos = self.std_weight_position * s;
        let vel = self.std_weight_velocity * s;
        let std = [pos, pos, pos, vel, vel, vel];

        let mut motion_cov = Array2::zeros((2 * NDIM, 2 * NDIM));
        for i in 0..2 * NDIM {
            motion_cov[[i, i]] = std[i] * std[i];
        }

        let new_mean = self.motion_mat.dot(mean);
        let new_covariance = self.motion_mat.dot(covariance).dot(&self.motion_mat.t()) + motion_cov;

        (new_mean, new_covariance)
    }

    pub fn project(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
    ) -> (Array1<f64>, Array2<f64>) {
        let std = self.std_weight_position * Self::scale(mean[2]);

        let mut innovation_cov = Array2::zeros((NDIM, NDIM));
        for i in 0..NDIM {
            innovation_cov[[i, i]] = std * std;
        }

        let mean_proj = self.update_mat.dot(mean);
        let covariance_proj =
            self.update_mat.dot(covariance).dot(&self.update_mat.t()) + innovation_cov;

        (mean_proj, covariance_proj)
    }

    /// Correct the state with a measurement.
    ///
    /// Returns `None` when the innovation covariance is singular.
    pub fn update(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
        measurement: [f64; NDIM],
    ) -> Option<(Array1<f64>, Array2<f64>)> {
        let (projected_mean, projected_cov) = self.project(mean, covariance);
        let innovation = Array1::from_vec(measurement.to_vec()) - projected_mean;

        // K = P * H^T * S^-1
        let s_inv = invert_3x3(&projected_cov)?;
        let pht = covariance.dot(&self.update_mat.t());
        let kalman_gain = pht.dot(&s_inv);

        let new_mean = mean + &kalman_gain.dot(&innovation);
        let new_covariance = covariance - &kalman_gain.dot(&projected_cov).dot(&kalman_gain.t());

        Some((new_mean, new_covariance))
    }
}

/// Invert a 3x3 matrix through nalgebra.
fn invert_3x3(m: &Array2<f64>) -> Option<Array2<f64>> {
    let mut nm = nalgebra::Matrix3::zeros();
    for i in 0..NDIM {
        for j in 0..NDIM {
            nm[(i, j)] = m[[i, j]];
        }
    }
    let inv = nm.try_inverse()?;
    let mut res = Array2::zeros((NDIM, NDIM));
    for i in 0..NDIM {
        for j in 0..NDIM {
            res[[i, j]] = inv[(i, j)];
        }
    }
    Some(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initiate() {
        let kf = KalmanFilter::new();
        let (mean, cov) = kf.initiate([100.0, 200.0, 50.0]);
        assert_eq!(mean.len(), 6);
        assert_eq!(mean[0], 100.0);
        assert_eq!(mean[2], 50.0);
        assert_eq!(mean[3], 0.0);
        assert!(cov[[0, 0]] > 0.0);
    }

    #[test]
    fn test_update_moves_toward_measurement() {
        let kf = KalmanFilter::new();
        let (mean, cov) = kf.initiate([100.0, 100.0, 40.0]);
        let (mean, cov) = kf.predict(&mean, &cov);
        let (mean, _) = kf.update(&mean, &cov, [110.0, 100.0, 40.0]).unwrap();
        assert!(mean[0] > 100.0 && mean[0] < 110.0);
        assert!((mean[1] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_size_stays_invertible() {
        let kf = KalmanFilter::new();
        let (mean, cov) = kf.initiate([0.0, 0.0, 0.0]);
        assert!(kf.update(&mean, &cov, [1.0, 1.0, 0.0]).is_some());
    }
}
