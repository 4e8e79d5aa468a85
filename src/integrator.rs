//! Dead-reckoning displacement estimator
//!
//! Double trapezoidal integration of raw accelerometer samples, one axis at a time.
//! Each axis keeps only a depth-2 rolling history (two accelerations, two timestamps,
//! one carried velocity), so a call costs the same after ten samples or ten million.
//!
//! Preconditions (not checked): the state was seeded with `warm` before the first
//! `step`, and timestamps never go backwards.

use serde::{Deserialize, Serialize};

use crate::types::AccelData;

/// Rolling integration history for one spatial axis
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisIntegratorState {
    /// V1: velocity estimate computed at the previous sample
    pub prev_velocity: f64,
    /// V2: velocity estimate computed two samples ago
    pub prev_prev_velocity: f64,
    /// A1
    pub prev_accel: f64,
    /// A2
    pub prev_prev_accel: f64,
    /// t1
    pub prev_time: f64,
    /// t1_2
    pub prev_time_2: f64,
}

impl AxisIntegratorState {
    /// Seed from the two warm-up reads: `first` is the older sample (A2, t1_2),
    /// `second` the newer one (A1, t1). Both velocities start at zero.
    pub fn warm(first: (f64, f64), second: (f64, f64)) -> Self {
        let (accel_2, time_2) = first;
        let (accel_1, time_1) = second;
        Self {
            prev_velocity: 0.0,
            prev_prev_velocity: 0.0,
            prev_accel: accel_1,
            prev_prev_accel: accel_2,
            prev_time: time_1,
            prev_time_2: time_2,
        }
    }

    /// Consume one sample and return the displacement over `[prev_time, current_time]`.
    ///
    /// The value is an increment, not a position: nothing is accumulated here.
    /// Time differences only ever multiply, so equal timestamps give zero
    /// displacement instead of a division fault.
    pub fn step(&mut self, current_accel: f64, current_time: f64) -> f64 {
        let v1 = 0.5 * (self.prev_accel + self.prev_prev_accel) * (self.prev_time - self.prev_time_2)
            + self.prev_prev_velocity;

        let dt = current_time - self.prev_time;
        let displacement = 0.25 * (current_accel + self.prev_accel) * dt + v1 * dt;

        self.prev_prev_accel = self.prev_accel;
        self.prev_accel = current_accel;
        self.prev_velocity = v1;
        self.prev_prev_velocity = v1;
        self.prev_time_2 = self.prev_time;
        self.prev_time = current_time;

        displacement
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    fn component(self, accel: &AccelData) -> f64 {
        match self {
            Axis::X => accel.x,
            Axis::Y => accel.y,
            Axis::Z => accel.z,
        }
    }
}

/// Per-sample displacement increments for the three axes
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Displacement {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Three independent axis integrators fed from one accelerometer vector
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisplacementEstimator {
    axes: [AxisIntegratorState; 3],
}

impl DisplacementEstimator {
    /// Seed every axis from two consecutive accelerometer reads (older first)
    pub fn warm_up(first: &AccelData, second: &AccelData) -> Self {
        let axes = Axis::ALL.map(|axis| {
            AxisIntegratorState::warm(
                (axis.component(first), first.timestamp),
                (axis.component(second), second.timestamp),
            )
        });
        Self { axes }
    }

    pub fn step(&mut self, accel: &AccelData) -> Displacement {
        let [x, y, z] = Axis::ALL.map(|axis| {
            self.axes[axis.index()].step(axis.component(accel), accel.timestamp)
        });
        Displacement { x, y, z }
    }

    pub fn axis(&self, axis: Axis) -> &AxisIntegratorState {
        &self.axes[axis.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accel(timestamp: f64, x: f64, y: f64, z: f64) -> AccelData {
        AccelData { timestamp, x, y, z }
    }

    #[test]
    fn test_reference_scenario() {
        let mut state = AxisIntegratorState::warm((1.0, 0.0), (2.0, 1.0));
        let d = state.step(3.0, 2.0);

        // v1 = 0.5 * (2 + 1) * 1 + 0 = 1.5
        // d  = 0.25 * (3 + 2) * 1 + 1.5 * 1 = 2.75
        assert!((d - 2.75).abs() < 1e-12);
        assert!((state.prev_prev_velocity - 1.5).abs() < 1e-12);
        assert!((state.prev_velocity - 1.5).abs() < 1e-12);
        assert_eq!(state.prev_accel, 3.0);
        assert_eq!(state.prev_prev_accel, 2.0);
        assert_eq!(state.prev_time, 2.0);
        assert_eq!(state.prev_time_2, 1.0);
    }

    #[test]
    fn test_deterministic() {
        let seed = AxisIntegratorState::warm((0.3, 10.0), (-0.7, 10.4));
        let mut a = seed;
        let mut b = seed;
        assert_eq!(a.step(1.1, 10.9), b.step(1.1, 10.9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_motion() {
        let mut state = AxisIntegratorState::warm((0.0, 0.0), (0.0, 3.0));
        assert_eq!(state.step(0.0, 250.0), 0.0);
        assert_eq!(state.step(0.0, 1000.5), 0.0);
    }

    #[test]
    fn test_zero_time_delta() {
        let mut state = AxisIntegratorState::warm((4.0, 1.0), (5.0, 2.0));
        let d = state.step(6.0, 2.0);
        assert_eq!(d, 0.0);
        assert!(d.is_finite());
        // The history still shifts, so a repeated timestamp is not lost
        assert_eq!(state.prev_accel, 6.0);
        assert_eq!(state.prev_prev_accel, 5.0);
    }

    #[test]
    fn test_history_shifts_one_slot_per_call() {
        let mut state = AxisIntegratorState::warm((100.0, 0.0), (200.0, 1.0));

        state.step(301.0, 2.0);
        assert_eq!((state.prev_prev_accel, state.prev_accel), (200.0, 301.0));
        assert_eq!((state.prev_time_2, state.prev_time), (1.0, 2.0));

        state.step(402.0, 3.0);
        assert_eq!((state.prev_prev_accel, state.prev_accel), (301.0, 402.0));
        assert_eq!((state.prev_time_2, state.prev_time), (2.0, 3.0));

        state.step(503.0, 4.0);
        assert_eq!((state.prev_prev_accel, state.prev_accel), (402.0, 503.0));
        assert_eq!((state.prev_time_2, state.prev_time), (3.0, 4.0));
    }

    #[test]
    fn test_linear_in_acceleration() {
        let k = -3.5;
        let mut base = AxisIntegratorState::warm((0.2, 0.0), (0.9, 0.5));
        base.prev_prev_velocity = 1.25;
        let mut scaled = base;
        scaled.prev_accel *= k;
        scaled.prev_prev_accel *= k;
        scaled.prev_prev_velocity *= k;

        let d = base.step(-0.4, 1.25);
        let d_scaled = scaled.step(-0.4 * k, 1.25);
        assert!((d_scaled - k * d).abs() < 1e-12);
    }

    #[test]
    fn test_velocity_carries_between_steps() {
        // Constant 1.0 acceleration, 1 s spacing
        let mut state = AxisIntegratorState::warm((1.0, 0.0), (1.0, 1.0));
        let d1 = state.step(1.0, 2.0);
        // v1 = 1.0, d = 0.5 + 1.0
        assert!((d1 - 1.5).abs() < 1e-12);
        let d2 = state.step(1.0, 3.0);
        // v1 = 1.0 + 1.0, d = 0.5 + 2.0
        assert!((d2 - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_estimator_axes_are_independent() {
        let first = accel(0.0, 1.0, 0.0, 0.0);
        let second = accel(1.0, 2.0, 0.0, 0.0);
        let mut estimator = DisplacementEstimator::warm_up(&first, &second);

        let d = estimator.step(&accel(2.0, 3.0, 0.0, 0.0));
        assert!((d.x - 2.75).abs() < 1e-12);
        assert_eq!(d.y, 0.0);
        assert_eq!(d.z, 0.0);

        let y = estimator.axis(Axis::Y);
        assert_eq!(y.prev_velocity, 0.0);
        assert_eq!(y.prev_accel, 0.0);
        assert_eq!(y.prev_time, 2.0);
        assert!((estimator.axis(Axis::X).prev_velocity - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_estimator_matches_single_axis() {
        let samples = [
            accel(0.0, 0.1, -0.2, 0.98),
            accel(0.05, 0.12, -0.25, 1.01),
            accel(0.11, 0.08, -0.19, 0.97),
            accel(0.16, 0.15, -0.3, 1.02),
        ];
        let mut estimator = DisplacementEstimator::warm_up(&samples[0], &samples[1]);
        let mut z = AxisIntegratorState::warm(
            (samples[0].z, samples[0].timestamp),
            (samples[1].z, samples[1].timestamp),
        );

        for sample in &samples[2..] {
            let d = estimator.step(sample);
            assert_eq!(d.z, z.step(sample.z, sample.timestamp));
        }
        assert_eq!(estimator.axis(Axis::Z), &z);
    }
}
