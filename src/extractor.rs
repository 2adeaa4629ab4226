//! Per-sample biomechanical feature extraction.
//!
//! Every metric is computed from a single raw sample. Thresholds are fixed
//! constants; there is no calibration phase and no state between calls.

use crate::types::{DerivedMetrics, MovementPattern, RawSample};

/// 速度估计系数（幅值 × 系数）
pub const SPEED_FACTOR: f64 = 0.1;
/// accZ 超过该值视为踢球
pub const KICK_THRESHOLD: f64 = 2.0;
pub const KICK_POWER_FACTOR: f64 = 10.0;
/// 幅值超过该值视为一步
pub const STEP_THRESHOLD: f64 = 1.2;
/// Standing / Walking 分界，边界值归入 Walking
pub const WALKING_THRESHOLD: f64 = 0.5;
/// Walking / Running 分界，边界值归入 Running
pub const RUNNING_THRESHOLD: f64 = 1.5;
/// accY 超过该值视为起跳
pub const JUMP_THRESHOLD: f64 = 2.0;
pub const JUMP_VELOCITY_FACTOR: f64 = 0.1;
pub const GRAVITY: f64 = 9.81;
/// 幅值超过该值才记录冲击力
pub const IMPACT_THRESHOLD: f64 = 3.0;

/// Magnitude of a 3-vector. Always >= 0 for finite input.
pub fn magnitude(x: f64, y: f64, z: f64) -> f64 {
    (x * x + y * y + z * z).sqrt()
}

pub fn classify_movement(acc_magnitude: f64) -> MovementPattern {
    if acc_magnitude < WALKING_THRESHOLD {
        MovementPattern::Standing
    } else if acc_magnitude < RUNNING_THRESHOLD {
        MovementPattern::Walking
    } else {
        MovementPattern::Running
    }
}

pub fn jump_height(acc_y: f64) -> f64 {
    if acc_y > JUMP_THRESHOLD {
        let takeoff_velocity = acc_y * JUMP_VELOCITY_FACTOR;
        takeoff_velocity.powi(2) / (2.0 * GRAVITY)
    } else {
        0.0
    }
}

/// Derive the full metric set for one sample. Pure and total.
pub fn extract(sample: &RawSample) -> DerivedMetrics {
    let acc_magnitude = magnitude(sample.acc_x, sample.acc_y, sample.acc_z);

    let kick_detected = sample.acc_z > KICK_THRESHOLD;
    let kick_power = if kick_detected {
        sample.acc_z * KICK_POWER_FACTOR
    } else {
        0.0
    };

    let impact_force = if acc_magnitude > IMPACT_THRESHOLD {
        acc_magnitude
    } else {
        0.0
    };

    DerivedMetrics {
        timestamp: sample.timestamp,
        speed: acc_magnitude * SPEED_FACTOR,
        kick_detected,
        kick_power,
        step_detected: acc_magnitude > STEP_THRESHOLD,
        movement_pattern: classify_movement(acc_magnitude),
        jump_height: jump_height(sample.acc_y),
        impact_force,
        rotation_rate: magnitude(sample.gyro_x, sample.gyro_y, sample.gyro_z),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::timestamp_from_millis;

    const EPS: f64 = 1e-9;

    fn sample(acc: [f64; 3], gyro: [f64; 3]) -> RawSample {
        RawSample::new(timestamp_from_millis(1_700_000_000_000), acc, gyro)
    }

    #[test]
    fn zero_sample_is_standing_still() {
        let m = extract(&sample([0.0, 0.0, 0.0], [0.0, 0.0, 0.0]));
        assert_eq!(m.speed, 0.0);
        assert_eq!(m.movement_pattern, MovementPattern::Standing);
        assert!(!m.step_detected);
        assert!(!m.kick_detected);
        assert_eq!(m.kick_power, 0.0);
        assert_eq!(m.jump_height, 0.0);
        assert_eq!(m.impact_force, 0.0);
        assert_eq!(m.rotation_rate, 0.0);
    }

    #[test]
    fn reference_sample_from_field_test() {
        let m = extract(&sample([0.3, 2.0, 1.0], [0.06, 0.03, 0.01]));
        let acc_magnitude = 5.09f64.sqrt();
        assert!((m.speed - acc_magnitude * 0.1).abs() < EPS);
        assert!((m.speed - 0.22561).abs() < 1e-5);
        assert_eq!(m.movement_pattern, MovementPattern::Running);
        assert!(m.step_detected);
        assert!(!m.kick_detected);
        assert_eq!(m.kick_power, 0.0);
        assert_eq!(m.jump_height, 0.0);
        assert_eq!(m.impact_force, 0.0);
        let expected_rotation = (0.06f64 * 0.06 + 0.03 * 0.03 + 0.01 * 0.01).sqrt();
        assert!((m.rotation_rate - expected_rotation).abs() < EPS);
    }

    #[test]
    fn movement_boundaries_belong_to_upper_bracket() {
        assert_eq!(classify_movement(0.4999), MovementPattern::Standing);
        assert_eq!(classify_movement(0.5), MovementPattern::Walking);
        assert_eq!(classify_movement(1.4999), MovementPattern::Walking);
        assert_eq!(classify_movement(1.5), MovementPattern::Running);

        // 单轴输入时幅值等于该轴的绝对值
        assert_eq!(
            extract(&sample([0.5, 0.0, 0.0], [0.0; 3])).movement_pattern,
            MovementPattern::Walking
        );
        assert_eq!(
            extract(&sample([0.0, -1.5, 0.0], [0.0; 3])).movement_pattern,
            MovementPattern::Running
        );
    }

    #[test]
    fn kick_requires_strictly_greater_than_threshold() {
        let at = extract(&sample([0.0, 0.0, 2.0], [0.0; 3]));
        assert!(!at.kick_detected);
        assert_eq!(at.kick_power, 0.0);

        let above = extract(&sample([0.0, 0.0, 2.0001], [0.0; 3]));
        assert!(above.kick_detected);
        assert!((above.kick_power - 20.001).abs() < 1e-9);
        assert!(above.kick_power > 20.0);
    }

    #[test]
    fn jump_height_uses_projectile_formula() {
        assert_eq!(jump_height(2.0), 0.0);
        assert_eq!(extract(&sample([0.0, 2.0, 0.0], [0.0; 3])).jump_height, 0.0);

        let m = extract(&sample([0.0, 3.0, 0.0], [0.0; 3]));
        let expected = (3.0f64 * 0.1).powi(2) / (2.0 * 9.81);
        assert_eq!(m.jump_height, expected);
        assert!((m.jump_height - 0.004587).abs() < 1e-6);
    }

    #[test]
    fn impact_force_recorded_only_above_threshold() {
        let at = extract(&sample([3.0, 0.0, 0.0], [0.0; 3]));
        assert_eq!(at.impact_force, 0.0);

        let above = extract(&sample([3.0, 4.0, 0.0], [0.0; 3]));
        assert!((above.impact_force - 5.0).abs() < EPS);
    }

    #[test]
    fn step_threshold_is_exclusive() {
        assert!(!extract(&sample([1.2, 0.0, 0.0], [0.0; 3])).step_detected);
        assert!(extract(&sample([1.2001, 0.0, 0.0], [0.0; 3])).step_detected);
    }

    #[test]
    fn negative_axes_never_produce_negative_magnitudes() {
        let inputs = [
            [-1.0, -2.0, -3.0],
            [-0.0, 0.0, -0.0],
            [-1e150, 1e150, -1e150],
            [f64::MIN_POSITIVE, -f64::MIN_POSITIVE, 0.0],
            [-5.0, 0.1, -2.5],
        ];
        for acc in inputs {
            let m = extract(&sample(acc, [acc[2], acc[0], acc[1]]));
            assert!(m.speed >= 0.0, "speed for {:?}", acc);
            assert!(m.rotation_rate >= 0.0, "rotation for {:?}", acc);
            assert!(m.kick_power >= 0.0);
            assert!(m.jump_height >= 0.0);
            assert!(m.impact_force >= 0.0);
        }
    }

    #[test]
    fn negative_z_never_triggers_kick() {
        let m = extract(&sample([0.0, 0.0, -10.0], [0.0; 3]));
        assert!(!m.kick_detected);
        assert_eq!(m.kick_power, 0.0);
        assert!(m.impact_force > 0.0);
    }

    #[test]
    fn extraction_is_deterministic() {
        let s = sample([0.731, -1.22, 2.9], [12.5, -3.25, 0.125]);
        let a = extract(&s);
        let b = extract(&s);
        assert_eq!(a, b);
        assert_eq!(a.speed.to_bits(), b.speed.to_bits());
        assert_eq!(a.rotation_rate.to_bits(), b.rotation_rate.to_bits());
        assert_eq!(a.kick_power.to_bits(), b.kick_power.to_bits());
    }

    #[test]
    fn derived_record_keeps_sample_timestamp() {
        let s = sample([1.0, 1.0, 1.0], [0.0; 3]);
        assert_eq!(extract(&s).timestamp, s.timestamp);
    }
}
