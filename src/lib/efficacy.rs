use crate::error::{Error, Result};
use log::{debug, warn};

/// How the control rate in the denominator is treated.
///
/// `Unclamped` reproduces the reference behaviour: a control draw close to
/// zero yields an extreme (possibly very negative) efficacy value and is
/// passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EfficacyMode {
    #[default]
    Unclamped,
    /// Control draws below the floor are raised to it before dividing
    ControlFloor(f64),
}

/// Element-wise vaccine efficacy, `100 * (1 - treatment / control)`.
pub fn compute_efficacy(treatment: &[f64], control: &[f64]) -> Result<Vec<f64>> {
    compute_efficacy_with_mode(treatment, control, EfficacyMode::Unclamped)
}

pub fn compute_efficacy_with_mode(
    treatment: &[f64],
    control: &[f64],
    mode: EfficacyMode,
) -> Result<Vec<f64>> {
    if treatment.len() != control.len() {
        return Err(Error::LengthMismatch {
            treatment: treatment.len(),
            control: control.len(),
        });
    }
    if treatment.is_empty() {
        return Err(Error::InsufficientSamples(
            "efficacy needs at least one paired draw".to_string(),
        ));
    }
    let floor = match mode {
        EfficacyMode::Unclamped => None,
        EfficacyMode::ControlFloor(floor) => {
            if !(floor > 0.0 && floor < 1.0) {
                return Err(Error::InvalidParameter {
                    name: "control_floor",
                    value: floor,
                    reason: "must lie in (0, 1)",
                });
            }
            let n_floored = control.iter().filter(|&&c| c < floor).count();
            if n_floored > 0 {
                warn!("Raised {} control draws to the floor {}", n_floored, floor);
            }
            Some(floor)
        }
    };
    debug!("Computing efficacy over {} paired draws", treatment.len());

    Ok(treatment
        .iter()
        .zip(control.iter())
        .map(|(&t, &c)| {
            let c = floor.map_or(c, |floor| c.max(floor));
            efficacy_of_rates(t, c)
        })
        .collect())
}

/// Efficacy implied by a single pair of rates
pub fn efficacy_of_rates(treatment_rate: f64, control_rate: f64) -> f64 {
    100.0 * (1.0 - treatment_rate / control_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elementwise() {
        let ve = compute_efficacy(&[0.5, 0.25], &[0.25, 0.25]).unwrap();
        assert_eq!(ve, vec![-100.0, 0.0]);
    }

    #[test]
    fn test_protective_effect() {
        let ve = compute_efficacy(&[0.002], &[0.02]).unwrap();
        assert!((ve[0] - 90.0).abs() < 1e-9);
        assert!((efficacy_of_rates(0.002, 0.02) - ve[0]).abs() < 1e-12);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            compute_efficacy(&[0.1, 0.2], &[0.1]),
            Err(Error::LengthMismatch { treatment: 2, control: 1 })
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            compute_efficacy(&[], &[]),
            Err(Error::InsufficientSamples(_))
        ));
    }

    #[test]
    fn test_near_zero_control_is_not_clamped() {
        let ve = compute_efficacy(&[0.01, 0.01], &[f64::MIN_POSITIVE, 1e-12]).unwrap();
        assert!(ve[0].is_finite());
        assert!(ve[0] < -1e300);
        assert!((ve[1] - 100.0 * (1.0 - 1e10)).abs() < 1e-3 * 1e12);
    }

    #[test]
    fn test_control_floor() {
        let ve = compute_efficacy_with_mode(
            &[0.01, 0.01],
            &[1e-12, 0.02],
            EfficacyMode::ControlFloor(1e-3),
        )
        .unwrap();
        assert!((ve[0] - 100.0 * (1.0 - 10.0)).abs() < 1e-9);
        assert!((ve[1] - 50.0).abs() < 1e-9);

        assert!(matches!(
            compute_efficacy_with_mode(&[0.1], &[0.1], EfficacyMode::ControlFloor(0.0)),
            Err(Error::InvalidParameter { .. })
        ));
    }
}
