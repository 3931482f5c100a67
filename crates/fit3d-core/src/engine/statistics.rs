//! Significance estimates for Fit3D matches.
//!
//! Both models operate on the full merged match population, so they run only after all
//! targets of a batch have been searched.

use super::matches::Fit3DMatch;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatisticsError {
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

pub trait StatisticalModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Assigns a p-value to every match it can score. Matches it cannot score keep `None`.
    fn calculate_p_values(&self, matches: &mut [Fit3DMatch]) -> Result<(), StatisticsError>;
}

/// Which statistical model to attach to a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatisticalModelKind {
    Fofanov,
    Stark,
}

impl fmt::Display for StatisticalModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fofanov => "fofanov",
            Self::Stark => "stark",
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown statistical model '{0}'")]
pub struct ParseStatisticalModelError(pub String);

impl FromStr for StatisticalModelKind {
    type Err = ParseStatisticalModelError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fofanov" => Ok(Self::Fofanov),
            "stark" => Ok(Self::Stark),
            _ => Err(ParseStatisticalModelError(s.to_string())),
        }
    }
}

/// Models the RMSD distribution of random matches below the cutoff as a power law fitted to
/// the observed population.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FofanovEstimation {
    pub rmsd_cutoff: f64,
    /// Number of searched target structures.
    pub reference_size: usize,
}

impl FofanovEstimation {
    pub fn new(rmsd_cutoff: f64, reference_size: usize) -> Result<Self, StatisticsError> {
        if !(rmsd_cutoff > 0.0) {
            return Err(StatisticsError::InvalidParameter {
                name: "rmsd_cutoff",
                reason: format!("must be positive, got {}", rmsd_cutoff),
            });
        }
        if reference_size == 0 {
            return Err(StatisticsError::InvalidParameter {
                name: "reference_size",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(Self {
            rmsd_cutoff,
            reference_size,
        })
    }
}

impl StatisticalModel for FofanovEstimation {
    fn name(&self) -> &'static str {
        "Fofanov"
    }

    fn calculate_p_values(&self, matches: &mut [Fit3DMatch]) -> Result<(), StatisticsError> {
        let c = self.rmsd_cutoff;
        let usable: Vec<f64> = matches
            .iter()
            .map(|m| m.rmsd)
            .filter(|&x| x > 0.0 && x <= c)
            .collect();

        let log_sum: f64 = usable.iter().map(|&x| (c / x).ln()).sum();
        if usable.len() < 2 || log_sum <= 0.0 {
            warn!(
                usable = usable.len(),
                "Too few matches below the cutoff to fit the Fofanov model; p-values left unset."
            );
            return Ok(());
        }

        let n = usable.len() as f64;
        let exponent = n / log_sum;
        let fraction = n / self.reference_size as f64;
        debug!(exponent, fraction, "Fofanov model fitted.");

        for m in matches.iter_mut() {
            let p = if m.rmsd <= 0.0 {
                0.0
            } else {
                (fraction * (m.rmsd / c).powf(exponent)).min(1.0)
            };
            m.p_value = Some(p);
        }
        Ok(())
    }
}

/// Treats `k * rmsd^2 / sigma^2` of random matches as chi-squared distributed with
/// `max(3k - 6, 1)` degrees of freedom.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StarkEstimation;

impl StarkEstimation {
    fn degrees_of_freedom(atoms: usize) -> f64 {
        (3.0 * atoms as f64 - 6.0).max(1.0)
    }
}

impl StatisticalModel for StarkEstimation {
    fn name(&self) -> &'static str {
        "Stark"
    }

    fn calculate_p_values(&self, matches: &mut [Fit3DMatch]) -> Result<(), StatisticsError> {
        if matches.is_empty() {
            return Ok(());
        }
        let variance = matches
            .iter()
            .map(|m| {
                let k = m.fitted_atom_count as f64;
                k * m.rmsd * m.rmsd / Self::degrees_of_freedom(m.fitted_atom_count)
            })
            .sum::<f64>()
            / matches.len() as f64;
        debug!(variance, "Stark model variance estimated.");

        for m in matches.iter_mut() {
            let k = m.fitted_atom_count as f64;
            let nu = Self::degrees_of_freedom(m.fitted_atom_count);
            let p = if variance <= 0.0 {
                0.0
            } else {
                regularized_lower_gamma(nu / 2.0, k * m.rmsd * m.rmsd / (2.0 * variance))
            };
            m.p_value = Some(p.clamp(0.0, 1.0));
        }
        Ok(())
    }
}

const LANCZOS_COEFFICIENTS: [f64; 6] = [
    76.180_091_729_471_46,
    -86.505_320_329_416_77,
    24.014_098_240_830_91,
    -1.231_739_572_450_155,
    0.120_865_097_386_617_9e-2,
    -0.539_523_938_495_3e-5,
];

/// Natural logarithm of the gamma function for `x > 0` (Lanczos approximation).
pub fn ln_gamma(x: f64) -> f64 {
    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let mut series = 1.000_000_000_190_015;
    let mut y = x;
    for c in LANCZOS_COEFFICIENTS {
        y += 1.0;
        series += c / y;
    }
    -tmp + (2.506_628_274_631_000_5 * series / x).ln()
}

const GAMMA_MAX_ITERATIONS: usize = 500;
const GAMMA_EPSILON: f64 = 1e-14;
const GAMMA_TINY: f64 = 1e-300;

/// Regularized lower incomplete gamma function `P(a, x)`.
pub fn regularized_lower_gamma(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x < a + 1.0 {
        gamma_series(a, x)
    } else {
        1.0 - gamma_continued_fraction(a, x)
    }
}

fn gamma_series(a: f64, x: f64) -> f64 {
    let mut term = 1.0 / a;
    let mut sum = term;
    let mut denominator = a;
    for _ in 0..GAMMA_MAX_ITERATIONS {
        denominator += 1.0;
        term *= x / denominator;
        sum += term;
        if term.abs() < sum.abs() * GAMMA_EPSILON {
            break;
        }
    }
    sum * (-x + a * x.ln() - ln_gamma(a)).exp()
}

/// Upper tail `Q(a, x)` by Lentz's continued fraction.
fn gamma_continued_fraction(a: f64, x: f64) -> f64 {
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / GAMMA_TINY;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..=GAMMA_MAX_ITERATIONS {
        let an = -(i as f64) * (i as f64 - a);
        b += 2.0;
        d = an * d + b;
        if d.abs() < GAMMA_TINY {
            d = GAMMA_TINY;
        }
        c = b + an / c;
        if c.abs() < GAMMA_TINY {
            c = GAMMA_TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < GAMMA_EPSILON {
            break;
        }
    }
    (-x + a * x.ln() - ln_gamma(a)).exp() * h
}

/// Builds the model for a batch over `reference_size` targets.
pub fn build_model(
    kind: StatisticalModelKind,
    rmsd_cutoff: f64,
    reference_size: usize,
) -> Result<Box<dyn StatisticalModel>, StatisticsError> {
    Ok(match kind {
        StatisticalModelKind::Fofanov => {
            Box::new(FofanovEstimation::new(rmsd_cutoff, reference_size)?)
        }
        StatisticalModelKind::Stark => Box::new(StarkEstimation),
    })
}
