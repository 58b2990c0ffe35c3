use std::fmt;

const MIN_POINTS: usize = 22;
const NEUTRAL: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    Trend,
    Reversion,
    Neutral,
}

impl Regime {
    pub fn from_exponent(h: f64) -> Self {
        if h > 0.55 {
            Regime::Trend
        } else if h < 0.45 {
            Regime::Reversion
        } else {
            Regime::Neutral
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regime::Trend => write!(f, "Tendência"),
            Regime::Reversion => write!(f, "Reversão à média"),
            Regime::Neutral => write!(f, "Neutro"),
        }
    }
}

fn std_dev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

/// Inclinação da reta de mínimos quadrados.
fn slope(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len() as f64;
    let mx = xs.iter().sum::<f64>() / n;
    let my = ys.iter().sum::<f64>() / n;
    let sxx: f64 = xs.iter().map(|x| (x - mx).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    Some(sxy / sxx)
}

/// Expoente de Hurst pelo método das diferenças defasadas (lags 2..20).
/// Série curta ou ajuste degenerado → 0.5.
pub fn hurst_exponent(series: &[f64]) -> f64 {
    if series.len() < MIN_POINTS {
        return NEUTRAL;
    }

    let mut log_lags = Vec::new();
    let mut log_tau = Vec::new();
    for lag in 2..20usize {
        let diffs: Vec<f64> = series[lag..]
            .iter()
            .zip(&series[..series.len() - lag])
            .map(|(a, b)| a - b)
            .collect();
        let tau = std_dev(&diffs).sqrt();
        if !(tau > 0.0 && tau.is_finite()) {
            log::debug!("Hurst degenerado no lag {}", lag);
            return NEUTRAL;
        }
        log_lags.push((lag as f64).ln());
        log_tau.push(tau.ln());
    }

    match slope(&log_lags, &log_tau) {
        Some(s) if s.is_finite() => s * 2.0,
        _ => NEUTRAL,
    }
}
