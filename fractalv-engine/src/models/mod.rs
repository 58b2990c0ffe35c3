pub mod fractal;
pub mod gauss;
pub mod markov;

use fractalv_db::models::{Draw, Lottery};

pub trait ScoreModel: Send + Sync {
    fn name(&self) -> &str;
    /// history[0] = concurso mais antigo, history[len-1] = o mais recente.
    /// Retorna Vec<f64> de tamanho lottery.total(), soma = 1.0
    fn score(&self, history: &[Draw], lottery: Lottery) -> Vec<f64>;
}

pub fn uniform(lottery: Lottery) -> Vec<f64> {
    let size = lottery.total();
    vec![1.0 / size as f64; size]
}

pub fn validate_distribution(dist: &[f64], lottery: Lottery) -> bool {
    if dist.len() != lottery.total() {
        return false;
    }
    if dist.iter().any(|&p| p < 0.0 || !p.is_finite()) {
        return false;
    }
    let sum: f64 = dist.iter().sum();
    (sum - 1.0).abs() < 1e-9
}

/// Normaliza in-place; soma nula → uniforme.
pub(crate) fn normalize(scores: &mut [f64]) {
    let total: f64 = scores.iter().sum();
    if total > 0.0 && total.is_finite() {
        for s in scores.iter_mut() {
            *s /= total;
        }
    } else {
        let size = scores.len();
        for s in scores.iter_mut() {
            *s = 1.0 / size as f64;
        }
    }
}

/// Os `window` concursos mais recentes.
pub fn recent_draws(history: &[Draw], window: usize) -> &[Draw] {
    &history[history.len().saturating_sub(window)..]
}

/// Ordem fixa: Markov, Fractal, Gauss.
pub fn all_models(markov_window: usize, fractal_window: usize) -> Vec<Box<dyn ScoreModel>> {
    vec![
        Box::new(markov::MarkovModel::new(markov_window)),
        Box::new(fractal::FractalModel::new(fractal_window)),
        Box::new(gauss::GaussModel::new(markov_window)),
    ]
}

#[cfg(test)]
pub fn make_test_draws(n: usize) -> Vec<Draw> {
    (0..n)
        .map(|i| {
            let start = ((i * 7) % 50) as u8;
            Draw {
                contest: (i + 1) as u32,
                numbers: vec![start + 1, start + 3, start + 5, start + 7, start + 9, start + 11],
            }
        })
        .collect()
}
