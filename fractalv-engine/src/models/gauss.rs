use fractalv_db::models::{Draw, Lottery};
use super::{normalize, recent_draws, uniform, ScoreModel};

/// Média e desvio padrão das somas dos concursos, reescaladas para `pick` números.
pub fn sum_moments(history: &[Draw], pick: usize) -> Option<(f64, f64)> {
    let sums: Vec<f64> = history
        .iter()
        .filter(|d| !d.numbers.is_empty())
        .map(|d| d.sum() as f64 * pick as f64 / d.numbers.len() as f64)
        .collect();
    if sums.is_empty() {
        return None;
    }
    let n = sums.len() as f64;
    let mean = sums.iter().sum::<f64>() / n;
    let var = sums.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
    Some((mean, var.sqrt()))
}

/// Proximidade da soma: favorece números que mantêm a soma esperada do bilhete
/// perto da média histórica.
pub struct GaussModel {
    window: usize,
}

impl GaussModel {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl ScoreModel for GaussModel {
    fn name(&self) -> &str {
        "Gauss"
    }

    fn score(&self, history: &[Draw], lottery: Lottery) -> Vec<f64> {
        let pick = lottery.pick();
        let Some((mu, sigma)) = sum_moments(recent_draws(history, self.window), pick) else {
            return uniform(lottery);
        };
        let sigma = if sigma > 0.0 { sigma } else { 1.0 };
        let others = (pick - 1) as f64 * mu / pick as f64;

        let mut scores: Vec<f64> = (1..=lottery.total())
            .map(|d| {
                let expected = d as f64 + others;
                (-(expected - mu).powi(2) / (2.0 * sigma * sigma)).exp()
            })
            .collect();
        normalize(&mut scores);
        scores
    }
}
