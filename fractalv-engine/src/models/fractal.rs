use fractalv_db::models::{Draw, Lottery};
use super::{normalize, recent_draws, uniform, ScoreModel};

/// Score mínimo de um número que acabou de sair.
const FRESH_FLOOR: f64 = 0.45;

/// Score neutro quando há menos de 2 intervalos completos.
const NEUTRAL: f64 = 0.5;

/// Z-score do atraso atual contra a distribuição dos intervalos passados,
/// comprimido por uma sigmoide.
pub struct FractalModel {
    window: usize,
}

impl FractalModel {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    /// Valores brutos em [0, 1], antes da normalização.
    pub fn raw_scores(&self, history: &[Draw], lottery: Lottery) -> Vec<f64> {
        let size = lottery.total();
        let slice = recent_draws(history, self.window);

        let mut delay = vec![0usize; size];
        let mut gaps: Vec<Vec<usize>> = vec![Vec::new(); size];

        for draw in slice {
            let mut present = vec![false; size];
            for &n in &draw.numbers {
                let idx = n as usize;
                if idx >= 1 && idx <= size {
                    present[idx - 1] = true;
                }
            }
            for d in 0..size {
                if present[d] {
                    if delay[d] > 0 {
                        gaps[d].push(delay[d]);
                    }
                    delay[d] = 0;
                } else {
                    delay[d] += 1;
                }
            }
        }

        (0..size)
            .map(|d| gap_score(&gaps[d], delay[d]))
            .collect()
    }
}

fn gap_score(gaps: &[usize], delay: usize) -> f64 {
    if gaps.len() < 2 {
        return NEUTRAL;
    }
    let n = gaps.len() as f64;
    let mean = gaps.iter().sum::<usize>() as f64 / n;
    let var = gaps.iter().map(|&g| (g as f64 - mean).powi(2)).sum::<f64>() / n;
    let std = if var > 0.0 { var.sqrt() } else { 1.0 };

    let z = (delay as f64 - mean) / std;
    let s = 1.0 / (1.0 + (-z).exp());
    if delay == 0 { s.max(FRESH_FLOOR) } else { s }
}

impl ScoreModel for FractalModel {
    fn name(&self) -> &str {
        "Fractal"
    }

    fn score(&self, history: &[Draw], lottery: Lottery) -> Vec<f64> {
        if history.is_empty() {
            return uniform(lottery);
        }
        let mut scores = self.raw_scores(history, lottery);
        normalize(&mut scores);
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{make_test_draws, validate_distribution};

    #[test]
    fn test_fractal_sums_to_one() {
        let model = FractalModel::new(100);
        let draws = make_test_draws(40);
        let dist = model.score(&draws, Lottery::MegaSena);
        assert!(validate_distribution(&dist, Lottery::MegaSena));
    }

    #[test]
    fn test_fractal_empty_history_is_uniform() {
        let dist = FractalModel::new(100).score(&[], Lottery::Quina);
        assert_eq!(dist.len(), 80);
        assert!(dist.iter().all(|&p| (p - 1.0 / 80.0).abs() < 1e-12));
    }

    #[test]
    fn test_gap_score_neutral_with_few_gaps() {
        assert_eq!(gap_score(&[], 7), NEUTRAL);
        assert_eq!(gap_score(&[3], 0), NEUTRAL);
    }

    #[test]
    fn test_gap_score_overdue_is_high() {
        // intervalos médios de 3, atrasado há 9
        let s = gap_score(&[2, 3, 4], 9);
        assert!(s > 0.99, "s = {}", s);
    }

    #[test]
    fn test_gap_score_fresh_floor() {
        let s = gap_score(&[5, 5, 5], 0);
        assert!((s - FRESH_FLOOR).abs() < 1e-12);
    }

    #[test]
    fn test_raw_scores_track_delay() {
        // 1 sai a cada 2 concursos e saiu no último; 2 saiu só no começo
        let draws: Vec<Draw> = (1..=9u32)
            .map(|c| {
                let mut numbers = vec![];
                if c % 2 == 1 {
                    numbers.push(1);
                }
                if c <= 3 {
                    numbers.push(2);
                }
                Draw { contest: c, numbers }
            })
            .collect();
        let raw = FractalModel::new(100).raw_scores(&draws, Lottery::MegaSena);
        assert_eq!(raw.len(), 60);
        assert!((raw[0] - FRESH_FLOOR).abs() < 1e-12);
        // 2 nunca teve intervalo completo
        assert_eq!(raw[1], NEUTRAL);
        assert_eq!(raw[59], NEUTRAL);
    }
}
