use fractalv_db::models::{Draw, Lottery};
use super::{normalize, recent_draws, uniform, ScoreModel};

/// Contagem de transições: quantas vezes `v` saiu logo depois de um concurso com `u`.
pub struct MarkovModel {
    window: usize,
}

impl MarkovModel {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl ScoreModel for MarkovModel {
    fn name(&self) -> &str {
        "Markov"
    }

    fn score(&self, history: &[Draw], lottery: Lottery) -> Vec<f64> {
        let size = lottery.total();
        if history.len() < 2 {
            return uniform(lottery);
        }

        let slice = recent_draws(history, self.window);
        let in_range = |n: u8| n >= 1 && (n as usize) <= size;

        // transition[u][v], indices 0..size
        let mut transition = vec![vec![0.0f64; size]; size];
        for pair in slice.windows(2) {
            for &u in pair[0].numbers.iter().filter(|&&n| in_range(n)) {
                for &v in pair[1].numbers.iter().filter(|&&n| in_range(n)) {
                    transition[(u - 1) as usize][(v - 1) as usize] += 1.0;
                }
            }
        }

        for row in &mut transition {
            let total: f64 = row.iter().sum();
            if total > 0.0 {
                for p in row.iter_mut() {
                    *p /= total;
                }
            }
        }

        let latest: Vec<usize> = slice[slice.len() - 1]
            .numbers
            .iter()
            .filter(|&&n| in_range(n))
            .map(|&n| (n - 1) as usize)
            .collect();

        if latest.is_empty() {
            return uniform(lottery);
        }

        let mut scores: Vec<f64> = (0..size)
            .map(|d| latest.iter().map(|&u| transition[u][d]).sum::<f64>() / latest.len() as f64)
            .collect();

        normalize(&mut scores);
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{make_test_draws, validate_distribution};

    #[test]
    fn test_markov_sums_to_one() {
        let model = MarkovModel::new(100);
        let draws = make_test_draws(30);
        let dist = model.score(&draws, Lottery::MegaSena);
        assert!(validate_distribution(&dist, Lottery::MegaSena),
            "Sum = {}, len = {}", dist.iter().sum::<f64>(), dist.len());
    }

    #[test]
    fn test_markov_ignores_out_of_range() {
        let model = MarkovModel::new(100);
        let draws = make_test_draws(30);
        let dist = model.score(&draws, Lottery::Lotofacil);
        assert!(validate_distribution(&dist, Lottery::Lotofacil));
    }

    #[test]
    fn test_markov_too_few_draws() {
        let model = MarkovModel::new(100);
        let draws = make_test_draws(1);
        let dist = model.score(&draws, Lottery::MegaSena);
        let expected = 1.0 / 60.0;
        for &p in &dist {
            assert!((p - expected).abs() < 1e-10);
        }
    }

    #[test]
    fn test_markov_follows_transitions() {
        // 1 é sempre seguido por 2, e o último concurso contém 1
        let draws = vec![
            Draw { contest: 1, numbers: vec![1, 10] },
            Draw { contest: 2, numbers: vec![2, 20] },
            Draw { contest: 3, numbers: vec![1, 10] },
            Draw { contest: 4, numbers: vec![2, 20] },
            Draw { contest: 5, numbers: vec![1, 10] },
        ];
        let dist = MarkovModel::new(100).score(&draws, Lottery::MegaSena);
        assert!(dist[1] > dist[0]);
        assert!((dist[1] - dist[19]).abs() < 1e-12);
        assert!((dist[1] - 0.5).abs() < 1e-12);
        assert_eq!(dist[2], 0.0);
    }

    #[test]
    fn test_markov_window_limits_history() {
        let mut draws = vec![
            Draw { contest: 1, numbers: vec![5] },
            Draw { contest: 2, numbers: vec![6] },
        ];
        draws.extend((3..=6).map(|c| Draw { contest: c, numbers: vec![1] }));
        let dist = MarkovModel::new(3).score(&draws, Lottery::MegaSena);
        // a transição 5 -> 6 fica fora da janela
        assert!((dist[0] - 1.0).abs() < 1e-12);
        assert_eq!(dist[5], 0.0);
    }
}
