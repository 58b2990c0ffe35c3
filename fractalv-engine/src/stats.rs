use fractalv_db::models::{Draw, Lottery};

#[derive(Debug, Clone, PartialEq)]
pub struct NumberStats {
    pub number: u8,
    pub frequency: u32,
    /// Concursos desde a última aparição (0 = saiu no último).
    pub gap: u32,
}

/// `history` do mais antigo ao mais recente.
pub fn compute_stats(history: &[Draw], lottery: Lottery) -> Vec<NumberStats> {
    let size = lottery.total();
    let mut stats: Vec<NumberStats> = (1..=size as u8)
        .map(|n| NumberStats {
            number: n,
            frequency: 0,
            gap: history.len() as u32,
        })
        .collect();

    for (age, draw) in history.iter().rev().enumerate() {
        for &n in &draw.numbers {
            let idx = n as usize;
            if idx >= 1 && idx <= size {
                let stat = &mut stats[idx - 1];
                if stat.frequency == 0 {
                    stat.gap = age as u32;
                }
                stat.frequency += 1;
            }
        }
    }

    stats
}

/// Série das somas por concurso, usada pelo expoente de Hurst.
pub fn sum_series(history: &[Draw]) -> Vec<f64> {
    history.iter().map(|d| d.sum() as f64).collect()
}

pub fn hot_numbers(stats: &[NumberStats], count: usize) -> Vec<u8> {
    let mut sorted: Vec<&NumberStats> = stats.iter().collect();
    sorted.sort_by(|a, b| b.frequency.cmp(&a.frequency).then(a.number.cmp(&b.number)));
    sorted.iter().take(count).map(|s| s.number).collect()
}

pub fn overdue_numbers(stats: &[NumberStats], count: usize) -> Vec<u8> {
    let mut sorted: Vec<&NumberStats> = stats.iter().collect();
    sorted.sort_by(|a, b| b.gap.cmp(&a.gap).then(a.number.cmp(&b.number)));
    sorted.iter().take(count).map(|s| s.number).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draws() -> Vec<Draw> {
        vec![
            Draw { contest: 1, numbers: vec![1, 2, 3, 4, 5, 6] },
            Draw { contest: 2, numbers: vec![1, 7, 8, 9, 10, 11] },
            Draw { contest: 3, numbers: vec![1, 2, 12, 13, 14, 15] },
        ]
    }

    #[test]
    fn test_compute_stats_frequency_and_gap() {
        let stats = compute_stats(&draws(), Lottery::MegaSena);
        assert_eq!(stats.len(), 60);
        assert_eq!(stats[0].frequency, 3);
        assert_eq!(stats[0].gap, 0);
        assert_eq!(stats[6].frequency, 1);
        assert_eq!(stats[6].gap, 1);
        assert_eq!(stats[2].gap, 2);
        // nunca saiu
        assert_eq!(stats[59].frequency, 0);
        assert_eq!(stats[59].gap, 3);
    }

    #[test]
    fn test_compute_stats_ignores_out_of_range() {
        let history = vec![Draw { contest: 1, numbers: vec![0, 26, 30, 25] }];
        let stats = compute_stats(&history, Lottery::Lotofacil);
        assert_eq!(stats.len(), 25);
        assert_eq!(stats.iter().map(|s| s.frequency).sum::<u32>(), 1);
        assert_eq!(stats[24].frequency, 1);
    }

    #[test]
    fn test_hot_and_overdue() {
        let stats = compute_stats(&draws(), Lottery::MegaSena);
        assert_eq!(hot_numbers(&stats, 2), vec![1, 2]);
        assert_eq!(overdue_numbers(&stats, 1), vec![16]);
    }

    #[test]
    fn test_sum_series() {
        assert_eq!(sum_series(&draws()), vec![21.0, 46.0, 57.0]);
    }
}
