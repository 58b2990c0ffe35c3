pub mod backtest;
pub mod memory;

use std::fmt;

use fractalv_db::models::{Draw, Lottery};

use crate::hurst::Regime;
use crate::models::{all_models, normalize, uniform, ScoreModel};
use memory::FamilyWeights;

/// As três famílias de heurísticas, na ordem fixa dos modelos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Markov,
    Fractal,
    Gauss,
}

impl Family {
    pub const ALL: [Family; 3] = [Family::Markov, Family::Fractal, Family::Gauss];

    pub fn index(self) -> usize {
        match self {
            Family::Markov => 0,
            Family::Fractal => 1,
            Family::Gauss => 2,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Family::Markov => "Markov",
            Family::Fractal => "Fractal",
            Family::Gauss => "Gauss",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    Adaptive,
    Trend,
    Reversion,
    Balanced,
}

impl Profile {
    pub const ALL: [Profile; 4] = [Profile::Adaptive, Profile::Trend, Profile::Reversion, Profile::Balanced];

    pub fn name(self) -> &'static str {
        match self {
            Profile::Adaptive => "Fractal_Adaptativo",
            Profile::Trend => "Markov_Tendencia",
            Profile::Reversion => "Fractal_Reversao",
            Profile::Balanced => "Hibrido_Balanceado",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Profile::Adaptive => "Evolução contínua a partir da memória de pesos",
            Profile::Trend => "Segue as repetições (Markov dominante)",
            Profile::Reversion => "Caça atrasos (z-score) e inclui zebras",
            Profile::Balanced => "Equilíbrio entre fluxo e caos",
        }
    }

    /// `Adaptive` usa a memória como está.
    pub fn weights(self, memory: &FamilyWeights) -> FamilyWeights {
        match self {
            Profile::Adaptive => *memory,
            Profile::Trend => FamilyWeights::new(0.6, 0.1, 0.3),
            Profile::Reversion => FamilyWeights::new(0.1, 0.6, 0.3),
            Profile::Balanced => FamilyWeights::new(0.3, 0.3, 0.4),
        }
    }

    pub fn uses_long_shots(self) -> bool {
        self == Profile::Reversion
    }

    pub fn from_regime(regime: Regime) -> Self {
        match regime {
            Regime::Trend => Profile::Trend,
            Regime::Reversion => Profile::Reversion,
            Regime::Neutral => Profile::Balanced,
        }
    }

    /// Identificador estável para a semente determinística.
    pub fn code(self) -> u64 {
        Profile::ALL.iter().position(|&p| p == self).unwrap_or(0) as u64
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Distribuições por família, indexadas por `Family::index`.
#[derive(Debug, Clone)]
pub struct FamilyScores {
    pub distributions: [Vec<f64>; 3],
}

impl FamilyScores {
    pub fn get(&self, family: Family) -> &[f64] {
        &self.distributions[family.index()]
    }

    /// Mistura ponderada, renormalizada.
    pub fn blend(&self, weights: &FamilyWeights) -> Vec<f64> {
        let size = self.distributions[0].len();
        let mut combined = vec![0.0f64; size];
        for family in Family::ALL {
            let w = weights.get(family);
            for (c, p) in combined.iter_mut().zip(self.get(family)) {
                *c += w * p;
            }
        }
        normalize(&mut combined);
        combined
    }
}

pub struct EnsembleScorer {
    models: Vec<Box<dyn ScoreModel>>,
}

impl EnsembleScorer {
    pub fn new(markov_window: usize, fractal_window: usize) -> Self {
        Self { models: all_models(markov_window, fractal_window) }
    }

    pub fn score(&self, history: &[Draw], lottery: Lottery) -> FamilyScores {
        let distributions = std::array::from_fn(|i| match self.models.get(i) {
            Some(model) => {
                let dist = model.score(history, lottery);
                log::debug!("{}: {} scores sobre {} concursos", model.name(), dist.len(), history.len());
                dist
            }
            None => uniform(lottery),
        });
        FamilyScores { distributions }
    }
}

/// Os `k` números de maior score; empate → menor número primeiro.
pub fn top_k(scores: &[f64], k: usize) -> Vec<u8> {
    let mut indexed: Vec<(usize, f64)> = scores.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    indexed.iter().take(k).map(|&(i, _)| (i + 1) as u8).collect()
}

pub fn count_hits(picked: &[u8], draw: &Draw) -> usize {
    picked.iter().filter(|&&n| draw.contains(n)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{make_test_draws, validate_distribution};

    #[test]
    fn test_profile_weights_sum_to_one() {
        let memory = FamilyWeights::default();
        for profile in Profile::ALL {
            let w = profile.weights(&memory);
            assert!((w.total() - 1.0).abs() < 1e-12, "{}", profile);
        }
    }

    #[test]
    fn test_adaptive_follows_memory() {
        let memory = FamilyWeights::new(0.2, 0.5, 0.3);
        assert_eq!(Profile::Adaptive.weights(&memory), memory);
    }

    #[test]
    fn test_only_reversion_uses_long_shots() {
        let with: Vec<Profile> = Profile::ALL.into_iter().filter(|p| p.uses_long_shots()).collect();
        assert_eq!(with, vec![Profile::Reversion]);
    }

    #[test]
    fn test_profile_from_regime() {
        assert_eq!(Profile::from_regime(Regime::Trend), Profile::Trend);
        assert_eq!(Profile::from_regime(Regime::Reversion), Profile::Reversion);
        assert_eq!(Profile::from_regime(Regime::Neutral), Profile::Balanced);
    }

    #[test]
    fn test_profile_codes_are_distinct() {
        let codes: Vec<u64> = Profile::ALL.iter().map(|p| p.code()).collect();
        assert_eq!(codes, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_blend_is_distribution() {
        let scorer = EnsembleScorer::new(100, 100);
        let scores = scorer.score(&make_test_draws(30), Lottery::MegaSena);
        for profile in Profile::ALL {
            let blended = scores.blend(&profile.weights(&FamilyWeights::default()));
            assert!(validate_distribution(&blended, Lottery::MegaSena));
        }
    }

    #[test]
    fn test_blend_single_family() {
        let scores = FamilyScores {
            distributions: [vec![0.5, 0.5, 0.0], vec![0.0, 0.0, 1.0], vec![1.0, 0.0, 0.0]],
        };
        let blended = scores.blend(&FamilyWeights::new(0.0, 1.0, 0.0));
        assert_eq!(blended, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_top_k_order_and_ties() {
        let scores = vec![0.1, 0.3, 0.3, 0.05, 0.25];
        assert_eq!(top_k(&scores, 3), vec![2, 3, 5]);
        assert_eq!(top_k(&scores, 10).len(), 5);
    }

    #[test]
    fn test_count_hits() {
        let draw = Draw { contest: 1, numbers: vec![1, 2, 3, 4, 5, 6] };
        assert_eq!(count_hits(&[1, 6, 7, 60], &draw), 2);
    }
}
