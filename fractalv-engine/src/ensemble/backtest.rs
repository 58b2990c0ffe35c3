use indicatif::ProgressBar;
use rayon::prelude::*;

use fractalv_db::models::{Draw, Lottery};

use super::memory::FamilyWeights;
use super::{count_hits, top_k, EnsembleScorer, Family, Profile};
use crate::config::AdvisorConfig;
use crate::hurst::{hurst_exponent, Regime};
use crate::stats::sum_series;

/// Histórico extra exigido além da janela de teste.
pub const MIN_TRAINING: usize = 20;

#[derive(Debug, Clone)]
pub struct BacktestReport {
    pub tested: usize,
    pub family_hits: Vec<(Family, usize)>,
    pub profile_hits: Vec<(Profile, usize)>,
    pub best_family: Family,
    pub best_profile: Profile,
}

impl BacktestReport {
    /// Acertos médios por concurso do perfil vencedor.
    pub fn mean_hits(&self) -> f64 {
        let hits = self
            .profile_hits
            .iter()
            .find(|(p, _)| *p == self.best_profile)
            .map(|&(_, h)| h)
            .unwrap_or(0);
        hits as f64 / self.tested.max(1) as f64
    }
}

#[derive(Debug, Clone)]
pub struct StrategyChoice {
    pub profile: Profile,
    pub hurst: f64,
    pub regime: Regime,
    pub report: Option<BacktestReport>,
}

struct PointResult {
    family: [usize; 3],
    profile: [usize; 4],
}

fn evaluate_point(
    scorer: &EnsembleScorer,
    history: &[Draw],
    test_idx: usize,
    lottery: Lottery,
    memory: &FamilyWeights,
) -> PointResult {
    // Somente concursos estritamente anteriores ao concurso testado
    let train = &history[..test_idx];
    let target = &history[test_idx];
    let pick = lottery.pick();
    let scores = scorer.score(train, lottery);

    let mut family = [0usize; 3];
    for f in Family::ALL {
        family[f.index()] = count_hits(&top_k(scores.get(f), pick), target);
    }

    let mut profile = [0usize; 4];
    for (i, p) in Profile::ALL.into_iter().enumerate() {
        let blended = scores.blend(&p.weights(memory));
        profile[i] = count_hits(&top_k(&blended, pick), target);
    }

    PointResult { family, profile }
}

/// Primeiro máximo: a ordem do catálogo desempata.
fn first_best<T: Copy>(hits: &[(T, usize)]) -> Option<T> {
    let mut best: Option<(T, usize)> = None;
    for &(item, h) in hits {
        match best {
            Some((_, b)) if h <= b => {}
            _ => best = Some((item, h)),
        }
    }
    best.map(|(item, _)| item)
}

/// Refaz os últimos `backtest_window` concursos. `None` se o histórico for
/// curto demais (menos de `backtest_window + MIN_TRAINING` concursos).
pub fn run_backtest(
    history: &[Draw],
    lottery: Lottery,
    config: &AdvisorConfig,
    memory: &FamilyWeights,
    pb: &ProgressBar,
) -> Option<BacktestReport> {
    let window = config.backtest_window;
    if history.len() < window + MIN_TRAINING {
        log::info!(
            "Backtest ignorado para {}: {} concursos (mínimo {})",
            lottery,
            history.len(),
            window + MIN_TRAINING
        );
        return None;
    }

    let scorer = EnsembleScorer::new(config.markov_window, config.fractal_window);
    let first = history.len() - window;
    pb.set_length(window as u64);

    let points: Vec<PointResult> = (first..history.len())
        .into_par_iter()
        .map(|idx| {
            let r = evaluate_point(&scorer, history, idx, lottery, memory);
            pb.inc(1);
            r
        })
        .collect();
    pb.finish_and_clear();

    let mut family_hits: Vec<(Family, usize)> = Family::ALL.iter().map(|&f| (f, 0)).collect();
    let mut profile_hits: Vec<(Profile, usize)> = Profile::ALL.iter().map(|&p| (p, 0)).collect();
    for point in &points {
        for (slot, h) in family_hits.iter_mut().zip(point.family) {
            slot.1 += h;
        }
        for (slot, h) in profile_hits.iter_mut().zip(point.profile) {
            slot.1 += h;
        }
    }

    let best_family = first_best(&family_hits).unwrap_or(Family::Markov);
    let best_profile = first_best(&profile_hits).unwrap_or(Profile::Balanced);
    log::info!(
        "Backtest {} sobre {} concursos: família {} / perfil {}",
        lottery,
        points.len(),
        best_family,
        best_profile
    );

    Some(BacktestReport {
        tested: points.len(),
        family_hits,
        profile_hits,
        best_family,
        best_profile,
    })
}

/// Backtest quando há histórico suficiente; senão o regime de Hurst decide.
pub fn choose_strategy(
    history: &[Draw],
    lottery: Lottery,
    config: &AdvisorConfig,
    memory: &FamilyWeights,
    pb: &ProgressBar,
) -> StrategyChoice {
    let hurst = hurst_exponent(&sum_series(history));
    let regime = Regime::from_exponent(hurst);
    let report = run_backtest(history, lottery, config, memory, pb);
    let profile = match &report {
        Some(r) => r.best_profile,
        None => Profile::from_regime(regime),
    };
    StrategyChoice { profile, hurst, regime, report }
}
