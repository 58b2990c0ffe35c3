use std::collections::HashSet;

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use fractalv_db::models::{Combination, Draw, Lottery};

use crate::ensemble::{top_k, Profile};
use crate::models::gauss::sum_moments;

/// Mínimo de concursos para aplicar o filtro de soma.
const MIN_DRAWS_FOR_SUM_BAND: usize = 5;
const MIN_ATTEMPTS: usize = 1000;
const ATTEMPTS_PER_TICKET: usize = 50;

/// Semente derivada da decisão: mesma loteria, mesmo último concurso, mesmo
/// perfil e mesma quantidade → mesmos volantes.
pub fn decision_seed(lottery: Lottery, latest_contest: u32, profile: Profile, count: u64) -> u64 {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for part in [lottery.code(), latest_contest as u64, profile.code(), count] {
        for byte in part.to_le_bytes() {
            h ^= byte as u64;
            h = h.wrapping_mul(0x0100_0000_01b3);
        }
    }
    h
}

/// Top-K do score combinado, K = max(size, ceil(total × pool_ratio)),
/// mais `long_shots` zebras fora do pool vindas do score fractal.
pub fn build_pool(
    blended: &[f64],
    fractal: &[f64],
    size: usize,
    pool_ratio: f64,
    long_shots: usize,
) -> Vec<u8> {
    let total = blended.len();
    let k = ((total as f64 * pool_ratio - 1e-9).ceil() as usize).max(size).min(total);
    let mut pool = top_k(blended, k);

    if long_shots > 0 {
        let extras: Vec<u8> = top_k(fractal, total)
            .into_iter()
            .filter(|n| !pool.contains(n))
            .take(long_shots)
            .collect();
        log::debug!("Zebras adicionadas ao pool: {:?}", extras);
        pool.extend(extras);
    }
    pool
}

/// Faixa aceitável de soma para um volante de `size` dezenas.
pub fn sum_band(history: &[Draw], size: usize, sigmas: f64) -> Option<(f64, f64)> {
    if history.len() < MIN_DRAWS_FOR_SUM_BAND {
        return None;
    }
    let (mu, sigma) = sum_moments(history, size)?;
    Some((mu - sigmas * sigma, mu + sigmas * sigma))
}

/// Repetições esperadas com o último concurso (hipergeométrica), média ± 2 dp.
pub fn repeat_band(total: usize, drawn: usize, size: usize) -> (usize, usize) {
    let upper = size.min(drawn);
    if total < 2 || drawn == 0 {
        return (0, upper);
    }
    let n = total as f64;
    let k = drawn as f64;
    let s = size as f64;
    let mean = s * k / n;
    let var = s * (k / n) * ((n - k) / n) * ((n - s) / (n - 1.0));
    let sd = var.max(0.0).sqrt();
    let lo = (mean - 2.0 * sd).round().max(0.0) as usize;
    let hi = ((mean + 2.0 * sd).round().max(0.0) as usize).min(upper);
    (lo.min(hi), hi)
}

/// Entropia de Shannon (bits) do histograma por dezena (1-10, 11-20, …).
pub fn decade_entropy(numbers: &[u8]) -> f64 {
    if numbers.is_empty() {
        return 0.0;
    }
    let mut buckets = [0usize; 11];
    for &n in numbers {
        buckets[(n.saturating_sub(1) / 10) as usize] += 1;
    }
    let total = numbers.len() as f64;
    buckets
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum()
}

pub struct GenerationRequest<'a> {
    pub lottery: Lottery,
    /// Do mais antigo ao mais recente.
    pub history: &'a [Draw],
    pub blended: &'a [f64],
    pub pool: &'a [u8],
    pub size: usize,
    pub count: usize,
    pub sum_band_sigma: f64,
    pub seed: u64,
}

fn passes_filters(
    numbers: &[u8],
    band: Option<(f64, f64)>,
    repeats: Option<(&Draw, (usize, usize))>,
) -> bool {
    if let Some((lo, hi)) = band {
        let sum: u32 = numbers.iter().map(|&n| n as u32).sum();
        let sum = sum as f64;
        if sum < lo || sum > hi {
            return false;
        }
    }
    if let Some((latest, (lo, hi))) = repeats {
        let r = numbers.iter().filter(|&&n| latest.contains(n)).count();
        if r < lo || r > hi {
            return false;
        }
    }
    true
}

fn make_combination(mut numbers: Vec<u8>, blended: &[f64]) -> Combination {
    numbers.sort_unstable();
    let score = numbers
        .iter()
        .map(|&n| blended.get((n - 1) as usize).copied().unwrap_or(0.0))
        .sum();
    let entropy = decade_entropy(&numbers);
    Combination { numbers, score, entropy }
}

/// Amostra `count` volantes distintos do pool, filtrados por soma e repetição.
/// Acima do limite de tentativas, completa com sorteio uniforme sem filtros.
pub fn generate_combinations(req: &GenerationRequest) -> Result<Vec<Combination>> {
    let total = req.lottery.total();
    if req.size == 0 || req.size > total {
        bail!("Volante de {} dezenas impossível em {}", req.size, req.lottery);
    }
    if req.pool.len() < req.size {
        bail!("Pool de {} números menor que o volante ({})", req.pool.len(), req.size);
    }

    let mut rng = StdRng::seed_from_u64(req.seed);
    let band = sum_band(req.history, req.size, req.sum_band_sigma);
    let repeats = req.history.last().map(|latest| {
        let drawn = latest
            .numbers
            .iter()
            .filter(|&&n| n >= 1 && n as usize <= total)
            .count();
        (latest, repeat_band(total, drawn, req.size))
    });

    let cap = MIN_ATTEMPTS.max(ATTEMPTS_PER_TICKET * req.count);
    let mut seen: HashSet<Vec<u8>> = HashSet::new();
    let mut combos: Vec<Combination> = Vec::with_capacity(req.count);

    let mut attempts = 0;
    while combos.len() < req.count && attempts < cap {
        attempts += 1;
        let mut numbers: Vec<u8> = rand::seq::index::sample(&mut rng, req.pool.len(), req.size)
            .into_iter()
            .map(|i| req.pool[i])
            .collect();
        numbers.sort_unstable();
        if !passes_filters(&numbers, band, repeats) || seen.contains(&numbers) {
            continue;
        }
        seen.insert(numbers.clone());
        combos.push(make_combination(numbers, req.blended));
    }

    if combos.len() < req.count {
        log::warn!(
            "{} tentativas esgotadas com {}/{} volantes, completando com sorteio uniforme",
            cap,
            combos.len(),
            req.count
        );
        let mut fallback = 0;
        while combos.len() < req.count && fallback < cap {
            fallback += 1;
            let mut numbers: Vec<u8> = rand::seq::index::sample(&mut rng, total, req.size)
                .into_iter()
                .map(|i| (i + 1) as u8)
                .collect();
            numbers.sort_unstable();
            if seen.insert(numbers.clone()) {
                combos.push(make_combination(numbers, req.blended));
            }
        }
        if combos.len() < req.count {
            log::warn!("Apenas {} volantes distintos gerados de {}", combos.len(), req.count);
        }
    }

    combos.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    Ok(combos)
}
