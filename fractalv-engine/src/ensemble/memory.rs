use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::Family;

/// Pesos persistidos das três famílias. Sempre não negativos, soma = 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FamilyWeights {
    #[serde(rename = "Markov")]
    pub markov: f64,
    #[serde(rename = "Fractal")]
    pub fractal: f64,
    #[serde(rename = "Gauss")]
    pub gauss: f64,
}

impl Default for FamilyWeights {
    fn default() -> Self {
        Self { markov: 0.40, fractal: 0.30, gauss: 0.30 }
    }
}

impl FamilyWeights {
    pub fn new(markov: f64, fractal: f64, gauss: f64) -> Self {
        Self { markov, fractal, gauss }
    }

    pub fn get(&self, family: Family) -> f64 {
        match family {
            Family::Markov => self.markov,
            Family::Fractal => self.fractal,
            Family::Gauss => self.gauss,
        }
    }

    fn get_mut(&mut self, family: Family) -> &mut f64 {
        match family {
            Family::Markov => &mut self.markov,
            Family::Fractal => &mut self.fractal,
            Family::Gauss => &mut self.gauss,
        }
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.markov, self.fractal, self.gauss]
    }

    pub fn total(&self) -> f64 {
        self.markov + self.fractal + self.gauss
    }

    /// Reforça a família vencedora em `step` (limitado a 1); as outras dividem
    /// o restante na proporção do peso atual.
    pub fn reinforce(&mut self, winner: Family, step: f64) {
        let boosted = (self.get(winner) + step).clamp(0.0, 1.0);
        let remainder = 1.0 - boosted;

        let others: Vec<Family> = Family::ALL.into_iter().filter(|&f| f != winner).collect();
        let others_total: f64 = others.iter().map(|&f| self.get(f)).sum();

        for &f in &others {
            let w = if others_total > 0.0 {
                self.get(f) / others_total * remainder
            } else {
                remainder / others.len() as f64
            };
            *self.get_mut(f) = w;
        }
        *self.get_mut(winner) = boosted;
    }

    fn is_valid(&self) -> bool {
        let all = self.as_array();
        all.iter().all(|w| w.is_finite() && *w >= 0.0) && self.total() > 0.0
    }

    fn normalized(mut self) -> Self {
        let total = self.total();
        self.markov /= total;
        self.fractal /= total;
        self.gauss /= total;
        self
    }
}

/// Arquivo ausente → pesos padrão. Arquivo ilegível ou incoerente →
/// pesos padrão com um aviso.
pub fn load_memory(path: &Path) -> FamilyWeights {
    if !path.exists() {
        return FamilyWeights::default();
    }
    let parsed = std::fs::read_to_string(path)
        .with_context(|| format!("Impossível ler {:?}", path))
        .and_then(|json| {
            serde_json::from_str::<FamilyWeights>(&json)
                .with_context(|| format!("Memória de pesos inválida em {:?}", path))
        });
    match parsed {
        Ok(w) if w.is_valid() => w.normalized(),
        Ok(w) => {
            log::warn!("Pesos incoerentes em {:?} ({:?}), usando os padrões", path, w);
            FamilyWeights::default()
        }
        Err(e) => {
            log::warn!("{:#}, usando os pesos padrão", e);
            FamilyWeights::default()
        }
    }
}

pub fn save_memory(weights: &FamilyWeights, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Impossível criar {:?}", parent))?;
        }
    }
    let json = serde_json::to_string_pretty(weights)?;
    std::fs::write(path, json).with_context(|| format!("Impossível gravar {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_sums_to_one(w: &FamilyWeights) {
        assert!((w.total() - 1.0).abs() < 1e-9, "total = {}", w.total());
        assert!(w.as_array().iter().all(|&x| x >= 0.0));
    }

    #[test]
    fn test_default_weights() {
        let w = FamilyWeights::default();
        assert_sums_to_one(&w);
        assert_eq!(w.get(Family::Markov), 0.40);
    }

    #[test]
    fn test_reinforce_shrinks_others_proportionally() {
        let mut w = FamilyWeights::default();
        w.reinforce(Family::Fractal, 0.05);
        assert_sums_to_one(&w);
        assert!((w.fractal - 0.35).abs() < 1e-12);
        // 0.65 dividido 4:3
        assert!((w.markov - 0.65 * 4.0 / 7.0).abs() < 1e-12);
        assert!((w.gauss - 0.65 * 3.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_reinforce_caps_at_one() {
        let mut w = FamilyWeights::new(0.98, 0.01, 0.01);
        w.reinforce(Family::Markov, 0.05);
        assert_eq!(w.markov, 1.0);
        assert_eq!(w.fractal, 0.0);
        assert_sums_to_one(&w);
    }

    #[test]
    fn test_reinforce_from_saturated_state() {
        let mut w = FamilyWeights::new(1.0, 0.0, 0.0);
        w.reinforce(Family::Gauss, 0.05);
        assert_sums_to_one(&w);
        assert!((w.gauss - 0.05).abs() < 1e-12);
        assert!((w.markov - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_reinforce_others_zero_share_equally() {
        let mut w = FamilyWeights::new(0.0, 0.0, 0.5);
        w.reinforce(Family::Gauss, 0.1);
        assert!((w.markov - 0.2).abs() < 1e-12);
        assert!((w.fractal - 0.2).abs() < 1e-12);
        assert_sums_to_one(&w);
    }

    #[test]
    fn test_repeated_reinforce_stays_normalized() {
        let mut w = FamilyWeights::default();
        for i in 0..100 {
            w.reinforce(Family::ALL[i % 3], 0.05);
            assert_sums_to_one(&w);
        }
    }

    #[test]
    fn test_json_keys() {
        let json = serde_json::to_string(&FamilyWeights::default()).unwrap();
        assert!(json.contains("\"Markov\":0.4"), "{}", json);
        assert!(json.contains("\"Fractal\""));
        assert!(json.contains("\"Gauss\""));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory").join("fractal_memory.json");
        let mut w = FamilyWeights::default();
        w.reinforce(Family::Markov, 0.05);
        save_memory(&w, &path).unwrap();
        let loaded = load_memory(&path);
        assert!((loaded.markov - w.markov).abs() < 1e-12);
        assert_sums_to_one(&loaded);
    }

    #[test]
    fn test_load_missing_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_memory(&dir.path().join("absent.json")), FamilyWeights::default());
    }

    #[test]
    fn test_load_corrupt_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fractal_memory.json");
        std::fs::write(&path, "{\"Markov\": ").unwrap();
        assert_eq!(load_memory(&path), FamilyWeights::default());
        std::fs::write(&path, r#"{"Markov": -1.0, "Fractal": 1.0, "Gauss": 1.0}"#).unwrap();
        assert_eq!(load_memory(&path), FamilyWeights::default());
    }

    #[test]
    fn test_load_renormalizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fractal_memory.json");
        std::fs::write(&path, r#"{"Markov": 2.0, "Fractal": 1.0, "Gauss": 1.0}"#).unwrap();
        let w = load_memory(&path);
        assert!((w.markov - 0.5).abs() < 1e-12);
    }
}
