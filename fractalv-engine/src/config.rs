use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use fractalv_db::models::Lottery;

const SHEET_BASE: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vSHPmYqIsBMWIzdMlnuKfPDI5BI4UG_WMEdMP6OwUeojDThvp0fI6J7fywO_T7ynVsk30-JuhJJQng6/pub";

fn sheet_url(gid: u64) -> String {
    format!("{SHEET_BASE}?gid={gid}&single=true&output=csv")
}

fn default_sources() -> BTreeMap<String, String> {
    [
        (Lottery::Lotofacil, 1063211255u64),
        (Lottery::MegaSena, 936546416),
        (Lottery::Quina, 1703483549),
        (Lottery::DiaDeSorte, 1059501941),
        (Lottery::Timemania, 1575649264),
        (Lottery::DuplaSena, 152509825),
        (Lottery::Lotomania, 848764653),
        (Lottery::MegaDaVirada, 298407214),
    ]
    .into_iter()
    .map(|(lottery, gid)| (lottery.key().to_string(), sheet_url(gid)))
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Chave da loteria → URL do CSV publicado.
    pub sources: BTreeMap<String, String>,
    pub prices_url: String,
    pub memory_path: PathBuf,
    pub cache_path: PathBuf,
    pub markov_window: usize,
    pub fractal_window: usize,
    pub backtest_window: usize,
    pub pool_ratio: f64,
    pub long_shots: usize,
    pub sum_band_sigma: f64,
    pub learning_step: f64,
    /// Teto opcional de volantes por plano; sem teto por padrão.
    pub max_tickets: Option<u64>,
    pub gemini_model: String,
    pub gemini_endpoint: String,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            prices_url: sheet_url(1620341582),
            memory_path: PathBuf::from("fractal_memory.json"),
            cache_path: fractalv_db::db::db_path(),
            markov_window: 100,
            fractal_window: 100,
            backtest_window: 10,
            pool_ratio: 0.65,
            long_shots: 3,
            sum_band_sigma: 1.5,
            learning_step: 0.05,
            max_tickets: None,
            gemini_model: "gemini-1.5-flash".to_string(),
            gemini_endpoint: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
        }
    }
}

impl AdvisorConfig {
    pub fn source_url(&self, lottery: Lottery) -> Option<&str> {
        self.sources
            .iter()
            .find(|(key, _)| Lottery::from_name(key).ok() == Some(lottery))
            .map(|(_, url)| url.as_str())
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.pool_ratio > 0.0 && self.pool_ratio <= 1.0) {
            bail!("pool_ratio deve estar em (0, 1]: {}", self.pool_ratio);
        }
        if !(self.learning_step > 0.0 && self.learning_step < 1.0) {
            bail!("learning_step deve estar em (0, 1): {}", self.learning_step);
        }
        if !(self.sum_band_sigma > 0.0 && self.sum_band_sigma.is_finite()) {
            bail!("sum_band_sigma deve ser positivo: {}", self.sum_band_sigma);
        }
        if self.markov_window < 2 || self.fractal_window < 2 {
            bail!("As janelas de análise precisam de pelo menos 2 concursos");
        }
        if self.backtest_window == 0 {
            bail!("backtest_window deve ser >= 1");
        }
        if self.max_tickets == Some(0) {
            bail!("max_tickets deve ser >= 1");
        }
        for key in self.sources.keys() {
            Lottery::from_name(key)
                .with_context(|| format!("Fonte configurada para loteria desconhecida: '{}'", key))?;
        }
        Ok(())
    }
}

/// Arquivo ausente → configuração padrão.
pub fn load_config(path: &Path) -> Result<AdvisorConfig> {
    if !path.exists() {
        log::info!("Sem arquivo de configuração em {:?}, usando padrões", path);
        return Ok(AdvisorConfig::default());
    }
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossível ler {:?}", path))?;
    let config: AdvisorConfig = serde_json::from_str(&json)
        .with_context(|| format!("Configuração inválida em {:?}", path))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AdvisorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.backtest_window, 10);
        assert!((config.pool_ratio - 0.65).abs() < 1e-12);
        assert_eq!(config.max_tickets, None);
    }

    #[test]
    fn test_every_lottery_has_a_source() {
        let config = AdvisorConfig::default();
        for lottery in Lottery::ALL {
            let url = config.source_url(lottery).unwrap();
            assert!(url.contains("output=csv"), "{}", url);
        }
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: AdvisorConfig = serde_json::from_str(r#"{"pool_ratio": 0.5, "long_shots": 0}"#).unwrap();
        assert!((config.pool_ratio - 0.5).abs() < 1e-12);
        assert_eq!(config.long_shots, 0);
        assert_eq!(config.markov_window, 100);
        assert_eq!(config.sources.len(), Lottery::ALL.len());
    }

    #[test]
    fn test_validate_rejects_bad_ratio() {
        let config = AdvisorConfig { pool_ratio: 1.5, ..AdvisorConfig::default() };
        assert!(config.validate().is_err());
        let config = AdvisorConfig { learning_step: 0.0, ..AdvisorConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_sigma() {
        for sigma in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = AdvisorConfig { sum_band_sigma: sigma, ..AdvisorConfig::default() };
            assert!(config.validate().is_err(), "sigma = {}", sigma);
        }
        let config = AdvisorConfig { max_tickets: Some(0), ..AdvisorConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_source() {
        let mut config = AdvisorConfig::default();
        config.sources.insert("euromillions".to_string(), "http://x".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_source_lookup_is_lenient() {
        let mut config = AdvisorConfig::default();
        config.sources.clear();
        config.sources.insert("Mega Sena".to_string(), "http://mega".to_string());
        assert_eq!(config.source_url(Lottery::MegaSena), Some("http://mega"));
        assert_eq!(config.source_url(Lottery::Quina), None);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.fractal_window, 100);
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fractalv.json");
        std::fs::write(&path, r#"{"backtest_window": 5, "max_tickets": 10}"#).unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.backtest_window, 5);
        assert_eq!(config.max_tickets, Some(10));
    }

    #[test]
    fn test_load_malformed_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fractalv.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(load_config(&path).is_err());
    }
}
