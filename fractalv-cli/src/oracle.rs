use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use fractalv_db::models::{Combination, Lottery};
use fractalv_engine::config::AdvisorConfig;
use fractalv_engine::ensemble::memory::FamilyWeights;
use fractalv_engine::ensemble::Profile;
use fractalv_engine::hurst::Regime;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const PLACEHOLDER: &str = "Comentário da IA indisponível no momento.";

pub struct OracleContext<'a> {
    pub lottery: Lottery,
    pub profile: Profile,
    pub weights: &'a FamilyWeights,
    pub regime: Regime,
    pub hurst: f64,
    pub combinations: &'a [Combination],
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

pub fn build_prompt(ctx: &OracleContext) -> String {
    let games = ctx
        .combinations
        .iter()
        .take(3)
        .map(|c| {
            c.numbers
                .iter()
                .map(|n| format!("{:02}", n))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Atue como o sistema FractalV e analise estes palpites para {lottery}.\n\
         1. Estratégia ativa: {profile} ({description}).\n\
         2. Pesos aprendidos: Markov {m:.2} | Fractal {f:.2} | Gauss {g:.2}.\n\
         3. Regime da série (Hurst {h:.2}): {regime}.\n\
         4. Jogos gerados:\n{games}\n\n\
         Responda em português, em poucas frases:\n\
         - Por que esta estratégia faz sentido para o momento da série?\n\
         - Escreva uma frase curta e enigmática sobre a entropia destes números.",
        lottery = ctx.lottery,
        profile = ctx.profile,
        description = ctx.profile.description(),
        m = ctx.weights.markov,
        f = ctx.weights.fractal,
        g = ctx.weights.gauss,
        h = ctx.hurst,
        regime = ctx.regime,
    )
}

fn extract_text(response: GenerateResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .find_map(|p| p.text)
        .filter(|t| !t.trim().is_empty())
}

pub fn ask_gemini(client: &Client, config: &AdvisorConfig, api_key: &str, prompt: &str) -> Result<String> {
    let url = format!(
        "{}/{}:generateContent",
        config.gemini_endpoint.trim_end_matches('/'),
        config.gemini_model
    );
    let body = GenerateRequest {
        contents: vec![Content { parts: vec![Part { text: prompt }] }],
    };
    let response: GenerateResponse = client
        .post(&url)
        .query(&[("key", api_key)])
        .json(&body)
        .send()
        .with_context(|| format!("Falha ao contatar {}", config.gemini_model))?
        .error_for_status()
        .context("Gemini recusou a requisição")?
        .json()
        .context("Resposta do Gemini malformada")?;

    match extract_text(response) {
        Some(text) => Ok(text),
        None => bail!("Resposta do Gemini sem texto"),
    }
}

/// Nunca falha: sem chave ou com erro, devolve o texto padrão.
pub fn commentary(client: &Client, config: &AdvisorConfig, ctx: &OracleContext) -> String {
    let Ok(api_key) = std::env::var(API_KEY_VAR) else {
        log::warn!("{} não definida, comentário da IA ignorado", API_KEY_VAR);
        return PLACEHOLDER.to_string();
    };
    match ask_gemini(client, config, &api_key, &build_prompt(ctx)) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("IA indisponível: {:#}", e);
            PLACEHOLDER.to_string()
        }
    }
}
