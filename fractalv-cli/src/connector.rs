use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;

use fractalv_db::db::insert_draw;
use fractalv_db::models::{normalize_name, Draw, Lottery};
use fractalv_db::rusqlite::Connection;
use fractalv_engine::budget::parse_brl;
use fractalv_engine::config::AdvisorConfig;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("Impossível criar o cliente HTTP")
}

/// Acrescenta `v=<segundos>` para contornar o cache da planilha publicada.
pub fn cache_busted(url: &str, unix_seconds: i64) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}v={unix_seconds}")
}

fn fetch_text(client: &Client, url: &str) -> Result<String> {
    let url = cache_busted(url, chrono::Utc::now().timestamp());
    log::debug!("GET {}", url);
    let response = client
        .get(&url)
        .send()
        .with_context(|| format!("Falha ao baixar {}", url))?
        .error_for_status()
        .with_context(|| format!("Resposta HTTP inválida para {}", url))?;
    response.text().context("Corpo da resposta ilegível")
}

/// Inteiro tolerante: "12", " 12 ", "12.0", "2.700" (milhar pt-BR).
fn parse_int(cell: &str) -> Option<u32> {
    let cell = cell.trim();
    if let Ok(n) = cell.parse::<u32>() {
        return Some(n);
    }
    let mut groups = cell.split('.');
    let grouped = !cell.contains(',')
        && groups.next().is_some_and(|g| (1..=3).contains(&g.len()))
        && cell.contains('.')
        && groups.all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()));
    if grouped {
        return cell.replace('.', "").parse::<u32>().ok();
    }
    let f = cell.replace(',', ".").parse::<f64>().ok()?;
    (f.fract() == 0.0 && f >= 0.0 && f <= u32::MAX as f64).then_some(f as u32)
}

fn is_number_column(header: &str) -> bool {
    let h = header.trim().to_uppercase();
    !h.starts_with("DATA") && (h.starts_with('D') || h.contains("BOLA"))
}

/// Histórico do CSV publicado, do concurso mais antigo ao mais recente.
pub fn parse_history(text: &str, lottery: Lottery) -> Result<Vec<Draw>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers().context("Cabeçalho CSV ilegível")?.clone();
    let Some(contest_col) = headers
        .iter()
        .position(|h| h.to_lowercase().contains("concurso"))
    else {
        bail!("Coluna 'Concurso' ausente no CSV de {}", lottery);
    };
    let number_cols: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|&(i, h)| i != contest_col && is_number_column(h))
        .map(|(i, _)| i)
        .collect();
    log::debug!("{}: colunas de dezenas {:?}", lottery, number_cols);

    let total = lottery.total() as u32;
    let mut by_contest: BTreeMap<u32, Vec<u8>> = BTreeMap::new();
    let mut dropped = 0u32;

    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                log::debug!("Linha {} ignorada: {}", line + 2, e);
                dropped += 1;
                continue;
            }
        };
        let Some(contest) = record.get(contest_col).and_then(parse_int) else {
            dropped += 1;
            continue;
        };
        let mut numbers: Vec<u8> = number_cols
            .iter()
            .filter_map(|&i| record.get(i).and_then(parse_int))
            .filter(|&n| n >= 1 && n <= total)
            .map(|n| n as u8)
            .collect();
        numbers.sort_unstable();
        numbers.dedup();
        if numbers.is_empty() {
            dropped += 1;
            continue;
        }
        by_contest.insert(contest, numbers);
    }

    if dropped > 0 {
        log::info!("{}: {} linhas descartadas", lottery, dropped);
    }

    Ok(by_contest
        .into_iter()
        .map(|(contest, numbers)| Draw { contest, numbers })
        .collect())
}

/// Preço em centavos na tabela de preços, se houver linha compatível.
pub fn parse_price_table(text: &str, lottery: Lottery) -> Option<u64> {
    let target = normalize_name(lottery.label());
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    reader.records().filter_map(|r| r.ok()).find_map(|record| {
        let name = normalize_name(record.get(0)?);
        if name.is_empty() || !(name.contains(&target) || target.contains(&name)) {
            return None;
        }
        parse_brl(record.get(1)?).ok().filter(|&cents| cents > 0)
    })
}

pub fn fetch_history(client: &Client, config: &AdvisorConfig, lottery: Lottery) -> Result<Vec<Draw>> {
    let Some(url) = config.source_url(lottery) else {
        bail!("Nenhuma fonte configurada para {}", lottery);
    };
    let text = fetch_text(client, url)?;
    let draws = parse_history(&text, lottery)?;
    log::info!("{}: {} concursos baixados", lottery, draws.len());
    Ok(draws)
}

/// Preço atual em centavos; qualquer falha cai no preço de catálogo.
pub fn fetch_price(client: &Client, config: &AdvisorConfig, lottery: Lottery) -> u64 {
    let fallback = lottery.default_price_cents();
    match fetch_text(client, &config.prices_url) {
        Ok(text) => parse_price_table(&text, lottery).unwrap_or_else(|| {
            log::warn!("{} ausente da tabela de preços, usando o preço de catálogo", lottery);
            fallback
        }),
        Err(e) => {
            log::warn!("Tabela de preços indisponível ({:#}), usando o preço de catálogo", e);
            fallback
        }
    }
}

pub struct SyncResult {
    pub total: u32,
    pub inserted: u32,
    pub skipped: u32,
}

/// Grava os concursos no cache local (INSERT OR IGNORE).
pub fn store_draws(conn: &Connection, lottery: Lottery, draws: &[Draw]) -> Result<SyncResult> {
    let tx = conn
        .unchecked_transaction()
        .context("Impossível iniciar a transação")?;
    let mut result = SyncResult { total: 0, inserted: 0, skipped: 0 };
    for draw in draws {
        result.total += 1;
        if insert_draw(&tx, lottery, draw)? {
            result.inserted += 1;
        } else {
            result.skipped += 1;
        }
    }
    tx.commit().context("Falha no commit")?;
    Ok(result)
}
