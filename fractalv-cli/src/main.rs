mod connector;
mod display;
mod oracle;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;

use fractalv_db::db::{count_draws, fetch_history, fetch_last_draws, migrate, open_db};
use fractalv_db::models::{Combination, Draw, Lottery};
use fractalv_db::rusqlite::Connection;
use fractalv_engine::budget::{parse_brl, plan_budget, RiskProfile};
use fractalv_engine::config::{load_config, AdvisorConfig};
use fractalv_engine::ensemble::backtest::choose_strategy;
use fractalv_engine::ensemble::memory::{load_memory, save_memory, FamilyWeights};
use fractalv_engine::ensemble::{EnsembleScorer, Family};
use fractalv_engine::hurst::{hurst_exponent, Regime};
use fractalv_engine::models::recent_draws;
use fractalv_engine::sampler::{build_pool, decision_seed, generate_combinations, GenerationRequest};
use fractalv_engine::stats::{compute_stats, hot_numbers, overdue_numbers, sum_series};

use crate::display::{
    display_backtest, display_combinations, display_draws, display_lotteries, display_plan,
    display_score_chart, display_stats, display_strategy, display_sync_summary, display_weights,
};

#[derive(Parser)]
#[command(name = "fractalv", about = "Conselheiro de números para as loterias da Caixa")]
struct Cli {
    /// Arquivo de configuração JSON
    #[arg(long, global = true, default_value = "fractalv.json")]
    config: PathBuf,

    /// Logs detalhados (nível info)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Listar as loterias suportadas
    Lotteries,

    /// Baixar os históricos e gravar no cache local
    Sync {
        /// Loteria (todas se omitida)
        #[arg(short, long)]
        lottery: Option<Lottery>,
    },

    /// Mostrar os últimos concursos
    History {
        #[arg(short, long)]
        lottery: Lottery,

        /// Quantidade de concursos
        #[arg(short = 'n', long, default_value = "10")]
        last: usize,

        /// Ler do cache local em vez da planilha
        #[arg(long)]
        offline: bool,
    },

    /// Frequências, atrasos e regime de Hurst
    Stats {
        #[arg(short, long)]
        lottery: Lottery,

        /// Janela de análise (concursos)
        #[arg(short, long, default_value = "100")]
        window: usize,

        #[arg(long)]
        offline: bool,
    },

    /// Refazer os últimos concursos e atualizar a memória de pesos
    Backtest {
        #[arg(short, long)]
        lottery: Lottery,

        #[arg(long)]
        offline: bool,
    },

    /// Gerar volantes para um orçamento
    Advise {
        #[arg(short, long)]
        lottery: Lottery,

        /// Orçamento em reais ("50", "50,00", "R$ 1.234,50")
        #[arg(short, long)]
        budget: String,

        /// conservative | moderate | aggressive
        #[arg(short, long, default_value = "conservative")]
        risk: RiskProfile,

        /// Semente explícita (senão derivada da decisão)
        #[arg(long)]
        seed: Option<u64>,

        #[arg(long)]
        offline: bool,

        /// Pedir um comentário ao Gemini (GEMINI_API_KEY)
        #[arg(long)]
        ai: bool,

        /// Exibir o gráfico dos scores combinados
        #[arg(long)]
        chart: bool,
    },

    /// Mostrar ou reiniciar a memória de pesos
    Weights {
        #[arg(long)]
        reset: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = load_config(&cli.config)?;

    match cli.command {
        Command::Lotteries => {
            display_lotteries();
            Ok(())
        }
        Command::Sync { lottery } => cmd_sync(&config, lottery),
        Command::History { lottery, last, offline } => cmd_history(&config, lottery, last, offline),
        Command::Stats { lottery, window, offline } => cmd_stats(&config, lottery, window, offline),
        Command::Backtest { lottery, offline } => cmd_backtest(&config, lottery, offline),
        Command::Advise { lottery, budget, risk, seed, offline, ai, chart } => {
            let budget_cents = parse_brl(&budget)
                .with_context(|| format!("Orçamento inválido: '{}'", budget))?;
            let request = AdviseRequest { lottery, budget_cents, risk, seed, offline, ai, chart };
            cmd_advise(&config, &request)
        }
        Command::Weights { reset } => cmd_weights(&config, reset),
    }
}

fn open_cache(config: &AdvisorConfig) -> Result<Connection> {
    let conn = open_db(&config.cache_path)?;
    migrate(&conn)?;
    Ok(conn)
}

/// Planilha publicada (gravando no cache) ou, com `offline`, o cache local.
fn load_history(config: &AdvisorConfig, conn: &Connection, lottery: Lottery, offline: bool) -> Result<Vec<Draw>> {
    let draws = if offline {
        if count_draws(conn, lottery)? == 0 {
            bail!("Cache vazio para {}. Rode primeiro: fractalv sync --lottery {}", lottery, lottery.key());
        }
        fetch_history(conn, lottery)?
    } else {
        let client = connector::http_client()?;
        let draws = connector::fetch_history(&client, config, lottery)?;
        connector::store_draws(conn, lottery, &draws)?;
        draws
    };
    if draws.is_empty() {
        bail!("Nenhum concurso válido para {}", lottery);
    }
    Ok(draws)
}

fn progress_bar() -> Result<ProgressBar> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} Backtest [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    Ok(pb)
}

fn cmd_sync(config: &AdvisorConfig, lottery: Option<Lottery>) -> Result<()> {
    let conn = open_cache(config)?;
    let client = connector::http_client()?;
    let targets: Vec<Lottery> = match lottery {
        Some(l) => vec![l],
        None => Lottery::ALL.to_vec(),
    };

    let mut failures = 0;
    for lottery in targets {
        match connector::fetch_history(&client, config, lottery) {
            Ok(draws) => {
                let result = connector::store_draws(&conn, lottery, &draws)?;
                display_sync_summary(lottery, &result);
            }
            Err(e) => {
                failures += 1;
                eprintln!("Erro em {}: {:#}", lottery, e);
            }
        }
    }
    if failures > 0 && lottery.is_some() {
        bail!("Sincronização falhou");
    }
    Ok(())
}

fn cmd_history(config: &AdvisorConfig, lottery: Lottery, last: usize, offline: bool) -> Result<()> {
    let conn = open_cache(config)?;
    if offline {
        let draws = fetch_last_draws(&conn, lottery, last as u32)?;
        display_draws(lottery, &draws);
        return Ok(());
    }
    let history = load_history(config, &conn, lottery, false)?;
    let mut latest: Vec<Draw> = recent_draws(&history, last).to_vec();
    latest.reverse();
    display_draws(lottery, &latest);
    Ok(())
}

fn cmd_stats(config: &AdvisorConfig, lottery: Lottery, window: usize, offline: bool) -> Result<()> {
    let conn = open_cache(config)?;
    let history = load_history(config, &conn, lottery, offline)?;
    let slice = recent_draws(&history, window);
    let stats = compute_stats(slice, lottery);
    display_stats(lottery, &stats, slice.len());
    let pick = lottery.pick();
    println!("Quentes  : {:?}", hot_numbers(&stats, pick));
    println!("Atrasadas: {:?}", overdue_numbers(&stats, pick));

    let frequencies: Vec<f64> = stats.iter().map(|s| s.frequency as f64).collect();
    display_score_chart("Frequência por dezena", &frequencies);

    let h = hurst_exponent(&sum_series(&history));
    println!("Hurst das somas: {:.3} ({})", h, Regime::from_exponent(h));
    Ok(())
}

fn cmd_backtest(config: &AdvisorConfig, lottery: Lottery, offline: bool) -> Result<()> {
    let conn = open_cache(config)?;
    let history = load_history(config, &conn, lottery, offline)?;
    let mut memory = load_memory(&config.memory_path);

    let pb = progress_bar()?;
    let choice = choose_strategy(&history, lottery, config, &memory, &pb);
    let latest = history.last().map_or(0, |d| d.contest);
    display_strategy(lottery, latest, &choice);

    match &choice.report {
        Some(report) => {
            display_backtest(report);
            learn(config, &mut memory, report.best_family)?;
            display_weights(&memory);
        }
        None => println!("Histórico insuficiente para backtest; memória inalterada."),
    }
    Ok(())
}

fn learn(config: &AdvisorConfig, memory: &mut FamilyWeights, winner: Family) -> Result<()> {
    memory.reinforce(winner, config.learning_step);
    save_memory(memory, &config.memory_path)?;
    log::info!("Memória reforçada para {}: {:?}", winner, memory);
    Ok(())
}

struct AdviseRequest {
    lottery: Lottery,
    budget_cents: u64,
    risk: RiskProfile,
    seed: Option<u64>,
    offline: bool,
    ai: bool,
    chart: bool,
}

fn cmd_advise(config: &AdvisorConfig, req: &AdviseRequest) -> Result<()> {
    let lottery = req.lottery;
    let conn = open_cache(config)?;
    let history = load_history(config, &conn, lottery, req.offline)?;

    let price_cents = if req.offline {
        log::info!("Modo offline: preço de catálogo para {}", lottery);
        lottery.default_price_cents()
    } else {
        connector::fetch_price(&connector::http_client()?, config, lottery)
    };
    let plan = plan_budget(lottery, price_cents, req.budget_cents, req.risk, config.max_tickets)?;

    let mut memory = load_memory(&config.memory_path);
    let choice = choose_strategy(&history, lottery, config, &memory, &progress_bar()?);
    if let Some(report) = &choice.report {
        learn(config, &mut memory, report.best_family)?;
    }

    let scorer = EnsembleScorer::new(config.markov_window, config.fractal_window);
    let scores = scorer.score(&history, lottery);
    let weights = choice.profile.weights(&memory);
    let blended = scores.blend(&weights);

    let latest = history.last();
    let latest_contest = latest.map_or(0, |d| d.contest);
    let seed = req
        .seed
        .unwrap_or_else(|| decision_seed(lottery, latest_contest, choice.profile, plan.ticket_count()));
    log::info!("Semente {} para {} / {}", seed, lottery, choice.profile);

    let long_shots = if choice.profile.uses_long_shots() { config.long_shots } else { 0 };
    let mut all_combos: Vec<Combination> = Vec::new();

    display_strategy(lottery, latest_contest, &choice);
    display_plan(&plan);

    for line in &plan.lines {
        let pool = build_pool(&blended, scores.get(Family::Fractal), line.numbers, config.pool_ratio, long_shots);
        let combos = generate_combinations(&GenerationRequest {
            lottery,
            history: &history,
            blended: &blended,
            pool: &pool,
            size: line.numbers,
            count: line.quantity as usize,
            sum_band_sigma: config.sum_band_sigma,
            seed: seed ^ line.numbers as u64,
        })?;
        println!("\n🎲 {} volantes de {} dezenas\n", combos.len(), line.numbers);
        display_combinations(&combos, latest);
        all_combos.extend(combos);
    }

    if req.chart {
        display_score_chart("Score combinado por dezena", &blended);
    }

    if req.ai {
        all_combos.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        let ctx = oracle::OracleContext {
            lottery,
            profile: choice.profile,
            weights: &weights,
            regime: choice.regime,
            hurst: choice.hurst,
            combinations: &all_combos,
        };
        let text = oracle::commentary(&connector::http_client()?, config, &ctx);
        println!("\n🔮 Oráculo\n\n{text}");
    }
    Ok(())
}

fn cmd_weights(config: &AdvisorConfig, reset: bool) -> Result<()> {
    let path: &Path = &config.memory_path;
    let memory = if reset {
        let defaults = FamilyWeights::default();
        save_memory(&defaults, path)?;
        println!("Memória reiniciada em {}", path.display());
        defaults
    } else {
        load_memory(path)
    };
    display_weights(&memory);
    Ok(())
}
