use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use textplots::Plot;

use fractalv_db::models::{Combination, Draw, Lottery};
use fractalv_engine::budget::{format_brl, BudgetPlan};
use fractalv_engine::ensemble::backtest::{BacktestReport, StrategyChoice};
use fractalv_engine::ensemble::memory::FamilyWeights;
use fractalv_engine::ensemble::Family;
use fractalv_engine::stats::NumberStats;

use crate::connector::SyncResult;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn join_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:02}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

pub fn display_lotteries() {
    let mut table = new_table();
    table.set_header(vec!["Chave", "Loteria", "Universo", "Dezenas", "Preço", "Desdobramentos"]);
    for lottery in Lottery::ALL {
        let tiers = lottery
            .multipliers()
            .iter()
            .map(|(n, f)| format!("{n}→×{f}"))
            .collect::<Vec<_>>()
            .join("  ");
        table.add_row(vec![
            lottery.key().to_string(),
            lottery.label().to_string(),
            lottery.total().to_string(),
            lottery.pick().to_string(),
            format_brl(lottery.default_price_cents()),
            tiers,
        ]);
    }
    println!("{table}");
}

pub fn display_sync_summary(lottery: Lottery, result: &SyncResult) {
    println!("Sincronização de {lottery}:");
    println!("  Concursos lidos     : {}", result.total);
    println!("  Novos no cache      : {}", result.inserted);
    println!("  Já existentes       : {}", result.skipped);
}

/// `draws` do mais recente ao mais antigo.
pub fn display_draws(lottery: Lottery, draws: &[Draw]) {
    if draws.is_empty() {
        println!("Nenhum concurso de {lottery} para exibir.");
        return;
    }
    let mut table = new_table();
    table.set_header(vec!["Concurso", "Dezenas", "Soma"]);
    for draw in draws {
        table.add_row(vec![
            draw.contest.to_string(),
            join_numbers(&draw.numbers),
            draw.sum().to_string(),
        ]);
    }
    println!("{table}");
}

pub fn display_stats(lottery: Lottery, stats: &[NumberStats], window: usize) {
    println!("\n📊 {lottery}: estatísticas dos últimos {window} concursos\n");

    let mut table = new_table();
    table.set_header(vec!["Dezena", "Frequência", "Atraso"]);

    let mut sorted = stats.to_vec();
    sorted.sort_by(|a, b| b.frequency.cmp(&a.frequency).then(a.number.cmp(&b.number)));

    for stat in &sorted {
        table.add_row(vec![
            format!("{:02}", stat.number),
            stat.frequency.to_string(),
            stat.gap.to_string(),
        ]);
    }
    println!("{table}");
}

/// Barras de um vetor indexado por dezena (índice 0 ↔ dezena 1).
pub fn display_score_chart(title: &str, values: &[f64]) {
    if values.is_empty() {
        return;
    }
    println!("\n{title}\n");
    let points: Vec<(f32, f32)> = values
        .iter()
        .enumerate()
        .map(|(i, &v)| ((i + 1) as f32, v as f32))
        .collect();
    let x_max = values.len() as f32 + 1.0;
    let width = (values.len() as u32 * 2).clamp(60, 200);
    let shape = textplots::Shape::Bars(&points);
    let mut chart = textplots::Chart::new(width, 40, 0.0, x_max);
    println!("{}", chart.lineplot(&shape));
}

pub fn display_weights(weights: &FamilyWeights) {
    println!("\n🧬 Memória de pesos\n");
    let mut table = new_table();
    table.set_header(vec!["Família", "Peso", "Contribuição"]);
    for family in Family::ALL {
        let w = weights.get(family);
        let bar = "█".repeat((w * 30.0).round() as usize);
        table.add_row(vec![family.to_string(), format!("{:.4}", w), bar]);
    }
    println!("{table}");
}

pub fn display_backtest(report: &BacktestReport) {
    println!("\n🔁 Backtest sobre {} concursos\n", report.tested);

    let mut table = new_table();
    table.set_header(vec!["Família", "Acertos", "Média"]);
    for &(family, hits) in &report.family_hits {
        let cell = Cell::new(family.to_string());
        let cell = if family == report.best_family { cell.fg(Color::Green) } else { cell };
        table.add_row(vec![
            cell,
            Cell::new(hits),
            Cell::new(format!("{:.2}", hits as f64 / report.tested.max(1) as f64)),
        ]);
    }
    println!("{table}");

    let mut table = new_table();
    table.set_header(vec!["Perfil", "Acertos", "Média"]);
    for &(profile, hits) in &report.profile_hits {
        let cell = Cell::new(profile.to_string());
        let cell = if profile == report.best_profile { cell.fg(Color::Green) } else { cell };
        table.add_row(vec![
            cell,
            Cell::new(hits),
            Cell::new(format!("{:.2}", hits as f64 / report.tested.max(1) as f64)),
        ]);
    }
    println!("{table}");
}

pub fn display_strategy(lottery: Lottery, latest_contest: u32, choice: &StrategyChoice) {
    println!("\n🧠 {lottery} (último concurso {latest_contest})");
    println!("  Estratégia : {} ({})", choice.profile, choice.profile.description());
    println!("  Hurst      : {:.3} ({})", choice.hurst, choice.regime);
    match &choice.report {
        Some(report) => println!("  Desempenho : {:.1} acertos médios em {} concursos", report.mean_hits(), report.tested),
        None => println!("  Desempenho : histórico curto, estratégia escolhida pelo regime"),
    }
}

pub fn display_plan(plan: &BudgetPlan) {
    println!("\n💰 Orçamento {} (perfil {})\n", format_brl(plan.budget_cents), plan.risk);
    let mut table = new_table();
    table.set_header(vec!["Dezenas", "Volantes", "Custo unitário", "Total"]);
    for line in &plan.lines {
        let kind = if line.numbers > plan.lottery.pick() { " (desdobramento)" } else { "" };
        table.add_row(vec![
            format!("{}{}", line.numbers, kind),
            line.quantity.to_string(),
            format_brl(line.unit_cents),
            format_brl(line.total_cents()),
        ]);
    }
    println!("{table}");
    println!("  Investido : {}", format_brl(plan.spent_cents()));
    println!("  Troco     : {}", format_brl(plan.change_cents));
}

/// Dezenas repetidas do último concurso em verde.
pub fn display_combinations(combos: &[Combination], latest: Option<&Draw>) {
    if combos.is_empty() {
        println!("Nenhum volante gerado.");
        return;
    }
    let mut table = new_table();
    let size = combos[0].numbers.len();
    let mut header = vec!["#".to_string()];
    header.extend((1..=size).map(|i| format!("D{i}")));
    header.push("Score".to_string());
    header.push("Entropia".to_string());
    table.set_header(header);

    for (i, combo) in combos.iter().enumerate() {
        let mut row = vec![Cell::new(i + 1)];
        for &n in &combo.numbers {
            let cell = Cell::new(format!("{:02}", n));
            let repeated = latest.is_some_and(|d| d.contains(n));
            row.push(if repeated { cell.fg(Color::Green) } else { cell.fg(Color::Cyan) });
        }
        row.push(Cell::new(format!("{:.4}", combo.score)));
        row.push(Cell::new(format!("{:.2}", combo.entropy)));
        table.add_row(row);
    }
    println!("{table}");
}
