use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

use fractalv_db::models::Lottery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RiskProfile {
    #[default]
    Conservative,
    Moderate,
    Aggressive,
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskProfile::Conservative => "conservador",
            RiskProfile::Moderate => "moderado",
            RiskProfile::Aggressive => "agressivo",
        };
        write!(f, "{s}")
    }
}

impl FromStr for RiskProfile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "conservative" | "conservador" => Ok(RiskProfile::Conservative),
            "moderate" | "moderado" => Ok(RiskProfile::Moderate),
            "aggressive" | "agressivo" => Ok(RiskProfile::Aggressive),
            other => bail!("Perfil de risco desconhecido: '{}'", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanLine {
    /// Dezenas marcadas por volante.
    pub numbers: usize,
    pub quantity: u64,
    pub unit_cents: u64,
}

impl PlanLine {
    pub fn total_cents(&self) -> u64 {
        self.quantity * self.unit_cents
    }
}

#[derive(Debug, Clone)]
pub struct BudgetPlan {
    pub lottery: Lottery,
    pub risk: RiskProfile,
    pub price_cents: u64,
    pub budget_cents: u64,
    pub lines: Vec<PlanLine>,
    pub change_cents: u64,
}

impl BudgetPlan {
    pub fn ticket_count(&self) -> u64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn spent_cents(&self) -> u64 {
        self.lines.iter().map(PlanLine::total_cents).sum()
    }
}

/// Volantes simples e troco.
pub fn ticket_count(budget_cents: u64, price_cents: u64) -> Result<(u64, u64)> {
    if price_cents == 0 {
        bail!("Preço do volante inválido (zero)");
    }
    if budget_cents < price_cents {
        bail!(
            "Orçamento insuficiente: {} < preço do volante {}",
            format_brl(budget_cents),
            format_brl(price_cents)
        );
    }
    let count = budget_cents / price_cents;
    Ok((count, budget_cents - count * price_cents))
}

/// Faixas (dezenas, custo unitário) da maior para a menor.
/// Faixas cujo custo não cabe em u64 ficam de fora.
fn tiers(lottery: Lottery, price_cents: u64) -> Vec<(usize, u64)> {
    let mut tiers: Vec<(usize, u64)> = lottery
        .multipliers()
        .iter()
        .filter_map(|&(numbers, factor)| Some((numbers, price_cents.checked_mul(factor)?)))
        .collect();
    tiers.sort_by(|a, b| b.0.cmp(&a.0));
    tiers
}

pub fn plan_budget(
    lottery: Lottery,
    price_cents: u64,
    budget_cents: u64,
    risk: RiskProfile,
    max_tickets: Option<u64>,
) -> Result<BudgetPlan> {
    ticket_count(budget_cents, price_cents)?;

    let pick = lottery.pick();
    let mut remaining = budget_cents;
    let mut lines: Vec<PlanLine> = Vec::new();

    match risk {
        RiskProfile::Conservative => {}
        RiskProfile::Moderate => {
            if let Some(&(numbers, cost)) = tiers(lottery, price_cents)
                .iter()
                .find(|&&(n, cost)| n > pick && cost <= remaining)
            {
                lines.push(PlanLine { numbers, quantity: 1, unit_cents: cost });
                remaining -= cost;
            }
        }
        RiskProfile::Aggressive => {
            for (numbers, cost) in tiers(lottery, price_cents) {
                if numbers > pick && cost <= remaining {
                    let quantity = remaining / cost;
                    lines.push(PlanLine { numbers, quantity, unit_cents: cost });
                    remaining -= quantity * cost;
                }
            }
        }
    }

    let simple = remaining / price_cents;
    if simple > 0 {
        lines.push(PlanLine { numbers: pick, quantity: simple, unit_cents: price_cents });
    }

    // Limite opcional de volantes: o excedente vira troco
    if let Some(max_tickets) = max_tickets {
        let mut allowed = max_tickets;
        for line in lines.iter_mut() {
            if line.quantity > allowed {
                log::info!(
                    "Limite de {} volantes atingido, {} volantes de {} dezenas descartados",
                    max_tickets,
                    line.quantity - allowed,
                    line.numbers
                );
                line.quantity = allowed;
            }
            allowed -= line.quantity;
        }
        lines.retain(|l| l.quantity > 0);
    }

    let spent: u64 = lines.iter().map(PlanLine::total_cents).sum();
    Ok(BudgetPlan {
        lottery,
        risk,
        price_cents,
        budget_cents,
        lines,
        change_cents: budget_cents - spent,
    })
}

/// Aceita "50", "50,00", "R$ 1.234,50", "12.5".
pub fn parse_brl(input: &str) -> Result<u64> {
    let cleaned: String = input
        .replace("R$", "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        bail!("Valor vazio");
    }

    let decimal = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else if cleaned.matches('.').count() == 1
        && cleaned.rsplit('.').next().map_or(false, |frac| frac.len() <= 2)
    {
        cleaned
    } else {
        cleaned.replace('.', "")
    };

    let (int_part, frac_part) = match decimal.split_once('.') {
        Some((i, f)) => (i, f),
        None => (decimal.as_str(), ""),
    };
    if frac_part.len() > 2 || !frac_part.chars().all(|c| c.is_ascii_digit()) {
        bail!("Valor monetário inválido: '{}'", input);
    }
    let reais: u64 = if int_part.is_empty() {
        0
    } else {
        int_part
            .parse()
            .with_context(|| format!("Valor monetário inválido: '{}'", input))?
    };
    let cents: u64 = match frac_part.len() {
        0 => 0,
        1 => frac_part.parse::<u64>()? * 10,
        _ => frac_part.parse::<u64>()?,
    };
    match reais.checked_mul(100).and_then(|c| c.checked_add(cents)) {
        Some(total) => Ok(total),
        None => bail!("Valor monetário fora do intervalo: '{}'", input),
    }
}

pub fn format_brl(cents: u64) -> String {
    let reais = cents / 100;
    let digits = reais.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    format!("R$ {},{:02}", grouped, cents % 100)
}
