use anyhow::{bail, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lottery {
    Lotofacil,
    MegaSena,
    Quina,
    DiaDeSorte,
    Timemania,
    DuplaSena,
    Lotomania,
    MegaDaVirada,
}

impl Lottery {
    pub const ALL: [Lottery; 8] = [
        Lottery::Lotofacil,
        Lottery::MegaSena,
        Lottery::Quina,
        Lottery::DiaDeSorte,
        Lottery::Timemania,
        Lottery::DuplaSena,
        Lottery::Lotomania,
        Lottery::MegaDaVirada,
    ];

    /// Chave estável usada na config e no cache.
    pub fn key(&self) -> &'static str {
        match self {
            Lottery::Lotofacil => "lotofacil",
            Lottery::MegaSena => "mega_sena",
            Lottery::Quina => "quina",
            Lottery::DiaDeSorte => "dia_de_sorte",
            Lottery::Timemania => "timemania",
            Lottery::DuplaSena => "dupla_sena",
            Lottery::Lotomania => "lotomania",
            Lottery::MegaDaVirada => "mega_da_virada",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Lottery::Lotofacil => "Lotofácil",
            Lottery::MegaSena => "Mega Sena",
            Lottery::Quina => "Quina",
            Lottery::DiaDeSorte => "Dia de Sorte",
            Lottery::Timemania => "Timemania",
            Lottery::DuplaSena => "Dupla Sena",
            Lottery::Lotomania => "Lotomania",
            Lottery::MegaDaVirada => "Mega da Virada",
        }
    }

    /// Quantidade de dezenas do volante (1..=total).
    pub fn total(&self) -> usize {
        match self {
            Lottery::Lotofacil => 25,
            Lottery::MegaSena | Lottery::MegaDaVirada => 60,
            Lottery::Quina | Lottery::Timemania => 80,
            Lottery::DiaDeSorte => 31,
            Lottery::DuplaSena => 50,
            Lottery::Lotomania => 100,
        }
    }

    /// Dezenas marcadas numa aposta simples.
    pub fn pick(&self) -> usize {
        match self {
            Lottery::Lotofacil => 15,
            Lottery::MegaSena | Lottery::MegaDaVirada | Lottery::DuplaSena => 6,
            Lottery::Quina => 5,
            Lottery::DiaDeSorte => 7,
            Lottery::Timemania => 10,
            Lottery::Lotomania => 50,
        }
    }

    pub fn default_price_cents(&self) -> u64 {
        match self {
            Lottery::MegaSena | Lottery::MegaDaVirada => 500,
            Lottery::Timemania => 350,
            Lottery::Quina | Lottery::DiaDeSorte | Lottery::DuplaSena => 250,
            Lottery::Lotofacil | Lottery::Lotomania => 300,
        }
    }

    /// (dezenas por aposta, multiplicador do preço base), em ordem crescente.
    pub fn multipliers(&self) -> &'static [(usize, u64)] {
        match self {
            Lottery::MegaSena => &[(6, 1), (7, 7), (8, 28), (9, 84), (10, 210)],
            Lottery::MegaDaVirada | Lottery::DuplaSena => &[(6, 1), (7, 7), (8, 28), (9, 84)],
            Lottery::Lotofacil => &[(15, 1), (16, 16), (17, 136), (18, 816)],
            Lottery::Quina => &[(5, 1), (6, 6), (7, 21), (8, 56), (9, 126)],
            Lottery::DiaDeSorte => &[(7, 1), (8, 8), (9, 36), (10, 120)],
            Lottery::Timemania => &[(10, 1)],
            Lottery::Lotomania => &[(50, 1)],
        }
    }

    /// Índice estável para compor sementes.
    pub fn code(&self) -> u64 {
        Lottery::ALL.iter().position(|l| l == self).unwrap_or(0) as u64
    }

    /// Resolve "Mega_Sena", "mega sena", "MEGA-SENA", "Lotofácil"...
    pub fn from_name(name: &str) -> Result<Lottery> {
        let wanted = normalize_name(name);
        for lottery in Lottery::ALL {
            if normalize_name(lottery.key()) == wanted || normalize_name(lottery.label()) == wanted {
                return Ok(lottery);
            }
        }
        bail!("Loteria desconhecida: '{}'", name)
    }
}

impl std::fmt::Display for Lottery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Lottery {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Lottery::from_name(s)
    }
}

/// Minúsculas, sem acentos, sem espaços/underscores/hífens.
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => Some('a'),
            'é' | 'è' | 'ê' | 'ë' => Some('e'),
            'í' | 'ì' | 'î' | 'ï' => Some('i'),
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => Some('o'),
            'ú' | 'ù' | 'û' | 'ü' => Some('u'),
            'ç' => Some('c'),
            ' ' | '_' | '-' | '\t' => None,
            c => Some(c),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Draw {
    pub contest: u32,
    pub numbers: Vec<u8>,
}

impl Draw {
    pub fn contains(&self, n: u8) -> bool {
        self.numbers.contains(&n)
    }

    pub fn sum(&self) -> u32 {
        self.numbers.iter().map(|&n| n as u32).sum()
    }
}

#[derive(Debug, Clone)]
pub struct Combination {
    pub numbers: Vec<u8>,
    pub score: f64,
    pub entropy: f64,
}

pub fn validate_combination(numbers: &[u8], lottery: Lottery, size: usize) -> Result<()> {
    if numbers.len() != size {
        bail!("Esperadas {} dezenas, recebidas {}", size, numbers.len());
    }
    let total = lottery.total();
    for &n in numbers {
        if n < 1 || n as usize > total {
            bail!("Dezena {} fora do intervalo (1-{})", n, total);
        }
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                bail!("Dezena repetida: {}", numbers[i]);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_lenient() {
        assert_eq!(Lottery::from_name("Mega_Sena").unwrap(), Lottery::MegaSena);
        assert_eq!(Lottery::from_name("mega sena").unwrap(), Lottery::MegaSena);
        assert_eq!(Lottery::from_name("MEGA-SENA").unwrap(), Lottery::MegaSena);
        assert_eq!(Lottery::from_name("Lotofácil").unwrap(), Lottery::Lotofacil);
        assert_eq!(Lottery::from_name("lotofacil").unwrap(), Lottery::Lotofacil);
        assert_eq!(Lottery::from_name("Dia de Sorte").unwrap(), Lottery::DiaDeSorte);
        assert_eq!(Lottery::from_name("mega_da_virada").unwrap(), Lottery::MegaDaVirada);
    }

    #[test]
    fn test_from_name_unknown() {
        assert!(Lottery::from_name("EuroMillions").is_err());
        assert!("".parse::<Lottery>().is_err());
    }

    #[test]
    fn test_catalog_consistency() {
        for lottery in Lottery::ALL {
            assert!(lottery.pick() < lottery.total(), "{}", lottery);
            assert!(lottery.default_price_cents() > 0);
            let mults = lottery.multipliers();
            assert_eq!(mults[0], (lottery.pick(), 1), "{}", lottery);
            assert!(mults.windows(2).all(|w| w[0].0 < w[1].0 && w[0].1 < w[1].1));
        }
    }

    #[test]
    fn test_codes_are_distinct() {
        let codes: std::collections::HashSet<u64> = Lottery::ALL.iter().map(|l| l.code()).collect();
        assert_eq!(codes.len(), Lottery::ALL.len());
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Lotofácil "), "lotofacil");
        assert_eq!(normalize_name("Dupla_Sena"), "duplasena");
    }

    #[test]
    fn test_validate_combination_ok() {
        assert!(validate_combination(&[1, 2, 3, 4, 5, 60], Lottery::MegaSena, 6).is_ok());
    }

    #[test]
    fn test_validate_combination_out_of_range() {
        assert!(validate_combination(&[0, 2, 3, 4, 5, 6], Lottery::MegaSena, 6).is_err());
        assert!(validate_combination(&[1, 2, 3, 4, 5, 61], Lottery::MegaSena, 6).is_err());
    }

    #[test]
    fn test_validate_combination_duplicate() {
        assert!(validate_combination(&[1, 1, 3, 4, 5, 6], Lottery::MegaSena, 6).is_err());
    }

    #[test]
    fn test_validate_combination_wrong_size() {
        assert!(validate_combination(&[1, 2, 3, 4, 5], Lottery::MegaSena, 6).is_err());
    }

    #[test]
    fn test_draw_sum() {
        let draw = Draw { contest: 1, numbers: vec![1, 2, 3] };
        assert_eq!(draw.sum(), 6);
        assert!(draw.contains(2));
        assert!(!draw.contains(4));
    }
}
