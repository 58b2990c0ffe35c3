use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

use crate::models::{Draw, Lottery};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    lottery   TEXT NOT NULL,
    contest   INTEGER NOT NULL,
    numbers   TEXT NOT NULL,
    PRIMARY KEY (lottery, contest)
);
";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("fractalv.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossível criar o diretório {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossível abrir a base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Falha na migração")?;
    Ok(())
}

fn encode_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join("-")
}

fn decode_numbers(raw: &str) -> Result<Vec<u8>> {
    raw.split('-')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u8>()
                .with_context(|| format!("Dezena inválida no cache: '{}'", s))
        })
        .collect()
}

pub fn insert_draw(conn: &Connection, lottery: Lottery, draw: &Draw) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (lottery, contest, numbers) VALUES (?1, ?2, ?3)",
        rusqlite::params![lottery.key(), draw.contest, encode_numbers(&draw.numbers)],
    ).context("Falha na inserção")?;
    Ok(changed > 0)
}

/// Os `limit` concursos mais recentes, do mais recente ao mais antigo.
pub fn fetch_last_draws(conn: &Connection, lottery: Lottery, limit: u32) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(
        "SELECT contest, numbers FROM draws WHERE lottery = ?1 ORDER BY contest DESC LIMIT ?2"
    )?;
    let rows = stmt.query_map(rusqlite::params![lottery.key(), limit], |row| {
        Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?))
    })?.collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(contest, raw)| Ok(Draw { contest, numbers: decode_numbers(&raw)? }))
        .collect()
}

/// Histórico completo em ordem cronológica (mais antigo primeiro).
pub fn fetch_history(conn: &Connection, lottery: Lottery) -> Result<Vec<Draw>> {
    let n = count_draws(conn, lottery)?;
    let mut draws = fetch_last_draws(conn, lottery, n)?;
    draws.reverse();
    Ok(draws)
}

pub fn count_draws(conn: &Connection, lottery: Lottery) -> Result<u32> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM draws WHERE lottery = ?1",
        [lottery.key()],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_draw(contest: u32) -> Draw {
        Draw {
            contest,
            numbers: vec![1, 2, 3, 4, 5, (contest % 50 + 6) as u8],
        }
    }

    #[test]
    fn test_insert_and_count() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(count_draws(&conn, Lottery::MegaSena).unwrap(), 0);

        insert_draw(&conn, Lottery::MegaSena, &test_draw(1)).unwrap();
        assert_eq!(count_draws(&conn, Lottery::MegaSena).unwrap(), 1);
        assert_eq!(count_draws(&conn, Lottery::Quina).unwrap(), 0);
    }

    #[test]
    fn test_duplicate_ignored() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        let inserted = insert_draw(&conn, Lottery::MegaSena, &test_draw(1)).unwrap();
        assert!(inserted);
        let inserted = insert_draw(&conn, Lottery::MegaSena, &test_draw(1)).unwrap();
        assert!(!inserted);
        assert_eq!(count_draws(&conn, Lottery::MegaSena).unwrap(), 1);
    }

    #[test]
    fn test_same_contest_different_lottery() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        assert!(insert_draw(&conn, Lottery::MegaSena, &test_draw(7)).unwrap());
        assert!(insert_draw(&conn, Lottery::Quina, &test_draw(7)).unwrap());
    }

    #[test]
    fn test_fetch_order() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        insert_draw(&conn, Lottery::MegaSena, &test_draw(1)).unwrap();
        insert_draw(&conn, Lottery::MegaSena, &test_draw(5)).unwrap();
        insert_draw(&conn, Lottery::MegaSena, &test_draw(3)).unwrap();

        let last = fetch_last_draws(&conn, Lottery::MegaSena, 10).unwrap();
        let contests: Vec<u32> = last.iter().map(|d| d.contest).collect();
        assert_eq!(contests, vec![5, 3, 1]);

        let history = fetch_history(&conn, Lottery::MegaSena).unwrap();
        let contests: Vec<u32> = history.iter().map(|d| d.contest).collect();
        assert_eq!(contests, vec![1, 3, 5]);
    }

    #[test]
    fn test_numbers_survive_storage() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        let draw = Draw { contest: 42, numbers: vec![4, 8, 15, 16, 23, 42] };
        insert_draw(&conn, Lottery::MegaSena, &draw).unwrap();
        let fetched = fetch_last_draws(&conn, Lottery::MegaSena, 1).unwrap();
        assert_eq!(fetched, vec![draw]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_numbers("1-x-3").is_err());
        assert_eq!(decode_numbers("").unwrap(), Vec::<u8>::new());
    }
}
