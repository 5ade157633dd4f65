//! CSV lineup interchange.
//!
//! One row per lineup: a column per slot instance holding the player id,
//! then `total_salary`, `total_projection`, `primary_stack` and
//! `secondary_stack`. Reading a file back resolves ids against a catalog,
//! which is how exported lineups re-enter late swap.
//!
//! # Example
//!
//! ```
//! use rosterforge::export::{read_lineups, write_lineups};
//! use rosterforge_test::{mlb_catalog, mlb_stacked_rules, nyy_stack_lineup};
//!
//! let rules = mlb_stacked_rules();
//! let catalog = mlb_catalog();
//! let lineup = nyy_stack_lineup(&rules, &catalog);
//!
//! let mut buf = Vec::new();
//! write_lineups(&mut buf, &rules, &[lineup.clone()]).unwrap();
//! let back = read_lineups(buf.as_slice(), &rules, &catalog).unwrap();
//! assert_eq!(back, vec![lineup]);
//! ```

use std::fs::File;
use std::io;
use std::path::Path;

use rosterforge_config::SportRules;
use rosterforge_core::{
    DataQualityReport, Lineup, LineupEntry, PlayerCatalog, PlayerId, PlayerRecord, Result, RosterError,
    RosterSlot, SlotInstance, StackKey,
};
use tracing::{debug, info};

pub const SUMMARY_COLUMNS: [&str; 4] = ["total_salary", "total_projection", "primary_stack", "secondary_stack"];

fn interchange(err: csv::Error) -> RosterError {
    RosterError::Interchange(err.to_string())
}

/// Column names for the given rules.
pub fn header(rules: &SportRules) -> Vec<String> {
    RosterSlot::instances(&rules.slots)
        .map(|instance| instance.name)
        .chain(SUMMARY_COLUMNS.iter().map(|c| c.to_string()))
        .collect()
}

pub fn write_lineups<W: io::Write>(writer: W, rules: &SportRules, lineups: &[Lineup]) -> Result<()> {
    let columns = header(rules);
    let slots = columns.len() - SUMMARY_COLUMNS.len();
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(&columns).map_err(interchange)?;

    for (index, lineup) in lineups.iter().enumerate() {
        let row = lineup.to_row();
        if row.slots.len() != slots {
            return Err(RosterError::Interchange(format!(
                "lineup {index} has {} players for {slots} slots",
                row.slots.len()
            )));
        }
        let mut record: Vec<String> = row.slots.iter().map(|(_, id)| id.to_string()).collect();
        record.push(row.total_salary.to_string());
        record.push(format!("{:.2}", row.total_projection));
        record.push(row.primary_stack.unwrap_or_default());
        record.push(row.secondary_stack.unwrap_or_default());
        csv.write_record(&record).map_err(interchange)?;
    }
    csv.flush()?;
    debug!(event = "lineups_written", lineups = lineups.len());
    Ok(())
}

pub fn write_lineups_to_path(path: impl AsRef<Path>, rules: &SportRules, lineups: &[Lineup]) -> Result<()> {
    write_lineups(File::create(path)?, rules, lineups)
}

/// Reads exported lineups, resolving every id against `catalog`.
///
/// # Errors
///
/// `Interchange` when the header does not match the rules or a row is
/// malformed; `DataQuality` when a row names a player missing from the
/// catalog.
pub fn read_lineups<R: io::Read>(reader: R, rules: &SportRules, catalog: &PlayerCatalog) -> Result<Vec<Lineup>> {
    let expected = header(rules);
    let instances: Vec<SlotInstance> = RosterSlot::instances(&rules.slots).collect();
    let mut csv = csv::Reader::from_reader(reader);

    let headers = csv.headers().map_err(interchange)?;
    if headers.len() != expected.len() || headers.iter().zip(&expected).any(|(found, want)| found.trim() != want) {
        return Err(RosterError::Interchange(format!(
            "header does not match {} rules",
            rules.name
        )));
    }

    let mut lineups = Vec::new();
    for (row, record) in csv.records().enumerate() {
        let record = record.map_err(interchange)?;
        let mut entries = Vec::with_capacity(instances.len());
        for (column, instance) in instances.iter().enumerate() {
            let id = record.get(column).unwrap_or("").trim();
            let player = catalog.get(&PlayerId::new(id)).ok_or_else(|| {
                RosterError::DataQuality(format!("row {}: player {id:?} is not in the catalog", row + 1))
            })?;
            entries.push(LineupEntry {
                slot: instance.name.clone(),
                player: player.clone(),
            });
        }
        let label = |offset: usize| record.get(instances.len() + offset).and_then(StackKey::parse);
        lineups.push(Lineup::new(entries).with_stacks(label(2), label(3)));
    }
    debug!(event = "lineups_read", lineups = lineups.len());
    Ok(lineups)
}

pub fn read_lineups_from_path(
    path: impl AsRef<Path>,
    rules: &SportRules,
    catalog: &PlayerCatalog,
) -> Result<Vec<Lineup>> {
    read_lineups(File::open(path)?, rules, catalog)
}

/// Reads a player table. Column names follow [`PlayerRecord`]; unusable
/// rows are dropped and counted rather than failing the read.
pub fn read_players<R: io::Read>(reader: R) -> Result<(PlayerCatalog, DataQualityReport)> {
    let mut csv = csv::Reader::from_reader(reader);
    let records = csv
        .deserialize::<PlayerRecord>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(interchange)?;
    let (catalog, report) = PlayerCatalog::from_records(records);
    info!(
        event = "players_loaded",
        accepted = report.accepted,
        excluded = report.excluded_count(),
    );
    Ok((catalog, report))
}

pub fn read_players_from_path(path: impl AsRef<Path>) -> Result<(PlayerCatalog, DataQualityReport)> {
    read_players(File::open(path)?)
}

#[cfg(test)]
mod tests;
