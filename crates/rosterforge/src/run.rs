//! Entry points that wire configuration, generation and late swap together.

use std::path::Path;

use rosterforge_config::OptimizerConfig;
use rosterforge_core::{Lineup, PlayerCatalog, Result};
use rosterforge_lineup::{GenerationReport, LineupGenerator};
use rosterforge_swap::{LateSwapEngine, LateSwapReport};
use tracing::info;

use crate::export;

/// Generates lineups for `config` from `catalog`.
pub fn generate_lineups(config: &OptimizerConfig, catalog: &PlayerCatalog) -> Result<GenerationReport> {
    LineupGenerator::new(config, catalog).generate()
}

/// Repairs `lineups` against a refreshed `catalog` using the configured
/// strategy chain.
pub fn late_swap(config: &OptimizerConfig, lineups: &[Lineup], catalog: &PlayerCatalog) -> LateSwapReport {
    LateSwapEngine::from_config(config).repair_all(lineups, catalog)
}

/// Loads a TOML configuration and a player table, generates lineups and
/// writes them as CSV to `output`.
pub fn generate_files(
    config_path: impl AsRef<Path>,
    players_path: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<GenerationReport> {
    let config = OptimizerConfig::load(config_path)?;
    let (catalog, _) = export::read_players_from_path(players_path)?;
    let report = generate_lineups(&config, &catalog)?;
    export::write_lineups_to_path(&output, &config.sport, &report.lineups)?;
    info!(
        event = "lineups_exported",
        lineups = report.lineups.len(),
        path = %output.as_ref().display(),
    );
    Ok(report)
}

/// Reads exported lineups, repairs them against a refreshed player table
/// and writes the repaired set to `output`.
pub fn late_swap_files(
    config_path: impl AsRef<Path>,
    players_path: impl AsRef<Path>,
    lineups_path: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<LateSwapReport> {
    let config = OptimizerConfig::load(config_path)?;
    let (catalog, _) = export::read_players_from_path(players_path)?;
    let lineups = export::read_lineups_from_path(lineups_path, &config.sport, &catalog)?;
    let report = late_swap(&config, &lineups, &catalog);
    export::write_lineups_to_path(&output, &config.sport, &report.lineups)?;
    info!(
        event = "lineups_exported",
        lineups = report.lineups.len(),
        path = %output.as_ref().display(),
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosterforge_swap::RepairStatus;
    use rosterforge_test::{mlb_catalog, mlb_players, mlb_stacked_rules, nyy_stack_lineup, stack_catalog, stack_rules};

    #[test]
    fn test_generate_lineups() {
        let config = OptimizerConfig::new(stack_rules())
            .with_lineup_count(2)
            .with_similarity_threshold(4)
            .with_time_limit_ms(20_000)
            .with_workers(1);

        let report = generate_lineups(&config, &stack_catalog()).unwrap();
        assert_eq!(report.lineups.len(), 2);
        assert_ne!(report.lineups[0], report.lineups[1]);
    }

    #[test]
    fn test_late_swap_replaces_scratch() {
        let config = OptimizerConfig::new(mlb_stacked_rules()).with_time_limit_ms(20_000).with_workers(1);
        let lineup = nyy_stack_lineup(&config.sport, &mlb_catalog());
        let players = mlb_players()
            .into_iter()
            .map(|p| if p.id.as_str() == "h01" { p.inactive() } else { p })
            .collect();
        let refreshed = PlayerCatalog::new(players).unwrap();

        let report = late_swap(&config, &[lineup], &refreshed);
        assert_eq!(report.outcomes[0].status, RepairStatus::Repaired);
        assert!(report.lineups[0].players().all(|p| p.active));
    }
}
