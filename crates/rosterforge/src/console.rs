//! Colorful console output for optimizer events.
//!
//! Provides a custom `tracing` layer that formats RosterForge lifecycle
//! events with colors. Enabled with the `console` feature.

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::sync::OnceLock;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();

const DEFAULT_FILTER: &str = "rosterforge=info,rosterforge_lineup=info,rosterforge_swap=info";

/// Initializes console output.
///
/// Safe to call multiple times - only the first call has effect. `RUST_LOG`
/// overrides the default filter.
pub fn init() {
    INIT.get_or_init(|| {
        print_banner();

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(RosterConsoleLayer)
            .try_init();
    });
}

fn print_banner() {
    let version_line = format!("RosterForge v{} - DFS lineup optimizer", env!("CARGO_PKG_VERSION"));
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", version_line.bright_cyan().bold());
    let _ = stdout.flush();
}

/// A tracing layer that formats optimizer events with colors.
pub struct RosterConsoleLayer;

impl<S: Subscriber> Layer<S> for RosterConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with("rosterforge") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_event(*metadata.level(), &visitor);
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Default)]
struct EventVisitor {
    event: Option<String>,
    message: Option<String>,
    summary: Option<String>,
    reason: Option<String>,
    stage: Option<String>,
    primary_stack: Option<String>,
    attempt: Option<u64>,
    index: Option<u64>,
    requested: Option<u64>,
    max_attempts: Option<u64>,
    players: Option<u64>,
    salary: Option<u64>,
    objective: Option<i64>,
    lineup: Option<u64>,
    lineups: Option<u64>,
    unchanged: Option<u64>,
    locked: Option<u64>,
    repaired: Option<u64>,
    unrepairable: Option<u64>,
    elapsed_ms: Option<u64>,
}

impl EventVisitor {
    fn set_text(&mut self, name: &str, value: String) {
        match name {
            "event" => self.event = Some(value),
            "message" => self.message = Some(value),
            "summary" => self.summary = Some(value),
            "reason" | "error" | "violations" => self.reason = Some(value),
            "stage" => self.stage = Some(value),
            "primary_stack" => self.primary_stack = Some(value),
            _ => {}
        }
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value);
        self.set_text(field.name(), s.trim_matches('"').to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "attempt" => self.attempt = Some(value),
            "index" => self.index = Some(value),
            "requested" => self.requested = Some(value),
            "max_attempts" => self.max_attempts = Some(value),
            "players" => self.players = Some(value),
            "salary" => self.salary = Some(value),
            "lineup" => self.lineup = Some(value),
            "lineups" => self.lineups = Some(value),
            "unchanged" => self.unchanged = Some(value),
            "locked" => self.locked = Some(value),
            "repaired" => self.repaired = Some(value),
            "unrepairable" => self.unrepairable = Some(value),
            "elapsed_ms" => self.elapsed_ms = Some(value),
            "objective" => self.objective = Some(value as i64),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        if field.name() == "objective" {
            self.objective = Some(value);
        } else if value >= 0 {
            self.record_u64(field, value as u64);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.set_text(field.name(), value.to_string());
    }
}

fn format_event(level: Level, v: &EventVisitor) -> String {
    match v.event.as_deref() {
        Some("generation_start") => format_generation_start(v),
        Some("lineup_accepted") => format_lineup_accepted(v),
        Some("generation_finished") => format_summary("Generator", v),
        Some("late_swap_finished") => format_late_swap(v),
        _ if level <= Level::WARN => format_warning(level, v),
        _ => String::new(),
    }
}

fn format_generation_start(v: &EventVisitor) -> String {
    format!(
        "{} {} {} requesting {} lineups from {} players, at most {} attempts",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Generator]".bright_cyan(),
        v.requested.unwrap_or(0).to_formatted_string(&Locale::en).bright_yellow(),
        v.players.unwrap_or(0).to_formatted_string(&Locale::en).bright_yellow(),
        v.max_attempts.unwrap_or(0).to_formatted_string(&Locale::en).bright_yellow(),
    )
}

fn format_lineup_accepted(v: &EventVisitor) -> String {
    let stack = v.primary_stack.as_deref().unwrap_or("None");
    format!(
        "    {} Lineup {:>5} | attempt {:>6} | salary {:>8} | score {} | stack {}",
        "->".bright_blue(),
        (v.index.unwrap_or(0) + 1).to_formatted_string(&Locale::en).white(),
        v.attempt.unwrap_or(0).to_formatted_string(&Locale::en).white(),
        v.salary.unwrap_or(0).to_formatted_string(&Locale::en).yellow(),
        format_objective(v.objective.unwrap_or(0)),
        stack.bright_magenta(),
    )
}

fn format_summary(component: &str, v: &EventVisitor) -> String {
    let summary = v.summary.as_deref().unwrap_or("finished");
    let complete = summary.contains("completed");
    let colored = if complete {
        summary.bright_green().bold().to_string()
    } else {
        summary.bright_red().bold().to_string()
    };
    format!(
        "{} {} {} {}",
        timestamp().bright_black(),
        "INFO".bright_green(),
        format!("[{}]", component).bright_cyan(),
        colored
    )
}

fn format_late_swap(v: &EventVisitor) -> String {
    let unrepairable = v.unrepairable.unwrap_or(0);
    let unrepairable_text = unrepairable.to_formatted_string(&Locale::en);
    format!(
        "{} {} {} {} lineups: unchanged ({}), locked ({}), repaired ({}), unrepairable ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[LateSwap]".bright_cyan(),
        v.lineups.unwrap_or(0).to_formatted_string(&Locale::en).white().bold(),
        v.unchanged.unwrap_or(0).to_formatted_string(&Locale::en).white(),
        v.locked.unwrap_or(0).to_formatted_string(&Locale::en).yellow(),
        v.repaired.unwrap_or(0).to_formatted_string(&Locale::en).bright_green(),
        if unrepairable > 0 {
            unrepairable_text.bright_red().to_string()
        } else {
            unrepairable_text.white().to_string()
        },
    )
}

fn format_warning(level: Level, v: &EventVisitor) -> String {
    let tag = if level == Level::ERROR {
        "ERROR".bright_red().to_string()
    } else {
        "WARN".yellow().to_string()
    };
    let name = v.event.as_deref().or(v.message.as_deref()).unwrap_or("warning");
    let mut line = format!("{} {} {}", timestamp().bright_black(), tag, name.white().bold());
    if let Some(lineup) = v.lineup {
        line.push_str(&format!(" lineup {}", lineup));
    }
    if let Some(attempt) = v.attempt {
        line.push_str(&format!(" attempt {}", attempt));
    }
    if let Some(stage) = &v.stage {
        line.push_str(&format!(" stage {}", stage));
    }
    if let Some(ms) = v.elapsed_ms {
        line.push_str(&format!(" after {}", format_duration_ms(ms)));
    }
    if let Some(reason) = &v.reason {
        line.push_str(&format!(": {}", reason.bright_black()));
    }
    line
}

fn format_objective(objective: i64) -> String {
    // Objectives are projections scaled by 100.
    let points = objective as f64 / 100.0;
    format!("{:.2}", points).bright_green().to_string()
}

fn timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| {
            let secs = d.as_secs() % 100000;
            let millis = d.subsec_millis();
            format!("{:5}.{:03}", secs, millis)
        })
        .unwrap_or_else(|_| "    0.000".to_string())
}

fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        let mins = ms / 60_000;
        let secs = (ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_formatting() {
        assert_eq!(format_duration_ms(250), "250ms");
        assert_eq!(format_duration_ms(1500), "1.50s");
        assert_eq!(format_duration_ms(125_000), "2m 5s");
    }

    #[test]
    fn test_info_events_without_name_are_skipped() {
        let v = EventVisitor::default();
        assert!(format_event(Level::INFO, &v).is_empty());
        assert!(!format_event(Level::WARN, &v).is_empty());
    }

    #[test]
    fn test_accepted_lineup_line() {
        let v = EventVisitor {
            event: Some("lineup_accepted".to_string()),
            index: Some(0),
            attempt: Some(3),
            salary: Some(34800),
            objective: Some(8780),
            primary_stack: Some("NYY".to_string()),
            ..EventVisitor::default()
        };
        let line = format_event(Level::INFO, &v);
        assert!(line.contains("34,800"));
        assert!(line.contains("87.80"));
        assert!(line.contains("NYY"));
    }
}
