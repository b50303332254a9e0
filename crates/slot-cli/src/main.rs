//! `slots` CLI — compute bookable appointment slots from calendar events.
//!
//! ## Usage
//!
//! ```sh
//! # Slots for a week, events from a Google Calendar export (stdin → stdout)
//! slots compute --from 2026-01-12 --to 2026-01-18 < events.json
//!
//! # Same, grouped by date, with a custom policy file
//! slots compute -i events.json --policy clinic.json --from 2026-01-12 --to 2026-01-18 --group
//!
//! # Ignore "DISPONIBLE" events and open the policy's working hours instead
//! slots compute -i events.json --from 2026-01-12 --to 2026-01-18 --working-hours
//!
//! # Is 19:00-20:00 still free? (exit code 1 if not)
//! slots check -i events.json --date 2026-01-12 --start 19:00 --end 20:00
//!
//! # Print the effective policy
//! slots policy --policy clinic.json
//! ```
//!
//! Set `RUST_LOG=slot_engine=debug` to see per-run slot statistics on stderr.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use slot_engine::{
    calculate_available_slots, group_slots_by_date, is_slot_available, normalize_events,
    parse_calendar_json, AvailabilityMode, PolicyConfig, Slot, SlotRequest, WorkingHoursPolicy,
};
use std::collections::BTreeMap;
use std::io::{self, Read};
use std::process;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "slots",
    version,
    about = "Bookable appointment slots from calendar events"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute bookable slots between two dates (inclusive)
    Compute {
        /// Calendar events JSON (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// First date of the query (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,
        /// Last date of the query (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,
        /// Emit slots grouped by date with the list of available dates
        #[arg(long)]
        group: bool,
        /// Do not clamp the query to today..today+max_advance_days
        #[arg(long)]
        no_horizon: bool,
        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Check whether one slot is still bookable (exit code 1 if not)
    Check {
        /// Calendar events JSON (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Slot date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// Slot start (HH:MM)
        #[arg(long, value_parser = parse_hhmm)]
        start: NaiveTime,
        /// Slot end (HH:MM)
        #[arg(long, value_parser = parse_hhmm)]
        end: NaiveTime,
        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Print the effective, validated policy as JSON
    Policy {
        #[command(flatten)]
        policy: PolicyArgs,
    },
}

/// Policy source, per-field overrides and the clock, shared by every subcommand.
#[derive(Args)]
struct PolicyArgs {
    /// Policy JSON file (clinic default if omitted)
    #[arg(long)]
    policy: Option<String>,
    /// Override the policy timezone (IANA name)
    #[arg(long)]
    timezone: Option<String>,
    /// Override the slot length in minutes
    #[arg(long)]
    slot_minutes: Option<i64>,
    /// Override the minimum notice in minutes
    #[arg(long)]
    min_advance: Option<i64>,
    /// Synthesise availability from working hours instead of "DISPONIBLE" events
    #[arg(long)]
    working_hours: bool,
    /// Current time as RFC 3339 (defaults to the system clock)
    #[arg(long)]
    now: Option<DateTime<Utc>>,
}

impl PolicyArgs {
    fn load(&self) -> Result<WorkingHoursPolicy> {
        let mut config = match self.policy.as_deref() {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read policy file: {}", path))?;
                serde_json::from_str::<PolicyConfig>(&raw)
                    .with_context(|| format!("Failed to parse policy file: {}", path))?
            }
            None => PolicyConfig::clinic_default(),
        };

        if let Some(tz) = &self.timezone {
            config.timezone = tz.clone();
        }
        if let Some(minutes) = self.slot_minutes {
            config.slot_duration_minutes = minutes;
        }
        if let Some(minutes) = self.min_advance {
            config.min_advance_minutes = minutes;
        }
        if self.working_hours {
            config.mode = AvailabilityMode::WorkingHours;
        }

        WorkingHoursPolicy::new(config).context("Invalid policy")
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GroupedSlots {
    slots: Vec<Slot>,
    slots_by_date: BTreeMap<NaiveDate, Vec<Slot>>,
    available_dates: Vec<NaiveDate>,
    next_slot: Option<Slot>,
}

#[derive(Serialize)]
struct CheckResult {
    available: bool,
    reason: Option<&'static str>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compute {
            input,
            output,
            from,
            to,
            group,
            no_horizon,
            policy,
        } => {
            let now = policy.now();
            let policy = policy.load()?;
            let slots = compute_slots(input.as_deref(), from, to, no_horizon, &policy, now)?;

            let json = if group {
                let grouped = GroupedSlots {
                    slots_by_date: group_slots_by_date(&slots),
                    available_dates: slot_engine::available_dates(&slots),
                    next_slot: slot_engine::next_available_slot(&slots).cloned(),
                    slots,
                };
                serde_json::to_string_pretty(&grouped)?
            } else {
                serde_json::to_string_pretty(&slots)?
            };

            write_output(output.as_deref(), &json)?;
        }
        Commands::Check {
            input,
            date,
            start,
            end,
            policy,
        } => {
            let now = policy.now();
            let policy = policy.load()?;
            let slots = compute_slots(input.as_deref(), date, date, false, &policy, now)?;
            let request = SlotRequest::new(date, start, end);

            let available = is_slot_available(&slots, &request);
            let result = CheckResult {
                available,
                reason: (!available).then_some("slot already booked or not available"),
            };
            println!("{}", serde_json::to_string(&result)?);

            if !available {
                process::exit(1);
            }
        }
        Commands::Policy { policy } => {
            let policy = policy.load()?;
            let json = serde_json::to_string_pretty(&PolicyConfig::from(&policy))?;
            println!("{}", json);
        }
    }

    Ok(())
}

/// Read events, normalize them under `policy` and run the calculator.
fn compute_slots(
    input: Option<&str>,
    from: NaiveDate,
    to: NaiveDate,
    no_horizon: bool,
    policy: &WorkingHoursPolicy,
    now: DateTime<Utc>,
) -> Result<Vec<Slot>> {
    let raw = read_input(input)?;
    let events = parse_calendar_json(&raw).context("Failed to parse calendar events")?;
    let events = normalize_events(&events, policy).context("Failed to normalize calendar events")?;

    let range = if no_horizon {
        Some((from, to))
    } else {
        policy.clamp_query(from, to, now)
    };

    let Some((from, to)) = range else {
        debug!(%from, %to, "query outside booking horizon");
        return Ok(Vec::new());
    };

    Ok(calculate_available_slots(from, to, &events, policy, now))
}

fn parse_hhmm(raw: &str) -> std::result::Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw, "%H:%M").map_err(|e| format!("expected HH:MM: {}", e))
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
