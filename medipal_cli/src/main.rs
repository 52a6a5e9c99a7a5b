use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand};
use medipal_core::schedule::{all_taken, logs_on, required_medicines};
use medipal_core::tips::TipSource;
use medipal_core::*;
use std::fmt::Display;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "medipal")]
#[command(about = "Medication adherence tracker with a mascot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use a specific config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Evaluate as of this RFC 3339 instant instead of the current time
    #[arg(long, global = true, hide = true)]
    now: Option<DateTime<FixedOffset>>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show mascot mood and streak (default)
    Status {
        /// Print the evaluation as JSON
        #[arg(long)]
        json: bool,
    },

    /// Register a medicine
    Add {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        reason: String,

        /// Scheduled time of day, HH:MM
        #[arg(long)]
        time: String,

        /// Weekdays as 0 (Sunday) to 6 (Saturday), comma separated, or "daily"
        #[arg(long, default_value = "daily")]
        days: String,
    },

    /// List registered medicines
    List,

    /// Delete a medicine and its dose history
    Remove {
        /// Medicine id (or unique id prefix, or name)
        medicine: String,
    },

    /// Log a dose
    Take {
        /// Medicine id (or unique id prefix, or name)
        medicine: String,

        /// Log a late dose for a past date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Record the dose as skipped
        #[arg(long)]
        skip: bool,
    },

    /// Show the last seven days
    History,

    /// Show a month of history
    Calendar {
        /// Month to show, YYYY-MM (defaults to the current month)
        #[arg(long)]
        month: Option<String>,

        /// Show the doses logged on this day (YYYY-MM-DD)
        #[arg(long)]
        day: Option<NaiveDate>,
    },

    /// Show a stomach-friendly food tip
    Tip,

    /// Show or regenerate the weekly snack plan
    Plan {
        /// Generate a new plan, replacing the current one
        #[arg(long)]
        regenerate: bool,

        /// Mark a day as done
        #[arg(long, conflicts_with = "uncheck")]
        check: Option<String>,

        /// Clear the done mark for a day
        #[arg(long)]
        uncheck: Option<String>,
    },
}

fn main() -> Result<()> {
    medipal_core::logging::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let mut store = FileStore::new(data_dir);

    // Without an override, stay in the local zone so past logs are dated
    // with the offset that applied when they were taken
    match cli.now {
        Some(now) => run(cli.command, &mut store, &config, &now),
        None => run(cli.command, &mut store, &config, &Local::now()),
    }
}

fn run<Tz>(
    command: Option<Commands>,
    store: &mut FileStore,
    config: &Config,
    now: &DateTime<Tz>,
) -> Result<()>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match command {
        Some(Commands::Status { json }) => cmd_status(store, config, now, json),
        Some(Commands::Add {
            name,
            reason,
            time,
            days,
        }) => cmd_add(store, now, name, reason, &time, &days),
        Some(Commands::List) => cmd_list(store),
        Some(Commands::Remove { medicine }) => cmd_remove(store, &medicine),
        Some(Commands::Take {
            medicine,
            date,
            skip,
        }) => cmd_take(store, now, &medicine, date, skip),
        Some(Commands::History) => cmd_history(store, now),
        Some(Commands::Calendar { month, day }) => cmd_calendar(store, now, month, day),
        Some(Commands::Tip) => cmd_tip(config, now),
        Some(Commands::Plan {
            regenerate,
            check,
            uncheck,
        }) => cmd_plan(store, config, now, regenerate, check, uncheck),
        None => cmd_status(store, config, now, false),
    }
}

/// Load a snapshot, degrading to empty lists if the store can't be read
fn snapshot(store: &FileStore) -> (Vec<Medicine>, Vec<DoseLog>) {
    let medicines = store.medicines().unwrap_or_else(|e| {
        tracing::warn!("Failed to load medicines: {}", e);
        Vec::new()
    });
    let logs = store.logs().unwrap_or_else(|e| {
        tracing::warn!("Failed to load dose logs: {}", e);
        Vec::new()
    });
    (medicines, logs)
}

/// Find a medicine by full id, unique id prefix, or case-insensitive name
fn resolve_medicine(medicines: &[Medicine], query: &str) -> Result<Medicine> {
    let query = query.trim();
    if query.is_empty() {
        return Err(Error::NotFound("empty medicine name or id".into()));
    }
    let matches: Vec<_> = medicines
        .iter()
        .filter(|m| m.id.to_string().starts_with(query) || m.name.eq_ignore_ascii_case(query))
        .collect();

    match matches.as_slice() {
        [one] => Ok((*one).clone()),
        [] => Err(Error::NotFound(format!("no medicine matches '{}'", query))),
        _ => Err(Error::Other(format!(
            "'{}' matches {} medicines, use a longer id",
            query,
            matches.len()
        ))),
    }
}

fn day_seed<Tz: TimeZone>(now: &DateTime<Tz>) -> u64 {
    now.date_naive().num_days_from_ce().unsigned_abs() as u64
}

fn cmd_status<Tz: TimeZone>(
    store: &FileStore,
    config: &Config,
    now: &DateTime<Tz>,
    json: bool,
) -> Result<()> {
    let (medicines, logs) = snapshot(store);
    let evaluation = evaluate(&medicines, &logs, now);

    if json {
        println!("{}", serde_json::to_string(&evaluation)?);
        return Ok(());
    }

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  MEDIPAL");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Mood:    {}", evaluation.mood);
    println!("  Streak:  {} day(s)", evaluation.streak);
    println!("  Missed:  {} day(s)", evaluation.missed_days);

    if config.mascot.enabled {
        println!();
        println!(
            "  \"{}\"",
            medipal_core::mascot::message_for(evaluation.mood, day_seed(now))
        );
    }

    let today = now.date_naive();
    let due = required_medicines(&medicines, today);
    if !due.is_empty() {
        println!();
        println!("  Today:");
        let tz = now.timezone();
        for med in due {
            let done = all_taken(&[med], &logs, today, &tz);
            println!(
                "    [{}] {} {}",
                if done { "✓" } else { " " },
                med.time,
                med.name
            );
        }
    }
    println!();

    Ok(())
}

fn cmd_add<Tz: TimeZone>(
    store: &mut FileStore,
    now: &DateTime<Tz>,
    name: String,
    reason: String,
    time: &str,
    days: &str,
) -> Result<()> {
    let medicine = Medicine::new(
        name,
        reason,
        time.parse()?,
        days.parse()?,
        now.with_timezone(&Utc),
    )?;
    store.save_medicine(&medicine)?;

    println!("✓ Added {} at {}", medicine.name, medicine.time);
    println!("  id: {}", medicine.id);
    Ok(())
}

fn cmd_list(store: &FileStore) -> Result<()> {
    let medicines = store.medicines()?;
    if medicines.is_empty() {
        println!("No medicines registered.");
        return Ok(());
    }

    for med in medicines {
        let days: Vec<String> = med.days_of_week.iter().map(|d| d.to_string()).collect();
        println!(
            "{}  {}  {:<20} days [{}]  {}",
            &med.id.to_string()[..8],
            med.time,
            med.name,
            days.join(","),
            med.reason
        );
    }
    Ok(())
}

fn cmd_remove(store: &mut FileStore, query: &str) -> Result<()> {
    let medicine = resolve_medicine(&store.medicines()?, query)?;
    store.delete_medicine(medicine.id)?;
    println!("✓ Removed {} and its dose history", medicine.name);
    Ok(())
}

fn cmd_take<Tz: TimeZone>(
    store: &mut FileStore,
    now: &DateTime<Tz>,
    query: &str,
    date: Option<NaiveDate>,
    skip: bool,
) -> Result<()> {
    let medicine = resolve_medicine(&store.medicines()?, query)?;
    let today = now.date_naive();

    let (taken_at, status) = match date {
        Some(date) if date > today => {
            return Err(Error::Other(format!("{} is in the future", date)));
        }
        Some(date) if date < today => {
            let local = date.and_time(medicine.time.to_naive_time());
            let taken_at = now
                .timezone()
                .from_local_datetime(&local)
                .single()
                .ok_or_else(|| Error::Other(format!("{} is not a valid local time", local)))?;
            (taken_at.with_timezone(&Utc), DoseStatus::Late)
        }
        _ => (now.with_timezone(&Utc), DoseStatus::Taken),
    };
    let status = if skip { DoseStatus::Skipped } else { status };

    store.save_log(&DoseLog::new(medicine.id, taken_at, status))?;

    match status {
        DoseStatus::Taken => println!("✓ Logged {}", medicine.name),
        DoseStatus::Late => println!("✓ Logged {} late", medicine.name),
        DoseStatus::Skipped => println!("✓ Marked {} as skipped", medicine.name),
    }
    Ok(())
}

fn cmd_history<Tz: TimeZone>(store: &FileStore, now: &DateTime<Tz>) -> Result<()> {
    let (medicines, logs) = snapshot(store);
    let week = week_history(&medicines, &logs, now);

    let names: Vec<String> = week
        .iter()
        .map(|c| format!("{:>4}", c.date.format("%a")))
        .collect();
    let symbols: Vec<String> = week
        .iter()
        .map(|c| format!("{:>4}", c.status.symbol()))
        .collect();

    println!("Weekly history");
    println!("{}", names.join(""));
    println!("{}", symbols.join(""));
    println!();
    println!("  ✓ on time   ◷ late   ✗ missed   · pending");
    Ok(())
}

fn parse_month(value: &str) -> Result<(i32, u32)> {
    let (year, month) = value
        .split_once('-')
        .ok_or_else(|| Error::Calendar(format!("'{}' is not YYYY-MM", value)))?;
    let year = year
        .parse()
        .map_err(|_| Error::Calendar(format!("'{}' is not YYYY-MM", value)))?;
    let month = month
        .parse()
        .map_err(|_| Error::Calendar(format!("'{}' is not YYYY-MM", value)))?;
    Ok((year, month))
}

fn cmd_calendar<Tz>(
    store: &FileStore,
    now: &DateTime<Tz>,
    month: Option<String>,
    day: Option<NaiveDate>,
) -> Result<()>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let (year, month) = match month {
        Some(value) => parse_month(&value)?,
        None => (now.year(), now.month()),
    };
    let (medicines, logs) = snapshot(store);
    let grid = month_grid(&medicines, &logs, year, month, now)?;

    println!("{}-{:02}", year, month);
    println!("   S   M   T   W   T   F   S");
    for week in grid.chunks(7) {
        let row: String = week
            .iter()
            .map(|cell| match cell {
                Some(c) => format!("{:>3}{}", c.date.day(), c.status.symbol()),
                None => "    ".to_string(),
            })
            .collect();
        println!("{}", row);
    }

    if let Some(day) = day {
        println!();
        println!("Doses on {}", day);
        let day_logs = logs_on(&logs, day, &now.timezone());
        if day_logs.is_empty() {
            println!("  (none)");
        }
        for log in day_logs {
            let name = medicines
                .iter()
                .find(|m| m.id == log.medicine_id)
                .map(|m| m.name.as_str())
                .unwrap_or("(deleted)");
            println!(
                "  {}  {:<20} {:?}",
                log.taken_at.with_timezone(&now.timezone()).format("%H:%M"),
                name,
                log.status
            );
        }
    }
    Ok(())
}

fn cmd_tip<Tz: TimeZone>(config: &Config, now: &DateTime<Tz>) -> Result<()> {
    let generator = config.generator.build();
    let tip = daily_tip(
        generator.as_ref().map(|g| g as &dyn TextGenerator),
        day_seed(now),
    );

    match tip.source {
        TipSource::Generated => println!("💡 {}", tip.text),
        TipSource::Local => println!("💡 {} (local)", tip.text),
    }
    Ok(())
}

fn cmd_plan<Tz: TimeZone>(
    store: &mut FileStore,
    config: &Config,
    now: &DateTime<Tz>,
    regenerate: bool,
    check: Option<String>,
    uncheck: Option<String>,
) -> Result<()> {
    if let Some(day) = check {
        store.toggle_plan_item(&day, true)?;
    }
    if let Some(day) = uncheck {
        store.toggle_plan_item(&day, false)?;
    }

    let plan = match store.weekly_plan()? {
        Some(plan) if !regenerate => plan,
        _ => {
            let generator = config.generator.build();
            let items = weekly_food_plan(generator.as_ref().map(|g| g as &dyn TextGenerator));
            let plan = WeeklyPlan::from_items(items, now.with_timezone(&Utc));
            store.save_weekly_plan(&plan)?;
            plan
        }
    };

    println!("Weekly snack plan");
    for entry in &plan.entries {
        println!(
            "  [{}] {:<10} {}",
            if entry.checked { "x" } else { " " },
            entry.day,
            entry.food
        );
    }
    Ok(())
}
