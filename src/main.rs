use anyhow::{anyhow, Result};
use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, Subcommand};
use log::debug;
use pufflog::{
    models::*,
    services::{
        plan,
        stats::{StatsAggregator, UsageSnapshot},
        store::FileStore,
        Clock, SystemClock,
    },
    ui::{format_money, TerminalUI},
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pufflog")]
#[command(about = "A lightweight CLI for vape puff tracking and quit plans")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Data directory override (defaults to the platform data dir)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Show about information including version and build details
    #[arg(long)]
    about: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Record one or more puffs right now
    Puff {
        /// Number of puffs to record
        #[arg(short, long, default_value = "1")]
        count: u32,
        /// Nicotine strength in mg/ml (defaults to the configured strength)
        #[arg(short, long)]
        strength: Option<f64>,
    },
    /// Remove today's most recent puff (manual correction)
    Undo,
    /// Show today's count against the plan target
    Status,
    /// Show day/week/month/year usage statistics
    Stats,
    /// Manage the reduction plan
    Plan {
        #[command(subcommand)]
        action: PlanAction,
    },
    /// Configure baseline rate, strength, and cost model
    Config {
        /// Declared typical daily puff count used for savings estimates
        #[arg(long)]
        baseline: Option<f64>,
        /// Default nicotine strength in mg/ml
        #[arg(long)]
        strength: Option<f64>,
        /// Puffs per pod
        #[arg(long)]
        puffs_per_pod: Option<f64>,
        /// Price of one pod
        #[arg(long)]
        pod_cost: Option<f64>,
        /// Currency symbol for display
        #[arg(long)]
        currency: Option<String>,
    },
    /// Seed randomized sample history for trying the tool out
    Demo {
        /// Days of history to generate
        #[arg(short, long, default_value = "21")]
        days: u32,
    },
}

#[derive(Subcommand)]
enum PlanAction {
    /// Create a reduction plan ending at zero on the target date
    Create {
        /// Current daily puff count (day 0 of the curve)
        #[arg(long)]
        start_count: u32,
        /// Last day of the plan, ISO date (YYYY-MM-DD)
        #[arg(long)]
        target_date: NaiveDate,
        /// First day of the plan (defaults to today)
        #[arg(long)]
        start_date: Option<NaiveDate>,
    },
    /// Show the active plan and its curve
    Show,
    /// Delete the active plan
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.about {
        show_about();
        return Ok(());
    }

    // Initialize logging
    if cli.verbose {
        // Log to file when verbose
        use std::fs::OpenOptions;
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open("debug.log")?;

        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .target(env_logger::Target::Pipe(Box::new(log_file)))
            .init();
    } else {
        // Normal logging to stderr for info/warn/error
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    // Setup data directory
    let data_dir = cli.data_dir.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pufflog")
    });
    std::fs::create_dir_all(&data_dir)?;
    debug!("Using data directory {}", data_dir.display());

    let config = load_or_create_config(&data_dir)?;
    let store = FileStore::new(data_dir.clone());
    let clock = SystemClock;

    match cli.command {
        Some(Commands::Puff { count, strength }) => {
            record_puffs(&store, &clock, &config, count, strength).await?;
        }
        Some(Commands::Undo) => {
            undo_last(&store, &clock).await?;
        }
        Some(Commands::Status) | None => {
            show_status(&store, &clock, config).await?;
        }
        Some(Commands::Stats) => {
            show_stats(&store, &clock, config).await?;
        }
        Some(Commands::Plan { action }) => match action {
            PlanAction::Create {
                start_count,
                target_date,
                start_date,
            } => {
                let start_date = start_date.unwrap_or_else(|| clock.today());
                create_plan(&store, start_count, start_date, target_date).await?;
            }
            PlanAction::Show => show_plan(&store, &clock).await?,
            PlanAction::Reset => {
                store.clear_plan().await?;
                println!("✅ Plan removed");
            }
        },
        Some(Commands::Config {
            baseline,
            strength,
            puffs_per_pod,
            pod_cost,
            currency,
        }) => {
            configure(
                &data_dir,
                config,
                baseline,
                strength,
                puffs_per_pod,
                pod_cost,
                currency,
            )?;
        }
        Some(Commands::Demo { days }) => {
            seed_demo_data(&store, &clock, days).await?;
        }
    }

    Ok(())
}

async fn record_puffs(
    store: &FileStore,
    clock: &impl Clock,
    config: &UserConfig,
    count: u32,
    strength: Option<f64>,
) -> Result<()> {
    if count == 0 {
        return Err(anyhow!("Nothing to record: count is 0"));
    }
    let strength = strength.unwrap_or(config.default_strength);

    for _ in 0..count {
        store
            .append_event(UsageEvent::new(clock.now(), strength))
            .await?;
    }

    let today_count = store.events_for(clock.today()).await?.len();
    println!("✅ Recorded {count} puff(s) - {today_count} today");

    if let Some(plan) = store.load_plan().await? {
        if let Some(limit) = plan::today_limit(&plan, clock.today()) {
            if today_count as u32 > limit {
                println!("⚠️  Over today's plan target of {limit}");
            }
        }
    }
    Ok(())
}

async fn undo_last(store: &FileStore, clock: &impl Clock) -> Result<()> {
    match store.undo_last(clock.today()).await? {
        Some(event) => {
            println!(
                "✅ Removed puff recorded at {}",
                humantime::format_rfc3339_seconds(event.timestamp.into())
            );
        }
        None => println!("📝 No puffs recorded today, nothing to undo"),
    }
    Ok(())
}

async fn show_status(store: &FileStore, clock: &impl Clock, config: UserConfig) -> Result<()> {
    let today = clock.today();
    let events = store.events_for(today).await?;
    let today_count = events.len() as u64;
    let mean_strength = if events.is_empty() {
        None
    } else {
        Some(events.iter().map(|e| e.strength).sum::<f64>() / events.len() as f64)
    };

    let today_limit = match store.load_plan().await? {
        Some(plan) => plan::today_limit(&plan, today),
        None => None,
    };

    let ui = TerminalUI::new(config);
    ui.draw_status(today_count, today_limit, mean_strength)?;
    Ok(())
}

async fn show_stats(store: &FileStore, clock: &impl Clock, config: UserConfig) -> Result<()> {
    let today = clock.today();
    let snapshot = store.usage_snapshot().await?;

    let days_since_start = days_since_start(store, &snapshot, today).await?;
    debug!("Aggregating over {days_since_start} tracked day(s)");

    let aggregator = StatsAggregator::new(
        &snapshot,
        today,
        days_since_start,
        config.baseline_daily_rate,
        &config.cost_model,
    );
    let summaries = aggregator.summarize_all();

    let ui = TerminalUI::new(config);
    ui.draw_summaries(&summaries)?;
    Ok(())
}

/// Days elapsed since tracking began: the earlier of the first recorded
/// day and the plan's start date, inclusive of today.
async fn days_since_start(
    store: &FileStore,
    snapshot: &UsageSnapshot,
    today: NaiveDate,
) -> Result<u32> {
    let plan_start = store.load_plan().await?.map(|plan| plan.spec.start_date);
    let first = match (snapshot.earliest_day(), plan_start) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };
    Ok(first
        .map(|first| ((today - first).num_days() + 1).max(1) as u32)
        .unwrap_or(1))
}

async fn create_plan(
    store: &FileStore,
    start_count: u32,
    start_date: NaiveDate,
    target_date: NaiveDate,
) -> Result<()> {
    if target_date <= start_date {
        return Err(anyhow!(
            "Target date {target_date} must be after start date {start_date}"
        ));
    }
    if store.load_plan().await?.is_some() {
        return Err(anyhow!(
            "A plan already exists - run 'pufflog plan reset' first"
        ));
    }

    let spec = PlanSpec::new(start_count, start_date, target_date);
    let curve = plan::generate(spec.total_days, spec.start_count);
    let state = PlanState { spec, curve };
    store.save_plan(&state).await?;

    println!(
        "✅ Plan created: {} puffs/day down to 0 over {} days",
        start_count, state.spec.total_days
    );
    Ok(())
}

async fn show_plan(store: &FileStore, clock: &impl Clock) -> Result<()> {
    let Some(plan) = store.load_plan().await? else {
        println!("📝 No plan set - run 'pufflog plan create' to start one");
        return Ok(());
    };

    println!("📊 Reduction plan:");
    println!("  Start:  {} ({} puffs/day)", plan.spec.start_date, plan.spec.start_count);
    println!("  Target: {} (0 puffs/day)", plan.spec.target_date);
    if let Some(limit) = plan::today_limit(&plan, clock.today()) {
        println!("  Today's target: {limit}");
    }

    // Compact run-length view of the curve: "140×1 84×1 56×2 ..."
    let mut runs: Vec<(u32, usize)> = Vec::new();
    for &value in &plan.curve {
        match runs.last_mut() {
            Some((v, n)) if *v == value => *n += 1,
            _ => runs.push((value, 1)),
        }
    }
    let rendered: Vec<String> = runs.iter().map(|(v, n)| format!("{v}×{n}")).collect();
    println!("  Curve:  {}", rendered.join(" "));
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn configure(
    data_dir: &PathBuf,
    mut config: UserConfig,
    baseline: Option<f64>,
    strength: Option<f64>,
    puffs_per_pod: Option<f64>,
    pod_cost: Option<f64>,
    currency: Option<String>,
) -> Result<()> {
    if let Some(baseline) = baseline {
        config.baseline_daily_rate = Some(baseline);
        println!("✅ Set baseline daily rate to {baseline}");
    }
    if let Some(strength) = strength {
        config.default_strength = strength;
        println!("✅ Set default strength to {strength} mg/ml");
    }
    if let Some(puffs) = puffs_per_pod {
        config.cost_model.puffs_per_pod = puffs;
        println!("✅ Set puffs per pod to {puffs}");
    }
    if let Some(cost) = pod_cost {
        config.cost_model.pod_cost = cost;
        println!(
            "✅ Set pod cost to {}",
            format_money(cost, &config.cost_model.currency_symbol)
        );
    }
    if let Some(currency) = currency {
        config.cost_model.currency_symbol = currency.clone();
        println!("✅ Set currency symbol to {currency}");
    }

    let config_path = data_dir.join("config.json");
    let content = serde_json::to_string_pretty(&config)?;
    std::fs::write(&config_path, content)?;
    Ok(())
}

/// Seed `days` days of plausible declining usage plus a matching plan.
async fn seed_demo_data(store: &FileStore, clock: &impl Clock, days: u32) -> Result<()> {
    use rand::Rng;
    let mut rng = rand::thread_rng();

    let days = days.max(2);
    let today = clock.today();
    let start_count = rng.gen_range(120..220);
    let curve = plan::generate(days as usize, start_count);

    println!("🔧 Seeding {days} days of sample data...");
    for (i, &target) in curve.iter().enumerate() {
        let date = today - Duration::days((days as usize - 1 - i) as i64);
        // Scatter realistic noise around the day's target
        let jitter = rng.gen_range(0.85..1.15);
        let count = ((target as f64) * jitter).round() as u32;
        for _ in 0..count {
            let ts = date
                .and_hms_opt(rng.gen_range(8..23), rng.gen_range(0..60), 0)
                .and_then(|naive| naive.and_local_timezone(Local).single());
            if let Some(ts) = ts {
                store
                    .append_event(UsageEvent::new(ts, rng.gen_range(10.0..50.0)))
                    .await?;
            }
        }
    }

    let spec = PlanSpec::new(
        start_count,
        today - Duration::days(days as i64 - 1),
        today,
    );
    let state = PlanState { spec, curve };
    store.save_plan(&state).await?;

    println!("✅ Seeded demo history and a {days}-day plan ending today");
    println!("💡 Try 'pufflog stats' or 'pufflog status'");
    Ok(())
}

fn load_or_create_config(data_dir: &PathBuf) -> Result<UserConfig> {
    let config_path = data_dir.join("config.json");

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        Ok(serde_json::from_str(&content)?)
    } else {
        let config = UserConfig::default();
        let content = serde_json::to_string_pretty(&config)?;
        std::fs::write(&config_path, content)?;
        Ok(config)
    }
}

/// Display about information including version and build details
fn show_about() {
    use colored::Colorize;

    println!("{}", "💨 Pufflog".bright_cyan().bold());
    println!();
    println!("{}", "📋 Version Information:".bright_yellow().bold());
    println!("  Version: {}", env!("CARGO_PKG_VERSION").bright_green());
    println!("  Built: {}", option_env!("PUFFLOG_BUILD_TIME").unwrap_or("unknown"));
    if let Some(hash) = option_env!("PUFFLOG_GIT_HASH") {
        println!("  Commit: {hash}");
    }
    println!();
    println!("{}", "💡 Usage:".bright_green().bold());
    println!("  pufflog puff            # record a puff");
    println!("  pufflog plan create --start-count 140 --target-date 2026-12-31");
    println!("  pufflog stats           # day/week/month/year summaries");
}
