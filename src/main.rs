use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use match_ledger::config::AppConfig;
use match_ledger::filter::{FilterSpec, MatchMonth, NameFilter, SortOption};
use match_ledger::ledger::{Ledger, MatchInput};
use match_ledger::models::{EntityId, Side};
use match_ledger::reconcile::{ArmyEdit, ChildEdit};
use match_ledger::report;
use match_ledger::scoring::derive_wtc_scores;
use match_ledger::storage::{JsonlStore, StorageConfig};

#[derive(Parser)]
#[command(name = "match-ledger")]
#[command(about = "Tabletop wargame match ledger with WTC scoring and statistics")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error (overrides config)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage armies and their detachments
    Army {
        #[command(subcommand)]
        action: ArmyAction,
    },

    /// Manage a single detachment
    Detachment {
        #[command(subcommand)]
        action: DetachmentAction,
    },

    /// Record and browse matches
    Match {
        #[command(subcommand)]
        action: MatchAction,
    },

    /// Show win/loss statistics for a filtered history
    Stats(StatsArgs),

    /// Show the WTC split for a pair of primary scores
    Wtc {
        #[arg(allow_negative_numbers = true)]
        user: i32,

        #[arg(allow_negative_numbers = true)]
        opponent: i32,
    },
}

#[derive(Subcommand)]
enum ArmyAction {
    /// Create an army
    Add {
        name: String,

        /// Detachment name (repeatable)
        #[arg(long = "detachment")]
        detachments: Vec<String>,
    },

    /// List active armies
    List,

    /// Show an army with every detachment it has owned
    Show { id: EntityId },

    /// Edit an army's name and detachment list
    Edit {
        id: EntityId,

        /// New army name
        #[arg(long)]
        name: Option<String>,

        /// Desired detachment: "ID=Name" keeps or renames, "Name" creates (repeatable).
        /// Detachments not listed are soft-deleted.
        #[arg(long = "detachment", value_parser = parse_child_edit)]
        detachments: Vec<ChildEdit>,

        /// Soft-delete every detachment
        #[arg(long, conflicts_with = "detachments")]
        clear_detachments: bool,

        /// Print the planned writes without applying them
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete an army and its detachments
    Delete {
        id: EntityId,

        /// Physically remove instead of soft-deleting
        #[arg(long)]
        hard: bool,
    },
}

#[derive(Subcommand)]
enum DetachmentAction {
    /// Rename a detachment
    Rename { id: EntityId, name: String },

    /// Soft-delete a detachment
    Delete { id: EntityId },
}

#[derive(Subcommand)]
enum MatchAction {
    /// Record a new match
    Add(MatchArgs),

    /// Replace a recorded match
    Edit {
        id: EntityId,

        #[command(flatten)]
        args: MatchArgs,
    },

    /// Delete a match
    Delete { id: EntityId },

    /// List matches
    List {
        /// Sort order: date|score|wtc followed by -asc or -desc
        #[arg(long, default_value = "date-desc")]
        sort: SortOption,
    },
}

#[derive(Args)]
struct MatchArgs {
    /// Date played (YYYY-MM-DD)
    #[arg(long)]
    date: String,

    #[arg(long)]
    user_army: EntityId,

    #[arg(long)]
    user_detachment: EntityId,

    #[arg(long)]
    opponent_army: EntityId,

    #[arg(long)]
    opponent_detachment: EntityId,

    #[arg(long, allow_negative_numbers = true)]
    user_score: i32,

    #[arg(long, allow_negative_numbers = true)]
    opponent_score: i32,

    /// Played at a tournament
    #[arg(long)]
    tournament: bool,

    /// Tournament name (ignored unless --tournament)
    #[arg(long)]
    tournament_name: Option<String>,
}

impl MatchArgs {
    fn into_input(self) -> Result<MatchInput> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .with_context(|| format!("Invalid --date (expected YYYY-MM-DD): {}", self.date))?;

        Ok(MatchInput {
            date,
            user: Side::new(self.user_army, self.user_detachment),
            opponent: Side::new(self.opponent_army, self.opponent_detachment),
            user_score: self.user_score,
            opponent_score: self.opponent_score,
            is_tournament: self.tournament,
            tournament_name: self.tournament_name,
        })
    }
}

#[derive(Args)]
struct StatsArgs {
    /// Only count tournament games
    #[arg(long)]
    tournament_only: bool,

    #[arg(long, default_value = "all")]
    user_army: String,

    #[arg(long, default_value = "all")]
    user_detachment: String,

    #[arg(long, default_value = "all")]
    opponent_army: String,

    #[arg(long, default_value = "all")]
    opponent_detachment: String,

    /// First month to include (YYYY-MM)
    #[arg(long)]
    from: Option<MatchMonth>,

    /// Last month to include (YYYY-MM)
    #[arg(long)]
    to: Option<MatchMonth>,

    /// Decide wins by WTC points
    #[arg(long)]
    wtc: bool,

    /// Print the available filter values instead of statistics
    #[arg(long)]
    options: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

fn parse_child_edit(raw: &str) -> Result<ChildEdit, String> {
    if let Some((id, name)) = raw.split_once('=') {
        if let Ok(id) = id.parse::<EntityId>() {
            let name = name.trim();
            if name.is_empty() {
                return Err(format!("detachment {} needs a name", id));
            }
            return Ok(ChildEdit::existing(id, name));
        }
    }

    let name = raw.trim();
    if name.is_empty() {
        return Err("detachment name must not be empty".to_string());
    }
    Ok(ChildEdit::new_child(name))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = dir;
    }
    if let Some(level) = cli.log_level.clone() {
        config.log_level = level;
        config.validate()?;
    }

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    tracing::debug!(
        data_dir = ?config.data_dir,
        "Starting match-ledger v{}",
        env!("CARGO_PKG_VERSION")
    );

    let ledger = Ledger::new(JsonlStore::new(StorageConfig::new(config.data_dir.clone())));

    match cli.command {
        Commands::Army { action } => run_army(&ledger, action)?,
        Commands::Detachment { action } => match action {
            DetachmentAction::Rename { id, name } => {
                ledger.rename_detachment(id, &name)?;
                println!("Renamed detachment #{} to {}", id, name);
            }
            DetachmentAction::Delete { id } => {
                ledger.soft_delete_detachment(id)?;
                println!("Deleted detachment #{}", id);
            }
        },
        Commands::Match { action } => run_match(&ledger, action)?,
        Commands::Stats(args) => run_stats(&ledger, &config, args)?,
        Commands::Wtc { user, opponent } => {
            let wtc = derive_wtc_scores(user, opponent);
            println!("{}-{} => WTC {}-{}", user, opponent, wtc.user, wtc.opponent);
        }
    }

    Ok(())
}

fn run_army(ledger: &Ledger<JsonlStore>, action: ArmyAction) -> Result<()> {
    match action {
        ArmyAction::Add { name, detachments } => {
            let created = ledger.create_army(&name, &detachments)?;
            println!("{}", report::render_armies(&[created]));
        }
        ArmyAction::List => {
            println!("{}", report::render_armies(&ledger.list_armies()?));
        }
        ArmyAction::Show { id } => {
            println!("{}", report::render_armies(&[ledger.army(id)?]));
        }
        ArmyAction::Edit {
            id,
            name,
            detachments,
            clear_detachments,
            dry_run,
        } => {
            let current = ledger.army(id)?;
            let detachments = if detachments.is_empty() && !clear_detachments {
                current
                    .detachments
                    .iter()
                    .filter(|d| !d.is_deleted)
                    .map(|d| ChildEdit::existing(d.id, d.name.clone()))
                    .collect()
            } else {
                detachments
            };
            let edit = ArmyEdit {
                name: name.unwrap_or(current.army.name),
                detachments,
            };

            if dry_run {
                let plan = ledger.plan_army_update(id, &edit)?;
                println!("{}", serde_json::to_string_pretty(&plan)?);
                println!("\n(dry run - no data written to disk)");
            } else {
                let updated = ledger.update_army(id, &edit)?;
                println!("{}", report::render_armies(&[updated]));
            }
        }
        ArmyAction::Delete { id, hard } => {
            if hard {
                ledger.hard_delete_army(id)?;
                println!("Removed army #{}", id);
            } else {
                ledger.soft_delete_army(id)?;
                println!("Deleted army #{}", id);
            }
        }
    }
    Ok(())
}

fn run_match(ledger: &Ledger<JsonlStore>, action: MatchAction) -> Result<()> {
    match action {
        MatchAction::Add(args) => {
            let recorded = ledger.record_match(args.into_input()?)?;
            println!("{}", report::render_history(&[recorded]));
        }
        MatchAction::Edit { id, args } => {
            let edited = ledger.edit_match(id, args.into_input()?)?;
            println!("{}", report::render_history(&[edited]));
        }
        MatchAction::Delete { id } => {
            ledger.delete_match(id)?;
            println!("Deleted match #{}", id);
        }
        MatchAction::List { sort } => {
            println!("{}", report::render_history(&ledger.match_history(sort)?));
        }
    }
    Ok(())
}

fn run_stats(ledger: &Ledger<JsonlStore>, config: &AppConfig, args: StatsArgs) -> Result<()> {
    if let (Some(from), Some(to)) = (&args.from, &args.to) {
        if from > to {
            bail!("--from {} is after --to {}", from, to);
        }
    }

    let spec = FilterSpec {
        tournament_only: args.tournament_only || config.stats.tournament_only,
        user_army: NameFilter::parse(&args.user_army),
        user_detachment: NameFilter::parse(&args.user_detachment),
        opponent_army: NameFilter::parse(&args.opponent_army),
        opponent_detachment: NameFilter::parse(&args.opponent_detachment),
        from_month: args.from,
        to_month: args.to,
    };

    let options = ledger.filter_options(&spec)?;
    if args.options {
        if args.json {
            println!("{}", serde_json::to_string_pretty(&options)?);
        } else {
            println!("User armies:          {}", options.user_armies.join(", "));
            println!("User detachments:     {}", options.user_detachments.join(", "));
            println!("Opponent armies:      {}", options.opponent_armies.join(", "));
            println!("Opponent detachments: {}", options.opponent_detachments.join(", "));
            let months: Vec<&str> = options.months.iter().map(MatchMonth::as_str).collect();
            println!("Months:               {}", months.join(", "));
        }
        return Ok(());
    }

    let spec = spec.with_observed_range(&options.months);
    let stats = ledger.statistics(&spec, args.wtc || config.stats.use_wtc)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{}", report::render_statistics(&stats));
    }
    Ok(())
}
