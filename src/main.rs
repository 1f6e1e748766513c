mod menu;

use std::path::PathBuf;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use ksis_export::config::{self, Settings};
use ksis_export::corrections::CorrectionStore;
use ksis_export::export::{ExportOutcome, Exporter};
use ksis_export::io::ksis::KsisClient;
use ksis_export::io::{self, OutputFormat};
use ksis_export::model::{Competition, CompetitionId};
use ksis_export::normalize::{Disambiguator, TerminalPrompt, Unavailable};
use ksis_export::source::{ListingFilter, ResultsSource};
use ksis_export::{ExportError, Result, logging};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    logging::init(cli.global.debug)?;
    let settings = cli.global.settings();
    let client = KsisClient::new(&settings)?;

    match cli.command.unwrap_or(Command::Menu) {
        Command::List(args) => execute_list(&client, args),
        Command::Export(args) => {
            let mut store = CorrectionStore::open_dir(&settings.corrections_dir);
            let mut exporter = Exporter::new(&client, &mut store, disambiguator(&settings));
            let outcome = exporter.export_ids(&args.prop_ids)?;
            finish(&outcome, &settings)
        }
        Command::ExportRange(args) => {
            if args.from > args.to {
                return Err(ExportError::InvalidRange {
                    from: args.from,
                    to: args.to,
                });
            }
            let filter = ListingFilter {
                live_only: args.live,
                keyword: args.search.clone(),
            };
            let mut store = CorrectionStore::open_dir(&settings.corrections_dir);
            let mut exporter = Exporter::new(&client, &mut store, disambiguator(&settings));
            let outcome = exporter.export_date_range(args.from, args.to, &filter)?;
            finish(&outcome, &settings)
        }
        Command::Menu => {
            let mut store = CorrectionStore::open_dir(&settings.corrections_dir);
            let mut exporter = Exporter::new(&client, &mut store, disambiguator(&settings));
            menu::run(&client, &mut exporter, &settings)
        }
    }
}

fn disambiguator(settings: &Settings) -> Box<dyn Disambiguator> {
    if settings.batch {
        Box::new(Unavailable)
    } else {
        Box::new(TerminalPrompt::stdio())
    }
}

fn execute_list(client: &KsisClient, args: ListArgs) -> Result<()> {
    let filter = ListingFilter {
        live_only: args.live,
        keyword: args.search,
    };
    let competitions = filter.apply(client.list_competitions()?);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&competitions)?);
    } else {
        print_listing(&competitions, &filter);
    }
    Ok(())
}

pub(crate) fn print_listing(competitions: &[Competition], filter: &ListingFilter) {
    if competitions.is_empty() {
        match (&filter.keyword, filter.live_only) {
            (_, true) => println!("No live competitions found."),
            (Some(keyword), false) => println!("No competitions found matching '{keyword}'."),
            (None, false) => println!("No competitions found."),
        }
        return;
    }

    println!("{:<8} Competition Name", "ID");
    println!("{}", "-".repeat(80));
    for competition in competitions {
        let live = if competition.is_live { " [LIVE]" } else { "" };
        println!("{:<8} {}{live}", competition.id.as_str(), competition.name);
    }
    println!("\nTotal: {} competitions", competitions.len());
}

/// Writes the export file (unless nothing was collected) and prints the summary.
pub(crate) fn finish(outcome: &ExportOutcome, settings: &Settings) -> Result<()> {
    if outcome.table.is_empty() {
        println!("No data was collected. No file created.");
    } else {
        let names: Vec<&str> = outcome
            .competitions
            .iter()
            .map(|competition| competition.name.as_str())
            .collect();
        let stem = io::export_stem(&names, Local::now().naive_local());
        let sheet_name = match names.as_slice() {
            [single] => *single,
            _ => "Results",
        };
        let table = outcome.table.to_sheet(sheet_name);
        let path = io::write_export(&settings.output_dir, &stem, settings.output_format, &table)?;
        println!(
            "Created {} with {} records.",
            path.display(),
            outcome.table.records.len()
        );
    }
    println!("{}", outcome.summary);
    Ok(())
}

fn parse_competition_id(value: &str) -> std::result::Result<CompetitionId, String> {
    value.parse().map_err(|error: ExportError| error.to_string())
}

fn parse_date(value: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ExportError::InvalidDate(value.to_string()).to_string())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Export ksis.eu competition results with consistent athlete and club names."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    /// Defaults to the interactive menu.
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List competitions.
    List(ListArgs),
    /// Export one or more competitions by id.
    Export(ExportArgs),
    /// Export every competition dated within a range.
    ExportRange(RangeArgs),
    /// Interactive menu.
    Menu,
}

#[derive(clap::Args)]
struct GlobalArgs {
    /// Enable debug output.
    #[arg(long, short = 'd', global = true)]
    debug: bool,

    /// Never prompt for name splits; guesses are flagged for review.
    #[arg(long, global = true, env = "KSIS_BATCH")]
    batch: bool,

    /// Directory holding the correction workbooks.
    #[arg(long, global = true, env = "KSIS_CORRECTIONS_DIR", default_value = config::DEFAULT_CORRECTIONS_DIR)]
    corrections_dir: PathBuf,

    /// Results site.
    #[arg(long, global = true, env = "KSIS_BASE_URL", default_value = config::DEFAULT_BASE_URL)]
    base_url: String,

    /// Discipline code used for the listing.
    #[arg(long, global = true, default_value = config::DEFAULT_DISCIPLINE)]
    discipline: String,

    /// Country code used for the listing.
    #[arg(long, global = true, default_value = config::DEFAULT_COUNTRY)]
    country: String,

    /// HTTP timeout in seconds.
    #[arg(long, global = true, default_value_t = config::DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Directory the export file is written to.
    #[arg(long, global = true, env = "KSIS_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Export file format.
    #[arg(long, global = true, value_enum, default_value_t = FormatKind::Csv)]
    format: FormatKind,
}

impl GlobalArgs {
    fn settings(&self) -> Settings {
        Settings {
            base_url: self.base_url.clone(),
            discipline: self.discipline.clone(),
            country: self.country.clone(),
            corrections_dir: self.corrections_dir.clone(),
            output_dir: self.output_dir.clone(),
            output_format: self.format.into(),
            batch: self.batch,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(clap::Args)]
struct ListArgs {
    /// Only competitions with live sessions.
    #[arg(long)]
    live: bool,

    /// Case-insensitive keyword to search for.
    #[arg(long)]
    search: Option<String>,

    /// Print the listing as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
struct ExportArgs {
    /// Competition id(s), exported in the order given.
    #[arg(long = "prop-id", required = true, num_args = 1.., value_parser = parse_competition_id)]
    prop_ids: Vec<CompetitionId>,
}

#[derive(clap::Args)]
struct RangeArgs {
    /// First day, YYYY-MM-DD.
    #[arg(long, value_parser = parse_date)]
    from: NaiveDate,

    /// Last day, YYYY-MM-DD.
    #[arg(long, value_parser = parse_date)]
    to: NaiveDate,

    /// Only competitions whose name contains this keyword.
    #[arg(long)]
    search: Option<String>,

    /// Only competitions marked live in the listing.
    #[arg(long)]
    live: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FormatKind {
    Csv,
    Xlsx,
}

impl From<FormatKind> for OutputFormat {
    fn from(kind: FormatKind) -> Self {
        match kind {
            FormatKind::Csv => OutputFormat::Csv,
            FormatKind::Xlsx => OutputFormat::Xlsx,
        }
    }
}
