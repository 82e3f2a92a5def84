use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use schedule_calendar::{
    Duration, NumberFormat, ProjectCalendars, RecurringData, TimeUnit, TimeUnitDefaults,
    TimephasedData, TimephasedFormat, load_calendars_from_json, load_timephased_from_csv,
    save_timephased_to_csv,
};
use std::error::Error;
use std::fs::File;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Working-time calculations over project calendars.
#[derive(Parser)]
#[command(name = "cli", version, about = "Project calendar working-time tool")]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert an amount between time units.
    Convert {
        amount: f64,
        #[arg(value_parser = parse_unit)]
        from: TimeUnit,
        #[arg(value_parser = parse_unit)]
        to: TimeUnit,
        #[arg(long, default_value_t = 8.0)]
        hours_per_day: f64,
        #[arg(long, default_value_t = 40.0)]
        hours_per_week: f64,
    },
    /// Parse a textual duration such as `3.5h` or `2ed`.
    Parse {
        text: String,
        #[arg(long, default_value_t = '.')]
        decimal: char,
        #[arg(long)]
        grouping: Option<char>,
    },
    /// Working time between two instants on a calendar.
    Work {
        /// Calendars JSON file.
        #[arg(short, long)]
        calendars: PathBuf,
        /// Calendar name.
        #[arg(short = 'n', long)]
        calendar: String,
        start: NaiveDateTime,
        finish: NaiveDateTime,
        #[arg(short, long, value_parser = parse_unit, default_value = "h")]
        units: TimeUnit,
    },
    /// Normalise raw timephased work read from CSV.
    Normalise {
        #[arg(short, long)]
        calendars: PathBuf,
        #[arg(short = 'n', long)]
        calendar: String,
        #[arg(short, long)]
        input: PathBuf,
        /// Write the result here instead of printing it.
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long, default_value_t = TimephasedFormat::Mspdi)]
        format: TimephasedFormat,
    },
    /// Expand a recurring pattern (JSON) into dates.
    Dates {
        #[arg(short, long)]
        recurring: PathBuf,
    },
}

fn parse_unit(text: &str) -> Result<TimeUnit, String> {
    TimeUnit::from_suffix(text).ok_or_else(|| format!("unknown time unit '{text}'"))
}

/// Verbosity maps 0 to warn, 1 to info, 2 to debug and 3+ to trace.
/// `RUST_LOG` overrides the flag when set.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("schedule_calendar={level},cli={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Convert {
            amount,
            from,
            to,
            hours_per_day,
            hours_per_week,
        } => {
            let defaults = TimeUnitDefaults::new(hours_per_day, hours_per_week);
            println!("{}", Duration::convert(amount, from, to, &defaults));
        }
        Command::Parse {
            text,
            decimal,
            grouping,
        } => {
            let duration = Duration::parse(&text, &NumberFormat::new(decimal, grouping))?;
            println!("{} {:?}", duration.amount(), duration.units());
        }
        Command::Work {
            calendars,
            calendar,
            start,
            finish,
            units,
        } => {
            let store = load_calendars_from_json(&calendars)?;
            let view = store.view(lookup(&store, &calendar)?)?;
            println!("{}", view.work(start, finish, units));
        }
        Command::Normalise {
            calendars,
            calendar,
            input,
            output,
            format,
        } => {
            let store = load_calendars_from_json(&calendars)?;
            let raw = load_timephased_from_csv(&input)?;
            let mut data = TimephasedData::new(lookup(&store, &calendar)?, format, raw, true);
            let normalised = data.data(&store)?;
            match output {
                Some(path) => save_timephased_to_csv(normalised, path)?,
                None => {
                    for span in normalised {
                        let per_day = span.work_per_day.map(|w| w.to_string()).unwrap_or_default();
                        println!("{}\t{}\t{}\t{}", span.start, span.finish, span.total_work, per_day);
                    }
                }
            }
        }
        Command::Dates { recurring } => {
            let data: RecurringData = serde_json::from_reader(File::open(recurring)?)?;
            for date in data.dates() {
                println!("{date}");
            }
        }
    }
    Ok(())
}

fn lookup(store: &ProjectCalendars, name: &str) -> Result<schedule_calendar::CalendarId, Box<dyn Error>> {
    store
        .calendar_by_name(name)
        .ok_or_else(|| format!("unknown calendar '{name}'").into())
}
