use std::error::Error;
use std::io::{self, stdin, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{Local, NaiveDateTime};
use clap::{error::ErrorKind, Args, CommandFactory, Parser, Subcommand};
use crossterm::{
    cursor::MoveToColumn,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType},
    tty::IsTty,
};
use tracing_subscriber::EnvFilter;

use deer_timer::{
    charting::{chart_ceiling, format_label, render_bar},
    clock::SystemClock,
    config::{Config, ConfigStore, FileConfigStore},
    draft::{FieldUpdate, SessionDraft},
    runtime::{CrosstermEventSource, FixedTicker, Runner},
    service::TimerService,
    session::{Catalog, Session},
    stats::{self, Milestone, Period},
    store::{JsonSessionStore, SessionLog},
    timer::TimerSnapshot,
    track::{Finish, TrackSession},
    util::{format_clock, format_duration},
};

const BAR_WIDTH: usize = 30;

/// habit timer with a local session log and period statistics
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "A stopwatch for a personal habit. Finished sessions go to a local log, \
                  which `deer stats` summarises by week, month and year."
)]
pub struct Cli {
    /// session log to use instead of the configured one
    #[arg(long, global = true, value_name = "PATH")]
    data_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// run the stopwatch and record the session when finished
    Track(TrackArgs),
    /// list recorded sessions
    Log {
        /// only show the most recent N sessions
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// week, month and year statistics
    Stats,
    /// write the session log as CSV
    Export {
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
}

/// Details recorded with the session
#[derive(Args, Debug)]
struct TrackArgs {
    /// anything worth remembering
    #[arg(long)]
    remark: Option<String>,

    /// where it happened
    #[arg(long)]
    location: Option<String>,

    /// props label (see the config file for the allowed set)
    #[arg(long)]
    props: Option<String>,

    /// mood label (see the config file for the allowed set)
    #[arg(long)]
    mood: Option<String>,

    /// watched a movie
    #[arg(long)]
    movie: bool,

    /// finished with a climax
    #[arg(long)]
    climax: bool,

    /// rating from 0.0 to 5.0
    #[arg(long, default_value_t = 0.0)]
    rating: f32,
}

impl TrackArgs {
    fn updates(&self) -> Vec<FieldUpdate> {
        let mut updates = vec![
            FieldUpdate::WatchedMovie(self.movie),
            FieldUpdate::Climax(self.climax),
            FieldUpdate::Rating(self.rating),
        ];
        updates.extend(self.remark.clone().map(FieldUpdate::Remark));
        updates.extend(self.location.clone().map(FieldUpdate::Location));
        updates.extend(self.props.clone().map(FieldUpdate::Props));
        updates.extend(self.mood.clone().map(FieldUpdate::Mood));
        updates
    }

    fn warn_unknown_labels(&self, catalog: &Catalog) {
        if let Some(props) = self.props.as_deref().filter(|p| !catalog.props.contains(p)) {
            eprintln!(
                "unknown props '{props}', using '{}'",
                catalog.props.default_label()
            );
        }
        if let Some(mood) = self.mood.as_deref().filter(|m| !catalog.moods.contains(m)) {
            eprintln!(
                "unknown mood '{mood}', using '{}'",
                catalog.moods.default_label()
            );
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("deer: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = FileConfigStore::new().load();
    let catalog = config.catalog();
    let store = JsonSessionStore::with_path(config.sessions_path(cli.data_file.as_deref()));
    let mut log = SessionLog::open(store, &catalog);

    if let Some(e) = log.load_error() {
        eprintln!("warning: {e}; starting with an empty log");
    }

    match cli.command {
        Command::Track(args) => track(&args, &config, &catalog, &mut log),
        Command::Log { limit } => {
            print_log(log.sessions(), limit);
            Ok(())
        }
        Command::Stats => {
            print_stats(&log.snapshot(), Local::now().naive_local());
            Ok(())
        }
        Command::Export { output } => export_csv(log.sessions(), &output),
    }
}

fn track(
    args: &TrackArgs,
    config: &Config,
    catalog: &Catalog,
    log: &mut SessionLog<JsonSessionStore>,
) -> Result<(), Box<dyn Error>> {
    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }
    log.ensure_writable()?;
    args.warn_unknown_labels(catalog);

    let ticker = FixedTicker::from_millis(config.tick_interval_ms);
    let timer = TimerService::spawn(SystemClock, ticker);

    let draft = args
        .updates()
        .into_iter()
        .fold(SessionDraft::default(), |d, u| d.with(u));

    let stopwatch = TrackSession::begin(timer)?;
    let runner = Runner::new(CrosstermEventSource::new(), ticker);
    enable_raw_mode()?;
    let outcome = stopwatch.run(&runner, draw);
    disable_raw_mode()?;
    println!();

    match outcome? {
        Finish::Save(elapsed) => {
            let session = draft.materialize(catalog, Local::now().naive_local(), elapsed);
            log.append(session)?;
            println!(
                "Saved a {} session ({} today).",
                format_clock(elapsed),
                stats::count_on_day(log.sessions(), Local::now().date_naive())
            );
        }
        Finish::Discard => println!("Discarded."),
    }
    Ok(())
}

fn draw(snapshot: &TimerSnapshot) -> io::Result<()> {
    let mut out = io::stdout();
    execute!(out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
    write!(
        out,
        "{:>8}  {:<8} [space] pause/resume  [enter] finish  [esc] discard",
        format_clock(snapshot.elapsed_secs),
        snapshot.state
    )?;
    out.flush()
}

fn print_log(sessions: &[Session], limit: Option<usize>) {
    if sessions.is_empty() {
        println!("No sessions recorded yet.");
        return;
    }

    let skip = limit.map_or(0, |n| sessions.len().saturating_sub(n));
    for s in sessions.iter().skip(skip) {
        let mut flags = Vec::new();
        if s.watched_movie {
            flags.push("movie");
        }
        if s.climax {
            flags.push("climax");
        }
        println!(
            "{}  {:>8}  {} / {}  {:.1}/5  {}  {}  {}",
            s.timestamp.format("%Y-%m-%d %H:%M"),
            format_clock(s.duration),
            s.props,
            s.mood,
            s.rating,
            flags.join(","),
            s.location,
            s.remark
        );
    }
}

fn print_stats(sessions: &[Session], now: NaiveDateTime) {
    if sessions.is_empty() {
        println!("No statistics yet. Finish a session with `deer track` first.");
        return;
    }

    if let Some(latest) = stats::latest_summary(sessions, now.date()) {
        println!(
            "Latest: {} {}, lasted {} ({})",
            latest.display_date(),
            latest.timestamp.format("%H:%M"),
            format_duration(latest.duration),
            latest.streak_note()
        );
    }

    let all = stats::overall(sessions);
    println!(
        "Overall: {} in {} sessions, {:.1} min on average",
        format_duration(all.total_seconds),
        all.count,
        all.average_minutes
    );
    println!(
        "  {}",
        Milestone::for_count(all.count).message(&mut rand::thread_rng())
    );
    println!(
        "  week {} / month {} / year {}",
        stats::period_count(sessions, Period::Week, now),
        stats::period_count(sessions, Period::Month, now),
        stats::period_count(sessions, Period::Year, now)
    );

    let week_start = Period::Week.start(now).date();
    let week = stats::group_by_day(sessions, week_start, week_start + chrono::Duration::days(6));
    print_period(
        sessions,
        Period::Week,
        now,
        week.iter().map(|b| (b.label.as_str(), b.minutes)),
    );

    let month = stats::month_daily(sessions, now);
    print_period(
        sessions,
        Period::Month,
        now,
        month.iter().map(|b| (b.label.as_str(), b.minutes)),
    );

    let year = stats::group_by_month(sessions, chrono::Datelike::year(&now));
    print_period(
        sessions,
        Period::Year,
        now,
        year.iter().map(|b| (b.label.as_str(), b.minutes)),
    );
}

fn print_period<'a>(
    sessions: &[Session],
    period: Period,
    now: NaiveDateTime,
    bars: impl Iterator<Item = (&'a str, f64)>,
) {
    let agg = stats::period_aggregate(sessions, period, now);
    println!();
    println!(
        "{period}: {} total, {:.1} min on average",
        format_duration(agg.total_seconds),
        agg.average_minutes
    );

    let bars: Vec<(&str, f64)> = bars.collect();
    if bars.is_empty() {
        println!("  no data");
        return;
    }
    let ceiling = chart_ceiling(&bars.iter().map(|(_, m)| *m).collect::<Vec<_>>());
    for (label, minutes) in bars {
        println!(
            "  {label:>3} {} {}",
            render_bar(minutes, ceiling, BAR_WIDTH),
            format_label(minutes)
        );
    }
}

fn export_csv(sessions: &[Session], output: &Path) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(output)?;
    for s in sessions {
        wtr.serialize(s)?;
    }
    wtr.flush()?;
    println!("Exported {} sessions to {}", sessions.len(), output.display());
    Ok(())
}
