//! movie-dash CLI
//! --------------
//! Loads the movie table once, then either prints the selection lists,
//! renders the four panels for one (genre, year) selection, or starts an
//! interactive prompt that re-renders everything on every selection change.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::warn;

use movie_dash::{
    init_logging, ChartRenderer, Dashboard, DashboardConfig, DataLoader, LogLevel, Selection,
    SvgRenderer, TextRenderer,
};

/// Movie ratings analytics dashboard
#[derive(Parser)]
#[command(name = "movie-dash")]
#[command(about = "Ranked and aggregated charts over a movie ratings table", long_about = None)]
struct Cli {
    /// Path to the delimited movie file
    #[arg(short, long)]
    data: PathBuf,

    /// Field separator of the input file
    #[arg(long, default_value = ",")]
    separator: char,

    /// Log level (RUST_LOG overrides it)
    #[arg(long, default_value = "info")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// SVG files plus index.html
    Svg,
    /// Block bars on stdout
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// List the genres offered for selection
    Genres,

    /// List the years offered for selection
    Years,

    /// Show row counts and cleaning statistics
    Summary,

    /// Render the four panels once
    Render {
        /// Genre to show (defaults to the first genre)
        #[arg(long)]
        genre: Option<String>,

        /// Release year to show (defaults to the first year)
        #[arg(long)]
        year: Option<i32>,

        /// Output directory for SVG output
        #[arg(long, default_value = "dashboard")]
        out: PathBuf,

        #[arg(long, value_enum, default_value = "svg")]
        format: OutputFormat,
    },

    /// Pick genre and year at a prompt; every change re-renders
    Interactive {
        /// Output directory for SVG output
        #[arg(long, default_value = "dashboard")]
        out: PathBuf,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    if !cli.separator.is_ascii() {
        bail!("separator must be a single ASCII character");
    }
    let loader = DataLoader::new().with_separator(cli.separator as u8);

    let dashboard = Dashboard::load(&cli.data, &loader, DashboardConfig::default())
        .with_context(|| format!("failed to load {}", cli.data.display()))?;

    match cli.command {
        Commands::Genres => {
            for genre in dashboard.genres()? {
                println!("{}", genre);
            }
        }
        Commands::Years => {
            for year in dashboard.years()? {
                println!("{}", year);
            }
        }
        Commands::Summary => print_summary(&dashboard)?,
        Commands::Render {
            genre,
            year,
            out,
            format,
        } => {
            let selection = resolve_selection(&dashboard, genre, year)?;
            if let Err(e) = dashboard.validate(&selection) {
                warn!("{}; charts for this selection will be empty", e);
            }
            show(&dashboard, &selection, format, &out)?;
        }
        Commands::Interactive { out, format } => interactive(&dashboard, format, &out)?,
    }

    Ok(())
}

fn print_summary(dashboard: &Dashboard) -> Result<()> {
    let summary = dashboard.summary()?;
    println!("movies:      {}", summary.movies);
    println!("genre rows:  {}", summary.genre_rows);
    println!("genres:      {}", summary.genres);
    println!("years:       {}", summary.years);
    if let Some(report) = dashboard.cleaning_report() {
        println!("raw rows:    {}", report.total_rows);
        println!("dropped:     {}", report.dropped_rows);
        println!("coerced:     {}", report.total_coerced());
    }
    Ok(())
}

fn resolve_selection(dashboard: &Dashboard, genre: Option<String>, year: Option<i32>) -> Result<Selection> {
    let default = dashboard.default_selection()?;
    let genre = genre
        .or_else(|| default.as_ref().map(|s| s.genre.clone()))
        .context("no genre available; the dataset has no browsable rows")?;
    let year = year
        .or_else(|| default.as_ref().map(|s| s.year))
        .context("no year available; the dataset has no browsable rows")?;
    Ok(Selection::new(genre, year))
}

fn renderer_for(dashboard: &Dashboard, format: OutputFormat) -> Box<dyn ChartRenderer> {
    let config = dashboard.config().render;
    match format {
        OutputFormat::Svg => Box::new(SvgRenderer::new(config)),
        OutputFormat::Text => Box::new(TextRenderer::new(config)),
    }
}

/// Full recompute and render for one selection.
fn show(dashboard: &Dashboard, selection: &Selection, format: OutputFormat, out: &Path) -> Result<()> {
    let renderer = renderer_for(dashboard, format);
    match format {
        OutputFormat::Svg => {
            let written = dashboard.write_report(out, selection, renderer.as_ref())?;
            for path in written {
                println!("wrote {}", path.display());
            }
        }
        OutputFormat::Text => {
            let panels = dashboard.panels(selection)?;
            for panel in dashboard.render_panels(&panels, renderer.as_ref())? {
                println!("{}", panel.body);
            }
        }
    }
    Ok(())
}

const PROMPT_HELP: &str = "Commands:
  genre <name>   select a genre
  year <year>    select a release year
  show           render again
  genres         list genres
  years          list years
  help           show this help
  quit | exit    leave";

fn interactive(dashboard: &Dashboard, format: OutputFormat, out: &Path) -> Result<()> {
    let mut selection = dashboard
        .default_selection()?
        .context("the dataset has no browsable rows")?;

    let mut rl = DefaultEditor::new()?;
    println!("{}", PROMPT_HELP);
    show(dashboard, &selection, format, out)?;

    loop {
        let line = match rl.readline(&format!("[{}]> ", selection)) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line);

        let (command, argument) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        let candidate = match command {
            "quit" | "exit" => break,
            "help" => {
                println!("{}", PROMPT_HELP);
                continue;
            }
            "genres" => {
                println!("{}", dashboard.genres()?.join(", "));
                continue;
            }
            "years" => {
                let years: Vec<String> = dashboard.years()?.iter().map(i32::to_string).collect();
                println!("{}", years.join(", "));
                continue;
            }
            "show" => selection.clone(),
            "genre" => Selection::new(argument, selection.year),
            "year" => match argument.parse::<i32>() {
                Ok(year) => Selection::new(selection.genre.clone(), year),
                Err(_) => {
                    println!("not a year: {}", argument);
                    continue;
                }
            },
            other => {
                println!("unknown command: {} (try help)", other);
                continue;
            }
        };

        if let Err(e) = dashboard.validate(&candidate) {
            println!("{}", e);
            continue;
        }
        selection = candidate;
        show(dashboard, &selection, format, out)?;
    }

    Ok(())
}
