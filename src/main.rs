//! Netflix title query CLI

use clap::{Parser, Subcommand};
use netflix_query::cli::{OutputFormat, OutputFormatter};
use netflix_query::dashboard::{Dashboard, Request};
use netflix_query::physical::RuntimeBucket;
use netflix_query::storage::{CsvOptions, DEFAULT_DELIMITER};
use netflix_query::{QueryError, Result, SharedTable};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "netflix-query")]
#[command(about = "Query IMDB scores of Netflix titles")]
struct Cli {
    /// Path to the titles CSV file
    #[arg(short, long)]
    data: PathBuf,

    /// Field delimiter of the CSV file
    #[arg(long, default_value_t = DEFAULT_DELIMITER as char)]
    delimiter: char,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Maximum number of rows to print per table
    #[arg(long)]
    max_rows: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// First rows and summary statistics
    Overview {
        /// Number of leading rows to show
        #[arg(short, long, default_value = "5")]
        rows: usize,
    },

    /// Titles of one type, release year and age certification
    ByYear {
        /// Title type, e.g. Movie or Show
        #[arg(short = 't', long = "type")]
        kind: String,

        /// Release year
        #[arg(short, long)]
        year: i64,

        /// Age certification, e.g. TV-MA
        #[arg(short, long)]
        certification: String,
    },

    /// Titles in a runtime bucket
    ByRuntime {
        /// short (<60), typical (60-120) or long (>120)
        #[arg(short, long)]
        bucket: RuntimeBucket,
    },

    /// Mean IMDB score per age certification
    Certification,

    /// Highest rated titles
    Top {
        /// Number of titles
        #[arg(short, long, default_value = "10")]
        n: usize,
    },

    /// Mean IMDB votes per type
    VotesByType,

    /// Details of one title
    Title {
        /// Exact title name
        #[arg(short, long)]
        name: String,
    },

    /// Correlation matrix of the numeric columns
    Correlation,

    /// Run a dashboard request given as JSON, e.g. '{"view": "top-rated", "n": 5}'
    Request {
        /// Request object with a "view" tag and its parameters
        json: String,
    },

    /// Distinct values of a column
    Options {
        /// Column name
        #[arg(short, long)]
        column: String,
    },
}

impl Commands {
    fn into_request(self) -> Result<Option<Request>> {
        let request = match self {
            Commands::Overview { rows } => Request::Overview { rows },
            Commands::ByYear {
                kind,
                year,
                certification,
            } => Request::ByReleaseYear {
                kind,
                release_year: year,
                age_certification: certification,
            },
            Commands::ByRuntime { bucket } => Request::ByRuntime { bucket },
            Commands::Certification => Request::CertificationScores,
            Commands::Top { n } => Request::TopRated { n },
            Commands::VotesByType => Request::VotesByType,
            Commands::Title { name } => Request::TitleInfo { title: name },
            Commands::Correlation => Request::Correlation,
            Commands::Request { json } => Request::from_json(&json)?,
            Commands::Options { .. } => return Ok(None),
        };
        Ok(Some(request))
    }
}

fn main() -> ExitCode {
    // Set up logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let delimiter = u8::try_from(cli.delimiter).map_err(|_| {
        QueryError::InvalidArgument(format!("delimiter must be a single byte: {:?}", cli.delimiter))
    })?;

    let table = SharedTable::from_csv(cli.data, CsvOptions::new().with_delimiter(delimiter));
    let dashboard = Dashboard::from_shared(&table)?;

    let mut formatter = OutputFormatter::new(cli.format);
    if let Some(max) = cli.max_rows {
        formatter = formatter.with_max_rows(max);
    }

    let mut stdout = io::stdout().lock();
    match cli.command {
        Commands::Options { column } => {
            for value in dashboard.options(&column)? {
                writeln!(stdout, "{}", value)?;
            }
        }
        command => {
            if let Some(request) = command.into_request()? {
                let response = dashboard.handle(&request)?;
                formatter.write_response(&mut stdout, &response)?;
            }
        }
    }
    stdout.flush()?;
    Ok(())
}
