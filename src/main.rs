use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::io::{stdout, BufWriter};
use std::path::PathBuf;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use wpimport::config::{Config, Overrides};
use wpimport::import::import;
use wpimport::util::read_input;

/// Converts a WordPress export into a git fast-import stream.
///
/// Example: wpimport --name "Jane" --email jane@example.com < export.xml | git fast-import
#[derive(Debug, Parser)]
#[command(name = "wpimport", version)]
struct Cli {
    /// The WXR export to read; standard input when omitted
    input: Option<PathBuf>,

    /// Committer name (default: git config user.name)
    #[arg(long)]
    name: Option<String>,

    /// Committer email (default: git config user.email)
    #[arg(long)]
    email: Option<String>,

    /// Branch to commit to [default: master]
    #[arg(short, long)]
    branch: Option<String>,

    /// Directory for top-level posts [default: posts]
    #[arg(long, value_name = "DIR")]
    posts_dir: Option<String>,

    /// Directory for top-level pages [default: pages]
    #[arg(long, value_name = "DIR")]
    pages_dir: Option<String>,

    /// WordPress uploads directory to read attachments from
    #[arg(short, long, value_name = "PATH")]
    uploads_dir: Option<PathBuf>,

    /// Path of the redirect ledger file [default: redirects.txt]
    #[arg(long, value_name = "PATH")]
    redirects_file: Option<String>,

    /// Replace non-ASCII characters with HTML character references
    #[arg(long)]
    ascii: bool,

    /// Project file (default: nearest wpimport.yaml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    // The import stream owns stdout, so logs go to stderr.
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    tracing::subscriber::with_default(subscriber, || run(cli))
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(Overrides {
        name: cli.name,
        email: cli.email,
        branch: cli.branch,
        posts_dir: cli.posts_dir,
        pages_dir: cli.pages_dir,
        uploads_dir: cli.uploads_dir,
        redirects_file: cli.redirects_file,
        ascii: cli.ascii,
        config: cli.config,
    })?;
    let input = read_input(cli.input.as_deref())?;

    let summary = import(&input, &config, BufWriter::new(stdout().lock()))
        .context("Importing WordPress export")?;
    tracing::info!(
        items = summary.items,
        commits = summary.commits,
        "done"
    );
    Ok(())
}
