use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::{
    io::{self, Read, Write},
    path::PathBuf,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use supplydash::{
    config::{Config, Density},
    dashboard::{Dashboard, DisplaySettings},
    fetch::{CsvSource, FileSource, HttpSource, MemorySource},
    load::DataLoader,
    pipeline::FilterSelection,
};

/// Requisition / issue log analytics.
#[derive(Parser, Debug)]
#[command(name = "supplydash", version)]
struct Cli {
    /// YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// CSV export URL, overrides the config
    #[arg(long, global = true, env = "SUPPLYDASH_SOURCE_URL")]
    url: Option<String>,

    /// Read the log from a local CSV file instead (`-` for stdin); wins over `--url`
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    /// Layout density; compact keeps 8 groups per table, comfortable 10
    #[arg(long, global = true, value_enum)]
    density: Option<Density>,

    /// Cache lifetime in seconds
    #[arg(long, global = true)]
    ttl: Option<u64>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Month label such as `Jan-2026`; repeatable. Defaults to the latest month.
    #[arg(long = "month")]
    months: Vec<String>,

    /// Do not restrict by month
    #[arg(long, conflicts_with = "months")]
    all_months: bool,

    /// Requesting cost center; repeatable
    #[arg(long = "cost-center")]
    cost_centers: Vec<String>,

    /// Item name; repeatable
    #[arg(long = "item")]
    items: Vec<String>,
}

impl FilterArgs {
    fn selection(&self) -> FilterSelection {
        let mut sel = FilterSelection::default()
            .with_cost_centers(self.cost_centers.iter().cloned())
            .with_items(self.items.iter().cloned());
        if self.all_months {
            sel = sel.all_months();
        } else if !self.months.is_empty() {
            sel = sel.with_months(self.months.iter().cloned());
        }
        sel
    }
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print KPIs, top cost centers and items
    Show {
        #[command(flatten)]
        filters: FilterArgs,

        /// Expand the data log
        #[arg(long)]
        details: bool,
    },
    /// List the months, cost centers and items available for filtering
    Options,
    /// Write the filtered rows as CSV
    Export {
        #[command(flatten)]
        filters: FilterArgs,

        /// Output path, `-` for stdout; defaults to the configured file name
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Show normalized headers and coercion counts for the source
    Inspect,
    /// Interactive session reading commands from stdin
    Session,
}

#[tokio::main]
async fn main() -> Result<()> {
    // logs on stderr, reports and CSV on stdout
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,supplydash=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut cfg = Config::load(cli.config.as_deref())?;
    if let Some(url) = &cli.url {
        cfg.source_url = url.clone();
    }
    if let Some(d) = cli.density {
        cfg.density = d;
    }
    if let Some(ttl) = cli.ttl {
        cfg.cache_ttl_secs = ttl;
    }
    cfg.validate()?;

    match cli.file.clone() {
        Some(path) if path.as_os_str() == "-" => {
            if matches!(cli.command, Cmd::Session) {
                bail!("`--file -` cannot be combined with `session`, which reads commands from stdin");
            }
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            run(cli, cfg, MemorySource::new("stdin", buf)).await
        }
        Some(path) => {
            let src = FileSource::new(&path);
            run(cli, cfg, src).await
        }
        None => {
            let src = HttpSource::new(cfg.source_url()?, cfg.request_timeout())?;
            run(cli, cfg, src).await
        }
    }
}

async fn run<S: CsvSource>(cli: Cli, cfg: Config, source: S) -> Result<()> {
    info!(source = %source.id(), density = ?cfg.density, ttl_secs = cfg.cache_ttl_secs, "starting");
    let loader = DataLoader::new(source, cfg.cache_ttl());
    let mut dash = Dashboard::new(loader, DisplaySettings::from(&cfg))
        .with_export_path(&cfg.export_file_name);
    let mut stdout = io::stdout();

    match cli.command {
        Cmd::Show { filters, details } => {
            dash.set_selection(filters.selection());
            if details {
                dash.settings_mut().detail_expanded = true;
            }
            dash.ensure_loaded().await;
            write!(stdout, "{}", dash.render())?;
        }
        Cmd::Options => {
            dash.ensure_loaded().await;
            write!(stdout, "{}", dash.options_text())?;
        }
        Cmd::Export { filters, out } => {
            dash.set_selection(filters.selection());
            dash.ensure_loaded().await;
            match out {
                Some(p) if p.as_os_str() == "-" => match dash.export_csv()? {
                    Some(bytes) => stdout.write_all(&bytes)?,
                    None => warn!("No data."),
                },
                other => {
                    let path = other.unwrap_or_else(|| PathBuf::from(&cfg.export_file_name));
                    match dash.export_to(&path)? {
                        Some(rows) => eprintln!("wrote {} rows to {}", rows, path.display()),
                        None => warn!("No data."),
                    }
                }
            }
        }
        Cmd::Inspect => {
            let ds = dash.loader().fetch_dataset().await?;
            writeln!(stdout, "source:  {}", dash.loader().source().id())?;
            writeln!(stdout, "rows:    {}", ds.stats.rows)?;
            writeln!(stdout, "columns:")?;
            for c in &ds.columns {
                writeln!(stdout, "  {}", c)?;
            }
            writeln!(stdout, "unparsable dates:       {}", ds.stats.unparsable_dates)?;
            writeln!(stdout, "numeric cells zeroed:   {}", ds.stats.coerced_numbers)?;
        }
        Cmd::Session => {
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            dash.run_session(input, &mut stdout).await?;
        }
    }
    stdout.flush()?;
    Ok(())
}
