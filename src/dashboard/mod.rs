// src/dashboard/mod.rs

pub mod command;
pub mod render;

use anyhow::{Context, Result};
use std::{
    io::Write,
    path::{Path, PathBuf},
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use crate::export;
use crate::fetch::CsvSource;
use crate::load::{DataLoader, Loaded};
use crate::pipeline::{build_view, DashboardView, FilterSelection};
use command::{parse_command, Command, HELP};
pub use render::{render_dashboard, DisplaySettings};

/// The two signals the front end can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Recompute now; the loader re-fetches only if its cache expired.
    Reload,
    /// Forget the cached data; the next reload re-fetches.
    ClearCache,
}

/// Loader, current selection and the last load result, recomputed on
/// every trigger.
pub struct Dashboard<S> {
    loader: DataLoader<S>,
    settings: DisplaySettings,
    selection: FilterSelection,
    current: Option<Loaded>,
    export_path: PathBuf,
}

impl<S: CsvSource> Dashboard<S> {
    pub fn new(loader: DataLoader<S>, settings: DisplaySettings) -> Self {
        Self {
            loader,
            settings,
            selection: FilterSelection::default(),
            current: None,
            export_path: PathBuf::from(export::EXPORT_FILE_NAME),
        }
    }

    /// Where `export` without a path writes to.
    pub fn with_export_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_path = path.into();
        self
    }

    pub fn loader(&self) -> &DataLoader<S> {
        &self.loader
    }

    pub fn settings_mut(&mut self) -> &mut DisplaySettings {
        &mut self.settings
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: FilterSelection) {
        self.selection = selection;
    }

    pub async fn trigger(&mut self, trigger: Trigger) {
        debug!(?trigger, "trigger");
        match trigger {
            Trigger::Reload => self.current = Some(self.loader.load().await),
            Trigger::ClearCache => self.loader.invalidate(),
        }
    }

    /// Load once if nothing has been loaded yet.
    pub async fn ensure_loaded(&mut self) -> &Loaded {
        let loaded = match self.current.take() {
            Some(loaded) => loaded,
            None => self.loader.load().await,
        };
        self.current.insert(loaded)
    }

    /// `None` when nothing is loaded or the dataset is empty.
    pub fn view(&self) -> Option<DashboardView<'_>> {
        let loaded = self.current.as_ref()?;
        build_view(&loaded.dataset, &self.selection, self.settings.top_n)
    }

    pub fn render(&self) -> String {
        match &self.current {
            Some(loaded) => render_dashboard(loaded, &self.selection, &self.settings),
            None => "Nothing loaded yet.\n".to_string(),
        }
    }

    /// Filtered rows as CSV; `None` when there is no data to export.
    pub fn export_csv(&self) -> Result<Option<Vec<u8>>> {
        let (Some(loaded), Some(view)) = (self.current.as_ref(), self.view()) else {
            return Ok(None);
        };
        export::to_csv_bytes(&loaded.dataset.columns, &view.records).map(Some)
    }

    /// Returns the number of rows written, `None` when there was no data.
    pub fn export_to(&self, path: &Path) -> Result<Option<usize>> {
        let (Some(loaded), Some(view)) = (self.current.as_ref(), self.view()) else {
            return Ok(None);
        };
        export::export_to_path(&loaded.dataset.columns, &view.records, path)?;
        Ok(Some(view.records.len()))
    }

    /// Filter choices, one line per field.
    pub fn options_text(&self) -> String {
        match self.view() {
            Some(view) => {
                let mut out = String::new();
                out.push_str(&format!("months:       {}\n", view.options.months.join(" | ")));
                out.push_str(&format!("cost centers: {}\n", view.options.cost_centers.join(" | ")));
                out.push_str(&format!("items:        {}\n", view.options.items.join(" | ")));
                out
            }
            None => "No data.\n".to_string(),
        }
    }

    /// Apply one session command. Returns `false` once the session should end.
    ///
    /// Every command that shows data goes back through the loader first, so
    /// an expired or cleared cache is re-fetched before anything is drawn.
    pub async fn execute<W: Write>(&mut self, cmd: Command, out: &mut W) -> Result<bool> {
        match &cmd {
            Command::Help => {
                write!(out, "{}", HELP)?;
                return Ok(true);
            }
            Command::Quit => return Ok(false),
            Command::ClearCache => {
                self.trigger(Trigger::ClearCache).await;
                writeln!(out, "cache cleared")?;
                return Ok(true);
            }
            Command::Refresh => self.trigger(Trigger::ClearCache).await,
            Command::Months(m) => self.selection.months = m.clone(),
            Command::CostCenters(cc) => self.selection.cost_centers = cc.clone(),
            Command::Items(items) => self.selection.items = items.clone(),
            Command::Reset => self.selection = FilterSelection::default(),
            Command::Details(on) => self.settings.detail_expanded = *on,
            Command::Show | Command::Reload | Command::Options | Command::Export(_) => {}
        }
        self.trigger(Trigger::Reload).await;

        match cmd {
            Command::Options => write!(out, "{}", self.options_text())?,
            Command::Export(path) => {
                let path = path.unwrap_or_else(|| self.export_path.clone());
                match self.export_to(&path)? {
                    Some(rows) => writeln!(out, "wrote {} rows to {}", rows, path.display())?,
                    None => writeln!(out, "No data.")?,
                }
            }
            _ => write!(out, "{}", self.render())?,
        }
        Ok(true)
    }

    /// Read commands line by line until `quit` or end of input.
    pub async fn run_session<R, W>(&mut self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        self.ensure_loaded().await;
        write!(out, "{}", self.render())?;
        out.flush()?;

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await.context("reading session input")? {
            let cmd = match parse_command(&line) {
                Ok(Some(cmd)) => cmd,
                Ok(None) => continue,
                Err(e) => {
                    warn!(input = %line, "bad command");
                    writeln!(out, "{}", e)?;
                    continue;
                }
            };
            if !self.execute(cmd, out).await? {
                break;
            }
            out.flush()?;
        }
        info!("session ended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MemorySource;
    use std::time::Duration;
    use tempfile::tempdir;

    const CSV: &str = "\
Issue date,Requesting Cost Center,Item Code,Item Name,Issue Quantity,Line Item Total
2026-01-15,A,C-01,Cups,10,1000
2026-01-20,B,C-01,Cups,5,500
2025-12-10,A,S-02,Sugar,4,80
";

    fn dashboard(src: MemorySource) -> Dashboard<MemorySource> {
        Dashboard::new(
            DataLoader::new(src, Duration::from_secs(60)),
            DisplaySettings::default(),
        )
    }

    #[tokio::test]
    async fn reload_uses_cache_until_cleared() {
        let mut dash = dashboard(MemorySource::new("mem", CSV));
        dash.trigger(Trigger::Reload).await;
        dash.trigger(Trigger::Reload).await;
        assert_eq!(dash.loader().source().fetch_count(), 1);

        dash.trigger(Trigger::ClearCache).await;
        assert_eq!(dash.loader().source().fetch_count(), 1);
        dash.trigger(Trigger::Reload).await;
        assert_eq!(dash.loader().source().fetch_count(), 2);
    }

    #[tokio::test]
    async fn empty_source_reports_no_data() {
        let mut dash = dashboard(MemorySource::new("mem", ""));
        dash.ensure_loaded().await;
        assert!(dash.view().is_none());
        let text = dash.render();
        assert!(text.starts_with("Error loading data:"));
        assert!(text.ends_with("No data.\n"));
        assert_eq!(dash.export_csv().unwrap(), None);
    }

    #[tokio::test]
    async fn header_only_source_reports_no_data_without_error() {
        let mut dash = dashboard(MemorySource::new("mem", "Issue date,Item Name\n"));
        dash.ensure_loaded().await;
        assert_eq!(dash.render(), "No data.\n");
    }

    #[tokio::test]
    async fn selection_drives_view() {
        let mut dash = dashboard(MemorySource::new("mem", CSV));
        dash.ensure_loaded().await;
        assert_eq!(dash.view().unwrap().metrics.total_spend, 1500.0);

        dash.set_selection(FilterSelection::default().all_months().with_cost_centers(["A"]));
        let view = dash.view().unwrap();
        assert_eq!(view.metrics.total_spend, 1080.0);
        assert_eq!(view.metrics.unique_items, 2);
    }

    #[tokio::test]
    async fn session_runs_commands() -> Result<()> {
        let mut dash = dashboard(MemorySource::new("mem", CSV));
        let input: &[u8] = b"month all\ncc A\nbogus\noptions\nrefresh\nquit\nshow\n";
        let mut out = Vec::new();
        dash.run_session(input, &mut out).await?;
        let text = String::from_utf8(out)?;

        assert!(text.contains("Overview: Jan-2026"));
        assert!(text.contains("Overview: All Time"));
        assert!(text.contains("Total Spend   ₹1,080.00"));
        assert!(text.contains("unknown command `bogus`"));
        assert!(text.contains("months:       Jan-2026 | Dec-2025"));
        // initial load + refresh
        assert_eq!(dash.loader().source().fetch_count(), 2);
        assert_eq!(dash.selection().cost_centers.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn filter_change_refetches_expired_cache() -> Result<()> {
        let mut dash = Dashboard::new(
            DataLoader::new(MemorySource::new("mem", CSV), Duration::ZERO),
            DisplaySettings::default(),
        );
        dash.ensure_loaded().await;
        dash.loader()
            .source()
            .set_body(Some(CSV.replace(",1000\n", ",9999\n").into_bytes()));

        let mut out = Vec::new();
        dash.execute(Command::CostCenters(["A".to_string()].into()), &mut out)
            .await?;
        let text = String::from_utf8(out)?;
        assert!(text.contains("Total Spend   ₹9,999.00"), "{text}");
        assert_eq!(dash.loader().source().fetch_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn filter_change_after_clear_cache_shows_new_data() -> Result<()> {
        let mut dash = dashboard(MemorySource::new("mem", CSV));
        dash.ensure_loaded().await;
        dash.loader()
            .source()
            .set_body(Some(CSV.replace(",1000\n", ",9999\n").into_bytes()));

        let mut out = Vec::new();
        dash.execute(Command::Months(Some(Default::default())), &mut out)
            .await?;
        assert!(String::from_utf8(out)?.contains("Total Spend   ₹1,580.00"));

        let mut out = Vec::new();
        dash.execute(Command::ClearCache, &mut out).await?;
        dash.execute(Command::CostCenters(["A".to_string()].into()), &mut out)
            .await?;
        let text = String::from_utf8(out)?;
        assert!(text.starts_with("cache cleared\n"));
        assert!(text.contains("Total Spend   ₹10,079.00"), "{text}");
        assert_eq!(dash.loader().source().fetch_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn session_export_writes_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.csv");
        let mut dash = dashboard(MemorySource::new("mem", CSV));
        let script = format!("month all\nexport {}\n", path.display());
        let mut out = Vec::new();
        dash.run_session(script.as_bytes(), &mut out).await?;

        let text = String::from_utf8(out)?;
        assert!(text.contains("wrote 3 rows"));
        let csv = std::fs::read_to_string(&path)?;
        assert_eq!(csv.lines().count(), 4);
        Ok(())
    }
}
