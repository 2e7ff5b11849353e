// src/dashboard/command.rs

use anyhow::{bail, Result};
use std::{collections::BTreeSet, path::PathBuf};

pub const HELP: &str = "\
commands:
  show                     render the dashboard
  options                  list months, cost centers and items
  month <a; b>             restrict months (`month all` for every month, `month` for the latest)
  cc <a; b>                restrict cost centers (`cc` alone clears)
  item <a; b>              restrict items (`item` alone clears)
  reset                    drop every filter
  reload                   recompute, re-fetching only if the cache expired
  clear-cache              forget the cached data
  refresh                  clear-cache + reload
  details on|off           expand or collapse the data log
  export [path]            write the filtered rows as CSV
  help                     this text
  quit                     leave
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    Options,
    /// `None` restores the default (latest month).
    Months(Option<BTreeSet<String>>),
    CostCenters(BTreeSet<String>),
    Items(BTreeSet<String>),
    Reset,
    Reload,
    ClearCache,
    Refresh,
    Details(bool),
    Export(Option<PathBuf>),
    Help,
    Quit,
}

/// Values are `;`-separated since names may contain commas and spaces.
fn values(rest: &str) -> BTreeSet<String> {
    rest.split(';')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse one input line. `Ok(None)` for blank lines.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    let cmd = match word.to_ascii_lowercase().as_str() {
        "show" | "s" => Command::Show,
        "options" | "o" => Command::Options,
        "month" | "months" | "m" => {
            if rest.is_empty() {
                Command::Months(None)
            } else if rest.eq_ignore_ascii_case("all") {
                Command::Months(Some(BTreeSet::new()))
            } else {
                Command::Months(Some(values(rest)))
            }
        }
        "cc" | "cost-center" => Command::CostCenters(values(rest)),
        "item" | "items" => Command::Items(values(rest)),
        "reset" => Command::Reset,
        "reload" | "r" => Command::Reload,
        "clear-cache" => Command::ClearCache,
        "refresh" => Command::Refresh,
        "details" => match rest.to_ascii_lowercase().as_str() {
            "on" | "" => Command::Details(true),
            "off" => Command::Details(false),
            other => bail!("details takes `on` or `off`, got `{}`", other),
        },
        "export" => Command::Export((!rest.is_empty()).then(|| PathBuf::from(rest))),
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => bail!("unknown command `{}` (try `help`)", other),
    };
    Ok(Some(cmd))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(v: &[&str]) -> BTreeSet<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_filters() -> Result<()> {
        assert_eq!(
            parse_command("month Jan-2026; Feb-2026")?,
            Some(Command::Months(Some(set(&["Jan-2026", "Feb-2026"]))))
        );
        assert_eq!(parse_command("month all")?, Some(Command::Months(Some(set(&[])))));
        assert_eq!(parse_command("month")?, Some(Command::Months(None)));
        assert_eq!(
            parse_command("cc  Kitchen, Main ; Bar ")?,
            Some(Command::CostCenters(set(&["Kitchen, Main", "Bar"])))
        );
        assert_eq!(parse_command("item")?, Some(Command::Items(set(&[]))));
        Ok(())
    }

    #[test]
    fn parses_triggers_and_misc() -> Result<()> {
        assert_eq!(parse_command("  ")?, None);
        assert_eq!(parse_command("RELOAD")?, Some(Command::Reload));
        assert_eq!(parse_command("clear-cache")?, Some(Command::ClearCache));
        assert_eq!(parse_command("refresh")?, Some(Command::Refresh));
        assert_eq!(parse_command("details off")?, Some(Command::Details(false)));
        assert_eq!(parse_command("export")?, Some(Command::Export(None)));
        assert_eq!(
            parse_command("export /tmp/out.csv")?,
            Some(Command::Export(Some(PathBuf::from("/tmp/out.csv"))))
        );
        assert_eq!(parse_command("q")?, Some(Command::Quit));
        Ok(())
    }

    #[test]
    fn rejects_unknown() {
        assert!(parse_command("frobnicate").is_err());
        assert!(parse_command("details maybe").is_err());
    }
}
