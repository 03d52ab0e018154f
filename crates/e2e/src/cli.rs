//! Command line of the `e2e` test binary
//!
//! The binary runs under `cargo test`, which forwards libtest arguments to
//! every test target. Those are stripped before clap sees them, and a
//! positional test filter selects scenarios the way libtest filters tests.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{Backend, HarnessConfig};
use crate::error::E2eResult;
use crate::playwright::Browser;
use crate::scenarios::{PlaygroundScenario, Scenario};

/// libtest switches without a value
const LIBTEST_SWITCHES: &[&str] = &[
    "--nocapture",
    "--no-capture",
    "--quiet",
    "-q",
    "--show-output",
    "--exact",
    "--ignored",
    "--include-ignored",
    "--test",
    "--bench",
    "--list",
    "--force-run-in-process",
    "--report-time",
    "--ensure-time",
    "--shuffle",
];

/// libtest options that take a value, as `--opt value` or `--opt=value`
const LIBTEST_OPTIONS: &[&str] = &[
    "--test-threads",
    "--format",
    "--skip",
    "--color",
    "--logfile",
    "--shuffle-seed",
    "-Z",
];

#[derive(Parser, Debug)]
#[command(name = "playground-e2e")]
#[command(about = "E2E test runner for the SQL playground")]
pub struct Args {
    /// Harness configuration file (TOML)
    #[arg(short, long, default_value = "e2e.toml")]
    pub config: PathBuf,

    /// Backend to drive
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Directory holding the application (browser backend)
    #[arg(long)]
    pub app_dir: Option<PathBuf>,

    /// Entry document, relative to the application directory
    #[arg(long)]
    pub entry: Option<String>,

    /// Run only these scenarios (repeatable)
    #[arg(short, long)]
    pub name: Vec<String>,

    /// Browser to use (browser backend)
    #[arg(long, value_enum)]
    pub browser: Option<Browser>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Output directory for results
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Test name filters; scenarios whose name contains one are run
    #[arg(hide = true)]
    pub filters: Vec<String>,
}

/// Which scenarios a command line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Named(Vec<String>),
    /// Filters were given and no scenario matches them
    Nothing,
}

impl Args {
    /// Parse the process arguments, ignoring what libtest would consume
    pub fn from_env() -> Self {
        Self::parse_from(strip_libtest_args(std::env::args()))
    }

    pub fn selection(&self) -> Selection {
        let mut names = self.name.clone();
        if !self.filters.is_empty() {
            names.extend(
                PlaygroundScenario::ALL
                    .iter()
                    .map(|s| s.name())
                    .filter(|name| self.filters.iter().any(|f| name.contains(f.as_str())))
                    .filter(|name| !self.name.iter().any(|n| n.as_str() == *name))
                    .map(str::to_string),
            );
        }

        match (names.is_empty(), self.filters.is_empty()) {
            (true, true) => Selection::All,
            (true, false) => Selection::Nothing,
            (false, _) => Selection::Named(names),
        }
    }

    /// Configuration file overridden by the flags
    pub fn load_config(&self) -> E2eResult<HarnessConfig> {
        let mut config = HarnessConfig::load(&self.config)?;

        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(dir) = &self.app_dir {
            config.app.root = dir.clone();
        }
        if let Some(entry) = &self.entry {
            config.app.entry = entry.clone();
        }
        if let Some(browser) = self.browser {
            config.browser.browser = browser;
        }
        if self.headed {
            config.browser.headless = false;
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

/// Drop libtest switches and options (with their values) from `args`
pub fn strip_libtest_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut kept = Vec::new();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        if LIBTEST_SWITCHES.contains(&arg.as_str()) {
            continue;
        }
        if LIBTEST_OPTIONS.contains(&arg.as_str()) {
            args.next();
            continue;
        }
        let is_option_with_value = LIBTEST_OPTIONS
            .iter()
            .any(|opt| arg.strip_prefix(opt).is_some_and(|rest| rest.starts_with('=')));
        if is_option_with_value {
            continue;
        }
        kept.push(arg);
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn parse(args: &[&str]) -> Args {
        let args = strip_libtest_args(args.iter().map(|a| a.to_string()));
        Args::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_no_arguments_runs_everything() {
        let args = parse(&["e2e"]);
        assert_eq!(args.selection(), Selection::All);
        assert_eq!(args.config, PathBuf::from("e2e.toml"));
    }

    #[test]
    fn test_filter_and_thread_count_from_cargo() {
        let args = parse(&["e2e", "test_full_", "--test-threads=1"]);
        assert_eq!(args.filters, vec!["test_full_"]);
        assert_eq!(args.selection(), Selection::Nothing);
    }

    #[test_case(&["e2e", "--test-threads", "4"] ; "separate value")]
    #[test_case(&["e2e", "--format=terse", "--nocapture"] ; "inline value")]
    #[test_case(&["e2e", "--skip", "slow", "-q", "--color", "never"] ; "several")]
    #[test_case(&["e2e", "-Z", "unstable-options", "--include-ignored"] ; "unstable")]
    fn test_libtest_options_are_ignored(args: &[&str]) {
        assert_eq!(parse(args).selection(), Selection::All);
    }

    #[test]
    fn test_filter_selects_matching_scenarios() {
        let args = parse(&["e2e", "load-gist", "--exact"]);
        assert_eq!(
            args.selection(),
            Selection::Named(vec!["load-gist".to_string(), "load-gist-invalid".to_string()])
        );
    }

    #[test]
    fn test_names_and_filters_combine_without_duplicates() {
        let args = parse(&["e2e", "--name", "save", "save"]);
        assert_eq!(
            args.selection(),
            Selection::Named(vec![
                "save".to_string(),
                "save-anonymous".to_string(),
                "save-empty".to_string(),
            ])
        );
    }

    #[test]
    fn test_flags_after_a_filter_still_parse() {
        let args = parse(&["e2e", "change", "--backend", "headless"]);
        assert_eq!(args.backend, Some(Backend::Headless));
        assert_eq!(args.selection(), Selection::Named(vec!["change-name".to_string()]));
    }

    #[test]
    fn test_harness_flags_survive_stripping() {
        let args = parse(&["e2e", "--backend", "browser", "--headed", "--test-threads=2"]);
        assert_eq!(args.backend, Some(Backend::Browser));
        assert!(args.headed);
        assert!(args.filters.is_empty());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("e2e.toml");
        std::fs::write(&config, "backend = \"browser\"\n[app]\nentry = \"a.html\"\n").unwrap();

        let args = parse(&[
            "e2e",
            "--config",
            config.to_str().unwrap(),
            "--backend",
            "headless",
            "--output",
            "out",
        ]);
        let loaded = args.load_config().unwrap();
        assert_eq!(loaded.backend, Backend::Headless);
        assert_eq!(loaded.app.entry, "a.html");
        assert_eq!(loaded.output_dir, PathBuf::from("out"));
    }
}
