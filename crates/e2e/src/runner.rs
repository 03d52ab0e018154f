//! Main test runner that drives scenarios against a launcher

use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::app::Launcher;
use crate::error::E2eResult;
use crate::intercept::InterceptionRegistry;
use crate::recorder::{Assertion, Recorder, Summary};
use crate::scenarios::{PlaygroundScenario, Scenario, ScenarioCx};
use crate::wait::DelayTiers;

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub success: bool,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    /// Set when the scenario aborted before finishing
    pub error: Option<String>,
    pub assertions: Vec<Assertion>,
}

/// Result of running a suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub started_at: DateTime<Utc>,
    pub summary: Summary,
    pub duration_ms: u64,
    pub scenarios: Vec<ScenarioOutcome>,
}

impl SuiteResult {
    pub fn success(&self) -> bool {
        self.summary.success()
    }
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub delays: DelayTiers,
    /// Entry document loaded for every scenario
    pub entry: String,
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            delays: DelayTiers::default(),
            entry: "index.html".to_string(),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

/// Main E2E test runner
///
/// Owns the recorder and interception registry for one run. Scenarios run
/// strictly one after another.
pub struct TestRunner {
    launcher: Box<dyn Launcher>,
    recorder: Recorder,
    registry: InterceptionRegistry,
    delays: DelayTiers,
    entry: String,
    output_dir: PathBuf,
}

impl TestRunner {
    /// Create a new test runner with default configuration
    pub fn new(launcher: impl Launcher + 'static) -> Self {
        Self::with_config(launcher, RunnerConfig::default())
    }

    pub fn with_config(launcher: impl Launcher + 'static, config: RunnerConfig) -> Self {
        Self {
            launcher: Box::new(launcher),
            recorder: Recorder::new(),
            registry: InterceptionRegistry::new(),
            delays: config.delays,
            entry: config.entry,
            output_dir: config.output_dir,
        }
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn registry(&self) -> &InterceptionRegistry {
        &self.registry
    }

    /// Run the full built-in suite
    pub async fn run_all(&self) -> SuiteResult {
        self.run(&PlaygroundScenario::suite()).await
    }

    /// Run built-in scenarios by name, in suite order
    pub async fn run_named(&self, names: &[String]) -> E2eResult<SuiteResult> {
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            selected.push(PlaygroundScenario::from_name(name)?);
        }
        let selected: Vec<PlaygroundScenario> = PlaygroundScenario::ALL
            .into_iter()
            .filter(|s| selected.contains(s))
            .collect();
        let scenarios: Vec<&dyn Scenario> = selected.iter().map(|s| s as &dyn Scenario).collect();
        Ok(self.run(&scenarios).await)
    }

    /// Run scenarios in order and print the summary once at the end
    pub async fn run(&self, scenarios: &[&dyn Scenario]) -> SuiteResult {
        let started_at = Utc::now();
        let start = Instant::now();

        self.recorder.log("Running tests...");
        let mut outcomes = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            outcomes.push(self.run_scenario(*scenario).await);
        }

        let summary = self.recorder.summary();
        SuiteResult {
            started_at,
            summary,
            duration_ms: start.elapsed().as_millis() as u64,
            scenarios: outcomes,
        }
    }

    /// Run one scenario behind an error boundary
    async fn run_scenario(&self, scenario: &dyn Scenario) -> ScenarioOutcome {
        let start = Instant::now();
        let mark = self.recorder.len();
        let name = scenario.name().to_string();

        self.recorder.log(scenario.title());
        debug!("Running scenario: {}", name);

        let cx = ScenarioCx {
            recorder: &self.recorder,
            registry: &self.registry,
            launcher: self.launcher.as_ref(),
            delays: self.delays,
            entry: &self.entry,
        };

        let error = match scenario.run(&cx).await {
            Ok(()) => None,
            Err(e) => {
                error!("Scenario {} aborted: {}", name, e);
                self.recorder.record(format!("{}: aborted: {}", name, e), false);
                Some(e.to_string())
            }
        };

        if !self.registry.is_empty() {
            let leaked = self.registry.active();
            let released = self.registry.release_all();
            warn!("Scenario {} left {} interception(s) active", name, released);
            self.recorder.record(
                format!("{}: interceptions released: {}", name, leaked.join(", ")),
                false,
            );
        }

        let assertions = self.recorder.since(mark);
        let failed = assertions.iter().filter(|a| !a.passed).count();
        let duration_ms = start.elapsed().as_millis() as u64;

        if failed == 0 {
            info!("✓ {} ({} ms)", name, duration_ms);
        } else {
            error!("✗ {} - {} failed assertion(s)", name, failed);
        }

        ScenarioOutcome {
            name,
            success: failed == 0,
            passed: assertions.len() - failed,
            failed,
            duration_ms,
            error,
            assertions,
        }
    }

    /// Stop the launcher's processes and servers
    pub async fn shutdown(self) -> E2eResult<()> {
        self.launcher.shutdown().await
    }

    /// Write suite results to JSON file
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}
