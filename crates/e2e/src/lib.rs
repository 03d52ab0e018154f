//! SQL Playground E2E Test Harness
//!
//! This crate drives a browser-hosted SQL playground through its user-facing
//! flows and reports a pass/fail summary:
//! - Records named assertions without aborting on failure
//! - Swaps gateway methods for scripted stubs and restores them afterwards
//! - Waits fixed tiers for the application to settle
//! - Runs the scenario suite against a headless or browser backend
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── Recorder               record / summary              │
//! │    ├── InterceptionRegistry   intercept / release           │
//! │    └── run(scenarios) -> SuiteResult                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario (13 built-in)                                     │
//! │    └── ScenarioCx::load_application -> ApplicationHandle    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Launcher / Playground                                      │
//! │    ├── HeadlessLauncher    in-process, SQLite               │
//! │    └── PlaywrightLauncher  StaticServer + node bridge       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod headless;
pub mod intercept;
pub mod playwright;
pub mod recorder;
pub mod runner;
pub mod scenarios;
pub mod server;
pub mod wait;

pub use app::{ApplicationHandle, Launcher, Playground};
pub use config::{Backend, HarnessConfig};
pub use error::{E2eError, E2eResult};
pub use headless::HeadlessLauncher;
pub use intercept::InterceptionRegistry;
pub use playwright::PlaywrightLauncher;
pub use recorder::{Recorder, Summary};
pub use runner::{RunnerConfig, SuiteResult, TestRunner};
pub use scenarios::{PlaygroundScenario, Scenario, ScenarioCx};
pub use wait::{wait, DelayTiers, Tier};
