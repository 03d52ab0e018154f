//! Runs the scenario suite against the headless backend

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use playground_e2e::app::{Button, Element, LaunchRequest, Launcher, Playground};
use playground_e2e::gateway::{create_fn, get_fn, Gateway, Gist, CREATE, GET};
use playground_e2e::runner::RunnerConfig;
use playground_e2e::{
    E2eError, E2eResult, HeadlessLauncher, PlaygroundScenario, Scenario, ScenarioCx, TestRunner,
    Tier,
};

fn runner() -> TestRunner {
    TestRunner::new(HeadlessLauncher::default())
}

#[tokio::test(start_paused = true)]
async fn test_full_suite_passes() {
    let runner = runner();
    let results = runner.run_all().await;

    let failures: Vec<_> = runner
        .recorder()
        .assertions()
        .into_iter()
        .filter(|a| !a.passed)
        .map(|a| a.description)
        .collect();
    assert!(failures.is_empty(), "failed assertions: {:?}", failures);

    assert!(results.success());
    assert_eq!(results.scenarios.len(), PlaygroundScenario::ALL.len());
    assert_eq!(results.summary.total, runner.recorder().len());
    assert!(results.scenarios.iter().all(|s| s.error.is_none()));
    assert!(runner.registry().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_gateway_stubs_record_their_own_checks() {
    let runner = runner();
    let results = runner
        .run_named(&["update".to_string(), "save".to_string()])
        .await
        .unwrap();

    let names: Vec<&str> = results.scenarios.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["save", "update"]);

    let save = &results.scenarios[0];
    assert!(save
        .assertions
        .iter()
        .any(|a| a.description == "before save: database name is not set" && a.passed));

    let update = &results.scenarios[1];
    assert!(update
        .assertions
        .iter()
        .any(|a| a.description == "before save: database query equals updated text" && a.passed));
    assert!(results.success());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_scenario_name() {
    let err = runner().run_named(&["teleport".to_string()]).await;
    assert!(matches!(err, Err(E2eError::UnknownScenario(name)) if name == "teleport"));
}

#[tokio::test(start_paused = true)]
async fn test_results_file() {
    let dir = tempfile::tempdir().unwrap();
    let runner = TestRunner::with_config(
        HeadlessLauncher::default(),
        RunnerConfig {
            output_dir: dir.path().join("out"),
            ..RunnerConfig::default()
        },
    );

    let results = runner.run_named(&["change-name".to_string()]).await.unwrap();
    let path = runner.write_results(&results).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["summary"]["total"], 1);
    assert_eq!(json["scenarios"][0]["name"], "change-name");
    assert_eq!(json["scenarios"][0]["assertions"][0]["passed"], true);
}

/// Fails before recording anything
struct Exploding;

#[async_trait]
impl Scenario for Exploding {
    fn name(&self) -> &str {
        "exploding"
    }

    fn title(&self) -> &str {
        "Exploding..."
    }

    async fn run(&self, cx: &ScenarioCx<'_>) -> E2eResult<()> {
        let app = cx.load().await?;
        app.click_action(Element::Result, "does-not-exist").await?;
        cx.check("never reached", true);
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_erroring_scenario_does_not_stop_the_suite() {
    let runner = runner();
    let results = runner
        .run(&[&Exploding, &PlaygroundScenario::ChangeName])
        .await;

    assert_eq!(results.scenarios.len(), 2);

    let exploding = &results.scenarios[0];
    assert!(!exploding.success);
    assert!(exploding
        .error
        .as_deref()
        .is_some_and(|e| e.contains("does-not-exist")));
    assert_eq!(exploding.assertions.len(), 1);
    assert!(exploding.assertions[0].description.starts_with("exploding: aborted:"));

    assert!(results.scenarios[1].success);
    assert_eq!(results.summary.failed, 1);
    assert!(!results.success());
}

/// Intercepts `create` and forgets to release it
struct Leaky {
    gateway: Mutex<Option<Arc<Gateway>>>,
}

#[async_trait]
impl Scenario for Leaky {
    fn name(&self) -> &str {
        "leaky"
    }

    fn title(&self) -> &str {
        "Leaky..."
    }

    async fn run(&self, cx: &ScenarioCx<'_>) -> E2eResult<()> {
        let app = cx.load().await?;
        *self.gateway.lock() = Some(app.gateway().clone());
        cx.registry().intercept(
            app.gateway().create_slot(),
            create_fn(|name, schema, query| async move {
                Ok(Gist::new("1", name, "test", schema, query))
            }),
        )?;
        cx.check("intercepted", app.gateway().create_slot().is_replaced());
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_leaked_interception_is_released_and_reported() {
    let runner = runner();
    let leaky = Leaky {
        gateway: Mutex::new(None),
    };
    let results = runner.run(&[&leaky]).await;

    assert!(runner.registry().is_empty());
    let gateway = leaky.gateway.lock().clone().unwrap();
    assert!(!gateway.create_slot().is_replaced());

    let outcome = &results.scenarios[0];
    assert_eq!(outcome.passed, 1);
    assert_eq!(outcome.failed, 1);
    let leak = &outcome.assertions[1].description;
    assert!(leak.starts_with("leaky: interceptions released:"));
    assert!(leak.contains(CREATE));
}

/// Serves a gist that only exists in the stub
struct StubbedGist;

#[async_trait]
impl Scenario for StubbedGist {
    fn name(&self) -> &str {
        "stubbed-gist"
    }

    fn title(&self) -> &str {
        "Stubbed gist..."
    }

    async fn run(&self, cx: &ScenarioCx<'_>) -> E2eResult<()> {
        let app = cx.load().await?;
        cx.registry().intercept(
            app.gateway().get_slot(),
            get_fn(|id| async move {
                Ok(Gist::new(
                    id,
                    "colors.db",
                    "test",
                    "create table colors(name text); insert into colors values ('teal');",
                    "select name from colors",
                ))
            }),
        )?;

        app.navigate("gist:feedbeef").await?;
        cx.settle(Tier::Long).await;
        cx.check("shows stubbed name", app.name().await? == "colors.db");
        cx.check("runs stubbed query", app.result().await?.contains("teal"));

        app.click(Button::ShowTables).await?;
        cx.settle(Tier::Medium).await;
        cx.check("lists stubbed table", app.status().await? == "1 tables:");

        cx.registry().release(app.gateway().target(), GET)?;
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_stub_feeds_the_application() {
    let runner = runner();
    let results = runner.run(&[&StubbedGist]).await;
    let failures: Vec<_> = results.scenarios[0]
        .assertions
        .iter()
        .filter(|a| !a.passed)
        .map(|a| a.description.clone())
        .collect();
    assert!(failures.is_empty(), "failed assertions: {:?}", failures);
    assert!(runner.registry().is_empty());
}

/// Launches applications that lack every handle
struct Broken;

struct BrokenPlayground;

#[async_trait]
impl Launcher for Broken {
    async fn launch(&self, _request: LaunchRequest) -> E2eResult<Box<dyn Playground>> {
        Ok(Box::new(BrokenPlayground))
    }
}

#[async_trait]
impl Playground for BrokenPlayground {
    async fn bind(&self) -> E2eResult<()> {
        Err(E2eError::MissingCapabilities(vec![
            "gister".to_string(),
            "ui".to_string(),
        ]))
    }

    async fn value(&self, _: Element) -> E2eResult<String> {
        unreachable!()
    }

    async fn text(&self, _: Element) -> E2eResult<String> {
        unreachable!()
    }

    async fn set_value(&self, _: Element, _: &str) -> E2eResult<()> {
        unreachable!()
    }

    async fn dispatch(&self, _: Element, _: playground_e2e::app::DomEvent) -> E2eResult<()> {
        unreachable!()
    }

    async fn has_class(&self, _: Element, _: &str) -> E2eResult<bool> {
        unreachable!()
    }

    async fn click(&self, _: Button) -> E2eResult<()> {
        unreachable!()
    }

    async fn click_action(&self, _: Element, _: &str) -> E2eResult<()> {
        unreachable!()
    }

    async fn navigate(&self, _: &str) -> E2eResult<()> {
        unreachable!()
    }

    async fn location_path(&self) -> E2eResult<String> {
        unreachable!()
    }

    async fn storage_get(&self, _: &str) -> E2eResult<Option<String>> {
        unreachable!()
    }

    async fn set_credentials(
        &self,
        _: Option<playground_e2e::gateway::Credentials>,
    ) -> E2eResult<()> {
        unreachable!()
    }

    fn gateway(&self) -> Arc<Gateway> {
        unreachable!()
    }
}

#[tokio::test(start_paused = true)]
async fn test_missing_capabilities_fail_every_scenario() {
    let runner = TestRunner::new(Broken);
    let results = runner.run_all().await;

    assert_eq!(results.summary.total, PlaygroundScenario::ALL.len());
    assert_eq!(results.summary.failed, PlaygroundScenario::ALL.len());
    assert!(results.scenarios.iter().all(|s| s
        .error
        .as_deref()
        .is_some_and(|e| e.contains("gister, ui"))));
}
