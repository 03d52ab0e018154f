//! The playground scenario suite
//!
//! Every scenario has the same shape: load a fresh application, drive it,
//! wait for it to settle, then record what it shows.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::app::{
    query_cache_key, ApplicationHandle, Button, Element, LaunchRequest, Launcher, DEFAULT_DATABASE,
};
use crate::error::{E2eError, E2eResult};
use crate::gateway::{create_fn, update_fn, Credentials, Gist, CREATE, UPDATE};
use crate::intercept::InterceptionRegistry;
use crate::recorder::Recorder;
use crate::wait::{wait, DelayTiers, Tier};

const HEADER: &str = "SQLite Playground  // new.db";
const SAVED: &str = "Saved as gist copy share link";
const EMPLOYEES_GIST: &str = "e012594111ce51f91590c4737e41a046";
const SAVED_GIST_ID: &str = "424242131313";

/// One end-to-end test case
#[async_trait]
pub trait Scenario: Send + Sync {
    /// Stable identifier, used for selection and in reports
    fn name(&self) -> &str;

    /// Line logged when the scenario starts
    fn title(&self) -> &str;

    async fn run(&self, cx: &ScenarioCx<'_>) -> E2eResult<()>;
}

/// What a running scenario can reach
pub struct ScenarioCx<'a> {
    pub(crate) recorder: &'a Recorder,
    pub(crate) registry: &'a InterceptionRegistry,
    pub(crate) launcher: &'a dyn Launcher,
    pub(crate) delays: DelayTiers,
    pub(crate) entry: &'a str,
}

impl<'a> ScenarioCx<'a> {
    pub fn recorder(&self) -> &'a Recorder {
        self.recorder
    }

    pub fn registry(&self) -> &'a InterceptionRegistry {
        self.registry
    }

    pub fn check(&self, description: &str, passed: bool) {
        self.recorder.record(description, passed);
    }

    /// Pause for one of the configured tiers
    pub async fn settle(&self, tier: Tier) {
        wait(self.delays.duration(tier)).await;
    }

    /// Load a fresh application and give it `timeout` to boot.
    ///
    /// The cached query of the default database is cleared first. The
    /// capability surface is checked once, after the wait; there is no retry.
    pub async fn load_application(&self, timeout: Duration) -> E2eResult<ApplicationHandle> {
        let app = self
            .launcher
            .launch(LaunchRequest {
                entry: self.entry.to_string(),
                clear_keys: vec![query_cache_key(DEFAULT_DATABASE)],
            })
            .await?;
        wait(timeout).await;
        app.bind().await?;
        Ok(ApplicationHandle::new(app))
    }

    /// Load with the bootstrap tier
    pub async fn load(&self) -> E2eResult<ApplicationHandle> {
        self.load_application(self.delays.duration(Tier::Long)).await
    }
}

/// The built-in suite, in run order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaygroundScenario {
    NewDatabase,
    ExecuteQuery,
    LoadDemo,
    LoadUrl,
    LoadUrlInvalid,
    LoadGist,
    LoadGistInvalid,
    ShowTables,
    SaveAnonymous,
    SaveEmpty,
    Save,
    Update,
    ChangeName,
}

impl PlaygroundScenario {
    pub const ALL: [PlaygroundScenario; 13] = [
        PlaygroundScenario::NewDatabase,
        PlaygroundScenario::ExecuteQuery,
        PlaygroundScenario::LoadDemo,
        PlaygroundScenario::LoadUrl,
        PlaygroundScenario::LoadUrlInvalid,
        PlaygroundScenario::LoadGist,
        PlaygroundScenario::LoadGistInvalid,
        PlaygroundScenario::ShowTables,
        PlaygroundScenario::SaveAnonymous,
        PlaygroundScenario::SaveEmpty,
        PlaygroundScenario::Save,
        PlaygroundScenario::Update,
        PlaygroundScenario::ChangeName,
    ];

    /// The whole suite as trait objects
    pub fn suite() -> Vec<&'static dyn Scenario> {
        Self::ALL.iter().map(|s| s as &dyn Scenario).collect()
    }

    pub fn from_name(name: &str) -> E2eResult<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| E2eError::UnknownScenario(name.to_string()))
    }
}

#[async_trait]
impl Scenario for PlaygroundScenario {
    fn name(&self) -> &str {
        match self {
            Self::NewDatabase => "new-database",
            Self::ExecuteQuery => "execute-query",
            Self::LoadDemo => "load-demo",
            Self::LoadUrl => "load-url",
            Self::LoadUrlInvalid => "load-url-invalid",
            Self::LoadGist => "load-gist",
            Self::LoadGistInvalid => "load-gist-invalid",
            Self::ShowTables => "show-tables",
            Self::SaveAnonymous => "save-anonymous",
            Self::SaveEmpty => "save-empty",
            Self::Save => "save",
            Self::Update => "update",
            Self::ChangeName => "change-name",
        }
    }

    fn title(&self) -> &str {
        match self {
            Self::NewDatabase => "New database...",
            Self::ExecuteQuery => "Execute query...",
            Self::LoadDemo => "Load demo...",
            Self::LoadUrl => "Load url...",
            Self::LoadUrlInvalid => "Load invalid url...",
            Self::LoadGist => "Load gist...",
            Self::LoadGistInvalid => "Load invalid gist...",
            Self::ShowTables => "Show tables...",
            Self::SaveAnonymous => "Save anonymous snippet...",
            Self::SaveEmpty => "Save empty snippet...",
            Self::Save => "Save snippet...",
            Self::Update => "Update snippet...",
            Self::ChangeName => "Change database name...",
        }
    }

    async fn run(&self, cx: &ScenarioCx<'_>) -> E2eResult<()> {
        match self {
            Self::NewDatabase => new_database(cx).await,
            Self::ExecuteQuery => execute_query(cx).await,
            Self::LoadDemo => load_demo(cx).await,
            Self::LoadUrl => load_url(cx).await,
            Self::LoadUrlInvalid => load_url_invalid(cx).await,
            Self::LoadGist => load_gist(cx).await,
            Self::LoadGistInvalid => load_gist_invalid(cx).await,
            Self::ShowTables => show_tables(cx).await,
            Self::SaveAnonymous => save_anonymous(cx).await,
            Self::SaveEmpty => save_empty(cx).await,
            Self::Save => save(cx).await,
            Self::Update => update(cx).await,
            Self::ChangeName => change_name(cx).await,
        }
    }
}

fn test_account() -> Credentials {
    Credentials::new("test", "test")
}

/// What the scripted gateway hands back for a save
fn build_gist(name: String, schema: String, query: String) -> Gist {
    Gist::new(SAVED_GIST_ID, name, "test", schema, query)
}

async fn new_database(cx: &ScenarioCx<'_>) -> E2eResult<()> {
    let app = cx.load().await?;
    cx.check("shows header", app.header().await? == HEADER);
    cx.check("editor is empty", app.editor().await?.is_empty());
    cx.check(
        "command bar is disabled",
        app.has_class(Element::CommandBar, "disabled").await?,
    );
    cx.check("shows welcome text", app.status().await?.contains("demo database"));
    cx.check("result is empty", app.result().await?.is_empty());
    Ok(())
}

async fn execute_query(cx: &ScenarioCx<'_>) -> E2eResult<()> {
    let app = cx.load().await?;
    let sql = "select 'hello' as message";
    app.type_query(sql).await?;
    app.click(Button::Execute).await?;
    cx.settle(Tier::Medium).await;

    cx.check("shows result", app.result().await?.contains("hello"));
    cx.check("shows query in editor", app.editor().await? == sql);
    cx.check(
        "caches query in local storage",
        app.storage_get(&query_cache_key(DEFAULT_DATABASE)).await?.as_deref() == Some(sql),
    );
    Ok(())
}

async fn load_demo(cx: &ScenarioCx<'_>) -> E2eResult<()> {
    let app = cx.load().await?;
    app.click_action(Element::Status, "load-demo").await?;
    cx.settle(Tier::Medium).await;

    cx.check(
        "shows query in editor",
        app.editor().await?.starts_with("select * from employees"),
    );
    cx.check("shows row count", app.status().await?.contains("10 rows"));
    cx.check("shows employees", app.result().await?.contains("Diane"));
    Ok(())
}

async fn load_url(cx: &ScenarioCx<'_>) -> E2eResult<()> {
    let app = cx.load().await?;
    app.navigate("demo.db").await?;
    cx.settle(Tier::Medium).await;
    cx.check("shows database name", app.name().await? == "demo.db");

    app.click(Button::ShowTables).await?;
    cx.settle(Tier::Medium).await;
    cx.check("shows tables", app.status().await? == "2 tables:");
    Ok(())
}

async fn load_url_invalid(cx: &ScenarioCx<'_>) -> E2eResult<()> {
    let app = cx.load().await?;
    app.navigate("whatever").await?;
    cx.settle(Tier::Medium).await;

    cx.check("shows error", app.status().await?.contains("Failed to load"));
    cx.check("editor is empty", app.editor().await?.is_empty());
    cx.check("result is empty", app.result().await?.is_empty());
    Ok(())
}

async fn load_gist(cx: &ScenarioCx<'_>) -> E2eResult<()> {
    let app = cx.load().await?;
    app.navigate(&format!("gist:{}", EMPLOYEES_GIST)).await?;
    cx.settle(Tier::Long).await;

    cx.check("shows database name", app.name().await? == "employees.en.db");
    cx.check("shows query in editor", app.editor().await?.starts_with("select"));
    cx.check("shows result", app.result().await?.contains("Diane"));
    Ok(())
}

async fn load_gist_invalid(cx: &ScenarioCx<'_>) -> E2eResult<()> {
    let app = cx.load().await?;
    app.navigate("gist:42").await?;
    cx.settle(Tier::Long).await;

    cx.check("shows error", app.status().await?.contains("Failed to load"));
    cx.check("editor is empty", app.editor().await?.is_empty());
    cx.check("result is empty", app.result().await?.is_empty());
    Ok(())
}

async fn show_tables(cx: &ScenarioCx<'_>) -> E2eResult<()> {
    let app = cx.load().await?;
    app.navigate("demo.db").await?;
    cx.settle(Tier::Medium).await;
    app.click(Button::ShowTables).await?;
    cx.settle(Tier::Medium).await;

    cx.check("shows table count", app.status().await? == "2 tables:");
    cx.check("shows table list", app.result().await?.contains("employees"));

    app.click_action(Element::Result, "show-table").await?;
    cx.settle(Tier::Medium).await;
    cx.check("shows table navbar", app.status().await? == "tables / employees:");
    cx.check("shows table columns", app.result().await?.contains("department"));
    Ok(())
}

async fn save_anonymous(cx: &ScenarioCx<'_>) -> E2eResult<()> {
    let app = cx.load().await?;
    app.type_query("select 'hello' as message").await?;
    app.click(Button::Save).await?;
    cx.settle(Tier::Medium).await;

    cx.check(
        "save redirects to settings",
        app.location_path().await? == "/settings.html",
    );
    Ok(())
}

async fn save_empty(cx: &ScenarioCx<'_>) -> E2eResult<()> {
    let app = cx.load().await?;
    app.set_credentials(Some(test_account())).await?;

    app.type_query("").await?;
    app.click(Button::Save).await?;
    cx.settle(Tier::Medium).await;
    cx.check(
        "fails to save empty snippet",
        app.status().await?.starts_with("Failed to save"),
    );

    app.set_credentials(None).await?;
    Ok(())
}

async fn save(cx: &ScenarioCx<'_>) -> E2eResult<()> {
    let app = cx.load().await?;
    app.set_credentials(Some(test_account())).await?;

    let sql = "select 'hello' as message";
    let recorder = cx.recorder().clone();
    cx.registry().intercept(
        app.gateway().create_slot(),
        create_fn(move |name, schema, query| {
            let recorder = recorder.clone();
            async move {
                recorder.record("before save: database name is not set", name == DEFAULT_DATABASE);
                recorder.record("before save: database schema is empty", schema.is_empty());
                recorder.record("before save: database query equals query text", query == sql);
                Ok(build_gist(name, schema, query))
            }
        }),
    )?;

    app.type_query(sql).await?;
    app.click(Button::Save).await?;
    cx.settle(Tier::Medium).await;
    cx.check(
        "after save: database named after gist id",
        app.name().await? == "424242.db",
    );
    cx.check("after save: shows successful status", app.status().await? == SAVED);

    cx.registry().release(app.gateway().target(), CREATE)?;
    app.set_credentials(None).await?;
    Ok(())
}

async fn update(cx: &ScenarioCx<'_>) -> E2eResult<()> {
    let app = cx.load().await?;
    app.set_credentials(Some(test_account())).await?;

    let created = "select 'created' as message";
    let updated = "select 'updated' as message";

    cx.registry().intercept(
        app.gateway().create_slot(),
        create_fn(|name, schema, query| async move { Ok(build_gist(name, schema, query)) }),
    )?;

    let recorder = cx.recorder().clone();
    cx.registry().intercept(
        app.gateway().update_slot(),
        update_fn(move |id, name, schema, query| {
            let recorder = recorder.clone();
            async move {
                recorder.record("before save: database name is set", name == "424242.db");
                recorder.record("before save: database schema is empty", schema.is_empty());
                recorder.record(
                    "before save: database query equals updated text",
                    query == updated,
                );
                Ok(Gist::new(id, name, "test", schema, query))
            }
        }),
    )?;

    app.type_query(created).await?;
    app.click(Button::Save).await?;
    cx.settle(Tier::Medium).await;

    app.type_query(updated).await?;
    app.click(Button::Save).await?;
    cx.settle(Tier::Medium).await;

    cx.check("after save: shows successful status", app.status().await? == SAVED);

    let target = app.gateway().target();
    cx.registry().release(target, CREATE)?;
    cx.registry().release(target, UPDATE)?;
    app.set_credentials(None).await?;
    Ok(())
}

async fn change_name(cx: &ScenarioCx<'_>) -> E2eResult<()> {
    let app = cx.load().await?;
    app.rename("my.db").await?;
    cx.settle(Tier::Short).await;
    cx.check("shows updated name", app.name().await? == "my.db");
    Ok(())
}
