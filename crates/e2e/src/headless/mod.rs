//! In-process model of the playground
//!
//! Reproduces the application's observable behavior on top of in-memory
//! SQLite databases, so the scenario suite runs without a browser. Gist
//! operations run in background tasks the way network calls would, which
//! is what the settlement waits are for.

pub mod engine;
pub mod fixtures;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::app::{
    query_cache_key, Button, DomEvent, Element, LaunchRequest, Launcher, Playground, Route,
    DEFAULT_DATABASE,
};
use crate::error::{E2eError, E2eResult};
use crate::gateway::{create_fn, get_fn, update_fn, Credentials, Gateway, Gist};
use engine::Database;
use fixtures::{DEMO_DATABASE, DEMO_QUERY, DEMO_SCHEMA};

const TITLE: &str = "SQLite Playground";
const WELCOME: &str =
    "Welcome! This is a new database. Start typing SQL or load the demo database.";
const SAVED: &str = "Saved as gist copy share link";
const SETTINGS_PATH: &str = "/settings.html";

/// Local storage shared by every instance a launcher creates
#[derive(Debug, Clone, Default)]
pub struct LocalStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl LocalStorage {
    pub fn get(&self, key: &str) -> Option<String> {
        self.items.lock().get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.items.lock().insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) {
        self.items.lock().remove(key);
    }
}

/// Databases and gists available to headless instances
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Database name to the SQL that builds it
    pub catalog: BTreeMap<String, String>,
    /// Gists already published
    pub gists: Vec<Gist>,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        let mut catalog = BTreeMap::new();
        catalog.insert(DEMO_DATABASE.to_string(), DEMO_SCHEMA.to_string());
        Self {
            catalog,
            gists: vec![fixtures::employees_gist()],
        }
    }
}

type GistStore = Arc<Mutex<HashMap<String, Gist>>>;
type Account = Arc<Mutex<Option<Credentials>>>;

/// Launches headless playground instances
pub struct HeadlessLauncher {
    catalog: Arc<BTreeMap<String, String>>,
    storage: LocalStorage,
    gists: GistStore,
}

impl HeadlessLauncher {
    pub fn new(config: HeadlessConfig) -> Self {
        let gists = config
            .gists
            .into_iter()
            .map(|gist| (gist.id.clone(), gist))
            .collect();
        Self {
            catalog: Arc::new(config.catalog),
            storage: LocalStorage::default(),
            gists: Arc::new(Mutex::new(gists)),
        }
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    /// A gist client backed by the launcher's in-memory store
    fn gateway(&self, account: &Account) -> Gateway {
        let (store, owner) = (self.gists.clone(), account.clone());
        let create = create_fn(move |name, schema, query| {
            let (store, owner) = (store.clone(), owner.clone());
            async move {
                let owner = authorized(&owner)?;
                let id = uuid::Uuid::new_v4().simple().to_string();
                let gist = Gist::new(id.clone(), name, owner, schema, query);
                store.lock().insert(id, gist.clone());
                Ok(gist)
            }
        });

        let (store, owner) = (self.gists.clone(), account.clone());
        let update = update_fn(move |id, name, schema, query| {
            let (store, owner) = (store.clone(), owner.clone());
            async move {
                let owner = authorized(&owner)?;
                let mut gists = store.lock();
                match gists.get(&id) {
                    Some(existing) if existing.owner == owner => {}
                    Some(_) => {
                        let reason = format!("gist {} belongs to someone else", id);
                        return Err(E2eError::Gateway(reason));
                    }
                    None => return Err(E2eError::Gateway(format!("gist {} not found", id))),
                }
                let gist = Gist::new(id.clone(), name, owner, schema, query);
                gists.insert(id, gist.clone());
                Ok(gist)
            }
        });

        let store = self.gists.clone();
        let get = get_fn(move |id| {
            let store = store.clone();
            async move {
                store
                    .lock()
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| E2eError::Gateway(format!("gist {} not found", id)))
            }
        });

        Gateway::new(create, update, get)
    }
}

impl Default for HeadlessLauncher {
    fn default() -> Self {
        Self::new(HeadlessConfig::default())
    }
}

fn authorized(account: &Account) -> E2eResult<String> {
    account
        .lock()
        .as_ref()
        .map(|c| c.username.clone())
        .ok_or_else(|| E2eError::Gateway("credentials required".to_string()))
}

#[async_trait]
impl Launcher for HeadlessLauncher {
    async fn launch(&self, request: LaunchRequest) -> E2eResult<Box<dyn Playground>> {
        for key in &request.clear_keys {
            self.storage.remove(key);
        }

        let account: Account = Arc::default();
        let inner = Arc::new(Inner {
            entry_path: format!("/{}", request.entry.trim_start_matches('/')),
            catalog: self.catalog.clone(),
            storage: self.storage.clone(),
            gateway: Arc::new(self.gateway(&account)),
            account,
            page: Mutex::new(Page::default()),
        });
        inner.page.lock().path = inner.entry_path.clone();
        inner.open(Route::New);

        Ok(Box::new(HeadlessPlayground { inner }))
    }
}

/// A clickable `[data-action]` element inside a view
#[derive(Debug, Clone, PartialEq, Eq)]
struct ActionLink {
    action: &'static str,
    arg: Option<String>,
}

impl ActionLink {
    fn new(action: &'static str) -> Self {
        Self { action, arg: None }
    }

    fn with_arg(action: &'static str, arg: impl Into<String>) -> Self {
        Self {
            action,
            arg: Some(arg.into()),
        }
    }
}

/// Text plus the actions rendered inside it
#[derive(Debug, Clone, Default)]
struct View {
    text: String,
    actions: Vec<ActionLink>,
}

impl View {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            actions: Vec::new(),
        }
    }

    fn with_actions(text: impl Into<String>, actions: Vec<ActionLink>) -> Self {
        Self {
            text: text.into(),
            actions,
        }
    }
}

#[derive(Default)]
struct Page {
    path: String,
    database: Option<Database>,
    name_input: String,
    editor: String,
    status: View,
    result: View,
    commandbar_enabled: bool,
    gist: Option<Gist>,
    /// Bumped on every navigation; background work started under an older
    /// value is discarded when it completes
    generation: u64,
}

impl Page {
    fn reset(&mut self, name: &str) {
        self.database = None;
        self.name_input = name.to_string();
        self.editor.clear();
        self.status = View::default();
        self.result = View::default();
        self.gist = None;
    }

    fn use_database(&mut self, database: Database) {
        self.name_input = database.name.clone();
        self.database = Some(database);
    }

    fn run_query(&mut self, storage: &LocalStorage) {
        let sql = self.editor.clone();
        if sql.trim().is_empty() {
            return;
        }
        let Some(database) = &self.database else {
            self.status = View::text("Failed to execute: no database loaded");
            return;
        };

        storage.set(query_cache_key(&database.name), sql.as_str());
        match database.execute(&sql) {
            Ok(Some(rows)) => {
                self.status = View::text(rows.describe());
                self.result = View::text(rows.render());
            }
            Ok(None) => {
                self.status = View::text("Done");
                self.result = View::default();
            }
            Err(e) => {
                self.status = View::text(e.to_string());
                self.result = View::default();
            }
        }
    }

    fn show_tables(&mut self) {
        let Some(database) = &self.database else {
            self.status = View::text("Failed to show tables: no database loaded");
            return;
        };

        match database.tables() {
            Ok(tables) => {
                let actions = tables
                    .iter()
                    .map(|t| ActionLink::with_arg("show-table", t.as_str()))
                    .collect();
                self.status = View::text(format!("{} tables:", tables.len()));
                self.result = View::with_actions(tables.join("\n"), actions);
            }
            Err(e) => self.status = View::text(format!("Failed to show tables: {}", e)),
        }
    }

    fn show_table(&mut self, table: &str) {
        let Some(database) = &self.database else {
            return;
        };

        match database.columns(table) {
            Ok(columns) => {
                let text = columns
                    .iter()
                    .map(|(name, kind)| format!("{}\t{}", name, kind))
                    .collect::<Vec<_>>()
                    .join("\n");
                self.status = View::with_actions(
                    format!("tables / {}:", table),
                    vec![ActionLink::new("show-tables")],
                );
                self.result = View::text(text);
            }
            Err(e) => self.status = View::text(format!("Failed to show table {}: {}", table, e)),
        }
    }

    fn header(&self) -> String {
        let name = self
            .database
            .as_ref()
            .map(|db| db.name.as_str())
            .unwrap_or(self.name_input.as_str());
        format!("{}  // {}", TITLE, name)
    }
}

struct Inner {
    entry_path: String,
    catalog: Arc<BTreeMap<String, String>>,
    storage: LocalStorage,
    gateway: Arc<Gateway>,
    account: Account,
    page: Mutex<Page>,
}

impl Inner {
    fn open(self: &Arc<Self>, route: Route) {
        debug!("Opening {:?}", route);
        self.page.lock().generation += 1;
        match route {
            Route::New => {
                let mut page = self.page.lock();
                page.reset(DEFAULT_DATABASE);
                match Database::open(DEFAULT_DATABASE, "") {
                    Ok(database) => page.use_database(database),
                    Err(e) => warn!("Failed to create {}: {}", DEFAULT_DATABASE, e),
                }
                page.editor = self
                    .storage
                    .get(&query_cache_key(DEFAULT_DATABASE))
                    .unwrap_or_default();
                page.status = View::with_actions(WELCOME, vec![ActionLink::new("load-demo")]);
                page.commandbar_enabled = false;
            }
            Route::Database(name) => {
                let mut page = self.page.lock();
                page.reset(&name);
                let Some(schema) = self.catalog.get(&name) else {
                    page.status = View::text(format!("Failed to load {}: no such database", name));
                    return;
                };
                match Database::open(name.as_str(), schema) {
                    Ok(database) => {
                        page.use_database(database);
                        page.editor = self.storage.get(&query_cache_key(&name)).unwrap_or_default();
                        page.status = View::text(format!("Opened {}", name));
                        page.commandbar_enabled = true;
                    }
                    Err(e) => page.status = View::text(format!("Failed to load {}: {}", name, e)),
                }
            }
            Route::Gist(id) => {
                let generation = {
                    let mut page = self.page.lock();
                    page.reset(DEFAULT_DATABASE);
                    page.status = View::text(format!("Loading gist:{}...", id));
                    page.generation
                };
                let inner = self.clone();
                tokio::spawn(async move { inner.load_gist(id, generation).await });
            }
        }
    }

    async fn load_gist(self: Arc<Self>, id: String, generation: u64) {
        let fetched = self.gateway.fetch(id.clone()).await;

        let mut page = self.page.lock();
        if page.generation != generation {
            debug!("Dropping gist:{}, the page navigated away", id);
            return;
        }
        let loaded = fetched.and_then(|gist| {
            let database = Database::open(gist.name.as_str(), &gist.schema)?;
            Ok((gist, database))
        });
        match loaded {
            Ok((gist, database)) => {
                page.use_database(database);
                page.editor = gist.query.clone();
                page.gist = Some(gist);
                page.commandbar_enabled = true;
                page.run_query(&self.storage);
            }
            Err(e) => {
                page.editor.clear();
                page.result = View::default();
                page.status = View::text(format!("Failed to load gist:{}: {}", id, e));
            }
        }
    }

    fn load_demo(self: &Arc<Self>) {
        self.open(Route::Database(DEMO_DATABASE.to_string()));
        let mut page = self.page.lock();
        page.editor = DEMO_QUERY.to_string();
        page.run_query(&self.storage);
    }

    async fn save(self: Arc<Self>) {
        let account = self.account.lock().clone();
        let Some(account) = account else {
            self.page.lock().path = SETTINGS_PATH.to_string();
            return;
        };

        let (name, schema, query, existing, generation) = {
            let mut page = self.page.lock();
            if page.editor.trim().is_empty() {
                page.status = View::text("Failed to save: the query is empty");
                return;
            }
            let dumped = match &page.database {
                Some(database) => database.dump().map(|schema| (database.name.clone(), schema)),
                None => Err(E2eError::Gateway("no database loaded".to_string())),
            };
            match dumped {
                Ok((name, schema)) => {
                    let query = page.editor.clone();
                    (name, schema, query, page.gist.clone(), page.generation)
                }
                Err(e) => {
                    page.status = View::text(format!("Failed to save: {}", e));
                    return;
                }
            }
        };

        let owned = existing.filter(|gist| gist.owner == account.username);
        let created = owned.is_none();
        let saved = match owned {
            Some(gist) => self.gateway.update(gist.id, name, schema, query).await,
            None => self.gateway.create(name, schema, query).await,
        };

        let mut page = self.page.lock();
        if page.generation != generation {
            debug!("Dropping save result, the page navigated away");
            return;
        }
        match saved {
            Ok(gist) => {
                if created {
                    let renamed = gist_database_name(&gist.id);
                    if let Some(database) = page.database.as_mut() {
                        database.name = renamed.clone();
                    }
                    page.name_input = renamed;
                }
                page.gist = Some(gist);
                page.status = View::with_actions(SAVED, vec![ActionLink::new("copy")]);
            }
            Err(e) => page.status = View::text(format!("Failed to save: {}", e)),
        }
    }

    fn perform(self: &Arc<Self>, link: ActionLink) {
        match (link.action, link.arg) {
            ("load-demo", _) => self.load_demo(),
            ("show-tables", _) => self.page.lock().show_tables(),
            ("show-table", Some(table)) => self.page.lock().show_table(&table),
            (action, _) => debug!("Ignoring action {}", action),
        }
    }
}

/// Database name a freshly created gist is saved under
fn gist_database_name(id: &str) -> String {
    let prefix: String = id.chars().take(6).collect();
    format!("{}.db", prefix)
}

/// One headless application instance
pub struct HeadlessPlayground {
    inner: Arc<Inner>,
}

fn unsupported(element: Element, operation: &str) -> E2eError {
    E2eError::UnsupportedElement {
        element: element.to_string(),
        operation: operation.to_string(),
    }
}

#[async_trait]
impl Playground for HeadlessPlayground {
    async fn bind(&self) -> E2eResult<()> {
        Ok(())
    }

    async fn value(&self, element: Element) -> E2eResult<String> {
        let page = self.inner.page.lock();
        match element {
            Element::Editor => Ok(page.editor.clone()),
            Element::Status => Ok(page.status.text.clone()),
            Element::Result => Ok(page.result.text.clone()),
            Element::Name => Ok(page.name_input.clone()),
            Element::Header | Element::CommandBar => Err(unsupported(element, "value")),
        }
    }

    async fn text(&self, element: Element) -> E2eResult<String> {
        let page = self.inner.page.lock();
        Ok(match element {
            Element::Header => page.header(),
            Element::Editor => page.editor.clone(),
            Element::Status => page.status.text.clone(),
            Element::Result => page.result.text.clone(),
            Element::Name => page.name_input.clone(),
            Element::CommandBar => String::new(),
        })
    }

    async fn set_value(&self, element: Element, value: &str) -> E2eResult<()> {
        let mut page = self.inner.page.lock();
        match element {
            Element::Editor => page.editor = value.to_string(),
            Element::Name => page.name_input = value.to_string(),
            _ => return Err(unsupported(element, "set_value")),
        }
        Ok(())
    }

    async fn dispatch(&self, element: Element, event: DomEvent) -> E2eResult<()> {
        let mut page = self.inner.page.lock();
        match (element, event) {
            (Element::Editor, DomEvent::Input) => page.commandbar_enabled = true,
            (Element::Name, DomEvent::Change) => {
                let name = page.name_input.trim().to_string();
                if !name.is_empty() {
                    if let Some(database) = page.database.as_mut() {
                        database.name = name;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    async fn has_class(&self, element: Element, class: &str) -> E2eResult<bool> {
        let page = self.inner.page.lock();
        Ok(element == Element::CommandBar && class == "disabled" && !page.commandbar_enabled)
    }

    async fn click(&self, button: Button) -> E2eResult<()> {
        if button != Button::ShowTables && !self.inner.page.lock().commandbar_enabled {
            debug!("Ignoring {} while the command bar is disabled", button);
            return Ok(());
        }

        match button {
            Button::Execute => {
                let mut page = self.inner.page.lock();
                page.run_query(&self.inner.storage);
            }
            Button::ShowTables => self.inner.page.lock().show_tables(),
            Button::Save => {
                let inner = self.inner.clone();
                tokio::spawn(inner.save());
            }
        }
        Ok(())
    }

    async fn click_action(&self, container: Element, action: &str) -> E2eResult<()> {
        let link = {
            let page = self.inner.page.lock();
            let view = match container {
                Element::Status => &page.status,
                Element::Result => &page.result,
                _ => return Err(unsupported(container, "click_action")),
            };
            view.actions.iter().find(|link| link.action == action).cloned()
        };

        let link = link.ok_or_else(|| E2eError::ActionNotFound {
            container: container.to_string(),
            action: action.to_string(),
        })?;
        self.inner.perform(link);
        Ok(())
    }

    async fn navigate(&self, fragment: &str) -> E2eResult<()> {
        self.inner.page.lock().path = self.inner.entry_path.clone();
        self.inner.open(Route::parse(fragment));
        Ok(())
    }

    async fn location_path(&self) -> E2eResult<String> {
        Ok(self.inner.page.lock().path.clone())
    }

    async fn storage_get(&self, key: &str) -> E2eResult<Option<String>> {
        Ok(self.inner.storage.get(key))
    }

    async fn set_credentials(&self, credentials: Option<Credentials>) -> E2eResult<()> {
        *self.inner.account.lock() = credentials;
        Ok(())
    }

    fn gateway(&self) -> Arc<Gateway> {
        self.inner.gateway.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{CREATE, GET};
    use crate::intercept::InterceptionRegistry;
    use std::time::Duration;

    async fn launch(launcher: &HeadlessLauncher) -> Box<dyn Playground> {
        launcher
            .launch(LaunchRequest {
                entry: "index.html".into(),
                clear_keys: vec![query_cache_key(DEFAULT_DATABASE)],
            })
            .await
            .unwrap()
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    #[tokio::test]
    async fn test_fresh_instance() {
        let app = launch(&HeadlessLauncher::default()).await;
        assert_eq!(app.text(Element::Header).await.unwrap(), "SQLite Playground  // new.db");
        assert_eq!(app.value(Element::Editor).await.unwrap(), "");
        assert!(app.has_class(Element::CommandBar, "disabled").await.unwrap());
        assert!(app.value(Element::Status).await.unwrap().contains("demo database"));
        assert_eq!(app.location_path().await.unwrap(), "/index.html");
    }

    #[tokio::test]
    async fn test_cached_query_restored_unless_cleared() {
        let launcher = HeadlessLauncher::default();
        launcher.storage().set("demo.db.sql", "select 1");
        launcher.storage().set("new.db.sql", "select 2");

        let app = launch(&launcher).await;
        assert_eq!(app.value(Element::Editor).await.unwrap(), "");

        app.navigate("#demo.db").await.unwrap();
        assert_eq!(app.value(Element::Editor).await.unwrap(), "select 1");
    }

    #[tokio::test]
    async fn test_execute_ignored_while_disabled() {
        let app = launch(&HeadlessLauncher::default()).await;
        app.set_value(Element::Editor, "select 1").await.unwrap();
        app.click(Button::Execute).await.unwrap();
        assert_eq!(app.text(Element::Result).await.unwrap(), "");

        app.dispatch(Element::Editor, DomEvent::Input).await.unwrap();
        app.click(Button::Execute).await.unwrap();
        assert_eq!(app.text(Element::Result).await.unwrap(), "1\n1");
        assert_eq!(app.value(Element::Status).await.unwrap(), "1 row");
    }

    #[tokio::test]
    async fn test_sql_error_reported_in_status() {
        let app = launch(&HeadlessLauncher::default()).await;
        app.dispatch(Element::Editor, DomEvent::Input).await.unwrap();
        app.set_value(Element::Editor, "select * from nowhere").await.unwrap();
        app.click(Button::Execute).await.unwrap();
        assert!(app.value(Element::Status).await.unwrap().contains("no such table"));
    }

    #[tokio::test]
    async fn test_missing_action_is_an_error() {
        let app = launch(&HeadlessLauncher::default()).await;
        let err = app.click_action(Element::Result, "show-table").await.unwrap_err();
        assert!(matches!(err, E2eError::ActionNotFound { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_creates_then_updates_through_store() {
        let app = launch(&HeadlessLauncher::default()).await;
        app.set_credentials(Some(Credentials::new("test", "test"))).await.unwrap();
        app.dispatch(Element::Editor, DomEvent::Input).await.unwrap();
        app.set_value(Element::Editor, "select 'created'").await.unwrap();
        app.click(Button::Save).await.unwrap();
        settle().await;

        let name = app.value(Element::Name).await.unwrap();
        assert_eq!(name.len(), "123456.db".len());
        assert_eq!(app.value(Element::Status).await.unwrap(), SAVED);

        app.set_value(Element::Editor, "select 'updated'").await.unwrap();
        app.click(Button::Save).await.unwrap();
        settle().await;
        assert_eq!(app.value(Element::Status).await.unwrap(), SAVED);
        assert_eq!(app.value(Element::Name).await.unwrap(), name);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gist_round_trip_between_instances() {
        let launcher = HeadlessLauncher::default();
        let first = launch(&launcher).await;
        first.set_credentials(Some(Credentials::new("test", "test"))).await.unwrap();
        first.dispatch(Element::Editor, DomEvent::Input).await.unwrap();
        first
            .set_value(Element::Editor, "create table t(x); insert into t values (7);")
            .await
            .unwrap();
        first.click(Button::Execute).await.unwrap();
        first.set_value(Element::Editor, "select x from t").await.unwrap();
        first.click(Button::Save).await.unwrap();
        settle().await;

        let stored: Vec<String> = launcher.gists.lock().keys().cloned().collect();
        assert_eq!(stored.len(), 2);
        let new_id = stored
            .into_iter()
            .find(|key| key != fixtures::EMPLOYEES_GIST_ID)
            .unwrap();

        let second = launch(&launcher).await;
        second.navigate(&format!("#gist:{}", new_id)).await.unwrap();
        settle().await;
        assert_eq!(second.text(Element::Result).await.unwrap(), "x\n7");
    }

    #[tokio::test(start_paused = true)]
    async fn test_gist_answer_after_navigating_away_is_dropped() {
        let app = launch(&HeadlessLauncher::default()).await;
        let registry = InterceptionRegistry::new();
        registry
            .intercept(
                app.gateway().get_slot(),
                get_fn(|id| async move {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Ok(Gist::new(id, "late.db", "test", "", "select 'late'"))
                }),
            )
            .unwrap();

        app.navigate("#gist:feedbeef").await.unwrap();
        tokio::task::yield_now().await;
        app.navigate("#demo.db").await.unwrap();
        settle().await;

        assert_eq!(app.value(Element::Name).await.unwrap(), DEMO_DATABASE);
        assert_eq!(app.value(Element::Status).await.unwrap(), "Opened demo.db");
        assert_eq!(app.value(Element::Editor).await.unwrap(), "");
        registry.release(app.gateway().target(), GET).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_answer_after_navigating_away_is_dropped() {
        let app = launch(&HeadlessLauncher::default()).await;
        let registry = InterceptionRegistry::new();
        registry
            .intercept(
                app.gateway().create_slot(),
                create_fn(|name, schema, query| async move {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Ok(Gist::new("424242131313", name, "test", schema, query))
                }),
            )
            .unwrap();

        app.set_credentials(Some(Credentials::new("test", "test"))).await.unwrap();
        app.dispatch(Element::Editor, DomEvent::Input).await.unwrap();
        app.set_value(Element::Editor, "select 'created'").await.unwrap();
        app.click(Button::Save).await.unwrap();
        tokio::task::yield_now().await;
        app.navigate("#demo.db").await.unwrap();
        settle().await;

        assert_eq!(app.value(Element::Name).await.unwrap(), DEMO_DATABASE);
        assert_eq!(app.value(Element::Status).await.unwrap(), "Opened demo.db");
        registry.release(app.gateway().target(), CREATE).unwrap();
    }

    #[test]
    fn test_gist_database_name() {
        assert_eq!(gist_database_name("424242131313"), "424242.db");
        assert_eq!(gist_database_name("42"), "42.db");
    }
}
