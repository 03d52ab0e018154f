//! Capability interface of the application under test
//!
//! Scenarios never touch a backend directly. Everything they read or drive
//! goes through [`Playground`], and fresh instances come from a [`Launcher`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::E2eResult;
use crate::gateway::{Credentials, Gateway};

/// Database shown when the URL carries no fragment
pub const DEFAULT_DATABASE: &str = "new.db";

/// Local storage key caching the last query of `database`
pub fn query_cache_key(database: &str) -> String {
    format!("{}.sql", database)
}

/// UI elements the harness reads or drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Header,
    Editor,
    Status,
    Result,
    CommandBar,
    Name,
}

impl Element {
    pub const ALL: [Element; 6] = [
        Element::Header,
        Element::Editor,
        Element::Status,
        Element::Result,
        Element::CommandBar,
        Element::Name,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Element::Header => "header",
            Element::Editor => "editor",
            Element::Status => "status",
            Element::Result => "result",
            Element::CommandBar => "commandbar",
            Element::Name => "name",
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named command bar buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    Execute,
    Save,
    ShowTables,
}

impl Button {
    pub const ALL: [Button; 3] = [Button::Execute, Button::Save, Button::ShowTables];

    /// Key in the application's `buttons` mapping
    pub fn as_str(&self) -> &'static str {
        match self {
            Button::Execute => "execute",
            Button::Save => "save",
            Button::ShowTables => "showTables",
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events the harness dispatches on elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomEvent {
    Input,
    Change,
}

impl DomEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomEvent::Input => "input",
            DomEvent::Change => "change",
        }
    }
}

/// What a URL fragment asks the application to open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// No fragment: a fresh database
    New,
    /// `#gist:<id>`
    Gist(String),
    /// `#<name>`
    Database(String),
}

impl Route {
    /// Parse a fragment, with or without its leading `#`
    pub fn parse(fragment: &str) -> Self {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment).trim();
        if fragment.is_empty() {
            Route::New
        } else if let Some(id) = fragment.strip_prefix("gist:") {
            Route::Gist(id.to_string())
        } else {
            Route::Database(fragment.to_string())
        }
    }

    pub fn fragment(&self) -> String {
        match self {
            Route::New => String::new(),
            Route::Gist(id) => format!("gist:{}", id),
            Route::Database(name) => name.clone(),
        }
    }
}

/// Parameters of a fresh application load
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    /// Entry document, relative to the application root
    pub entry: String,
    /// Local storage keys removed before the application boots
    pub clear_keys: Vec<String>,
}

/// A loaded instance of the application under test
#[async_trait]
pub trait Playground: Send + Sync {
    /// Check every expected handle is present and attach collaborators.
    ///
    /// Fails with `MissingCapabilities` listing what is absent.
    async fn bind(&self) -> E2eResult<()>;

    /// `value` of an input-like element
    async fn value(&self, element: Element) -> E2eResult<String>;

    /// Rendered text of an element
    async fn text(&self, element: Element) -> E2eResult<String>;

    async fn set_value(&self, element: Element, value: &str) -> E2eResult<()>;

    async fn dispatch(&self, element: Element, event: DomEvent) -> E2eResult<()>;

    async fn has_class(&self, element: Element, class: &str) -> E2eResult<bool>;

    async fn click(&self, button: Button) -> E2eResult<()>;

    /// Click the first `[data-action="<action>"]` inside `container`
    async fn click_action(&self, container: Element, action: &str) -> E2eResult<()>;

    /// Assign `<entry>#<fragment>` to the window location
    async fn navigate(&self, fragment: &str) -> E2eResult<()>;

    async fn location_path(&self) -> E2eResult<String>;

    async fn storage_get(&self, key: &str) -> E2eResult<Option<String>>;

    /// Configure (or with `None`, clear) the gateway account
    async fn set_credentials(&self, credentials: Option<Credentials>) -> E2eResult<()>;

    /// The interceptable persistence gateway
    fn gateway(&self) -> Arc<Gateway>;
}

/// Something that can load fresh application instances
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self, request: LaunchRequest) -> E2eResult<Box<dyn Playground>>;

    /// Release whatever the launcher holds (processes, servers)
    async fn shutdown(&self) -> E2eResult<()> {
        Ok(())
    }
}

/// The references a scenario holds into its own application instance
pub struct ApplicationHandle {
    app: Box<dyn Playground>,
    gateway: Arc<Gateway>,
}

impl ApplicationHandle {
    pub fn new(app: Box<dyn Playground>) -> Self {
        let gateway = app.gateway();
        Self { app, gateway }
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    pub async fn header(&self) -> E2eResult<String> {
        Ok(self.app.text(Element::Header).await?.trim().to_string())
    }

    pub async fn editor(&self) -> E2eResult<String> {
        self.app.value(Element::Editor).await
    }

    pub async fn status(&self) -> E2eResult<String> {
        self.app.value(Element::Status).await
    }

    pub async fn result(&self) -> E2eResult<String> {
        self.app.text(Element::Result).await
    }

    pub async fn name(&self) -> E2eResult<String> {
        self.app.value(Element::Name).await
    }

    /// Activate the command bar the way typing does, then replace the editor text
    pub async fn type_query(&self, sql: &str) -> E2eResult<()> {
        self.app.dispatch(Element::Editor, DomEvent::Input).await?;
        self.app.set_value(Element::Editor, sql).await
    }

    pub async fn rename(&self, name: &str) -> E2eResult<()> {
        self.app.set_value(Element::Name, name).await?;
        self.app.dispatch(Element::Name, DomEvent::Change).await
    }
}

impl std::ops::Deref for ApplicationHandle {
    type Target = dyn Playground;

    fn deref(&self) -> &Self::Target {
        self.app.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("", Route::New ; "empty")]
    #[test_case("#", Route::New ; "bare hash")]
    #[test_case("#demo.db", Route::Database("demo.db".into()) ; "database")]
    #[test_case("whatever", Route::Database("whatever".into()) ; "no hash")]
    #[test_case("#gist:42", Route::Gist("42".into()) ; "gist")]
    fn test_route_parse(fragment: &str, expected: Route) {
        assert_eq!(Route::parse(fragment), expected);
    }

    #[test]
    fn test_route_fragment_round_trip() {
        let route = Route::Gist("e012594111ce51f91590c4737e41a046".into());
        assert_eq!(Route::parse(&route.fragment()), route);
    }

    #[test]
    fn test_query_cache_key() {
        assert_eq!(query_cache_key(DEFAULT_DATABASE), "new.db.sql");
    }
}
