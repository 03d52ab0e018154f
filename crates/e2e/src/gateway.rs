//! The persistence gateway: the application's gist client
//!
//! Each method lives in a [`Slot`] so scenarios can swap in scripted
//! responses through the [`InterceptionRegistry`](crate::intercept::InterceptionRegistry).

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};

use crate::error::E2eResult;
use crate::intercept::{Slot, TargetId};

/// A saved snippet as returned by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gist {
    pub id: String,
    pub name: String,
    pub owner: String,
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub query: String,
}

impl Gist {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        owner: impl Into<String>,
        schema: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            owner: owner.into(),
            schema: schema.into(),
            query: query.into(),
        }
    }
}

/// Account used to save gists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

pub type GatewayFuture = BoxFuture<'static, E2eResult<Gist>>;

/// `create(name, schema, query)`
pub type CreateFn = dyn Fn(String, String, String) -> GatewayFuture + Send + Sync;
/// `update(id, name, schema, query)`
pub type UpdateFn = dyn Fn(String, String, String, String) -> GatewayFuture + Send + Sync;
/// `get(id)`
pub type GetFn = dyn Fn(String) -> GatewayFuture + Send + Sync;

pub const CREATE: &str = "create";
pub const UPDATE: &str = "update";
pub const GET: &str = "get";

/// Interceptable gist client
pub struct Gateway {
    target: TargetId,
    create: Arc<Slot<CreateFn>>,
    update: Arc<Slot<UpdateFn>>,
    get: Arc<Slot<GetFn>>,
}

impl Gateway {
    pub fn new(create: Arc<CreateFn>, update: Arc<UpdateFn>, get: Arc<GetFn>) -> Self {
        let target = TargetId::fresh("gateway");
        Self {
            target,
            create: Arc::new(Slot::new(target, CREATE, create)),
            update: Arc::new(Slot::new(target, UPDATE, update)),
            get: Arc::new(Slot::new(target, GET, get)),
        }
    }

    pub fn target(&self) -> TargetId {
        self.target
    }

    pub fn create_slot(&self) -> &Arc<Slot<CreateFn>> {
        &self.create
    }

    pub fn update_slot(&self) -> &Arc<Slot<UpdateFn>> {
        &self.update
    }

    pub fn get_slot(&self) -> &Arc<Slot<GetFn>> {
        &self.get
    }

    pub fn create(&self, name: String, schema: String, query: String) -> GatewayFuture {
        (self.create.get())(name, schema, query)
    }

    pub fn update(&self, id: String, name: String, schema: String, query: String) -> GatewayFuture {
        (self.update.get())(id, name, schema, query)
    }

    pub fn fetch(&self, id: String) -> GatewayFuture {
        (self.get.get())(id)
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("target", &self.target)
            .field("create", &self.create)
            .field("update", &self.update)
            .field("get", &self.get)
            .finish()
    }
}

pub fn create_fn<F, Fut>(f: F) -> Arc<CreateFn>
where
    F: Fn(String, String, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = E2eResult<Gist>> + Send + 'static,
{
    Arc::new(move |name, schema, query| f(name, schema, query).boxed())
}

pub fn update_fn<F, Fut>(f: F) -> Arc<UpdateFn>
where
    F: Fn(String, String, String, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = E2eResult<Gist>> + Send + 'static,
{
    Arc::new(move |id, name, schema, query| f(id, name, schema, query).boxed())
}

pub fn get_fn<F, Fut>(f: F) -> Arc<GetFn>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = E2eResult<Gist>> + Send + 'static,
{
    Arc::new(move |id| f(id).boxed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::E2eError;
    use crate::intercept::InterceptionRegistry;

    fn offline_gateway() -> Gateway {
        Gateway::new(
            create_fn(|_, _, _| async { Err(E2eError::Gateway("offline".into())) }),
            update_fn(|_, _, _, _| async { Err(E2eError::Gateway("offline".into())) }),
            get_fn(|_| async { Err(E2eError::Gateway("offline".into())) }),
        )
    }

    #[tokio::test]
    async fn test_intercepted_create_answers_with_stub() {
        let gateway = offline_gateway();
        let registry = InterceptionRegistry::new();

        registry
            .intercept(
                gateway.create_slot(),
                create_fn(|name, schema, query| async move {
                    Ok(Gist::new("424242131313", name, "test", schema, query))
                }),
            )
            .unwrap();

        let gist = gateway
            .create("new.db".into(), String::new(), "select 1".into())
            .await
            .unwrap();
        assert_eq!(gist.id, "424242131313");
        assert_eq!(gist.query, "select 1");

        registry.release(gateway.target(), CREATE).unwrap();
        assert!(gateway.create("a".into(), "b".into(), "c".into()).await.is_err());
    }

    #[test]
    fn test_slots_share_the_gateway_target() {
        let gateway = offline_gateway();
        assert_eq!(gateway.create_slot().target(), gateway.target());
        assert_eq!(gateway.update_slot().method(), UPDATE);
        assert_eq!(gateway.get_slot().method(), GET);
    }

    #[test]
    fn test_gist_json_shape() {
        let gist = Gist::new("1", "demo.db", "test", "", "select 1");
        let value = serde_json::to_value(&gist).unwrap();
        assert_eq!(value["owner"], "test");
        let back: Gist = serde_json::from_value(serde_json::json!({
            "id": "1", "name": "demo.db", "owner": "test"
        }))
        .unwrap();
        assert_eq!(back.query, "");
    }
}
