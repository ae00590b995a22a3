//! Dashboard API behind the query cache.

use color_eyre::Result;
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::info;

use super::client::DashboardApi;
use super::transport::{HttpTransport, Transport};
use super::types::{
  Dashboard, Inventory, Profile, SessionState, Settings, SettingsPatch, SyncReceipt, SyncStatus,
};
use crate::auth::AccessToken;
use crate::cache::{QueryClient, QueryKey};
use crate::config::ApiConfig;
use crate::error::QueryError;
use crate::mutation::{run_mutation, MutationEffects};
use crate::prefetch::ensure_safe;
use crate::query::Query;

/// Cacheable resources with a fixed key. Dungeon logs are parameterized and
/// live in [`crate::pagination`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
  Session,
  Dashboard,
  Inventory,
  SyncStatus,
  Profile,
  Settings,
}

impl Resource {
  pub fn key(&self) -> QueryKey {
    QueryKey::new(self.root())
  }

  fn root(&self) -> &'static str {
    match self {
      Resource::Session => "session",
      Resource::Dashboard => "dashboard",
      Resource::Inventory => "inventory",
      Resource::SyncStatus => "sync-status",
      Resource::Profile => "profile",
      Resource::Settings => "settings",
    }
  }

  /// How long fetched data counts as fresh.
  pub fn stale_after(&self) -> Duration {
    match self {
      Resource::Session => Duration::from_secs(300),
      Resource::Dashboard | Resource::Inventory | Resource::SyncStatus => Duration::from_secs(30),
      Resource::Profile => Duration::from_secs(60),
      Resource::Settings => Duration::from_secs(120),
    }
  }
}

/// Dashboard API with transparent caching.
///
/// This wraps the underlying DashboardApi with the shared query cache. Reads
/// go through the cache, mutations invalidate what they change, and login
/// and logout keep the token slot and the cache in step.
#[derive(Clone)]
pub struct CachedApi {
  inner: DashboardApi,
  client: QueryClient,
  token: AccessToken,
}

impl CachedApi {
  /// Create a cached client talking HTTP to the configured API.
  pub fn new(config: &ApiConfig, client: QueryClient, token: AccessToken) -> Result<Self> {
    let transport = HttpTransport::new(&config.url, config.timeout(), token.accessor())?;
    Ok(Self::with_transport(Arc::new(transport), client, token))
  }

  pub fn with_transport(transport: Arc<dyn Transport>, client: QueryClient, token: AccessToken) -> Self {
    let inner = DashboardApi::new(transport, token.accessor());
    Self {
      inner,
      client,
      token,
    }
  }

  pub fn client(&self) -> &QueryClient {
    &self.client
  }

  pub fn api(&self) -> &DashboardApi {
    &self.inner
  }

  pub fn token(&self) -> &AccessToken {
    &self.token
  }

  fn fetcher<T, F, Fut>(
    &self,
    call: F,
  ) -> impl Fn() -> BoxFuture<'static, Result<T, QueryError>> + Send + Sync + 'static
  where
    T: 'static,
    F: Fn(DashboardApi) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, QueryError>> + Send + 'static,
  {
    let inner = self.inner.clone();
    move || call(inner.clone()).boxed()
  }

  /// Current session, fetched only when none is cached (or it was invalidated).
  pub async fn session(&self) -> Result<Arc<SessionState>, QueryError> {
    let resource = Resource::Session;
    let fetcher = self.fetcher(|api| async move { api.session().await });
    self
      .client
      .ensure(&resource.key(), resource.stale_after(), fetcher)
      .await
  }

  /// Warm the cache for `resource`, tolerating network and server failures.
  pub async fn prefetch(&self, resource: Resource) -> Result<(), QueryError> {
    let key = resource.key();
    let stale = resource.stale_after();
    let client = &self.client;
    match resource {
      Resource::Session => {
        let fetcher = self.fetcher(|api| async move { api.session().await });
        ensure_safe(client, &key, stale, fetcher).await
      }
      Resource::Dashboard => {
        let fetcher = self.fetcher(|api| async move { api.dashboard().await });
        ensure_safe(client, &key, stale, fetcher).await
      }
      Resource::Inventory => {
        let fetcher = self.fetcher(|api| async move { api.inventory().await });
        ensure_safe(client, &key, stale, fetcher).await
      }
      Resource::SyncStatus => {
        let fetcher = self.fetcher(|api| async move { api.sync_status().await });
        ensure_safe(client, &key, stale, fetcher).await
      }
      Resource::Profile => {
        let fetcher = self.fetcher(|api| async move { api.profile().await });
        ensure_safe(client, &key, stale, fetcher).await
      }
      Resource::Settings => {
        let fetcher = self.fetcher(|api| async move { api.settings().await });
        ensure_safe(client, &key, stale, fetcher).await
      }
    }
  }

  pub fn watch_session(&self) -> Query<SessionState> {
    let fetcher = self.fetcher(|api| async move { api.session().await });
    self.watch(Resource::Session, fetcher)
  }

  pub fn watch_dashboard(&self) -> Query<Dashboard> {
    let fetcher = self.fetcher(|api| async move { api.dashboard().await });
    self.watch(Resource::Dashboard, fetcher)
  }

  pub fn watch_inventory(&self) -> Query<Inventory> {
    let fetcher = self.fetcher(|api| async move { api.inventory().await });
    self.watch(Resource::Inventory, fetcher)
  }

  pub fn watch_sync_status(&self) -> Query<SyncStatus> {
    let fetcher = self.fetcher(|api| async move { api.sync_status().await });
    self.watch(Resource::SyncStatus, fetcher)
  }

  pub fn watch_profile(&self) -> Query<Profile> {
    let fetcher = self.fetcher(|api| async move { api.profile().await });
    self.watch(Resource::Profile, fetcher)
  }

  pub fn watch_settings(&self) -> Query<Settings> {
    let fetcher = self.fetcher(|api| async move { api.settings().await });
    self.watch(Resource::Settings, fetcher)
  }

  fn watch<T, F, Fut>(&self, resource: Resource, fetcher: F) -> Query<T>
  where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, QueryError>> + Send + 'static,
  {
    Query::new(
      self.client.clone(),
      resource.key(),
      resource.stale_after(),
      fetcher,
    )
  }

  /// Pull the latest inventory from the game server.
  ///
  /// Inventory and dashboard are refreshed on success; the sync status is
  /// refreshed either way since it records the attempt.
  pub async fn sync_inventory(&self) -> Result<SyncReceipt, QueryError> {
    let effects = MutationEffects::new()
      .on_success(Resource::Inventory.key())
      .on_success(Resource::Dashboard.key())
      .on_settle(Resource::SyncStatus.key());
    run_mutation(&self.client, "sync_inventory", self.inner.sync_inventory(), &effects).await
  }

  pub async fn update_settings(&self, patch: &SettingsPatch) -> Result<Settings, QueryError> {
    let effects = MutationEffects::new()
      .on_success(Resource::Settings.key())
      .on_success(Resource::Profile.key());
    run_mutation(&self.client, "update_settings", self.inner.update_settings(patch), &effects).await
  }

  /// Store `token` and drop the cached session so the next guard check asks
  /// the server again. A blank token leaves the user signed out, and the
  /// session resolves to anonymous without a request.
  pub async fn login(&self, token: &str) {
    self.token.set(token);
    self.client.invalidate(&Resource::Session.key()).await;
  }

  /// End the session. Local state is cleared even when the server call fails,
  /// so the mutation carries no invalidations of its own: the whole cache goes.
  pub async fn logout(&self) -> Result<(), QueryError> {
    let effects = MutationEffects::new();
    let result = run_mutation(&self.client, "logout", self.inner.logout(), &effects).await;
    self.token.clear();
    self.client.clear();
    info!("logged out");
    result
  }
}
