//! Render-source capability trait.
//!
//! This trait is the seam between the pure validation core and whatever
//! actually renders configuration: an HTTP render service in production, a
//! mock in tests.

use async_trait::async_trait;

use crate::diff::{ConfigTree, EnvironmentId, HostId, PlanId};
use crate::error::RenderError;

/// Capability for rendering per-host data in a named environment.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RenderSource: Send + Sync {
    /// Renders the full configuration tree for a host in an environment.
    ///
    /// Fails with a [`RenderError`] when the environment cannot be compiled
    /// for the host (missing environment, template or rendering failure).
    async fn fetch_config_tree(
        &self,
        host: &HostId,
        environment: &EnvironmentId,
    ) -> Result<ConfigTree, RenderError>;

    /// Compiles the execution plan for a host in an environment and returns
    /// the ordered step identifiers. Same failure mode as
    /// [`fetch_config_tree`](Self::fetch_config_tree).
    async fn fetch_plan_ids(
        &self,
        host: &HostId,
        environment: &EnvironmentId,
    ) -> Result<Vec<PlanId>, RenderError>;

    /// Refreshes the underlying version-controlled configuration content.
    ///
    /// Idempotent; intended as an optional pre-step before fetching so that
    /// freshly pushed branches are visible to the render service.
    async fn refresh_sources(&self) -> Result<(), RenderError>;
}

#[async_trait]
impl<S: RenderSource + ?Sized> RenderSource for Box<S> {
    async fn fetch_config_tree(
        &self,
        host: &HostId,
        environment: &EnvironmentId,
    ) -> Result<ConfigTree, RenderError> {
        (**self).fetch_config_tree(host, environment).await
    }

    async fn fetch_plan_ids(
        &self,
        host: &HostId,
        environment: &EnvironmentId,
    ) -> Result<Vec<PlanId>, RenderError> {
        (**self).fetch_plan_ids(host, environment).await
    }

    async fn refresh_sources(&self) -> Result<(), RenderError> {
        (**self).refresh_sources().await
    }
}
