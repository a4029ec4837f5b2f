//! Orchestration of per-host change validation.
//!
//! Both validation operations are a two-phase pipeline: fetch-all (can fail,
//! terminal) then compute-all (pure, cannot fail). There is no
//! partial-success state; either every host's data is fetched or the
//! operation returns an error and no report.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::diff::{
    ConfigTree, DiffNode, EnvironmentId, HostId, PlanId, PlanSetDiff, SetDiffEngine,
    TreeDiffEngine, UnchangedPruner,
};
use crate::error::{DriftgateError, FetchError, Result};
use crate::render::RenderSource;

use super::report::{ConfigChangeReport, PlanChangeReport};

/// Default number of hosts fetched concurrently.
const DEFAULT_FETCH_CONCURRENCY: usize = 4;

/// Orchestrates change validation across a set of hosts.
///
/// The render capability is injected explicitly; there is no ambient or
/// global lookup. All state is constructed fresh per call and discarded once
/// the report is returned.
pub struct ChangeValidator<S> {
    /// Render-service capability.
    source: Arc<S>,
    /// Maximum concurrent per-host fetches.
    concurrency: usize,
    /// Whether to refresh source content once before fetching.
    refresh_sources: bool,
    /// Tree diff engine.
    tree_engine: TreeDiffEngine,
    /// Unchanged-structure pruner.
    pruner: UnchangedPruner,
    /// Plan-set diff engine.
    set_engine: SetDiffEngine,
}

impl<S: RenderSource + 'static> ChangeValidator<S> {
    /// Creates a new validator over the given render source.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            concurrency: DEFAULT_FETCH_CONCURRENCY,
            refresh_sources: false,
            tree_engine: TreeDiffEngine::new(),
            pruner: UnchangedPruner::new(),
            set_engine: SetDiffEngine::new(),
        }
    }

    /// Sets the maximum number of hosts fetched concurrently.
    ///
    /// Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Enables or disables the source-content refresh pre-step.
    #[must_use]
    pub const fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh_sources = refresh;
        self
    }

    /// Validates a proposed configuration change across the given hosts.
    ///
    /// Renders each host's configuration in both environments, diffs the two
    /// per-host trees as one outer tree (host ids form the top diff level)
    /// and prunes unchanged structure. A host with no differences is absent
    /// from the report.
    ///
    /// # Errors
    ///
    /// Returns [`DriftgateError::InvalidArgument`] before any fetch when the
    /// host list is empty or an identifier is blank, and
    /// [`DriftgateError::Fetch`] when rendering fails for any
    /// host/environment pair - in which case no report is produced.
    pub async fn validate_config_change(
        &self,
        hosts: &[HostId],
        target_env: &EnvironmentId,
        incoming_env: &EnvironmentId,
    ) -> Result<ConfigChangeReport> {
        Self::check_arguments(hosts, target_env, incoming_env)?;
        self.refresh_if_enabled().await?;

        info!(
            "Validating configuration change for {} hosts: '{}' -> '{}'",
            hosts.len(),
            target_env,
            incoming_env
        );

        let fetched = self
            .fetch_all(hosts, target_env, incoming_env, |source, host, env| async move {
                source.fetch_config_tree(&host, &env).await
            })
            .await
            .map_err(Self::render_fetch_error)?;

        // Assemble one outer tree per side, keyed by host id, so host ids
        // participate as the top level of the diff.
        let mut target_fields = BTreeMap::new();
        let mut incoming_fields = BTreeMap::new();
        for (host, (target_tree, incoming_tree)) in fetched {
            target_fields.insert(host.to_string(), target_tree);
            incoming_fields.insert(host.to_string(), incoming_tree);
        }

        let diff = self.tree_engine.diff(
            &ConfigTree::Branch(target_fields),
            &ConfigTree::Branch(incoming_fields),
        );

        let changes: BTreeMap<HostId, DiffNode> = match self.pruner.prune(&diff) {
            Some(DiffNode::Branch(children)) => children
                .into_iter()
                .map(|(host, node)| (HostId::from(host), node))
                .collect(),
            // Everything pruned away: no host changed.
            _ => BTreeMap::new(),
        };

        debug!("{} of {} hosts have changes", changes.len(), hosts.len());

        Ok(ConfigChangeReport {
            target_environment: target_env.clone(),
            incoming_environment: incoming_env.clone(),
            generated_at: Utc::now(),
            hosts_checked: hosts.len(),
            changes,
        })
    }

    /// Validates a proposed execution-plan change across the given hosts.
    ///
    /// Compiles each host's plan in both environments, treats the returned
    /// step sequences as sets, and diffs them. Every requested host appears
    /// in the report, even with an empty diff object - there is no outer
    /// pruning for plans.
    ///
    /// # Errors
    ///
    /// Same failure modes as
    /// [`validate_config_change`](Self::validate_config_change).
    pub async fn validate_execution_plan_change(
        &self,
        hosts: &[HostId],
        target_env: &EnvironmentId,
        incoming_env: &EnvironmentId,
    ) -> Result<PlanChangeReport> {
        Self::check_arguments(hosts, target_env, incoming_env)?;
        self.refresh_if_enabled().await?;

        info!(
            "Validating execution plan change for {} hosts: '{}' -> '{}'",
            hosts.len(),
            target_env,
            incoming_env
        );

        let fetched = self
            .fetch_all(hosts, target_env, incoming_env, |source, host, env| async move {
                source.fetch_plan_ids(&host, &env).await
            })
            .await
            .map_err(Self::plan_fetch_error)?;

        let changes: BTreeMap<HostId, PlanSetDiff> = fetched
            .into_iter()
            .map(|(host, (target_ids, incoming_ids))| {
                let target_set: BTreeSet<PlanId> = target_ids.into_iter().collect();
                let incoming_set: BTreeSet<PlanId> = incoming_ids.into_iter().collect();
                (host, self.set_engine.diff_sets(&target_set, &incoming_set))
            })
            .collect();

        Ok(PlanChangeReport {
            target_environment: target_env.clone(),
            incoming_environment: incoming_env.clone(),
            generated_at: Utc::now(),
            hosts_checked: hosts.len(),
            changes,
        })
    }

    /// Rejects missing or blank identifiers before any fetch begins.
    fn check_arguments(
        hosts: &[HostId],
        target_env: &EnvironmentId,
        incoming_env: &EnvironmentId,
    ) -> Result<()> {
        if hosts.is_empty() {
            return Err(DriftgateError::invalid_argument(
                "at least one host id is required",
            ));
        }
        if hosts.iter().any(HostId::is_blank) {
            return Err(DriftgateError::invalid_argument("host ids must not be blank"));
        }
        if target_env.is_blank() {
            return Err(DriftgateError::invalid_argument(
                "target environment id must not be blank",
            ));
        }
        if incoming_env.is_blank() {
            return Err(DriftgateError::invalid_argument(
                "incoming environment id must not be blank",
            ));
        }
        Ok(())
    }

    /// Runs the optional source-content refresh once, before fetching.
    async fn refresh_if_enabled(&self) -> Result<()> {
        if self.refresh_sources {
            debug!("Refreshing source content before fetch");
            self.source
                .refresh_sources()
                .await
                .map_err(|source| FetchError::Refresh { source })?;
        }
        Ok(())
    }

    /// Fetch-all phase: one task per host, bounded by a semaphore.
    ///
    /// Each task fetches the target and incoming data for its host. The
    /// first failure aborts the remaining in-flight fetches and is surfaced
    /// immediately; results are keyed by host id so the outcome does not
    /// depend on completion order.
    async fn fetch_all<T, F, Fut>(
        &self,
        hosts: &[HostId],
        target_env: &EnvironmentId,
        incoming_env: &EnvironmentId,
        fetch: F,
    ) -> std::result::Result<BTreeMap<HostId, (T, T)>, HostFetchFailure>
    where
        T: Send + 'static,
        F: Fn(Arc<S>, HostId, EnvironmentId) -> Fut + Clone + Send + 'static,
        Fut: std::future::Future<Output = std::result::Result<T, crate::error::RenderError>>
            + Send
            + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks: JoinSet<std::result::Result<(HostId, T, T), HostFetchFailure>> =
            JoinSet::new();

        for host in hosts {
            let source = Arc::clone(&self.source);
            let permits = Arc::clone(&semaphore);
            let fetch = fetch.clone();
            let host = host.clone();
            let target = target_env.clone();
            let incoming = incoming_env.clone();

            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| HostFetchFailure::Internal(format!("fetch pool closed: {e}")))?;

                let target_data = fetch(Arc::clone(&source), host.clone(), target.clone())
                    .await
                    .map_err(|source_err| HostFetchFailure::Render {
                        host: host.clone(),
                        environment: target,
                        source: source_err,
                    })?;
                let incoming_data = fetch(source, host.clone(), incoming.clone())
                    .await
                    .map_err(|source_err| HostFetchFailure::Render {
                        host: host.clone(),
                        environment: incoming,
                        source: source_err,
                    })?;

                Ok((host, target_data, incoming_data))
            });
        }

        let mut results = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok((host, target_data, incoming_data))) => {
                    results.insert(host, (target_data, incoming_data));
                }
                Ok(Err(failure)) => {
                    // Fail fast: cancel in-flight fetches, return no report.
                    tasks.abort_all();
                    return Err(failure);
                }
                Err(join_err) => {
                    tasks.abort_all();
                    return Err(HostFetchFailure::Internal(format!(
                        "fetch task failed: {join_err}"
                    )));
                }
            }
        }

        Ok(results)
    }

    /// Maps a fetch failure to a configuration-render error.
    fn render_fetch_error(failure: HostFetchFailure) -> DriftgateError {
        match failure {
            HostFetchFailure::Render {
                host,
                environment,
                source,
            } => FetchError::Render {
                host,
                environment,
                source,
            }
            .into(),
            HostFetchFailure::Internal(message) => DriftgateError::internal(message),
        }
    }

    /// Maps a fetch failure to a plan-compilation error.
    fn plan_fetch_error(failure: HostFetchFailure) -> DriftgateError {
        match failure {
            HostFetchFailure::Render {
                host,
                environment,
                source,
            } => FetchError::Plan {
                host,
                environment,
                source,
            }
            .into(),
            HostFetchFailure::Internal(message) => DriftgateError::internal(message),
        }
    }
}

/// Failure of a single host's fetch task, before error classification.
enum HostFetchFailure {
    /// The collaborator failed for a host/environment pair.
    Render {
        host: HostId,
        environment: EnvironmentId,
        source: crate::error::RenderError,
    },
    /// Task-pool failure (panic or closed semaphore).
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::ChangeKind;
    use crate::error::RenderError;
    use crate::render::MockRenderSource;
    use serde_json::json;

    fn hosts(ids: &[&str]) -> Vec<HostId> {
        ids.iter().map(|id| HostId::from(*id)).collect()
    }

    fn env(id: &str) -> EnvironmentId {
        EnvironmentId::from(id)
    }

    fn plan(ids: &[&str]) -> Vec<PlanId> {
        ids.iter().map(|id| PlanId::from(*id)).collect()
    }

    #[tokio::test]
    async fn test_empty_host_list_rejected_before_fetch() {
        // No expectations set: any fetch would panic the mock.
        let validator = ChangeValidator::new(MockRenderSource::new());

        let err = validator
            .validate_config_change(&[], &env("base"), &env("dev.pr1"))
            .await
            .unwrap_err();

        assert!(matches!(err, DriftgateError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_blank_environment_rejected() {
        let validator = ChangeValidator::new(MockRenderSource::new());

        let err = validator
            .validate_config_change(&hosts(&["web01"]), &env("  "), &env("dev.pr1"))
            .await
            .unwrap_err();

        assert!(matches!(err, DriftgateError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_clean_host_omitted_from_config_report() {
        let mut source = MockRenderSource::new();
        source.expect_fetch_config_tree().returning(|host, environment| {
            let value = match (host.as_str(), environment.as_str()) {
                ("web01", _) => json!({"common": {"key": "same"}}),
                ("web02", "base") => json!({"common": {"key": "old"}}),
                ("web02", _) => json!({"common": {"key": "new"}}),
                _ => json!({}),
            };
            Ok(ConfigTree::from(value))
        });

        let validator = ChangeValidator::new(source);
        let report = validator
            .validate_config_change(&hosts(&["web01", "web02"]), &env("base"), &env("dev.pr1"))
            .await
            .unwrap();

        assert!(report.has_changes());
        assert_eq!(report.hosts_checked, 2);
        assert!(!report.changes.contains_key(&HostId::from("web01")));
        assert_eq!(
            report.changes[&HostId::from("web02")],
            DiffNode::Branch(
                [(
                    "common".to_string(),
                    DiffNode::Branch(
                        [("key".to_string(), DiffNode::Leaf(ChangeKind::Modified))]
                            .into_iter()
                            .collect()
                    )
                )]
                .into_iter()
                .collect()
            )
        );
    }

    #[tokio::test]
    async fn test_no_changes_yields_empty_report() {
        let mut source = MockRenderSource::new();
        source
            .expect_fetch_config_tree()
            .returning(|_, _| Ok(ConfigTree::from(json!({"a": 1}))));

        let validator = ChangeValidator::new(source);
        let report = validator
            .validate_config_change(&hosts(&["web01", "web02"]), &env("base"), &env("dev.pr1"))
            .await
            .unwrap();

        assert!(!report.has_changes());
        assert!(report.changes.is_empty());
        assert_eq!(report.hosts_checked, 2);
    }

    #[tokio::test]
    async fn test_every_host_present_in_plan_report() {
        let mut source = MockRenderSource::new();
        source.expect_fetch_plan_ids().returning(|host, environment| {
            Ok(match (host.as_str(), environment.as_str()) {
                ("web01", _) => plan(&["s1", "s2"]),
                ("web02", "base") => plan(&["s1", "s2"]),
                ("web02", _) => plan(&["s2", "s3"]),
                _ => vec![],
            })
        });

        let validator = ChangeValidator::new(source);
        let report = validator
            .validate_execution_plan_change(
                &hosts(&["web01", "web02"]),
                &env("base"),
                &env("dev.pr1"),
            )
            .await
            .unwrap();

        // web01 is unchanged but still present, with an empty diff object.
        assert!(report.changes[&HostId::from("web01")].is_empty());

        let web02 = &report.changes[&HostId::from("web02")];
        assert_eq!(web02.added, plan(&["s3"]).into_iter().collect());
        assert_eq!(web02.removed, plan(&["s1"]).into_iter().collect());
        assert!(report.has_changes());
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_whole_operation() {
        let mut source = MockRenderSource::new();
        source.expect_fetch_config_tree().returning(|host, _| {
            if host.as_str() == "web02" {
                Err(RenderError::RenderFailed {
                    message: "template error".to_string(),
                })
            } else {
                Ok(ConfigTree::from(json!({"a": 1})))
            }
        });

        let validator = ChangeValidator::new(source).with_concurrency(1);
        let err = validator
            .validate_config_change(
                &hosts(&["web01", "web02", "web03"]),
                &env("base"),
                &env("dev.pr1"),
            )
            .await
            .unwrap_err();

        // No partial report for web01 or web03: the whole call fails with
        // host and environment context attached.
        match err {
            DriftgateError::Fetch(FetchError::Render { host, environment, .. }) => {
                assert_eq!(host, HostId::from("web02"));
                assert_eq!(environment, env("base"));
            }
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_plan_fetch_failure_carries_plan_context() {
        let mut source = MockRenderSource::new();
        source.expect_fetch_plan_ids().returning(|_, environment| {
            if environment.as_str() == "dev.pr1" {
                Err(RenderError::EnvironmentNotFound {
                    environment: "dev.pr1".to_string(),
                })
            } else {
                Ok(plan(&["s1"]))
            }
        });

        let validator = ChangeValidator::new(source);
        let err = validator
            .validate_execution_plan_change(&hosts(&["web01"]), &env("base"), &env("dev.pr1"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DriftgateError::Fetch(FetchError::Plan { environment, .. }) if environment == env("dev.pr1")
        ));
    }

    #[tokio::test]
    async fn test_refresh_runs_once_before_fetching() {
        let mut source = MockRenderSource::new();
        source.expect_refresh_sources().times(1).returning(|| Ok(()));
        source
            .expect_fetch_config_tree()
            .returning(|_, _| Ok(ConfigTree::from(json!({"a": 1}))));

        let validator = ChangeValidator::new(source).with_refresh(true);
        let report = validator
            .validate_config_change(&hosts(&["web01", "web02"]), &env("base"), &env("dev.pr1"))
            .await
            .unwrap();

        assert!(!report.has_changes());
    }

    #[tokio::test]
    async fn test_refresh_failure_is_fatal() {
        let mut source = MockRenderSource::new();
        source.expect_refresh_sources().returning(|| {
            Err(RenderError::network("connection refused"))
        });

        let validator = ChangeValidator::new(source).with_refresh(true);
        let err = validator
            .validate_config_change(&hosts(&["web01"]), &env("base"), &env("dev.pr1"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DriftgateError::Fetch(FetchError::Refresh { .. })
        ));
    }

    #[tokio::test]
    async fn test_report_deterministic_under_concurrency() {
        let mut source = MockRenderSource::new();
        source.expect_fetch_config_tree().returning(|host, environment| {
            let value = if environment.as_str() == "base" {
                json!({"id": host.as_str(), "v": 1})
            } else {
                json!({"id": host.as_str(), "v": 2})
            };
            Ok(ConfigTree::from(value))
        });

        let host_ids = hosts(&["web05", "web01", "web03", "web02", "web04"]);
        let validator = ChangeValidator::new(source).with_concurrency(5);
        let report = validator
            .validate_config_change(&host_ids, &env("base"), &env("dev.pr1"))
            .await
            .unwrap();

        // Keyed by host id, ordered, regardless of completion order.
        let keys: Vec<&HostId> = report.changes.keys().collect();
        assert_eq!(
            keys,
            vec![
                &HostId::from("web01"),
                &HostId::from("web02"),
                &HostId::from("web03"),
                &HostId::from("web04"),
                &HostId::from("web05"),
            ]
        );
    }
}
