//! Shared application state handed to every handler.

use std::path::PathBuf;
use std::sync::Arc;

use isoprobe_common::config::ProbeConfig;
use isoprobe_core::cgroup::CgroupInspector;
use isoprobe_core::namespace::NamespaceInspector;
use isoprobe_runtime::engine::StressEngine;
use isoprobe_runtime::metrics::MetricsAggregator;

/// State cloned into each request.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Validated configuration.
    pub config: Arc<ProbeConfig>,
    /// Request counters and custom metrics.
    pub metrics: Arc<MetricsAggregator>,
    /// Workload executor.
    pub engine: StressEngine,
    /// Namespace probe.
    pub namespaces: NamespaceInspector,
    /// Cgroup probe.
    pub cgroups: CgroupInspector,
    /// Directory probed by the read-only root check.
    pub root_dir: PathBuf,
}

impl AppState {
    /// Builds state that inspects the real host.
    pub fn new(config: ProbeConfig) -> Self {
        Self::with_inspectors(
            config,
            NamespaceInspector::default(),
            CgroupInspector::default(),
            PathBuf::from("/"),
        )
    }

    /// Builds state over explicit probe roots.
    pub fn with_inspectors(
        config: ProbeConfig,
        namespaces: NamespaceInspector,
        cgroups: CgroupInspector,
        root_dir: PathBuf,
    ) -> Self {
        let metrics = Arc::new(MetricsAggregator::new());
        let engine = StressEngine::new(
            config.limits,
            config.scratch_dir.clone(),
            Arc::clone(&metrics),
        );
        Self {
            config: Arc::new(config),
            metrics,
            engine,
            namespaces,
            cgroups,
            root_dir,
        }
    }
}
