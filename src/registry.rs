//! Backend registry and dispatcher.
//!
//! Backends are published once, in order, and frozen. Dispatch filters them
//! with the request's predicate, scores the survivors and runs the winner.
//! Publication order breaks ties.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::backend::{vcs, xcelium, Backend, HookSet, InvocationContext};
use crate::config::SimConfig;
use crate::error::{DispatchError, SimResult, ValidationError};
use crate::request::SimulationRequest;
use crate::result::SimulationResult;

fn effective(score: f64) -> f64 {
    if score.is_finite() {
        score
    } else {
        f64::NEG_INFINITY
    }
}

/// Append-only collection of backends under construction.
#[derive(Default)]
pub struct RegistryBuilder {
    backends: Vec<Arc<dyn Backend>>,
}

impl RegistryBuilder {
    /// An empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a backend after the existing ones.
    pub fn publish<B: Backend + 'static>(self, backend: B) -> Result<Self, ValidationError> {
        self.publish_shared(Arc::new(backend))
    }

    /// Publishes an already shared backend.
    pub fn publish_shared(mut self, backend: Arc<dyn Backend>) -> Result<Self, ValidationError> {
        let name = &backend.descriptor().name;
        if name.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "backend.name".to_string(),
            });
        }
        if self.backends.iter().any(|b| b.descriptor().name == *name) {
            return Err(ValidationError::DuplicateBackend { name: name.clone() });
        }
        self.backends.push(backend);
        Ok(self)
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> BackendRegistry {
        BackendRegistry {
            backends: self.backends,
        }
    }
}

/// A filtered backend and its score.
#[derive(Clone, Copy)]
pub struct Candidate<'a> {
    /// The backend.
    pub backend: &'a dyn Backend,
    /// Its score for the request.
    pub score: f64,
}

impl fmt::Debug for Candidate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("backend", &self.backend.descriptor().name)
            .field("score", &self.score)
            .finish()
    }
}

/// Frozen, ordered set of backends.
pub struct BackendRegistry {
    backends: Vec<Arc<dyn Backend>>,
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry").field("backends", &self.names()).finish()
    }
}

impl BackendRegistry {
    /// Starts a builder.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// The stock backends, published as `vcs`, `vcs-waves`, `xcelium`,
    /// `xcelium-waves`. Every backend shares `hooks`.
    pub fn standard(config: &SimConfig, hooks: HookSet) -> SimResult<Self> {
        let tools = &config.tools;
        Ok(RegistryBuilder::new()
            .publish(vcs::backend(tools.vcs.clone(), false, hooks.clone()))?
            .publish(vcs::backend(tools.vcs.clone(), true, hooks.clone()))?
            .publish(xcelium::backend(tools.xcelium.clone(), false, hooks.clone()))?
            .publish(xcelium::backend(tools.xcelium.clone(), true, hooks))?
            .build())
    }

    /// Number of backends.
    #[must_use]
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Returns true if nothing was published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Backend names in publication order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.descriptor().name.as_str()).collect()
    }

    /// Looks a backend up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Backend> {
        self.backends
            .iter()
            .find(|b| b.descriptor().name == name)
            .map(|b| b.as_ref())
    }

    /// Scores every backend that passes the request's filter, in
    /// publication order.
    ///
    /// Backends rejected by the filter are never scored. An empty registry
    /// matches nothing and reports `BackendNotFound` like any other miss.
    pub fn rank(&self, request: &SimulationRequest) -> SimResult<Vec<Candidate<'_>>> {
        let filter = &request.preferences.filter;
        let candidates: Vec<Candidate<'_>> = self
            .backends
            .iter()
            .filter(|b| filter.accepts(b.descriptor()))
            .map(|b| Candidate {
                backend: b.as_ref(),
                score: b.score(request),
            })
            .collect();
        if candidates.is_empty() {
            return Err(DispatchError::BackendNotFound {
                criteria: filter.describe(),
            }
            .into());
        }
        Ok(candidates)
    }

    /// Picks the highest-scoring candidate.
    ///
    /// Ties go to the earliest published backend. Non-finite scores rank
    /// below every finite one.
    #[allow(clippy::float_cmp)]
    pub fn select(&self, request: &SimulationRequest) -> SimResult<&dyn Backend> {
        let candidates = self.rank(request)?;

        for c in candidates.iter().filter(|c| !c.score.is_finite()) {
            warn!(backend = %c.backend.descriptor().name, score = c.score, "non-finite backend score");
        }

        let mut best = candidates[0];
        for c in &candidates[1..] {
            if effective(c.score) > effective(best.score) {
                best = *c;
            }
        }

        let tied: Vec<&str> = candidates
            .iter()
            .filter(|c| effective(c.score) == effective(best.score))
            .map(|c| c.backend.descriptor().name.as_str())
            .collect();
        if tied.len() > 1 {
            warn!(
                chosen = %best.backend.descriptor().name,
                tied = ?tied,
                score = best.score,
                "backend scores tied; using first published"
            );
        }

        info!(
            dut = %request.dut,
            backend = %best.backend.descriptor().name,
            score = best.score,
            candidates = candidates.len(),
            "backend selected"
        );
        Ok(best.backend)
    }

    /// Selects a backend and runs the request through it.
    pub fn dispatch(&self, request: &SimulationRequest, ctx: InvocationContext<'_>) -> SimResult<SimulationResult> {
        self.select(request)?.invoke(request, ctx)
    }
}
