//! Applies planned changes through a resource lifecycle and the state store
//!
//! State is saved after every resource transition, so an interrupted run
//! leaves every finished resource recorded.

use crate::error::{EngineError, EngineResult};
use crate::lifecycle::{Lifecycle, Persist, Transition};
use crate::planner::{Action, PlannedChange};
use tl_core::{ResourceName, StateStore};

/// Result of reconciling one resource
#[derive(Debug)]
pub struct Outcome {
    pub name: ResourceName,
    pub action: Action,
    /// Applied version recorded afterwards, `None` once removed
    pub version: Option<i64>,
    pub error: Option<EngineError>,
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Drives lifecycle calls and persists their transitions.
pub struct Reconciler<'a> {
    lifecycle: &'a dyn Lifecycle,
    state: &'a mut StateStore,
}

impl<'a> Reconciler<'a> {
    pub fn new(lifecycle: &'a dyn Lifecycle, state: &'a mut StateStore) -> Self {
        Self { lifecycle, state }
    }

    /// Record a transition. Returns the version now in state.
    fn persist(&mut self, name: &ResourceName, transition: &Transition) -> EngineResult<Option<i64>> {
        match &transition.persist {
            Persist::Put(resource) => {
                self.state.put(resource.clone())?;
                Ok(Some(resource.applied_version))
            }
            Persist::Remove => {
                self.state.remove(name)?;
                Ok(None)
            }
            Persist::Keep => Ok(self.state.get(name).map(|r| r.applied_version)),
        }
    }

    async fn run(&self, change: &PlannedChange) -> Transition {
        match (change.action, &change.planned, &change.prior) {
            (Action::Create, Some(planned), _) => self.lifecycle.create(planned).await,
            (Action::Update { .. }, Some(planned), Some(prior)) => {
                self.lifecycle.update(planned, prior).await
            }
            (Action::Delete, _, Some(prior)) => self.lifecycle.delete(prior).await,
            (Action::NoOp, _, _) => Transition {
                persist: Persist::Keep,
                error: None,
            },
            _ => Transition::keep(EngineError::UnknownResource {
                name: change.name.to_string(),
            }),
        }
    }

    /// Apply `changes` in order.
    ///
    /// A failing resource does not stop the others. Only a failure to save
    /// state aborts the run.
    pub async fn apply(&mut self, changes: &[PlannedChange]) -> EngineResult<Vec<Outcome>> {
        let mut outcomes = Vec::with_capacity(changes.len());
        for change in changes {
            if !change.is_noop() {
                log::info!("{}", change);
            }
            let transition = self.run(change).await;
            let version = self.persist(&change.name, &transition)?;
            if let Some(e) = &transition.error {
                log::error!("{}: {}", change.name, e);
            }
            outcomes.push(Outcome {
                name: change.name.clone(),
                action: change.action,
                version,
                error: transition.error,
            });
        }
        Ok(outcomes)
    }

    /// Re-read every resource in state and record the versions the
    /// databases report.
    pub async fn refresh(&mut self) -> EngineResult<Vec<Outcome>> {
        let resources: Vec<_> = self.state.resources().cloned().collect();
        let mut outcomes = Vec::with_capacity(resources.len());
        for resource in resources {
            let transition = self.lifecycle.read(&resource).await;
            let version = self.persist(&resource.name, &transition)?;
            outcomes.push(Outcome {
                name: resource.name.clone(),
                action: Action::NoOp,
                version,
                error: transition.error,
            });
        }
        Ok(outcomes)
    }

    /// Tear down the named resources, or every resource in state.
    pub async fn destroy(&mut self, names: Option<&[String]>) -> EngineResult<Vec<Outcome>> {
        let mut changes = Vec::new();
        match names {
            Some(names) => {
                for name in names {
                    let prior = self
                        .state
                        .get(name)
                        .cloned()
                        .ok_or_else(|| EngineError::UnknownResource { name: name.clone() })?;
                    changes.push(PlannedChange::delete(prior));
                }
            }
            None => changes.extend(self.state.resources().cloned().map(PlannedChange::delete)),
        }
        self.apply(&changes).await
    }
}

#[cfg(test)]
#[path = "reconciler_test.rs"]
mod tests;
