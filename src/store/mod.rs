//! Ordered collection of generated lesson plans.
//!
//! The store is loaded once from its slot and written through on every
//! successful mutation. In-memory state is authoritative: a failed write is
//! logged and the mutation stands.

pub mod slot;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub use slot::{JsonFileSlot, Slot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonPlan {
    pub id: String,
    pub name: String,
    pub content: String,
}

pub struct PlanStore<S: Slot> {
    slot: S,
    plans: Vec<LessonPlan>,
    selected: Option<String>,
}

impl<S: Slot> PlanStore<S> {
    /// Reads the slot once. A missing value is an empty collection; so is a
    /// corrupt one, after a warning.
    pub fn load(slot: S) -> Self {
        let plans = match slot.read() {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<LessonPlan>>(&raw) {
                Ok(plans) => plans,
                Err(e) => {
                    warn!(error = %e, "stored lesson plans are corrupt, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "could not read stored lesson plans, starting empty");
                Vec::new()
            }
        };

        debug!(count = plans.len(), "loaded lesson plans");
        Self {
            slot,
            plans,
            selected: None,
        }
    }

    pub fn plans(&self) -> &[LessonPlan] {
        &self.plans
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&LessonPlan> {
        self.plans.iter().find(|p| p.id == id)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected(&self) -> Option<&LessonPlan> {
        self.selected.as_deref().and_then(|id| self.get(id))
    }

    pub fn create(&mut self, name: &str, content: &str) -> LessonPlan {
        let plan = LessonPlan {
            id: self.mint_id(),
            name: name.to_string(),
            content: content.to_string(),
        };
        self.plans.push(plan.clone());
        info!(id = %plan.id, name = %plan.name, "created lesson plan");
        self.persist();
        plan
    }

    /// Returns whether a plan was renamed. Blank names are ignored.
    pub fn rename(&mut self, id: &str, new_name: &str) -> bool {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return false;
        }
        let Some(plan) = self.plans.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        plan.name = new_name.to_string();
        self.persist();
        true
    }

    pub fn delete(&mut self, id: &str) -> Option<LessonPlan> {
        let index = self.plans.iter().position(|p| p.id == id)?;
        let removed = self.plans.remove(index);

        if self.selected.as_deref() == Some(id) {
            self.selected = self.plans.first().map(|p| p.id.clone());
        }
        info!(id, remaining = self.plans.len(), "deleted lesson plan");
        self.persist();
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.plans.clear();
        self.selected = None;
        info!("cleared all lesson plans");
        self.persist();
    }

    /// Unknown ids select nothing.
    pub fn select(&mut self, id: &str) {
        self.selected = self.get(id).map(|p| p.id.clone());
    }

    fn mint_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    fn persist(&mut self) {
        let json = match serde_json::to_string(&self.plans) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "failed to serialize lesson plans");
                return;
            }
        };
        if let Err(e) = self.slot.write(&json) {
            error!(error = %e, "failed to persist lesson plans");
        }
    }
}
