//! Model lifecycle events.
//!
//! Observers register one handler per event; every handler defaults to
//! [`EventResult::Continue`]. Returning [`EventResult::Veto`] from a `*ing`
//! event cancels the operation silently — the model is left unchanged and no
//! error is raised. The registry is process-wide, keyed by model name.

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use crate::data::ModelData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelEvent {
	Booting,
	Booted,
	Hydrating,
	Hydrated,
	Creating,
	Created,
	Updating,
	Updated,
	Saving,
	Saved,
	Deleting,
	Deleted,
}

/// Continue processing, or veto the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
	Continue,
	Veto,
}

/// One method per lifecycle event, every default a no-op.
#[allow(unused_variables)]
pub trait Observer: Send + Sync {
	fn booting(&self) -> EventResult {
		EventResult::Continue
	}

	fn booted(&self) -> EventResult {
		EventResult::Continue
	}

	fn hydrating(&self, data: &mut ModelData) -> EventResult {
		EventResult::Continue
	}

	fn hydrated(&self, data: &mut ModelData) -> EventResult {
		EventResult::Continue
	}

	fn creating(&self, data: &mut ModelData) -> EventResult {
		EventResult::Continue
	}

	fn created(&self, data: &mut ModelData) -> EventResult {
		EventResult::Continue
	}

	fn updating(&self, data: &mut ModelData) -> EventResult {
		EventResult::Continue
	}

	fn updated(&self, data: &mut ModelData) -> EventResult {
		EventResult::Continue
	}

	fn saving(&self, data: &mut ModelData) -> EventResult {
		EventResult::Continue
	}

	fn saved(&self, data: &mut ModelData) -> EventResult {
		EventResult::Continue
	}

	fn deleting(&self, data: &mut ModelData) -> EventResult {
		EventResult::Continue
	}

	fn deleted(&self, data: &mut ModelData) -> EventResult {
		EventResult::Continue
	}
}

type ObserverList = Vec<Arc<dyn Observer>>;

fn registry() -> &'static DashMap<&'static str, ObserverList> {
	static REGISTRY: OnceLock<DashMap<&'static str, ObserverList>> = OnceLock::new();
	REGISTRY.get_or_init(DashMap::new)
}

fn booted_models() -> &'static DashMap<&'static str, ()> {
	static BOOTED: OnceLock<DashMap<&'static str, ()>> = OnceLock::new();
	BOOTED.get_or_init(DashMap::new)
}

/// Register an observer for a model by name.
pub fn observe(model: &'static str, observer: Arc<dyn Observer>) {
	registry().entry(model).or_default().push(observer);
}

/// Drop all observers for a model. Mostly useful between tests.
pub fn forget_observers(model: &'static str) {
	registry().remove(model);
	booted_models().remove(model);
}

/// Fire `booting`/`booted` the first time a model class is used.
pub fn boot_once(model: &'static str) {
	if booted_models().insert(model, ()).is_none() {
		fire_bare(model, ModelEvent::Booting);
		fire_bare(model, ModelEvent::Booted);
	}
}

fn fire_bare(model: &'static str, event: ModelEvent) {
	if let Some(observers) = registry().get(model) {
		for observer in observers.iter() {
			let result = match event {
				ModelEvent::Booting => observer.booting(),
				ModelEvent::Booted => observer.booted(),
				_ => EventResult::Continue,
			};
			if result == EventResult::Veto {
				break;
			}
		}
	}
}

/// Dispatch an event to every observer of `model`. The first veto wins.
pub fn fire(model: &str, event: ModelEvent, data: &mut ModelData) -> EventResult {
	let Some(observers) = registry().get(model) else {
		return EventResult::Continue;
	};
	for observer in observers.iter() {
		let result = match event {
			ModelEvent::Booting => observer.booting(),
			ModelEvent::Booted => observer.booted(),
			ModelEvent::Hydrating => observer.hydrating(data),
			ModelEvent::Hydrated => observer.hydrated(data),
			ModelEvent::Creating => observer.creating(data),
			ModelEvent::Created => observer.created(data),
			ModelEvent::Updating => observer.updating(data),
			ModelEvent::Updated => observer.updated(data),
			ModelEvent::Saving => observer.saving(data),
			ModelEvent::Saved => observer.saved(data),
			ModelEvent::Deleting => observer.deleting(data),
			ModelEvent::Deleted => observer.deleted(data),
		};
		if result == EventResult::Veto {
			return EventResult::Veto;
		}
	}
	EventResult::Continue
}

#[cfg(test)]
mod tests {
	use super::*;
	use mortar_query::Value;

	struct Stamping;

	impl Observer for Stamping {
		fn creating(&self, data: &mut ModelData) -> EventResult {
			data.set_raw("stamped", Value::Bool(true));
			EventResult::Continue
		}
	}

	struct VetoDeletes;

	impl Observer for VetoDeletes {
		fn deleting(&self, _data: &mut ModelData) -> EventResult {
			EventResult::Veto
		}
	}

	#[test]
	fn test_observer_mutates_data() {
		observe("EventsTestA", Arc::new(Stamping));
		let mut data = ModelData::new();
		assert_eq!(
			fire("EventsTestA", ModelEvent::Creating, &mut data),
			EventResult::Continue
		);
		assert_eq!(data.get_raw("stamped"), Value::Bool(true));
		forget_observers("EventsTestA");
	}

	#[test]
	fn test_veto_stops_dispatch() {
		observe("EventsTestB", Arc::new(VetoDeletes));
		let mut data = ModelData::new();
		assert_eq!(
			fire("EventsTestB", ModelEvent::Deleting, &mut data),
			EventResult::Veto
		);
		forget_observers("EventsTestB");
	}

	#[test]
	fn test_unobserved_model_continues() {
		let mut data = ModelData::new();
		assert_eq!(
			fire("NothingRegistered", ModelEvent::Saving, &mut data),
			EventResult::Continue
		);
	}
}
