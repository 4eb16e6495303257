// flowdeck/src/registry/store.rs

//! Defines `Registry<T>`, the keyed store every specialized registry wraps.
//!
//! Items keep insertion order. Re-registering an id replaces the stored item in
//! place (last writer wins) and logs a warning. Every mutation is announced on
//! the event bus with a `{registry, id, type}` payload.

use super::item::{RegistryItem, RegistryItemPatch};
use crate::events::{names, EventBus};
use parking_lot::RwLock;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{event, instrument, Level};

struct RegistryState<T> {
  items: HashMap<String, RegistryItem<T>>,
  order: Vec<String>,
}

impl<T> Default for RegistryState<T> {
  fn default() -> Self {
    Self {
      items: HashMap::new(),
      order: Vec::new(),
    }
  }
}

pub struct Registry<T>
where
  T: Clone + Send + Sync + 'static,
{
  namespace: String,
  bus: Arc<EventBus>,
  state: RwLock<RegistryState<T>>,
}

impl<T> Registry<T>
where
  T: Clone + Send + Sync + 'static,
{
  /// Creates an empty registry. `namespace` identifies it in bus payloads and logs.
  pub fn new(namespace: impl Into<String>, bus: Arc<EventBus>) -> Self {
    Self {
      namespace: namespace.into(),
      bus,
      state: RwLock::new(RegistryState::default()),
    }
  }

  pub fn namespace(&self) -> &str {
    &self.namespace
  }

  pub fn bus(&self) -> &Arc<EventBus> {
    &self.bus
  }

  #[instrument(name = "Registry::register", skip_all, fields(registry = %self.namespace, id = %item.id))]
  pub fn register(&self, item: RegistryItem<T>) {
    let id = item.id.clone();
    let item_type = item.item_type.clone();
    let replaced = {
      let mut state = self.state.write();
      let replaced = state.items.insert(id.clone(), item).is_some();
      if !replaced {
        state.order.push(id.clone());
      }
      replaced
    };

    if replaced {
      event!(Level::WARN, "Item already registered, overwriting.");
    } else {
      event!(Level::DEBUG, "Item registered.");
    }
    self.bus.emit(
      names::REGISTRY_ITEM_REGISTERED,
      &json!({ "registry": self.namespace, "id": id, "type": item_type, "replaced": replaced }),
    );
  }

  pub fn register_many(&self, items: impl IntoIterator<Item = RegistryItem<T>>) {
    for item in items {
      self.register(item);
    }
  }

  /// Removes `id`. Emits the unregistered event only when something was removed.
  #[instrument(name = "Registry::unregister", skip(self), fields(registry = %self.namespace))]
  pub fn unregister(&self, id: &str) -> Option<RegistryItem<T>> {
    let removed = {
      let mut state = self.state.write();
      let removed = state.items.remove(id);
      if removed.is_some() {
        state.order.retain(|existing| existing != id);
      }
      removed
    };

    match &removed {
      Some(item) => {
        event!(Level::DEBUG, "Item unregistered.");
        self.bus.emit(
          names::REGISTRY_ITEM_UNREGISTERED,
          &json!({ "registry": self.namespace, "id": item.id, "type": item.item_type }),
        );
      }
      None => event!(Level::TRACE, "Nothing to unregister."),
    }
    removed
  }

  pub fn get(&self, id: &str) -> Option<RegistryItem<T>> {
    self.state.read().items.get(id).cloned()
  }

  pub fn get_config(&self, id: &str) -> Option<T> {
    self.state.read().items.get(id).map(|item| item.config.clone())
  }

  pub fn has(&self, id: &str) -> bool {
    self.state.read().items.contains_key(id)
  }

  /// All items in insertion order.
  pub fn get_all(&self) -> Vec<RegistryItem<T>> {
    self.filtered(|_| true)
  }

  pub fn get_by_type(&self, item_type: &str) -> Vec<RegistryItem<T>> {
    self.filtered(|item| item.item_type == item_type)
  }

  pub fn get_by_category(&self, category: &str) -> Vec<RegistryItem<T>> {
    self.filtered(|item| item.category.as_deref() == Some(category))
  }

  /// Case-insensitive substring match over name, description and id.
  pub fn search(&self, query: &str) -> Vec<RegistryItem<T>> {
    let needle = query.to_lowercase();
    self.filtered(|item| item.matches_query(&needle))
  }

  pub fn filtered(&self, predicate: impl Fn(&RegistryItem<T>) -> bool) -> Vec<RegistryItem<T>> {
    let state = self.state.read();
    state
      .order
      .iter()
      .filter_map(|id| state.items.get(id))
      .filter(|item| predicate(item))
      .cloned()
      .collect()
  }

  /// Merges `patch` over the stored item and re-emits the registered event.
  /// Returns `false` if `id` is unknown.
  #[instrument(name = "Registry::update", skip(self, patch), fields(registry = %self.namespace))]
  pub fn update(&self, id: &str, patch: RegistryItemPatch<T>) -> bool {
    let item_type = {
      let mut state = self.state.write();
      let Some(item) = state.items.get_mut(id) else {
        event!(Level::WARN, "Cannot update unknown item.");
        return false;
      };
      patch.apply(item);
      item.item_type.clone()
    };
    event!(Level::DEBUG, "Item updated.");
    self.bus.emit(
      names::REGISTRY_ITEM_REGISTERED,
      &json!({ "registry": self.namespace, "id": id, "type": item_type, "replaced": true }),
    );
    true
  }

  /// Removes every item, emitting one unregistered event per item.
  pub fn clear(&self) {
    let drained: Vec<RegistryItem<T>> = {
      let mut state = self.state.write();
      let RegistryState { items, order } = std::mem::take(&mut *state);
      let mut items = items;
      order.into_iter().filter_map(|id| items.remove(&id)).collect()
    };
    event!(Level::DEBUG, registry = %self.namespace, cleared = drained.len(), "Registry cleared.");
    for item in drained {
      self.bus.emit(
        names::REGISTRY_ITEM_UNREGISTERED,
        &json!({ "registry": self.namespace, "id": item.id, "type": item.item_type }),
      );
    }
  }

  pub fn size(&self) -> usize {
    self.state.read().items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.size() == 0
  }

  pub fn ids(&self) -> Vec<String> {
    self.state.read().order.clone()
  }

  /// Distinct categories in first-seen order.
  pub fn categories(&self) -> Vec<String> {
    let state = self.state.read();
    let mut seen: Vec<String> = Vec::new();
    for category in state.order.iter().filter_map(|id| state.items.get(id)?.category.clone()) {
      if !seen.contains(&category) {
        seen.push(category);
      }
    }
    seen
  }

  /// Distinct item types in first-seen order.
  pub fn types(&self) -> Vec<String> {
    let state = self.state.read();
    let mut seen: Vec<String> = Vec::new();
    for item_type in state.order.iter().filter_map(|id| state.items.get(id).map(|i| i.item_type.clone())) {
      if !seen.contains(&item_type) {
        seen.push(item_type);
      }
    }
    seen
  }
}

impl<T> std::fmt::Debug for Registry<T>
where
  T: Clone + Send + Sync + 'static,
{
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Registry")
      .field("namespace", &self.namespace)
      .field("size", &self.size())
      .finish()
  }
}
