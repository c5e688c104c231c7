//! Memoized monitoring policy state
//!
//! The strategy and the explicit type lists live in the configuration
//! store; the cache loads each lazily, expands the lists with their
//! subclasses, and derives the implicitly monitored set from the
//! association graph. Nothing derived is ever written back to the store.
//!
//! Readers see either the previous value of a field or a fully computed new
//! one. Loads run outside the lock: the first finished load of a field is
//! stored and later loads return the stored value, and a load that overlaps
//! an invalidation is handed to its caller but not stored.

use std::collections::BTreeMap;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, warn};

use crate::config::keys;
use crate::config::{ConfigEvent, ConfigStore};
use crate::error::{AuditError, AuditResult};
use crate::models::{MonitoringStrategy, TypeName, TypeSet};
use crate::schema::TypeGraphIndex;

/// Which memoized fields an invalidation clears
///
/// The implicit set depends on everything else and is cleared by every
/// scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationScope {
    /// The strategy and, since every set depends on it, everything else
    Strategy,
    Monitored,
    Unmonitored,
    All,
}

impl InvalidationScope {
    /// Scope affected by a change to a configuration key
    pub fn for_key(key: &str) -> Option<Self> {
        match key {
            keys::MONITORING_STRATEGY => Some(Self::Strategy),
            keys::MONITORED_CLASSES => Some(Self::Monitored),
            keys::UN_MONITORED_CLASSES => Some(Self::Unmonitored),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    /// Bumped by every invalidation
    epoch: u64,
    strategy: Option<MonitoringStrategy>,
    monitored: Option<Arc<TypeSet>>,
    unmonitored: Option<Arc<TypeSet>>,
    implicit: Option<Arc<TypeSet>>,
}

/// Point-in-time view of every policy field
#[derive(Debug, Clone)]
pub struct PolicySnapshot {
    pub strategy: MonitoringStrategy,
    pub monitored: Arc<TypeSet>,
    pub unmonitored: Arc<TypeSet>,
    pub implicit: Arc<TypeSet>,
}

/// Lazily loaded, invalidatable monitoring policy
pub struct PolicyCache {
    store: Arc<dyn ConfigStore>,
    graph: TypeGraphIndex,
    state: RwLock<CacheState>,
    events: Mutex<Receiver<ConfigEvent>>,
    /// Configuration problems found by the latest load of each key
    issues: Mutex<BTreeMap<&'static str, Vec<String>>>,
}

impl PolicyCache {
    /// Create a cache and subscribe to the store's change notifications
    pub fn new(store: Arc<dyn ConfigStore>, graph: TypeGraphIndex) -> Self {
        let events = store.subscribe();
        Self {
            store,
            graph,
            state: RwLock::new(CacheState::default()),
            events: Mutex::new(events),
            issues: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn graph(&self) -> &TypeGraphIndex {
        &self.graph
    }

    /// Current monitoring strategy; `NONE` when unset or unparsable
    pub fn strategy(&self) -> MonitoringStrategy {
        self.drain_events();
        self.load_strategy()
    }

    /// Explicitly monitored types with their concrete subclasses
    pub fn explicit_monitored(&self) -> Arc<TypeSet> {
        self.drain_events();
        self.load_monitored()
    }

    /// Explicitly unmonitored types with their concrete subclasses
    pub fn explicit_unmonitored(&self) -> Arc<TypeSet> {
        self.drain_events();
        self.load_unmonitored()
    }

    /// Types monitored only because a monitored type owns them
    pub fn implicit_monitored(&self) -> Arc<TypeSet> {
        self.drain_events();
        self.load_implicit()
    }

    /// Every field, consistent with a single drain of pending events
    pub fn snapshot(&self) -> PolicySnapshot {
        self.drain_events();
        PolicySnapshot {
            strategy: self.load_strategy(),
            monitored: self.load_monitored(),
            unmonitored: self.load_unmonitored(),
            implicit: self.load_implicit(),
        }
    }

    /// Configuration problems found by the latest loads, e.g. an unknown
    /// strategy value or an unresolvable type name
    pub fn config_issues(&self) -> Vec<String> {
        self.issues.lock().values().flatten().cloned().collect()
    }

    /// Clear memoized fields
    pub fn invalidate(&self, scope: InvalidationScope) {
        let mut state = self.state.write();
        state.epoch += 1;
        match scope {
            InvalidationScope::Strategy | InvalidationScope::All => {
                state.strategy = None;
                state.monitored = None;
                state.unmonitored = None;
            }
            InvalidationScope::Monitored => state.monitored = None,
            InvalidationScope::Unmonitored => state.unmonitored = None,
        }
        state.implicit = None;
        debug!(?scope, epoch = state.epoch, "policy cache invalidated");
    }

    /// Apply a configuration change notification
    pub fn handle_event(&self, event: &ConfigEvent) {
        if let Some(scope) = InvalidationScope::for_key(&event.key) {
            debug!(key = %event.key, deleted = event.is_delete(), "policy configuration changed");
            self.invalidate(scope);
        }
    }

    /// Mark types as monitored
    ///
    /// Under `NONE_EXCEPT` the types are added to the monitored list; under
    /// `ALL_EXCEPT` they and their subclasses are removed from the
    /// unmonitored list. No-op otherwise.
    pub fn start_monitoring(&self, types: &[TypeName]) -> AuditResult<()> {
        match self.strategy() {
            MonitoringStrategy::NoneExcept => {
                self.update_list(keys::MONITORED_CLASSES, |declared| {
                    for t in types {
                        declared.add(t);
                    }
                })
            }
            MonitoringStrategy::AllExcept => {
                self.update_list(keys::UN_MONITORED_CLASSES, |declared| {
                    for t in types {
                        declared.remove_with_subclasses(t);
                    }
                })
            }
            MonitoringStrategy::None | MonitoringStrategy::All => Ok(()),
        }
    }

    /// Mark types as not monitored
    ///
    /// Under `NONE_EXCEPT` the types and their subclasses are removed from
    /// the monitored list; under `ALL_EXCEPT` they are added to the
    /// unmonitored list. No-op otherwise.
    pub fn stop_monitoring(&self, types: &[TypeName]) -> AuditResult<()> {
        match self.strategy() {
            MonitoringStrategy::NoneExcept => {
                self.update_list(keys::MONITORED_CLASSES, |declared| {
                    for t in types {
                        declared.remove_with_subclasses(t);
                    }
                })
            }
            MonitoringStrategy::AllExcept => {
                self.update_list(keys::UN_MONITORED_CLASSES, |declared| {
                    for t in types {
                        declared.add(t);
                    }
                })
            }
            MonitoringStrategy::None | MonitoringStrategy::All => Ok(()),
        }
    }

    /// Persist a new strategy
    pub fn set_strategy(&self, strategy: MonitoringStrategy) -> AuditResult<()> {
        let result = self
            .store
            .set_value(keys::MONITORING_STRATEGY, strategy.as_str());
        self.invalidate(InvalidationScope::Strategy);
        result.map_err(|e| {
            error!(error = %e, strategy = %strategy, "failed to save monitoring strategy");
            persistence(e)
        })
    }

    /// Names exactly as declared under a list key
    pub fn declared_names(&self, key: &str) -> AuditResult<Vec<String>> {
        Ok(self
            .store
            .get_value(key)?
            .map(|raw| TypeSet::parse_delimited(&raw))
            .unwrap_or_default())
    }

    fn update_list(&self, key: &'static str, edit: impl FnOnce(&mut DeclaredList<'_>)) -> AuditResult<()> {
        let names = self.declared_names(key).map_err(persistence)?;
        let mut declared = DeclaredList {
            graph: &self.graph,
            key,
            names,
        };
        edit(&mut declared);

        let result = self.store.set_value(key, &declared.names.join(","));
        let scope = if key == keys::MONITORED_CLASSES {
            InvalidationScope::Monitored
        } else {
            InvalidationScope::Unmonitored
        };
        self.invalidate(scope);

        result.map_err(|e| {
            error!(key, error = %e, "failed to save monitored types");
            persistence(e)
        })
    }

    fn drain_events(&self) {
        let pending: Vec<ConfigEvent> = self.events.lock().try_iter().collect();
        for event in &pending {
            self.handle_event(event);
        }
    }

    fn load_strategy(&self) -> MonitoringStrategy {
        let epoch = {
            let state = self.state.read();
            if let Some(strategy) = state.strategy {
                return strategy;
            }
            state.epoch
        };

        match self.read_strategy() {
            Some(strategy) => self.memoize(epoch, |s| &mut s.strategy, strategy),
            None => MonitoringStrategy::None,
        }
    }

    /// `None` when the store itself failed, so nothing gets memoized
    fn read_strategy(&self) -> Option<MonitoringStrategy> {
        let raw = match self.store.get_value(keys::MONITORING_STRATEGY) {
            Ok(raw) => raw,
            Err(e) => {
                error!(error = %e, "failed to read monitoring strategy");
                return None;
            }
        };

        let mut issues = Vec::new();
        let strategy = match raw.as_deref().map(str::trim) {
            None | Some("") => MonitoringStrategy::None,
            Some(value) => match value.parse() {
                Ok(strategy) => strategy,
                Err(e) => {
                    error!(value, error = %e, "unparsable monitoring strategy, using NONE");
                    issues.push(format!("{}: {}", keys::MONITORING_STRATEGY, e));
                    MonitoringStrategy::None
                }
            },
        };
        self.record_issues(keys::MONITORING_STRATEGY, issues);
        debug!(strategy = %strategy, "monitoring strategy loaded");
        Some(strategy)
    }

    fn load_monitored(&self) -> Arc<TypeSet> {
        let epoch = {
            let state = self.state.read();
            if let Some(set) = &state.monitored {
                return Arc::clone(set);
            }
            state.epoch
        };

        match self.read_type_list(keys::MONITORED_CLASSES) {
            Some(set) => self.memoize(epoch, |s| &mut s.monitored, Arc::new(set)),
            None => Arc::new(TypeSet::new()),
        }
    }

    fn load_unmonitored(&self) -> Arc<TypeSet> {
        let epoch = {
            let state = self.state.read();
            if let Some(set) = &state.unmonitored {
                return Arc::clone(set);
            }
            state.epoch
        };

        match self.read_type_list(keys::UN_MONITORED_CLASSES) {
            Some(set) => self.memoize(epoch, |s| &mut s.unmonitored, Arc::new(set)),
            None => Arc::new(TypeSet::new()),
        }
    }

    fn load_implicit(&self) -> Arc<TypeSet> {
        let epoch = {
            let state = self.state.read();
            if let Some(set) = &state.implicit {
                return Arc::clone(set);
            }
            state.epoch
        };

        let strategy = self.load_strategy();
        let monitored = self.load_monitored();
        let implicit = match strategy {
            MonitoringStrategy::NoneExcept => self.association_closure(monitored.iter(), &monitored),
            MonitoringStrategy::AllExcept if !self.load_unmonitored().is_empty() => {
                let universe = self.graph.all_types();
                let auditable = universe.iter().filter(|t| self.graph.is_auditable(t));
                self.association_closure(auditable, &monitored)
            }
            _ => TypeSet::new(),
        };
        debug!(strategy = %strategy, count = implicit.len(), "implicitly monitored types derived");

        self.memoize(epoch, |s| &mut s.implicit, Arc::new(implicit))
    }

    /// Association closure of `roots`, minus `exclude`
    fn association_closure<'a>(
        &self,
        roots: impl Iterator<Item = &'a TypeName>,
        exclude: &TypeSet,
    ) -> TypeSet {
        let mut closure = TypeSet::new();
        for root in roots {
            closure.extend(self.graph.association_types_of(root));
        }
        closure.subtract(exclude);
        closure
    }

    /// Parse a list key into a set expanded with concrete subclasses
    ///
    /// `None` when the store itself failed.
    fn read_type_list(&self, key: &'static str) -> Option<TypeSet> {
        let raw = match self.store.get_value(key) {
            Ok(raw) => raw.unwrap_or_default(),
            Err(e) => {
                error!(key, error = %e, "failed to read monitored types");
                return None;
            }
        };

        let mut issues = Vec::new();
        let mut set = TypeSet::new();
        for name in TypeSet::parse_delimited(&raw) {
            match self.graph.resolve(&name) {
                Some(type_name) => {
                    set.extend(self.graph.concrete_subclasses_of(&type_name));
                    set.insert(type_name);
                }
                None => {
                    warn!(key, name = %name, "unknown type in monitoring configuration, skipped");
                    issues.push(format!("{}: unknown type '{}'", key, name));
                }
            }
        }
        self.record_issues(key, issues);
        debug!(key, count = set.len(), "monitored type list loaded");
        Some(set)
    }

    /// Store `value` unless an invalidation happened since `epoch` or another
    /// load got there first; returns whatever the cache now holds
    fn memoize<T: Clone>(
        &self,
        epoch: u64,
        slot: impl FnOnce(&mut CacheState) -> &mut Option<T>,
        value: T,
    ) -> T {
        let mut state = self.state.write();
        if state.epoch != epoch {
            return value;
        }
        let slot = slot(&mut *state);
        if let Some(existing) = slot.as_ref() {
            return existing.clone();
        }
        *slot = Some(value.clone());
        value
    }

    fn record_issues(&self, key: &'static str, found: Vec<String>) {
        let mut issues = self.issues.lock();
        if found.is_empty() {
            issues.remove(key);
        } else {
            issues.insert(key, found);
        }
    }
}

fn persistence(e: AuditError) -> AuditError {
    match e {
        AuditError::Persistence(_) => e,
        other => AuditError::Persistence(other.to_string()),
    }
}

/// The operator's declared names under one list key, edited in place
struct DeclaredList<'a> {
    graph: &'a TypeGraphIndex,
    key: &'static str,
    names: Vec<String>,
}

impl DeclaredList<'_> {
    fn resolves_to(&self, name: &str, target: &TypeName) -> bool {
        self.graph.resolve(name).is_some_and(|t| &t == target)
    }

    fn add(&mut self, type_name: &TypeName) {
        if !self.names.iter().any(|n| self.resolves_to(n, type_name)) {
            self.names.push(type_name.to_string());
        }
    }

    fn remove_with_subclasses(&mut self, type_name: &TypeName) {
        let graph = self.graph;
        self.names.retain(|name| match graph.resolve(name) {
            Some(t) => &t != type_name && !graph.is_subtype_of(&t, type_name),
            None => true,
        });

        let covering: Vec<&String> = self
            .names
            .iter()
            .filter(|n| {
                graph
                    .resolve(n)
                    .is_some_and(|t| graph.is_subtype_of(type_name, &t))
            })
            .collect();
        if !covering.is_empty() {
            warn!(
                key = self.key,
                type_name = %type_name,
                supertypes = ?covering,
                "type is still covered by a listed supertype"
            );
        }
    }
}
