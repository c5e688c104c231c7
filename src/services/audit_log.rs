//! Audit log service
//!
//! Wires the type registry, configuration store, policy cache, capture
//! engine and repository together, and provides the operations the CLI and
//! host integrations call: policy changes, audit transactions and queries.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::audit::{
    Action, AuditRecord, AuditRecordAssembler, AuditRepository, AuditTransaction,
    ChangeCaptureEngine, RecordQuery,
};
use crate::config::{ConfigStore, Settings};
use crate::error::{AuditError, AuditResult};
use crate::models::{AuditRecordId, MonitoringStrategy, TypeName};
use crate::policy::{MonitoringPolicyResolver, PolicyCache, PolicySnapshot};
use crate::schema::{TypeGraphIndex, TypeRegistry};
use crate::storage::{AuditLogRepository, PropertyStore, Storage};

/// Filter for reading the audit log
#[derive(Debug, Clone, Default)]
pub struct AuditLogQuery {
    /// Type names as entered; subclasses are added automatically
    pub types: Option<Vec<String>>,
    pub actions: Option<Vec<Action>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

/// A registered type with its monitoring status
#[derive(Debug, Clone)]
pub struct TypeStatus {
    pub name: TypeName,
    pub concrete: bool,
    pub auditable: bool,
    pub monitored: bool,
}

/// Service for audit policy, capture and queries
pub struct AuditLogService {
    registry: Arc<TypeRegistry>,
    graph: TypeGraphIndex,
    cache: Arc<PolicyCache>,
    resolver: Arc<MonitoringPolicyResolver>,
    assembler: AuditRecordAssembler,
    repository: Arc<dyn AuditRepository>,
    default_creator: String,
}

impl AuditLogService {
    pub fn new(
        registry: Arc<TypeRegistry>,
        store: Arc<dyn ConfigStore>,
        repository: Arc<dyn AuditRepository>,
        settings: &Settings,
    ) -> Self {
        let graph = TypeGraphIndex::new(registry.clone());
        let cache = Arc::new(PolicyCache::new(store, graph.clone()));
        let resolver = Arc::new(MonitoringPolicyResolver::new(cache.clone(), graph.clone()));
        let engine = ChangeCaptureEngine::new(graph.clone())
            .with_ignored_properties(settings.ignored_properties.iter().cloned());
        let assembler = AuditRecordAssembler::new(resolver.clone(), Arc::new(engine));

        Self {
            registry,
            graph,
            cache,
            resolver,
            assembler,
            repository,
            default_creator: settings.default_creator.clone(),
        }
    }

    /// Service over the file-backed stores
    pub fn from_storage(storage: &Storage, settings: &Settings) -> Self {
        Self::new(
            storage.registry.clone(),
            storage.properties.clone(),
            storage.audit_log.clone(),
            settings,
        )
    }

    /// Service whose stores live only in memory
    pub fn in_memory(registry: TypeRegistry) -> Self {
        Self::new(
            Arc::new(registry),
            Arc::new(PropertyStore::in_memory()),
            Arc::new(AuditLogRepository::in_memory()),
            &Settings::default(),
        )
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn resolver(&self) -> &Arc<MonitoringPolicyResolver> {
        &self.resolver
    }

    /// Resolve a type name as entered by a user
    pub fn resolve_type(&self, name: &str) -> AuditResult<TypeName> {
        self.graph
            .resolve(name)
            .ok_or_else(|| AuditError::type_not_found(name.trim()))
    }

    fn resolve_all<S: AsRef<str>>(&self, names: &[S]) -> AuditResult<Vec<TypeName>> {
        names.iter().map(|n| self.resolve_type(n.as_ref())).collect()
    }

    pub fn strategy(&self) -> MonitoringStrategy {
        self.cache.strategy()
    }

    pub fn set_strategy(&self, strategy: MonitoringStrategy) -> AuditResult<()> {
        self.cache.set_strategy(strategy)?;
        info!(strategy = %strategy, "monitoring strategy changed");
        Ok(())
    }

    /// Start monitoring the named types
    ///
    /// Every name must resolve; nothing is changed otherwise.
    pub fn start_monitoring<S: AsRef<str>>(&self, names: &[S]) -> AuditResult<()> {
        let types = self.resolve_all(names)?;
        self.cache.start_monitoring(&types)?;
        info!(types = ?types, strategy = %self.strategy(), "started monitoring");
        Ok(())
    }

    /// Stop monitoring the named types
    pub fn stop_monitoring<S: AsRef<str>>(&self, names: &[S]) -> AuditResult<()> {
        let types = self.resolve_all(names)?;
        self.cache.stop_monitoring(&types)?;
        info!(types = ?types, strategy = %self.strategy(), "stopped monitoring");
        Ok(())
    }

    pub fn is_monitored(&self, name: &str) -> AuditResult<bool> {
        let type_name = self.resolve_type(name)?;
        Ok(self.resolver.is_monitored(&type_name))
    }

    pub fn policy(&self) -> PolicySnapshot {
        self.cache.snapshot()
    }

    pub fn config_issues(&self) -> Vec<String> {
        self.cache.config_issues()
    }

    /// Every registered type with its current status, sorted by name
    pub fn type_overview(&self) -> Vec<TypeStatus> {
        self.registry
            .descriptors()
            .into_iter()
            .map(|descriptor| {
                let auditable = self.graph.is_auditable(&descriptor.name);
                TypeStatus {
                    concrete: descriptor.is_concrete(),
                    auditable,
                    monitored: auditable && self.resolver.is_monitored(&descriptor.name),
                    name: descriptor.name,
                }
            })
            .collect()
    }

    /// Start a unit of work for one host transaction
    ///
    /// `None` stamps records with the configured default creator.
    pub fn begin(&self, creator: Option<&str>) -> AuditTransaction {
        let creator = creator.unwrap_or(&self.default_creator);
        AuditTransaction::new(self.assembler.clone(), self.repository.clone(), creator)
    }

    /// Read the audit log
    ///
    /// A start date in the future is rejected; an end date in the future
    /// means no upper bound. Results are newest first.
    pub fn get_audit_logs(&self, query: &AuditLogQuery) -> AuditResult<Vec<AuditRecord>> {
        let now = Utc::now();

        if let Some(start) = query.start_date {
            if start > now {
                return Err(AuditError::Validation(format!(
                    "Start date {} is in the future",
                    start.to_rfc3339()
                )));
            }
        }
        let end = query.end_date.filter(|end| *end <= now);

        let types = match &query.types {
            Some(names) => Some(self.resolve_all(names)?),
            None => None,
        };

        let record_query = RecordQuery {
            types: self.resolver.expand_filter(types.as_deref()),
            actions: query.actions.clone(),
            start: query.start_date,
            end,
            offset: query.offset,
            limit: query.limit,
        };
        debug!(?record_query, "querying audit log");
        self.repository.query(&record_query)
    }

    pub fn get_audit_log(&self, id: &AuditRecordId) -> AuditResult<Option<AuditRecord>> {
        self.repository.get(id)
    }

    /// Find a record by full id or by the leading characters of its uuid
    pub fn find_audit_log(&self, identifier: &str) -> AuditResult<AuditRecord> {
        if let Ok(id) = identifier.parse::<AuditRecordId>() {
            if let Some(record) = self.repository.get(&id)? {
                return Ok(record);
            }
        }

        let prefix = identifier
            .trim()
            .strip_prefix("log-")
            .unwrap_or(identifier.trim())
            .to_lowercase();
        if prefix.is_empty() {
            return Err(AuditError::record_not_found(identifier));
        }

        let mut matches = self
            .repository
            .query(&RecordQuery::new())?
            .into_iter()
            .filter(|r| r.uuid().as_uuid().to_string().starts_with(&prefix));
        match (matches.next(), matches.next()) {
            (Some(record), None) => Ok(record),
            (Some(_), Some(_)) => Err(AuditError::Validation(format!(
                "Record id '{}' is ambiguous",
                identifier
            ))),
            _ => Err(AuditError::record_not_found(identifier)),
        }
    }
}
