//! Search executor for running planned queries.
//!
//! The executor reads the primary rows, then walks each related level in
//! dependency order, fetching related rows by id in bounded batches and
//! merging them under the primary rows.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use advsearch_proto::{
    Diagnostic, DomainCondition, DomainOperator, OrderSpec, QueryIntent, Record, RelatedQuery,
    Value,
};

use crate::backend::{with_timeout, RecordService};
use crate::catalog::CatalogSnapshot;
use crate::config::SearchConfig;
use crate::error::Error;
use crate::relation::RelationshipHandler;

use super::join::{GroupedRows, HashJoin};
use super::plan::{FetchPlan, QueryPlanner};

/// Rows of one related query, grouped by primary row id.
#[derive(Debug, Clone)]
pub struct RelatedRows {
    /// The related query as executed.
    pub query: RelatedQuery,
    /// Dotted relation path from the primary type.
    pub path: String,
    /// Output columns of the related type.
    pub columns: Vec<String>,
    /// Related rows per primary row id.
    pub rows: GroupedRows,
}

/// Raw result of executing a primary intent and its related queries.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// The primary intent.
    pub intent: QueryIntent,
    /// Output columns of the primary type.
    pub columns: Vec<String>,
    /// Primary rows.
    pub rows: Vec<Record>,
    /// Every related query that was requested.
    pub requested: Vec<RelatedQuery>,
    /// Related rows of the queries that succeeded.
    pub related: Vec<RelatedRows>,
    /// Non-fatal conditions met during execution.
    pub diagnostics: Vec<Diagnostic>,
}

impl ExecutionResult {
    /// Check if the result spans more than one type.
    pub fn is_grouped(&self) -> bool {
        !self.requested.is_empty()
    }
}

/// Executes query intents against a [`RecordService`].
pub struct SearchExecutor {
    records: Arc<dyn RecordService>,
    config: SearchConfig,
}

impl SearchExecutor {
    /// Create a new executor.
    pub fn new(records: Arc<dyn RecordService>, config: SearchConfig) -> Self {
        Self { records, config }
    }

    /// Get the executor configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Execute `primary` and its `related` queries.
    ///
    /// A failed primary read is fatal. A failed related read leaves the
    /// primary rows intact and adds a [`Diagnostic::PartialResult`].
    pub async fn execute(
        &self,
        snapshot: &CatalogSnapshot,
        primary: &QueryIntent,
        related: &[RelatedQuery],
    ) -> Result<ExecutionResult, Error> {
        let relations = RelationshipHandler::new(self.config.max_hops);
        let plan = QueryPlanner::plan(snapshot, primary, related, &relations)?;

        let domain = plan
            .primary
            .compile(snapshot)
            .map_err(|e| Error::from_proto(&primary.model, e))?;
        let limit = plan.primary.limit.unwrap_or(self.config.default_limit);

        let rows = self
            .read(
                &primary.model,
                &domain,
                &plan.primary_fields,
                Some(limit),
                &plan.primary.order,
            )
            .await?;
        debug!(model = %primary.model, rows = rows.len(), "primary rows read");

        let mut diagnostics = Vec::new();
        let mut outputs: Vec<Option<RelatedRows>> = related.iter().map(|_| None).collect();
        let mut levels: HashMap<String, GroupedRows> = HashMap::new();
        let root = HashJoin::root(&rows);

        for fetch in &plan.fetches {
            let parent = match fetch.parent_path() {
                None => Some(&root),
                Some(path) => levels.get(path),
            };
            let Some(parent) = parent else {
                diagnostics.push(Diagnostic::PartialResult {
                    model: fetch.target().to_string(),
                    reason: format!(
                        "parent relation '{}' unavailable",
                        fetch.parent_path().unwrap_or_default()
                    ),
                });
                continue;
            };

            match self.fetch_level(snapshot, fetch, parent, &mut diagnostics).await {
                Ok(level) => {
                    if let Some(index) = fetch.output {
                        outputs[index] = Some(RelatedRows {
                            query: RelatedQuery::new(related[index].path.clone(), fetch.intent.clone()),
                            path: fetch.path.clone(),
                            columns: fetch.intent.fields.clone(),
                            rows: level.clone(),
                        });
                    }
                    levels.insert(fetch.path.clone(), level);
                }
                Err(e) => {
                    warn!(
                        model = fetch.target(),
                        path = %fetch.path,
                        error = %e,
                        "related read failed, returning partial result"
                    );
                    diagnostics.push(Diagnostic::PartialResult {
                        model: fetch.target().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(ExecutionResult {
            intent: plan.primary,
            columns: plan.columns,
            rows,
            requested: related.to_vec(),
            related: outputs.into_iter().flatten().collect(),
            diagnostics,
        })
    }

    /// Fetch the rows reached from `parent` through the last step of `fetch`.
    async fn fetch_level(
        &self,
        snapshot: &CatalogSnapshot,
        fetch: &FetchPlan,
        parent: &GroupedRows,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<GroupedRows, Error> {
        let target = fetch.target();
        let mut ids = HashJoin::collect_ids(parent, &fetch.step.field);

        let cap = self.config.max_related_ids();
        if ids.len() > cap {
            let dropped = ids.len() - cap;
            warn!(model = target, dropped, cap, "related ids over batch cap, dropping");
            diagnostics.push(Diagnostic::ChildrenCapped {
                model: target.to_string(),
                dropped,
            });
            ids.truncate(cap);
        }

        if ids.is_empty() {
            return Ok(HashJoin::probe(parent, &fetch.step, &HashMap::new(), &[]));
        }

        let filters = fetch
            .intent
            .compile(snapshot)
            .map_err(|e| Error::from_proto(target, e))?;

        let domains: Vec<Vec<DomainCondition>> = ids
            .chunks(self.config.max_batch_size.max(1))
            .map(|chunk| {
                let mut domain = vec![DomainCondition::new(
                    "id",
                    DomainOperator::In,
                    Value::Refs(chunk.to_vec()),
                )];
                domain.extend(filters.iter().cloned());
                domain
            })
            .collect();

        let batches = join_all(domains.iter().map(|domain| {
            self.read(target, domain, &fetch.fetch_fields, None, &fetch.intent.order)
        }))
        .await;

        let mut rows = Vec::new();
        for batch in batches {
            rows.extend(batch?);
        }
        debug!(
            model = target,
            path = %fetch.path,
            ids = ids.len(),
            batches = domains.len(),
            rows = rows.len(),
            "related rows read"
        );

        let table = HashJoin::build(rows);
        Ok(HashJoin::probe(parent, &fetch.step, &table, &fetch.intent.order))
    }

    async fn read(
        &self,
        model: &str,
        domain: &[DomainCondition],
        fields: &[String],
        limit: Option<u32>,
        order: &[OrderSpec],
    ) -> Result<Vec<Record>, Error> {
        with_timeout(
            self.config.call_timeout,
            model,
            "search_read",
            self.records.search_read(model, domain, fields, limit, order),
        )
        .await
    }
}
