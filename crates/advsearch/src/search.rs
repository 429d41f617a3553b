//! The search entry point.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use advsearch_core::{
    CatalogService, ModelCatalog, RecordService, ResultFormatter, SearchConfig, SearchExecutor,
};
use advsearch_lang::{parse, select_model, ParseOptions};
use advsearch_proto::{SearchRequest, SearchResponse};

use crate::error::Error;

/// Natural-language search over a record system.
///
/// One instance serves any number of concurrent requests; the schema catalog
/// is shared between them and every other piece of state is request-scoped.
pub struct AdvancedSearch {
    catalog: ModelCatalog,
    executor: SearchExecutor,
    formatter: ResultFormatter,
    config: SearchConfig,
    today: Option<NaiveDate>,
}

impl AdvancedSearch {
    /// Create a search over separate catalog and record services.
    pub fn new(
        catalog: Arc<dyn CatalogService>,
        records: Arc<dyn RecordService>,
        config: SearchConfig,
    ) -> Self {
        Self {
            catalog: ModelCatalog::new(catalog, &config),
            executor: SearchExecutor::new(records, config.clone()),
            formatter: ResultFormatter::new(config.max_cell_width),
            config,
            today: None,
        }
    }

    /// Create a search over a backend serving both schemas and records.
    pub fn with_backend<B>(backend: Arc<B>, config: SearchConfig) -> Self
    where
        B: CatalogService + RecordService + 'static,
    {
        Self::new(backend.clone(), backend, config)
    }

    /// Pin the reference date of relative date phrases.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// The shared schema catalog.
    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// The search configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Answer a question.
    ///
    /// Picks the record type, snapshots the schemas around it, parses the
    /// question, runs the primary and related reads and formats the rows.
    /// Parser notes come first in the response diagnostics, then types whose
    /// schemas could not be read, then notes from the reads themselves.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse, Error> {
        let summaries = self.catalog.list_models().await?;
        let primary = select_model(
            &request.query,
            summaries.as_slice(),
            request.model_hint.as_deref(),
        )?;
        let snapshot = self
            .catalog
            .snapshot_around(&primary, self.config.max_hops)
            .await?;

        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        let mut options = ParseOptions::new(today)
            .with_model_hint(primary)
            .with_max_hops(self.config.max_hops);
        if let Some(limit) = request.limit {
            options = options.with_limit(limit);
        }
        let parsed = parse(&request.query, &snapshot, &options)?;
        debug!(
            model = %parsed.primary.model,
            filters = parsed.primary.filters.len(),
            related = parsed.related.len(),
            "question parsed"
        );

        let result = self
            .executor
            .execute(&snapshot, &parsed.primary, &parsed.related)
            .await?;
        let mut response = self.formatter.format(&snapshot, result);

        let mut diagnostics = parsed.notes;
        diagnostics.extend_from_slice(snapshot.diagnostics());
        if !diagnostics.is_empty() {
            diagnostics.append(&mut response.diagnostics);
            response.diagnostics = diagnostics;
        }

        info!(
            model = %response.intent.model,
            summary = %response.summary,
            partial = response.is_partial(),
            "search complete"
        );
        Ok(response)
    }
}
