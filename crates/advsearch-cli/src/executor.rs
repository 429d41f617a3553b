//! Question execution.

use advsearch::{AdvancedSearch, Error, SearchRequest};

use crate::formatter::Formatter;

/// Per-question overrides taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Search this record type instead of guessing it.
    pub model: Option<String>,
    /// Row limit.
    pub limit: Option<u32>,
}

impl QueryOptions {
    fn request(&self, question: &str) -> SearchRequest {
        let mut request = SearchRequest::new(question);
        if let Some(model) = &self.model {
            request = request.with_model_hint(model.clone());
        }
        if let Some(limit) = self.limit {
            request = request.with_limit(limit);
        }
        request
    }
}

/// Ask a question and return formatted output.
pub async fn execute(
    search: &AdvancedSearch,
    question: &str,
    options: &QueryOptions,
    formatter: &dyn Formatter,
) -> Result<String, Error> {
    let response = search.search(options.request(question)).await?;
    Ok(formatter.format_response(&response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use advsearch::{MemoryBackend, SearchConfig};

    use crate::formatter::CsvFormatter;

    const FIXTURE: &str = r#"{
        "models": [
            {
                "name": "res.partner",
                "label": "Contact",
                "synonyms": ["customer"],
                "fields": [{"name": "name", "type": "char", "label": "Name"}]
            }
        ],
        "records": {
            "res.partner": [
                {"id": 1, "name": "Acme"},
                {"id": 2, "name": "Globex"},
                {"id": 3, "name": "Initech"}
            ]
        }
    }"#;

    fn search() -> AdvancedSearch {
        let backend = Arc::new(MemoryBackend::from_json(FIXTURE).unwrap());
        AdvancedSearch::with_backend(backend, SearchConfig::default())
    }

    #[test]
    fn test_request_carries_overrides() {
        let options = QueryOptions {
            model: Some("res.partner".into()),
            limit: Some(5),
        };
        let request = options.request("everything");
        assert_eq!(request.query, "everything");
        assert_eq!(request.model_hint.as_deref(), Some("res.partner"));
        assert_eq!(request.limit, Some(5));

        let request = QueryOptions::default().request("customers");
        assert_eq!(request.model_hint, None);
        assert_eq!(request.limit, None);
    }

    #[tokio::test]
    async fn test_execute_formats_rows() {
        let search = search();
        let options = QueryOptions {
            model: None,
            limit: Some(2),
        };

        let output = execute(&search, "customers", &options, &CsvFormatter)
            .await
            .unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(output.contains("Acme"));
        assert!(!output.contains("Initech"));
    }

    #[tokio::test]
    async fn test_execute_reports_unknown_questions() {
        let search = search();
        let err = execute(&search, "weather today", &QueryOptions::default(), &CsvFormatter)
            .await
            .unwrap_err();
        assert!(!err.is_backend());
    }
}
