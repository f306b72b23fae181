//! Compliance report queries.

/// Parameters of a `GET /api/v2/Reports` call.
///
/// The adapter always asks for the latest compliance report in JSON format,
/// so those parameters are fixed rather than carried here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportQuery {
    pub primary_query_id: Option<String>,
    pub secondary_query_id: Option<String>,
    pub report_type: Option<String>,
    pub report_name: Option<String>,
    pub template_name: Option<String>,
}

impl ReportQuery {
    /// Query for a CSP-specific default-template compliance report.
    pub fn default_template(report_type: impl Into<String>) -> Self {
        Self {
            report_type: Some(report_type.into()),
            template_name: Some("Default".to_string()),
            ..Self::default()
        }
    }

    pub fn with_primary(mut self, id: Option<String>) -> Self {
        self.primary_query_id = id;
        self
    }

    pub fn with_secondary(mut self, id: Option<String>) -> Self {
        self.secondary_query_id = id;
        self
    }

    /// Query-string pairs, skipping unset parameters.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("format", "json".to_string()),
            ("type", "COMPLIANCE".to_string()),
            ("latest", "true".to_string()),
        ];
        let optional = [
            ("primaryQueryId", &self.primary_query_id),
            ("secondaryQueryId", &self.secondary_query_id),
            ("reportType", &self.report_type),
            ("reportName", &self.report_name),
            ("templateName", &self.template_name),
        ];
        for (key, value) in optional {
            if let Some(v) = value.as_ref().filter(|v| !v.is_empty()) {
                pairs.push((key, v.clone()));
            }
        }
        pairs
    }
}
