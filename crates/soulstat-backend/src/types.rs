use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Birth data forwarded to the backend.
///
/// Fields the proxy does not know about travel in `extra` so the backend
/// receives the caller's body as sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub birth_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_time: Option<String>,
    /// Transaction id handed over by the payment widget once funds are captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalyzeRequest {
    #[must_use]
    pub fn new(birth_date: impl Into<String>) -> Self {
        Self {
            birth_date: birth_date.into(),
            birth_time: None,
            payment_id: None,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_birth_time(mut self, birth_time: impl Into<String>) -> Self {
        self.birth_time = Some(birth_time.into());
        self
    }

    #[must_use]
    pub fn with_payment_id(mut self, payment_id: impl Into<String>) -> Self {
        self.payment_id = Some(payment_id.into());
        self
    }
}

/// Result of `POST /analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub class: String,
    pub class_description: String,
    pub dominant_element: String,
    pub day_master: String,
    pub stats: ElementStats,
    pub pillars: Pillars,
    pub interpretations: BTreeMap<String, String>,
    pub detailed_report: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Elemental scores. Kept as JSON numbers so integers stay integers when relayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ElementStats {
    pub wood: Number,
    pub fire: Number,
    pub earth: Number,
    pub metal: Number,
    pub water: Number,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pillars {
    pub year: Pillar,
    pub month: Pillar,
    pub day: Pillar,
    pub hour: Pillar,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pillar {
    pub stem: String,
    pub branch: String,
}

/// Result of `POST /analyze/deep`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepReport {
    /// Markdown "Book of Destiny"; may be empty when generation produced nothing.
    pub deep_report: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
