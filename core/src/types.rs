//! Wire DTOs for the administration API.
//!
//! # Design
//! These types mirror the server's JSON shapes field for field. String fields
//! are skipped when empty and default to empty when absent, so a record
//! built with `..Default::default()` only puts the fields it sets on the
//! wire. `match` and `project` are opaque query documents and stay untyped.
//! The mock server defines its own copies of these shapes; integration tests
//! catch drift between the two.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::query::QueryOptions;

/// An App Services application within a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_app_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub deployment_model: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub domain_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group_id: String,
}

/// Query parameters for listing applications.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationListOptions {
    /// Restrict the listing to apps of one product, e.g. `atlas` or `standard`.
    pub product: Option<String>,
}

impl QueryOptions for ApplicationListOptions {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        self.product
            .iter()
            .filter(|product| !product.is_empty())
            .map(|product| ("product", product.clone()))
            .collect()
    }
}

/// What fires a trigger.
///
/// Unknown strings from the server are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TriggerType {
    Database,
    Authentication,
    Scheduled,
    Other(String),
}

impl TriggerType {
    pub fn as_str(&self) -> &str {
        match self {
            TriggerType::Database => "DATABASE",
            TriggerType::Authentication => "AUTHENTICATION",
            TriggerType::Scheduled => "SCHEDULED",
            TriggerType::Other(other) => other.as_str(),
        }
    }
}

impl From<String> for TriggerType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "DATABASE" => TriggerType::Database,
            "AUTHENTICATION" => TriggerType::Authentication,
            "SCHEDULED" => TriggerType::Scheduled,
            _ => TriggerType::Other(value),
        }
    }
}

impl From<TriggerType> for String {
    fn from(value: TriggerType) -> Self {
        match value {
            TriggerType::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

/// An empty `type` is the same as an absent one.
fn deserialize_kind<'de, D>(deserializer: D) -> Result<Option<TriggerType>, D::Error>
where
    D: Deserializer<'de>,
{
    let kind = Option::<String>::deserialize(deserializer)?;
    Ok(kind.filter(|kind| !kind.is_empty()).map(TriggerType::from))
}

fn kind_is_unset(kind: &Option<TriggerType>) -> bool {
    kind.as_ref().map_or(true, |kind| kind.as_str().is_empty())
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event trigger as returned by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventTrigger {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "deserialize_kind",
        skip_serializing_if = "kind_is_unset"
    )]
    pub kind: Option<TriggerType>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub function_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub function_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(default)]
    pub config: EventTriggerConfig,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub event_processors: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
}

/// Request body for creating or replacing an event trigger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventTriggerRequest {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "deserialize_kind",
        skip_serializing_if = "kind_is_unset"
    )]
    pub kind: Option<TriggerType>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub function_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<EventTriggerConfig>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub event_processors: BTreeMap<String, Value>,
}

impl EventTriggerRequest {
    pub fn new(name: impl Into<String>, kind: TriggerType, function_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: Some(kind),
            function_id: function_id.into(),
            ..Default::default()
        }
    }

    pub fn with_config(mut self, config: EventTriggerConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }

    /// Attaches a named event processor, e.g. `AWS_EVENTBRIDGE`.
    pub fn with_event_processor(mut self, name: impl Into<String>, processor: Value) -> Self {
        self.event_processors.insert(name.into(), processor);
        self
    }
}

/// Trigger configuration.
///
/// Which fields apply depends on the trigger type: database triggers use
/// `service_id`, `database`, `collection` and `operation_types`;
/// authentication triggers use `operation_type` and `providers`; scheduled
/// triggers use `schedule`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventTriggerConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operation_types: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub operation_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub database: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub collection: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_id: String,
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub match_expression: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_document: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_document_before_change: Option<bool>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub schedule: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub schedule_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unordered: Option<bool>,
    #[serde(rename = "clusterName", default, skip_serializing_if = "String::is_empty")]
    pub cluster_name: String,
}

impl EventTriggerConfig {
    /// Config for a trigger on collection changes.
    pub fn database<I, S>(
        service_id: impl Into<String>,
        database: impl Into<String>,
        collection: impl Into<String>,
        operation_types: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            service_id: service_id.into(),
            database: database.into(),
            collection: collection.into(),
            operation_types: operation_types.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Config for a trigger on user authentication events, e.g. `LOGIN`.
    pub fn authentication<I, S>(operation_type: impl Into<String>, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            operation_type: operation_type.into(),
            providers: providers.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Config for a trigger on a CRON schedule.
    pub fn scheduled(schedule: impl Into<String>) -> Self {
        Self {
            schedule: schedule.into(),
            ..Default::default()
        }
    }
}
