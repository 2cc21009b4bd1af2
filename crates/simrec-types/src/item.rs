//! Catalog items as read from the item store.
//!
//! Store rows arrive loosely typed. `Item::from_record` maps a row onto the
//! fixed `Item` shape and rejects rows without a usable identifier, so no
//! undefined shape travels past the ingestion boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SimrecError;

/// Lifecycle state of a catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    Pending,
    /// Listed and eligible for recommendations
    Active,
    Sold,
    Transferring,
    Unsold,
    /// Any status string not recognized above
    Other(String),
}

impl ItemStatus {
    /// Parse a status string. Matching is case-insensitive.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDING" => ItemStatus::Pending,
            "ACTIVE" => ItemStatus::Active,
            "SOLD" => ItemStatus::Sold,
            "TRANSFERRING" => ItemStatus::Transferring,
            "UNSOLD" => ItemStatus::Unsold,
            _ => ItemStatus::Other(raw.to_string()),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, ItemStatus::Active)
    }
}

/// A catalog item with the fields the similarity pipeline reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub status: ItemStatus,
}

impl Item {
    /// Create an active item. Mostly useful for fixtures.
    pub fn active(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            description: None,
            category: None,
            status: ItemStatus::Active,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = status;
        self
    }

    /// Validate a loosely typed store record and map it onto an `Item`.
    ///
    /// The identifier comes from `id`, falling back to `_id` for document
    /// database exports. String and integer identifiers are accepted; an
    /// `{"$oid": "..."}` wrapper is unwrapped. Text fields that are missing,
    /// null, or not strings are treated as absent. A missing status maps to
    /// `Other("")`, which never counts as active.
    ///
    /// # Errors
    ///
    /// Returns `SimrecError::InvalidRecord` if the record is not an object or
    /// carries no usable identifier.
    pub fn from_record(record: &Value) -> Result<Self, SimrecError> {
        let fields = record
            .as_object()
            .ok_or_else(|| SimrecError::InvalidRecord("record is not an object".to_string()))?;

        let id = fields
            .get("id")
            .and_then(id_from_value)
            .or_else(|| fields.get("_id").and_then(id_from_value))
            .ok_or_else(|| SimrecError::InvalidRecord("missing id field".to_string()))?;

        let text = |name: &str| {
            fields
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        let status = fields
            .get("status")
            .and_then(Value::as_str)
            .map(ItemStatus::parse)
            .unwrap_or_else(|| ItemStatus::Other(String::new()));

        Ok(Self {
            id,
            title: text("title"),
            description: text("description"),
            category: text("category"),
            status,
        })
    }

    /// Title, description and category joined by single spaces.
    ///
    /// Empty or whitespace-only fields contribute nothing.
    pub fn combined_text(&self) -> String {
        [&self.title, &self.description, &self.category]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        Value::Object(obj) => obj.get("$oid").and_then(id_from_value),
        _ => None,
    }
}
