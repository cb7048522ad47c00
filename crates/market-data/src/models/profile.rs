use serde::{Deserialize, Serialize};

/// Asset profile data from the provider, optionally enriched with an
/// encyclopedia summary.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetProfile {
    pub symbol: String,

    /// Company/asset name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Business description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Where the description came from ("FMP", "WIKIPEDIA")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_source: Option<String>,

    /// Business sector (e.g., "Technology")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,

    /// Industry within sector (e.g., "Consumer Electronics")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,

    /// Company website URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,

    /// Country of domicile (ISO 3166-1 alpha-2)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    /// Logo URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl AssetProfile {
    /// Bare profile carrying only the symbol.
    pub fn for_symbol(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Default::default()
        }
    }

    /// True when a non-blank description is present.
    pub fn has_description(&self) -> bool {
        self.description
            .as_deref()
            .map(|d| !d.trim().is_empty())
            .unwrap_or(false)
    }

    /// Set the description and its source.
    pub fn with_description(mut self, description: impl Into<String>, source: &str) -> Self {
        self.description = Some(description.into());
        self.description_source = Some(source.to_string());
        self
    }
}
