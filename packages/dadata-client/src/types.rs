use serde::{Deserialize, Serialize};

/// Request body for the `findById/party` and `suggest/party` endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct PartyQuery {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

/// Top-level response wrapper for suggestion endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestResponse {
    #[serde(default)]
    pub suggestions: Vec<PartySuggestion>,
}

/// One suggested party (company or individual entrepreneur).
#[derive(Debug, Clone, Deserialize)]
pub struct PartySuggestion {
    /// Short display name, e.g. `ООО "РОМАШКА"`
    pub value: String,
    pub data: PartyData,
}

/// Registry attributes of a party.
#[derive(Debug, Clone, Deserialize)]
pub struct PartyData {
    pub inn: Option<String>,
    pub kpp: Option<String>,
    pub ogrn: Option<String>,
    pub name: Option<PartyName>,
    pub state: Option<PartyState>,
    pub address: Option<PartyAddress>,
    /// "LEGAL" or "INDIVIDUAL"
    #[serde(rename = "type")]
    pub party_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PartyName {
    pub full_with_opf: Option<String>,
    pub short_with_opf: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PartyState {
    /// "ACTIVE", "LIQUIDATING", "LIQUIDATED", ...
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PartyAddress {
    pub value: Option<String>,
}
