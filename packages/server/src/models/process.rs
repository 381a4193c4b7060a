use serde::{Deserialize, Serialize};

/// Location number as sent by the client: a JSON string or number.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum LocationNumber {
    Text(String),
    Number(serde_json::Number),
}

impl LocationNumber {
    pub fn into_string(self) -> String {
        match self {
            LocationNumber::Text(s) => s,
            LocationNumber::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    #[schema(value_type = Option<String>, example = "42")]
    pub location_number: Option<LocationNumber>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    #[schema(example = "Backend is running")]
    pub status: &'static str,
}
