//! Wire and domain types for the discovery registry.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A service record as stored by the registry. The server is authoritative;
/// the client never alters one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisteredService {
    #[serde(deserialize_with = "null_as_default")]
    pub ens_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ens_node: String,
    #[serde(deserialize_with = "null_as_default")]
    pub owner: String,
    #[serde(deserialize_with = "null_as_default")]
    pub endpoint: String,
    #[serde(deserialize_with = "null_as_default")]
    pub payment_scheme: String,
    #[serde(deserialize_with = "null_as_default")]
    pub network: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub capabilities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facilitator_url: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub active: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(deserialize_with = "null_as_default")]
    pub updated_at: String,
}

/// A successful name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsResolution {
    /// Normalized form of the requested name.
    pub ens_name: String,
    /// Namehash of `ens_name`, computed locally.
    pub ens_node: String,
    pub service: RegisteredService,
}

/// Payload for `POST /api/services`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRegistrationRequest {
    pub ens_name: String,
    pub owner: String,
    pub endpoint: String,
    pub payment_scheme: String,
    pub network: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facilitator_url: Option<String>,
}

impl ServiceRegistrationRequest {
    pub fn new(
        ens_name: impl Into<String>,
        owner: impl Into<String>,
        endpoint: impl Into<String>,
        payment_scheme: impl Into<String>,
        network: impl Into<String>,
    ) -> Self {
        Self {
            ens_name: ens_name.into(),
            owner: owner.into(),
            endpoint: endpoint.into(),
            payment_scheme: payment_scheme.into(),
            network: network.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_facilitator_url(mut self, facilitator_url: impl Into<String>) -> Self {
        self.facilitator_url = Some(facilitator_url.into());
        self
    }
}

/// Query constraints for `GET /api/services`. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceListFilters {
    pub network: Option<String>,
    pub payment_scheme: Option<String>,
    pub owner: Option<String>,
    pub active: Option<bool>,
}

impl ServiceListFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    pub fn payment_scheme(mut self, payment_scheme: impl Into<String>) -> Self {
        self.payment_scheme = Some(payment_scheme.into());
        self
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }
}

/// Result page of a list or search call. `total` may exceed `items.len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceListResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub items: Vec<RegisteredService>,
    #[serde(deserialize_with = "null_as_default")]
    pub total: u64,
}

/// Options for `GET /api/x402/discovery/resources`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct X402DiscoveryOptions {
    pub facilitator_url: Option<String>,
    pub resource_type: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl X402DiscoveryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn facilitator_url(mut self, facilitator_url: impl Into<String>) -> Self {
        self.facilitator_url = Some(facilitator_url.into());
        self
    }

    pub fn resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Resources advertised by an x402 facilitator, relayed by the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct X402DiscoveryResponse {
    pub facilitator_url: String,
    pub items: Vec<Map<String, Value>>,
    pub total: u64,
}

/// Payload for `POST /api/services/{name}/payments/verify`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerifyRequest {
    pub payment_payload: Map<String, Value>,
    pub payment_requirements: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facilitator_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x402_version: Option<u32>,
}

impl PaymentVerifyRequest {
    pub fn new(payment_payload: Map<String, Value>, payment_requirements: Map<String, Value>) -> Self {
        Self {
            payment_payload,
            payment_requirements,
            ..Self::default()
        }
    }

    pub fn with_facilitator_url(mut self, facilitator_url: impl Into<String>) -> Self {
        self.facilitator_url = Some(facilitator_url.into());
        self
    }

    pub fn with_x402_version(mut self, version: u32) -> Self {
        self.x402_version = Some(version);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentVerification {
    pub is_valid: bool,
    pub invalid_reason: Option<String>,
    pub invalid_message: Option<String>,
    pub payer: Option<String>,
    pub extensions: Option<Map<String, Value>>,
}

/// Outcome of a payment verification; an invalid payment is still `Ok`.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentVerifyResponse {
    pub ens_name: String,
    pub verification: PaymentVerification,
}

// --- Envelopes ---

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ServiceEnvelope {
    #[serde(default)]
    pub service: Option<RegisteredService>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct X402DiscoveryEnvelope {
    #[serde(default)]
    pub facilitator_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<Map<String, Value>>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PaymentVerifyEnvelope {
    #[serde(default)]
    pub ens_name: Option<String>,
    #[serde(default)]
    pub verification: Option<VerificationView>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VerificationView {
    #[serde(default)]
    pub is_valid: Option<bool>,
    #[serde(default)]
    pub invalid_reason: Option<String>,
    #[serde(default)]
    pub invalid_message: Option<String>,
    #[serde(default)]
    pub payer: Option<String>,
    #[serde(default)]
    pub extensions: Option<Map<String, Value>>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registered_service_uses_wire_names() {
        let service: RegisteredService = serde_json::from_value(json!({
            "ensName": "weather-api.eth",
            "ensNode": "0xnode",
            "owner": "0x1111111111111111111111111111111111111111",
            "endpoint": "https://api.example.com/weather",
            "paymentScheme": "exact",
            "network": "eip155:8453",
            "description": "Weather",
            "capabilities": ["forecast", "alerts"],
            "facilitatorUrl": "https://x402.org/facilitator",
            "active": true,
            "createdAt": "2026-01-01T00:00:00Z",
            "updatedAt": "2026-01-02T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(service.ens_name, "weather-api.eth");
        assert_eq!(service.payment_scheme, "exact");
        assert_eq!(service.capabilities, vec!["forecast", "alerts"]);
        assert_eq!(
            service.facilitator_url.as_deref(),
            Some("https://x402.org/facilitator")
        );
        assert!(service.active);
        assert_eq!(service.updated_at, "2026-01-02T00:00:00Z");
    }

    #[test]
    fn partial_and_null_fields_fall_back_to_defaults() {
        let service: RegisteredService = serde_json::from_value(json!({
            "ensName": "weather-api.eth",
            "capabilities": null,
            "owner": null,
            "description": null
        }))
        .unwrap();

        assert_eq!(service.ens_name, "weather-api.eth");
        assert!(service.capabilities.is_empty());
        assert!(service.owner.is_empty());
        assert!(service.description.is_none());
        assert!(!service.active);
    }

    #[test]
    fn registration_omits_unset_optionals() {
        let request = ServiceRegistrationRequest::new(
            "weather-api.eth",
            "0x1111111111111111111111111111111111111111",
            "https://api.example.com/weather",
            "exact",
            "eip155:8453",
        );
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "ensName": "weather-api.eth",
                "owner": "0x1111111111111111111111111111111111111111",
                "endpoint": "https://api.example.com/weather",
                "paymentScheme": "exact",
                "network": "eip155:8453"
            })
        );

        let body = serde_json::to_value(
            request
                .with_description("Weather")
                .with_capabilities(["forecast"])
                .with_facilitator_url("https://x402.org/facilitator"),
        )
        .unwrap();
        assert_eq!(body["description"], "Weather");
        assert_eq!(body["capabilities"], json!(["forecast"]));
        assert_eq!(body["facilitatorUrl"], "https://x402.org/facilitator");
    }

    #[test]
    fn list_response_tolerates_missing_fields() {
        let list: ServiceListResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(list, ServiceListResponse::default());

        let list: ServiceListResponse =
            serde_json::from_str(r#"{"items":[{"ensName":"a.eth"}],"total":7}"#).unwrap();
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.total, 7);
    }

    #[test]
    fn verify_request_wire_shape() {
        let mut payload = Map::new();
        payload.insert("scheme".into(), json!("exact"));
        let request = PaymentVerifyRequest::new(payload, Map::new()).with_x402_version(1);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "paymentPayload": {"scheme": "exact"},
                "paymentRequirements": {},
                "x402Version": 1
            })
        );
    }
}
