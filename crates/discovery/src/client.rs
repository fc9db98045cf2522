use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::{form_urlencoded, Url};

use crate::config::{ClientConfig, DEFAULT_TIMEOUT};
use crate::ens::{self, require_ens_name};
use crate::error::{decode_api_error, DiscoveryError, Result};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::types::{
    EnsResolution, PaymentVerification, PaymentVerifyEnvelope, PaymentVerifyRequest,
    PaymentVerifyResponse, RegisteredService, ServiceEnvelope, ServiceListFilters,
    ServiceListResponse, ServiceRegistrationRequest, X402DiscoveryEnvelope, X402DiscoveryOptions,
    X402DiscoveryResponse,
};

const PAYMENT_REQUIRED: u16 = 402;

/// Client for the ENS-keyed service discovery registry.
#[derive(Debug, Clone)]
pub struct RegistryClient<T = reqwest::Client> {
    base_url: Url,
    verify_ens_node: bool,
    transport: T,
}

impl RegistryClient<reqwest::Client> {
    /// Build a client backed by a reqwest client with a 10 second timeout.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(DiscoveryError::HttpClient)?;
        Self::with_transport(config, http)
    }
}

impl<T: HttpTransport> RegistryClient<T> {
    /// Build a client on top of an existing transport. No request is made.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(&config.api_base_url)?,
            verify_ens_node: config.verify_ens_node,
            transport,
        })
    }

    /// The normalized registry root, without trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn normalize_ens_name(&self, name: &str) -> String {
        ens::normalize_ens_name(name)
    }

    pub fn validate_ens_name(&self, name: &str) -> bool {
        ens::validate_ens_name(name)
    }

    pub fn compute_ens_node(&self, name: &str) -> Result<String> {
        ens::compute_ens_node(name)
    }

    /// Resolve an ENS name to its registered service, checking that the
    /// registry answered for the name that was asked.
    pub async fn resolve_ens_name(&self, name: &str) -> Result<EnsResolution> {
        let ens_name = require_ens_name(name)?;
        let ens_node = ens::compute_ens_node(&ens_name)?;

        let url = self.endpoint(&["api", "services", &ens_name], None)?;
        let service = self
            .get_json::<ServiceEnvelope>(url)
            .await?
            .and_then(|envelope| envelope.service)
            .ok_or(DiscoveryError::MissingResponseField("service object"))?;

        if ens::normalize_ens_name(&service.ens_name) != ens_name {
            return Err(DiscoveryError::ResolverMismatch {
                expected: ens_name,
                actual: service.ens_name,
            });
        }
        if self.verify_ens_node && !service.ens_node.eq_ignore_ascii_case(&ens_node) {
            return Err(DiscoveryError::EnsNodeMismatch {
                expected: ens_node,
                actual: service.ens_node,
            });
        }

        Ok(EnsResolution {
            ens_name,
            ens_node,
            service,
        })
    }

    pub async fn get_service_by_ens_name(&self, name: &str) -> Result<RegisteredService> {
        Ok(self.resolve_ens_name(name).await?.service)
    }

    /// Register a new service. The returned record is the server's copy.
    pub async fn register_service(
        &self,
        request: &ServiceRegistrationRequest,
    ) -> Result<RegisteredService> {
        validate_registration(request)?;

        let url = self.endpoint(&["api", "services"], None)?;
        self.request_json::<_, ServiceEnvelope>(Method::POST, url, Some(request))
            .await?
            .and_then(|envelope| envelope.service)
            .ok_or(DiscoveryError::MissingResponseField("service object"))
    }

    pub async fn list_services(&self, filters: &ServiceListFilters) -> Result<ServiceListResponse> {
        let url = self.endpoint(&["api", "services"], Some(&list_query(filters)))?;
        Ok(self
            .get_json::<ServiceListResponse>(url)
            .await?
            .unwrap_or_default())
    }

    pub async fn search_services(&self, query: &str) -> Result<ServiceListResponse> {
        let needle = non_blank(Some(query)).ok_or(DiscoveryError::missing("search query"))?;
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("q", needle)
            .finish();

        let url = self.endpoint(&["api", "services", "search"], Some(&query))?;
        Ok(self
            .get_json::<ServiceListResponse>(url)
            .await?
            .unwrap_or_default())
    }

    /// Resources an x402 facilitator advertises, relayed through the registry.
    pub async fn get_x402_discoverable_resources(
        &self,
        options: &X402DiscoveryOptions,
    ) -> Result<X402DiscoveryResponse> {
        let query = x402_query(options)?;
        let url = self.endpoint(&["api", "x402", "discovery", "resources"], Some(&query))?;
        let envelope = self
            .get_json::<X402DiscoveryEnvelope>(url)
            .await?
            .unwrap_or_default();
        let facilitator_url = envelope
            .facilitator_url
            .ok_or(DiscoveryError::MissingResponseField("facilitatorUrl"))?;
        let total = envelope.total.unwrap_or(envelope.items.len() as u64);

        Ok(X402DiscoveryResponse {
            facilitator_url,
            items: envelope.items,
            total,
        })
    }

    /// Ask the registry to verify an x402 payment for a service. A rejected
    /// payment (HTTP 402) is reported through `verification.is_valid`.
    pub async fn verify_service_payment(
        &self,
        name: &str,
        request: &PaymentVerifyRequest,
    ) -> Result<PaymentVerifyResponse> {
        let ens_name = require_ens_name(name)?;
        if let Some(facilitator_url) = &request.facilitator_url {
            normalize_url("facilitator url", facilitator_url)?;
        }
        if request.x402_version == Some(0) {
            return Err(DiscoveryError::invalid("x402 version", "0"));
        }

        let url = self.endpoint(&["api", "services", &ens_name, "payments", "verify"], None)?;
        let response = self.send(Method::POST, url, Some(request)).await?;
        if !response.is_success() && response.status != PAYMENT_REQUIRED {
            return Err(decode_api_error(response.status, &response.body).into());
        }

        let envelope = decode_body::<PaymentVerifyEnvelope>(&response.body)?.unwrap_or_default();
        let verification = envelope
            .verification
            .ok_or(DiscoveryError::MissingResponseField("verification object"))?;
        let answered_for = envelope
            .ens_name
            .ok_or(DiscoveryError::MissingResponseField("ensName"))?;
        let is_valid = verification
            .is_valid
            .ok_or(DiscoveryError::MissingResponseField("verification.isValid"))?;

        if ens::normalize_ens_name(&answered_for) != ens_name {
            return Err(DiscoveryError::VerificationMismatch {
                expected: ens_name,
                actual: answered_for,
            });
        }

        Ok(PaymentVerifyResponse {
            ens_name: answered_for,
            verification: PaymentVerification {
                is_valid,
                invalid_reason: verification.invalid_reason,
                invalid_message: verification.invalid_message,
                payer: verification.payer,
                extensions: verification.extensions,
            },
        })
    }

    /// `{base}/segments...[?query]`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str], query: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DiscoveryError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        url.set_query(query.filter(|q| !q.is_empty()));
        Ok(url)
    }

    async fn get_json<R>(&self, url: Url) -> Result<Option<R>>
    where
        R: DeserializeOwned,
    {
        self.request_json::<(), R>(Method::GET, url, None).await
    }

    async fn request_json<B, R>(&self, method: Method, url: Url, body: Option<&B>) -> Result<Option<R>>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let response = self.send(method, url, body).await?;
        if !response.is_success() {
            return Err(decode_api_error(response.status, &response.body).into());
        }
        decode_body(&response.body)
    }

    async fn send<B>(&self, method: Method, url: Url, body: Option<&B>) -> Result<HttpResponse>
    where
        B: Serialize + ?Sized + Sync,
    {
        let payload = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(DiscoveryError::Encode)?;
        let request = HttpRequest::new(method, url)
            .with_header("Content-Type", "application/json")
            .with_body(payload);

        debug!(method = %request.method, url = %request.url, "sending registry request");
        let response = self.transport.execute(request).await?;
        debug!(
            status = response.status,
            bytes = response.body.len(),
            "registry responded"
        );
        Ok(response)
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DiscoveryError::MissingBaseUrl);
    }
    let stripped = trimmed.trim_end_matches('/');
    match Url::parse(stripped) {
        Ok(url) if !url.cannot_be_a_base() && url.host_str().is_some_and(|h| !h.is_empty()) => {
            Ok(url)
        }
        _ => Err(DiscoveryError::InvalidBaseUrl(raw.to_string())),
    }
}

fn validate_registration(request: &ServiceRegistrationRequest) -> Result<()> {
    require_ens_name(&request.ens_name)?;
    let required = [
        ("owner", &request.owner),
        ("endpoint", &request.endpoint),
        ("payment scheme", &request.payment_scheme),
        ("network", &request.network),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(DiscoveryError::missing(field));
        }
    }
    Ok(())
}

fn list_query(filters: &ServiceListFilters) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    let text_filters = [
        ("network", &filters.network),
        ("paymentScheme", &filters.payment_scheme),
        ("owner", &filters.owner),
    ];
    for (key, value) in text_filters {
        if let Some(value) = non_blank(value.as_deref()) {
            query.append_pair(key, value);
        }
    }
    if let Some(active) = filters.active {
        query.append_pair("active", if active { "true" } else { "false" });
    }
    query.finish()
}

fn x402_query(options: &X402DiscoveryOptions) -> Result<String> {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(facilitator_url) = &options.facilitator_url {
        query.append_pair(
            "facilitatorUrl",
            &normalize_url("facilitator url", facilitator_url)?,
        );
    }
    if let Some(resource_type) = &options.resource_type {
        let resource_type = non_blank(Some(resource_type.as_str()))
            .ok_or(DiscoveryError::missing("resource type"))?;
        query.append_pair("type", resource_type);
    }
    if let Some(limit) = options.limit {
        query.append_pair("limit", &limit.to_string());
    }
    if let Some(offset) = options.offset {
        query.append_pair("offset", &offset.to_string());
    }
    Ok(query.finish())
}

fn decode_body<R: DeserializeOwned>(body: &[u8]) -> Result<Option<R>> {
    if body.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(DiscoveryError::Decode)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn normalize_url(field: &'static str, raw: &str) -> Result<String> {
    Url::parse(raw.trim())
        .map(String::from)
        .map_err(|_| DiscoveryError::invalid(field, raw))
}
