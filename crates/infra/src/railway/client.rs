//! Railway GraphQL client
//!
//! Speaks the Railway control-plane protocol: a single HTTP endpoint
//! accepting `{query, variables}` payloads with a bearer credential, and a
//! `{data}` / `{errors: [{message}]}` response envelope. The typed
//! operations below implement the `ControlPlane` port.

use std::time::Duration;

use async_trait::async_trait;
use chalforge_core::ControlPlane;
use chalforge_domain::constants::{RAILWAY_API_URL, REQUEST_TIMEOUT_SECS};
use chalforge_domain::{DeploymentStatus, ProxyEndpoint, RailwayConfig};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::errors::ApiError;

const SERVICE_CREATE: &str = "\
mutation serviceCreate($input: ServiceCreateInput!) {
    serviceCreate(input: $input) {
        id
        name
    }
}";

const SERVICE_INSTANCE_UPDATE: &str = "\
mutation serviceInstanceUpdate(
    $serviceId: String!, $environmentId: String!, $input: ServiceInstanceUpdateInput!
) {
    serviceInstanceUpdate(serviceId: $serviceId, environmentId: $environmentId, input: $input)
}";

const SERVICE_INSTANCE_DEPLOY: &str = "\
mutation serviceInstanceDeployV2($serviceId: String!, $environmentId: String!) {
    serviceInstanceDeployV2(serviceId: $serviceId, environmentId: $environmentId)
}";

const SERVICE_INSTANCE_STATUS: &str = "\
query serviceInstance($serviceId: String!, $environmentId: String!) {
    serviceInstance(serviceId: $serviceId, environmentId: $environmentId) {
        latestDeployment {
            status
        }
    }
}";

const TCP_PROXY_CREATE: &str = "\
mutation tcpProxyCreate($input: TCPProxyCreateInput!) {
    tcpProxyCreate(input: $input) {
        id
        domain
        proxyPort
    }
}";

const SERVICE_DELETE: &str = "\
mutation serviceDelete($id: String!) {
    serviceDelete(id: $id)
}";

const PROJECT_QUERY: &str = "\
query project($id: String!) {
    project(id: $id) {
        id
        name
    }
}";

/// Where and how to reach the control plane
#[derive(Debug, Clone)]
pub struct RailwayEndpoint {
    /// GraphQL endpoint URL
    pub base_url: String,
    /// Timeout for a single request
    pub timeout: Duration,
}

impl Default for RailwayEndpoint {
    fn default() -> Self {
        Self {
            base_url: RAILWAY_API_URL.to_string(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Authenticated GraphQL client for the Railway control plane
pub struct RailwayClient {
    http: reqwest::Client,
    endpoint: RailwayEndpoint,
    config: RailwayConfig,
}

/// GraphQL response envelope
#[derive(Debug, Deserialize)]
struct GraphQlEnvelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ServiceCreateData {
    #[serde(rename = "serviceCreate")]
    service_create: Option<CreatedService>,
}

#[derive(Debug, Deserialize)]
struct CreatedService {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ServiceInstanceData {
    #[serde(rename = "serviceInstance")]
    service_instance: Option<ServiceInstance>,
}

#[derive(Debug, Deserialize)]
struct ServiceInstance {
    #[serde(rename = "latestDeployment")]
    latest_deployment: Option<LatestDeployment>,
}

#[derive(Debug, Deserialize)]
struct LatestDeployment {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TcpProxyCreateData {
    #[serde(rename = "tcpProxyCreate")]
    tcp_proxy_create: Option<CreatedTcpProxy>,
}

#[derive(Debug, Deserialize)]
struct CreatedTcpProxy {
    #[serde(default)]
    domain: String,
    #[serde(rename = "proxyPort")]
    proxy_port: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ProjectData {
    project: Option<Value>,
}

impl RailwayClient {
    /// Create a client against the production Railway endpoint
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the underlying HTTP client cannot be
    /// built.
    pub fn new(config: RailwayConfig) -> Result<Self, ApiError> {
        Self::with_endpoint(config, RailwayEndpoint::default())
    }

    /// Create a client against a custom endpoint (tests, staging)
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the underlying HTTP client cannot be
    /// built.
    pub fn with_endpoint(
        config: RailwayConfig,
        endpoint: RailwayEndpoint,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(endpoint.timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, endpoint, config })
    }

    /// Execute one GraphQL request and return the `data` object
    ///
    /// # Errors
    /// - `Network`/`Timeout` when the transport fails
    /// - status-classed errors for non-2xx responses
    /// - `Api` carrying the first message when the envelope has `errors`
    #[instrument(skip(self, query, variables))]
    pub async fn execute(&self, query: &str, variables: Value) -> Result<Value, ApiError> {
        let payload = json!({ "query": query, "variables": variables });

        debug!(url = %self.endpoint.base_url, "GraphQL request");
        let response = self
            .http
            .post(&self.endpoint.base_url)
            .bearer_auth(&self.config.api_token)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::Timeout(self.endpoint.timeout)
                } else {
                    ApiError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status_error(status, &body));
        }

        let envelope: GraphQlEnvelope = response
            .json()
            .await
            .map_err(|e| ApiError::Network(format!("failed to parse response: {e}")))?;

        if let Some(errors) = envelope.errors {
            let message = errors
                .into_iter()
                .next()
                .map(|e| e.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "Railway API error".to_string());
            return Err(ApiError::Api(message));
        }

        Ok(envelope.data.unwrap_or(Value::Null))
    }

    fn map_status_error(status: StatusCode, body: &str) -> ApiError {
        let message = if body.is_empty() {
            format!("status {status}")
        } else {
            format!("status {status}: {body}")
        };

        if status == StatusCode::NOT_FOUND {
            ApiError::NotFound(message)
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            ApiError::Auth(message)
        } else if status.is_server_error() {
            ApiError::Server(message)
        } else if status.is_client_error() {
            ApiError::Client(message)
        } else {
            ApiError::Network(message)
        }
    }

    fn decode<T: serde::de::DeserializeOwned>(data: Value) -> Result<T, ApiError> {
        serde_json::from_value(data)
            .map_err(|e| ApiError::Api(format!("unexpected response shape: {e}")))
    }
}

#[async_trait]
impl ControlPlane for RailwayClient {
    async fn create_service(&self, name: &str, image: &str) -> chalforge_domain::Result<String> {
        let data = self
            .execute(
                SERVICE_CREATE,
                json!({
                    "input": {
                        "projectId": self.config.project_id,
                        "name": name,
                        "source": { "image": image },
                    }
                }),
            )
            .await?;
        let payload: ServiceCreateData = Self::decode(data)?;
        let created = payload
            .service_create
            .ok_or_else(|| ApiError::Api("service creation returned no handle".to_string()))?;
        Ok(created.id)
    }

    async fn set_start_command(
        &self,
        service_id: &str,
        command: &str,
    ) -> chalforge_domain::Result<()> {
        self.execute(
            SERVICE_INSTANCE_UPDATE,
            json!({
                "serviceId": service_id,
                "environmentId": self.config.environment_id,
                "input": { "startCommand": command },
            }),
        )
        .await?;
        Ok(())
    }

    async fn deploy_service(&self, service_id: &str) -> chalforge_domain::Result<()> {
        self.execute(
            SERVICE_INSTANCE_DEPLOY,
            json!({
                "serviceId": service_id,
                "environmentId": self.config.environment_id,
            }),
        )
        .await?;
        Ok(())
    }

    async fn deployment_status(
        &self,
        service_id: &str,
    ) -> chalforge_domain::Result<Option<DeploymentStatus>> {
        let data = self
            .execute(
                SERVICE_INSTANCE_STATUS,
                json!({
                    "serviceId": service_id,
                    "environmentId": self.config.environment_id,
                }),
            )
            .await?;
        let payload: ServiceInstanceData = Self::decode(data)?;
        let status = payload
            .service_instance
            .and_then(|si| si.latest_deployment)
            .and_then(|dep| dep.status)
            .map(|raw| DeploymentStatus::parse(&raw));
        Ok(status)
    }

    async fn create_tcp_proxy(
        &self,
        service_id: &str,
        application_port: u16,
    ) -> chalforge_domain::Result<ProxyEndpoint> {
        let data = self
            .execute(
                TCP_PROXY_CREATE,
                json!({
                    "input": {
                        "serviceId": service_id,
                        "environmentId": self.config.environment_id,
                        "applicationPort": application_port,
                    }
                }),
            )
            .await?;
        let payload: TcpProxyCreateData = Self::decode(data)?;
        let proxy = payload
            .tcp_proxy_create
            .ok_or_else(|| ApiError::Api("tcp proxy creation returned no payload".to_string()))?;
        let proxy_port = proxy
            .proxy_port
            .ok_or_else(|| ApiError::Api("tcp proxy did not return a port".to_string()))?;
        if proxy.domain.is_empty() {
            return Err(ApiError::Api("tcp proxy did not return a domain".to_string()).into());
        }
        Ok(ProxyEndpoint { domain: proxy.domain, proxy_port })
    }

    async fn delete_service(&self, service_id: &str) -> chalforge_domain::Result<()> {
        self.execute(SERVICE_DELETE, json!({ "id": service_id })).await?;
        Ok(())
    }

    async fn project_exists(&self) -> chalforge_domain::Result<bool> {
        let data = self
            .execute(PROJECT_QUERY, json!({ "id": self.config.project_id }))
            .await?;
        let payload: ProjectData = Self::decode(data)?;
        Ok(payload.project.is_some())
    }
}

#[cfg(test)]
mod tests {
    use chalforge_domain::ChalforgeError;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config() -> RailwayConfig {
        RailwayConfig {
            api_token: "test-token".to_string(),
            project_id: "proj-1".to_string(),
            environment_id: "env-1".to_string(),
            expiration_seconds: 0,
        }
    }

    async fn client(server: &MockServer) -> RailwayClient {
        RailwayClient::with_endpoint(
            config(),
            RailwayEndpoint { base_url: server.uri(), timeout: Duration::from_secs(5) },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn execute_sends_bearer_credential_and_returns_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": { "ok": true } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let data = client(&server).await.execute("query { ok }", json!({})).await.unwrap();
        assert_eq!(data, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn envelope_errors_surface_first_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [
                    { "message": "Project not found" },
                    { "message": "secondary" },
                ]
            })))
            .mount(&server)
            .await;

        let err = client(&server).await.execute("query { ok }", json!({})).await.unwrap_err();
        match err {
            ApiError::Api(message) => assert_eq!(message, "Project not found"),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn http_404_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client(&server).await.execute("query { ok }", json!({})).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn http_401_maps_to_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;

        let err = client(&server).await.execute("query { ok }", json!({})).await.unwrap_err();
        assert!(matches!(err, ApiError::Auth(_)));
    }

    #[tokio::test]
    async fn http_500_maps_to_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client(&server).await.execute("query { ok }", json!({})).await.unwrap_err();
        assert!(matches!(err, ApiError::Server(_)));
    }

    #[tokio::test]
    async fn create_service_returns_platform_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("serviceCreate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "serviceCreate": { "id": "svc-42", "name": "chal-5-9-1" } }
            })))
            .mount(&server)
            .await;

        let id = client(&server)
            .await
            .create_service("chal-5-9-1", "ctf/pwn:latest")
            .await
            .unwrap();
        assert_eq!(id, "svc-42");
    }

    #[tokio::test]
    async fn create_service_without_handle_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "data": { "serviceCreate": null } })),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .create_service("chal-5-9-1", "ctf/pwn:latest")
            .await
            .unwrap_err();
        assert!(matches!(err, ChalforgeError::RemoteApi(_)));
        assert!(err.to_string().contains("no handle"));
    }

    #[tokio::test]
    async fn deployment_status_handles_missing_deployment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "serviceInstance": { "latestDeployment": null } }
            })))
            .mount(&server)
            .await;

        let status = client(&server).await.deployment_status("svc-42").await.unwrap();
        assert!(status.is_none());
    }

    #[tokio::test]
    async fn deployment_status_parses_active() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "serviceInstance": { "latestDeployment": { "status": "ACTIVE" } }
                }
            })))
            .mount(&server)
            .await;

        let status = client(&server).await.deployment_status("svc-42").await.unwrap();
        assert_eq!(status, Some(DeploymentStatus::Active));
    }

    #[tokio::test]
    async fn tcp_proxy_returns_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("tcpProxyCreate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "tcpProxyCreate": {
                        "id": "proxy-1",
                        "domain": "x.example.com",
                        "proxyPort": 30000
                    }
                }
            })))
            .mount(&server)
            .await;

        let endpoint = client(&server).await.create_tcp_proxy("svc-42", 1234).await.unwrap();
        assert_eq!(endpoint.domain, "x.example.com");
        assert_eq!(endpoint.proxy_port, 30000);
    }

    #[tokio::test]
    async fn tcp_proxy_without_port_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "tcpProxyCreate": { "id": "proxy-1", "domain": "x.example.com" } }
            })))
            .mount(&server)
            .await;

        let err = client(&server).await.create_tcp_proxy("svc-42", 1234).await.unwrap_err();
        assert!(err.to_string().contains("port"));
    }

    #[tokio::test]
    async fn project_exists_reflects_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "project": { "id": "proj-1", "name": "ctf" } }
            })))
            .mount(&server)
            .await;
        assert!(client(&server).await.project_exists().await.unwrap());

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": { "project": null } })),
            )
            .mount(&server)
            .await;
        assert!(!client(&server).await.project_exists().await.unwrap());
    }
}
