use crate::auth::{Challenge, Credentials, TokenResponse};
use crate::error::{RegistryError, RegistryResult};
use crate::reference::{Reference, Repository};
use async_trait::async_trait;
use bundle_core::Source;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, WWW_AUTHENTICATE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, trace};

/// Header carrying the canonical manifest digest
pub const DIGEST_HEADER: &str = "docker-content-digest";

/// Manifest media types we accept, images and indexes alike
pub const MANIFEST_ACCEPT: &str = concat!(
    "application/vnd.oci.image.manifest.v1+json,",
    "application/vnd.oci.image.index.v1+json,",
    "application/vnd.docker.distribution.manifest.v2+json,",
    "application/vnd.docker.distribution.manifest.list.v2+json"
);

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// What a manifest request tells us about the referenced content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub digest: String,
}

/// Registry operations the version check depends on
#[async_trait]
pub trait Registry: Send + Sync {
    /// List every tag in a repository
    async fn list_tags(&self, repository: &Repository) -> RegistryResult<Vec<String>>;

    /// Metadata-only probe for a manifest
    async fn head_manifest(&self, reference: &Reference) -> RegistryResult<Descriptor>;

    /// Full manifest retrieval
    async fn get_manifest(&self, reference: &Reference) -> RegistryResult<Descriptor>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AuthState {
    Anonymous,
    Basic,
    Bearer(String),
}

/// Client for the OCI Distribution API
pub struct RegistryClient {
    client: reqwest::Client,
    credentials: Option<Credentials>,
    /// Authorization learned from the registry's challenge, reused for later requests
    auth_state: RwLock<AuthState>,
}

impl RegistryClient {
    /// Create an anonymous client with default settings
    pub fn new() -> RegistryResult<Self> {
        Self::builder().build()
    }

    pub fn builder() -> RegistryClientBuilder {
        RegistryClientBuilder::default()
    }

    /// Build a client from a pipeline source: credentials and custom CAs
    pub fn for_source(source: &Source) -> RegistryResult<Self> {
        RegistryClientBuilder::from_source(source).build()
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    fn current_auth(&self) -> AuthState {
        self.auth_state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_auth(&self, state: AuthState) {
        *self
            .auth_state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }

    fn apply_auth(&self, request: RequestBuilder, state: &AuthState) -> RequestBuilder {
        match (state, &self.credentials) {
            (AuthState::Bearer(token), _) => request.bearer_auth(token),
            (AuthState::Basic, Some(creds)) => {
                request.basic_auth(&creds.username, Some(&creds.password))
            }
            _ => request,
        }
    }

    /// Send a request, answering at most one authentication challenge
    async fn send(
        &self,
        method: Method,
        url: &str,
        repository: &Repository,
        accept: Option<&'static str>,
    ) -> RegistryResult<Response> {
        let build = |state: &AuthState| {
            let mut headers = HeaderMap::new();
            if let Some(accept) = accept {
                headers.insert(ACCEPT, HeaderValue::from_static(accept));
            }
            self.apply_auth(self.client.request(method.clone(), url).headers(headers), state)
        };

        let state = self.current_auth();
        trace!("{} {}", method, url);
        let response = build(&state).send().await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|h| h.to_str().ok())
            .and_then(Challenge::parse);

        let next_state = match challenge {
            Some(Challenge::Bearer {
                realm,
                service,
                scope,
            }) => {
                let scope = scope.unwrap_or_else(|| repository.scope("pull"));
                let token = self
                    .fetch_token(&realm, service.as_deref(), &scope)
                    .await?;
                AuthState::Bearer(token)
            }
            Some(Challenge::Basic) if self.credentials.is_some() && state != AuthState::Basic => {
                AuthState::Basic
            }
            _ => {
                return Err(RegistryError::Unauthorized {
                    url: url.to_string(),
                    reason: "registry rejected the request and offered no usable challenge"
                        .to_string(),
                })
            }
        };

        debug!("Retrying {} with refreshed authorization", url);
        self.set_auth(next_state.clone());
        let retried = build(&next_state).send().await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            return Err(RegistryError::Unauthorized {
                url: url.to_string(),
                reason: "credentials were not accepted".to_string(),
            });
        }
        Ok(retried)
    }

    /// Exchange credentials (or nothing) for a bearer token at the challenge realm
    async fn fetch_token(
        &self,
        realm: &str,
        service: Option<&str>,
        scope: &str,
    ) -> RegistryResult<String> {
        let mut url = url::Url::parse(realm)?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(service) = service {
                query.append_pair("service", service);
            }
            query.append_pair("scope", scope);
        }

        debug!("Requesting registry token from: {}", url);

        let mut request = self.client.get(url.as_str());
        if let Some(creds) = &self.credentials {
            debug!("Using authenticated request for registry token");
            request = request.basic_auth(&creds.username, Some(&creds.password));
        } else {
            debug!("Using anonymous request for registry token");
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::Unauthorized {
                url: url.to_string(),
                reason: format!("token request failed ({}): {}", status, body),
            });
        }

        let token: TokenResponse =
            response
                .json()
                .await
                .map_err(|e| RegistryError::InvalidResponse {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;

        token.into_token().ok_or_else(|| RegistryError::InvalidResponse {
            url: url.to_string(),
            reason: "token response carried no token".to_string(),
        })
    }

    fn manifest_url(reference: &Reference) -> String {
        let repo = reference.repository();
        format!(
            "{}/v2/{}/manifests/{}",
            repo.base_url(),
            repo.path(),
            reference.identifier()
        )
    }

    async fn error_from(url: &str, response: Response) -> RegistryError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        RegistryError::from_status(status, url, body)
    }
}

#[async_trait]
impl Registry for RegistryClient {
    /// List all tags for a repository (handles pagination)
    async fn list_tags(&self, repository: &Repository) -> RegistryResult<Vec<String>> {
        let base_url = repository.base_url();
        let mut all_tags = Vec::new();
        let mut url = format!("{}/v2/{}/tags/list?n=1000", base_url, repository.path());

        loop {
            debug!("Listing tags from: {}", url);

            let response = self.send(Method::GET, &url, repository, None).await?;
            if !response.status().is_success() {
                return Err(Self::error_from(&url, response).await);
            }

            // Check for Link header for pagination
            let next_url = response
                .headers()
                .get("link")
                .and_then(|h| h.to_str().ok())
                .and_then(|link| parse_link_header(link, &base_url));

            let tags_response: TagsResponse =
                response
                    .json()
                    .await
                    .map_err(|e| RegistryError::InvalidResponse {
                        url: url.clone(),
                        reason: e.to_string(),
                    })?;

            all_tags.extend(tags_response.tags.unwrap_or_default());

            // Continue to next page if available
            match next_url {
                Some(next) => url = next,
                None => break,
            }
        }

        trace!("Found {} tags total", all_tags.len());
        Ok(all_tags)
    }

    async fn head_manifest(&self, reference: &Reference) -> RegistryResult<Descriptor> {
        let url = Self::manifest_url(reference);
        debug!("Probing manifest at: {}", url);

        let response = self
            .send(
                Method::HEAD,
                &url,
                reference.repository(),
                Some(MANIFEST_ACCEPT),
            )
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_from(&url, response).await);
        }

        let headers = response.headers();
        let digest = header_str(headers, DIGEST_HEADER)
            .ok_or_else(|| RegistryError::MissingDigest { url: url.clone() })?;

        Ok(Descriptor { digest })
    }

    async fn get_manifest(&self, reference: &Reference) -> RegistryResult<Descriptor> {
        let url = Self::manifest_url(reference);
        debug!("Fetching manifest from: {}", url);

        let response = self
            .send(
                Method::GET,
                &url,
                reference.repository(),
                Some(MANIFEST_ACCEPT),
            )
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_from(&url, response).await);
        }

        let header_digest = header_str(response.headers(), DIGEST_HEADER);
        let body = response.bytes().await?;

        // Without the header the digest is the hash of the exact bytes served
        let digest = header_digest
            .unwrap_or_else(|| format!("sha256:{}", hex::encode(Sha256::digest(&body))));

        Ok(Descriptor { digest })
    }
}

/// Builder for [`RegistryClient`]
#[derive(Debug, Default)]
pub struct RegistryClientBuilder {
    credentials: Option<Credentials>,
    ca_certs: Vec<String>,
    timeout: Option<Duration>,
}

impl RegistryClientBuilder {
    /// Start from a source's credentials and certificate authorities
    pub fn from_source(source: &Source) -> Self {
        let builder = Self::default().ca_certs(source.ca_certs.iter().cloned());
        match source.credentials() {
            Some((username, password)) => {
                builder.credentials(Credentials::new(username, password))
            }
            None => builder,
        }
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Trust additional PEM-encoded certificate authorities
    pub fn ca_certs(mut self, certs: impl IntoIterator<Item = String>) -> Self {
        self.ca_certs.extend(certs);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> RegistryResult<RegistryClient> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("bundle-resource/", env!("CARGO_PKG_VERSION")))
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT));

        for pem in &self.ca_certs {
            for cert in parse_ca_cert(pem)? {
                builder = builder.add_root_certificate(cert);
            }
        }

        Ok(RegistryClient {
            client: builder.build()?,
            credentials: self.credentials,
            auth_state: RwLock::new(AuthState::Anonymous),
        })
    }
}

/// Parse PEM text into certificates, rejecting text that holds none
pub fn parse_ca_cert(pem: &str) -> bundle_core::Result<Vec<reqwest::Certificate>> {
    let certs = reqwest::Certificate::from_pem_bundle(pem.as_bytes())
        .map_err(|e| bundle_core::Error::invalid_certificate(e.to_string()))?;
    if certs.is_empty() {
        return Err(bundle_core::Error::invalid_certificate(
            "no PEM certificate found",
        ));
    }
    Ok(certs)
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse Link header for pagination
/// Format: <https://ghcr.io/v2/repo/tags/list?n=100&last=tag>; rel="next"
fn parse_link_header(link: &str, base_url: &str) -> Option<String> {
    for part in link.split(',') {
        let part = part.trim();
        if part.contains("rel=\"next\"") {
            // Extract URL from <...>
            if let Some(start) = part.find('<') {
                if let Some(len) = part[start + 1..].find('>') {
                    let url = &part[start + 1..start + 1 + len];
                    // URL might be relative, make it absolute
                    if url.starts_with('/') {
                        return Some(format!("{}{}", base_url, url));
                    }
                    return Some(url.to_string());
                }
            }
        }
    }
    None
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    tags: Option<Vec<String>>,
}
