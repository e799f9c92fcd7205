//! Ory Kratos gateway.
//!
//! Typed wrapper over the Kratos admin API (identities, sessions,
//! credentials) and the public API (schemas). Stateless: nothing is cached
//! and nothing is retried. Every call is bounded by the client timeout and is
//! cancelled when the calling request future is dropped.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use service_core::observability::TracedRequestExt;
use std::time::Duration;
use tracing::instrument;

use super::error::describe;
use super::GatewayError;
use crate::config::KratosConfig;
use crate::models::{Identity, IdentitySchema, IdentityState, Session, INCLUDED_CREDENTIAL_TYPES};

/// Minimum length accepted for a password set through the admin API.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Credential types an administrator may remove from an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletableCredential {
    Totp,
    Webauthn,
    LookupSecret,
}

impl DeletableCredential {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeletableCredential::Totp => "totp",
            DeletableCredential::Webauthn => "webauthn",
            DeletableCredential::LookupSecret => "lookup_secret",
        }
    }
}

impl std::str::FromStr for DeletableCredential {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "totp" => Ok(DeletableCredential::Totp),
            "webauthn" => Ok(DeletableCredential::Webauthn),
            "lookup_secret" => Ok(DeletableCredential::LookupSecret),
            _ => Err(GatewayError::InvalidArgument(format!(
                "Invalid credential type: {}. Must be one of: totp, webauthn, lookup_secret",
                s
            ))),
        }
    }
}

/// One page of identities plus the size of the whole (fetched) set.
#[derive(Debug, Clone)]
pub struct IdentityPage {
    pub identities: Vec<Identity>,
    pub total: usize,
}

/// Body of `POST /admin/identities`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateIdentityBody {
    pub schema_id: String,
    pub traits: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<IdentityState>,
}

/// Body of `PUT /admin/identities/{id}`. Full replace: whatever is omitted
/// here is reset upstream.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateIdentityBody {
    pub schema_id: String,
    pub traits: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<IdentityState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<CredentialsBody>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CredentialsBody {
    pub password: PasswordCredentials,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordCredentials {
    pub config: PasswordConfig,
}

#[derive(Clone, Serialize)]
pub struct PasswordConfig {
    pub password: String,
}

impl std::fmt::Debug for PasswordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordConfig")
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Returns the `page`-th slice of `items`, pages numbered from 1.
///
/// A page past the end is empty, not an error.
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Vec<T> {
    let total = items.len();
    let offset = page.saturating_sub(1).saturating_mul(per_page);
    if offset >= total {
        return Vec::new();
    }
    items.into_iter().skip(offset).take(per_page).collect()
}

/// Client for the Kratos admin and public APIs.
#[derive(Clone)]
pub struct KratosClient {
    client: Client,
    admin_url: String,
    public_url: Option<String>,
    identity_fetch_cap: usize,
}

impl KratosClient {
    pub fn new(config: &KratosConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|source| GatewayError::Transport {
                operation: "build http client".to_string(),
                source,
            })?;

        tracing::info!(
            admin_url = %config.admin_url,
            public_url = ?config.public_url,
            identity_fetch_cap = config.identity_fetch_cap,
            "Kratos client configured"
        );

        Ok(Self {
            client,
            admin_url: config.admin_url.clone(),
            public_url: config.public_url.clone(),
            identity_fetch_cap: config.identity_fetch_cap,
        })
    }

    fn admin(&self, path: &str) -> String {
        format!("{}/admin{}", self.admin_url, path)
    }

    // -- identities --------------------------------------------------------

    /// Kratos has no count endpoint, so paging fetches up to
    /// `identity_fetch_cap` identities in one call and slices locally.
    /// Larger identity sets are truncated.
    #[instrument(skip(self))]
    pub async fn list_identities(
        &self,
        page: usize,
        per_page: usize,
    ) -> Result<IdentityPage, GatewayError> {
        if page < 1 || per_page < 1 {
            return Err(GatewayError::InvalidArgument(
                "page and per_page must be at least 1".to_string(),
            ));
        }

        let all = self.fetch_all_identities("list identities").await?;
        let total = all.len();

        Ok(IdentityPage {
            identities: paginate(all, page, per_page),
            total,
        })
    }

    async fn fetch_all_identities(
        &self,
        operation: &'static str,
    ) -> Result<Vec<Identity>, GatewayError> {
        let request = self
            .client
            .get(self.admin("/identities"))
            .query(&[("per_page", self.identity_fetch_cap)]);

        let response = self.execute(operation, "", request).await?;
        let identities: Vec<Identity> = decode(operation, "", response).await?;

        if identities.len() >= self.identity_fetch_cap {
            tracing::warn!(
                fetched = identities.len(),
                cap = self.identity_fetch_cap,
                "Identity fetch hit the cap; totals may be truncated"
            );
        }

        Ok(identities)
    }

    #[instrument(skip(self))]
    pub async fn get_identity(&self, id: &str) -> Result<Identity, GatewayError> {
        let request = self
            .client
            .get(self.admin(&format!("/identities/{}", urlencoding::encode(id))));

        let response = self.execute("get identity", id, request).await?;
        decode("get identity", id, response).await
    }

    /// Same as [`get_identity`](Self::get_identity) with metadata for every
    /// credential type included.
    #[instrument(skip(self))]
    pub async fn get_identity_with_credentials(&self, id: &str) -> Result<Identity, GatewayError> {
        let include: Vec<(&str, &str)> = INCLUDED_CREDENTIAL_TYPES
            .iter()
            .map(|t| ("include_credential", *t))
            .collect();
        let request = self
            .client
            .get(self.admin(&format!("/identities/{}", urlencoding::encode(id))))
            .query(&include);

        let response = self
            .execute("get identity with credentials", id, request)
            .await?;
        decode("get identity with credentials", id, response).await
    }

    #[instrument(skip(self, body), fields(schema_id = %body.schema_id))]
    pub async fn create_identity(&self, body: &CreateIdentityBody) -> Result<Identity, GatewayError> {
        let request = self.client.post(self.admin("/identities")).json(body);

        let response = self.execute("create identity", "", request).await?;
        let identity: Identity = decode("create identity", "", response).await?;

        tracing::info!(identity_id = %identity.id, "Identity created");
        Ok(identity)
    }

    #[instrument(skip(self, body), fields(schema_id = %body.schema_id))]
    pub async fn update_identity(
        &self,
        id: &str,
        body: &UpdateIdentityBody,
    ) -> Result<Identity, GatewayError> {
        let request = self
            .client
            .put(self.admin(&format!("/identities/{}", urlencoding::encode(id))))
            .json(body);

        let response = self.execute("update identity", id, request).await?;
        let identity: Identity = decode("update identity", id, response).await?;

        tracing::info!(identity_id = %identity.id, "Identity updated");
        Ok(identity)
    }

    #[instrument(skip(self))]
    pub async fn delete_identity(&self, id: &str) -> Result<(), GatewayError> {
        let request = self
            .client
            .delete(self.admin(&format!("/identities/{}", urlencoding::encode(id))));

        self.execute("delete identity", id, request).await?;
        tracing::info!(identity_id = %id, "Identity deleted");
        Ok(())
    }

    /// Read-modify-write: reloads the identity and writes it back with a new
    /// password credential. Not atomic; a concurrent update in between is
    /// overwritten.
    #[instrument(skip(self, new_password))]
    pub async fn reset_password(&self, id: &str, new_password: &str) -> Result<(), GatewayError> {
        if new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(GatewayError::InvalidArgument(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let identity = self.get_identity(id).await?;
        if !identity.traits.is_object() {
            return Err(GatewayError::InvalidState(format!(
                "traits of identity {} are not a JSON object",
                id
            )));
        }

        let body = UpdateIdentityBody {
            schema_id: identity.schema_id,
            traits: identity.traits,
            state: identity.state,
            credentials: Some(CredentialsBody {
                password: PasswordCredentials {
                    config: PasswordConfig {
                        password: new_password.to_string(),
                    },
                },
            }),
        };

        let request = self
            .client
            .put(self.admin(&format!("/identities/{}", urlencoding::encode(id))))
            .json(&body);

        self.execute("reset password", id, request).await?;
        tracing::info!(identity_id = %id, "Password reset");
        Ok(())
    }

    /// Removes one credential type from an identity. Only second factors
    /// (`totp`, `webauthn`, `lookup_secret`) can be removed; anything else is
    /// rejected before Kratos is contacted.
    #[instrument(skip(self))]
    pub async fn delete_credential(
        &self,
        id: &str,
        credential_type: &str,
    ) -> Result<(), GatewayError> {
        let credential: DeletableCredential = credential_type.parse()?;

        let request = self.client.delete(self.admin(&format!(
            "/identities/{}/credentials/{}",
            urlencoding::encode(id),
            credential.as_str()
        )));

        self.execute("delete credential", id, request).await?;
        tracing::info!(identity_id = %id, credential_type = credential.as_str(), "Credential deleted");
        Ok(())
    }

    // -- sessions ----------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn get_identity_sessions(&self, id: &str) -> Result<Vec<Session>, GatewayError> {
        let request = self.client.get(self.admin(&format!(
            "/identities/{}/sessions",
            urlencoding::encode(id)
        )));

        let response = self.execute("list identity sessions", id, request).await?;
        decode("list identity sessions", id, response).await
    }

    /// Kratos pages sessions by size only; `page` is not forwarded and no
    /// total is available.
    #[instrument(skip(self))]
    pub async fn list_sessions(
        &self,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<Session>, GatewayError> {
        if page < 1 || per_page < 1 {
            return Err(GatewayError::InvalidArgument(
                "page and per_page must be at least 1".to_string(),
            ));
        }

        let request = self
            .client
            .get(self.admin("/sessions"))
            .query(&[("page_size", per_page)]);

        let response = self.execute("list sessions", "", request).await?;
        decode("list sessions", "", response).await
    }

    /// Disables the session upstream. One-way.
    #[instrument(skip(self))]
    pub async fn revoke_session(&self, id: &str) -> Result<(), GatewayError> {
        let request = self
            .client
            .delete(self.admin(&format!("/sessions/{}", urlencoding::encode(id))));

        self.execute("revoke session", id, request).await?;
        tracing::info!(session_id = %id, "Session revoked");
        Ok(())
    }

    // -- schemas -----------------------------------------------------------

    /// Lists identity schemas from the public API, the only endpoint that
    /// returns schema documents inline.
    #[instrument(skip(self))]
    pub async fn list_identity_schemas(&self) -> Result<Vec<IdentitySchema>, GatewayError> {
        let operation = "list identity schemas";
        let public_url = self.public_url.as_deref().ok_or_else(|| {
            GatewayError::UpstreamUnavailable("public URL not configured".to_string())
        })?;

        let response = self
            .client
            .get(format!("{}/schemas", public_url))
            .with_trace_context()
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                operation: operation.to_string(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "Kratos schema listing failed");
            return Err(GatewayError::Upstream {
                operation: operation.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        decode(operation, "", response).await
    }

    // -- counts ------------------------------------------------------------

    /// Total identities, subject to the fetch cap.
    #[instrument(skip(self))]
    pub async fn get_identity_count(&self) -> Result<usize, GatewayError> {
        Ok(self.fetch_all_identities("count identities").await?.len())
    }

    /// Identities whose state is `active`, subject to the fetch cap.
    #[instrument(skip(self))]
    pub async fn get_active_identity_count(&self) -> Result<usize, GatewayError> {
        let identities = self.fetch_all_identities("count active identities").await?;
        Ok(identities.iter().filter(|i| i.is_active()).count())
    }

    /// Active sessions, filtered by Kratos itself.
    #[instrument(skip(self))]
    pub async fn get_session_count(&self) -> Result<usize, GatewayError> {
        let request = self
            .client
            .get(self.admin("/sessions"))
            .query(&[("active", "true")]);

        let response = self.execute("count active sessions", "", request).await?;
        let sessions: Vec<Session> = decode("count active sessions", "", response).await?;
        Ok(sessions.len())
    }

    // -- plumbing ----------------------------------------------------------

    /// Sends `request`; 404 on a single record becomes `NotFound`, any other
    /// non-2xx `Upstream`.
    async fn execute(
        &self,
        operation: &'static str,
        id: &str,
        request: RequestBuilder,
    ) -> Result<Response, GatewayError> {
        let response = request
            .with_trace_context()
            .send()
            .await
            .map_err(|source| {
                tracing::error!(error = %source, operation, id, "Kratos request failed");
                GatewayError::Transport {
                    operation: describe(operation, id),
                    source,
                }
            })?;

        let status = response.status();
        // A 404 on a collection endpoint means a misconfigured base URL, not
        // a missing record.
        if status == StatusCode::NOT_FOUND && !id.is_empty() {
            return Err(GatewayError::NotFound {
                operation,
                id: id.to_string(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, operation, id, "Kratos returned an error");
            return Err(GatewayError::Upstream {
                operation: describe(operation, id),
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

async fn decode<T: DeserializeOwned>(
    operation: &str,
    id: &str,
    response: Response,
) -> Result<T, GatewayError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|source| GatewayError::Transport {
            operation: describe(operation, id),
            source,
        })?;

    serde_json::from_slice(&bytes).map_err(|source| GatewayError::Decode {
        operation: describe(operation, id),
        source,
    })
}
