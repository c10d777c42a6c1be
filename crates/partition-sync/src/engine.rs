//! Partition to identity-provider synchronization.
//!
//! Each partition is mirrored as an OAuth2 client in the provider's
//! registry. A sync probes for the client first, so running it twice on
//! an unchanged partition creates once and then updates. The local store
//! is only written after the registry call succeeded; there is no
//! transaction spanning the two.

use partition_core::error::{PartitionError, PartitionResult};
use partition_core::models::partition::{CLIENT_ID_KEY, Partition};
use partition_core::properties::PropertyValue;
use partition_core::repository::PartitionRepository;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::registry::{Method, RegistryClient, RegistryResponse};

pub const GRANT_TYPES: &[&str] = &["authorization_code", "refresh_token"];
pub const RESPONSE_TYPES: &[&str] = &["token", "id_token", "code", "code id_token"];
pub const SCOPE: &str = "openid offline_access profile contact";

/// Query parameter appended to every redirect URI.
pub const PARTITION_PARAM: &str = "partition_id";

const AUTH_METHOD_KEY: &str = "token_endpoint_auth_method";
const AUTH_METHOD_SECRET_POST: &str = "client_secret_post";
const AUTH_METHOD_NONE: &str = "none";

/// What a sync did to the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// The partition is deleted; its client was removed (or was absent).
    Deleted,
    /// A new client was registered. Carries the saved partition.
    Created(Partition),
    /// An existing client was replaced. Carries the saved partition.
    Updated(Partition),
}

/// Reconciles partitions with the registry and records what it returns.
pub struct SyncEngine<P: PartitionRepository, R: RegistryClient> {
    partitions: P,
    registry: R,
    config: SyncConfig,
}

impl<P: PartitionRepository, R: RegistryClient> SyncEngine<P, R> {
    pub fn new(partitions: P, registry: R, config: SyncConfig) -> Self {
        Self {
            partitions,
            registry,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Make the registry client match `partition`.
    ///
    /// Messages may arrive late or more than once, so the stored row is
    /// authoritative: when the store knows the partition, its current
    /// version is what gets synced and saved. A partition deleted in the
    /// store only ever has its client removed.
    pub async fn sync(&self, partition: Partition) -> PartitionResult<SyncOutcome> {
        let deleted_in_message = partition.is_deleted();
        let partition = match self.partitions.get_by_id_with_deleted(partition.id).await {
            Ok(stored) => {
                if stored.updated_at != partition.updated_at {
                    debug!(
                        partition_id = %partition.id,
                        "Message differs from the store, syncing the stored copy"
                    );
                }
                stored
            }
            Err(PartitionError::NotFound { .. }) => partition,
            Err(e) => return Err(e),
        };
        let client_id = partition.client_id();

        // Deletion is terminal, whichever copy carries it.
        if deleted_in_message || partition.is_deleted() {
            self.remove_client(&partition, &client_id).await?;
            return Ok(SyncOutcome::Deleted);
        }

        // Built before any call so a bad redirect URI aborts cleanly.
        let mut payload = build_client_payload(&partition, true, &client_id)?;

        let client_url = self.config.client_url(&client_id)?;
        let probe = self.registry.invoke(Method::Get, &client_url, None).await?;
        let exists = probe.status == 200;

        let (method, url) = if exists {
            // The id is already part of the URL.
            if let Value::Object(fields) = &mut payload {
                fields.remove(CLIENT_ID_KEY);
            }
            (Method::Put, client_url)
        } else {
            (Method::Post, self.config.clients_url()?)
        };

        debug!(
            partition_id = %partition.id,
            client_id = %client_id,
            %method,
            "Syncing partition with registry"
        );
        let response = self.registry.invoke(method, &url, Some(&payload)).await?;
        if !response.is_success() {
            warn!(
                partition_id = %partition.id,
                %method,
                status = response.status,
                "Registry rejected client"
            );
            return Err(SyncError::RegistryStatus {
                status: response.status,
                body: response.body_text(),
            }
            .into());
        }

        let mut partition = partition;
        fold_response(&mut partition, &response)?;

        let saved = self.partitions.save(partition).await?;
        info!(
            partition_id = %saved.id,
            client_id = saved.registry_client_id.as_deref().unwrap_or_default(),
            created = !exists,
            "Partition synchronized"
        );

        Ok(if exists {
            SyncOutcome::Updated(saved)
        } else {
            SyncOutcome::Created(saved)
        })
    }

    async fn remove_client(&self, partition: &Partition, client_id: &str) -> PartitionResult<()> {
        let url = self.config.client_url(client_id)?;
        let response = self.registry.invoke(Method::Delete, &url, None).await?;

        // Already gone counts as removed.
        if !response.is_success() && response.status != 404 {
            return Err(SyncError::RegistryStatus {
                status: response.status,
                body: response.body_text(),
            }
            .into());
        }

        info!(
            partition_id = %partition.id,
            client_id,
            status = response.status,
            "Registry client removed"
        );
        Ok(())
    }
}

/// Merge a successful registry response into the partition's properties
/// and link the registry client id.
fn fold_response(partition: &mut Partition, response: &RegistryResponse) -> Result<(), SyncError> {
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }

    let value: Value = serde_json::from_slice(&response.body)
        .map_err(|e| SyncError::UnexpectedResponse(e.to_string()))?;
    let Value::Object(object) = value else {
        return Err(SyncError::UnexpectedResponse(format!(
            "expected an object, got {}",
            json_kind(&value)
        )));
    };

    partition.properties.merge_json(object);
    if let Some(client_id) = partition
        .properties
        .get_str(CLIENT_ID_KEY)
        .filter(|id| !id.is_empty())
    {
        partition.registry_client_id = Some(client_id.to_string());
    }
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Build the registry client document for `partition`.
///
/// `client_id` is only written into the body on create; on update it is
/// already part of the URL.
pub fn build_client_payload(
    partition: &Partition,
    include_client_id: bool,
    client_id: &str,
) -> Result<Value, SyncError> {
    let redirect_uris = partition
        .properties
        .get_list("redirect_uris")
        .unwrap_or_default()
        .iter()
        .map(|uri| with_partition_param(uri, partition.id))
        .collect::<Result<Vec<_>, _>>()?;

    let audience = partition.properties.get_list("audience").unwrap_or_default();
    let logo_uri = partition
        .properties
        .get("logo_uri")
        .map(PropertyValue::to_api_string)
        .unwrap_or_default();

    let mut payload = Map::new();
    if include_client_id {
        payload.insert(CLIENT_ID_KEY.into(), json!(client_id));
    }
    payload.insert("client_name".into(), json!(partition.name));
    payload.insert("grant_types".into(), json!(GRANT_TYPES));
    payload.insert("response_types".into(), json!(RESPONSE_TYPES));
    payload.insert("scope".into(), json!(SCOPE));
    payload.insert("redirect_uris".into(), json!(redirect_uris));
    payload.insert("audience".into(), json!(audience));
    payload.insert("logo_uri".into(), json!(logo_uri));

    let explicit_method = partition
        .properties
        .get_str(AUTH_METHOD_KEY)
        .filter(|m| !m.is_empty());
    let auth_method = match (explicit_method, partition.secret()) {
        (Some(method), _) => method,
        (None, Some(_)) => AUTH_METHOD_SECRET_POST,
        (None, None) => AUTH_METHOD_NONE,
    };
    payload.insert(AUTH_METHOD_KEY.into(), json!(auth_method));
    match partition.secret() {
        Some(secret) if auth_method != AUTH_METHOD_NONE => {
            payload.insert("client_secret".into(), json!(secret));
        }
        _ => {}
    }

    Ok(Value::Object(payload))
}

/// Ensure `uri` carries a `partition_id` query parameter, appending it
/// when absent. Existing parameters and their order are kept.
pub fn with_partition_param(uri: &str, partition_id: Uuid) -> Result<String, SyncError> {
    let mut url = Url::parse(uri.trim()).map_err(|e| SyncError::InvalidRedirectUri {
        uri: uri.to_string(),
        reason: e.to_string(),
    })?;

    if url.query_pairs().any(|(key, _)| key == PARTITION_PARAM) {
        return Ok(url.to_string());
    }

    url.query_pairs_mut()
        .append_pair(PARTITION_PARAM, &partition_id.to_string());
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use partition_core::models::partition::CreatePartition;

    use super::*;

    fn partition() -> Partition {
        Partition::new(CreatePartition {
            tenant_id: Uuid::new_v4(),
            name: "Shop".into(),
            ..Default::default()
        })
    }

    #[test]
    fn partition_param_is_appended_once() {
        let id = Uuid::new_v4();
        assert_eq!(
            with_partition_param("https://a/cb", id).unwrap(),
            format!("https://a/cb?partition_id={id}")
        );
        assert_eq!(
            with_partition_param("https://b/cb?x=1", id).unwrap(),
            format!("https://b/cb?x=1&partition_id={id}")
        );

        let already = format!("https://c/cb?partition_id={id}&y=2");
        assert_eq!(with_partition_param(&already, id).unwrap(), already);
    }

    #[test]
    fn existing_partition_param_is_not_overwritten() {
        let uri = "https://c/cb?partition_id=other";
        assert_eq!(with_partition_param(uri, Uuid::new_v4()).unwrap(), uri);
    }

    #[test]
    fn malformed_redirect_uri_is_rejected() {
        let err = with_partition_param("not a uri", Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, SyncError::InvalidRedirectUri { .. }));
    }

    #[test]
    fn payload_rewrites_redirects_in_order() {
        let mut p = partition();
        p.properties
            .insert("redirect_uris", "https://a/cb,https://b/cb?x=1");

        let payload = build_client_payload(&p, true, "client-1").unwrap();
        assert_eq!(
            payload["redirect_uris"],
            json!([
                format!("https://a/cb?partition_id={}", p.id),
                format!("https://b/cb?x=1&partition_id={}", p.id),
            ])
        );
    }

    #[test]
    fn payload_fixed_fields_and_defaults() {
        let p = partition();
        let payload = build_client_payload(&p, false, "client-1").unwrap();

        assert!(payload.get("client_id").is_none());
        assert_eq!(payload["client_name"], "Shop");
        assert_eq!(
            payload["grant_types"],
            json!(["authorization_code", "refresh_token"])
        );
        assert_eq!(
            payload["response_types"],
            json!(["token", "id_token", "code", "code id_token"])
        );
        assert_eq!(payload["scope"], SCOPE);
        assert_eq!(payload["redirect_uris"], json!([]));
        assert_eq!(payload["audience"], json!([]));
        assert_eq!(payload["logo_uri"], "");
        assert_eq!(payload["token_endpoint_auth_method"], "none");
        assert!(payload.get("client_secret").is_none());
    }

    #[test]
    fn create_payload_carries_client_id() {
        let p = partition();
        let payload = build_client_payload(&p, true, "client-1").unwrap();
        assert_eq!(payload["client_id"], "client-1");
    }

    #[test]
    fn secret_selects_client_secret_post() {
        let mut p = partition();
        p.client_secret = Some("s3cret".into());

        let payload = build_client_payload(&p, true, "c").unwrap();
        assert_eq!(payload["token_endpoint_auth_method"], "client_secret_post");
        assert_eq!(payload["client_secret"], "s3cret");
    }

    #[test]
    fn explicit_auth_method_wins_over_secret() {
        let mut p = partition();
        p.client_secret = Some("s3cret".into());
        p.properties
            .insert("token_endpoint_auth_method", "client_secret_basic");

        let payload = build_client_payload(&p, true, "c").unwrap();
        assert_eq!(
            payload["token_endpoint_auth_method"],
            "client_secret_basic"
        );
        assert_eq!(payload["client_secret"], "s3cret");
    }

    #[test]
    fn explicit_none_method_withholds_secret() {
        let mut p = partition();
        p.client_secret = Some("s3cret".into());
        p.properties.insert("token_endpoint_auth_method", "none");

        let payload = build_client_payload(&p, true, "c").unwrap();
        assert_eq!(payload["token_endpoint_auth_method"], "none");
        assert!(payload.get("client_secret").is_none());
    }

    #[test]
    fn audience_and_logo_are_read_from_properties() {
        let mut p = partition();
        p.properties.insert(
            "audience",
            vec!["api://one".to_string(), "api://two".to_string()],
        );
        p.properties.insert("logo_uri", "https://a/logo.png");

        let payload = build_client_payload(&p, true, "c").unwrap();
        assert_eq!(payload["audience"], json!(["api://one", "api://two"]));
        assert_eq!(payload["logo_uri"], "https://a/logo.png");
    }

    #[test]
    fn response_is_merged_and_client_id_linked() {
        let mut p = partition();
        p.properties.insert("logo_uri", "old");
        p.properties.insert("team", "payments");

        let response = RegistryResponse {
            status: 201,
            body: br#"{"client_id":"abc","logo_uri":"new"}"#.to_vec(),
        };
        fold_response(&mut p, &response).unwrap();

        assert_eq!(p.properties.get_str("logo_uri"), Some("new"));
        assert_eq!(p.properties.get_str("team"), Some("payments"));
        assert_eq!(p.registry_client_id.as_deref(), Some("abc"));
    }

    #[test]
    fn empty_response_merges_nothing() {
        let mut p = partition();
        let before = p.properties.clone();
        let response = RegistryResponse {
            status: 204,
            body: Vec::new(),
        };
        fold_response(&mut p, &response).unwrap();
        assert_eq!(p.properties, before);
        assert_eq!(p.registry_client_id, None);
    }

    #[test]
    fn non_object_response_is_rejected() {
        let mut p = partition();
        let response = RegistryResponse {
            status: 200,
            body: b"[1,2]".to_vec(),
        };
        let err = fold_response(&mut p, &response).unwrap_err();
        assert!(matches!(err, SyncError::UnexpectedResponse(_)));
    }
}
