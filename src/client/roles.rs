use super::error::ClientError;
use super::http::{check_status, ApiTransport};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Path of the host's role listing.
pub const ROLES_PATH: &str = "/roles";

/// Read-only source of assignable role names.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    async fn role_names(&self) -> Result<Vec<String>, ClientError>;
}

/// One entry of the role listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSummary {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub read_only: bool,
}

/// Response of `GET /roles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleList {
    pub roles: Vec<RoleSummary>,
    pub total: usize,
}

/// Role directory backed by the host's `GET /roles` endpoint.
#[derive(Debug, Clone)]
pub struct HttpRoleDirectory {
    transport: ApiTransport,
}

impl HttpRoleDirectory {
    pub fn new(transport: ApiTransport) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl RoleDirectory for HttpRoleDirectory {
    async fn role_names(&self) -> Result<Vec<String>, ClientError> {
        let url = self.transport.qualify_url(ROLES_PATH)?;
        debug!(url = %url, "Loading role names");
        let response = self.transport.get(url).send().await?;
        let list: RoleList = check_status(response).await?.json().await?;
        Ok(list.roles.into_iter().map(|r| r.name).collect())
    }
}
