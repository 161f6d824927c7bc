//! Role domain model.
//!
//! Role definitions are consumed read-only: callers use them to compute
//! scopes before asking the orchestrator for tokens. The core never
//! persists or mutates them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub permissions: Vec<String>,
    pub mfa_required: bool,
    pub is_default: bool,
}
