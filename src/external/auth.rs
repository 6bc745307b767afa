//! The core never decodes a bearer token itself. `AuthClaims` is the
//! already-validated shape it consumes, produced by whatever middleware
//! sits in front of it.
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default)]
pub struct AuthClaims {
    pub caller_org_id: Option<Uuid>,
    pub is_system_internal: bool,
}
