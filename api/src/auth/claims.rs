use serde::{Deserialize, Serialize};

/// JWT claims minted by the external identity service. The engine trusts the
/// subject and role it is handed.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i64,
    pub role: Role,
    pub exp: usize,
}

/// Who the caller is for access-control purposes.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Presenter,
    Student,
}

#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);
