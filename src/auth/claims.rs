use serde::{Deserialize, Serialize};

/// JWT payload carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,       // user ID
    pub email: String, // user email at issue time
    pub iat: i64,      // issued at (unix timestamp)
    pub exp: i64,      // expires at (unix timestamp)
}
