// Form body accepted by the login route (OAuth2 password flow field names)
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct LoginSchema {
    pub username: String,
    pub password: String,
}

// Response body returned by a successful login
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct TokenSchema {
    pub access_token: String,
    pub token_type: String,
}

impl TokenSchema {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

// Payload carried inside an access token
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}
