//! Client connection settings.

use url::Url;

use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket endpoint, e.g. `ws://127.0.0.1:8080/ws`
    pub url: String,
    pub client_id: String,
    /// Display name; the server falls back to `client_id` when absent
    pub username: Option<String>,
    pub chat_id: String,
}

impl ClientConfig {
    /// Name shown in the prompt
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.client_id)
    }

    /// Endpoint URL with `client_id`, `username` and `chat_id` query parameters
    pub fn connect_url(&self) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.url)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("client_id", &self.client_id);
            if let Some(username) = &self.username {
                query.append_pair("username", username);
            }
            query.append_pair("chat_id", &self.chat_id);
        }
        Ok(url)
    }
}
