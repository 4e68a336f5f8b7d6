//! Tokens API: manage access tokens and inspect scopes.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::client::MapiClient;
use crate::error::{Error, Result};
use crate::request::{MapiRequest, RequestParams};
use crate::types::wire_enum;

const TOKENS: &str = "/tokens/v2/:ownerId";
const TOKEN: &str = "/tokens/v2/:ownerId/:tokenId";
const CURRENT_TOKEN: &str = "/tokens/v2";
const SCOPES: &str = "/scopes/v1/:ownerId";

wire_enum! {
    TokenUsage {
        Public => "pk",
        Secret => "sk",
        Temporary => "tk",
    }
}

wire_enum! {
    TokenSort {
        Created => "created",
        Modified => "modified",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: String,
    pub usage: TokenUsage,
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_urls: Option<Vec<String>>,
    pub created: String,
    pub modified: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporaryToken {
    pub token: String,
}

/// Payload of the token that authenticated the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenDetail {
    pub usage: TokenUsage,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenStatus {
    /// `TokenValid`, `TokenExpired`, `TokenRevoked`, ...
    pub code: String,
    pub token: TokenDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListTokens {
    /// Only the default public token.
    pub default: Option<bool>,
    pub limit: Option<u32>,
    pub sortby: Option<TokenSort>,
    pub start: Option<String>,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateToken {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub scopes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_urls: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTemporaryToken {
    /// At most one hour in the future.
    pub expires: DateTime<Utc>,
    pub scopes: Vec<String>,
}

#[derive(Serialize)]
struct TemporaryTokenBody<'a> {
    expires: String,
    scopes: &'a [String],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateToken {
    #[serde(skip)]
    pub token_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_urls: Option<Vec<String>>,
}

impl UpdateToken {
    pub fn new(token_id: impl Into<String>) -> Self {
        Self {
            token_id: token_id.into(),
            note: None,
            scopes: None,
            resources: None,
            allowed_urls: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteToken {
    pub token_id: String,
}

impl DeleteToken {
    pub fn new(token_id: impl Into<String>) -> Self {
        Self {
            token_id: token_id.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokensService {
    client: MapiClient,
}

impl TokensService {
    pub fn new(client: &MapiClient) -> Self {
        Self {
            client: client.clone(),
        }
    }

    pub fn list_tokens(&self, config: &ListTokens) -> Result<MapiRequest<Vec<Token>>> {
        let params = RequestParams::get(TOKENS)
            .query_opt("default", config.default)
            .query_opt("limit", config.limit)
            .query_opt("sortby", config.sortby)
            .query_opt("start", config.start.as_deref())
            .query_opt("usage", config.usage);
        self.client.create_request(params)
    }

    pub fn create_token(&self, config: &CreateToken) -> Result<MapiRequest<Token>> {
        let params = RequestParams::post(TOKENS).json(config)?;
        self.client.create_request(params)
    }

    pub fn create_temporary_token(&self, config: &CreateTemporaryToken) -> Result<MapiRequest<TemporaryToken>> {
        if config.scopes.is_empty() {
            return Err(Error::invalid("scopes", "a temporary token needs at least one scope"));
        }
        let body = TemporaryTokenBody {
            expires: config.expires.to_rfc3339_opts(SecondsFormat::Secs, true),
            scopes: &config.scopes,
        };
        let params = RequestParams::post(TOKENS).json(&body)?;
        self.client.create_request(params)
    }

    pub fn update_token(&self, config: &UpdateToken) -> Result<MapiRequest<Token>> {
        let params = RequestParams::patch(TOKEN)
            .param("tokenId", &config.token_id)
            .json(config)?;
        self.client.create_request(params)
    }

    /// Status of the client's own access token.
    pub fn get_token(&self) -> Result<MapiRequest<TokenStatus>> {
        self.client.create_request(RequestParams::get(CURRENT_TOKEN))
    }

    pub fn delete_token(&self, config: &DeleteToken) -> Result<MapiRequest<()>> {
        let params = RequestParams::delete(TOKEN).param("tokenId", &config.token_id);
        self.client.create_request(params)
    }

    pub fn list_scopes(&self) -> Result<MapiRequest<Vec<Scope>>> {
        self.client.create_request(RequestParams::get(SCOPES))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpMethod, HttpResponse};
    use crate::request::RequestBody;
    use crate::services::test_support::{client, path, query};
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn create_token_uses_camel_case() {
        let (client, _) = client();
        let config = CreateToken {
            note: Some("ci".to_string()),
            scopes: vec!["styles:read".to_string()],
            allowed_urls: Some(vec!["https://example.com".to_string()]),
            ..CreateToken::default()
        };
        let request = client.tokens().create_token(&config).unwrap();
        assert_eq!(path(&request), "/tokens/v2/alice");
        assert_eq!(
            request.body(),
            Some(&RequestBody::Json(json!({
                "note": "ci",
                "scopes": ["styles:read"],
                "allowedUrls": ["https://example.com"]
            })))
        );
    }

    #[test]
    fn temporary_token_expiry_is_rfc3339() {
        let (client, _) = client();
        let config = CreateTemporaryToken {
            expires: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
            scopes: vec!["styles:read".to_string()],
        };
        let request = client.tokens().create_temporary_token(&config).unwrap();
        let Some(RequestBody::Json(body)) = request.body() else {
            panic!("expected a JSON body");
        };
        assert_eq!(body["expires"], "2024-05-01T12:30:00Z");
        let no_scopes = CreateTemporaryToken {
            scopes: Vec::new(),
            ..config
        };
        assert!(client.tokens().create_temporary_token(&no_scopes).is_err());
    }

    #[test]
    fn update_and_delete_paths() {
        let (client, _) = client();
        let tokens = client.tokens();
        let update = tokens
            .update_token(&UpdateToken {
                note: Some("renamed".to_string()),
                ..UpdateToken::new("tok1")
            })
            .unwrap();
        assert_eq!(update.method(), HttpMethod::Patch);
        assert_eq!(path(&update), "/tokens/v2/alice/tok1");
        let delete = tokens.delete_token(&DeleteToken::new("tok1")).unwrap();
        assert_eq!(delete.method(), HttpMethod::Delete);
    }

    #[test]
    fn current_token_and_scopes() {
        let (client, _) = client();
        let tokens = client.tokens();
        assert_eq!(path(&tokens.get_token().unwrap()), "/tokens/v2");
        assert_eq!(path(&tokens.list_scopes().unwrap()), "/scopes/v1/alice");
        let list = tokens
            .list_tokens(&ListTokens {
                usage: Some(TokenUsage::Secret),
                ..ListTokens::default()
            })
            .unwrap();
        assert_eq!(query(&list, "usage").as_deref(), Some("sk"));
    }

    #[tokio::test]
    async fn decodes_token_status() {
        let (client, mock) = client();
        mock.push(HttpResponse::json(
            200,
            r#"{"code":"TokenValid","token":{"usage":"pk","user":"alice","authorization":"abc123"}}"#,
        ));
        let response = client.tokens().get_token().unwrap().send().await.unwrap();
        assert_eq!(response.body.code, "TokenValid");
        assert_eq!(response.body.token.usage, TokenUsage::Public);
        assert_eq!(response.body.token.user, "alice");
    }
}
