use crate::config::GoogleSheetsConfig;
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::Mutex;

const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// 服务账号换取 OAuth token 的 JWT 断言
#[derive(Debug, Serialize)]
struct ServiceAccountClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendResponse {
    updates: Option<AppendUpdates>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendUpdates {
    updated_range: Option<String>,
}

struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// How cell input is interpreted by the Sheets API.
#[derive(Debug, Clone, Copy)]
pub enum ValueInputOption {
    Raw,
    UserEntered,
}

impl ValueInputOption {
    fn as_str(&self) -> &'static str {
        match self {
            ValueInputOption::Raw => "RAW",
            ValueInputOption::UserEntered => "USER_ENTERED",
        }
    }
}

/// Minimal Google Sheets v4 REST client authenticated as a service account.
pub struct GoogleSheetsClient {
    client: Client,
    config: GoogleSheetsConfig,
    token: Mutex<Option<CachedToken>>,
}

impl GoogleSheetsClient {
    pub fn new(config: GoogleSheetsConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self {
            client,
            config,
            token: Mutex::new(None),
        })
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.config.spreadsheet_id
    }

    pub fn spreadsheet_url(&self) -> String {
        format!(
            "https://docs.google.com/spreadsheets/d/{}/edit",
            self.config.spreadsheet_id
        )
    }

    /// Read a range; cells come back as display strings, trailing empty cells omitted.
    pub async fn get_values(&self, range: &str) -> AppResult<Vec<Vec<String>>> {
        let url = self.values_url(range, "")?;
        let token = self.access_token().await?;
        let response = self.client.get(url).bearer_auth(token).send().await?;
        let body: ValueRange = Self::check(response).await?.json().await?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    pub async fn update_values(
        &self,
        range: &str,
        values: Vec<Vec<String>>,
        input: ValueInputOption,
    ) -> AppResult<()> {
        let mut url = self.values_url(range, "")?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", input.as_str());
        let token = self.access_token().await?;
        let response = self
            .client
            .put(url)
            .bearer_auth(token)
            .json(&json!({ "range": range, "values": values }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Append rows after the last non-empty row of `range`; returns the updated range.
    pub async fn append_values(
        &self,
        range: &str,
        values: Vec<Vec<String>>,
        input: ValueInputOption,
    ) -> AppResult<Option<String>> {
        let mut url = self.values_url(range, ":append")?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", input.as_str());
        let token = self.access_token().await?;
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "values": values }))
            .send()
            .await?;
        let body: AppendResponse = Self::check(response).await?.json().await?;
        Ok(body.updates.and_then(|u| u.updated_range))
    }

    pub async fn clear_values(&self, range: &str) -> AppResult<()> {
        let url = self.values_url(range, ":clear")?;
        let token = self.access_token().await?;
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&json!({}))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Add a tab; fails if a tab with that title already exists.
    pub async fn add_sheet(&self, title: &str) -> AppResult<()> {
        let url = self.spreadsheet_url_with(":batchUpdate")?;
        let token = self.access_token().await?;
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&json!({
                "requests": [{ "addSheet": { "properties": { "title": title } } }]
            }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn access_token(&self) -> AppResult<String> {
        if let Some(token) = &self.config.access_token {
            return Ok(token.clone());
        }

        // 持锁刷新, 避免并发请求重复换取 token
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref()
            && token.expires_at > Utc::now()
        {
            return Ok(token.value.clone());
        }

        let now = Utc::now();
        let claims = ServiceAccountClaims {
            iss: &self.config.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.config.token_url,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let key = EncodingKey::from_rsa_pem(self.config.private_key.as_bytes())?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &key)?;

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        let token: TokenResponse = Self::check(response).await?.json().await?;

        log::info!(
            "Google service account token issued for {}, expires in {}s",
            self.config.client_email,
            token.expires_in
        );

        // 提前一分钟过期
        let expires_at = now + Duration::seconds(token.expires_in) - Duration::seconds(60);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at,
        });
        Ok(token.access_token)
    }

    fn values_url(&self, range: &str, suffix: &str) -> AppResult<Url> {
        let target = format!("{range}{suffix}");
        let mut url = self.base_url()?;
        url.path_segments_mut()
            .map_err(|_| AppError::ConfigError("invalid Google Sheets API base URL".into()))?
            .pop_if_empty()
            .extend(&[
                "v4",
                "spreadsheets",
                self.config.spreadsheet_id.as_str(),
                "values",
                target.as_str(),
            ]);
        Ok(url)
    }

    fn spreadsheet_url_with(&self, suffix: &str) -> AppResult<Url> {
        let target = format!("{}{suffix}", self.config.spreadsheet_id);
        let mut url = self.base_url()?;
        url.path_segments_mut()
            .map_err(|_| AppError::ConfigError("invalid Google Sheets API base URL".into()))?
            .pop_if_empty()
            .extend(&["v4", "spreadsheets", target.as_str()]);
        Ok(url)
    }

    fn base_url(&self) -> AppResult<Url> {
        Url::parse(&self.config.api_base_url)
            .map_err(|e| AppError::ConfigError(format!("invalid Google Sheets API base URL: {e}")))
    }

    async fn check(response: Response) -> AppResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        log::error!("Google Sheets API returned {status}: {error_text}");
        Err(AppError::ExternalApiError(format!(
            "Google Sheets API returned {status}: {error_text}"
        )))
    }
}

fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(server: &MockServer) -> GoogleSheetsConfig {
        GoogleSheetsConfig {
            spreadsheet_id: "sheet-1".to_string(),
            access_token: Some("test-token".to_string()),
            api_base_url: server.uri(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_get_values_stringifies_cells() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/spreadsheets/sheet-1/values/Inventory!A2:E"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "range": "Inventory!A2:E4",
                "values": [["kit", "Kit", "10", "3", "FALSE"], ["pin", "Pin", 5, 5]]
            })))
            .mount(&server)
            .await;

        let client = GoogleSheetsClient::new(test_config(&server)).unwrap();
        let rows = client.get_values("Inventory!A2:E").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][3], "3");
        assert_eq!(rows[1], vec!["pin", "Pin", "5", "5"]);
    }

    #[tokio::test]
    async fn test_get_values_empty_range() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "range": "Inventory!A2:E"
            })))
            .mount(&server)
            .await;

        let client = GoogleSheetsClient::new(test_config(&server)).unwrap();
        assert!(client.get_values("Inventory!A2:E").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_values() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/sheet-1/values/Sheet1!A:G:append"))
            .and(query_param("valueInputOption", "USER_ENTERED"))
            .and(body_json(json!({ "values": [["a", "b"]] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "updates": { "updatedRange": "Sheet1!A7:G7" }
            })))
            .mount(&server)
            .await;

        let client = GoogleSheetsClient::new(test_config(&server)).unwrap();
        let updated = client
            .append_values(
                "Sheet1!A:G",
                vec![vec!["a".to_string(), "b".to_string()]],
                ValueInputOption::UserEntered,
            )
            .await
            .unwrap();
        assert_eq!(updated.as_deref(), Some("Sheet1!A7:G7"));
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("PERMISSION_DENIED"))
            .mount(&server)
            .await;

        let client = GoogleSheetsClient::new(test_config(&server)).unwrap();
        let err = client.get_values("Inventory!A2:E").await.unwrap_err();
        assert!(matches!(err, AppError::ExternalApiError(msg) if msg.contains("403")));
    }
}
