//! HTTP ledger gateway (JSON REST bridge to the contract registries).
//!
//! Mutating requests are HMAC-signed over `timestamp + method + path + body`
//! so the bridge can attribute them to this client; reads go unsigned.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use super::traits::{LedgerGateway, LedgerResult, TradeSubmission};
use crate::domain::{
    AdminPerformance, AdminStatus, Address, CapitalPool, PoolParams, TrustAgreement,
};
use crate::error::{LedgerError, PropdeskError, Result};
use crate::signing::RequestSigner;

const DEFAULT_LEDGER_API_BASE: &str = "https://bridge.propdesk.example/api/v1";

#[derive(Clone)]
pub struct HttpLedgerGateway {
    http: Client,
    base_url: String,
    signer: Option<RequestSigner>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl HttpLedgerGateway {
    pub fn new(base_url: Option<&str>, signer: Option<RequestSigner>) -> Result<Self> {
        let base_url = base_url
            .unwrap_or(DEFAULT_LEDGER_API_BASE)
            .trim_end_matches('/')
            .to_string();

        let http = Client::builder()
            .user_agent("propdesk-ledger-gateway/0.1")
            .build()
            .map_err(|e| {
                PropdeskError::Internal(format!("failed to build ledger HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            base_url,
            signer,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn auth_headers(&self, method: &Method, path: &str, body: &str) -> LedgerResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let Some(signer) = &self.signer else {
            return Ok(headers);
        };

        let timestamp = Utc::now().timestamp_millis().to_string();
        let payload = format!("{}{}{}{}", timestamp, method.as_str(), path, body);
        let signature = signer.sign(&payload);

        headers.insert(
            HeaderName::from_static("x-ledger-key"),
            HeaderValue::from_str(signer.key_id())
                .map_err(|e| LedgerError::Transport(format!("invalid API key header: {}", e)))?,
        );
        headers.insert(
            HeaderName::from_static("x-ledger-signature"),
            HeaderValue::from_str(&signature)
                .map_err(|e| LedgerError::Transport(format!("invalid signature header: {}", e)))?,
        );
        headers.insert(
            HeaderName::from_static("x-ledger-timestamp"),
            HeaderValue::from_str(&timestamp)
                .map_err(|e| LedgerError::Transport(format!("invalid timestamp header: {}", e)))?,
        );

        Ok(headers)
    }

    async fn request_json(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> LedgerResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        let body_text = body.as_ref().map(|b| b.to_string()).unwrap_or_default();

        let mut request = self.http.request(method.clone(), &url);
        if method != Method::GET {
            request = request.headers(self.auth_headers(&method, path, &body_text)?);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LedgerError::Transport(format!("{} {}: {}", method, path, e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(LedgerError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            let parsed: ErrorBody = response.json().await.unwrap_or(ErrorBody {
                code: None,
                message: None,
            });
            return Err(LedgerError::Rejected {
                code: parsed.code,
                reason: parsed
                    .message
                    .unwrap_or_else(|| format!("HTTP {} from {}", status, path)),
            });
        }

        response
            .json()
            .await
            .map_err(|e| LedgerError::Transport(format!("invalid JSON from {}: {}", path, e)))
    }

    fn field_str(value: &Value, field: &str) -> LedgerResult<String> {
        value
            .get(field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| LedgerError::Transport(format!("missing '{}' in ledger response", field)))
    }
}

#[async_trait]
impl LedgerGateway for HttpLedgerGateway {
    async fn register_identity(
        &self,
        address: &Address,
        credentials: &str,
        proof: &str,
    ) -> LedgerResult<()> {
        self.request_json(
            Method::POST,
            "/identity/register",
            Some(json!({
                "address": address,
                "credentials": credentials,
                "proof": proof,
            })),
        )
        .await?;
        Ok(())
    }

    async fn create_trust_agreement(
        &self,
        admin: &Address,
        user: &Address,
        terms_blob: &str,
        signature: &str,
    ) -> LedgerResult<String> {
        let value = self
            .request_json(
                Method::POST,
                "/agreements",
                Some(json!({
                    "admin_address": admin,
                    "user_address": user,
                    "terms": terms_blob,
                    "signature": signature,
                })),
            )
            .await?;
        Self::field_str(&value, "agreement_id")
    }

    async fn check_admin_status(&self, address: &Address) -> LedgerResult<AdminStatus> {
        let value = self
            .request_json(
                Method::GET,
                &format!("/admins/{}/status", address.as_str()),
                None,
            )
            .await?;
        let code = value
            .get("status")
            .and_then(Value::as_u64)
            .ok_or_else(|| LedgerError::Transport("missing 'status' in response".to_string()))?;
        AdminStatus::from_code(code as u8)
            .ok_or_else(|| LedgerError::Transport(format!("unknown admin status code {}", code)))
    }

    async fn get_admin_performance(&self, address: &Address) -> LedgerResult<AdminPerformance> {
        let value = self
            .request_json(
                Method::GET,
                &format!("/admins/{}/performance", address.as_str()),
                None,
            )
            .await?;
        serde_json::from_value(value)
            .map_err(|e| LedgerError::Transport(format!("invalid performance payload: {}", e)))
    }

    async fn verify_trust_agreement(&self, admin: &Address, user: &Address) -> LedgerResult<bool> {
        let value = self
            .request_json(
                Method::GET,
                &format!(
                    "/agreements/verify?admin={}&user={}",
                    admin.as_str(),
                    user.as_str()
                ),
                None,
            )
            .await?;
        Ok(value.get("verified").and_then(Value::as_bool).unwrap_or(false))
    }

    async fn find_trust_agreement(
        &self,
        admin: &Address,
        user: &Address,
    ) -> LedgerResult<Option<TrustAgreement>> {
        let result = self
            .request_json(
                Method::GET,
                &format!(
                    "/agreements/find?admin={}&user={}",
                    admin.as_str(),
                    user.as_str()
                ),
                None,
            )
            .await;
        match result {
            Ok(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| LedgerError::Transport(format!("invalid agreement payload: {}", e))),
            Err(LedgerError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_pool(
        &self,
        admin: &Address,
        total_amount: Decimal,
        params: &PoolParams,
    ) -> LedgerResult<String> {
        let value = self
            .request_json(
                Method::POST,
                "/pools",
                Some(json!({
                    "admin_address": admin,
                    "total_amount": total_amount,
                    "params": params,
                })),
            )
            .await?;
        Self::field_str(&value, "pool_id")
    }

    async fn get_pool(&self, pool_id: &str) -> LedgerResult<Option<CapitalPool>> {
        let result = self
            .request_json(Method::GET, &format!("/pools/{}", pool_id), None)
            .await;
        match result {
            Ok(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| LedgerError::Transport(format!("invalid pool payload: {}", e))),
            Err(LedgerError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list_pools(&self, admin: &Address) -> LedgerResult<Vec<CapitalPool>> {
        let value = self
            .request_json(
                Method::GET,
                &format!("/pools?admin={}", admin.as_str()),
                None,
            )
            .await?;
        serde_json::from_value(value)
            .map_err(|e| LedgerError::Transport(format!("invalid pool list payload: {}", e)))
    }

    async fn allocate_to_beginner(
        &self,
        trader: &Address,
        pool_id: &str,
        amount: Decimal,
    ) -> LedgerResult<()> {
        self.request_json(
            Method::POST,
            &format!("/pools/{}/allocations", pool_id),
            Some(json!({
                "trader_address": trader,
                "amount": amount,
            })),
        )
        .await?;
        Ok(())
    }

    async fn execute_trade(&self, submission: &TradeSubmission) -> LedgerResult<String> {
        let value = self
            .request_json(
                Method::POST,
                "/trades",
                Some(serde_json::to_value(submission).map_err(|e| {
                    LedgerError::Transport(format!("trade payload serialization: {}", e))
                })?),
            )
            .await?;
        Self::field_str(&value, "tx_ref")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let gw = HttpLedgerGateway::new(Some("https://ledger.test/api/"), None).unwrap();
        assert_eq!(gw.base_url(), "https://ledger.test/api");
    }

    #[test]
    fn unsigned_gateway_sends_no_auth_headers() {
        let gw = HttpLedgerGateway::new(None, None).unwrap();
        let headers = gw.auth_headers(&Method::POST, "/pools", "{}").unwrap();
        assert!(headers.is_empty());
    }

    #[test]
    fn signed_gateway_attaches_auth_headers() {
        let signer = RequestSigner::new("key-1".to_string(), "secret".to_string());
        let gw = HttpLedgerGateway::new(None, Some(signer)).unwrap();
        let headers = gw.auth_headers(&Method::POST, "/pools", "{}").unwrap();
        assert!(headers.contains_key("x-ledger-key"));
        assert!(headers.contains_key("x-ledger-signature"));
        assert!(headers.contains_key("x-ledger-timestamp"));
    }
}
