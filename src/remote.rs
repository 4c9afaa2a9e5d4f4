//! Remote inventory, admin and order collaborators.
//!
//! The wire contract is small: `GET` inventory returns a JSON array of raw
//! rows; the admin endpoints accept `{ "items": [...] }` with a bearer token;
//! the order endpoint accepts `{ "lines": [{ "sku", "quantity" }], "orderId" }`.
//! Error payloads carry an `error` string.

use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::config::Endpoints;
use crate::error::{Result, RivalsError};
use crate::models::{FulfillmentChange, InventoryItem, RawRow, SkuLine};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplaceResponse {
    pub ok: bool,
    #[serde(default)]
    pub replaced: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpsertResponse {
    pub ok: bool,
    #[serde(default)]
    pub added: usize,
    #[serde(default)]
    pub updated: usize,
    #[serde(default)]
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteOrderRequest {
    pub lines: Vec<SkuLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteOrderResponse {
    pub ok: bool,
    #[serde(default)]
    pub lines: Vec<FulfillmentChange>,
    #[serde(default)]
    pub order_id: Option<String>,
}

#[derive(Serialize)]
struct ItemsBody<'a> {
    items: &'a [InventoryItem],
}

// ---------------------------------------------------------------------------
// InventoryApi
// ---------------------------------------------------------------------------

/// The remote backend as seen by the client.
pub trait InventoryApi: Send + Sync {
    /// Fetch every raw inventory row.
    fn fetch_inventory(&self) -> Result<Vec<RawRow>>;

    /// Replace the server-held inventory with `items`.
    fn replace(&self, items: &[InventoryItem]) -> Result<ReplaceResponse>;

    /// Upsert `items` into the server-held inventory by sku.
    fn bulk_upsert(&self, items: &[InventoryItem]) -> Result<UpsertResponse>;

    /// Mirror a completed order on the server.
    fn complete_order(&self, request: &CompleteOrderRequest) -> Result<CompleteOrderResponse>;
}

// ---------------------------------------------------------------------------
// HttpInventoryApi
// ---------------------------------------------------------------------------

/// [`InventoryApi`] over HTTP with a bounded per-request timeout.
pub struct HttpInventoryApi {
    endpoints: Endpoints,
    client: Client,
}

impl HttpInventoryApi {
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { endpoints, client })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn require<'a>(value: &'a Option<String>, what: &str) -> Result<&'a str> {
        value
            .as_deref()
            .ok_or_else(|| RivalsError::NotConfigured(what.to_string()))
    }

    fn admin_post<T: DeserializeOwned>(
        &self,
        url: &Option<String>,
        what: &str,
        items: &[InventoryItem],
    ) -> Result<T> {
        let url = Self::require(url, what)?;
        let token = Self::require(&self.endpoints.admin_token, "admin token")?;
        tracing::info!(url, count = items.len(), "uploading inventory");
        let request = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&ItemsBody { items });
        send_json(request)
    }
}

/// Send a request and decode the JSON body, turning non-2xx statuses and
/// `{ "ok": false }` bodies into [`RivalsError::Remote`].
fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let resp = request.send()?;
    let status = resp.status();
    let text = resp.text()?;
    let body: Value = if text.trim().is_empty() {
        Value::Object(Default::default())
    } else if status.is_success() {
        serde_json::from_str(&text)?
    } else {
        serde_json::from_str(&text).unwrap_or(Value::Null)
    };

    let message = |fallback: String| {
        body.get("error")
            .and_then(|e| e.as_str())
            .map(str::to_string)
            .unwrap_or(fallback)
    };
    if !status.is_success() {
        return Err(RivalsError::Remote {
            status: status.as_u16(),
            message: message(format!("HTTP {}", status.as_u16())),
        });
    }
    if body.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        return Err(RivalsError::Remote {
            status: status.as_u16(),
            message: message("request rejected".to_string()),
        });
    }
    Ok(serde_json::from_value(body)?)
}

/// Keep the object elements of an inventory payload. A payload that is not
/// an array yields no rows.
pub fn rows_from_payload(payload: Value) -> Vec<RawRow> {
    match payload {
        Value::Array(values) => values
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

impl InventoryApi for HttpInventoryApi {
    fn fetch_inventory(&self) -> Result<Vec<RawRow>> {
        let url = Self::require(&self.endpoints.inventory_url, "inventory URL")?;
        tracing::debug!(url, "fetching inventory");
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RivalsError::Remote {
                status: status.as_u16(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }
        let payload: Value = resp.json()?;
        Ok(rows_from_payload(payload))
    }

    fn replace(&self, items: &[InventoryItem]) -> Result<ReplaceResponse> {
        self.admin_post(&self.endpoints.replace_url, "admin replace URL", items)
    }

    fn bulk_upsert(&self, items: &[InventoryItem]) -> Result<UpsertResponse> {
        self.admin_post(&self.endpoints.bulk_upsert_url, "admin bulk-upsert URL", items)
    }

    fn complete_order(&self, request: &CompleteOrderRequest) -> Result<CompleteOrderResponse> {
        let url = Self::require(&self.endpoints.orders_complete_url, "orders complete URL")?;
        if request.lines.is_empty() {
            return Err(RivalsError::InvalidArgument("No lines provided".into()));
        }
        send_json(self.client.post(url).json(request))
    }
}
