use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::store::ClientNotification;
use crate::wire::WireNotification;

/// REST access to the caller's notifications.
#[derive(Debug, Clone)]
pub struct NotificationApi {
    http: Client,
    base_url: String,
    token: String,
}

impl NotificationApi {
    pub fn new(http: Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/notification{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> ClientResult<Value> {
        let resp: Response = request.bearer_auth(&self.token).send().await?;
        let resp = resp.error_for_status()?;
        Ok(resp.json().await?)
    }

    pub async fn list(&self) -> ClientResult<Vec<ClientNotification>> {
        let body = self.send(self.http.get(self.url(""))).await?;
        parse_list(body)
    }

    pub async fn unread_count(&self) -> ClientResult<u64> {
        let body = self.send(self.http.get(self.url("/unread-count"))).await?;
        parse_unread_count(&body)
    }

    pub async fn mark_read(&self, id: &str) -> ClientResult<()> {
        self.send(self.http.put(self.url(&format!("/{id}/read")))).await?;
        debug!(%id, "Notification marked read on server");
        Ok(())
    }

    pub async fn mark_all_read(&self) -> ClientResult<u64> {
        let body = self.send(self.http.put(self.url("/read-all"))).await?;
        Ok(lookup(&body, &["updated"]).unwrap_or(0))
    }

    pub async fn delete(&self, id: &str) -> ClientResult<()> {
        self.send(self.http.delete(self.url(&format!("/{id}")))).await?;
        Ok(())
    }
}

/// Accepts the list bare or nested under `data`.
pub fn parse_list(body: Value) -> ClientResult<Vec<ClientNotification>> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(ClientError::UnexpectedResponse(
                    "notification list missing".to_string(),
                ));
            }
        },
        other => {
            return Err(ClientError::UnexpectedResponse(format!(
                "notification list is {other}"
            )));
        }
    };

    items
        .into_iter()
        .map(|item| Ok(serde_json::from_value::<WireNotification>(item)?.into()))
        .collect()
}

/// Accepts `unread_count` or `count`, at the top level or under `data`.
pub fn parse_unread_count(body: &Value) -> ClientResult<u64> {
    lookup(body, &["unread_count", "count"])
        .or_else(|| body.as_u64())
        .ok_or_else(|| ClientError::UnexpectedResponse(format!("no unread count in {body}")))
}

fn lookup(body: &Value, keys: &[&str]) -> Option<u64> {
    [body, &body["data"]]
        .into_iter()
        .find_map(|scope| keys.iter().find_map(|key| scope[*key].as_u64()))
}
