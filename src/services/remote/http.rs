use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use super::{EventPatch, EventService, OutboundEvent, RemoteError};

/// REST client for the Event Service.
pub struct HttpEventService {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListResponse {
    Bare(Vec<Value>),
    Wrapped { events: Vec<Value> },
}

#[derive(Deserialize)]
struct CreatedResponse {
    id: Value,
}

impl HttpEventService {
    pub fn new(base_url: &str, api_token: Option<String>) -> Result<Self> {
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(anyhow!("Event Service URL must use HTTP(S)"));
        }

        // Background calls run without a timeout.
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .context("Failed to build Event Service HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id)
        )
    }

    fn event_url(&self, calendar_id: &str, server_id: &str) -> String {
        format!(
            "{}/{}",
            self.events_url(calendar_id),
            urlencoding::encode(server_id)
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = self
            .authorized(request)
            .send()
            .map_err(|err| RemoteError::Transport(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RemoteError::Status {
                code: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

/// Server ids arrive as strings or numbers.
fn id_to_string(id: &Value) -> Result<String, RemoteError> {
    match id {
        Value::String(text) if !text.is_empty() => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(RemoteError::Decode(format!("unusable event id {}", other))),
    }
}

impl EventService for HttpEventService {
    fn list_events(&self, calendar_id: &str) -> Result<Vec<Value>, RemoteError> {
        let response = self.send(self.client.get(self.events_url(calendar_id)))?;
        let parsed: ListResponse = response
            .json()
            .map_err(|err| RemoteError::Decode(err.to_string()))?;
        Ok(match parsed {
            ListResponse::Bare(events) | ListResponse::Wrapped { events } => events,
        })
    }

    fn create_event(&self, calendar_id: &str, event: &OutboundEvent) -> Result<String, RemoteError> {
        let response = self.send(self.client.post(self.events_url(calendar_id)).json(event))?;
        let created: CreatedResponse = response
            .json()
            .map_err(|err| RemoteError::Decode(err.to_string()))?;
        id_to_string(&created.id)
    }

    fn update_event(
        &self,
        calendar_id: &str,
        server_id: &str,
        patch: &EventPatch,
    ) -> Result<(), RemoteError> {
        self.send(
            self.client
                .patch(self.event_url(calendar_id, server_id))
                .json(patch),
        )?;
        Ok(())
    }

    fn delete_event(&self, calendar_id: &str, server_id: &str) -> Result<(), RemoteError> {
        self.send(self.client.delete(self.event_url(calendar_id, server_id)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejects_non_http_url() {
        assert!(HttpEventService::new("ftp://events.local", None).is_err());
    }

    #[test]
    fn test_urls_are_encoded() {
        let service = HttpEventService::new("https://api.example.com/", None).unwrap();
        assert_eq!(
            service.events_url("team cal"),
            "https://api.example.com/calendars/team%20cal/events"
        );
        assert_eq!(
            service.event_url("primary", "a/b"),
            "https://api.example.com/calendars/primary/events/a%2Fb"
        );
    }

    #[test]
    fn test_list_response_shapes() {
        let bare: ListResponse = serde_json::from_value(json!([{ "id": 1 }])).unwrap();
        let wrapped: ListResponse = serde_json::from_value(json!({ "events": [{ "id": 1 }, { "id": 2 }] })).unwrap();

        assert!(matches!(bare, ListResponse::Bare(ref e) if e.len() == 1));
        assert!(matches!(wrapped, ListResponse::Wrapped { ref events } if events.len() == 2));
    }

    #[test]
    fn test_id_to_string_accepts_numbers() {
        assert_eq!(id_to_string(&json!(42)).unwrap(), "42");
        assert_eq!(id_to_string(&json!("evt-1")).unwrap(), "evt-1");
        assert!(id_to_string(&json!(null)).is_err());
        assert!(id_to_string(&json!("")).is_err());
    }
}
