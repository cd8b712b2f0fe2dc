use crate::clubos_api::models::conversation::{Conversation, ConversationCount};
use crate::clubos_api::models::device_record::DeviceRecord;
use crate::clubos_api::models::door_status::DoorStatus;
use crate::clubos_api::models::request::action_request::ScriptRequest;
use crate::clubos_api::models::request::door_request::{DoorRequest, EmergencyRequest};
use crate::clubos_api::models::request::task_request::NewTask;
use crate::clubos_api::models::request::ticket_request::{
    TicketCommentRequest, TicketFilter, TicketStatusRequest,
};
use crate::clubos_api::models::response::door_status_response::DoorStatusResponse;
use crate::clubos_api::models::response::envelope::ApiEnvelope;
use crate::clubos_api::models::response::receipt_upload_response::ReceiptUploadResponse;
use crate::clubos_api::models::response::system_status_response::SystemStatus;
use crate::clubos_api::models::script::NinjaOneScript;
use crate::clubos_api::models::task::Task;
use crate::clubos_api::models::ticket::{Ticket, TicketComment, TicketStatus};
use crate::error::ApiError;
use anyhow::Context;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct ClubOsClient {
    client: reqwest::Client,
    base_url: String,
}

impl ClubOsClient {
    pub fn new(base_url: &str, token: &str) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .context("API token is not a valid header value")?,
        );

        Ok(Self {
            client: reqwest::Client::builder()
                .default_headers(headers)
                .build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn conversation_count(&self) -> anyhow::Result<u64> {
        let response = self.conversation_count_request().send().await?;
        let count: ConversationCount = read_data(response).await?;
        Ok(count.count)
    }

    pub async fn recent_conversations(&self, limit: usize) -> anyhow::Result<Vec<Conversation>> {
        let response = self.recent_conversations_request(limit).send().await?;
        read_data(response).await
    }

    pub async fn list_tasks(&self) -> anyhow::Result<Vec<Task>> {
        let response = self.list_tasks_request().send().await?;
        read_data(response).await
    }

    pub async fn create_task(&self, task: &NewTask) -> anyhow::Result<Task> {
        let response = self.create_task_request(task).send().await?;
        read_data(response).await
    }

    pub async fn system_status(&self) -> anyhow::Result<SystemStatus> {
        let response = self.system_status_request().send().await?;
        read_data(response).await
    }

    pub async fn upload_receipt(&self, path: &Path) -> anyhow::Result<ReceiptUploadResponse> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("{} has no usable file name", path.display()))?
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Unable to read {}", path.display()))?;

        let response = self.upload_receipt_request(file_name, bytes).send().await?;
        read_data(response).await
    }

    pub async fn list_tickets(&self, filter: &TicketFilter) -> anyhow::Result<Vec<Ticket>> {
        let response = self.list_tickets_request(filter).send().await?;
        read_data(response).await
    }

    pub async fn update_ticket_status(
        &self,
        ticket_id: &str,
        status: TicketStatus,
    ) -> anyhow::Result<Option<String>> {
        let response = self
            .update_ticket_status_request(ticket_id, status)
            .send()
            .await?;
        read_message(response).await
    }

    pub async fn add_ticket_comment(
        &self,
        ticket_id: &str,
        text: &str,
    ) -> anyhow::Result<TicketComment> {
        let response = self
            .add_ticket_comment_request(ticket_id, text)
            .send()
            .await?;
        read_data(response).await
    }

    pub async fn delete_ticket(&self, ticket_id: &str) -> anyhow::Result<Option<String>> {
        let response = self.delete_ticket_request(ticket_id).send().await?;
        read_message(response).await
    }

    fn conversation_count_request(&self) -> RequestBuilder {
        self.client.get(self.url("/openphone/conversations/count"))
    }

    fn recent_conversations_request(&self, limit: usize) -> RequestBuilder {
        self.client
            .get(self.url("/openphone/recent-conversations"))
            .query(&[("limit", limit)])
    }

    fn list_tasks_request(&self) -> RequestBuilder {
        self.client.get(self.url("/tasks"))
    }

    fn create_task_request(&self, task: &NewTask) -> RequestBuilder {
        self.client.post(self.url("/tasks")).json(task)
    }

    fn list_scripts_request(&self) -> RequestBuilder {
        self.client.get(self.url("/ninjaone/scripts"))
    }

    fn system_status_request(&self) -> RequestBuilder {
        self.client.get(self.url("/system-status"))
    }

    fn upload_receipt_request(&self, file_name: String, bytes: Vec<u8>) -> RequestBuilder {
        let part = Part::bytes(bytes).file_name(file_name);
        let form = Form::new().part("file", part);
        self.client.post(self.url("/receipts/upload")).multipart(form)
    }

    fn list_tickets_request(&self, filter: &TicketFilter) -> RequestBuilder {
        self.client.get(self.url("/tickets")).query(filter)
    }

    fn update_ticket_status_request(&self, ticket_id: &str, status: TicketStatus) -> RequestBuilder {
        self.client
            .patch(self.url(&format!("/tickets/{}/status", ticket_id)))
            .json(&TicketStatusRequest { status })
    }

    fn add_ticket_comment_request(&self, ticket_id: &str, text: &str) -> RequestBuilder {
        self.client
            .post(self.url(&format!("/tickets/{}/comments", ticket_id)))
            .json(&TicketCommentRequest {
                text: text.to_string(),
            })
    }

    fn delete_ticket_request(&self, ticket_id: &str) -> RequestBuilder {
        self.client
            .delete(self.url(&format!("/tickets/{}", ticket_id)))
    }
}

impl RemoteApiTrait for ClubOsClient {
    async fn get_door_status(&self, location: &str) -> anyhow::Result<Vec<DoorStatus>> {
        let response = self
            .client
            .get(self.url("/door-access/status"))
            .query(&[("location", location)])
            .send()
            .await?;
        let status: DoorStatusResponse = read_data(response).await?;
        Ok(status.doors)
    }

    async fn get_bay_status(&self, location: &str) -> anyhow::Result<SystemStatus> {
        let response = self
            .client
            .get(self.url("/system-status"))
            .query(&[("location", location)])
            .send()
            .await?;
        read_data(response).await
    }

    async fn get_devices(&self) -> anyhow::Result<Vec<DeviceRecord>> {
        let response = self
            .client
            .get(self.url("/ninjaone/devices"))
            .send()
            .await?;
        read_data(response).await
    }

    async fn list_scripts(&self) -> anyhow::Result<Vec<NinjaOneScript>> {
        let response = self.list_scripts_request().send().await?;
        read_data(response).await
    }

    async fn execute_script(&self, payload: ScriptRequest) -> anyhow::Result<Option<String>> {
        debug!("Executing {} at {}", payload.action, payload.location);
        let response = self
            .client
            .post(self.url("/ninjaone/execute"))
            .json(&payload)
            .send()
            .await?;
        read_message(response).await
    }

    async fn unlock_door(&self, payload: DoorRequest) -> anyhow::Result<Option<String>> {
        let response = self
            .client
            .post(self.url("/door-access/unlock"))
            .json(&payload)
            .send()
            .await?;
        read_message(response).await
    }

    async fn lock_door(&self, payload: DoorRequest) -> anyhow::Result<Option<String>> {
        let response = self
            .client
            .post(self.url("/door-access/lock"))
            .json(&payload)
            .send()
            .await?;
        read_message(response).await
    }

    async fn emergency_unlock(&self, location: &str) -> anyhow::Result<Option<String>> {
        let response = self
            .client
            .post(self.url("/door-access/emergency"))
            .json(&EmergencyRequest::unlock_all(location))
            .send()
            .await?;
        read_message(response).await
    }
}

/// The part of the backend the remote-actions surface depends on.
///
/// Action methods resolve to the server's message, if it sent one.
pub trait RemoteApiTrait {
    fn get_door_status(
        &self,
        location: &str,
    ) -> impl Future<Output = anyhow::Result<Vec<DoorStatus>>> + Send;
    fn get_bay_status(
        &self,
        location: &str,
    ) -> impl Future<Output = anyhow::Result<SystemStatus>> + Send;
    fn get_devices(&self) -> impl Future<Output = anyhow::Result<Vec<DeviceRecord>>> + Send;
    fn list_scripts(&self) -> impl Future<Output = anyhow::Result<Vec<NinjaOneScript>>> + Send;
    fn execute_script(
        &self,
        payload: ScriptRequest,
    ) -> impl Future<Output = anyhow::Result<Option<String>>> + Send;
    fn unlock_door(
        &self,
        payload: DoorRequest,
    ) -> impl Future<Output = anyhow::Result<Option<String>>> + Send;
    fn lock_door(
        &self,
        payload: DoorRequest,
    ) -> impl Future<Output = anyhow::Result<Option<String>>> + Send;
    fn emergency_unlock(
        &self,
        location: &str,
    ) -> impl Future<Output = anyhow::Result<Option<String>>> + Send;
}

impl<T> RemoteApiTrait for Arc<T>
where
    T: RemoteApiTrait + Send + Sync,
{
    async fn get_door_status(&self, location: &str) -> anyhow::Result<Vec<DoorStatus>> {
        self.as_ref().get_door_status(location).await
    }

    async fn get_bay_status(&self, location: &str) -> anyhow::Result<SystemStatus> {
        self.as_ref().get_bay_status(location).await
    }

    async fn get_devices(&self) -> anyhow::Result<Vec<DeviceRecord>> {
        self.as_ref().get_devices().await
    }

    async fn list_scripts(&self) -> anyhow::Result<Vec<NinjaOneScript>> {
        self.as_ref().list_scripts().await
    }

    async fn execute_script(&self, payload: ScriptRequest) -> anyhow::Result<Option<String>> {
        self.as_ref().execute_script(payload).await
    }

    async fn unlock_door(&self, payload: DoorRequest) -> anyhow::Result<Option<String>> {
        self.as_ref().unlock_door(payload).await
    }

    async fn lock_door(&self, payload: DoorRequest) -> anyhow::Result<Option<String>> {
        self.as_ref().lock_door(payload).await
    }

    async fn emergency_unlock(&self, location: &str) -> anyhow::Result<Option<String>> {
        self.as_ref().emergency_unlock(location).await
    }
}

async fn read_data<T: DeserializeOwned>(response: Response) -> anyhow::Result<T> {
    let status = response.status();
    let contents = response.text().await?;
    decode_envelope::<T>(status, &contents)?
        .into_data()?
        .with_context(|| format!("Response carried no data. Body was: \"{}\"", contents))
}

async fn read_message(response: Response) -> anyhow::Result<Option<String>> {
    let status = response.status();
    let contents = response.text().await?;
    let envelope = decode_envelope::<serde_json::Value>(status, &contents)?;
    let message = envelope.server_message().map(str::to_string);
    envelope.into_data()?;
    Ok(message)
}

fn decode_envelope<T: DeserializeOwned>(
    status: StatusCode,
    contents: &str,
) -> anyhow::Result<ApiEnvelope<T>> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized.into());
    }
    if !status.is_success() {
        let message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(contents)
            .ok()
            .and_then(|e| e.server_message().map(str::to_string))
            .unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        }
        .into());
    }
    if contents.trim().is_empty() {
        return Ok(ApiEnvelope::empty());
    }
    serde_json::from_str(contents)
        .with_context(|| format!("Unable to deserialize response. Body was: \"{}\"", contents))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_maps_to_typed_error() {
        let err = decode_envelope::<serde_json::Value>(StatusCode::UNAUTHORIZED, "")
            .unwrap_err();
        assert!(ApiError::is_unauthorized(&err));
    }

    #[test]
    fn error_status_surfaces_server_message() {
        let err = decode_envelope::<serde_json::Value>(
            StatusCode::BAD_GATEWAY,
            r#"{"success": false, "message": "UniFi controller unreachable"}"#,
        )
        .unwrap_err();
        match err.downcast_ref::<ApiError>() {
            Some(ApiError::Status { status, message }) => {
                assert_eq!(*status, 502);
                assert_eq!(message, "UniFi controller unreachable");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn error_status_with_html_body_has_empty_message() {
        let err = decode_envelope::<serde_json::Value>(
            StatusCode::INTERNAL_SERVER_ERROR,
            "<html>oops</html>",
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::Status { status: 500, message }) if message.is_empty()
        ));
    }

    #[test]
    fn empty_success_body_is_accepted() {
        let envelope = decode_envelope::<serde_json::Value>(StatusCode::NO_CONTENT, "").unwrap();
        assert!(envelope.success);
        assert!(envelope.data.is_none());
    }

    #[test]
    fn door_status_payload_decodes() {
        let envelope = decode_envelope::<DoorStatusResponse>(
            StatusCode::OK,
            r#"{"success": true, "data": {"location": "Bedford", "doors": [
                {"doorId": "main", "name": "Main Entrance", "locked": true, "online": true},
                {"doorId": "staff", "name": "Staff Door", "locked": false, "online": false}
            ]}}"#,
        )
        .unwrap();
        let doors = envelope.into_data().unwrap().unwrap().doors;
        assert_eq!(doors.len(), 2);
        assert_eq!(doors[1].door_id, "staff");
        assert!(!doors[1].online);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ClubOsClient::new("http://localhost:3001/api/", "token").unwrap();
        assert_eq!(
            client.url("/door-access/status"),
            "http://localhost:3001/api/door-access/status"
        );
    }

    #[test]
    fn token_with_newline_is_rejected() {
        assert!(ClubOsClient::new("http://localhost", "bad\ntoken").is_err());
    }

    fn client() -> ClubOsClient {
        ClubOsClient::new("http://localhost:3001/api", "token").unwrap()
    }

    fn json_body(request: &reqwest::Request) -> serde_json::Value {
        let bytes = request.body().and_then(|b| b.as_bytes()).unwrap();
        serde_json::from_slice(bytes).unwrap()
    }

    #[test]
    fn read_only_requests_use_get() {
        let client = client();
        let cases = [
            (
                client.conversation_count_request(),
                "http://localhost:3001/api/openphone/conversations/count",
            ),
            (
                client.recent_conversations_request(5),
                "http://localhost:3001/api/openphone/recent-conversations?limit=5",
            ),
            (client.list_tasks_request(), "http://localhost:3001/api/tasks"),
            (
                client.list_scripts_request(),
                "http://localhost:3001/api/ninjaone/scripts",
            ),
            (
                client.system_status_request(),
                "http://localhost:3001/api/system-status",
            ),
        ];

        for (builder, url) in cases {
            let request = builder.build().unwrap();
            assert_eq!(request.method(), reqwest::Method::GET);
            assert_eq!(request.url().as_str(), url);
        }
    }

    #[test]
    fn create_task_posts_json() {
        let request = client()
            .create_task_request(&NewTask {
                title: "Replace projector bulb".to_string(),
                description: None,
            })
            .build()
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().path(), "/api/tasks");
        assert_eq!(
            json_body(&request),
            serde_json::json!({"title": "Replace projector bulb"})
        );
    }

    #[test]
    fn ticket_filter_goes_in_the_query() {
        let client = client();

        let request = client
            .list_tickets_request(&TicketFilter {
                status: Some(TicketStatus::InProgress),
                category: Some("facilities".to_string()),
            })
            .build()
            .unwrap();
        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.url().path(), "/api/tickets");
        assert_eq!(
            request.url().query(),
            Some("status=in-progress&category=facilities")
        );

        let request = client
            .list_tickets_request(&TicketFilter::default())
            .build()
            .unwrap();
        assert_eq!(request.url().as_str(), "http://localhost:3001/api/tickets");
    }

    #[test]
    fn ticket_updates_use_their_own_verbs() {
        let client = client();

        let request = client
            .update_ticket_status_request("t-42", TicketStatus::Resolved)
            .build()
            .unwrap();
        assert_eq!(request.method(), reqwest::Method::PATCH);
        assert_eq!(request.url().path(), "/api/tickets/t-42/status");
        assert_eq!(json_body(&request), serde_json::json!({"status": "resolved"}));

        let request = client
            .add_ticket_comment_request("t-42", "Bulb ordered")
            .build()
            .unwrap();
        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().path(), "/api/tickets/t-42/comments");
        assert_eq!(json_body(&request), serde_json::json!({"text": "Bulb ordered"}));

        let request = client.delete_ticket_request("t-42").build().unwrap();
        assert_eq!(request.method(), reqwest::Method::DELETE);
        assert_eq!(request.url().path(), "/api/tickets/t-42");
        assert!(request.body().is_none());
    }

    #[test]
    fn receipt_upload_is_multipart() {
        let request = client()
            .upload_receipt_request("receipt.pdf".to_string(), b"%PDF-1.4".to_vec())
            .build()
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().path(), "/api/receipts/upload");
        let content_type = request.headers()[reqwest::header::CONTENT_TYPE]
            .to_str()
            .unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        assert!(request.body().is_some());
    }
}
