pub mod endpoints;
mod error;
mod http;
mod macros;
pub mod repositories;

// Always expose testing module (downstream crates test against it)
pub mod testing;

pub use crate::error::HttpError;
pub use crate::http::{HttpClient, ReqwestClient};
use endpoints::{CollectionResponse, DailyRecord, ListCollection};
use repositories::*;
use std::sync::Arc;

pub const BASE_URL: &str = "https://api.ouraring.com/v2";

/// Typed client for the `usercollection` endpoints
pub struct Client<H> {
    http: Arc<H>,
    base_url: String,
}

impl<H: HttpClient> Client<H> {
    pub fn new(http: Arc<H>) -> Self {
        Self::with_base_url(http, BASE_URL)
    }

    pub fn with_base_url(http: Arc<H>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch every record of a collection request.
    ///
    /// A body that is valid JSON but not shaped like `{ "data": [...] }` is
    /// reported as [`HttpError::Parse`].
    pub async fn send<T>(
        &self,
        access_token: &str,
        request: &ListCollection<T>,
    ) -> Result<Vec<T>, HttpError>
    where
        T: DailyRecord,
    {
        let url = format!("{}{}", self.base_url, request.endpoint());
        let body = self.http.get(&url, access_token).await?;
        let response: CollectionResponse<T> = serde_json::from_value(body)?;
        Ok(response.data)
    }
}

impl<H> Clone for Client<H> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
        }
    }
}

pub struct Request;

impl Request {
    pub fn daily_sleep() -> DailySleepRepository {
        CollectionRepository::new()
    }

    pub fn daily_readiness() -> DailyReadinessRepository {
        CollectionRepository::new()
    }

    pub fn daily_activity() -> DailyActivityRepository {
        CollectionRepository::new()
    }

    pub fn daily_stress() -> DailyStressRepository {
        CollectionRepository::new()
    }

    pub fn sleep() -> SleepPeriodRepository {
        CollectionRepository::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::FetchWindow;
    use crate::testing::ScriptedHttp;
    use chrono::NaiveDate;
    use serde_json::json;

    fn window() -> FetchWindow {
        FetchWindow::for_today(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap())
    }

    #[tokio::test]
    async fn send_builds_url_and_decodes_records() {
        let http = Arc::new(ScriptedHttp::new());
        http.respond(
            "daily_sleep",
            Ok(json!({ "data": [{ "day": "2024-01-03", "score": 81 }] })),
        );
        let client = Client::with_base_url(http.clone(), "https://example.test/v2/");

        let records = client
            .send("tok", &Request::daily_sleep().list(&window()))
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].score, Some(81));

        let requests = http.requests();
        assert_eq!(
            requests[0].url,
            "https://example.test/v2/usercollection/daily_sleep?start_date=2023-12-27&end_date=2024-01-04"
        );
        assert_eq!(requests[0].bearer_token.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn body_without_data_is_parse_error() {
        let http = Arc::new(ScriptedHttp::new());
        http.respond("daily_stress", Ok(json!({ "detail": "nope" })));
        let client = Client::new(http);

        let result = client
            .send("tok", &Request::daily_stress().list(&window()))
            .await;

        assert!(matches!(result, Err(HttpError::Parse(_))));
    }

    #[tokio::test]
    async fn unauthorized_passes_through() {
        let http = Arc::new(ScriptedHttp::new());
        http.respond("sleep", Err(HttpError::Unauthorized));
        let client = Client::new(http);

        let result = client.send("tok", &Request::sleep().list(&window())).await;

        assert_eq!(result.unwrap_err(), HttpError::Unauthorized);
    }
}
