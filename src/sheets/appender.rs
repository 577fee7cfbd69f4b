use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Url};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::auth::AcquireToken;
use crate::config::settings::SheetsSettings;
use crate::helpers::time::now_utc;
use crate::observability::metrics::{get_metrics, OUTCOME_FAILURE, OUTCOME_SUCCESS};
use crate::resilience::retry::RetrySettings;
use crate::sheets::error::SheetError;
use crate::sheets::form::{FormSubmission, FormType};
use crate::utils::constants::VALUE_INPUT_OPTION;

/// Appends form submissions as rows of a spreadsheet.
///
/// Each attempt acquires a token from `P` and then issues one append call.
/// The retry policy lives here; the token provider never retries.
#[derive(Debug, Clone)]
pub struct SheetAppender<P> {
    tokens: P,
    client: Client,
    base_url: String,
    spreadsheet_id: String,
    retry: RetrySettings,
}

impl<P> SheetAppender<P>
where
    P: AcquireToken + Send + Sync,
{
    pub fn new(tokens: P, spreadsheet_id: String, settings: &SheetsSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .context("failed to build sheets HTTP client")?;

        Ok(Self::with_client(tokens, client, settings.base_url.clone(), spreadsheet_id)
            .with_retry(RetrySettings::from(&settings.retry)))
    }

    pub fn with_client(tokens: P, client: Client, base_url: String, spreadsheet_id: String) -> Self {
        Self {
            tokens,
            client,
            base_url,
            spreadsheet_id,
            retry: RetrySettings::single_attempt(),
        }
    }

    pub fn with_retry(mut self, retry: RetrySettings) -> Self {
        self.retry = retry;
        self
    }

    /// `{base}/v4/spreadsheets/{id}/values/{sheet}!A1:append?valueInputOption=USER_ENTERED`
    pub fn append_url(&self, sheet_name: &str) -> Result<Url, SheetError> {
        let range = format!("{}!A1:append", sheet_name);
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SheetError::InvalidEndpoint(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| SheetError::InvalidEndpoint(self.base_url.clone()))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                range.as_str(),
            ]);
        url.query_pairs_mut()
            .append_pair("valueInputOption", VALUE_INPUT_OPTION);
        Ok(url)
    }

    pub async fn append(&self, submission: &FormSubmission) -> Result<(), SheetError> {
        let form_type = submission
            .form_type
            .as_deref()
            .and_then(FormType::parse)
            .ok_or_else(|| SheetError::InvalidFormType(submission.form_type.clone()))?;

        let row = submission.to_row(form_type, now_utc());
        let sheet_name = form_type.sheet_name();

        let this = self;
        let row = &row;
        let result = self
            .retry
            .run_with_retry(move || this.append_row(sheet_name, row), SheetError::is_retryable)
            .await;

        let metrics = get_metrics().await;
        let outcome = if result.is_ok() { OUTCOME_SUCCESS } else { OUTCOME_FAILURE };
        metrics
            .sheet_appends
            .with_label_values(&[form_type.as_str(), outcome])
            .inc();

        match &result {
            Ok(()) => info!(form_type = %form_type, sheet = sheet_name, "row appended"),
            Err(e) => warn!(form_type = %form_type, sheet = sheet_name, "append failed: {}", e),
        }
        result
    }

    async fn append_row(&self, sheet_name: &str, row: &[String]) -> Result<(), SheetError> {
        let token = self.tokens.acquire_token().await?;
        let url = self.append_url(sheet_name)?;

        debug!(%url, "appending row");
        let response = self
            .client
            .post(url)
            .bearer_auth(token.as_str())
            .json(&json!({ "values": [row] }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetError::AppendRejected { status, body });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthError;
    use crate::cache::token::AccessToken;

    struct NoToken;

    impl AcquireToken for NoToken {
        async fn acquire_token(&self) -> Result<AccessToken, AuthError> {
            Err(AuthError::InvalidKey("unused".into()))
        }
    }

    fn appender(base_url: &str) -> SheetAppender<NoToken> {
        SheetAppender::with_client(NoToken, Client::new(), base_url.to_owned(), "sheet-123".to_owned())
    }

    #[test]
    fn append_url_encodes_sheet_name() {
        let url = appender("https://sheets.googleapis.com")
            .append_url("AI Tools Night - Applications")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-123/values/AI%20Tools%20Night%20-%20Applications!A1:append?valueInputOption=USER_ENTERED"
        );
    }

    #[test]
    fn append_url_keeps_base_path() {
        let url = appender("http://127.0.0.1:9000/proxy/").append_url("Main Form").unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9000/proxy/v4/spreadsheets/sheet-123/values/Main%20Form!A1:append?valueInputOption=USER_ENTERED"
        );
    }

    #[test]
    fn bad_base_url_is_reported() {
        let err = appender("not a url").append_url("Main Form").unwrap_err();
        assert!(matches!(err, SheetError::InvalidEndpoint(_)));
    }
}
