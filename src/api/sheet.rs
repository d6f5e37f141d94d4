//! Implements the `Sheet` trait against the Google Sheets v4 API.
//!
//! Value reads, writes and clears go through the `sheets::Client`. The calls it does not cover
//! for us (`values:batchGet`, spreadsheet metadata and the `:batchUpdate` sheet requests used to
//! duplicate, rename and hide tabs) are made directly with `reqwest` using the same access token.

use crate::api::{Sheet, Tab, TokenProvider, ValueInput};
use crate::model::A1Range;
use crate::Result;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use sheets::types::{
    BatchClearValuesRequest, BatchUpdateValuesRequest, DateTimeRenderOption, Dimension,
    ValueInputOption, ValueRange, ValueRenderOption,
};
use sheets::ClientError;
use tracing::trace;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Implements the `Sheet` trait for one Google spreadsheet, authenticating every call with a
/// token from its `TokenProvider`.
#[derive(Debug)]
pub struct GoogleSheet {
    spreadsheet_id: String,
    token_provider: TokenProvider,
    http: reqwest::Client,
}

impl GoogleSheet {
    pub fn new(spreadsheet_id: impl Into<String>, token_provider: TokenProvider) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            token_provider,
            http: reqwest::Client::new(),
        }
    }

    /// Creates a sheets client carrying a fresh access token.
    async fn client(&self) -> Result<sheets::Client> {
        let access_token = self.token_provider.token().await?;

        // Note: The sheets crate requires client_id, client_secret, and redirect_uri,
        // but we don't need them for API calls, only the access token
        Ok(sheets::Client::new(
            String::new(), // client_id
            String::new(), // client_secret
            String::new(), // redirect_uri
            access_token,
            String::new(), // refresh_token (the token provider refreshes for us)
        ))
    }

    /// Sends `request` with a bearer token and parses the JSON body of a successful response.
    async fn send<T>(&self, request: reqwest::RequestBuilder, what: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let token = self.token_provider.token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("Failed to send {what} request to the Google Sheets API"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            anyhow::bail!("Google Sheets API {what} failed with status {status}: {body}");
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse Google Sheets API {what} response"))
    }

    /// Runs a single `:batchUpdate` request and returns its reply.
    async fn batch_update(&self, request: serde_json::Value, what: &str) -> Result<Reply> {
        let url = format!("{SHEETS_API}/{}:batchUpdate", self.spreadsheet_id);
        let body = json!({ "requests": [request] });
        let response: BatchUpdateResponse = self.send(self.http.post(&url).json(&body), what).await?;
        Ok(response.replies.into_iter().next().unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl Sheet for GoogleSheet {
    async fn batch_get(&self, ranges: &[A1Range]) -> Result<Vec<Vec<Vec<String>>>> {
        trace!("batch_get for {ranges:?}");
        let url = format!("{SHEETS_API}/{}/values:batchGet", self.spreadsheet_id);
        let mut query: Vec<(&str, String)> = ranges
            .iter()
            .map(|range| ("ranges", range.to_string()))
            .collect();
        query.push(("majorDimension", "ROWS".to_string()));
        query.push(("valueRenderOption", "FORMATTED_VALUE".to_string()));

        let response: BatchGetResponse = self
            .send(self.http.get(&url).query(&query), "values:batchGet")
            .await
            .with_context(|| format!("Failed to fetch ranges {ranges:?}"))?;

        let mut grids: Vec<Vec<Vec<String>>> = response
            .value_ranges
            .into_iter()
            .map(|value_range| {
                value_range
                    .values
                    .into_iter()
                    .map(|row| row.iter().map(cell_text).collect())
                    .collect()
            })
            .collect();
        // The API returns one value range per requested range; pad defensively so callers can
        // index by request position.
        grids.resize_with(ranges.len(), Vec::new);
        Ok(grids)
    }

    async fn get(&self, range: &A1Range) -> Result<Vec<Vec<String>>> {
        trace!("get for {range}");
        let response = self
            .client()
            .await?
            .spreadsheets()
            .values_get(
                &self.spreadsheet_id,
                &range.to_string(),
                DateTimeRenderOption::FormattedString,
                Dimension::Rows,
                ValueRenderOption::FormattedValue,
            )
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to fetch {range}"))?;
        Ok(response.body.values)
    }

    async fn update(
        &self,
        range: &A1Range,
        values: Vec<Vec<String>>,
        input: ValueInput,
    ) -> Result<()> {
        trace!("update for {range}");
        let value_input_option = match input {
            ValueInput::UserEntered => ValueInputOption::UserEntered,
            ValueInput::Raw => ValueInputOption::Raw,
        };
        let request = BatchUpdateValuesRequest {
            data: vec![ValueRange {
                major_dimension: Some(Dimension::Rows),
                range: range.to_string(),
                values,
            }],
            include_values_in_response: Some(false),
            response_date_time_render_option: None,
            response_value_render_option: None,
            value_input_option: Some(value_input_option),
        };

        self.client()
            .await?
            .spreadsheets()
            .values_batch_update(&self.spreadsheet_id, &request)
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to write {range}"))?;
        Ok(())
    }

    async fn clear(&self, ranges: &[A1Range]) -> Result<()> {
        trace!("clear for {ranges:?}");
        let request = BatchClearValuesRequest {
            ranges: ranges.iter().map(|r| r.to_string()).collect(),
        };
        self.client()
            .await?
            .spreadsheets()
            .values_batch_clear(&self.spreadsheet_id, &request)
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to clear ranges: {ranges:?}"))?;
        Ok(())
    }

    async fn tabs(&self) -> Result<Vec<Tab>> {
        let url = format!("{SHEETS_API}/{}", self.spreadsheet_id);
        let query = [("fields", "sheets.properties(sheetId,title,index,hidden)")];
        let response: SpreadsheetResponse = self
            .send(self.http.get(&url).query(&query), "spreadsheet get")
            .await?;
        Ok(response
            .sheets
            .into_iter()
            .map(|sheet| sheet.properties.into())
            .collect())
    }

    async fn duplicate_tab(&self, source_id: i64, index: i64, title: &str) -> Result<Tab> {
        let request = json!({
            "duplicateSheet": {
                "sourceSheetId": source_id,
                "insertSheetIndex": index,
                "newSheetName": title,
            }
        });
        let reply = self
            .batch_update(request, "duplicateSheet")
            .await
            .with_context(|| format!("Failed to duplicate sheet {source_id} as '{title}'"))?;
        let properties = reply
            .duplicate_sheet
            .context("The duplicateSheet reply did not describe the new sheet")?
            .properties;
        Ok(properties.into())
    }

    async fn rename_tab(&self, id: i64, title: &str) -> Result<()> {
        let request = json!({
            "updateSheetProperties": {
                "properties": { "sheetId": id, "title": title },
                "fields": "title",
            }
        });
        self.batch_update(request, "updateSheetProperties")
            .await
            .with_context(|| format!("Failed to rename sheet {id} to '{title}'"))?;
        Ok(())
    }

    async fn set_hidden(&self, id: i64, hidden: bool) -> Result<()> {
        let request = json!({
            "updateSheetProperties": {
                "properties": { "sheetId": id, "hidden": hidden },
                "fields": "hidden",
            }
        });
        self.batch_update(request, "updateSheetProperties")
            .await
            .with_context(|| format!("Failed to set hidden={hidden} on sheet {id}"))?;
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchGetResponse {
    #[serde(default)]
    value_ranges: Vec<JsonValueRange>,
}

#[derive(Debug, Default, Deserialize)]
struct JsonValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct SpreadsheetResponse {
    #[serde(default)]
    sheets: Vec<JsonSheet>,
}

#[derive(Debug, Default, Deserialize)]
struct JsonSheet {
    #[serde(default)]
    properties: SheetProperties,
}

/// Protobuf JSON omits fields holding their default value, so a sheet with id 0 at index 0 that is
/// not hidden may arrive with only its title.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    #[serde(default)]
    sheet_id: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    index: i64,
    #[serde(default)]
    hidden: bool,
}

impl From<SheetProperties> for Tab {
    fn from(p: SheetProperties) -> Self {
        Tab {
            id: p.sheet_id,
            title: p.title,
            index: p.index,
            hidden: p.hidden,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<Reply>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Reply {
    duplicate_sheet: Option<JsonSheet>,
}

/// Formatted values are strings, but be lenient about numbers and booleans.
fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn map_client_error(e: ClientError) -> anyhow::Error {
    let error_name = match &e {
        ClientError::EmptyRefreshToken => "EmptyRefreshToken".to_string(),
        ClientError::FromUtf8Error(inner) => format!("FromUtf8Error {inner}"),
        ClientError::UrlParserError(inner) => format!("UrlParserError {inner}"),
        ClientError::SerdeJsonError(inner) => format!("SerdeJsonError {inner}"),
        ClientError::ReqwestError(inner) => format!("ReqwestError {inner}"),
        ClientError::InvalidHeaderValue(inner) => format!("InvalidHeaderValue {inner}"),
        ClientError::ReqwestMiddleWareError(inner) => format!("ReqwestMiddleWareError {inner}"),
        ClientError::HttpError { .. } => "HttpError".to_string(),
        ClientError::Other(_) => "Other".to_string(),
    };
    anyhow::Error::new(e).context(error_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_batch_get_response() {
        let json = r#"{
            "spreadsheetId": "abc",
            "valueRanges": [
                {"range": "Logs!C1:C4", "majorDimension": "ROWS", "values": [["Creator"], [], ["alice"]]},
                {"range": "Logs!E1:E4", "majorDimension": "ROWS"}
            ]
        }"#;
        let response: BatchGetResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.value_ranges.len(), 2);
        assert_eq!(response.value_ranges[0].values.len(), 3);
        assert!(response.value_ranges[0].values[1].is_empty());
        assert!(response.value_ranges[1].values.is_empty());
    }

    #[test]
    fn test_parse_sheet_properties_with_defaults_omitted() {
        let json = r#"{
            "sheets": [
                {"properties": {"title": "JAN"}},
                {"properties": {"sheetId": 42, "title": "December ($10.00)", "index": 1, "hidden": true}}
            ]
        }"#;
        let response: SpreadsheetResponse = serde_json::from_str(json).unwrap();
        let tabs: Vec<Tab> = response.sheets.into_iter().map(|s| s.properties.into()).collect();
        assert_eq!(
            tabs[0],
            Tab {
                id: 0,
                title: "JAN".to_string(),
                index: 0,
                hidden: false
            }
        );
        assert_eq!(tabs[1].id, 42);
        assert!(tabs[1].hidden);
    }

    #[test]
    fn test_parse_duplicate_reply() {
        let json = r#"{
            "spreadsheetId": "abc",
            "replies": [{"duplicateSheet": {"properties": {"sheetId": 7, "title": "January ($1.00)", "index": 1}}}]
        }"#;
        let response: BatchUpdateResponse = serde_json::from_str(json).unwrap();
        let reply = response.replies.into_iter().next().unwrap();
        let tab: Tab = reply.duplicate_sheet.unwrap().properties.into();
        assert_eq!(tab.id, 7);
        assert_eq!(tab.index, 1);
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&json!("$1.00")), "$1.00");
        assert_eq!(cell_text(&json!(3)), "3");
        assert_eq!(cell_text(&json!(true)), "true");
        assert_eq!(cell_text(&serde_json::Value::Null), "");
    }
}
