use super::auth::GoogleAuth;
use super::{check_response, decode, transport};
use crate::error::ProviderError;
use crate::providers::{CellRef, SheetStore};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::sync::Arc;

const SERVICE: &str = "sheets";
const API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets/";

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Sheets client bound to the deployment's single spreadsheet.
pub struct SheetsClient {
    auth: Arc<GoogleAuth>,
    http: Client,
    spreadsheet_id: String,
}

impl SheetsClient {
    pub fn new(auth: Arc<GoogleAuth>, http: Client, spreadsheet_id: impl Into<String>) -> Self {
        Self {
            auth,
            http,
            spreadsheet_id: spreadsheet_id.into(),
        }
    }

    fn values_url(&self, range: &str, suffix: &str) -> Result<Url, ProviderError> {
        let mut url = Url::parse(API_BASE).map_err(|e| ProviderError::Decode {
            service: SERVICE,
            message: e.to_string(),
        })?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::Decode {
                service: SERVICE,
                message: "API base cannot carry path segments".to_string(),
            })?
            .pop_if_empty()
            .push(&self.spreadsheet_id)
            .push("values")
            .push(&format!("{range}{suffix}"));
        Ok(url)
    }
}

/// `0 -> A`, `25 -> Z`, `26 -> AA`.
pub fn column_letters(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

fn quoted_tab(tab: &str) -> String {
    format!("'{}'", tab.replace('\'', "''"))
}

/// A1 notation for a single zero-based cell.
pub fn cell_range(tab: &str, cell: CellRef) -> String {
    format!("{}!{}{}", quoted_tab(tab), column_letters(cell.column), cell.row + 1)
}

/// A1 notation for whole columns `A..` of a tab.
pub fn columns_range(tab: &str, columns: usize) -> String {
    format!(
        "{}!A:{}",
        quoted_tab(tab),
        column_letters(columns.saturating_sub(1))
    )
}

#[async_trait]
impl SheetStore for SheetsClient {
    async fn append_row(&self, tab: &str, row: Vec<String>) -> Result<(), ProviderError> {
        let token = self.auth.access_token().await?;
        let url = self.values_url(&format!("{}!A1", quoted_tab(tab)), ":append")?;
        let response = self
            .http
            .post(url)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .bearer_auth(token)
            .json(&serde_json::json!({ "values": [row] }))
            .send()
            .await
            .map_err(transport(SERVICE))?;
        check_response(SERVICE, response).await?;
        Ok(())
    }

    async fn read_tab(&self, tab: &str, columns: usize) -> Result<Vec<Vec<String>>, ProviderError> {
        let token = self.auth.access_token().await?;
        let url = self.values_url(&columns_range(tab, columns), "")?;
        let response = self
            .http
            .get(url)
            .query(&[("majorDimension", "ROWS")])
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport(SERVICE))?;
        let range: ValueRange = check_response(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(decode(SERVICE))?;
        Ok(range.values)
    }

    async fn update_cell(&self, tab: &str, cell: CellRef, value: &str) -> Result<(), ProviderError> {
        let token = self.auth.access_token().await?;
        let url = self.values_url(&cell_range(tab, cell), "")?;
        let response = self
            .http
            .put(url)
            .query(&[("valueInputOption", "RAW")])
            .bearer_auth(token)
            .json(&serde_json::json!({ "values": [[value]] }))
            .send()
            .await
            .map_err(transport(SERVICE))?;
        check_response(SERVICE, response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters_roll_over() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(15), "P");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(61), "BJ");
    }

    #[test]
    fn ranges_quote_tab_names() {
        assert_eq!(
            cell_range("MASTER LIST", CellRef { row: 1, column: 3 }),
            "'MASTER LIST'!D2"
        );
        assert_eq!(columns_range("MASTER LIST", 16), "'MASTER LIST'!A:P");
        assert_eq!(columns_range("Parent's tab", 1), "'Parent''s tab'!A:A");
    }

    #[test]
    fn values_url_encodes_range_segment() {
        let auth = GoogleAuth::from_key_json(
            r#"{"client_email": "svc@example.com", "private_key": "k"}"#,
            &[],
            None,
            Client::new(),
        )
        .unwrap();
        let client = SheetsClient::new(Arc::new(auth), Client::new(), "abc123");
        let url = client.values_url("'Grade 1'!A1", ":append").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/'Grade%201'!A1:append"
        );
    }
}
