//! Metadata API (GraphQL) workbook query
//!
//! The query text comes from `config/query.txt` and is sent verbatim. Two
//! result shapes are understood:
//! - `data.workbooks` - plain list, returned by a single call
//! - `data.workbooksConnection { nodes pageInfo { hasNextPage endCursor } }` -
//!   followed page by page, re-sending the query with `variables.after`

use super::auth::Session;
use super::client::{ensure_success, TableauClient, AUTH_HEADER};
use super::error::TableauError;
use super::types::{GraphQlRequest, GraphQlResponse};
use serde_json::{json, Value};

/// One response worth of workbook records
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WorkbookPage {
    pub workbooks: Vec<Value>,
    /// Cursor for the next page when the server reports more results
    pub next_cursor: Option<String>,
}

/// Run the workbook query and return the raw workbook objects in server order.
pub async fn fetch_workbooks(
    client: &TableauClient,
    session: &Session,
    query: &str,
) -> Result<Vec<Value>, TableauError> {
    let mut workbooks = Vec::new();
    let mut variables = json!({});
    let mut pages = 0usize;

    loop {
        let data = send_query(client, session, query, variables).await?;
        let page = parse_workbook_page(data)?;
        pages += 1;
        workbooks.extend(page.workbooks);

        match page.next_cursor {
            Some(cursor) => {
                log::debug!("Metadata page {} done, continuing after cursor {}", pages, cursor);
                variables = json!({ "after": cursor });
            }
            None => break,
        }
    }

    log::info!(
        "📚 Total number of workbooks: {} ({} metadata page{})",
        workbooks.len(),
        pages,
        if pages == 1 { "" } else { "s" }
    );
    Ok(workbooks)
}

async fn send_query(
    client: &TableauClient,
    session: &Session,
    query: &str,
    variables: Value,
) -> Result<Value, TableauError> {
    let response = client
        .http()
        .post(client.metadata_url())
        .header(AUTH_HEADER, &session.token)
        .json(&GraphQlRequest { query, variables })
        .send()
        .await?;
    let response = ensure_success(response, "Metadata query").await?;
    let body: GraphQlResponse = response.json().await?;

    if !body.errors.is_empty() {
        return Err(TableauError::GraphQl(
            body.errors.into_iter().map(|e| e.message).collect(),
        ));
    }

    body.data
        .ok_or_else(|| TableauError::MissingField("data".to_string()))
}

/// Pull the workbook list (and continuation cursor) out of a `data` object.
pub(crate) fn parse_workbook_page(mut data: Value) -> Result<WorkbookPage, TableauError> {
    if let Some(connection) = data.get_mut("workbooksConnection") {
        let workbooks = match connection.get_mut("nodes").map(Value::take) {
            Some(Value::Array(nodes)) => nodes,
            _ => {
                return Err(TableauError::MissingField(
                    "data.workbooksConnection.nodes".to_string(),
                ))
            }
        };

        let page_info = connection.get("pageInfo");
        let has_next = page_info
            .and_then(|p| p.get("hasNextPage"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let next_cursor = if has_next {
            let cursor = page_info
                .and_then(|p| p.get("endCursor"))
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    TableauError::MissingField(
                        "data.workbooksConnection.pageInfo.endCursor".to_string(),
                    )
                })?;
            Some(cursor.to_string())
        } else {
            None
        };

        return Ok(WorkbookPage {
            workbooks,
            next_cursor,
        });
    }

    match data.get_mut("workbooks").map(Value::take) {
        Some(Value::Array(workbooks)) => Ok(WorkbookPage {
            workbooks,
            next_cursor: None,
        }),
        _ => Err(TableauError::MissingField("data.workbooks".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_workbook_list() {
        let data = json!({"workbooks": [{"id": "wb-1"}, {"id": "wb-2"}]});
        let page = parse_workbook_page(data).unwrap();
        assert_eq!(page.workbooks.len(), 2);
        assert_eq!(page.workbooks[1]["id"], "wb-2");
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn test_parse_connection_with_next_page() {
        let data = json!({
            "workbooksConnection": {
                "nodes": [{"id": "wb-1"}],
                "pageInfo": {"hasNextPage": true, "endCursor": "abc=="}
            }
        });
        let page = parse_workbook_page(data).unwrap();
        assert_eq!(page.workbooks.len(), 1);
        assert_eq!(page.next_cursor.as_deref(), Some("abc=="));
    }

    #[test]
    fn test_parse_connection_last_page() {
        let data = json!({
            "workbooksConnection": {
                "nodes": [],
                "pageInfo": {"hasNextPage": false, "endCursor": null}
            }
        });
        let page = parse_workbook_page(data).unwrap();
        assert!(page.workbooks.is_empty());
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn test_parse_missing_workbooks() {
        let err = parse_workbook_page(json!({"datasources": []})).unwrap_err();
        assert!(matches!(err, TableauError::MissingField(f) if f == "data.workbooks"));
    }

    #[test]
    fn test_parse_next_page_without_cursor() {
        let data = json!({
            "workbooksConnection": {"nodes": [], "pageInfo": {"hasNextPage": true}}
        });
        assert!(matches!(
            parse_workbook_page(data),
            Err(TableauError::MissingField(_))
        ));
    }
}
