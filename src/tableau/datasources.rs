//! Published data source listing and extract download

use super::auth::Session;
use super::client::{ensure_success, TableauClient, AUTH_HEADER};
use super::error::TableauError;
use super::types::{DatasourceListResponse, PublishedDatasource};
use std::path::Path;
use tokio::io::AsyncWriteExt;

const PAGE_SIZE: u64 = 100;

/// List every data source visible to the session, following REST pagination.
pub async fn list_datasources(
    client: &TableauClient,
    session: &Session,
) -> Result<Vec<PublishedDatasource>, TableauError> {
    let url = client.rest_url(&format!("sites/{}/datasources", session.site_id));
    let mut all = Vec::new();
    let mut page_number = 1u64;

    loop {
        let response = client
            .http()
            .get(&url)
            .header(AUTH_HEADER, &session.token)
            .query(&[("pageSize", PAGE_SIZE), ("pageNumber", page_number)])
            .send()
            .await?;
        let response = ensure_success(response, "List data sources").await?;
        let page: DatasourceListResponse = response.json().await?;

        let received = page.datasources.datasource.len();
        all.extend(page.datasources.datasource);

        if page.pagination.is_last_page() || received == 0 {
            log::debug!(
                "Listed {} data sources over {} page(s) (server reports {})",
                all.len(),
                page_number,
                page.pagination.total_available
            );
            break;
        }
        page_number += 1;
    }

    Ok(all)
}

/// Select the single data source named exactly `name`.
///
/// Zero matches and multiple matches are both errors; there is no tie-break.
pub fn find_unique_by_name<'a>(
    datasources: &'a [PublishedDatasource],
    name: &str,
) -> Result<&'a PublishedDatasource, TableauError> {
    let mut matches = datasources.iter().filter(|ds| ds.name == name);
    let first = matches
        .next()
        .ok_or_else(|| TableauError::DatasourceNotFound(name.to_string()))?;

    let extra = matches.count();
    if extra > 0 {
        return Err(TableauError::AmbiguousDatasource {
            name: name.to_string(),
            count: extra + 1,
        });
    }
    Ok(first)
}

/// Stream the packaged data source (`.tdsx`, extract included) to `target`.
///
/// Returns the number of bytes written.
pub async fn download_datasource(
    client: &TableauClient,
    session: &Session,
    datasource: &PublishedDatasource,
    target: &Path,
) -> Result<u64, TableauError> {
    let url = client.rest_url(&format!(
        "sites/{}/datasources/{}/content",
        session.site_id, datasource.id
    ));

    let response = client
        .http()
        .get(url)
        .header(AUTH_HEADER, &session.token)
        .query(&[("includeExtract", "true")])
        .send()
        .await?;
    let mut response = ensure_success(response, "Download data source").await?;

    let mut file = tokio::fs::File::create(target).await?;
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    log::info!(
        "📥 Downloaded '{}' ({} bytes) to {}",
        datasource.name,
        written,
        target.display()
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datasource(id: &str, name: &str) -> PublishedDatasource {
        PublishedDatasource {
            id: id.to_string(),
            name: name.to_string(),
            content_url: None,
            project: None,
        }
    }

    #[test]
    fn test_find_unique_by_name() {
        let list = vec![
            datasource("ds-1", "Sales Extract"),
            datasource("ds-2", "TS Events"),
            datasource("ds-3", "TS Events (copy)"),
        ];
        let found = find_unique_by_name(&list, "TS Events").unwrap();
        assert_eq!(found.id, "ds-2");
    }

    #[test]
    fn test_find_requires_exact_name() {
        let list = vec![datasource("ds-1", "ts events"), datasource("ds-2", "TS Events ")];
        assert!(matches!(
            find_unique_by_name(&list, "TS Events"),
            Err(TableauError::DatasourceNotFound(_))
        ));
    }

    #[test]
    fn test_find_rejects_duplicates() {
        let list = vec![
            datasource("ds-1", "TS Events"),
            datasource("ds-2", "Other"),
            datasource("ds-3", "TS Events"),
        ];
        match find_unique_by_name(&list, "TS Events") {
            Err(TableauError::AmbiguousDatasource { name, count }) => {
                assert_eq!(name, "TS Events");
                assert_eq!(count, 2);
            }
            other => panic!("expected ambiguity error, got {:?}", other),
        }
    }
}
