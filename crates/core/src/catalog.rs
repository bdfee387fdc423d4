//! Best-effort cover-art lookup against a remote game catalog.
//!
//! The catalog publishes its full app list as `{"applist":{"apps":[{appid, name}]}}`.
//! Searching downloads the list from the first reachable endpoint, filters it
//! client-side and derives cover URLs from the app ids. Failures never reach
//! the caller; they are logged and produce an empty result.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::{config::CatalogConfig, models::NewGame};

/// Reasons a single endpoint attempt failed.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Transport, timeout or body decoding failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-success HTTP status.
    #[error("endpoint returned {0}")]
    Status(reqwest::StatusCode),
    /// The document had no `applist.apps` array.
    #[error("response has no app list")]
    MissingAppList,
    /// No endpoint produced a usable response.
    #[error("all {0} catalog endpoints failed")]
    Exhausted(usize),
}

/// Raw catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogApp {
    /// Catalog identifier.
    pub appid: u64,
    /// Catalog display name; may be empty.
    #[serde(default, deserialize_with = "deserialize_name")]
    pub name: String,
}

fn deserialize_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
struct AppListDocument {
    applist: Option<AppList>,
}

#[derive(Debug, Deserialize)]
struct AppList {
    apps: Option<Vec<CatalogApp>>,
}

/// Search hit used to prefill a new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogCandidate {
    /// Catalog identifier.
    pub identifier: u64,
    /// Name shown to the user.
    pub display_name: String,
    /// Cover art URL derived from the identifier.
    pub cover_image_uri: String,
}

impl CatalogCandidate {
    /// Input for a new record with title and cover taken from this hit.
    pub fn to_new_game(&self) -> NewGame {
        NewGame {
            title: self.display_name.clone(),
            cover_image_uri: Some(self.cover_image_uri.clone()),
            ..NewGame::default()
        }
    }
}

/// HTTP client for the catalog.
pub struct CatalogClient {
    client: reqwest::Client,
    config: CatalogConfig,
}

impl CatalogClient {
    /// Build a client with the configured per-attempt timeout.
    pub fn new(config: CatalogConfig) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(format!("gamevault/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    /// Cover URL for `appid`.
    pub fn cover_url(&self, appid: u64) -> String {
        cover_url(&self.config.cover_url_template, appid)
    }

    /// Up to `max_results` candidates whose name contains `term`, ignoring case.
    ///
    /// Endpoints are tried in order and the first usable response wins, even
    /// when it has no matches. Any failure yields an empty list.
    pub async fn search(&self, term: &str) -> Vec<CatalogCandidate> {
        let term = term.trim();
        if term.is_empty() {
            return Vec::new();
        }
        match self.fetch_first_available().await {
            Ok(apps) => {
                let candidates: Vec<CatalogCandidate> =
                    match_apps(apps, term, self.config.max_results)
                        .into_iter()
                        .map(|app| CatalogCandidate {
                            identifier: app.appid,
                            cover_image_uri: self.cover_url(app.appid),
                            display_name: app.name,
                        })
                        .collect();
                debug!(%term, hits = candidates.len(), "Catalog search finished");
                candidates
            }
            Err(err) => {
                error!(%term, %err, "Catalog search failed");
                Vec::new()
            }
        }
    }

    async fn fetch_first_available(&self) -> Result<Vec<CatalogApp>, LookupError> {
        for endpoint in &self.config.endpoints {
            match self.fetch_apps(endpoint).await {
                Ok(apps) => return Ok(apps),
                Err(err) => warn!(%endpoint, %err, "Catalog endpoint failed, trying next"),
            }
        }
        Err(LookupError::Exhausted(self.config.endpoints.len()))
    }

    async fn fetch_apps(&self, endpoint: &str) -> Result<Vec<CatalogApp>, LookupError> {
        let response = self.client.get(endpoint).send().await?;
        if !response.status().is_success() {
            return Err(LookupError::Status(response.status()));
        }
        let document: AppListDocument = response.json().await?;
        document
            .applist
            .and_then(|list| list.apps)
            .ok_or(LookupError::MissingAppList)
    }
}

/// Render `template`, replacing `{appid}`.
pub fn cover_url(template: &str, appid: u64) -> String {
    template.replace("{appid}", &appid.to_string())
}

/// Case-insensitive substring filter in catalog order, capped at `limit`.
/// Entries without a name never match.
pub fn match_apps(apps: Vec<CatalogApp>, term: &str, limit: usize) -> Vec<CatalogApp> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    apps.into_iter()
        .filter(|app| !app.name.is_empty() && app.name.to_lowercase().contains(&needle))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    fn app(appid: u64, name: &str) -> CatalogApp {
        CatalogApp {
            appid,
            name: name.to_string(),
        }
    }

    /// Serve `body` with `status` to every connection on a loopback port.
    async fn serve(status: &'static str, body: String) -> Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        Ok(format!("http://{addr}/applist"))
    }

    /// An address that refuses connections.
    async fn dead_endpoint() -> Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        drop(listener);
        Ok(format!("http://{addr}/applist"))
    }

    fn client(endpoints: Vec<String>) -> Result<CatalogClient> {
        Ok(CatalogClient::new(CatalogConfig {
            endpoints,
            timeout_secs: 2,
            max_results: 15,
            cover_url_template: "https://covers.example/{appid}.jpg".to_string(),
        })?)
    }

    const APP_LIST: &str = r#"{"applist":{"apps":[
        {"appid": 367520, "name": "Hollow Knight"},
        {"appid": 1, "name": ""},
        {"appid": 1030300, "name": "Hollow Knight: Silksong"},
        {"appid": 504230, "name": "Celeste"}
    ]}}"#;

    #[test]
    fn matches_case_insensitively_in_catalog_order() {
        let apps = vec![
            app(1, "Portal"),
            app(2, ""),
            app(3, "Portal 2"),
            app(4, "Half-Life"),
        ];
        let hits = match_apps(apps.clone(), "PORTAL", 15);
        assert_eq!(hits, vec![app(1, "Portal"), app(3, "Portal 2")]);
        assert_eq!(match_apps(apps.clone(), "portal", 1).len(), 1);
        assert!(match_apps(apps, " ", 15).is_empty());
    }

    #[test]
    fn caps_results_at_limit() {
        let apps: Vec<_> = (0..40).map(|n| app(n, &format!("Doom {n}"))).collect();
        assert_eq!(match_apps(apps, "doom", 15).len(), 15);
    }

    #[test]
    fn renders_cover_template() {
        assert_eq!(
            cover_url("https://cdn/{appid}/cover.jpg", 620),
            "https://cdn/620/cover.jpg"
        );
    }

    #[test]
    fn candidate_prefills_new_game() {
        let candidate = CatalogCandidate {
            identifier: 620,
            display_name: "Portal 2".into(),
            cover_image_uri: "https://cdn/620.jpg".into(),
        };
        let input = candidate.to_new_game();
        assert_eq!(input.title, "Portal 2");
        assert_eq!(input.cover_image_uri.as_deref(), Some("https://cdn/620.jpg"));
    }

    #[tokio::test]
    async fn falls_back_to_next_endpoint() -> Result<()> {
        let dead = dead_endpoint().await?;
        let broken = serve("500 Internal Server Error", "oops".to_string()).await?;
        let live = serve("200 OK", APP_LIST.to_string()).await?;
        let client = client(vec![dead, broken, live])?;

        let hits = client.search("hollow").await;
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].identifier, 367520);
        assert_eq!(hits[0].display_name, "Hollow Knight");
        assert_eq!(hits[0].cover_image_uri, "https://covers.example/367520.jpg");
        Ok(())
    }

    #[tokio::test]
    async fn document_without_app_list_is_skipped() -> Result<()> {
        let empty = serve("200 OK", r#"{"applist":{}}"#.to_string()).await?;
        let live = serve("200 OK", APP_LIST.to_string()).await?;
        let client = client(vec![empty, live])?;
        assert_eq!(client.search("celeste").await.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn null_names_are_skipped_not_fatal() -> Result<()> {
        let body = r#"{"applist":{"apps":[
            {"appid": 1, "name": null},
            {"appid": 367520, "name": "Hollow Knight"}
        ]}}"#;
        let live = serve("200 OK", body.to_string()).await?;
        let client = client(vec![live])?;

        let hits = client.search("hollow").await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].identifier, 367520);
        Ok(())
    }

    #[tokio::test]
    async fn no_matches_is_empty_not_error() -> Result<()> {
        let live = serve("200 OK", APP_LIST.to_string()).await?;
        let client = client(vec![live])?;
        assert!(client.search("zzzz-no-such-game").await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn all_endpoints_failing_yields_empty() -> Result<()> {
        let client = client(vec![dead_endpoint().await?, dead_endpoint().await?])?;
        assert!(client.search("hollow").await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn blank_term_skips_network() -> Result<()> {
        let client = client(Vec::new())?;
        assert!(client.search("   ").await.is_empty());
        Ok(())
    }
}
