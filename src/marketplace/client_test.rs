use super::*;
use crate::marketplace::cache::MemoryCache;
use crate::marketplace::service::DownloadOutcome;
use crate::registry::InstalledPlugin;
use crate::registry::InstalledPlugins;
use serde_json::json;
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// モック用の応答
enum MockResponse {
    Ok(Value),
    NotAuthorized,
    RemoteError(String),
    Api { status: u16, message: String },
}

#[derive(Default)]
struct MockState {
    responses: Mutex<HashMap<String, MockResponse>>,
    /// 記録された (action, params)
    fetches: Mutex<Vec<(String, BTreeMap<String, String>)>>,
    downloads: Mutex<Vec<String>>,
    download_fails: Mutex<bool>,
}

/// テスト用モックゲートウェイ
#[derive(Clone, Default)]
struct MockService {
    state: Arc<MockState>,
}

impl MockService {
    fn new() -> Self {
        Self::default()
    }

    fn respond(self, action: &str, value: Value) -> Self {
        self.state
            .responses
            .lock()
            .unwrap()
            .insert(action.to_string(), MockResponse::Ok(value));
        self
    }

    fn respond_error(self, action: &str, response: MockResponse) -> Self {
        self.state
            .responses
            .lock()
            .unwrap()
            .insert(action.to_string(), response);
        self
    }

    fn with_download_failure(self) -> Self {
        *self.state.download_fails.lock().unwrap() = true;
        self
    }

    fn fetch_count(&self) -> usize {
        self.state.fetches.lock().unwrap().len()
    }

    fn fetches_of(&self, action: &str) -> Vec<BTreeMap<String, String>> {
        self.state
            .fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, _)| a == action)
            .map(|(_, params)| params.clone())
            .collect()
    }

    fn download_count(&self) -> usize {
        self.state.downloads.lock().unwrap().len()
    }

    fn result_for(&self, action: &str) -> Result<Value> {
        match self.state.responses.lock().unwrap().get(action) {
            Some(MockResponse::Ok(value)) => Ok(value.clone()),
            Some(MockResponse::NotAuthorized) => Err(MktError::NotAuthorized),
            Some(MockResponse::RemoteError(message)) => {
                Err(MktError::RemoteError(message.clone()))
            }
            Some(MockResponse::Api { status, message }) => Err(MktError::Api {
                status: *status,
                message: message.clone(),
            }),
            // 未設定のアクションは「存在しない」扱い
            None => Err(MktError::RemoteError(
                "Requested plugin does not exist.".to_string(),
            )),
        }
    }
}

impl MarketplaceService for MockService {
    fn authenticate(&mut self, _license_key: Option<String>) {}

    fn fetch<'a>(
        &'a self,
        action: &'a str,
        params: &'a BTreeMap<String, String>,
    ) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + 'a>> {
        self.state
            .fetches
            .lock()
            .unwrap()
            .push((action.to_string(), params.clone()));
        let result = self.result_for(action);
        Box::pin(async move { result })
    }

    fn download<'a>(
        &'a self,
        url: &'a str,
        target: &'a Path,
        _timeout: Option<Duration>,
    ) -> Pin<Box<dyn Future<Output = DownloadOutcome> + Send + 'a>> {
        self.state.downloads.lock().unwrap().push(url.to_string());

        let outcome = if *self.state.download_fails.lock().unwrap() {
            DownloadOutcome::Failed {
                message: "transfer interrupted".to_string(),
            }
        } else {
            match std::fs::write(target, b"archive") {
                Ok(()) => DownloadOutcome::Completed,
                Err(e) => DownloadOutcome::Failed {
                    message: e.to_string(),
                },
            }
        };

        Box::pin(async move { outcome })
    }

    fn domain(&self) -> &str {
        "https://plugins.pluginhub.io"
    }

    fn api_version(&self) -> &str {
        "2.0"
    }
}

fn build_client(service: &MockService) -> MarketplaceClient {
    MarketplaceClient::new(
        Box::new(service.clone()),
        Box::new(MemoryCache::new()),
        "5.3.0",
    )
}

fn plugin_info(name: &str) -> Value {
    json!({
        "name": name,
        "owner": "trustedorg",
        "isTheme": false,
        "numDownloads": 100,
        "versions": [
            {"name": "1.0", "release": "2016-01-01 00:00:00",
             "download": format!("/api/2.0/plugins/{}/download/1.0", name)},
            {"name": "1.1", "release": "2016-02-01 00:00:00",
             "download": format!("/api/2.0/plugins/{}/download/1.1", name),
             "requires": {"core": ">=3.0.0"}}
        ]
    })
}

fn installed(records: &[(&str, &str, bool)]) -> InstalledPlugins {
    InstalledPlugins::from_records(
        records
            .iter()
            .map(|(name, version, bundled)| InstalledPlugin {
                name: name.to_string(),
                version: version.to_string(),
                activated: true,
                bundled: *bundled,
            })
            .collect(),
    )
}

#[tokio::test]
async fn test_get_plugin_info_parses_record() {
    let service = MockService::new().respond("plugins/Foo/info", plugin_info("Foo"));
    let client = build_client(&service);

    let plugin = client.get_plugin_info("Foo").await.unwrap();

    assert_eq!(plugin.name, "Foo");
    assert_eq!(plugin.versions.len(), 2);
    assert_eq!(plugin.latest().unwrap().name, "1.1");
}

#[tokio::test]
async fn test_get_plugin_info_is_cached() {
    let service = MockService::new().respond("plugins/Foo/info", plugin_info("Foo"));
    let client = build_client(&service);

    client.get_plugin_info("Foo").await.unwrap();
    client.get_plugin_info("Foo").await.unwrap();

    // 2回目はキャッシュヒット
    assert_eq!(service.fetch_count(), 1);
}

#[tokio::test]
async fn test_get_plugin_info_not_found_and_unauthorized_are_uniform() {
    // 「存在しない」と「権限なし」は同じエラーとして表面化する
    let service = MockService::new()
        .respond_error(
            "plugins/Gone/info",
            MockResponse::RemoteError("Requested plugin does not exist.".to_string()),
        )
        .respond_error("plugins/Restricted/info", MockResponse::NotAuthorized);
    let client = build_client(&service);

    assert!(matches!(
        client.get_plugin_info("Gone").await,
        Err(MktError::PluginNotFound(name)) if name == "Gone"
    ));
    assert!(matches!(
        client.get_plugin_info("Restricted").await,
        Err(MktError::PluginNotFound(name)) if name == "Restricted"
    ));
}

#[tokio::test]
async fn test_get_plugin_info_transport_error_propagates() {
    let service = MockService::new().respond_error(
        "plugins/Foo/info",
        MockResponse::Api {
            status: 502,
            message: "bad gateway".to_string(),
        },
    );
    let client = build_client(&service);

    assert!(matches!(
        client.get_plugin_info("Foo").await,
        Err(MktError::Api { status: 502, .. })
    ));
}

#[tokio::test]
async fn test_get_consumer_unauthorized_is_none() {
    let service = MockService::new().respond_error("consumer", MockResponse::NotAuthorized);
    let client = build_client(&service);

    assert!(client.get_consumer().await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_consumer_parses_profile() {
    let service = MockService::new().respond(
        "consumer",
        json!({"isValid": true, "isExpired": false, "expireDate": "2026-12-31 00:00:00"}),
    );
    let client = build_client(&service);

    let consumer = client.get_consumer().await.unwrap().unwrap();
    assert!(consumer.is_valid);
    assert!(!consumer.is_expired);
}

#[tokio::test]
async fn test_get_consumer_transport_error_propagates() {
    let service = MockService::new().respond_error(
        "consumer",
        MockResponse::Api {
            status: 500,
            message: "oops".to_string(),
        },
    );
    let client = build_client(&service);

    assert!(client.get_consumer().await.is_err());
}

#[tokio::test]
async fn test_search_twice_issues_one_network_call() {
    let service = MockService::new().respond(
        "plugins",
        json!({"plugins": [plugin_info("Foo"), plugin_info("Bar")]}),
    );
    let client = build_client(&service);

    let first = client
        .search_for_plugins("", "", "", PurchaseType::All)
        .await
        .unwrap();
    let second = client
        .search_for_plugins("", "", "", PurchaseType::All)
        .await
        .unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(
        first.iter().map(|p| &p.name).collect::<Vec<_>>(),
        second.iter().map(|p| &p.name).collect::<Vec<_>>()
    );
    assert_eq!(service.fetch_count(), 1);
}

#[tokio::test]
async fn test_search_sends_filter_params() {
    let service = MockService::new().respond("plugins", json!({"plugins": []}));
    let client = build_client(&service);

    client
        .search_for_plugins("login", "alerts", "downloads", PurchaseType::Paid)
        .await
        .unwrap();

    let fetches = service.fetches_of("plugins");
    assert_eq!(fetches.len(), 1);
    assert_eq!(fetches[0].get("keywords").unwrap(), "login");
    assert_eq!(fetches[0].get("query").unwrap(), "alerts");
    assert_eq!(fetches[0].get("sort").unwrap(), "downloads");
    assert_eq!(fetches[0].get("purchase_type").unwrap(), "paid");
}

#[tokio::test]
async fn test_search_no_matches_is_empty_vec() {
    let service = MockService::new()
        .respond("plugins", json!({}))
        .respond("themes", json!({"plugins": null}));
    let client = build_client(&service);

    assert!(client
        .search_for_plugins("", "", "", PurchaseType::All)
        .await
        .unwrap()
        .is_empty());
    assert!(client
        .search_for_themes("", "", "", PurchaseType::All)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_search_for_themes_uses_themes_action() {
    let service = MockService::new().respond("themes", json!({"plugins": []}));
    let client = build_client(&service);

    client
        .search_for_themes("", "", "", PurchaseType::All)
        .await
        .unwrap();

    assert_eq!(service.fetches_of("themes").len(), 1);
}

#[tokio::test]
async fn test_get_download_url_uses_latest_version() {
    let service = MockService::new().respond("plugins/Foo/info", plugin_info("Foo"));
    let client = build_client(&service);

    let url = client.get_download_url("Foo").await.unwrap();

    assert_eq!(
        url,
        "https://plugins.pluginhub.io/api/2.0/plugins/Foo/download/1.1?coreVersion=5.3.0"
    );
}

#[tokio::test]
async fn test_get_download_url_without_versions_is_an_error() {
    let service = MockService::new().respond(
        "plugins/Empty/info",
        json!({"name": "Empty", "versions": []}),
    );
    let client = build_client(&service);

    assert!(matches!(
        client.get_download_url("Empty").await,
        Err(MktError::NoVersionsAvailable(name)) if name == "Empty"
    ));
    // ダウンロードは試行されない
    assert_eq!(service.download_count(), 0);
}

#[tokio::test]
async fn test_download_uses_random_temp_path() {
    let service = MockService::new().respond("plugins/SamePlugin/info", plugin_info("SamePlugin"));
    let client = build_client(&service);

    let first = client.download("SamePlugin").await.unwrap().unwrap();
    let second = client.download("SamePlugin").await.unwrap().unwrap();

    // 同じプラグインでも呼び出しごとに別のパス
    assert_ne!(first, second);

    // ファイル名はプラグイン名から導出されない
    let filename = first.file_name().unwrap().to_string_lossy().to_string();
    assert!(!filename.contains("SamePlugin"));
    assert!(filename.ends_with(".zip"));

    // 規定のサブディレクトリ配下に置かれる
    assert!(first.to_string_lossy().contains("latest"));
    assert!(first.parent().unwrap().ends_with("plugins"));

    assert!(first.exists());
    assert!(second.exists());

    // 後始末は呼び出し側の責務
    std::fs::remove_file(first).unwrap();
    std::fs::remove_file(second).unwrap();
}

#[tokio::test]
async fn test_download_soft_failure_returns_none() {
    let service = MockService::new()
        .respond("plugins/Foo/info", plugin_info("Foo"))
        .with_download_failure();
    let client = build_client(&service);

    assert!(client.download("Foo").await.unwrap().is_none());
    assert_eq!(service.download_count(), 1);
}

#[tokio::test]
async fn test_download_resolution_failure_returns_none() {
    // 情報取得に失敗するプラグイン（未設定 → 存在しない扱い）
    let service = MockService::new();
    let client = build_client(&service);

    assert!(client.download("Unknown").await.unwrap().is_none());
    assert_eq!(service.download_count(), 0);
}

#[tokio::test]
async fn test_update_check_is_one_batch_plus_per_update_lookups() {
    let service = MockService::new()
        .respond(
            "plugins/checkUpdates",
            json!([
                {"name": "Alpha", "repositoryChangelogUrl": "https://example.org/alpha/changelog"},
                {"name": "Beta", "repositoryChangelogUrl": "https://example.org/beta/changelog"}
            ]),
        )
        .respond("plugins/Alpha/info", plugin_info("Alpha"))
        .respond("plugins/Beta/info", plugin_info("Beta"));
    let client = build_client(&service);

    let registry = installed(&[
        ("Alpha", "0.9.0", false),
        ("Beta", "1.0.0", false),
        ("Gamma", "2.0.0", false),
        ("CoreHome", "5.3.0", true),
    ]);

    let updates = client
        .get_info_of_plugins_having_update(&registry.loaded_plugins(), &registry)
        .await
        .unwrap();

    assert_eq!(updates.len(), 2);
    assert_eq!(
        updates[0].repository_changelog_url.as_deref(),
        Some("https://example.org/alpha/changelog")
    );

    // バッチ1回 + 更新ありの2件分の個別照会のみ
    assert_eq!(service.fetches_of("plugins/checkUpdates").len(), 1);
    assert_eq!(service.fetch_count(), 3);

    // バッチには同梱プラグインが含まれない
    let batch_params = &service.fetches_of("plugins/checkUpdates")[0];
    let payload: Value = serde_json::from_str(batch_params.get("plugins").unwrap()).unwrap();
    let names: Vec<&str> = payload["plugins"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
}

#[tokio::test]
async fn test_update_check_skips_network_when_nothing_to_check() {
    let service = MockService::new();
    let client = build_client(&service);

    let registry = installed(&[("CoreHome", "5.3.0", true)]);

    let updates = client
        .get_info_of_plugins_having_update(&registry.loaded_plugins(), &registry)
        .await
        .unwrap();

    assert!(updates.is_empty());
    assert_eq!(service.fetch_count(), 0);
}

#[tokio::test]
async fn test_update_check_drops_failing_item_and_keeps_the_rest() {
    // Beta の個別照会は失敗する（未設定）が、バッチ全体は成功する
    let service = MockService::new()
        .respond(
            "plugins/checkUpdates",
            json!([
                {"name": "Alpha", "repositoryChangelogUrl": "https://example.org/alpha"},
                {"name": "Beta", "repositoryChangelogUrl": "https://example.org/beta"}
            ]),
        )
        .respond("plugins/Alpha/info", plugin_info("Alpha"));
    let client = build_client(&service);

    let registry = installed(&[("Alpha", "0.9.0", false), ("Beta", "1.0.0", false)]);

    let updates = client
        .get_info_of_plugins_having_update(&registry.loaded_plugins(), &registry)
        .await
        .unwrap();

    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].plugin.name, "Alpha");
}

#[tokio::test]
async fn test_update_check_null_response_is_empty() {
    let service = MockService::new().respond("plugins/checkUpdates", Value::Null);
    let client = build_client(&service);

    let registry = installed(&[("Alpha", "0.9.0", false)]);

    let updates = client
        .get_info_of_plugins_having_update(&registry.loaded_plugins(), &registry)
        .await
        .unwrap();

    assert!(updates.is_empty());
}

#[tokio::test]
async fn test_clear_cache_forces_refetch() {
    let service = MockService::new().respond("plugins/Foo/info", plugin_info("Foo"));
    let client = build_client(&service);

    client.get_plugin_info("Foo").await.unwrap();
    assert_eq!(service.fetch_count(), 1);

    // 資格情報変更時と同じ経路でキャッシュを全破棄
    client.clear_all_cache_entries();

    client.get_plugin_info("Foo").await.unwrap();
    assert_eq!(service.fetch_count(), 2);
}
