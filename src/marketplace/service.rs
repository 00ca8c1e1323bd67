//! リモートサービスゲートウェイ
//!
//! マーケットプレイスバックエンドへの認証付きHTTP呼び出しとファイル
//! ダウンロードを担当し、トランスポート障害を型付きエラーに変換する。

use crate::error::{MktError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::io::Write;
use std::path::Path;
use std::pin::Pin;
use std::time::Duration;

/// メタデータ取得のリクエストタイムアウト
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// マーケットプレイスAPIバージョン
pub const API_VERSION: &str = "2.0";

/// ダウンロード転送の結果
///
/// 転送失敗は `Err` ではなく値として返る。メタデータ取得の失敗（`Result`）
/// とは呼び出し箇所で区別される。
#[derive(Debug, Clone)]
pub enum DownloadOutcome {
    /// 転送完了
    Completed,
    /// 転送未完了（書き込み不能・中断を含む）
    Failed { message: String },
}

impl DownloadOutcome {
    /// 転送が完了したかどうか
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// 失敗時のメッセージを取得
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            Self::Completed => None,
            Self::Failed { message } => Some(message),
        }
    }
}

/// マーケットプレイスゲートウェイ trait
pub trait MarketplaceService: Send + Sync {
    /// 以後の呼び出しで使う資格情報を設定（`None`/空文字は匿名アクセス）
    fn authenticate(&mut self, license_key: Option<String>);

    /// `{domain}/api/{version}/{action}` へのGET
    fn fetch<'a>(
        &'a self,
        action: &'a str,
        params: &'a BTreeMap<String, String>,
    ) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + 'a>>;

    /// リモートリソースを `target` にストリーム書き込みする
    ///
    /// `timeout` が `None` の場合は無制限（巨大アーカイブの転送を
    /// 汎用タイムアウトで打ち切らない）。
    fn download<'a>(
        &'a self,
        url: &'a str,
        target: &'a Path,
        timeout: Option<Duration>,
    ) -> Pin<Box<dyn Future<Output = DownloadOutcome> + Send + 'a>>;

    /// マーケットプレイスドメイン（ダウンロードURL構築用）
    fn domain(&self) -> &str;

    /// APIバージョン（キャッシュキー・URL構築用）
    fn api_version(&self) -> &str;
}

/// reqwestベースのゲートウェイ実装
pub struct HttpService {
    client: Client,
    /// タイムアウトなしのダウンロード専用クライアント
    download_client: Client,
    domain: String,
    access_token: Option<String>,
}

impl HttpService {
    /// 新しいゲートウェイを作成（匿名アクセス）
    pub fn new(domain: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        let download_client = Client::new();

        Self {
            client,
            download_client,
            domain: domain.into(),
            access_token: None,
        }
    }

    /// ライセンスキー付きでゲートウェイを作成
    pub fn with_license_key(domain: impl Into<String>, license_key: Option<String>) -> Self {
        let mut service = Self::new(domain);
        service.authenticate(license_key);
        service
    }

    async fn fetch_impl(&self, action: &str, params: &BTreeMap<String, String>) -> Result<Value> {
        let url = format!("{}/api/{}/{}", self.domain, API_VERSION, action);

        let mut query: Vec<(&str, &str)> = params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        if let Some(token) = &self.access_token {
            query.push(("access_token", token));
        }

        let response = self
            .client
            .get(&url)
            .query(&query)
            .header("User-Agent", "mkt-cli")
            .send()
            .await?;

        let status = response.status().as_u16();

        if status == 401 || status == 403 {
            return Err(MktError::NotAuthorized);
        }

        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MktError::Api { status, message });
        }

        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| MktError::MalformedResponse(format!("invalid JSON: {}", e)))?;

        // 2xx でもエラーペイロードを返すことがある（存在しないプラグイン等）
        if let Some(message) = value.get("error").and_then(Value::as_str) {
            return Err(MktError::RemoteError(message.to_string()));
        }

        Ok(value)
    }

    async fn download_impl(
        &self,
        url: &str,
        target: &Path,
        timeout: Option<Duration>,
    ) -> DownloadOutcome {
        let mut request = self
            .download_client
            .get(url)
            .header("User-Agent", "mkt-cli");

        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let mut response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                return DownloadOutcome::Failed {
                    message: format!("request failed: {}", e),
                }
            }
        };

        if !response.status().is_success() {
            return DownloadOutcome::Failed {
                message: format!("HTTP {}", response.status().as_u16()),
            };
        }

        let mut file = match std::fs::File::create(target) {
            Ok(file) => file,
            Err(e) => {
                return DownloadOutcome::Failed {
                    message: format!("cannot write {}: {}", target.display(), e),
                }
            }
        };

        let total_size = response.content_length().unwrap_or(0);

        let pb = if total_size > 0 {
            let pb = ProgressBar::new(total_size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .unwrap()
                    .progress_chars("#>-"),
            );
            pb
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} Downloading...")
                    .unwrap(),
            );
            pb
        };

        loop {
            match response.chunk().await {
                Ok(Some(bytes)) => {
                    if let Err(e) = file.write_all(&bytes) {
                        pb.finish_and_clear();
                        return DownloadOutcome::Failed {
                            message: format!("write failed: {}", e),
                        };
                    }
                    pb.inc(bytes.len() as u64);
                }
                Ok(None) => break,
                Err(e) => {
                    pb.finish_and_clear();
                    return DownloadOutcome::Failed {
                        message: format!("transfer interrupted: {}", e),
                    };
                }
            }
        }

        pb.finish_and_clear();
        DownloadOutcome::Completed
    }
}

impl MarketplaceService for HttpService {
    fn authenticate(&mut self, license_key: Option<String>) {
        self.access_token = license_key.filter(|key| !key.is_empty());
    }

    fn fetch<'a>(
        &'a self,
        action: &'a str,
        params: &'a BTreeMap<String, String>,
    ) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + 'a>> {
        Box::pin(self.fetch_impl(action, params))
    }

    fn download<'a>(
        &'a self,
        url: &'a str,
        target: &'a Path,
        timeout: Option<Duration>,
    ) -> Pin<Box<dyn Future<Output = DownloadOutcome> + Send + 'a>> {
        Box::pin(self.download_impl(url, target, timeout))
    }

    fn domain(&self) -> &str {
        &self.domain
    }

    fn api_version(&self) -> &str {
        API_VERSION
    }
}
