//! 応答キャッシュ
//!
//! リクエスト署名から決定的に導出したキーで応答を一定時間保持する。
//! キャッシュミスは常に安全なフォールバック（再取得）であり、エラーではない。

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// パラメータをキー順に並べた正規化クエリ文字列を構築する
///
/// 同じ論理リクエストはパラメータの指定順によらず同じ文字列になる。
pub fn canonical_query(params: &BTreeMap<String, String>) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

/// キャッシュキーを導出する
///
/// 形式: `marketplace.api.{version}.{actionの'/'を'.'に置換}.{hash(query)}`
pub fn cache_key(api_version: &str, action: &str, query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.as_bytes());
    let digest = hex::encode(hasher.finalize());

    format!(
        "marketplace.api.{}.{}.{}",
        api_version,
        action.replace('/', "."),
        digest
    )
}

/// 応答キャッシュのインターフェース
///
/// エントリは外部から任意のタイミングで消えうる。利用側は `None` を
/// 再取得の指示として扱うこと。
pub trait ResponseCache: Send + Sync {
    /// キーに対応する値を取得（期限切れ・不在は `None`）
    fn get(&self, key: &str) -> Option<Value>;

    /// 値を保存（`ttl_secs` 経過後は取得不可になる）
    fn put(&self, key: &str, value: &Value, ttl_secs: u64);

    /// 全エントリを破棄する
    ///
    /// 資格情報（ライセンスキー）変更時には必ず呼ぶこと。
    fn flush_all(&self);
}

struct MemoryEntry {
    value: Value,
    expires_at: Instant,
}

/// プロセス内キャッシュ
///
/// キー単位の読み書きはロックで直列化される。キー横断のトランザクションは
/// 提供しない。
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResponseCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn put(&self, key: &str, value: &Value, ttl_secs: u64) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.clone(),
                expires_at: Instant::now() + Duration::from_secs(ttl_secs),
            },
        );
    }

    fn flush_all(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// ファイルキャッシュのエントリ形式
#[derive(Debug, Serialize, Deserialize)]
struct FileEntry {
    expires_at: DateTime<Utc>,
    payload: Value,
}

/// ファイルベースの応答キャッシュ
///
/// 1エントリ = 1 JSONファイル。CLI実行をまたいでキャッシュを共有する。
pub struct FileCache {
    /// キャッシュルート: ~/.mkt/cache/responses/
    cache_dir: PathBuf,
}

impl FileCache {
    /// 既定パスで初期化（ディレクトリ作成含む）
    pub fn new() -> Result<Self> {
        let home = std::env::var("HOME")
            .map_err(|_| crate::error::MktError::Config("HOME environment variable not set".to_string()))?;
        let cache_dir = PathBuf::from(home)
            .join(".mkt")
            .join("cache")
            .join("responses");
        fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    /// カスタムキャッシュディレクトリで初期化（テスト用）
    pub fn with_cache_dir(cache_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        // キーは英数字・ドット・16進のみで構成されるためそのままファイル名にできる
        self.cache_dir.join(format!("{}.json", key))
    }
}

impl ResponseCache for FileCache {
    fn get(&self, key: &str) -> Option<Value> {
        let path = self.entry_path(key);
        let content = fs::read_to_string(&path).ok()?;

        // 壊れたエントリはミス扱いで破棄する
        let entry: FileEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(_) => {
                let _ = fs::remove_file(&path);
                return None;
            }
        };

        if Utc::now() >= entry.expires_at {
            let _ = fs::remove_file(&path);
            return None;
        }

        Some(entry.payload)
    }

    fn put(&self, key: &str, value: &Value, ttl_secs: u64) {
        let entry = FileEntry {
            expires_at: Utc::now() + chrono::Duration::seconds(ttl_secs as i64),
            payload: value.clone(),
        };

        match serde_json::to_string(&entry) {
            Ok(content) => {
                if let Err(e) = fs::write(self.entry_path(key), content) {
                    log::debug!("cache write failed for {}: {}", key, e);
                }
            }
            Err(e) => log::debug!("cache serialize failed for {}: {}", key, e),
        }
    }

    fn flush_all(&self) {
        let Ok(entries) = fs::read_dir(&self.cache_dir) else {
            return;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map_or(false, |e| e == "json") {
                let _ = fs::remove_file(path);
            }
        }
    }
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;
