//! ライセンスキーの保存と削除
//!
//! キーの検証はキャッシュを介さず、候補キーで認証した新しいゲートウェイで
//! 直接 `consumer` を取得して行う。資格情報が変わったらキャッシュは全破棄。

use crate::config::MktConfig;
use crate::error::{MktError, Result};
use crate::marketplace::client::MarketplaceClient;
use crate::marketplace::consumer::ConsumerProfile;
use crate::marketplace::service::{HttpService, MarketplaceService};
use std::collections::BTreeMap;

/// 認証済みゲートウェイでライセンス状態を検証する
///
/// トランスポート障害はそのまま伝播する。認可エラーはキー不明として
/// `LicenseInvalid`、失効キーは `LicenseExpired`（業務ルール上の拒否で、
/// システム障害とは別物）。
pub async fn validate_license(service: &dyn MarketplaceService) -> Result<ConsumerProfile> {
    let value = match service.fetch("consumer", &BTreeMap::new()).await {
        Ok(value) => value,
        Err(MktError::NotAuthorized) | Err(MktError::RemoteError(_)) => {
            return Err(MktError::LicenseInvalid);
        }
        Err(e) => return Err(e),
    };

    let consumer: ConsumerProfile = serde_json::from_value(value)?;

    if consumer.is_expired {
        return Err(MktError::LicenseExpired);
    }

    if !consumer.is_valid {
        return Err(MktError::LicenseInvalid);
    }

    Ok(consumer)
}

/// ライセンスキーを検証して保存する
pub async fn save_license_key(
    config: &mut MktConfig,
    client: &MarketplaceClient,
    license_key: &str,
) -> Result<ConsumerProfile> {
    let license_key = license_key.trim().to_string();

    let service = HttpService::with_license_key(config.domain.clone(), Some(license_key.clone()));
    let consumer = validate_license(&service).await?;

    config.set_license_key(Some(license_key));
    config.save()?;

    // 資格情報の変更に伴う必須のキャッシュ破棄
    client.clear_all_cache_entries();

    Ok(consumer)
}

/// 保存済みライセンスキーを削除する
pub async fn delete_license_key(config: &mut MktConfig, client: &MarketplaceClient) -> Result<()> {
    config.set_license_key(None);
    config.save()?;

    client.clear_all_cache_entries();

    Ok(())
}

#[cfg(test)]
#[path = "license_test.rs"]
mod tests;
