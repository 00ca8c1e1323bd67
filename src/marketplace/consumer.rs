//! コンシューマ（ライセンス状態）
//!
//! ライセンスキーに紐づく購読状態。有償プラグインへのアクセス可否と
//! ディストリビュータ制限を決める。

use crate::dates;
use serde::{Deserialize, Serialize};

/// 販売元（ディストリビュータ）情報
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Distributor {
    pub name: String,
}

/// リモートのコンシューマレコード
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerProfile {
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub is_expired: bool,
    #[serde(default)]
    pub expire_date: Option<String>,
    /// 許可されたディストリビュータ（所有者名）。空なら制限なし
    #[serde(default)]
    pub whitelisted_distributors: Vec<String>,
    #[serde(default)]
    pub distributor: Option<Distributor>,
}

/// コンシューマ状態の参照ビュー
///
/// 未認証（コンシューマなし）でも常に問い合わせられるようにするラッパ。
pub struct Consumer {
    profile: Option<ConsumerProfile>,
}

impl Consumer {
    pub fn new(profile: Option<ConsumerProfile>) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> Option<&ConsumerProfile> {
        self.profile.as_ref()
    }

    /// 許可ディストリビュータ一覧（小文字化済み）
    ///
    /// 空の場合はエントリ制限なし。
    pub fn whitelisted_distributors(&self) -> Vec<String> {
        self.profile
            .as_ref()
            .map(|p| {
                p.whitelisted_distributors
                    .iter()
                    .map(|org| org.to_lowercase())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 有償プラグインへのアクセス可否
    pub fn has_access_to_paid_plugins(&self) -> bool {
        self.profile
            .as_ref()
            .map_or(false, |p| p.is_valid && !p.is_expired)
    }

    /// ディストリビュータ名
    pub fn distributor(&self) -> Option<&str> {
        self.profile
            .as_ref()
            .and_then(|p| p.distributor.as_ref())
            .map(|d| d.name.as_str())
    }

    /// 失効日の長い表示形式
    pub fn expire_date_long(&self) -> Option<String> {
        self.profile
            .as_ref()
            .and_then(|p| p.expire_date.as_deref())
            .filter(|date| !date.is_empty())
            .map(dates::to_long_date)
    }
}
