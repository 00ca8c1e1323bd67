//! 宣伝キャンペーンURL
//!
//! 商用ディストリビュータのプラグインのホームページにキャンペーン計測
//! パラメータを付与する。対象は1ディストリビュータのみの狭い規則。

use url::Url;

/// プラットフォームベンダの商用ディストリビュータ（所有者名、小文字比較）
pub const COMMERCIAL_DISTRIBUTOR: &str = "pluginhubpro";

/// 有償版への誘導キャンペーン名
pub const CAMPAIGN_NAME_UPGRADE_TO_PRO: &str = "UpgradeToPro";

/// キャンペーン計測パラメータのキー（付与済み判定にも使う）
pub const CAMPAIGN_PARAM: &str = "utm_campaign";

/// キャンペーン計測パラメータをURLへ付与する
///
/// 解釈できないURLは手を付けずそのまま返す。
pub fn add_campaign_parameters(homepage: &str, campaign: &str, source: &str, content: &str) -> String {
    match Url::parse(homepage) {
        Ok(mut url) => {
            url.query_pairs_mut()
                .append_pair(CAMPAIGN_PARAM, campaign)
                .append_pair("utm_source", source)
                .append_pair("utm_content", content);
            url.to_string()
        }
        Err(_) => homepage.to_string(),
    }
}
