//! マーケットプレイスクライアントとカタログ補強
//!
//! リモートのプラグインマーケットプレイスからカタログ・ライセンス状態を
//! 取得し、キャッシュとローカル状態の突き合わせを行うサブシステム。

mod advertising;
mod cache;
mod catalog;
mod client;
mod consumer;
mod license;
mod model;
mod service;

pub use cache::{cache_key, canonical_query, FileCache, MemoryCache, ResponseCache};
pub use catalog::Catalog;
pub use client::{MarketplaceClient, CACHE_TIMEOUT_IN_SECONDS};
pub use consumer::{Consumer, ConsumerProfile, Distributor};
pub use license::{delete_license_key, save_license_key, validate_license};
pub use model::{
    Activity, Author, EnrichedPlugin, PluginInfo, PluginUpdate, PurchaseType, UpdateCandidate,
    UpdateInfo, VersionRecord,
};
pub use service::{DownloadOutcome, HttpService, MarketplaceService, API_VERSION};
