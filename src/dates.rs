//! 日付表示ヘルパー
//!
//! マーケットプレイス応答の日時文字列を表示用の形式に整える。
//! 解釈できない値は元の文字列のまま返す。

use chrono::{DateTime, NaiveDate, NaiveDateTime};

fn parse(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    None
}

/// 長い表示形式（例: "February 9, 2016"）
pub fn to_long_date(raw: &str) -> String {
    match parse(raw) {
        Some(dt) => dt.format("%B %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}

/// 短い表示形式（例: "Feb 9, 2016"）
pub fn to_short_date(raw: &str) -> String {
    match parse(raw) {
        Some(dt) => dt.format("%b %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}
