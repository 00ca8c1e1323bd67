//! 依存要件の解決
//!
//! カタログエントリの `requires` 指定（`{"core": ">=3.0.0", "SomePlugin": ">=1.2"}`
//! 形式）をコアバージョンとローカルレジストリに対して評価する。

use crate::registry::LoadedPlugin;
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// 満たされていない依存要件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingRequirement {
    /// 要求対象（"core" またはプラグイン名）
    pub requirement: String,
    /// 現在のバージョン（未導入なら空文字）
    pub actual_version: String,
    /// 要求された制約
    pub required_version: String,
}

/// 依存リゾルバ trait
pub trait DependencyResolver: Send + Sync {
    /// `requires` 指定のうち満たされていないものを返す
    fn missing_dependencies(&self, requires: &Value) -> Vec<MissingRequirement>;
}

/// コアバージョン + ローカルプラグイン一覧に基づくリゾルバ
pub struct CoreDependencyResolver {
    core_version: String,
    installed: BTreeMap<String, String>,
}

impl CoreDependencyResolver {
    pub fn new(core_version: impl Into<String>, loaded: &[LoadedPlugin]) -> Self {
        let installed = loaded
            .iter()
            .map(|p| (p.name.clone(), p.version.clone()))
            .collect();

        Self {
            core_version: core_version.into(),
            installed,
        }
    }
}

impl DependencyResolver for CoreDependencyResolver {
    fn missing_dependencies(&self, requires: &Value) -> Vec<MissingRequirement> {
        let Some(entries) = requires.as_object() else {
            return Vec::new();
        };

        let mut missing = Vec::new();

        for (name, constraint) in entries {
            let Some(constraint) = constraint.as_str() else {
                continue;
            };

            let actual = if name == "core" {
                Some(self.core_version.as_str())
            } else {
                self.installed.get(name).map(String::as_str)
            };

            match actual {
                Some(version) if satisfies(version, constraint) => {}
                Some(version) => missing.push(MissingRequirement {
                    requirement: name.clone(),
                    actual_version: version.to_string(),
                    required_version: constraint.to_string(),
                }),
                None => missing.push(MissingRequirement {
                    requirement: name.clone(),
                    actual_version: String::new(),
                    required_version: constraint.to_string(),
                }),
            }
        }

        missing
    }
}

/// バージョンが制約を満たすかどうか
fn satisfies(version: &str, constraint: &str) -> bool {
    let Some(version) = parse_lenient(version) else {
        return false;
    };

    match VersionReq::parse(constraint) {
        Ok(req) => req.matches(&version),
        Err(e) => {
            // 解釈不能な制約では導入をブロックしない
            log::debug!("unparsable requirement '{}': {}", constraint, e);
            true
        }
    }
}

/// 部分バージョンをゼロ埋めしてパースする（"1.0" -> "1.0.0"）
fn parse_lenient(raw: &str) -> Option<Version> {
    if let Ok(version) = Version::parse(raw) {
        return Some(version);
    }

    let (core, suffix) = match raw.find(['-', '+']) {
        Some(idx) => raw.split_at(idx),
        None => (raw, ""),
    };

    let mut core = core.to_string();
    while core.split('.').count() < 3 {
        core.push_str(".0");
    }

    Version::parse(&format!("{}{}", core, suffix)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolver() -> CoreDependencyResolver {
        CoreDependencyResolver::new(
            "3.1.0",
            &[
                LoadedPlugin::new("CustomAlerts", "1.2.0"),
                LoadedPlugin::new("LogViewer", "0.9.1"),
            ],
        )
    }

    #[test]
    fn test_satisfied_core_requirement() {
        let missing = resolver().missing_dependencies(&json!({"core": ">=3.0.0"}));
        assert!(missing.is_empty());
    }

    #[test]
    fn test_unsatisfied_core_requirement() {
        let missing = resolver().missing_dependencies(&json!({"core": ">=4.0.0"}));

        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].requirement, "core");
        assert_eq!(missing[0].actual_version, "3.1.0");
        assert_eq!(missing[0].required_version, ">=4.0.0");
    }

    #[test]
    fn test_missing_plugin_requirement_has_empty_actual() {
        let missing = resolver().missing_dependencies(&json!({"NotInstalled": ">=1.0"}));

        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].requirement, "NotInstalled");
        assert_eq!(missing[0].actual_version, "");
    }

    #[test]
    fn test_plugin_requirement_against_loaded_version() {
        let resolver = resolver();

        assert!(resolver
            .missing_dependencies(&json!({"CustomAlerts": ">=1.0"}))
            .is_empty());

        let missing = resolver.missing_dependencies(&json!({"CustomAlerts": ">=2.0"}));
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].actual_version, "1.2.0");
    }

    #[test]
    fn test_multiple_requirements_report_each_failure() {
        let missing = resolver().missing_dependencies(&json!({
            "core": ">=4.0.0",
            "LogViewer": ">=1.0.0",
            "CustomAlerts": ">=1.0.0"
        }));

        assert_eq!(missing.len(), 2);
    }

    #[test]
    fn test_non_object_requires_is_empty() {
        assert!(resolver().missing_dependencies(&json!(null)).is_empty());
        assert!(resolver().missing_dependencies(&json!("core")).is_empty());
    }

    #[test]
    fn test_parse_lenient_pads_partial_versions() {
        assert_eq!(parse_lenient("1.0").unwrap(), Version::parse("1.0.0").unwrap());
        assert_eq!(parse_lenient("2").unwrap(), Version::parse("2.0.0").unwrap());
        assert_eq!(
            parse_lenient("3.0-b1").unwrap(),
            Version::parse("3.0.0-b1").unwrap()
        );
    }

    #[test]
    fn test_range_constraint() {
        // カンマ区切りはAND
        let resolver = resolver();
        assert!(resolver
            .missing_dependencies(&json!({"core": ">=3.0.0, <4.0.0"}))
            .is_empty());
        assert_eq!(
            resolver
                .missing_dependencies(&json!({"core": ">=2.0.0, <3.0.0"}))
                .len(),
            1
        );
    }
}
