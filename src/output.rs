use owo_colors::OwoColorize;

/// 更新チェック結果のサマリ行
pub struct UpdateSummary {
    pub prefix: String,
    pub message: String,
}

impl UpdateSummary {
    pub fn format(updates: usize, checked: usize) -> Self {
        match (updates, checked) {
            (_, 0) => Self {
                prefix: "•".yellow().to_string(),
                message: "No plugins installed".to_string(),
            },
            (0, checked) => Self {
                prefix: "✓".green().to_string(),
                message: format!("All {} plugin(s) up to date", checked),
            },
            (updates, checked) => Self {
                prefix: "!".yellow().to_string(),
                message: format!(
                    "{} of {} plugin(s) have an update available",
                    updates.yellow(),
                    checked
                ),
            },
        }
    }
}
