use crate::models::plan::CompositionPlan;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载选题计划
pub async fn load_composition_plan(toml_file_path: &Path) -> Result<CompositionPlan> {
    if !toml_file_path.exists() {
        anyhow::bail!("计划文件不存在: {}", toml_file_path.display());
    }

    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let plan: CompositionPlan = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    tracing::info!(
        "成功加载选题计划: 试卷 {} | 加入 {} 题 | 移除 {} 题",
        plan.spec.composition_id,
        plan.select.len(),
        plan.deselect.len()
    );

    Ok(plan.with_file_path(toml_file_path.to_string_lossy().to_string()))
}
