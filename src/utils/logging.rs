//! 日志工具模块
//!
//! 提供日志初始化和格式化输出的辅助函数

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::CompositionSpec;
use crate::services::commit::CommitReceipt;

/// 初始化全局日志
///
/// `RUST_LOG` 优先；否则按 `verbose` 取 debug 或 info。重复调用不会报错
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(api_base_url: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 组卷程序启动 - {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!("🌐 API: {}", api_base_url);
    info!("{}", "=".repeat(60));
}

/// 记录组卷规格
pub fn log_spec(spec: &CompositionSpec) {
    info!(
        "📋 试卷 {} | 课程 {} | 共 {} 题 (简单 {} / 中等 {} / 困难 {})",
        spec.composition_id,
        spec.collection_id,
        spec.total,
        spec.tier_counts.easy,
        spec.tier_counts.medium,
        spec.tier_counts.hard
    );
}

/// 打印提交结果
pub fn log_commit_summary(receipt: &CommitReceipt) {
    info!("\n{}", "─".repeat(60));
    info!("✅ 试卷 {} 提交成功", receipt.composition_id);
    info!(
        "完成时间: {}",
        receipt.committed_at.format("%Y-%m-%d %H:%M:%S")
    );
    info!("➕ 新增: {:?}", receipt.delta.to_add);
    info!("➖ 移除: {:?}", receipt.delta.to_remove);
    info!("= 保留: {} 题", receipt.delta.unchanged.len());
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
