/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use crate::config::Config;
use crate::models::{Job, JobResult};
use crate::orchestrator::UploadState;
use tracing::{error, info, warn};

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 音频问答客户端");
    info!("🌐 服务地址: {}", config.api_base_url);
    info!(
        "⏱️ 轮询间隔: {} ms, 最多查询 {} 次",
        config.poll_interval_ms, config.max_poll_attempts
    );
    info!("{}", "=".repeat(60));
}

/// 记录上传状态变化
pub fn log_state(state: &UploadState) {
    match state {
        UploadState::Idle => {}
        UploadState::Uploading { .. } | UploadState::Processing { .. } | UploadState::Done { .. } => {
            info!("[{}] {}", state.label(), state.message())
        }
        UploadState::TimedOut { .. } => warn!("[{}] {}", state.label(), state.message()),
        UploadState::Error { .. } => error!("[{}] {}", state.label(), state.message()),
    }
}

/// 输出转写文本与问答列表
pub fn log_job_result(result: &JobResult) {
    info!("\n{}", "=".repeat(60));
    info!("📝 转写文本");
    info!("{}", "=".repeat(60));
    info!("{}", result.transcript);
    info!("\n{}", "─".repeat(60));
    info!("❓ 问题与答案 (共 {} 个)", result.pairs.len());
    info!("{}", "─".repeat(60));
    for (i, pair) in result.pairs.iter().enumerate() {
        info!("Q{}: {}", i + 1, pair.question.text);
        match &pair.answer {
            Some(answer) => info!("    A: {}", answer.text),
            None => info!("    A: (暂无答案)"),
        }
    }
    if result.unanswered() > 0 {
        warn!("⚠️ {} 个问题没有匹配到答案", result.unanswered());
    }
}

/// 输出历史任务列表
pub fn log_history(jobs: &[Job], stale: bool) {
    info!("\n{}", "=".repeat(60));
    info!("📚 历史任务 (共 {} 条)", jobs.len());
    if stale {
        warn!("⚠️ 列表可能已过期（最近一次同步失败）");
    }
    info!("{}", "=".repeat(60));
    if jobs.is_empty() {
        info!("暂无上传记录");
        return;
    }
    for job in jobs {
        let completed = job
            .completed_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "进行中".to_string());
        info!(
            "{} | {} | 创建: {} | 完成: {}",
            truncate_text(&job.filename, 40),
            job.status,
            job.created_at.format("%Y-%m-%d %H:%M:%S"),
            completed
        );
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
