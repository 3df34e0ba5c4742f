//! 日志初始化

use tracing_subscriber::EnvFilter;

/// 初始化日志（默认 info 级别，`verbose` 为 true 时默认 debug 级别，可通过 RUST_LOG 覆盖）
///
/// 重复调用不会报错
pub fn init_with_verbosity(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
