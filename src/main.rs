use anyhow::Result;
use audio_qa_client::{logger, App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logger::init_with_verbosity(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config)?.run().await?;

    Ok(())
}
