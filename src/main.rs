use anyhow::Result;
use test_composer::utils::logging;
use test_composer::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    let committed = App::initialize(config)?.run().await?;
    if !committed {
        std::process::exit(1);
    }

    Ok(())
}
