use std::path::PathBuf;

use clap::Parser;
use tracing::warn;

use apicase::config::ConfigLoader;
use apicase::runner::{TestDriver, TestReporter};
use apicase::{ApicaseError, Result};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// 用例文件或目录，缺省时使用配置中的 data_dir
    pub paths: Vec<PathBuf>,

    /// 运行环境，可多次指定，如 --env dev --env prod
    #[arg(short, long = "env")]
    pub envs: Vec<String>,

    /// 变量覆盖 key=value，可多次指定，优先级最高
    #[arg(long = "var")]
    pub vars: Vec<String>,

    /// 配置文件路径（默认自动查找 apicase.toml）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 显示每个用例的响应详情
    #[arg(short, long)]
    pub verbose: bool,
}

/// 执行一次完整运行，返回进程退出码
pub async fn run(cli: Cli) -> Result<i32> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_path(path)?,
        None => ConfigLoader::find_and_load().unwrap_or_default(),
    };
    let resolved = config.resolve(&cli.envs);

    let cli_vars: Vec<(String, String)> = cli
        .vars
        .iter()
        .filter_map(|raw| {
            let parsed = ConfigLoader::parse_cli_var(raw);
            if parsed.is_none() {
                warn!("忽略格式不正确的 --var 参数: {}", raw);
            }
            parsed
        })
        .collect();
    let seed = ConfigLoader::build_store(&resolved, &cli_vars);

    let paths = if cli.paths.is_empty() {
        let data_dir = config.data_dir.clone().ok_or_else(|| {
            ApicaseError::ConfigError(
                "未指定用例路径，且配置中没有 data_dir".to_string(),
            )
        })?;
        vec![PathBuf::from(data_dir)]
    } else {
        cli.paths.clone()
    };

    let driver = TestDriver::new(&resolved, seed)?;
    let report = driver.run_paths(&paths).await?;

    let reporter = TestReporter::new(cli.verbose);
    for file_result in &report.files {
        reporter.print_file(file_result);
    }
    reporter.print_summary(&report);

    Ok(if report.all_passed() { 0 } else { 1 })
}
