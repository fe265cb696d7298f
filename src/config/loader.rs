use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::types::{ResolvedEnv, RunnerConfig};
use crate::data::VariableStore;
use crate::{ApicaseError, Result};

/// 配置文件加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 配置文件名
    const CONFIG_FILE: &'static str = "apicase.toml";

    /// 从指定路径加载配置文件
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<RunnerConfig> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ApicaseError::ConfigError(format!("读取配置文件失败: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| ApicaseError::ConfigError(format!("解析配置文件失败: {}", e)))
    }

    /// 查找并加载配置文件
    /// 查找顺序：
    /// 1. 当前目录及父目录
    /// 2. 用户配置目录 ~/.config/apicase/
    pub fn find_and_load() -> Option<RunnerConfig> {
        if let Some(config) = Self::try_load_from_current_dir() {
            return Some(config);
        }

        if let Some(config) = Self::try_load_from_user_dir() {
            return Some(config);
        }

        None
    }

    /// 尝试从当前目录及其父目录加载
    fn try_load_from_current_dir() -> Option<RunnerConfig> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            let config_path = current.join(Self::CONFIG_FILE);
            if config_path.exists() {
                debug!("加载配置文件: {}", config_path.display());
                return Self::load_from_path(&config_path).ok();
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// 尝试从用户配置目录加载
    fn try_load_from_user_dir() -> Option<RunnerConfig> {
        let home = dirs::home_dir()?;
        let config_path = home.join(".config").join("apicase").join(Self::CONFIG_FILE);

        if config_path.exists() {
            Self::load_from_path(&config_path).ok()
        } else {
            None
        }
    }

    /// 构建初始变量存储
    ///
    /// 环境种子变量先入，CLI 传入的 --var key=value 覆盖（优先级最高）。
    pub fn build_store(resolved: &ResolvedEnv, cli_vars: &[(String, String)]) -> VariableStore {
        let mut store = VariableStore::new();

        for (key, value) in &resolved.variables {
            store.set(key.clone(), value.clone());
        }

        for (key, value) in cli_vars {
            store.set(key.clone(), value.clone());
        }

        store
    }

    /// 解析 CLI 变量参数 "key=value"
    pub fn parse_cli_var(s: &str) -> Option<(String, String)> {
        s.split_once('=')
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
    }
}
