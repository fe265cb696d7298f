use std::collections::HashMap;

use serde::Deserialize;

/// 单个环境配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Environment {
    /// 基础 URL，用例中的相对路径会拼接到它后面
    #[serde(default)]
    pub base_url: Option<String>,

    /// 请求超时（秒）
    #[serde(default)]
    pub timeout: Option<u64>,

    /// 失败重试次数
    #[serde(default)]
    pub retries: Option<u32>,

    /// 其余键作为会话种子变量
    #[serde(flatten)]
    pub variables: HashMap<String, String>,
}

/// 完整的配置文件 (apicase.toml)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RunnerConfig {
    /// 用例文件目录，未指定路径参数时扫描
    #[serde(default)]
    pub data_dir: Option<String>,

    /// 所有环境配置
    #[serde(default)]
    pub environments: HashMap<String, Environment>,
}

/// 按环境名解析后的有效配置
#[derive(Debug, Clone)]
pub struct ResolvedEnv {
    pub base_url: String,
    pub timeout_secs: u64,
    pub retries: u32,
    pub variables: HashMap<String, String>,
}

impl Default for ResolvedEnv {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: 30,
            retries: 3,
            variables: HashMap::new(),
        }
    }
}

impl RunnerConfig {
    /// 获取指定环境
    pub fn get_environment(&self, env_name: &str) -> Option<&Environment> {
        self.environments.get(env_name)
    }

    /// 解析有效配置
    ///
    /// 依次遍历指定的环境名，取第一个提供了对应值的环境；
    /// 都没有时回落到 `environment` 默认节，再落到内置默认值。
    /// 种子变量按同样的顺序合并，先出现的优先。
    pub fn resolve(&self, env_names: &[String]) -> ResolvedEnv {
        let mut resolved = ResolvedEnv::default();

        let mut names: Vec<&str> = env_names.iter().map(|s| s.as_str()).collect();
        names.push("environment");

        let mut base_url = None;
        let mut timeout = None;
        let mut retries = None;

        for name in names {
            let Some(env) = self.get_environment(name) else {
                continue;
            };
            if base_url.is_none() {
                base_url = env.base_url.clone();
            }
            if timeout.is_none() {
                timeout = env.timeout;
            }
            if retries.is_none() {
                retries = env.retries;
            }
            for (key, value) in &env.variables {
                resolved
                    .variables
                    .entry(key.clone())
                    .or_insert_with(|| value.clone());
            }
        }

        if let Some(url) = base_url {
            resolved.base_url = url;
        }
        if let Some(t) = timeout {
            resolved.timeout_secs = t;
        }
        if let Some(r) = retries {
            resolved.retries = r;
        }
        resolved
    }
}
