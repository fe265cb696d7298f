use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

use crate::case::CaseReader;
use crate::config::ResolvedEnv;
use crate::data::VariableStore;
use crate::http::Client;
use crate::runner::executor::TestExecutor;
use crate::runner::types::{FileResult, RunReport};
use crate::{ApicaseError, Result};

/// 测试驱动器：迭代用例文件，逐行喂给执行器
///
/// 变量存储以文件为会话边界：每个文件从种子变量（配置环境 + CLI
/// 覆盖）的副本开始，文件之间互不影响。
pub struct TestDriver {
    executor: TestExecutor,
    seed: VariableStore,
}

impl TestDriver {
    pub fn new(resolved: &ResolvedEnv, seed: VariableStore) -> Result<Self> {
        let client = Client::new(
            Duration::from_secs(resolved.timeout_secs),
            resolved.retries,
        )?;
        Ok(Self {
            executor: TestExecutor::new(client, resolved.base_url.clone()),
            seed,
        })
    }

    /// 执行一个用例文件，行内按顺序串联（提取的变量对后续行可见）
    pub async fn run_file<P: AsRef<Path>>(&self, path: P) -> Result<FileResult> {
        let path = path.as_ref();
        let cases = CaseReader::read_file(path)?;

        let mut store = self.seed.clone();
        let mut results = Vec::with_capacity(cases.len());

        for (index, case) in cases.iter().enumerate() {
            let result = self
                .executor
                .execute_case(index + 1, case, &mut store)
                .await;
            results.push(result);
        }

        Ok(FileResult {
            path: path.to_path_buf(),
            results,
        })
    }

    /// 执行一组路径：文件直接执行，目录扫描其中的 .csv/.json
    pub async fn run_paths(&self, paths: &[PathBuf]) -> Result<RunReport> {
        let files = collect_case_files(paths)?;
        if files.is_empty() {
            return Err(ApicaseError::CaseFileError(
                "未找到任何用例文件".to_string(),
            ));
        }

        let mut report = RunReport::new();
        info!("本次运行 {} 个用例文件 (run_id: {})", files.len(), report.run_id);

        for file in files {
            match self.run_file(&file).await {
                Ok(file_result) => report.files.push(file_result),
                Err(e) => {
                    // 单个文件读取失败不中断整次运行
                    warn!("用例文件 {} 执行失败: {}", file.display(), e);
                    report.files.push(FileResult {
                        path: file,
                        results: Vec::new(),
                    });
                }
            }
        }

        Ok(report)
    }
}

/// 展开路径列表：目录替换为其中的用例文件
fn collect_case_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(CaseReader::discover_files(path)?);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}
