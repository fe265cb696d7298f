use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::assertion::AssertionResult;
use crate::case::TestCase;
use crate::http::Response;

/// 单个用例的执行结果
#[derive(Debug, Clone)]
pub struct CaseResult {
    /// 用例序号（文件内从 1 开始）
    pub case_number: usize,

    pub case_id: String,
    pub case_name: String,

    /// HTTP 方法
    pub method: String,

    /// 替换变量后的请求 URL
    pub url: String,

    /// 响应状态码（收到响应时）
    pub status: Option<u16>,

    /// 执行耗时
    pub duration: Duration,

    /// 是否成功（无错误且所有断言通过）
    pub success: bool,

    /// 错误消息（请求构造或网络层失败）
    pub error: Option<String>,

    /// 是否被跳过（enabled = false）
    pub skipped: bool,

    /// 断言结果列表
    pub assertions: Vec<AssertionResult>,

    /// 完整的 HTTP 响应（用于详细输出）
    pub response: Option<Response>,
}

impl CaseResult {
    pub fn completed(
        case_number: usize,
        case: &TestCase,
        url: String,
        duration: Duration,
        assertions: Vec<AssertionResult>,
        response: Response,
    ) -> Self {
        let success = assertions.iter().all(|a| a.passed);
        Self {
            case_number,
            case_id: case.case_id.clone(),
            case_name: case.case_name.clone(),
            method: case.method.clone(),
            url,
            status: Some(response.status.code()),
            duration,
            success,
            error: None,
            skipped: false,
            assertions,
            response: Some(response),
        }
    }

    pub fn error(
        case_number: usize,
        case: &TestCase,
        url: String,
        error: String,
        duration: Duration,
    ) -> Self {
        Self {
            case_number,
            case_id: case.case_id.clone(),
            case_name: case.case_name.clone(),
            method: case.method.clone(),
            url,
            status: None,
            duration,
            success: false,
            error: Some(error),
            skipped: false,
            assertions: Vec::new(),
            response: None,
        }
    }

    pub fn skipped(case_number: usize, case: &TestCase) -> Self {
        Self {
            case_number,
            case_id: case.case_id.clone(),
            case_name: case.case_name.clone(),
            method: case.method.clone(),
            url: case.url.clone(),
            status: None,
            duration: Duration::from_secs(0),
            success: true, // 跳过的用例算作成功
            error: None,
            skipped: true,
            assertions: Vec::new(),
            response: None,
        }
    }

    /// 用例显示名: "case_id - case_name"
    pub fn display_name(&self) -> String {
        match (self.case_id.is_empty(), self.case_name.is_empty()) {
            (false, false) => format!("{} - {}", self.case_id, self.case_name),
            (false, true) => self.case_id.clone(),
            (true, false) => self.case_name.clone(),
            (true, true) => "<unnamed>".to_string(),
        }
    }
}

/// 单个用例文件的执行结果
#[derive(Debug, Clone)]
pub struct FileResult {
    pub path: PathBuf,
    pub results: Vec<CaseResult>,
}

/// 整个运行的结果
#[derive(Debug, Clone)]
pub struct RunReport {
    /// 运行 ID (UUID)
    pub run_id: String,

    /// 运行开始时间
    pub started_at: DateTime<Utc>,

    pub files: Vec<FileResult>,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            files: Vec::new(),
        }
    }

    pub fn summary(&self) -> RunSummary {
        let results: Vec<&CaseResult> = self.files.iter().flat_map(|f| &f.results).collect();
        RunSummary::from_results(&results)
    }

    /// 所有用例是否都通过
    pub fn all_passed(&self) -> bool {
        self.files
            .iter()
            .flat_map(|f| &f.results)
            .all(|r| r.success)
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

/// 运行摘要
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total_duration: Duration,
    pub total_assertions: usize,
    pub passed_assertions: usize,
    pub failed_assertions: usize,
}

impl RunSummary {
    pub fn from_results(results: &[&CaseResult]) -> Self {
        let passed = results.iter().filter(|r| r.success && !r.skipped).count();
        let skipped = results.iter().filter(|r| r.skipped).count();
        let total_duration = results.iter().map(|r| r.duration).sum();

        // 统计断言
        let total_assertions = results.iter().map(|r| r.assertions.len()).sum();
        let passed_assertions = results
            .iter()
            .flat_map(|r| &r.assertions)
            .filter(|a| a.passed)
            .count();
        let failed_assertions = results
            .iter()
            .flat_map(|r| &r.assertions)
            .filter(|a| !a.passed)
            .count();

        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed - skipped,
            skipped,
            total_duration,
            total_assertions,
            passed_assertions,
            failed_assertions,
        }
    }
}
