use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::assertion::AssertHandler;
use crate::case::TestCase;
use crate::data::{ExtractSpec, Extracted, VariableResolver, VariableStore};
use crate::http::types::join_base_url;
use crate::http::{Client, Request, Response};
use crate::runner::types::CaseResult;

/// 单用例执行器
///
/// 一条用例的完整流程：变量替换 → 字段解析 → 发送请求 →
/// 断言 → 提取变量写回存储。
pub struct TestExecutor {
    client: Client,
    base_url: String,
}

impl TestExecutor {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// 执行单个用例，提取出的变量写入 store 供后续用例使用
    pub async fn execute_case(
        &self,
        case_number: usize,
        case: &TestCase,
        store: &mut VariableStore,
    ) -> CaseResult {
        if !case.enabled {
            info!("用例 {} 未启用，跳过", case.display_name());
            return CaseResult::skipped(case_number, case);
        }

        info!("开始执行测试用例: {}", case.display_name());
        let start = Instant::now();

        // 1. 替换请求各字段中的变量
        let url = VariableResolver::substitute(&case.url, store);
        let headers_str = VariableResolver::substitute(&case.headers, store);
        let params_str = VariableResolver::substitute(&case.params, store);
        let body_str = VariableResolver::substitute(&case.body, store);

        // 2. headers/params 解析为字符串键值对
        let headers = parse_string_map(&headers_str, "headers");
        let params = parse_string_map(&params_str, "params");

        // 3. 构造请求
        let full_url = join_base_url(&self.base_url, &url);
        let mut request = match Request::new(&case.method, &full_url) {
            Ok(req) => req,
            Err(e) => {
                return CaseResult::error(
                    case_number,
                    case,
                    full_url,
                    format!("构造请求失败: {}", e),
                    start.elapsed(),
                );
            }
        };

        let content_type = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.to_lowercase())
            .unwrap_or_default();

        for (key, value) in &headers {
            request = request.with_header(key, value);
        }
        for (key, value) in &params {
            request = request.with_query(key, value);
        }
        request = attach_body(request, &content_type, &body_str);

        // 4. 发送
        let response = match self.client.execute(&request).await {
            Ok(resp) => resp,
            Err(e) => {
                return CaseResult::error(
                    case_number,
                    case,
                    request.full_url(),
                    format!("请求发送失败: {}", e),
                    start.elapsed(),
                );
            }
        };

        // 5. 断言，按表格列的顺序执行
        let assertions = self.run_assertions(case, &response);

        // 6. 提取变量（断言失败也执行，响应已经拿到）
        self.apply_extraction(case, &response, store);

        let duration = start.elapsed();
        let result = CaseResult::completed(
            case_number,
            case,
            request.full_url(),
            duration,
            assertions,
            response,
        );
        info!(
            "测试用例执行完成: {} ({})",
            case.display_name(),
            if result.success { "通过" } else { "失败" }
        );
        result
    }

    fn run_assertions(
        &self,
        case: &TestCase,
        response: &Response,
    ) -> Vec<crate::assertion::AssertionResult> {
        let mut assertions = Vec::new();

        if !case.expected_status.trim().is_empty() {
            assertions.push(AssertHandler::assert_status(response, &case.expected_status));
        }

        if !case.expected_content.trim().is_empty() {
            assertions.push(AssertHandler::assert_content_contains(
                response,
                &case.expected_content,
            ));
        }

        if !case.json_path.trim().is_empty() && !case.expected_json_value.trim().is_empty() {
            assertions.push(AssertHandler::assert_json_value(
                response,
                case.json_path.trim(),
                case.expected_json_value.trim(),
            ));
        }

        assertions
    }

    /// 按 extract_key 提取变量写入存储
    ///
    /// `name=path` 形式自带变量名；纯路径形式存入 save_var_name；
    /// 多条规则的结果逐个写入。
    fn apply_extraction(&self, case: &TestCase, response: &Response, store: &mut VariableStore) {
        let Some(spec) = ExtractSpec::parse(&case.extract_key) else {
            return;
        };

        let body_json = response.json();
        match spec.apply(body_json.as_ref(), &response.body) {
            Extracted::Single(value) => {
                if value.is_empty() {
                    warn!("变量提取失败，未提取到值: {}", case.extract_key);
                    return;
                }
                let name = case.save_var_name.trim();
                if name.is_empty() {
                    warn!("提取键格式不正确: {} (缺少 save_var_name)", case.extract_key);
                    return;
                }
                info!("变量提取成功: {} = {}", name, value);
                store.set(name, value);
            }
            Extracted::Many(pairs) => {
                for (name, value) in pairs {
                    info!("变量提取成功: {} = {}", name, value);
                    store.set(name, value);
                }
            }
        }

        debug!("当前变量: {:?}", store.snapshot());
    }
}

/// 把 JSON 对象字符串解析为键值对，值统一转成字符串
///
/// 解析失败打印警告并返回空列表，与表格里留空等价。
fn parse_string_map(text: &str, field_name: &str) -> Vec<(String, String)> {
    let text = text.trim();
    if text.is_empty() || text == "{}" {
        return Vec::new();
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => map
            .into_iter()
            .map(|(k, v)| (k, value_to_string(&v)))
            .collect(),
        Ok(_) => {
            warn!("{} 不是 JSON 对象，忽略: {}", field_name, text);
            Vec::new()
        }
        Err(e) => {
            warn!("{} JSON 解析失败: {}, 按空处理", field_name, e);
            Vec::new()
        }
    }
}

/// 请求体按 Content-Type 选择发送模式
///
/// - text/plain: 原样发送
/// - form: JSON 对象转字段，其余原样
/// - 默认: 尝试按 JSON 发送；无 Content-Type 的 JSON 对象转表单（与历史行为一致）
fn attach_body(request: Request, content_type: &str, body_str: &str) -> Request {
    let body = body_str.trim();
    if body.is_empty() {
        return request;
    }

    if content_type.contains("text/plain") {
        debug!("Content-Type 为 text/plain，body 作为纯文本发送");
        return request.with_text(body_str);
    }

    if content_type.contains("application/x-www-form-urlencoded") {
        return match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => {
                let fields = map
                    .into_iter()
                    .map(|(k, v)| (k, value_to_string(&v)))
                    .collect();
                request.with_form(fields)
            }
            _ => {
                debug!("form body 不是 JSON 对象，按原始字符串发送");
                request.with_text(body_str)
            }
        };
    }

    match serde_json::from_str::<Value>(body) {
        Ok(value) => {
            if content_type.is_empty() {
                if let Value::Object(map) = value {
                    // 未声明 Content-Type 的 JSON 对象按表单发送
                    let fields = map
                        .into_iter()
                        .map(|(k, v)| (k, value_to_string(&v)))
                        .collect();
                    return request.with_form(fields);
                }
                return request.with_json(value);
            }
            request.with_json(value)
        }
        Err(e) => {
            warn!("body JSON 解析失败: {}, 按纯文本发送", e);
            request.with_text(body_str)
        }
    }
}

/// JSON 值转字符串：字符串不带引号，其余用紧凑 JSON
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
