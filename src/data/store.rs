use std::collections::HashMap;

use tracing::debug;

/// 变量存储，作用域为一个测试会话（一个用例文件）
///
/// 用例按行顺序执行，前面用例提取的变量对后面的用例可见。
/// 文件之间由驱动器调用 `clear` 清空。
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    /// 变量映射表
    variables: HashMap<String, String>,
}

impl VariableStore {
    /// 创建新的空变量存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置变量
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        debug!("设置变量: {} = {}", key, value);
        self.variables.insert(key, value);
    }

    /// 获取变量值
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(|s| s.as_str())
    }

    /// 批量插入变量
    pub fn extend(&mut self, vars: HashMap<String, String>) {
        self.variables.extend(vars);
    }

    /// 清空所有变量（文件之间调用）
    pub fn clear(&mut self) {
        debug!("清空会话变量");
        self.variables.clear();
    }

    /// 当前所有变量的只读视图
    pub fn snapshot(&self) -> &HashMap<String, String> {
        &self.variables
    }

    /// 变量数量
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}
