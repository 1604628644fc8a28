use crate::error::Result;
use crate::runner::RunResult;

/// 渲染结构化报告
///
/// RunResult 的无损 JSON 视图；对同一个 RunResult 重复渲染，
/// 输出逐字节相同。不修改 RunResult。
pub fn render(run: &RunResult) -> Result<String> {
    serde_json::to_string_pretty(run).map_err(Into::into)
}

/// 解析结构化报告，重建出与原值相等的 RunResult
pub fn parse(content: &str) -> Result<RunResult> {
    serde_json::from_str(content).map_err(Into::into)
}
