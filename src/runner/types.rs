use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::assertion::AssertionOutcome;
use crate::http::{RequestSnapshot, ResponseSnapshot};

/// 一次 Run 的配置
///
/// 显式传入 RunCoordinator，不放全局可变状态。
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// 单个请求的超时时间
    pub timeout: Duration,

    /// 每个请求的尝试次数上限（含首次，>= 1）
    pub attempts: u32,

    /// 失败后跳过剩余 Step
    pub fail_fast: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            attempts: 1,
            fail_fast: false,
        }
    }
}

/// Run 状态机
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Pending,
    Running,
    Completed,
}

/// Step 的三态结果
///
/// Skipped 不算通过也不算失败。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    Passed,
    Failed,
    Skipped,
}

/// 单个 Step 的执行结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Step 序号（从 1 开始）
    pub step_number: usize,

    /// Step 名称（声明的名字或自动生成）
    pub name: String,

    pub outcome: StepOutcome,

    /// 开始执行的时间
    pub started_at: DateTime<Utc>,

    /// 整个 Step 的耗时（构建 + 请求 + 断言 + 提取）
    pub duration_ms: u64,

    /// 解析完成的请求（构建失败时为 None）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestSnapshot>,

    /// 响应快照（传输失败时为 None）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseSnapshot>,

    /// 构建或传输错误消息
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// 断言结果，按声明顺序
    #[serde(default)]
    pub assertions: Vec<AssertionOutcome>,

    /// 提取失败消息
    #[serde(default)]
    pub extraction_failures: Vec<String>,

    /// 成功应用的提取数
    #[serde(default)]
    pub extractions_applied: usize,
}

impl StepResult {
    /// 被跳过的 Step（fail-fast 或取消）
    pub fn skipped(step_number: usize, name: String) -> Self {
        Self {
            step_number,
            name,
            outcome: StepOutcome::Skipped,
            started_at: Utc::now(),
            duration_ms: 0,
            request: None,
            response: None,
            error: None,
            assertions: Vec::new(),
            extraction_failures: Vec::new(),
            extractions_applied: 0,
        }
    }

    /// 请求构建失败：零断言，Step 直接判失败
    pub fn build_error(
        step_number: usize,
        name: String,
        started_at: DateTime<Utc>,
        duration_ms: u64,
        error: String,
    ) -> Self {
        Self {
            step_number,
            name,
            outcome: StepOutcome::Failed,
            started_at,
            duration_ms,
            request: None,
            response: None,
            error: Some(error),
            assertions: Vec::new(),
            extraction_failures: Vec::new(),
            extractions_applied: 0,
        }
    }

    /// 传输失败（超时或网络错误）
    pub fn transport_error(
        step_number: usize,
        name: String,
        started_at: DateTime<Utc>,
        duration_ms: u64,
        request: RequestSnapshot,
        error: String,
    ) -> Self {
        Self {
            step_number,
            name,
            outcome: StepOutcome::Failed,
            started_at,
            duration_ms,
            request: Some(request),
            response: None,
            error: Some(error),
            assertions: Vec::new(),
            extraction_failures: Vec::new(),
            extractions_applied: 0,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.outcome == StepOutcome::Failed
    }

    /// 响应延迟（毫秒）；没有响应时退回整个 Step 的耗时
    pub fn latency_ms(&self) -> u64 {
        self.response
            .as_ref()
            .map(|r| r.duration_ms)
            .unwrap_or(self.duration_ms)
    }
}

/// 聚合计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunTotals {
    pub fn from_steps(steps: &[StepResult]) -> Self {
        let passed = steps
            .iter()
            .filter(|s| s.outcome == StepOutcome::Passed)
            .count();
        let failed = steps
            .iter()
            .filter(|s| s.outcome == StepOutcome::Failed)
            .count();
        let skipped = steps
            .iter()
            .filter(|s| s.outcome == StepOutcome::Skipped)
            .count();

        Self {
            total: steps.len(),
            passed,
            failed,
            skipped,
        }
    }
}

/// 一次 Run 的完整结果
///
/// 在 Run 结束时定稿，之后不再变化；报告只是它的只读视图。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// 集合名称
    pub collection: String,

    /// 本次 Run 的唯一 ID (UUID)
    pub run_id: String,

    pub state: RunState,

    pub started_at: DateTime<Utc>,

    /// Run 开始到结束的实测耗时，不是各 Step 之和
    pub duration_ms: u64,

    pub totals: RunTotals,

    pub steps: Vec<StepResult>,
}

impl RunResult {
    /// 定稿：计算聚合计数并进入 Completed 状态
    pub fn finalize(
        collection: String,
        run_id: String,
        started_at: DateTime<Utc>,
        duration: Duration,
        steps: Vec<StepResult>,
    ) -> Self {
        Self {
            collection,
            run_id,
            state: RunState::Completed,
            started_at,
            duration_ms: duration.as_millis() as u64,
            totals: RunTotals::from_steps(&steps),
            steps,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.totals.failed == 0
    }
}
