use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::assertion::evaluate_assertions;
use crate::collection::{Collection, Step};
use crate::http::{ExecError, Executor, RequestSnapshot, ResponseSnapshot};
use crate::runner::builder::RequestBuilder;
use crate::runner::types::{RunConfig, RunResult, StepOutcome, StepResult};
use crate::variable::{VariableStore, apply_extractions};

/// 协作式取消令牌
///
/// 只在 Step 之间检查；在途请求不打断，剩余 Step 记为 Skipped。
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Run 协调器
///
/// 串行驱动集合中的 Step；同一集合内不允许并行或乱序，
/// 后面的 Step 依赖前面提取出的变量。
/// 独立集合各自持有 VariableStore，可以在外层并行。
pub struct RunCoordinator {
    executor: Executor,
    config: RunConfig,
    cancel: CancelToken,
}

impl RunCoordinator {
    pub fn new(config: RunConfig) -> Self {
        let executor = Executor::new(config.timeout);
        Self {
            executor,
            config,
            cancel: CancelToken::new(),
        }
    }

    /// 取消令牌的句柄，供外层（如信号处理）触发
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// 驱动一次 Run：Pending → Running → Completed
    pub async fn run(&self, collection: &Collection, store: &mut VariableStore) -> RunResult {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let run_start = Instant::now();

        info!(
            collection = %collection.name,
            run_id = %run_id,
            steps = collection.steps.len(),
            "Run started"
        );

        let mut results = Vec::with_capacity(collection.steps.len());
        let mut abort = false;

        for (index, step) in collection.steps.iter().enumerate() {
            let step_number = index + 1;
            let name = step.display_name(step_number);

            if abort || self.cancel.is_cancelled() {
                results.push(StepResult::skipped(step_number, name));
                continue;
            }

            let result = self.execute_step(step, step_number, name, store).await;

            match result.outcome {
                StepOutcome::Passed => debug!(step = %result.name, "Step passed"),
                StepOutcome::Failed => {
                    warn!(step = %result.name, "Step failed");
                    if self.config.fail_fast {
                        abort = true;
                    }
                }
                StepOutcome::Skipped => {}
            }

            results.push(result);
        }

        let run = RunResult::finalize(
            collection.name.clone(),
            run_id,
            started_at,
            run_start.elapsed(),
            results,
        );

        info!(
            passed = run.totals.passed,
            failed = run.totals.failed,
            skipped = run.totals.skipped,
            duration_ms = run.duration_ms,
            "Run completed"
        );

        run
    }

    async fn execute_step(
        &self,
        step: &Step,
        step_number: usize,
        name: String,
        store: &mut VariableStore,
    ) -> StepResult {
        let started_at = Utc::now();
        let step_start = Instant::now();

        // 构建请求。未绑定变量只让本 Step 失败，零断言被求值
        let request = match RequestBuilder::build(step, store) {
            Ok(request) => request,
            Err(e) => {
                return StepResult::build_error(
                    step_number,
                    name,
                    started_at,
                    step_start.elapsed().as_millis() as u64,
                    e.to_string(),
                );
            }
        };

        let response = match self.send_with_retry(&request).await {
            Ok(response) => response,
            Err(e) => {
                return StepResult::transport_error(
                    step_number,
                    name,
                    started_at,
                    step_start.elapsed().as_millis() as u64,
                    request,
                    e.to_string(),
                );
            }
        };

        // 断言先于提取：Step 在自己的求值过程中看不到自己提取的变量
        let assertions = evaluate_assertions(&step.assertions, &response, store);
        let captures = apply_extractions(&step.extractions, &response, store);

        let passed = assertions.iter().all(|a| a.passed) && captures.all_succeeded();

        StepResult {
            step_number,
            name,
            outcome: if passed {
                StepOutcome::Passed
            } else {
                StepOutcome::Failed
            },
            started_at,
            duration_ms: step_start.elapsed().as_millis() as u64,
            request: Some(request),
            response: Some(response),
            error: None,
            assertions,
            extraction_failures: captures.failures,
            extractions_applied: captures.succeeded,
        }
    }

    /// 带显式上限的重试，只对传输错误重试
    async fn send_with_retry(
        &self,
        request: &RequestSnapshot,
    ) -> Result<ResponseSnapshot, ExecError> {
        let attempts = self.config.attempts.max(1);

        for attempt in 1..=attempts {
            match self.executor.execute(request).await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < attempts => {
                    warn!(attempt, error = %e, "Request failed, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        unreachable!("attempts is at least 1")
    }
}
