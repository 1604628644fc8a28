use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};

use postrun::collection::{self, Environment};
use postrun::report::{ConsoleReporter, ReportWriter};
use postrun::runner::{RunConfig, RunCoordinator, RunResult};

/// 退出码：全部 Step 通过
pub const EXIT_OK: i32 = 0;
/// 退出码：存在失败的 Step
pub const EXIT_TEST_FAILURES: i32 = 1;
/// 退出码：运维错误（文件缺失、集合非法、报告写入失败）
pub const EXIT_OPERATIONAL: i32 = 2;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 执行一个或多个集合
    Run {
        /// 集合文件路径，按给定顺序执行
        #[arg(required = true)]
        collections: Vec<PathBuf>,

        /// 环境文件 (TOML)，提供种子变量
        #[arg(long)]
        env: Option<PathBuf>,

        /// 报告输出目录
        #[arg(long, default_value = "reports")]
        out: PathBuf,

        /// 要生成的报告格式，逗号分隔
        #[arg(long, value_delimiter = ',', default_value = "console")]
        report: Vec<ReportFormat>,

        /// 单个请求的超时（秒）
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        /// 每个请求的尝试次数上限（含首次）
        #[arg(long, default_value_t = 1)]
        attempts: u32,

        /// 第一个失败后跳过剩余 Step
        #[arg(long)]
        fail_fast: bool,

        /// 变量覆盖 key=value，可重复
        #[arg(long = "var")]
        vars: Vec<String>,

        /// 显示全部断言结果，而不只是失败的
        #[arg(short, long)]
        verbose: bool,
    },

    /// 校验集合文件结构，不执行
    Validate {
        #[arg(required = true)]
        collections: Vec<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Json,
    Human,
    Console,
}

pub async fn run(cli: Cli) -> i32 {
    match cli.command {
        Commands::Run {
            collections,
            env,
            out,
            report,
            timeout,
            attempts,
            fail_fast,
            vars,
            verbose,
        } => {
            run_collections(
                &collections,
                env,
                out,
                &report,
                RunConfig {
                    timeout: Duration::from_secs(timeout),
                    attempts,
                    fail_fast,
                },
                &vars,
                verbose,
            )
            .await
        }
        Commands::Validate { collections } => validate_collections(&collections),
    }
}

async fn run_collections(
    collections: &[PathBuf],
    env: Option<PathBuf>,
    out: PathBuf,
    formats: &[ReportFormat],
    config: RunConfig,
    vars: &[String],
    verbose: bool,
) -> i32 {
    let mut overrides = Vec::new();
    for raw in vars {
        match Environment::parse_cli_var(raw) {
            Some(pair) => overrides.push(pair),
            None => {
                error!("Invalid --var '{}', expected key=value", raw);
                return EXIT_OPERATIONAL;
            }
        }
    }

    let environment = match &env {
        Some(path) => match Environment::load_from_path(path) {
            Ok(environment) => environment,
            Err(e) => {
                error!("{}", e);
                return EXIT_OPERATIONAL;
            }
        },
        None => Environment::default(),
    };

    let coordinator = RunCoordinator::new(config);
    let writer = ReportWriter::new(&out);
    let reporter = ConsoleReporter::new(verbose);

    // Ctrl-C 协作式取消：只在 Step 之间生效，在途请求不打断
    let cancel = coordinator.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let mut all_passed = true;

    // 集合之间互不共享变量仓库，按参数顺序依次执行
    for path in collections {
        let collection = match collection::load_file(path) {
            Ok(collection) => collection,
            Err(e) => {
                error!("{}", e);
                return EXIT_OPERATIONAL;
            }
        };

        let mut store = environment.seed_store(&overrides);
        let run = coordinator.run(&collection, &mut store).await;

        if formats.contains(&ReportFormat::Console) {
            reporter.print_run(&run);
        }

        if formats.contains(&ReportFormat::Json) || formats.contains(&ReportFormat::Human) {
            if let Err(e) = write_artifacts(&writer, &run, formats) {
                error!("Failed to write report: {}", e);
                return EXIT_OPERATIONAL;
            }
        }

        if !run.all_passed() {
            all_passed = false;
        }
    }

    if all_passed {
        EXIT_OK
    } else {
        EXIT_TEST_FAILURES
    }
}

fn write_artifacts(
    writer: &ReportWriter,
    run: &RunResult,
    formats: &[ReportFormat],
) -> postrun::Result<()> {
    if formats.contains(&ReportFormat::Json) {
        let path = writer.write_json(run)?;
        info!("Structured report: {}", path.display());
    }
    if formats.contains(&ReportFormat::Human) {
        let path = writer.write_human(run)?;
        info!("Report: {}", path.display());
    }
    writer.append_index(run)?;
    Ok(())
}

fn validate_collections(collections: &[PathBuf]) -> i32 {
    let mut all_valid = true;

    for path in collections {
        match collection::load_file(path) {
            Ok(collection) => {
                println!("{}: ok ({} steps)", path.display(), collection.steps.len());
            }
            Err(e) => {
                all_valid = false;
                eprintln!("{}", e);
            }
        }
    }

    if all_valid { EXIT_OK } else { EXIT_OPERATIONAL }
}
