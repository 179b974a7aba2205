//! Market breadth CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 가장 최근 레코드 점수
//! breadth score -i data/breadth.json
//!
//! # 기간 점수
//! breadth score -i data/breadth.json -f 2025-01-01 -t 2025-03-31 -a sector_weighted
//!
//! # BIDBACK 사이징
//! breadth size --up4 1200 --down4 200 --t2108 15 --vix 12 --portfolio 100000
//!
//! # 청산 계획
//! breadth exit-plan --entry-date 2025-03-06 --entry-price 100 --vix 18 --true-range 2.5
//!
//! # 데이터 품질 보고서
//! breadth quality -i data/breadth.json
//! ```

use anyhow::{anyhow, Context, Result};
use breadth_core::{init_logging, AlgorithmType};
use breadth_engine::AppConfig;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

mod commands;

use commands::exit_plan::{run_exit_plan, ExitPlanArgs};
use commands::parse_date;
use commands::score::{run_plan, run_quality, run_score, run_validate, PlanArgs, ScoreArgs};
use commands::size::{run_size, SizeArgs};
use commands::tiers::{run_algorithms, run_tiers};

#[derive(Parser)]
#[command(name = "breadth")]
#[command(about = "Market breadth scoring and BIDBACK position sizing", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 (없으면 기본값)
    #[arg(short, long, global = true, default_value = "config/default.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// breadth 점수 계산 (기간을 주지 않으면 가장 최근 레코드)
    Score {
        /// 원시 레코드 JSON 파일
        #[arg(short, long)]
        input: PathBuf,

        /// 알고리즘 (six_factor, normalized, sector_weighted, custom)
        #[arg(short, long)]
        algorithm: Option<AlgorithmType>,

        /// 시작 날짜 (YYYY-MM-DD)
        #[arg(short = 'f', long)]
        from: Option<String>,

        /// 종료 날짜 (YYYY-MM-DD)
        #[arg(short, long)]
        to: Option<String>,
    },

    /// 원시 레코드 검증
    Validate {
        /// 원시 레코드 JSON 파일
        #[arg(short, long)]
        input: PathBuf,
    },

    /// BIDBACK 포지션 사이징
    Size {
        /// 당일 4% 이상 상승 종목 수
        #[arg(long)]
        up4: u32,

        /// 당일 4% 이상 하락 종목 수
        #[arg(long, default_value = "0")]
        down4: u32,

        /// T2108 (0~100)
        #[arg(long)]
        t2108: f64,

        /// VIX
        #[arg(long)]
        vix: f64,

        /// 포트폴리오 규모
        #[arg(long)]
        portfolio: Decimal,

        /// 기본 비중 (예: 0.10)
        #[arg(long)]
        base_pct: Option<Decimal>,
    },

    /// 진입일/가격 기준 청산 계획
    #[command(alias = "exit")]
    ExitPlan {
        /// 진입일 (YYYY-MM-DD)
        #[arg(long)]
        entry_date: String,

        /// 진입 가격
        #[arg(long)]
        entry_price: Decimal,

        /// VIX
        #[arg(long)]
        vix: f64,

        /// 진입일 true range (가격 단위)
        #[arg(long)]
        true_range: Option<Decimal>,

        /// 진입 시점 T2108 (손절 breadth 보정)
        #[arg(long)]
        t2108: Option<f64>,
    },

    /// 가장 최근 레코드로 사이징과 청산 계획을 함께 계산
    Plan {
        /// 원시 레코드 JSON 파일
        #[arg(short, long)]
        input: PathBuf,

        /// VIX
        #[arg(long)]
        vix: f64,

        /// 포트폴리오 규모
        #[arg(long)]
        portfolio: Decimal,

        /// 기본 비중 (예: 0.10)
        #[arg(long)]
        base_pct: Option<Decimal>,

        /// 진입일 (YYYY-MM-DD)
        #[arg(long)]
        entry_date: String,

        /// 진입 가격
        #[arg(long)]
        entry_price: Decimal,

        /// 진입일 true range (가격 단위)
        #[arg(long)]
        true_range: Option<Decimal>,
    },

    /// 레코드 파일의 데이터 품질 보고서
    Quality {
        /// 원시 레코드 JSON 파일
        #[arg(short, long)]
        input: PathBuf,
    },

    /// BIDBACK 규칙 표 출력
    Tiers,

    /// 점수 알고리즘 목록
    Algorithms,
}

fn load_config(path: &Path) -> Result<AppConfig> {
    let config = if path.exists() {
        AppConfig::load(path).with_context(|| format!("failed to load {}", path.display()))?
    } else {
        AppConfig::default()
    };
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    init_logging(config.logging.clone()).map_err(|e| anyhow!("logging init failed: {}", e))?;
    if !cli.config.exists() {
        warn!(path = %cli.config.display(), "Config file not found; using defaults");
    }

    let outcome = match cli.command {
        Commands::Score {
            input,
            algorithm,
            from,
            to,
        } => {
            let args = ScoreArgs {
                input,
                algorithm,
                from: from.as_deref().map(parse_date).transpose()?,
                to: to.as_deref().map(parse_date).transpose()?,
            };
            run_score(&config, args).await
        }

        Commands::Validate { input } => run_validate(&config, &input),

        Commands::Size {
            up4,
            down4,
            t2108,
            vix,
            portfolio,
            base_pct,
        } => run_size(
            &config,
            SizeArgs {
                up4,
                down4,
                t2108,
                vix,
                portfolio,
                base_pct,
            },
        ),

        Commands::ExitPlan {
            entry_date,
            entry_price,
            vix,
            true_range,
            t2108,
        } => run_exit_plan(
            &config,
            ExitPlanArgs {
                entry_date: parse_date(&entry_date)?,
                entry_price,
                vix,
                true_range,
                t2108,
            },
        ),

        Commands::Plan {
            input,
            vix,
            portfolio,
            base_pct,
            entry_date,
            entry_price,
            true_range,
        } => {
            let args = PlanArgs {
                input,
                vix,
                portfolio,
                base_pct,
                entry_date: parse_date(&entry_date)?,
                entry_price,
                true_range,
            };
            run_plan(&config, args).await
        }

        Commands::Quality { input } => run_quality(&config, &input),

        Commands::Tiers => run_tiers(),

        Commands::Algorithms => run_algorithms(),
    };

    if let Err(e) = &outcome {
        error!("Command failed: {:#}", e);
    }
    outcome
}
