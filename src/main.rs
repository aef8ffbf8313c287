// ==========================================
// 整车配置规划 - 命令行入口
// ==========================================
// 命令:
//   seed                          写入演示目录 (整体替换)
//   derive <region>               以缺省输入推导概率与产量
//   validate <region> C=V ...     校验一次配置选择
//   import <path> [--merge]       导入 .json / .xlsx / .xls / .csv / CSV 目录
//   export <path>                 导出 .json,或导出为 CSV 目录
// 环境变量: VC_PLANNER_DB (数据库路径), VC_PLANNER_LOG_JSON=1 (JSON 日志)
// ==========================================

use std::path::Path;

use anyhow::{anyhow, bail, Context};
use serde::Serialize;
use vc_planner::app::{get_default_db_path, AppState};
use vc_planner::domain::{Configuration, ImportMode};
use vc_planner::{logging, sample_data};

const USAGE: &str = "用法: vc-planner <seed | derive <region> | validate <region> CLASS=CHAR... | import <path> [--merge] | export <path>>";

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

fn parse_selection(args: &[String]) -> anyhow::Result<Configuration> {
    let mut configuration = Configuration::new();
    for arg in args {
        let (class_id, characteristic_id) = arg
            .split_once('=')
            .ok_or_else(|| anyhow!("无法解析选择 {} (应为 CLASS=CHAR)", arg))?;
        configuration.select(class_id.trim(), characteristic_id.trim());
    }
    Ok(configuration)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var("VC_PLANNER_LOG_JSON").map(|v| v == "1").unwrap_or(false) {
        logging::init_json();
    } else {
        logging::init();
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        bail!(USAGE);
    };

    let db_path = get_default_db_path();
    tracing::info!(version = vc_planner::VERSION, db_path = %db_path, "vc-planner 启动");
    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;

    match command.as_str() {
        "seed" => {
            let written = state
                .catalog_api
                .import_bundle(sample_data::sample_bundle(), ImportMode::Replace)?;
            print_json(&serde_json::json!({ "written": written }))?;
        }
        "derive" => {
            let region_id = args.get(1).context(USAGE)?;
            let inputs = state.probability_api.default_inputs(None)?;
            let result = state
                .probability_api
                .derive_probabilities(None, &inputs, region_id)?;
            print_json(&result)?;
        }
        "validate" => {
            let region_id = args.get(1).context(USAGE)?;
            let configuration = parse_selection(&args[2..])?;
            let result = state
                .configuration_api
                .evaluate_configuration(None, &configuration, region_id)?;
            print_json(&result)?;
        }
        "import" => {
            let path = Path::new(args.get(1).context(USAGE)?);
            let mode = if args.iter().any(|a| a == "--merge") {
                ImportMode::Merge
            } else {
                ImportMode::Replace
            };
            let summary = if is_json(path) {
                state.catalog_api.import_json_file(path, mode).await?
            } else {
                state.catalog_api.import_file(path, mode).await?
            };
            print_json(&summary)?;
        }
        "export" => {
            let path = Path::new(args.get(1).context(USAGE)?);
            if is_json(path) {
                let records = state.catalog_api.export_json_file(path).await?;
                print_json(&serde_json::json!({ "records": records }))?;
            } else {
                let files = state.catalog_api.export_csv_dir(path).await?;
                print_json(&files)?;
            }
        }
        other => bail!("未知命令 {}\n{}", other, USAGE),
    }

    Ok(())
}
