use std::fs;
use std::process::ExitCode;

use sma_capital_engine::{
    config::Settings,
    models::{CalculationRequest, ParameterSet},
    services::sma_calculator::SmaCalculator,
    EngineError,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let settings = match Settings::new() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.clone())),
        )
        .init();

    info!("Starting SMA capital engine");

    match run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(EngineError::Validation(errors)) => {
            error!("calculation rejected with {} validation error(s)", errors.len());
            for e in &errors {
                error!("  {e}");
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("calculation failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(settings: &Settings) -> Result<(), EngineError> {
    let args: Vec<String> = std::env::args().collect();
    let request_path = match args.get(1) {
        Some(path) => path.clone(),
        None => {
            eprintln!("usage: sma-capital-engine <request.json> [parameters.json]");
            return Err(EngineError::Configuration(
                "no calculation request file given".to_string(),
            ));
        }
    };

    let request_text = fs::read_to_string(&request_path)
        .map_err(|e| EngineError::Configuration(format!("cannot read {request_path}: {e}")))?;
    let mut request: CalculationRequest = serde_json::from_str(&request_text)?;
    if request.run_id.trim().is_empty() {
        request.run_id = Uuid::new_v4().to_string();
        info!(run_id = %request.run_id, "generated run id");
    }

    let params = match args.get(2) {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| EngineError::Configuration(format!("cannot read {path}: {e}")))?;
            serde_json::from_str::<ParameterSet>(&text)?
        }
        None => ParameterSet::rbi_default(),
    };
    info!(parameter_version = %params.version, "parameters resolved");

    let calculator = SmaCalculator::new(params, settings.context())?;
    let outcome = calculator.calculate(&request)?;

    println!("{}", serde_json::to_string_pretty(&outcome.result)?);
    info!(
        run_id = %outcome.result.run_id,
        audit_hash = %outcome.audit.immutable_hash,
        "calculation recorded"
    );

    Ok(())
}
