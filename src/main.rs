use clap::Parser;
use small_fx::core::engine::parse_amount;
use small_fx::core::{ConfigProvider, CurrencyCode};
use small_fx::utils::error::{ErrorSeverity, FxError};
use small_fx::utils::{logger, validation::Validate};
use small_fx::{
    CliConfig, ConversionEngine, Converter, FreeCurrencyApi, Outcome, RateStore, TomlConfig,
};
use std::sync::Arc;

fn exit_with(e: &FxError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 1,
        ErrorSeverity::Medium => 2, // 網路錯誤，可重試
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

fn print_outcome(outcome: &Outcome, amount: f64) -> bool {
    match outcome {
        Outcome::Applied(result) => {
            println!(
                "{} {} = {:.4} {}",
                amount,
                result.base,
                result.amount,
                result.target
            );
            println!("{}", result.display);
            true
        }
        Outcome::Superseded => false,
        Outcome::Failed(status) => {
            eprintln!("❌ {}", status.message);
            eprintln!("💡 {}", status.suggestion);
            false
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = CliConfig::parse();

    // 先載入設定檔，日誌格式可能由檔案決定
    if let Some(path) = config.config.clone() {
        match TomlConfig::from_file(&path) {
            Ok(file) => config = config.merge_file(&file),
            Err(e) => {
                eprintln!("❌ {}", e.user_friendly_message());
                std::process::exit(1);
            }
        }
    }

    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting small-fx CLI");
    if config.verbose {
        tracing::debug!("Endpoint: {}", config.api_endpoint());
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(&e);
    }

    let base = CurrencyCode::new(config.default_base()).unwrap_or_else(|e| exit_with(&e));
    let target = CurrencyCode::new(config.default_target()).unwrap_or_else(|e| exit_with(&e));

    let api = FreeCurrencyApi::from_config(&config).unwrap_or_else(|e| exit_with(&e));
    let engine = ConversionEngine::new(Arc::new(RateStore::new(api.clone())));
    let converter = Converter::new(engine, api, base, target);

    if config.list || config.search.is_some() {
        if let Err(e) = converter.load_currencies().await {
            exit_with(&e);
        }

        let keyword = config.search.as_deref().unwrap_or("");
        for currency in converter.filter(keyword).await {
            println!("{:<6} {}", currency.code.as_str(), currency.name);
        }
        return Ok(());
    }

    let outcome = converter.request_conversion(&config.amount).await;
    let mut ok = print_outcome(&outcome, parse_amount(&config.amount));

    if let (true, Outcome::Applied(first)) = (config.swap, &outcome) {
        let swapped = converter.swap_and_convert().await;
        ok = print_outcome(&swapped, first.amount);
    }

    if !ok {
        std::process::exit(2);
    }

    Ok(())
}
