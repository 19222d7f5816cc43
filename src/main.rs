use clap::Parser;
use remote_calc::config::LogFormat;
use remote_calc::core::history::HistoryLog;
use remote_calc::domain::model::KNOWN_FUNCTIONS;
use remote_calc::domain::ports::ConfigProvider;
use remote_calc::utils::{logger, validation::Validate};
use remote_calc::{CliConfig, HttpEvaluator, Key, Machine, Notice, Session, SessionHandle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let settings = match cli.resolve() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(2);
        }
    };

    match settings.log_format {
        LogFormat::Compact => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(cli.verbose),
    }
    tracing::debug!("Settings: {:?}", settings);

    if let Err(e) = settings.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(2);
    }

    let evaluator = HttpEvaluator::from_config(&settings)?;
    let machine = Machine::new(
        HistoryLog::new(settings.history_capacity()),
        settings.response_policy(),
    );
    let (handle, mut notices, task) = Session::spawn(evaluator.clone(), machine);

    tracing::info!("Using calculation service at {}", settings.endpoint());
    println!("0");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            ":quit" | ":q" => break,
            ":history" => {
                for entry in handle.snapshot().await?.history {
                    println!("  {}", entry);
                }
                continue;
            }
            _ => {}
        }

        if let Some(expression) = line.strip_prefix(":expr") {
            match evaluator.evaluate_expression(expression.trim()).await {
                Ok(value) => println!("{}", remote_calc::core::number::format_number(value)),
                Err(e) => eprintln!("{}", e.user_friendly_message()),
            }
            continue;
        }

        run_line(&handle, line).await?;
        drain_notices(&mut notices);
        println!("{}", handle.snapshot().await?.display);
    }

    drop(handle);
    task.await?;
    drain_notices(&mut notices);
    Ok(())
}

/// Feeds one input line to the session, waiting for each answer before the
/// next key so chained operators see their resolved operand.
async fn run_line(handle: &SessionHandle, line: &str) -> remote_calc::Result<()> {
    for word in line.split_whitespace() {
        if KNOWN_FUNCTIONS.contains(&word) {
            handle.apply_function(word).await?;
            handle.settle().await?;
            continue;
        }
        for key in word.chars().filter_map(Key::from_char) {
            handle.press(key).await?;
            handle.settle().await?;
        }
    }
    Ok(())
}

fn drain_notices(notices: &mut UnboundedReceiver<Notice>) {
    while let Ok(notice) = notices.try_recv() {
        match notice {
            Notice::Committed { entry } => tracing::info!("{}", entry),
            Notice::Failed { error } => {
                tracing::warn!("Calculation failed: {}", error);
                eprintln!("{}", error.user_friendly_message());
            }
        }
    }
}
