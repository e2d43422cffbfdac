use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use currency_converter::exchange_rates::{export_rate_matrix_csv, RateService};
use currency_converter::widget::{
    render_error, render_result, Conversion, ConverterWidget, LoadingIndicator,
};
use currency_converter::{config, ConverterError, RateResolver};

#[derive(Parser)]
#[command(name = "currency-converter", version, about = "Convert amounts between currencies")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true, env = "CURRENCY_CONVERTER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert an amount from one currency to another
    Convert {
        /// Amount to convert
        amount: String,
        /// Source currency code
        #[arg(long)]
        from: Option<String>,
        /// Target currency code
        #[arg(long)]
        to: Option<String>,
        /// Swap source and target before converting
        #[arg(long)]
        swap: bool,
    },
    /// Show the exchange rate between two currencies
    Rate {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the supported currencies
    Currencies,
    /// Export the resolved rate of every currency pair to CSV
    ExportRates {
        #[arg(long, default_value = "output")]
        output: PathBuf,
    },
    /// Write the default config to a file
    InitConfig {
        #[arg(long, default_value = config::DEFAULT_CONFIG_FILE)]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

struct Spinner(Option<ProgressBar>);

impl LoadingIndicator for Spinner {
    fn show_loading(&mut self, loading: bool) {
        if loading {
            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
                spinner.set_style(style);
            }
            spinner.set_message("Fetching exchange rate...");
            spinner.enable_steady_tick(Duration::from_millis(100));
            self.0 = Some(spinner);
        } else if let Some(spinner) = self.0.take() {
            spinner.finish_and_clear();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "currency_converter=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    run(cli.command, cli.config.as_deref()).await
}

async fn run(command: Command, config_path: Option<&Path>) -> Result<()> {
    let load_config = || config::load(config_path);

    match command {
        Command::Convert {
            amount,
            from,
            to,
            swap,
        } => {
            let mut widget = ConverterWidget::from_config(&load_config()?);
            match convert(&mut widget, amount, from, to, swap).await {
                Ok(conversion) => println!("{}", render_result(&conversion)),
                Err(e) => {
                    eprintln!("{}", render_error(&e));
                    std::process::exit(1);
                }
            }
        }
        Command::Rate { from, to, json } => {
            let service = RateService::from_config(&load_config()?);
            let resolved = match service.get_exchange_rate(&from, &to).await {
                Ok(resolved) => resolved,
                Err(e) => {
                    eprintln!("{}", render_error(&e));
                    std::process::exit(1);
                }
            };
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "from": from.trim().to_uppercase(),
                        "to": to.trim().to_uppercase(),
                        "rate": resolved.rate,
                        "source": resolved.source,
                    }))?
                );
            } else {
                println!(
                    "1 {} = {:.6} {} ({})",
                    from.trim().to_uppercase(),
                    resolved.rate,
                    to.trim().to_uppercase(),
                    resolved.source
                );
            }
        }
        Command::Currencies => {
            let config = load_config()?;
            for option in ConverterWidget::dropdown_options() {
                let marker = if option.value == config.default_from.as_str() {
                    " (default from)"
                } else if option.value == config.default_to.as_str() {
                    " (default to)"
                } else {
                    ""
                };
                println!("{}{}", option.label, marker);
            }
        }
        Command::ExportRates { output } => {
            let resolver = RateResolver::from_config(&load_config()?);
            let csv_path = export_rate_matrix_csv(&resolver, &output)?;
            println!("✅ CSV file created at: {}", csv_path.display());
        }
        Command::InitConfig { path, force } => {
            if path.exists() && !force {
                anyhow::bail!("{} already exists, use --force to overwrite", path.display());
            }
            config::save_config(&config::Config::default(), &path)?;
            println!("✅ Default config written to {}", path.display());
        }
    }

    Ok(())
}

/// Apply the command-line selections to the widget, then convert
async fn convert(
    widget: &mut ConverterWidget,
    amount: String,
    from: Option<String>,
    to: Option<String>,
    swap: bool,
) -> Result<Conversion, ConverterError> {
    if let Some(from) = from {
        widget.select_from(&from)?;
    }
    if let Some(to) = to {
        widget.select_to(&to)?;
    }
    widget.set_amount(amount);
    if swap {
        widget.swap();
    }

    widget.convert(&mut Spinner(None)).await
}
