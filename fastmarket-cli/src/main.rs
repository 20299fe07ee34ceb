use std::path::PathBuf;
use std::process::ExitCode;

use alloy::signers::local::PrivateKeySigner;
use chrono::{DateTime, Utc};
use clap::Parser;
use comfy_table::{presets::UTF8_BORDERS_ONLY, Table};
use eyre::{Context, Result};
use fastmarket::commands::bridge::{place_fast_market_order, FeeStrategy, OrderRequest};
use fastmarket::config::{ARBITRUM_SEPOLIA, OPTIMISM_SEPOLIA};
use fastmarket::rpc::{diagnose, FailureDiagnostics, RpcLedger};
use fastmarket::{EndpointConfig, FastMarketClient, Ledger, NetworkTable};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Parser)]
#[command(name = "fastmarket-cli")]
#[command(about = "Place fast market orders on a cross-chain token router")]
struct Cli {
    /// Env file holding PRIVATE_KEY (an absent `.env` is ignored)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Network table (.json or .toml) to use instead of the built-in testnets
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    verbose: clap_verbosity::Verbosity<clap_verbosity::InfoLevel>,

    /// Defaults to `place-order` with its default arguments
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Parser)]
enum Commands {
    /// Approve the router if needed, then place a fast market order
    PlaceOrder(OrderArgs),
    /// Show the router's fast transfer parameters and the minimum max fee
    FeeParameters {
        /// Network to query, by wormhole chain ID or name
        #[arg(long, default_value_t = ARBITRUM_SEPOLIA.to_string())]
        network: String,
    },
    /// List configured networks
    Networks,
    /// Show the address of the signing wallet
    Address,
}

#[derive(Debug, Parser)]
struct OrderArgs {
    /// Origin network, by wormhole chain ID or name
    #[arg(long, default_value_t = ARBITRUM_SEPOLIA.to_string())]
    from: String,
    /// Destination wormhole chain ID
    #[arg(long, default_value_t = OPTIMISM_SEPOLIA)]
    to: u16,
    /// Amount in the token's smallest unit (100 USDC is the router minimum)
    #[arg(long, default_value_t = 101_000_000)]
    amount: u64,
    /// Recipient address on the destination chain
    #[arg(long, default_value = "0x08Ab1Ce3686cb7E616af2D3E068356B160c4c038")]
    recipient: String,
    /// Payload delivered to the recipient
    #[arg(long, default_value = "Epoch Test")]
    message: String,
    /// Fixed max fee in the token's smallest unit
    #[arg(long, default_value_t = 100_000, conflicts_with = "query_fee")]
    max_fee: u64,
    /// Query the router and pay its minimum fee instead of --max-fee
    #[arg(long)]
    query_fee: bool,
    /// Seconds from now until the order expires
    #[arg(long, default_value_t = 3600)]
    deadline_secs: u32,
}

impl Default for OrderArgs {
    fn default() -> Self {
        OrderArgs::parse_from(["place-order"])
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Configure log level based on verbosity flag
    let log_level = if cli.verbose.is_silent() {
        Level::ERROR
    } else {
        match cli.verbose.log_level_filter() {
            log::LevelFilter::Off => Level::ERROR,
            log::LevelFilter::Error => Level::ERROR,
            log::LevelFilter::Warn => Level::WARN,
            log::LevelFilter::Info => Level::INFO,
            log::LevelFilter::Debug => Level::DEBUG,
            log::LevelFilter::Trace => Level::TRACE,
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set global subscriber: {e}");
        return ExitCode::FAILURE;
    }

    let silent = cli.verbose.is_silent();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_failure(&e, silent);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut builder = FastMarketClient::builder();
    if let Some(path) = cli.env_file {
        builder = builder.with_env_file(path);
    }
    if let Some(path) = cli.config {
        builder = builder.with_config_file(path);
    }
    let client = builder.build()?;

    match cli.command.unwrap_or_else(|| Commands::PlaceOrder(OrderArgs::default())) {
        Commands::PlaceOrder(args) => {
            let origin = client.endpoint(&args.from)?;
            let privkey = client.private_key()?;

            let deadline = deadline_from_now(args.deadline_secs)?;
            let fee = if args.query_fee {
                FeeStrategy::Query
            } else {
                FeeStrategy::Fixed(args.max_fee)
            };
            let request = OrderRequest::new(
                args.amount,
                args.to,
                &args.recipient,
                args.message.clone().into_bytes(),
                deadline,
            )?;

            info!("Sending fast market order from {} to chain {}", origin.network, args.to);
            println!("{}", order_table(origin, &args, &fee, deadline));

            let ledger = RpcLedger::connect(origin, &privkey)?;
            let result = place_fast_market_order(&ledger, request, fee).await?;
            info!("{result}");

            println!("Sequence: {}", result.sequence);
            println!("Fast Sequence: {}", result.fast_sequence);
            println!("Protocol Sequence: {}", result.protocol_sequence);
            println!("View on Wormhole Explorer: {}", result.explorer_url());
        }
        Commands::FeeParameters { network } => {
            let endpoint = client.endpoint(&network)?;
            let privkey = client.private_key()?;
            let ledger = RpcLedger::connect(endpoint, &privkey)?;

            let params = ledger.fast_transfer_parameters().await?;
            let mut table = Table::new();
            table
                .load_preset(UTF8_BORDERS_ONLY)
                .set_header(vec!["Parameter", "Value"])
                .add_row(vec!["Enabled".to_string(), params.enabled.to_string()])
                .add_row(vec!["Max Amount".to_string(), params.max_amount.to_string()])
                .add_row(vec!["Base Fee".to_string(), params.base_fee.to_string()])
                .add_row(vec![
                    "Init Auction Fee".to_string(),
                    params.init_auction_fee.to_string(),
                ])
                .add_row(vec!["Minimum Max Fee".to_string(), params.minimum_fee()?.to_string()]);
            println!("Fast transfer parameters on {}:", endpoint.network);
            println!("{table}");
        }
        Commands::Networks => {
            println!("{}", networks_table(client.networks()));
        }
        Commands::Address => {
            let signer = client
                .private_key()?
                .parse::<PrivateKeySigner>()
                .wrap_err("invalid private key")?;
            println!("Wallet address: {}", signer.address());
        }
    }

    Ok(())
}

/// Absolute Unix deadline `secs` from now
fn deadline_from_now(secs: u32) -> Result<u32> {
    let deadline = Utc::now().timestamp() + i64::from(secs);
    u32::try_from(deadline).wrap_err_with(|| format!("deadline {deadline} does not fit in uint32"))
}

/// Format a Unix timestamp as a human-readable datetime string
fn format_deadline(timestamp: u32) -> String {
    DateTime::<Utc>::from_timestamp(i64::from(timestamp), 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("{} (invalid timestamp)", timestamp))
}

fn order_table(origin: &EndpointConfig, args: &OrderArgs, fee: &FeeStrategy, deadline: u32) -> Table {
    let max_fee = match fee {
        FeeStrategy::Fixed(max_fee) => max_fee.to_string(),
        FeeStrategy::Query => "router minimum".to_string(),
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_BORDERS_ONLY)
        .set_header(vec!["Parameter", "Value"])
        .add_row(vec!["From".to_string(), format!("{} ({})", origin.network, origin.wormhole_chain)])
        .add_row(vec!["To".to_string(), args.to.to_string()])
        .add_row(vec!["Amount In".to_string(), args.amount.to_string()])
        .add_row(vec!["Redeemer".to_string(), args.recipient.clone()])
        .add_row(vec!["Redeemer Message".to_string(), args.message.clone()])
        .add_row(vec!["Max Fee".to_string(), max_fee])
        .add_row(vec!["Deadline".to_string(), format!("{} ({})", deadline, format_deadline(deadline))])
        .add_row(vec!["Token Router".to_string(), origin.token_router.to_string()]);
    table
}

fn networks_table(networks: &NetworkTable) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_BORDERS_ONLY)
        .set_header(vec!["Wormhole ID", "Network", "Chain ID", "Token Router", "USDC", "RPC"]);

    for endpoint in &networks.networks {
        table.add_row(vec![
            endpoint.wormhole_chain.to_string(),
            endpoint.network.clone(),
            endpoint.chain_id.to_string(),
            endpoint.token_router.to_string(),
            endpoint.usdc.to_string(),
            endpoint.rpc_url.clone(),
        ]);
    }

    table
}

fn failure_lines(diagnostics: &FailureDiagnostics) -> Vec<String> {
    let mut lines = vec![format!("Order failed: {}", diagnostics.message)];
    if let Some(code) = diagnostics.code {
        lines.push(format!("  code: {}", code));
    }
    if let Some(data) = &diagnostics.data {
        lines.push(format!("  data: {}", data));
    }
    if let Some(reason) = &diagnostics.reason {
        lines.push(format!("  reason: {}", reason));
    }
    lines
}

/// Single top-level failure sink: the log when it is on, stderr when `-q`
/// has silenced it
fn report_failure(err: &eyre::Report, silent: bool) {
    for line in failure_lines(&diagnose(err)) {
        if silent {
            eprintln!("{line}");
        } else {
            error!("{line}");
        }
    }
}
