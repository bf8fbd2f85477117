use color_eyre::eyre::{Result, eyre};
use tokenmaster_client::{
    client::{AppConfig, AppController},
    connector::{DEFAULT_LOCAL_RPC_URL, NetworkTarget, WalletConfig},
    deployment,
    inventory::ScanConfig,
    occasions::Occasion,
    wallets,
};
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;

fn print_usage_and_exit() -> ! {
    println!(
        "Usage: tokenmaster-client [--mainnet | --testnet | --local] [--rpc-url <url>]\n\
         [--wallet <name>] [--wallet-dir <path>] [--address <0x..>]\n\
         [list | buy <occasion-id>]\n\
         \n\
         Flags:\n\
           --mainnet           Expect chain id 1 (requires --rpc-url)\n\
           --testnet           Expect chain id 4 (requires --rpc-url)\n\
           --local             Expect a local Hardhat node (default RPC {DEFAULT_LOCAL_RPC_URL})\n\
           --rpc-url <url>     Override the RPC URL for the selected network\n\
           --wallet <name>     Keystore profile to sign purchases with\n\
           --wallet-dir <path> Override keystore directory (defaults to ~/.tokenmaster/wallets)\n\
           --address <0x..>    Contract address (defaults to the recorded deployment)\n\
           --json              Print the inventory as JSON (list only)\n\
         \n\
         Commands:\n\
           list                Scan and print the occasion inventory (default)\n\
           buy <occasion-id>   Purchase one ticket, then refresh the entry"
    );
    std::process::exit(0);
}

enum Command {
    List,
    Buy { occasion_id: u64 },
}

fn parse_cli_args() -> Result<(AppConfig, Command, bool)> {
    #[derive(Clone, Copy)]
    enum NetworkFlag {
        Mainnet,
        Testnet,
        Local,
    }

    let mut args = std::env::args().skip(1);
    let mut network_flag: Option<NetworkFlag> = None;
    let mut custom_url: Option<String> = None;
    let mut wallet_dir: Option<String> = None;
    let mut wallet_name: Option<String> = None;
    let mut contract_address: Option<String> = None;
    let mut command: Option<Command> = None;
    let mut json = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--mainnet" => {
                if network_flag.is_some() {
                    return Err(eyre!(
                        "Multiple network flags provided; choose one of --mainnet/--testnet/--local"
                    ));
                }
                network_flag = Some(NetworkFlag::Mainnet);
            }
            "--testnet" => {
                if network_flag.is_some() {
                    return Err(eyre!(
                        "Multiple network flags provided; choose one of --mainnet/--testnet/--local"
                    ));
                }
                network_flag = Some(NetworkFlag::Testnet);
            }
            "--local" => {
                if network_flag.is_some() {
                    return Err(eyre!(
                        "Multiple network flags provided; choose one of --mainnet/--testnet/--local"
                    ));
                }
                network_flag = Some(NetworkFlag::Local);
            }
            "--rpc-url" => {
                let url = args
                    .next()
                    .ok_or_else(|| eyre!("--rpc-url requires a URL argument"))?;
                if custom_url.is_some() {
                    return Err(eyre!("--rpc-url may only be specified once"));
                }
                custom_url = Some(url);
            }
            "--wallet-dir" => {
                let dir = args
                    .next()
                    .ok_or_else(|| eyre!("--wallet-dir requires a path argument"))?;
                if wallet_dir.is_some() {
                    return Err(eyre!("--wallet-dir may only be specified once"));
                }
                wallet_dir = Some(dir);
            }
            "--wallet" => {
                let name = args
                    .next()
                    .ok_or_else(|| eyre!("--wallet requires a wallet name"))?;
                if wallet_name.is_some() {
                    return Err(eyre!("--wallet may only be specified once"));
                }
                wallet_name = Some(name);
            }
            "--address" => {
                let address = args
                    .next()
                    .ok_or_else(|| eyre!("--address requires a contract address"))?;
                if contract_address.is_some() {
                    return Err(eyre!("--address may only be specified once"));
                }
                contract_address = Some(address);
            }
            "--json" => json = true,
            "--help" | "-h" => print_usage_and_exit(),
            "list" => {
                if command.is_some() {
                    return Err(eyre!("Multiple commands provided"));
                }
                command = Some(Command::List);
            }
            "buy" => {
                if command.is_some() {
                    return Err(eyre!("Multiple commands provided"));
                }
                let id = args
                    .next()
                    .ok_or_else(|| eyre!("buy requires an occasion id"))?
                    .parse::<u64>()
                    .map_err(|_| eyre!("buy requires a numeric occasion id"))?;
                if id == 0 {
                    return Err(eyre!("occasion ids are 1-based"));
                }
                command = Some(Command::Buy { occasion_id: id });
            }
            other => return Err(eyre!("Unknown argument: {other}")),
        }
    }

    let network = match network_flag {
        None => {
            return Err(eyre!(
                "Select a network with --mainnet, --testnet, or --local"
            ));
        }
        Some(NetworkFlag::Mainnet) => NetworkTarget::Mainnet {
            url: custom_url
                .ok_or_else(|| eyre!("--mainnet requires --rpc-url <url>"))?,
        },
        Some(NetworkFlag::Testnet) => NetworkTarget::Testnet {
            url: custom_url
                .ok_or_else(|| eyre!("--testnet requires --rpc-url <url>"))?,
        },
        Some(NetworkFlag::Local) => NetworkTarget::LocalNode {
            url: custom_url.unwrap_or_else(|| DEFAULT_LOCAL_RPC_URL.to_string()),
        },
    };

    let wallets = match wallet_name {
        Some(name) => WalletConfig::Keystore {
            name,
            dir: wallets::resolve_wallet_dir(wallet_dir.as_deref())?,
        },
        None => WalletConfig::None,
    };

    let command = command.unwrap_or(Command::List);
    if json && matches!(command, Command::Buy { .. }) {
        return Err(eyre!("--json only applies to the list command"));
    }

    let config = AppConfig {
        network,
        wallets,
        contract_address,
        scan: ScanConfig::default(),
    };
    Ok((config, command, json))
}

fn print_occasion(occasion: &Occasion) {
    let availability = if occasion.is_sold_out() {
        String::from("sold out")
    } else {
        format!("{} tickets left", occasion.tickets_available)
    };
    println!(
        "  #{:<4} {} | {} {} | {} | cost {} | {}",
        occasion.id,
        occasion.name,
        occasion.date,
        occasion.time,
        occasion.location,
        occasion.cost,
        availability
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let file_appender = rolling::daily(".logs", "tokenmaster-client.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(writer)
        .with_ansi(false)
        .init();

    deployment::ensure_structure()?;
    let (config, command, json) = parse_cli_args()?;
    let rpc_url = config.network.url().to_string();

    let mut controller = AppController::connect(config).await?;
    if !json {
        println!("Connected to Network: {}", controller.network().name);
        println!("{}", controller.rpc_line(&rpc_url));
        println!("{}", controller.account_line());
    }

    let snapshot = controller.refresh().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot.occasions)?);
    } else {
        println!("Total Occasions: {}", snapshot.total);
        for occasion in &snapshot.occasions {
            print_occasion(occasion);
        }
    }

    if let Command::Buy { occasion_id } = command {
        controller.buy(occasion_id).await?;
        println!("{}", controller.status);
        if let Some(updated) = controller.snapshot().occasion(occasion_id) {
            print_occasion(updated);
        }
    }

    Ok(())
}
