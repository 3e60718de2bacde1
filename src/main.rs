// custody - command line driver for a multi-approver wallet
//
// State (keys, wallet, ledger) lives in a sled directory. Every mutating
// wallet command is signed with the named local key and submitted to the
// host, exactly as a remote caller's envelope would be.

use clap::{Parser, Subcommand};
use custody::identity::{AccountId, AccountIdError, Keypair};
use custody::ledger::{CallError, CallOutcome, HostError, HostSnapshot, Ledger, SignedCall, WalletCall, WalletHost};
use custody::storage::{CustodyStore, StoreError};
use custody::wallet::{ApprovalOutcome, TransferId, Wallet};
use custody::HostConfig;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "custody", version, about = "Multi-approver custody wallet")]
struct Cli {
    /// Directory holding the sled database
    #[arg(long, default_value = ".custody")]
    data_dir: String,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log: String,

    /// Accept signed calls without checking nonces
    #[arg(long)]
    no_nonce_check: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate and store a keypair under a label
    Keygen {
        #[arg(long)]
        label: String,
    },
    /// List stored keypairs
    Accounts,
    /// Create the wallet
    Init {
        /// Approver label or acct:... reference, in order
        #[arg(long = "approver", required = true)]
        approvers: Vec<String>,
        #[arg(long)]
        quorum: usize,
        /// Initial pool balance
        #[arg(long, default_value_t = 0)]
        balance: u64,
        /// Replace an existing wallet; ledger balances are kept, pending
        /// transfers and nonces of the old wallet are dropped
        #[arg(long)]
        force: bool,
    },
    /// Credit a ledger account out of thin air
    Mint {
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: u64,
    },
    /// Move funds from a ledger account into the wallet pool
    Deposit {
        #[arg(long)]
        from: String,
        #[arg(long)]
        amount: u64,
    },
    /// Register a pending transfer
    Create {
        #[arg(long)]
        from: String,
        #[arg(long)]
        amount: u64,
        #[arg(long)]
        to: String,
        /// Print the signed call as hex instead of submitting it
        #[arg(long)]
        print_only: bool,
    },
    /// Vote for a transfer
    Approve {
        #[arg(long)]
        from: String,
        #[arg(long)]
        id: u64,
        /// Print the signed call as hex instead of submitting it
        #[arg(long)]
        print_only: bool,
    },
    /// Submit a hex-encoded signed call
    Submit {
        #[arg(long)]
        call: String,
    },
    /// Show approvers, quorum, pool balance and transfers
    Show,
    /// Show the ledger balance of an account
    Balance {
        #[arg(long)]
        account: String,
    },
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Account(#[from] AccountIdError),

    #[error(transparent)]
    Call(#[from] CallError),

    #[error("No keypair labelled '{0}'")]
    UnknownLabel(String),

    #[error("Label '{0}' already exists")]
    LabelExists(String),

    #[error("Wallet not initialized; run `custody init` first")]
    NotInitialized,

    #[error("Wallet already exists; pass --force to replace it")]
    AlreadyInitialized,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = HostConfig::new()
        .with_data_dir(&cli.data_dir)
        .with_log_filter(&cli.log)
        .with_nonce_enforcement(!cli.no_nonce_check);

    init_tracing(&config.log_filter);

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command, config: &HostConfig) -> Result<(), CliError> {
    let store = CustodyStore::open(&config.data_dir)?;

    match command {
        Command::Keygen { label } => {
            if store.load_keypair(&label)?.is_some() {
                return Err(CliError::LabelExists(label));
            }
            let keypair = Keypair::generate();
            store.save_keypair(&label, &keypair)?;
            store.flush()?;
            println!("{}  {}", label, keypair.account_id());
        }
        Command::Accounts => {
            for label in store.list_labels()? {
                if let Some(keypair) = store.load_keypair(&label)? {
                    println!("{}  {}", label, keypair.account_id());
                }
            }
        }
        Command::Init {
            approvers,
            quorum,
            balance,
            force,
        } => {
            let existing = store.load_snapshot()?;
            if !force && existing.is_some() {
                return Err(CliError::AlreadyInitialized);
            }
            let approvers = approvers
                .iter()
                .map(|who| resolve(&store, who))
                .collect::<Result<Vec<_>, _>>()?;
            let wallet = Wallet::with_balance(approvers, quorum, balance).map_err(HostError::from)?;
            let id = wallet.id();
            let snapshot = match existing {
                Some(previous) => previous.replace_wallet(wallet),
                None => HostSnapshot {
                    wallet,
                    ledger: Ledger::new(),
                    nonces: Default::default(),
                },
            };
            persist(&store, &snapshot)?;
            println!("wallet created: {}  quorum {}", id, quorum);
        }
        Command::Mint { to, amount } => {
            let account = resolve(&store, &to)?;
            let host = load_host(&store, config)?;
            let balance = {
                let ledger = host.ledger();
                let mut ledger = ledger.lock().map_err(|_| HostError::LockPoisoned)?;
                ledger.mint(account, amount).map_err(HostError::from)?
            };
            persist(&store, &host.snapshot()?)?;
            println!("{}  balance {}", account, balance);
        }
        Command::Deposit { from, amount } => {
            let host = load_host(&store, config)?;
            let call = sign_call(&store, &host, &from, WalletCall::Deposit { amount })?;
            submit(&store, &host, &call)?;
        }
        Command::Create {
            from,
            amount,
            to,
            print_only,
        } => {
            let to = resolve(&store, &to)?;
            let host = load_host(&store, config)?;
            let call = sign_call(&store, &host, &from, WalletCall::CreateTransfer { amount, to })?;
            if print_only {
                println!("{}", call.encode_hex());
            } else {
                submit(&store, &host, &call)?;
            }
        }
        Command::Approve {
            from,
            id,
            print_only,
        } => {
            let host = load_host(&store, config)?;
            let call = sign_call(
                &store,
                &host,
                &from,
                WalletCall::ApproveTransfer { id: TransferId::new(id) },
            )?;
            if print_only {
                println!("{}", call.encode_hex());
            } else {
                submit(&store, &host, &call)?;
            }
        }
        Command::Submit { call } => {
            let host = load_host(&store, config)?;
            let call = SignedCall::decode_hex(&call)?;
            submit(&store, &host, &call)?;
        }
        Command::Show => {
            let host = load_host(&store, config)?;
            host.with_wallet(|wallet| {
                println!("wallet   {}", wallet.id());
                println!("quorum   {} of {}", wallet.quorum(), wallet.approvers().len());
                for approver in wallet.approvers() {
                    println!("approver {}", approver);
                }
                println!("balance  {}", wallet.balance());
                for transfer in wallet.transfers() {
                    println!(
                        "{}  {} -> {}  approvals {}  {}",
                        transfer.id(),
                        transfer.amount(),
                        transfer.to(),
                        transfer.approvals(),
                        transfer.status()
                    );
                }
            })?;
        }
        Command::Balance { account } => {
            let account = resolve(&store, &account)?;
            let host = load_host(&store, config)?;
            println!("{}  {}", account, host.balance_of(&account)?);
        }
    }

    Ok(())
}

/// A label of a stored key, or a literal `acct:` reference
fn resolve(store: &CustodyStore, who: &str) -> Result<AccountId, CliError> {
    if who.starts_with("acct:") {
        return Ok(AccountId::parse(who)?);
    }
    store
        .load_keypair(who)?
        .map(|keypair| keypair.account_id())
        .ok_or_else(|| CliError::UnknownLabel(who.to_string()))
}

fn load_host(store: &CustodyStore, config: &HostConfig) -> Result<WalletHost, CliError> {
    let snapshot = store.load_snapshot()?.ok_or(CliError::NotInitialized)?;
    Ok(WalletHost::from_snapshot(snapshot, config.clone()))
}

fn persist(store: &CustodyStore, snapshot: &HostSnapshot) -> Result<(), CliError> {
    store.save_snapshot(snapshot)?;
    store.flush()?;
    Ok(())
}

fn sign_call(
    store: &CustodyStore,
    host: &WalletHost,
    label: &str,
    call: WalletCall,
) -> Result<SignedCall, CliError> {
    let keypair = store
        .load_keypair(label)?
        .ok_or_else(|| CliError::UnknownLabel(label.to_string()))?;
    let nonce = host.next_nonce(&keypair.account_id())?;
    Ok(SignedCall::sign(&keypair, &host.wallet_id()?, call, nonce))
}

fn submit(store: &CustodyStore, host: &WalletHost, call: &SignedCall) -> Result<(), CliError> {
    let outcome = host.submit(call)?;
    persist(store, &host.snapshot()?)?;

    match outcome {
        CallOutcome::Created(id) => println!("transfer {} created", id),
        CallOutcome::Approved(ApprovalOutcome::Approved { id, approvals }) => {
            println!("transfer {} approved ({} approvals)", id, approvals)
        }
        CallOutcome::Approved(ApprovalOutcome::Released { id, amount, to, .. }) => {
            println!("transfer {} sent: {} -> {}", id, amount, to)
        }
        CallOutcome::Deposited { balance } => println!("wallet balance {}", balance),
    }
    Ok(())
}
