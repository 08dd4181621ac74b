//! Manual-testing harness for the RWA marketplace core.
//!
//! Wires an in-memory [`rwa_marketplace_core::Store`] and the bundled mock
//! collaborators together and exposes the operator-facing engine operations
//! as subcommands. This is not a transport layer — there is no
//! HTTP, no auth, no request validation (all explicitly out of scope) — it
//! is a way to drive the engines by hand.
//!
//! Because the store is in-memory, state is persisted between invocations
//! as a JSON snapshot at `--state` (default `./rwa-cli-state.json`) so a
//! sequence of shell commands can build up a scenario, mirroring how
//! `chainflip-engine`'s CLI binary is a thin `clap` wrapper around the
//! engine it drives.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use rwa_marketplace_core::auctions::{AuctionEngine, CreateAuctionInput};
use rwa_marketplace_core::collaborators::{
    MockEscrow, MockPayment, MockTokenTransfer, MockTokenizationCollaborator,
};
use rwa_marketplace_core::config::EngineConfig;
use rwa_marketplace_core::events::EventLog;
use rwa_marketplace_core::lifecycle::{AssetLifecycle, CreateAssetInput, TokenizeInput};
use rwa_marketplace_core::models::{
    AssetType, Bank, DocumentType, InvestorProfile, InvestorType, KycStatus, Role, User,
};
use rwa_marketplace_core::store::{Pagination, Store, StoreSnapshot};
use rwa_marketplace_core::transactions::TransactionEngine;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "rwa-marketplace-cli", about = "Manual driver for the RWA marketplace core engines")]
struct Cli {
    /// Path to the JSON state snapshot this run reads from and writes back to.
    #[arg(long, global = true, default_value = "rwa-cli-state.json")]
    state: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bank registration.
    Bank {
        #[command(subcommand)]
        action: BankCommand,
    },
    /// Platform user / investor management.
    User {
        #[command(subcommand)]
        action: UserCommand,
    },
    /// AssetLifecycle operations.
    Asset {
        #[command(subcommand)]
        action: AssetCommand,
    },
    /// TransactionEngine operations.
    Tx {
        #[command(subcommand)]
        action: TxCommand,
    },
    /// AuctionEngine operations.
    Auction {
        #[command(subcommand)]
        action: AuctionCommand,
    },
    /// Clock/Scheduler operations.
    Scheduler {
        #[command(subcommand)]
        action: SchedulerCommand,
    },
    /// Runs an end-to-end happy-path scenario against a fresh, throwaway
    /// store and prints each step's result.
    Demo,
}

#[derive(Subcommand)]
enum BankCommand {
    Create { name: String, code: String },
}

#[derive(Subcommand)]
enum UserCommand {
    Create {
        #[arg(long, value_enum)]
        role: RoleArg,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        wallet: Option<String>,
    },
    /// Development helper: marks a user `VERIFIED` without a real KYC
    /// provider round trip.
    Verify { user: Uuid },
    CreateInvestorProfile {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        country: String,
    },
}

#[derive(Clone, clap::ValueEnum)]
enum RoleArg {
    PlatformAdmin,
    BankAdmin,
    BankViewer,
    Investor,
    Auditor,
}

impl From<RoleArg> for Role {
    fn from(r: RoleArg) -> Self {
        match r {
            RoleArg::PlatformAdmin => Role::PlatformAdmin,
            RoleArg::BankAdmin => Role::BankAdmin,
            RoleArg::BankViewer => Role::BankViewer,
            RoleArg::Investor => Role::Investor,
            RoleArg::Auditor => Role::Auditor,
        }
    }
}

#[derive(Clone, clap::ValueEnum)]
enum AssetTypeArg {
    RealEstate,
    Commodity,
    PrivateEquity,
    Bond,
    ArtCollectible,
    Other,
}

impl From<AssetTypeArg> for AssetType {
    fn from(a: AssetTypeArg) -> Self {
        match a {
            AssetTypeArg::RealEstate => AssetType::RealEstate,
            AssetTypeArg::Commodity => AssetType::Commodity,
            AssetTypeArg::PrivateEquity => AssetType::PrivateEquity,
            AssetTypeArg::Bond => AssetType::Bond,
            AssetTypeArg::ArtCollectible => AssetType::ArtCollectible,
            AssetTypeArg::Other => AssetType::Other,
        }
    }
}

#[derive(Clone, clap::ValueEnum)]
enum DocumentTypeArg {
    Appraisal,
    LegalOpinion,
    FinancialStatement,
    TitleDeed,
    Insurance,
    Prospectus,
    TermSheet,
    Other,
}

impl From<DocumentTypeArg> for DocumentType {
    fn from(d: DocumentTypeArg) -> Self {
        match d {
            DocumentTypeArg::Appraisal => DocumentType::Appraisal,
            DocumentTypeArg::LegalOpinion => DocumentType::LegalOpinion,
            DocumentTypeArg::FinancialStatement => DocumentType::FinancialStatement,
            DocumentTypeArg::TitleDeed => DocumentType::TitleDeed,
            DocumentTypeArg::Insurance => DocumentType::Insurance,
            DocumentTypeArg::Prospectus => DocumentType::Prospectus,
            DocumentTypeArg::TermSheet => DocumentType::TermSheet,
            DocumentTypeArg::Other => DocumentType::Other,
        }
    }
}

#[derive(Subcommand)]
enum AssetCommand {
    Create {
        #[arg(long)]
        bank: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long, value_enum)]
        asset_type: AssetTypeArg,
        #[arg(long)]
        total_value: Decimal,
        #[arg(long)]
        total_supply: u64,
        #[arg(long)]
        price_per_token: Option<Decimal>,
    },
    AddDocument {
        #[arg(long)]
        asset: Uuid,
        #[arg(long, value_enum)]
        doc_type: DocumentTypeArg,
        #[arg(long)]
        name: String,
        #[arg(long)]
        storage_key: String,
        #[arg(long)]
        mime_type: String,
        #[arg(long)]
        size_bytes: u64,
        #[arg(long)]
        uploaded_by: Uuid,
    },
    SubmitReview { asset: Uuid },
    Approve { asset: Uuid },
    Tokenize {
        #[arg(long)]
        asset: Uuid,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        minimum_investment: Decimal,
        #[arg(long)]
        maximum_investment: Option<Decimal>,
    },
    List { asset: Uuid },
    Delist { asset: Uuid },
    Stats { asset: Uuid },
}

#[derive(Subcommand)]
enum TxCommand {
    Create {
        #[arg(long)]
        buyer: Uuid,
        #[arg(long)]
        asset: Uuid,
        #[arg(long)]
        token_amount: u64,
    },
    CreateEscrow { tx: Uuid },
    ConfirmPayment {
        #[arg(long)]
        tx: Uuid,
        #[arg(long)]
        signature: String,
    },
    TransferTokens { tx: Uuid },
    Complete { tx: Uuid },
    Cancel {
        #[arg(long)]
        tx: Uuid,
        #[arg(long)]
        reason: String,
    },
    UserStats { user: Uuid },
}

#[derive(Subcommand)]
enum AuctionCommand {
    Create {
        #[arg(long)]
        asset: Uuid,
        #[arg(long)]
        reserve_price: Decimal,
        #[arg(long)]
        token_amount: u64,
        #[arg(long)]
        start_time: DateTime<Utc>,
        #[arg(long)]
        end_time: DateTime<Utc>,
    },
    Bid {
        #[arg(long)]
        auction: Uuid,
        #[arg(long)]
        wallet: String,
        #[arg(long)]
        amount: Decimal,
    },
    CancelBid {
        #[arg(long)]
        bid: Uuid,
        #[arg(long)]
        wallet: String,
    },
    Settle { auction: Uuid },
    Cancel { auction: Uuid },
    Extend {
        #[arg(long)]
        auction: Uuid,
        #[arg(long)]
        new_end_time: DateTime<Utc>,
    },
    History { auction: Uuid },
}

#[derive(Subcommand)]
enum SchedulerCommand {
    /// Runs one scheduler tick against the persisted store.
    Tick,
}

/// The engines + collaborators the CLI wires together for one invocation.
/// Recreated fresh each run; only the [`Store`] is persisted across runs.
struct Harness {
    store: Arc<Store>,
    events: Arc<EventLog>,
    config: EngineConfig,
}

impl Harness {
    fn load(state_path: &PathBuf) -> Result<Self> {
        let store = if state_path.exists() {
            let contents = std::fs::read_to_string(state_path)
                .with_context(|| format!("reading {}", state_path.display()))?;
            let snapshot: StoreSnapshot = serde_json::from_str(&contents)
                .with_context(|| format!("parsing {}", state_path.display()))?;
            Store::load(snapshot)
        } else {
            Store::new()
        };
        Ok(Self {
            store: Arc::new(store),
            events: Arc::new(EventLog::new()),
            config: EngineConfig::default(),
        })
    }

    fn save(&self, state_path: &PathBuf) -> Result<()> {
        let snapshot = self.store.snapshot();
        let json = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(state_path, json)
            .with_context(|| format!("writing {}", state_path.display()))?;
        Ok(())
    }

    fn lifecycle(&self) -> AssetLifecycle<MockTokenizationCollaborator> {
        AssetLifecycle::new(
            self.store.clone(),
            Arc::new(MockTokenizationCollaborator::new()),
            self.events.clone(),
            self.config.clone(),
        )
    }

    fn transactions(&self) -> TransactionEngine<MockEscrow, MockPayment, MockTokenTransfer> {
        TransactionEngine::new(
            self.store.clone(),
            Arc::new(MockEscrow::new()),
            Arc::new(MockPayment::new()),
            Arc::new(MockTokenTransfer::new()),
            self.events.clone(),
            self.config.clone(),
        )
    }

    fn auctions(&self) -> AuctionEngine<MockPayment, MockTokenTransfer> {
        AuctionEngine::new(
            self.store.clone(),
            Arc::new(MockPayment::new()),
            Arc::new(MockTokenTransfer::new()),
            self.events.clone(),
            self.config.clone(),
        )
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() {
    std::process::exit(match run().await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {err:?}");
            1
        }
    });
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let harness = Harness::load(&cli.state)?;
    let cancel = CancellationToken::new();

    match cli.command {
        Command::Bank { action } => run_bank(&harness, action)?,
        Command::User { action } => run_user(&harness, action)?,
        Command::Asset { action } => run_asset(&harness, action, &cancel).await?,
        Command::Tx { action } => run_tx(&harness, action, &cancel).await?,
        Command::Auction { action } => run_auction(&harness, action, &cancel).await?,
        Command::Scheduler { action } => run_scheduler(&harness, action)?,
        Command::Demo => {
            run_demo().await?;
            return Ok(());
        }
    }

    harness.save(&cli.state)
}

fn run_bank(harness: &Harness, action: BankCommand) -> Result<()> {
    match action {
        BankCommand::Create { name, code } => {
            let bank = harness
                .store
                .atomic(|txn| txn.create_bank(Bank::new(name, code, None)))
                .map_err(|e| anyhow!(e.to_string()))?;
            print_json(&bank)
        }
    }
}

fn run_user(harness: &Harness, action: UserCommand) -> Result<()> {
    match action {
        UserCommand::Create { role, email, wallet } => {
            let user = harness
                .store
                .atomic(|txn| txn.create_user(User::new(role.into(), email, wallet)))
                .map_err(|e| anyhow!(e.to_string()))?;
            print_json(&user)
        }
        UserCommand::Verify { user } => {
            let user = harness
                .store
                .atomic(|txn| {
                    let mut u = txn.get_user(user)?;
                    u.set_kyc_status(KycStatus::Verified);
                    txn.update_user(u)
                })
                .map_err(|e| anyhow!(e.to_string()))?;
            print_json(&user)
        }
        UserCommand::CreateInvestorProfile {
            user,
            first_name,
            last_name,
            country,
        } => {
            let profile = harness
                .store
                .atomic(|txn| {
                    txn.create_investor_profile(InvestorProfile::new(
                        user,
                        first_name,
                        last_name,
                        country,
                        InvestorType::Individual,
                    ))
                })
                .map_err(|e| anyhow!(e.to_string()))?;
            print_json(&profile)
        }
    }
}

async fn run_asset(
    harness: &Harness,
    action: AssetCommand,
    cancel: &CancellationToken,
) -> Result<()> {
    let lifecycle = harness.lifecycle();
    match action {
        AssetCommand::Create {
            bank,
            name,
            asset_type,
            total_value,
            total_supply,
            price_per_token,
        } => {
            let asset = lifecycle.create(
                bank,
                CreateAssetInput {
                    name,
                    description: None,
                    asset_type: asset_type.into(),
                    total_value,
                    total_supply,
                    price_per_token,
                },
            )?;
            print_json(&asset)
        }
        AssetCommand::AddDocument {
            asset,
            doc_type,
            name,
            storage_key,
            mime_type,
            size_bytes,
            uploaded_by,
        } => {
            let document = lifecycle.add_document(
                asset,
                doc_type.into(),
                name,
                storage_key,
                mime_type,
                size_bytes,
                uploaded_by,
            )?;
            print_json(&document)
        }
        AssetCommand::SubmitReview { asset } => print_json(&lifecycle.submit_for_review(asset)?),
        AssetCommand::Approve { asset } => print_json(&lifecycle.approve_for_tokenization(asset)?),
        AssetCommand::Tokenize {
            asset,
            symbol,
            minimum_investment,
            maximum_investment,
        } => {
            let result = lifecycle
                .tokenize(
                    asset,
                    TokenizeInput {
                        symbol,
                        minimum_investment,
                        maximum_investment,
                        start_date: None,
                        end_date: None,
                    },
                    cancel,
                )
                .await?;
            print_json(&result)
        }
        AssetCommand::List { asset } => print_json(&lifecycle.list_on_marketplace(asset)?),
        AssetCommand::Delist { asset } => print_json(&lifecycle.delist_from_marketplace(asset)?),
        AssetCommand::Stats { asset } => {
            let stats = lifecycle.stats(asset)?;
            println!(
                "{}",
                serde_json::json!({
                    "total_value": stats.total_value,
                    "total_supply": stats.total_supply,
                    "price_per_token": stats.price_per_token,
                    "sold_tokens": stats.sold_tokens,
                    "available_tokens": stats.available_tokens,
                    "transaction_count": stats.transaction_count,
                    "investor_count": stats.investor_count,
                })
            );
            Ok(())
        }
    }
}

async fn run_tx(harness: &Harness, action: TxCommand, cancel: &CancellationToken) -> Result<()> {
    let engine = harness.transactions();
    match action {
        TxCommand::Create {
            buyer,
            asset,
            token_amount,
        } => print_json(&engine.create(buyer, asset, token_amount)?),
        TxCommand::CreateEscrow { tx } => print_json(&engine.create_escrow(tx, cancel).await?),
        TxCommand::ConfirmPayment { tx, signature } => {
            print_json(&engine.record_payment(tx, signature, cancel).await?)
        }
        TxCommand::TransferTokens { tx } => print_json(&engine.transfer_tokens(tx, cancel).await?),
        TxCommand::Complete { tx } => print_json(&engine.complete(tx, cancel).await?),
        TxCommand::Cancel { tx, reason } => print_json(&engine.cancel(tx, reason, cancel).await?),
        TxCommand::UserStats { user } => {
            let stats = engine.user_stats(user);
            println!(
                "{}",
                serde_json::json!({
                    "total_transactions": stats.total_transactions,
                    "completed_transactions": stats.completed_transactions,
                    "total_invested": stats.total_invested,
                    "total_tokens": stats.total_tokens,
                })
            );
            Ok(())
        }
    }
}

async fn run_auction(
    harness: &Harness,
    action: AuctionCommand,
    cancel: &CancellationToken,
) -> Result<()> {
    let engine = harness.auctions();
    match action {
        AuctionCommand::Create {
            asset,
            reserve_price,
            token_amount,
            start_time,
            end_time,
        } => print_json(&engine.create(
            asset,
            CreateAuctionInput {
                reserve_price,
                token_amount,
                start_time,
                end_time,
            },
        )?),
        AuctionCommand::Bid { auction, wallet, amount } => {
            print_json(&engine.place_bid(auction, wallet, amount, cancel).await?)
        }
        AuctionCommand::CancelBid { bid, wallet } => {
            engine.cancel_bid(bid, &wallet)?;
            println!("{{\"cancelled\": \"{bid}\"}}");
            Ok(())
        }
        AuctionCommand::Settle { auction } => print_json(&engine.settle(auction, cancel).await?),
        AuctionCommand::Cancel { auction } => print_json(&engine.cancel(auction, cancel).await?),
        AuctionCommand::Extend { auction, new_end_time } => {
            print_json(&engine.extend(auction, new_end_time)?)
        }
        AuctionCommand::History { auction } => {
            let page = engine.bid_history(
                auction,
                Pagination::new(Some(1), Some(harness.config.pagination_default_limit), 20, 100),
            );
            print_json(&page.data)
        }
    }
}

fn run_scheduler(harness: &Harness, action: SchedulerCommand) -> Result<()> {
    match action {
        SchedulerCommand::Tick => {
            let scheduler =
                rwa_marketplace_core::scheduler::Scheduler::new(harness.store.clone(), harness.config.scheduler_tick_interval());
            let report = scheduler.tick_once();
            println!(
                "{}",
                serde_json::json!({
                    "activated": report.activated,
                    "ended": report.ended,
                })
            );
            Ok(())
        }
    }
}

/// Runs a purchase scenario and an auction scenario end to end against a
/// fresh, disposable store, to demonstrate the engines without touching
/// `--state`.
async fn run_demo() -> Result<()> {
    use rust_decimal_macros::dec;

    let store = Arc::new(Store::new());
    let events = Arc::new(EventLog::new());
    let config = EngineConfig::default();
    let cancel = CancellationToken::new();

    let lifecycle = AssetLifecycle::new(
        store.clone(),
        Arc::new(MockTokenizationCollaborator::new()),
        events.clone(),
        config.clone(),
    );
    let transactions = TransactionEngine::new(
        store.clone(),
        Arc::new(MockEscrow::new()),
        Arc::new(MockPayment::new()),
        Arc::new(MockTokenTransfer::new()),
        events.clone(),
        config.clone(),
    );

    let bank = store
        .atomic(|txn| txn.create_bank(Bank::new("First Bank".to_string(), "FB01".to_string(), None)))
        .map_err(|e| anyhow!(e.to_string()))?;

    let asset = lifecycle.create(
        bank.id(),
        CreateAssetInput {
            name: "Prop-1".to_string(),
            description: None,
            asset_type: AssetType::RealEstate,
            total_value: dec!(1_000_000),
            total_supply: 10_000,
            price_per_token: None,
        },
    )?;
    println!("created asset: {} @ {} per token", asset.id(), asset.price_per_token());

    lifecycle.add_document(
        asset.id(),
        DocumentType::Appraisal,
        "appraisal.pdf".to_string(),
        "key-1".to_string(),
        "application/pdf".to_string(),
        1024,
        Uuid::new_v4(),
    )?;
    lifecycle.add_document(
        asset.id(),
        DocumentType::LegalOpinion,
        "legal.pdf".to_string(),
        "key-2".to_string(),
        "application/pdf".to_string(),
        2048,
        Uuid::new_v4(),
    )?;
    lifecycle.submit_for_review(asset.id())?;
    lifecycle.approve_for_tokenization(asset.id())?;
    let asset = lifecycle
        .tokenize(
            asset.id(),
            TokenizeInput {
                symbol: "P1A".to_string(),
                minimum_investment: dec!(1000),
                maximum_investment: None,
                start_date: None,
                end_date: None,
            },
            &cancel,
        )
        .await?;
    println!("tokenized: mint={:?}", asset.mint_address());
    let asset = lifecycle.list_on_marketplace(asset.id())?;
    println!("listed at {:?}", asset.listed_at());

    let mut buyer = User::new(Role::Investor, Some("buyer@example.com".to_string()), None);
    buyer.set_kyc_status(KycStatus::Verified);
    let buyer = store.atomic(|txn| txn.create_user(buyer)).map_err(|e| anyhow!(e.to_string()))?;
    store
        .atomic(|txn| {
            txn.create_investor_profile(InvestorProfile::new(
                buyer.id(),
                "Ada".to_string(),
                "Lovelace".to_string(),
                "US".to_string(),
                InvestorType::Individual,
            ))
        })
        .map_err(|e| anyhow!(e.to_string()))?;

    let tx = transactions.create(buyer.id(), asset.id(), 100)?;
    println!("purchase created: amount={}", tx.amount());
    let tx = transactions.create_escrow(tx.id(), &cancel).await?;
    let tx = transactions.record_payment(tx.id(), "sig1".to_string(), &cancel).await?;
    let tx = transactions.transfer_tokens(tx.id(), &cancel).await?;
    let tx = transactions.complete(tx.id(), &cancel).await?;
    println!("purchase completed: status={:?}", tx.status());

    Ok(())
}
