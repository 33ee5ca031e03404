//! Command-line interface: one subcommand per orchestration operation.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use crate::cache::DisplayCache;
use crate::config::AppConfig;
use crate::domain::{Address, DelegatedTrade, OrderType, RiskPercentage};
use crate::error::{PropdeskError, Result};
use crate::ledger::{HttpLedgerGateway, LedgerGateway, MemoryLedgerGateway};
use crate::services::{AgreementService, PoolService, TradeExecutor, VerificationWorkflow};
use crate::signing::RequestSigner;

#[derive(Parser)]
#[command(name = "propdesk", about = "Delegated-trading orchestration client")]
pub struct Cli {
    /// Run against the in-memory ledger instead of the bridge
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Connected wallet address (overrides config/session)
    #[arg(long, global = true, env = "PROPDESK_ADDRESS")]
    pub address: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Step 1: verify identity for the connected address
    VerifyIdentity {
        /// Identity credentials blob
        #[arg(long)]
        credentials: Option<String>,
        /// Identity proof blob
        #[arg(long)]
        proof: Option<String>,
    },
    /// Step 2: create a trust agreement with a principal
    CreateAgreement {
        /// Principal (user) address
        user: String,
        /// Profit share percent (10/15/20/25/30)
        #[arg(long, default_value_t = 20)]
        profit_share: u8,
        /// Free-text agreement terms
        #[arg(long, default_value = "")]
        terms: String,
    },
    /// Step 3: confirm admin status on the ledger
    ConfirmStatus,
    /// Show ledger standing for an admin address
    Status { address: String },
    /// Show performance metrics for an admin address
    Performance { address: String },
    /// Create a capital pool
    CreatePool { total: Decimal },
    /// Allocate pool capital to a trader
    Allocate {
        pool_id: String,
        trader: String,
        amount: Decimal,
    },
    /// List pools owned by the connected admin
    Pools,
    /// Execute a trade, optionally through a delegated sub-account
    Execute {
        amount: Decimal,
        /// market|limit|stop
        #[arg(long, default_value = "market")]
        order_type: String,
        /// Risk percent tier: 0.5|1|2|3
        #[arg(long, default_value = "1")]
        risk: String,
        /// Delegated sub-account address
        #[arg(long)]
        sub_account: Option<String>,
    },
}

/// Wired-up service stack for one CLI invocation.
pub struct App {
    pub workflow: VerificationWorkflow,
    pub pools: PoolService,
    pub trades: TradeExecutor,
    pub session_address: Option<Address>,
}

impl App {
    pub fn build(config: &AppConfig, cli_address: Option<&str>, dry_run: bool) -> Result<Self> {
        let ledger: Arc<dyn LedgerGateway> = if dry_run || config.dry_run.enabled {
            Arc::new(MemoryLedgerGateway::new())
        } else {
            let signer = match (&config.ledger.api_key_id, RequestSigner::from_env()) {
                (_, Some(signer)) => Some(signer),
                (Some(key_id), None) => std::env::var("PROPDESK_LEDGER_SECRET")
                    .ok()
                    .map(|secret| RequestSigner::new(key_id.clone(), secret)),
                (None, None) => None,
            };
            Arc::new(HttpLedgerGateway::new(Some(&config.ledger.base_url), signer)?)
        };

        let agreements = Arc::new(AgreementService::new(
            ledger.clone(),
            RequestSigner::from_env(),
        ));
        let cache = Arc::new(DisplayCache::new());

        let session_address = cli_address
            .map(str::to_string)
            .or_else(|| config.session.address.clone())
            .map(|raw| Address::parse(&raw))
            .transpose()?;

        Ok(Self {
            workflow: VerificationWorkflow::new(ledger.clone(), agreements.clone()),
            pools: PoolService::new(ledger.clone(), cache),
            trades: TradeExecutor::new(ledger, agreements),
            session_address,
        })
    }

    fn connected(&self) -> Result<&Address> {
        self.session_address
            .as_ref()
            .ok_or(PropdeskError::NotConnected)
    }

    pub async fn run(&self, command: &Commands) -> Result<()> {
        match command {
            Commands::VerifyIdentity { credentials, proof } => {
                let address = self.session_address.as_ref();
                // Default credential/proof blobs mirror what the onboarding
                // page submits when the user has nothing bespoke to attach.
                let credentials = credentials.clone().unwrap_or_else(|| {
                    format!(
                        "{}-{}",
                        address.map(Address::to_string).unwrap_or_default(),
                        chrono::Utc::now().timestamp_millis()
                    )
                });
                let proof = proof
                    .clone()
                    .unwrap_or_else(|| format!("proof-{}", chrono::Utc::now().timestamp_millis()));
                let stage = self
                    .workflow
                    .verify_identity(address, &credentials, &proof)
                    .await?;
                println!("identity verified, stage: {stage}");
            }
            Commands::CreateAgreement {
                user,
                profit_share,
                terms,
            } => {
                let admin = self.connected()?;
                let user = Address::parse(user)?;
                let id = self
                    .workflow
                    .create_agreement(admin, &user, *profit_share, terms)
                    .await?;
                println!("agreement created: {id}");
            }
            Commands::ConfirmStatus => {
                let admin = self.connected()?;
                let stage = self.workflow.confirm_admin_status(admin).await?;
                println!("admin confirmed, stage: {stage}");
            }
            Commands::Status { address } => {
                let address = Address::parse(address)?;
                let status = self.workflow.admin_status(&address).await?;
                println!("{address}: {status}");
            }
            Commands::Performance { address } => {
                let address = Address::parse(address)?;
                let perf = self.workflow.admin_performance(&address).await?;
                println!(
                    "trust score {}/100, managed accounts {}, success rate {}%",
                    perf.trust_score, perf.total_managed_accounts, perf.success_rate
                );
            }
            Commands::CreatePool { total } => {
                let admin = self.connected()?;
                let pool = self.pools.create_pool(admin, *total).await?;
                println!(
                    "pool {} created: total {}, per-trader bounds [{}, {}]",
                    pool.id, pool.total_amount, pool.params.min_allocation,
                    pool.params.max_allocation
                );
            }
            Commands::Allocate {
                pool_id,
                trader,
                amount,
            } => {
                let trader = Address::parse(trader)?;
                let allocation = self.pools.allocate(pool_id, &trader, *amount).await?;
                println!(
                    "allocated {} from pool {} to {}",
                    allocation.amount, allocation.pool_id, allocation.trader_address
                );
            }
            Commands::Pools => {
                let admin = self.connected()?;
                let pools = self.pools.list_pools(admin).await?;
                if pools.is_empty() {
                    println!("no pools");
                }
                for pool in pools {
                    println!(
                        "{} total {} allocated {} headroom {} traders {} {}",
                        pool.id,
                        pool.total_amount,
                        pool.allocated_amount,
                        pool.headroom(),
                        pool.traders_count,
                        if pool.active { "active" } else { "inactive" }
                    );
                }
            }
            Commands::Execute {
                amount,
                order_type,
                risk,
                sub_account,
            } => {
                let principal = self.connected()?.clone();
                let order_type: OrderType = order_type
                    .parse()
                    .map_err(|e: &str| PropdeskError::Validation(e.to_string()))?;
                let risk = RiskPercentage::from_percent_str(risk).ok_or_else(|| {
                    PropdeskError::Validation(format!(
                        "risk {}% is not one of the offered tiers (0.5/1/2/3)",
                        risk
                    ))
                })?;
                let sub_account = sub_account
                    .as_deref()
                    .map(Address::parse)
                    .transpose()?;

                let trade = DelegatedTrade {
                    principal,
                    sub_account,
                    amount: *amount,
                    order_type,
                    risk,
                };
                let receipt = self.trades.execute(&trade).await?;
                println!(
                    "trade submitted: tx {} position size {}",
                    receipt.tx_ref, receipt.position_size
                );
            }
        }
        Ok(())
    }
}
