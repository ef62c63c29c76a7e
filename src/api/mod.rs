// API module
//
// This module contains the HTTP driver for the ledger

use utoipa::OpenApi;

pub mod handlers;
pub mod routes;

// Re-export main components for easier access
pub use routes::configure_routes;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_chain,
        handlers::get_pending_transactions,
        handlers::new_transaction,
        handlers::mine_block,
        handlers::cancel_mining,
        handlers::validate_chain,
        handlers::get_wallet_balance,
        handlers::create_wallet
    ),
    components(
        schemas(
            crate::blockchain::Transaction,
            crate::blockchain::Address,
            handlers::BlockResponse,
            handlers::ChainResponse,
            handlers::TransactionRequest,
            handlers::TransactionResponse,
            handlers::MineResponse,
            handlers::CancelResponse,
            handlers::BalanceResponse,
            handlers::WalletResponse
        )
    ),
    tags(
        (name = "ledger", description = "Proof-of-work ledger endpoints")
    ),
    info(
        title = "Ledger API",
        version = "0.1.0",
        description = "A single-node proof-of-work ledger",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
