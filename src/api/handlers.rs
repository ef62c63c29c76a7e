use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::{
    Address, Amount, Block, BlockError, CancelToken, Ledger, LedgerError, Transaction, Wallet,
};

/// Data structure for the ledger state
pub type BlockchainData = web::Data<Ledger>;

/// A committed block with its position and hash
#[derive(Serialize, Deserialize, ToSchema)]
pub struct BlockResponse {
    /// Position of the block in the chain
    pub height: usize,

    /// Hash of the block (hex)
    pub hash: String,

    /// Creation time in nanoseconds since the Unix epoch
    pub timestamp: i64,

    /// Proof of work (nonce)
    pub nonce: u64,

    /// Hash of the previous block (hex)
    pub previous_hash: String,

    /// Transactions in the block
    pub transactions: Vec<Transaction>,
}

impl BlockResponse {
    fn from_block(height: usize, block: &Block) -> Result<Self, BlockError> {
        Ok(BlockResponse {
            height,
            hash: block.hash()?.to_hex(),
            timestamp: block.timestamp(),
            nonce: block.nonce(),
            previous_hash: block.previous_hash().to_hex(),
            transactions: block.transactions().to_vec(),
        })
    }
}

/// Response for the chain endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ChainResponse {
    /// The length of the chain
    pub length: usize,

    /// The blocks in the chain
    pub chain: Vec<BlockResponse>,

    /// Whether the chain is valid
    pub is_valid: bool,
}

/// Request for the transaction endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct TransactionRequest {
    /// The sender's address
    pub sender: String,

    /// The recipient's address
    pub recipient: String,

    /// The amount to transfer
    pub amount: f64,
}

/// Response for the transaction endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    /// The message
    pub message: String,

    /// Number of transactions waiting for the next block
    pub pending: usize,
}

/// Response for the mine endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct MineResponse {
    /// The message
    pub message: String,

    /// The newly mined block
    pub block: BlockResponse,
}

/// Response for the cancel endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct CancelResponse {
    /// Whether a search was running and has been asked to stop
    pub cancelled: bool,
}

/// Response for the balance endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct BalanceResponse {
    /// The address queried
    pub address: String,

    /// Net balance over committed blocks
    pub balance: f64,
}

/// Response for the create wallet endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct WalletResponse {
    /// The wallet's address
    pub address: String,

    /// The wallet's private key (hex encoded)
    pub private_key: String,
}

fn error_response(err: &LedgerError) -> HttpResponse {
    let body = serde_json::json!({ "error": err.to_string() });

    match err {
        LedgerError::ConcurrentMiningConflict => HttpResponse::Conflict().json(body),
        LedgerError::MiningCancelled { .. } | LedgerError::MiningTimeout { .. } => {
            HttpResponse::ServiceUnavailable().json(body)
        }
        _ => HttpResponse::InternalServerError().json(body),
    }
}

/// Get the full blockchain
///
/// Returns the entire chain and its validity status
#[utoipa::path(
    get,
    path = "/api/v1/chain",
    responses(
        (status = 200, description = "Blockchain retrieved successfully", body = ChainResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_chain(blockchain: BlockchainData) -> impl Responder {
    let chain = blockchain.chain();
    let is_valid = blockchain.is_valid();

    let blocks: Result<Vec<BlockResponse>, BlockError> = chain
        .iter()
        .enumerate()
        .map(|(height, block)| BlockResponse::from_block(height, block))
        .collect();

    match blocks {
        Ok(blocks) => HttpResponse::Ok().json(ChainResponse {
            length: blocks.len(),
            chain: blocks,
            is_valid,
        }),
        Err(err) => error_response(&LedgerError::from(err)),
    }
}

/// Get all pending transactions
///
/// Returns all transactions waiting to be included in a block
#[utoipa::path(
    get,
    path = "/api/v1/transactions/pending",
    responses(
        (status = 200, description = "Pending transactions retrieved successfully", body = Vec<Transaction>)
    )
)]
pub async fn get_pending_transactions(blockchain: BlockchainData) -> impl Responder {
    HttpResponse::Ok().json(blockchain.copy_pending_pool())
}

/// Create a new transaction
///
/// Adds a new transaction to the pending pool. Balances are not checked.
#[utoipa::path(
    post,
    path = "/api/v1/transactions/new",
    request_body = TransactionRequest,
    responses(
        (status = 201, description = "Transaction created successfully", body = TransactionResponse),
        (status = 400, description = "Invalid transaction data")
    )
)]
pub async fn new_transaction(
    blockchain: BlockchainData,
    transaction_req: web::Json<TransactionRequest>,
) -> impl Responder {
    let transaction_req = transaction_req.into_inner();

    let amount = match Amount::from_f64(transaction_req.amount) {
        Ok(amount) => amount,
        Err(err) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": err.to_string()
            }));
        }
    };

    let pending = blockchain.add_transaction(
        Address(transaction_req.sender),
        Address(transaction_req.recipient),
        amount,
    );

    HttpResponse::Created().json(TransactionResponse {
        message: "Transaction will be added to the next block".to_string(),
        pending,
    })
}

/// Mine a new block
///
/// Commits the pending transactions plus the owner's reward
#[utoipa::path(
    post,
    path = "/api/v1/mine",
    responses(
        (status = 200, description = "Block mined successfully", body = MineResponse),
        (status = 409, description = "A block is already being mined"),
        (status = 503, description = "Mining was cancelled or gave up"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn mine_block(blockchain: BlockchainData) -> impl Responder {
    let ledger = blockchain.clone();

    // the search is CPU bound, keep it off the async workers
    let result = web::block(move || -> Result<BlockResponse, LedgerError> {
        let (height, block) = ledger.mine_with(&CancelToken::new())?;
        Ok(BlockResponse::from_block(height, &block)?)
    })
    .await;

    match result {
        Ok(Ok(block)) => HttpResponse::Ok().json(MineResponse {
            message: "New Block Mined".to_string(),
            block,
        }),
        Ok(Err(err)) => error_response(&err),
        Err(err) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to mine block: {}", err)
        })),
    }
}

/// Cancel the block being mined
///
/// Stops the proof-of-work search in flight, if any
#[utoipa::path(
    post,
    path = "/api/v1/mine/cancel",
    responses(
        (status = 200, description = "Cancellation requested", body = CancelResponse)
    )
)]
pub async fn cancel_mining(blockchain: BlockchainData) -> impl Responder {
    HttpResponse::Ok().json(CancelResponse {
        cancelled: blockchain.cancel_mining(),
    })
}

/// Check if the blockchain is valid
///
/// Validates linkage and proof of work of the entire chain
#[utoipa::path(
    get,
    path = "/api/v1/validate",
    responses(
        (status = 200, description = "Blockchain validation status", body = bool)
    )
)]
pub async fn validate_chain(blockchain: BlockchainData) -> impl Responder {
    HttpResponse::Ok().json(blockchain.is_valid())
}

/// Get wallet balance
///
/// Replays committed blocks; pending transactions are not counted
#[utoipa::path(
    get,
    path = "/api/v1/wallet/balance/{address}",
    params(
        ("address" = String, Path, description = "Address to query")
    ),
    responses(
        (status = 200, description = "Wallet balance retrieved successfully", body = BalanceResponse)
    )
)]
pub async fn get_wallet_balance(
    blockchain: BlockchainData,
    address: web::Path<String>,
) -> impl Responder {
    let address = Address(address.into_inner());
    let balance = blockchain.calculate_total_amount(&address);

    HttpResponse::Ok().json(BalanceResponse {
        address: address.0,
        balance: balance.as_f64(),
    })
}

/// Create a new wallet
///
/// Creates a new wallet with a random keypair.
/// The private key must be stored by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/wallet/new",
    responses(
        (status = 201, description = "Wallet created successfully", body = WalletResponse)
    )
)]
pub async fn create_wallet() -> impl Responder {
    let wallet = Wallet::new();

    HttpResponse::Created().json(WalletResponse {
        address: wallet.address().0.clone(),
        private_key: hex::encode(wallet.export_secret_key()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::configure_routes;
    use crate::blockchain::NoopObserver;

    use actix_web::http::StatusCode;
    use actix_web::{test as actix_test, App};
    use std::sync::Arc;

    fn ledger_data() -> BlockchainData {
        web::Data::new(Ledger::with_observer("addr1", Arc::new(NoopObserver)).unwrap())
    }

    fn transaction_request(sender: &str, recipient: &str, amount: f64) -> actix_test::TestRequest {
        actix_test::TestRequest::post()
            .uri("/api/v1/transactions/new")
            .set_json(serde_json::json!({
                "sender": sender,
                "recipient": recipient,
                "amount": amount,
            }))
    }

    #[actix_web::test]
    async fn test_get_chain_returns_genesis() {
        let app = actix_test::init_service(
            App::new().app_data(ledger_data()).configure(configure_routes),
        )
        .await;

        let req = actix_test::TestRequest::get().uri("/api/v1/chain").to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["length"], 1);
        assert_eq!(body["is_valid"], true);
        assert_eq!(body["chain"][0]["height"], 0);
        assert_eq!(body["chain"][0]["hash"].as_str().unwrap().len(), 64);
    }

    #[actix_web::test]
    async fn test_transaction_mine_and_balance() {
        let ledger = ledger_data();
        let app = actix_test::init_service(
            App::new().app_data(ledger.clone()).configure(configure_routes),
        )
        .await;

        let resp = actix_test::call_service(&app, transaction_request("C", "D", 10.0).to_request()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = actix_test::TestRequest::get().uri("/api/v1/transactions/pending").to_request();
        let pending: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(pending[0]["sender"], "C");
        assert_eq!(pending[0]["amount"], 10.0);

        let req = actix_test::TestRequest::post().uri("/api/v1/mine").to_request();
        let mined: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(mined["block"]["height"], 1);
        assert!(mined["block"]["hash"].as_str().unwrap().starts_with("000"));
        assert_eq!(mined["block"]["transactions"][1]["sender"], "THE BLOCKCHAIN");

        let req = actix_test::TestRequest::get().uri("/api/v1/wallet/balance/D").to_request();
        let balance: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(balance["balance"], 10.0);

        let req = actix_test::TestRequest::get().uri("/api/v1/wallet/balance/addr1").to_request();
        let balance: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(balance["balance"], 1.0);

        let req = actix_test::TestRequest::get().uri("/api/v1/validate").to_request();
        let valid: bool = actix_test::call_and_read_body_json(&app, req).await;
        assert!(valid);
        assert_eq!(ledger.len(), 2);
    }

    #[actix_web::test]
    async fn test_mined_block_reports_its_height() {
        let ledger = ledger_data();
        let app = actix_test::init_service(
            App::new().app_data(ledger.clone()).configure(configure_routes),
        )
        .await;

        for expected in 1..=2 {
            let req = actix_test::TestRequest::post().uri("/api/v1/mine").to_request();
            let mined: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
            assert_eq!(mined["block"]["height"], expected);

            let hash = ledger.last_block().unwrap().hash().unwrap().to_hex();
            assert_eq!(mined["block"]["hash"], hash);
        }
    }

    #[actix_web::test]
    async fn test_out_of_range_amount_is_rejected() {
        let ledger = ledger_data();
        let app = actix_test::init_service(
            App::new().app_data(ledger.clone()).configure(configure_routes),
        )
        .await;

        let resp = actix_test::call_service(&app, transaction_request("A", "B", 1e300).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(ledger.copy_pending_pool().is_empty());
    }

    #[actix_web::test]
    async fn test_cancel_without_search() {
        let app = actix_test::init_service(
            App::new().app_data(ledger_data()).configure(configure_routes),
        )
        .await;

        let req = actix_test::TestRequest::post().uri("/api/v1/mine/cancel").to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["cancelled"], false);
    }

    #[actix_web::test]
    async fn test_create_wallet() {
        let app = actix_test::init_service(
            App::new().app_data(ledger_data()).configure(configure_routes),
        )
        .await;

        let req = actix_test::TestRequest::post().uri("/api/v1/wallet/new").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        let private_key = hex::decode(body["private_key"].as_str().unwrap()).unwrap();
        let wallet = Wallet::from_secret_key(&private_key).unwrap();
        assert_eq!(wallet.address().0, body["address"]);
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            error_response(&LedgerError::ConcurrentMiningConflict).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            error_response(&LedgerError::MiningTimeout { attempts: 3 }).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            error_response(&LedgerError::EmptyChainAccess).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
