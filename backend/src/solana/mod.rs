use log::{info, warn};
use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::config::RpcTransactionConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::native_token::sol_to_lamports;
use solana_sdk::pubkey::{ParsePubkeyError, Pubkey};
use solana_sdk::signature::{ParseSignatureError, Signature};
use solana_sdk::system_instruction::SystemInstruction;
use solana_sdk::system_program;
use solana_sdk::transaction::VersionedTransaction;
use solana_transaction_status::UiTransactionEncoding;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum SolanaError {
    #[error("RPC error: {0}")]
    Rpc(#[from] solana_rpc_client_api::client_error::Error),
    #[error("Invalid transaction signature: {0}")]
    InvalidSignature(#[from] ParseSignatureError),
    #[error("Invalid wallet address: {0}")]
    InvalidWallet(#[from] ParsePubkeyError),
}

/// A SOL transfer that must appear in a payment transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedPayment {
    pub payer: Pubkey,
    pub recipient: Pubkey,
    pub lamports: u64,
}

impl ExpectedPayment {
    pub fn new(payer: &str, recipient: &str, price_sol: f64) -> Result<Self, SolanaError> {
        Ok(Self {
            payer: Pubkey::from_str(payer)?,
            recipient: Pubkey::from_str(recipient)?,
            lamports: sol_to_lamports(price_sol),
        })
    }

    /// Lamports moved from payer to recipient by top-level system transfers.
    pub fn transferred(&self, tx: &VersionedTransaction) -> u64 {
        let keys = tx.message.static_account_keys();
        tx.message
            .instructions()
            .iter()
            .filter_map(|ix| {
                let program = keys.get(usize::from(ix.program_id_index))?;
                if *program != system_program::id() {
                    return None;
                }
                let from = keys.get(usize::from(*ix.accounts.first()?))?;
                let to = keys.get(usize::from(*ix.accounts.get(1)?))?;
                match bincode::deserialize::<SystemInstruction>(&ix.data).ok()? {
                    SystemInstruction::Transfer { lamports }
                        if *from == self.payer && *to == self.recipient =>
                    {
                        Some(lamports)
                    }
                    _ => None,
                }
            })
            .fold(0, u64::saturating_add)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Verified,
    /// Not found, not yet confirmed, or failed on chain.
    Unconfirmed,
    Insufficient { paid: u64 },
}

/// Read-only view of the chain: the backend never signs or submits.
pub struct SolanaClient {
    rpc: RpcClient,
}

impl SolanaClient {
    pub fn new(rpc_url: &str) -> Self {
        let rpc = RpcClient::new_with_commitment(rpc_url.to_string(), CommitmentConfig::confirmed());
        Self { rpc }
    }

    pub fn rpc_url(&self) -> String {
        self.rpc.url()
    }

    /// Checks that `tx_signature` landed at `confirmed` commitment and pays
    /// at least the expected amount from payer to recipient.
    pub async fn verify_payment(
        &self,
        tx_signature: &str,
        expected: &ExpectedPayment,
    ) -> Result<PaymentStatus, SolanaError> {
        let signature = Signature::from_str(tx_signature)?;
        let status = self.rpc.get_signature_status(&signature).await?;
        info!("Signature {} status: {:?}", signature, status);
        if !matches!(status, Some(Ok(()))) {
            return Ok(PaymentStatus::Unconfirmed);
        }

        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Base64),
            commitment: Some(CommitmentConfig::confirmed()),
            max_supported_transaction_version: Some(0),
        };
        let confirmed = self
            .rpc
            .get_transaction_with_config(&signature, config)
            .await?;
        let succeeded = confirmed
            .transaction
            .meta
            .as_ref()
            .is_some_and(|meta| meta.err.is_none());
        let Some(tx) = confirmed.transaction.transaction.decode() else {
            warn!("Could not decode transaction {}", signature);
            return Ok(PaymentStatus::Unconfirmed);
        };
        if !succeeded {
            return Ok(PaymentStatus::Unconfirmed);
        }

        let paid = expected.transferred(&tx);
        if paid < expected.lamports {
            warn!(
                "Transaction {} pays {} of {} lamports to {}",
                signature, paid, expected.lamports, expected.recipient
            );
            return Ok(PaymentStatus::Insufficient { paid });
        }
        Ok(PaymentStatus::Verified)
    }
}
