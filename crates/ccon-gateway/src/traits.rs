//! The contract gateway trait.

use async_trait::async_trait;
use ccon_core::{Address, ContentAddress, TxHash, Wei};

use crate::error::GatewayError;
use crate::types::{
    ApprovedInvoice, BlockInfo, CallOptions, CashRequest, ContractReceipt, FillOffer,
    GoodsRequest, NewGoodsRequest, PendingTx,
};

/// The fixed set of operations the console performs against the aid contract.
///
/// Mutating operations return as soon as the transaction is submitted; use
/// [`crate::confirm::wait_for_receipt`] to wait for it to be mined. Views
/// return `None` when the corresponding contract slot is unset.
#[async_trait]
pub trait ContractGateway: Send + Sync {
    /// `deposit(amount)`, payable. `opts.value` should carry the same amount.
    async fn deposit(&self, amount: Wei, opts: &CallOptions) -> Result<PendingTx, GatewayError>;

    /// `registerRequest(owner, name, type, quantity, location)`.
    async fn register_request(
        &self,
        request: &NewGoodsRequest,
        opts: &CallOptions,
    ) -> Result<PendingTx, GatewayError>;

    /// `viewRequest()`.
    async fn view_request(&self) -> Result<Option<GoodsRequest>, GatewayError>;

    /// `fillRequest(supplier, amount, invoiceNumber)`. Requires an explicit
    /// keystore signer.
    async fn fill_request(
        &self,
        supplier: &Address,
        amount: Wei,
        invoice_number: u64,
        opts: &CallOptions,
    ) -> Result<PendingTx, GatewayError>;

    /// `viewFillOffer()`.
    async fn view_fill_offer(&self) -> Result<Option<FillOffer>, GatewayError>;

    /// `approveFillOffer()`.
    async fn approve_fill_offer(&self, opts: &CallOptions) -> Result<PendingTx, GatewayError>;

    /// `viewApprovedInvoice()`.
    async fn view_approved_invoice(&self) -> Result<Option<ApprovedInvoice>, GatewayError>;

    /// `payInvoice(invoiceNum, received)`.
    async fn pay_invoice(
        &self,
        invoice_number: u64,
        received: bool,
        opts: &CallOptions,
    ) -> Result<PendingTx, GatewayError>;

    /// `requestCash(amount)`.
    async fn request_cash(&self, amount: Wei, opts: &CallOptions)
        -> Result<PendingTx, GatewayError>;

    /// `viewCashRequest()`.
    async fn view_cash_request(&self) -> Result<Option<CashRequest>, GatewayError>;

    /// `sendCash(amount, requester, approver)`.
    async fn send_cash(
        &self,
        amount: Wei,
        requester: &Address,
        approver: &Address,
        opts: &CallOptions,
    ) -> Result<PendingTx, GatewayError>;

    /// `getIPFSHash()`: the persisted ledger pointer, `None` before the first
    /// publish.
    async fn ipfs_hash(&self) -> Result<Option<ContentAddress>, GatewayError>;

    /// `setIPFSHash(hash)`: overwrite the persisted ledger pointer.
    async fn set_ipfs_hash(
        &self,
        address: &ContentAddress,
        opts: &CallOptions,
    ) -> Result<PendingTx, GatewayError>;

    /// Accounts known to the node, in node order.
    async fn accounts(&self) -> Result<Vec<Address>, GatewayError>;

    /// Balance of an account or contract.
    async fn balance(&self, address: &Address) -> Result<Wei, GatewayError>;

    /// The latest block header.
    async fn latest_block(&self) -> Result<BlockInfo, GatewayError>;

    /// Receipt of a mined transaction, `None` while it is still pending.
    async fn transaction_receipt(
        &self,
        tx_hash: &TxHash,
    ) -> Result<Option<ContractReceipt>, GatewayError>;
}
