//! # Simulated Contract
//!
//! An in-process stand-in for the aid contract and its chain, used by tests
//! and by `ccon-api --simulate`. It keeps just enough state to drive the
//! console end to end: account balances, the single open goods request,
//! fill offer, approved invoice and cash request, the ledger pointer, and a
//! block counter. Every mutating call mines its own block.
//!
//! Fault injection:
//! - [`SimulatedContract::fail_function`] makes a function revert with a
//!   given message.
//! - [`SimulatedContract::withhold_confirmations`] keeps new receipts
//!   pending until [`SimulatedContract::release_withheld`] is called.
//!
//! State effects apply at submission; withholding only delays the receipt.

use std::collections::HashMap;

use async_trait::async_trait;
use ccon_core::{Address, ContentAddress, TxHash, Wei};
use parking_lot::Mutex;

use crate::error::GatewayError;
use crate::traits::ContractGateway;
use crate::types::{
    ApprovedInvoice, BlockInfo, CallOptions, CashRequest, ContractReceipt, FillOffer,
    GoodsRequest, NewGoodsRequest, PendingTx, Signer,
};

/// Timestamp of block 0.
const GENESIS_TIMESTAMP: u64 = 1_650_000_000;
/// Seconds between simulated blocks.
const BLOCK_TIME_SECS: u64 = 12;
/// Accounts created by [`SimulatedContract::new`].
const ACCOUNT_COUNT: u8 = 10;
/// Starting balance of every account, in ether.
const INITIAL_BALANCE_ETHER: u64 = 100;

#[derive(Debug)]
struct SimState {
    contract: Address,
    accounts: Vec<Address>,
    balances: HashMap<Address, Wei>,
    request: Option<GoodsRequest>,
    offer: Option<FillOffer>,
    approved: Option<ApprovedInvoice>,
    cash: Option<CashRequest>,
    pointer: Option<ContentAddress>,
    pointer_writes: u64,
    mined: HashMap<TxHash, ContractReceipt>,
    withheld: Vec<ContractReceipt>,
    withhold: bool,
    faults: HashMap<String, String>,
    block_number: u64,
    nonce: u64,
}

impl SimState {
    fn balance(&self, address: &Address) -> Wei {
        self.balances.get(address).copied().unwrap_or(Wei::ZERO)
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: Wei) -> Result<(), String> {
        let debited = self
            .balance(from)
            .checked_sub(amount)
            .ok_or_else(|| format!("insufficient funds in {from}"))?;
        self.balances.insert(from.clone(), debited);
        let credited = self
            .balance(to)
            .checked_add(amount)
            .ok_or_else(|| "balance overflow".to_string())?;
        self.balances.insert(to.clone(), credited);
        Ok(())
    }
}

/// In-process simulation of the aid contract.
#[derive(Debug)]
pub struct SimulatedContract {
    state: Mutex<SimState>,
}

impl Default for SimulatedContract {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedContract {
    /// A fresh chain with ten funded accounts and an empty contract.
    pub fn new() -> Self {
        let accounts: Vec<Address> = (1..=ACCOUNT_COUNT)
            .map(|i| {
                let mut bytes = [0u8; 20];
                bytes[0] = 0xa0;
                bytes[19] = i;
                Address::from_bytes(bytes)
            })
            .collect();
        let balances = accounts
            .iter()
            .map(|a| (a.clone(), Wei::from_ether(INITIAL_BALANCE_ETHER)))
            .collect();
        Self {
            state: Mutex::new(SimState {
                contract: Address::from_bytes([0xcc; 20]),
                accounts,
                balances,
                request: None,
                offer: None,
                approved: None,
                cash: None,
                pointer: None,
                pointer_writes: 0,
                mined: HashMap::new(),
                withheld: Vec::new(),
                withhold: false,
                faults: HashMap::new(),
                block_number: 0,
                nonce: 0,
            }),
        }
    }

    /// Address of the simulated contract.
    pub fn contract_address(&self) -> Address {
        self.state.lock().contract.clone()
    }

    /// Make `function` revert with `message` until faults are cleared.
    pub fn fail_function(&self, function: &str, message: &str) {
        self.state
            .lock()
            .faults
            .insert(function.to_string(), message.to_string());
    }

    /// Remove all injected reverts.
    pub fn clear_faults(&self) {
        self.state.lock().faults.clear();
    }

    /// While enabled, new transactions stay pending.
    pub fn withhold_confirmations(&self, withhold: bool) {
        self.state.lock().withhold = withhold;
    }

    /// Mine every withheld transaction. Returns how many were released.
    pub fn release_withheld(&self) -> usize {
        let mut state = self.state.lock();
        let released: Vec<ContractReceipt> = state.withheld.drain(..).collect();
        let count = released.len();
        for receipt in released {
            state.mined.insert(receipt.tx_hash.clone(), receipt);
        }
        count
    }

    /// Current ledger pointer.
    pub fn pointer(&self) -> Option<ContentAddress> {
        self.state.lock().pointer.clone()
    }

    /// Number of pointer overwrites so far.
    pub fn pointer_writes(&self) -> u64 {
        self.state.lock().pointer_writes
    }

    /// Submit a mutating call: check faults, apply the state change, mine.
    fn submit(
        &self,
        function: &str,
        opts: &CallOptions,
        apply: impl FnOnce(&mut SimState) -> Result<(), String>,
    ) -> Result<PendingTx, GatewayError> {
        let mut state = self.state.lock();
        let rejected = |message: String| GatewayError::CallFailed {
            function: function.to_string(),
            message,
        };

        if let Some(message) = state.faults.get(function) {
            return Err(rejected(message.clone()));
        }
        apply(&mut state).map_err(rejected)?;

        state.nonce += 1;
        state.block_number += 1;
        let mut hash = [0u8; 32];
        hash[0] = 0x5c;
        hash[24..].copy_from_slice(&state.nonce.to_be_bytes());
        let receipt = ContractReceipt {
            tx_hash: TxHash::from_bytes(hash),
            from: opts.from.clone(),
            to: state.contract.clone(),
            gas_used: gas_for(function),
            block_number: state.block_number,
            success: true,
        };
        let pending = PendingTx {
            tx_hash: receipt.tx_hash.clone(),
            function: function.to_string(),
        };
        if state.withhold {
            state.withheld.push(receipt);
        } else {
            state.mined.insert(receipt.tx_hash.clone(), receipt);
        }
        tracing::debug!(function, tx_hash = %pending.tx_hash, "simulated call mined");
        Ok(pending)
    }
}

/// Fixed gas figures per function.
fn gas_for(function: &str) -> u64 {
    match function {
        "deposit" => 28_431,
        "registerRequest" => 161_204,
        "fillRequest" => 118_902,
        "approveFillOffer" => 74_310,
        "payInvoice" => 52_877,
        "requestCash" => 66_015,
        "sendCash" => 41_390,
        "setIPFSHash" => 47_263,
        _ => 21_000,
    }
}

#[async_trait]
impl ContractGateway for SimulatedContract {
    async fn deposit(&self, amount: Wei, opts: &CallOptions) -> Result<PendingTx, GatewayError> {
        self.submit("deposit", opts, |state| {
            if opts.value != Some(amount) {
                return Err("deposit value must equal amount".to_string());
            }
            let contract = state.contract.clone();
            state.transfer(&opts.from, &contract, amount)
        })
    }

    async fn register_request(
        &self,
        request: &NewGoodsRequest,
        opts: &CallOptions,
    ) -> Result<PendingTx, GatewayError> {
        self.submit("registerRequest", opts, |state| {
            state.request = Some(GoodsRequest {
                owner: request.owner.clone(),
                name: request.name.clone(),
                product_type: request.product_type,
                quantity: request.quantity,
                location: request.location.clone(),
                status: "Open".to_string(),
            });
            state.offer = None;
            state.approved = None;
            Ok(())
        })
    }

    async fn view_request(&self) -> Result<Option<GoodsRequest>, GatewayError> {
        Ok(self.state.lock().request.clone())
    }

    async fn fill_request(
        &self,
        supplier: &Address,
        amount: Wei,
        invoice_number: u64,
        opts: &CallOptions,
    ) -> Result<PendingTx, GatewayError> {
        self.submit("fillRequest", opts, |state| {
            match &opts.signer {
                Signer::Keystore { key_id } if !key_id.is_empty() => {}
                _ => return Err("fillRequest must be signed by the supplier key".to_string()),
            }
            let request = state
                .request
                .as_mut()
                .filter(|r| r.status == "Open")
                .ok_or_else(|| "no open request".to_string())?;
            request.status = "Offer Received".to_string();
            state.offer = Some(FillOffer {
                supplier: supplier.clone(),
                amount,
                invoice_number,
                name: request.name.clone(),
                product_type: request.product_type,
                quantity: request.quantity,
            });
            Ok(())
        })
    }

    async fn view_fill_offer(&self) -> Result<Option<FillOffer>, GatewayError> {
        Ok(self.state.lock().offer.clone())
    }

    async fn approve_fill_offer(&self, opts: &CallOptions) -> Result<PendingTx, GatewayError> {
        self.submit("approveFillOffer", opts, |state| {
            let offer = state
                .offer
                .clone()
                .ok_or_else(|| "no fill offer to approve".to_string())?;
            if let Some(request) = state.request.as_mut() {
                request.status = "Approved".to_string();
            }
            state.approved = Some(ApprovedInvoice {
                supplier: offer.supplier,
                amount: offer.amount,
                invoice_number: offer.invoice_number,
            });
            Ok(())
        })
    }

    async fn view_approved_invoice(&self) -> Result<Option<ApprovedInvoice>, GatewayError> {
        Ok(self.state.lock().approved.clone())
    }

    async fn pay_invoice(
        &self,
        invoice_number: u64,
        received: bool,
        opts: &CallOptions,
    ) -> Result<PendingTx, GatewayError> {
        self.submit("payInvoice", opts, |state| {
            let invoice = state
                .approved
                .clone()
                .filter(|i| i.invoice_number == invoice_number)
                .ok_or_else(|| format!("invoice {invoice_number} is not approved"))?;
            if !received {
                return Err("goods not received".to_string());
            }
            let contract = state.contract.clone();
            state.transfer(&contract, &invoice.supplier, invoice.amount)?;
            if let Some(request) = state.request.as_mut() {
                request.status = "Paid".to_string();
            }
            state.offer = None;
            state.approved = None;
            Ok(())
        })
    }

    async fn request_cash(
        &self,
        amount: Wei,
        opts: &CallOptions,
    ) -> Result<PendingTx, GatewayError> {
        self.submit("requestCash", opts, |state| {
            state.cash = Some(CashRequest {
                requester: opts.from.clone(),
                amount,
            });
            Ok(())
        })
    }

    async fn view_cash_request(&self) -> Result<Option<CashRequest>, GatewayError> {
        Ok(self.state.lock().cash.clone())
    }

    async fn send_cash(
        &self,
        amount: Wei,
        requester: &Address,
        _approver: &Address,
        opts: &CallOptions,
    ) -> Result<PendingTx, GatewayError> {
        self.submit("sendCash", opts, |state| {
            state
                .cash
                .as_ref()
                .filter(|c| &c.requester == requester && c.amount == amount)
                .ok_or_else(|| "no matching cash request".to_string())?;
            let contract = state.contract.clone();
            state.transfer(&contract, requester, amount)?;
            state.cash = None;
            Ok(())
        })
    }

    async fn ipfs_hash(&self) -> Result<Option<ContentAddress>, GatewayError> {
        Ok(self.state.lock().pointer.clone())
    }

    async fn set_ipfs_hash(
        &self,
        address: &ContentAddress,
        opts: &CallOptions,
    ) -> Result<PendingTx, GatewayError> {
        self.submit("setIPFSHash", opts, |state| {
            state.pointer = Some(address.clone());
            state.pointer_writes += 1;
            Ok(())
        })
    }

    async fn accounts(&self) -> Result<Vec<Address>, GatewayError> {
        Ok(self.state.lock().accounts.clone())
    }

    async fn balance(&self, address: &Address) -> Result<Wei, GatewayError> {
        Ok(self.state.lock().balance(address))
    }

    async fn latest_block(&self) -> Result<BlockInfo, GatewayError> {
        let number = self.state.lock().block_number;
        Ok(BlockInfo {
            number,
            hash: format!("0x{number:064x}"),
            timestamp: GENESIS_TIMESTAMP + number * BLOCK_TIME_SECS,
        })
    }

    async fn transaction_receipt(
        &self,
        tx_hash: &TxHash,
    ) -> Result<Option<ContractReceipt>, GatewayError> {
        Ok(self.state.lock().mined.get(tx_hash).cloned())
    }
}
