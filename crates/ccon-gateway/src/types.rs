//! Typed request and response shapes for the aid contract.
//!
//! Contract views return positional tuples; the relay forwards them as JSON
//! arrays. Each view type here decodes from that array and is `None` when the
//! contract slot is unset (owner, supplier or requester is the zero address).

use ccon_core::{Address, TxHash, ValidationError, Wei};
use serde::{Deserialize, Serialize};

// -- Request inputs -----------------------------------------------------------

/// Kind of assistance requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductType {
    Food,
    Supplies,
    /// A ride; always requested with quantity 1.
    Ride,
}

impl ProductType {
    /// Name as recorded on the contract.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Supplies => "Supplies",
            Self::Ride => "Ride",
        }
    }
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Food" => Ok(Self::Food),
            "Supplies" => Ok(Self::Supplies),
            "Ride" => Ok(Self::Ride),
            other => Err(ValidationError::InvalidProductType(other.to_string())),
        }
    }
}

/// Postal address of a request, entered as separate form fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestLocation {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl std::fmt::Display for RequestLocation {
    /// Free-text form stored on the contract: `"{street} {city} {state} {zip}"`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} {}", self.street, self.city, self.state, self.zip)
    }
}

/// Arguments of `registerRequest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewGoodsRequest {
    pub owner: Address,
    pub name: String,
    pub product_type: ProductType,
    pub quantity: u64,
    pub location: String,
}

impl NewGoodsRequest {
    /// Build request arguments. A [`ProductType::Ride`] always carries
    /// quantity 1 regardless of `quantity`.
    pub fn new(
        owner: Address,
        name: impl Into<String>,
        product_type: ProductType,
        quantity: u64,
        location: &RequestLocation,
    ) -> Self {
        let quantity = match product_type {
            ProductType::Ride => 1,
            _ => quantity,
        };
        Self {
            owner,
            name: name.into(),
            product_type,
            quantity,
            location: location.to_string(),
        }
    }
}

// -- View results -------------------------------------------------------------

/// The contract's current goods request (`viewRequest`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoodsRequest {
    pub owner: Address,
    pub name: String,
    pub product_type: ProductType,
    pub quantity: u64,
    pub location: String,
    pub status: String,
}

/// The supplier's pending offer (`viewFillOffer`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FillOffer {
    pub supplier: Address,
    pub amount: Wei,
    pub invoice_number: u64,
    pub name: String,
    pub product_type: ProductType,
    pub quantity: u64,
}

/// The invoice approved for payment (`viewApprovedInvoice`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovedInvoice {
    pub supplier: Address,
    pub amount: Wei,
    pub invoice_number: u64,
}

/// The open cash request (`viewCashRequest`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CashRequest {
    pub requester: Address,
    pub amount: Wei,
}

/// `viewRequest` as returned on the wire.
#[derive(Debug, Deserialize)]
pub(crate) struct GoodsRequestTuple(
    pub Address,
    pub String,
    pub String,
    pub u64,
    pub String,
    pub String,
);

/// `viewFillOffer` as returned on the wire.
#[derive(Debug, Deserialize)]
pub(crate) struct FillOfferTuple(
    pub Address,
    pub Wei,
    pub u64,
    pub String,
    pub String,
    pub u64,
);

/// `viewApprovedInvoice` as returned on the wire.
#[derive(Debug, Deserialize)]
pub(crate) struct ApprovedInvoiceTuple(pub Address, pub Wei, pub u64);

/// `viewCashRequest` as returned on the wire.
#[derive(Debug, Deserialize)]
pub(crate) struct CashRequestTuple(pub Address, pub Wei);

impl GoodsRequestTuple {
    pub(crate) fn into_view(self) -> Result<Option<GoodsRequest>, ValidationError> {
        if self.0.is_zero() {
            return Ok(None);
        }
        Ok(Some(GoodsRequest {
            owner: self.0,
            name: self.1,
            product_type: self.2.parse()?,
            quantity: self.3,
            location: self.4,
            status: self.5,
        }))
    }
}

impl FillOfferTuple {
    pub(crate) fn into_view(self) -> Result<Option<FillOffer>, ValidationError> {
        if self.0.is_zero() {
            return Ok(None);
        }
        Ok(Some(FillOffer {
            supplier: self.0,
            amount: self.1,
            invoice_number: self.2,
            name: self.3,
            product_type: self.4.parse()?,
            quantity: self.5,
        }))
    }
}

impl ApprovedInvoiceTuple {
    pub(crate) fn into_view(self) -> Option<ApprovedInvoice> {
        (!self.0.is_zero()).then(|| ApprovedInvoice {
            supplier: self.0,
            amount: self.1,
            invoice_number: self.2,
        })
    }
}

impl CashRequestTuple {
    pub(crate) fn into_view(self) -> Option<CashRequest> {
        (!self.0.is_zero()).then(|| CashRequest {
            requester: self.0,
            amount: self.1,
        })
    }
}

// -- Transactions -------------------------------------------------------------

/// Who signs a mutating call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Signer {
    /// Account managed by the node behind the relay.
    Node,
    /// Explicit signature with a key held by the relay's keystore.
    Keystore { key_id: String },
}

/// Sender, attached value and signer for a mutating call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallOptions {
    pub from: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Wei>,
    pub signer: Signer,
}

impl CallOptions {
    /// Node-signed call from `from` with no value attached.
    pub fn sender(from: Address) -> Self {
        Self {
            from,
            value: None,
            signer: Signer::Node,
        }
    }

    /// Attach value (payable calls).
    pub fn with_value(mut self, value: Wei) -> Self {
        self.value = Some(value);
        self
    }

    /// Sign with a keystore key instead of the node account.
    pub fn signed_by(mut self, key_id: impl Into<String>) -> Self {
        self.signer = Signer::Keystore {
            key_id: key_id.into(),
        };
        self
    }
}

/// A submitted, not yet confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTx {
    pub tx_hash: TxHash,
    /// Contract function that was called.
    pub function: String,
}

/// Receipt of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractReceipt {
    pub tx_hash: TxHash,
    pub from: Address,
    pub to: Address,
    pub gas_used: u64,
    pub block_number: u64,
    /// `false` when the transaction was mined but reverted.
    #[serde(default = "default_success")]
    pub success: bool,
}

fn default_success() -> bool {
    true
}

/// Header fields of the latest block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub number: u64,
    pub hash: String,
    /// Block time, seconds since the Unix epoch.
    pub timestamp: u64,
}
