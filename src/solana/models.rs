use crate::error::DecodeError;
use crate::solana::base58;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Length in bytes of every ledger address.
pub const ACCOUNT_KEY_LEN: usize = 32;

/// A 32-byte ledger address, displayed in base58.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountKey([u8; ACCOUNT_KEY_LEN]);

impl AccountKey {
    pub const fn new(bytes: [u8; ACCOUNT_KEY_LEN]) -> Self {
        Self(bytes)
    }
}

impl FromStr for AccountKey {
    type Err = DecodeError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let bytes = base58::decode(text)?;
        let actual = bytes.len();
        let bytes: [u8; ACCOUNT_KEY_LEN] =
            bytes.try_into().map_err(|_| DecodeError::InvalidLength {
                expected: ACCOUNT_KEY_LEN,
                actual,
            })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&base58::encode(&self.0))
    }
}

impl fmt::Debug for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountKey({})", self)
    }
}

impl Serialize for AccountKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AccountKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// An address resolved from an account index, or a placeholder when the
/// index pointed outside the transaction's account-key table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Address {
    Key(AccountKey),
    Unknown,
}

impl Address {
    /// Resolve `index` against `account_keys`, yielding `Unknown` when out of range.
    pub fn resolve(account_keys: &[AccountKey], index: usize) -> Self {
        account_keys
            .get(index)
            .copied()
            .map(Address::Key)
            .unwrap_or(Address::Unknown)
    }

    pub fn key(&self) -> Option<&AccountKey> {
        match self {
            Address::Key(key) => Some(key),
            Address::Unknown => None,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Key(key) => fmt::Display::fmt(key, f),
            Address::Unknown => f.write_str("Unknown"),
        }
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A transaction record as delivered by the ledger, already deserialized.
///
/// Slot, fee and the account-key table are always present; block time,
/// balance snapshots and log messages may be missing upstream.
#[derive(Debug, Clone, Default)]
pub struct RawTransaction {
    /// Base58-encoded signature, when the source carried one
    pub signature: Option<String>,
    pub slot: u64,
    /// Unix timestamp of the block
    pub block_time: Option<i64>,
    /// Fee paid in lamports
    pub fee: u64,
    /// Whether the ledger reported an execution error
    pub failed: bool,
    pub instructions: Vec<RawInstruction>,
    pub account_keys: Vec<AccountKey>,
    pub pre_token_balances: Option<Vec<TokenBalanceSnapshot>>,
    pub post_token_balances: Option<Vec<TokenBalanceSnapshot>>,
    pub log_messages: Option<Vec<String>>,
}

/// One compiled instruction: indices into the account-key table plus payload bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawInstruction {
    pub program_id_index: usize,
    pub accounts: Vec<usize>,
    pub data: Vec<u8>,
}

/// Raw token amount in the smallest unit.
///
/// Bounded to `0..=i128::MAX`, so the difference of any two amounts is exact in `i128`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RawAmount(u128);

impl RawAmount {
    pub const ZERO: RawAmount = RawAmount(0);
    pub const MAX: RawAmount = RawAmount(i128::MAX as u128);

    /// `None` when `value` exceeds `i128::MAX`.
    pub const fn new(value: u128) -> Option<Self> {
        if value <= i128::MAX as u128 {
            Some(Self(value))
        } else {
            None
        }
    }

    pub const fn get(self) -> u128 {
        self.0
    }

    /// `self - other`, never overflowing.
    pub const fn signed_sub(self, other: RawAmount) -> i128 {
        self.0 as i128 - other.0 as i128
    }
}

impl From<u64> for RawAmount {
    fn from(value: u64) -> Self {
        Self(u128::from(value))
    }
}

impl fmt::Display for RawAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A token account balance captured before or after execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBalanceSnapshot {
    /// Position of the token account in the account-key table, if known
    pub account_index: Option<usize>,
    pub mint: String,
    pub owner: String,
    /// Raw amount in the token's smallest unit
    pub amount: RawAmount,
    pub decimals: u8,
}

/// Symbolic identity of an on-chain program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProgramKind {
    SystemProgram,
    TokenProgram,
    AssociatedTokenProgram,
    ExchangeProgram,
    Unknown,
}

/// Resolved program identity for a decoded instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramRef {
    pub kind: ProgramKind,
    pub name: String,
    pub address: Address,
}

/// Amount field of a transfer, or a marker that the payload was too short to hold it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferAmount {
    Decoded(u64),
    InsufficientData { required: usize, actual: usize },
}

impl TransferAmount {
    pub fn value(&self) -> Option<u64> {
        match self {
            TransferAmount::Decoded(amount) => Some(*amount),
            TransferAmount::InsufficientData { .. } => None,
        }
    }
}

/// Decoded payload of an instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum InstructionPayload {
    /// Native or token transfer. `authority` is set for token transfers.
    Transfer {
        from: Address,
        to: Address,
        #[serde(skip_serializing_if = "Option::is_none")]
        authority: Option<Address>,
        amount: TransferAmount,
    },
    UnknownSystemInstruction { opcode: u8 },
    UnknownTokenInstruction { opcode: u8 },
    /// Invocation of an exchange program; trade detail comes from balance deltas.
    Exchange,
    UnknownInstructionType,
    InvalidInstructionData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedInstruction {
    pub program: ProgramRef,
    pub accounts: Vec<Address>,
    pub payload: InstructionPayload,
}

impl ParsedInstruction {
    /// Transaction-type signal this instruction contributes, if any.
    pub fn type_signal(&self) -> Option<TransactionType> {
        if self.program.kind == ProgramKind::ExchangeProgram {
            return Some(TransactionType::Trade);
        }
        match self.payload {
            InstructionPayload::Transfer { .. } => Some(TransactionType::Transfer),
            _ => None,
        }
    }
}

/// Direction of a balance change, from the owner's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeltaDirection {
    /// Balance grew
    Buy,
    /// Balance shrank
    Sell,
    NoChange,
}

/// Change of one token balance across the transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenDelta {
    /// Position of the token account in the account-key table, when the ledger reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_index: Option<usize>,

    /// Mint address of the token, taken from the post balance
    pub mint: String,

    /// Wallet owning the token account, taken from the post balance
    pub owner: String,

    /// Balance before the transaction
    #[serde(serialize_with = "serialize_as_string")]
    pub pre_amount: RawAmount,

    /// Balance after the transaction
    #[serde(serialize_with = "serialize_as_string")]
    pub post_amount: RawAmount,

    /// post - pre in raw units; the source of truth for the change
    #[serde(serialize_with = "serialize_as_string")]
    pub raw_change: i128,

    /// Decimal places of the mint
    pub decimals: u8,

    /// |raw_change| / 10^decimals, for display only
    pub ui_amount: f64,

    /// Sign of `raw_change`
    pub direction: DeltaDirection,
}

/// One reconstructed leg of an exchange: a balance that grew and one that shrank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradePair {
    pub buy: TokenDelta,
    pub sell: TokenDelta,
}

/// Overall classification of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TransactionType {
    #[default]
    Unknown,
    Transfer,
    Trade,
}

/// Structured description of one transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedTransaction {
    /// Base58-encoded transaction signature (None when the source omitted it)
    pub signature: Option<String>,

    /// Slot number in which this transaction was processed
    pub slot: u64,

    /// Block time (may be None for unconfirmed transactions)
    pub block_time: Option<DateTime<Utc>>,

    /// Transaction fee paid in lamports
    pub fee: u64,

    /// First account key, which pays the fee
    pub fee_payer: Address,

    /// Whether the transaction executed without error
    pub success: bool,

    /// Set by the first instruction that signals a transfer or a trade
    pub transaction_type: TransactionType,

    /// Decoded top-level instructions, in transaction order
    pub instructions: Vec<ParsedInstruction>,

    /// One entry per post token balance
    pub token_deltas: Vec<TokenDelta>,

    /// Buy/sell pairs formed from `token_deltas`
    pub trade_pairs: Vec<TradePair>,

    /// Names of the invoked programs, deduplicated in first-seen order
    pub invoked_programs: Vec<String>,

    /// Number of log lines the ledger returned
    pub log_message_count: usize,
}

fn serialize_as_string<T: fmt::Display, S: Serializer>(
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_key_text_round_trip() {
        let text = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
        let key: AccountKey = text.parse().unwrap();
        assert_eq!(key.to_string(), text);
    }

    #[test]
    fn test_account_key_rejects_wrong_length() {
        let err = "2g".parse::<AccountKey>().unwrap_err();
        assert_eq!(err, DecodeError::InvalidLength { expected: 32, actual: 1 });
    }

    #[test]
    fn test_address_resolution_out_of_range() {
        let keys = vec![AccountKey::new([1; 32])];
        assert_eq!(Address::resolve(&keys, 0), Address::Key(keys[0]));
        assert_eq!(Address::resolve(&keys, 1), Address::Unknown);
        assert_eq!(Address::Unknown.to_string(), "Unknown");
    }

    #[test]
    fn test_token_delta_serializes_amounts_as_strings() {
        let delta = TokenDelta {
            account_index: None,
            mint: "mint".to_string(),
            owner: "owner".to_string(),
            pre_amount: RawAmount::from(100),
            post_amount: RawAmount::from(40),
            raw_change: -60,
            decimals: 6,
            ui_amount: 0.00006,
            direction: DeltaDirection::Sell,
        };
        let json = serde_json::to_value(&delta).unwrap();
        assert_eq!(json["raw_change"], "-60");
        assert_eq!(json["pre_amount"], "100");
        assert_eq!(json["direction"], "Sell");
        assert!(json.get("account_index").is_none());
    }

    #[test]
    fn test_raw_amount_bounds() {
        assert_eq!(RawAmount::new(i128::MAX as u128), Some(RawAmount::MAX));
        assert_eq!(RawAmount::new(i128::MAX as u128 + 1), None);
        assert_eq!(RawAmount::new(u128::MAX), None);
        assert_eq!(RawAmount::MAX.signed_sub(RawAmount::ZERO), i128::MAX);
        assert_eq!(RawAmount::ZERO.signed_sub(RawAmount::MAX), -i128::MAX);
    }
}
