//! JSON shape of a ledger `getTransaction` response and its conversion into
//! [`RawTransaction`].

use crate::error::AppError;
use crate::solana::base58;
use crate::solana::models::{
    AccountKey, RawAmount, RawInstruction, RawTransaction, TokenBalanceSnapshot,
};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    pub slot: u64,
    #[serde(default)]
    pub block_time: Option<i64>,
    #[serde(default)]
    pub meta: Option<RpcTransactionMeta>,
    pub transaction: RpcTransactionBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransactionMeta {
    #[serde(default)]
    pub fee: u64,
    #[serde(default)]
    pub err: Option<serde_json::Value>,
    #[serde(default)]
    pub pre_token_balances: Option<Vec<RpcTokenBalance>>,
    #[serde(default)]
    pub post_token_balances: Option<Vec<RpcTokenBalance>>,
    #[serde(default)]
    pub log_messages: Option<Vec<String>>,
    /// Accounts pulled in from lookup tables by version 0 messages
    #[serde(default)]
    pub loaded_addresses: Option<RpcLoadedAddresses>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcLoadedAddresses {
    #[serde(default)]
    pub writable: Vec<String>,
    #[serde(default)]
    pub readonly: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransactionBody {
    #[serde(default)]
    pub signatures: Vec<String>,
    pub message: RpcMessage,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcMessage {
    pub account_keys: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<RpcInstruction>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcInstruction {
    pub program_id_index: usize,
    #[serde(default)]
    pub accounts: Vec<usize>,
    /// Base58-encoded payload
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTokenBalance {
    #[serde(default)]
    pub account_index: Option<usize>,
    pub mint: String,
    #[serde(default)]
    pub owner: Option<String>,
    pub ui_token_amount: RpcTokenAmount,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTokenAmount {
    /// Raw amount as a decimal string
    pub amount: String,
    pub decimals: u8,
}

impl TryFrom<RpcTransaction> for RawTransaction {
    type Error = AppError;

    fn try_from(rpc: RpcTransaction) -> Result<Self, Self::Error> {
        let message = rpc.transaction.message;
        let meta = rpc.meta.unwrap_or_default();

        // Static keys, then lookup-table writable, then lookup-table readonly
        let loaded = meta.loaded_addresses.unwrap_or_default();
        let account_keys = message
            .account_keys
            .iter()
            .chain(&loaded.writable)
            .chain(&loaded.readonly)
            .map(|key| key.parse::<AccountKey>())
            .collect::<Result<Vec<_>, _>>()?;

        let instructions = message
            .instructions
            .into_iter()
            .map(|ix| -> Result<RawInstruction, AppError> {
                Ok(RawInstruction {
                    program_id_index: ix.program_id_index,
                    accounts: ix.accounts,
                    data: base58::decode(&ix.data)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RawTransaction {
            signature: rpc.transaction.signatures.into_iter().next(),
            slot: rpc.slot,
            block_time: rpc.block_time,
            fee: meta.fee,
            failed: meta.err.as_ref().is_some_and(|err| !err.is_null()),
            instructions,
            account_keys,
            pre_token_balances: meta.pre_token_balances.map(convert_balances).transpose()?,
            post_token_balances: meta.post_token_balances.map(convert_balances).transpose()?,
            log_messages: meta.log_messages,
        })
    }
}

fn convert_balances(balances: Vec<RpcTokenBalance>) -> Result<Vec<TokenBalanceSnapshot>, AppError> {
    balances
        .into_iter()
        .map(|balance| -> Result<TokenBalanceSnapshot, AppError> {
            Ok(TokenBalanceSnapshot {
                account_index: balance.account_index,
                amount: parse_raw_amount(&balance.ui_token_amount.amount)?,
                decimals: balance.ui_token_amount.decimals,
                mint: balance.mint,
                owner: balance.owner.unwrap_or_default(),
            })
        })
        .collect()
}

/// Parse a raw token amount, keeping it within the range where deltas stay exact.
fn parse_raw_amount(text: &str) -> Result<RawAmount, AppError> {
    text.parse::<u128>()
        .ok()
        .and_then(RawAmount::new)
        .ok_or_else(|| AppError::InvalidTransaction(format!("Invalid token amount: {:?}", text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use crate::solana::models::{Address, InstructionPayload, TransactionType};

    const SAMPLE: &str = r#"{
        "slot": 301234567,
        "blockTime": 1731000000,
        "meta": {
            "fee": 5000,
            "err": null,
            "preTokenBalances": [
                {"accountIndex": 1, "mint": "So11111111111111111111111111111111111111112",
                 "owner": "owner1", "uiTokenAmount": {"amount": "100", "decimals": 6, "uiAmount": 0.0001}}
            ],
            "postTokenBalances": [
                {"accountIndex": 1, "mint": "So11111111111111111111111111111111111111112",
                 "owner": "owner1", "uiTokenAmount": {"amount": "150", "decimals": 6, "uiAmount": 0.00015}}
            ],
            "logMessages": ["Program 11111111111111111111111111111111 invoke [1]"]
        },
        "transaction": {
            "signatures": ["5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnbJLgp8uirBgmQpjKhoR4tjF3ZpRzrFmBV6UjKdiSZkQUW"],
            "message": {
                "accountKeys": [
                    "11111111111111111111111111111111",
                    "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA"
                ],
                "instructions": [
                    {"programIdIndex": 0, "accounts": [0, 1], "data": "3Bxs4PckVVt51W8w"}
                ]
            }
        }
    }"#;

    #[test]
    fn test_converts_rpc_response() {
        let rpc: RpcTransaction = serde_json::from_str(SAMPLE).unwrap();
        let raw = RawTransaction::try_from(rpc).unwrap();

        assert_eq!(raw.slot, 301_234_567);
        assert_eq!(raw.block_time, Some(1_731_000_000));
        assert_eq!(raw.fee, 5_000);
        assert!(!raw.failed);
        assert!(raw.signature.as_deref().unwrap().starts_with("5VERv8"));
        assert_eq!(raw.account_keys.len(), 2);
        assert_eq!(raw.instructions[0].data, bs58::decode("3Bxs4PckVVt51W8w").into_vec().unwrap());
        assert_eq!(raw.instructions[0].accounts, vec![0, 1]);

        let post = raw.post_token_balances.unwrap();
        assert_eq!(post[0].amount, RawAmount::from(150));
        assert_eq!(post[0].decimals, 6);
        assert_eq!(post[0].account_index, Some(1));
        assert_eq!(raw.log_messages.map(|l| l.len()), Some(1));
    }

    #[test]
    fn test_loaded_addresses_extend_account_keys() {
        let json = r#"{"slot": 2,
            "meta": {"fee": 5000, "err": null,
                "loadedAddresses": {
                    "writable": ["So11111111111111111111111111111111111111112"],
                    "readonly": ["675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8"]}},
            "transaction": {"signatures": ["v0sig"], "message": {
                "accountKeys": [
                    "11111111111111111111111111111111",
                    "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA"
                ],
                "instructions": [
                    {"programIdIndex": 1, "accounts": [2, 0, 3], "data": "3tGNFMqHiozw"},
                    {"programIdIndex": 3, "accounts": [2], "data": "2g"}
                ]}}}"#;
        let rpc: RpcTransaction = serde_json::from_str(json).unwrap();
        let raw = RawTransaction::try_from(rpc).unwrap();

        let wsol: AccountKey = "So11111111111111111111111111111111111111112".parse().unwrap();
        let raydium: AccountKey = "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8".parse().unwrap();
        assert_eq!(raw.account_keys.len(), 4);
        assert_eq!(raw.account_keys[2], wsol);
        assert_eq!(raw.account_keys[3], raydium);

        let parsed = crate::TransactionParser::default().parse_transaction(&raw);
        match &parsed.instructions[0].payload {
            InstructionPayload::Transfer { from, authority, amount, .. } => {
                assert_eq!(*from, Address::Key(wsol));
                assert_eq!(amount.value(), Some(1_000));
                assert_eq!(*authority, Some(Address::Key(raydium)));
            }
            other => panic!("unexpected payload {:?}", other),
        }
        assert_eq!(parsed.instructions[1].program.name, "Raydium AMM v4");
        assert_eq!(parsed.transaction_type, TransactionType::Transfer);
    }

    #[test]
    fn test_missing_meta_is_tolerated() {
        let json = r#"{"slot": 1, "transaction": {"message": {"accountKeys": []}}}"#;
        let rpc: RpcTransaction = serde_json::from_str(json).unwrap();
        let raw = RawTransaction::try_from(rpc).unwrap();

        assert_eq!(raw.fee, 0);
        assert!(raw.signature.is_none());
        assert!(raw.block_time.is_none());
        assert!(raw.pre_token_balances.is_none());
        assert!(raw.instructions.is_empty());
    }

    #[test]
    fn test_failed_transaction_flag() {
        let json = r#"{"slot": 1, "meta": {"fee": 10, "err": {"InstructionError": [0, "Custom"]}},
                       "transaction": {"message": {"accountKeys": []}}}"#;
        let rpc: RpcTransaction = serde_json::from_str(json).unwrap();
        assert!(RawTransaction::try_from(rpc).unwrap().failed);
    }

    #[test]
    fn test_invalid_instruction_data_character() {
        let json = r#"{"slot": 1, "transaction": {"message": {
            "accountKeys": ["11111111111111111111111111111111"],
            "instructions": [{"programIdIndex": 0, "accounts": [], "data": "0OIl"}]}}}"#;
        let rpc: RpcTransaction = serde_json::from_str(json).unwrap();

        match RawTransaction::try_from(rpc) {
            Err(AppError::Decode(DecodeError::InvalidCharacter { character: '0', position: 0 })) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_invalid_token_amount() {
        let json = r#"{"slot": 1, "meta": {"fee": 0,
            "postTokenBalances": [{"mint": "m", "uiTokenAmount": {"amount": "1.5", "decimals": 0}}]},
            "transaction": {"message": {"accountKeys": []}}}"#;
        let rpc: RpcTransaction = serde_json::from_str(json).unwrap();
        assert!(matches!(RawTransaction::try_from(rpc), Err(AppError::InvalidTransaction(_))));
    }

    #[test]
    fn test_amount_bounds() {
        assert_eq!(
            parse_raw_amount("170141183460469231731687303715884105727").unwrap(),
            RawAmount::MAX
        );
        assert!(parse_raw_amount("170141183460469231731687303715884105728").is_err());
        assert!(parse_raw_amount(&u128::MAX.to_string()).is_err());
        assert!(parse_raw_amount("-1").is_err());
    }
}
