use crate::solana::balances;
use crate::solana::instruction::InstructionDecoder;
use crate::solana::models::{
    Address, ParsedInstruction, ParsedTransaction, RawTransaction, TransactionType,
};
use crate::solana::pairing;
use crate::solana::programs::ProgramRegistry;
use chrono::{DateTime, Utc};

/// Turns raw ledger transactions into structured descriptions.
///
/// Holds only the immutable program registry, so one parser can be shared
/// across threads and invoked concurrently on independent inputs.
#[derive(Debug, Clone, Default)]
pub struct TransactionParser {
    registry: ProgramRegistry,
}

impl TransactionParser {
    pub fn new(registry: ProgramRegistry) -> Self {
        Self { registry }
    }

    /// Parse an optional record; absent input yields `None`.
    pub fn parse(&self, raw: Option<&RawTransaction>) -> Option<ParsedTransaction> {
        raw.map(|raw| self.parse_transaction(raw))
    }

    /// Decode instructions, analyze balance deltas and pair trade legs.
    pub fn parse_transaction(&self, raw: &RawTransaction) -> ParsedTransaction {
        let decoder = InstructionDecoder::new(&self.registry);

        let instructions: Vec<ParsedInstruction> = raw
            .instructions
            .iter()
            .map(|ix| decoder.decode(ix, &raw.account_keys))
            .collect();

        // First signal wins; later instructions never override it
        let transaction_type = instructions
            .iter()
            .find_map(ParsedInstruction::type_signal)
            .unwrap_or_default();

        let token_deltas = balances::analyze(
            raw.pre_token_balances.as_deref(),
            raw.post_token_balances.as_deref(),
        );
        let trade_pairs = pairing::pair(&token_deltas);

        let mut invoked_programs: Vec<String> = Vec::new();
        for ix in &instructions {
            if !invoked_programs.contains(&ix.program.name) {
                invoked_programs.push(ix.program.name.clone());
            }
        }

        ParsedTransaction {
            signature: raw.signature.clone(),
            slot: raw.slot,
            block_time: raw.block_time.map(|timestamp| {
                DateTime::from_timestamp(timestamp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
            }),
            fee: raw.fee,
            fee_payer: Address::resolve(&raw.account_keys, 0),
            success: !raw.failed,
            transaction_type,
            instructions,
            token_deltas,
            trade_pairs,
            invoked_programs,
            log_message_count: raw.log_messages.as_ref().map_or(0, Vec::len),
        }
    }
}
