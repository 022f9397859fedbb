use crate::solana::models::{
    AccountKey, Address, InstructionPayload, ParsedInstruction, ProgramKind, RawInstruction,
    TransferAmount,
};
use crate::solana::programs::ProgramRegistry;

/// System program instruction discriminator for a lamport transfer.
pub const SYSTEM_IX_TRANSFER: u8 = 2;

/// Token program instruction discriminator for a plain transfer.
pub const TOKEN_IX_TRANSFER: u8 = 3;

/// Opcode byte followed by a little-endian u64 amount.
const TRANSFER_PAYLOAD_LEN: usize = 9;

/// Decodes compiled instructions against a program registry.
#[derive(Debug, Clone, Copy)]
pub struct InstructionDecoder<'a> {
    registry: &'a ProgramRegistry,
}

impl<'a> InstructionDecoder<'a> {
    pub fn new(registry: &'a ProgramRegistry) -> Self {
        Self { registry }
    }

    /// Decode one instruction.
    ///
    /// Never fails: out-of-range indices resolve to `Address::Unknown` and
    /// malformed payloads become marker variants.
    pub fn decode(
        &self,
        instruction: &RawInstruction,
        account_keys: &[AccountKey],
    ) -> ParsedInstruction {
        let program = self
            .registry
            .describe(Address::resolve(account_keys, instruction.program_id_index));

        let accounts: Vec<Address> = instruction
            .accounts
            .iter()
            .map(|&index| Address::resolve(account_keys, index))
            .collect();

        let payload = decode_payload(program.kind, &accounts, &instruction.data);

        ParsedInstruction { program, accounts, payload }
    }
}

fn decode_payload(kind: ProgramKind, accounts: &[Address], data: &[u8]) -> InstructionPayload {
    let Some(&opcode) = data.first() else {
        return InstructionPayload::InvalidInstructionData;
    };

    match kind {
        ProgramKind::SystemProgram => match opcode {
            SYSTEM_IX_TRANSFER => InstructionPayload::Transfer {
                from: account_at(accounts, 0),
                to: account_at(accounts, 1),
                authority: None,
                amount: read_amount(data),
            },
            _ => InstructionPayload::UnknownSystemInstruction { opcode },
        },
        // Accounts: [source, destination, owner]
        ProgramKind::TokenProgram => match opcode {
            TOKEN_IX_TRANSFER => InstructionPayload::Transfer {
                from: account_at(accounts, 0),
                to: account_at(accounts, 1),
                authority: Some(account_at(accounts, 2)),
                amount: read_amount(data),
            },
            _ => InstructionPayload::UnknownTokenInstruction { opcode },
        },
        ProgramKind::ExchangeProgram => InstructionPayload::Exchange,
        ProgramKind::AssociatedTokenProgram | ProgramKind::Unknown => {
            InstructionPayload::UnknownInstructionType
        }
    }
}

fn account_at(accounts: &[Address], position: usize) -> Address {
    accounts.get(position).copied().unwrap_or(Address::Unknown)
}

/// Read the u64 LE amount at offset 1.
fn read_amount(data: &[u8]) -> TransferAmount {
    match data.get(1..TRANSFER_PAYLOAD_LEN) {
        Some(bytes) => {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(bytes);
            TransferAmount::Decoded(u64::from_le_bytes(buf))
        }
        None => TransferAmount::InsufficientData {
            required: TRANSFER_PAYLOAD_LEN,
            actual: data.len(),
        },
    }
}
