use crate::solana::models::{AccountKey, Address, ProgramKind, ProgramRef};
use std::collections::HashMap;

pub const SYSTEM_PROGRAM_ID: &str = "11111111111111111111111111111111";
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
pub const TOKEN_2022_PROGRAM_ID: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";
pub const ASSOCIATED_TOKEN_PROGRAM_ID: &str = "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL";

/// Well-known exchange (DEX/AMM/aggregator) programs and their display labels.
pub const KNOWN_EXCHANGE_PROGRAMS: &[(&str, &str)] = &[
    ("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8", "Raydium AMM v4"),
    ("CPMMoo8L3F4NbTegBCKVNunggL7H1ZpdTHKxQB5qKP1C", "Raydium CPMM"),
    ("CAMMCzo5YL8w4VFF8KVHrK22GGUsp5VTaW7grrKgrWqK", "Raydium CLMM"),
    ("JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4", "Jupiter v6"),
    ("whirLbMiicVdio4qvUfM5KAg6Ct8VwpYzGff3uctyCc", "Orca Whirlpool"),
    ("LBUZKhRxPF3XUpBCjp4YzTKgLccjZhTSDM9YuVaPwxo", "Meteora DLMM"),
    ("6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P", "Pump.fun"),
    ("pAMMBay6oceH9fJKBRHGP5D4bD4sWpmSwMn52FMfXEA", "PumpSwap"),
];

const CORE_PROGRAMS: &[(&str, ProgramKind, &str)] = &[
    (SYSTEM_PROGRAM_ID, ProgramKind::SystemProgram, "System Program"),
    (TOKEN_PROGRAM_ID, ProgramKind::TokenProgram, "Token Program"),
    (TOKEN_2022_PROGRAM_ID, ProgramKind::TokenProgram, "Token Program"),
    (
        ASSOCIATED_TOKEN_PROGRAM_ID,
        ProgramKind::AssociatedTokenProgram,
        "Associated Token Program",
    ),
];

#[derive(Debug, Clone)]
struct ProgramEntry {
    kind: ProgramKind,
    name: String,
}

/// Immutable lookup from program address to program kind.
///
/// Built once at startup from the well-known tables plus any deployment
/// specific exchange programs, then shared read-only by every parse.
#[derive(Debug, Clone)]
pub struct ProgramRegistry {
    programs: HashMap<AccountKey, ProgramEntry>,
}

impl ProgramRegistry {
    /// Registry with the well-known programs and additional exchange program addresses.
    pub fn new(extra_exchange_programs: impl IntoIterator<Item = AccountKey>) -> Self {
        let mut programs = HashMap::new();

        for (address, kind, name) in CORE_PROGRAMS {
            if let Ok(key) = address.parse::<AccountKey>() {
                programs.insert(key, ProgramEntry { kind: *kind, name: name.to_string() });
            }
        }

        for (address, label) in KNOWN_EXCHANGE_PROGRAMS {
            if let Ok(key) = address.parse::<AccountKey>() {
                programs.insert(
                    key,
                    ProgramEntry { kind: ProgramKind::ExchangeProgram, name: label.to_string() },
                );
            }
        }

        for key in extra_exchange_programs {
            programs.entry(key).or_insert_with(|| ProgramEntry {
                kind: ProgramKind::ExchangeProgram,
                name: "Exchange Program".to_string(),
            });
        }

        Self { programs }
    }

    pub fn identify(&self, address: &AccountKey) -> ProgramKind {
        self.programs
            .get(address)
            .map(|entry| entry.kind)
            .unwrap_or(ProgramKind::Unknown)
    }

    /// Resolve a program address into kind and display name.
    ///
    /// Unknown programs are named by their own address text.
    pub fn describe(&self, address: Address) -> ProgramRef {
        let entry = address.key().and_then(|key| self.programs.get(key));
        match entry {
            Some(entry) => ProgramRef { kind: entry.kind, name: entry.name.clone(), address },
            None => ProgramRef {
                kind: ProgramKind::Unknown,
                name: address.to_string(),
                address,
            },
        }
    }
}

impl Default for ProgramRegistry {
    fn default() -> Self {
        Self::new(std::iter::empty())
    }
}
