//! Base58 text codec for addresses and instruction payloads.
//!
//! Uses the Bitcoin/Solana alphabet, which omits `0`, `O`, `I` and `l`.

use crate::error::DecodeError;

const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Reverse lookup from ASCII byte to digit value, 0xFF for bytes outside the alphabet.
const DIGITS: [u8; 128] = build_digit_table();

const fn build_digit_table() -> [u8; 128] {
    let mut table = [0xFF; 128];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
}

fn digit_value(c: char) -> Option<u8> {
    if !c.is_ascii() {
        return None;
    }
    match DIGITS[c as usize] {
        0xFF => None,
        value => Some(value),
    }
}

/// Decode base58 text into raw bytes.
///
/// The input is accumulated as a base-58 big integer into a little-endian
/// buffer, one zero byte is appended per leading `1`, and the buffer is
/// reversed into big-endian order. Empty input decodes to an empty vector.
pub fn decode(text: &str) -> Result<Vec<u8>, DecodeError> {
    let mut bytes: Vec<u8> = Vec::with_capacity(text.len());

    for (position, character) in text.chars().enumerate() {
        let mut carry = digit_value(character)
            .ok_or(DecodeError::InvalidCharacter { character, position })?
            as u32;

        for byte in bytes.iter_mut() {
            carry += u32::from(*byte) * 58;
            *byte = (carry & 0xFF) as u8;
            carry >>= 8;
        }

        while carry > 0 {
            bytes.push((carry & 0xFF) as u8);
            carry >>= 8;
        }
    }

    let leading_zeros = text.chars().take_while(|&c| c == '1').count();
    bytes.extend(std::iter::repeat(0).take(leading_zeros));
    bytes.reverse();

    Ok(bytes)
}

/// Encode raw bytes as base58 text. Inverse of [`decode`].
pub fn encode(input: &[u8]) -> String {
    let mut digits: Vec<u8> = Vec::with_capacity(input.len() * 138 / 100 + 1);

    for &byte in input {
        let mut carry = u32::from(byte);

        for digit in digits.iter_mut() {
            carry += u32::from(*digit) << 8;
            *digit = (carry % 58) as u8;
            carry /= 58;
        }

        while carry > 0 {
            digits.push((carry % 58) as u8);
            carry /= 58;
        }
    }

    let leading_zeros = input.iter().take_while(|&&b| b == 0).count();

    std::iter::repeat('1')
        .take(leading_zeros)
        .chain(digits.iter().rev().map(|&d| ALPHABET[d as usize] as char))
        .collect()
}
