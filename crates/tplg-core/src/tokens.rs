//! Generic vendor tuple decoding
//!
//! Every record's private block is a run of type-tagged tuple arrays. Each
//! array holds `{token id, value}` entries; a token table maps token ids onto
//! typed setter functions for the destination descriptor. Decoding walks all
//! arrays once and applies every matching setter, so token order in the
//! source never matters. Tokens with no table entry are skipped silently:
//! newer topologies may carry tokens this tool does not know about.
//!
//! One token family decodes repeated sub-structures (the DMIC per-PDM
//! controller configs) from a flat stream: a designated "new entry" token
//! advances a running index, and the family's setters write into the slot at
//! `index - 1`. A family token arriving before any "new entry" token is
//! dropped with a warning instead of faulting.

use thiserror::Error;
use tracing::warn;

use crate::wire::{decode_name, NAME_LEN};

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("malformed tuple array: declared size {size} exceeds {remaining} remaining bytes")]
    MalformedTupleArray { size: u32, remaining: usize },
    #[error("unknown tuple kind {0}")]
    UnknownTupleKind(u32),
}

/// Tuple array element kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TupleKind {
    Uuid,
    String,
    Bool,
    Byte,
    Word,
    Short,
}

impl TupleKind {
    pub fn from_raw(raw: u32) -> Result<Self, TokenError> {
        Ok(match raw {
            0 => TupleKind::Uuid,
            1 => TupleKind::String,
            2 => TupleKind::Bool,
            3 => TupleKind::Byte,
            4 => TupleKind::Word,
            5 => TupleKind::Short,
            other => return Err(TokenError::UnknownTupleKind(other)),
        })
    }

    /// Bool, byte, word and short entries all travel as 32-bit value elems.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TupleKind::Bool | TupleKind::Byte | TupleKind::Word | TupleKind::Short
        )
    }
}

/// Typed field setter bound to the destination type.
pub enum Setter<T> {
    Word(fn(&mut T, u32)),
    Short(fn(&mut T, u16)),
    Bool(fn(&mut T, bool)),
    Str(fn(&mut T, &str)),
    Uuid(fn(&mut T, &[u8; 16])),
    /// Member of the repeated-substructure family: writes into the slot
    /// selected by the running index.
    IndexedShort(fn(&mut T, usize, u16)),
}

/// One token table entry: numeric token id, expected tuple kind, and the
/// setter invoked on a match. Token ids must be unique within a table.
pub struct TokenEntry<T> {
    pub token: u32,
    pub kind: TupleKind,
    pub setter: Setter<T>,
    /// Advances the repeated-substructure index before applying the setter.
    pub starts_entry: bool,
}

impl<T> TokenEntry<T> {
    pub const fn word(token: u32, setter: fn(&mut T, u32)) -> Self {
        Self {
            token,
            kind: TupleKind::Word,
            setter: Setter::Word(setter),
            starts_entry: false,
        }
    }

    pub const fn short(token: u32, setter: fn(&mut T, u16)) -> Self {
        Self {
            token,
            kind: TupleKind::Short,
            setter: Setter::Short(setter),
            starts_entry: false,
        }
    }

    pub const fn boolean(token: u32, setter: fn(&mut T, bool)) -> Self {
        Self {
            token,
            kind: TupleKind::Bool,
            setter: Setter::Bool(setter),
            starts_entry: false,
        }
    }

    pub const fn string(token: u32, setter: fn(&mut T, &str)) -> Self {
        Self {
            token,
            kind: TupleKind::String,
            setter: Setter::Str(setter),
            starts_entry: false,
        }
    }

    pub const fn indexed_short(
        token: u32,
        starts_entry: bool,
        setter: fn(&mut T, usize, u16),
    ) -> Self {
        Self {
            token,
            kind: TupleKind::Short,
            setter: Setter::IndexedShort(setter),
            starts_entry,
        }
    }
}

const ARRAY_HEADER_LEN: usize = 12;
const VALUE_ELEM_LEN: usize = 8;
const STRING_ELEM_LEN: usize = 4 + NAME_LEN;
const UUID_ELEM_LEN: usize = 4 + 16;

/// Decode every tuple array in `priv_data` against `table`, populating
/// matching fields of `dest`. Returns the number of repeated-substructure
/// tokens dropped for arriving before their "new entry" token.
pub fn parse_tokens<T>(
    dest: &mut T,
    table: &[TokenEntry<T>],
    priv_data: &[u8],
) -> Result<usize, TokenError> {
    let mut remaining = priv_data;
    let mut index: usize = 0;
    let mut dropped = 0;

    while !remaining.is_empty() {
        if remaining.len() < ARRAY_HEADER_LEN {
            return Err(TokenError::MalformedTupleArray {
                size: remaining.len() as u32,
                remaining: remaining.len(),
            });
        }
        let size = u32::from_le_bytes(remaining[0..4].try_into().unwrap());
        let kind_raw = u32::from_le_bytes(remaining[4..8].try_into().unwrap());
        let num_elems = u32::from_le_bytes(remaining[8..12].try_into().unwrap());

        if (size as usize) < ARRAY_HEADER_LEN || size as usize > remaining.len() {
            return Err(TokenError::MalformedTupleArray {
                size,
                remaining: remaining.len(),
            });
        }
        let body = &remaining[ARRAY_HEADER_LEN..size as usize];
        let kind = TupleKind::from_raw(kind_raw)?;

        let elem_len = match kind {
            TupleKind::Uuid => UUID_ELEM_LEN,
            TupleKind::String => STRING_ELEM_LEN,
            _ => VALUE_ELEM_LEN,
        };
        if num_elems as usize * elem_len > body.len() {
            return Err(TokenError::MalformedTupleArray {
                size,
                remaining: remaining.len(),
            });
        }

        match kind {
            TupleKind::Uuid => parse_uuid_elems(dest, table, body, num_elems as usize),
            TupleKind::String => parse_string_elems(dest, table, body, num_elems as usize),
            _ => dropped += parse_value_elems(dest, table, body, num_elems as usize, &mut index),
        }

        remaining = &remaining[size as usize..];
    }

    Ok(dropped)
}

fn parse_uuid_elems<T>(dest: &mut T, table: &[TokenEntry<T>], body: &[u8], num_elems: usize) {
    for i in 0..num_elems {
        let elem = &body[i * UUID_ELEM_LEN..(i + 1) * UUID_ELEM_LEN];
        let token = u32::from_le_bytes(elem[0..4].try_into().unwrap());
        let uuid: &[u8; 16] = elem[4..20].try_into().unwrap();
        for entry in table {
            if entry.kind != TupleKind::Uuid || entry.token != token {
                continue;
            }
            if let Setter::Uuid(set) = entry.setter {
                set(dest, uuid);
            }
        }
    }
}

fn parse_string_elems<T>(dest: &mut T, table: &[TokenEntry<T>], body: &[u8], num_elems: usize) {
    for i in 0..num_elems {
        let elem = &body[i * STRING_ELEM_LEN..(i + 1) * STRING_ELEM_LEN];
        let token = u32::from_le_bytes(elem[0..4].try_into().unwrap());
        let value = decode_name(&elem[4..]);
        for entry in table {
            if entry.kind != TupleKind::String || entry.token != token {
                continue;
            }
            if let Setter::Str(set) = entry.setter {
                set(dest, &value);
            }
        }
    }
}

fn parse_value_elems<T>(
    dest: &mut T,
    table: &[TokenEntry<T>],
    body: &[u8],
    num_elems: usize,
    index: &mut usize,
) -> usize {
    let mut dropped = 0;
    for i in 0..num_elems {
        let elem = &body[i * VALUE_ELEM_LEN..(i + 1) * VALUE_ELEM_LEN];
        let token = u32::from_le_bytes(elem[0..4].try_into().unwrap());
        let value = u32::from_le_bytes(elem[4..8].try_into().unwrap());
        for entry in table {
            if !entry.kind.is_numeric() || entry.token != token {
                continue;
            }
            if entry.starts_entry {
                *index += 1;
            }
            match entry.setter {
                Setter::Word(set) => set(dest, value),
                Setter::Short(set) => set(dest, value as u16),
                Setter::Bool(set) => set(dest, value != 0),
                Setter::IndexedShort(set) => {
                    if *index == 0 {
                        warn!(token, value, "indexed tuple before its entry marker, dropped");
                        dropped += 1;
                    } else {
                        set(dest, *index - 1, value as u16);
                    }
                }
                // string/uuid setters never match a numeric tuple kind
                Setter::Str(_) | Setter::Uuid(_) => {}
            }
        }
    }
    dropped
}
