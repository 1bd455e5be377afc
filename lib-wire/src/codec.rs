//! Binary Codec
//!
//! Hand-rolled encoding with a fixed field order per operation. Integers are
//! big-endian; amounts are var-length (1-byte magnitude length, then the
//! magnitude without leading zeros); addresses are 32 raw bytes.
//!
//! Decoding is strict: unknown tags, short buffers, oversized amounts and
//! trailing bytes are all errors. A message must round-trip bit-for-bit.

use thiserror::Error;

use lib_types::{Address, Amount, SettingKey, Timestamp};

use crate::message::{
    BurnPurpose, Message, OpTag, Payload, SettingTarget, StepDirection, VoteDirection,
};

/// Maximum encoded message size; far above any legitimate payload
pub const MAX_MESSAGE_SIZE: usize = 4096;

/// Error during wire encode/decode
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("unknown operation tag {0:#010x}")]
    UnknownTag(u32),

    #[error("unknown burn sub-tag {0:#010x}")]
    UnknownSubTag(u32),

    #[error("message truncated: wanted {wanted} more bytes, had {remaining}")]
    Truncated { wanted: usize, remaining: usize },

    #[error("amount magnitude of {0} bytes exceeds 16")]
    AmountTooWide(u8),

    #[error("invalid flag byte {0:#04x}")]
    InvalidFlags(u8),

    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),

    #[error("message of {0} bytes exceeds limit of {MAX_MESSAGE_SIZE}")]
    TooLarge(usize),
}

/// Result type for wire operations
pub type WireResult<T> = Result<T, WireError>;

// ============================================================================
// WRITER
// ============================================================================

struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn new() -> Self {
        Self { buf: Vec::with_capacity(128) }
    }

    fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn put_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn put_address(&mut self, addr: &Address) {
        self.buf.extend_from_slice(addr.as_bytes());
    }

    /// Var-length amount: magnitude length, then big-endian magnitude
    /// without leading zeros. Zero encodes as a bare zero length.
    fn put_amount(&mut self, v: Amount) {
        let bytes = v.to_be_bytes();
        let skip = bytes.iter().take_while(|b| **b == 0).count();
        let magnitude = &bytes[skip..];
        self.buf.push(magnitude.len() as u8);
        self.buf.extend_from_slice(magnitude);
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }
}

// ============================================================================
// READER
// ============================================================================

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> WireResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(WireError::Truncated { wanted: n, remaining: self.remaining() });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_u8(&mut self) -> WireResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn take_u32(&mut self) -> WireResult<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn take_u64(&mut self) -> WireResult<u64> {
        let bytes = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(bytes);
        Ok(u64::from_be_bytes(arr))
    }

    fn take_address(&mut self) -> WireResult<Address> {
        let bytes = self.take(32)?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(bytes);
        Ok(Address::new(arr))
    }

    fn take_amount(&mut self) -> WireResult<Amount> {
        let len = self.take_u8()?;
        if len > 16 {
            return Err(WireError::AmountTooWide(len));
        }
        let magnitude = self.take(len as usize)?;
        let mut arr = [0u8; 16];
        arr[16 - magnitude.len()..].copy_from_slice(magnitude);
        Ok(Amount::from_be_bytes(arr))
    }

    fn expect_empty(&self) -> WireResult<()> {
        if self.remaining() > 0 {
            return Err(WireError::TrailingBytes(self.remaining()));
        }
        Ok(())
    }
}

// ============================================================================
// MESSAGE CODEC
// ============================================================================

impl Message {
    /// Encode to wire bytes
    pub fn encode(&self) -> WireResult<Vec<u8>> {
        let mut w = Writer::new();
        w.put_u32(self.payload.tag() as u32);
        w.put_u64(self.timestamp);

        match &self.payload {
            Payload::Deposit { depositor, amount, balance_hint } => {
                w.put_address(depositor);
                w.put_amount(*amount);
                if let Some(hint) = balance_hint {
                    w.put_amount(*hint);
                }
            }
            Payload::BurnNotice { origin, amount, purpose } => {
                w.put_address(origin);
                w.put_amount(*amount);
                if let Some(purpose) = purpose {
                    w.put_u32(*purpose as u32);
                }
            }
            Payload::Mint { recipient, amount } | Payload::Withdraw { recipient, amount } => {
                w.put_address(recipient);
                w.put_amount(*amount);
            }
            Payload::Transfer { amount } => {
                w.put_amount(*amount);
            }
            Payload::Burn { owner, amount, purpose } => {
                w.put_address(owner);
                w.put_amount(*amount);
                if let Some(purpose) = purpose {
                    w.put_u32(*purpose as u32);
                }
            }
            Payload::ChangeSettings { key, target, direction } => {
                w.put_u32(key.as_u32());
                w.put_u8((*target as u8) | ((*direction as u8) << 1));
            }
            Payload::CheckSettingsFormat { key, weight, direction }
            | Payload::Confirm { key, weight, direction } => {
                w.put_u32(key.as_u32());
                w.put_amount(*weight);
                w.put_u8(*direction as u8);
            }
            Payload::Voting { query, weight, target, key, new_vote, direction } => {
                w.put_address(query);
                w.put_amount(*weight);
                w.put_address(target);
                w.put_u32(key.as_u32());
                w.put_u8((*new_vote as u8) | ((*direction as u8) << 1));
            }
            Payload::UpdateGovWeight { total } => {
                w.put_amount(*total);
            }
            Payload::FinalizeLot { target, key } => {
                w.put_address(target);
                w.put_u32(key.as_u32());
            }
            Payload::ChangeOwner { new_owner } => {
                w.put_address(new_owner);
            }
        }

        let bytes = w.finish();
        if bytes.len() > MAX_MESSAGE_SIZE {
            return Err(WireError::TooLarge(bytes.len()));
        }
        Ok(bytes)
    }

    /// Decode from wire bytes
    pub fn decode(bytes: &[u8]) -> WireResult<Self> {
        if bytes.len() > MAX_MESSAGE_SIZE {
            return Err(WireError::TooLarge(bytes.len()));
        }
        let mut r = Reader::new(bytes);
        let raw_tag = r.take_u32()?;
        let tag = OpTag::from_u32(raw_tag).ok_or(WireError::UnknownTag(raw_tag))?;
        let timestamp: Timestamp = r.take_u64()?;

        let payload = match tag {
            OpTag::Deposit => {
                let depositor = r.take_address()?;
                let amount = r.take_amount()?;
                let balance_hint =
                    if r.remaining() > 0 { Some(r.take_amount()?) } else { None };
                Payload::Deposit { depositor, amount, balance_hint }
            }
            OpTag::BurnNotice => {
                let origin = r.take_address()?;
                let amount = r.take_amount()?;
                let purpose = if r.remaining() > 0 {
                    let raw = r.take_u32()?;
                    Some(BurnPurpose::from_u32(raw).ok_or(WireError::UnknownSubTag(raw))?)
                } else {
                    None
                };
                Payload::BurnNotice { origin, amount, purpose }
            }
            OpTag::Mint => {
                let recipient = r.take_address()?;
                let amount = r.take_amount()?;
                Payload::Mint { recipient, amount }
            }
            OpTag::Withdraw => {
                let recipient = r.take_address()?;
                let amount = r.take_amount()?;
                Payload::Withdraw { recipient, amount }
            }
            OpTag::Transfer => {
                let amount = r.take_amount()?;
                Payload::Transfer { amount }
            }
            OpTag::Burn => {
                let owner = r.take_address()?;
                let amount = r.take_amount()?;
                let purpose = if r.remaining() > 0 {
                    let raw = r.take_u32()?;
                    Some(BurnPurpose::from_u32(raw).ok_or(WireError::UnknownSubTag(raw))?)
                } else {
                    None
                };
                Payload::Burn { owner, amount, purpose }
            }
            OpTag::ChangeSettings => {
                let key = SettingKey::from(r.take_u32()?);
                let flags = r.take_u8()?;
                if flags & !0x03 != 0 {
                    return Err(WireError::InvalidFlags(flags));
                }
                let target =
                    if flags & 0x01 == 0 { SettingTarget::Value } else { SettingTarget::Step };
                let direction =
                    if flags & 0x02 == 0 { StepDirection::Up } else { StepDirection::Down };
                Payload::ChangeSettings { key, target, direction }
            }
            OpTag::CheckSettingsFormat | OpTag::Confirm => {
                let key = SettingKey::from(r.take_u32()?);
                let weight = r.take_amount()?;
                let direction = decode_vote_direction(r.take_u8()?)?;
                match tag {
                    OpTag::CheckSettingsFormat => {
                        Payload::CheckSettingsFormat { key, weight, direction }
                    }
                    _ => Payload::Confirm { key, weight, direction },
                }
            }
            OpTag::Voting => {
                let query = r.take_address()?;
                let weight = r.take_amount()?;
                let target = r.take_address()?;
                let key = SettingKey::from(r.take_u32()?);
                let flags = r.take_u8()?;
                if flags & !0x07 != 0 {
                    return Err(WireError::InvalidFlags(flags));
                }
                let new_vote = flags & 0x01 != 0;
                let direction = decode_vote_direction(flags >> 1)?;
                Payload::Voting { query, weight, target, key, new_vote, direction }
            }
            OpTag::UpdateGovWeight => {
                let total = r.take_amount()?;
                Payload::UpdateGovWeight { total }
            }
            OpTag::FinalizeLot => {
                let target = r.take_address()?;
                let key = SettingKey::from(r.take_u32()?);
                Payload::FinalizeLot { target, key }
            }
            OpTag::ChangeOwner => {
                let new_owner = r.take_address()?;
                Payload::ChangeOwner { new_owner }
            }
        };

        r.expect_empty()?;
        Ok(Message { timestamp, payload })
    }
}

fn decode_vote_direction(raw: u8) -> WireResult<VoteDirection> {
    match raw {
        0 => Ok(VoteDirection::Preserve),
        1 => Ok(VoteDirection::Increase),
        2 => Ok(VoteDirection::Decrease),
        _ => Err(WireError::InvalidFlags(raw)),
    }
}

// ============================================================================
// TESTS
// ============================================================================
