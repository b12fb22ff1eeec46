//! # RESP2 Encoding and Parsing
//!
//! Purpose: Encode store commands and parse replies from a growing read
//! buffer, without blocking on partial frames.
//!
//! ## Design Principles
//! 1. **Incremental Parsing**: `parse_frame` returns `None` until a whole
//!    reply is buffered, and reports how many bytes it consumed.
//! 2. **Buffer Reuse**: Callers own the read/write buffers.
//! 3. **Binary-Safe**: Bulk strings are treated as raw bytes.
//! 4. **Fail Fast**: Invalid framing returns protocol errors immediately.

use skv_common::StoreError;

/// Largest bulk string accepted from the store (Redis' own `proto-max-bulk-len`).
pub const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;
/// Largest array header accepted from the store.
pub const MAX_ARRAY_LEN: i64 = 1024 * 1024;

/// RESP reply value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// +OK or +PONG style replies.
    Simple(Vec<u8>),
    /// -ERR ... replies.
    Error(Vec<u8>),
    /// :123 replies.
    Integer(i64),
    /// $... bulk strings, with None for null.
    Bulk(Option<Vec<u8>>),
    /// *... arrays.
    Array(Vec<RespValue>),
}

/// Encodes a RESP2 array command into the provided buffer.
pub fn encode_command(args: &[&[u8]], out: &mut Vec<u8>) {
    out.push(b'*');
    push_usize(out, args.len());
    out.extend_from_slice(b"\r\n");
    for arg in args {
        out.push(b'$');
        push_usize(out, arg.len());
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(arg);
        out.extend_from_slice(b"\r\n");
    }
}

/// Parses one reply from the front of `buf`.
///
/// Returns the value and the number of bytes it occupied, or `None` when the
/// buffer holds only part of a frame.
pub fn parse_frame(buf: &[u8]) -> Result<Option<(RespValue, usize)>, StoreError> {
    let mut pos = 0;
    Ok(parse_value(buf, &mut pos)?.map(|value| (value, pos)))
}

fn parse_value(buf: &[u8], pos: &mut usize) -> Result<Option<RespValue>, StoreError> {
    let line = match read_line(buf, pos)? {
        Some(line) => line,
        None => return Ok(None),
    };
    if line.is_empty() {
        return Err(StoreError::Protocol);
    }

    match line[0] {
        b'+' => Ok(Some(RespValue::Simple(line[1..].to_vec()))),
        b'-' => Ok(Some(RespValue::Error(line[1..].to_vec()))),
        b':' => Ok(Some(RespValue::Integer(parse_i64(&line[1..])?))),
        b'$' => {
            let len = parse_i64(&line[1..])?;
            parse_bulk(buf, pos, len)
        }
        b'*' => {
            let len = parse_i64(&line[1..])?;
            parse_array(buf, pos, len)
        }
        _ => Err(StoreError::Protocol),
    }
}

fn parse_bulk(buf: &[u8], pos: &mut usize, len: i64) -> Result<Option<RespValue>, StoreError> {
    if len < 0 {
        return Ok(Some(RespValue::Bulk(None)));
    }
    if len > MAX_BULK_LEN {
        return Err(StoreError::Protocol);
    }
    let start = *pos;
    let end = start.saturating_add(len as usize);
    if buf.len() < end.saturating_add(2) {
        return Ok(None);
    }
    if &buf[end..end + 2] != b"\r\n" {
        return Err(StoreError::Protocol);
    }
    *pos = end + 2;
    Ok(Some(RespValue::Bulk(Some(buf[start..end].to_vec()))))
}

fn parse_array(buf: &[u8], pos: &mut usize, len: i64) -> Result<Option<RespValue>, StoreError> {
    if len <= 0 {
        return Ok(Some(RespValue::Array(Vec::new())));
    }

    if len > MAX_ARRAY_LEN {
        return Err(StoreError::Protocol);
    }

    // Every element needs at least one byte, so what is buffered bounds it.
    let mut items = Vec::with_capacity((len as usize).min(buf.len() - *pos));
    for _ in 0..len {
        match parse_value(buf, pos)? {
            Some(item) => items.push(item),
            None => return Ok(None),
        }
    }
    Ok(Some(RespValue::Array(items)))
}

fn read_line<'a>(buf: &'a [u8], pos: &mut usize) -> Result<Option<&'a [u8]>, StoreError> {
    let rest = &buf[*pos..];
    let newline = match rest.iter().position(|&b| b == b'\n') {
        Some(idx) => idx,
        None => return Ok(None),
    };
    if newline == 0 || rest[newline - 1] != b'\r' {
        return Err(StoreError::Protocol);
    }
    *pos += newline + 1;
    Ok(Some(&rest[..newline - 1]))
}

fn parse_i64(data: &[u8]) -> Result<i64, StoreError> {
    if data.is_empty() {
        return Err(StoreError::Protocol);
    }
    let mut negative = false;
    let mut idx = 0;
    if data[0] == b'-' {
        negative = true;
        idx = 1;
    }
    if idx == data.len() {
        return Err(StoreError::Protocol);
    }

    let mut value: i64 = 0;
    while idx < data.len() {
        let b = data[idx];
        if !b.is_ascii_digit() {
            return Err(StoreError::Protocol);
        }
        value = value.saturating_mul(10).saturating_add((b - b'0') as i64);
        idx += 1;
    }

    if negative {
        Ok(-value)
    } else {
        Ok(value)
    }
}

fn push_usize(out: &mut Vec<u8>, mut value: usize) {
    // Digits go through a stack buffer to avoid a String allocation.
    let mut buf = [0u8; 20];
    let mut len = 0;
    if value == 0 {
        buf[0] = b'0';
        len = 1;
    } else {
        while value > 0 {
            buf[len] = b'0' + (value % 10) as u8;
            value /= 10;
            len += 1;
        }
    }
    for idx in (0..len).rev() {
        out.push(buf[idx]);
    }
}
