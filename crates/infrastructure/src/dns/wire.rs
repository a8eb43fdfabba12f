//! Minimal reads and rewrites of raw DNS messages. Queries are forwarded
//! untouched; only the header and the first question are ever inspected.

const HEADER_LEN: usize = 12;
const MAX_DOMAIN_LEN: usize = 253;

/// Header fields and first question of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryInfo {
    pub id: u16,
    /// Decoded QNAME, lowercase, no trailing dot; `"."` for the root.
    pub name: String,
    /// Byte offset where the first question ends.
    pub question_end: usize,
}

/// Parses the header and first question of `buf`.
///
/// Returns `None` for responses, for messages without exactly one question,
/// and for names using compression pointers or exceeding 253 bytes.
pub fn parse_query(buf: &[u8]) -> Option<QueryInfo> {
    if buf.len() < HEADER_LEN {
        return None;
    }

    let id = u16::from_be_bytes([buf[0], buf[1]]);
    if buf[2] & 0x80 != 0 {
        return None;
    }
    let qdcount = u16::from_be_bytes([buf[4], buf[5]]);
    if qdcount != 1 {
        return None;
    }

    let mut pos = HEADER_LEN;
    let mut name = String::new();

    loop {
        let label_len = *buf.get(pos)? as usize;
        if label_len == 0 {
            pos += 1;
            break;
        }
        if label_len & 0xC0 != 0 {
            return None;
        }
        pos += 1;
        let label = buf.get(pos..pos + label_len)?;
        if !name.is_empty() {
            name.push('.');
        }
        if name.len() + label_len > MAX_DOMAIN_LEN {
            return None;
        }
        for &b in label {
            name.push(b.to_ascii_lowercase() as char);
        }
        pos += label_len;
    }

    // QTYPE + QCLASS
    if pos + 4 > buf.len() {
        return None;
    }
    pos += 4;

    if name.is_empty() {
        name.push('.');
    }

    Some(QueryInfo {
        id,
        name,
        question_end: pos,
    })
}

const RCODE_FORMERR: u8 = 1;
const RCODE_SERVFAIL: u8 = 2;

/// True when the QR bit marks `buf` as a response.
pub fn is_response(buf: &[u8]) -> bool {
    buf.len() > 2 && buf[2] & 0x80 != 0
}

/// Builds a SERVFAIL answer to `query`, echoing its ID, opcode, RD bit and,
/// when parseable, its question. Returns `None` when `query` has no header.
pub fn servfail(query: &[u8]) -> Option<Vec<u8>> {
    error_response(query, RCODE_SERVFAIL)
}

/// Builds a FORMERR answer for a message that is not a usable query.
pub fn formerr(query: &[u8]) -> Option<Vec<u8>> {
    error_response(query, RCODE_FORMERR)
}

fn error_response(query: &[u8], rcode: u8) -> Option<Vec<u8>> {
    if query.len() < HEADER_LEN {
        return None;
    }

    let question_end = parse_query(query).map(|q| q.question_end);
    let mut response = Vec::with_capacity(question_end.unwrap_or(HEADER_LEN));
    response.extend_from_slice(&query[0..2]);
    // QR + original opcode + RD
    response.push(0x80 | (query[2] & 0x79));
    // RA + RCODE
    response.push(0x80 | rcode);

    match question_end {
        Some(end) => {
            response.extend_from_slice(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
            response.extend_from_slice(&query[HEADER_LEN..end]);
        }
        None => response.extend_from_slice(&[0u8; 8]),
    }
    Some(response)
}
