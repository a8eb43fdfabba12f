#![allow(dead_code)]

/// Builds a plain recursive query for `name` (type A, class IN).
pub fn build_query(id: u16, name: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    buf.extend_from_slice(&id.to_be_bytes());
    buf.extend_from_slice(&[0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    for label in name.split('.').filter(|l| !l.is_empty()) {
        buf.push(label.len() as u8);
        buf.extend_from_slice(label.as_bytes());
    }
    buf.push(0);
    buf.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
    buf
}

/// Answers `query` with one A record, echoing ID and question.
pub fn answer(query: &[u8], rcode: u8) -> Vec<u8> {
    if query.len() < 12 {
        return vec![];
    }

    let mut response = Vec::with_capacity(512);
    response.extend_from_slice(&query[0..2]);
    response.push(0x81);
    response.push(0x80 | (rcode & 0x0F));
    response.extend_from_slice(&query[4..6]);
    if rcode == 0 {
        response.extend_from_slice(&[0x00, 0x01]);
    } else {
        response.extend_from_slice(&[0x00, 0x00]);
    }
    response.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
    response.extend_from_slice(&query[12..]);

    if rcode == 0 {
        response.extend_from_slice(&[
            0xc0, 0x0c, // pointer to QNAME
            0x00, 0x01, // A
            0x00, 0x01, // IN
            0x00, 0x00, 0x00, 0x3c, // TTL 60
            0x00, 0x04, // RDLENGTH
            93, 184, 216, 34,
        ]);
    }
    response
}

pub fn response_id(response: &[u8]) -> u16 {
    u16::from_be_bytes([response[0], response[1]])
}

pub fn response_rcode(response: &[u8]) -> u8 {
    response[3] & 0x0F
}
