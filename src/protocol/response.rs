//! Reply payload decoders.
use log::debug;

use crate::{
    AttrType, Attribute, ClientError, Keyword, Match, ResultSet, WordInfo,
    result::{AttrKind, AttrValue},
};

use super::{PacketReader, Status};

/// Decodes one result set per batched query, in batch order.
///
/// A query that failed on the server only carries its status and error text;
/// decoding carries on with the next query.
pub fn decode_search(payload: &[u8], count: usize) -> Result<Vec<ResultSet>, ClientError> {
    let mut reader = PacketReader::new(payload);
    let mut results = Vec::with_capacity(count);

    for i in 0..count {
        let result = decode_result(&mut reader)?;
        if let Some(error) = &result.error {
            debug!("query #{i} failed: {error}");
        }
        results.push(result);
    }

    Ok(results)
}

fn decode_result(r: &mut PacketReader) -> Result<ResultSet, ClientError> {
    let mut result = ResultSet {
        status: r.read_u32()?.into(),
        ..Default::default()
    };

    match result.status {
        Status::Ok => {}
        Status::Warning => result.warning = Some(r.read_str()?),
        _ => {
            result.error = Some(r.read_str()?);
            return Ok(result);
        }
    }

    let fields = r.read_u32()?;
    for _ in 0..fields {
        result.fields.push(r.read_str()?);
    }

    let attrs = r.read_u32()?;
    for _ in 0..attrs {
        let name = r.read_str()?;
        let ty = AttrType::from(r.read_u32()?);
        result.attrs.push(Attribute { name, ty });
    }

    let matches = r.read_u32()?;
    let id64 = r.read_u32()? != 0;
    for _ in 0..matches {
        let doc_id = if id64 {
            r.read_i64()? as u64
        } else {
            u64::from(r.read_dword()?)
        };
        let weight = r.read_i32()?;

        let mut values = Vec::with_capacity(result.attrs.len());
        for attr in &result.attrs {
            values.push(read_value(r, attr.ty)?);
        }
        result.matches.push(Match {
            doc_id,
            weight,
            values,
        });
    }

    result.total = r.read_u32()?;
    result.total_found = r.read_u32()?;
    result.time = r.read_i32()? as f32 / 1000.0;

    let words = r.read_u32()?;
    for _ in 0..words {
        result.words.push(WordInfo {
            word: r.read_str()?,
            docs: r.read_dword()?,
            hits: r.read_dword()?,
        });
    }

    Ok(result)
}

fn read_value(r: &mut PacketReader, ty: AttrType) -> Result<AttrValue, ClientError> {
    Ok(match ty {
        AttrType::Multi(_) => {
            let count = r.read_dword()?;
            let mut values = Vec::new();
            for _ in 0..count {
                values.push(r.read_dword()?);
            }
            AttrValue::Multi(values)
        }
        AttrType::Scalar(AttrKind::BigInt) => AttrValue::BigInt(r.read_i64()?),
        AttrType::Scalar(AttrKind::Float) => AttrValue::Float(r.read_f32()?),
        AttrType::Scalar(_) => AttrValue::Uint(r.read_dword()?),
    })
}

/// One snippet per input document, in input order.
pub fn decode_excerpts(payload: &[u8], docs: usize) -> Result<Vec<String>, ClientError> {
    let mut reader = PacketReader::new(payload);
    (0..docs).map(|_| reader.read_str()).collect()
}

/// Number of documents the daemon updated.
pub fn decode_update(payload: &[u8]) -> Result<u32, ClientError> {
    PacketReader::new(payload).read_u32()
}

pub fn decode_keywords(payload: &[u8], hits: bool) -> Result<Vec<Keyword>, ClientError> {
    let mut r = PacketReader::new(payload);
    let count = r.read_u32()?;

    let mut keywords = Vec::new();
    for _ in 0..count {
        let tokenized = r.read_str()?;
        let normalized = r.read_str()?;
        let (docs, hits) = if hits {
            (Some(r.read_dword()?), Some(r.read_dword()?))
        } else {
            (None, None)
        };
        keywords.push(Keyword {
            tokenized,
            normalized,
            docs,
            hits,
        });
    }
    Ok(keywords)
}
