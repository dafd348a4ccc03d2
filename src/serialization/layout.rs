use log::debug;

use super::{ByteReader, ByteWriter};
use crate::{
    error::{FfmErr, Result},
    model::Shape,
    storage::{Entry, ParamTable, SlotState},
};

/// Identifies a serialized model.
pub const MAGIC: [u8; 4] = *b"FFMS";

/// The layout version written by `write_model`.
pub const FORMAT_VERSION: u32 = 1;

const HEADER_SIZE: usize = MAGIC.len() + size_of::<u32>() + size_of::<f64>() + 5 * size_of::<i32>();
const RECORD_SIZE: usize = size_of::<u8>() + size_of::<i32>();

fn to_i32(name: &str, value: usize) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| FfmErr::malformed(format!("{name} {value} doesn't fit in an i32")))
}

fn to_usize(name: &str, value: i32) -> Result<usize> {
    usize::try_from(value).map_err(|_| FfmErr::malformed(format!("negative {name} {value}")))
}

/// Packs a model into its canonical byte layout.
///
/// The slots are written in table order, so the reader can rebuild the table without
/// rehashing.
///
/// # Arguments
/// * `w0` - The global bias.
/// * `shape` - The dimensions of the model.
/// * `table` - The parameters of the model.
///
/// # Returns
/// The bytes, `MalformedLayout` if a count doesn't fit in an `i32` or `FactorMismatch` if
/// an entry's latent vector isn't `shape.factors()` long.
pub fn write_model(w0: f64, shape: Shape, table: &ParamTable) -> Result<Vec<u8>> {
    let factors = shape.factors();
    let (keys, entries, states) = table.bulk_view();

    let full_size = RECORD_SIZE + size_of::<f32>() * (1 + factors);
    let size = HEADER_SIZE + keys.len() * RECORD_SIZE + table.len() * (full_size - RECORD_SIZE);
    let mut writer = ByteWriter::with_capacity(size);

    writer.put_bytes(&MAGIC);
    writer.put_u32(FORMAT_VERSION);
    writer.put_f64(w0);
    writer.put_i32(to_i32("factors", factors)?);
    writer.put_i32(to_i32("num_features", shape.num_features())?);
    writer.put_i32(to_i32("num_fields", shape.num_fields())?);
    writer.put_i32(to_i32("used", table.len())?);
    writer.put_i32(to_i32("slots", keys.len())?);

    for ((&key, entry), &state) in keys.iter().zip(entries).zip(states) {
        writer.put_u8(state as u8);
        writer.put_i32(key);

        let Some(entry) = entry else {
            continue;
        };

        if entry.factors() != factors {
            return Err(FfmErr::FactorMismatch {
                got: entry.factors(),
                expected: factors,
            });
        }

        writer.put_f32(entry.w);
        entry.v().iter().for_each(|&vf| writer.put_f32(vf));
    }

    debug!(bytes = writer.len(), used = table.len(), slots = keys.len(); "serialized model");
    Ok(writer.into_inner())
}

/// Unpacks a model written by `write_model`.
///
/// # Arguments
/// * `bytes` - The canonical bytes of a model.
///
/// # Returns
/// The global bias, the dimensions and the parameter table of the model, or
/// `MalformedLayout` if the bytes are truncated, have trailing data or describe an
/// inconsistent table.
pub fn read_model(bytes: &[u8]) -> Result<(f64, Shape, ParamTable)> {
    let mut reader = ByteReader::new(bytes);

    let magic = reader.take::<4>()?;
    if magic != MAGIC {
        return Err(FfmErr::malformed(format!("bad magic {magic:?}")));
    }

    let version = reader.read_u32()?;
    if version != FORMAT_VERSION {
        return Err(FfmErr::malformed(format!(
            "unsupported format version {version}, expected {FORMAT_VERSION}"
        )));
    }

    let w0 = reader.read_f64()?;
    let factors = to_usize("factors", reader.read_i32()?)?;
    let num_features = to_usize("num_features", reader.read_i32()?)?;
    let num_fields = to_usize("num_fields", reader.read_i32()?)?;
    let used = to_usize("used", reader.read_i32()?)?;
    let slots = to_usize("slots", reader.read_i32()?)?;

    let shape = Shape::new(factors, num_features, num_fields)
        .map_err(|e| FfmErr::malformed(e.to_string()))?;

    if used > slots {
        return Err(FfmErr::malformed(format!(
            "{used} used slots out of {slots}"
        )));
    }

    let full_extra = size_of::<f32>().saturating_mul(factors.saturating_add(1));
    let needed = slots
        .saturating_mul(RECORD_SIZE)
        .saturating_add(used.saturating_mul(full_extra));
    if reader.remaining() < needed {
        return Err(FfmErr::malformed(format!(
            "truncated input: {slots} slots need at least {needed} bytes, {} left",
            reader.remaining()
        )));
    }

    let mut keys = Vec::with_capacity(slots);
    let mut entries = Vec::with_capacity(slots);
    let mut states = Vec::with_capacity(slots);

    for _ in 0..slots {
        let byte = reader.read_u8()?;
        let Some(state) = SlotState::from_byte(byte) else {
            return Err(FfmErr::malformed(format!("unknown slot state {byte}")));
        };

        keys.push(reader.read_i32()?);
        states.push(state);

        if state != SlotState::Full {
            entries.push(None);
            continue;
        }

        let w = reader.read_f32()?;
        let v = (0..factors)
            .map(|_| reader.read_f32())
            .collect::<Result<Vec<_>>>()?;

        entries.push(Some(Entry::new(w, v)));
    }

    if reader.remaining() != 0 {
        return Err(FfmErr::malformed(format!(
            "{} trailing bytes",
            reader.remaining()
        )));
    }

    let table = ParamTable::rebuild(keys, entries, states, used)?;
    debug!(bytes = bytes.len(), used = used, slots = slots; "deserialized model");

    Ok((w0, shape, table))
}
