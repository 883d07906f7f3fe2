//! Sentinel-coded section readers

use std::io::Read;

use crate::error::{DecodeError, Section};
use crate::io::ModelReader;
use crate::NORMAL_SIZE;

/// Read a u16-prefixed key table
///
/// Lookups use an exact binary search, so keys must be strictly ascending
/// under IEEE total ordering and free of NaN.
pub(super) fn read_key_table<R: Read>(
    reader: &mut ModelReader<R>,
) -> Result<Vec<f32>, DecodeError> {
    let len = reader.read_u16()? as usize;
    let keys = reader.read_f32_vec(len)?;

    for (position, key) in keys.iter().enumerate() {
        let ascending = match position.checked_sub(1) {
            Some(prev) => keys[prev].total_cmp(key).is_lt(),
            None => true,
        };
        if key.is_nan() || !ascending {
            return Err(DecodeError::UnsortedKeys {
                section: reader.section(),
                position,
            });
        }
    }

    Ok(keys)
}

/// Read a points or tex coords stream
///
/// Each scalar is one of:
/// - NaN: repeat the previous `N` scalars
/// - an exact key table hit: copy the matching `N`-wide index table entry
/// - anything else: a literal
///
/// Sentinels are recognised at every scalar position, not only at group
/// boundaries.
pub(super) fn read_keyed_stream<R: Read, const N: usize>(
    reader: &mut ModelReader<R>,
    keys: &[f32],
    indices: &[f32],
) -> Result<Vec<[f32; N]>, DecodeError> {
    let section = reader.section();
    let len = reader.read_u16()? as usize * N;
    let mut values = vec![0.0f32; len];
    let mut pos = 0;

    while pos < len {
        let value = reader.read_f32()?;

        if value.is_nan() {
            if pos < N {
                return Err(DecodeError::SentinelBeforeData {
                    section,
                    position: pos,
                    required: N,
                });
            }
            check_fits(section, pos, N, len)?;
            values.copy_within(pos - N..pos, pos);
            pos += N;
        } else if let Ok(key) = keys.binary_search_by(|probe| probe.total_cmp(&value)) {
            check_fits(section, pos, N, len)?;
            let start = key * N;
            values[pos..pos + N].copy_from_slice(&indices[start..start + N]);
            pos += N;
        } else {
            values[pos] = value;
            pos += 1;
        }
    }

    Ok(group(&values))
}

/// Read the normals stream
///
/// Normal components are bounded to [-1, 1], so magnitude selects the meaning:
/// - `|v| <= 1`: literal
/// - `v <= -2`: copy normals index entry `floor(-v) - 2`
/// - `v > 1`: repeat the previous normal `floor(v)` times
/// - NaN: repeat the previous normal once
pub(super) fn read_normals<R: Read>(
    reader: &mut ModelReader<R>,
    table: &[f32],
) -> Result<Vec<[f32; NORMAL_SIZE]>, DecodeError> {
    let section = reader.section();
    let len = reader.read_u16()? as usize * NORMAL_SIZE;
    let table_len = table.len() / NORMAL_SIZE;
    let mut values = vec![0.0f32; len];
    let mut pos = 0;

    while pos < len {
        let value = reader.read_f32()?;

        if value.abs() <= 1.0 {
            values[pos] = value;
            pos += 1;
        } else if value <= -2.0 {
            // Saturating cast keeps huge magnitudes out of range
            let index = ((-value).floor() as u64 - 2) as usize;
            if index >= table_len {
                return Err(DecodeError::BackreferenceOutOfRange {
                    section,
                    position: pos,
                    index,
                    len: table_len,
                });
            }
            check_fits(section, pos, NORMAL_SIZE, len)?;
            let start = index * NORMAL_SIZE;
            values[pos..pos + NORMAL_SIZE].copy_from_slice(&table[start..start + NORMAL_SIZE]);
            pos += NORMAL_SIZE;
        } else if value > 1.0 || value.is_nan() {
            if pos < NORMAL_SIZE {
                return Err(DecodeError::SentinelBeforeData {
                    section,
                    position: pos,
                    required: NORMAL_SIZE,
                });
            }
            let run = if value.is_nan() {
                1
            } else {
                value.floor() as u64
            };
            let needed = run.saturating_mul(NORMAL_SIZE as u64);
            if pos as u64 + needed > len as u64 {
                return Err(DecodeError::GroupOverflow {
                    section,
                    position: pos,
                    needed,
                    len,
                });
            }
            for _ in 0..run {
                values.copy_within(pos - NORMAL_SIZE..pos, pos);
                pos += NORMAL_SIZE;
            }
        } else {
            return Err(DecodeError::InvalidSentinel {
                section,
                position: pos,
                value,
            });
        }
    }

    Ok(group(&values))
}

/// Read one face partition
///
/// A negative value `v` whose run `|v|` fits in the remaining length emits
/// `|v|` indices, each one more than the last. A run that would overflow the
/// partition is instead read as a large unsigned literal. Every emitted index
/// must address one of `points` decoded points.
pub(super) fn read_faces<R: Read>(
    reader: &mut ModelReader<R>,
    part: usize,
    points: usize,
) -> Result<Vec<u16>, DecodeError> {
    let len = reader.read_u16()? as usize;
    let mut indices = Vec::with_capacity(len);
    let mut previous = u16::MAX;

    while indices.len() < len {
        let value = reader.read_i16()?;
        let run = value.unsigned_abs() as usize;

        if value < 0 && run + indices.len() <= len {
            for _ in 0..run {
                previous = previous.wrapping_add(1);
                check_face_index(part, indices.len(), previous, points)?;
                indices.push(previous);
            }
        } else {
            previous = value as u16;
            check_face_index(part, indices.len(), previous, points)?;
            indices.push(previous);
        }
    }

    Ok(indices)
}

fn check_face_index(
    part: usize,
    position: usize,
    index: u16,
    points: usize,
) -> Result<(), DecodeError> {
    if index as usize >= points {
        return Err(DecodeError::FaceIndexOutOfRange {
            part,
            position,
            index,
            points,
        });
    }
    Ok(())
}

fn check_fits(section: Section, pos: usize, width: usize, len: usize) -> Result<(), DecodeError> {
    if pos + width > len {
        return Err(DecodeError::GroupOverflow {
            section,
            position: pos,
            needed: width as u64,
            len,
        });
    }
    Ok(())
}

fn group<const N: usize>(values: &[f32]) -> Vec<[f32; N]> {
    values
        .chunks_exact(N)
        .map(|chunk| {
            let mut group = [0.0; N];
            group.copy_from_slice(chunk);
            group
        })
        .collect()
}
