//! Compression passes
//!
//! Each pass turns one canonical array into the scalar stream the decoder
//! expects, together with the lookup table it references.

use hashbrown::{HashMap, HashSet};

use crate::error::EncodeError;
use crate::{MAX_U16_COUNT, NORMAL_SIZE};

/// Occurrences before a point or UV group earns a key
const MIN_KEYED_OCCURRENCES: usize = 4;

/// Occurrences before a normal earns a normals index entry
const MIN_INDEXED_NORMAL_OCCURRENCES: usize = 3;

/// Longest face run one i16 sentinel can carry
const MAX_FACE_RUN: usize = i16::MAX as usize;

/// Points or tex coords ready to write
#[derive(Debug, Default)]
pub(super) struct KeyedStream {
    /// Ascending key table
    pub keys: Vec<f32>,
    /// One group per key, in key order
    pub indices: Vec<f32>,
    pub stream: Vec<f32>,
}

/// Normals ready to write
#[derive(Debug, Default)]
pub(super) struct NormalStream {
    pub indices: Vec<f32>,
    pub stream: Vec<f32>,
}

fn bits<const N: usize>(group: &[f32; N]) -> [u32; N] {
    group.map(f32::to_bits)
}

/// Mark groups bit-identical to their predecessor
fn repeats<const N: usize>(groups: &[[f32; N]]) -> Vec<bool> {
    let mut marks = vec![false; groups.len()];
    for i in 1..groups.len() {
        marks[i] = bits(&groups[i]) == bits(&groups[i - 1]);
    }
    marks
}

/// Groups occurring at least `min` times, in first-appearance order
fn frequent<const N: usize>(groups: &[[f32; N]], skip: &[bool], min: usize) -> Vec<[u32; N]> {
    let mut counts: HashMap<[u32; N], usize> = HashMap::new();
    let mut order = Vec::new();

    for (group, _) in groups.iter().zip(skip).filter(|(_, skipped)| !**skipped) {
        let count = counts.entry(bits(group)).or_insert(0);
        if *count == 0 {
            order.push(bits(group));
        }
        *count += 1;
    }

    order.retain(|key| counts.get(key).is_some_and(|&count| count >= min));
    order.truncate(MAX_U16_COUNT);
    order
}

/// Generate `count` ascending finite keys distinct from every stream scalar
///
/// Keys count down from the largest finite float so they stay far from
/// typical coordinates.
fn generate_keys(values: &[f32], count: usize) -> Vec<f32> {
    let used: HashSet<u32> = values.iter().map(|v| v.to_bits()).collect();
    let mut keys = Vec::with_capacity(count);
    let mut candidate = f32::MAX.to_bits();

    while keys.len() < count {
        if !used.contains(&candidate) {
            keys.push(f32::from_bits(candidate));
        }
        candidate -= 1;
    }

    keys.reverse();
    keys
}

/// Encode points or tex coords
///
/// `optimize` writes a group equal to its predecessor as NaN; `index` replaces
/// frequent groups with generated keys.
pub(super) fn keyed_stream<const N: usize>(
    groups: &[[f32; N]],
    optimize: bool,
    index: bool,
) -> KeyedStream {
    let skip = if optimize {
        repeats(groups)
    } else {
        vec![false; groups.len()]
    };

    let table = if index {
        frequent(groups, &skip, MIN_KEYED_OCCURRENCES)
    } else {
        Vec::new()
    };
    let keys = generate_keys(groups.as_flattened(), table.len());
    let lookup: HashMap<[u32; N], f32> =
        table.iter().copied().zip(keys.iter().copied()).collect();

    let mut stream = Vec::with_capacity(groups.len() * N);
    for (group, &repeat) in groups.iter().zip(&skip) {
        if repeat {
            stream.push(f32::NAN);
        } else if let Some(&key) = lookup.get(&bits(group)) {
            stream.push(key);
        } else {
            stream.extend_from_slice(group);
        }
    }

    let indices = table.iter().flatten().map(|&b| f32::from_bits(b)).collect();
    KeyedStream {
        keys,
        indices,
        stream,
    }
}

/// Encode normals
///
/// `optimize` collapses a run of `n` normals equal to their predecessor into
/// `n` (or NaN for a single repeat); `index` writes frequent normals as
/// `-(k + 2)` where `k` is their normals index entry.
pub(super) fn normal_stream(
    normals: &[[f32; NORMAL_SIZE]],
    optimize: bool,
    index: bool,
) -> NormalStream {
    let skip = if optimize {
        repeats(normals)
    } else {
        vec![false; normals.len()]
    };

    let table = if index {
        frequent(normals, &skip, MIN_INDEXED_NORMAL_OCCURRENCES)
    } else {
        Vec::new()
    };
    let lookup: HashMap<[u32; NORMAL_SIZE], usize> = table
        .iter()
        .enumerate()
        .map(|(k, group)| (*group, k))
        .collect();

    let mut stream = Vec::with_capacity(normals.len() * NORMAL_SIZE);
    let mut i = 0;
    while i < normals.len() {
        if skip[i] {
            let run = skip[i..].iter().take_while(|&&repeat| repeat).count();
            stream.push(if run == 1 { f32::NAN } else { run as f32 });
            i += run;
            continue;
        }

        match lookup.get(&bits(&normals[i])) {
            Some(&k) => stream.push(-((k + 2) as f32)),
            None => stream.extend_from_slice(&normals[i]),
        }
        i += 1;
    }

    let indices = table.iter().flatten().map(|&b| f32::from_bits(b)).collect();
    NormalStream { indices, stream }
}

/// Encode one face partition
///
/// With `optimize`, indices that each exceed their predecessor by one are
/// written as `-(run length)`. A literal index of 32768 or more is stored as a
/// negative i16, which the decoder reads as a run whenever that run would fit
/// the partition; such indices are rewritten as a one-step run when possible
/// and rejected otherwise.
pub(super) fn face_stream(
    part: usize,
    indices: &[u16],
    optimize: bool,
) -> Result<Vec<i16>, EncodeError> {
    let len = indices.len();
    let mut stream = Vec::with_capacity(len);
    let mut previous = u16::MAX;
    let mut pos = 0;

    while pos < len {
        let index = indices[pos];
        let follows = index == previous.wrapping_add(1);

        if optimize && follows {
            let mut run = 1;
            while pos + run < len
                && run < MAX_FACE_RUN
                && indices[pos + run] == indices[pos + run - 1].wrapping_add(1)
            {
                run += 1;
            }
            stream.push(-(run as i16));
            previous = indices[pos + run - 1];
            pos += run;
            continue;
        }

        let literal = index as i16;
        if literal < 0 && literal.unsigned_abs() as usize + pos <= len {
            if !follows {
                return Err(EncodeError::AmbiguousIndex {
                    part,
                    position: pos,
                    index,
                });
            }
            stream.push(-1);
        } else {
            stream.push(literal);
        }
        previous = index;
        pos += 1;
    }

    Ok(stream)
}
