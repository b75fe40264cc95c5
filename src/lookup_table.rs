//! Point-in-time capture of the hardware lookup tables

use alloc::vec::Vec;

use crate::transfer::{Channel, TransferFn};

/// Full-scale value of a lookup table entry
pub const LUT_MAX: u16 = u16::MAX;

/// Convert a normalized level into a lookup table entry
pub fn quantize(level: f32) -> u16 {
    (level.clamp(0.0, 1.0) * f32::from(LUT_MAX)) as u16
}

/// Immutable snapshot of the lookup tables, indexed `[channel][controller][sample]`.
///
/// A snapshot owns its data, so it outlives the session it was read from.
/// Two snapshots are equal only if they have the same topology and every
/// sample matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTable {
    tables: [Vec<Vec<u16>>; 3],
}

impl LookupTable {
    /// Snapshot without any controllers
    pub const fn empty() -> Self {
        Self {
            tables: [Vec::new(), Vec::new(), Vec::new()],
        }
    }

    /// Build a snapshot from per-channel controller tables
    pub fn from_tables(red: Vec<Vec<u16>>, green: Vec<Vec<u16>>, blue: Vec<Vec<u16>>) -> Self {
        Self {
            tables: [red, green, blue],
        }
    }

    /// Sample a curve the way a device programs it.
    ///
    /// Every controller gets `size` entries, entry `idx` holding
    /// `curve(idx / size)`.
    pub fn sample(curve: &TransferFn, controllers: usize, size: usize) -> Self {
        let mut tables = [Vec::new(), Vec::new(), Vec::new()];
        for channel in Channel::ALL {
            let lut = sample_channel(curve, channel, size);
            tables[channel.index()] = (0..controllers).map(|_| lut.clone()).collect();
        }
        Self { tables }
    }

    /// Returns true for the zero snapshot (nothing captured)
    pub fn is_empty(&self) -> bool {
        self.tables.iter().all(Vec::is_empty)
    }

    /// Number of controllers captured
    pub fn controllers(&self) -> usize {
        self.tables[0].len()
    }

    /// Raw table of one controller
    pub fn table(&self, channel: Channel, controller: usize) -> Option<&[u16]> {
        self.tables[channel.index()]
            .get(controller)
            .map(Vec::as_slice)
    }

    /// Interpolated transfer function reproducing this snapshot.
    ///
    /// Values are linearly interpolated between neighbouring entries and
    /// averaged across controllers. An empty snapshot yields the identity.
    pub fn transfer_fn(&self) -> TransferFn {
        if self.is_empty() {
            return TransferFn::identity();
        }
        let tables = self.tables.clone();
        TransferFn::new(move |channel, input| interpolate(&tables[channel.index()], input))
    }
}

fn sample_channel(curve: &TransferFn, channel: Channel, size: usize) -> Vec<u16> {
    (0..size)
        .map(|idx| quantize(curve.apply(channel, idx as f32 / size as f32)))
        .collect()
}

fn interpolate(controllers: &[Vec<u16>], input: f32) -> f32 {
    let input = input.clamp(0.0, 1.0);
    let mut acc = 0.0;
    let mut count = 0u32;
    for lut in controllers.iter().filter(|lut| !lut.is_empty()) {
        let pos = input * lut.len() as f32;
        let base = libm::floorf(pos);
        let frac = pos - base;
        let idx = base as usize;
        let value = match (lut.get(idx), lut.get(idx + 1)) {
            (Some(&a), Some(&b)) => f32::from(a) * (1.0 - frac) + f32::from(b) * frac,
            (Some(&a), None) => f32::from(a),
            (None, _) => lut.last().map_or(0.0, |&last| f32::from(last)),
        };
        acc += value;
        count += 1;
    }
    if count == 0 {
        return input;
    }
    acc / count as f32 / f32::from(LUT_MAX)
}
