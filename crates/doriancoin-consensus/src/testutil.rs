//! Linked header chains for retarget tests.

use crate::chain::BlockRef;

/// A header entry in a test chain.
#[derive(Debug, Clone, Copy)]
struct HeaderEntry {
    height: i64,
    time: i64,
    bits: u32,
}

/// Arena-backed header chain. Entries are parent-linked by position; the
/// first entry's parent is absent, standing in for everything below it.
#[derive(Debug)]
pub struct HeaderChain {
    entries: Vec<HeaderEntry>,
}

impl HeaderChain {
    /// Start a chain whose first entry has the given height.
    pub fn new(start_height: i64, start_time: i64, bits: u32) -> Self {
        Self {
            entries: vec![HeaderEntry {
                height: start_height,
                time: start_time,
                bits,
            }],
        }
    }

    /// Append a block `solvetime` seconds after the current tip. Negative
    /// solvetimes build the out-of-order timestamps the clamps exist for.
    pub fn add(&mut self, solvetime: i64, bits: u32) {
        let last = *self.entries.last().unwrap();
        self.entries.push(HeaderEntry {
            height: last.height + 1,
            time: last.time + solvetime,
            bits,
        });
    }

    /// Append `count` blocks with a fixed solvetime and bits.
    pub fn extend(&mut self, count: usize, solvetime: i64, bits: u32) {
        for _ in 0..count {
            self.add(solvetime, bits);
        }
    }

    /// Overwrite the tip's timestamp.
    pub fn set_tip_time(&mut self, time: i64) {
        self.entries.last_mut().unwrap().time = time;
    }

    pub fn tip(&self) -> ChainSlot<'_> {
        ChainSlot {
            chain: self,
            index: self.entries.len() - 1,
        }
    }

    pub fn at_height(&self, height: i64) -> ChainSlot<'_> {
        let base = self.entries[0].height;
        ChainSlot {
            chain: self,
            index: (height - base) as usize,
        }
    }
}

/// Cheap handle implementing the index view over a [`HeaderChain`].
#[derive(Debug, Clone, Copy)]
pub struct ChainSlot<'a> {
    chain: &'a HeaderChain,
    index: usize,
}

impl BlockRef for ChainSlot<'_> {
    fn height(&self) -> i64 {
        self.chain.entries[self.index].height
    }

    fn time(&self) -> i64 {
        self.chain.entries[self.index].time
    }

    fn bits(&self) -> u32 {
        self.chain.entries[self.index].bits
    }

    fn parent(&self) -> Option<Self> {
        self.index.checked_sub(1).map(|index| ChainSlot {
            chain: self.chain,
            index,
        })
    }
}
