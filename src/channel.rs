//! Spectral channel selection.
//!
//! Channels are not rows: they index into each spectrum rather than into the metadata
//! table, so they never take part in the final row selection. They are collected here
//! for the calibration side to turn into a mask.

use crate::error::{Result, SelectionError};
use crate::value::Value;

const KEY: &str = "CHANNEL";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelSelection {
    // sorted, non-overlapping, non-adjacent inclusive ranges
    ranges: Vec<(u32, u32)>,
}

fn channel(value: &Value) -> Result<u32> {
    let n = match value {
        Value::Int(i) => Some(*i),
        Value::Float(x) if x.fract() == 0.0 => Some(*x as i64),
        _ => None,
    };
    n.and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| SelectionError::malformed(KEY, format!("{value} is not a channel number")))
}

fn parse(input: &Value) -> Result<Vec<(u32, u32)>> {
    let items = match input {
        Value::List(items) if !items.is_empty() => items,
        Value::List(_) => return Err(SelectionError::malformed(KEY, "no channels given")),
        single => return channel(single).map(|c| vec![(c, c)]),
    };
    let mut ranges = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::List(pair) if pair.len() == 2 => {
                let (lo, hi) = (channel(&pair[0])?, channel(&pair[1])?);
                if lo > hi {
                    return Err(SelectionError::malformed(
                        KEY,
                        format!("channel range {item} is reversed"),
                    ));
                }
                ranges.push((lo, hi));
            }
            Value::List(_) => {
                return Err(SelectionError::malformed(
                    KEY,
                    format!("couldn't parse {item} as a channel range"),
                ));
            }
            single => {
                let c = channel(single)?;
                ranges.push((c, c));
            }
        }
    }
    Ok(ranges)
}

impl ChannelSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a channel, a list of channels, or a list of inclusive `(lo, hi)` ranges.
    /// Nothing is added if any part of `input` is invalid.
    pub fn add(&mut self, input: &Value) -> Result<()> {
        let mut ranges = parse(input)?;
        ranges.append(&mut self.ranges);
        ranges.sort_unstable();
        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(ranges.len());
        for (lo, hi) in ranges {
            match merged.last_mut() {
                Some(last) if lo <= last.1.saturating_add(1) => last.1 = last.1.max(hi),
                _ => merged.push((lo, hi)),
            }
        }
        self.ranges = merged;
        Ok(())
    }

    pub fn ranges(&self) -> &[(u32, u32)] {
        &self.ranges
    }

    pub fn contains(&self, channel: u32) -> bool {
        self.ranges.iter().any(|(lo, hi)| (*lo..=*hi).contains(&channel))
    }

    /// One flag per channel of a spectrum with `nchan` channels.
    pub fn mask(&self, nchan: usize) -> Vec<bool> {
        let mut mask = vec![false; nchan];
        for &(lo, hi) in &self.ranges {
            let lo = lo as usize;
            if lo >= nchan {
                break;
            }
            let hi = (hi as usize).min(nchan - 1);
            mask[lo..=hi].iter_mut().for_each(|m| *m = true);
        }
        mask
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }
}
