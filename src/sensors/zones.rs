//! Zone classification of reported analog values.

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::MAX_ZONES_PER_CHANNEL;
use crate::error::{Error, Peripheral, Result};

/// Inclusive `[min, max]` band tagged with a caller-chosen id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: u8,
    pub min: i32,
    pub max: i32,
}

impl Zone {
    pub fn new(id: u8, min: i32, max: i32) -> Result<Self> {
        if min > max {
            return Err(Error::InvalidZone { min, max });
        }
        Ok(Self { id, min, max })
    }

    pub fn contains(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Ordered zone list. Zones may overlap and need not cover the range;
/// lookup returns the first zone, in insertion order, that contains the
/// value.
#[derive(Debug, Clone, Default)]
pub struct ZoneMap {
    zones: heapless::Vec<Zone, MAX_ZONES_PER_CHANNEL>,
}

impl ZoneMap {
    pub const fn new() -> Self {
        Self {
            zones: heapless::Vec::new(),
        }
    }

    pub fn add(&mut self, zone: Zone) -> Result<()> {
        self.zones.push(zone).map_err(|_| Error::Capacity {
            kind: Peripheral::Zone,
            capacity: MAX_ZONES_PER_CHANNEL,
        })?;
        info!("zone {} defined: {}..={}", zone.id, zone.min, zone.max);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.zones.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }

    /// Id of the first zone containing `value`, or `None`.
    pub fn classify(&self, value: i32) -> Option<u8> {
        self.zones.iter().find(|z| z.contains(value)).map(|z| z.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(zones: &[(u8, i32, i32)]) -> ZoneMap {
        let mut m = ZoneMap::new();
        for &(id, min, max) in zones {
            m.add(Zone::new(id, min, max).unwrap()).unwrap();
        }
        m
    }

    #[test]
    fn bounds_are_inclusive() {
        let m = map(&[(1, 0, 10), (2, 11, 20)]);
        assert_eq!(m.classify(0), Some(1));
        assert_eq!(m.classify(10), Some(1));
        assert_eq!(m.classify(11), Some(2));
        assert_eq!(m.classify(21), None);
    }

    #[test]
    fn first_match_wins_on_overlap() {
        let m = map(&[(7, 0, 50), (8, 40, 100)]);
        assert_eq!(m.classify(45), Some(7));
        assert_eq!(m.classify(60), Some(8));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        assert_eq!(
            Zone::new(1, 10, 5),
            Err(Error::InvalidZone { min: 10, max: 5 })
        );
    }

    #[test]
    fn capacity_is_enforced() {
        let mut m = ZoneMap::new();
        for id in 0..MAX_ZONES_PER_CHANNEL as u8 {
            m.add(Zone::new(id, 0, 1).unwrap()).unwrap();
        }
        assert!(matches!(
            m.add(Zone::new(99, 0, 1).unwrap()),
            Err(Error::Capacity {
                kind: Peripheral::Zone,
                ..
            })
        ));
        m.clear();
        assert!(m.is_empty());
    }
}
