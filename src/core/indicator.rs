//! Local indicator output
//! A cosmetic mirror of the commanded colour (an on-board pixel, a status
//! LED…). It keeps showing colours while the headphones are unreachable.

use anyhow::Result;
use log::debug;

/// An addressable output that accepts a packed `0xRRGGBB` colour.
pub trait Indicator: Send + Sync {
    fn show(&self, color: u32) -> Result<()>;
}

/// Indicator that reports colours in the debug log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogIndicator;

impl Indicator for LogIndicator {
    fn show(&self, color: u32) -> Result<()> {
        debug!("Indicator colour #{:06x}", color);
        Ok(())
    }
}
