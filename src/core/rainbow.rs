//! Rainbow colour cycle
//! Walks the colour wheel and pushes one colour per tick to the headphones.

use std::sync::Arc;

use log::{debug, info};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::config::cycle_config::CycleConfig;
use crate::core::bluetooth::manager::LinkManager;
use crate::core::bluetooth::transport::Transport;
use crate::core::bluetooth::types::Rgb;
use crate::core::indicator::Indicator;

/// Number of positions on the colour wheel
const WHEEL_SIZE: u16 = 255;

/// Colour wheel: red → blue → green → red as `position` goes from 0 to 254.
pub fn rgb_color_wheel(position: u8) -> (u8, u8, u8) {
    let position = (u16::from(position) % WHEEL_SIZE) as u8;
    if position < 85 {
        (255 - position * 3, 0, position * 3)
    } else if position < 170 {
        let position = position - 85;
        (0, position * 3, 255 - position * 3)
    } else {
        let position = position - 170;
        (position * 3, 255 - position * 3, 0)
    }
}

/// Restartable rainbow sequence; `color_at(i)` is the i-th colour of the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RainbowCycle {
    step: u8,
}

impl RainbowCycle {
    /// A `step` of 0 is treated as 1.
    pub fn new(step: u8) -> Self {
        Self { step: step.max(1) }
    }

    /// Colours in one full turn of the wheel
    pub fn colors_per_turn(&self) -> u64 {
        u64::from(WHEEL_SIZE).div_ceil(u64::from(self.step))
    }

    pub fn color_at(&self, index: u64) -> Rgb {
        let position = (index % self.colors_per_turn()) * u64::from(self.step);
        let (r, g, b) = rgb_color_wheel(position as u8);
        Rgb::from_bytes(r, g, b)
    }
}

impl Default for RainbowCycle {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Periodic driver that feeds the rainbow into the link
pub struct ControlLoop<T: Transport> {
    link: Arc<LinkManager<T>>,
    cycle: RainbowCycle,
    config: CycleConfig,
    indicator: Option<Arc<dyn Indicator>>,
}

impl<T: Transport> ControlLoop<T> {
    pub fn new(
        link: Arc<LinkManager<T>>,
        config: CycleConfig,
        indicator: Option<Arc<dyn Indicator>>,
    ) -> Self {
        Self {
            link,
            cycle: RainbowCycle::new(config.step),
            config,
            indicator,
        }
    }

    /// Sends one colour per interval until `shutdown` is cancelled.
    /// Returns the number of colours the headphones acknowledged.
    pub async fn run(&self, shutdown: CancellationToken) -> u64 {
        info!(
            "Colour cycle started ({} colours, every {:?})",
            self.cycle.colors_per_turn(),
            self.config.interval()
        );
        let indicator = if self.config.mirror_on_indicator {
            self.indicator.as_deref()
        } else {
            None
        };

        let mut index = 0u64;
        let mut acknowledged = 0u64;
        while !shutdown.is_cancelled() {
            let color = self.cycle.color_at(index);
            index = index.wrapping_add(1);
            if self.link.set_color(color, indicator).await {
                acknowledged += 1;
            } else {
                debug!("Colour {:?} not delivered (link {})", color, self.link.state());
            }
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = sleep(self.config.interval()) => {}
            }
        }
        info!("Colour cycle stopped after {} acknowledged colours", acknowledged);
        acknowledged
    }
}
