//! Application state management
//! This module wires the link manager and the colour cycle together.

use std::sync::Arc;

use log::{error, info};
use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::core::bluetooth::manager::LinkManager;
use crate::core::bluetooth::transport::Transport;
use crate::core::indicator::Indicator;
use crate::core::rainbow::ControlLoop;

/// Process-wide application state
pub struct AppState<T: Transport + 'static> {
    /// The link manager instance, shared by both long-running tasks
    pub link: Arc<LinkManager<T>>,
    pub config: AppConfig,
    indicator: Option<Arc<dyn Indicator>>,
}

/// Handles of the running tasks
pub struct RunningTasks {
    pub supervision: JoinHandle<()>,
    pub control: JoinHandle<u64>,
}

impl<T: Transport + 'static> AppState<T> {
    /// Creates a new AppState instance
    pub fn new(transport: T, config: AppConfig, indicator: Option<Arc<dyn Indicator>>) -> Self {
        info!("Initializing LinkManager...");
        let link = Arc::new(LinkManager::new(transport, config.link.clone()));
        Self {
            link,
            config,
            indicator,
        }
    }

    /// Gets a reference to the link manager
    pub fn get_link_manager_arc(&self) -> Arc<LinkManager<T>> {
        self.link.clone()
    }

    /// Spawns the supervision loop and the colour cycle.
    pub fn start(&self) -> RunningTasks {
        let link = self.link.clone();
        let supervision = tokio::spawn(async move { link.run().await });

        let control_loop = ControlLoop::new(
            self.link.clone(),
            self.config.cycle.clone(),
            self.indicator.clone(),
        );
        let shutdown = self.link.shutdown_token();
        let control = tokio::spawn(async move { control_loop.run(shutdown).await });

        RunningTasks {
            supervision,
            control,
        }
    }

    /// Stops both tasks and waits for them to finish their current step.
    /// Returns the number of colours the headphones acknowledged.
    pub async fn shutdown(&self, tasks: RunningTasks) -> u64 {
        self.link.stop();
        if let Err(e) = tasks.supervision.await {
            error!("Supervision task ended abnormally: {}", e);
        }
        match tasks.control.await {
            Ok(acknowledged) => {
                info!("{} colours delivered this session", acknowledged);
                acknowledged
            }
            Err(e) => {
                error!("Colour task ended abnormally: {}", e);
                0
            }
        }
    }
}
