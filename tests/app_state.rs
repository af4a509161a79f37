mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakeRadio, FakeTransport, RecordingIndicator, link_with};
use nekomimi_link::config::AppConfig;
use nekomimi_link::config::cycle_config::CycleConfig;
use nekomimi_link::core::bluetooth::LinkState;
use nekomimi_link::core::bluetooth::constants::INIT_BYTES;
use nekomimi_link::core::indicator::Indicator;
use nekomimi_link::core::rainbow::{ControlLoop, RainbowCycle};
use nekomimi_link::state::AppState;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

#[tokio::test(start_paused = true)]
async fn test_control_loop_walks_the_rainbow() {
    let (link, transport) = link_with(FakeRadio::headphones());
    link.supervise().await;

    let config = CycleConfig {
        step: 100,
        ..CycleConfig::default()
    };
    let indicator = Arc::new(RecordingIndicator::default());
    let control = ControlLoop::new(
        link.clone(),
        config,
        Some(indicator.clone() as Arc<dyn Indicator>),
    );
    let shutdown = CancellationToken::new();
    let task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { control.run(shutdown).await }
    });

    sleep(Duration::from_secs(10)).await;
    shutdown.cancel();
    let acknowledged = task.await.unwrap();

    let shown = indicator.shown.lock().unwrap().clone();
    assert!(acknowledged >= 3);
    assert_eq!(shown.len() as u64, acknowledged);

    let cycle = RainbowCycle::new(100);
    let expected: Vec<u32> = (0..acknowledged).map(|i| cycle.color_at(i).packed()).collect();
    assert_eq!(shown, expected);
    assert_eq!(shown[0], 0xff0000);
    // The fourth colour wraps back to red
    if acknowledged > 3 {
        assert_eq!(shown[3], shown[0]);
    }

    let radio = transport.radio();
    assert_eq!(radio.writes.len() as u64, acknowledged + 1);
    assert_eq!(radio.written()[0], INIT_BYTES.to_vec());
}

#[tokio::test(start_paused = true)]
async fn test_control_loop_keeps_going_while_disconnected() {
    let mut radio = FakeRadio::headphones();
    radio.adverts.clear();
    let (link, transport) = link_with(radio);

    let indicator = Arc::new(RecordingIndicator::default());
    let control = ControlLoop::new(
        link.clone(),
        CycleConfig::default(),
        Some(indicator.clone() as Arc<dyn Indicator>),
    );
    let shutdown = CancellationToken::new();
    let task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { control.run(shutdown).await }
    });

    sleep(Duration::from_secs(5)).await;
    shutdown.cancel();

    assert_eq!(task.await.unwrap(), 0);
    assert!(indicator.shown.lock().unwrap().len() >= 3);
    assert!(transport.radio().writes.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_indicator_mirroring_can_be_disabled() {
    let (link, _transport) = link_with(FakeRadio::headphones());
    link.supervise().await;

    let config = CycleConfig {
        mirror_on_indicator: false,
        ..CycleConfig::default()
    };
    let indicator = Arc::new(RecordingIndicator::default());
    let control = ControlLoop::new(link, config, Some(indicator.clone() as Arc<dyn Indicator>));
    let shutdown = CancellationToken::new();
    let task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { control.run(shutdown).await }
    });

    sleep(Duration::from_secs(5)).await;
    shutdown.cancel();

    assert!(task.await.unwrap() >= 1);
    assert!(indicator.shown.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_app_state_start_and_shutdown() {
    let mut radio = FakeRadio::headphones();
    radio.awaits_init = true;
    let transport = FakeTransport::new(radio);
    let indicator = Arc::new(RecordingIndicator::default());
    let app_state = AppState::new(
        transport.clone(),
        AppConfig::default(),
        Some(indicator.clone() as Arc<dyn Indicator>),
    );
    let link = app_state.get_link_manager_arc();

    let tasks = app_state.start();
    sleep(Duration::from_secs(30)).await;
    assert_eq!(link.state(), LinkState::Ready);
    {
        let radio = transport.radio();
        // The colour loop never gets ahead of the init command
        assert_eq!(radio.written()[0], INIT_BYTES.to_vec());
        assert!(radio.writes.len() > 1);
    }

    transport.drop_link();
    let before_drop = transport.radio().writes.len();
    sleep(Duration::from_secs(30)).await;
    assert_eq!(link.state(), LinkState::Ready);

    let acknowledged = app_state.shutdown(tasks).await;
    assert!(link.shutdown_token().is_cancelled());
    assert!(!indicator.shown.lock().unwrap().is_empty());

    let radio = transport.radio();
    assert_eq!(radio.scans, 2);
    assert_eq!(radio.connect_attempts, vec!["HP-1".to_string(), "HP-1".to_string()]);
    let after_drop = &radio.written()[before_drop..];
    assert_eq!(after_drop[0], INIT_BYTES.to_vec());
    assert!(after_drop.len() > 1);
    // Everything but the two init commands was an acknowledged colour
    assert_eq!(acknowledged, radio.writes.len() as u64 - 2);
}
