//! Track subcommand - headless gesture pipeline diagnostic.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use crate::config::Config;
use crate::gesture::{GestureState, HandTracking, SyntheticBackend};

/// Run the gesture pipeline without a window and print status changes and
/// debounced gesture transitions. Uses the synthetic backend, so it
/// exercises the full init sequence, classification, and debounce wiring
/// with no hardware attached.
#[derive(Parser)]
pub struct TrackCommand {
    /// How long to sample before shutting down, in seconds.
    #[arg(long, default_value_t = 10)]
    pub seconds: u64,
}

impl TrackCommand {
    pub async fn run(self, config: Config) -> color_eyre::Result<()> {
        let mut tracking_config = config.tracking.clone();
        tracking_config.model = "builtin".to_string();

        let tracking =
            HandTracking::initialize(&tracking_config, Arc::new(SyntheticBackend)).await?;
        let mut gesture_rx = tracking.gesture();
        let mut status_rx = tracking.status();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(self.seconds);
        let mut last: Option<GestureState> = None;

        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => break,
                changed = status_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    println!("status: {}", *status_rx.borrow());
                }
                changed = gesture_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = *gesture_rx.borrow();
                    let transition = last
                        .map_or(true, |prev| prev.gesture != state.gesture || prev.active != state.active);
                    if transition {
                        println!(
                            "gesture: active={} x={:.2} y={:.2} {:?}",
                            state.active, state.x, state.y, state.gesture
                        );
                    }
                    last = Some(state);
                }
            }
        }

        tracking.shutdown().await;
        Ok(())
    }
}
