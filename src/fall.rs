//! Moves targets down by a distance, one after another, each driven by its own
//! progress clock.

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, error, info};

use crate::{ProgressClock, TimeSource};

#[derive(Debug, Clone)]
pub struct Config {
    /// How far each target moves, in pixels.
    pub distance: f64,
    /// Target `i` falls for `stagger * (i + 1)`.
    pub stagger: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            distance: 500.0,
            stagger: Duration::from_millis(400),
        }
    }
}

/// Something that can be moved down.
#[async_trait]
pub trait Target: Send + Sync {
    /// Used in logs.
    fn name(&self) -> &str;

    /// Moves the target to `offset` pixels below its resting position.
    async fn apply(&self, offset: f64) -> Result<()>;
}

/// A target that only logs the transform it would apply.
#[derive(Debug)]
pub struct LogTarget {
    name: String,
}

impl LogTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Target for LogTarget {
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self, offset: f64) -> Result<()> {
        info!(target_name = %self.name, transform = %format!("translateY({offset}px)"), "move");
        Ok(())
    }
}

/// Applies `progress * distance` to `target` for every value of `clock`.
///
/// When the target fails the session is cancelled and the error is returned.
pub async fn move_by(clock: &ProgressClock, target: &dyn Target, distance: f64) -> Result<()> {
    let mut progress = clock.stream()?;

    while let Some(p) = progress.next().await {
        if let Err(err) = target.apply(p * distance).await {
            error!(?err, target_name = %target.name(), "error applying offset to target");
            return Err(err);
        }
    }

    Ok(())
}

/// Moves every target in order, starting each one once the previous one has landed.
pub async fn fall_in_sequence(
    config: &Config,
    targets: &[Arc<dyn Target>],
    time_source: Arc<dyn TimeSource>,
) -> Result<()> {
    let stagger_ms = config.stagger.as_secs_f64() * 1000.0;

    for (i, target) in targets.iter().enumerate() {
        let clock = ProgressClock::new(stagger_ms * (i + 1) as f64, Arc::clone(&time_source));

        debug!(target_name = %target.name(), duration = clock.duration(), "target falling");

        move_by(&clock, target.as_ref(), config.distance).await?;
    }

    Ok(())
}
