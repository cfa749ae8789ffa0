//! Endless confetti from two staggered fall lanes.
//!
//! Each lane is a full [`ConfettiController`] timeline looping forever. The
//! second lane starts half a cycle late, so while one lane's flakes leave the
//! bottom of the container the other lane's are mid-screen and the stream
//! never visibly restarts. Both lanes share sizes and atlas but draw from
//! separate random streams.

use super::fall::LaneOptions;
use super::{build_atlas, radius_range, ConfettiController, Controls, FrameSource};
use crate::config::ConfettiConfig;
use crate::error::ConfettiError;
use crate::events::{AnimationEvent, EventBridge};
use crate::sizes::{fall_size_table, SizeVariant, SIZE_STEPS};
use crate::spawn::SpawnContext;
use crate::sprite::FrameBatch;
use crate::textures::{Atlas, RasterTextureBuilder, TextureBuilder};
use crossbeam_channel::Receiver;
use glam::Vec2;
use std::sync::Arc;
use std::time::Duration;

/// Two phase-shifted fall timelines driven as one animation.
///
/// ```ignore
/// let stream = ContinuousController::new(ConfettiConfig::new().with_container(390.0, 844.0))?;
/// // Render pass:
/// stream.tick(dt);
/// stream.write_frame(&mut batch);
/// ```
#[derive(Clone)]
pub struct ContinuousController {
    lanes: [ConfettiController; 2],
    events: EventBridge,
}

impl ContinuousController {
    pub fn new(config: ConfettiConfig) -> Result<Self, ConfettiError> {
        Self::with_builder(config, &RasterTextureBuilder)
    }

    pub fn with_builder<B>(config: ConfettiConfig, builder: &B) -> Result<Self, ConfettiError>
    where
        B: TextureBuilder + ?Sized,
    {
        let config = config.continuous_lane();
        let mut rng = SpawnContext::new(config.flakes.seed, u64::MAX);
        let sizes: Arc<[SizeVariant]> = fall_size_table(
            config.flakes.flake_size,
            config.flakes.size_variation,
            radius_range(&config.flakes),
            SIZE_STEPS,
            &mut rng,
        )
        .into();
        let atlas = build_atlas(builder, &config.flakes, Arc::clone(&sizes))?;

        let events = EventBridge::new();
        let stagger = half_cycle(&config);
        log::debug!("continuous confetti, second lane staggered by {stagger:?}");

        let first = ConfettiController::from_parts(
            config.clone(),
            Arc::clone(&sizes),
            Arc::clone(&atlas),
            LaneOptions {
                salt: 0,
                events: events.clone(),
                ..LaneOptions::default()
            },
        );
        let second = ConfettiController::from_parts(
            config,
            sizes,
            atlas,
            LaneOptions {
                salt: 1,
                stagger,
                announce_start: false,
                events: events.clone(),
            },
        );

        Ok(Self {
            lanes: [first, second],
            events,
        })
    }

    /// The two lanes, leading lane first.
    pub fn lanes(&self) -> &[ConfettiController; 2] {
        &self.lanes
    }

    /// Receiver shared by both lanes. `Ended` arrives once per lane cycle.
    pub fn events(&self) -> Receiver<AnimationEvent> {
        self.events.receiver()
    }
}

/// Half of one lane's cycle length.
fn half_cycle(config: &ConfettiConfig) -> Duration {
    let blast = if config.cannons_positions.is_empty() {
        Duration::ZERO
    } else {
        config.flakes.blast_duration
    };
    (blast + config.flakes.fall_duration) / 2
}

impl Controls for ContinuousController {
    type Overrides = Vec<Vec2>;

    fn restart(&self, cannons: Option<Vec<Vec2>>) {
        let [first, second] = &self.lanes;
        first.restart(cannons.clone());
        second.restart(cannons);
    }

    fn pause(&self) {
        self.lanes.iter().for_each(Controls::pause);
    }

    fn resume(&self) {
        self.lanes.iter().for_each(Controls::resume);
    }

    fn reset(&self) {
        self.lanes.iter().for_each(Controls::reset);
    }

    fn is_running(&self) -> bool {
        self.lanes.iter().any(Controls::is_running)
    }
}

impl FrameSource for ContinuousController {
    fn tick(&self, dt: Duration) {
        for lane in &self.lanes {
            lane.tick(dt);
        }
    }

    fn write_frame(&self, batch: &mut FrameBatch) {
        for lane in &self.lanes {
            lane.write_frame(batch);
        }
    }

    fn atlas(&self) -> Arc<Atlas> {
        self.lanes[0].atlas()
    }
}
