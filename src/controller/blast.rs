//! Controller for the radial blast variant.
//!
//! Blast and fall progress are driven by two tweens started together: the
//! short blast tween spreads flakes onto the spiral while the long fall tween
//! pulls them down. The fall tween finishing ends the cycle.

use super::{build_atlas, radius_range, Controls, FrameSource, Phase};
use crate::config::{BlastConfig, FlakeTexture};
use crate::error::ConfettiError;
use crate::events::{AnimationEvent, EventBridge};
use crate::motion::BlastScene;
use crate::particles::{BlastParticle, ParticleRanges};
use crate::progress::{AtomicProgress, SnapshotCell};
use crate::sizes::{blast_size_table, SizeVariant, SIZE_STEPS};
use crate::spawn::SpawnContext;
use crate::sprite::{assemble_sprites, FrameBatch};
use crate::textures::{Atlas, RasterTextureBuilder, TextureBuilder};
use crate::tween::{Animation, Tween};
use crossbeam_channel::Receiver;
use glam::Vec2;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct Timeline {
    phase: Phase,
    /// Tweens survive a pause; resume continues them where they stopped.
    blast: Option<Tween>,
    fall: Option<Tween>,
    center_override: Option<Vec2>,
    /// Epoch of the published scene.
    epoch: u32,
    cycle: u64,
}

struct Shared {
    config: BlastConfig,
    sizes: Arc<[SizeVariant]>,
    atlas: Arc<Atlas>,
    blast_progress: AtomicProgress,
    fall_progress: AtomicProgress,
    /// Frame time banked while the timeline was locked by a control call.
    pending_nanos: AtomicU64,
    running: AtomicBool,
    scene: SnapshotCell<BlastScene>,
    rng: Mutex<SpawnContext>,
    timeline: Mutex<Timeline>,
    events: EventBridge,
}

/// Radial confetti burst.
///
/// ```ignore
/// let burst = BlastController::new(BlastConfig::new().with_blast_radius(220.0))?;
/// burst.restart(Some(Vec2::new(tap.x, tap.y)));
/// ```
#[derive(Clone)]
pub struct BlastController {
    shared: Arc<Shared>,
}

impl BlastController {
    pub fn new(config: BlastConfig) -> Result<Self, ConfettiError> {
        Self::with_builder(config, &RasterTextureBuilder)
    }

    pub fn with_builder<B>(config: BlastConfig, builder: &B) -> Result<Self, ConfettiError>
    where
        B: TextureBuilder + ?Sized,
    {
        let mut rng = SpawnContext::new(config.flakes.seed, u64::MAX);
        let radius = match &config.flakes.texture {
            FlakeTexture::Rect { radius_range: Some(_) } => {
                rng.random_in(radius_range(&config.flakes))
            }
            _ => 0.0,
        };
        let sizes: Arc<[SizeVariant]> = blast_size_table(
            config.flakes.flake_size,
            config.flakes.size_variation,
            radius,
            SIZE_STEPS,
        )
        .into();
        let atlas = build_atlas(builder, &config.flakes, Arc::clone(&sizes))?;

        if config.flakes.count == 0 {
            log::warn!("blast configured with zero flakes");
        }

        let mut rng = SpawnContext::new(config.flakes.seed, 0);
        let scene = build_scene(&config, &sizes, &atlas, &mut rng, config.blast_center());
        let autoplay = config.autoplay;
        let controller = Self {
            shared: Arc::new(Shared {
                config,
                sizes,
                atlas,
                blast_progress: AtomicProgress::new(0, 0.0),
                fall_progress: AtomicProgress::new(0, 0.0),
                pending_nanos: AtomicU64::new(0),
                running: AtomicBool::new(false),
                scene: SnapshotCell::new(scene),
                rng: Mutex::new(rng),
                timeline: Mutex::new(Timeline {
                    phase: Phase::Idle,
                    blast: None,
                    fall: None,
                    center_override: None,
                    epoch: 0,
                    cycle: 0,
                }),
                events: EventBridge::new(),
            }),
        };
        if autoplay {
            controller.restart(None);
        }
        Ok(controller)
    }

    pub fn config(&self) -> &BlastConfig {
        &self.shared.config
    }

    pub fn blast_progress(&self) -> f32 {
        self.shared.blast_progress.load()
    }

    pub fn fall_progress(&self) -> f32 {
        self.shared.fall_progress.load()
    }

    pub fn scene(&self) -> Arc<BlastScene> {
        self.shared.scene.load()
    }

    pub fn events(&self) -> Receiver<AnimationEvent> {
        self.shared.events.receiver()
    }

    /// Rewind both progress values to the start of the published scene and
    /// start both tweens from zero.
    fn begin_cycle(&self, timeline: &mut Timeline, epoch: u32) {
        let shared = &self.shared;
        let flakes = &shared.config.flakes;
        timeline.epoch = epoch;
        shared.blast_progress.store(epoch, 0.0);
        shared.fall_progress.store(epoch, 0.0);
        timeline.blast = Some(Tween::new(0.0, Animation::timing(1.0, flakes.blast_duration, flakes.easing())));
        timeline.fall = Some(Tween::new(0.0, Animation::timing(1.0, flakes.fall_duration, flakes.easing())));
    }

    /// Advance both tweens by `dt`. Returns the time left over when the fall
    /// tween ends the cycle.
    fn advance(&self, timeline: &mut Timeline, dt: Duration) -> Option<Duration> {
        let shared = &self.shared;
        if let Some(tween) = timeline.blast.as_mut() {
            let step = tween.advance(dt);
            shared.blast_progress.store(timeline.epoch, step.value);
            if step.finished {
                timeline.blast = None;
            }
        }
        let step = timeline.fall.as_mut()?.advance(dt);
        shared.fall_progress.store(timeline.epoch, step.value);
        step.finished.then_some(step.leftover)
    }

    fn finish_cycle(&self, timeline: &mut Timeline, leftover: Duration) {
        let shared = &self.shared;
        timeline.cycle += 1;
        shared.events.emit(AnimationEvent::Ended { cycle: timeline.cycle });

        if !shared.config.is_infinite {
            timeline.blast = None;
            timeline.fall = None;
            timeline.phase = Phase::Finished;
            shared.running.store(false, Ordering::Release);
            log::debug!("blast finished");
            return;
        }

        // A restart holding the random stream replaces this cycle anyway.
        let epoch = match shared.rng.try_lock() {
            Some(mut rng) => {
                let center = timeline
                    .center_override
                    .unwrap_or_else(|| shared.config.blast_center());
                let scene = build_scene(&shared.config, &shared.sizes, &shared.atlas, &mut rng, center);
                shared.scene.publish(scene)
            }
            None => timeline.epoch,
        };
        self.begin_cycle(timeline, epoch);
        // A frame longer than a whole cycle only carries into the next one.
        let _ = self.advance(timeline, leftover);
        log::debug!("blast cycle {} done, looping", timeline.cycle);
    }
}

fn build_scene(
    config: &BlastConfig,
    sizes: &Arc<[SizeVariant]>,
    atlas: &Atlas,
    rng: &mut SpawnContext,
    center: Vec2,
) -> BlastScene {
    let ranges = ParticleRanges {
        count: config.flakes.count,
        color_count: atlas.color_rows(),
        size_count: sizes.len(),
        rotation: config.rotation_ranges(),
        speed: config.speed_range(),
        offset: config.offset_ranges(),
    };
    let particles = BlastParticle::generate(rng, &ranges);
    BlastScene::new(
        particles,
        center,
        config.blast_radius,
        Arc::clone(sizes),
        config.flakes.container_size(),
        config.flakes.fade_out_on_end,
    )
}

impl Controls for BlastController {
    type Overrides = Vec2;

    fn restart(&self, center: Option<Vec2>) {
        let shared = &self.shared;
        let scene = {
            let mut rng = shared.rng.lock();
            let at = center.unwrap_or_else(|| shared.config.blast_center());
            build_scene(&shared.config, &shared.sizes, &shared.atlas, &mut rng, at)
        };

        let mut timeline = shared.timeline.lock();
        timeline.center_override = center;
        let epoch = shared.scene.publish(scene);
        shared.pending_nanos.store(0, Ordering::Release);
        self.begin_cycle(&mut timeline, epoch);
        timeline.phase = Phase::Running;
        timeline.cycle = 0;
        shared.running.store(true, Ordering::Release);
        drop(timeline);

        log::debug!("blast restarted");
        shared.events.emit(AnimationEvent::Started);
    }

    fn pause(&self) {
        let shared = &self.shared;
        let mut timeline = shared.timeline.lock();
        if timeline.phase != Phase::Running {
            return;
        }
        timeline.phase = Phase::Paused;
        shared.running.store(false, Ordering::Release);
        log::debug!("blast paused");
    }

    fn resume(&self) {
        let shared = &self.shared;
        let mut timeline = shared.timeline.lock();
        if timeline.phase != Phase::Paused {
            return;
        }
        shared.pending_nanos.store(0, Ordering::Release);
        timeline.phase = Phase::Running;
        shared.running.store(true, Ordering::Release);
        log::debug!(
            "blast resumed at blast {:.3}, fall {:.3}",
            shared.blast_progress.load(),
            shared.fall_progress.load()
        );
    }

    fn reset(&self) {
        let shared = &self.shared;
        let mut timeline = shared.timeline.lock();
        if timeline.phase == Phase::Idle {
            return;
        }
        timeline.blast = None;
        timeline.fall = None;
        timeline.phase = Phase::Idle;
        shared.running.store(false, Ordering::Release);
        shared.blast_progress.store(timeline.epoch, 0.0);
        shared.fall_progress.store(timeline.epoch, 0.0);
        log::debug!("blast reset");
    }

    fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }
}

impl FrameSource for BlastController {
    fn tick(&self, dt: Duration) {
        let shared = &self.shared;

        // Never wait on a control call; its time is applied next frame.
        let Some(mut timeline) = shared.timeline.try_lock() else {
            shared
                .pending_nanos
                .fetch_add(dt.as_nanos() as u64, Ordering::AcqRel);
            return;
        };
        let dt = dt + Duration::from_nanos(shared.pending_nanos.swap(0, Ordering::AcqRel));
        if timeline.phase != Phase::Running {
            return;
        }
        if let Some(leftover) = self.advance(&mut timeline, dt) {
            self.finish_cycle(&mut timeline, leftover);
        }
    }

    fn write_frame(&self, batch: &mut FrameBatch) {
        let (blast_epoch, blast) = self.shared.blast_progress.load_stamped();
        let (fall_epoch, fall) = self.shared.fall_progress.load_stamped();
        let (scene_epoch, scene) = self.shared.scene.load_stamped();
        // Progress from an older cycle: the new scene starts at its beginning.
        let (blast, fall) = if blast_epoch == scene_epoch && fall_epoch == scene_epoch {
            (blast, fall)
        } else {
            (0.0, 0.0)
        };

        let start = batch.len();
        scene.extend_transforms(blast, fall, &mut batch.transforms);
        assemble_sprites(
            &self.shared.atlas,
            scene.particles.iter().map(|p| (p.color_index, p.size_index)),
            &mut batch.sources,
        );
        batch.push_run(start, scene.opacity(fall));
    }

    fn atlas(&self) -> Arc<Atlas> {
        Arc::clone(&self.shared.atlas)
    }
}
