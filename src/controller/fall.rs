//! Controller for the fall / cannon variant.

use super::{build_atlas, radius_range, Controls, FrameSource, Phase, BLAST_DONE, FALL_DONE};
use crate::config::ConfettiConfig;
use crate::error::ConfettiError;
use crate::events::{AnimationEvent, EventBridge};
use crate::layout::GridLayout;
use crate::motion::fall::{FallScene, END_PROGRESS, FALL_START};
use crate::particles::{FallParticle, ParticleRanges};
use crate::progress::{AtomicProgress, SnapshotCell};
use crate::sizes::{fall_size_table, SizeVariant, SIZE_STEPS};
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

/// How one timeline is wired into a larger animation.
#[derive(Debug, Clone)]
pub(crate) struct LaneOptions {
    /// Separates this lane's random stream from its siblings.
    pub salt: u64,
    /// Extra delay before every run.
    pub stagger: Duration,
    /// Emit [`AnimationEvent::Started`] on restart.
    pub announce_start: bool,
    pub events: EventBridge,
}

impl Default for LaneOptions {
    fn default() -> Self {
        Self {
            salt: 0,
            stagger: Duration::ZERO,
            announce_start: true,
            events: EventBridge::new(),
        }
    }
}

/// Mutable timeline state, only touched under the lock.
struct Timeline {
    phase: Phase,
    /// Running or paused tween. Pausing keeps it so resume continues any
    /// start delay or stagger it was still waiting out.
    tween: Option<Tween>,
    /// Cannon positions from the latest restart.
    cannons_override: Option<Vec<Vec2>>,
    /// Epoch of the published scene.
    epoch: u32,
    cycle: u64,
}

struct Shared {
    config: ConfettiConfig,
    sizes: Arc<[SizeVariant]>,
    atlas: Arc<Atlas>,
    progress: AtomicProgress,
    /// Frame time banked while the timeline was locked by a control call.
    pending_nanos: AtomicU64,
    running: AtomicBool,
    scene: SnapshotCell<FallScene>,
    rng: Mutex<SpawnContext>,
    timeline: Mutex<Timeline>,
    lane: LaneOptions,
}

/// Fall / cannon confetti.
///
/// Progress runs `0 → 1` (blast, only with cannons) then `1 → 2` (fall).
///
/// ```ignore
/// let confetti = ConfettiController::new(
///     ConfettiConfig::new()
///         .with_container(390.0, 844.0)
///         .with_cannons(vec![Vec2::new(-30.0, 844.0), Vec2::new(420.0, 844.0)])
///         .with_autoplay(false),
/// )?;
///
/// confetti.restart(None);
/// // Render pass:
/// confetti.tick(dt);
/// confetti.write_frame(&mut batch);
/// ```
#[derive(Clone)]
pub struct ConfettiController {
    shared: Arc<Shared>,
}

impl ConfettiController {
    /// Build sizes and atlas with the CPU rasterizer. Autoplays when the
    /// config asks for it.
    pub fn new(config: ConfettiConfig) -> Result<Self, ConfettiError> {
        Self::with_builder(config, &RasterTextureBuilder)
    }

    /// Like [`new`](Self::new) with a custom atlas builder.
    pub fn with_builder<B>(config: ConfettiConfig, builder: &B) -> Result<Self, ConfettiError>
    where
        B: TextureBuilder + ?Sized,
    {
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
        Ok(Self::from_parts(config, sizes, atlas, LaneOptions::default()))
    }

    /// Assemble a timeline over prebuilt sizes and atlas.
    pub(crate) fn from_parts(
        config: ConfettiConfig,
        sizes: Arc<[SizeVariant]>,
        atlas: Arc<Atlas>,
        lane: LaneOptions,
    ) -> Self {
        if config.flakes.count == 0 {
            log::warn!("confetti configured with zero flakes");
        }

        let mut rng = SpawnContext::new(config.flakes.seed, lane.salt);
        let autoplay_delay = config.auto_start_delay + lane.stagger;
        let autoplay = config.autoplay;

        let scene = build_scene(&config, &sizes, &atlas, &mut rng, config.cannons_positions.clone());
        let shared = Arc::new(Shared {
            progress: AtomicProgress::new(0, scene.initial_progress()),
            pending_nanos: AtomicU64::new(0),
            running: AtomicBool::new(false),
            scene: SnapshotCell::new(scene),
            rng: Mutex::new(rng),
            timeline: Mutex::new(Timeline {
                phase: Phase::Idle,
                tween: None,
                cannons_override: None,
                epoch: 0,
                cycle: 0,
            }),
            config,
            sizes,
            atlas,
            lane,
        });

        let controller = Self { shared };
        if autoplay {
            controller.start(None, autoplay_delay);
        }
        controller
    }

    pub fn config(&self) -> &ConfettiConfig {
        &self.shared.config
    }

    pub fn sizes(&self) -> &Arc<[SizeVariant]> {
        &self.shared.sizes
    }

    /// Current progress in `[0, 2]`.
    pub fn progress(&self) -> f32 {
        self.shared.progress.load()
    }

    /// Scene the next frame will draw.
    pub fn scene(&self) -> Arc<FallScene> {
        self.shared.scene.load()
    }

    /// Receiver for start / end notifications.
    pub fn events(&self) -> Receiver<AnimationEvent> {
        self.shared.lane.events.receiver()
    }

    /// Finished cycles since the last restart.
    pub fn cycles(&self) -> u64 {
        self.shared.timeline.lock().cycle
    }

    fn start(&self, cannons: Option<Vec<Vec2>>, delay: Duration) {
        let shared = &self.shared;

        // Particles are generated before the timeline is locked so the render
        // pass never waits on them.
        let effective = cannons
            .clone()
            .unwrap_or_else(|| shared.config.cannons_positions.clone());
        let scene = {
            let mut rng = shared.rng.lock();
            build_scene(&shared.config, &shared.sizes, &shared.atlas, &mut rng, effective)
        };
        let initial = scene.initial_progress();
        let animation = cycle_animation(&shared.config, scene.has_cannons());
        let animation = if delay > Duration::ZERO {
            Animation::delay(delay, animation)
        } else {
            animation
        };

        let mut timeline = shared.timeline.lock();
        timeline.cannons_override = cannons;
        timeline.epoch = shared.scene.publish(scene);
        shared.progress.store(timeline.epoch, initial);
        shared.pending_nanos.store(0, Ordering::Release);
        timeline.tween = Some(Tween::new(initial, animation));
        timeline.phase = Phase::Running;
        timeline.cycle = 0;
        shared.running.store(true, Ordering::Release);
        drop(timeline);

        log::debug!("confetti restarted (lane {}, delay {:?})", shared.lane.salt, delay);
        if shared.lane.announce_start {
            shared.lane.events.emit(AnimationEvent::Started);
        }
    }

    /// Handle a tween that played to the end. `leftover` is the part of the
    /// frame time past the end, carried into the next cycle.
    fn finish_cycle(&self, timeline: &mut Timeline, leftover: Duration) {
        let shared = &self.shared;
        timeline.cycle += 1;
        shared.lane.events.emit(AnimationEvent::Ended {
            cycle: timeline.cycle,
        });

        if !shared.config.is_infinite() {
            timeline.tween = None;
            timeline.phase = Phase::Finished;
            shared.running.store(false, Ordering::Release);
            log::debug!("confetti finished after {} cycle(s)", timeline.cycle);
            return;
        }

        // A restart holding the random stream is about to replace this cycle
        // anyway; keep the current flakes rather than wait for it.
        let has_cannons = match shared.rng.try_lock() {
            Some(mut rng) => {
                let cannons = timeline
                    .cannons_override
                    .clone()
                    .unwrap_or_else(|| shared.config.cannons_positions.clone());
                let scene = build_scene(&shared.config, &shared.sizes, &shared.atlas, &mut rng, cannons);
                let has_cannons = scene.has_cannons();
                timeline.epoch = shared.scene.publish(scene);
                has_cannons
            }
            None => shared.scene.load().has_cannons(),
        };
        let initial = if has_cannons { 0.0 } else { FALL_START };
        let mut tween = Tween::new(initial, cycle_animation(&shared.config, has_cannons));
        let value = tween.advance(leftover).value;
        shared.progress.store(timeline.epoch, value);
        timeline.tween = Some(tween);
        log::debug!("confetti cycle {} done, looping", timeline.cycle);
    }
}

/// Fresh particles plus a layout for `cannons`.
fn build_scene(
    config: &ConfettiConfig,
    sizes: &Arc<[SizeVariant]>,
    atlas: &Atlas,
    rng: &mut SpawnContext,
    cannons: Vec<Vec2>,
) -> FallScene {
    let container = config.flakes.container_size();
    let layout = GridLayout::new(
        config.flakes.count,
        container,
        config.flakes.flake_size,
        config.vertical_spacing,
        !cannons.is_empty(),
    );
    let ranges = ParticleRanges {
        count: layout.count,
        color_count: atlas.color_rows(),
        size_count: sizes.len(),
        rotation: config.rotation_ranges(),
        speed: config.speed_range(),
        offset: config.offset_ranges(),
    };
    let particles = FallParticle::generate(rng, &ranges, config.flakes.fall_duration);
    FallScene::new(
        particles,
        layout,
        cannons,
        Arc::clone(sizes),
        container,
        config.flakes.fade_out_on_end,
    )
}

/// Blast (with cannons) then fall.
fn cycle_animation(config: &ConfettiConfig, has_cannons: bool) -> Animation {
    let easing = config.flakes.easing();
    let fall = Animation::timing(END_PROGRESS, config.flakes.fall_duration, easing).with_tag(FALL_DONE);
    if has_cannons {
        Animation::sequence(vec![
            Animation::timing(FALL_START, config.flakes.blast_duration, easing).with_tag(BLAST_DONE),
            fall,
        ])
    } else {
        fall
    }
}

impl Controls for ConfettiController {
    type Overrides = Vec<Vec2>;

    fn restart(&self, cannons: Option<Vec<Vec2>>) {
        self.start(cannons, self.shared.lane.stagger);
    }

    fn pause(&self) {
        let shared = &self.shared;
        let mut timeline = shared.timeline.lock();
        if timeline.phase != Phase::Running {
            return;
        }
        timeline.phase = Phase::Paused;
        shared.running.store(false, Ordering::Release);
        log::debug!("confetti paused at {:.3}", shared.progress.load());
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
        log::debug!("confetti resumed at {:.3}", shared.progress.load());
    }

    fn reset(&self) {
        let shared = &self.shared;
        let mut timeline = shared.timeline.lock();
        if timeline.phase == Phase::Idle {
            return;
        }
        timeline.tween = None;
        timeline.phase = Phase::Idle;
        shared.running.store(false, Ordering::Release);
        shared
            .progress
            .store(timeline.epoch, shared.scene.load().initial_progress());
        log::debug!("confetti reset");
    }

    fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }
}

impl FrameSource for ConfettiController {
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
        let Some(tween) = timeline.tween.as_mut() else {
            return;
        };

        let step = tween.advance(dt);
        shared.progress.store(timeline.epoch, step.value);
        if step.completed.contains(&BLAST_DONE) {
            log::trace!("blast phase complete");
        }
        if step.finished {
            self.finish_cycle(&mut timeline, step.leftover);
        }
    }

    fn write_frame(&self, batch: &mut FrameBatch) {
        let (progress_epoch, progress) = self.shared.progress.load_stamped();
        let (scene_epoch, scene) = self.shared.scene.load_stamped();
        // Progress from an older cycle: the new scene starts at its beginning.
        let progress = if progress_epoch == scene_epoch {
            progress
        } else {
            scene.initial_progress()
        };

        let start = batch.len();
        scene.extend_transforms(progress, &mut batch.transforms);
        assemble_sprites(
            &self.shared.atlas,
            scene.particles[..scene.len()]
                .iter()
                .map(|p| (p.color_index, p.size_index)),
            &mut batch.sources,
        );
        batch.push_run(start, scene.opacity(progress));
    }

    fn atlas(&self) -> Arc<Atlas> {
        Arc::clone(&self.shared.atlas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConfettiConfig {
        ConfettiConfig::new()
            .with_count(50)
            .with_container(390.0, 844.0)
            .with_fall_duration(Duration::from_millis(1000))
            .with_blast_duration(Duration::from_millis(200))
            .with_autoplay(false)
            .with_infinite(false)
            .with_seed(7)
    }

    #[test]
    fn test_idle_until_restart() {
        let confetti = ConfettiController::new(config()).unwrap();
        assert!(!confetti.is_running());
        assert_eq!(confetti.progress(), 1.0);
        confetti.tick(Duration::from_millis(100));
        assert_eq!(confetti.progress(), 1.0);
    }

    #[test]
    fn test_plain_fall_runs_to_end() {
        let confetti = ConfettiController::new(config()).unwrap();
        let events = confetti.events();
        confetti.restart(None);
        assert_eq!(events.try_recv().unwrap(), AnimationEvent::Started);

        for _ in 0..70 {
            confetti.tick(Duration::from_millis(16));
        }
        assert_eq!(confetti.progress(), 2.0);
        assert!(!confetti.is_running());
        assert_eq!(events.try_recv().unwrap(), AnimationEvent::Ended { cycle: 1 });
    }

    #[test]
    fn test_cannons_start_at_zero() {
        let confetti =
            ConfettiController::new(config().with_cannons(vec![Vec2::new(-30.0, 844.0)])).unwrap();
        assert_eq!(confetti.progress(), 0.0);
        confetti.restart(None);
        confetti.tick(Duration::from_millis(200));
        assert_eq!(confetti.progress(), 1.0);
    }

    #[test]
    fn test_override_replaces_and_clears() {
        let confetti = ConfettiController::new(config()).unwrap();
        let cannon = Vec2::new(200.0, 900.0);
        confetti.restart(Some(vec![cannon]));
        assert_eq!(confetti.scene().cannons, vec![cannon]);
        assert_eq!(confetti.progress(), 0.0);

        confetti.restart(None);
        assert!(confetti.scene().cannons.is_empty());
        assert_eq!(confetti.progress(), 1.0);
    }

    #[test]
    fn test_invalid_calls_are_ignored() {
        let confetti = ConfettiController::new(config()).unwrap();
        confetti.pause();
        confetti.resume();
        confetti.reset();
        assert!(!confetti.is_running());
        assert!(confetti.events().try_recv().is_err());

        confetti.restart(None);
        confetti.resume();
        assert!(confetti.is_running());
    }

    #[test]
    fn test_autoplay_with_delay() {
        let confetti = ConfettiController::new(
            config()
                .with_autoplay(true)
                .with_auto_start_delay(Duration::from_millis(100)),
        )
        .unwrap();
        assert!(confetti.is_running());
        confetti.tick(Duration::from_millis(90));
        assert_eq!(confetti.progress(), 1.0);
        confetti.tick(Duration::from_millis(110));
        assert!(confetti.progress() > 1.0);
    }

    #[test]
    fn test_pause_inside_start_delay_keeps_waiting() {
        let confetti = ConfettiController::new(
            config()
                .with_autoplay(true)
                .with_auto_start_delay(Duration::from_millis(500)),
        )
        .unwrap();
        confetti.tick(Duration::from_millis(100));
        confetti.pause();
        confetti.tick(Duration::from_millis(1000));
        confetti.resume();
        confetti.tick(Duration::from_millis(100));
        assert_eq!(confetti.progress(), 1.0);

        confetti.tick(Duration::from_millis(350));
        assert!(confetti.progress() > 1.0);
    }

    #[test]
    fn test_loop_carries_leftover_time() {
        let confetti = ConfettiController::new(
            config()
                .with_infinite(true)
                .with_easing(crate::easing::Easing::Linear),
        )
        .unwrap();
        confetti.restart(None);
        confetti.tick(Duration::from_millis(900));
        confetti.tick(Duration::from_millis(350));
        assert_eq!(confetti.cycles(), 1);
        // 250ms into the second cycle.
        assert!((confetti.progress() - 1.25).abs() < 1e-3, "{}", confetti.progress());
    }

    #[test]
    fn test_frame_pairs_progress_with_its_scene() {
        let confetti = ConfettiController::new(config()).unwrap();
        confetti.restart(None);
        confetti.tick(Duration::from_millis(500));

        // Stale progress from the previous cycle is ignored by the frame.
        let shared = &confetti.shared;
        let epoch = shared.scene.publish(confetti.scene().as_ref().clone());
        assert_ne!(shared.progress.load_stamped().0, epoch);

        let mut batch = FrameBatch::new();
        confetti.write_frame(&mut batch);
        let mut expected = Vec::new();
        confetti.scene().extend_transforms(FALL_START, &mut expected);
        assert_eq!(batch.transforms, expected);
    }

    #[test]
    fn test_tick_during_control_call_is_banked() {
        let confetti = ConfettiController::new(config().with_easing(crate::easing::Easing::Linear)).unwrap();
        confetti.restart(None);
        {
            let _held = confetti.shared.timeline.lock();
            confetti.tick(Duration::from_millis(100));
        }
        assert_eq!(confetti.progress(), 1.0);
        confetti.tick(Duration::from_millis(100));
        assert!((confetti.progress() - 1.2).abs() < 1e-3);
    }

    #[test]
    fn test_zero_count_draws_nothing() {
        let confetti = ConfettiController::new(config().with_count(0)).unwrap();
        confetti.restart(None);
        let mut batch = FrameBatch::new();
        confetti.write_frame(&mut batch);
        assert!(batch.is_empty());
    }
}
