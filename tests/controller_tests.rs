//! Integration tests for the animation controllers.
//!
//! These drive controllers the way an application does: control calls on one
//! side, `tick` / `write_frame` on the other, events drained from the channel.

use flurry::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const FRAME: Duration = Duration::from_millis(16);

fn fall_config() -> ConfettiConfig {
    ConfettiConfig::new()
        .with_count(60)
        .with_container(240.0, 480.0)
        .with_fall_duration(Duration::from_millis(1000))
        .with_autoplay(false)
        .with_infinite(false)
        .with_seed(21)
}

fn cannon_config() -> ConfettiConfig {
    fall_config()
        .with_blast_duration(Duration::from_millis(200))
        .with_cannons(vec![Vec2::new(-20.0, 480.0), Vec2::new(260.0, 480.0)])
}

fn blast_config() -> BlastConfig {
    BlastConfig::new()
        .with_count(80)
        .with_container(240.0, 480.0)
        .with_blast_duration(Duration::from_millis(300))
        .with_fall_duration(Duration::from_millis(1000))
        .with_seed(21)
}

fn frame(source: &dyn FrameSource) -> FrameBatch {
    let mut batch = FrameBatch::new();
    source.write_frame(&mut batch);
    batch
}

// ============================================================================
// Playback controls
// ============================================================================

#[test]
fn test_pause_freezes_frame() {
    let confetti = ConfettiController::new(fall_config()).unwrap();
    confetti.restart(None);
    confetti.tick(Duration::from_millis(300));
    confetti.pause();

    let progress = confetti.progress();
    let before = frame(&confetti);
    confetti.tick(Duration::from_millis(400));
    let after = frame(&confetti);

    assert_eq!(confetti.progress(), progress);
    assert_eq!(before.transforms, after.transforms);
    assert!(!confetti.is_running());
}

#[test]
fn test_resume_continues_from_pause_point() {
    let confetti = ConfettiController::new(cannon_config()).unwrap();
    confetti.restart(None);
    confetti.tick(Duration::from_millis(100));
    confetti.pause();
    let paused_at = confetti.progress();
    let paused_frame = frame(&confetti);

    confetti.resume();
    assert!(confetti.is_running());
    assert_eq!(confetti.progress(), paused_at);
    assert_eq!(frame(&confetti).transforms, paused_frame.transforms);

    confetti.tick(FRAME);
    assert!(confetti.progress() > paused_at);
}

#[test]
fn test_resume_finishes_in_remaining_time() {
    let confetti = ConfettiController::new(fall_config().with_easing(Easing::Linear)).unwrap();
    confetti.restart(None);
    confetti.tick(Duration::from_millis(600));
    confetti.pause();
    confetti.resume();

    confetti.tick(Duration::from_millis(380));
    assert!(confetti.is_running());
    confetti.tick(Duration::from_millis(40));
    assert!(!confetti.is_running());
    assert_eq!(confetti.progress(), 2.0);
}

#[test]
fn test_autoplay_delay_survives_pause_resume() {
    let confetti = ConfettiController::new(
        fall_config()
            .with_autoplay(true)
            .with_auto_start_delay(Duration::from_millis(500)),
    )
    .unwrap();
    confetti.tick(Duration::from_millis(100));
    confetti.pause();
    confetti.resume();
    confetti.tick(Duration::from_millis(100));
    assert_eq!(confetti.progress(), 1.0);

    // 300ms of delay still to wait out.
    confetti.tick(Duration::from_millis(290));
    assert_eq!(confetti.progress(), 1.0);
    confetti.tick(Duration::from_millis(20));
    assert!(confetti.progress() > 1.0);
}

#[test]
fn test_progress_is_monotonic() {
    let confetti = ConfettiController::new(cannon_config()).unwrap();
    confetti.restart(None);
    let mut last = confetti.progress();
    assert_eq!(last, 0.0);
    while confetti.is_running() {
        confetti.tick(FRAME);
        let progress = confetti.progress();
        assert!(progress >= last, "{progress} < {last}");
        assert!(progress <= 2.0);
        last = progress;
    }
    assert_eq!(last, 2.0);
}

#[test]
fn test_restart_regenerates_flakes() {
    let confetti = ConfettiController::new(fall_config()).unwrap();
    let first = confetti.scene();
    confetti.restart(None);
    let second = confetti.scene();
    confetti.restart(None);
    let third = confetti.scene();

    assert_ne!(first.particles, second.particles);
    assert_ne!(second.particles, third.particles);
    assert_eq!(first.len(), third.len());
}

#[test]
fn test_reset_keeps_flakes() {
    let confetti = ConfettiController::new(cannon_config()).unwrap();
    confetti.restart(None);
    let scene = confetti.scene();
    confetti.tick(Duration::from_millis(500));
    confetti.reset();

    assert_eq!(confetti.progress(), 0.0);
    assert!(!confetti.is_running());
    assert!(Arc::ptr_eq(&scene, &confetti.scene()));

    // Ticking an idle controller does nothing.
    confetti.tick(Duration::from_millis(500));
    assert_eq!(confetti.progress(), 0.0);
}

#[test]
fn test_same_seed_same_flakes() {
    let a = ConfettiController::new(fall_config()).unwrap();
    let b = ConfettiController::new(fall_config()).unwrap();
    assert_eq!(a.scene().particles, b.scene().particles);
    assert_eq!(a.sizes(), b.sizes());
}

// ============================================================================
// Events
// ============================================================================

#[test]
fn test_finite_run_events() {
    let confetti = ConfettiController::new(cannon_config()).unwrap();
    let events = confetti.events();
    confetti.restart(None);
    for _ in 0..100 {
        confetti.tick(FRAME);
    }
    let drained: Vec<_> = events.try_iter().collect();
    assert_eq!(
        drained,
        vec![AnimationEvent::Started, AnimationEvent::Ended { cycle: 1 }]
    );
}

#[test]
fn test_infinite_run_counts_cycles() {
    let confetti = ConfettiController::new(fall_config().with_infinite(true)).unwrap();
    let events = confetti.events();
    confetti.restart(None);
    for _ in 0..3 {
        confetti.tick(Duration::from_millis(1000));
    }
    assert!(confetti.is_running());
    assert_eq!(confetti.cycles(), 3);
    let ends: Vec<_> = events
        .try_iter()
        .filter(|event| matches!(event, AnimationEvent::Ended { .. }))
        .collect();
    assert_eq!(
        ends,
        vec![
            AnimationEvent::Ended { cycle: 1 },
            AnimationEvent::Ended { cycle: 2 },
            AnimationEvent::Ended { cycle: 3 },
        ]
    );
}

#[test]
fn test_events_drained_on_another_thread() {
    let confetti = ConfettiController::new(fall_config()).unwrap();
    let events = confetti.events();
    let listener = thread::spawn(move || events.recv_timeout(Duration::from_secs(5)));
    confetti.restart(None);
    assert_eq!(listener.join().unwrap(), Ok(AnimationEvent::Started));
}

// ============================================================================
// Render pass on its own thread
// ============================================================================

#[test]
fn test_controls_while_rendering() {
    let confetti = ConfettiController::new(cannon_config().with_infinite(true)).unwrap();
    confetti.restart(None);

    let render = {
        let confetti = confetti.clone();
        thread::spawn(move || {
            let mut batch = FrameBatch::new();
            for _ in 0..400 {
                confetti.tick(Duration::from_millis(4));
                batch.clear();
                confetti.write_frame(&mut batch);
                let progress = confetti.progress();
                assert!((0.0..=2.0).contains(&progress));
                assert_eq!(batch.sources.len(), batch.transforms.len());
            }
        })
    };

    for i in 0..50 {
        match i % 4 {
            0 => confetti.pause(),
            1 => confetti.resume(),
            2 => confetti.restart(Some(vec![Vec2::new(120.0, 500.0)])),
            _ => confetti.reset(),
        }
        thread::sleep(Duration::from_millis(1));
    }
    render.join().unwrap();
}

#[test]
fn test_paused_controller_stays_put_under_ticks() {
    let confetti = ConfettiController::new(fall_config()).unwrap();
    confetti.restart(None);
    confetti.tick(Duration::from_millis(250));
    confetti.pause();
    let progress = confetti.progress();

    let render = {
        let confetti = confetti.clone();
        thread::spawn(move || {
            for _ in 0..100 {
                confetti.tick(FRAME);
            }
        })
    };
    render.join().unwrap();
    assert_eq!(confetti.progress(), progress);
}

// ============================================================================
// Blast and continuous variants
// ============================================================================

#[test]
fn test_blast_resume_uses_remaining_time() {
    let burst = BlastController::new(blast_config()).unwrap();
    burst.restart(None);
    burst.tick(Duration::from_millis(150));
    burst.pause();
    let blast = burst.blast_progress();
    assert!(blast > 0.0 && blast < 1.0);

    burst.resume();
    burst.tick(Duration::from_millis(160));
    assert_eq!(burst.blast_progress(), 1.0);
    assert!(burst.fall_progress() < 1.0);
    assert!(burst.is_running());
}

#[test]
fn test_blast_flakes_leave_center() {
    let burst = BlastController::new(blast_config()).unwrap();
    burst.restart(Some(Vec2::new(120.0, 100.0)));
    let scene = burst.scene();
    let start: Vec<_> = (0..scene.len()).map(|i| scene.translation(i, 0.0, 0.0)).collect();
    burst.tick(Duration::from_millis(300));
    let spread: f32 = (0..scene.len())
        .map(|i| scene.translation(i, burst.blast_progress(), 0.0).distance(start[i]))
        .sum::<f32>()
        / scene.len() as f32;
    assert!(spread > 20.0, "mean spread {spread}");
}

#[test]
fn test_blast_zero_count_is_empty() {
    let burst = BlastController::new(blast_config().with_count(0)).unwrap();
    burst.restart(None);
    burst.tick(FRAME);
    assert!(frame(&burst).is_empty());
}

#[test]
fn test_continuous_pause_resume_both_lanes() {
    let stream = ContinuousController::new(fall_config()).unwrap();
    stream.restart(None);
    stream.tick(Duration::from_millis(700));
    stream.pause();
    assert!(!stream.is_running());
    assert!(stream.lanes().iter().all(|lane| !lane.is_running()));

    stream.resume();
    assert!(stream.lanes().iter().all(|lane| lane.is_running()));
    stream.reset();
    assert!(!stream.is_running());
}

#[test]
fn test_continuous_lanes_keep_phase_after_pause_resume() {
    let stream = ContinuousController::new(fall_config()).unwrap();
    stream.restart(None);
    stream.tick(Duration::from_millis(250));
    stream.pause();
    stream.resume();
    stream.tick(Duration::from_millis(250));

    let [first, second] = stream.lanes();
    assert!((first.progress() - 1.5).abs() < 1e-3, "{}", first.progress());
    assert_eq!(second.progress(), 1.0);

    stream.tick(Duration::from_millis(250));
    assert!((second.progress() - 1.25).abs() < 1e-3, "{}", second.progress());
}

#[test]
fn test_continuous_lanes_stay_half_a_cycle_apart() {
    let stream = ContinuousController::new(fall_config()).unwrap();
    stream.restart(None);
    // 3.2s of uneven frames spans several loops of both lanes.
    for _ in 0..200 {
        stream.tick(FRAME);
    }
    let [first, second] = stream.lanes();
    assert_eq!(first.cycles(), 3);
    assert_eq!(second.cycles(), 2);
    assert!((first.progress() - 1.2).abs() < 1e-2, "{}", first.progress());
    assert!((second.progress() - 1.7).abs() < 1e-2, "{}", second.progress());
}

// ============================================================================
// End to end
// ============================================================================

#[test]
fn test_config_file_to_frames() {
    let config = ConfettiConfig::from_json_str(
        r##"{
            "count": 40,
            "container": [200.0, 400.0],
            "colors": ["#FF0000", "#0000FF"],
            "fall_duration": 2000,
            "autoplay": false,
            "is_infinite": false,
            "seed": 5
        }"##,
    )
    .unwrap();
    let confetti = ConfettiController::new(config).unwrap();
    confetti.restart(None);
    assert_eq!(confetti.atlas().color_rows(), 2);

    let atlas = confetti.atlas();
    let mut renderer = SoftwareRenderer::new(200, 400);
    let mut batch = FrameBatch::new();
    let mut most_covered = 0;
    for _ in 0..20 {
        confetti.tick(Duration::from_millis(100));
        batch.clear();
        confetti.write_frame(&mut batch);
        renderer.clear();
        renderer.draw_batch(&atlas, &batch);
        let covered = renderer.image().pixels().filter(|p| p.0[3] > 0).count();
        most_covered = most_covered.max(covered);
    }
    assert!(most_covered > 100, "only {most_covered} pixels drawn");
}
