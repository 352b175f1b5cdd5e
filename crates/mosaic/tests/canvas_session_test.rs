//! # Canvas Session Integration Test
//!
//! Full host stack on a manual clock: CanvasLoop + InputRouter + the three
//! simulated layers, observed through a recording metrics sink.

use std::time::Duration;

use mosaic::layers::BURST_FRAMES;
use mosaic::{
    BoardLayer, CanvasLoop, CostModel, EffectsLayer, InputRouter, PiecesLayer, PointerEvent,
    SimulatedWork, TickPacer,
};
use mosaic_rendering::{
    ChangeReason, Clock, CoordinateSystemConfig, ManualClock, QualityThresholds,
    RecordingMetricsSink, RenderConfig, RenderCoordinator,
};
use mosaic_shared::{
    CanvasPoint, GridPoint, LayerMessage, LayerSet, MessageKind, MessageOrigin, MessagePayload,
    QualityLevel, RenderLayerType as L, Size,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const COLS: u32 = 8;
const ROWS: u32 = 6;

struct Session {
    canvas: CanvasLoop<ManualClock>,
    clock: ManualClock,
    sink: RecordingMetricsSink,
    router: InputRouter,
}

impl Session {
    fn new(config: RenderConfig, effects_per_particle: Duration) -> Self {
        let clock = ManualClock::new();
        let sink = RecordingMetricsSink::new();
        let us = Duration::from_micros;
        let coords =
            CoordinateSystemConfig::new(Size::new(800.0, 600.0), Size::new(400.0, 300.0), COLS, ROWS)
                .unwrap();
        let coordinator = RenderCoordinator::builder(coords)
            .config(config)
            .clock(clock.clone())
            .metrics_sink(sink.clone())
            .layer(
                L::Static,
                BoardLayer::new(SimulatedWork::new(clock.clone(), CostModel::new(us(50), us(1))), COLS, ROWS),
            )
            .layer(
                L::Dynamic,
                PiecesLayer::new(SimulatedWork::new(clock.clone(), CostModel::new(us(50), us(1))), COLS * ROWS),
            )
            .layer(
                L::Effects,
                EffectsLayer::new(SimulatedWork::new(
                    clock.clone(),
                    CostModel::new(us(50), effects_per_particle),
                )),
            )
            .build()
            .unwrap();
        Self {
            canvas: CanvasLoop::new(coordinator, clock.clone(), TickPacer::from_fps(60)),
            clock,
            sink,
            router: InputRouter::new(),
        }
    }

    /// One loop iteration: exactly one tick, then sleep until the next.
    fn step(&mut self) {
        self.canvas.pump();
        self.clock.advance(self.canvas.until_next());
    }

    fn route(&mut self, event: PointerEvent) {
        self.router.route(self.canvas.coordinator_mut(), event);
        self.step();
    }

    fn screen_of(&self, x: i32, y: i32) -> (f64, f64) {
        let p = self
            .canvas
            .coordinator()
            .coordinates()
            .grid_to_screen(GridPoint::new(x, y));
        (p.x, p.y)
    }

    fn renders_of(&self, layer: L) -> usize {
        self.sink
            .recorded()
            .layers
            .iter()
            .filter(|(l, _)| *l == layer)
            .count()
    }
}

/// Test: drag, drop, snap. The burst animates for exactly its lifetime and
/// then the session goes idle.
#[test]
fn test_drag_drop_snap_session() {
    let mut s = Session::new(RenderConfig::default(), Duration::from_micros(1));

    // Registration flags every layer: the first tick draws all three.
    s.step();
    assert_eq!(s.renders_of(L::Effects), 1);
    assert!(s.canvas.coordinator().layers_needing_update().is_empty());

    let (fx, fy) = s.screen_of(0, 5);
    let (tx, ty) = s.screen_of(2, 1);
    s.route(PointerEvent::down(fx, fy));
    for i in 1..=4 {
        let t = f64::from(i) / 4.0;
        s.route(PointerEvent::moved(fx + (tx - fx) * t, fy + (ty - fy) * t));
    }
    assert!(s.router.is_dragging());
    assert_eq!(s.renders_of(L::Effects), 1);

    s.route(PointerEvent::up(tx, ty));
    assert_eq!(s.router.snaps(), 1);

    for _ in 0..2 * BURST_FRAMES {
        s.step();
    }
    assert_eq!(s.renders_of(L::Effects), 1 + BURST_FRAMES as usize);
    assert!(s.canvas.coordinator().layers_needing_update().is_empty());
    assert!(s.renders_of(L::Static) >= 2);
    assert_eq!(s.canvas.coordinator().current_quality(), QualityLevel::High);

    let stats = s.canvas.stats();
    assert!(stats.idle_frames >= u64::from(BURST_FRAMES) - 1);
    assert_eq!(stats.frames_dropped, 0);
    println!(
        "session: {} frames, {} idle, {} layer renders",
        stats.frames_recorded, stats.idle_frames, stats.layers_rendered_sum
    );
}

/// Test: a particle storm degrades quality and never oscillates back.
#[test]
fn test_particle_storm_degrades_quality() {
    let config = RenderConfig {
        reporting_interval_ms: 100,
        quality: QualityThresholds {
            downgrade_after_samples: 3,
            downgrade_cooldown_ms: 0,
            ..QualityThresholds::default()
        },
        ..RenderConfig::default()
    };
    let mut s = Session::new(config, Duration::from_micros(100));
    let spawn = LayerMessage::directed(
        MessageKind::SpawnEffect,
        MessageOrigin::Host,
        L::Effects,
        MessagePayload::Canvas(CanvasPoint::new(200.0, 150.0)),
    );

    while s.clock.now() < Duration::from_secs(3) {
        s.canvas.coordinator_mut().send_message(spawn.clone());
        s.step();
    }

    let changes = s.sink.quality_changes();
    assert!(!changes.is_empty(), "no quality change under load");
    assert_eq!(changes[0].from, QualityLevel::High);
    assert_eq!(changes[0].to, QualityLevel::Medium);
    assert_eq!(changes[0].reason, ChangeReason::Degraded);
    assert!(changes.iter().all(|c| c.reason == ChangeReason::Degraded));
    assert!(s.canvas.coordinator().current_quality() < QualityLevel::High);
    assert_eq!(s.canvas.stats().quality_changes, changes);

    s.canvas.stats().print_summary();
}

/// Test: a random pointer storm with garbage coordinates never breaks the
/// session; only non-finite points are discarded.
#[test]
fn test_pointer_storm_is_survivable() {
    let mut s = Session::new(RenderConfig::default(), Duration::from_micros(1));
    let mut rng = StdRng::seed_from_u64(0x000A_11CE);
    let mut poisoned = 0;

    for _ in 0..2_000 {
        let (mut x, y) = (rng.gen_range(-200.0..1_000.0), rng.gen_range(-200.0..800.0));
        if rng.gen_bool(0.05) {
            x = f64::NAN;
            poisoned += 1;
        }
        let event = match rng.gen_range(0..3) {
            0 => PointerEvent::down(x, y),
            1 => PointerEvent::moved(x, y),
            _ => PointerEvent::up(x, y),
        };
        s.router.route(s.canvas.coordinator_mut(), event);
        if rng.gen_bool(0.3) {
            s.step();
        }
    }
    for _ in 0..2 * BURST_FRAMES {
        s.step();
    }

    assert_eq!(s.router.discarded(), poisoned);
    let snapshot = s.canvas.coordinator().performance_snapshot();
    assert_eq!(snapshot.pending_requests, 0);
    assert_eq!(snapshot.layer_count, 3);
    assert!(s.canvas.coordinator().layers_needing_update().is_empty());
}

/// Test: shutting down mid-session stops the loop for good.
#[test]
fn test_shutdown_mid_session() {
    let mut s = Session::new(RenderConfig::default(), Duration::from_micros(1));
    s.step();
    s.canvas
        .coordinator_mut()
        .schedule_frame(LayerSet::ALL, mosaic_rendering::Priority::Normal);
    s.canvas.shutdown();

    let before = s.canvas.stats().frames_recorded;
    let ticks = s.canvas.run_until(Duration::from_secs(1), |d| s.clock.advance(d));
    assert_eq!(ticks, 0);
    assert_eq!(s.canvas.stats().frames_recorded, before);
}
