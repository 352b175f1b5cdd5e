//! # Canvas Session Simulation
//!
//! Headless puzzle session on a simulated clock:
//!
//! Drag each piece from the tray to its cell → snap → particle burst →
//! board cell fills. Bursts overlap, the frame budget breaks, quality steps
//! down, and the session recovers.
//!
//! Usage: `canvas_sim [render.toml]`

use std::time::Duration;

use mosaic::{
    BoardLayer, CanvasLoop, CostModel, EffectsLayer, InputRouter, PiecesLayer, PointerEvent,
    SimulatedWork, TickPacer,
};
use mosaic_rendering::{
    Clock, ConfigResult, CoordinateSystemConfig, DebugOverlay, ManualClock, RenderConfig,
    RenderCoordinator,
};
use mosaic_shared::{GridPoint, RenderLayerType, Size};

const GRID_COLS: u32 = 8;
const GRID_ROWS: u32 = 6;
const SESSION: Duration = Duration::from_secs(30);
/// Loop iterations spent on one piece: press, 8 moves, release, 2 idle.
const TICKS_PER_PIECE: u64 = 12;
const DRAG_STEPS: u64 = 8;

fn main() -> ConfigResult<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => RenderConfig::from_toml_file(path)?,
        None => RenderConfig::default(),
    };

    let clock = ManualClock::new();
    let coords = CoordinateSystemConfig::new(
        Size::new(1280.0, 800.0),
        Size::new(960.0, 720.0),
        GRID_COLS,
        GRID_ROWS,
    )?
    .with_device_pixel_ratio(2.0)?;

    let us = Duration::from_micros;
    let pieces = GRID_COLS * GRID_ROWS;
    let coordinator = RenderCoordinator::builder(coords)
        .config(config)
        .clock(clock.clone())
        .layer(
            RenderLayerType::Static,
            BoardLayer::new(
                SimulatedWork::new(clock.clone(), CostModel::new(us(200), us(20))),
                GRID_COLS,
                GRID_ROWS,
            ),
        )
        .layer(
            RenderLayerType::Dynamic,
            PiecesLayer::new(
                SimulatedWork::new(clock.clone(), CostModel::new(us(300), us(60))),
                pieces,
            ),
        )
        .layer(
            RenderLayerType::Effects,
            EffectsLayer::new(SimulatedWork::new(
                clock.clone(),
                CostModel::new(us(100), us(25)),
            )),
        )
        .build()?;

    let mut canvas = CanvasLoop::new(coordinator, clock.clone(), TickPacer::from_fps(60));
    let mut router = InputRouter::new();
    let mut zoomed = false;

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                  MOSAIC CANVAS SIMULATION                        ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!(
        "  {GRID_COLS}x{GRID_ROWS} grid, {pieces} pieces, {:.0}s simulated",
        SESSION.as_secs_f64()
    );
    println!();

    let mut step: u64 = 0;
    while clock.now() < SESSION {
        let piece = step / TICKS_PER_PIECE;
        if piece < u64::from(pieces) {
            if let Some(event) = scripted_event(canvas.coordinator(), piece, step % TICKS_PER_PIECE)
            {
                router.route(canvas.coordinator_mut(), event);
            }
        } else if !zoomed {
            // Puzzle done: zoom in on the finished board.
            zoomed = true;
            let closer = canvas.coordinator().coordinates().config().with_zoom(1.25)?;
            canvas.coordinator_mut().set_coordinate_config(closer);
        }

        canvas.pump();
        clock.advance(canvas.until_next());
        step += 1;
    }

    let snapshot = canvas.coordinator().performance_snapshot();
    canvas.shutdown();

    canvas.stats().print_summary();
    println!();
    println!("┌─ INPUT ────────────────────────────────────────────────────────┐");
    println!("│ Pieces Snapped:     {}", router.snaps());
    println!("│ Events Discarded:   {}", router.discarded());
    println!("│ Ticks Skipped:      {}", canvas.pacer().skipped());
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();
    println!("┌─ OVERLAY ──────────────────────────────────────────────────────┐");
    for line in DebugOverlay::new(true).lines(&snapshot) {
        println!("│ {line}");
    }
    println!("└──────────────────────────────────────────────────────────────────┘");

    Ok(())
}

/// Pointer event for `offset` within piece `piece`'s slot, in device pixels.
fn scripted_event(coordinator: &RenderCoordinator, piece: u64, offset: u64) -> Option<PointerEvent> {
    let coords = coordinator.coordinates();
    let cols = u64::from(GRID_COLS);
    let to_i32 = |v: u64| i32::try_from(v).unwrap_or(i32::MAX);

    // Tray: pieces are picked up along the bottom row.
    let tray = GridPoint::new(to_i32((piece * 3) % cols), to_i32(u64::from(GRID_ROWS) - 1));
    let from = coords.grid_to_screen(tray);
    let to = coords.grid_to_screen(GridPoint::new(to_i32(piece % cols), to_i32(piece / cols)));

    #[allow(clippy::cast_precision_loss)]
    let lerp = |t: u64| {
        let t = t as f64 / DRAG_STEPS as f64;
        (from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t)
    };

    match offset {
        0 => Some(PointerEvent::down(from.x, from.y)),
        1..=DRAG_STEPS => {
            let (x, y) = lerp(offset);
            Some(PointerEvent::moved(x, y))
        }
        o if o == DRAG_STEPS + 1 => Some(PointerEvent::up(to.x, to.y)),
        _ => None,
    }
}
