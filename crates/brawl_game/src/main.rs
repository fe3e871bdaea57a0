use std::path::Path;

use brawl_core::{Key, ManagerConfig, ScenePayload};
use brawl_game::config::load_match_config_from_path;
use brawl_game::replay::{load_replay, ReplaySequence};
use brawl_game::scenes::{new_scene_manager, MatchPreviewPayload, MATCH_PREVIEW};
use brawl_game::tuning::load_tuning_from_path;
use brawl_game::{MatchSetup, MatchSim, Tuning};
use brawl_render::{Canvas, DrawList};

/// Simulated host frame interval (60 Hz display).
const FRAME_MS: f64 = 1000.0 / 60.0;

/// Browser key names pressed (`true`) or released at a given host frame.
const SCRIPT: &[(u32, &str, bool)] = &[
    (10, "d", true),
    (90, "d", false),
    (95, "z", true),
    (96, "z", false),
    (130, " ", true),
    (150, " ", false),
    (180, "p", true),
    (181, "p", false),
    (240, "p", true),
    (241, "p", false),
    (250, "Shift", true),
    (251, "Shift", false),
];
const SCRIPT_FRAMES: u32 = 360;

struct Args {
    setup: MatchSetup,
    tuning: Tuning,
    replay: ReplaySequence,
}

/// `brawl_preview [match.json] [tuning.json] [replay.json]`; a missing path
/// or `-` keeps the built-in default.
fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let path_at = |i: usize| {
        args.get(i)
            .map(String::as_str)
            .filter(|arg| *arg != "-")
            .map(Path::new)
    };

    let setup = match path_at(0) {
        Some(path) => load_match_config_from_path(path)?,
        None => MatchSetup::default(),
    };
    let tuning = match path_at(1) {
        Some(path) => load_tuning_from_path(path)?,
        None => Tuning::default(),
    };
    let replay = match path_at(2) {
        Some(path) => load_replay(path)?,
        None => ReplaySequence::demo(),
    };
    Ok(Args {
        setup,
        tuning,
        replay,
    })
}

/// Runs the replay twice straight through [`MatchSim`] and checks the runs agree.
fn run_replay(args: &Args) -> Result<(), String> {
    let mut first = MatchSim::new(args.setup.config.clone(), args.tuning.clone(), args.setup.ai_seed);
    let mut second = MatchSim::new(args.setup.config.clone(), args.tuning.clone(), args.setup.ai_seed);
    let a = args.replay.run(&mut first);
    let b = args.replay.run(&mut second);
    log::info!(
        "Replay {:.2}s: hp {}/{} timer {:.2} status {:?}",
        args.replay.duration(),
        a.hud.p1_hp,
        a.hud.p2_hp,
        a.hud.timer,
        a.hud.status
    );
    if a.digest != b.digest {
        return Err(format!("Replay diverged: {} vs {}", a.digest, b.digest));
    }
    log::info!("Replay digest: {}", a.digest);
    Ok(())
}

/// Drives the full scene runtime headlessly with a scripted keyboard.
fn run_scripted(args: &Args) -> Result<(), String> {
    let arena = &args.tuning.arena;
    let config = ManagerConfig {
        width: arena.width,
        height: arena.height,
        floor_offset: arena.floor_offset,
        ..ManagerConfig::default()
    };
    let mut manager = new_scene_manager(config).map_err(|e| e.to_string())?;
    let mut last_whole_second = -1;
    let payload = MatchPreviewPayload::new(args.setup.clone(), args.tuning.clone())
        .with_hud_callback(move |hud| {
            let whole = hud.timer.ceil() as i32;
            if whole != last_whole_second {
                last_whole_second = whole;
                log::debug!("HUD {}", serde_json::to_string(hud).unwrap_or_default());
            }
        });
    manager
        .start(MATCH_PREVIEW, ScenePayload::new(payload))
        .map_err(|e| e.to_string())?;

    let mut canvas = DrawList::new(arena.width, arena.height);
    for frame in 0..SCRIPT_FRAMES {
        for &(_, name, down) in SCRIPT.iter().filter(|(at, _, _)| *at == frame) {
            let key = Key::from_dom_key(name).ok_or_else(|| format!("Unbound key {name:?}"))?;
            let input = manager.input_mut();
            if down {
                input.key_down(key);
            } else {
                input.key_up(key);
            }
        }
        let surface: &mut dyn Canvas = &mut canvas;
        if !manager.frame(f64::from(frame) * FRAME_MS, Some(surface)) {
            break;
        }
    }

    let debug = manager.debug_snapshot();
    log::info!(
        "Scripted run: {} frames, {} fixed steps, stack {:?}, entities {:?}",
        debug.timing.frames,
        debug.timing.fixed_steps,
        debug.stack.iter().map(|entry| entry.id.as_str()).collect::<Vec<_>>(),
        debug.entity_totals
    );
    log::info!(
        "Last frame: {} draw commands, HUD text {:?}",
        canvas.len(),
        canvas.texts().collect::<Vec<_>>()
    );
    log::info!(
        "Top scene {:?}, paused {}",
        manager.top_id(),
        manager.is_paused()
    );
    for record in manager.entities().find_by_tag("character") {
        if let Some(fighter) = record.state.as_fighter() {
            log::info!(
                "{} ({}): hp {} at ({:.1}, {:.1})",
                record.id,
                record.kind,
                fighter.hp,
                fighter.pos.x,
                fighter.pos.y
            );
        }
    }
    manager.stop();
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Fighter preview starting...");

    let result = parse_args().and_then(|args| {
        log::info!(
            "{} vs {} on '{}' ({:?}, {:?})",
            args.setup.meta.p1_name,
            args.setup.meta.p2_name,
            args.setup.meta.stage,
            args.setup.config.difficulty,
            args.setup.config.control
        );
        run_replay(&args)?;
        run_scripted(&args)
    });
    if let Err(err) = result {
        log::error!("{err}");
        std::process::exit(1);
    }
}
