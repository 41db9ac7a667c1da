//! `segue` replay: drives every choreographer on the simulated host and logs
//! the resulting phases and style traffic. Run with `RUST_LOG=debug` to see
//! pass starts and finalizes.
//!
//! Usage: `segue [options.toml]`

use std::path::Path;
use std::time::Duration;

use segue::animation::{
    Choreography, Direction, EntranceAnimator, FadeSwitch, FlipEngine,
    NavigationIntent, OverlayChoreographer, Role, TransitionKind,
    TransitionStore,
};
use segue::geometry::Rect;
use segue::host::{ElementId, SimHost, StyleProp};
use segue::options::Options;

fn log_writes(host: &SimHost, label: &str) {
    for write in host.writes() {
        log::info!(
            "[{label}] epoch {} {} {}: {}",
            write.reflow_epoch,
            write.element,
            write.prop.css_name(),
            write.value.as_deref().unwrap_or("<removed>")
        );
    }
}

fn replay_reorder(options: &Options) {
    let mut host = SimHost::new();
    let root = host.create_root(Rect::new(0.0, 0.0, 320.0, 400.0));
    let items: Vec<ElementId> = (0_u32..4)
        .map(|i| {
            host.append_child(root, Rect::new(0.0, f64::from(i) * 50.0, 320.0, 50.0))
        })
        .collect();
    let mut flip =
        FlipEngine::new(root, options.flip.clone(), options.watchdog.clone());
    let _ = flip.reconcile(&mut host, Role::Active);

    // Reverse the list.
    for (i, &el) in items.iter().rev().enumerate() {
        if let Some(rect) = host.rect(el) {
            host.set_rect(el, rect.moved_to(0.0, i as f64 * 50.0));
        }
    }
    let report = flip.reconcile(&mut host, Role::Active);
    log::info!(
        "reorder: tracked {}, animated {}",
        report.tracked,
        report.animated
    );
    let ends = host.finish_transitions(StyleProp::Transform);
    let _ = host.dispatch(&mut flip, ends);
    log_writes(&host, "flip");
    log::info!("reorder: {} pass(es) finalized", flip.completed_passes());
}

fn replay_navigation(options: &Options) {
    let mut host = SimHost::new();
    let root = host.create_root(Rect::new(0.0, 0.0, 320.0, 480.0));
    let store = TransitionStore::new();
    let _sub = store.reader().subscribe(|state| {
        log::info!(
            "navigation: phase {:?}, kind {:?}, key {:?}",
            state.phase,
            state.kind,
            state.key.as_ref().map(ToString::to_string)
        );
    });
    let mut overlay = OverlayChoreographer::new(
        root,
        options.overlay.clone(),
        options.watchdog.clone(),
        store,
    );
    overlay.set_on_done(|key| log::info!("navigation: done at {key}"));
    let curve: Vec<String> = [0.25, 0.5, 0.75]
        .iter()
        .map(|&t| format!("{:.3}", options.overlay.easing.evaluate(t)))
        .collect();
    log::info!(
        "navigation: {} samples {}",
        options.overlay.easing.to_css(),
        curve.join(" ")
    );

    for (key, intent) in [
        ("/step/1", NavigationIntent::at_history_index(0)),
        ("/step/2", NavigationIntent::at_history_index(1)),
        ("/step/3", NavigationIntent::at_history_index(2)),
        ("/step/2", NavigationIntent::explicit(Direction::Backward)),
    ] {
        let outcome = overlay.navigate(&mut host, key.into(), intent);
        log::info!("navigation: {key} -> {outcome:?}");
        let _ = host.run_until_idle(&mut overlay);
    }
    log_writes(&host, "overlay");
}

fn replay_fade(options: &Options) {
    let mut host = SimHost::new();
    let root = host.create_root(Rect::new(0.0, 0.0, 320.0, 480.0));
    let mut fade = FadeSwitch::new(
        root,
        options.fade.clone(),
        options.watchdog.clone(),
        TransitionStore::new(),
    );
    for key in ["/", "/about", "/about", "/contact"] {
        let outcome = fade.switch(&mut host, key.into(), TransitionKind::Fade);
        let classes = fade
            .current()
            .map(|(_, el)| host.classes(el).join(" "))
            .unwrap_or_default();
        log::info!("fade: {key} -> {outcome:?} [{classes}]");
        let _ = host.run_until_idle(&mut fade);
    }
    fade.teardown(&mut host);
}

fn replay_entrance(options: &Options) {
    let mut host = SimHost::new();
    let root = host.create_root(Rect::new(0.0, 0.0, 400.0, 400.0));
    let anchor = host.append_child(root, Rect::new(150.0, 150.0, 100.0, 100.0));
    let card = host.append_child(root, Rect::new(20.0, 320.0, 120.0, 60.0));
    let mut entrance =
        EntranceAnimator::new(options.entrance.clone(), options.watchdog.clone());

    log::info!("entrance: {:?}", entrance.begin(&mut host, card, anchor));
    let frames = host.take_frames();
    let _ = host.dispatch(&mut entrance, frames);
    log::info!("entrance: {:?}", entrance.phase());
    let fired = host.advance(Duration::from_secs(2));
    let _ = host.dispatch(&mut entrance, fired);
    log::info!("entrance: {:?}", entrance.phase());
    log_writes(&host, "entrance");
}

fn main() {
    env_logger::init();

    let options = match std::env::args().nth(1) {
        Some(path) => match Options::load(Path::new(&path)) {
            Ok(options) => options,
            Err(e) => {
                log::error!("{e}");
                std::process::exit(1);
            }
        },
        None => Options::default(),
    };

    replay_reorder(&options);
    replay_navigation(&options);
    replay_fade(&options);
    replay_entrance(&options);
}
