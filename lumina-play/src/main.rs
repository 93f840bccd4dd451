mod config;
mod config_gen;
mod library;
mod setup;
mod terminal;

use std::env;
use std::thread;
use std::time::Duration;
use anyhow::{Context, Result};
use lumina_dialog::host::HeadlessHost;
use lumina_dialog::{Clock, DialogConfig, WallClock};

use config::SystemConfig;
use library::ScriptLibrary;
use terminal::{Answer, TerminalPrinter};

fn main() {
    setup::init();
    log::info!(">>> Lumina Dialog Player Started <<<");

    if let Err(e) = run() {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let sys_cfg: SystemConfig = lumina_shared::config::get("system");
    let library = ScriptLibrary::scan(&sys_cfg.script_path)?;

    if args.iter().any(|a| a == "--list") {
        for name in library.names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let name = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .cloned()
        .unwrap_or_else(|| sys_cfg.start_script.clone());
    let doc = library.load(&name)?;

    let names = doc
        .characters
        .iter()
        .map(|(id, ch)| {
            let shown = ch.long_name.clone().or_else(|| ch.short_name.clone()).unwrap_or_else(|| id.clone());
            (id.clone(), shown)
        })
        .collect();
    let printer = TerminalPrinter::new(names);

    let host = HeadlessHost::new();
    let mut dialog = doc
        .into_builder(DialogConfig::from_shared())?
        .host(host.host())
        .build()
        .with_context(|| format!("Invalid dialog script '{}'", name))?;

    dialog.start()?;
    let mut clock = WallClock::new();
    let frame = Duration::from_secs_f32(sys_cfg.frame_time.max(0.001));
    while dialog.in_progress() {
        dialog.advance(clock.dt())?;
        if let Some(len) = printer.flush(&host) {
            match printer.wait_choice(len) {
                Answer::Pick(n) => host.press(&n.to_string()),
                Answer::Exit => dialog.stop(),
            }
            // time spent at the prompt is not dialogue time
            clock.dt();
        }
        thread::sleep(frame);
    }
    printer.flush(&host);
    log::info!("Dialog '{}' finished", name);
    Ok(())
}
