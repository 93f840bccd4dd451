use std::collections::HashMap;
use std::io::{stdin, stdout, Write};
use lumina_dialog::host::HeadlessHost;
use lumina_dialog::DialogEvent;

/// Prints what a run shows and asks for choices on stdin.
pub struct TerminalPrinter {
    names: HashMap<String, String>,
}

pub enum Answer {
    Pick(usize),
    Exit,
}

impl TerminalPrinter {
    pub fn new(names: HashMap<String, String>) -> Self {
        Self { names }
    }

    fn name<'a>(&'a self, speaker: &'a str) -> &'a str {
        self.names.get(speaker).map(|s| s.as_str()).unwrap_or(speaker)
    }

    /// Drains the host's events; returns the option count of a newly shown menu.
    pub fn flush(&self, host: &HeadlessHost) -> Option<usize> {
        let mut menu = None;
        for event in host.take_events() {
            match &event {
                DialogEvent::TextShown { speaker, text } => {
                    println!("[Dialogue] {}: {}", self.name(speaker), text);
                }
                DialogEvent::MenuShown { options } => {
                    for o in options {
                        println!("  [{}", o.replacen(". ", "] ", 1));
                    }
                    menu = Some(options.len());
                }
                DialogEvent::SoundPlayed { path } => {
                    println!("[PlayAudio] {}", path);
                }
                DialogEvent::DecoFaded { speaker, alpha, .. } if *alpha >= 1.0 => {
                    println!("-- {} enters --", self.name(speaker));
                }
                DialogEvent::DecoFaded { speaker, .. } => {
                    println!("-- {} leaves --", self.name(speaker));
                }
                other => log::trace!("{:?}", other),
            }
        }
        menu
    }

    pub fn wait_choice(&self, len: usize) -> Answer {
        loop {
            print!("Select> ");
            let _ = stdout().flush();
            let mut buf = String::new();
            if stdin().read_line(&mut buf).unwrap_or(0) == 0 {
                return Answer::Exit;
            }
            let trimmed = buf.trim();
            if trimmed.eq_ignore_ascii_case("exit") {
                return Answer::Exit;
            }
            if let Ok(n) = trimmed.parse::<usize>() {
                if n >= 1 && n <= len {
                    return Answer::Pick(n);
                }
            }
            println!("invalid");
        }
    }
}
