use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use lumina_dialog::host::HeadlessHost;
use lumina_dialog::{Character, CharacterMod, Dialog, Item, Line, Script, StageChange};

fn make_script(items: usize) -> Script {
    let mut start = Vec::with_capacity(items);
    for i in 0..items {
        let item = match i % 8 {
            0 => Item::say("ch1", Line::new(format!("dialogue {i} from the first speaker")).time(0.1)),
            1 => Item::say("ch2", Line::new(format!("dialogue {i}")).time(0.1).ctime_factor(0.5)),
            2 => Item::pause(0.05),
            3 => Item::say("ch3", Line::new(format!("autoplaced {i}")).time(0.1).ctime(0.0)),
            4 => Item::choice("ch2", vec![Line::new("left").time(0.1), Line::new("right").time(0.1)]),
            5 => Item::update("ch1", CharacterMod::new().size(10.0 + (i % 3) as f32)),
            6 => Item::Exit(StageChange::of(["ch1"])),
            7 => Item::Entry(StageChange::of(["ch1"]).fade()),
            _ => unreachable!(),
        };
        start.push(item);
    }
    Script::linear(start).unwrap()
}

fn bench_sequencer(c: &mut Criterion) {
    const ITEMS: usize = 10_000;
    let mut group = c.benchmark_group("sequencer");
    group.sample_size(10);

    group.bench_function("play 10k items", |b| {
        b.iter_batched(
            || make_script(ITEMS),
            |sc| {
                let host = HeadlessHost::new();
                let mut d = Dialog::builder(sc)
                    .character("ch1", Character::new("ch1"))
                    .character("ch2", Character::new("ch2"))
                    .character("ch3", Character::new("ch3").autoplace(true))
                    .seed(1)
                    .host(host.host())
                    .build()
                    .unwrap();
                d.start().unwrap();
                while d.in_progress() {
                    d.advance(0.05).unwrap();
                    host.take_events();
                }
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_sequencer);
criterion_main!(benches);
