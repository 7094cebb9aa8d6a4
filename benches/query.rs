//! Microbenchmarks for the hot paths of the viewer engine: snowflake
//! ordering and the filter pass.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use chatvault::archive::{MessageDocument, snowflake};
use chatvault::viewer::MessageFilter;

fn make_messages(count: usize) -> Vec<MessageDocument> {
    (0..count)
        .map(|i| {
            let mut msg = MessageDocument::new(
                (1_000_000_000_000u64 + i as u64).to_string(),
                "c1",
                if i % 2 == 0 { "10" } else { "11" },
                i as i64,
            );
            msg.m = Some(format!("message body number {i}"));
            msg
        })
        .collect()
}

fn bench_snowflake_sort(c: &mut Criterion) {
    let ids: Vec<String> = make_messages(10_000)
        .into_iter()
        .rev()
        .map(|msg| msg.id)
        .collect();

    c.bench_function("snowflake_sort_10k", |b| {
        b.iter(|| {
            let mut ids = ids.clone();
            snowflake::sort_oldest_to_newest(black_box(&mut ids));
            ids
        });
    });
}

fn bench_filter_pass(c: &mut Criterion) {
    let messages = make_messages(10_000);
    let by_sender = MessageFilter::BySender("10".to_string());
    let by_contents = MessageFilter::ByContents("number 42".to_string());

    c.bench_function("filter_by_sender_10k", |b| {
        b.iter(|| {
            messages
                .iter()
                .filter(|msg| by_sender.matches(black_box(msg)))
                .count()
        });
    });

    c.bench_function("filter_by_contents_10k", |b| {
        b.iter(|| {
            messages
                .iter()
                .filter(|msg| by_contents.matches(black_box(msg)))
                .count()
        });
    });
}

criterion_group!(benches, bench_snowflake_sort, bench_filter_pass);
criterion_main!(benches);
