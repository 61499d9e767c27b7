// Benchmark for week layout
// Measures lane and ribbon placement for busy weeks

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use egui::Pos2;

use week_grid::grid::layout::{place_events, GridMetrics};
use week_grid::models::event::CalendarEvent;
use week_grid::models::settings::GridSettings;
use week_grid::utils::date::{local_noon, time_from_minutes, week_start};

/// A week with `count` events: mostly overlapping timed blocks plus an
/// all-day event every tenth slot.
fn busy_week(start: NaiveDate, count: usize) -> Vec<CalendarEvent> {
    (0..count)
        .map(|i| {
            let date = start + Duration::days((i % 7) as i64);
            if i % 10 == 9 {
                CalendarEvent::all_day("Offsite", date, Some(date + Duration::days(1)))
            } else {
                let begin = ((i * 37) % 1300) as u32;
                let length = 15 + ((i * 13) % 120) as u32;
                CalendarEvent::timed(
                    "Meeting",
                    date,
                    time_from_minutes(begin),
                    time_from_minutes(begin + length),
                )
            }
        })
        .collect()
}

fn bench_place_events(c: &mut Criterion) {
    let mut group = c.benchmark_group("place_events");
    let metrics = GridMetrics::new(&GridSettings::default()).with_origin(Pos2::new(50.0, 80.0));
    let week = week_start(local_noon(NaiveDate::from_ymd_opt(2025, 6, 18).unwrap()));

    for count in [10, 100, 1000].iter() {
        let events = busy_week(week.date_naive(), *count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &events, |b, events| {
            b.iter(|| place_events(black_box(events), black_box(week), &metrics));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_place_events);
criterion_main!(benches);
