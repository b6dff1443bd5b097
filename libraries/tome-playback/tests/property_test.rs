//! Property-based tests for chapter math and playback policies

use proptest::prelude::*;
use tome_core::{Bookmark, BookmarkKind, Chapter, PlayableItem};
use tome_playback::{rewind_offset, MAX_REWIND_SECS, MAX_SPEED, MIN_SPEED};

/// Books with 1-20 chapters of arbitrary durations laid out back to back
fn item_strategy() -> impl Strategy<Value = PlayableItem> {
    prop::collection::vec(1.0f64..3600.0, 1..20).prop_map(|durations| {
        let mut start = 0.0;
        let chapters: Vec<Chapter> = durations
            .iter()
            .enumerate()
            .map(|(index, duration)| {
                let chapter = Chapter {
                    title: format!("Chapter {}", index + 1),
                    start,
                    duration: *duration,
                    relative_path: format!("book/{index}.mp3"),
                };
                start += duration;
                chapter
            })
            .collect();

        PlayableItem {
            relative_path: "book".to_string(),
            title: "Book".to_string(),
            author: "Author".to_string(),
            duration: start,
            current_time: 0.0,
            chapters,
            is_bound_book: true,
            parent_folder: None,
        }
    })
}

proptest! {
    #[test]
    fn active_chapter_contains_the_position(
        item in item_strategy(),
        fraction in 0.0f64..0.9999,
    ) {
        let time = item.duration * fraction;
        let chapter = item.chapter_at(time);
        prop_assert!(chapter.start <= time);
        prop_assert!(time < chapter.end() + 1e-6);
    }

    #[test]
    fn chapter_starts_resolve_to_their_own_chapter(item in item_strategy()) {
        for (index, chapter) in item.chapters.iter().enumerate() {
            prop_assert_eq!(item.chapter_index_at(chapter.start), index);
        }
    }

    #[test]
    fn global_and_relative_time_round_trip(
        item in item_strategy(),
        fraction in 0.0f64..0.9999,
    ) {
        let time = item.duration * fraction;
        let chapter = item.chapter_at(time);
        let relative = item.chapter_relative_time(time);
        prop_assert!(relative >= 0.0);
        prop_assert!((item.global_time(chapter, relative) - time).abs() < 1e-6);
    }

    #[test]
    fn clamped_time_stays_in_the_book(
        item in item_strategy(),
        time in -1_000_000.0f64..1_000_000.0,
    ) {
        let clamped = item.clamped_time(time);
        prop_assert!(clamped >= 0.0);
        prop_assert!(clamped <= item.duration);
    }

    #[test]
    fn rewind_curve_is_bounded_and_monotone(
        a in 0.0f64..2000.0,
        b in 0.0f64..2000.0,
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let offset_lo = rewind_offset(lo);
        let offset_hi = rewind_offset(hi);
        prop_assert!(offset_lo >= 0.0);
        prop_assert!(offset_hi <= MAX_REWIND_SECS);
        prop_assert!(offset_lo <= offset_hi + 1e-9);
    }

    #[test]
    fn bookmarks_land_on_whole_seconds(time in 0.0f64..1_000_000.0) {
        let bookmark = Bookmark::new("book", time, BookmarkKind::Skip);
        prop_assert_eq!(bookmark.time, time.floor());
        prop_assert!(bookmark.time <= time);
        prop_assert!(time - bookmark.time < 1.0);
    }

    #[test]
    fn speed_clamp_never_leaves_the_supported_range(speed in -10.0f32..10.0) {
        let clamped = speed.clamp(MIN_SPEED, MAX_SPEED);
        prop_assert!(clamped >= MIN_SPEED);
        prop_assert!(clamped <= MAX_SPEED);
    }
}
