mod util;
use mesh_parts::prelude::*;
use util::*;

/// Six shells in the file; only window `[2, 5)` is loaded. Inside the window
/// cells belong to materials 1, 2, 1.
fn windowed_shells(word_size: WordSize) -> PartCollection {
    let mut totals = [0; Category::COUNT];
    totals[Category::Shell.index()] = 6;
    let meta = meta(
        &[(Category::Shell, true), (Category::Shell, true), (Category::Beam, true)],
        16,
        totals,
        word_size,
    );
    let windows = IdWindows::full(&meta).with_window(Category::Shell, 2..5);
    let mut c = PartCollection::with_options(&meta, windows, CollectionOptions::default()).unwrap();
    replay(
        &mut c,
        &[
            (Category::Shell, 1, vec![0, 1, 2, 3]),
            (Category::Shell, 2, vec![4, 5, 6, 7]),
            (Category::Shell, 1, vec![2, 3, 8, 9]),
        ],
    );
    c
}

#[test]
fn read_plan_follows_window() {
    let c = windowed_shells(WordSize::Four);
    assert_eq!(
        c.read_plan(Category::Shell),
        ReadPlan {
            count: 3,
            skip_start: 2,
            skip_end: 1
        }
    );
    assert!(c.read_plan(Category::Solid).is_skip_only());
}

#[test]
fn user_ids_single_precision() {
    let mut c = windowed_shells(WordSize::Four);
    let ids: Vec<i32> = (100..106).collect();
    let mut stream = SliceStream::from_words(&ids).with_max_chunk_words(2);
    c.read_cell_user_ids(&mut stream, Category::Shell, true).unwrap();
    assert_eq!(stream.remaining_words(), 0);
    assert_eq!(stream.stats().words_read, 3);
    assert_eq!(c.part(slot(1)).unwrap().cell_user_ids(), Some(&[102, 104][..]));
    assert_eq!(c.part(slot(2)).unwrap().cell_user_ids(), Some(&[103][..]));
}

#[test]
fn user_ids_double_precision() {
    let mut c = windowed_shells(WordSize::Eight);
    let ids: Vec<i64> = vec![0, 0, 7_000_000_001, 7_000_000_002, 7_000_000_003, 0];
    let mut stream = SliceStream::from_words(&ids);
    c.read_cell_user_ids(&mut stream, Category::Shell, true).unwrap();
    assert_eq!(
        c.part(slot(1)).unwrap().cell_user_ids(),
        Some(&[7_000_000_001, 7_000_000_003][..])
    );
}

#[test]
fn disabled_user_ids_are_skipped() {
    let mut c = windowed_shells(WordSize::Four);
    let mut stream = SliceStream::from_words(&[0i32; 6]);
    c.read_cell_user_ids(&mut stream, Category::Shell, false).unwrap();
    assert_eq!(stream.stats().words_read, 0);
    assert_eq!(stream.stats().words_skipped, 6);
    assert_eq!(c.part(slot(1)).unwrap().cell_user_ids(), None);
}

#[test]
fn dead_flags_are_split_and_can_be_disabled() {
    let mut c = windowed_shells(WordSize::Four);
    c.set_cell_dead_flags(Category::Shell, &[0, 1, 3]).unwrap();
    let p1 = c.part(slot(1)).unwrap();
    assert_eq!(p1.dead_cells(), Some(&[0, 3][..]));
    assert!(p1.is_cell_dead(1));
    assert!(!p1.is_cell_dead(0));
    assert!(c.part(slot(2)).unwrap().is_cell_dead(0));

    // a second state overwrites rather than appends
    c.set_cell_dead_flags(Category::Shell, &[1, 0, 0]).unwrap();
    assert_eq!(c.part(slot(1)).unwrap().dead_cells(), Some(&[1, 0][..]));

    c.disable_dead_cells();
    assert_eq!(c.part(slot(1)).unwrap().dead_cells(), None);
}

#[test]
fn cell_properties_fill_from_chunked_stream() {
    let mut c = windowed_shells(WordSize::Four);
    c.add_cell_attribute(Category::Shell, "stress", 1, 2).unwrap();
    c.add_cell_attribute(Category::Shell, "eps", 0, 1).unwrap();
    // six cells of three words: cell i holds [i, 10 + i, 20 + i]
    let words: Vec<f32> = (0..6)
        .flat_map(|i| [i as f32, 10.0 + i as f32, 20.0 + i as f32])
        .collect();
    let mut stream = SliceStream::from_words(&words).with_max_chunk_words(4);
    c.read_cell_attributes(&mut stream, Category::Shell, 3).unwrap();
    assert_eq!(stream.remaining_words(), 0);
    assert_eq!(stream.stats().chunks_loaded, 3);

    let p1 = c.part(slot(1)).unwrap();
    let stress = p1.cell_attribute("stress").unwrap();
    assert_eq!(
        stress.values().as_slice::<f32>(),
        Some(&[12.0, 22.0, 14.0, 24.0][..])
    );
    assert_eq!(
        p1.cell_attribute("eps").unwrap().values().as_slice::<f32>(),
        Some(&[2.0, 4.0][..])
    );
    let p2 = c.part(slot(2)).unwrap();
    assert_eq!(
        p2.cell_attribute("stress").unwrap().values().as_slice::<f32>(),
        Some(&[13.0, 23.0][..])
    );
    assert!(c.part(slot(3)).is_none());
}

#[test]
fn fill_rejects_short_buffers() {
    let mut c = windowed_shells(WordSize::Four);
    c.add_cell_attribute(Category::Shell, "eps", 0, 1).unwrap();
    assert_eq!(
        c.fill_cell_attribute(&[0.0f32; 2], Category::Shell, 0, 3, 1),
        Err(MeshPartsError::BufferLengthMismatch {
            expected: 3,
            found: 2
        })
    );
}

#[test]
fn reset_rewinds_every_part() {
    let mut c = windowed_shells(WordSize::Four);
    c.add_cell_attribute(Category::Shell, "eps", 0, 1).unwrap();
    c.fill_cell_attribute(&[1.0f32, 2.0, 3.0], Category::Shell, 0, 3, 1)
        .unwrap();
    c.reset_time_step();
    c.fill_cell_attribute(&[5.0f32, 6.0, 7.0], Category::Shell, 0, 3, 1)
        .unwrap();
    let eps = c.part(slot(1)).unwrap().cell_attribute("eps").unwrap();
    assert_eq!(eps.values().as_slice::<f32>(), Some(&[5.0, 7.0][..]));
    assert_eq!(eps.written_cells(), 2);
}

/// Window `[1, 5)` over six shells whose cells belong to materials 1, 2, 3, 1;
/// material 2 is disabled and sits between two enabled runs.
fn shells_around_disabled_part() -> PartCollection {
    let mut totals = [0; Category::COUNT];
    totals[Category::Shell.index()] = 6;
    let meta = meta(
        &[(Category::Shell, true), (Category::Shell, false), (Category::Shell, true)],
        20,
        totals,
        WordSize::Four,
    );
    let windows = IdWindows::full(&meta).with_window(Category::Shell, 1..5);
    let mut c = PartCollection::with_options(&meta, windows, CollectionOptions::default()).unwrap();
    replay(
        &mut c,
        &[
            (Category::Shell, 1, vec![0, 1, 2, 3]),
            (Category::Shell, 2, vec![4, 5, 6, 7]),
            (Category::Shell, 3, vec![8, 9, 10, 11]),
            (Category::Shell, 1, vec![2, 3, 12, 13]),
        ],
    );
    c
}

#[test]
fn disabled_run_keeps_later_parts_aligned() {
    let mut c = shells_around_disabled_part();
    assert!(c.part(slot(2)).is_none());

    c.add_cell_attribute(Category::Shell, "eps", 0, 1).unwrap();
    c.fill_cell_attribute(&[1.0f32, 2.0, 3.0, 4.0], Category::Shell, 0, 4, 1)
        .unwrap();
    let eps = |c: &PartCollection, n| {
        c.part(slot(n))
            .unwrap()
            .cell_attribute("eps")
            .unwrap()
            .values()
            .as_slice::<f32>()
            .map(<[f32]>::to_vec)
    };
    assert_eq!(eps(&c, 1), Some(vec![1.0, 4.0]));
    assert_eq!(eps(&c, 3), Some(vec![3.0]));

    let ids: Vec<i32> = (100..106).collect();
    let mut stream = SliceStream::from_words(&ids);
    c.read_cell_user_ids(&mut stream, Category::Shell, true).unwrap();
    assert_eq!(stream.stats().words_skipped, 2);
    assert_eq!(c.part(slot(1)).unwrap().cell_user_ids(), Some(&[101, 104][..]));
    assert_eq!(c.part(slot(3)).unwrap().cell_user_ids(), Some(&[103][..]));

    c.set_cell_dead_flags(Category::Shell, &[0, 5, 7, 9]).unwrap();
    assert_eq!(c.part(slot(1)).unwrap().dead_cells(), Some(&[0, 9][..]));
    assert_eq!(c.part(slot(3)).unwrap().dead_cells(), Some(&[7][..]));
}

#[test]
fn disabled_run_inside_streamed_properties() {
    let mut c = shells_around_disabled_part();
    c.add_cell_attribute(Category::Shell, "stress", 1, 1).unwrap();
    // six cells of two words: cell i holds [i, 10 + i]
    let words: Vec<f32> = (0..6).flat_map(|i| [i as f32, 10.0 + i as f32]).collect();
    let mut stream = SliceStream::from_words(&words).with_max_chunk_words(3);
    c.read_cell_attributes(&mut stream, Category::Shell, 2).unwrap();
    assert_eq!(stream.remaining_words(), 0);
    let stress = |n| {
        c.part(slot(n))
            .unwrap()
            .cell_attribute("stress")
            .unwrap()
            .values()
            .as_slice::<f32>()
            .map(<[f32]>::to_vec)
    };
    assert_eq!(stress(1), Some(vec![11.0, 14.0]));
    assert_eq!(stress(3), Some(vec![13.0]));
}

#[test]
fn state_data_needs_allocated_parts() {
    let mut totals = [0; Category::COUNT];
    totals[Category::Shell.index()] = 1;
    let meta = meta(&[(Category::Shell, true)], 4, totals, WordSize::Four);
    let mut c = PartCollection::new(&meta).unwrap();
    c.register_cell_to_part(Category::Shell, 1, 4).unwrap();

    let out_of_phase = |r: Result<(), MeshPartsError>, op: &str| {
        assert!(
            matches!(
                r,
                Err(MeshPartsError::OutOfPhase { operation, phase: Phase::Indexing })
                    if operation == op
            ),
            "{op}"
        );
    };
    out_of_phase(
        c.fill_cell_attribute(&[1.0f32], Category::Shell, 0, 1, 1),
        "fill_cell_attribute",
    );
    out_of_phase(c.set_cell_dead_flags(Category::Shell, &[1]), "set_cell_dead_flags");
    out_of_phase(c.add_cell_attribute(Category::Shell, "eps", 0, 1), "add_cell_attribute");
    out_of_phase(c.fill_cell_user_ids(&[7i32], Category::Shell, 0, 1), "fill_cell_user_ids");
    let mut stream = SliceStream::from_words(&[7i32]);
    out_of_phase(
        c.read_cell_user_ids(&mut stream, Category::Shell, true),
        "read_cell_user_ids",
    );
    out_of_phase(
        c.read_cell_attributes(&mut stream, Category::Shell, 1),
        "read_cell_attributes",
    );
    assert_eq!(stream.stats().words_read, 0);

    c.allocate_parts().unwrap();
    c.set_cell_dead_flags(Category::Shell, &[1]).unwrap();
    assert_eq!(c.part(slot(1)).unwrap().dead_cells(), Some(&[1][..]));
}
