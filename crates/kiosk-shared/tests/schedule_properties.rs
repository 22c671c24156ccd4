use kiosk_shared::clock::{FixedClock, SyncClock};
use kiosk_shared::schedule::{check_drift, Correction, DriftPolicy, Playlist, PlaylistEntry};

fn attract_loop() -> Playlist {
    Playlist::new(vec![
        PlaylistEntry::new("/video/intro.mp4", 95.0),
        PlaylistEntry::new("/video/ngfw.mp4", 30.0),
        PlaylistEntry::new("/video/products.mp4", 73.92),
    ])
    .expect("playlist should be valid")
}

/// Sample instants across a whole day plus some negative offsets.
fn sample_instants() -> impl Iterator<Item = f64> {
    (-40..=900).map(|i| i as f64 * 97.31)
}

#[test]
fn resolve_is_deterministic() {
    let p = attract_loop();
    for t in sample_instants() {
        assert_eq!(p.resolve(t), p.resolve(t), "t={}", t);
    }
}

#[test]
fn resolve_is_periodic_in_total_duration() {
    let p = attract_loop();
    let total = p.total_duration_secs();
    for t in sample_instants() {
        let a = p.resolve(t);
        let b = p.resolve(t + total);
        assert_eq!(a.entry_index, b.entry_index, "t={}", t);
        assert!(
            (a.offset_secs - b.offset_secs).abs() < 1e-6,
            "t={} offsets {} vs {}",
            t,
            a.offset_secs,
            b.offset_secs
        );
    }
}

#[test]
fn offset_plus_preceding_durations_matches_cycle_position() {
    let p = attract_loop();
    let total = p.total_duration_secs();
    for t in sample_instants() {
        let pos = p.resolve(t);
        let entry = p.get(pos.entry_index).expect("index in range");
        assert!(pos.offset_secs >= 0.0);
        assert!(pos.offset_secs < entry.duration_secs);
        let reconstructed = p.start_of(pos.entry_index) + pos.offset_secs;
        assert!(
            (reconstructed - t.rem_euclid(total)).abs() < 1e-6,
            "t={} reconstructed={}",
            t,
            reconstructed
        );
    }
}

#[test]
fn two_kiosks_with_the_same_clock_agree() {
    let p = attract_loop();
    let clock = FixedClock(43_210.5);
    let first = p.resolve(clock.now_secs());
    let second = attract_loop().resolve(clock.now_secs());
    assert_eq!(first, second);
}

#[test]
fn single_entry_playlist_always_resolves_to_it() {
    let p = Playlist::new(vec![PlaylistEntry::new("loop.mp4", 12.5)]).unwrap();
    for t in sample_instants() {
        let pos = p.resolve(t);
        assert_eq!(pos.entry_index, 0);
        assert!(pos.offset_secs < 12.5);
    }
}

#[test]
fn drift_example_from_the_field() {
    let drift = check_drift(50.3, 50.0);
    match DriftPolicy::default().evaluate(drift) {
        Correction::Adjust { rate, window } => {
            assert_eq!(rate, 1.05);
            let ms = window.as_secs_f64() * 1000.0;
            assert!((ms - 6000.0).abs() < 1.0, "window {}ms", ms);
        }
        Correction::InSync => panic!("0.3s drift must be corrected"),
    }
}
