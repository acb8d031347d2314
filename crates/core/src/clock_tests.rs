// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::clock::{Clock, FakeClock, SystemClock};
use chrono::Duration;

#[test]
fn fake_clock_is_deterministic() {
    let a = FakeClock::new();
    let b = FakeClock::new();
    assert_eq!(a.now_utc(), b.now_utc());
}

#[test]
fn fake_clock_advances() {
    let clock = FakeClock::new();
    let before = clock.now_utc();
    clock.advance(Duration::seconds(90));
    assert_eq!(clock.now_utc() - before, Duration::seconds(90));
}

#[test]
fn fake_clock_clones_share_time() {
    let clock = FakeClock::new();
    let other = clock.clone();
    clock.advance(Duration::minutes(5));
    assert_eq!(clock.now_utc(), other.now_utc());
}

#[test]
fn epoch_ms_tracks_now_utc() {
    let clock = FakeClock::new();
    assert_eq!(clock.epoch_ms(), clock.now_utc().timestamp_millis());
}

#[test]
fn system_clock_is_monotonic_enough() {
    let clock = SystemClock;
    let a = clock.epoch_ms();
    let b = clock.epoch_ms();
    assert!(b >= a);
}
