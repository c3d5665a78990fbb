use chrono::Local;
use lectio::analytics::aggregate;
use lectio::pacer::Pacer;
use lectio::session::{ReadingMode, ReadingSession, SessionConfig};
use lectio::stats::HistoryDb;
use std::time::{Duration, SystemTime};

/// Integration tests for the full session workflow: pace a text with a
/// fabricated clock, complete the session, persist it, and aggregate the
/// stored history.

fn t0() -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(2_000_000)
}

#[test]
fn paced_reading_completes_and_aggregates() {
    let db = HistoryDb::open_in_memory().unwrap();

    let text = "one two three four five six seven eight nine ten eleven twelve";
    let config = SessionConfig::new(ReadingMode::Chunk, 250, Some(3)).unwrap();

    let mut session =
        ReadingSession::start(config, "drill", 12, Local::now()).unwrap();
    session.id = Some(db.insert_session(&session).unwrap());

    let mut pacer = Pacer::new(text, &config);
    pacer.start(t0());

    // 4 chunks at 720ms each; drive with a coarse 100ms tick
    let mut now = t0();
    let mut ticks = 0;
    while !pacer.is_finished() && ticks < 100 {
        now += Duration::from_millis(100);
        pacer.poll(now);
        ticks += 1;
    }
    assert!(pacer.is_finished());
    assert_eq!(pacer.words_read(), 12);
    // four 720ms intervals: done by the 29th tick at the latest
    assert!(ticks <= 29, "finished after {ticks} ticks");

    // complete with the wall-clock duration the pacing implies
    session.complete(Local::now(), 2_880, 12).unwrap();
    assert_eq!(session.computed_wpm, 250);
    db.finish_session(&session).unwrap();

    let records = db.session_records().unwrap();
    let summary = aggregate(&records);
    assert_eq!(summary.total_sessions, 1);
    assert_eq!(summary.total_words_read, 12);
    assert_eq!(summary.average_wpm_by_mode[&ReadingMode::Chunk], 250);
}

#[test]
fn abandoned_sessions_stay_out_of_the_aggregates() {
    let db = HistoryDb::open_in_memory().unwrap();
    let config = SessionConfig::new(ReadingMode::Word, 300, None).unwrap();

    // never completed
    let mut abandoned = ReadingSession::start(config, "left open", 100, Local::now()).unwrap();
    abandoned.id = Some(db.insert_session(&abandoned).unwrap());

    let mut finished = ReadingSession::start(config, "done", 100, Local::now()).unwrap();
    finished.id = Some(db.insert_session(&finished).unwrap());
    finished.complete(Local::now(), 20_000, 100).unwrap();
    db.finish_session(&finished).unwrap();

    let summary = aggregate(&db.session_records().unwrap());
    assert_eq!(summary.total_sessions, 1);
    assert_eq!(summary.total_words_read, 100);
    assert_eq!(summary.total_time_ms, 20_000);
}

#[test]
fn pause_and_resume_do_not_lose_position_across_persistence() {
    let db = HistoryDb::open_in_memory().unwrap();
    let text = "alpha beta gamma delta epsilon zeta";
    let config = SessionConfig::new(ReadingMode::Word, 300, None).unwrap();

    let mut session = ReadingSession::start(config, "pausing", 6, Local::now()).unwrap();
    session.id = Some(db.insert_session(&session).unwrap());

    let mut pacer = Pacer::new(text, &config);
    pacer.start(t0());
    pacer.poll(t0() + Duration::from_millis(400));
    assert_eq!(pacer.index(), 2);

    pacer.pause();
    // a long stall while paused moves nothing
    assert!(!pacer.poll(t0() + Duration::from_secs(3600)));
    let resumed = t0() + Duration::from_secs(3600);
    pacer.resume(resumed);
    pacer.poll(resumed + Duration::from_millis(800));
    assert!(pacer.is_finished());
    assert_eq!(pacer.words_read(), 6);

    session.complete(Local::now(), 5_000, 6).unwrap();
    db.finish_session(&session).unwrap();
    let records = db.session_records().unwrap();
    assert_eq!(records[0].words_read, 6);
}

#[test]
fn paragraph_mode_end_to_end() {
    let text = "first paragraph with five words\n\nsecond one has four\n\nthird paragraph closes the text here";
    let config = SessionConfig::new(ReadingMode::Paragraph, 100, None).unwrap();
    let mut pacer = Pacer::new(text, &config);
    pacer.start(t0());

    // 5 words at 100 wpm: 3000ms for the first paragraph
    assert_eq!(pacer.interval(), Duration::from_millis(3000));
    assert!(!pacer.poll(t0() + Duration::from_millis(2999)));
    assert!(pacer.poll(t0() + Duration::from_millis(3000)));
    assert_eq!(pacer.index(), 1);
    assert_eq!(pacer.words_read(), 9);

    pacer.skip_to_end();
    assert!(pacer.is_finished());
    assert_eq!(pacer.words_read(), 15);
}
