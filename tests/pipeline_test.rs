mod common;

use std::sync::Arc;
use std::thread;

use hatescan::{
    normalize, ArtifactConfig, Detector, Label, SubmissionError, ValidationError,
};
use proptest::prelude::*;

#[test]
fn test_end_to_end_hate_speech() -> Result<(), Box<dyn std::error::Error>> {
    let artifacts = common::default_artifacts();
    let config = ArtifactConfig::new(&artifacts.model_path, &artifacts.vectorizer_path);
    let detector = Detector::load(&config)?;
    let session = detector.session();

    let result = session.submit("I hate this")?;
    assert_eq!(result.label, Label::HateSpeech);
    assert!((result.confidence.percent() - 90.0).abs() < 1e-3);
    assert_eq!(result.confidence.to_string(), "90.00%");

    let records = session.history().records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].label(), Label::HateSpeech);
    assert_eq!(records[0].confidence().to_string(), "90.00%");
    assert_eq!(records[0].text(), "I hate this");
    Ok(())
}

#[test]
fn test_clean_text() -> Result<(), Box<dyn std::error::Error>> {
    let session = common::in_memory_detector().session();
    let result = session.submit("I love this!!")?;
    assert_eq!(result.label, Label::Clean);
    assert_eq!(result.confidence.to_string(), "90.00%");
    Ok(())
}

#[test]
fn test_letter_free_input_still_analyzed() -> Result<(), Box<dyn std::error::Error>> {
    // Not blank, but normalizes to nothing: the classifier sees an all-zero row.
    let session = common::in_memory_detector().session();
    let result = session.submit("1234 !!!")?;
    assert_eq!(result.label, Label::Clean);
    assert_eq!(result.confidence.to_string(), "50.00%");
    assert_eq!(session.history().len(), 1);
    Ok(())
}

#[test]
fn test_analysis_is_deterministic() {
    let engine = common::in_memory_engine();
    let first = engine.analyze("you are full of HATE").unwrap();
    for _ in 0..10 {
        assert_eq!(engine.analyze("you are full of HATE").unwrap(), first);
    }
}

#[test]
fn test_normalization_feeds_the_vectorizer() {
    let engine = common::in_memory_engine();
    // Digits and punctuation inside the word are stripped before lookup.
    let glued = engine.analyze("H4ATE!").unwrap();
    assert_eq!(normalize("H4ATE!"), "hate");
    assert_eq!(glued.label, Label::HateSpeech);
}

#[test]
fn test_blank_submission_appends_nothing() {
    let session = common::in_memory_detector().session();
    let err = session.submit("   \n").unwrap_err();
    assert!(matches!(err, SubmissionError::Validation(ValidationError::EmptyInput)));
    assert_eq!(err.to_string(), "Please enter some text to analyze.");
    assert!(session.history().is_empty());
}

#[test]
fn test_long_input_is_truncated_in_history() {
    let session = common::in_memory_detector().session();
    let long_text = "hate ".repeat(40);
    session.submit(&long_text).unwrap();
    session.submit("short text").unwrap();

    let records = session.history().records();
    assert_eq!(records[0].text().chars().count(), 103);
    assert_eq!(records[0].text(), format!("{}...", &long_text[..100]));
    assert_eq!(records[1].text(), "short text");
}

#[test]
fn test_file_submission() {
    let session = common::in_memory_detector().session();
    let dir = tempfile::tempdir().unwrap();

    let path = common::write_text_file(dir.path(), "post.txt", b"I hate this");
    let result = session.submit_file(&path).unwrap();
    assert_eq!(result.label, Label::HateSpeech);
    assert_eq!(session.history().len(), 1);

    let upper = common::write_text_file(dir.path(), "POST.TXT", b"love");
    assert_eq!(session.submit_file(&upper).unwrap().label, Label::Clean);
    assert_eq!(session.history().len(), 2);
}

#[test]
fn test_rejected_files_append_nothing() {
    let session = common::in_memory_detector().session();
    let dir = tempfile::tempdir().unwrap();

    let binary = common::write_text_file(dir.path(), "bad.txt", &[0xff, 0xfe, 0x00, 0x80]);
    assert!(matches!(
        session.submit_file(&binary).unwrap_err(),
        SubmissionError::Encoding { .. }
    ));

    let blank = common::write_text_file(dir.path(), "blank.txt", b"  \n ");
    assert!(matches!(
        session.submit_file(&blank).unwrap_err(),
        SubmissionError::Validation(ValidationError::EmptyInput)
    ));

    let csv = common::write_text_file(dir.path(), "data.csv", b"hate");
    assert!(matches!(
        session.submit_file(&csv).unwrap_err(),
        SubmissionError::Validation(ValidationError::UnsupportedFileType(_))
    ));

    assert!(session.history().is_empty());
}

#[test]
fn test_thread_safety() {
    let detector = common::in_memory_detector();
    let mut handles = vec![];

    for _ in 0..3 {
        let detector = detector.clone();
        let handle = thread::spawn(move || {
            let session = detector.session();
            let result = session.submit("test text");
            assert!(result.is_ok());
            assert_eq!(session.history().len(), 1);
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_concurrent_appends_within_one_session() {
    let session = Arc::new(common::in_memory_detector().session());
    let mut handles = vec![];

    for i in 0..8 {
        let session = Arc::clone(&session);
        handles.push(thread::spawn(move || {
            for j in 0..25 {
                let text = if (i + j) % 2 == 0 { "hate" } else { "love" };
                session.submit(text).unwrap();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(session.history().len(), 200);
}

proptest! {
    #[test]
    fn confidence_is_a_percentage(text in ".{0,200}") {
        let engine = common::in_memory_engine();
        let result = engine.analyze(&text).unwrap();
        prop_assert!((0.0..=100.0).contains(&result.confidence.percent()));
    }
}
