use assert_matches::assert_matches;
use std::sync::Arc;
use std::thread;
use typist::dictionary::InMemoryDictionaryRepository;
use typist::storage::{InMemoryProfileRepository, InMemoryTypingTestRepository, TypingTestRepository};
use typist::{
    Dictionary, Error, SourceRequest, TestRequest, TestResults, TestState, TypingTestService,
    WordLoader,
};
use uuid::Uuid;

struct NumberedWords;

impl WordLoader for NumberedWords {
    fn load_words(&self, dictionary: &Dictionary) -> Vec<String> {
        (0..30).map(|i| format!("{}{i}", dictionary.name)).collect()
    }
}

struct Harness {
    service: TypingTestService,
    tests: Arc<InMemoryTypingTestRepository>,
    profile_id: Uuid,
    other_profile_id: Uuid,
}

fn harness() -> Harness {
    let tests = Arc::new(InMemoryTypingTestRepository::new());
    let profiles = Arc::new(InMemoryProfileRepository::new());
    let profile_id = profiles.create("ada").id;
    let other_profile_id = profiles.create("grace").id;
    let dictionaries = Arc::new(InMemoryDictionaryRepository::new(vec![
        Dictionary::new("common", "english", "/words/english/common.txt"),
        Dictionary::new("rare", "english", "/words/english/rare.txt"),
        Dictionary::new("comuni", "italian", "/words/italian/comuni.txt"),
    ]));
    let service = TypingTestService::new(
        tests.clone(),
        profiles,
        dictionaries,
        Arc::new(NumberedWords),
    )
    .with_seed(11);
    Harness {
        service,
        tests,
        profile_id,
        other_profile_id,
    }
}

fn request(profile_id: Uuid, word_count: usize) -> TestRequest {
    TestRequest {
        profile_id,
        language: "english".into(),
        sources: vec![
            SourceRequest::new("common"),
            SourceRequest::merged_with("rare", "probabilistic(20, 0.5)"),
        ],
        modifiers: vec!["capitalize".into(), "addSuffix(.)".into()],
        word_count,
        time_limit: None,
    }
}

fn results() -> TestResults {
    TestResults {
        accuracy: 97.5,
        raw_accuracy: 91.0,
        test_time: 21.3,
        error_count: 2,
        error_word_indices: vec![1, 4],
    }
}

fn non_completed(h: &Harness, profile_id: Uuid) -> usize {
    h.service
        .get_tests_by_profile_id(profile_id)
        .unwrap()
        .iter()
        .filter(|t| t.state() == TestState::NonCompleted)
        .count()
}

#[test]
fn re_requesting_keeps_only_the_newest_pending_test() {
    let h = harness();
    h.service.request_test(&request(h.profile_id, 5)).unwrap();
    h.service.request_test(&request(h.profile_id, 8)).unwrap();
    let newest = h.service.request_test(&request(h.profile_id, 12)).unwrap();

    assert_eq!(non_completed(&h, h.profile_id), 1);
    let last = h.service.get_last_test(h.profile_id).unwrap();
    assert_eq!(last.id, newest.id);
    assert_eq!(last.word_count, 12);
    assert_eq!(last.test.words.len(), 12);
}

#[test]
fn purge_spares_completed_tests_and_other_profiles() {
    let h = harness();
    let done = h.service.request_test(&request(h.profile_id, 5)).unwrap();
    h.service.submit_results(done.id, results()).unwrap();
    let others = h
        .service
        .request_test(&request(h.other_profile_id, 5))
        .unwrap();

    h.service.request_test(&request(h.profile_id, 6)).unwrap();

    assert!(h.service.get_test_by_id(done.id).is_ok());
    assert_eq!(
        h.service.get_last_test(h.other_profile_id).unwrap().id,
        others.id
    );
    assert_eq!(h.service.get_tests_by_profile_id(h.profile_id).unwrap().len(), 2);
}

#[test]
fn composed_words_follow_modifiers_and_sources() {
    let h = harness();
    let test = h.service.request_test(&request(h.profile_id, 10)).unwrap();

    for word in &test.test.words {
        assert!(word.ends_with('.'));
        assert!(word.starts_with('C') || word.starts_with('R'));
    }
    assert_eq!(test.test.modifiers, vec!["capitalize", "addSuffix(.)"]);
    let names: Vec<&str> = test.test.sources.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["common", "rare"]);
}

#[test]
fn second_submission_conflicts_and_keeps_first_results() {
    let h = harness();
    let test = h.service.request_test(&request(h.profile_id, 5)).unwrap();
    let first = h.service.submit_results(test.id, results()).unwrap();

    let mut again = results();
    again.accuracy = 12.0;
    assert_matches!(
        h.service.submit_results(test.id, again),
        Err(Error::Conflict(_))
    );

    let stored = h.service.get_test_by_id(test.id).unwrap();
    assert_eq!(stored.results(), Some(&results()));
    assert_eq!(stored.completed_at(), first.completed_at());
}

#[test]
fn submitting_unknown_test_is_not_found() {
    let h = harness();
    assert_matches!(
        h.service.submit_results(Uuid::new_v4(), results()),
        Err(Error::NotFound { .. })
    );
}

#[test]
fn pending_tests_are_hidden_by_id() {
    let h = harness();
    let test = h.service.request_test(&request(h.profile_id, 5)).unwrap();
    assert_matches!(
        h.service.get_test_by_id(test.id),
        Err(Error::NotFound { .. })
    );
    assert!(h.tests.get(test.id).unwrap().is_some());
}

#[test]
fn last_test_without_tests_is_not_found() {
    let h = harness();
    assert_matches!(
        h.service.get_last_test(h.profile_id),
        Err(Error::NotFound { .. })
    );
}

#[test]
fn failed_composition_leaves_pending_test_in_place() {
    let h = harness();
    let pending = h.service.request_test(&request(h.profile_id, 5)).unwrap();

    let mut bad = request(h.profile_id, 5);
    bad.sources[1] = SourceRequest::merged_with("rare", "probabilistic(20, 1.5)");
    assert_matches!(h.service.request_test(&bad), Err(Error::Configuration(_)));
    assert_eq!(h.service.get_last_test(h.profile_id).unwrap().id, pending.id);
}

#[test]
fn tests_are_listed_by_language() {
    let h = harness();
    h.service.request_test(&request(h.profile_id, 5)).unwrap();
    let italian = TestRequest {
        language: "italian".into(),
        sources: vec![SourceRequest::new("comuni")],
        modifiers: vec![],
        ..request(h.other_profile_id, 4)
    };
    let created = h.service.request_test(&italian).unwrap();

    let listed = h.service.get_tests_by_language("italian").unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, created.id);
    assert_eq!(h.service.get_tests_by_language("english").unwrap().len(), 1);
    assert!(h.service.get_tests_by_language("german").unwrap().is_empty());
}

#[test]
fn seeded_services_compose_identical_previews() {
    let a = harness();
    let b = harness();
    let sources = request(a.profile_id, 9).sources;
    let modifiers = vec!["uppercase".to_string()];

    let left = a.service.preview_test("english", &sources, &modifiers, 9).unwrap();
    let right = b.service.preview_test("english", &sources, &modifiers, 9).unwrap();
    assert_eq!(left.words, right.words);
}

#[test]
fn concurrent_requests_leave_one_pending_test() {
    let h = harness();
    let created: Vec<_> = thread::scope(|s| {
        let h = &h;
        let handles: Vec<_> = (0..16)
            .map(|i| s.spawn(move || h.service.request_test(&request(h.profile_id, 3 + i % 4))))
            .collect();
        handles.into_iter().map(|t| t.join().unwrap()).collect()
    });

    assert!(created.iter().all(Result::is_ok));
    assert_eq!(non_completed(&h, h.profile_id), 1);
    assert_eq!(h.service.get_tests_by_profile_id(h.profile_id).unwrap().len(), 1);
}

#[test]
fn concurrent_submissions_complete_once() {
    let h = harness();
    let test = h.service.request_test(&request(h.profile_id, 5)).unwrap();

    let outcomes: Vec<_> = thread::scope(|s| {
        let h = &h;
        let handles: Vec<_> = (0..16)
            .map(|i| {
                s.spawn(move || {
                    let mut results = results();
                    results.error_count = i;
                    h.service.submit_results(test.id, results)
                })
            })
            .collect();
        handles.into_iter().map(|t| t.join().unwrap()).collect()
    });

    let completed: Vec<_> = outcomes.iter().filter_map(|o| o.as_ref().ok()).collect();
    assert_eq!(completed.len(), 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|o| matches!(o, Err(Error::Conflict(_))))
            .count(),
        15
    );

    let stored = h.service.get_test_by_id(test.id).unwrap();
    assert_eq!(stored.results(), completed[0].results());
}
