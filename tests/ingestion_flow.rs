mod common;

use std::sync::Arc;

use airport_traffic::app::ports::ExtractionError;
use airport_traffic::pipeline::dataset::Dataset;
use airport_traffic::pipeline::dedup::DedupPolicy;
use airport_traffic::pipeline::repository::DatasetRepository;
use airport_traffic::pipeline::storage::InMemoryBlobStore;
use airport_traffic::TrafficError;

use common::{document, record, use_case, ScriptedFields};

fn repository() -> DatasetRepository {
    DatasetRepository::new(Arc::new(InMemoryBlobStore::new()))
}

fn sep_report() -> ScriptedFields {
    ScriptedFields::new().answer(
        "APAO_Sep24.pdf",
        vec![
            record("Pune", "Sep", 2024, 100.0),
            record("Goa", "Sep", 2024, 80.0),
            record("Nagpur", "Sep", 2024, 40.0),
        ],
    )
}

#[tokio::test]
async fn test_reingest_is_skipped_by_name_under_layered_policy() {
    let fields = Arc::new(sep_report());
    let ingest = use_case(fields.clone());
    let repo = repository();
    let mut dataset = Dataset::new();

    let first = ingest.run(&mut dataset, &repo, vec![document("APAO_Sep24.pdf")]).await.unwrap();
    assert_eq!(first.accepted, 3);
    assert_eq!(dataset.ledger().get("APAO_Sep24.pdf").unwrap().record_count, 3);

    let second = ingest.run(&mut dataset, &repo, vec![document("APAO_Sep24.pdf")]).await.unwrap();
    assert_eq!(second.accepted, 0);
    assert_eq!(second.skipped_files, 1);
    assert_eq!(dataset.len(), 3);
    assert_eq!(fields.calls(), 1);
}

#[tokio::test]
async fn test_reingest_under_record_policy_adds_nothing() {
    let fields = Arc::new(sep_report());
    let ingest = use_case(fields.clone()).with_policy(DedupPolicy::Record);
    let repo = repository();
    let mut dataset = Dataset::new();

    ingest.run(&mut dataset, &repo, vec![document("APAO_Sep24.pdf")]).await.unwrap();
    let second = ingest.run(&mut dataset, &repo, vec![document("APAO_Sep24.pdf")]).await.unwrap();

    assert_eq!(fields.calls(), 2);
    assert_eq!(second.accepted, 0);
    assert_eq!(second.skipped_records, 3);
    assert_eq!(dataset.len(), 3);
    assert!(dataset.ledger_is_consistent());
}

#[tokio::test]
async fn test_reingest_under_record_policy_keeps_ledger_count_in_step() {
    let repo = repository();
    let mut dataset = Dataset::new();

    use_case(Arc::new(sep_report()))
        .with_policy(DedupPolicy::Record)
        .run(&mut dataset, &repo, vec![document("APAO_Sep24.pdf")])
        .await
        .unwrap();

    // a revised report under the same name adds one airport
    let revised = Arc::new(ScriptedFields::new().answer(
        "APAO_Sep24.pdf",
        vec![
            record("Pune", "Sep", 2024, 100.0),
            record("Goa", "Sep", 2024, 80.0),
            record("Nagpur", "Sep", 2024, 40.0),
            record("Indore", "Sep", 2024, 30.0),
        ],
    ));
    let second = use_case(revised)
        .with_policy(DedupPolicy::Record)
        .run(&mut dataset, &repo, vec![document("APAO_Sep24.pdf")])
        .await
        .unwrap();

    assert_eq!(second.accepted, 1);
    assert_eq!(second.skipped_records, 3);
    assert_eq!(dataset.len(), 4);
    assert_eq!(dataset.ledger().get("APAO_Sep24.pdf").unwrap().record_count, 4);
    assert!(dataset.ledger_is_consistent());

    let reloaded = repo.load().await.unwrap();
    assert_eq!(reloaded.ledger().get("APAO_Sep24.pdf").unwrap().record_count, 4);
    assert!(reloaded.ledger_is_consistent());
}

#[tokio::test]
async fn test_duplicates_within_and_across_files_in_one_run() {
    let fields = Arc::new(
        ScriptedFields::new()
            .answer(
                "a.csv",
                vec![
                    record("Pune", "Sep", 2024, 100.0),
                    record(" PUNE ", "September", 2024, 999.0),
                ],
            )
            .answer(
                "b.csv",
                vec![record("pune", "sep", 2024, 5.0), record("Goa", "Sep", 2024, 80.0)],
            ),
    );
    let ingest = use_case(fields);
    let mut dataset = Dataset::new();

    let summary = ingest
        .run(&mut dataset, &repository(), vec![document("b.csv"), document("a.csv")])
        .await
        .unwrap();

    assert_eq!(summary.accepted, 2);
    assert_eq!(summary.skipped_records, 2);
    assert_eq!(summary.accepted_by_file["a.csv"], 1);
    assert_eq!(summary.accepted_by_file["b.csv"], 1);

    // first occurrence wins
    let pune = dataset.records().iter().find(|r| r.airport_name == "Pune").unwrap();
    assert_eq!(pune.passengers.total, 100.0);
    assert_eq!(pune.source_file.as_deref(), Some("a.csv"));
    assert!(dataset.duplicate_keys().is_empty());
}

#[tokio::test]
async fn test_files_are_processed_in_name_order() {
    let fields = Arc::new(ScriptedFields::new());
    let ingest = use_case(fields.clone());
    let mut dataset = Dataset::new();

    let summary = ingest
        .run(
            &mut dataset,
            &repository(),
            vec![document("c.txt"), document("a.txt"), document("b.txt")],
        )
        .await
        .unwrap();

    assert_eq!(fields.seen(), vec!["a.txt", "b.txt", "c.txt"]);
    assert_eq!(summary.files_touched, vec!["a.txt", "b.txt", "c.txt"]);
    // extracted files are registered even when they contributed nothing
    assert_eq!(dataset.ledger().len(), 3);
    assert!(summary.message().contains("no records were found"));
}

#[tokio::test]
async fn test_failure_aborts_queue_and_keeps_earlier_commits() {
    let fields = Arc::new(
        ScriptedFields::new()
            .answer("a.txt", vec![record("Pune", "Jan", 2024, 1.0)])
            .fail("b.txt", ExtractionError::terminal("bad request"))
            .answer("c.txt", vec![record("Goa", "Jan", 2024, 1.0)]),
    );
    let ingest = use_case(fields.clone());
    let store = Arc::new(InMemoryBlobStore::new());
    let repo = DatasetRepository::new(store.clone());
    let mut dataset = Dataset::new();

    let err = ingest
        .run(
            &mut dataset,
            &repo,
            vec![document("a.txt"), document("b.txt"), document("c.txt")],
        )
        .await
        .unwrap_err();

    match err {
        TrafficError::Extraction { file, source } => {
            assert_eq!(file, "b.txt");
            assert!(!source.is_retryable());
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(fields.seen(), vec!["a.txt", "b.txt"]);
    assert_eq!(dataset.len(), 1);
    assert!(dataset.ledger().has("a.txt"));
    assert!(!dataset.ledger().has("b.txt"));

    // the committed file was persisted before the failure
    let reloaded = DatasetRepository::new(store).load().await.unwrap();
    assert_eq!(reloaded.len(), 1);
    assert!(reloaded.ledger().has("a.txt"));
}

#[tokio::test]
async fn test_transient_failures_are_bounded() {
    let fields = Arc::new(ScriptedFields::new().fail(
        "busy.pdf",
        ExtractionError::from_status(429, "quota exceeded"),
    ));
    let ingest = use_case(fields.clone());
    let mut dataset = Dataset::new();

    let err = ingest
        .run(&mut dataset, &repository(), vec![document("busy.pdf")])
        .await
        .unwrap_err();

    assert!(matches!(err, TrafficError::Extraction { .. }));
    // one initial call plus three retries
    assert_eq!(fields.calls(), 4);
    assert!(dataset.is_empty());
    assert!(dataset.ledger().is_empty());
}

#[tokio::test]
async fn test_delete_file_cascades_and_allows_reingest() {
    let fields = Arc::new(sep_report());
    let ingest = use_case(fields.clone());
    let repo = repository();
    let mut dataset = Dataset::new();
    dataset.insert_manual(record("Chennai", "Sep", 2024, 10.0));

    ingest.run(&mut dataset, &repo, vec![document("APAO_Sep24.pdf")]).await.unwrap();
    assert_eq!(dataset.len(), 4);

    let removed = dataset.remove_file("APAO_Sep24.pdf");
    assert_eq!(removed.records_removed, 3);
    assert!(removed.meta.is_some());
    assert_eq!(dataset.len(), 1);
    assert!(dataset.records()[0].is_manual());

    let again = ingest.run(&mut dataset, &repo, vec![document("APAO_Sep24.pdf")]).await.unwrap();
    assert_eq!(again.accepted, 3);
    assert_eq!(fields.calls(), 2);
    assert!(dataset.ledger_is_consistent());
}

#[tokio::test]
async fn test_manual_record_blocks_extracted_duplicate() {
    let fields = Arc::new(sep_report());
    let ingest = use_case(fields);
    let mut dataset = Dataset::new();
    assert!(dataset.insert_manual(record("Goa", "September", 2024, 1.0)));

    let summary = ingest
        .run(&mut dataset, &repository(), vec![document("APAO_Sep24.pdf")])
        .await
        .unwrap();

    assert_eq!(summary.accepted, 2);
    assert_eq!(summary.skipped_records, 1);
    assert_eq!(dataset.ledger().get("APAO_Sep24.pdf").unwrap().record_count, 2);
}

#[tokio::test]
async fn test_unrecognized_months_are_counted() {
    let fields = Arc::new(ScriptedFields::new().answer(
        "fy.csv",
        vec![record("Pune", "FY24", 2024, 1.0), record("Pune", "Jan", 2024, 2.0)],
    ));
    let ingest = use_case(fields);
    let mut dataset = Dataset::new();

    let summary = ingest
        .run(&mut dataset, &repository(), vec![document("fy.csv")])
        .await
        .unwrap();

    // "FY24" falls back to January and collides with the real January row
    assert_eq!(summary.unrecognized_months, 1);
    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.skipped_records, 1);
}
