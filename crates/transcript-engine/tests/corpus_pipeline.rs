//! End-to-end runs over a transcript directory on disk

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use transcript_engine::export::{write_records_csv, write_relations_csv, write_tally_csv};
use transcript_engine::{
    ContextPolicy, EngineConfig, EngineError, MatchMode, TallyGrouping, TranscriptEngine,
    UndatedPolicy,
};

fn write_corpus(dir: &Path) {
    fs::write(
        dir.join("PV1959-03-05.xml"),
        r#"<?xml version="1.0" encoding="UTF-8"?>
<pv>
  <u class="nom">M. Léon Noël</u>
  <p>La séance est ouverte. Le Conseil examine la loi organique.</p>
  <u class="nom">M. Michard-Pellissier</u>
  <p>Cette loi appelle une remarque.</p>
  <u class="nom">M. Michard-Pellissier</u>
  <p>Je poursuis.</p>
</pv>"#,
    )
    .unwrap();

    fs::write(
        dir.join("PV1960-01-12-13_v1.2.xhtml"),
        r#"<html><body>
  <u class="nom">M. Léon Noël</u>
  <p>Le décret du 12 janvier.<br>Aucune loi.</p>
  <u class="nom">M. Pasteur Vallery-Radot</u>
  <p>D'accord.</p>
</body></html>"#,
    )
    .unwrap();

    fs::write(
        dir.join("PV_annexe.xml"),
        r#"<annexe><p>Texte de la loi annexée.</p></annexe>"#,
    )
    .unwrap();

    // Broken markup, must not abort the run
    fs::write(
        dir.join("PV1961-05-02.xml"),
        b"<pv><u class=\"nom\">X</u><p>loi \xff <!-- non ferme",
    )
    .unwrap();

    fs::write(dir.join("lisez-moi.txt"), "loi loi loi").unwrap();
}

fn engine_for(dir: &Path, edit: impl FnOnce(&mut EngineConfig)) -> TranscriptEngine {
    let mut config = EngineConfig::default();
    config.corpus.directory = dir.to_path_buf();
    edit(&mut config);
    TranscriptEngine::new(config)
}

#[test]
fn search_tallies_per_document() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());
    let engine = engine_for(dir.path(), |_| {});

    let documents = engine.load_corpus().unwrap();
    assert_eq!(documents.len(), 4);

    let report = engine.search(&documents, "loi").unwrap();
    assert_eq!(
        report.tally.keys(),
        vec!["1959-03-05", "1960-01-12-13", "1961-05-02", "_annexe"]
    );
    assert_eq!(report.tally.get("1959-03-05"), Some(2));
    assert_eq!(report.tally.get("1960-01-12-13"), Some(1));
    assert_eq!(report.tally.get("1961-05-02"), Some(0));
    assert_eq!(report.tally.get("_annexe"), Some(1));
    assert_eq!(report.total_matches, 4);
}

#[test]
fn search_by_year_within_range() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());
    let engine = engine_for(dir.path(), |config| {
        config.search.grouping = TallyGrouping::Year;
        config.search.context = ContextPolicy::CharWindow { radius: 10 };
        config.search.date_from = NaiveDate::from_ymd_opt(1960, 1, 1);
        config.search.date_to = NaiveDate::from_ymd_opt(1960, 12, 31);
        config.search.undated = UndatedPolicy::Exclude;
    });

    let documents = engine.load_corpus().unwrap();
    let report = engine.search(&documents, "loi/décret").unwrap();

    assert_eq!(report.tally.keys(), vec!["1960"]);
    assert_eq!(report.tally.get("1960"), Some(2));
    assert_eq!(report.documents_skipped, 3);

    let mut out = Vec::new();
    write_records_csv(&report.records, &mut out).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "identifier,date,context\n\
         1960-01-12-13,1960-01-12,n Noël Le décret du 12 jan\n\
         1960-01-12-13,1960-01-12,r. Aucune loi. M. Paste\n"
    );
}

#[test]
fn substring_mode_finds_inflected_forms() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());
    let engine = engine_for(dir.path(), |config| {
        config.search.mode = MatchMode::Substring;
    });

    let documents = engine.load_corpus().unwrap();
    let report = engine.search(&documents, "annex").unwrap();
    assert_eq!(report.tally.get("_annexe"), Some(1));
    assert_eq!(report.total_matches, 1);
}

#[test]
fn repeated_runs_are_identical() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());
    let engine = engine_for(dir.path(), |config| config.search.parallel = true);

    let documents = engine.load_corpus().unwrap();
    let first = engine.search(&documents, "loi").unwrap();
    let second = engine.search(&documents, "loi").unwrap();
    assert_eq!(first, second);

    let mut a = Vec::new();
    let mut b = Vec::new();
    write_tally_csv(&first.tally, &mut a).unwrap();
    write_tally_csv(&second.tally, &mut b).unwrap();
    assert_eq!(a, b);
}

#[test]
fn no_occurrences_is_reported_explicitly() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());
    let engine = engine_for(dir.path(), |_| {});

    let documents = engine.load_corpus().unwrap();
    let report = engine.search(&documents, "ordonnance").unwrap();
    assert!(!report.has_occurrences());
    assert!(report.records.is_empty());
}

#[test]
fn empty_query_fails_before_processing() {
    let engine = TranscriptEngine::default();
    assert!(matches!(
        engine.search(&[], " / "),
        Err(EngineError::InvalidQuery(_))
    ));
}

#[test]
fn relations_across_corpus() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());
    let engine = engine_for(dir.path(), |_| {});

    let documents = engine.load_corpus().unwrap();
    let counts = engine.count_relations(&documents);

    assert_eq!(counts.get("M. Léon Noël", "M. Michard-Pellissier"), 1);
    assert_eq!(counts.get("M. Léon Noël", "M. Pasteur Vallery-Radot"), 1);
    assert_eq!(counts.get("M. Michard-Pellissier", "M. Michard-Pellissier"), 0);
    assert_eq!(counts.total(), 2);

    let mut out = Vec::new();
    write_relations_csv(&counts, &mut out).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "speaker_1,speaker_2,count\n\
         M. Léon Noël,M. Michard-Pellissier,1\n\
         M. Léon Noël,M. Pasteur Vallery-Radot,1\n"
    );
}
