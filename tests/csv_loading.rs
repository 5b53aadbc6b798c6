//! Loading title CSV files from disk.

use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use netflix_query::{
    Constraint, CsvOptions, QueryEngine, QueryError, RuntimeBucket, SharedTable, TitleTable,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn sample_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/titles_sample.csv")
}

fn write_csv(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_sample_dataset() {
    let table = TitleTable::from_csv(sample_path(), CsvOptions::default()).unwrap();
    assert_eq!(table.num_rows(), 20);
    assert_eq!(table.schema().fields().len(), 9);
    assert_eq!(
        table.numeric_columns(),
        vec!["release_year", "runtime", "imdb_score", "imdb_votes"]
    );

    let engine = QueryEngine::new(Arc::new(table));
    let best = engine.top_n("imdb_score", 1).unwrap();
    let title = best.batch.column_by_name("title").unwrap().as_string::<i32>();
    assert_eq!(title.value(0), "Breaking Bad");

    let dark = engine.title_info("Dark").unwrap().unwrap();
    assert_eq!(dark.release_year, Some(2017));
    assert_eq!(dark.imdb_votes, Some(384700.0));
}

#[test]
fn test_most_voted_by_year_and_type() {
    let table = TitleTable::from_csv(sample_path(), CsvOptions::default()).unwrap();
    let engine = QueryEngine::new(Arc::new(table));

    let movie = engine.most_voted(2019, "MOVIE").unwrap().unwrap();
    assert_eq!(movie.title.as_deref(), Some("The Irishman"));

    let show = engine.most_voted(2020, "SHOW").unwrap().unwrap();
    assert_eq!(show.title.as_deref(), Some("The Queen's Gambit"));

    // The data spells categories in English and upper case
    assert!(engine.most_voted(2019, "Filme").unwrap().is_none());
}

#[test]
fn test_malformed_numbers_load_as_missing() {
    let file = write_csv(
        "title;type;release_year;runtime;imdb_score;imdb_votes\n\
         A;MOVIE;2020;90;7.5;1000\n\
         B;MOVIE;unknown;90.5;N/A;\n\
         C;SHOW;2021; 45 ;nan;12\n",
    );
    let table = TitleTable::from_csv(file.path(), CsvOptions::default()).unwrap();
    let batch = table.batch();

    let years = batch.column_by_name("release_year").unwrap().as_primitive::<Int64Type>();
    assert!(years.is_null(1));

    let runtime = batch.column_by_name("runtime").unwrap().as_primitive::<Int64Type>();
    assert_eq!(runtime.value(0), 90);
    assert!(runtime.is_null(1));
    assert_eq!(runtime.value(2), 45);

    let scores = batch.column_by_name("imdb_score").unwrap().as_primitive::<Float64Type>();
    assert_eq!(scores.value(0), 7.5);
    assert!(scores.is_null(1));
    assert!(scores.is_null(2));

    let votes = batch.column_by_name("imdb_votes").unwrap().as_primitive::<Float64Type>();
    assert!(votes.is_null(1));
    assert_eq!(votes.value(2), 12.0);
}

#[test]
fn test_decimal_integers_keep_their_value() {
    let file = write_csv(
        "title;runtime;release_year\n\
         A;90.0;2020.0\n\
         B;90;2020\n",
    );
    let table = TitleTable::from_csv(file.path(), CsvOptions::default()).unwrap();
    let runtime = table.batch().column_by_name("runtime").unwrap().as_primitive::<Int64Type>();
    assert_eq!(runtime.values().to_vec(), vec![90, 90]);
    assert_eq!(runtime.null_count(), 0);

    let engine = QueryEngine::new(Arc::new(table));
    let typical = engine.filter_runtime(RuntimeBucket::Typical).unwrap();
    assert_eq!(typical.row_count, 2);

    let year = engine.filter_eq(&[Constraint::new("release_year", 2020)]).unwrap();
    assert_eq!(year.row_count, 2);
}

#[test]
fn test_missing_numeric_columns_are_skipped() {
    let file = write_csv("title;type\nA;MOVIE\nB;SHOW\n");
    let table = TitleTable::from_csv(file.path(), CsvOptions::default()).unwrap();
    assert_eq!(table.num_rows(), 2);
    assert!(table.numeric_columns().is_empty());
    assert_eq!(table.schema().field(0).data_type(), &DataType::Utf8);
}

#[test]
fn test_comma_delimited_file() {
    let file = write_csv("title,imdb_score\nA,7.0\nB,8.0\n");
    let table = TitleTable::from_csv(file.path(), CsvOptions::new().with_delimiter(b',')).unwrap();
    let engine = QueryEngine::new(Arc::new(table));
    let summary = engine.describe().unwrap();
    let mean = summary.batch.column(1).as_primitive::<Float64Type>().value(1);
    assert_eq!(mean, 7.5);
}

#[test]
fn test_shared_table_loads_once() {
    let shared = SharedTable::from_csv(sample_path(), CsvOptions::default());
    assert!(!shared.is_loaded());

    let first = shared.get().unwrap();
    let second = shared.get().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(shared.is_loaded());
}

#[test]
fn test_shared_table_missing_file_can_retry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("titles.csv");
    let shared = SharedTable::from_csv(&path, CsvOptions::default());

    let err = shared.get().unwrap_err();
    assert!(matches!(err, QueryError::Io(_)));
    assert!(!shared.is_loaded());

    std::fs::write(&path, "title;imdb_score\nA;7\n").unwrap();
    assert_eq!(shared.get().unwrap().num_rows(), 1);
}

#[test]
fn test_empty_file_fails() {
    let file = write_csv("");
    assert!(TitleTable::from_csv(file.path(), CsvOptions::default()).is_err());
}
