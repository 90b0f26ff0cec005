//! End-to-end tests: CSV on disk through to rendered report files.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use movie_dash::{
    Dashboard, DashboardConfig, DashError, DataLoader, PanelKind, Selection, SvgRenderer,
    TextRenderer, ViewLimits,
};

const CSV: &str = "\
tconst,titleType,primaryTitle,runtimeMinutes,genres,startYear,averageRating,numVotes
tt01,movie,Heat,170,\"Action,Crime,Drama\",1995,8.3,700000
tt02,movie,Casino,178,\"Crime,Drama\",1995,8.2,550000
tt03,movie,Se7en,127,\"Crime,Drama,Mystery\",1995,8.6,1700000
tt04,movie,Toy Story,81,\"Adventure,Animation,Comedy\",1995,8.3,1000000
tt05,movie,Nosferatu,94,Horror,1922,7.9,100000
tt06,movie,Intolerance,163,\"Drama,History\",1916,7.7,16000
tt07,movie,Unknown,\\N,\\N,1995,6.0,10
tt08,movie,Late Cut,abc,Drama,\\N,7.0,20
tt09,movie,Quiet One,90,Drama,1995,\\N,\\N
tt10,movie,Blue Film,80,\"Adult,Drama\",1995,5.0,300
tt11,movie,Small Drama,95,Drama,1995,8.3,\\N
";

fn write_csv() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("movie_rank.csv");
    let mut file = fs::File::create(&path).unwrap();
    file.write_all(CSV.as_bytes()).unwrap();
    (dir, path)
}

fn load() -> (tempfile::TempDir, Dashboard) {
    let (dir, path) = write_csv();
    let dashboard = Dashboard::load(&path, &DataLoader::new(), DashboardConfig::default()).unwrap();
    (dir, dashboard)
}

fn categories(dashboard: &Dashboard, kind: PanelKind, selection: &Selection) -> Vec<String> {
    dashboard
        .panel(kind, selection)
        .unwrap()
        .chart
        .bars
        .into_iter()
        .map(|b| b.category)
        .collect()
}

#[test]
fn cleaning_report_from_file() {
    let (_dir, dashboard) = load();
    let report = dashboard.cleaning_report().copied().unwrap();

    assert_eq!(report.total_rows, 11);
    // Unknown (no genres), Late Cut (no year), Quiet One (no rating)
    assert_eq!(report.dropped_rows, 3);
    assert_eq!(report.kept_rows, 8);
    assert_eq!(report.runtime_coerced, 1);
}

#[test]
fn selection_lists_exclude_adult_and_early_years() {
    let (_dir, dashboard) = load();

    assert_eq!(
        dashboard.genres().unwrap(),
        vec!["Action", "Adventure", "Animation", "Comedy", "Crime", "Drama", "Horror", "Mystery"]
    );
    assert_eq!(dashboard.years().unwrap(), vec![1922, 1995]);
}

#[test]
fn four_panels_for_drama_1995() {
    let (_dir, dashboard) = load();
    let selection = Selection::new("Drama", 1995);

    assert_eq!(
        categories(&dashboard, PanelKind::TopRated, &selection),
        vec!["Se7en", "Heat", "Small Drama", "Casino", "Blue Film"]
    );
    assert_eq!(
        categories(&dashboard, PanelKind::TopVotedOverall, &selection),
        vec!["Se7en", "Toy Story", "Heat", "Casino", "Nosferatu", "Intolerance", "Blue Film"]
    );
    assert_eq!(
        categories(&dashboard, PanelKind::TopVotedInGenre, &selection),
        vec!["Se7en", "Heat", "Casino", "Blue Film"]
    );

    let scored = categories(&dashboard, PanelKind::GenreScore, &selection);
    assert!(!scored.contains(&"Adult".to_string()));
    // Intolerance is older than the browsable cut-off but still scores History
    assert!(scored.contains(&"History".to_string()));
}

#[test]
fn empty_combination_renders_empty_chart() {
    let (_dir, dashboard) = load();
    let selection = Selection::new("Comedy", 1922);

    assert!(dashboard.validate(&selection).is_ok());
    let panel = dashboard.panel(PanelKind::TopRated, &selection).unwrap();
    assert!(panel.chart.is_empty());

    let text = dashboard
        .render_panels(&[panel], &TextRenderer::default())
        .unwrap();
    assert!(text[0].body.contains("(no data)"));
}

#[test]
fn write_svg_report() {
    let (dir, dashboard) = load();
    let out = dir.path().join("report");

    let written = dashboard
        .write_report(&out, &Selection::new("Crime", 1995), &SvgRenderer::default())
        .unwrap();

    assert_eq!(written.len(), 5);
    assert_eq!(written.last().unwrap().file_name().unwrap(), "index.html");
    for path in &written {
        assert!(path.exists(), "missing {}", path.display());
    }

    let index = fs::read_to_string(out.join("index.html")).unwrap();
    assert!(index.contains("Year: 1995 | Genre: Crime"));
    assert_eq!(index.matches("<svg").count(), 4);

    let top_rated = fs::read_to_string(out.join("top_rated.svg")).unwrap();
    assert!(top_rated.contains("<title>Se7en: 8.6\nstartYear: 1995</title>"));
}

#[test]
fn write_text_report_has_no_index() {
    let (dir, dashboard) = load();
    let out = dir.path().join("text");

    let written = dashboard
        .write_report(&out, &Selection::new("Horror", 1922), &TextRenderer::default())
        .unwrap();

    assert_eq!(written.len(), 4);
    assert!(!out.join("index.html").exists());
    let body = fs::read_to_string(out.join("top_rated.txt")).unwrap();
    assert!(body.contains("Nosferatu"));
}

#[test]
fn custom_limits_apply() {
    let (_dir, path) = write_csv();
    let config = DashboardConfig::default().with_limits(ViewLimits {
        top_rated: 2,
        top_voted_overall: 3,
        top_voted_per_genre: 1,
        min_mean_votes: 10.0,
    });
    let dashboard = Dashboard::load(&path, &DataLoader::new(), config).unwrap();
    let selection = Selection::new("Drama", 1995);

    let panels = dashboard.panels(&selection).unwrap();
    assert_eq!(panels[0].chart.len(), 2);
    assert_eq!(panels[0].chart.labels.title, "Top 2 movies in genre Drama");
    assert_eq!(panels[2].chart.len(), 3);
    assert_eq!(panels[3].chart.len(), 1);
}

#[test]
fn invalid_path_fails_fast() {
    let result = Dashboard::load(
        "does/not/exist.csv",
        &DataLoader::new(),
        DashboardConfig::default(),
    );
    match result {
        Err(e) => assert!(e.is_load_error()),
        Ok(_) => panic!("expected a load error"),
    }
}

#[test]
fn invalid_schema_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    fs::write(&path, "title,year\nHeat,1995\n").unwrap();

    let result = Dashboard::load(&path, &DataLoader::new(), DashboardConfig::default());
    assert!(matches!(result, Err(DashError::MissingColumn { .. })));
}
