use std::fs;
use std::path::{Path, PathBuf};

use trace_core::{Processor, validate_all};

#[test]
fn golden_fixtures() -> Result<(), Box<dyn std::error::Error>> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
    let fixtures_dir = root.join("tests/fixtures");
    let expect_dir = root.join("tests/expect");

    let mut fixtures = collect_fixtures(&fixtures_dir)?;
    fixtures.sort_by(|a, b| file_name(a).cmp(file_name(b)));
    assert!(!fixtures.is_empty(), "no fixtures found");

    let processor = Processor::default();
    for fixture in fixtures {
        let name = file_stem(&fixture)?;
        let source = fs::read_to_string(&fixture)?;
        let result = processor.process(&source);

        let html_path = expect_dir.join(format!("{}.html", name));
        if html_path.exists() {
            let expected = fs::read_to_string(&html_path)?;
            assert_eq!(
                result.html.trim_end(),
                expected.trim_end(),
                "HTML mismatch for fixture {}",
                name
            );
        }

        let report = validate_all(&source, processor.config().scan_limit);
        let diagnostics: Vec<_> = report.diagnostics().cloned().collect();
        let diag_path = expect_dir.join(format!("{}.diag.json", name));
        if diag_path.exists() {
            let expected: serde_json::Value = serde_json::from_str(&fs::read_to_string(&diag_path)?)?;
            let actual = serde_json::to_value(&diagnostics)?;
            assert_eq!(actual, expected, "Diagnostics mismatch for fixture {}", name);
        } else if !diagnostics.is_empty() {
            panic!(
                "Unexpected diagnostics for fixture {}: {}",
                name,
                serde_json::to_string_pretty(&diagnostics)?
            );
        }
    }

    Ok(())
}

fn collect_fixtures(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut fixtures = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("html") {
            fixtures.push(path);
        }
    }
    Ok(fixtures)
}

fn file_name(path: &Path) -> &str {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("")
}

fn file_stem(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|value| value.to_string())
        .ok_or_else(|| "fixture name is not valid UTF-8".into())
}
