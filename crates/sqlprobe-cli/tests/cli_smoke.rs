use assert_cmd::Command;
use predicates::prelude::*;

fn sqlprobe() -> Command {
    Command::cargo_bin("sqlprobe").expect("binary built")
}

#[test]
fn help_lists_all_subcommands() {
    sqlprobe()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("compare"))
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("rewrite"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn init_writes_a_loadable_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sqlprobe.yaml");

    sqlprobe()
        .args(["init", "--path", path.to_str().unwrap()])
        .assert()
        .success();

    let cfg = sqlprobe_core::config::load_config(&path).expect("generated config loads");
    assert_eq!(cfg.runs, 5);
}

#[test]
fn init_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sqlprobe.yaml");
    std::fs::write(&path, "db:\n  dbname: keep\n").unwrap();

    sqlprobe()
        .args(["init", "--path", path.to_str().unwrap()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));

    let kept = std::fs::read_to_string(&path).unwrap();
    assert!(kept.contains("keep"));
}

#[test]
fn missing_config_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    sqlprobe()
        .current_dir(dir.path())
        .args(["run", "--config", "nope.yaml", "--corpus", "nope.csv"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("fatal"));
}

#[test]
fn analyze_produces_a_report_from_measurement_files() {
    let dir = tempfile::tempdir().unwrap();
    let baseline = dir.path().join("baseline.csv");
    let rewritten = dir.path().join("rewritten.csv");
    let equivalence = dir.path().join("equivalence.csv");
    let out = dir.path().join("report.csv");

    let headers = "TaskNo,ResponseId,Difficulty,Query,time_pg_1,time_pg_2,time_pg_3,time_pg_4,time_pg_5,avg_pg_time,median_pg_time,avg_cost,avg_rows";
    std::fs::write(
        &baseline,
        format!("{headers}\n1,1,Easy,SELECT 1,100,102,98,101,99,100,100,500,10\n"),
    )
    .unwrap();
    std::fs::write(
        &rewritten,
        format!("{headers}\n1,1,Easy,SELECT 1,10,12,9,11,10.5,10.5,10.5,50,10\n"),
    )
    .unwrap();
    std::fs::write(
        &equivalence,
        "TaskNo,ResponseId,ordered_equal,except_equal\n1,1,FALSE,TRUE\n",
    )
    .unwrap();

    sqlprobe()
        .args([
            "analyze",
            "--baseline",
            baseline.to_str().unwrap(),
            "--rewritten",
            rewritten.to_str().unwrap(),
            "--equivalence",
            equivalence.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ])
        .assert()
        .success();

    let report = std::fs::read_to_string(&out).unwrap();
    let mut lines = report.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("TaskNo,ResponseId,Difficulty"));
    assert!(header.ends_with("equivalent_query"));
    let row = lines.next().unwrap();
    assert!(row.contains(",significant,"));
    assert!(!row.contains("not significant"));
    assert!(row.contains("-89.5"));
    assert!(row.ends_with("TRUE"));
}

#[test]
fn analyze_marks_unreadable_samples_as_error() {
    let dir = tempfile::tempdir().unwrap();
    let baseline = dir.path().join("baseline.csv");
    let rewritten = dir.path().join("rewritten.csv");
    let equivalence = dir.path().join("equivalence.csv");
    let out = dir.path().join("report.csv");

    let headers = "TaskNo,ResponseId,Query,time_pg_1,time_pg_2,time_pg_3,time_pg_4,time_pg_5,avg_pg_time,median_pg_time,avg_cost,avg_rows";
    std::fs::write(
        &baseline,
        format!("{headers}\n1,1,SELECT 1,100,error,98,101,99,error,100,500,10\n"),
    )
    .unwrap();
    std::fs::write(
        &rewritten,
        format!("{headers}\n1,1,SELECT 1,10,12,9,11,10.5,10.5,10.5,50,10\n"),
    )
    .unwrap();
    std::fs::write(&equivalence, "TaskNo,ResponseId,except_equal\n1,1,ERROR\n").unwrap();

    sqlprobe()
        .args([
            "analyze",
            "--baseline",
            baseline.to_str().unwrap(),
            "--rewritten",
            rewritten.to_str().unwrap(),
            "--equivalence",
            equivalence.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ])
        .assert()
        .success();

    let report = std::fs::read_to_string(&out).unwrap();
    let row = report.lines().nth(1).unwrap();
    assert!(row.contains(",error,error,"));
    assert!(row.ends_with("ERROR"));
}

#[test]
fn analyze_rejects_missing_equivalence_column() {
    let dir = tempfile::tempdir().unwrap();
    let baseline = dir.path().join("baseline.csv");
    let rewritten = dir.path().join("rewritten.csv");
    let equivalence = dir.path().join("equivalence.csv");
    std::fs::write(&baseline, "TaskNo,ResponseId,Query\n1,1,SELECT 1\n").unwrap();
    std::fs::write(&rewritten, "TaskNo,ResponseId,Query\n1,1,SELECT 1\n").unwrap();
    std::fs::write(&equivalence, "TaskNo,ResponseId\n1,1\n").unwrap();

    sqlprobe()
        .args([
            "analyze",
            "--baseline",
            baseline.to_str().unwrap(),
            "--rewritten",
            rewritten.to_str().unwrap(),
            "--equivalence",
            equivalence.to_str().unwrap(),
            "--out",
            dir.path().join("out.csv").to_str().unwrap(),
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("except_equal"));
}
