//! Git-backed collaborators against throwaway repositories.
//!
//! Tests that need the `git` executable skip themselves when it is absent.

use std::fs;
use std::path::Path;
use std::process::Command;

use benchtrail_bench::history::{HistoryOptions, HistoryRunner};
use benchtrail_bench::launcher::ProcessLauncher;
use benchtrail_bench::sync::ManifestSync;
use benchtrail_bench::vcs::{CheckoutRevision, GitRepository, RevisionSource, Vcs};
use benchtrail_core::constants::{CHILD_SUBCOMMAND, WORKTREES_DIR};
use benchtrail_core::errors::VcsError;
use benchtrail_storage::{ResultStore, SqliteResultStore};
use git2::{Oid, Repository, Signature, Time};

fn commit_file(repo: &Repository, name: &str, content: &str, seconds: i64) -> Oid {
    let workdir = repo.workdir().unwrap();
    fs::write(workdir.join(name), content).unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::new("bench", "bench@example.com", &Time::new(seconds, 0)).unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<_> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, &format!("add {name}"), &tree, &parents)
        .unwrap()
}

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[test]
fn resolves_references_and_reads_head() {
    let tmp = tempfile::tempdir().unwrap();
    let repo = Repository::init(tmp.path()).unwrap();
    let first = commit_file(&repo, "lib.txt", "v1", 1_600_000_000);
    let second = commit_file(&repo, "lib.txt", "v2", 1_600_086_400);

    let git = GitRepository::discover(tmp.path()).unwrap();
    assert_eq!(git.resolve("HEAD").unwrap(), second.to_string());
    assert_eq!(git.resolve("HEAD~1").unwrap(), first.to_string());
    assert_eq!(git.resolve(&first.to_string()[..10]).unwrap(), first.to_string());
    assert!(matches!(
        git.resolve("does-not-exist"),
        Err(VcsError::Resolve { .. })
    ));

    let head = CheckoutRevision::new(tmp.path()).current_revision().unwrap();
    assert_eq!(head.git_hash, second.to_string());
    assert_eq!(head.timestamp.timestamp(), 1_600_086_400);
}

#[test]
fn revision_outside_repository_fails() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(matches!(
        CheckoutRevision::new(tmp.path()).current_revision(),
        Err(VcsError::Revision { .. })
    ));
}

#[test]
fn worktree_lifecycle() {
    if !git_available() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let repo = Repository::init(tmp.path()).unwrap();
    let first = commit_file(&repo, "lib.txt", "v1", 1_600_000_000);
    commit_file(&repo, "lib.txt", "v2", 1_600_086_400);

    let git = GitRepository::discover(tmp.path()).unwrap();
    let wt = tmp.path().join(".benchtrail").join(WORKTREES_DIR).join("wt_first");
    git.create_detached_worktree(&wt, &first.to_string()).unwrap();

    assert_eq!(fs::read_to_string(wt.join("lib.txt")).unwrap(), "v1");
    let rev = CheckoutRevision::new(&wt).current_revision().unwrap();
    assert_eq!(rev.git_hash, first.to_string());

    git.remove_worktree(&wt).unwrap();
    assert!(!wt.exists());
}

#[test]
fn full_sweep_through_child_processes() {
    if !git_available() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let project = tmp.path().join("project");
    fs::create_dir_all(&project).unwrap();
    let repo = Repository::init(&project).unwrap();
    let first = commit_file(&repo, "lib.txt", "v1", 1_600_000_000);
    let second = commit_file(&repo, "lib.txt", "v2", 1_600_086_400);

    let bench_root = tmp.path().join("benches");
    fs::create_dir_all(&bench_root).unwrap();
    fs::write(
        bench_root.join("bench_core.toml"),
        "[[bench]]\ncategory = \"Iteration\"\nname = \"sum\"\nsizes = [10, 100]\nkernel = \"sum\"\n",
    )
    .unwrap();

    let git = GitRepository::discover(&project).unwrap();
    let sync = ManifestSync::with_command(vec!["git".to_string(), "status".to_string()]);
    let launcher = ProcessLauncher::new(vec![
        env!("CARGO_BIN_EXE_benchtrail").to_string(),
        CHILD_SUBCOMMAND.to_string(),
    ])
    .unwrap()
    .env("BENCHTRAIL_RUNS", "2");
    let data_dir = project.join(".benchtrail");
    let options = HistoryOptions {
        bench_root: bench_root.clone(),
        category: None,
        worktree_prefix_len: 8,
        keep_partitions: false,
    };
    let runner = HistoryRunner::new(&git, &sync, &launcher, &data_dir, options);
    let store = SqliteResultStore::open(&data_dir.join("bench.db")).unwrap();
    store.create().unwrap();

    let commits = vec!["HEAD~1".to_string(), "HEAD".to_string()];
    let report = runner.run(&commits, &store).unwrap();
    assert_eq!(report.succeeded(), 2, "{report:?}");

    let rows = store.scan().unwrap();
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|r| r.runs == 2));
    assert_eq!(rows[0].git_hash, first.to_string());
    assert_eq!(rows[3].git_hash, second.to_string());

    runner.run(&commits, &store).unwrap();
    assert_eq!(store.count().unwrap(), 4);
    assert_eq!(
        fs::read_dir(data_dir.join(WORKTREES_DIR)).unwrap().count(),
        0
    );
}

#[test]
fn history_command_from_project_directory() {
    if !git_available() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let project = tmp.path().join("project");
    fs::create_dir_all(&project).unwrap();
    let repo = Repository::init(&project).unwrap();
    let head = commit_file(&repo, "lib.txt", "v1", 1_600_000_000);

    let benches = project.join("benches");
    fs::create_dir_all(&benches).unwrap();
    fs::write(
        benches.join("bench_core.toml"),
        "[[bench]]\ncategory = \"Iteration\"\nname = \"max\"\nsizes = [16]\nkernel = \"max\"\n",
    )
    .unwrap();
    fs::write(
        project.join("benchtrail.toml"),
        "[run]\nruns = 2\n[history]\nsync_command = [\"git\", \"status\"]\n",
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_benchtrail"))
        .args(["history", "benches", "HEAD"])
        .current_dir(&project)
        .env("HOME", tmp.path())
        .env_remove("BENCHTRAIL_DATA_DIR")
        .env_remove("BENCHTRAIL_RUNS")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );

    let store = SqliteResultStore::open(&project.join(".benchtrail").join("bench.db")).unwrap();
    let rows = store.scan().unwrap();
    assert_eq!(rows.len(), 1, "{}", String::from_utf8_lossy(&output.stdout));
    assert_eq!(rows[0].git_hash, head.to_string());
    assert_eq!(rows[0].runs, 2);
    assert_eq!(
        fs::read_dir(project.join(".benchtrail").join(WORKTREES_DIR))
            .unwrap()
            .count(),
        0
    );
}
