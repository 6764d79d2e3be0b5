#![allow(clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::{
    predicate::str::{contains, is_empty},
    PredicateBooleanExt,
};
use udise_core::SelectedLocation;


use test_context::TestContext;

#[test]
fn test_profile_arg() {
    // --profile wins over UDISE_PROFILE
    let mut cmd = Command::cargo_bin("udise").unwrap();

    let assert = cmd
        .env("UDISE_PROFILE", "wrong_profile")
        .args(["--profile", "test_profile_arg"])
        .arg("config")
        .assert();

    assert
        .success()
        .stdout(
            contains(r#""profile_name": "test_profile_arg""#).and(contains(r#""api_url""#)),
        )
        .stderr(is_empty());
}

#[test]
fn test_profile_env() {
    let mut cmd = Command::cargo_bin("udise").unwrap();

    let assert = cmd
        .env("UDISE_PROFILE", "test_profile_env")
        .arg("config")
        .assert();

    assert
        .success()
        .stdout(contains(r#""profile_name": "test_profile_env""#))
        .stderr(is_empty());
}

#[test]
fn test_config_reads_profile_and_hides_token() {
    let ctx = TestContext::new();

    ctx.command()
        .env("UDISE_TOKEN", "s3cret")
        .arg("config")
        .assert()
        .success()
        .stdout(
            contains(r#""api_url": "http://127.0.0.1:9/api""#)
                .and(contains(r#""has_token": true"#))
                .and(contains("s3cret").not()),
        );
}

#[test]
fn test_api_url_flag_overrides_profile() {
    let ctx = TestContext::new();

    ctx.command()
        .args(["--api-url", "https://other.example/api/", "config"])
        .assert()
        .success()
        .stdout(contains(r#""api_url": "https://other.example/api""#));
}

#[test]
fn test_link_state_change_drops_district() {
    let ctx = TestContext::new();

    ctx.command()
        .args([
            "link",
            "--from",
            "?year=11&state=09&district=0901&page=3",
            "--set",
            "state=10",
        ])
        .assert()
        .success()
        .stdout("?page=1&state=10&year=11\n");
}

#[test]
fn test_link_clear_keeps_year_and_state() {
    let ctx = TestContext::new();

    ctx.command()
        .args([
            "link",
            "--from",
            "year=11&state=09&district=0901&type=primary&q=central",
            "--clear",
        ])
        .assert()
        .success()
        .stdout("?state=09&year=11\n");
}

#[test]
fn test_link_json() {
    let ctx = TestContext::new();

    ctx.command()
        .args([
            "link",
            "--from",
            "state=09",
            "--set",
            "management=all",
            "--page",
            "4",
            "--json",
        ])
        .assert()
        .success()
        .stdout(
            contains(r#""state": "09""#)
                .and(contains(r#""management": "all""#))
                .and(contains(r#""page": 4"#)),
        );
}

#[test]
fn test_link_rejects_malformed_edit() {
    let ctx = TestContext::new();

    ctx.command()
        .args(["link", "--set", "state"])
        .assert()
        .failure()
        .stderr(contains("Expected KEY=VALUE"));
}

#[test]
fn test_select_persists_and_cascades() {
    let ctx = TestContext::new();

    ctx.command()
        .args(["select", "--year", "11", "--state", "09", "--district", "0901"])
        .assert()
        .success()
        .stdout(contains("Selection saved: year=11 state=09 district=0901"));

    assert_eq!(
        ctx.profile().selection,
        SelectedLocation::new(
            Some("11".to_string()),
            Some("09".to_string()),
            Some("0901".to_string())
        )
    );

    // A new state forgets the district
    ctx.command()
        .args(["select", "--state", "10"])
        .assert()
        .success()
        .stdout(contains("year=11 state=10 district=-"));

    ctx.command()
        .args(["select", "--clear"])
        .assert()
        .success()
        .stdout(contains("year=- state=- district=-"));
    assert_eq!(ctx.profile().selection, SelectedLocation::default());
}

#[test]
fn test_schools_without_filters_is_idle() {
    let ctx = TestContext::new();

    ctx.command()
        .arg("schools")
        .assert()
        .success()
        .stdout(contains("Select a state, district, filter or search term"));
}

#[test]
fn test_schools_unreachable_backend() {
    let ctx = TestContext::new();

    ctx.command()
        .args(["schools", "--state", "09"])
        .assert()
        .failure()
        .stderr(contains("Failed to load schools"));
}

#[test]
fn test_sync_requires_selection() {
    let ctx = TestContext::new();

    ctx.command()
        .args(["sync", "directory", "--state", "09"])
        .assert()
        .failure()
        .stderr(contains("Select a year, state and district first"));

    ctx.command()
        .args(["sync", "gis", "--state", "09"])
        .assert()
        .failure()
        .stderr(contains("Select a state and district first"));
}

#[test]
fn test_sync_details_runs_directory_first() {
    let ctx = TestContext::new();

    ctx.command()
        .args([
            "sync",
            "details",
            "--year",
            "11",
            "--state",
            "09",
            "--district",
            "0901",
        ])
        .assert()
        .failure()
        .stdout(contains("Directory sync failed").and(contains("Details sync failed").not()))
        .stderr(contains("details were not synced"));
}

#[test]
fn test_sync_details_force_skips_directory() {
    let ctx = TestContext::new();

    ctx.command()
        .args([
            "sync",
            "details",
            "--force",
            "--year",
            "11",
            "--state",
            "09",
            "--district",
            "0901",
        ])
        .assert()
        .failure()
        .stdout(contains("Details sync failed").and(contains("Directory sync failed").not()))
        .stderr(contains("Sync did not complete"));
}

#[test]
fn test_sync_all_stops_on_failure() {
    let ctx = TestContext::new();

    ctx.command()
        .args(["select", "--year", "11", "--state", "09", "--district", "0901"])
        .assert()
        .success();

    ctx.command()
        .args(["sync", "all"])
        .assert()
        .failure()
        .stdout(contains("Directory sync failed").and(contains("GIS sync failed").not()))
        .stderr(contains("Sync did not complete"));
}

#[test]
fn test_export_requires_district() {
    let ctx = TestContext::new();

    ctx.command()
        .args(["export", "--state", "09", "-o"])
        .arg(ctx.temp_dir.path())
        .assert()
        .failure()
        .stderr(contains("district"));
}

#[test]
fn test_export_rejects_unknown_format() {
    let ctx = TestContext::new();

    ctx.command()
        .args(["export", "--district", "0901", "--format", "xlsx"])
        .assert()
        .failure()
        .stderr(contains("xlsx"));
}

#[test]
fn test_locations_master_states_need_year() {
    let ctx = TestContext::new();

    ctx.command()
        .args(["locations", "states"])
        .assert()
        .failure()
        .stderr(contains("Pass --year"));
}

#[test]
fn test_completions() {
    let ctx = TestContext::new();

    ctx.command()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(contains("udise"));
}
