//! Cross-crate scenarios: catalog files through the loader, into the
//! planner, out through build snapshots, and across foundation perks.

use std::path::PathBuf;

use fixed::types::I32F32;
use skilltree_core::id::{KeystoneId, SkillId};
use skilltree_core::snapshot::BuildSnapshot;
use skilltree_core::test_utils::*;
use skilltree_data::{DataLoadError, load_into, load_planner_config, sample_system, write_sample};
use skilltree_planner::{
    AllocationPolicy, BudgetSource, PlannerConfig, PlannerEvent, Rejection, RestoreError, SkillPlanner,
};

fn make_test_dir(suffix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "skilltree_integration_{suffix}_{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn auto_foundation() -> PlannerConfig {
    PlannerConfig {
        allocation_policy: AllocationPolicy::AutoFoundation,
        ..PlannerConfig::default()
    }
}

/// Raise each keystone to what `skill` requires, then buy one level.
fn buy_with_foundation(planner: &mut SkillPlanner, skill: &str) {
    let requirements = planner.catalog().skill(skill).unwrap().requirements;
    for keystone in KeystoneId::ALL {
        let needed = requirements.get(keystone);
        if planner.keystone_points(keystone) < needed {
            planner.set_keystone_points(keystone, needed).unwrap();
        }
    }
    planner.allocate_point(skill).unwrap();
}

// ===========================================================================
// A/B walkthrough, booleans only
// ===========================================================================

#[test]
fn example_walkthrough_outcomes() {
    let mut planner = SkillPlanner::from_system(example_system(), PlannerConfig::default());
    assert_eq!(planner.available_points(), 10);
    assert_eq!(planner.skill_level("A"), 1);

    assert!(!planner.can_allocate_point("B"));
    assert!(planner.allocate_point("B").is_err());
    assert_eq!(planner.available_points(), 10);

    assert!(planner.set_keystone_points(KeystoneId::Body, 5).is_ok());
    assert_eq!(planner.available_points(), 5);

    assert!(planner.can_allocate_point("B"));
    assert!(planner.allocate_point("B").is_ok());
    assert_eq!(planner.available_points(), 3);
    assert_eq!(planner.skill_level("B"), 1);

    assert!(planner.set_keystone_points(KeystoneId::Body, 0).is_err());
    assert!(planner.deallocate_point("B").is_ok());
    assert_eq!(planner.available_points(), 5);
    assert!(planner.set_keystone_points(KeystoneId::Body, 0).is_ok());
    assert_eq!(planner.available_points(), 10);
}

// ===========================================================================
// Perk scaling through the planner
// ===========================================================================

#[test]
fn perk_scaling_examples() {
    let mut planner = SkillPlanner::from_system(system(200, vec![]), PlannerConfig::default());

    planner.set_keystone_points(KeystoneId::Tech, 25).unwrap();
    let tech = planner.foundation_perks().tech;
    assert_eq!(tech.magnitude("nanoWireRange"), Some(I32F32::from_num(50)));
    assert_eq!(tech.magnitude("coreDamageReduction"), Some(I32F32::ZERO));

    planner.set_keystone_points(KeystoneId::Tech, 37).unwrap();
    let tech = planner.foundation_perks().tech;
    assert_eq!(tech.magnitude("coreDamageReduction"), Some(I32F32::from_num(10)));

    planner.set_keystone_points(KeystoneId::Body, 49).unwrap();
    assert_eq!(planner.foundation_perks().body.unlocked("aerialManeuver"), Some(false));

    planner.set_keystone_points(KeystoneId::Body, 50).unwrap();
    let body = planner.foundation_perks().body;
    assert_eq!(body.unlocked("aerialManeuver"), Some(true));
    assert_eq!(body.magnitude("bleedFireDamageReduction"), Some(I32F32::from_num(25)));
}

// ===========================================================================
// Files to planner
// ===========================================================================

#[test]
fn sample_file_round_trip_through_planner() {
    let dir = make_test_dir("sample");
    let catalog = dir.join("skills.json");
    let config = dir.join("planner.toml");
    write_sample(&catalog).unwrap();
    std::fs::write(&config, "budget_source = { fixed = 120 }\n").unwrap();

    let mut planner = SkillPlanner::with_config(load_planner_config(&config).unwrap());
    load_into(&mut planner, &catalog).unwrap();
    assert_eq!(planner.available_points(), 120);

    buy_with_foundation(&mut planner, "heavy-weapons");
    buy_with_foundation(&mut planner, "minigun");
    assert!(matches!(
        planner.deallocate_point("heavy-weapons"),
        Err(Rejection::HasDependents { ref dependent, .. }) if dependent.as_str() == "minigun"
    ));

    let snapshot_path = dir.join("build.json");
    std::fs::write(&snapshot_path, planner.snapshot().to_json().unwrap()).unwrap();
    let snapshot = BuildSnapshot::from_json(&std::fs::read_to_string(&snapshot_path).unwrap()).unwrap();

    let mut replica = SkillPlanner::with_config(*planner.config());
    load_into(&mut replica, &catalog).unwrap();
    replica.restore(&snapshot).unwrap();
    assert_eq!(replica.snapshot(), planner.snapshot());
    assert_eq!(replica.total_spent_points(), planner.total_spent_points());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn unsupported_catalog_extension() {
    let mut planner = SkillPlanner::new();
    let err = load_into(&mut planner, std::path::Path::new("skills.yaml")).unwrap_err();
    assert!(matches!(err, DataLoadError::UnsupportedFormat { .. }));
    assert!(planner.skills().is_empty());
}

// ===========================================================================
// Policies on the sample catalog
// ===========================================================================

#[test]
fn auto_foundation_on_sample() {
    let mut planner = SkillPlanner::from_system(sample_system().unwrap(), auto_foundation());
    planner.drain_events();

    // hydra needs body 10 and tech 10.
    assert_eq!(planner.allocation_cost("hydra"), Some(21));
    planner.allocate_point("hydra").unwrap();
    assert_eq!(planner.keystone_points(KeystoneId::Body), 10);
    assert_eq!(planner.keystone_points(KeystoneId::Tech), 10);
    assert_eq!(planner.available_points(), 79);

    let events = planner.drain_events();
    assert_eq!(events.len(), 3);
    assert!(matches!(
        events.last(),
        Some(PlannerEvent::SkillAllocated { keystone_cost: 20, cost: 1, .. })
    ));

    // Lowering a keystone the skill needs is still refused.
    assert!(matches!(
        planner.adjust_keystone_points(KeystoneId::Body, -1),
        Err(Rejection::WouldInvalidate { .. })
    ));
}

#[test]
fn strict_build_restores_under_auto_foundation() {
    let mut strict = SkillPlanner::from_system(sample_system().unwrap(), PlannerConfig::default());
    buy_with_foundation(&mut strict, "revolver");
    buy_with_foundation(&mut strict, "combat-core");
    buy_with_foundation(&mut strict, "reactive-core");
    let snapshot = strict.snapshot();

    let mut auto = SkillPlanner::from_system(sample_system().unwrap(), auto_foundation());
    auto.restore(&snapshot).unwrap();
    assert_eq!(auto.snapshot(), snapshot);
}

#[test]
fn restore_into_smaller_budget_fails_cleanly() {
    let mut rich = SkillPlanner::from_system(
        sample_system().unwrap(),
        PlannerConfig {
            budget_source: BudgetSource::Fixed(150),
            ..PlannerConfig::default()
        },
    );
    for keystone in KeystoneId::ALL {
        rich.set_keystone_points(keystone, 40).unwrap();
    }
    rich.allocate_point("hydra").unwrap();
    let snapshot = rich.snapshot();

    // 100 points cover body and tech at 40 but not hardware.
    let mut poor = SkillPlanner::from_system(sample_system().unwrap(), PlannerConfig::default());
    buy_with_foundation(&mut poor, "bison");
    let before = poor.snapshot();
    let revision = poor.revision();
    let err = poor.restore(&snapshot).unwrap_err();
    assert!(matches!(
        err,
        RestoreError::Keystone {
            keystone: KeystoneId::Hardware,
            source: Rejection::InsufficientPoints { needed: 40, available: 20 },
        }
    ));
    assert_eq!(poor.snapshot(), before);
    assert_eq!(poor.revision(), revision);
}

#[test]
fn clear_after_mixed_build() {
    let mut planner = SkillPlanner::from_system(sample_system().unwrap(), PlannerConfig::default());
    buy_with_foundation(&mut planner, "bison");
    buy_with_foundation(&mut planner, "piercingAmmo");
    buy_with_foundation(&mut planner, "detonator");
    assert_eq!(planner.skill_level("bison"), 2);

    let spent = planner.total_spent_points();
    assert_eq!(planner.clear_all_points(), spent);
    assert_eq!(planner.available_points(), 100);
    let granted: Vec<&SkillId> = {
        let mut ids: Vec<&SkillId> = planner.allocated_points().keys().collect();
        ids.sort();
        ids
    };
    assert_eq!(
        granted,
        vec![
            &SkillId::from("bison"),
            &SkillId::from("fists"),
            &SkillId::from("ironSights"),
            &SkillId::from("pistol"),
            &SkillId::from("standardAmmo"),
        ]
    );
}
