//! Property-based tests for the allocation engine.
//!
//! Random command sequences run against the branching test catalog under
//! both allocation policies; after every command the build must still be
//! internally consistent.

use proptest::prelude::*;
use skilltree_core::catalog::SkillSystem;
use skilltree_core::id::KeystoneId;
use skilltree_core::test_utils::*;
use skilltree_planner::{AllocationPolicy, BudgetSource, PlannerConfig, SkillPlanner};

const SKILLS: [&str; 7] = ["root", "blade", "edge", "relay", "uplink", "rig", "missing"];

// ===========================================================================
// Generators
// ===========================================================================

#[derive(Debug, Clone)]
enum Op {
    Allocate(usize),
    Deallocate(usize),
    SetKeystone(usize, u32),
    AdjustKeystone(usize, i32),
    Clear,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..SKILLS.len()).prop_map(Op::Allocate),
        2 => (0..SKILLS.len()).prop_map(Op::Deallocate),
        3 => (0..3usize, 0..=55u32).prop_map(|(k, v)| Op::SetKeystone(k, v)),
        2 => (0..3usize, prop_oneof![Just(-5), Just(-1), Just(1), Just(5)])
            .prop_map(|(k, d)| Op::AdjustKeystone(k, d)),
        1 => Just(Op::Clear),
    ]
}

fn arb_policy() -> impl Strategy<Value = AllocationPolicy> {
    prop_oneof![Just(AllocationPolicy::Strict), Just(AllocationPolicy::AutoFoundation)]
}

fn apply(planner: &mut SkillPlanner, op: &Op) {
    match *op {
        Op::Allocate(i) => {
            let _ = planner.allocate_point(SKILLS[i]);
        }
        Op::Deallocate(i) => {
            let _ = planner.deallocate_point(SKILLS[i]);
        }
        Op::SetKeystone(k, v) => {
            let _ = planner.set_keystone_points(KeystoneId::ALL[k], v);
        }
        Op::AdjustKeystone(k, d) => {
            let _ = planner.adjust_keystone_points(KeystoneId::ALL[k], d);
        }
        Op::Clear => {
            planner.clear_all_points();
        }
    }
}

// ===========================================================================
// Invariant checks
// ===========================================================================

fn check_invariants(planner: &SkillPlanner) -> Result<(), TestCaseError> {
    prop_assert_eq!(
        planner.available_points() + planner.total_spent_points(),
        planner.starting_points(),
        "budget not conserved"
    );

    for keystone in KeystoneId::ALL {
        prop_assert!(planner.keystone_points(keystone) <= 50);
    }

    for skill in planner.skills() {
        let level = planner.skill_level(skill.id.as_str());
        prop_assert!(level <= skill.max_level(), "{} over max level", skill.id);

        if skill.is_free() && !skill.levels.is_empty() {
            prop_assert!(level >= 1, "free skill {} lost its baseline", skill.id);
        }
        if level == 0 {
            continue;
        }
        prop_assert!(
            planner.meets_requirements(skill.id.as_str()),
            "{} allocated without its keystones",
            skill.id
        );
        for prereq in &skill.prerequisite_skills {
            prop_assert!(
                planner.skill_level(prereq.as_str()) > 0,
                "{} allocated without {}",
                skill.id,
                prereq
            );
        }
    }
    Ok(())
}

fn planner_for(system: SkillSystem, policy: AllocationPolicy) -> SkillPlanner {
    SkillPlanner::from_system(
        system,
        PlannerConfig {
            allocation_policy: policy,
            budget_source: BudgetSource::Document,
        },
    )
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every invariant holds after every command, accepted or rejected.
    #[test]
    fn invariants_hold_under_random_commands(
        budget in 0..=120u32,
        policy in arb_policy(),
        ops in proptest::collection::vec(arb_op(), 1..80),
    ) {
        let mut planner = planner_for(branching_system(budget), policy);
        check_invariants(&planner)?;
        for op in &ops {
            apply(&mut planner, op);
            check_invariants(&planner)?;
        }
    }

    /// A rejected command changes nothing, not even the revision.
    #[test]
    fn rejections_are_side_effect_free(
        policy in arb_policy(),
        ops in proptest::collection::vec(arb_op(), 1..60),
    ) {
        let mut planner = planner_for(branching_system(60), policy);
        for op in &ops {
            let before = planner.snapshot();
            let revision = planner.revision();
            let accepted = match *op {
                Op::Allocate(i) => planner.allocate_point(SKILLS[i]).is_ok(),
                Op::Deallocate(i) => planner.deallocate_point(SKILLS[i]).is_ok(),
                Op::SetKeystone(k, v) => planner.set_keystone_points(KeystoneId::ALL[k], v).is_ok(),
                Op::AdjustKeystone(k, d) => planner.adjust_keystone_points(KeystoneId::ALL[k], d).is_ok(),
                Op::Clear => { planner.clear_all_points(); true }
            };
            if !accepted {
                prop_assert_eq!(planner.snapshot(), before);
                prop_assert_eq!(planner.revision(), revision);
            }
        }
    }

    /// Query answers agree with command outcomes.
    #[test]
    fn can_allocate_predicts_allocate(
        policy in arb_policy(),
        ops in proptest::collection::vec(arb_op(), 0..40),
        target in 0..SKILLS.len(),
    ) {
        let mut planner = planner_for(branching_system(80), policy);
        for op in &ops {
            apply(&mut planner, op);
        }
        let predicted = planner.can_allocate_point(SKILLS[target]);
        let cost = planner.allocation_cost(SKILLS[target]);
        let available = planner.available_points();
        prop_assert_eq!(predicted, planner.allocate_point(SKILLS[target]).is_ok());
        if predicted {
            prop_assert_eq!(Some(available - planner.available_points()), cost);
        }
    }

    /// Clearing returns exactly to the post-load build.
    #[test]
    fn clear_matches_fresh_load(
        policy in arb_policy(),
        ops in proptest::collection::vec(arb_op(), 0..60),
    ) {
        let fresh = planner_for(branching_system(90), policy);
        let mut planner = planner_for(branching_system(90), policy);
        for op in &ops {
            apply(&mut planner, op);
        }
        planner.clear_all_points();
        prop_assert_eq!(planner.snapshot(), fresh.snapshot());
    }

    /// Reloading the same catalog twice yields identical builds.
    #[test]
    fn reload_is_idempotent(
        budget in 0..=120u32,
        ops in proptest::collection::vec(arb_op(), 0..30),
    ) {
        let mut planner = planner_for(branching_system(budget), AllocationPolicy::Strict);
        for op in &ops {
            apply(&mut planner, op);
        }
        planner.load_skill_system(branching_system(budget));
        let first = planner.snapshot();
        planner.load_skill_system(branching_system(budget));
        prop_assert_eq!(planner.snapshot(), first);
    }

    /// Any reachable build restores exactly into a fresh planner.
    #[test]
    fn reachable_builds_restore(
        policy in arb_policy(),
        ops in proptest::collection::vec(arb_op(), 0..60),
    ) {
        let mut planner = planner_for(branching_system(100), policy);
        for op in &ops {
            apply(&mut planner, op);
        }
        let snapshot = planner.snapshot();

        let mut replica = planner_for(branching_system(100), AllocationPolicy::Strict);
        replica.restore(&snapshot).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(replica.snapshot(), snapshot);
    }
}
