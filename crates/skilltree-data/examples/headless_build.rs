//! Headless build: loads a catalog, plans a build, exports it, and restores
//! it into a fresh planner.
//!
//! Run with: `cargo run --package skilltree-data --example headless_build [catalog] [config]`
//!
//! Without arguments the bundled sample catalog and default config are used.
//! Logs at `info` by default; set `RUST_LOG=debug` to see every accepted and
//! rejected command.

use std::path::Path;

use skilltree_core::id::KeystoneId;
use skilltree_core::snapshot::BuildSnapshot;
use skilltree_data::{load_planner_config, load_skill_system, sample_system};
use skilltree_planner::{PlannerConfig, SkillPlanner};

const TARGETS: [&str; 4] = ["revolver", "piercingAmmo", "detonator", "disrupter"];

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let system = match args.first() {
        Some(path) => load_skill_system(Path::new(path)).expect("failed to load catalog"),
        None => sample_system().expect("bundled sample is valid"),
    };
    let config = match args.get(1) {
        Some(path) => load_planner_config(Path::new(path)).expect("failed to load config"),
        None => PlannerConfig::default(),
    };

    let mut planner = SkillPlanner::from_system(system.clone(), config);
    println!(
        "Loaded {} skills in {} categories, {} points available",
        planner.skills().len(),
        planner.categories().len(),
        planner.available_points()
    );

    // Raise keystones just enough for each target, then buy it.
    for target in TARGETS {
        let Some(skill) = planner.catalog().skill(target).cloned() else {
            println!("  {target}: not in catalog");
            continue;
        };
        for keystone in KeystoneId::ALL {
            let needed = skill.requirements.get(keystone);
            if planner.keystone_points(keystone) < needed {
                if let Err(reason) = planner.set_keystone_points(keystone, needed) {
                    println!("  {target}: {reason}");
                }
            }
        }
        match planner.allocate_point(target) {
            Ok(()) => println!("  {target}: level {}", planner.skill_level(target)),
            Err(reason) => println!("  {target}: {reason}"),
        }
    }

    println!("\nKeystones:");
    let perks = planner.foundation_perks();
    for (keystone, points) in planner.keystone_levels().iter() {
        let name = planner
            .catalog()
            .keystone(keystone)
            .map_or_else(|| keystone.to_string(), |def| def.name.clone());
        let perks = perks.for_keystone(keystone);
        println!("  {name:<12} {points:>2}");
        for reading in &perks.perks {
            println!("      {:<28} {}", reading.def.key, reading.value);
        }
    }

    println!("\nBuild:");
    for (category, skills) in planner.allocated_by_category() {
        println!("  {category}");
        for (skill, level) in skills {
            println!("    {} ({level}/{})", skill.name, skill.max_level());
        }
    }
    println!(
        "\nSpent {} of {} points",
        planner.total_spent_points(),
        planner.starting_points()
    );

    let json = planner.snapshot().to_json().expect("snapshot encodes");
    let snapshot = BuildSnapshot::from_json(&json).expect("snapshot decodes");
    let mut replica = SkillPlanner::from_system(system, config);
    replica.restore(&snapshot).expect("build restores");
    assert_eq!(replica.snapshot(), planner.snapshot());
    println!("Snapshot restored into a fresh planner ({} bytes)", json.len());
}
