//! Allocation engine for the skilltree build planner.
//!
//! Owns the point budget, the three keystone levels, and the per-skill level
//! map, and enforces every rule about what can be bought, in what order, and
//! at what cost.
//!
//! # Overview
//!
//! A catalog is loaded with [`SkillPlanner::load_skill_system`], which resets
//! the build: keystones at zero, every free skill granted its first level,
//! and the budget taken from the configured [`BudgetSource`]. After that the
//! build changes only through four commands:
//!
//! - [`SkillPlanner::set_keystone_points`] (and the stepping helper
//!   [`SkillPlanner::adjust_keystone_points`])
//! - [`SkillPlanner::allocate_point`]
//! - [`SkillPlanner::deallocate_point`]
//! - [`SkillPlanner::clear_all_points`]
//!
//! Every command either applies completely or returns a [`Rejection`] and
//! leaves the build untouched. Queries are plain `&self` reads and always see
//! the latest committed state; [`SkillPlanner::revision`] advances on every
//! committed change.
//!
//! # Allocation Policies
//!
//! - **Strict**: a skill level can be bought only once the player has raised
//!   the keystones it requires.
//! - **AutoFoundation**: missing keystone points are bought as part of the
//!   same allocation, charged against the same budget, all or nothing.

use serde::{Deserialize, Serialize};
use skilltree_core::catalog::{Catalog, KeystoneDef, Skill, SkillSystem};
use skilltree_core::id::{KeystoneId, SkillId};
use skilltree_core::keystone::{KeystoneLevels, MAX_KEYSTONE_POINTS};
use skilltree_core::snapshot::{BuildSnapshot, SnapshotError};
use skilltree_perks::FoundationPerks;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How [`SkillPlanner::allocate_point`] treats unmet keystone requirements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationPolicy {
    /// Requirements must already be met.
    #[default]
    Strict,
    /// Missing keystone points are bought together with the skill level.
    AutoFoundation,
}

/// Where the starting budget comes from when a catalog is loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetSource {
    /// The document's `availablePoints`.
    #[default]
    Document,
    /// A fixed budget regardless of the document.
    Fixed(u32),
}

impl BudgetSource {
    pub fn starting_points(self, system: &SkillSystem) -> u32 {
        match self {
            BudgetSource::Document => system.available_points,
            BudgetSource::Fixed(points) => points,
        }
    }
}

/// Planner configuration. Every field has a default, so an empty config file
/// is valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub allocation_policy: AllocationPolicy,
    pub budget_source: BudgetSource,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a command was refused. The build is unchanged whenever one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("unknown skill '{0}'")]
    UnknownSkill(String),

    #[error("skill '{0}' is already at its maximum level")]
    MaxLevel(SkillId),

    #[error("skill '{skill}' requires {keystone} {required}, have {have}")]
    RequirementNotMet {
        skill: SkillId,
        keystone: KeystoneId,
        required: u32,
        have: u32,
    },

    #[error("skill '{skill}' requires '{prerequisite}' to be allocated first")]
    PrerequisiteNotMet {
        skill: SkillId,
        prerequisite: SkillId,
    },

    #[error("not enough points: need {needed}, have {available}")]
    InsufficientPoints { needed: u32, available: u32 },

    #[error("skill '{0}' has no allocated levels")]
    NotAllocated(SkillId),

    #[error("skill '{skill}' is a prerequisite of allocated skill '{dependent}'")]
    HasDependents { skill: SkillId, dependent: SkillId },

    #[error("the granted first level of free skill '{0}' cannot be removed")]
    BaselineLevel(SkillId),

    #[error("{keystone} cannot be set to {requested} (allowed 0..={max})", max = MAX_KEYSTONE_POINTS)]
    KeystoneOutOfRange { keystone: KeystoneId, requested: i64 },

    #[error("lowering {keystone} to {requested} would invalidate allocated skill '{skill}'")]
    WouldInvalidate {
        keystone: KeystoneId,
        requested: u32,
        skill: SkillId,
    },

    #[error("unknown category '{0}'")]
    UnknownCategory(String),
}

/// Errors from [`SkillPlanner::restore`]. The build is unchanged whenever
/// one is returned.
#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("build references skill '{0}', which is not in the loaded catalog")]
    UnknownSkill(SkillId),

    #[error("cannot restore {keystone}: {source}")]
    Keystone {
        keystone: KeystoneId,
        source: Rejection,
    },

    #[error("{keystone} ended at {actual}, build expects {expected}")]
    KeystoneMismatch {
        keystone: KeystoneId,
        expected: u32,
        actual: u32,
    },

    #[error("skill '{skill}' ended at level {actual}, build expects {expected}")]
    Unreproducible {
        skill: SkillId,
        expected: u32,
        actual: u32,
    },

    #[error("available points ended at {actual}, build expects {expected}")]
    BudgetMismatch { expected: u32, actual: u32 },
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Committed changes, in order. Drained by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannerEvent {
    SystemLoaded {
        skills: usize,
        available_points: u32,
    },
    KeystoneChanged {
        keystone: KeystoneId,
        from: u32,
        to: u32,
    },
    SkillAllocated {
        skill: SkillId,
        level: u32,
        /// Cost of the skill level itself.
        cost: u32,
        /// Keystone points bought alongside (AutoFoundation only).
        keystone_cost: u32,
    },
    SkillDeallocated {
        skill: SkillId,
        /// Level after the refund.
        level: u32,
        refund: u32,
    },
    PointsCleared {
        refunded: u32,
    },
    BuildRestored {
        available_points: u32,
    },
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct AllocationState {
    available_points: u32,
    keystone_points: KeystoneLevels,
    /// Skills with at least one level. Absent means level 0.
    allocated_points: HashMap<SkillId, u32>,
}

/// A validated purchase of one skill level, before the budget check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AllocationPlan {
    next_level: u32,
    skill_cost: u32,
    keystone_cost: u32,
    keystones_after: KeystoneLevels,
}

impl AllocationPlan {
    fn total_cost(&self) -> u32 {
        self.skill_cost.saturating_add(self.keystone_cost)
    }
}

// ---------------------------------------------------------------------------
// SkillPlanner
// ---------------------------------------------------------------------------

/// The allocation engine. One instance holds one catalog and one build.
#[derive(Debug, Clone)]
pub struct SkillPlanner {
    config: PlannerConfig,
    catalog: Catalog,
    state: AllocationState,
    /// Budget the current catalog was loaded with.
    starting_points: u32,
    /// Display state only.
    active_category: Option<String>,
    revision: u64,
    events: Vec<PlannerEvent>,
}

impl SkillPlanner {
    /// Create an empty planner with the default configuration.
    pub fn new() -> Self {
        Self::with_config(PlannerConfig::default())
    }

    /// Create an empty planner. Nothing can be allocated until a catalog is
    /// loaded; a fixed budget source is applied immediately.
    pub fn with_config(config: PlannerConfig) -> Self {
        let starting_points = match config.budget_source {
            BudgetSource::Fixed(points) => points,
            BudgetSource::Document => 0,
        };
        Self {
            config,
            catalog: Catalog::default(),
            state: AllocationState {
                available_points: starting_points,
                ..AllocationState::default()
            },
            starting_points,
            active_category: None,
            revision: 0,
            events: Vec::new(),
        }
    }

    /// Create a planner and load `system` into it.
    pub fn from_system(system: SkillSystem, config: PlannerConfig) -> Self {
        let mut planner = Self::with_config(config);
        planner.load_skill_system(system);
        planner
    }

    // -- Accessors --

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn skills(&self) -> &[Skill] {
        self.catalog.skills()
    }

    pub fn keystones(&self) -> &[KeystoneDef] {
        self.catalog.keystones()
    }

    pub fn available_points(&self) -> u32 {
        self.state.available_points
    }

    /// Budget the current catalog was loaded with.
    pub fn starting_points(&self) -> u32 {
        self.starting_points
    }

    pub fn keystone_levels(&self) -> KeystoneLevels {
        self.state.keystone_points
    }

    /// Skills holding at least one level.
    pub fn allocated_points(&self) -> &HashMap<SkillId, u32> {
        &self.state.allocated_points
    }

    /// Advances by one on every committed change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // -- Query API --

    pub fn keystone_points(&self, keystone: KeystoneId) -> u32 {
        self.state.keystone_points.get(keystone)
    }

    /// Current level of a skill. 0 for unknown ids.
    pub fn skill_level(&self, skill_id: &str) -> u32 {
        self.state
            .allocated_points
            .get(skill_id)
            .copied()
            .unwrap_or(0)
    }

    /// Whether current keystone levels satisfy the skill's requirements.
    /// Always false for unknown ids.
    pub fn meets_requirements(&self, skill_id: &str) -> bool {
        self.catalog
            .skill(skill_id)
            .is_some_and(|s| self.state.keystone_points.satisfies(&s.requirements))
    }

    /// Whether every prerequisite holds at least one level. Prerequisites
    /// naming skills absent from the catalog count as satisfied. Always false
    /// for unknown ids.
    pub fn meets_prerequisites(&self, skill_id: &str) -> bool {
        self.catalog
            .skill(skill_id)
            .is_some_and(|s| self.missing_prerequisite(s).is_none())
    }

    /// Whether [`allocate_point`](Self::allocate_point) would succeed now.
    pub fn can_allocate_point(&self, skill_id: &str) -> bool {
        self.affordable_plan(skill_id).is_ok()
    }

    /// Whether the skill holds a level and no allocated skill depends on it.
    ///
    /// This does not consider the free-skill baseline:
    /// [`deallocate_point`](Self::deallocate_point) additionally refuses to
    /// remove a free skill's first level.
    pub fn can_deallocate_point(&self, skill_id: &str) -> bool {
        self.skill_level(skill_id) > 0 && self.blocking_dependent(skill_id).is_none()
    }

    /// Points the next allocation of `skill_id` would charge under the active
    /// policy, or `None` if it is not allocatable for a reason other than
    /// budget.
    pub fn allocation_cost(&self, skill_id: &str) -> Option<u32> {
        self.plan_allocation(skill_id)
            .ok()
            .map(|plan| plan.total_cost())
    }

    /// Points currently tied up in keystones and bought skill levels.
    pub fn total_spent_points(&self) -> u32 {
        let skills = self
            .state
            .allocated_points
            .iter()
            .filter_map(|(id, &level)| self.catalog.skill(id.as_str()).map(|s| s.spent_for(level)))
            .fold(0u32, u32::saturating_add);
        self.state.keystone_points.total().saturating_add(skills)
    }

    /// Passive perks unlocked by the current keystone levels.
    pub fn foundation_perks(&self) -> FoundationPerks {
        FoundationPerks::from_levels(&self.state.keystone_points)
    }

    // -- Category API (display only) --

    /// Distinct categories, sorted.
    pub fn categories(&self) -> Vec<&str> {
        self.catalog.categories()
    }

    pub fn active_category(&self) -> Option<&str> {
        self.active_category.as_deref()
    }

    /// Select the displayed category. Does not touch the build or advance the
    /// revision.
    pub fn set_active_category(&mut self, category: &str) -> Result<(), Rejection> {
        if !self.catalog.skills().iter().any(|s| s.category == category) {
            return Err(Rejection::UnknownCategory(category.to_string()));
        }
        self.active_category = Some(category.to_string());
        Ok(())
    }

    /// Skills of one category in display order.
    pub fn skills_in_category(&self, category: &str) -> Vec<&Skill> {
        self.catalog.skills_in_category(category)
    }

    /// Allocated skills with their levels, grouped by sorted category. Within
    /// a category skills keep document order. Empty categories are omitted.
    pub fn allocated_by_category(&self) -> Vec<(&str, Vec<(&Skill, u32)>)> {
        self.catalog
            .categories()
            .into_iter()
            .filter_map(|category| {
                let skills: Vec<(&Skill, u32)> = self
                    .catalog
                    .skills()
                    .iter()
                    .filter(|s| s.category == category)
                    .map(|s| (s, self.skill_level(s.id.as_str())))
                    .filter(|&(_, level)| level > 0)
                    .collect();
                (!skills.is_empty()).then_some((category, skills))
            })
            .collect()
    }

    // -- Commands --

    /// Set a keystone to `level`, charging or refunding the difference.
    ///
    /// Refused when `level` exceeds the keystone cap, when raising costs more
    /// than the available budget, or when lowering would leave an allocated
    /// skill below its requirements.
    pub fn set_keystone_points(&mut self, keystone: KeystoneId, level: u32) -> Result<(), Rejection> {
        let result = self.apply_keystone(keystone, level);
        if let Err(reason) = &result {
            debug!(keystone = %keystone, level, %reason, "keystone change rejected");
        }
        result
    }

    /// Move a keystone by `delta` points (the +1 / -1 / +5 / -5 controls).
    pub fn adjust_keystone_points(&mut self, keystone: KeystoneId, delta: i32) -> Result<(), Rejection> {
        let target = i64::from(self.keystone_points(keystone)) + i64::from(delta);
        match u32::try_from(target) {
            Ok(level) => self.set_keystone_points(keystone, level),
            Err(_) => {
                let reason = Rejection::KeystoneOutOfRange {
                    keystone,
                    requested: target,
                };
                debug!(keystone = %keystone, delta, %reason, "keystone change rejected");
                Err(reason)
            }
        }
    }

    /// Buy the next level of a skill.
    pub fn allocate_point(&mut self, skill_id: &str) -> Result<(), Rejection> {
        let result = self.apply_allocation(skill_id);
        if let Err(reason) = &result {
            debug!(skill = skill_id, %reason, "allocation rejected");
        }
        result
    }

    /// Refund the highest owned level of a skill.
    pub fn deallocate_point(&mut self, skill_id: &str) -> Result<(), Rejection> {
        let result = self.apply_deallocation(skill_id);
        if let Err(reason) = &result {
            debug!(skill = skill_id, %reason, "deallocation rejected");
        }
        result
    }

    /// Refund everything and return to the post-load baseline without
    /// reloading the catalog. Returns the number of points refunded.
    pub fn clear_all_points(&mut self) -> u32 {
        let refunded = self.reset_to_baseline();
        self.commit(PlannerEvent::PointsCleared { refunded });
        info!(refunded, available = self.state.available_points, "build cleared");
        refunded
    }

    /// Replace the catalog and reset the build.
    pub fn load_skill_system(&mut self, system: SkillSystem) {
        let starting_points = self.config.budget_source.starting_points(&system);
        self.catalog = Catalog::from(system);
        self.starting_points = starting_points;
        self.state = AllocationState {
            available_points: starting_points,
            keystone_points: KeystoneLevels::ZERO,
            allocated_points: self.baseline_allocations(),
        };
        self.active_category = self.catalog.first_category().map(str::to_string);
        self.commit(PlannerEvent::SystemLoaded {
            skills: self.catalog.len(),
            available_points: starting_points,
        });
        info!(
            skills = self.catalog.len(),
            available_points = starting_points,
            "skill system loaded"
        );
    }

    // -- Export / import --

    /// Export the current build.
    pub fn snapshot(&self) -> BuildSnapshot {
        let allocated: BTreeMap<SkillId, u32> = self
            .state
            .allocated_points
            .iter()
            .filter(|&(_, &level)| level > 0)
            .map(|(id, &level)| (id.clone(), level))
            .collect();
        BuildSnapshot::new(
            self.state.available_points,
            self.state.keystone_points,
            allocated,
        )
    }

    /// Rebuild an exported build against the loaded catalog.
    ///
    /// The build is cleared and replayed through the normal commands:
    /// keystones first, then skill levels in prerequisite order. The result
    /// must match the snapshot exactly (levels, keystones and remaining
    /// budget), otherwise the previous build is put back.
    pub fn restore(&mut self, snapshot: &BuildSnapshot) -> Result<(), RestoreError> {
        snapshot.header.validate()?;
        if let Some(unknown) = snapshot
            .allocated_points
            .keys()
            .find(|id| !self.catalog.contains(id.as_str()))
        {
            return Err(RestoreError::UnknownSkill(unknown.clone()));
        }

        let saved_state = self.state.clone();
        let saved_revision = self.revision;
        let saved_events = self.events.len();

        let result = self.replay(snapshot);
        self.events.truncate(saved_events);
        self.revision = saved_revision;

        match result {
            Ok(()) => {
                self.commit(PlannerEvent::BuildRestored {
                    available_points: self.state.available_points,
                });
                info!(
                    skills = snapshot.allocated_points.len(),
                    available = self.state.available_points,
                    "build restored"
                );
                Ok(())
            }
            Err(e) => {
                self.state = saved_state;
                debug!(error = %e, "build restore rejected");
                Err(e)
            }
        }
    }

    // -- Event API --

    /// Drain all pending events.
    pub fn drain_events(&mut self) -> Vec<PlannerEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[PlannerEvent] {
        &self.events
    }

    // -- Internal helpers --

    fn commit(&mut self, event: PlannerEvent) {
        self.events.push(event);
        self.revision += 1;
    }

    /// Every free skill with at least one level, at level 1.
    fn baseline_allocations(&self) -> HashMap<SkillId, u32> {
        self.catalog
            .free_skills()
            .filter(|s| !s.levels.is_empty())
            .map(|s| (s.id.clone(), 1))
            .collect()
    }

    /// First prerequisite of `skill` that is in the catalog but unallocated.
    fn missing_prerequisite<'a>(&self, skill: &'a Skill) -> Option<&'a SkillId> {
        skill
            .prerequisite_skills
            .iter()
            .find(|p| self.catalog.contains(p.as_str()) && self.skill_level(p.as_str()) == 0)
    }

    /// An allocated skill, other than `skill_id` itself, listing `skill_id`
    /// as a prerequisite.
    fn blocking_dependent(&self, skill_id: &str) -> Option<&Skill> {
        self.catalog
            .dependents_of(skill_id)
            .find(|d| d.id.as_str() != skill_id && self.skill_level(d.id.as_str()) > 0)
    }

    /// First allocated skill whose requirements `levels` would not satisfy.
    fn first_invalidated(&self, levels: &KeystoneLevels) -> Option<&Skill> {
        self.catalog
            .skills()
            .iter()
            .find(|s| self.skill_level(s.id.as_str()) > 0 && !levels.satisfies(&s.requirements))
    }

    /// Validate the next level of `skill_id` under the active policy,
    /// ignoring the budget.
    fn plan_allocation(&self, skill_id: &str) -> Result<AllocationPlan, Rejection> {
        let skill = self
            .catalog
            .skill(skill_id)
            .ok_or_else(|| Rejection::UnknownSkill(skill_id.to_string()))?;
        let current = self.skill_level(skill_id);
        let next = skill
            .next_level(current)
            .ok_or_else(|| Rejection::MaxLevel(skill.id.clone()))?;
        let keystones = self.state.keystone_points;

        // The first level of a free skill is granted, never bought.
        if skill.is_free() && current == 0 {
            return Ok(AllocationPlan {
                next_level: 1,
                skill_cost: 0,
                keystone_cost: 0,
                keystones_after: keystones,
            });
        }

        let keystones_after = match self.config.allocation_policy {
            AllocationPolicy::Strict => {
                if let Some(k) = KeystoneId::ALL
                    .into_iter()
                    .find(|&k| keystones.get(k) < skill.requirements.get(k))
                {
                    return Err(Rejection::RequirementNotMet {
                        skill: skill.id.clone(),
                        keystone: k,
                        required: skill.requirements.get(k),
                        have: keystones.get(k),
                    });
                }
                keystones
            }
            AllocationPolicy::AutoFoundation => {
                let raised = keystones.max(&skill.requirements);
                if let Some(k) = KeystoneId::ALL
                    .into_iter()
                    .find(|&k| raised.get(k) > MAX_KEYSTONE_POINTS)
                {
                    return Err(Rejection::RequirementNotMet {
                        skill: skill.id.clone(),
                        keystone: k,
                        required: skill.requirements.get(k),
                        have: keystones.get(k),
                    });
                }
                raised
            }
        };

        if let Some(prerequisite) = self.missing_prerequisite(skill) {
            return Err(Rejection::PrerequisiteNotMet {
                skill: skill.id.clone(),
                prerequisite: prerequisite.clone(),
            });
        }

        Ok(AllocationPlan {
            next_level: current + 1,
            skill_cost: next.points_required,
            keystone_cost: keystones.deficit(&skill.requirements).total(),
            keystones_after,
        })
    }

    /// [`plan_allocation`](Self::plan_allocation) plus the budget check.
    fn affordable_plan(&self, skill_id: &str) -> Result<AllocationPlan, Rejection> {
        let plan = self.plan_allocation(skill_id)?;
        let needed = plan.total_cost();
        if self.state.available_points < needed {
            return Err(Rejection::InsufficientPoints {
                needed,
                available: self.state.available_points,
            });
        }
        Ok(plan)
    }

    fn apply_keystone(&mut self, keystone: KeystoneId, level: u32) -> Result<(), Rejection> {
        if level > MAX_KEYSTONE_POINTS {
            return Err(Rejection::KeystoneOutOfRange {
                keystone,
                requested: i64::from(level),
            });
        }

        let current = self.state.keystone_points.get(keystone);
        if level > current {
            let diff = level - current;
            if self.state.available_points < diff {
                return Err(Rejection::InsufficientPoints {
                    needed: diff,
                    available: self.state.available_points,
                });
            }
            self.state.available_points -= diff;
        } else if level < current {
            let lowered = self.state.keystone_points.with(keystone, level);
            if let Some(skill) = self.first_invalidated(&lowered) {
                return Err(Rejection::WouldInvalidate {
                    keystone,
                    requested: level,
                    skill: skill.id.clone(),
                });
            }
            self.state.available_points = self.state.available_points.saturating_add(current - level);
        } else {
            return Ok(());
        }

        self.state.keystone_points.set(keystone, level);
        self.commit(PlannerEvent::KeystoneChanged {
            keystone,
            from: current,
            to: level,
        });
        debug!(keystone = %keystone, from = current, to = level, available = self.state.available_points, "keystone changed");
        Ok(())
    }

    fn apply_allocation(&mut self, skill_id: &str) -> Result<(), Rejection> {
        let plan = self.affordable_plan(skill_id)?;
        let before = self.state.keystone_points;

        self.state.available_points -= plan.total_cost();
        if plan.keystones_after != before {
            self.state.keystone_points = plan.keystones_after;
            for keystone in KeystoneId::ALL {
                let (from, to) = (before.get(keystone), plan.keystones_after.get(keystone));
                if from != to {
                    self.commit(PlannerEvent::KeystoneChanged { keystone, from, to });
                }
            }
        }

        let skill = SkillId::from(skill_id);
        self.state
            .allocated_points
            .insert(skill.clone(), plan.next_level);
        self.commit(PlannerEvent::SkillAllocated {
            skill,
            level: plan.next_level,
            cost: plan.skill_cost,
            keystone_cost: plan.keystone_cost,
        });
        debug!(
            skill = skill_id,
            level = plan.next_level,
            cost = plan.total_cost(),
            available = self.state.available_points,
            "skill level allocated"
        );
        Ok(())
    }

    fn apply_deallocation(&mut self, skill_id: &str) -> Result<(), Rejection> {
        let skill = self
            .catalog
            .skill(skill_id)
            .ok_or_else(|| Rejection::UnknownSkill(skill_id.to_string()))?;
        let current = self.skill_level(skill_id);
        if current == 0 {
            return Err(Rejection::NotAllocated(skill.id.clone()));
        }
        if let Some(dependent) = self.blocking_dependent(skill_id) {
            return Err(Rejection::HasDependents {
                skill: skill.id.clone(),
                dependent: dependent.id.clone(),
            });
        }
        if skill.is_free() && current == 1 {
            return Err(Rejection::BaselineLevel(skill.id.clone()));
        }

        let refund = skill.owned_level(current).map_or(0, |l| l.points_required);
        let id = skill.id.clone();
        let level = current - 1;

        self.state.available_points = self.state.available_points.saturating_add(refund);
        if level == 0 {
            self.state.allocated_points.remove(skill_id);
        } else {
            self.state.allocated_points.insert(id.clone(), level);
        }
        self.commit(PlannerEvent::SkillDeallocated {
            skill: id,
            level,
            refund,
        });
        debug!(skill = skill_id, level, refund, available = self.state.available_points, "skill level refunded");
        Ok(())
    }

    /// Refund everything back to the baseline without committing an event
    /// or logging. Returns the number of points refunded.
    fn reset_to_baseline(&mut self) -> u32 {
        let refunded = self.total_spent_points();
        self.state.available_points = self.state.available_points.saturating_add(refunded);
        self.state.keystone_points = KeystoneLevels::ZERO;
        self.state.allocated_points = self.baseline_allocations();
        refunded
    }

    fn replay(&mut self, snapshot: &BuildSnapshot) -> Result<(), RestoreError> {
        self.reset_to_baseline();

        for keystone in KeystoneId::ALL {
            self.apply_keystone(keystone, snapshot.keystone_points.get(keystone))
                .map_err(|source| RestoreError::Keystone { keystone, source })?;
        }

        // Sweep until a full pass buys nothing; each pass unlocks the next
        // layer of prerequisites.
        loop {
            let mut progressed = false;
            for (id, &target) in &snapshot.allocated_points {
                while self.skill_level(id.as_str()) < target
                    && self.apply_allocation(id.as_str()).is_ok()
                {
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }

        for keystone in KeystoneId::ALL {
            let expected = snapshot.keystone_points.get(keystone);
            let actual = self.state.keystone_points.get(keystone);
            if expected != actual {
                return Err(RestoreError::KeystoneMismatch {
                    keystone,
                    expected,
                    actual,
                });
            }
        }
        for skill in self.catalog.skills() {
            let expected = snapshot.level_of(skill.id.as_str());
            let actual = self.skill_level(skill.id.as_str());
            if expected != actual {
                return Err(RestoreError::Unreproducible {
                    skill: skill.id.clone(),
                    expected,
                    actual,
                });
            }
        }
        if self.state.available_points != snapshot.available_points {
            return Err(RestoreError::BudgetMismatch {
                expected: snapshot.available_points,
                actual: self.state.available_points,
            });
        }
        Ok(())
    }
}

impl Default for SkillPlanner {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
