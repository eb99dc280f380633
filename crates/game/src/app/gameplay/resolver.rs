use std::fmt;

use fallhouse_engine::{NodeId, Rgb, SceneError, SoundCue, Vec3};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::interactables::{InteractableId, InteractableKind};
use super::session::SessionContext;
use super::state::{GameState, TransitionError};
use super::world::spawn_hand;
use crate::app::config::{MatchPolicy, QuestConfig};

const CRAFT_OBJECTIVE: &str = "Craft the hand at the table";
const FURNITURE_OBJECTIVE: &str = "Move the furniture blocking the vent";
const ESCAPE_OBJECTIVE: &str = "Escape through the vent";
const ESCAPE_CAPTION: &str = "you got out.";

/// A precondition an interactable was missing when the player tried it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Requirement {
    Parts { have: u32, need: u32 },
    PartsComplete { need: u32 },
    AlreadyCrafted,
    Crafted,
    Light,
    Key,
    Hand,
    ClearPath,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parts { have, need } => write!(f, "parts required ({have}/{need})"),
            Self::PartsComplete { need } => write!(f, "already carrying all {need} parts"),
            Self::AlreadyCrafted => f.write_str("already crafted"),
            Self::Crafted => f.write_str("crafted hand required"),
            Self::Light => f.write_str("light required"),
            Self::Key => f.write_str("key required"),
            Self::Hand => f.write_str("must be holding the hand"),
            Self::ClearPath => f.write_str("path is blocked"),
        }
    }
}

fn describe(missing: &[Requirement]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Error)]
pub(crate) enum InteractError {
    #[error("interaction is not available in {state}")]
    NotInteractive { state: GameState },
    #[error("player control is locked")]
    ControlLocked,
    #[error("{} cannot be used: {}", .kind.as_token(), describe(.missing))]
    PreconditionNotMet {
        kind: InteractableKind,
        missing: Vec<Requirement>,
    },
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Blocked {
    pub(crate) id: InteractableId,
    pub(crate) kind: InteractableKind,
    pub(crate) missing: Vec<Requirement>,
}

/// What one resolve pass did. Nothing in range yields an empty report.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ResolveReport {
    pub(crate) applied: Vec<(InteractableId, InteractableKind)>,
    pub(crate) blocked: Vec<Blocked>,
}

impl ResolveReport {
    pub(crate) fn is_empty(&self) -> bool {
        self.applied.is_empty() && self.blocked.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn applied_kinds(&self) -> impl Iterator<Item = InteractableKind> + '_ {
        self.applied.iter().map(|(_, kind)| *kind)
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    id: InteractableId,
    kind: InteractableKind,
    node: NodeId,
    distance: f32,
}

/// Matches the player's position against every pending interactable and
/// dispatches the effect for each match.
#[derive(Debug, Clone)]
pub(crate) struct InteractionResolver {
    policy: MatchPolicy,
    required_parts: u32,
    craft_requires_light: bool,
    vent_requires_clear_path: bool,
    furniture_push: Vec3,
}

impl InteractionResolver {
    pub(crate) fn new(quest: &QuestConfig, furniture_push: Vec3) -> Self {
        Self {
            policy: quest.match_policy,
            required_parts: quest.required_parts,
            craft_requires_light: quest.craft_requires_light,
            vent_requires_clear_path: quest.vent_requires_clear_path,
            furniture_push,
        }
    }

    #[cfg(test)]
    pub(crate) fn set_policy(&mut self, policy: MatchPolicy) {
        self.policy = policy;
    }

    pub(crate) fn resolve(
        &self,
        ctx: &mut SessionContext,
    ) -> Result<ResolveReport, InteractError> {
        let state = ctx.state.current();
        if state != GameState::House {
            return Err(InteractError::NotInteractive { state });
        }
        if !ctx.progress.can_move() {
            return Err(InteractError::ControlLocked);
        }

        let candidates = self.candidates(ctx);
        let mut report = ResolveReport::default();
        for candidate in candidates {
            // The vent ends the run; nothing else should fire after it.
            if !ctx.state.is(GameState::House) {
                break;
            }
            let missing = self.missing_for(candidate.kind, ctx);
            if missing.is_empty() {
                self.apply(candidate, ctx)?;
                info!(
                    kind = candidate.kind.as_token(),
                    distance = candidate.distance,
                    "interaction_applied"
                );
                report.applied.push((candidate.id, candidate.kind));
            } else {
                info!(
                    kind = candidate.kind.as_token(),
                    missing = %describe(&missing),
                    "interaction_blocked"
                );
                report.blocked.push(Blocked {
                    id: candidate.id,
                    kind: candidate.kind,
                    missing,
                });
            }
        }

        if report.applied.is_empty() {
            if let Some(first) = report.blocked.first() {
                let now = ctx.clock.now();
                ctx.hud.show_prompt(&describe(&first.missing), now);
                return Err(InteractError::PreconditionNotMet {
                    kind: first.kind,
                    missing: first.missing.clone(),
                });
            }
        }
        Ok(report)
    }

    fn candidates(&self, ctx: &SessionContext) -> Vec<Candidate> {
        let player = ctx.camera.pose().position;
        let mut in_range = Vec::new();
        for entry in ctx.registry.pending() {
            let position = match ctx.scene.world_position(entry.node) {
                Ok(position) => position,
                Err(error) => {
                    warn!(
                        kind = entry.kind.as_token(),
                        error = %error,
                        "interactable_missing_node"
                    );
                    continue;
                }
            };
            let distance = player.distance(position);
            if distance < entry.radius {
                in_range.push(Candidate {
                    id: entry.id,
                    kind: entry.kind,
                    node: entry.node,
                    distance,
                });
            }
        }

        match self.policy {
            MatchPolicy::AllInRange => in_range,
            MatchPolicy::NearestOnly => {
                let mut nearest: Option<Candidate> = None;
                for candidate in in_range {
                    // Strict comparison keeps the earlier registration on ties.
                    if nearest.map_or(true, |best| candidate.distance < best.distance) {
                        nearest = Some(candidate);
                    }
                }
                nearest.into_iter().collect()
            }
        }
    }

    fn missing_for(&self, kind: InteractableKind, ctx: &SessionContext) -> Vec<Requirement> {
        let progress = &ctx.progress;
        let mut missing = Vec::new();
        match kind {
            InteractableKind::Part => {
                if progress.collected_parts() >= self.required_parts {
                    missing.push(Requirement::PartsComplete {
                        need: self.required_parts,
                    });
                }
            }
            InteractableKind::Key => {}
            InteractableKind::CraftingTable => {
                if progress.crafted() {
                    missing.push(Requirement::AlreadyCrafted);
                }
                if progress.collected_parts() != self.required_parts {
                    missing.push(Requirement::Parts {
                        have: progress.collected_parts(),
                        need: self.required_parts,
                    });
                }
                if self.craft_requires_light && !progress.flashlight_on() {
                    missing.push(Requirement::Light);
                }
            }
            InteractableKind::Furniture => {
                if !progress.holding_hand() {
                    missing.push(Requirement::Hand);
                }
            }
            InteractableKind::Vent => {
                if !progress.has_key() {
                    missing.push(Requirement::Key);
                }
                if !progress.crafted() {
                    missing.push(Requirement::Crafted);
                }
                if self.vent_requires_clear_path && !progress.path_cleared() {
                    missing.push(Requirement::ClearPath);
                }
            }
        }
        missing
    }

    fn apply(&self, candidate: Candidate, ctx: &mut SessionContext) -> Result<(), InteractError> {
        if candidate.kind.consumed_on_use() && !ctx.registry.mark_triggered(candidate.id) {
            debug!(kind = candidate.kind.as_token(), "interaction_already_triggered");
            return Ok(());
        }
        let now = ctx.clock.now();
        match candidate.kind {
            InteractableKind::Part => {
                ctx.scene.remove(candidate.node);
                let collected = ctx.progress.collect_part();
                ctx.hud.refresh_inventory(&ctx.progress, self.required_parts);
                ctx.hud.show_prompt(
                    &format!("Picked up a part ({collected}/{})", self.required_parts),
                    now,
                );
                ctx.audio.play(SoundCue::once("pickup"));
                if collected == self.required_parts {
                    ctx.hud.set_objective(CRAFT_OBJECTIVE);
                    info!(parts = collected, "objective_unlocked");
                }
            }
            InteractableKind::Key => {
                ctx.scene.remove(candidate.node);
                ctx.progress.take_key();
                ctx.hud.refresh_inventory(&ctx.progress, self.required_parts);
                ctx.hud.show_prompt("Picked up the key", now);
                ctx.audio.play(SoundCue::once("pickup"));
            }
            InteractableKind::CraftingTable => {
                let hand = spawn_hand(&mut ctx.scene, candidate.node)?;
                ctx.progress.mark_crafted();
                ctx.hand = Some(hand);
                ctx.hud.set_objective(FURNITURE_OBJECTIVE);
                ctx.hud.show_prompt("You crafted the hand", now);
                ctx.audio.play(SoundCue::once("craft"));
            }
            InteractableKind::Furniture => {
                ctx.scene.transform_mut(candidate.node)?.position += self.furniture_push;
                ctx.progress.clear_path();
                ctx.hud.set_objective(ESCAPE_OBJECTIVE);
                ctx.hud.show_prompt("The path is clear", now);
                ctx.audio.play(SoundCue::once("scrape"));
            }
            InteractableKind::Vent => {
                ctx.progress.set_can_move(false);
                ctx.state.transition(GameState::End)?;
                ctx.hud.set_overlay(Some(Rgb::WHITE));
                ctx.hud.show_caption(ESCAPE_CAPTION, now);
                ctx.audio.play(SoundCue::once("vent"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use fallhouse_engine::RecordingHost;

    use super::*;
    use crate::app::config::GameConfig;
    use crate::app::gameplay::GameSession;

    #[test]
    fn failed_hand_spawn_leaves_progress_untouched() {
        let mut session = GameSession::builder(GameConfig::default())
            .hud(RecordingHost::new())
            .build()
            .expect("session");
        session.start().expect("start");
        session.skip().expect("skip");
        let resolver = InteractionResolver::new(&QuestConfig::default(), Vec3::ZERO);

        let ctx = session.context_mut();
        let table = *ctx
            .registry
            .first_of_kind(InteractableKind::CraftingTable)
            .expect("table");
        for _ in 0..3 {
            ctx.progress.collect_part();
        }
        ctx.progress.set_flashlight(true);
        assert!(ctx.scene.remove(table.node));
        ctx.scene.apply_pending();

        let candidate = Candidate {
            id: table.id,
            kind: table.kind,
            node: table.node,
            distance: 0.0,
        };
        let err = resolver.apply(candidate, ctx).expect_err("table node is gone");
        assert!(matches!(err, InteractError::Scene(_)));
        assert!(!ctx.progress.crafted());
        assert!(!ctx.progress.holding_hand());
        assert!(ctx.hand.is_none());
    }

    #[test]
    fn requirements_read_as_prompts() {
        assert_eq!(
            describe(&[Requirement::Parts { have: 1, need: 3 }, Requirement::Light]),
            "parts required (1/3), light required"
        );
        assert_eq!(
            Requirement::PartsComplete { need: 2 }.to_string(),
            "already carrying all 2 parts"
        );
    }
}
