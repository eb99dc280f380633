use std::f32::consts::FRAC_PI_2;

use fallhouse_engine::{NodeId, SceneError, SceneGraph, Transform, Vec3};
use tracing::info;

use super::interactables::{InteractableKind, InteractableRegistry};
use crate::app::config::{QuestConfig, StalkerConfig, WorldLayout};

const HAND_OFFSET_ABOVE_TABLE: Vec3 = Vec3::new(0.0, 0.6, 0.0);

/// Scene nodes the session animates or reparents after the world is built.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WorldHandles {
    pub(crate) portal: NodeId,
    pub(crate) clock_hand: NodeId,
    pub(crate) stalker: Option<NodeId>,
}

pub(crate) fn build_world(
    layout: &WorldLayout,
    quest: &QuestConfig,
    stalker: Option<&StalkerConfig>,
    scene: &mut SceneGraph,
    registry: &mut InteractableRegistry,
) -> Result<WorldHandles, SceneError> {
    scene.add("roof", Transform::at(layout.roof));
    let portal = scene.add(
        "portal",
        Transform {
            position: layout.portal,
            rotation: Vec3::new(FRAC_PI_2, 0.0, 0.0),
        },
    );

    let house = scene.add("house", Transform::at(layout.house_origin));
    let clock_hand = scene.add_child(house, "clock_hand", Transform::at(layout.clock_hand))?;

    for position in &layout.parts {
        let node = scene.add_child(house, "part", Transform::at(*position))?;
        registry.register(InteractableKind::Part, node, quest.part_radius);
    }
    let key = scene.add_child(house, "key", Transform::at(layout.key))?;
    registry.register(InteractableKind::Key, key, quest.key_radius);

    let table = scene.add_child(house, "crafting_table", Transform::at(layout.crafting_table))?;
    registry.register(InteractableKind::CraftingTable, table, quest.table_radius);

    let furniture = scene.add_child(house, "furniture", Transform::at(layout.furniture))?;
    registry.register(InteractableKind::Furniture, furniture, quest.furniture_radius);

    let vent = scene.add_child(house, "vent", Transform::at(layout.vent))?;
    registry.register(InteractableKind::Vent, vent, quest.vent_radius);

    // Hidden until it starts hunting.
    let stalker = match stalker {
        Some(config) => {
            let node = scene.add(
                "stalker",
                Transform::at(layout.house_origin + config.spawn_local),
            );
            scene.set_visible(node, false)?;
            Some(node)
        }
        None => None,
    };

    info!(
        node_count = scene.node_count(),
        interactables = registry.len(),
        "world_built"
    );

    Ok(WorldHandles {
        portal,
        clock_hand,
        stalker,
    })
}

/// Places the crafted hand on top of the table it was made at.
pub(crate) fn spawn_hand(scene: &mut SceneGraph, table: NodeId) -> Result<NodeId, SceneError> {
    let table_node = scene.find(table).ok_or(SceneError::MissingNode(table))?;
    let parent = table_node.parent;
    let position = table_node.transform.position + HAND_OFFSET_ABOVE_TABLE;
    match parent {
        Some(parent) => scene.add_child(parent, "hand", Transform::at(position)),
        None => Ok(scene.add("hand", Transform::at(position))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_registers_every_quest_object() {
        let mut scene = SceneGraph::default();
        let mut registry = InteractableRegistry::default();
        build_world(
            &WorldLayout::default(),
            &QuestConfig::default(),
            None,
            &mut scene,
            &mut registry,
        )
        .expect("world");

        assert_eq!(registry.of_kind(InteractableKind::Part).count(), 3);
        assert!(registry.first_of_kind(InteractableKind::Key).is_some());
        assert!(registry.first_of_kind(InteractableKind::CraftingTable).is_some());
        assert!(registry.first_of_kind(InteractableKind::Furniture).is_some());
        assert!(registry.first_of_kind(InteractableKind::Vent).is_some());
    }

    #[test]
    fn house_props_sit_at_house_origin_offset() {
        let mut scene = SceneGraph::default();
        let mut registry = InteractableRegistry::default();
        build_world(
            &WorldLayout::default(),
            &QuestConfig::default(),
            None,
            &mut scene,
            &mut registry,
        )
        .expect("world");

        let key = registry.first_of_kind(InteractableKind::Key).expect("key");
        let world = scene.world_position(key.node).expect("key position");
        assert!((world - Vec3::new(525.0, 0.2, 475.0)).length() < 0.0001);
    }

    #[test]
    fn stalker_starts_hidden() {
        let mut scene = SceneGraph::default();
        let mut registry = InteractableRegistry::default();
        let handles = build_world(
            &WorldLayout::default(),
            &QuestConfig::default(),
            Some(&StalkerConfig::default()),
            &mut scene,
            &mut registry,
        )
        .expect("world");

        let stalker = handles.stalker.expect("stalker");
        assert!(!scene.find(stalker).expect("node").visible);
    }

    #[test]
    fn hand_spawns_above_table_in_house_space() {
        let mut scene = SceneGraph::default();
        let house = scene.add("house", Transform::at(Vec3::new(500.0, 0.0, 500.0)));
        let table = scene
            .add_child(house, "crafting_table", Transform::at(Vec3::new(-30.0, 1.0, 30.0)))
            .expect("table");

        let hand = spawn_hand(&mut scene, table).expect("hand");
        let world = scene.world_position(hand).expect("hand position");
        assert!((world - Vec3::new(470.0, 1.6, 530.0)).length() < 0.0001);
    }
}
