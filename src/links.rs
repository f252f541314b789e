use std::marker::PhantomData;

use bevy::ecs::relationship::Relationship;
use bevy::prelude::*;

/// Points a sprite child at the character it draws.
#[derive(Component, Reflect)]
#[relationship(relationship_target = HasVisual)]
pub struct VisualOf(pub Entity);

#[derive(Component, Reflect)]
#[relationship_target(relationship = VisualOf, linked_spawn)]
pub struct HasVisual(Entity);

impl HasVisual {
    pub fn target_entity(&self) -> Entity {
        self.0
    }
}

/// Points the collider that is switched off while crouching at its character.
#[derive(Component, Reflect)]
#[relationship(relationship_target = HasCrouchCollider)]
pub struct CrouchColliderOf(pub Entity);

#[derive(Component, Reflect)]
#[relationship_target(relationship = CrouchColliderOf, linked_spawn)]
pub struct HasCrouchCollider(Entity);

impl HasCrouchCollider {
    pub fn target_entity(&self) -> Entity {
        self.0
    }
}

/// Links every entity that gains `M` to its closest ancestor carrying `R`,
/// through the relationship `L`.
pub struct LinkToRootPlugin<M: Component, R: Component, L: Relationship>(PhantomData<(M, R, L)>);

impl<M: Component, R: Component, L: Relationship> Default for LinkToRootPlugin<M, R, L> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<M: Component, R: Component, L: Relationship> Plugin for LinkToRootPlugin<M, R, L> {
    fn build(&self, app: &mut App) {
        app.add_systems(PreUpdate, link_to_root::<M, R, L>);
    }
}

fn link_to_root<M: Component, R: Component, L: Relationship>(
    mut commands: Commands,
    on: Query<Entity, Added<M>>,
    roots: Query<Entity, With<R>>,
    parents: Query<&ChildOf>,
) {
    for target in on.iter() {
        let Some(root) = parents
            .iter_ancestors(target)
            .find_map(|e| roots.get(e).ok())
        else {
            warn!("{target} has no root to link to");
            continue;
        };

        commands.entity(target).insert(<L as Relationship>::from(root));
    }
}
