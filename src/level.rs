use avian2d::prelude::*;
use bevy::prelude::*;

/// Physics layers used for collision filtering and probe masks.
#[derive(PhysicsLayer, Clone, Copy, Debug, Default)]
pub enum GameLayer {
    #[default]
    Default,
    /// Floors, walls, ceilings and ledges
    Ground,
    Player,
}

/// Spawn one of these to get a static, solid block of level geometry.
#[derive(Component)]
#[require(Transform, InheritedVisibility)]
pub struct SpawnPlatform {
    pub size: Vec2,
}

pub struct LevelPlugin;

impl Plugin for LevelPlugin {
    fn build(&self, app: &mut App) {
        app.add_observer(on_spawn_platform);
    }
}

const PLATFORM_COLOR: Color = Color::srgb(0.32, 0.36, 0.3);

fn on_spawn_platform(
    on: On<Add, SpawnPlatform>,
    mut commands: Commands,
    platforms: Query<&SpawnPlatform>,
) -> Result {
    let root = on.event_target();
    let platform = platforms.get(root)?;

    commands.entity(root).insert((
        Sprite::from_color(PLATFORM_COLOR, platform.size),
        RigidBody::Static,
        Collider::rectangle(platform.size.x, platform.size.y),
        CollisionLayers::new(GameLayer::Ground, [GameLayer::Default, GameLayer::Player]),
    ));

    Ok(())
}

/// Lays out the demo level: a floor, a tall wall to slide down, a short wall
/// with a ledge to hang from, a low tunnel to crouch through and a floating
/// platform for double jumps.
pub fn spawn_level(mut commands: Commands) {
    let blocks = [
        ("Floor", Vec2::new(0.0, -1.0), Vec2::new(60.0, 1.0)),
        ("Left wall", Vec2::new(-12.0, 5.0), Vec2::new(1.0, 12.0)),
        ("Ledge wall", Vec2::new(8.0, 0.5), Vec2::new(1.0, 2.0)),
        ("Tunnel roof", Vec2::new(16.0, 0.45), Vec2::new(5.0, 0.5)),
        ("Floating platform", Vec2::new(-4.0, 3.0), Vec2::new(4.0, 0.4)),
    ];

    for (name, position, size) in blocks {
        commands.spawn((
            SpawnPlatform { size },
            Transform::from_translation(position.extend(0.0)),
            Name::new(name),
        ));
    }

    info!("spawned {} level blocks", blocks.len());
}
