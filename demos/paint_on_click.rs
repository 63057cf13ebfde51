//! Paint on a quad with the mouse.
//!
//! Hold the left button to paint, the right button to raise bumps in the
//! normal map, and press R to reset the canvas.

use bevy::prelude::*;
use bevy::render::render_resource::TextureFormat;
use bevy::window::PrimaryWindow;
use bevy_texture_paint::prelude::*;
use bevy_texture_paint::texture::{self, COLOR_SURFACE_FORMAT, NORMAL_SURFACE_FORMAT};

const QUAD_SIZE: f32 = 4.0;

#[derive(Resource)]
struct Brushes {
    paint: Brush,
    bump: Brush,
}

#[derive(Component)]
struct Board;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins(TexturePaintPlugin::default())
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (paint_under_cursor, reset_on_key).before(TexturePaintSystems),
        )
        .add_systems(Update, log_failures.after(TexturePaintSystems))
        .run();
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut images: ResMut<Assets<Image>>,
) {
    let stamp = images.add(round_stamp(32, [200, 40, 40, 255], COLOR_SURFACE_FORMAT));
    let bump = images.add(round_stamp(32, [200, 200, 255, 255], NORMAL_SURFACE_FORMAT));
    commands.insert_resource(Brushes {
        paint: Brush::new(stamp).with_color_blend(ColorBlendMode::UseBrush),
        bump: Brush::default()
            .with_normal_texture(bump)
        .with_normal_blend(NormalBlendMode::Max)
        .with_normal_blend_strength(0.5),
    });

    let flat_normals = images.add(texture::new_surface(
        UVec2::splat(512),
        NORMAL_SURFACE_FORMAT,
        [128, 128, 255, 255],
    ));

    // Without a color texture the canvas starts as a blank placeholder
    commands.spawn((
        Board,
        Mesh3d(meshes.add(Rectangle::new(QUAD_SIZE, QUAD_SIZE))),
        MeshMaterial3d(materials.add(StandardMaterial {
            normal_map_texture: Some(flat_normals),
            ..default()
        })),
        CollisionShape::Mesh,
        PaintableCanvas::default(),
    ));

    commands.spawn((
        PointLight {
            intensity: 2_000_000.0,
            ..default()
        },
        Transform::from_xyz(2.0, 3.0, 4.0),
    ));

    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 0.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

/// Opaque disc of `color` with a soft alpha edge.
fn round_stamp(size: u32, color: [u8; 4], format: TextureFormat) -> Image {
    let mut image = texture::new_surface(UVec2::splat(size), format, [0; 4]);
    let center = size as f32 / 2.0;
    if let Ok(texels) = texture::pixels_mut(&mut image) {
        for (i, texel) in texels.iter_mut().enumerate() {
            let x = (i as u32 % size) as f32 + 0.5;
            let y = (i as u32 / size) as f32 + 0.5;
            let distance = Vec2::new(x - center, y - center).length() / center;
            let alpha = (1.0 - distance).clamp(0.0, 0.25) * 4.0;
            *texel = [color[0], color[1], color[2], (alpha * color[3] as f32) as u8];
        }
    }
    image
}

fn paint_under_cursor(
    buttons: Res<ButtonInput<MouseButton>>,
    window: Query<&Window, With<PrimaryWindow>>,
    camera: Query<(&Camera, &GlobalTransform)>,
    board: Query<(Entity, &GlobalTransform), With<Board>>,
    brushes: Res<Brushes>,
    mut requests: MessageWriter<PaintRequest>,
) {
    let brush = if buttons.pressed(MouseButton::Left) {
        &brushes.paint
    } else if buttons.pressed(MouseButton::Right) {
        &brushes.bump
    } else {
        return;
    };

    let Ok(window) = window.single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };
    let Ok((camera, camera_transform)) = camera.single() else {
        return;
    };
    let Ok(ray) = camera.viewport_to_world(camera_transform, cursor) else {
        return;
    };
    let Ok((entity, board_transform)) = board.single() else {
        return;
    };

    let Some(distance) =
        ray.intersect_plane(board_transform.translation(), InfinitePlane3d::new(Vec3::Z))
    else {
        return;
    };
    let local = board_transform
        .affine()
        .inverse()
        .transform_point3(ray.get_point(distance));
    let half = QUAD_SIZE / 2.0;
    let uv = Vec2::new((local.x + half) / QUAD_SIZE, (half - local.y) / QUAD_SIZE);
    if uv.cmplt(Vec2::ZERO).any() || uv.cmpgt(Vec2::ONE).any() {
        return;
    }

    requests.write(PaintRequest::new(PaintHit::new(entity, uv), brush.clone()));
}

fn reset_on_key(
    keys: Res<ButtonInput<KeyCode>>,
    board: Query<Entity, With<Board>>,
    mut commands: MessageWriter<CanvasCommand>,
) {
    if keys.just_pressed(KeyCode::KeyR) {
        for entity in &board {
            commands.write(CanvasCommand::Reset(entity));
        }
    }
}

fn log_failures(mut outcomes: MessageReader<PaintOutcome>) {
    for outcome in outcomes.read() {
        if let Err(error) = &outcome.result {
            warn!("Stroke on {} failed: {}", outcome.target, error);
        }
    }
}
