//! A paintable mesh instance: its surfaces plus the compositor that paints
//! them.

use bevy::prelude::*;

use super::validation::{CollisionShape, validate_collision_shapes};
use crate::brush::Brush;
use crate::compositor::{PaintContext, PaintReport, PaintStrokeCompositor};
use crate::error::CanvasError;
use crate::surface::{CanvasSlots, CanvasSources, CanvasSurfaces};

/// Ray-intersection result addressed to a canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaintHit {
    /// Entity whose collision shape was hit.
    pub target: Entity,
    /// Texture coordinate of the hit, `[0, 1]²`.
    pub uv: Vec2,
}

impl PaintHit {
    pub fn new(target: Entity, uv: Vec2) -> Self {
        Self { target, uv }
    }
}

/// The entity a canvas is attached to, as seen at attach time.
#[derive(Clone, Copy, Debug)]
pub struct CanvasHost<'a> {
    pub owner: Entity,
    pub shapes: &'a [CollisionShape],
    /// Per-instance material the canvas rebinds. Not owned by the canvas.
    pub material: AssetId<StandardMaterial>,
}

/// Outcome of [`TextureCanvas::initialize`].
#[derive(Debug)]
pub enum CanvasInit {
    Active(TextureCanvas),
    /// The host failed validation or its textures could not be copied. The
    /// canvas never paints.
    Inert(CanvasError),
}

impl CanvasInit {
    pub fn active(self) -> Option<TextureCanvas> {
        match self {
            Self::Active(canvas) => Some(canvas),
            Self::Inert(_) => None,
        }
    }

    pub fn is_inert(&self) -> bool {
        matches!(self, Self::Inert(_))
    }
}

/// Paint state of one mesh instance.
#[derive(Debug)]
pub struct TextureCanvas {
    owner: Entity,
    material: AssetId<StandardMaterial>,
    surfaces: CanvasSurfaces,
    compositor: PaintStrokeCompositor,
}

impl TextureCanvas {
    /// Validate `host` and copy the textures bound to `slots` on `material`
    /// into fresh surfaces.
    ///
    /// Validation failures do not panic; they produce [`CanvasInit::Inert`]
    /// with `material` left untouched.
    pub fn initialize(
        host: CanvasHost<'_>,
        slots: CanvasSlots,
        compositor: PaintStrokeCompositor,
        material: &mut StandardMaterial,
        images: &mut Assets<Image>,
        default_size: UVec2,
    ) -> CanvasInit {
        if let Err(error) = validate_collision_shapes(host.shapes) {
            return CanvasInit::Inert(error.into());
        }

        let sources = CanvasSources::from_material(material, slots);
        match CanvasSurfaces::attach(sources, slots, material, images, default_size) {
            Ok(surfaces) => CanvasInit::Active(Self {
                owner: host.owner,
                material: host.material,
                surfaces,
                compositor,
            }),
            Err(error) => CanvasInit::Inert(error),
        }
    }

    /// Paint `brush` at the hit. Returns `true` when the stroke ran.
    ///
    /// Hits addressed to another entity are ignored silently; every other
    /// failure is logged.
    pub fn paint(&mut self, hit: &PaintHit, brush: Option<&Brush>, ctx: PaintContext<'_>) -> bool {
        match self.try_paint(hit, brush, ctx) {
            Ok(_) => true,
            Err(CanvasError::InvalidTarget { .. }) => false,
            Err(error) => {
                error!("Paint on {} failed: {}", self.owner, error);
                false
            }
        }
    }

    /// Paint `brush` at the hit, reporting which passes ran.
    ///
    /// A failed stroke leaves the surfaces as they were.
    pub fn try_paint(
        &mut self,
        hit: &PaintHit,
        brush: Option<&Brush>,
        ctx: PaintContext<'_>,
    ) -> Result<PaintReport, CanvasError> {
        if hit.target != self.owner {
            return Err(CanvasError::InvalidTarget {
                owner: self.owner,
                hit: hit.target,
            });
        }
        let brush = brush.ok_or(CanvasError::MissingBrush)?;

        self.compositor
            .composite(&self.surfaces, brush, hit.uv, ctx)
    }

    /// Release both surfaces. See [`CanvasSurfaces::release`].
    ///
    /// Slots of released surfaces on `material` are pointed back at the
    /// source textures so the mesh keeps rendering.
    pub fn release(
        &mut self,
        material: Option<&mut StandardMaterial>,
        images: &mut Assets<Image>,
        is_render_target: impl Fn(AssetId<Image>) -> bool,
    ) {
        self.surfaces.release(images, is_render_target);
        if let Some(material) = material {
            self.surfaces.rebind_released(material);
        }
    }

    /// Discard all strokes. See [`CanvasSurfaces::reset`].
    pub fn reset(
        &mut self,
        material: &mut StandardMaterial,
        images: &mut Assets<Image>,
        is_render_target: impl Fn(AssetId<Image>) -> bool,
    ) -> Result<(), CanvasError> {
        self.surfaces.reset(material, images, is_render_target)
    }

    /// Release the surfaces and hand the original textures back to
    /// `material` when it still exists.
    pub fn teardown(
        &mut self,
        material: Option<&mut StandardMaterial>,
        images: &mut Assets<Image>,
        is_render_target: impl Fn(AssetId<Image>) -> bool,
    ) {
        self.surfaces.release(images, is_render_target);
        if let Some(material) = material {
            self.surfaces.restore(material);
        }
        self.surfaces.drop_placeholder(images);
    }

    pub fn owner(&self) -> Entity {
        self.owner
    }

    pub fn material_id(&self) -> AssetId<StandardMaterial> {
        self.material
    }

    pub fn surfaces(&self) -> &CanvasSurfaces {
        &self.surfaces
    }

    pub fn compositor(&self) -> &PaintStrokeCompositor {
        &self.compositor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::{BlendKeyword, ColorBlendMode, NormalBlendMode};
    use crate::compositor::{CompositeProgram, TemporarySurfacePool};
    use crate::texture::{self, COLOR_SURFACE_FORMAT, NORMAL_SURFACE_FORMAT};

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLANK: [u8; 4] = [255, 255, 255, 255];
    const FLAT_NORMAL: [u8; 4] = [128, 128, 255, 255];

    struct Harness {
        _world: World,
        owner: Entity,
        stranger: Entity,
        images: Assets<Image>,
        programs: Assets<CompositeProgram>,
        materials: Assets<StandardMaterial>,
        pool: TemporarySurfacePool,
        compositor: PaintStrokeCompositor,
    }

    impl Harness {
        fn new() -> Self {
            let mut programs = Assets::<CompositeProgram>::default();
            let compositor = PaintStrokeCompositor::new(
                programs.add(CompositeProgram::color()),
                programs.add(CompositeProgram::normal()),
            );
            let mut world = World::new();
            let owner = world.spawn_empty().id();
            let stranger = world.spawn_empty().id();
            Self {
                _world: world,
                owner,
                stranger,
                images: Assets::default(),
                programs,
                materials: Assets::default(),
                pool: TemporarySurfacePool::default(),
                compositor,
            }
        }

        fn ctx(&mut self) -> PaintContext<'_> {
            PaintContext {
                images: &mut self.images,
                programs: &mut self.programs,
                pool: &mut self.pool,
            }
        }

        fn solid(&mut self, size: u32, fill: [u8; 4]) -> Handle<Image> {
            self.images
                .add(texture::new_surface(UVec2::splat(size), COLOR_SURFACE_FORMAT, fill))
        }

        fn canvas(&mut self, owner: Entity, material: StandardMaterial) -> TextureCanvas {
            let handle = self.materials.add(material);
            let material = self.materials.get_mut(&handle).unwrap();
            TextureCanvas::initialize(
                CanvasHost {
                    owner,
                    shapes: &[CollisionShape::Mesh],
                    material: handle.id(),
                },
                CanvasSlots::default(),
                self.compositor.clone(),
                material,
                &mut self.images,
                UVec2::splat(1024),
            )
            .active()
            .unwrap()
        }

        fn texels(&self, handle: &Handle<Image>) -> Vec<[u8; 4]> {
            texture::pixels(self.images.get(handle).unwrap())
                .unwrap()
                .to_vec()
        }
    }

    fn texel(texels: &[[u8; 4]], width: u32, x: u32, y: u32) -> [u8; 4] {
        texels[(y * width + x) as usize]
    }

    #[test]
    fn test_invalid_host_is_inert() {
        let mut harness = Harness::new();
        let mut material = StandardMaterial::default();

        let init = TextureCanvas::initialize(
            CanvasHost {
                owner: harness.owner,
                shapes: &[CollisionShape::Cuboid],
                material: AssetId::default(),
            },
            CanvasSlots::default(),
            harness.compositor.clone(),
            &mut material,
            &mut harness.images,
            UVec2::splat(1024),
        );

        assert!(init.is_inert());
        assert!(material.base_color_texture.is_none());
        assert_eq!(harness.images.len(), 0);
    }

    #[test]
    fn test_red_stamp_at_center() {
        let mut harness = Harness::new();
        let blank = harness.solid(256, BLANK);
        let red = harness.solid(32, RED);
        let mut canvas = harness.canvas(
            harness.owner,
            StandardMaterial {
                base_color_texture: Some(blank),
                ..default()
            },
        );
        let brush = Brush::new(red)
            .with_color_blend(ColorBlendMode::UseBrush)
            .with_scale(1.0);

        let painted = canvas.paint(
            &PaintHit::new(harness.owner, Vec2::splat(0.5)),
            Some(&brush),
            harness.ctx(),
        );

        assert!(painted);
        let color = canvas.surfaces().color_surface().unwrap().clone();
        let texels = harness.texels(&color);
        assert_eq!(texel(&texels, 256, 128, 128), RED);
        assert_eq!(texel(&texels, 256, 113, 128), RED);
        assert_eq!(texel(&texels, 256, 142, 142), RED);
        assert_eq!(texel(&texels, 256, 100, 128), BLANK);
        assert_eq!(texel(&texels, 256, 0, 0), BLANK);
        assert_eq!(texel(&texels, 256, 3, 2), BLANK);
    }

    #[test]
    fn test_missing_brush_changes_nothing() {
        let mut harness = Harness::new();
        let mut canvas = harness.canvas(harness.owner, StandardMaterial::default());
        let color = canvas.surfaces().color_surface().unwrap().clone();
        let before = harness.texels(&color);

        let result = canvas.try_paint(
            &PaintHit::new(harness.owner, Vec2::splat(0.5)),
            None,
            harness.ctx(),
        );

        assert_eq!(result, Err(CanvasError::MissingBrush));
        assert_eq!(harness.texels(&color), before);
    }

    #[test]
    fn test_foreign_hit_is_ignored() {
        let mut harness = Harness::new();
        let red = harness.solid(8, RED);
        let mut canvas = harness.canvas(harness.owner, StandardMaterial::default());
        let color = canvas.surfaces().color_surface().unwrap().clone();
        let before = harness.texels(&color);
        let painted = canvas.paint(
            &PaintHit::new(harness.stranger, Vec2::splat(0.5)),
            Some(&Brush::new(red)),
            harness.ctx(),
        );

        assert!(!painted);
        assert_eq!(harness.texels(&color), before);
        let program = harness
            .programs
            .get(canvas.compositor().color_program())
            .unwrap();
        assert_eq!(program.keywords().count(), 0);
    }

    #[test]
    fn test_color_only_brush_leaves_normals() {
        let mut harness = Harness::new();
        let color_source = harness.solid(64, BLANK);
        let normal_source = harness.images.add(texture::new_surface(
            UVec2::splat(64),
            NORMAL_SURFACE_FORMAT,
            FLAT_NORMAL,
        ));
        let red = harness.solid(16, RED);
        let mut canvas = harness.canvas(
            harness.owner,
            StandardMaterial {
                base_color_texture: Some(color_source),
                normal_map_texture: Some(normal_source),
                ..default()
            },
        );
        let color = canvas.surfaces().color_surface().unwrap().clone();
        let normal = canvas.surfaces().normal_surface().unwrap().clone();
        let color_before = harness.texels(&color);
        let normal_before = harness.texels(&normal);

        let report = canvas
            .try_paint(
                &PaintHit::new(harness.owner, Vec2::splat(0.5)),
                Some(&Brush::new(red).with_color_blend(ColorBlendMode::UseBrush)),
                harness.ctx(),
            )
            .unwrap();

        assert_eq!(
            report,
            PaintReport {
                color: true,
                normal: false
            }
        );
        assert_ne!(harness.texels(&color), color_before);
        assert_eq!(harness.texels(&normal), normal_before);
    }

    #[test]
    fn test_normal_pass_paints_normals() {
        let mut harness = Harness::new();
        let color_source = harness.solid(32, BLANK);
        let normal_source = harness.images.add(texture::new_surface(
            UVec2::splat(16),
            NORMAL_SURFACE_FORMAT,
            FLAT_NORMAL,
        ));
        let mask = harness.solid(4, RED);
        let bump = harness.images.add(texture::new_surface(
            UVec2::splat(4),
            NORMAL_SURFACE_FORMAT,
            [255, 0, 128, 255],
        ));
        let mut canvas = harness.canvas(
            harness.owner,
            StandardMaterial {
                base_color_texture: Some(color_source),
                normal_map_texture: Some(normal_source),
                ..default()
            },
        );
        let brush = Brush::new(mask)
            .with_normal_texture(bump)
            .with_normal_blend(NormalBlendMode::Max);

        let report = canvas
            .try_paint(
                &PaintHit::new(harness.owner, Vec2::splat(0.5)),
                Some(&brush),
                harness.ctx(),
            )
            .unwrap();

        assert!(report.color && report.normal);
        let normal = canvas.surfaces().normal_surface().unwrap().clone();
        let texels = harness.texels(&normal);
        assert_eq!(texel(&texels, 16, 8, 8), [255, 128, 255, 255]);
        assert_eq!(texel(&texels, 16, 0, 0), FLAT_NORMAL);
        assert_eq!(harness.pool.leased_texels(), 0);
    }

    fn mixed_size_canvas(harness: &mut Harness) -> TextureCanvas {
        let color_source = harness.solid(16, [40, 80, 120, 255]);
        let normal_source = harness.images.add(texture::new_surface(
            UVec2::splat(32),
            NORMAL_SURFACE_FORMAT,
            FLAT_NORMAL,
        ));
        harness.canvas(
            harness.owner,
            StandardMaterial {
                base_color_texture: Some(color_source),
                normal_map_texture: Some(normal_source),
                ..default()
            },
        )
    }

    fn mask_and_bump(harness: &mut Harness) -> Brush {
        let mask = harness.solid(4, RED);
        let bump = harness.images.add(texture::new_surface(
            UVec2::splat(4),
            NORMAL_SURFACE_FORMAT,
            [255, 0, 128, 255],
        ));
        Brush::new(mask)
            .with_normal_texture(bump)
            .with_normal_blend(NormalBlendMode::Max)
    }

    #[test]
    fn test_normal_surface_larger_than_color() {
        let mut harness = Harness::new();
        let mut canvas = mixed_size_canvas(&mut harness);
        let brush = mask_and_bump(&mut harness);

        let report = canvas
            .try_paint(
                &PaintHit::new(harness.owner, Vec2::splat(0.5)),
                Some(&brush),
                harness.ctx(),
            )
            .unwrap();

        assert!(report.color && report.normal);
        let color = canvas.surfaces().color_surface().unwrap().clone();
        assert_eq!(texel(&harness.texels(&color), 16, 8, 8), BLANK);
        let normal = canvas.surfaces().normal_surface().unwrap().clone();
        let normals = harness.texels(&normal);
        assert_eq!(texel(&normals, 32, 16, 16), [255, 128, 255, 255]);
        assert_eq!(texel(&normals, 32, 8, 8), FLAT_NORMAL);
        assert_eq!(harness.pool.leased_texels(), 0);
    }

    #[test]
    fn test_budget_for_normal_pass_checked_before_color_pass() {
        let mut harness = Harness::new();
        harness.pool = TemporarySurfacePool::new(16 * 16, 0);
        let mut canvas = mixed_size_canvas(&mut harness);
        let brush = mask_and_bump(&mut harness);
        let color = canvas.surfaces().color_surface().unwrap().clone();
        let normal = canvas.surfaces().normal_surface().unwrap().clone();
        let color_before = harness.texels(&color);
        let normal_before = harness.texels(&normal);

        let result = canvas.try_paint(
            &PaintHit::new(harness.owner, Vec2::splat(0.5)),
            Some(&brush),
            harness.ctx(),
        );

        assert_eq!(
            result,
            Err(CanvasError::ResourceExhausted {
                requested: 32 * 32,
                available: 16 * 16,
            })
        );
        assert_eq!(harness.texels(&color), color_before);
        assert_eq!(harness.texels(&normal), normal_before);
        let program = harness
            .programs
            .get(canvas.compositor().color_program())
            .unwrap();
        assert_eq!(program.keywords().count(), 0);
        assert_eq!(harness.pool.leased_texels(), 0);
    }

    #[test]
    fn test_keywords_stay_exclusive() {
        let mut harness = Harness::new();
        let color_source = harness.solid(16, BLANK);
        let normal_source = harness.images.add(texture::new_surface(
            UVec2::splat(16),
            NORMAL_SURFACE_FORMAT,
            FLAT_NORMAL,
        ));
        let mask = harness.solid(4, RED);
        let bump = harness.images.add(texture::new_surface(
            UVec2::splat(4),
            NORMAL_SURFACE_FORMAT,
            FLAT_NORMAL,
        ));
        let mut canvas = harness.canvas(
            harness.owner,
            StandardMaterial {
                base_color_texture: Some(color_source),
                normal_map_texture: Some(normal_source),
                ..default()
            },
        );
        let hit = PaintHit::new(harness.owner, Vec2::splat(0.25));

        for (color_mode, normal_mode) in [
            (ColorBlendMode::UseBrush, NormalBlendMode::Min),
            (ColorBlendMode::Neutral, NormalBlendMode::Max),
            (ColorBlendMode::from_index(42), NormalBlendMode::from_index(42)),
        ] {
            let brush = Brush::new(mask.clone())
                .with_normal_texture(bump.clone())
                .with_color_blend(color_mode)
                .with_normal_blend(normal_mode);
            assert!(canvas.paint(&hit, Some(&brush), harness.ctx()));

            let color_program = harness
                .programs
                .get(canvas.compositor().color_program())
                .unwrap();
            assert_eq!(
                color_program.active_blend_keywords::<ColorBlendMode>(),
                vec![color_mode.keyword()]
            );
            let normal_program = harness
                .programs
                .get(canvas.compositor().normal_program())
                .unwrap();
            assert_eq!(
                normal_program.active_blend_keywords::<NormalBlendMode>(),
                vec![normal_mode.keyword()]
            );
        }

        let color_program = harness
            .programs
            .get(canvas.compositor().color_program())
            .unwrap();
        assert!(color_program.is_keyword_enabled(ColorBlendMode::KEYWORD_CONTROL_COLOR));
    }

    #[test]
    fn test_exhausted_pool_paints_nothing() {
        let mut harness = Harness::new();
        harness.pool = TemporarySurfacePool::new(16, 0);
        let red = harness.solid(8, RED);
        let mut canvas = harness.canvas(harness.owner, StandardMaterial::default());
        let color = canvas.surfaces().color_surface().unwrap().clone();
        let before = harness.texels(&color);

        let result = canvas.try_paint(
            &PaintHit::new(harness.owner, Vec2::splat(0.5)),
            Some(&Brush::new(red)),
            harness.ctx(),
        );

        assert!(matches!(result, Err(CanvasError::ResourceExhausted { .. })));
        assert_eq!(harness.texels(&color), before);
    }

    #[test]
    fn test_paint_then_reset_restores_pristine_copy() {
        let mut harness = Harness::new();
        let source = harness.solid(64, [40, 80, 120, 255]);
        let red = harness.solid(16, RED);
        let material = StandardMaterial {
            base_color_texture: Some(source.clone()),
            ..default()
        };
        let mut canvas = harness.canvas(harness.owner, material);
        let pristine = harness.texels(&source);

        assert!(canvas.paint(
            &PaintHit::new(harness.owner, Vec2::splat(0.5)),
            Some(&Brush::new(red).with_tint(Color::srgb(0.0, 1.0, 0.0))),
            harness.ctx(),
        ));
        let painted = canvas.surfaces().color_surface().unwrap().clone();
        assert_ne!(texel(&harness.texels(&painted), 64, 32, 32), pristine[32 * 64 + 32]);

        let material = harness.materials.get_mut(canvas.material_id()).unwrap();
        canvas.reset(material, &mut harness.images, |_| false).unwrap();

        let fresh = canvas.surfaces().color_surface().unwrap().clone();
        assert_eq!(harness.texels(&fresh), pristine);
        assert_eq!(
            harness
                .materials
                .get(canvas.material_id())
                .unwrap()
                .base_color_texture,
            Some(fresh)
        );
    }

    #[test]
    fn test_released_canvas_refuses_paint() {
        let mut harness = Harness::new();
        let red = harness.solid(8, RED);
        let mut canvas = harness.canvas(harness.owner, StandardMaterial::default());

        let material = harness.materials.get_mut(canvas.material_id());
        canvas.release(material, &mut harness.images, |_| false);
        canvas.release(None, &mut harness.images, |_| false);
        assert!(canvas.surfaces().is_released());
        let placeholder = canvas.surfaces().sources().color.clone();
        assert!(placeholder.is_some());
        assert_eq!(
            harness
                .materials
                .get(canvas.material_id())
                .unwrap()
                .base_color_texture,
            placeholder
        );

        let result = canvas.try_paint(
            &PaintHit::new(harness.owner, Vec2::splat(0.5)),
            Some(&Brush::new(red)),
            harness.ctx(),
        );
        assert_eq!(result, Err(CanvasError::SurfaceReleased));
    }

    #[test]
    fn test_teardown_restores_material() {
        let mut harness = Harness::new();
        let source = harness.solid(8, BLANK);
        let mut canvas = harness.canvas(
            harness.owner,
            StandardMaterial {
                base_color_texture: Some(source.clone()),
                ..default()
            },
        );
        let images_before = harness.images.len();

        let material = harness.materials.get_mut(canvas.material_id());
        canvas.teardown(material, &mut harness.images, |_| false);

        assert_eq!(harness.images.len(), images_before - 1);
        assert_eq!(
            harness
                .materials
                .get(canvas.material_id())
                .unwrap()
                .base_color_texture,
            Some(source)
        );
    }
}
