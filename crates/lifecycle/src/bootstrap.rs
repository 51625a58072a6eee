use crate::config::ViewerConfig;
use crate::context::{LoadStatus, SceneContext};
use earthview_assets::{AssetError, PendingTexture, TextureImage, TextureLoader};
use earthview_common::Color;
use earthview_render::{RenderError, Renderer};
use earthview_scene::{BasicMaterial, ObjectKind, PerspectiveCamera, SphereGeometry, Viewport};
use std::sync::Arc;

/// Name given to the textured sphere.
pub const EARTH_NAME: &str = "earth";

/// Result of [`initialize`]: the new context and the texture load it started.
#[derive(Debug)]
pub struct Bootstrap {
    pub context: SceneContext,
    pub pending: PendingTexture,
}

/// Build the scene context and start the Earth texture load.
///
/// The scene starts with a single ambient light. The sphere is not created
/// here; [`complete_texture_load`] adds it once the texture is available.
pub fn initialize(config: &ViewerConfig, loader: &TextureLoader) -> Bootstrap {
    let _span = tracing::info_span!("bootstrap").entered();

    let viewport = Viewport {
        clear_color: Color::from_hex(config.scene.clear_color),
        ..Viewport::new(config.window.width, config.window.height)
    };

    let mut camera = PerspectiveCamera::new(
        config.camera.fov_degrees,
        viewport.aspect(),
        config.camera.near,
        config.camera.far,
    );
    camera.position = config.camera.position;
    camera.look_at(config.camera.target);

    let earth_geometry = SphereGeometry::new(
        config.scene.earth_radius,
        config.scene.earth_width_segments,
        config.scene.earth_height_segments,
    );

    let mut context = SceneContext::new(camera, viewport, earth_geometry);
    context.scene.add(
        "ambient_light",
        ObjectKind::AmbientLight {
            color: Color::from_hex(config.scene.ambient_color),
            intensity: config.scene.ambient_intensity,
        },
    );

    let pending = loader.load(&config.scene.texture);
    tracing::info!(texture = %pending.path().display(), "scene initialized, texture requested");

    Bootstrap { context, pending }
}

/// Apply the outcome of the Earth texture load.
///
/// On success the textured sphere is added, its id recorded, and the scene
/// rendered once. Returns `Ok(true)` only in that case. A failure is logged
/// once and leaves the scene without a sphere; there is no retry. If the
/// Earth already exists the result is ignored.
pub fn complete_texture_load(
    context: &mut SceneContext,
    result: Result<Arc<TextureImage>, AssetError>,
    renderer: &mut dyn Renderer,
) -> Result<bool, RenderError> {
    if context.earth.is_some() {
        tracing::warn!("texture load completed again; earth already present");
        return Ok(false);
    }

    let texture = match result {
        Ok(texture) => texture,
        Err(e) => {
            tracing::error!(error = %e, "error loading earth texture");
            context.load_status = LoadStatus::Failed(e.to_string());
            return Ok(false);
        }
    };

    tracing::info!(
        width = texture.width(),
        height = texture.height(),
        "earth texture loaded"
    );

    let id = context.scene.add(
        EARTH_NAME,
        ObjectKind::Mesh {
            geometry: context.earth_geometry,
            material: BasicMaterial::textured(texture),
        },
    );
    context.earth = Some(id);
    context.load_status = LoadStatus::Loaded;

    context.render(renderer)?;
    Ok(true)
}
