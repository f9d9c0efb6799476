//! Deferred light composition.
//!
//! Per light: an optional stencil pass marking the pixels inside the light
//! volume, then a light pass accumulating into the light target. Directional
//! lights cover the whole screen and skip the stencil pass. A single combine
//! pass runs last, reading the light accumulation and the geometry buffers.

use glam::Mat4;

use crate::effect::{Effect, Result, TechniqueHandle, TextureHandle};
use crate::effects::{BindingContext, DeferredComposer, FrameState};
use crate::technique::Technique;

/// Render targets of the deferred pipeline.
///
/// `depth` is the sampled scene depth; stencil passes render into the
/// separate `depth_stencil` attachment so no pass writes a texture it reads.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CompositionTargets {
    pub color: Option<TextureHandle>,
    pub normal: Option<TextureHandle>,
    pub depth: Option<TextureHandle>,
    pub depth_stencil: Option<TextureHandle>,
    pub light_accumulation: Option<TextureHandle>,
    pub output: Option<TextureHandle>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassKind {
    Stencil(LightKind),
    Light(LightKind),
    Combine,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PassGeometry {
    FullScreen,
    /// Unit sphere (point) or unit cone (spot) placed by `world`.
    LightVolume { world: Mat4 },
}

/// One pass, handed to the executor after all of its parameters are bound.
#[derive(Clone, Debug, PartialEq)]
pub struct DeferredPass {
    pub kind: PassKind,
    pub technique: TechniqueHandle,
    pub target: Option<TextureHandle>,
    pub geometry: PassGeometry,
}

/// Issues the draw for a bound pass.
pub trait PassExecutor {
    fn execute(&mut self, pass: &DeferredPass) -> Result<()>;
}

/// Records passes instead of drawing them.
impl PassExecutor for Vec<DeferredPass> {
    fn execute(&mut self, pass: &DeferredPass) -> Result<()> {
        self.push(pass.clone());
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompositionStats {
    pub stencil_passes: u32,
    pub directional_passes: u32,
    pub point_passes: u32,
    pub spot_passes: u32,
    pub combine_passes: u32,
}

impl CompositionStats {
    pub fn total(&self) -> u32 {
        self.stencil_passes
            + self.directional_passes
            + self.point_passes
            + self.spot_passes
            + self.combine_passes
    }

    fn count(&mut self, kind: PassKind) {
        match kind {
            PassKind::Stencil(_) => self.stencil_passes += 1,
            PassKind::Light(LightKind::Directional) => self.directional_passes += 1,
            PassKind::Light(LightKind::Point) => self.point_passes += 1,
            PassKind::Light(LightKind::Spot) => self.spot_passes += 1,
            PassKind::Combine => self.combine_passes += 1,
        }
    }
}

pub struct DeferredPipeline {
    composer: DeferredComposer,
    targets: CompositionTargets,
}

impl DeferredPipeline {
    pub fn new(effect: &Effect, context: &BindingContext, targets: CompositionTargets) -> Result<Self> {
        Ok(Self {
            composer: DeferredComposer::new(effect, context)?,
            targets,
        })
    }

    pub fn from_composer(composer: DeferredComposer, targets: CompositionTargets) -> Self {
        Self { composer, targets }
    }

    pub fn set_targets(&mut self, targets: CompositionTargets) {
        self.targets = targets;
    }

    pub fn targets(&self) -> &CompositionTargets {
        &self.targets
    }

    pub fn composer(&self) -> &DeferredComposer {
        &self.composer
    }

    /// Runs every light pass for the frame's visible lights, then the combine
    /// pass. Stops at the first executor error.
    pub fn compose(
        &self,
        frame: &FrameState,
        executor: &mut dyn PassExecutor,
    ) -> Result<CompositionStats> {
        let composer = &self.composer;
        let accumulation = self.targets.light_accumulation;
        let mut stats = CompositionStats::default();

        composer.update_per_frame(frame, &self.targets);

        for light in frame.lights.directional_lights() {
            composer.update_directional(light);
            self.emit(
                executor,
                &mut stats,
                PassKind::Light(LightKind::Directional),
                composer.directional_light(),
                accumulation,
                PassGeometry::FullScreen,
            )?;
        }

        for light in frame.lights.point_lights() {
            let world = composer.update_point(light);
            let techniques = (composer.point_stencil(), composer.point_light());
            self.light_volume(executor, &mut stats, LightKind::Point, techniques, world)?;
        }

        for light in frame.lights.spot_lights() {
            let world = composer.update_spot(light);
            let techniques = (composer.spot_stencil(), composer.spot_light());
            self.light_volume(executor, &mut stats, LightKind::Spot, techniques, world)?;
        }

        composer.update_combine(accumulation);
        self.emit(
            executor,
            &mut stats,
            PassKind::Combine,
            composer.combine(),
            self.targets.output,
            PassGeometry::FullScreen,
        )?;

        log::trace!("Deferred composition: {stats:?}");
        Ok(stats)
    }

    fn light_volume(
        &self,
        executor: &mut dyn PassExecutor,
        stats: &mut CompositionStats,
        kind: LightKind,
        (stencil, light): (&Technique, &Technique),
        world: Mat4,
    ) -> Result<()> {
        let geometry = PassGeometry::LightVolume { world };

        self.emit(
            executor,
            stats,
            PassKind::Stencil(kind),
            stencil,
            self.targets.depth_stencil,
            geometry,
        )?;
        self.emit(
            executor,
            stats,
            PassKind::Light(kind),
            light,
            self.targets.light_accumulation,
            geometry,
        )
    }

    fn emit(
        &self,
        executor: &mut dyn PassExecutor,
        stats: &mut CompositionStats,
        kind: PassKind,
        technique: &Technique,
        target: Option<TextureHandle>,
        geometry: PassGeometry,
    ) -> Result<()> {
        executor.execute(&DeferredPass {
            kind,
            technique: technique.handle(),
            target,
            geometry,
        })?;
        stats.count(kind);
        Ok(())
    }
}
