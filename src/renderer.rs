//! The draw side of the simulation.
//!
//! The population only ever talks to the [`RenderSink`] trait: draw this
//! organism at that position, undraw that one. The retained [`Scene`] is the
//! windowed implementation's backing store; [`NullRender`] keeps headless
//! stepping and tests free of graphics state. [`Renderer`] turns the scene
//! into pixels whenever the window asks for a frame.

use std::collections::BTreeMap;

use crate::organism::{Kind, OrganismId};

use opengl_graphics::GlGraphics;
use piston::input::RenderArgs;

/// In-process drawing surface the population reports into.
pub trait RenderSink {
    /// Place or move the organism's visual at `pos` with radius `radius`.
    fn draw(&mut self, id: OrganismId, pos: [f64; 2], radius: f64, kind: Kind);
    /// Remove the organism's visual. Unknown ids are ignored.
    fn undraw(&mut self, id: OrganismId);
}

/// Sink that swallows everything, for tests and headless stepping.
#[allow(dead_code)]
pub struct NullRender;

impl RenderSink for NullRender {
    fn draw(&mut self, _id: OrganismId, _pos: [f64; 2], _radius: f64, _kind: Kind) {}
    fn undraw(&mut self, _id: OrganismId) {}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sprite {
    pub pos: [f64; 2],
    pub radius: f64,
    pub kind: Kind,
}

/// Retained sprite set in habitat coordinates. Draw calls update it during
/// the tick, the renderer reads it whenever a frame is due. Plants get drawn
/// once at spawn and never again, which is exactly what a retained scene
/// wants: their sprite simply stays where it is.
#[derive(Default, Debug)]
pub struct Scene {
    sprites: BTreeMap<OrganismId, Sprite>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sprites(&self) -> impl Iterator<Item = (&OrganismId, &Sprite)> {
        self.sprites.iter()
    }
}

impl RenderSink for Scene {
    fn draw(&mut self, id: OrganismId, pos: [f64; 2], radius: f64, kind: Kind) {
        self.sprites.insert(id, Sprite { pos, radius, kind });
    }

    fn undraw(&mut self, id: OrganismId) {
        self.sprites.remove(&id);
    }
}

/// Fill colour per kind, same palette the original legend used.
pub fn colour(kind: Kind) -> [f32; 4] {
    match kind {
        Kind::Plant => [10. / 255., 117. / 255., 31. / 255., 1.],
        Kind::Herbivore => [0., 0., 1., 1.],
        Kind::Omnivore => [1., 0.65, 0., 1.],
        Kind::Carnivore => [1., 0., 0., 1.],
    }
}

pub struct Renderer {
    pub gl: GlGraphics,
    pub mousepos: [f64; 2],
    /// Habitat half-width, needed to map habitat coordinates onto the window.
    pub window_size: f64,
}

impl Renderer {
    pub fn render<C>(
        &mut self,
        scene: &Scene,
        hud: &str,
        args: &RenderArgs,
        glyph_cache: &mut C,
    ) where
        C: graphics::character::CharacterCache<Texture = opengl_graphics::Texture>,
        <C as graphics::character::CharacterCache>::Error: std::fmt::Debug,
    {
        use graphics::*;

        const BLACK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
        const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

        let (width, height) = (args.window_size[0], args.window_size[1]);
        let xscale = width / (2. * self.window_size);
        let yscale = height / (2. * self.window_size);

        let c = self.gl.draw_begin(args.viewport());
        let gl = &mut self.gl;
        clear(BLACK, gl);

        for (_id, sprite) in scene.sprites() {
            let sx = (sprite.pos[0] + self.window_size) * xscale;
            let sy = (sprite.pos[1] + self.window_size) * yscale;
            let rx = sprite.radius * xscale;
            let ry = sprite.radius * yscale;
            let rect = [sx - rx, sy - ry, 2. * rx, 2. * ry];
            ellipse(colour(sprite.kind), rect, c.transform, gl);
        }

        let size = 14_usize;
        display_text(hud, glyph_cache, c.transform.trans(5., 5.), WHITE, size, gl).unwrap();

        self.gl.draw_end();
    }
}

/// displays multiline text
use graphics::types::Matrix2d;
fn display_text<C, G>(
    text: &str,
    glyph_cache: &mut C,
    // the left upper corner
    basetrans: Matrix2d,
    colour: [f32; 4],
    size: usize,
    graphics: &mut G,
) -> Result<(), <C as graphics::character::CharacterCache>::Error>
where
    G: graphics::Graphics,
    C: graphics::character::CharacterCache<Texture = G::Texture>,
    <C as graphics::character::CharacterCache>::Error: std::fmt::Debug,
{
    let basetrans = basetrans.trans(0., size as f64);
    use graphics::Transformed;
    text.split('\n').enumerate().try_for_each(|(idx, txt)| {
        graphics::text(
            colour,
            size as u32,
            txt,
            glyph_cache,
            basetrans.trans(0., (size * idx) as f64),
            graphics,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_retains_latest_draw() {
        let mut scene = Scene::new();
        scene.draw(1, [0., 0.], 3., Kind::Plant);
        scene.draw(2, [5., 5.], 2., Kind::Herbivore);
        scene.draw(1, [1., -1.], 3., Kind::Plant);
        assert_eq!(scene.sprites().count(), 2);
        let sprite = scene.sprites().find(|(id, _)| **id == 1).unwrap().1;
        assert_eq!(sprite.pos, [1., -1.]);
    }

    #[test]
    fn undraw_is_idempotent() {
        let mut scene = Scene::new();
        scene.draw(7, [0., 0.], 1., Kind::Carnivore);
        scene.undraw(7);
        scene.undraw(7);
        assert_eq!(scene.sprites().count(), 0);
    }
}
