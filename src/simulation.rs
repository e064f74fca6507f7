use glam::Vec3;
use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::config::BlobConfig;
use crate::data::Primitive;
use crate::meshing::{Aabb, Grid};

/// below this a sphere counts as having reached its target
const ARRIVAL_DISTANCE: f32 = 1.0e-5;
/// world units per second at full speed, in multiples of the volume radius
const SPEED_SCALE: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub position: Vec3,
    pub target: Vec3,
    pub radius: f32,
    pub color: Vec3,
    /// per sphere multiplier of the global speed
    pub speed_factor: f32,
}

/// Spheres wandering between random targets inside the padded grid bounds
pub struct BlobSimulation {
    spheres: Vec<Sphere>,
    bounds: Aabb,
    speed: f32,
    volume_radius: f32,
    rng: StdRng,
}

impl BlobSimulation {
    pub fn new(config: &BlobConfig, grid: &Grid) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut simulation = BlobSimulation {
            spheres: Vec::new(),
            bounds: grid.padded_bounds(config.volume_radius, config.smooth_k),
            speed: config.speed,
            volume_radius: config.volume_radius,
            rng,
        };
        simulation.reseed(config, grid);
        simulation
    }

    fn random_position(&mut self) -> Vec3 {
        let Aabb { min, max } = self.bounds;
        Vec3::new(
            self.rng.gen_range(min.x..=max.x),
            self.rng.gen_range(min.y..=max.y),
            self.rng.gen_range(min.z..=max.z),
        )
    }

    /// Replaces every sphere, as changing the count, radius, variance or blend radius does
    pub fn reseed(&mut self, config: &BlobConfig, grid: &Grid) {
        self.bounds = grid.padded_bounds(config.volume_radius, config.smooth_k);
        self.speed = config.speed;
        self.volume_radius = config.volume_radius;

        let variance = config.target_radius * config.radius_variance;
        let (min_radius, max_radius) = (
            config.target_radius - variance,
            config.target_radius + variance,
        );
        self.spheres = (0..config.sphere_count)
            .map(|i| Sphere {
                position: self.random_position(),
                target: self.random_position(),
                radius: self.rng.gen_range(min_radius..=max_radius),
                color: if i % 2 == 0 { Vec3::ONE } else { Vec3::ZERO },
                speed_factor: self.rng.gen_range(0.5..=1.5),
            })
            .collect();
        debug!(
            "reseeded {} spheres, radius {min_radius}..{max_radius}",
            self.spheres.len()
        );
    }

    /// Changes the global speed without reseeding
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// Moves every sphere toward its target, picking a new target on arrival
    pub fn update(&mut self, delta_time: f32) {
        for i in 0..self.spheres.len() {
            let sphere = self.spheres[i];
            let offset = sphere.target - sphere.position;
            let distance = offset.length();
            if distance < ARRIVAL_DISTANCE {
                self.spheres[i].target = self.random_position();
                continue;
            }

            let step =
                self.speed * sphere.speed_factor * delta_time * self.volume_radius * SPEED_SCALE;
            if step >= distance {
                self.spheres[i].position = sphere.target;
                self.spheres[i].target = self.random_position();
            } else {
                self.spheres[i].position = sphere.position + offset / distance * step;
            }
        }
    }

    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn primitives(&self) -> Vec<Primitive> {
        self.spheres
            .iter()
            .map(|sphere| Primitive::new(sphere.position, sphere.radius, sphere.color))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn setup(seed: u64) -> (BlobConfig, Grid) {
        let config = BlobConfig {
            seed: Some(seed),
            ..Default::default()
        };
        let grid = Grid::centered(config.cells_per_axis, config.volume_radius).unwrap();
        (config, grid)
    }

    #[test]
    fn reseed_follows_the_configuration() {
        let (config, grid) = setup(3);
        let simulation = BlobSimulation::new(&config, &grid);
        assert_eq!(simulation.spheres().len(), 24);
        for (i, sphere) in simulation.spheres().iter().enumerate() {
            assert!(simulation.bounds().contains(sphere.position));
            assert!(simulation.bounds().contains(sphere.target));
            assert!(sphere.radius >= 0.0125 * 0.7 - 1e-7 && sphere.radius <= 0.0125 * 1.3 + 1e-7);
            assert!((0.5..=1.5).contains(&sphere.speed_factor));
            let expected = if i % 2 == 0 { Vec3::ONE } else { Vec3::ZERO };
            assert_eq!(sphere.color, expected);
        }
    }

    #[test]
    fn seeded_runs_repeat() {
        let (config, grid) = setup(11);
        let mut a = BlobSimulation::new(&config, &grid);
        let mut b = BlobSimulation::new(&config, &grid);
        for _ in 0..30 {
            a.update(1. / 60.);
            b.update(1. / 60.);
        }
        assert_eq!(a.primitives(), b.primitives());
    }

    #[test]
    fn spheres_step_toward_their_targets() {
        let (config, grid) = setup(5);
        let mut simulation = BlobSimulation::new(&config, &grid);
        let before = simulation.spheres()[0];
        let dt = 0.01;
        simulation.update(dt);
        let after = simulation.spheres()[0];
        let step = 0.25 * before.speed_factor * dt * 0.175 * 1.5;
        let distance = before.position.distance(before.target);
        if step < distance {
            assert_relative_eq!(after.position.distance(before.position), step, epsilon = 1e-6);
            assert_eq!(after.target, before.target);
        } else {
            assert_eq!(after.position, before.target);
        }
    }

    #[test]
    fn arrival_picks_a_new_target() {
        let (config, grid) = setup(9);
        let mut simulation = BlobSimulation::new(&config, &grid);
        // a huge step reaches every target
        simulation.update(1_000.);
        let bounds = simulation.bounds();
        for sphere in simulation.spheres() {
            assert!(bounds.contains(sphere.position));
            assert!(bounds.contains(sphere.target));
        }
    }

    #[test]
    fn zero_speed_holds_still() {
        let (config, grid) = setup(1);
        let mut simulation = BlobSimulation::new(&config, &grid);
        simulation.set_speed(0.);
        let before = simulation.primitives();
        simulation.update(1.);
        assert_eq!(simulation.primitives(), before);
    }
}
