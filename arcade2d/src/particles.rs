use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::body::KinematicBody;
use crate::config::ArcadeConfig;
use crate::error::{check_timestep, Result};
use crate::math::{random_int, random_real, Vec2};
use crate::sprite::Sprite;

/// Values written onto every freshly emitted particle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterSettings {
    /// Particle lifetime in milliseconds (infinite by default)
    pub lifespan: f32,
    /// Initial velocity range; components are drawn as whole numbers
    pub min_speed: Vec2,
    pub max_speed: Vec2,
    /// Uniform scale range
    pub min_scale: f32,
    pub max_scale: f32,
    /// Initial angular velocity range (radians per second)
    pub min_rotation: f32,
    pub max_rotation: f32,
    pub gravity: Vec2,
    pub drag: Vec2,
    pub angular_drag: f32,
    pub bounce: Vec2,
    /// Milliseconds between emission cycles
    pub delay: f32,
    /// Size of each particle's sprite and body
    pub particle_size: Vec2,
}

impl Default for EmitterSettings {
    fn default() -> Self {
        Self {
            lifespan: f32::INFINITY,
            min_speed: Vec2::new(-100.0, -100.0),
            max_speed: Vec2::new(100.0, 100.0),
            min_scale: 1.0,
            max_scale: 1.0,
            min_rotation: -2.0 * PI,
            max_rotation: 2.0 * PI,
            gravity: Vec2::new(0.0, 5.0),
            drag: Vec2::ZERO,
            angular_drag: 0.0,
            bounce: Vec2::ZERO,
            delay: 100.0,
            particle_size: Vec2::new(4.0, 4.0),
        }
    }
}

impl EmitterSettings {
    /// Set velocity range.
    pub fn with_speed(mut self, min: Vec2, max: Vec2) -> Self {
        self.min_speed = min;
        self.max_speed = max;
        self
    }

    /// Set scale range.
    pub fn with_scale(mut self, min: f32, max: f32) -> Self {
        self.min_scale = min;
        self.max_scale = max;
        self
    }

    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_drag(mut self, drag: Vec2, angular_drag: f32) -> Self {
        self.drag = drag;
        self.angular_drag = angular_drag;
        self
    }

    pub fn with_bounce(mut self, bounce: Vec2) -> Self {
        self.bounce = bounce;
        self
    }
}

/// A pooled particle: a sprite driven by its own kinematic body.
#[derive(Clone, Debug)]
pub struct Particle {
    pub sprite: Sprite,
    pub body: KinematicBody,
    /// Remaining lifetime in milliseconds.
    pub lifespan: f32,
    alive: bool,
}

impl Particle {
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    fn kill(&mut self) {
        self.alive = false;
        self.sprite.visible = false;
    }
}

/// Spawns particles from a rectangular area on a timer.
///
/// Dead particles stay in the pool and are reused by later emissions.
pub struct ParticleEmitter {
    name: String,
    settings: EmitterSettings,
    config: ArcadeConfig,
    /// Top-left of the emission area.
    position: Vec2,
    width: f32,
    height: f32,
    max_particles: usize,
    particles: Vec<Particle>,
    active: bool,
    rate: usize,
    total: usize,
    emitted: usize,
    timer: f32,
    rng: fastrand::Rng,
}

impl ParticleEmitter {
    /// Create an emitter. Fails if `settings.particle_size` is not positive.
    pub fn new(
        name: impl Into<String>,
        settings: EmitterSettings,
        config: &ArcadeConfig,
    ) -> Result<Self> {
        // Validate once so pooled particle bodies can always be built.
        KinematicBody::new(&Sprite::new(Vec2::ZERO, settings.particle_size), config)?;

        Ok(Self {
            name: name.into(),
            settings,
            config: config.clone(),
            position: Vec2::ZERO,
            width: 0.0,
            height: 0.0,
            max_particles: config.max_emitter_particles,
            particles: Vec::new(),
            active: false,
            rate: 0,
            total: 0,
            emitted: 0,
            timer: 0.0,
            rng: fastrand::Rng::new(),
        })
    }

    /// Seed the emitter's random source for reproducible emission.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = fastrand::Rng::with_seed(seed);
        self
    }

    /// Set the emission rectangle (top-left plus size).
    #[must_use]
    pub fn with_area(mut self, position: Vec2, width: f32, height: f32) -> Self {
        self.position = position;
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        self
    }

    /// Set the maximum number of particles this emitter can hold at once.
    #[must_use]
    pub fn with_max_particles(mut self, max: usize) -> Self {
        self.max_particles = max;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &EmitterSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut EmitterSettings {
        &mut self.settings
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Begin emitting.
    ///
    /// `lifespan` and `delay` are milliseconds. Unset, zero, or otherwise
    /// non-positive values fall back to an infinite lifespan, 250 ms, one
    /// particle per cycle, and the configured particle cap.
    pub fn start(
        &mut self,
        lifespan: Option<f32>,
        delay: Option<f32>,
        rate: Option<usize>,
        total: Option<usize>,
    ) {
        self.active = true;
        self.settings.lifespan = lifespan.filter(|l| *l > 0.0).unwrap_or(f32::INFINITY);
        self.settings.delay = delay.filter(|d| *d > 0.0).unwrap_or(250.0);
        self.rate = rate.filter(|r| *r > 0).unwrap_or(1);
        self.total = total
            .filter(|t| *t > 0)
            .unwrap_or(self.config.max_emitter_particles);
        self.emitted = 0;
        self.timer = 0.0;
        log::debug!(
            "emitter {} started: delay={}ms rate={} total={}",
            self.name,
            self.settings.delay,
            self.rate,
            self.total
        );
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Particles emitted since the last `start`.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Live particles.
    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(|p| p.alive)
    }

    pub fn live_count(&self) -> usize {
        self.particles().count()
    }

    /// Pool size, live and dead.
    pub fn pool_size(&self) -> usize {
        self.particles.len()
    }

    /// Emit one particle. Returns false when the emission budget is spent or
    /// the pool is full.
    pub fn emit_particle(&mut self) -> bool {
        if self.emitted >= self.total {
            return false;
        }
        let Some(index) = self.acquire() else {
            log::warn!(
                "emitter {} is out of particles ({} live)",
                self.name,
                self.max_particles
            );
            return false;
        };

        let s = &self.settings;
        let rng = &mut self.rng;
        let part = &mut self.particles[index];

        part.alive = true;
        part.sprite.visible = true;
        part.sprite.position = Vec2::new(
            random_int(rng, self.position.x, self.position.x + self.width),
            random_int(rng, self.position.y, self.position.y + self.height),
        );
        part.sprite.angle = 0.0;
        part.lifespan = s.lifespan;

        let body = &mut part.body;
        body.reset_to(&part.sprite);
        body.touching = Default::default();
        body.acceleration = Vec2::ZERO;
        body.angular_acceleration = 0.0;
        body.bounce = s.bounce;
        body.gravity = s.gravity;
        body.velocity = Vec2::new(
            random_int(rng, s.min_speed.x, s.max_speed.x),
            random_int(rng, s.min_speed.y, s.max_speed.y),
        );
        body.angular_velocity = random_int(rng, s.min_rotation, s.max_rotation);

        let scale = random_real(rng, s.min_scale, s.max_scale);
        body.scale = Vec2::new(scale, scale);
        part.sprite.scale = body.scale;

        body.drag = s.drag;
        body.angular_drag = s.angular_drag;

        self.emitted += 1;
        true
    }

    /// Age and move live particles, then emit if a cycle has elapsed.
    pub fn update(&mut self, dt: f32) -> Result<()> {
        check_timestep(dt)?;

        for part in self.particles.iter_mut().filter(|p| p.alive) {
            if part.lifespan.is_finite() {
                part.lifespan -= dt * 1000.0;
                if part.lifespan <= 0.0 {
                    part.kill();
                    continue;
                }
            }
            part.body.step(dt, &mut part.sprite)?;
        }

        if !self.active {
            return Ok(());
        }

        self.timer += dt * 1000.0;
        if self.timer >= self.settings.delay {
            self.timer -= self.settings.delay;
            for _ in 0..self.rate {
                if !self.emit_particle() {
                    break;
                }
            }
        }

        Ok(())
    }

    // Index of a dead particle, growing the pool up to the cap if needed.
    fn acquire(&mut self) -> Option<usize> {
        if let Some(i) = self.particles.iter().position(|p| !p.alive) {
            return Some(i);
        }
        if self.particles.len() >= self.max_particles {
            return None;
        }

        let sprite = Sprite::new(self.position, self.settings.particle_size)
            .with_name(format!("{}-particle-{}", self.name, self.particles.len()));
        // Size was validated in `new`.
        let body = KinematicBody::new(&sprite, &self.config).ok()?;
        self.particles.push(Particle {
            sprite,
            body,
            lifespan: f32::INFINITY,
            alive: false,
        });
        Some(self.particles.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emitter(settings: EmitterSettings) -> ParticleEmitter {
        ParticleEmitter::new("sparks", settings, &ArcadeConfig::default())
            .unwrap()
            .with_seed(42)
    }

    #[test]
    fn test_rejects_zero_sized_particles() {
        let settings = EmitterSettings {
            particle_size: Vec2::new(0.0, 2.0),
            ..Default::default()
        };
        assert!(ParticleEmitter::new("bad", settings, &ArcadeConfig::default()).is_err());
    }

    #[test]
    fn test_emitted_particle_is_initialized() {
        let settings = EmitterSettings::default()
            .with_speed(Vec2::new(-10.0, 5.0), Vec2::new(10.0, 20.0))
            .with_scale(0.5, 2.0)
            .with_drag(Vec2::new(1.0, 2.0), 0.5)
            .with_bounce(Vec2::new(0.3, 0.3));
        let mut em = emitter(settings).with_area(Vec2::new(100.0, 50.0), 10.0, 4.0);
        em.start(None, None, None, None);

        assert!(em.emit_particle());
        let part = em.particles().next().unwrap();

        let p = part.sprite.position;
        assert!((100.0..=110.0).contains(&p.x) && p.x.fract() == 0.0);
        assert!((50.0..=54.0).contains(&p.y) && p.y.fract() == 0.0);
        assert_eq!(part.body.position(), p);
        assert_eq!(part.body.delta(), Vec2::ZERO);

        let v = part.body.velocity;
        assert!((-10.0..=10.0).contains(&v.x));
        assert!((5.0..=20.0).contains(&v.y));
        assert!((0.5..2.0).contains(&part.body.scale.x));
        assert_eq!(part.sprite.scale, part.body.scale);
        assert_eq!(part.body.gravity, Vec2::new(0.0, 5.0));
        assert_eq!(part.body.drag, Vec2::new(1.0, 2.0));
        assert_eq!(part.body.angular_drag, 0.5);
        assert_eq!(part.body.bounce, Vec2::new(0.3, 0.3));
        assert!(part.lifespan.is_infinite());
    }

    #[test]
    fn test_timer_emits_rate_per_cycle() {
        let mut em = emitter(EmitterSettings::default());
        em.start(None, Some(100.0), Some(3), None);

        em.update(0.05).unwrap();
        assert_eq!(em.live_count(), 0);

        em.update(0.06).unwrap();
        assert_eq!(em.live_count(), 3);

        em.stop();
        em.update(1.0).unwrap();
        assert_eq!(em.live_count(), 3);
    }

    #[test]
    fn test_zero_start_arguments_use_defaults() {
        let mut em = emitter(EmitterSettings::default());
        em.start(Some(0.0), Some(0.0), Some(0), Some(0));

        assert!(em.settings.lifespan.is_infinite());
        assert_eq!(em.settings.delay, 250.0);
        assert_eq!(em.rate, 1);
        assert_eq!(em.total, ArcadeConfig::default().max_emitter_particles);

        em.update(0.2).unwrap();
        assert_eq!(em.live_count(), 0);
        em.update(0.06).unwrap();
        assert_eq!(em.live_count(), 1);
        assert!(em.particles().all(|p| p.lifespan.is_infinite()));
    }

    #[test]
    fn test_total_budget_and_pool_cap() {
        let mut em = emitter(EmitterSettings::default()).with_max_particles(4);
        em.start(None, None, None, Some(6));

        let ok = (0..10).filter(|_| em.emit_particle()).count();
        assert_eq!(ok, 4);
        assert_eq!(em.pool_size(), 4);

        let mut em = emitter(EmitterSettings::default());
        em.start(None, None, None, Some(2));
        assert!(em.emit_particle());
        assert!(em.emit_particle());
        assert!(!em.emit_particle());
    }

    #[test]
    fn test_expired_particles_return_to_pool() {
        let mut em = emitter(EmitterSettings::default()).with_max_particles(2);
        em.start(Some(100.0), None, None, None);
        assert!(em.emit_particle());
        assert!(em.emit_particle());
        assert!(!em.emit_particle());

        em.update(0.15).unwrap();
        assert_eq!(em.live_count(), 0);
        assert!(em.particles.iter().all(|p| !p.sprite.visible));

        assert!(em.emit_particle());
        assert_eq!(em.pool_size(), 2);
    }

    #[test]
    fn test_live_particles_move() {
        let settings = EmitterSettings::default()
            .with_speed(Vec2::new(10.0, 0.0), Vec2::new(10.0, 0.0))
            .with_gravity(Vec2::ZERO);
        let mut em = emitter(settings);
        em.start(None, None, None, None);
        em.emit_particle();

        em.update(0.5).unwrap();
        let part = em.particles().next().unwrap();
        assert_eq!(part.sprite.position.x, 5.0);
        assert!(em.update(-1.0).is_err());
    }
}
