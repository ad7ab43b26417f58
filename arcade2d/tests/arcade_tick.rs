use approx::assert_relative_eq;

use arcade2d::{
    ArcadeConfig, BodyPool, BodyType, Clock, Direction, KinematicBody, NoCollisions, Sprite,
    Vec2, Visual, World,
};

/// Minimal visual that is not a sprite, centre-anchored.
struct Marker {
    pos: Vec2,
    angle: f32,
}

impl Visual for Marker {
    fn position(&self) -> Vec2 {
        self.pos
    }
    fn set_position(&mut self, position: Vec2) {
        self.pos = position;
    }
    fn size(&self) -> Vec2 {
        Vec2::new(8.0, 8.0)
    }
    fn angle(&self) -> f32 {
        self.angle
    }
    fn set_angle(&mut self, angle: f32) {
        self.angle = angle;
    }
    fn anchor(&self) -> Vec2 {
        Vec2::new(0.5, 0.5)
    }
}

#[test]
fn body_drives_any_visual() {
    let mut marker = Marker {
        pos: Vec2::new(10.0, 10.0),
        angle: 0.0,
    };
    let mut body = KinematicBody::new(&marker, &ArcadeConfig::default()).unwrap();
    assert_eq!(body.position(), Vec2::new(6.0, 6.0));

    body.velocity = Vec2::new(4.0, 0.0);
    body.step(0.5, &mut marker).unwrap();

    assert_eq!(marker.pos, Vec2::new(12.0, 10.0));
    assert_eq!(body.delta_x(), 2.0);
}

#[test]
fn falling_crate_lands_on_floor() {
    const FLOOR_Y: f32 = 100.0;

    let config = ArcadeConfig::default().with_default_gravity(Vec2::new(0.0, 400.0));
    let mut world = World::new(config);
    let crate_id = world.spawn(Sprite::new(Vec2::new(0.0, 0.0), Vec2::new(16.0, 16.0)));
    let wall_id = world.spawn(Sprite::new(Vec2::new(200.0, 0.0), Vec2::new(16.0, 160.0)));
    world.enable_body(crate_id).unwrap();
    world.enable_body(wall_id).unwrap();
    world.body_mut(wall_id).unwrap().body_type = BodyType::Static;

    let mut floor = |bodies: &mut BodyPool| {
        for (_, body) in bodies.iter_mut() {
            if body.body_type == BodyType::Static {
                continue;
            }
            let bottom = body.bounds().bottom();
            if bottom > FLOOR_Y && body.allows_collision(Direction::DOWN) {
                body.overlap.y = bottom - FLOOR_Y;
                body.y -= body.overlap.y;
                body.velocity.y = 0.0;
                body.touching |= Direction::DOWN;
            }
        }
    };

    let mut clock = Clock::new();
    clock.set_fixed_step(1.0 / 60.0);
    clock.accumulate(2.0);

    let mut landed_at = None;
    let mut tick = 0;
    while clock.consume_fixed_step() {
        world.step(clock.fixed_step(), &mut floor).unwrap();
        let body = world.body(crate_id).unwrap();
        if landed_at.is_none() && body.just_touched(Direction::DOWN) {
            landed_at = Some(tick);
        }
        tick += 1;
    }

    assert!(landed_at.is_some());
    let sprite = world.sprite(crate_id).unwrap();
    assert_relative_eq!(sprite.position.y, FLOOR_Y - 16.0, epsilon = 1e-3);
    assert!(world.body(crate_id).unwrap().is_touching(Direction::DOWN));
    // resting contact is not a new enter event
    assert!(!world.body(crate_id).unwrap().just_touched(Direction::DOWN));
    assert_eq!(world.sprite(wall_id).unwrap().position, Vec2::new(200.0, 0.0));
}

#[test]
fn scripted_moves_win_at_step_start() {
    let mut world = World::default();
    let e = world.spawn(Sprite::new(Vec2::ZERO, Vec2::new(4.0, 4.0)));
    world.enable_body(e).unwrap();
    world.body_mut(e).unwrap().velocity.x = 10.0;

    world.step(0.1, &mut NoCollisions).unwrap();
    assert_relative_eq!(world.sprite(e).unwrap().position.x, 1.0);

    world.sprite_mut(e).unwrap().set_position(50.0, 50.0);
    world.step(0.1, &mut NoCollisions).unwrap();

    let sprite = world.sprite(e).unwrap();
    assert_relative_eq!(sprite.position.x, 51.0);
    assert_eq!(sprite.position.y, 50.0);
    // displacement is measured from the pre-step body position
    let body = world.body(e).unwrap();
    assert_relative_eq!(body.last_position().x, 1.0);
}

#[test]
fn despawned_entity_releases_its_body() {
    let mut world = World::default();
    let e = world.spawn(Sprite::new(Vec2::ZERO, Vec2::new(4.0, 4.0)));
    let handle = world.enable_body(e).unwrap();

    assert!(world.despawn(e));
    assert!(world.bodies().get(handle).is_none());
    world.step(0.016, &mut NoCollisions).unwrap();
}
