//! Scripted sandbox for the trellis engine
//!
//! A tank drives toward a wall while its spinning turret fires projectiles.
//! Projectiles vanish when they hit the wall; the tank stops when its hull
//! touches it. Runs headless for a fixed number of frames and logs what
//! happens.
//!
//! Usage: `sandbox [config.toml|config.ron]`

use std::cell::Cell;
use std::process;
use std::rc::Rc;
use trellis_engine::foundation::logging;
use trellis_engine::prelude::*;
use trellis_engine::scene::MeshHandle;

const FRAMES: u32 = 720;
const FRAME_TIME: f32 = 1.0 / 60.0;
const FIRE_INTERVAL: u32 = 20;
const PROJECTILE_LIFETIME: u32 = 180;
const PROJECTILE_SPEED: f32 = 8.0;

const PLAYER_LAYER: usize = 0;
const PROJECTILE_LAYER: usize = 2;
const ENVIRONMENT_LAYER: usize = 3;

#[derive(thiserror::Error, Debug)]
enum SandboxError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("scene error: {0}")]
    Scene(#[from] SceneError),
}

/// Stops the tank's motion on the next frame
struct Hull {
    blocked: Rc<Cell<bool>>,
}

impl CollisionHandler for Hull {
    fn on_collision(&mut self, other: NodeId, _ctx: &mut CollisionContext<'_>) {
        if !self.blocked.replace(true) {
            log::info!("Hull touched {:?}, stopping", other);
        }
    }
}

/// Removes the projectile on its first hit
struct Projectile;

impl CollisionHandler for Projectile {
    fn on_sphere_box(&mut self, _other: NodeId, contact: &SphereBoxContact, ctx: &mut CollisionContext<'_>) {
        log::debug!(
            "Projectile {:?} hit at {:?} (depth {:.3})",
            ctx.node(),
            contact.closest_point,
            contact.distance
        );
        let node = ctx.node();
        ctx.destroy(node);
    }
}

/// Counts hits taken by the wall
struct Wall {
    hits: Rc<Cell<u32>>,
}

impl CollisionHandler for Wall {
    fn on_sphere_box(&mut self, _other: NodeId, _contact: &SphereBoxContact, _ctx: &mut CollisionContext<'_>) {
        self.hits.set(self.hits.get() + 1);
    }
}

struct SandboxApp {
    scene: Scene,
    tank: NodeId,
    barrel: NodeId,
    projectiles: Vec<(NodeId, u32)>,
    blocked: Rc<Cell<bool>>,
    wall_hits: Rc<Cell<u32>>,
}

impl SandboxApp {
    fn new(config: &EngineConfig) -> Result<Self, SandboxError> {
        let mut scene = Scene::from_config(config, CollisionDispatcher::with_builtin_shapes())?;
        let blocked = Rc::new(Cell::new(false));
        let wall_hits = Rc::new(Cell::new(0));

        let graph = scene.graph_mut();
        let tank = graph.create_root(Transform::identity());
        let turret = graph.create_child(tank, Transform::from_position(Vec3::new(0.0, 1.0, 0.0)))?;
        let barrel = graph.create_child(turret, Transform::from_position(Vec3::new(0.0, 0.0, 1.5)))?;
        let wall = graph.create_root(Transform::from_position(Vec3::new(0.0, 0.0, 12.0)));
        for (node, mesh) in [(tank, 1), (turret, 2), (barrel, 3), (wall, 4)] {
            if let Some(node) = graph.node_mut(node) {
                node.renderable = Some(Renderable {
                    mesh: MeshHandle(mesh),
                    material: None,
                });
            }
        }

        let unit = Vec3::new(1.0, 1.0, 1.0);
        scene.set_box_hit_area(tank, 2.0, 1.0, 3.0, Vec3::zeros(), unit, Quat::identity())?;
        scene.set_box_hit_area(wall, 10.0, 4.0, 1.0, Vec3::zeros(), unit, Quat::identity())?;
        scene.add_to_layer(tank, PLAYER_LAYER)?;
        scene.add_to_layer(wall, ENVIRONMENT_LAYER)?;

        scene.set_motion(tank, Motion::with_velocity(Vec3::new(0.0, 0.0, 1.0)))?;
        let spin = Motion {
            angular_velocity: Vec3::new(0.0, 0.6, 0.0),
            ..Motion::default()
        };
        scene.set_motion(turret, spin)?;

        scene.set_handler(
            tank,
            Box::new(Hull {
                blocked: Rc::clone(&blocked),
            }),
        )?;
        scene.set_handler(
            wall,
            Box::new(Wall {
                hits: Rc::clone(&wall_hits),
            }),
        )?;

        Ok(Self {
            scene,
            tank,
            barrel,
            projectiles: Vec::new(),
            blocked,
            wall_hits,
        })
    }

    fn fire(&mut self, frame: u32) -> Result<(), SandboxError> {
        let (position, forward) = {
            let barrel = &self.scene.graph()[self.barrel];
            (barrel.position(), barrel.forward())
        };

        let projectile = self.scene.graph_mut().create_root(Transform::from_position(position));
        self.scene.set_sphere_hit_area(projectile, 0.2, Vec3::zeros())?;
        self.scene.add_to_layer(projectile, PROJECTILE_LAYER)?;
        self.scene
            .set_motion(projectile, Motion::with_velocity(forward * PROJECTILE_SPEED))?;
        self.scene.set_handler(projectile, Box::new(Projectile))?;
        self.projectiles.push((projectile, frame));
        Ok(())
    }

    fn expire_projectiles(&mut self, frame: u32) -> Result<(), SandboxError> {
        let graph = self.scene.graph();
        self.projectiles.retain(|&(node, _)| graph.contains(node));

        let expired: Vec<NodeId> = self
            .projectiles
            .iter()
            .filter(|&&(_, fired)| frame - fired >= PROJECTILE_LIFETIME)
            .map(|&(node, _)| node)
            .collect();
        for node in expired {
            self.scene.destroy(node)?;
        }
        Ok(())
    }

    fn run(&mut self) -> Result<(), SandboxError> {
        let mut contacts = 0;
        for frame in 0..FRAMES {
            if frame % FIRE_INTERVAL == 0 {
                self.fire(frame)?;
            }
            self.expire_projectiles(frame)?;

            let stats = self.scene.update(FRAME_TIME);
            contacts += stats.contacts;

            if self.blocked.get() {
                if let Some(motion) = self.scene.motion_mut(self.tank) {
                    motion.velocity = Vec3::zeros();
                }
            }
            if frame % 60 == 0 {
                log::info!(
                    "t={:.1}s tank z={:.2} live projectiles={} draw calls={}",
                    self.scene.clock().total_time(),
                    self.scene.graph()[self.tank].position().z,
                    self.projectiles.len(),
                    self.scene.draw_list().count()
                );
            }
        }

        log::info!(
            "Done: {} contacts, {} wall hits, {} nodes left",
            contacts,
            self.wall_hits.get(),
            self.scene.graph().len()
        );
        Ok(())
    }
}

fn load_config() -> Result<EngineConfig, ConfigError> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load_from_file(path)?,
        None => EngineConfig::new()
            .with_layer_rule(LayerRule::new(PLAYER_LAYER, [ENVIRONMENT_LAYER]))
            .with_layer_rule(LayerRule::new(PROJECTILE_LAYER, [ENVIRONMENT_LAYER])),
    };
    config.validate()?;
    Ok(config)
}

fn main() {
    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("sandbox: {err}");
            process::exit(1);
        }
    };
    logging::init(&config.log_level);

    log::info!("Starting trellis sandbox");

    let result = SandboxApp::new(&config).and_then(|mut app| app.run());
    if let Err(err) = result {
        log::error!("Sandbox failed: {}", err);
        process::exit(1);
    }
}
