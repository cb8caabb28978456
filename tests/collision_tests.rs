use std::collections::HashSet;

use cgmath::{Point2, Point3, Vector3};
use voxel_world::session::{
    config::PhysicsConfig,
    physics::{
        aabb::{Aabb, OVERLAP_TOLERANCE},
        entity::Entity,
        ray_cast::ray_cast,
        CollisionOutcome, CollisionResolver, SolidQuery,
    },
    voxels::{
        block::{block_type::BlockType, Block},
        chunk::ChunkData,
        dimension::Dimension,
    },
};

fn overlaps_solid(entity: &Entity, world: &impl SolidQuery) -> bool {
    let aabb = entity.aabb();
    aabb.voxels().any(|voxel| {
        world.is_solid(voxel) && aabb.overlaps_with_tolerance(&Aabb::unit(voxel), OVERLAP_TOLERANCE)
    })
}

#[test]
fn falling_entity_lands_on_single_block() {
    let mut dimension = Dimension::new();
    dimension.insert_generated(Point2::new(0, 0), ChunkData::new());
    assert!(dimension.set_block(Point3::new(0, 0, 0), Block::new(BlockType::STONE)));

    let mut entity = Entity::new(Point3::new(0.0, 0.0, 10.0), Vector3::new(0.9, 0.9, 1.9));
    entity.velocity = Vector3::new(0.0, 0.0, -5.0);

    let resolver = CollisionResolver::new(PhysicsConfig::default());
    resolver.step(&mut entity, &dimension, 1.0);

    assert!(entity.grounded);
    assert!(entity.collided);
    assert_eq!(entity.velocity.z, 0.0);
    assert!(entity.position().z >= 1.0 - OVERLAP_TOLERANCE);
    assert!(!overlaps_solid(&entity, &dimension));
}

#[test]
fn unloaded_terrain_does_not_block() {
    let dimension = Dimension::new();
    let mut entity = Entity::new(Point3::new(0.0, 0.0, 1.0), Vector3::new(0.9, 0.9, 1.9));
    let resolver = CollisionResolver::new(PhysicsConfig::default());
    assert_eq!(resolver.step(&mut entity, &dimension, 0.1), CollisionOutcome::Free);
    assert!(entity.position().z < 1.0);
}

#[test]
fn entities_never_end_inside_solid_voxels() {
    let mut rng = fastrand::Rng::with_seed(42);
    let mut world = HashSet::new();
    for y in -6..6 {
        for x in -6..6 {
            world.insert(Point3::new(x, y, 0));
        }
    }
    for _ in 0..40 {
        world.insert(Point3::new(rng.i32(-6..6), rng.i32(-6..6), rng.i32(1..5)));
    }

    let resolver = CollisionResolver::new(PhysicsConfig::default());
    for _ in 0..50 {
        let mut entity = Entity::new(
            Point3::new(rng.f32() * 6.0 - 3.0, rng.f32() * 6.0 - 3.0, 6.0),
            Vector3::new(0.9, 0.9, 1.9),
        );
        entity.velocity = Vector3::new(
            rng.f32() * 20.0 - 10.0,
            rng.f32() * 20.0 - 10.0,
            -rng.f32() * 30.0,
        );
        assert!(!overlaps_solid(&entity, &world));

        for _ in 0..30 {
            resolver.step(&mut entity, &world, 0.05);
            assert!(
                !overlaps_solid(&entity, &world),
                "entity at {:?} overlaps a solid voxel",
                entity.position()
            );
        }
    }
}

#[test]
fn symmetric_overlap_pushes_along_positive_x() {
    let world: HashSet<_> = [Point3::new(0, 0, 0)].into_iter().collect();
    let mut entity = Entity::new(Point3::new(0.5, 0.5, 0.5), Vector3::new(1.0, 1.0, 1.0));
    let resolver = CollisionResolver::new(PhysicsConfig {
        gravity: 0.0,
        ..PhysicsConfig::default()
    });

    let outcome = resolver.step(&mut entity, &world, 0.016);

    assert_eq!(outcome, CollisionOutcome::Corrected { passes: 1 });
    assert_eq!(entity.position(), Point3::new(1.0, 0.5, 0.5));
    assert!(!overlaps_solid(&entity, &world));
}

#[test]
fn buried_entity_rolls_back() {
    let mut world = HashSet::new();
    for z in -4..=4 {
        for y in -4..=4 {
            for x in -4..=4 {
                world.insert(Point3::new(x, y, z));
            }
        }
    }
    let start = Point3::new(0.0, 0.0, 0.0);
    let mut entity = Entity::new(start, Vector3::new(0.9, 0.9, 1.9));
    entity.velocity = Vector3::new(0.0, 1.0, 0.0);

    let resolver = CollisionResolver::new(PhysicsConfig::default());
    assert_eq!(resolver.step(&mut entity, &world, 0.1), CollisionOutcome::RolledBack);
    assert_eq!(entity.position(), start);
    assert_eq!(entity.velocity, Vector3::new(0.0, 1.0, 0.0));
}

#[test]
fn ray_cast_reports_face_in_front_of_hit() {
    let world: HashSet<_> = [Point3::new(5, 0, 0)].into_iter().collect();
    let hit = ray_cast(
        Point3::new(0.5, 0.5, 0.5),
        Vector3::new(1.0, 0.0, 0.0),
        8.0,
        |voxel| world.is_solid(voxel),
    )
    .unwrap();
    assert_eq!(hit.position, Point3::new(5, 0, 0));
    assert_eq!(hit.previous, Point3::new(4, 0, 0));

    let miss = ray_cast(
        Point3::new(0.5, 0.5, 0.5),
        Vector3::new(-1.0, 0.0, 0.0),
        8.0,
        |voxel| world.is_solid(voxel),
    );
    assert_eq!(miss, None);
}
