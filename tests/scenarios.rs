use std::rc::Rc;

use bracket_geometry::prelude::Point;
use bracket_random::prelude::RandomNumberGenerator;
use dunesense::map::carve_path;
use dunesense::robot::Reading::{NoWall, WallDetected};
use dunesense::{
    Direction, GameConfig, GameSession, OrientationMapper, Robot, RobotState, SensorFrame,
    WallMap, WallMapGenerator,
};

#[test]
fn open_seven_by_seven_walk_into_the_border() {
    let mut rng = RandomNumberGenerator::seeded(7);
    let map = Rc::new(WallMapGenerator::new(7, 7, 0).generate(&mut rng).unwrap());
    assert!(map.border_is_sealed());
    assert_eq!(map.interior_open_count(), 25);

    let mut robot = Robot::new(Rc::clone(&map), 3, 3, &mut rng).unwrap();
    assert_eq!(robot.sense(), SensorFrame::new([NoWall; 4]));

    assert_eq!(robot.command(-1, 0).unwrap(), RobotState::Active);
    assert_eq!(robot.position(), (2, 3));
    assert_eq!(robot.command(-1, 0).unwrap(), RobotState::Active);
    assert_eq!(robot.position(), (1, 3));
    assert_eq!(robot.sense()[Direction::Up], WallDetected);

    assert_eq!(robot.command(-1, 0).unwrap(), RobotState::Crashed);
    assert_eq!(robot.position(), (1, 3));
    assert!(robot.command(1, 0).is_err());
}

#[test]
fn orientation_zero_is_identity_and_one_is_reproducible() {
    let frame = SensorFrame::new([NoWall, WallDetected, NoWall, WallDetected]);
    let mut mapper = OrientationMapper::new(0).unwrap();
    assert_eq!(mapper.apply(&frame), frame);

    assert_eq!(mapper.rotate(1).unwrap(), 1);
    let first = mapper.apply(&frame);
    assert_eq!(first.readings[mapper.display_slot(Direction::Up)], NoWall);
    assert_eq!(first.readings[mapper.display_slot(Direction::Down)], WallDetected);
    for _ in 0..5 {
        assert_eq!(mapper.apply(&frame), first);
    }
}

#[test]
fn rotations_compose_cyclically() {
    for orientation in 0..4 {
        for a in 1..4 {
            for b in 1..4 {
                let stepwise = OrientationMapper::rotated(
                    OrientationMapper::rotated(orientation, a).unwrap(),
                    b,
                )
                .unwrap();
                assert_eq!(stepwise, (orientation + a + b) % 4);
            }
        }
        let mut mapper = OrientationMapper::new(orientation).unwrap();
        for _ in 0..4 {
            mapper.rotate(1).unwrap();
        }
        assert_eq!(mapper.orientation(), orientation);
    }
}

#[test]
fn every_orientation_preserves_the_readings() {
    let frame = SensorFrame::new([WallDetected, NoWall, NoWall, WallDetected]);
    for orientation in 0..4 {
        let shown = OrientationMapper::apply_with(orientation, &frame).unwrap();
        assert_eq!(shown.walls(), frame.walls());
    }
    assert!(OrientationMapper::apply_with(4, &frame).is_err());
}

#[test]
fn generated_maps_are_sealed_and_reproducible() {
    for (seed, percent) in [(1, 3), (2, 10), (3, 40), (4, 99)] {
        let generator = WallMapGenerator::new(25, 49, percent);
        let a = generator
            .generate(&mut RandomNumberGenerator::seeded(seed))
            .unwrap();
        let b = generator
            .generate(&mut RandomNumberGenerator::seeded(seed))
            .unwrap();
        assert_eq!(a, b);
        assert_eq!((a.rows(), a.cols()), (25, 49));
        assert!(a.border_is_sealed());
        assert!(a.interior_open_count() > 0, "seed {seed} at {percent}%");
    }
}

#[test]
fn ascii_rows_round_trip_through_the_parser() {
    let map = WallMapGenerator::new(11, 17, 20)
        .generate(&mut RandomNumberGenerator::seeded(99))
        .unwrap();
    let rows = map.to_rows();
    assert_eq!(WallMap::from_rows(&rows).unwrap(), map);
}

#[test]
fn carving_stays_inside_the_endpoint_box() {
    let mut rng = RandomNumberGenerator::seeded(11);
    for _ in 0..200 {
        let start = Point::new(rng.range(1, 48), rng.range(1, 24));
        let end = Point::new(rng.range(1, 48), rng.range(1, 24));
        let path = carve_path(start, end, &mut rng);
        let dx = (end.x - start.x).abs();
        let dy = (end.y - start.y).abs();
        assert!(path.len() as i32 <= dx + dy);
        assert!(path.len() as i32 >= dx.max(dy));
        if start != end {
            assert_eq!(path.last(), Some(&end));
        }
        for point in &path {
            assert!(point.x >= start.x.min(end.x) && point.x <= start.x.max(end.x));
            assert!(point.y >= start.y.min(end.y) && point.y <= start.y.max(end.y));
        }
    }
}

#[test]
fn session_reveals_nothing_until_it_ends() {
    let config = GameConfig::default().with_seed(Some(2024));
    let mut session = GameSession::new(config).unwrap();
    assert_eq!(session.revealed_start(), None);
    assert_eq!(session.display_map().rows(), 25);
    assert_eq!(session.display_map().cols(), 49);
    assert!(session.display_map().border_is_sealed());

    while !session.is_over() {
        let cursor = session.cursor();
        session.guess_start(cursor.y, cursor.x).unwrap();
    }
    assert!(session.revealed_start().is_some());
}
