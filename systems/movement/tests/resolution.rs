use std::{collections::HashSet, time::Duration};

use koma_rush_core::{
    AgentColor, AiProfile, CellOffset, Command, EnemyDefinition, EnemyKindId, Event, GridCell,
};
use koma_rush_system_movement::MovementResolver;
use koma_rush_world::{self as world, query, World};

fn enemy(id: &str, speed: f32, profile: AiProfile) -> EnemyDefinition {
    EnemyDefinition {
        id: EnemyKindId::new(id),
        hp: 1,
        score: 100,
        speed,
        color: AgentColor::default(),
        ai_profile: Some(profile),
        pattern_id: None,
    }
}

fn roster() -> Vec<EnemyDefinition> {
    vec![
        enemy("FU", 40.0, AiProfile::straight_down()),
        enemy(
            "KEI",
            60.0,
            AiProfile::GridMove {
                move_pattern: vec![CellOffset::new(-1, 2), CellOffset::new(1, 2)],
            },
        ),
        enemy(
            "GIN",
            40.0,
            AiProfile::GridMove {
                move_pattern: vec![
                    CellOffset::new(-1, 1),
                    CellOffset::new(0, 1),
                    CellOffset::new(1, 1),
                ],
            },
        ),
        enemy(
            "KAKU",
            50.0,
            AiProfile::StrategicMove {
                movable_angles: vec![45.0, 135.0, 90.0],
                speed_rate: 1.5,
            },
        ),
        enemy(
            "HI",
            50.0,
            AiProfile::StrategicMove {
                movable_angles: vec![0.0, 180.0, 90.0, 270.0],
                speed_rate: 1.0,
            },
        ),
    ]
}

fn started_world() -> World {
    let mut world = World::new(&Default::default());
    let mut events = Vec::new();
    world::apply(&mut world, Command::StartSession, &mut events);
    world
}

fn spawn(world: &mut World, enemy: EnemyDefinition, cell: GridCell, destination_row: i32) {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::SpawnAgent {
            enemy,
            cell,
            destination_row,
        },
        &mut events,
    );
}

/// Runs one move phase and returns every event the world produced.
fn run_turn(world: &mut World, resolver: &mut MovementResolver) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, Command::StartTurn, &mut events);

    let mut commands = Vec::new();
    let _ = resolver.resolve(
        &query::agent_view(world),
        query::player_target(world),
        &query::grid_mapper(world),
        &mut commands,
    );
    for command in commands {
        world::apply(world, command, &mut events);
    }

    for _ in 0..20 {
        world::apply(
            world,
            Command::Tick {
                dt: Duration::from_millis(100),
            },
            &mut events,
        );
    }
    world::apply(world, Command::StopTurn, &mut events);
    events
}

fn assert_unique_cells(world: &World) {
    let mut seen = HashSet::new();
    for agent in query::agent_view(world).active() {
        assert!(
            seen.insert(agent.cell),
            "two agents share cell {:?}",
            agent.cell
        );
    }
}

fn populate(world: &mut World) {
    let roster = roster();
    for index in 0..27_i32 {
        let enemy = roster[(index as usize) % roster.len()].clone();
        let target = GridCell::new(index % 9, 1 + index / 9);
        spawn(world, enemy, target.offset(CellOffset::new(0, -10)), target.row());
    }
}

#[test]
fn trailing_agent_never_lands_on_front_claim() {
    let mut world = started_world();
    spawn(
        &mut world,
        enemy("FU", 40.0, AiProfile::straight_down()),
        GridCell::new(4, 4),
        0,
    );
    spawn(
        &mut world,
        enemy(
            "KEI",
            40.0,
            AiProfile::GridMove {
                move_pattern: vec![CellOffset::new(0, 2), CellOffset::new(1, 1)],
            },
        ),
        GridCell::new(4, 3),
        0,
    );

    let mut resolver = MovementResolver::new();
    let events = run_turn(&mut world, &mut resolver);

    let moves: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            Event::AgentMoved { from, to, .. } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        moves,
        vec![
            (GridCell::new(4, 4), GridCell::new(4, 5)),
            (GridCell::new(4, 3), GridCell::new(5, 4)),
        ]
    );
    assert_unique_cells(&world);
}

#[test]
fn crowded_field_never_collides() {
    let mut world = started_world();
    populate(&mut world);
    assert_unique_cells(&world);

    let mut resolver = MovementResolver::new();
    for _ in 0..40 {
        let _ = run_turn(&mut world, &mut resolver);
        assert_unique_cells(&world);
    }
}

#[test]
fn entrants_walk_straight_down_their_lane() {
    let mut world = started_world();
    spawn(
        &mut world,
        enemy(
            "HI",
            50.0,
            AiProfile::StrategicMove {
                movable_angles: vec![0.0, 180.0],
                speed_rate: 1.0,
            },
        ),
        GridCell::new(6, -3),
        1,
    );

    let mut resolver = MovementResolver::new();
    let mut rows = Vec::new();
    for _ in 0..4 {
        let _ = run_turn(&mut world, &mut resolver);
        let agent = query::agent_view(&world)
            .iter()
            .next()
            .expect("agent stays on the field")
            .clone();
        assert_eq!(agent.cell.column(), 6);
        rows.push(agent.cell.row());
    }
    assert_eq!(rows, vec![-2, -1, 0, 1]);

    let _ = run_turn(&mut world, &mut resolver);
    let agent = query::agent_view(&world).into_vec().remove(0);
    assert_eq!(agent.cell.row(), 1, "free roaming only moves sideways");
    assert_ne!(agent.cell.column(), 6);
}

#[test]
fn absent_player_pulls_agents_toward_bottom_centre() {
    let mut world = started_world();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SetPlayerPosition { position: None },
        &mut events,
    );
    spawn(
        &mut world,
        enemy(
            "GIN",
            40.0,
            AiProfile::GridMove {
                move_pattern: vec![CellOffset::new(1, 1), CellOffset::new(-1, 1)],
            },
        ),
        GridCell::new(0, 2),
        0,
    );

    let mut resolver = MovementResolver::new();
    let _ = run_turn(&mut world, &mut resolver);

    let agent = query::agent_view(&world).into_vec().remove(0);
    assert_eq!(agent.cell, GridCell::new(1, 3));
}

#[test]
fn replays_are_deterministic() {
    fn record() -> Vec<Event> {
        let mut world = started_world();
        populate(&mut world);
        let mut resolver = MovementResolver::new();
        let mut log = Vec::new();
        for _ in 0..25 {
            log.extend(run_turn(&mut world, &mut resolver));
        }
        log
    }

    let first = record();
    assert!(first
        .iter()
        .any(|event| matches!(event, Event::AgentMoved { .. })));
    assert_eq!(first, record());
}
