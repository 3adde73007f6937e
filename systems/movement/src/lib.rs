#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Collision-free destination planning for one move phase.
//!
//! Agents decide strictly one after another, front line first. Every decision
//! claims a cell in a [`ReservationTable`] that later agents in the same pass
//! must respect, so no two agents ever finish a pass on the same cell.

use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};

use koma_rush_core::{
    AgentId, AgentSnapshot, AgentView, Command, GridCell, GridMapper, PixelPoint,
};
use tracing::trace;

/// Cells claimed during a single resolution pass.
///
/// The table is empty before and after every pass.
#[derive(Clone, Debug, Default)]
pub struct ReservationTable {
    claimed: HashSet<GridCell>,
}

impl ReservationTable {
    /// Creates an empty reservation table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the cell; returns `false` when it was already claimed.
    pub fn reserve(&mut self, cell: GridCell) -> bool {
        self.claimed.insert(cell)
    }

    /// Reports whether the cell has been claimed in this pass.
    #[must_use]
    pub fn is_reserved(&self, cell: GridCell) -> bool {
        self.claimed.contains(&cell)
    }

    /// Number of claimed cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    /// Reports whether nothing has been claimed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }

    /// Releases every claim.
    pub fn clear(&mut self) {
        self.claimed.clear();
    }
}

/// Planner that assigns one destination cell per active agent per move phase.
#[derive(Debug, Default)]
pub struct MovementResolver {
    reservations: ReservationTable,
    undecided: HashMap<GridCell, u32>,
    decisions: Vec<Decision>,
}

impl MovementResolver {
    /// Creates a resolver with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a full move phase and emits one [`Command::MoveAgent`] per agent
    /// that leaves its cell.
    ///
    /// `target` is the pursuit point; `None` selects the mapper's fallback
    /// target. Agents that hold produce no command. Returns the number of
    /// agents that moved.
    pub fn resolve(
        &mut self,
        agents: &AgentView,
        target: Option<PixelPoint>,
        mapper: &GridMapper,
        out: &mut Vec<Command>,
    ) -> usize {
        let target = target.unwrap_or_else(|| mapper.fallback_target());
        self.begin_pass();

        let mut ordered: Vec<&AgentSnapshot> = agents.active().collect();
        ordered.sort_by(|a, b| b.cell.row().cmp(&a.cell.row()).then(a.id.cmp(&b.id)));

        for agent in &ordered {
            *self.undecided.entry(agent.cell).or_insert(0) += 1;
        }

        for agent in &ordered {
            self.release_own_cell(agent.cell);
            let destination = self.choose(agent, target, mapper).unwrap_or(agent.cell);
            let _ = self.reservations.reserve(destination);
            if destination != agent.cell {
                self.decisions.push(Decision {
                    agent: agent.id,
                    to: destination,
                    duration: travel_time(agent, mapper.grid_to_pixel(destination)),
                });
            }
        }

        let moved = self.decisions.len();
        trace!(
            agents = ordered.len(),
            moved,
            reserved = self.reservations.len(),
            "move phase resolved"
        );
        out.extend(self.decisions.drain(..).map(|decision| Command::MoveAgent {
            agent: decision.agent,
            to: decision.to,
            duration: decision.duration,
        }));
        self.begin_pass();
        moved
    }

    fn begin_pass(&mut self) {
        self.reservations.clear();
        self.undecided.clear();
        self.decisions.clear();
    }

    fn release_own_cell(&mut self, cell: GridCell) {
        if let Some(count) = self.undecided.get_mut(&cell) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                let _ = self.undecided.remove(&cell);
            }
        }
    }

    fn is_available(&self, cell: GridCell, mapper: &GridMapper) -> bool {
        mapper.contains_column(cell.column())
            && !self.reservations.is_reserved(cell)
            && !self.undecided.contains_key(&cell)
    }

    /// Picks the destination for one agent, or `None` when it must hold.
    fn choose(
        &self,
        agent: &AgentSnapshot,
        target: PixelPoint,
        mapper: &GridMapper,
    ) -> Option<GridCell> {
        if agent.cell.row() < agent.destination_row {
            let next = agent.cell.below();
            return self.is_available(next, mapper).then_some(next);
        }

        let mut best: Option<Candidate> = None;
        for offset in agent.profile.candidate_offsets() {
            let cell = agent.cell.offset(offset);
            if !self.is_available(cell, mapper) {
                continue;
            }
            let candidate = Candidate {
                cell,
                distance_squared: mapper.grid_to_pixel(cell).distance_squared(target),
            };
            best = Some(match best {
                Some(existing) if !candidate.is_better_than(existing) => existing,
                _ => candidate,
            });
        }
        best.map(|candidate| candidate.cell)
    }
}

#[derive(Clone, Copy, Debug)]
struct Decision {
    agent: AgentId,
    to: GridCell,
    duration: Duration,
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    cell: GridCell,
    distance_squared: f32,
}

impl Candidate {
    /// Strictly closer wins; earlier candidates keep ties.
    fn is_better_than(self, other: Candidate) -> bool {
        self.distance_squared < other.distance_squared
    }
}

fn travel_time(agent: &AgentSnapshot, destination: PixelPoint) -> Duration {
    let speed = agent.speed * agent.profile.speed_rate();
    if speed <= 0.0 || !speed.is_finite() {
        return Duration::ZERO;
    }
    let seconds = agent.position.distance(destination) / speed;
    Duration::try_from_secs_f32(seconds).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use koma_rush_core::{AgentColor, AiProfile, CellOffset, EnemyKindId, Health, Lifecycle};

    fn agent(index: u32, cell: GridCell, destination_row: i32, profile: AiProfile) -> AgentSnapshot {
        let mapper = GridMapper::default();
        AgentSnapshot {
            id: AgentId::new(index, 0),
            kind: EnemyKindId::new("FU"),
            cell,
            position: mapper.grid_to_pixel(cell),
            destination_row,
            health: Health::new(1),
            speed: 40.0,
            score: 100,
            profile,
            color: AgentColor::default(),
            lifecycle: Lifecycle::Alive,
        }
    }

    fn destinations(commands: &[Command]) -> Vec<(AgentId, GridCell)> {
        commands
            .iter()
            .filter_map(|command| match command {
                Command::MoveAgent { agent, to, .. } => Some((*agent, *to)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn front_line_claims_first() {
        let mapper = GridMapper::default();
        let down = AiProfile::straight_down();
        let view = AgentView::from_snapshots(vec![
            agent(0, GridCell::new(4, 3), 0, down.clone()),
            agent(1, GridCell::new(4, 4), 0, down),
        ]);
        let mut resolver = MovementResolver::new();
        let mut out = Vec::new();

        let moved = resolver.resolve(&view, None, &mapper, &mut out);

        assert_eq!(moved, 2);
        assert_eq!(
            destinations(&out),
            vec![
                (AgentId::new(1, 0), GridCell::new(4, 5)),
                (AgentId::new(0, 0), GridCell::new(4, 4)),
            ]
        );
        assert!(resolver.reservations.is_empty());
    }

    #[test]
    fn entry_lane_holds_instead_of_sidestepping() {
        let mapper = GridMapper::default();
        let sidestep = AiProfile::GridMove {
            move_pattern: vec![CellOffset::new(1, 0), CellOffset::new(0, 1)],
        };
        let view = AgentView::from_snapshots(vec![
            agent(0, GridCell::new(2, -5), 2, sidestep),
            agent(
                1,
                GridCell::new(2, -4),
                2,
                AiProfile::GridMove {
                    move_pattern: vec![CellOffset::new(-1, 0)],
                },
            ),
        ]);
        let mut resolver = MovementResolver::new();
        let mut out = Vec::new();

        let _ = resolver.resolve(&view, None, &mapper, &mut out);

        assert_eq!(
            destinations(&out),
            vec![
                (AgentId::new(1, 0), GridCell::new(2, -3)),
                (AgentId::new(0, 0), GridCell::new(2, -4)),
            ]
        );
    }

    #[test]
    fn blocked_entry_lane_holds() {
        let mapper = GridMapper::default();
        let still = AiProfile::GridMove {
            move_pattern: vec![CellOffset::new(-1, 0)],
        };
        let view = AgentView::from_snapshots(vec![
            agent(0, GridCell::new(0, 2), 2, still),
            agent(1, GridCell::new(0, 1), 4, AiProfile::straight_down()),
        ]);
        let mut resolver = MovementResolver::new();
        let mut out = Vec::new();

        let moved = resolver.resolve(&view, None, &mapper, &mut out);

        assert_eq!(moved, 0, "front agent holds, so the entrant must too");
        assert!(out.is_empty());
    }

    #[test]
    fn out_of_bounds_candidates_leave_agent_in_place() {
        let mapper = GridMapper::default();
        let view = AgentView::from_snapshots(vec![agent(
            0,
            GridCell::new(8, 6),
            0,
            AiProfile::GridMove {
                move_pattern: vec![CellOffset::new(1, 0), CellOffset::new(1, 1)],
            },
        )]);
        let mut resolver = MovementResolver::new();
        let mut out = Vec::new();

        assert_eq!(resolver.resolve(&view, None, &mapper, &mut out), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn nearest_candidate_to_target_wins_with_first_on_ties() {
        let mapper = GridMapper::default();
        let fan = AiProfile::GridMove {
            move_pattern: vec![
                CellOffset::new(-1, 1),
                CellOffset::new(1, 1),
                CellOffset::new(0, 1),
            ],
        };
        let view = AgentView::from_snapshots(vec![agent(0, GridCell::new(4, 2), 0, fan)]);
        let mut resolver = MovementResolver::new();

        let mut out = Vec::new();
        let target = mapper.grid_to_pixel(GridCell::new(8, 10));
        let _ = resolver.resolve(&view, Some(target), &mapper, &mut out);
        assert_eq!(destinations(&out), vec![(AgentId::new(0, 0), GridCell::new(5, 3))]);

        let far_above = PixelPoint::new(mapper.grid_to_pixel(GridCell::new(4, 0)).x, -10_000.0);
        let mut out = Vec::new();
        let _ = resolver.resolve(&view, Some(far_above), &mapper, &mut out);
        assert_eq!(
            destinations(&out),
            vec![(AgentId::new(0, 0), GridCell::new(4, 3))],
            "straight down is closest to a point far above the column"
        );
    }

    #[test]
    fn equal_distance_keeps_list_order() {
        let mapper = GridMapper::default();
        let fan = AiProfile::GridMove {
            move_pattern: vec![CellOffset::new(1, 0), CellOffset::new(-1, 0)],
        };
        let view = AgentView::from_snapshots(vec![agent(0, GridCell::new(4, 2), 0, fan)]);
        let mut resolver = MovementResolver::new();
        let mut out = Vec::new();

        let target = mapper.grid_to_pixel(GridCell::new(4, 9));
        let _ = resolver.resolve(&view, Some(target), &mapper, &mut out);

        assert_eq!(destinations(&out), vec![(AgentId::new(0, 0), GridCell::new(5, 2))]);
    }

    #[test]
    fn strategic_agents_travel_faster() {
        let mapper = GridMapper::default();
        let view = AgentView::from_snapshots(vec![
            agent(0, GridCell::new(0, 2), 0, AiProfile::straight_down()),
            agent(
                1,
                GridCell::new(5, 2),
                0,
                AiProfile::StrategicMove {
                    movable_angles: vec![90.0],
                    speed_rate: 2.0,
                },
            ),
        ]);
        let mut resolver = MovementResolver::new();
        let mut out = Vec::new();
        let _ = resolver.resolve(&view, None, &mapper, &mut out);

        let durations: Vec<_> = out
            .iter()
            .filter_map(|command| match command {
                Command::MoveAgent { duration, .. } => Some(*duration),
                _ => None,
            })
            .collect();
        assert_eq!(durations, vec![Duration::from_secs(1), Duration::from_millis(500)]);
    }

    #[test]
    fn stationary_speed_moves_instantly() {
        let mapper = GridMapper::default();
        let mut snapshot = agent(0, GridCell::new(0, 2), 0, AiProfile::straight_down());
        snapshot.speed = 0.0;
        let view = AgentView::from_snapshots(vec![snapshot]);
        let mut resolver = MovementResolver::new();
        let mut out = Vec::new();
        let _ = resolver.resolve(&view, None, &mapper, &mut out);

        assert_eq!(
            out,
            vec![Command::MoveAgent {
                agent: AgentId::new(0, 0),
                to: GridCell::new(0, 3),
                duration: Duration::ZERO,
            }]
        );
    }

    #[test]
    fn inactive_agents_do_not_block_cells() {
        let mapper = GridMapper::default();
        let mut dying = agent(0, GridCell::new(3, 5), 0, AiProfile::straight_down());
        dying.lifecycle = Lifecycle::Dying {
            remaining: Duration::from_millis(50),
        };
        let view = AgentView::from_snapshots(vec![
            dying,
            agent(1, GridCell::new(3, 4), 0, AiProfile::straight_down()),
        ]);
        let mut resolver = MovementResolver::new();
        let mut out = Vec::new();
        let _ = resolver.resolve(&view, None, &mapper, &mut out);

        assert_eq!(destinations(&out), vec![(AgentId::new(1, 0), GridCell::new(3, 5))]);
    }

    #[test]
    fn reservation_table_reports_duplicate_claims() {
        let mut table = ReservationTable::new();
        assert!(table.reserve(GridCell::new(1, 1)));
        assert!(!table.reserve(GridCell::new(1, 1)));
        assert_eq!(table.len(), 1);
        table.clear();
        assert!(table.is_empty());
    }
}
