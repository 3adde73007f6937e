//! Index-addressed agent arena and per-agent animation state.

use std::time::Duration;

use koma_rush_core::{
    AgentColor, AgentId, AgentSnapshot, AiProfile, EnemyDefinition, EnemyKindId, GridCell,
    GridMapper, Health, Lifecycle, PixelPoint,
};

/// Time a killed agent lingers before it leaves the arena.
pub(crate) const DYING_DURATION: Duration = Duration::from_millis(100);

/// Authoritative state of a single agent.
#[derive(Clone, Debug)]
pub(crate) struct Agent {
    pub(crate) id: AgentId,
    pub(crate) kind: EnemyKindId,
    pub(crate) cell: GridCell,
    pub(crate) position: PixelPoint,
    pub(crate) destination_row: i32,
    pub(crate) health: Health,
    pub(crate) speed: f32,
    pub(crate) score: u32,
    pub(crate) profile: AiProfile,
    pub(crate) color: AgentColor,
    pub(crate) lifecycle: Lifecycle,
    motion: Option<Motion>,
}

impl Agent {
    fn spawn(
        id: AgentId,
        enemy: &EnemyDefinition,
        cell: GridCell,
        destination_row: i32,
        mapper: &GridMapper,
    ) -> Self {
        Self {
            id,
            kind: enemy.id.clone(),
            cell,
            position: mapper.grid_to_pixel(cell),
            destination_row,
            health: Health::new(enemy.hp),
            speed: enemy.speed,
            score: enemy.score,
            profile: enemy.profile(),
            color: enemy.color,
            lifecycle: Lifecycle::Alive,
            motion: None,
        }
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.lifecycle == Lifecycle::Alive
    }

    /// Commits the agent to `to` and starts animating its visible position.
    pub(crate) fn begin_motion(&mut self, to: GridCell, duration: Duration, mapper: &GridMapper) {
        let target = mapper.grid_to_pixel(to);
        self.cell = to;
        if duration.is_zero() {
            self.position = target;
            self.motion = None;
            return;
        }
        self.motion = Some(Motion {
            from: self.position,
            to: target,
            elapsed: Duration::ZERO,
            duration,
        });
    }

    /// Cancels residual motion, leaving the agent on its committed cell.
    pub(crate) fn finish_motion(&mut self) {
        if let Some(motion) = self.motion.take() {
            self.position = motion.to;
        }
    }

    pub(crate) fn in_motion(&self) -> bool {
        self.motion.is_some()
    }

    fn advance(&mut self, dt: Duration) {
        match self.lifecycle {
            Lifecycle::Alive => {
                let Some(motion) = self.motion.as_mut() else {
                    return;
                };
                motion.elapsed = motion.elapsed.saturating_add(dt);
                self.position = motion.sample();
                if motion.elapsed >= motion.duration {
                    self.motion = None;
                }
            }
            Lifecycle::Dying { remaining } => {
                let remaining = remaining.saturating_sub(dt);
                self.lifecycle = if remaining.is_zero() {
                    Lifecycle::Removed
                } else {
                    Lifecycle::Dying { remaining }
                };
            }
            Lifecycle::Removed => {}
        }
    }

    pub(crate) fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            kind: self.kind.clone(),
            cell: self.cell,
            position: self.position,
            destination_row: self.destination_row,
            health: self.health,
            speed: self.speed,
            score: self.score,
            profile: self.profile.clone(),
            color: self.color,
            lifecycle: self.lifecycle,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Motion {
    from: PixelPoint,
    to: PixelPoint,
    elapsed: Duration,
    duration: Duration,
}

impl Motion {
    fn sample(&self) -> PixelPoint {
        let progress = self.elapsed.as_secs_f32() / self.duration.as_secs_f32();
        self.from.lerp(self.to, progress)
    }
}

/// Agents removed from the arena during a sweep.
#[derive(Debug, Default)]
pub(crate) struct Sweep {
    pub(crate) expired: Vec<AgentId>,
    pub(crate) escaped: Vec<AgentId>,
}

#[derive(Clone, Debug, Default)]
struct Slot {
    generation: u32,
    agent: Option<Agent>,
}

/// Slot vector with generation counters and a free list.
#[derive(Clone, Debug, Default)]
pub(crate) struct AgentStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl AgentStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }

    /// Allocates a slot and spawns the agent into it.
    pub(crate) fn spawn(
        &mut self,
        enemy: &EnemyDefinition,
        cell: GridCell,
        destination_row: i32,
        mapper: &GridMapper,
    ) -> AgentId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot::default());
                u32::try_from(self.slots.len() - 1).unwrap_or(u32::MAX)
            }
        };
        let slot = &mut self.slots[index as usize];
        let id = AgentId::new(index, slot.generation);
        slot.agent = Some(Agent::spawn(id, enemy, cell, destination_row, mapper));
        id
    }

    pub(crate) fn get(&self, id: AgentId) -> Option<&Agent> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.agent.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.agent.as_mut())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.slots.iter().filter_map(|slot| slot.agent.as_ref())
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.slots.iter_mut().filter_map(|slot| slot.agent.as_mut())
    }

    /// Living agent committed to the provided cell, if any.
    pub(crate) fn occupant(&self, cell: GridCell) -> Option<AgentId> {
        self.iter()
            .find(|agent| agent.is_alive() && agent.cell == cell)
            .map(|agent| agent.id)
    }

    /// Advances animations and exits, then frees every slot whose agent left.
    ///
    /// Agents whose visible position passes `escape_y` are removed as escaped.
    pub(crate) fn advance(&mut self, dt: Duration, escape_y: f32) -> Sweep {
        let mut sweep = Sweep::default();
        for agent in self.iter_mut() {
            agent.advance(dt);
            if agent.is_alive() && agent.position.y > escape_y {
                agent.lifecycle = Lifecycle::Removed;
                sweep.escaped.push(agent.id);
            } else if agent.lifecycle == Lifecycle::Removed {
                sweep.expired.push(agent.id);
            }
        }

        for id in sweep.expired.iter().chain(sweep.escaped.iter()) {
            self.release(*id);
        }
        sweep
    }

    fn release(&mut self, id: AgentId) {
        let Some(slot) = self.slots.get_mut(id.index() as usize) else {
            return;
        };
        if slot.generation != id.generation() {
            return;
        }
        slot.agent = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pawn() -> EnemyDefinition {
        EnemyDefinition {
            id: EnemyKindId::new("FU"),
            hp: 1,
            score: 100,
            speed: 40.0,
            color: AgentColor::default(),
            ai_profile: None,
            pattern_id: None,
        }
    }

    #[test]
    fn released_slots_are_reused_with_new_generation() {
        let mapper = GridMapper::default();
        let mut store = AgentStore::new();
        let first = store.spawn(&pawn(), GridCell::new(0, 0), 0, &mapper);

        if let Some(agent) = store.get_mut(first) {
            agent.lifecycle = Lifecycle::Dying {
                remaining: DYING_DURATION,
            };
        }
        let sweep = store.advance(DYING_DURATION, f32::MAX);
        assert_eq!(sweep.expired, vec![first]);
        assert!(store.get(first).is_none());

        let second = store.spawn(&pawn(), GridCell::new(1, 0), 0, &mapper);
        assert_eq!(second.index(), first.index());
        assert_ne!(second.generation(), first.generation());
        assert!(store.get(first).is_none(), "stale id must not resolve");
        assert!(store.get(second).is_some());
    }

    #[test]
    fn motion_interpolates_then_settles() {
        let mapper = GridMapper::default();
        let mut store = AgentStore::new();
        let id = store.spawn(&pawn(), GridCell::new(0, 0), 0, &mapper);
        if let Some(agent) = store.get_mut(id) {
            agent.begin_motion(GridCell::new(0, 1), Duration::from_millis(1_000), &mapper);
        }

        let _ = store.advance(Duration::from_millis(500), f32::MAX);
        let agent = store.get(id).expect("agent present");
        assert_eq!(agent.cell, GridCell::new(0, 1));
        assert!((agent.position.y - 120.0).abs() < 1e-3);
        assert!(agent.in_motion());

        let _ = store.advance(Duration::from_millis(500), f32::MAX);
        let agent = store.get(id).expect("agent present");
        assert_eq!(agent.position, mapper.grid_to_pixel(GridCell::new(0, 1)));
        assert!(!agent.in_motion());
    }

    #[test]
    fn agents_past_escape_line_are_removed() {
        let mapper = GridMapper::default();
        let mut store = AgentStore::new();
        let id = store.spawn(&pawn(), GridCell::new(3, 20), 0, &mapper);
        let sweep = store.advance(Duration::from_millis(16), 690.0);
        assert_eq!(sweep.escaped, vec![id]);
        assert!(store.get(id).is_none());
    }
}
