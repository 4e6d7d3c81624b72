//! Room state and the room registry.
//!
//! A room is the authoritative holder of one pyramid shape and one highlight
//! set, guarded by a single mutex so every rule decision reads a consistent
//! view and every mutation is linearized against concurrent togglers. The
//! connected-client registry lives under its own lock; broadcast iterates a
//! snapshot of it and prunes clients whose channel has gone away.
//!
//! Locks are held only for the read-decide-write step. All I/O — including
//! queueing outbound frames — happens after the guard is released.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use cairn_protocol::cell::CellId;
use cairn_protocol::messages::ServerMessage;
use cairn_protocol::pyramid::{PyramidShape, ShapeError};
use cairn_protocol::rules;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Outbound queue handle for one connected client.
pub type ClientSender = mpsc::UnboundedSender<ServerMessage>;

/// Result of an attempted toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The highlight set was mutated; `now_highlighted` is the cell's new state.
    Applied { now_highlighted: bool },
    /// The rule engine refused; the set is untouched.
    Rejected { reason: String },
}

/// An internally consistent read of a room's synchronized state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    pub shape: PyramidShape,
    /// Sorted by `(layer, index)`.
    pub highlighted: Vec<CellId>,
}

impl StateSnapshot {
    pub fn to_message(&self) -> ServerMessage {
        ServerMessage::StateSync {
            highlighted: self.highlighted.iter().map(CellId::to_string).collect(),
            layers: self.shape.layers,
            bottom_size: self.shape.bottom_size,
        }
    }
}

/// Shape and highlight set — one consistency unit under one lock.
struct RoomCore {
    shape: PyramidShape,
    highlighted: BTreeSet<CellId>,
}

/// One isolated room: synchronized state plus its connected clients.
pub struct Room {
    name: String,
    core: Mutex<RoomCore>,
    clients: Mutex<HashMap<Uuid, ClientSender>>,
}

impl Room {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            core: Mutex::new(RoomCore {
                shape: PyramidShape::default(),
                highlighted: BTreeSet::new(),
            }),
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Flip `cell` if the dependency rules allow it.
    ///
    /// The guard is held for the decision and the mutation only; the caller
    /// broadcasts after this returns.
    pub fn toggle(&self, cell: CellId) -> ToggleOutcome {
        let mut core = self.core.lock().unwrap();
        if core.highlighted.contains(&cell) {
            let decision = rules::can_deselect(&core.shape, &core.highlighted, cell);
            if !decision.allowed {
                return ToggleOutcome::Rejected {
                    reason: decision.reason(),
                };
            }
            core.highlighted.remove(&cell);
            ToggleOutcome::Applied {
                now_highlighted: false,
            }
        } else {
            let decision = rules::can_select(&core.shape, &core.highlighted, cell);
            if !decision.allowed {
                return ToggleOutcome::Rejected {
                    reason: decision.reason,
                };
            }
            core.highlighted.insert(cell);
            ToggleOutcome::Applied {
                now_highlighted: true,
            }
        }
    }

    /// Replace the pyramid shape and clear every highlight.
    ///
    /// Prior highlights are dropped unconditionally — adjacency semantics
    /// changed, so nothing carries over. Role checks belong to the caller.
    pub fn reconfigure(&self, layers: i64, bottom_size: i64) -> Result<PyramidShape, ShapeError> {
        let shape = PyramidShape::from_wire(layers, bottom_size)?;
        let mut core = self.core.lock().unwrap();
        core.shape = shape;
        core.highlighted.clear();
        log::info!(
            "room '{}' reconfigured to {} layers on a base of {}",
            self.name,
            shape.layers,
            shape.bottom_size
        );
        Ok(shape)
    }

    /// Read shape and sorted highlight list as one consistent unit.
    pub fn snapshot(&self) -> StateSnapshot {
        let core = self.core.lock().unwrap();
        StateSnapshot {
            shape: core.shape,
            highlighted: core.highlighted.iter().copied().collect(),
        }
    }

    /// Register a client's outbound queue.
    pub fn add_client(&self, id: Uuid, sender: ClientSender) {
        let mut clients = self.clients.lock().unwrap();
        clients.insert(id, sender);
    }

    /// Deregister a client. Safe to call more than once.
    pub fn remove_client(&self, id: Uuid) {
        let mut clients = self.clients.lock().unwrap();
        clients.remove(&id);
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().unwrap().len()
    }

    /// Deliver `message` to every connected client, pruning any whose
    /// channel is gone. Iterates a snapshot of the registry, so clients
    /// joining or leaving mid-fanout are neither missed-and-crashed-on nor
    /// double-notified.
    pub fn broadcast(&self, message: &ServerMessage) {
        let recipients: Vec<(Uuid, ClientSender)> = {
            let clients = self.clients.lock().unwrap();
            clients
                .iter()
                .map(|(id, sender)| (*id, sender.clone()))
                .collect()
        };

        let mut dead = Vec::new();
        for (id, sender) in recipients {
            if sender.send(message.clone()).is_err() {
                dead.push(id);
            }
        }

        if !dead.is_empty() {
            let mut clients = self.clients.lock().unwrap();
            for id in dead {
                if clients.remove(&id).is_some() {
                    log::debug!("room '{}': pruned dead client {}", self.name, id);
                }
            }
        }
    }
}

/// Process-wide room table. Rooms are created on first reference and live
/// for the rest of the process.
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, Arc<Room>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Look up `id`, creating the room if this is its first reference.
    /// Atomic insert-if-absent: two concurrent first touches get the same
    /// `Room`, never two divergent ones.
    pub fn room(&self, id: &str) -> Arc<Room> {
        let mut rooms = self.rooms.lock().unwrap();
        rooms
            .entry(id.to_string())
            .or_insert_with(|| {
                log::info!("room '{id}' created");
                Arc::new(Room::new(id))
            })
            .clone()
    }

    pub fn count(&self) -> usize {
        self.rooms.lock().unwrap().len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    fn cell(layer: u32, index: u32) -> CellId {
        CellId::new(layer, index)
    }

    fn room() -> Arc<Room> {
        RoomRegistry::new().room("test")
    }

    #[test]
    fn test_toggle_select_then_deselect() {
        let room = room();

        let outcome = room.toggle(cell(0, 0));
        assert_eq!(
            outcome,
            ToggleOutcome::Applied {
                now_highlighted: true
            }
        );
        assert_eq!(room.snapshot().highlighted, vec![cell(0, 0)]);

        let outcome = room.toggle(cell(0, 0));
        assert_eq!(
            outcome,
            ToggleOutcome::Applied {
                now_highlighted: false
            }
        );
        assert!(room.snapshot().highlighted.is_empty());
    }

    #[test]
    fn test_rejected_toggle_leaves_set_unchanged_and_is_stable() {
        let room = room();

        // Unsupported upper cell: rejected, set untouched, reason stable.
        let before = room.snapshot();
        let first = room.toggle(cell(1, 0));
        let second = room.toggle(cell(1, 0));
        assert_eq!(room.snapshot(), before);
        match (&first, &second) {
            (
                ToggleOutcome::Rejected { reason: a },
                ToggleOutcome::Rejected { reason: b },
            ) => assert_eq!(a, b),
            other => panic!("expected two rejections, got {other:?}"),
        }

        // Sole-support deselection: same guarantees.
        room.toggle(cell(0, 0));
        room.toggle(cell(1, 0));
        let before = room.snapshot();
        let first = room.toggle(cell(0, 0));
        let second = room.toggle(cell(0, 0));
        assert_eq!(room.snapshot(), before);
        match (&first, &second) {
            (
                ToggleOutcome::Rejected { reason: a },
                ToggleOutcome::Rejected { reason: b },
            ) => {
                assert!(a.contains("1-0"));
                assert_eq!(a, b);
            }
            other => panic!("expected two rejections, got {other:?}"),
        }
    }

    #[test]
    fn test_reconfigure_clears_highlights() {
        let room = room();
        room.toggle(cell(0, 0));
        room.toggle(cell(0, 1));
        room.toggle(cell(1, 0));

        let shape = room.reconfigure(5, 6).unwrap();
        assert_eq!(shape, PyramidShape::new(5, 6).unwrap());

        let snapshot = room.snapshot();
        assert_eq!(snapshot.shape.layers, 5);
        assert_eq!(snapshot.shape.bottom_size, 6);
        assert!(snapshot.highlighted.is_empty());
    }

    #[test]
    fn test_reconfigure_rejects_bad_dimensions_without_mutating() {
        let room = room();
        room.toggle(cell(0, 0));

        assert!(room.reconfigure(0, 3).is_err());
        assert!(room.reconfigure(3, -2).is_err());

        let snapshot = room.snapshot();
        assert_eq!(snapshot.shape, PyramidShape::default());
        assert_eq!(snapshot.highlighted, vec![cell(0, 0)]);
    }

    #[test]
    fn test_snapshot_is_sorted() {
        let room = room();
        room.toggle(cell(0, 2));
        room.toggle(cell(0, 0));
        room.toggle(cell(1, 0));
        assert_eq!(
            room.snapshot().highlighted,
            vec![cell(0, 0), cell(0, 2), cell(1, 0)]
        );
    }

    #[test]
    fn test_broadcast_reaches_all_clients_and_prunes_dead_ones() {
        let room = room();

        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let (tx_dead, rx_dead) = mpsc::unbounded_channel();

        room.add_client(Uuid::new_v4(), tx_a);
        room.add_client(Uuid::new_v4(), tx_b);
        room.add_client(Uuid::new_v4(), tx_dead);
        drop(rx_dead);
        assert_eq!(room.client_count(), 3);

        room.broadcast(&ServerMessage::Pong);

        assert_eq!(rx_a.try_recv().unwrap(), ServerMessage::Pong);
        assert_eq!(rx_b.try_recv().unwrap(), ServerMessage::Pong);
        assert!(rx_a.try_recv().is_err(), "no double delivery");
        assert_eq!(room.client_count(), 2, "dead client pruned");
    }

    #[test]
    fn test_broadcast_does_not_cross_rooms() {
        let registry = RoomRegistry::new();
        let room_a = registry.room("a");
        let room_b = registry.room("b");

        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        room_a.add_client(Uuid::new_v4(), tx_a);
        room_b.add_client(Uuid::new_v4(), tx_b);

        room_a.broadcast(&ServerMessage::Pong);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn test_registry_returns_same_room_for_same_id() {
        let registry = RoomRegistry::new();
        let first = registry.room("alpha");
        let second = registry.room("alpha");
        let other = registry.room("Alpha"); // case-sensitive

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(registry.count(), 2);
    }

    #[test]
    fn test_registry_concurrent_first_touch_creates_one_room() {
        let registry = Arc::new(RoomRegistry::new());
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let registry = registry.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    registry.room("contested")
                })
            })
            .collect();

        let rooms: Vec<Arc<Room>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(Arc::ptr_eq(&rooms[0], &rooms[1]));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_concurrent_toggles_linearize() {
        // Two simultaneous togglers of the same supported cell: the guard
        // serializes them, so one observes the on-flip and the other the
        // off-flip — never two on-flips (a lost update).
        for _ in 0..50 {
            let room = room();
            room.toggle(cell(0, 0));

            let barrier = Arc::new(Barrier::new(2));
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let room = room.clone();
                    let barrier = barrier.clone();
                    std::thread::spawn(move || {
                        barrier.wait();
                        room.toggle(cell(1, 0))
                    })
                })
                .collect();

            let outcomes: Vec<ToggleOutcome> =
                handles.into_iter().map(|h| h.join().unwrap()).collect();

            let ons = outcomes
                .iter()
                .filter(|o| {
                    matches!(
                        o,
                        ToggleOutcome::Applied {
                            now_highlighted: true
                        }
                    )
                })
                .count();
            let offs = outcomes
                .iter()
                .filter(|o| {
                    matches!(
                        o,
                        ToggleOutcome::Applied {
                            now_highlighted: false
                        }
                    )
                })
                .count();

            assert_eq!(ons, 1, "exactly one caller may turn the cell on");
            assert_eq!(offs, 1, "the other observes the already-on cell");
            assert!(!room
                .snapshot()
                .highlighted
                .contains(&cell(1, 0)));
        }
    }

    #[test]
    fn test_concurrent_blocked_deselects_both_reject() {
        let room = room();
        room.toggle(cell(0, 0));
        room.toggle(cell(1, 0));

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let room = room.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    room.toggle(cell(0, 0))
                })
            })
            .collect();

        for handle in handles {
            assert!(matches!(
                handle.join().unwrap(),
                ToggleOutcome::Rejected { .. }
            ));
        }
        assert_eq!(
            room.snapshot().highlighted,
            vec![cell(0, 0), cell(1, 0)]
        );
    }
}
