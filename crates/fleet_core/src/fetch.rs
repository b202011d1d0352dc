//! Background route fetching: requests run on spawned threads and deliver
//! into an mpsc channel that the movement system drains non-blockingly at
//! the start of each tick. A tick therefore never waits on the network.
//!
//! Stale completions are possible (the vehicle may have been retargeted, or
//! the run stopped, while a fetch was in flight); the drain side guards on
//! the requested destination before applying a result, and a send into a
//! dropped receiver is silently discarded.

use std::collections::HashSet;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

use bevy_ecs::prelude::{Entity, Resource};

use crate::geo::Coordinate;
use crate::routing::{RouteProvider, RouteResult};

/// Completed fetch, successful or not. `origin`/`destination` echo the
/// request so the receiver can detect stale completions.
#[derive(Debug)]
pub struct RouteFetchOutcome {
    pub entity: Entity,
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub result: Option<RouteResult>,
    pub error: Option<String>,
}

#[derive(Resource)]
pub struct RouteFetchQueue {
    sender: Sender<RouteFetchOutcome>,
    receiver: Mutex<Receiver<RouteFetchOutcome>>,
    inflight: HashSet<Entity>,
}

impl RouteFetchQueue {
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        Self {
            sender,
            receiver: Mutex::new(receiver),
            inflight: HashSet::new(),
        }
    }

    /// Spawn a background fetch for `entity` unless one is already in
    /// flight for it.
    pub fn request(
        &mut self,
        entity: Entity,
        origin: Coordinate,
        destination: Coordinate,
        provider: Arc<dyn RouteProvider>,
    ) {
        if !self.inflight.insert(entity) {
            return;
        }
        let sender = self.sender.clone();
        std::thread::spawn(move || {
            let result = provider.route(origin, destination);
            let error = result
                .is_none()
                .then(|| "route provider returned no route".to_string());
            let _ = sender.send(RouteFetchOutcome {
                entity,
                origin,
                destination,
                result,
                error,
            });
        });
    }

    /// Drain every completed fetch without blocking.
    pub fn drain(&mut self) -> Vec<RouteFetchOutcome> {
        let mut outcomes = Vec::new();
        let Ok(receiver) = self.receiver.lock() else {
            return outcomes;
        };
        while let Ok(outcome) = receiver.try_recv() {
            outcomes.push(outcome);
        }
        drop(receiver);
        for outcome in &outcomes {
            self.inflight.remove(&outcome.entity);
        }
        outcomes
    }

    pub fn is_inflight(&self, entity: Entity) -> bool {
        self.inflight.contains(&entity)
    }

    pub fn inflight_count(&self) -> usize {
        self.inflight.len()
    }
}

impl Default for RouteFetchQueue {
    fn default() -> Self {
        Self::new()
    }
}
