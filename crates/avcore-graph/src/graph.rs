//! `Graph`: topologically-ordered lifecycle fan-out over connected
//! components (spec.md §4.8). Connections carry samples via a
//! [`avcore::CommandFifo`] (C6), so the data plane and the lifecycle plane
//! share the same command/pool machinery the rest of this crate builds on.

use crate::component::{Component, Port, PortDirection};
use crate::error::GraphError;
use crate::params::ParamValue;
use avcore::{CommandFifo, RingConfig, RingMode};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// The lifecycle state of a [`Graph`] as a whole.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphState {
    Idle,
    Prepared,
    Running,
    Paused,
    Stopped,
    Error(String),
}

/// A connection between one component's output port and another's input
/// port, backed by a shared [`CommandFifo`] the two components use to
/// shuttle samples.
pub struct Connection {
    pub from_component: String,
    pub from_port: String,
    pub to_component: String,
    pub to_port: String,
    pub channel: Arc<CommandFifo>,
}

/// A graph of [`Component`]s wired by [`Connection`]s, sequenced through
/// `prepare`/`start`/`pause`/`stop` in topological order.
pub struct Graph {
    components: HashMap<String, Box<dyn Component>>,
    connections: Vec<Connection>,
    state: GraphState,
}

impl Graph {
    pub fn new() -> Self {
        Self {
            components: HashMap::new(),
            connections: Vec::new(),
            state: GraphState::Idle,
        }
    }

    pub fn state(&self) -> &GraphState {
        &self.state
    }

    pub fn add_component(&mut self, component: Box<dyn Component>) {
        self.components.insert(component.id().to_string(), component);
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    fn find_port<'a>(
        &'a self,
        component_id: &str,
        port_name: &str,
        direction: PortDirection,
    ) -> Result<&'a Port, GraphError> {
        let component = self
            .components
            .get(component_id)
            .ok_or_else(|| GraphError::UnknownComponent(component_id.to_string()))?;
        component
            .ports()
            .iter()
            .find(|p| p.name == port_name && p.direction == direction)
            .ok_or_else(|| GraphError::UnknownPort {
                component: component_id.to_string(),
                port: port_name.to_string(),
            })
    }

    /// Connects `from_component.from_port` (an output) to
    /// `to_component.to_port` (an input). Rejects a kind mismatch without
    /// mutating the graph.
    pub fn connect(
        &mut self,
        from_component: &str,
        from_port: &str,
        to_component: &str,
        to_port: &str,
        capacity: usize,
    ) -> Result<(), GraphError> {
        let out_port = self.find_port(from_component, from_port, PortDirection::Output)?;
        let in_port = self.find_port(to_component, to_port, PortDirection::Input)?;
        if out_port.kind != in_port.kind {
            return Err(GraphError::PortKindMismatch {
                from_component: from_component.to_string(),
                from_port: from_port.to_string(),
                from_kind: out_port.kind,
                to_component: to_component.to_string(),
                to_port: to_port.to_string(),
                to_kind: in_port.kind,
            });
        }
        self.connections.push(Connection {
            from_component: from_component.to_string(),
            from_port: from_port.to_string(),
            to_component: to_component.to_string(),
            to_port: to_port.to_string(),
            channel: Arc::new(CommandFifo::new(RingConfig::new(capacity, RingMode::Mpmc))),
        });
        Ok(())
    }

    /// Kahn's algorithm over the connection graph. Edge direction is
    /// source-component → sink-component. Returns components in forward
    /// topological order (sources first); `Err(GraphError::Cycle)` if the
    /// connection graph is not a DAG.
    fn topological_order(&self) -> Result<Vec<String>, GraphError> {
        let mut in_degree: HashMap<&str, usize> =
            self.components.keys().map(|id| (id.as_str(), 0)).collect();
        let mut adjacency: HashMap<&str, Vec<&str>> =
            self.components.keys().map(|id| (id.as_str(), Vec::new())).collect();

        for conn in &self.connections {
            adjacency
                .get_mut(conn.from_component.as_str())
                .expect("connection endpoint must be a registered component")
                .push(conn.to_component.as_str());
            *in_degree
                .get_mut(conn.to_component.as_str())
                .expect("connection endpoint must be a registered component") += 1;
        }

        let mut ready: Vec<&str> = in_degree
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(id, _)| *id)
            .collect();
        ready.sort_unstable();
        let mut queue: VecDeque<&str> = ready.into();

        let mut order = Vec::with_capacity(self.components.len());
        while let Some(id) = queue.pop_front() {
            order.push(id.to_string());
            let mut next_ready: Vec<&str> = Vec::new();
            for &neighbor in &adjacency[id] {
                let deg = in_degree.get_mut(neighbor).unwrap();
                *deg -= 1;
                if *deg == 0 {
                    next_ready.push(neighbor);
                }
            }
            next_ready.sort_unstable();
            queue.extend(next_ready);
        }

        if order.len() != self.components.len() {
            return Err(GraphError::Cycle);
        }
        Ok(order)
    }

    /// Calls `prepare` on every component (order unspecified — no data flows
    /// until `start`).
    pub fn prepare(&mut self) -> Result<(), GraphError> {
        for (id, component) in &mut self.components {
            if let Err(message) = component.prepare() {
                self.state = GraphState::Error(message.clone());
                return Err(GraphError::ComponentFailed {
                    component: id.clone(),
                    phase: "prepare",
                    message,
                });
            }
        }
        self.state = GraphState::Prepared;
        Ok(())
    }

    /// Starts every component in reverse topological order (sinks before
    /// sources, so downstream is ready before data flows). On a cycle,
    /// returns `Cycle` without starting anything. On a component failure,
    /// aggregates the error, transitions to `Error`, and still stops every
    /// component in forward order (spec.md §7).
    pub fn start(&mut self) -> Result<(), GraphError> {
        let order = self.topological_order()?;
        let mut start_order = order.clone();
        start_order.reverse();

        let mut failure: Option<GraphError> = None;
        for id in &start_order {
            let component = self.components.get_mut(id).expect("id came from topological_order");
            if let Err(message) = component.start() {
                failure = Some(GraphError::ComponentFailed {
                    component: id.clone(),
                    phase: "start",
                    message,
                });
                break;
            }
        }

        if let Some(err) = failure {
            let message = err.to_string();
            self.state = GraphState::Error(message.clone());
            self.stop_in_order(&order);
            return Err(err);
        }

        self.state = GraphState::Running;
        Ok(())
    }

    /// Pauses every component in forward topological order.
    pub fn pause(&mut self) -> Result<(), GraphError> {
        let order = self.topological_order()?;
        for id in &order {
            let component = self.components.get_mut(id).expect("id came from topological_order");
            if let Err(message) = component.pause() {
                self.state = GraphState::Error(message.clone());
                return Err(GraphError::ComponentFailed {
                    component: id.clone(),
                    phase: "pause",
                    message,
                });
            }
        }
        self.state = GraphState::Paused;
        Ok(())
    }

    /// Stops every component in forward topological order, regardless of
    /// individual failures — every component still gets a `stop` call.
    pub fn stop(&mut self) -> Result<(), GraphError> {
        let order = self.topological_order()?;
        let failures = self.stop_in_order(&order);
        match failures.into_iter().next() {
            Some(err) => {
                self.state = GraphState::Error(err.to_string());
                Err(err)
            }
            None => {
                self.state = GraphState::Stopped;
                Ok(())
            }
        }
    }

    fn stop_in_order(&mut self, order: &[String]) -> Vec<GraphError> {
        let mut failures = Vec::new();
        for id in order {
            if let Some(component) = self.components.get_mut(id) {
                if let Err(message) = component.stop() {
                    failures.push(GraphError::ComponentFailed {
                        component: id.clone(),
                        phase: "stop",
                        message,
                    });
                }
            }
        }
        failures
    }

    fn split_path(path: &str) -> Result<(&str, &str), GraphError> {
        path.split_once('.')
            .ok_or_else(|| GraphError::InvalidParamPath(path.to_string()))
    }

    /// Gets a parameter by its `componentId.parameterKey` dotted path.
    pub fn get_param(&self, path: &str) -> Result<ParamValue, GraphError> {
        let (component_id, key) = Self::split_path(path)?;
        let component = self
            .components
            .get(component_id)
            .ok_or_else(|| GraphError::UnknownComponent(component_id.to_string()))?;
        component
            .params()
            .get(key)
            .cloned()
            .ok_or_else(|| GraphError::UnknownParam(path.to_string()))
    }

    /// Sets a parameter by its `componentId.parameterKey` dotted path.
    pub fn set_param(&mut self, path: &str, value: ParamValue) -> Result<(), GraphError> {
        let (component_id, key) = Self::split_path(path)?;
        let component = self
            .components
            .get_mut(component_id)
            .ok_or_else(|| GraphError::UnknownComponent(component_id.to_string()))?;
        component.params_mut().set(key, value)
    }

    /// Components with no incoming connection, in the order
    /// [`Graph::topological_order`] places them.
    pub fn source_ids(&self) -> Result<Vec<String>, GraphError> {
        let all: HashSet<&str> = self.components.keys().map(String::as_str).collect();
        let with_inputs: HashSet<&str> = self
            .connections
            .iter()
            .map(|c| c.to_component.as_str())
            .collect();
        let order = self.topological_order()?;
        Ok(order
            .into_iter()
            .filter(|id| all.contains(id.as_str()) && !with_inputs.contains(id.as_str()))
            .collect())
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
