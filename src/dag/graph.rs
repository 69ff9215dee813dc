// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::debug;

use crate::registry::EventRegistry;
use crate::task::TaskName;

/// Internal node structure: stores immediate dependents.
///
/// Only forward edges are kept; both the closure walk and the dry-run
/// output traverse producer to consumer.
#[derive(Debug, Clone, Default)]
struct DepNode {
    /// Direct dependents: tasks depending on an event this one produces.
    dependents: BTreeSet<TaskName>,
}

/// Simple in-memory dependency graph keyed by task name.
///
/// An edge A -> B exists iff A declares producing an event that B declares
/// depending on. Unlike a build-system DAG, cycles are legal here: they only
/// mean the involved tasks always belong to the same closure, never that a
/// task runs more than once.
#[derive(Debug, Clone)]
pub struct DepGraph {
    nodes: BTreeMap<TaskName, DepNode>,
}

impl DepGraph {
    /// Derive the graph from every task registered in the given registry.
    pub fn from_registry(registry: &EventRegistry) -> Self {
        let mut nodes: BTreeMap<TaskName, DepNode> = BTreeMap::new();

        for name in registry.task_names() {
            nodes.insert(name.to_string(), DepNode::default());
        }

        // For every event, connect each producer to each consumer.
        for task in registry.tasks() {
            let consumer = task.name().to_string();
            for event in task.depends_on() {
                for producer_task in registry.tasks_producing(&event) {
                    let producer = producer_task.name().to_string();
                    if producer == consumer {
                        continue;
                    }
                    if let Some(node) = nodes.get_mut(&producer) {
                        node.dependents.insert(consumer.clone());
                    }
                }
            }
        }

        Self { nodes }
    }

    /// Return all task names in the graph.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    /// Tasks depending on an event this task produces.
    pub fn dependents_of(&self, name: &str) -> impl Iterator<Item = &str> {
        self.nodes
            .get(name)
            .into_iter()
            .flat_map(|n| n.dependents.iter().map(|s| s.as_str()))
    }

    /// Transitive closure of tasks reachable from the seeds along
    /// produces -> depends_on edges (seeds included).
    ///
    /// Breadth-first with a visited set, so cycles terminate.
    pub fn closure<'a, I>(&self, seeds: I) -> BTreeSet<TaskName>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut visited: BTreeSet<TaskName> = BTreeSet::new();
        let mut queue: VecDeque<TaskName> = VecDeque::new();

        for seed in seeds {
            if self.nodes.contains_key(seed) && visited.insert(seed.to_string()) {
                queue.push_back(seed.to_string());
            }
        }

        while let Some(name) = queue.pop_front() {
            for dependent in self.dependents_of(&name) {
                if visited.insert(dependent.to_string()) {
                    queue.push_back(dependent.to_string());
                }
            }
        }

        debug!(tasks = visited.len(), "computed dependency closure");
        visited
    }
}
