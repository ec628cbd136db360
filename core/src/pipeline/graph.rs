//! Directed acyclic task graph with insertion-ordered, deterministic
//! traversal.

use super::{Layer, Task};
use crate::error::{GenError, GenResult};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Default)]
pub struct TaskGraph {
    tasks:      Vec<Task>,
    index:      HashMap<String, usize>,
    upstream:   Vec<Vec<usize>>,
    downstream: Vec<Vec<usize>>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_task(&mut self, task: Task) -> GenResult<()> {
        if self.index.contains_key(&task.id) {
            return Err(GenError::DuplicateTask { id: task.id });
        }
        self.index.insert(task.id.clone(), self.tasks.len());
        self.tasks.push(task);
        self.upstream.push(Vec::new());
        self.downstream.push(Vec::new());
        Ok(())
    }

    /// `from` must finish before `to` starts. Repeated edges are ignored.
    pub fn add_edge(&mut self, from: &str, to: &str) -> GenResult<()> {
        let f = self.slot(from)?;
        let t = self.slot(to)?;
        if f == t {
            return Err(GenError::SelfDependency { id: from.to_string() });
        }
        if !self.downstream[f].contains(&t) {
            self.downstream[f].push(t);
            self.upstream[t].push(f);
        }
        Ok(())
    }

    /// `ids[0] >> ids[1] >> ...`
    pub fn chain(&mut self, ids: &[&str]) -> GenResult<()> {
        for pair in ids.windows(2) {
            self.add_edge(pair[0], pair[1])?;
        }
        Ok(())
    }

    /// Every task of `from` upstream of every task of `to`.
    pub fn group_edges(&mut self, from: Layer, to: Layer) -> GenResult<()> {
        let sources: Vec<String> = self.ids_in(from);
        let targets: Vec<String> = self.ids_in(to);
        for s in &sources {
            for t in &targets {
                self.add_edge(s, t)?;
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.index.get(id).map(|&i| &self.tasks[i])
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks_in(&self, layer: Layer) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |t| t.layer == layer)
    }

    pub fn upstream(&self, id: &str) -> GenResult<Vec<&Task>> {
        let i = self.slot(id)?;
        Ok(self.upstream[i].iter().map(|&u| &self.tasks[u]).collect())
    }

    pub fn downstream(&self, id: &str) -> GenResult<Vec<&Task>> {
        let i = self.slot(id)?;
        Ok(self.downstream[i].iter().map(|&d| &self.tasks[d]).collect())
    }

    /// Kahn's algorithm; among ready tasks the earliest inserted goes
    /// first, so the order is stable across runs.
    pub fn topological_order(&self) -> GenResult<Vec<&Task>> {
        let mut indegree: Vec<usize> = self.upstream.iter().map(Vec::len).collect();
        let mut ready: BTreeSet<usize> = indegree
            .iter()
            .enumerate()
            .filter(|(_, &d)| d == 0)
            .map(|(i, _)| i)
            .collect();
        let mut order = Vec::with_capacity(self.tasks.len());

        while let Some(i) = ready.pop_first() {
            order.push(&self.tasks[i]);
            for &d in &self.downstream[i] {
                indegree[d] -= 1;
                if indegree[d] == 0 {
                    ready.insert(d);
                }
            }
        }

        if order.len() < self.tasks.len() {
            let id = self
                .task_on_cycle(&indegree)
                .map(|i| self.tasks[i].id.clone())
                .unwrap_or_default();
            return Err(GenError::CycleDetected { id });
        }
        Ok(order)
    }

    /// After Kahn stalls, every task left with a positive indegree has at
    /// least one upstream that is also stuck. Following those links must
    /// revisit a task, and the first one revisited lies on a cycle.
    fn task_on_cycle(&self, indegree: &[usize]) -> Option<usize> {
        let mut current = indegree.iter().position(|&d| d > 0)?;
        let mut visited = vec![false; self.tasks.len()];
        while !visited[current] {
            visited[current] = true;
            current = *self.upstream[current].iter().find(|&&u| indegree[u] > 0)?;
        }
        Some(current)
    }

    fn slot(&self, id: &str) -> GenResult<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| GenError::UnknownTask { id: id.to_string() })
    }

    fn ids_in(&self, layer: Layer) -> Vec<String> {
        self.tasks_in(layer).map(|t| t.id.clone()).collect()
    }
}
