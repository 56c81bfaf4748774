use crate::model::Step;
use std::collections::{BTreeSet, HashMap};

/// Kahn ordering over `steps`, returning indexes into the slice.
///
/// Among ready steps the lowest id runs first. A dependency on an id that is not in the
/// slice never resolves, and neither does a duplicated id; either way the unresolved step
/// ids come back as the error, sorted.
pub fn topological_order(steps: &[Step]) -> Result<Vec<usize>, Vec<i64>> {
    let mut index_by_id = HashMap::<i64, usize>::new();
    let mut duplicated = BTreeSet::<i64>::new();
    for (index, step) in steps.iter().enumerate() {
        if index_by_id.insert(step.id, index).is_some() {
            duplicated.insert(step.id);
        }
    }
    if !duplicated.is_empty() {
        return Err(duplicated.into_iter().collect());
    }

    let mut indegree = vec![0usize; steps.len()];
    let mut dependents = vec![Vec::<usize>::new(); steps.len()];
    for (index, step) in steps.iter().enumerate() {
        let deps = step.depends_on.iter().copied().collect::<BTreeSet<_>>();
        indegree[index] = deps.len();
        for dep in deps {
            if let Some(dep_index) = index_by_id.get(&dep) {
                dependents[*dep_index].push(index);
            }
        }
    }

    let mut ready = steps
        .iter()
        .enumerate()
        .filter(|(index, _)| indegree[*index] == 0)
        .map(|(index, step)| (step.id, index))
        .collect::<BTreeSet<_>>();
    let mut order = Vec::<usize>::with_capacity(steps.len());
    while let Some((_, index)) = ready.pop_first() {
        order.push(index);
        for child in &dependents[index] {
            indegree[*child] -= 1;
            if indegree[*child] == 0 {
                ready.insert((steps[*child].id, *child));
            }
        }
    }

    if order.len() == steps.len() {
        return Ok(order);
    }
    let placed = order.iter().copied().collect::<BTreeSet<_>>();
    let mut unresolved = steps
        .iter()
        .enumerate()
        .filter(|(index, _)| !placed.contains(index))
        .map(|(_, step)| step.id)
        .collect::<Vec<_>>();
    unresolved.sort_unstable();
    Err(unresolved)
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod tests;
