//! Task dependency levels.
//!
//! Some tasks write files that others read: the sprite and icon tasks
//! generate stylesheets compiled by the style task, and the sprite sheet
//! lands in the image sources. Levels group tasks so that every dependency
//! sits in an earlier level; tasks within a level run in parallel.

use super::TaskKind;
use rustc_hash::FxHashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("task dependency cycle between: {}", names(.0))]
    Cycle(Vec<TaskKind>),
}

fn names(kinds: &[TaskKind]) -> String {
    kinds.iter().map(|k| k.name()).collect::<Vec<_>>().join(", ")
}

/// Tasks whose outputs `kind` consumes.
pub fn dependencies(kind: TaskKind) -> &'static [TaskKind] {
    match kind {
        TaskKind::Style => &[TaskKind::Sprite, TaskKind::Icon],
        TaskKind::Image => &[TaskKind::Sprite],
        _ => &[],
    }
}

/// Execution levels for `selected`.
///
/// With `ordered = false` every task lands in a single level, matching a flat
/// task list. Dependencies outside `selected` are ignored.
pub fn levels(selected: &[TaskKind], ordered: bool) -> Result<Vec<Vec<TaskKind>>, GraphError> {
    if !ordered {
        return Ok(if selected.is_empty() {
            Vec::new()
        } else {
            vec![selected.to_vec()]
        });
    }
    compute_levels(selected, dependencies)
}

/// Kahn-style level assignment; order inside a level follows `nodes`.
fn compute_levels(
    nodes: &[TaskKind],
    deps: impl Fn(TaskKind) -> &'static [TaskKind],
) -> Result<Vec<Vec<TaskKind>>, GraphError> {
    let present: FxHashSet<TaskKind> = nodes.iter().copied().collect();
    let mut placed: FxHashSet<TaskKind> = FxHashSet::default();
    let mut remaining: Vec<TaskKind> = nodes.to_vec();
    let mut levels = Vec::new();

    while !remaining.is_empty() {
        let level: Vec<TaskKind> = remaining
            .iter()
            .copied()
            .filter(|&kind| {
                deps(kind)
                    .iter()
                    .all(|dep| !present.contains(dep) || placed.contains(dep))
            })
            .collect();

        if level.is_empty() {
            return Err(GraphError::Cycle(remaining));
        }

        placed.extend(level.iter().copied());
        remaining.retain(|kind| !placed.contains(kind));
        levels.push(level);
    }

    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskKind::*;

    #[test]
    fn test_generated_inputs_run_first() {
        let levels = levels(&TaskKind::ALL, true).unwrap();
        assert_eq!(
            levels,
            vec![vec![Icon, Sprite, Script, Fonts, Html], vec![Style, Image]]
        );
    }

    #[test]
    fn test_unordered_is_one_level() {
        let levels = levels(&TaskKind::ALL, false).unwrap();
        assert_eq!(levels, vec![TaskKind::ALL.to_vec()]);
    }

    #[test]
    fn test_subset_ignores_missing_dependencies() {
        assert_eq!(levels(&[Style, Script], true).unwrap(), vec![vec![Style, Script]]);
        assert_eq!(
            levels(&[Style, Sprite], true).unwrap(),
            vec![vec![Sprite], vec![Style]]
        );
        assert!(levels(&[], true).unwrap().is_empty());
    }

    #[test]
    fn test_cycle_detected() {
        fn cyclic(kind: TaskKind) -> &'static [TaskKind] {
            match kind {
                Style => &[Script],
                Script => &[Style],
                _ => &[],
            }
        }
        let err = compute_levels(&[Fonts, Style, Script], cyclic).unwrap_err();
        assert_eq!(err, GraphError::Cycle(vec![Style, Script]));
        assert_eq!(err.to_string(), "task dependency cycle between: style, script");
    }
}
