use tracing::{debug, info};

use super::model::{NavigationPath, SchemaTree};
use super::store::{get_level, try_get_level};
use super::template::effective_subgraph;

/// 브레드크럼 한 칸.
#[derive(Debug, Clone, PartialEq)]
pub struct Crumb {
    /// 그룹 노드 ID. 루트는 `None`.
    pub group_id: Option<String>,
    /// 표시 라벨.
    pub label: String,
}

/// 현재 드릴인 경로 상태.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationStack {
    path: NavigationPath,
}

impl NavigationStack {
    /// 현재 경로.
    pub fn current(&self) -> &[String] {
        &self.path
    }

    /// 드릴인 깊이. 루트는 0이다.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// 현재 레벨의 `group_id`로 들어갈 수 있는지 확인한다.
    ///
    /// 그룹이고 실효 하위 그래프에 노드가 하나 이상 있어야 한다.
    pub fn can_enter(&self, tree: &SchemaTree, group_id: &str) -> bool {
        let level = get_level(tree, &self.path);
        level
            .node(group_id)
            .filter(|node| node.is_group())
            .is_some_and(|node| !effective_subgraph(node, &level).is_empty())
    }

    /// 그룹으로 들어간다. 들어갈 수 없으면 아무 것도 하지 않고 `false`를 반환한다.
    pub fn push(&mut self, tree: &SchemaTree, group_id: &str) -> bool {
        if !self.can_enter(tree, group_id) {
            debug!(group_id = %group_id, "비어 있거나 그룹이 아닌 노드로는 들어갈 수 없음");
            return false;
        }
        self.path.push(group_id.to_string());
        true
    }

    /// 한 단계 나온다. 루트에서는 아무 것도 하지 않는다.
    pub fn pop(&mut self) -> Option<String> {
        self.path.pop()
    }

    /// 루트로 돌아간다.
    pub fn reset(&mut self) {
        self.path.clear();
    }

    /// 경로를 `depth` 길이로 자른다.
    pub fn truncate(&mut self, depth: usize) {
        self.path.truncate(depth);
    }

    /// 저장된 경로 중 여전히 들어갈 수 있는 가장 긴 앞부분으로 복원한다.
    pub fn restore(&mut self, tree: &SchemaTree, saved: &[String]) {
        self.reset();
        for group_id in saved {
            if !self.push(tree, group_id) {
                info!(
                    restored = self.depth(),
                    saved = saved.len(),
                    "저장된 탐색 경로 일부를 복원할 수 없어 잘라냄"
                );
                break;
            }
        }
    }

    /// 루트부터 현재 레벨까지의 라벨 목록.
    pub fn breadcrumbs(&self, tree: &SchemaTree, root_label: &str) -> Vec<Crumb> {
        let mut crumbs = vec![Crumb {
            group_id: None,
            label: root_label.to_string(),
        }];
        for (depth, group_id) in self.path.iter().enumerate() {
            let label = try_get_level(tree, &self.path[..depth])
                .and_then(|level| level.node(group_id).map(|node| node.label().to_string()))
                .unwrap_or_else(|| group_id.clone());
            crumbs.push(Crumb {
                group_id: Some(group_id.clone()),
                label,
            });
        }
        crumbs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::model::{NodeKind, Position};
    use crate::editor::router::create_node;

    fn path(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn empty_groups_cannot_be_entered_until_they_gain_content() {
        let tree = create_node(
            &SchemaTree::new("t"),
            &[],
            "g1",
            Position::default(),
            NodeKind::Group,
        );
        let mut nav = NavigationStack::default();

        assert!(!nav.push(&tree, "g1"));
        assert!(nav.current().is_empty());

        let tree = create_node(&tree, &path(&["g1"]), "in", Position::default(), NodeKind::Input);
        assert!(nav.push(&tree, "g1"));
        assert_eq!(nav.current(), path(&["g1"]).as_slice());

        let level = get_level(&tree, nav.current());
        assert_eq!(level.nodes.len(), 1);
        assert_eq!(level.nodes[0].id, "in");
        assert_eq!(level.nodes[0].kind, NodeKind::Input);
    }

    #[test]
    fn non_group_nodes_are_not_enterable() {
        let tree = create_node(
            &SchemaTree::new("t"),
            &[],
            "p",
            Position::default(),
            NodeKind::Population,
        );
        let mut nav = NavigationStack::default();
        assert!(!nav.push(&tree, "p"));
        assert!(!nav.push(&tree, "missing"));
    }

    #[test]
    fn popping_past_the_root_is_a_no_op() {
        let mut nav = NavigationStack::default();
        assert_eq!(nav.pop(), None);
        assert_eq!(nav.depth(), 0);
    }

    #[test]
    fn restore_keeps_the_longest_valid_prefix() {
        let tree = create_node(
            &SchemaTree::new("t"),
            &[],
            "g1",
            Position::default(),
            NodeKind::Group,
        );
        let tree = create_node(&tree, &path(&["g1"]), "g2", Position::default(), NodeKind::Group);
        let mut nav = NavigationStack::default();

        nav.restore(&tree, &path(&["g1", "g2", "g3"]));

        assert_eq!(nav.current(), path(&["g1"]).as_slice());
    }

    #[test]
    fn breadcrumbs_follow_node_labels() {
        let tree = create_node(
            &SchemaTree::new("t"),
            &[],
            "g1",
            Position::default(),
            NodeKind::Group,
        );
        let tree = create_node(&tree, &path(&["g1"]), "x", Position::default(), NodeKind::Input);
        let mut nav = NavigationStack::default();
        assert!(nav.push(&tree, "g1"));

        let crumbs = nav.breadcrumbs(&tree, "Root");

        let labels: Vec<&str> = crumbs.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Root", "Group"]);
        assert_eq!(crumbs[1].group_id.as_deref(), Some("g1"));
    }
}
