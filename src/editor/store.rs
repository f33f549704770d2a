use std::sync::Arc;
use tracing::debug;

use super::model::{GraphLevel, SchemaTree};
use super::template::{TemplateSource, effective_subgraph, resolve_template};

/// 경로가 가리키는 레벨을 반환한다. 해석할 수 없는 경로는 빈 레벨이 된다.
pub fn get_level(tree: &SchemaTree, path: &[String]) -> Arc<GraphLevel> {
    try_get_level(tree, path).unwrap_or_else(|| {
        debug!(?path, "해석할 수 없는 경로: 빈 레벨로 대체");
        Arc::new(GraphLevel::empty())
    })
}

/// 경로의 모든 요소가 그룹 노드로 해석될 때만 레벨을 반환한다.
pub fn try_get_level(tree: &SchemaTree, path: &[String]) -> Option<Arc<GraphLevel>> {
    let mut level = tree.root.clone();
    for group_id in path {
        let node = level.node(group_id).filter(|node| node.is_group())?;
        let next = effective_subgraph(node, &level);
        level = next;
    }
    Some(level)
}

/// 경로가 가리키는 레벨을 `level`로 교체한 새 트리를 반환한다.
///
/// 경로 중간의 자식 그룹은 템플릿의 하위 그래프로 기록을 넘긴다. 경로가 끊겨 있으면
/// 원래 트리를 그대로 돌려준다.
pub fn replace_level(tree: &SchemaTree, path: &[String], level: GraphLevel) -> SchemaTree {
    match rebuild(&tree.root, path, level) {
        Some(root) => SchemaTree {
            root: Arc::new(root),
            ..tree.clone()
        },
        None => {
            debug!(?path, "끊긴 경로에 대한 레벨 교체 무시");
            tree.clone()
        }
    }
}

fn rebuild(current: &GraphLevel, path: &[String], replacement: GraphLevel) -> Option<GraphLevel> {
    let Some((head, rest)) = path.split_first() else {
        return Some(replacement);
    };
    let node = current.node(head).filter(|node| node.is_group())?;

    let (owner_id, detach_dangling) = match resolve_template(node, current) {
        TemplateSource::Own(owner) | TemplateSource::Inherited(owner) => (owner.id.clone(), false),
        TemplateSource::Unresolved(err) => {
            debug!(node_id = %node.id, "{err}: 자체 저장소에 기록");
            (node.id.clone(), true)
        }
    };
    let owner_subgraph = current
        .node(&owner_id)
        .and_then(|owner| owner.subgraph.clone())
        .unwrap_or_else(|| Arc::new(GraphLevel::empty()));
    let next = rebuild(&owner_subgraph, rest, replacement)?;

    let mut rebuilt = current.clone();
    let owner = rebuilt.node_mut(&owner_id)?;
    owner.subgraph = Some(Arc::new(next));
    if detach_dangling {
        owner.parent_group_id = None;
    }
    Some(rebuilt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::model::{NodeKind, Position, SchemaNode};

    fn path(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn level_with(nodes: Vec<SchemaNode>) -> GraphLevel {
        GraphLevel {
            nodes,
            ..Default::default()
        }
    }

    fn nested_tree() -> SchemaTree {
        let inner = level_with(vec![SchemaNode::new(
            "deep",
            NodeKind::Population,
            Position::default(),
        )]);
        let mut g2 = SchemaNode::new("g2", NodeKind::Group, Position::default());
        g2.subgraph = Some(Arc::new(inner));
        let mut g1 = SchemaNode::new("g1", NodeKind::Group, Position::default());
        g1.subgraph = Some(Arc::new(level_with(vec![g2])));
        let sibling = SchemaNode::new("side", NodeKind::Group, Position::default());
        let mut tree = SchemaTree::new("nested");
        tree.root = Arc::new(level_with(vec![g1, sibling]));
        tree
    }

    #[test]
    fn empty_path_addresses_the_root() {
        let tree = nested_tree();
        assert!(Arc::ptr_eq(&get_level(&tree, &[]), &tree.root));
    }

    #[test]
    fn nested_paths_walk_group_subgraphs() {
        let tree = nested_tree();
        let level = get_level(&tree, &path(&["g1", "g2"]));
        assert_eq!(level.nodes.len(), 1);
        assert_eq!(level.nodes[0].id, "deep");
    }

    #[test]
    fn broken_paths_fall_back_to_an_empty_level() {
        let tree = nested_tree();
        assert!(get_level(&tree, &path(&["missing"])).is_empty());
        assert!(get_level(&tree, &path(&["g1", "g2", "deep"])).is_empty());
        assert!(try_get_level(&tree, &path(&["g1", "nope"])).is_none());
    }

    #[test]
    fn replacing_a_nested_level_keeps_unrelated_branches_shared() {
        let tree = nested_tree();
        let replacement = level_with(vec![SchemaNode::new(
            "fresh",
            NodeKind::Input,
            Position::default(),
        )]);

        let next = replace_level(&tree, &path(&["g1", "g2"]), replacement.clone());

        assert_eq!(*get_level(&next, &path(&["g1", "g2"])), replacement);
        let old_side = tree.root.node("side").and_then(|n| n.subgraph.clone());
        let new_side = next.root.node("side").and_then(|n| n.subgraph.clone());
        assert!(Arc::ptr_eq(
            &old_side.expect("하위 그래프 없음"),
            &new_side.expect("하위 그래프 없음")
        ));
        assert_eq!(get_level(&tree, &path(&["g1", "g2"])).nodes[0].id, "deep");
    }

    #[test]
    fn replacing_with_an_empty_path_swaps_the_root() {
        let tree = nested_tree();
        let next = replace_level(&tree, &[], GraphLevel::empty());
        assert!(next.root.is_empty());
        assert_eq!(next.name, "nested");
    }

    #[test]
    fn stale_paths_leave_the_tree_untouched() {
        let tree = nested_tree();
        let next = replace_level(&tree, &path(&["ghost"]), GraphLevel::empty());
        assert!(next.is_same(&tree));
    }

    #[test]
    fn writes_through_a_child_land_in_the_template() {
        let mut template = SchemaNode::new("t", NodeKind::Group, Position::default());
        template.subgraph = Some(Arc::new(level_with(vec![SchemaNode::new(
            "old",
            NodeKind::Input,
            Position::default(),
        )])));
        let mut child = SchemaNode::new("c", NodeKind::Group, Position::default());
        child.parent_group_id = Some("t".into());
        let placeholder = child.subgraph.clone().expect("자리표시자 없음");
        let mut tree = SchemaTree::new("templates");
        tree.root = Arc::new(level_with(vec![template, child]));

        let replacement = level_with(vec![SchemaNode::new(
            "new",
            NodeKind::Output,
            Position::default(),
        )]);
        let next = replace_level(&tree, &path(&["c"]), replacement.clone());

        let template_sub = next.root.node("t").and_then(|n| n.subgraph.clone());
        assert_eq!(template_sub.as_deref(), Some(&replacement));
        let child_sub = next.root.node("c").and_then(|n| n.subgraph.clone());
        assert!(Arc::ptr_eq(&child_sub.expect("자리표시자 없음"), &placeholder));
        assert_eq!(*get_level(&next, &path(&["c"])), replacement);
    }

    #[test]
    fn writes_through_a_cyclic_child_detach_it() {
        let mut a = SchemaNode::new("a", NodeKind::Group, Position::default());
        a.parent_group_id = Some("b".into());
        let mut b = SchemaNode::new("b", NodeKind::Group, Position::default());
        b.parent_group_id = Some("a".into());
        let mut tree = SchemaTree::new("cycle");
        tree.root = Arc::new(level_with(vec![a, b]));
        let replacement = level_with(vec![SchemaNode::new(
            "kept",
            NodeKind::Population,
            Position::default(),
        )]);

        let next = replace_level(&tree, &path(&["a"]), replacement.clone());

        let a = next.root.node("a").expect("노드 없음");
        assert!(a.parent_group_id.is_none());
        assert_eq!(*get_level(&next, &path(&["a"])), replacement);
        let b = next.root.node("b").expect("노드 없음");
        assert_eq!(b.parent_group_id.as_deref(), Some("a"));
    }

    #[test]
    fn writes_through_a_dangling_child_detach_it() {
        let mut child = SchemaNode::new("c", NodeKind::Group, Position::default());
        child.parent_group_id = Some("gone".into());
        let mut tree = SchemaTree::new("dangling");
        tree.root = Arc::new(level_with(vec![child]));
        let replacement = level_with(vec![SchemaNode::new(
            "kept",
            NodeKind::Input,
            Position::default(),
        )]);

        let next = replace_level(&tree, &path(&["c"]), replacement.clone());

        let child = next.root.node("c").expect("노드 없음");
        assert!(child.parent_group_id.is_none());
        assert_eq!(*get_level(&next, &path(&["c"])), replacement);
    }
}
