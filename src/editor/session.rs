use std::sync::Arc;
use tracing::{debug, info};

use super::model::{
    Attributes, EditorError, GraphLevel, NodeKind, PanelState, Position, SchemaEdge, SchemaNode,
    SchemaTree, Viewport, new_edge_id, new_node_id,
};
use super::navigation::{Crumb, NavigationStack};
use super::router::{self, EdgeChange, NodeChange};
use super::store;
use super::template::{self, CloneOffsetTracker, GroupPorts, GroupStatus};

/// 설정 패널에 표시할 현재 레벨의 선택 요소.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectedElement {
    /// 선택된 노드.
    Node(SchemaNode),
    /// 선택된 엣지.
    Edge(SchemaEdge),
}

impl SelectedElement {
    /// 요소 ID.
    pub fn id(&self) -> &str {
        match self {
            SelectedElement::Node(node) => &node.id,
            SelectedElement::Edge(edge) => &edge.id,
        }
    }
}

/// 트리 하나와 탐색 스택 하나를 묶은 편집 세션.
///
/// 화면 계층은 이 세션만 넘겨받아 모든 편집을 수행한다. 트리가 실제로 바뀔 때마다
/// `revision`이 올라가며 자동 저장은 이 값을 관찰한다.
#[derive(Debug, Clone, Default)]
pub struct EditorSession {
    tree: SchemaTree,
    navigation: NavigationStack,
    clone_tracker: CloneOffsetTracker,
    revision: u64,
}

impl EditorSession {
    /// 트리로 세션을 만들고 저장된 탐색 경로를 복원한다.
    pub fn new(tree: SchemaTree) -> Self {
        let mut session = Self::default();
        session.replace_tree(tree);
        session
    }

    /// 현재 트리.
    pub fn tree(&self) -> &SchemaTree {
        &self.tree
    }

    /// 현재 탐색 경로.
    pub fn path(&self) -> &[String] {
        self.navigation.current()
    }

    /// 트리 변경 횟수.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// 현재 표시 중인 레벨.
    pub fn current_level(&self) -> Arc<GraphLevel> {
        store::get_level(&self.tree, self.navigation.current())
    }

    /// 현재 경로의 브레드크럼.
    pub fn breadcrumbs(&self) -> Vec<Crumb> {
        self.navigation.breadcrumbs(&self.tree, &self.tree.name)
    }

    fn commit(&mut self, next: SchemaTree) -> bool {
        if next.is_same(&self.tree) {
            return false;
        }
        self.tree = next;
        self.revision += 1;
        true
    }

    fn sync_navigation_path(&mut self) {
        if self.tree.navigation_path.as_slice() != self.navigation.current() {
            let next = SchemaTree {
                navigation_path: self.navigation.current().to_vec(),
                ..self.tree.clone()
            };
            self.commit(next);
        }
    }

    /// 불러온 트리로 교체한다. 저장된 경로는 유효한 앞부분까지만 복원된다.
    pub fn replace_tree(&mut self, tree: SchemaTree) {
        self.navigation.restore(&tree, &tree.navigation_path);
        self.tree = tree;
        self.clone_tracker = CloneOffsetTracker::default();
        self.revision += 1;
        self.sync_navigation_path();
    }

    /// 문서를 빈 루트로 초기화한다. 이름과 패널 상태는 유지한다.
    pub fn clear(&mut self) {
        let cleared = SchemaTree {
            name: self.tree.name.clone(),
            panel_state: self.tree.panel_state,
            ..SchemaTree::default()
        };
        self.navigation.reset();
        self.clone_tracker = CloneOffsetTracker::default();
        self.commit(cleared);
        info!("문서를 초기화했습니다");
    }

    /// 문서 이름을 바꾼다.
    pub fn rename(&mut self, name: &str) {
        let next = SchemaTree {
            name: name.to_string(),
            ..self.tree.clone()
        };
        self.commit(next);
    }

    /// 노드 위치/선택/삭제/추가 변경을 반영한다.
    pub fn apply_node_changes(&mut self, changes: &[NodeChange]) -> bool {
        let next = router::apply_node_changes(&self.tree, self.navigation.current(), changes);
        self.commit(next)
    }

    /// 두 노드를 잇고 새 엣지 ID를 반환한다.
    pub fn connect(&mut self, source_id: &str, target_id: &str) -> Option<String> {
        let edge_id = new_edge_id();
        let next = router::connect(
            &self.tree,
            self.navigation.current(),
            &edge_id,
            source_id,
            target_id,
        );
        self.commit(next).then_some(edge_id)
    }

    /// 현재 레벨 좌표에 노드를 만들고 ID를 반환한다.
    pub fn create_node(&mut self, position: Position, kind: NodeKind) -> String {
        let node_id = new_node_id();
        let next = router::create_node(
            &self.tree,
            self.navigation.current(),
            &node_id,
            position,
            kind,
        );
        self.commit(next);
        node_id
    }

    /// 노드/엣지 속성 또는 전역 파라미터에 부분 속성을 병합한다.
    pub fn update_element_attributes(&mut self, element_id: &str, partial: &Attributes) -> bool {
        let next = router::update_element_attributes(
            &self.tree,
            self.navigation.current(),
            element_id,
            partial,
        );
        self.commit(next)
    }

    /// 전역 파라미터를 지운다.
    pub fn remove_global_parameter(&mut self, name: &str) -> bool {
        let next = router::remove_global_parameter(&self.tree, name);
        self.commit(next)
    }

    /// 현재 레벨 뷰포트를 저장한다.
    pub fn update_viewport(&mut self, viewport: Viewport) -> bool {
        let next = router::update_viewport(&self.tree, self.navigation.current(), viewport);
        self.commit(next)
    }

    /// 패널 상태를 저장한다.
    pub fn update_panel_state(&mut self, state: PanelState) -> bool {
        let next = router::update_panel_state(&self.tree, state);
        self.commit(next)
    }

    /// 현재 뷰포트를 기록한 뒤 그룹으로 들어가고, 들어간 레벨의 저장된 뷰포트를 반환한다.
    pub fn enter_group(&mut self, group_id: &str, live_viewport: Viewport) -> Option<Viewport> {
        if !self.navigation.can_enter(&self.tree, group_id) {
            debug!(group_id = %group_id, "그룹 진입 거부");
            return None;
        }
        self.update_viewport(live_viewport);
        self.navigation.push(&self.tree, group_id);
        self.sync_navigation_path();
        Some(self.current_level().viewport)
    }

    /// 현재 뷰포트를 기록한 뒤 한 단계 나오고, 상위 레벨의 뷰포트를 반환한다.
    pub fn leave_group(&mut self, live_viewport: Viewport) -> Option<Viewport> {
        if self.navigation.depth() == 0 {
            return None;
        }
        self.update_viewport(live_viewport);
        self.navigation.pop();
        self.sync_navigation_path();
        Some(self.current_level().viewport)
    }

    /// 브레드크럼의 `depth` 단계로 이동하고 그 레벨의 뷰포트를 반환한다.
    pub fn jump_to_depth(&mut self, depth: usize, live_viewport: Viewport) -> Viewport {
        if depth < self.navigation.depth() {
            self.update_viewport(live_viewport);
            self.navigation.truncate(depth);
            self.sync_navigation_path();
        }
        self.current_level().viewport
    }

    /// 그룹을 복제해 자식 그룹을 만들고 새 ID를 반환한다.
    pub fn duplicate_group(&mut self, source_id: &str) -> Option<String> {
        let cloned = template::clone_group(
            &self.tree,
            self.navigation.current(),
            source_id,
            &mut self.clone_tracker,
        )?;
        let new_id = cloned.node.id.clone();
        let next = router::apply_node_changes(
            &self.tree,
            &cloned.level_path,
            &[NodeChange::Add { node: cloned.node }],
        );
        self.commit(next).then_some(new_id)
    }

    /// 현재 레벨의 그룹이 템플릿에서 분리될 수 있는지 확인한다.
    ///
    /// 다른 그룹의 템플릿이면서 자식이기도 한 그룹도 포함된다.
    pub fn can_detach(&self, group_id: &str) -> bool {
        self.current_level()
            .node(group_id)
            .is_some_and(|node| node.is_child())
    }

    /// 자식 그룹을 템플릿 내용의 깊은 복사본을 가진 독립 그룹으로 바꾼다.
    pub fn detach_group(&mut self, group_id: &str) -> bool {
        let level = self.current_level();
        let Some(node) = level.node(group_id).filter(|node| node.is_child()) else {
            return false;
        };
        let detached = template::detach_from_parent(node, &level);
        let next = router::replace_node(&self.tree, self.navigation.current(), detached);
        self.commit(next)
    }

    /// 현재 레벨에서 `element_id`만 선택한다. `None`이면 모두 해제한다.
    pub fn select_only(&mut self, element_id: Option<&str>) -> bool {
        let level = self.current_level();
        let node_changes: Vec<NodeChange> = level
            .nodes
            .iter()
            .map(|node| NodeChange::Select {
                id: node.id.clone(),
                selected: Some(node.id.as_str()) == element_id,
            })
            .collect();
        let edge_changes: Vec<EdgeChange> = level
            .edges
            .iter()
            .map(|edge| EdgeChange::Select {
                id: edge.id.clone(),
                selected: Some(edge.id.as_str()) == element_id,
            })
            .collect();
        let path = self.navigation.current();
        let next = router::apply_node_changes(&self.tree, path, &node_changes);
        let next = router::apply_edge_changes(&next, path, &edge_changes);
        self.commit(next)
    }

    /// 현재 레벨의 선택 요소. 선택된 노드가 엣지보다 우선한다.
    pub fn selected_element(&self) -> Option<SelectedElement> {
        let level = self.current_level();
        if let Some(node) = level.nodes.iter().find(|node| node.selected) {
            return Some(SelectedElement::Node(node.clone()));
        }
        level
            .edges
            .iter()
            .find(|edge| edge.selected)
            .map(|edge| SelectedElement::Edge(edge.clone()))
    }

    /// 현재 레벨에서 선택된 노드와 엣지를 모두 지운다.
    pub fn remove_selected(&mut self) -> bool {
        let level = self.current_level();
        let node_changes: Vec<NodeChange> = level
            .nodes
            .iter()
            .filter(|node| node.selected)
            .map(|node| NodeChange::Remove {
                id: node.id.clone(),
            })
            .collect();
        let edge_changes: Vec<EdgeChange> = level
            .edges
            .iter()
            .filter(|edge| edge.selected)
            .map(|edge| EdgeChange::Remove {
                id: edge.id.clone(),
            })
            .collect();
        let path = self.navigation.current();
        let next = router::apply_edge_changes(&self.tree, path, &edge_changes);
        let next = router::apply_node_changes(&next, path, &node_changes);
        self.commit(next)
    }

    /// 현재 레벨 그룹의 표시 상태.
    pub fn group_status(&self, group_id: &str) -> Option<GroupStatus> {
        let level = self.current_level();
        let node = level.node(group_id).filter(|node| node.is_group())?;
        Some(template::group_status(node, &level))
    }

    /// 현재 레벨 그룹의 입출력 포트.
    pub fn group_ports(&self, group_id: &str) -> Option<GroupPorts> {
        let level = self.current_level();
        let node = level.node(group_id).filter(|node| node.is_group())?;
        Some(template::group_ports(node, &level))
    }

    /// 현재 레벨 그룹이 들어갈 수 있는 상태인지 확인한다.
    pub fn can_enter(&self, group_id: &str) -> bool {
        self.navigation.can_enter(&self.tree, group_id)
    }

    /// 현재 레벨의 끊긴/순환 템플릿 참조.
    pub fn diagnostics(&self) -> Vec<EditorError> {
        template::template_diagnostics(&self.current_level())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::model::{LABEL_KEY, single};

    fn viewport(x: f32, zoom: f32) -> Viewport {
        Viewport {
            offset_x: x,
            offset_y: 0.0,
            zoom,
        }
    }

    fn session_with_filled_group() -> (EditorSession, String) {
        let mut session = EditorSession::new(SchemaTree::new("Untitled"));
        let group_id = session.create_node(Position::default(), NodeKind::Group);
        assert!(session.enter_group(&group_id, Viewport::default()).is_none());
        let next = router::create_node(
            session.tree(),
            &[group_id.clone()],
            "inner",
            Position::new(3.0, 4.0),
            NodeKind::Input,
        );
        assert!(session.commit(next));
        (session, group_id)
    }

    #[test]
    fn push_then_pop_restores_the_previous_level_exactly() {
        let (mut session, group_id) = session_with_filled_group();
        session.update_viewport(viewport(15.0, 1.25));
        let before = session.current_level();

        let inner_viewport = session
            .enter_group(&group_id, viewport(15.0, 1.25))
            .expect("진입 실패");
        assert_eq!(inner_viewport, Viewport::default());
        assert_eq!(session.tree().navigation_path, vec![group_id.clone()]);

        let restored = session
            .leave_group(inner_viewport)
            .expect("복귀 실패");
        assert_eq!(restored, viewport(15.0, 1.25));
        assert_eq!(*session.current_level(), *before);
        assert!(session.tree().navigation_path.is_empty());
    }

    #[test]
    fn each_level_remembers_its_own_viewport() {
        let (mut session, group_id) = session_with_filled_group();
        session.enter_group(&group_id, viewport(1.0, 1.0));
        session.leave_group(viewport(42.0, 0.5));
        let inner = session
            .enter_group(&group_id, viewport(7.0, 2.0))
            .expect("진입 실패");
        assert_eq!(inner, viewport(42.0, 0.5));
        assert_eq!(session.jump_to_depth(0, viewport(8.0, 1.0)), viewport(7.0, 2.0));
    }

    #[test]
    fn revision_only_moves_on_real_changes() {
        let (mut session, _) = session_with_filled_group();
        let revision = session.revision();
        assert!(!session.update_viewport(session.current_level().viewport));
        assert!(!session.apply_node_changes(&[NodeChange::Remove { id: "nope".into() }]));
        assert_eq!(session.revision(), revision);
        session.rename("Cortex");
        assert_eq!(session.revision(), revision + 1);
    }

    #[test]
    fn selection_drives_the_settings_element() {
        let mut session = EditorSession::new(SchemaTree::new("t"));
        let a = session.create_node(Position::default(), NodeKind::Input);
        let b = session.create_node(Position::new(100.0, 0.0), NodeKind::Output);
        let edge_id = session.connect(&a, &b).expect("연결 실패");

        session.select_only(Some(edge_id.as_str()));
        assert!(matches!(
            session.selected_element(),
            Some(SelectedElement::Edge(e)) if e.id == edge_id
        ));

        session.select_only(Some(a.as_str()));
        assert_eq!(session.selected_element().map(|e| e.id().to_string()), Some(a.clone()));

        session.select_only(None);
        assert!(session.selected_element().is_none());
    }

    #[test]
    fn selection_is_scoped_to_the_active_level() {
        let (mut session, group_id) = session_with_filled_group();
        session.select_only(Some(group_id.as_str()));
        session.enter_group(&group_id, Viewport::default());
        assert!(session.selected_element().is_none());
        session.leave_group(Viewport::default());
        assert_eq!(
            session.selected_element().map(|e| e.id().to_string()),
            Some(group_id)
        );
    }

    #[test]
    fn removing_the_selection_cleans_up_edges() {
        let mut session = EditorSession::new(SchemaTree::new("t"));
        let a = session.create_node(Position::default(), NodeKind::Input);
        let b = session.create_node(Position::default(), NodeKind::Population);
        session.connect(&a, &b);
        session.select_only(Some(a.as_str()));

        assert!(session.remove_selected());

        let level = session.current_level();
        assert_eq!(level.nodes.len(), 1);
        assert!(level.edges.is_empty());
    }

    #[test]
    fn duplicate_and_detach_follow_the_template_rules() {
        let (mut session, group_id) = session_with_filled_group();
        let clone_id = session.duplicate_group(&group_id).expect("복제 실패");

        assert_eq!(session.group_status(&group_id), Some(GroupStatus::Template));
        assert_eq!(session.group_status(&clone_id), Some(GroupStatus::Child));
        assert!(session.can_enter(&clone_id));
        assert_eq!(
            session.group_ports(&clone_id).map(|p| p.inputs.len()),
            Some(1)
        );

        assert!(session.detach_group(&clone_id));
        assert_eq!(session.group_status(&clone_id), Some(GroupStatus::Plain));
        assert_eq!(session.group_status(&group_id), Some(GroupStatus::Plain));

        let level = session.current_level();
        let original = store::get_level(session.tree(), &[group_id.clone()]);
        let detached = store::get_level(session.tree(), &[clone_id.clone()]);
        assert_ne!(original.nodes[0].id, detached.nodes[0].id);
        assert_eq!(original.nodes[0].position, detached.nodes[0].position);
        assert_eq!(level.nodes.len(), 2);
    }

    #[test]
    fn a_child_that_is_also_a_template_can_be_detached() {
        let (mut session, group_id) = session_with_filled_group();
        let mut middle = SchemaNode::new("middle", NodeKind::Group, Position::default());
        middle.parent_group_id = Some(group_id.clone());
        middle.subgraph = None;
        let mut leaf = SchemaNode::new("leaf", NodeKind::Group, Position::default());
        leaf.parent_group_id = Some("middle".into());
        leaf.subgraph = None;
        assert!(session.apply_node_changes(&[
            NodeChange::Add { node: middle },
            NodeChange::Add { node: leaf },
        ]));

        assert_eq!(session.group_status("middle"), Some(GroupStatus::Template));
        assert!(session.can_detach("middle"));
        assert!(!session.can_detach(&group_id));

        assert!(session.detach_group("middle"));
        let level = session.current_level();
        assert!(level.node("middle").is_some_and(|node| !node.is_child()));
        assert_eq!(
            level.node("leaf").and_then(|node| node.parent_group_id.as_deref()),
            Some("middle")
        );
        let leaf_level = store::get_level(session.tree(), &["leaf".to_string()]);
        assert_eq!(leaf_level.nodes.len(), 1);
        assert_ne!(leaf_level.nodes[0].id, "inner");
    }

    #[test]
    fn edits_inside_a_child_are_shared_with_its_template() {
        let (mut session, group_id) = session_with_filled_group();
        let clone_id = session.duplicate_group(&group_id).expect("복제 실패");
        session.enter_group(&clone_id, Viewport::default());

        session.update_element_attributes("inner", &single(LABEL_KEY, "Shared"));
        session.leave_group(Viewport::default());

        let template_level = store::get_level(session.tree(), &[group_id]);
        assert_eq!(template_level.nodes[0].label(), "Shared");
    }

    #[test]
    fn clear_returns_to_an_empty_root() {
        let (mut session, group_id) = session_with_filled_group();
        session.enter_group(&group_id, Viewport::default());
        session.clear();
        assert!(session.path().is_empty());
        assert!(session.tree().root.is_empty());
        assert_eq!(session.tree().name, "Untitled");
    }

    #[test]
    fn loaded_trees_resume_at_the_saved_depth() {
        let (session, group_id) = session_with_filled_group();
        let mut saved = session.tree().clone();
        saved.navigation_path = vec![group_id.clone(), "vanished".into()];

        let resumed = EditorSession::new(saved);

        assert_eq!(resumed.path(), [group_id.clone()].as_slice());
        assert_eq!(resumed.tree().navigation_path, vec![group_id]);
        assert_eq!(resumed.breadcrumbs().len(), 2);
    }
}
